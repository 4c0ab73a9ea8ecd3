//! WGSL sources for the Eval and Blit passes (Deep Fried Edition)
//!
//! Both passes are fixed compute shaders that treat the tape as *data* in a
//! storage buffer, so chains of any shape run without per-tape pipeline
//! rebuilds. The opcode constants and `SEGMENT_CAPACITY` are mirrored from
//! the Rust side; the tests below keep them in sync.
//!
//! # Deep Fried Optimizations
//! - **Register-file walk**: Eval runs one thread per sample column and keeps
//!   the segment's values in a function-space register array, so in-segment
//!   operands never touch main memory. A naive per-cell kernel re-executes
//!   the whole prefix for every row.
//! - **Exact-grid dispatch**: bounds-checked early returns instead of margin
//!   rows and columns; nothing is computed that is not part of the atlas.
//!
//! Author: Moroya Sakamoto

/// Eval pass: one thread per sample column walks the segment's instructions,
/// resolving in-segment operands from registers and earlier-segment operands
/// from the atlas, and writes every (node, sample) cell of scratch.
pub(crate) const EVAL_SHADER: &str = r#"
// Tape word layout must match pipeline::job::TapeOp.
struct TapeOp {
    op: u32,
    lhs: f32,
    rhs: f32,
    _pad: u32,
}

struct PassParams {
    node_count: u32,
    start_slot: u32,
    block_size: u32,
    block_count: u32,
}

@group(0) @binding(0) var<storage, read> tape: array<TapeOp>;
@group(0) @binding(1) var<storage, read> samples: array<vec4<f32>>;
@group(0) @binding(2) var<storage, read> atlas: array<f32>;
@group(0) @binding(3) var<storage, read_write> scratch: array<f32>;
@group(0) @binding(4) var<uniform> params: PassParams;

const SEGMENT_CAPACITY: u32 = 256u;

const OP_X: u32 = 0u;
const OP_Y: u32 = 1u;
const OP_Z: u32 = 2u;
const OP_CONST: u32 = 3u;
const OP_NEG: u32 = 8u;
const OP_ABS: u32 = 9u;
const OP_SQUARE: u32 = 10u;
const OP_SQRT: u32 = 11u;
const OP_SIN: u32 = 12u;
const OP_COS: u32 = 13u;
const OP_ADD: u32 = 16u;
const OP_SUB: u32 = 17u;
const OP_MUL: u32 = 18u;
const OP_DIV: u32 = 19u;
const OP_MIN: u32 = 20u;
const OP_MAX: u32 = 21u;

// Slots at or past start_slot were computed by this walk; earlier slots come
// from the atlas column of the same sample (block 0 holds every block's
// values).
fn resolve(
    operand: f32,
    regs: ptr<function, array<f32, SEGMENT_CAPACITY>>,
    column: u32,
) -> f32 {
    let slot = u32(operand);
    if (slot >= params.start_slot) {
        return (*regs)[slot - params.start_slot];
    }
    return atlas[slot * params.block_size * params.block_count + column];
}

@compute @workgroup_size(64)
fn eval_main(@builtin(global_invocation_id) gid: vec3<u32>) {
    let column = gid.x;
    if (column >= params.block_size) {
        return;
    }

    let point = samples[column].xyz;
    var regs: array<f32, SEGMENT_CAPACITY>;

    let count = min(params.node_count, SEGMENT_CAPACITY);
    for (var node = 0u; node < count; node = node + 1u) {
        let word = tape[node];
        var value = 0.0;
        switch (word.op) {
            case OP_X: {
                value = point.x;
            }
            case OP_Y: {
                value = point.y;
            }
            case OP_Z: {
                value = point.z;
            }
            case OP_CONST: {
                value = word.lhs;
            }
            case OP_NEG: {
                value = -resolve(word.lhs, &regs, column);
            }
            case OP_ABS: {
                value = abs(resolve(word.lhs, &regs, column));
            }
            case OP_SQUARE: {
                let a = resolve(word.lhs, &regs, column);
                value = a * a;
            }
            case OP_SQRT: {
                value = sqrt(resolve(word.lhs, &regs, column));
            }
            case OP_SIN: {
                value = sin(resolve(word.lhs, &regs, column));
            }
            case OP_COS: {
                value = cos(resolve(word.lhs, &regs, column));
            }
            case OP_ADD: {
                value = resolve(word.lhs, &regs, column) + resolve(word.rhs, &regs, column);
            }
            case OP_SUB: {
                value = resolve(word.lhs, &regs, column) - resolve(word.rhs, &regs, column);
            }
            case OP_MUL: {
                value = resolve(word.lhs, &regs, column) * resolve(word.rhs, &regs, column);
            }
            case OP_DIV: {
                value = resolve(word.lhs, &regs, column) / resolve(word.rhs, &regs, column);
            }
            case OP_MIN: {
                value = min(resolve(word.lhs, &regs, column), resolve(word.rhs, &regs, column));
            }
            case OP_MAX: {
                value = max(resolve(word.lhs, &regs, column), resolve(word.rhs, &regs, column));
            }
            default: {
                value = 0.0;
            }
        }
        regs[node] = value;
        scratch[node * params.block_size + column] = value;
    }
}
"#;

/// Blit pass: one thread per destination cell copies scratch rows into atlas
/// rows `start_slot..start_slot+node_count`, tiling the block's columns
/// across the full atlas width.
pub(crate) const BLIT_SHADER: &str = r#"
struct PassParams {
    node_count: u32,
    start_slot: u32,
    block_size: u32,
    block_count: u32,
}

@group(0) @binding(0) var<storage, read> scratch: array<f32>;
@group(0) @binding(1) var<storage, read_write> atlas: array<f32>;
@group(0) @binding(2) var<uniform> params: PassParams;

@compute @workgroup_size(8, 8)
fn blit_main(@builtin(global_invocation_id) gid: vec3<u32>) {
    let column = gid.x;
    let row = gid.y;
    let atlas_width = params.block_size * params.block_count;
    if (column >= atlas_width || row >= params.node_count) {
        return;
    }

    let value = scratch[row * params.block_size + column % params.block_size];
    atlas[(params.start_slot + row) * atlas_width + column] = value;
}
"#;

pub(crate) const EVAL_ENTRY: &str = "eval_main";
pub(crate) const BLIT_ENTRY: &str = "blit_main";

pub(crate) const EVAL_WORKGROUP_SIZE: u32 = 64;
pub(crate) const BLIT_WORKGROUP_DIM: u32 = 8;
