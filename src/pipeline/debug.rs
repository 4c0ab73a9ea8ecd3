//! Diagnostic dumps
//!
//! Text renderings of the tape, atlas and scratch for eyeballing pipeline
//! state. These read device buffers back and are never part of the render
//! path; callers invoke them explicitly.
//!
//! Author: Moroya Sakamoto

use super::{PipelineContext, PipelineError, RenderJob};
use crate::tape::Tape;

/// Render the chain as one line per instruction, grouped by segment
pub fn dump_tape(tape: &Tape) -> String {
    let mut out = String::new();
    let mut slot = 0usize;
    for (index, segment) in tape.segments().iter().enumerate() {
        out.push_str(&format!(
            "segment {} (slots {}..{})\n",
            index,
            slot,
            slot + segment.node_count()
        ));
        for instruction in segment.instructions() {
            let line = match instruction.opcode.slot_operands() {
                0 if instruction.opcode == crate::tape::OpCode::Const => format!(
                    "  [{:>4}] {:<6} {}\n",
                    slot,
                    instruction.opcode.name(),
                    instruction.lhs
                ),
                0 => format!("  [{:>4}] {}\n", slot, instruction.opcode.name()),
                1 => format!(
                    "  [{:>4}] {:<6} s{}\n",
                    slot,
                    instruction.opcode.name(),
                    instruction.lhs as u32
                ),
                _ => format!(
                    "  [{:>4}] {:<6} s{} s{}\n",
                    slot,
                    instruction.opcode.name(),
                    instruction.lhs as u32,
                    instruction.rhs as u32
                ),
            };
            out.push_str(&line);
            slot += 1;
        }
    }
    out
}

/// Read the atlas back and render it as a row-per-slot grid
pub fn dump_atlas(ctx: &PipelineContext, job: &RenderJob) -> Result<String, PipelineError> {
    let values = ctx.read_atlas(job)?;
    Ok(format!(
        "atlas {} rows x {} cols\n{}",
        job.atlas_rows(),
        job.atlas_cols(),
        format_grid(&values, job.atlas_cols())
    ))
}

/// Read the scratch buffer back and render it as a grid
pub fn dump_scratch(ctx: &PipelineContext, job: &RenderJob) -> Result<String, PipelineError> {
    let values = ctx.read_scratch(job)?;
    let rows = job.tape().max_segment_len();
    Ok(format!(
        "scratch {} rows x {} cols\n{}",
        rows,
        job.block_size(),
        format_grid(&values, job.block_size())
    ))
}

fn format_grid(values: &[f32], cols: usize) -> String {
    let mut out = String::new();
    for (row, chunk) in values.chunks(cols).enumerate() {
        out.push_str(&format!("{:>4} |", row));
        for value in chunk {
            out.push_str(&format!(" {:>9.4}", value));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tape::TapeBuilder;

    #[test]
    fn test_dump_tape_format() {
        let mut b = TapeBuilder::with_segment_capacity(2).unwrap();
        let x = b.x();
        let c = b.constant(1.5);
        b.add(x, c);
        let tape = b.build().unwrap();

        let text = dump_tape(&tape);
        assert!(text.contains("segment 0 (slots 0..2)"));
        assert!(text.contains("segment 1 (slots 2..3)"));
        assert!(text.contains("X"));
        assert!(text.contains("CONST  1.5"));
        assert!(text.contains("ADD    s0 s1"));
    }

    #[test]
    fn test_format_grid_shape() {
        let grid = format_grid(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 3);
        let lines: Vec<&str> = grid.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("   0 |"));
        assert!(lines[1].contains("6.0000"));
    }
}
