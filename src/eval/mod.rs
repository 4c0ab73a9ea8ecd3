//! CPU reference evaluation
//!
//! Walks a tape sequentially with a flat register file, one value per slot.
//! This is the semantic ground truth for the GPU pipeline: `eval_atlas`
//! produces cell-for-cell what [`read_atlas`] returns (within float tolerance
//! for transcendental opcodes), and the parity tests hold the two together.
//!
//! Also useful on its own as a no-GPU fallback for small batches.
//!
//! [`read_atlas`]: crate::pipeline::PipelineContext::read_atlas
//!
//! Author: Moroya Sakamoto

mod parallel;

pub use parallel::{eval_atlas, eval_tape_batch_parallel};

use crate::tape::{Instruction, OpCode, Tape};
use glam::Vec3;

/// Evaluate every slot of the chain at one sample point.
///
/// Returns one value per global slot, in slot order: exactly the column this
/// sample contributes to the atlas.
pub fn eval_slots(tape: &Tape, point: Vec3) -> Vec<f32> {
    let mut slots = Vec::with_capacity(tape.slot_count());
    eval_slots_into(tape, point, &mut slots);
    slots
}

/// Evaluate the chain at one sample point, returning the final slot value
pub fn eval_tape(tape: &Tape, point: Vec3) -> f32 {
    eval_tape_reusing(tape, point, &mut Vec::with_capacity(tape.slot_count()))
}

/// Evaluate the final slot at many sample points
pub fn eval_tape_batch(tape: &Tape, points: &[Vec3]) -> Vec<f32> {
    let mut slots = Vec::with_capacity(tape.slot_count());
    points
        .iter()
        .map(|&point| eval_tape_reusing(tape, point, &mut slots))
        .collect()
}

// Single walk with a caller-owned register file, so batches do not
// reallocate per point.
pub(crate) fn eval_slots_into(tape: &Tape, point: Vec3, slots: &mut Vec<f32>) {
    slots.clear();
    for segment in tape.segments() {
        for instruction in segment.instructions() {
            let value = eval_instruction(instruction, point, slots);
            slots.push(value);
        }
    }
}

fn eval_tape_reusing(tape: &Tape, point: Vec3, slots: &mut Vec<f32>) -> f32 {
    eval_slots_into(tape, point, slots);
    slots.last().copied().unwrap_or(0.0)
}

// Must stay operation-for-operation identical to the Eval shader switch.
fn eval_instruction(instruction: &Instruction, point: Vec3, slots: &[f32]) -> f32 {
    let a = |operand: f32| slots[operand as usize];
    match instruction.opcode {
        OpCode::X => point.x,
        OpCode::Y => point.y,
        OpCode::Z => point.z,
        OpCode::Const => instruction.lhs,
        OpCode::Neg => -a(instruction.lhs),
        OpCode::Abs => a(instruction.lhs).abs(),
        OpCode::Square => {
            let v = a(instruction.lhs);
            v * v
        }
        OpCode::Sqrt => a(instruction.lhs).sqrt(),
        OpCode::Sin => a(instruction.lhs).sin(),
        OpCode::Cos => a(instruction.lhs).cos(),
        OpCode::Add => a(instruction.lhs) + a(instruction.rhs),
        OpCode::Sub => a(instruction.lhs) - a(instruction.rhs),
        OpCode::Mul => a(instruction.lhs) * a(instruction.rhs),
        OpCode::Div => a(instruction.lhs) / a(instruction.rhs),
        OpCode::Min => a(instruction.lhs).min(a(instruction.rhs)),
        OpCode::Max => a(instruction.lhs).max(a(instruction.rhs)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tape::TapeBuilder;

    fn circle_tape() -> Tape {
        // sqrt(x^2 + y^2) - 1
        let mut b = TapeBuilder::new();
        let x = b.x();
        let y = b.y();
        let xx = b.square(x);
        let yy = b.square(y);
        let r2 = b.add(xx, yy);
        let r = b.sqrt(r2);
        let one = b.constant(1.0);
        b.sub(r, one);
        b.build().unwrap()
    }

    #[test]
    fn test_eval_known_values() {
        let tape = circle_tape();

        assert!((eval_tape(&tape, Vec3::new(2.0, 0.0, 0.0)) - 1.0).abs() < 1e-6);
        assert!((eval_tape(&tape, Vec3::new(0.0, 1.0, 0.0))).abs() < 1e-6);
        assert!((eval_tape(&tape, Vec3::ZERO) - (-1.0)).abs() < 1e-6);
        assert!((eval_tape(&tape, Vec3::new(3.0, 4.0, 0.0)) - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_eval_slots_trace() {
        let tape = circle_tape();
        let slots = eval_slots(&tape, Vec3::new(3.0, 4.0, 7.0));

        assert_eq!(slots.len(), 8);
        assert_eq!(slots[0], 3.0); // x
        assert_eq!(slots[1], 4.0); // y
        assert_eq!(slots[2], 9.0); // x^2
        assert_eq!(slots[3], 16.0); // y^2
        assert_eq!(slots[4], 25.0); // x^2 + y^2
        assert_eq!(slots[5], 5.0); // sqrt
        assert_eq!(slots[6], 1.0); // const
        assert_eq!(slots[7], 4.0); // sub
    }

    #[test]
    fn test_eval_crosses_segment_boundaries() {
        // Same expression, capacity 3: slots 3.. resolve operands from
        // earlier segments.
        let mut b = TapeBuilder::with_segment_capacity(3).unwrap();
        let x = b.x();
        let y = b.y();
        let xx = b.square(x);
        let yy = b.square(y);
        let r2 = b.add(xx, yy);
        b.sqrt(r2);
        let tape = b.build().unwrap();
        assert_eq!(tape.segment_count(), 2);

        let v = eval_tape(&tape, Vec3::new(3.0, 4.0, 0.0));
        assert!((v - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_batch_matches_sequential() {
        let tape = circle_tape();
        let points: Vec<Vec3> = (0..64)
            .map(|i| Vec3::new(i as f32 * 0.1 - 3.0, (i as f32 * 0.3).sin(), 0.5))
            .collect();

        let batch = eval_tape_batch(&tape, &points);
        for (i, &point) in points.iter().enumerate() {
            assert_eq!(batch[i], eval_tape(&tape, point));
        }
    }

    #[test]
    fn test_unary_and_binary_opcodes() {
        let mut b = TapeBuilder::new();
        let x = b.x();
        let n = b.neg(x);
        let ab = b.abs(n);
        let s = b.sin(ab);
        let c = b.cos(ab);
        let q = b.div(s, c);
        let m = b.min(q, x);
        b.max(m, n);
        let tape = b.build().unwrap();

        let p = Vec3::new(0.7, 0.0, 0.0);
        let slots = eval_slots(&tape, p);
        assert_eq!(slots[1], -0.7);
        assert_eq!(slots[2], 0.7);
        assert!((slots[5] - 0.7f32.tan()).abs() < 1e-6);
        assert_eq!(slots[6], 0.7f32.min(0.7f32.tan()));
        assert_eq!(slots[7], slots[6].max(-0.7));
    }
}
