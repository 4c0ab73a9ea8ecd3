//! Tape instruction format
//!
//! One instruction is three words: an opcode and two `f32` operands. Operand
//! fields hold either immediate values or slot references encoded as floats,
//! depending on the opcode group. The layout matches the GPU tape word
//! (`pipeline` pads it to 16 bytes for storage-buffer alignment).
//!
//! Author: Moroya Sakamoto

use super::OpCode;
use serde::{Deserialize, Serialize};

/// Handle to a computed tape value.
///
/// The index is the *global* slot of the instruction that produced the value:
/// position within the whole chain, not within one segment. Slot handles are
/// minted by [`TapeBuilder`](super::TapeBuilder) in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot(u32);

impl Slot {
    /// Wrap a raw global slot index
    #[inline]
    pub fn new(index: u32) -> Self {
        Slot(index)
    }

    /// Global slot index
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }

    /// Operand encoding of this reference
    #[inline]
    pub(crate) fn operand(self) -> f32 {
        self.0 as f32
    }
}

/// A single tape instruction (one node of the chain).
///
/// `lhs`/`rhs` meaning by opcode group:
/// - leaf: unused, except `Const` where `lhs` is the immediate value
/// - unary: `lhs` = slot reference
/// - binary: `lhs` and `rhs` = slot references
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    /// Operation selector
    pub opcode: OpCode,
    /// First operand (immediate or slot reference)
    pub lhs: f32,
    /// Second operand (slot reference for binary ops, unused otherwise)
    pub rhs: f32,
}

impl Instruction {
    /// X coordinate leaf
    #[inline]
    pub fn x() -> Self {
        Instruction {
            opcode: OpCode::X,
            lhs: 0.0,
            rhs: 0.0,
        }
    }

    /// Y coordinate leaf
    #[inline]
    pub fn y() -> Self {
        Instruction {
            opcode: OpCode::Y,
            lhs: 0.0,
            rhs: 0.0,
        }
    }

    /// Z coordinate leaf
    #[inline]
    pub fn z() -> Self {
        Instruction {
            opcode: OpCode::Z,
            lhs: 0.0,
            rhs: 0.0,
        }
    }

    /// Immediate constant
    #[inline]
    pub fn constant(value: f32) -> Self {
        Instruction {
            opcode: OpCode::Const,
            lhs: value,
            rhs: 0.0,
        }
    }

    /// Negate the value in slot `a`
    #[inline]
    pub fn neg(a: Slot) -> Self {
        Self::unary(OpCode::Neg, a)
    }

    /// Absolute value of slot `a`
    #[inline]
    pub fn abs(a: Slot) -> Self {
        Self::unary(OpCode::Abs, a)
    }

    /// Square of slot `a`
    #[inline]
    pub fn square(a: Slot) -> Self {
        Self::unary(OpCode::Square, a)
    }

    /// Square root of slot `a`
    #[inline]
    pub fn sqrt(a: Slot) -> Self {
        Self::unary(OpCode::Sqrt, a)
    }

    /// Sine of slot `a` (radians)
    #[inline]
    pub fn sin(a: Slot) -> Self {
        Self::unary(OpCode::Sin, a)
    }

    /// Cosine of slot `a` (radians)
    #[inline]
    pub fn cos(a: Slot) -> Self {
        Self::unary(OpCode::Cos, a)
    }

    /// Sum of slots `a + b`
    #[inline]
    pub fn add(a: Slot, b: Slot) -> Self {
        Self::binary(OpCode::Add, a, b)
    }

    /// Difference of slots `a - b`
    #[inline]
    pub fn sub(a: Slot, b: Slot) -> Self {
        Self::binary(OpCode::Sub, a, b)
    }

    /// Product of slots `a * b`
    #[inline]
    pub fn mul(a: Slot, b: Slot) -> Self {
        Self::binary(OpCode::Mul, a, b)
    }

    /// Quotient of slots `a / b`
    #[inline]
    pub fn div(a: Slot, b: Slot) -> Self {
        Self::binary(OpCode::Div, a, b)
    }

    /// Minimum of slots `a` and `b`
    #[inline]
    pub fn min(a: Slot, b: Slot) -> Self {
        Self::binary(OpCode::Min, a, b)
    }

    /// Maximum of slots `a` and `b`
    #[inline]
    pub fn max(a: Slot, b: Slot) -> Self {
        Self::binary(OpCode::Max, a, b)
    }

    #[inline]
    fn unary(opcode: OpCode, a: Slot) -> Self {
        Instruction {
            opcode,
            lhs: a.operand(),
            rhs: 0.0,
        }
    }

    #[inline]
    fn binary(opcode: OpCode, a: Slot, b: Slot) -> Self {
        Instruction {
            opcode,
            lhs: a.operand(),
            rhs: b.operand(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_is_three_words() {
        assert_eq!(std::mem::size_of::<Instruction>(), 12);
        assert_eq!(std::mem::align_of::<Instruction>(), 4);
    }

    #[test]
    fn test_leaf_constructors() {
        assert_eq!(Instruction::x().opcode, OpCode::X);
        assert_eq!(Instruction::z().opcode, OpCode::Z);

        let c = Instruction::constant(2.5);
        assert_eq!(c.opcode, OpCode::Const);
        assert_eq!(c.lhs, 2.5);
    }

    #[test]
    fn test_operand_encoding() {
        let i = Instruction::sub(Slot::new(3), Slot::new(7));
        assert_eq!(i.opcode, OpCode::Sub);
        assert_eq!(i.lhs, 3.0);
        assert_eq!(i.rhs, 7.0);

        let n = Instruction::neg(Slot::new(12));
        assert_eq!(n.lhs, 12.0);
        assert_eq!(n.rhs, 0.0);
    }
}
