//! Instruction opcodes for tape evaluation
//!
//! Opcodes are grouped by operand shape, with numeric gaps so each group can
//! grow without renumbering: leaves below 8, unary ops 8-15, binary ops from
//! 16. The numeric value of a variant is the exact `u32` written into GPU
//! tape memory, and the same constants are mirrored in the WGSL sources
//! (`pipeline::shaders` keeps them in sync with tests).
//!
//! Author: Moroya Sakamoto

use serde::{Deserialize, Serialize};

/// Operation selector for one tape instruction.
///
/// Leaf opcodes take no slot operands. Unary opcodes read one slot reference
/// from `lhs`. Binary opcodes read slot references from `lhs` and `rhs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum OpCode {
    // ===== Leaves (0-7): no slot operands =====
    /// X coordinate of the sample point
    X = 0,
    /// Y coordinate of the sample point
    Y = 1,
    /// Z coordinate of the sample point
    Z = 2,
    /// Immediate constant: `lhs` = value
    Const = 3,

    // ===== Unary ops (8-15): lhs = slot reference =====
    /// Negation
    Neg = 8,
    /// Absolute value
    Abs = 9,
    /// Square (`a * a`)
    Square = 10,
    /// Square root
    Sqrt = 11,
    /// Sine (radians)
    Sin = 12,
    /// Cosine (radians)
    Cos = 13,

    // ===== Binary ops (16+): lhs, rhs = slot references =====
    /// Addition
    Add = 16,
    /// Subtraction (`lhs - rhs`)
    Sub = 17,
    /// Multiplication
    Mul = 18,
    /// Division (`lhs / rhs`)
    Div = 19,
    /// Minimum (CSG union on distance fields)
    Min = 20,
    /// Maximum (CSG intersection on distance fields)
    Max = 21,
}

impl OpCode {
    /// Check if this opcode takes no slot operands
    #[inline]
    pub fn is_leaf(self) -> bool {
        (self as u32) < 8
    }

    /// Check if this opcode reads one slot reference (`lhs`)
    #[inline]
    pub fn is_unary(self) -> bool {
        let v = self as u32;
        (8..16).contains(&v)
    }

    /// Check if this opcode reads two slot references (`lhs` and `rhs`)
    #[inline]
    pub fn is_binary(self) -> bool {
        (self as u32) >= 16
    }

    /// Number of slot references this opcode reads (0, 1 or 2)
    #[inline]
    pub fn slot_operands(self) -> usize {
        if self.is_leaf() {
            0
        } else if self.is_unary() {
            1
        } else {
            2
        }
    }

    /// Human-readable opcode name (diagnostics)
    pub fn name(self) -> &'static str {
        match self {
            OpCode::X => "X",
            OpCode::Y => "Y",
            OpCode::Z => "Z",
            OpCode::Const => "CONST",
            OpCode::Neg => "NEG",
            OpCode::Abs => "ABS",
            OpCode::Square => "SQUARE",
            OpCode::Sqrt => "SQRT",
            OpCode::Sin => "SIN",
            OpCode::Cos => "COS",
            OpCode::Add => "ADD",
            OpCode::Sub => "SUB",
            OpCode::Mul => "MUL",
            OpCode::Div => "DIV",
            OpCode::Min => "MIN",
            OpCode::Max => "MAX",
        }
    }
}
