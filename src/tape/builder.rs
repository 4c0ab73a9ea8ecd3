//! Expression-style tape construction
//!
//! The builder mints [`Slot`] handles in evaluation order and splits the
//! instruction stream into capacity-bounded segments at [`build`]. Callers
//! never hand-manage segment boundaries; any split point is valid because
//! slot references are global and cross-segment reads go through the atlas.
//!
//! Slot handles must come from the same builder. Handing a foreign or
//! fabricated handle to an operation panics rather than producing a chain
//! that fails validation later.
//!
//! [`build`]: TapeBuilder::build
//!
//! Author: Moroya Sakamoto

use super::{Instruction, Slot, Tape, TapeError, TapeSegment, SEGMENT_CAPACITY};

/// Incremental tape builder.
///
/// ```
/// use alice_atlas::tape::TapeBuilder;
///
/// // x*x + 1
/// let mut b = TapeBuilder::new();
/// let x = b.x();
/// let xx = b.square(x);
/// let one = b.constant(1.0);
/// b.add(xx, one);
/// let tape = b.build().unwrap();
/// assert_eq!(tape.slot_count(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct TapeBuilder {
    instructions: Vec<Instruction>,
    segment_capacity: usize,
}

impl TapeBuilder {
    /// New builder with the full device segment capacity
    pub fn new() -> Self {
        TapeBuilder {
            instructions: Vec::new(),
            segment_capacity: SEGMENT_CAPACITY,
        }
    }

    /// New builder splitting at a smaller capacity.
    ///
    /// Used to force multi-segment chains without building hundreds of
    /// instructions. `capacity` must be in `1..=SEGMENT_CAPACITY`.
    pub fn with_segment_capacity(capacity: usize) -> Result<Self, TapeError> {
        if capacity == 0 || capacity > SEGMENT_CAPACITY {
            return Err(TapeError::InvalidCapacity {
                requested: capacity,
                max: SEGMENT_CAPACITY,
            });
        }
        Ok(TapeBuilder {
            instructions: Vec::new(),
            segment_capacity: capacity,
        })
    }

    /// Append an instruction and return the slot holding its value.
    ///
    /// # Panics
    /// Panics if a slot-reference operand does not point at an existing slot
    /// of this builder.
    pub fn push(&mut self, instruction: Instruction) -> Slot {
        let refs = instruction.opcode.slot_operands();
        if refs >= 1 {
            self.check_reference(instruction.lhs);
        }
        if refs == 2 {
            self.check_reference(instruction.rhs);
        }
        let slot = Slot::new(self.instructions.len() as u32);
        self.instructions.push(instruction);
        slot
    }

    /// X coordinate leaf
    pub fn x(&mut self) -> Slot {
        self.push(Instruction::x())
    }

    /// Y coordinate leaf
    pub fn y(&mut self) -> Slot {
        self.push(Instruction::y())
    }

    /// Z coordinate leaf
    pub fn z(&mut self) -> Slot {
        self.push(Instruction::z())
    }

    /// Immediate constant
    pub fn constant(&mut self, value: f32) -> Slot {
        self.push(Instruction::constant(value))
    }

    /// Negation of `a`
    pub fn neg(&mut self, a: Slot) -> Slot {
        self.push(Instruction::neg(a))
    }

    /// Absolute value of `a`
    pub fn abs(&mut self, a: Slot) -> Slot {
        self.push(Instruction::abs(a))
    }

    /// Square of `a`
    pub fn square(&mut self, a: Slot) -> Slot {
        self.push(Instruction::square(a))
    }

    /// Square root of `a`
    pub fn sqrt(&mut self, a: Slot) -> Slot {
        self.push(Instruction::sqrt(a))
    }

    /// Sine of `a` (radians)
    pub fn sin(&mut self, a: Slot) -> Slot {
        self.push(Instruction::sin(a))
    }

    /// Cosine of `a` (radians)
    pub fn cos(&mut self, a: Slot) -> Slot {
        self.push(Instruction::cos(a))
    }

    /// `a + b`
    pub fn add(&mut self, a: Slot, b: Slot) -> Slot {
        self.push(Instruction::add(a, b))
    }

    /// `a - b`
    pub fn sub(&mut self, a: Slot, b: Slot) -> Slot {
        self.push(Instruction::sub(a, b))
    }

    /// `a * b`
    pub fn mul(&mut self, a: Slot, b: Slot) -> Slot {
        self.push(Instruction::mul(a, b))
    }

    /// `a / b`
    pub fn div(&mut self, a: Slot, b: Slot) -> Slot {
        self.push(Instruction::div(a, b))
    }

    /// `min(a, b)`
    pub fn min(&mut self, a: Slot, b: Slot) -> Slot {
        self.push(Instruction::min(a, b))
    }

    /// `max(a, b)`
    pub fn max(&mut self, a: Slot, b: Slot) -> Slot {
        self.push(Instruction::max(a, b))
    }

    /// Slots minted so far
    pub fn slot_count(&self) -> usize {
        self.instructions.len()
    }

    /// Split the instruction stream into segments and validate the chain
    pub fn build(self) -> Result<Tape, TapeError> {
        if self.instructions.is_empty() {
            return Err(TapeError::Empty);
        }
        let segments = self
            .instructions
            .chunks(self.segment_capacity)
            .map(|chunk| TapeSegment::new(chunk.to_vec()))
            .collect::<Result<Vec<_>, _>>()?;
        Tape::from_segments(segments)
    }

    fn check_reference(&self, operand: f32) {
        let count = self.instructions.len();
        assert!(
            operand >= 0.0 && operand.fract() == 0.0 && (operand as usize) < count,
            "slot reference {} is not a slot of this builder ({} slots exist)",
            operand,
            count
        );
    }
}

impl Default for TapeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
