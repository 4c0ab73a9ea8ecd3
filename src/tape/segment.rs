//! Segments and chains
//!
//! A tape longer than the device capacity is split into segments; each
//! segment is one Eval/Blit round trip on the GPU. Slot references are
//! global across the whole chain, so validation is chain-wide: every operand
//! must point at a strictly earlier slot.
//!
//! Author: Moroya Sakamoto

use super::Instruction;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum instructions per segment.
///
/// This is the size of the per-thread register file in the Eval shader, fixed
/// when the pipeline is compiled, so it is a hard device capacity rather than
/// a tuning knob.
pub const SEGMENT_CAPACITY: usize = 256;

/// Tape construction and validation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TapeError {
    /// A segment holds more instructions than the device capacity
    #[error("segment holds {node_count} instructions but device capacity is {capacity}")]
    CapacityExceeded {
        /// Instructions in the offending segment
        node_count: usize,
        /// Device capacity (register file size)
        capacity: usize,
    },

    /// An operand references a slot at or past the instruction itself
    #[error("instruction at slot {slot} references slot {operand}, which is not an earlier slot")]
    ForwardReference {
        /// Global slot of the offending instruction
        slot: usize,
        /// The referenced slot
        operand: usize,
    },

    /// A slot-reference operand is not a non-negative integer
    #[error("instruction at slot {slot} has malformed slot reference {operand}")]
    MalformedOperand {
        /// Global slot of the offending instruction
        slot: usize,
        /// Raw operand value
        operand: f32,
    },

    /// A tape or segment holds no instructions
    #[error("tape holds no instructions")]
    Empty,

    /// Requested segment capacity is out of range
    #[error("segment capacity must be between 1 and {max}, got {requested}")]
    InvalidCapacity {
        /// Requested capacity
        requested: usize,
        /// Device capacity
        max: usize,
    },
}

/// A capacity-bounded run of instructions: one Eval/Blit round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TapeSegment {
    instructions: Vec<Instruction>,
}

impl TapeSegment {
    /// Build a segment, checking the device capacity bound
    pub fn new(instructions: Vec<Instruction>) -> Result<Self, TapeError> {
        if instructions.is_empty() {
            return Err(TapeError::Empty);
        }
        if instructions.len() > SEGMENT_CAPACITY {
            return Err(TapeError::CapacityExceeded {
                node_count: instructions.len(),
                capacity: SEGMENT_CAPACITY,
            });
        }
        Ok(TapeSegment { instructions })
    }

    /// Number of instructions (atlas rows this segment produces)
    #[inline]
    pub fn node_count(&self) -> usize {
        self.instructions.len()
    }

    /// The instructions, in evaluation order
    #[inline]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }
}

/// A compiled tape: an owned, ordered sequence of segments.
///
/// Instruction `j` of segment `i` computes global slot
/// `start_slot(i) + j`. Every way a `Tape` comes into being validates the
/// chain: [`from_segments`](Tape::from_segments) and
/// [`TapeBuilder`](super::TapeBuilder) directly, deserialization by
/// converting through `from_segments`. Evaluators rely on this and index
/// slots unchecked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTape")]
pub struct Tape {
    segments: Vec<TapeSegment>,
}

impl Tape {
    /// Build a chain from explicit segments, validating it chain-wide
    pub fn from_segments(segments: Vec<TapeSegment>) -> Result<Self, TapeError> {
        let tape = Tape { segments };
        tape.validate()?;
        Ok(tape)
    }

    /// Check capacity bounds and operand ordering across the whole chain
    pub fn validate(&self) -> Result<(), TapeError> {
        if self.segments.is_empty() {
            return Err(TapeError::Empty);
        }

        let mut slot = 0usize;
        for segment in &self.segments {
            if segment.node_count() == 0 {
                return Err(TapeError::Empty);
            }
            if segment.node_count() > SEGMENT_CAPACITY {
                return Err(TapeError::CapacityExceeded {
                    node_count: segment.node_count(),
                    capacity: SEGMENT_CAPACITY,
                });
            }
            for instruction in segment.instructions() {
                let refs = instruction.opcode.slot_operands();
                if refs >= 1 {
                    check_reference(instruction.lhs, slot)?;
                }
                if refs == 2 {
                    check_reference(instruction.rhs, slot)?;
                }
                slot += 1;
            }
        }
        Ok(())
    }

    /// Segments in chain order
    #[inline]
    pub fn segments(&self) -> &[TapeSegment] {
        &self.segments
    }

    /// Number of segments in the chain
    #[inline]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Total instruction count: the number of atlas rows a job allocates
    pub fn slot_count(&self) -> usize {
        self.segments.iter().map(|s| s.node_count()).sum()
    }

    /// Largest segment in the chain: the number of scratch rows a job allocates
    pub fn max_segment_len(&self) -> usize {
        self.segments
            .iter()
            .map(|s| s.node_count())
            .max()
            .unwrap_or(0)
    }

    /// Global slot of the first instruction of segment `index`
    ///
    /// # Panics
    /// Panics if `index` is out of range.
    pub fn start_slot(&self, index: usize) -> usize {
        assert!(
            index < self.segments.len(),
            "segment index {} out of range ({} segments)",
            index,
            self.segments.len()
        );
        self.segments[..index].iter().map(|s| s.node_count()).sum()
    }

    /// GPU tape memory footprint in bytes (16 bytes per instruction)
    pub fn memory_size(&self) -> usize {
        self.slot_count() * 16
    }
}

/// Wire shape of [`Tape`]: what actually sits in a JSON document.
///
/// Decoding stops here; admission into a live `Tape` goes through
/// [`Tape::from_segments`], so a chain that parses but does not validate is
/// a decode error, not a tape.
#[derive(Deserialize)]
pub(crate) struct RawTape {
    pub(crate) segments: Vec<TapeSegment>,
}

impl TryFrom<RawTape> for Tape {
    type Error = TapeError;

    fn try_from(raw: RawTape) -> Result<Self, TapeError> {
        Tape::from_segments(raw.segments)
    }
}

fn check_reference(operand: f32, slot: usize) -> Result<(), TapeError> {
    if operand.is_nan() || operand < 0.0 || operand.fract() != 0.0 {
        return Err(TapeError::MalformedOperand { slot, operand });
    }
    if operand as usize >= slot {
        return Err(TapeError::ForwardReference {
            slot,
            operand: operand as usize,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tape::Slot;

    #[test]
    fn test_segment_capacity_bound() {
        let over: Vec<Instruction> = (0..SEGMENT_CAPACITY + 1)
            .map(|_| Instruction::x())
            .collect();
        let err = TapeSegment::new(over).unwrap_err();
        assert_eq!(
            err,
            TapeError::CapacityExceeded {
                node_count: SEGMENT_CAPACITY + 1,
                capacity: SEGMENT_CAPACITY,
            }
        );

        assert_eq!(TapeSegment::new(Vec::new()).unwrap_err(), TapeError::Empty);
    }

    #[test]
    fn test_forward_reference_rejected() {
        // slot 1 references slot 5, which does not exist yet
        let segment = TapeSegment::new(vec![
            Instruction::x(),
            Instruction::add(Slot::new(0), Slot::new(5)),
        ])
        .unwrap();
        let err = Tape::from_segments(vec![segment]).unwrap_err();
        assert_eq!(err, TapeError::ForwardReference { slot: 1, operand: 5 });
    }

    #[test]
    fn test_self_reference_rejected() {
        let segment = TapeSegment::new(vec![
            Instruction::x(),
            Instruction::neg(Slot::new(1)),
        ])
        .unwrap();
        let err = Tape::from_segments(vec![segment]).unwrap_err();
        assert_eq!(err, TapeError::ForwardReference { slot: 1, operand: 1 });
    }

    #[test]
    fn test_malformed_operand_rejected() {
        let bad = Instruction {
            opcode: crate::tape::OpCode::Neg,
            lhs: 0.5,
            rhs: 0.0,
        };
        let segment = TapeSegment::new(vec![Instruction::x(), bad]).unwrap();
        let err = Tape::from_segments(vec![segment]).unwrap_err();
        assert!(matches!(err, TapeError::MalformedOperand { slot: 1, .. }));
    }

    #[test]
    fn test_deserialize_validates_chain() {
        // Raw JSON is admitted through from_segments: a chain that decodes
        // is a chain that evaluates, even when serde is called directly.
        let good = Tape::from_segments(vec![TapeSegment::new(vec![
            Instruction::x(),
            Instruction::neg(Slot::new(0)),
        ])
        .unwrap()])
        .unwrap();
        let json = serde_json::to_string(&good).unwrap();
        assert_eq!(serde_json::from_str::<Tape>(&json).unwrap(), good);

        // Same shape, but slot 1 now references slot 5.
        let mut value = serde_json::to_value(&good).unwrap();
        value["segments"][0]["instructions"][1]["lhs"] = serde_json::json!(5.0);
        let err = serde_json::from_value::<Tape>(value).unwrap_err();
        assert!(err.to_string().contains("not an earlier slot"), "{}", err);

        let err = serde_json::from_str::<Tape>(r#"{"segments":[]}"#).unwrap_err();
        assert!(err.to_string().contains("no instructions"), "{}", err);
    }

    #[test]
    fn test_cross_segment_reference_allowed() {
        let first = TapeSegment::new(vec![Instruction::x(), Instruction::y()]).unwrap();
        let second =
            TapeSegment::new(vec![Instruction::add(Slot::new(0), Slot::new(1))]).unwrap();
        let tape = Tape::from_segments(vec![first, second]).unwrap();

        assert_eq!(tape.segment_count(), 2);
        assert_eq!(tape.slot_count(), 3);
        assert_eq!(tape.max_segment_len(), 2);
        assert_eq!(tape.start_slot(0), 0);
        assert_eq!(tape.start_slot(1), 2);
        assert_eq!(tape.memory_size(), 48);
    }
}
