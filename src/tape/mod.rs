//! Compiled math tapes
//!
//! A tape is a flat, pre-ordered instruction stream: expression trees are
//! flattened so that every operand refers to a *slot*, the global index of an
//! earlier instruction. Flat tapes are what make GPU evaluation possible at
//! all: the program becomes random-access data in a storage buffer instead of
//! shader control flow, so one fixed pipeline evaluates every tape.
//!
//! # Chain layout
//!
//! ```text
//! tape:        [ segment 0 ][ segment 1 ][ segment 2 ]
//! node_count:       3             3            1
//! global slot:   0  1  2       3  4  5         6
//! ```
//!
//! Tapes longer than [`SEGMENT_CAPACITY`] are split into segments; each
//! segment is one Eval/Blit round trip and may reference any slot of an
//! earlier segment (resolved through the atlas at evaluation time).
//!
//! # Instruction format
//!
//! ```text
//! +--------+--------+--------+
//! | opcode |  lhs   |  rhs   |   3 x 32 bits
//! +--------+--------+--------+
//!   u32      f32      f32       operands: immediates or slot indices
//! ```
//!
//! # Example
//!
//! ```
//! use alice_atlas::tape::TapeBuilder;
//!
//! // sqrt(x^2 + y^2) - 1: a unit circle distance field
//! let mut b = TapeBuilder::new();
//! let x = b.x();
//! let y = b.y();
//! let xx = b.square(x);
//! let yy = b.square(y);
//! let r2 = b.add(xx, yy);
//! let r = b.sqrt(r2);
//! let one = b.constant(1.0);
//! b.sub(r, one);
//!
//! let tape = b.build().unwrap();
//! assert_eq!(tape.slot_count(), 8);
//! assert_eq!(tape.segment_count(), 1);
//! ```
//!
//! Author: Moroya Sakamoto

mod builder;
mod instruction;
mod opcode;
mod segment;

pub use builder::TapeBuilder;
pub use instruction::{Instruction, Slot};
pub use opcode::OpCode;
pub use segment::{Tape, TapeError, TapeSegment, SEGMENT_CAPACITY};

pub(crate) use segment::RawTape;
