//! # ALICE-ATLAS
//!
//! **A.T.L.A.S. - Accumulative Tape Layout And Sampling**
//!
//! GPU evaluation of compiled math tapes. Expressions are flattened into
//! instruction tapes, split into capacity-bounded segments, and streamed
//! through two fixed compute passes (Eval, then Blit) that accumulate every
//! node's value for every sample point into a persistent atlas. Later
//! segments resolve their operands from the atlas, so chains of any length
//! run on fixed device capacity, and downstream consumers can index any
//! intermediate value directly.
//!
//! ## Features
//!
//! - **Tape construction**: expression-style builder with slot handles and
//!   automatic segment splitting
//! - **CPU reference**: sequential and rayon-parallel evaluation, plus a
//!   cell-exact CPU mirror of the GPU atlas
//! - **GPU pipeline** (feature `gpu`, default): wgpu compute passes, one
//!   context shared by many jobs, sync and async readback
//! - **Persistence**: JSON tape save/load, chain-validated on decode
//!
//! ## Example
//!
//! ```
//! use alice_atlas::prelude::*;
//!
//! // distance to a unit sphere: sqrt(x^2 + y^2 + z^2) - 1
//! let mut b = TapeBuilder::new();
//! let x = b.x();
//! let y = b.y();
//! let z = b.z();
//! let xx = b.square(x);
//! let yy = b.square(y);
//! let zz = b.square(z);
//! let xy = b.add(xx, yy);
//! let r2 = b.add(xy, zz);
//! let r = b.sqrt(r2);
//! let one = b.constant(1.0);
//! b.sub(r, one);
//! let tape = b.build().unwrap();
//!
//! let d = eval_tape(&tape, Vec3::new(2.0, 0.0, 0.0));
//! assert!((d - 1.0).abs() < 1e-6);
//! ```
//!
//! The GPU path mirrors this cell-for-cell; see [`pipeline`] for the
//! two-pass design.
//!
//! Author: Moroya Sakamoto

#![warn(missing_docs)]

pub mod eval;
pub mod io;
pub mod sampling;
pub mod tape;

#[cfg(feature = "gpu")]
pub mod pipeline;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Convenient re-exports for common usage
pub mod prelude {
    //! Import everything needed for typical tape evaluation workflows

    // Tape construction
    pub use crate::tape::{
        Instruction, OpCode, Slot, Tape, TapeBuilder, TapeError, TapeSegment, SEGMENT_CAPACITY,
    };

    // CPU reference evaluation
    pub use crate::eval::{
        eval_atlas, eval_slots, eval_tape, eval_tape_batch, eval_tape_batch_parallel,
    };

    // Sample-block generation
    pub use crate::sampling::{sample_grid, sample_line, sample_slice};

    // Persistence
    pub use crate::io::{load_tape, save_tape, IoError};

    // GPU pipeline
    #[cfg(feature = "gpu")]
    pub use crate::pipeline::{ChainPosition, PipelineContext, PipelineError, RenderJob};

    // Math types
    pub use glam::Vec3;
}

pub use eval::{eval_atlas, eval_slots, eval_tape, eval_tape_batch, eval_tape_batch_parallel};
pub use tape::{
    Instruction, OpCode, Slot, Tape, TapeBuilder, TapeError, TapeSegment, SEGMENT_CAPACITY,
};

#[cfg(feature = "gpu")]
pub use pipeline::{PipelineContext, RenderJob};

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_version() {
        assert!(!crate::VERSION.is_empty());
    }

    #[test]
    fn test_basic_workflow() {
        // Build, evaluate, persist, reload.
        let mut b = TapeBuilder::new();
        let x = b.x();
        let y = b.y();
        let s = b.sin(x);
        let c = b.cos(y);
        b.mul(s, c);
        let tape = b.build().unwrap();

        let v = eval_tape(&tape, Vec3::new(0.5, 0.25, 0.0));
        assert!((v - 0.5f32.sin() * 0.25f32.cos()).abs() < 1e-6);

        let json = crate::io::to_json_string(&tape).unwrap();
        let reloaded = crate::io::from_json_string(&json).unwrap();
        assert_eq!(reloaded, tape);
    }

    #[test]
    fn test_multi_segment_workflow() {
        let mut b = TapeBuilder::with_segment_capacity(2).unwrap();
        let x = b.x();
        let xx = b.square(x);
        let x4 = b.square(xx);
        b.sqrt(x4);
        let tape = b.build().unwrap();

        assert_eq!(tape.segment_count(), 2);
        let v = eval_tape(&tape, Vec3::new(3.0, 0.0, 0.0));
        assert!((v - 9.0).abs() < 1e-5);
    }
}
