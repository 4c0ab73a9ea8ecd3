//! GPU tape evaluation pipeline
//!
//! Two fixed compute passes per segment, accumulating into a persistent
//! atlas:
//!
//! ```text
//!             +-----------------------------------------------+
//!  samples -->|  Eval pass   tape x samples -> scratch         |
//!             |    (scratch cleared every call)                |
//!             +-----------------------------------------------+
//!                                 |
//!                                 v
//!             +-----------------------------------------------+
//!             |  Blit pass   scratch -> atlas rows             |
//!             |    (atlas cleared iff first segment of chain)  |
//!             +-----------------------------------------------+
//!                                 |
//!                                 v
//!               atlas: slot_count x (block_size * block_count)
//! ```
//!
//! Later segments read earlier segments' values straight from the atlas, so
//! a chain of any length evaluates with fixed device capacity. One
//! [`PipelineContext`] (device, queue, compiled passes) serves any number of
//! [`RenderJob`]s; a job owns the buffers for one tape + block geometry and
//! is re-run cheaply as samples move.
//!
//! # Example
//!
//! ```ignore
//! use alice_atlas::prelude::*;
//! use std::sync::Arc;
//!
//! let ctx = PipelineContext::new()?;
//! let job = RenderJob::new(&ctx, Arc::new(tape), 64, 1)?;
//! ctx.run_job(&job, &samples)?;
//! let atlas = ctx.read_atlas(&job)?;
//! ```
//!
//! Author: Moroya Sakamoto

mod blit_stage;
mod context;
pub mod debug;
mod driver;
mod eval_stage;
mod job;
mod shaders;

pub use blit_stage::ChainPosition;
pub use context::PipelineContext;
pub use job::RenderJob;

use crate::tape::TapeError;
use thiserror::Error;

/// GPU pipeline errors
#[derive(Error, Debug)]
pub enum PipelineError {
    /// No suitable GPU adapter found
    #[error("No suitable GPU adapter found")]
    NoAdapter,

    /// Device creation failed
    #[error("Failed to create GPU device: {0}")]
    DeviceCreation(String),

    /// Buffer mapping failed during readback
    #[error("Buffer mapping failed: {0}")]
    BufferMapping(String),

    /// The tape failed chain validation
    #[error("Invalid tape: {0}")]
    InvalidTape(#[from] TapeError),

    /// Sample count does not match the job's block size
    #[error("Job expects {expected} samples per block, got {actual}")]
    SampleCountMismatch {
        /// The job's block size
        expected: usize,
        /// Samples supplied to the run
        actual: usize,
    },

    /// Block size and block count must be non-zero
    #[error("Block size and block count must be non-zero")]
    EmptyBlock,

    /// A job buffer or dispatch exceeds what the device reports it can do
    #[error("Job exceeds device limit: {what} needs {required}, device allows {allowed}")]
    JobTooLarge {
        /// Which resource hit the limit
        what: &'static str,
        /// Required amount (bytes or workgroups)
        required: u64,
        /// The device's reported limit
        allowed: u64,
    },
}
