//! Eval pass encoding
//!
//! Clears scratch, then dispatches one thread per sample column to walk the
//! segment's instructions. The clear is unconditional: scratch is transient
//! per-segment state and must never leak rows from a larger earlier segment.
//!
//! Author: Moroya Sakamoto

use super::job::{RenderJob, SegmentPass};
use super::shaders::EVAL_WORKGROUP_SIZE;
use super::PipelineContext;

pub(crate) fn encode(
    ctx: &PipelineContext,
    encoder: &mut wgpu::CommandEncoder,
    job: &RenderJob,
    segment: &SegmentPass,
) {
    encoder.clear_buffer(&job.scratch_buffer, 0, None);

    let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
        label: Some("Tape Eval Pass"),
        timestamp_writes: None,
    });
    pass.set_pipeline(&ctx.eval_pipeline);
    pass.set_bind_group(0, &segment.eval_bind_group, &[]);

    let workgroups = (job.block_size() as u32 + EVAL_WORKGROUP_SIZE - 1) / EVAL_WORKGROUP_SIZE;
    pass.dispatch_workgroups(workgroups, 1, 1);
}
