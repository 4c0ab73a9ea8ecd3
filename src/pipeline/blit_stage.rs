//! Blit pass encoding
//!
//! Copies scratch rows into atlas rows `start_slot..start_slot+node_count`,
//! tiling the block's columns across the full atlas width. The atlas clear
//! happens here, once per job, decided by [`ChainPosition`] rather than by
//! peeking at slot offsets.
//!
//! Author: Moroya Sakamoto

use super::job::{RenderJob, SegmentPass};
use super::shaders::BLIT_WORKGROUP_DIM;
use super::PipelineContext;

/// Position of a segment within its chain.
///
/// Decides the atlas clear policy: the atlas is cleared exactly once per
/// job, before the first segment's blit, and continuation blits must leave
/// earlier rows untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainPosition {
    /// First segment of a job: clear the atlas before blitting
    FirstOfChain,
    /// Any later segment: accumulate, preserving earlier rows
    Continuation,
}

impl ChainPosition {
    /// Position of the segment at `index` within its chain
    #[inline]
    pub fn for_index(index: usize) -> Self {
        if index == 0 {
            ChainPosition::FirstOfChain
        } else {
            ChainPosition::Continuation
        }
    }

    /// Whether the atlas is cleared before this segment's blit
    #[inline]
    pub fn clears_atlas(self) -> bool {
        self == ChainPosition::FirstOfChain
    }
}

pub(crate) fn encode(
    ctx: &PipelineContext,
    encoder: &mut wgpu::CommandEncoder,
    job: &RenderJob,
    segment: &SegmentPass,
    position: ChainPosition,
) {
    if position.clears_atlas() {
        encoder.clear_buffer(&job.atlas_buffer, 0, None);
    }

    let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
        label: Some("Atlas Blit Pass"),
        timestamp_writes: None,
    });
    pass.set_pipeline(&ctx.blit_pipeline);
    pass.set_bind_group(0, &segment.blit_bind_group, &[]);

    let cols = job.atlas_cols() as u32;
    let x = (cols + BLIT_WORKGROUP_DIM - 1) / BLIT_WORKGROUP_DIM;
    let y = (segment.node_count + BLIT_WORKGROUP_DIM - 1) / BLIT_WORKGROUP_DIM;
    pass.dispatch_workgroups(x, y, 1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_position_from_index() {
        assert_eq!(ChainPosition::for_index(0), ChainPosition::FirstOfChain);
        assert_eq!(ChainPosition::for_index(1), ChainPosition::Continuation);
        assert_eq!(ChainPosition::for_index(17), ChainPosition::Continuation);
    }

    #[test]
    fn test_clear_policy() {
        assert!(ChainPosition::FirstOfChain.clears_atlas());
        assert!(!ChainPosition::Continuation.clears_atlas());
    }
}
