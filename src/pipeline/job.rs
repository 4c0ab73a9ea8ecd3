//! Render jobs
//!
//! A job binds one tape chain to one block geometry and owns every GPU
//! buffer the passes touch: samples, scratch, atlas, plus per-segment tape
//! words and pass params. Buffers are created once at job construction and
//! reused across runs; only the sample upload moves per run.
//!
//! Author: Moroya Sakamoto

use super::shaders::{BLIT_WORKGROUP_DIM, EVAL_WORKGROUP_SIZE};
use super::{PipelineContext, PipelineError};
use crate::tape::{Tape, TapeSegment};
use glam::Vec3;
use std::sync::Arc;
use wgpu::util::DeviceExt;

/// Sample point as laid out in the samples storage buffer (16 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct GpuSample {
    x: f32,
    y: f32,
    z: f32,
    _pad: f32,
}

impl From<Vec3> for GpuSample {
    fn from(v: Vec3) -> Self {
        GpuSample {
            x: v.x,
            y: v.y,
            z: v.z,
            _pad: 0.0,
        }
    }
}

/// Tape word as laid out in the tape storage buffer (16 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct TapeOp {
    op: u32,
    lhs: f32,
    rhs: f32,
    _pad: u32,
}

/// Per-pass uniform block, shared by the Eval and Blit shaders (16 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct PassParams {
    node_count: u32,
    start_slot: u32,
    block_size: u32,
    block_count: u32,
}

/// One segment's GPU-resident state: its word buffer is immutable, its pass
/// params carry the precomputed start slot, and both bind groups are built
/// once here.
pub(crate) struct SegmentPass {
    pub(crate) node_count: u32,
    pub(crate) start_slot: u32,
    pub(crate) eval_bind_group: wgpu::BindGroup,
    pub(crate) blit_bind_group: wgpu::BindGroup,
}

/// A tape chain bound to block geometry and device buffers.
pub struct RenderJob {
    tape: Arc<Tape>,
    block_size: usize,
    block_count: usize,
    pub(crate) samples_buffer: wgpu::Buffer,
    pub(crate) scratch_buffer: wgpu::Buffer,
    pub(crate) atlas_buffer: wgpu::Buffer,
    pub(crate) segments: Vec<SegmentPass>,
}

impl RenderJob {
    /// Build a job: validate the tape, check the geometry against the
    /// device's limits, size the buffers, and create one bind-group pair per
    /// segment.
    pub fn new(
        ctx: &PipelineContext,
        tape: Arc<Tape>,
        block_size: usize,
        block_count: usize,
    ) -> Result<Self, PipelineError> {
        if block_size == 0 || block_count == 0 {
            return Err(PipelineError::EmptyBlock);
        }
        tape.validate()?;
        check_device_limits(&tape, block_size, block_count, &ctx.device.limits())?;

        let atlas_cols = block_size * block_count;
        let node_max = tape.max_segment_len();

        let samples_buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Sample Points Buffer"),
            size: (block_size * std::mem::size_of::<GpuSample>()) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let scratch_buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Scratch Buffer"),
            size: (node_max * block_size * std::mem::size_of::<f32>()) as u64,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let atlas_buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Atlas Buffer"),
            size: (tape.slot_count() * atlas_cols * std::mem::size_of::<f32>()) as u64,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let mut segments = Vec::with_capacity(tape.segment_count());
        let mut start_slot = 0u32;
        for segment in tape.segments() {
            let node_count = segment.node_count() as u32;

            let tape_buffer = ctx
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Tape Segment Buffer"),
                    contents: bytemuck::cast_slice(&pack_segment(segment)),
                    usage: wgpu::BufferUsages::STORAGE,
                });

            let params = PassParams {
                node_count,
                start_slot,
                block_size: block_size as u32,
                block_count: block_count as u32,
            };
            let params_buffer = ctx
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Pass Params Buffer"),
                    contents: bytemuck::cast_slice(&[params]),
                    usage: wgpu::BufferUsages::UNIFORM,
                });

            let eval_bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Tape Eval Bind Group"),
                layout: &ctx.eval_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: tape_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: samples_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: atlas_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: scratch_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 4,
                        resource: params_buffer.as_entire_binding(),
                    },
                ],
            });

            let blit_bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Atlas Blit Bind Group"),
                layout: &ctx.blit_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: scratch_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: atlas_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: params_buffer.as_entire_binding(),
                    },
                ],
            });

            segments.push(SegmentPass {
                node_count,
                start_slot,
                eval_bind_group,
                blit_bind_group,
            });
            start_slot += node_count;
        }

        Ok(RenderJob {
            tape,
            block_size,
            block_count,
            samples_buffer,
            scratch_buffer,
            atlas_buffer,
            segments,
        })
    }

    /// The tape this job evaluates
    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    /// Samples per block
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Blocks across the atlas
    pub fn block_count(&self) -> usize {
        self.block_count
    }

    /// Atlas rows (total slot count of the chain)
    pub fn atlas_rows(&self) -> usize {
        self.tape.slot_count()
    }

    /// Atlas columns (`block_size * block_count`)
    pub fn atlas_cols(&self) -> usize {
        self.block_size * self.block_count
    }

    /// Atlas cell count
    pub fn atlas_len(&self) -> usize {
        self.atlas_rows() * self.atlas_cols()
    }

    /// Scratch cell count (`max_segment_len * block_size`)
    pub fn scratch_len(&self) -> usize {
        self.tape.max_segment_len() * self.block_size
    }
}

// The passes bind each buffer in its entirety, so allocations are capped by
// the storage binding limit as well as the raw buffer limit.
fn check_device_limits(
    tape: &Tape,
    block_size: usize,
    block_count: usize,
    limits: &wgpu::Limits,
) -> Result<(), PipelineError> {
    let cell = std::mem::size_of::<f32>() as u64;
    let cols = (block_size as u64).saturating_mul(block_count as u64);
    let buffer_cap = (limits.max_storage_buffer_binding_size as u64).min(limits.max_buffer_size);

    check_limit(
        "samples buffer bytes",
        (block_size as u64).saturating_mul(std::mem::size_of::<GpuSample>() as u64),
        buffer_cap,
    )?;
    check_limit(
        "scratch buffer bytes",
        (tape.max_segment_len() as u64)
            .saturating_mul(block_size as u64)
            .saturating_mul(cell),
        buffer_cap,
    )?;
    check_limit(
        "atlas buffer bytes",
        (tape.slot_count() as u64)
            .saturating_mul(cols)
            .saturating_mul(cell),
        buffer_cap,
    )?;

    // Blit rows per dispatch are bounded by SEGMENT_CAPACITY; only the
    // column dimensions scale with the block geometry.
    let max_groups = limits.max_compute_workgroups_per_dimension as u64;
    let eval = EVAL_WORKGROUP_SIZE as u64;
    check_limit(
        "eval pass workgroups",
        (block_size as u64).saturating_add(eval - 1) / eval,
        max_groups,
    )?;
    let blit = BLIT_WORKGROUP_DIM as u64;
    check_limit(
        "blit pass workgroups",
        cols.saturating_add(blit - 1) / blit,
        max_groups,
    )?;

    Ok(())
}

fn check_limit(what: &'static str, required: u64, allowed: u64) -> Result<(), PipelineError> {
    if required > allowed {
        return Err(PipelineError::JobTooLarge {
            what,
            required,
            allowed,
        });
    }
    Ok(())
}

fn pack_segment(segment: &TapeSegment) -> Vec<TapeOp> {
    segment
        .instructions()
        .iter()
        .map(|i| TapeOp {
            op: i.opcode as u32,
            lhs: i.lhs,
            rhs: i.rhs,
            _pad: 0,
        })
        .collect()
}
