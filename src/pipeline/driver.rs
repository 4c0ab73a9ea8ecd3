//! Job driver
//!
//! Walks the chain in order, encoding Eval then Blit per segment and
//! submitting as it goes. Ordering between a segment's blit and the next
//! segment's eval (which reads the atlas rows just written) is carried by
//! queue submission order; the driver never blocks until readback.
//!
//! Author: Moroya Sakamoto

use super::blit_stage::{self, ChainPosition};
use super::eval_stage;
use super::job::{GpuSample, RenderJob};
use super::{PipelineContext, PipelineError};
use glam::Vec3;

impl PipelineContext {
    /// Run the full chain: upload samples, then Eval + Blit every segment.
    ///
    /// Samples are uploaded on every run, even when unchanged since the last
    /// one. The atlas is cleared before the first segment's blit and then
    /// accumulates rows until the job completes.
    pub fn run_job(&self, job: &RenderJob, samples: &[Vec3]) -> Result<(), PipelineError> {
        if samples.len() != job.block_size() {
            return Err(PipelineError::SampleCountMismatch {
                expected: job.block_size(),
                actual: samples.len(),
            });
        }

        let upload: Vec<GpuSample> = samples.iter().map(|&p| p.into()).collect();
        self.queue
            .write_buffer(&job.samples_buffer, 0, bytemuck::cast_slice(&upload));

        let mut next_slot = 0u32;
        for (index, segment) in job.segments.iter().enumerate() {
            debug_assert_eq!(segment.start_slot, next_slot);

            let mut encoder = self
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Tape Segment Encoder"),
                });

            eval_stage::encode(self, &mut encoder, job, segment);
            blit_stage::encode(
                self,
                &mut encoder,
                job,
                segment,
                ChainPosition::for_index(index),
            );

            self.queue.submit(std::iter::once(encoder.finish()));
            next_slot += segment.node_count;
        }

        Ok(())
    }

    /// Read the atlas back as row-major floats (blocking)
    pub fn read_atlas(&self, job: &RenderJob) -> Result<Vec<f32>, PipelineError> {
        self.read_buffer_f32(&job.atlas_buffer, job.atlas_len())
    }

    /// Read the atlas back as row-major floats (async)
    pub async fn read_atlas_async(&self, job: &RenderJob) -> Result<Vec<f32>, PipelineError> {
        self.read_buffer_f32_async(&job.atlas_buffer, job.atlas_len())
            .await
    }

    /// Read the scratch buffer back (diagnostics; holds the last segment's
    /// eval output after a run)
    pub fn read_scratch(&self, job: &RenderJob) -> Result<Vec<f32>, PipelineError> {
        self.read_buffer_f32(&job.scratch_buffer, job.scratch_len())
    }

    fn read_buffer_f32(
        &self,
        source: &wgpu::Buffer,
        count: usize,
    ) -> Result<Vec<f32>, PipelineError> {
        let size = (count * std::mem::size_of::<f32>()) as u64;

        let staging_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Staging Buffer"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Readback Encoder"),
            });
        encoder.copy_buffer_to_buffer(source, 0, &staging_buffer, 0, size);
        self.queue.submit(std::iter::once(encoder.finish()));

        let buffer_slice = staging_buffer.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });

        self.device.poll(wgpu::Maintain::Wait);

        receiver
            .recv()
            .map_err(|e| PipelineError::BufferMapping(e.to_string()))?
            .map_err(|e| PipelineError::BufferMapping(format!("{:?}", e)))?;

        let data = buffer_slice.get_mapped_range();
        let values: Vec<f32> = bytemuck::cast_slice(&data).to_vec();

        drop(data);
        staging_buffer.unmap();

        Ok(values)
    }

    async fn read_buffer_f32_async(
        &self,
        source: &wgpu::Buffer,
        count: usize,
    ) -> Result<Vec<f32>, PipelineError> {
        let size = (count * std::mem::size_of::<f32>()) as u64;

        let staging_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Staging Buffer"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Readback Encoder"),
            });
        encoder.copy_buffer_to_buffer(source, 0, &staging_buffer, 0, size);
        self.queue.submit(std::iter::once(encoder.finish()));

        let buffer_slice = staging_buffer.slice(..);
        let (sender, receiver) = futures_channel::oneshot::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });

        self.device.poll(wgpu::Maintain::Wait);

        receiver
            .await
            .map_err(|_| PipelineError::BufferMapping("Channel closed".to_string()))?
            .map_err(|e| PipelineError::BufferMapping(format!("{:?}", e)))?;

        let data = buffer_slice.get_mapped_range();
        let values: Vec<f32> = bytemuck::cast_slice(&data).to_vec();

        drop(data);
        staging_buffer.unmap();

        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::eval_atlas;
    use crate::tape::TapeBuilder;
    use std::sync::Arc;

    fn has_gpu() -> bool {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
        pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions::default()))
            .is_some()
    }

    fn circle_samples(count: usize) -> Vec<Vec3> {
        (0..count)
            .map(|i| Vec3::new(i as f32 * 0.25 - 1.0, i as f32 * 0.125, 0.0))
            .collect()
    }

    #[test]
    fn test_single_segment_matches_cpu() {
        if !has_gpu() {
            eprintln!("Skipping GPU test: no GPU available");
            return;
        }

        // sqrt(x^2 + y^2) - 1
        let mut b = TapeBuilder::new();
        let x = b.x();
        let y = b.y();
        let xx = b.square(x);
        let yy = b.square(y);
        let r2 = b.add(xx, yy);
        let r = b.sqrt(r2);
        let one = b.constant(1.0);
        b.sub(r, one);
        let tape = Arc::new(b.build().unwrap());

        let ctx = PipelineContext::new().unwrap();
        let job = RenderJob::new(&ctx, tape.clone(), 8, 1).unwrap();
        let samples = circle_samples(8);

        ctx.run_job(&job, &samples).unwrap();
        let gpu = ctx.read_atlas(&job).unwrap();
        let cpu = eval_atlas(&tape, &samples, 1);

        assert_eq!(gpu.len(), cpu.len());
        for (i, (&g, &c)) in gpu.iter().zip(cpu.iter()).enumerate() {
            assert!(
                (g - c).abs() < 1e-4,
                "atlas cell {} diverged: gpu={}, cpu={}",
                i,
                g,
                c
            );
        }
    }

    #[test]
    fn test_run_overwrites_stale_atlas() {
        if !has_gpu() {
            eprintln!("Skipping GPU test: no GPU available");
            return;
        }

        let mut b = TapeBuilder::new();
        let x = b.x();
        b.square(x);
        let tape = Arc::new(b.build().unwrap());

        let ctx = PipelineContext::new().unwrap();
        let job = RenderJob::new(&ctx, tape.clone(), 4, 2).unwrap();

        // Poison the atlas, then run: no sentinel may survive.
        let sentinel = vec![777.0f32; job.atlas_len()];
        ctx.queue
            .write_buffer(&job.atlas_buffer, 0, bytemuck::cast_slice(&sentinel));

        let samples = circle_samples(4);
        ctx.run_job(&job, &samples).unwrap();
        let atlas = ctx.read_atlas(&job).unwrap();

        assert!(
            atlas.iter().all(|&v| v != 777.0),
            "stale atlas contents survived a run"
        );
    }

    #[test]
    fn test_async_readback_matches_sync() {
        if !has_gpu() {
            eprintln!("Skipping GPU test: no GPU available");
            return;
        }

        let mut b = TapeBuilder::new();
        let x = b.x();
        let y = b.y();
        b.add(x, y);
        let tape = Arc::new(b.build().unwrap());

        let ctx = PipelineContext::new().unwrap();
        let job = RenderJob::new(&ctx, tape, 16, 1).unwrap();
        let samples = circle_samples(16);

        ctx.run_job(&job, &samples).unwrap();
        let sync = ctx.read_atlas(&job).unwrap();
        let async_ = pollster::block_on(ctx.read_atlas_async(&job)).unwrap();

        assert_eq!(sync, async_);
    }

    #[test]
    fn test_sample_count_mismatch() {
        if !has_gpu() {
            eprintln!("Skipping GPU test: no GPU available");
            return;
        }

        let mut b = TapeBuilder::new();
        b.x();
        let tape = Arc::new(b.build().unwrap());

        let ctx = PipelineContext::new().unwrap();
        let job = RenderJob::new(&ctx, tape, 8, 1).unwrap();

        let err = ctx.run_job(&job, &circle_samples(4)).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::SampleCountMismatch {
                expected: 8,
                actual: 4
            }
        ));
    }
}
