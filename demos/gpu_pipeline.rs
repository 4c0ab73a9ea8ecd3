//! GPU Pipeline Example
//!
//! This example runs a segmented tape through the two-pass Eval/Blit
//! pipeline and compares the assembled atlas against the CPU reference.
//!
//! # Requirements
//! - Build with `--features gpu`
//! - WebGPU-capable GPU (Metal, Vulkan, DX12, or WebGPU)
//!
//! # Running
//! ```bash
//! cargo run --example gpu_pipeline --features gpu
//! ```
//!
//! Author: Moroya Sakamoto

#[allow(unused_imports)]
use alice_atlas::prelude::*;
#[allow(unused_imports)]
use std::time::Instant;

#[cfg(feature = "gpu")]
use alice_atlas::pipeline::debug;
#[cfg(feature = "gpu")]
use std::sync::Arc;

fn main() {
    #[cfg(not(feature = "gpu"))]
    {
        eprintln!("This example requires the 'gpu' feature.");
        eprintln!("Run with: cargo run --example gpu_pipeline --features gpu");
        std::process::exit(1);
    }

    #[cfg(feature = "gpu")]
    run_pipeline_example();
}

/// Sphere distance with sin/cos ripples folded on top
#[cfg(feature = "gpu")]
fn rippled_sphere(ripples: usize, capacity: usize) -> Tape {
    let mut b = TapeBuilder::with_segment_capacity(capacity).unwrap();
    let x = b.x();
    let y = b.y();
    let z = b.z();
    let xx = b.square(x);
    let yy = b.square(y);
    let zz = b.square(z);
    let xy = b.add(xx, yy);
    let r2 = b.add(xy, zz);
    let r = b.sqrt(r2);
    let one = b.constant(1.0);
    let mut d = b.sub(r, one);
    for _ in 0..ripples {
        let s = b.sin(d);
        let c = b.cos(d);
        let wave = b.mul(s, c);
        d = b.add(d, wave);
    }
    b.build().unwrap()
}

#[cfg(feature = "gpu")]
fn run_pipeline_example() {
    println!("=== ALICE-ATLAS GPU Pipeline Example ===\n");

    // A chain deep enough to exercise cross-segment operand resolution.
    let tape = Arc::new(rippled_sphere(3, 8));
    println!("Tape: rippled sphere distance");
    println!(
        "Slots: {} across {} segments (capacity 8)\n",
        tape.slot_count(),
        tape.segment_count()
    );

    println!("--- Tape Listing ---");
    print!("{}", debug::dump_tape(&tape));
    println!();

    // === Method 1: Create Pipeline Context ===
    println!("--- Creating Pipeline Context ---");
    let start = Instant::now();
    let ctx = match PipelineContext::new() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create pipeline context: {}", e);
            eprintln!("Make sure you have a WebGPU-capable GPU.");
            std::process::exit(1);
        }
    };
    println!("GPU initialization: {:?}\n", start.elapsed());

    // === Method 2: Small Atlas, Printed ===
    println!("--- Small Atlas (block of 6) ---");
    let samples = sample_line(Vec3::new(-1.5, 0.0, 0.0), Vec3::new(1.5, 0.0, 0.0), 6);
    let job = RenderJob::new(&ctx, tape.clone(), 6, 1).unwrap();

    ctx.run_job(&job, &samples).unwrap();
    match debug::dump_atlas(&ctx, &job) {
        Ok(text) => print!("{}", text),
        Err(e) => eprintln!("Atlas readback failed: {}", e),
    }
    println!("(bottom row is the final distance along y = z = 0)\n");

    // === Method 3: Block Size Comparison ===
    println!("--- CPU vs GPU Atlas Assembly ---");

    for block_size in [1_024, 16_384, 131_072] {
        let samples = sample_line(
            Vec3::new(-2.0, -2.0, -2.0),
            Vec3::new(2.0, 2.0, 2.0),
            block_size,
        );
        let job = RenderJob::new(&ctx, tape.clone(), block_size, 1).unwrap();

        let start = Instant::now();
        let _cpu_atlas = eval_atlas(&tape, &samples, 1);
        let cpu_time = start.elapsed();

        let start = Instant::now();
        ctx.run_job(&job, &samples).unwrap();
        let _gpu_atlas = ctx.read_atlas(&job).unwrap();
        let gpu_time = start.elapsed();

        let speedup = cpu_time.as_secs_f64() / gpu_time.as_secs_f64();
        let winner = if speedup > 1.0 { "GPU" } else { "CPU" };

        println!(
            "Block {:>7}: CPU {:>8.2?} | GPU {:>8.2?} | {:.2}x ({} wins)",
            block_size,
            cpu_time,
            gpu_time,
            speedup.max(1.0 / speedup),
            winner
        );
    }

    // === Method 4: Accuracy Verification ===
    println!("\n--- Accuracy Verification ---");
    let samples = sample_grid(Vec3::splat(-2.0), Vec3::splat(2.0), 10);
    let job = RenderJob::new(&ctx, tape.clone(), samples.len(), 1).unwrap();

    ctx.run_job(&job, &samples).unwrap();
    let gpu_atlas = ctx.read_atlas(&job).unwrap();
    let cpu_atlas = eval_atlas(&tape, &samples, 1);

    let max_error: f32 = cpu_atlas
        .iter()
        .zip(gpu_atlas.iter())
        .map(|(c, g)| (c - g).abs())
        .fold(0.0f32, f32::max);

    let avg_error: f32 = cpu_atlas
        .iter()
        .zip(gpu_atlas.iter())
        .map(|(c, g)| (c - g).abs())
        .sum::<f32>()
        / cpu_atlas.len() as f32;

    println!("Atlas cells: {}", cpu_atlas.len());
    println!("Max error: {:.9}", max_error);
    println!("Avg error: {:.9}", avg_error);
    println!(
        "Status: {}",
        if max_error < 0.001 { "PASS ✓" } else { "FAIL ✗" }
    );

    println!("\n=== Example Complete ===");
}
