//! Shared test helpers
//!
//! Tape fixtures and sample blocks used across the integration suites.

#![allow(dead_code)]

use alice_atlas::prelude::*;

/// sqrt(x^2 + y^2 + z^2) - radius, 11 instructions, single segment
pub fn sphere_tape(radius: f32) -> Tape {
    sphere_tape_with_capacity(radius, SEGMENT_CAPACITY)
}

/// Same expression split at `capacity` instructions per segment
pub fn sphere_tape_with_capacity(radius: f32, capacity: usize) -> Tape {
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
    let rad = b.constant(radius);
    b.sub(r, rad);
    b.build().unwrap()
}

/// The worked two-segment chain: capacity 3, segments of 3 + 2 instructions.
///
/// ```text
/// segment 0: [0] x   [1] y   [2] x + y
/// segment 1: [3] (x + y)^2   [4] -(x + y)^2
/// ```
///
/// Slot 3 references slot 2 across the segment boundary (through the atlas);
/// slot 4 references slot 3 within its own segment.
pub fn two_segment_tape() -> Tape {
    let mut b = TapeBuilder::with_segment_capacity(3).unwrap();
    let x = b.x();
    let y = b.y();
    let sum = b.add(x, y);
    let sq = b.square(sum);
    b.neg(sq);
    let tape = b.build().unwrap();
    assert_eq!(tape.segment_count(), 2);
    tape
}

/// Canonical four-sample block
pub fn four_samples() -> Vec<Vec3> {
    vec![
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(1.0, 2.0, 0.0),
        Vec3::new(-1.5, 0.5, 0.0),
        Vec3::new(3.0, -4.0, 0.0),
    ]
}

/// Assert two values agree within `tolerance`, with context on failure
pub fn assert_close(actual: f32, expected: f32, tolerance: f32, context: &str) {
    assert!(
        (actual - expected).abs() < tolerance,
        "{}: expected {}, got {} (tolerance {})",
        context,
        expected,
        actual,
        tolerance
    );
}

/// Acquire a GPU context, or None when the machine has no adapter
#[cfg(feature = "gpu")]
pub fn gpu_context() -> Option<PipelineContext> {
    match PipelineContext::new() {
        Ok(ctx) => Some(ctx),
        Err(PipelineError::NoAdapter) => None,
        Err(e) => panic!("GPU context creation failed: {}", e),
    }
}
