//! Parallel CPU evaluation
//!
//! rayon-backed batch evaluation and the CPU mirror of the GPU atlas layout.
//!
//! Author: Moroya Sakamoto

use super::{eval_slots, eval_tape};
use crate::tape::Tape;
use glam::Vec3;
use rayon::prelude::*;

/// Evaluate the final slot at many sample points, in parallel
pub fn eval_tape_batch_parallel(tape: &Tape, points: &[Vec3]) -> Vec<f32> {
    points
        .par_iter()
        .map(|&point| eval_tape(tape, point))
        .collect()
}

/// Compute the full atlas on the CPU, in the exact GPU memory layout.
///
/// Row = global slot, column = `block * samples.len() + sample`, row-major.
/// Every block holds the same values because all blocks share one sample
/// coordinate set; the GPU Blit pass tiles them the same way.
pub fn eval_atlas(tape: &Tape, samples: &[Vec3], block_count: usize) -> Vec<f32> {
    let block_size = samples.len();
    let atlas_cols = block_size * block_count;
    let rows = tape.slot_count();

    let columns: Vec<Vec<f32>> = samples
        .par_iter()
        .map(|&point| eval_slots(tape, point))
        .collect();

    let mut atlas = vec![0.0f32; rows * atlas_cols];
    for (sample, column) in columns.iter().enumerate() {
        for (row, &value) in column.iter().enumerate() {
            for block in 0..block_count {
                atlas[row * atlas_cols + block * block_size + sample] = value;
            }
        }
    }
    atlas
}
