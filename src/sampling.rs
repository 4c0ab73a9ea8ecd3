//! Sample-block generation
//!
//! Jobs evaluate a tape over a *block* of xyz coordinates. These helpers
//! generate the common blocks from axis-aligned bounds: a line of points, a
//! z-slice, or a full grid. Endpoints are inclusive: `count` points span
//! `min..=max` with step `(max - min) / (count - 1)`.
//!
//! Author: Moroya Sakamoto

use glam::Vec3;

/// Points along the segment from `min` to `max`, endpoints inclusive
pub fn sample_line(min: Vec3, max: Vec3, count: usize) -> Vec<Vec3> {
    if count == 0 {
        return Vec::new();
    }
    let step = (max - min) / (count as f32 - 1.0).max(1.0);
    (0..count).map(|i| min + step * i as f32).collect()
}

/// An `nx` by `ny` slice at height `z`, x-fastest row-major
pub fn sample_slice(min: Vec3, max: Vec3, nx: usize, ny: usize, z: f32) -> Vec<Vec3> {
    let size = max - min;
    let step_x = size.x / (nx as f32 - 1.0).max(1.0);
    let step_y = size.y / (ny as f32 - 1.0).max(1.0);

    let mut points = Vec::with_capacity(nx * ny);
    for y in 0..ny {
        let y_pos = min.y + y as f32 * step_y;
        for x in 0..nx {
            points.push(Vec3::new(min.x + x as f32 * step_x, y_pos, z));
        }
    }
    points
}

/// A full `resolution^3` grid, x-fastest then y then z
pub fn sample_grid(min: Vec3, max: Vec3, resolution: usize) -> Vec<Vec3> {
    let size = max - min;
    let step = size / (resolution as f32 - 1.0).max(1.0);

    let mut points = Vec::with_capacity(resolution * resolution * resolution);
    for z in 0..resolution {
        let z_pos = min.z + z as f32 * step.z;
        for y in 0..resolution {
            let y_pos = min.y + y as f32 * step.y;
            for x in 0..resolution {
                points.push(Vec3::new(min.x + x as f32 * step.x, y_pos, z_pos));
            }
        }
    }
    points
}
