//! Pressure-based flow solver.
//!
//! One step moves water from each wet cell toward any of its 8 neighbors
//! with a lower total surface (terrain + depth). All neighbor comparisons
//! read the start-of-step depth buffer while transfers accumulate into
//! the back buffer; updating in place would make the result depend on
//! iteration order and break symmetry. Stability at the fixed timestep
//! comes from two safeguards that must both be preserved: the per-neighbor
//! outflow cap (25% of the cell's pre-step depth) and the epsilon discard
//! of near-zero flows.

use crate::terrain::Terrain;

use super::params::{FLOW_EPSILON, OUTFLOW_CAP, VELOCITY_DECAY, VELOCITY_SMOOTHING};
use super::WaterField;

/// 8-neighborhood offsets with their distance multipliers: orthogonal
/// transfers at 1.0, diagonal at sqrt(2).
const NEIGHBORS: [(i32, i32, f32); 8] = [
    (-1, -1, std::f32::consts::SQRT_2),
    (0, -1, 1.0),
    (1, -1, std::f32::consts::SQRT_2),
    (-1, 0, 1.0),
    (1, 0, 1.0),
    (-1, 1, std::f32::consts::SQRT_2),
    (0, 1, 1.0),
    (1, 1, std::f32::consts::SQRT_2),
];

/// Advance the water field by `dt` seconds.
pub(super) fn step(water: &mut WaterField, terrain: &Terrain, dt: f32) {
    let dims = water.depth.dims();
    let width = dims.width;
    let height = dims.height;

    let flow_rate = water.params.flow_rate;
    let min_depth = water.params.min_depth;

    // 1. Back buffer starts as a copy of the live depths.
    water
        .depth_next
        .as_mut_slice()
        .copy_from_slice(water.depth.as_slice());

    // 2. Spring injection. Out-of-bounds springs are silently inert.
    for spring in &water.springs {
        if dims.contains(spring.x, spring.y) {
            let idx = spring.y as usize * width + spring.x as usize;
            water.depth_next.as_mut_slice()[idx] += spring.flow_rate * dt;
        }
    }

    // 3. Pressure transfers over the interior (the 1-cell border never
    // flows, which spares every neighbor access a bounds check).
    if width >= 3 && height >= 3 {
        let heights = terrain.heights().as_slice();
        let depth = water.depth.as_slice();

        for y in 1..height - 1 {
            for x in 1..width - 1 {
                let idx = y * width + x;

                let mut flow_x = 0.0f32;
                let mut flow_y = 0.0f32;
                let mut flowed = false;

                let cell_depth = depth[idx];
                if cell_depth >= min_depth {
                    let surface = heights[idx] + cell_depth;
                    // Cap is per neighbor, not pooled across directions:
                    // a cell above several lower neighbors can shed more
                    // than 25% in one step. Accepted approximation; the
                    // clamp at the swap keeps depth non-negative.
                    let cap = cell_depth * OUTFLOW_CAP;

                    for &(dx, dy, dist) in NEIGHBORS.iter() {
                        let nidx = ((y as i32 + dy) as usize) * width + (x as i32 + dx) as usize;
                        let neighbor_surface = heights[nidx] + depth[nidx];
                        let pressure_diff = surface - neighbor_surface;
                        if pressure_diff <= 0.0 {
                            continue;
                        }

                        let flow = (pressure_diff * flow_rate / dist).min(cap);
                        if flow < FLOW_EPSILON {
                            continue;
                        }

                        let next = water.depth_next.as_mut_slice();
                        next[idx] -= flow;
                        next[nidx] += flow;
                        flow_x += dx as f32 * flow;
                        flow_y += dy as f32 * flow;
                        flowed = true;
                    }
                }

                // 4. Velocity: smooth toward this step's outflow, or drag
                // toward rest so flow readouts decay instead of snapping.
                let vx = &mut water.velocity_x.as_mut_slice()[idx];
                let vy = &mut water.velocity_y.as_mut_slice()[idx];
                if flowed {
                    *vx = *vx * VELOCITY_SMOOTHING + flow_x * (1.0 - VELOCITY_SMOOTHING);
                    *vy = *vy * VELOCITY_SMOOTHING + flow_y * (1.0 - VELOCITY_SMOOTHING);
                } else {
                    *vx *= VELOCITY_DECAY;
                    *vy *= VELOCITY_DECAY;
                }
            }
        }
    }

    // 5. Evaporation.
    if water.params.evaporation_rate > 0.0 {
        let loss = water.params.evaporation_rate * dt;
        for d in water.depth_next.as_mut_slice() {
            if *d > 0.0 {
                *d = (*d - loss).max(0.0);
            }
        }
    }

    // 6. Publish: swap buffers and clamp at the boundary so a cell that
    // shed to many lower neighbors at once can never expose a negative
    // depth.
    std::mem::swap(&mut water.depth, &mut water.depth_next);
    for d in water.depth.as_mut_slice() {
        if *d < 0.0 {
            *d = 0.0;
        }
    }

    water.dirty = true;
}
