//! Water simulation tunables and the solver's stability constants.

/// Per-neighbor outflow cap as a fraction of the cell's pre-step depth.
/// This is the load-bearing stability safeguard: it bounds how much a
/// cell can send to any single neighbor in one step, which keeps the
/// explicit solver stable at the fixed timestep without a CFL search.
/// The cap is applied per neighbor, not pooled across all 8 directions.
pub const OUTFLOW_CAP: f32 = 0.25;

/// Flows below this are discarded outright (not subtracted), so
/// floating-point dust never accumulates into the velocity field.
pub const FLOW_EPSILON: f32 = 1e-4;

/// Exponential smoothing factor for cell velocity while water is moving.
pub const VELOCITY_SMOOTHING: f32 = 0.8;

/// Per-step velocity decay for cells with no outflow this step, so flow
/// readouts drain smoothly instead of snapping to zero.
pub const VELOCITY_DECAY: f32 = 0.95;

/// Flow rate assigned to springs created by peak auto-generation.
pub const DEFAULT_SPRING_FLOW: f32 = 30.0;

/// Water simulation parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaterParams {
    /// Global transfer coefficient: fraction of a surface-height
    /// difference moved to a lower neighbor per step.
    pub flow_rate: f32,
    /// Depth removed from every wet cell per second.
    pub evaporation_rate: f32,
    /// Cells shallower than this do not participate in flow.
    pub min_depth: f32,
}

impl Default for WaterParams {
    fn default() -> Self {
        Self {
            flow_rate: 0.25,
            evaporation_rate: 0.001,
            min_depth: 0.005,
        }
    }
}

impl WaterParams {
    /// Still water for tests and measurements: no evaporation losses.
    pub fn lossless() -> Self {
        Self {
            evaporation_rate: 0.0,
            ..Default::default()
        }
    }

    /// Fast-draining arcade feel: quicker transfer, stronger evaporation.
    pub fn torrent() -> Self {
        Self {
            flow_rate: 0.4,
            evaporation_rate: 0.01,
            ..Default::default()
        }
    }
}
