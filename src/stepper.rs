//! Fixed-timestep accumulator for the driving loop.
//!
//! Real elapsed time is folded into an accumulator and paid out as whole
//! fixed steps, bounded per frame by the quality controller's adaptive
//! ceiling. Backlog beyond a small multiple of the step is discarded so
//! one slow frame can never trigger an unbounded catch-up spiral.

/// The fixed simulation step (seconds).
pub const SIM_DT: f32 = 1.0 / 60.0;

/// Largest backlog carried across frames, in steps.
const MAX_BACKLOG_STEPS: f32 = 4.0;

pub struct FixedStepper {
    dt: f32,
    accumulator: f32,
}

impl Default for FixedStepper {
    fn default() -> Self {
        Self::new()
    }
}

impl FixedStepper {
    pub fn new() -> Self {
        Self {
            dt: SIM_DT,
            accumulator: 0.0,
        }
    }

    pub fn with_dt(dt: f32) -> Self {
        Self {
            dt,
            accumulator: 0.0,
        }
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    /// Fold in elapsed wall-clock time and return how many fixed steps
    /// to run this frame, at most `max_steps`.
    pub fn advance(&mut self, elapsed_seconds: f32, max_steps: u32) -> u32 {
        self.accumulator += elapsed_seconds.max(0.0);

        let mut steps = 0u32;
        while self.accumulator >= self.dt && steps < max_steps {
            self.accumulator -= self.dt;
            steps += 1;
        }

        // Drop leftover time we will never catch up on.
        let backlog_cap = self.dt * MAX_BACKLOG_STEPS;
        if self.accumulator > backlog_cap {
            self.accumulator = backlog_cap;
        }

        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steady_frames_pay_out_single_steps() {
        let mut stepper = FixedStepper::new();
        let mut total = 0;
        for _ in 0..60 {
            total += stepper.advance(SIM_DT, 4);
        }
        assert_eq!(total, 60);
    }

    #[test]
    fn test_partial_frames_accumulate() {
        let mut stepper = FixedStepper::new();
        assert_eq!(stepper.advance(SIM_DT * 0.5, 4), 0);
        assert_eq!(stepper.advance(SIM_DT * 0.6, 4), 1);
    }

    #[test]
    fn test_slow_frame_is_bounded_by_max_steps() {
        let mut stepper = FixedStepper::new();
        assert_eq!(stepper.advance(SIM_DT * 10.0, 3), 3);
    }

    #[test]
    fn test_huge_stall_discards_backlog() {
        let mut stepper = FixedStepper::new();
        assert_eq!(stepper.advance(10.0, 4), 4);
        // The stall's remaining ~9.9s was clamped away; the next normal
        // frame pays out the capped backlog plus its own step, no more.
        let mut follow_up = 0;
        for _ in 0..5 {
            follow_up += stepper.advance(SIM_DT, 8);
        }
        assert!(follow_up <= 9, "backlog not discarded: {}", follow_up);
    }

    #[test]
    fn test_negative_elapsed_is_ignored() {
        let mut stepper = FixedStepper::new();
        assert_eq!(stepper.advance(-5.0, 4), 0);
        assert_eq!(stepper.advance(SIM_DT, 4), 1);
    }
}
