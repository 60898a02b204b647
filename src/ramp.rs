// Bounded-rate ramp toward a setpoint

/// Output limit, percent of full scale
const OUTPUT_LIMIT: f32 = 100.0;

/// Per-tick step sizes derived from the configured rates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RampRates {
    /// Normal acceleration step, percent per tick
    pub normal_step: f32,
    /// Fast-stop deceleration step, percent per tick
    pub fast_step: f32,
}

impl RampRates {
    /// Derive percent-per-tick steps from the configured percent-per-second
    /// acceleration and the max-speed-to-zero stop time
    pub fn new(
        acceleration: f32,
        max_speed: f32,
        stop_deceleration_time: f32,
        tick_interval: f32,
    ) -> Self {
        Self {
            normal_step: acceleration * tick_interval,
            fast_step: max_speed / (stop_deceleration_time / tick_interval),
        }
    }

    pub fn step(self, fast: bool) -> f32 {
        if fast { self.fast_step } else { self.normal_step }
    }
}

/// Move `current` toward `target` by at most `max_step`, landing exactly on
/// the target once it is within reach. The result stays inside [-100, 100].
pub fn step_toward(current: f32, target: f32, max_step: f32) -> f32 {
    let diff = target - current;
    let next = if diff.abs() <= max_step {
        target
    } else {
        current + max_step.copysign(diff)
    };
    next.clamp(-OUTPUT_LIMIT, OUTPUT_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 1e-3,
            "expected {} to be close to {}",
            actual,
            expected
        );
    }

    #[test]
    fn test_ramp_is_idempotent_at_setpoint() {
        assert_eq!(step_toward(42.0, 42.0, 3.0), 42.0);
        assert_eq!(step_toward(0.0, 0.0, 20.0), 0.0);
        assert_eq!(step_toward(-100.0, -100.0, 3.0), -100.0);
    }

    #[test]
    fn test_bounded_rate_convergence_upward() {
        // 30 %/s at 0.1 s ticks is 3 % per tick
        let rates = RampRates::new(30.0, 100.0, 0.5, 0.1);
        assert_close(rates.normal_step, 3.0);

        let mut current = 0.0;
        current = step_toward(current, 100.0, rates.normal_step);
        assert_close(current, 3.0);

        let mut ticks = 1;
        while current < 100.0 {
            current = step_toward(current, 100.0, rates.normal_step);
            ticks += 1;
            assert!(ticks <= 34, "should converge within ceil(100/3) ticks");
        }
        assert_eq!(current, 100.0);
        assert_eq!(ticks, 34);

        // and stays there
        assert_eq!(step_toward(current, 100.0, rates.normal_step), 100.0);
    }

    #[test]
    fn test_fast_stop_convergence() {
        // 100 / (0.5 s / 0.1 s) = 20 % per tick
        let rates = RampRates::new(30.0, 100.0, 0.5, 0.1);
        assert_close(rates.fast_step, 20.0);

        let mut current = 100.0;
        for tick in 1..=5 {
            current = step_toward(current, 0.0, rates.fast_step);
            assert!(
                current >= 0.0,
                "no overshoot through zero (tick {})",
                tick
            );
        }
        assert_eq!(current, 0.0);
    }

    #[test]
    fn test_ramp_toward_negative_setpoint() {
        let mut current = 10.0;
        current = step_toward(current, -50.0, 15.0);
        assert_close(current, -5.0);
        current = step_toward(current, -50.0, 15.0);
        assert_close(current, -20.0);
    }

    #[test]
    fn test_never_overshoots_target() {
        assert_eq!(step_toward(98.0, 100.0, 20.0), 100.0);
        assert_eq!(step_toward(-1.0, 0.0, 20.0), 0.0);
    }

    #[test]
    fn test_output_clamped_to_full_scale() {
        // defensive clamp: even a wild target cannot push past full scale
        assert_eq!(step_toward(95.0, 500.0, 50.0), 100.0);
        assert_eq!(step_toward(-95.0, -500.0, 50.0), -100.0);
    }
}
