// Safety supervisor: guard/panic inputs and the fast-stop decision

use crate::messages::SafetyInput;

/// Tracks the discrete safety inputs. Fast stop is level-triggered: it is
/// re-derived on every evaluation and clears only while all inputs are clear.
#[derive(Debug, Default, Clone, Copy)]
pub struct SafetySupervisor {
    left_guard: bool,
    right_guard: bool,
    panic: bool,
}

impl SafetySupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the level state of a safety input
    pub fn on_button(&mut self, input: SafetyInput, pressed: bool) {
        match input {
            SafetyInput::LeftGuard => self.left_guard = pressed,
            SafetyInput::RightGuard => self.right_guard = pressed,
            SafetyInput::Panic => self.panic = pressed,
        }
    }

    /// True while any guard or panic input is active
    pub fn fast_stop(&self) -> bool {
        self.left_guard || self.right_guard || self.panic
    }

    /// Fast stop demanded by the inputs, or by both sticks sitting inside the
    /// deadband (centered sticks should stop quickly, not coast down)
    pub fn demands_fast_stop(&self, left_setpoint: f32, right_setpoint: f32, deadband: f32) -> bool {
        self.fast_stop()
            || (left_setpoint.abs() < deadband && right_setpoint.abs() < deadband)
    }

    /// Clear all inputs (used when the link state is reset)
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_input_triggers_fast_stop() {
        for input in [
            SafetyInput::LeftGuard,
            SafetyInput::RightGuard,
            SafetyInput::Panic,
        ] {
            let mut supervisor = SafetySupervisor::new();
            assert!(!supervisor.fast_stop());
            supervisor.on_button(input, true);
            assert!(supervisor.fast_stop());
            supervisor.on_button(input, false);
            assert!(!supervisor.fast_stop());
        }
    }

    #[test]
    fn test_fast_stop_clears_only_when_all_inputs_clear() {
        let mut supervisor = SafetySupervisor::new();
        supervisor.on_button(SafetyInput::LeftGuard, true);
        supervisor.on_button(SafetyInput::Panic, true);

        supervisor.on_button(SafetyInput::Panic, false);
        assert!(supervisor.fast_stop(), "guard still held");

        supervisor.on_button(SafetyInput::LeftGuard, false);
        assert!(!supervisor.fast_stop());
    }

    #[test]
    fn test_centered_sticks_demand_fast_stop() {
        let supervisor = SafetySupervisor::new();
        assert!(supervisor.demands_fast_stop(2.0, -3.0, 5.0));
        // one stick outside the deadband keeps normal ramping
        assert!(!supervisor.demands_fast_stop(2.0, 40.0, 5.0));
        assert!(!supervisor.demands_fast_stop(-40.0, 2.0, 5.0));
        // the threshold itself is not centered
        assert!(!supervisor.demands_fast_stop(5.0, 0.0, 5.0));
    }

    #[test]
    fn test_inputs_dominate_stick_position() {
        let mut supervisor = SafetySupervisor::new();
        supervisor.on_button(SafetyInput::RightGuard, true);
        assert!(supervisor.demands_fast_stop(80.0, 80.0, 5.0));
    }
}
