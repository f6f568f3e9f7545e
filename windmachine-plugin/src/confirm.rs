//! Two-press confirmation for destructive operator actions.

use std::time::{Duration, Instant};

/// How long an armed gate waits for the confirming press.
pub const DEFAULT_CONFIRM_WINDOW: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateState {
    Idle,
    Armed { expires_at: Instant },
}

/// Outcome of pressing the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Press {
    /// First press; press again before the window closes to confirm
    Armed,
    /// Second press within the window; perform the action
    Confirmed,
}

/// `Idle → Armed(expires_at) → Idle`, confirming when pressed while armed.
#[derive(Debug, Clone)]
pub struct ConfirmationGate {
    window: Duration,
    state: GateState,
}

impl Default for ConfirmationGate {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIRM_WINDOW)
    }
}

impl ConfirmationGate {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            state: GateState::Idle,
        }
    }

    pub fn press(&mut self, now: Instant) -> Press {
        match self.state {
            GateState::Armed { expires_at } if now < expires_at => {
                self.state = GateState::Idle;
                Press::Confirmed
            }
            _ => {
                self.state = GateState::Armed {
                    expires_at: now + self.window,
                };
                Press::Armed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_press_within_window_confirms() {
        let mut gate = ConfirmationGate::default();
        let t0 = Instant::now();

        assert_eq!(gate.press(t0), Press::Armed);
        assert_eq!(gate.press(t0 + Duration::from_secs(2)), Press::Confirmed);
    }

    #[test]
    fn test_press_after_expiry_rearms() {
        let mut gate = ConfirmationGate::new(Duration::from_secs(3));
        let t0 = Instant::now();

        assert_eq!(gate.press(t0), Press::Armed);
        assert_eq!(gate.press(t0 + Duration::from_secs(3)), Press::Armed);
        assert_eq!(gate.press(t0 + Duration::from_secs(4)), Press::Confirmed);
        assert_eq!(gate.press(t0 + Duration::from_secs(5)), Press::Armed);
    }

    #[test]
    fn test_confirm_returns_to_idle() {
        let mut gate = ConfirmationGate::default();
        let t0 = Instant::now();

        gate.press(t0);
        gate.press(t0);
        assert_eq!(gate.press(t0), Press::Armed);
    }
}
