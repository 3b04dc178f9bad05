// Reentrancy guard - suppresses a second completion or navigation while one
// is in flight or has just finished
//
// Idle -> Processing -> CoolingDown -> Idle

use statig::prelude::*;
use tokio::time::{Duration, Instant};

pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardEvent {
    Enter,
    Dispatched { at: Instant },
    Tick { now: Instant },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardPhase {
    Idle,
    Processing,
    CoolingDown,
}

pub struct GuardMachine {
    cooldown: Duration,
    cooling_until: Option<Instant>,
}

#[state_machine(initial = "State::idle()")]
impl GuardMachine {
    #[state]
    fn idle(&mut self, event: &GuardEvent) -> Outcome<State> {
        match event {
            GuardEvent::Enter => Transition(State::processing()),
            _ => Handled,
        }
    }

    #[state]
    fn processing(&mut self, event: &GuardEvent) -> Outcome<State> {
        match event {
            GuardEvent::Dispatched { at } => {
                self.cooling_until = Some(*at + self.cooldown);
                Transition(State::cooling_down())
            }
            _ => Handled,
        }
    }

    #[state]
    fn cooling_down(&mut self, event: &GuardEvent) -> Outcome<State> {
        match event {
            GuardEvent::Tick { now } if self.cooling_until.is_some_and(|until| *now >= until) => {
                self.cooling_until = None;
                Transition(State::idle())
            }
            _ => Handled,
        }
    }
}

/// Per-shipment reentrancy guard.
///
/// The cooldown is fire-and-forget: it starts when side effects are
/// dispatched, not when they settle, and it never cancels them.
pub struct ReentrancyGuard {
    machine: StateMachine<GuardMachine>,
}

impl Default for ReentrancyGuard {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}

impl std::fmt::Debug for ReentrancyGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReentrancyGuard")
            .field("cooldown", &self.machine.inner().cooldown)
            .field("cooling_until", &self.machine.inner().cooling_until)
            .finish()
    }
}

impl ReentrancyGuard {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            machine: GuardMachine {
                cooldown,
                cooling_until: None,
            }
            .state_machine(),
        }
    }

    /// Current phase after letting an expired cooldown decay.
    pub fn phase(&mut self, now: Instant) -> GuardPhase {
        self.machine.handle(&GuardEvent::Tick { now });
        match self.machine.state() {
            State::Idle {} => GuardPhase::Idle,
            State::Processing {} => GuardPhase::Processing,
            State::CoolingDown {} => GuardPhase::CoolingDown,
        }
    }

    /// Claim the guard for a new action. Returns `false` (and changes
    /// nothing) if an action is processing or cooling down.
    pub fn try_enter(&mut self, now: Instant) -> bool {
        if self.phase(now) != GuardPhase::Idle {
            return false;
        }
        self.machine.handle(&GuardEvent::Enter);
        true
    }

    /// Start the cooldown. Called right after the action's side effects are
    /// dispatched.
    pub fn dispatched(&mut self, now: Instant) {
        self.machine.handle(&GuardEvent::Dispatched { at: now });
    }

    pub fn is_suppressed(&mut self, now: Instant) -> bool {
        self.phase(now) != GuardPhase::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_enter_rejected_while_processing() {
        let now = Instant::now();
        let mut guard = ReentrancyGuard::default();

        assert!(guard.try_enter(now));
        assert_eq!(guard.phase(now), GuardPhase::Processing);
        assert!(!guard.try_enter(now));
        assert!(guard.is_suppressed(now + Duration::from_secs(60)));
    }

    #[test]
    fn test_cooldown_expires_back_to_idle() {
        let start = Instant::now();
        let mut guard = ReentrancyGuard::new(Duration::from_millis(1500));

        assert!(guard.try_enter(start));
        guard.dispatched(start);
        assert_eq!(guard.phase(start), GuardPhase::CoolingDown);
        assert!(guard.is_suppressed(start + Duration::from_millis(1499)));
        assert!(!guard.try_enter(start + Duration::from_millis(1000)));

        let later = start + Duration::from_millis(1500);
        assert!(!guard.is_suppressed(later));
        assert!(guard.try_enter(later));
    }

    #[test]
    fn test_dispatch_without_enter_is_ignored() {
        let now = Instant::now();
        let mut guard = ReentrancyGuard::default();

        guard.dispatched(now);
        assert_eq!(guard.phase(now), GuardPhase::Idle);
    }
}
