//! One-slot admission gate for oracle exchanges and puzzle loads.

use std::sync::{Arc, Mutex};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use super::events::{EventHandler, GameEvent};
use super::turn::ControllerState;
use crate::prompt::PromptKind;

/// Admits at most one operation at a time and tracks [`ControllerState`].
#[derive(Debug)]
pub struct TurnGate {
    slot: Arc<Semaphore>,
    state: Arc<Mutex<ControllerState>>,
}

impl Default for TurnGate {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnGate {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Semaphore::new(1)),
            state: Arc::new(Mutex::new(ControllerState::Idle)),
        }
    }

    /// Take the slot without waiting. `None` means something is in flight.
    pub fn try_enter(&self, kind: Option<PromptKind>) -> Option<TurnPermit> {
        let permit = self.slot.clone().try_acquire_owned().ok()?;
        if let Some(kind) = kind {
            *lock(&self.state) = ControllerState::AwaitingOracle { kind };
        }
        Some(TurnPermit {
            _permit: permit,
            state: self.state.clone(),
            events: None,
        })
    }

    pub fn state(&self) -> ControllerState {
        *lock(&self.state)
    }

    pub fn is_busy(&self) -> bool {
        self.slot.available_permits() == 0
    }
}

/// Holds the gate's slot. Dropping it returns to `Idle` and, when input was
/// locked, emits [`GameEvent::InputReleased`], whether the operation
/// finished, failed, or was cancelled.
pub struct TurnPermit {
    _permit: OwnedSemaphorePermit,
    state: Arc<Mutex<ControllerState>>,
    events: Option<Arc<dyn EventHandler>>,
}

impl TurnPermit {
    /// Emit [`GameEvent::InputLocked`] now and the release on drop.
    pub fn lock_input(&mut self, events: Arc<dyn EventHandler>) {
        events.on_event(&GameEvent::InputLocked);
        self.events = Some(events);
    }
}

impl Drop for TurnPermit {
    fn drop(&mut self) {
        *lock(&self.state) = ControllerState::Idle;
        if let Some(events) = self.events.take() {
            events.on_event(&GameEvent::InputReleased);
        }
    }
}

fn lock(state: &Mutex<ControllerState>) -> std::sync::MutexGuard<'_, ControllerState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::events::FnEventHandler;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn second_entry_is_refused_until_release() {
        let gate = TurnGate::new();
        let first = gate.try_enter(Some(PromptKind::Question)).unwrap();
        assert!(gate.is_busy());
        assert!(gate.try_enter(None).is_none());
        assert_eq!(
            gate.state(),
            ControllerState::AwaitingOracle {
                kind: PromptKind::Question
            }
        );
        drop(first);
        assert!(!gate.is_busy());
        assert_eq!(gate.state(), ControllerState::Idle);
        assert!(gate.try_enter(None).is_some());
    }

    #[test]
    fn release_event_fires_once_on_drop() {
        let released = Arc::new(AtomicUsize::new(0));
        let locked = Arc::new(AtomicUsize::new(0));
        let (r, l) = (released.clone(), locked.clone());
        let events: Arc<dyn EventHandler> = Arc::new(FnEventHandler::new(move |e| match e {
            GameEvent::InputLocked => {
                l.fetch_add(1, Ordering::SeqCst);
            }
            GameEvent::InputReleased => {
                r.fetch_add(1, Ordering::SeqCst);
            }
            _ => {}
        }));

        let gate = TurnGate::new();
        let mut permit = gate.try_enter(Some(PromptKind::Hint)).unwrap();
        permit.lock_input(events);
        assert_eq!(locked.load(Ordering::SeqCst), 1);
        assert_eq!(released.load(Ordering::SeqCst), 0);
        drop(permit);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unlocked_permit_emits_nothing() {
        let gate = TurnGate::new();
        let permit = gate.try_enter(None).unwrap();
        assert_eq!(gate.state(), ControllerState::Idle);
        drop(permit);
    }
}
