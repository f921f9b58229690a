//! The cork/uncork barrier (`spec.md` §4.5, §4.6): a single piece of shared
//! state that the control loop flips and the fan-out engine blocks on.

use std::sync::{Arc, Condvar, Mutex};

/// Shared cork flag. Cloned (via the inner `Arc`) between the control loop
/// and the fan-out engine.
#[derive(Clone)]
pub struct CorkState {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CorkState {
    /// Build an initially-uncorked state.
    #[must_use]
    pub fn new() -> Self {
        Self { inner: Arc::new((Mutex::new(false), Condvar::new())) }
    }

    /// Set corked, stalling any thread currently in or entering
    /// [`Self::wait_while_corked`]. Idempotent: corking an already-corked
    /// state is a no-op (`spec.md` §9).
    pub fn cork(&self) {
        let (lock, _) = &*self.inner;
        *lock.lock().expect("cork mutex poisoned") = true;
    }

    /// Clear corked, waking every thread blocked in
    /// [`Self::wait_while_corked`]. Idempotent.
    pub fn uncork(&self) {
        let (lock, cvar) = &*self.inner;
        *lock.lock().expect("cork mutex poisoned") = false;
        cvar.notify_all();
    }

    /// Whether the state is currently corked.
    #[must_use]
    pub fn is_corked(&self) -> bool {
        let (lock, _) = &*self.inner;
        *lock.lock().expect("cork mutex poisoned")
    }

    /// Block the calling thread until uncorked. Called by the fan-out
    /// engine before every broadcast (`spec.md` §4.5).
    pub fn wait_while_corked(&self) {
        let (lock, cvar) = &*self.inner;
        let guard = lock.lock().expect("cork mutex poisoned");
        let _guard = cvar.wait_while(guard, |corked| *corked).expect("cork mutex poisoned");
    }
}

impl Default for CorkState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::{thread, time::Duration};

    use super::*;

    #[test]
    fn wait_returns_immediately_when_uncorked() {
        let state = CorkState::new();
        state.wait_while_corked();
    }

    #[test]
    fn uncork_wakes_a_waiting_thread() {
        let state = CorkState::new();
        state.cork();
        let waiter = state.clone();
        let handle = thread::spawn(move || waiter.wait_while_corked());

        thread::sleep(Duration::from_millis(20));
        assert!(!handle.is_finished());

        state.uncork();
        handle.join().unwrap();
    }

    #[test]
    fn recork_after_uncork_is_idempotent() {
        let state = CorkState::new();
        state.cork();
        state.cork();
        assert!(state.is_corked());
        state.uncork();
        state.uncork();
        assert!(!state.is_corked());
    }
}
