//! Sequence-number gate between the receiver and the AOA/controller side.
//!
//! `current` is the highest acknowledged sequence and only ever grows.
//! Interruption is sticky: once interrupted, every waiter (present and
//! future) returns immediately, which keeps shutdown simple.

use std::sync::{Condvar, Mutex};

use tick::Tick;
use wire::Sequence;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WaitResult {
    Ok,
    Timeout,
    Interrupted,
}

#[derive(Default)]
struct State {
    current: Sequence,
    interrupted: bool,
}

#[derive(Default)]
pub struct AckSync {
    state: Mutex<State>,
    cond: Condvar,
}

impl AckSync {
    pub fn new() -> AckSync {
        AckSync::default()
    }

    /// Record an acknowledgement. Out-of-order acks never lower `current`.
    pub fn ack(&self, sequence: Sequence) {
        let mut state = self.state.lock().unwrap();
        if sequence > state.current {
            state.current = sequence;
            self.cond.notify_all();
        }
    }

    /// Block until `sequence` is acknowledged, the deadline passes, or the
    /// gate is interrupted.
    pub fn wait(&self, sequence: Sequence, deadline: Tick) -> WaitResult {
        let mut state = self.state.lock().unwrap();
        loop {
            if state.interrupted {
                return WaitResult::Interrupted;
            }
            if state.current >= sequence {
                return WaitResult::Ok;
            }
            let remaining = deadline.remaining();
            if remaining.is_zero() {
                return WaitResult::Timeout;
            }
            let (guard, timeout) = self.cond.wait_timeout(state, remaining).unwrap();
            state = guard;
            if timeout.timed_out() && state.current < sequence && !state.interrupted {
                return WaitResult::Timeout;
            }
        }
    }

    /// Unblock all waiters, permanently.
    pub fn interrupt(&self) {
        let mut state = self.state.lock().unwrap();
        state.interrupted = true;
        self.cond.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn ack_then_wait_returns_immediately() {
        let sync = AckSync::new();
        sync.ack(5);
        for seq in 1..=5 {
            assert_eq!(sync.wait(seq, Tick::now()), WaitResult::Ok);
        }
    }

    #[test]
    fn wait_times_out_at_or_after_deadline() {
        let sync = AckSync::new();
        let start = Tick::now();
        let result = sync.wait(1, start + Tick::from_ms(50));
        assert_eq!(result, WaitResult::Timeout);
        assert!(Tick::now().saturating_since(start) >= Duration::from_millis(50));
    }

    #[test]
    fn acks_never_regress() {
        let sync = AckSync::new();
        sync.ack(10);
        sync.ack(3);
        assert_eq!(sync.wait(10, Tick::now()), WaitResult::Ok);
    }

    #[test]
    fn concurrent_ack_releases_waiter() {
        let sync = Arc::new(AckSync::new());
        let waiter = {
            let sync = Arc::clone(&sync);
            std::thread::spawn(move || sync.wait(7, Tick::now() + Tick::from_ms(5_000)))
        };
        std::thread::sleep(Duration::from_millis(20));
        sync.ack(7);
        assert_eq!(waiter.join().unwrap(), WaitResult::Ok);
    }

    #[test]
    fn interruption_is_sticky() {
        let sync = Arc::new(AckSync::new());
        let waiter = {
            let sync = Arc::clone(&sync);
            std::thread::spawn(move || sync.wait(1, Tick::now() + Tick::from_ms(5_000)))
        };
        std::thread::sleep(Duration::from_millis(20));
        sync.interrupt();
        assert_eq!(waiter.join().unwrap(), WaitResult::Interrupted);
        // Still interrupted for later waiters, even after an ack.
        sync.ack(10);
        assert_eq!(sync.wait(1, Tick::now()), WaitResult::Interrupted);
    }
}
