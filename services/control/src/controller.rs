//! Control message writer.
//!
//! A single worker drains a FIFO of control messages and writes their
//! serialized form onto the control socket, preserving push order. A write
//! error terminates the worker; whatever is still queued is dropped when
//! the controller goes away.

use std::collections::VecDeque;
use std::io::Write;
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::thread::JoinHandle;

use wire::ControlMsg;

#[derive(Default)]
struct State {
    queue: VecDeque<ControlMsg>,
    stopped: bool,
}

#[derive(Default)]
struct Shared {
    state: Mutex<State>,
    cond: Condvar,
}

pub struct Controller {
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller {
    pub fn new() -> Controller {
        Controller { shared: Arc::new(Shared::default()), thread: None }
    }

    pub fn start<W: Write + Send + 'static>(&mut self, socket: W) {
        assert!(self.thread.is_none(), "controller already started");
        let shared = Arc::clone(&self.shared);
        self.thread = Some(
            thread::Builder::new()
                .name("controller".into())
                .spawn(move || run_controller(shared, socket))
                .expect("could not spawn controller thread"),
        );
    }

    /// Enqueue a message for delivery. Returns false once stopped.
    pub fn push_msg(&self, msg: ControlMsg) -> bool {
        log::trace!("push {:?}", msg.msg_type());
        let mut state = self.shared.state.lock().unwrap();
        if state.stopped {
            return false;
        }
        let was_empty = state.queue.is_empty();
        state.queue.push_back(msg);
        if was_empty {
            self.shared.cond.notify_one();
        }
        true
    }

    /// Idempotent; pending messages are not flushed.
    pub fn stop(&self) {
        let mut state = self.shared.state.lock().unwrap();
        state.stopped = true;
        self.shared.cond.notify_all();
    }

    pub fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            thread.join().unwrap();
        }
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.stop();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn run_controller<W: Write>(shared: Arc<Shared>, mut socket: W) {
    log::debug!("controller thread started");
    let mut serialized = Vec::with_capacity(wire::CONTROL_MSG_MAX_SIZE);
    loop {
        let msg = {
            let mut state = shared.state.lock().unwrap();
            while !state.stopped && state.queue.is_empty() {
                state = shared.cond.wait(state).unwrap();
            }
            if state.stopped {
                // Stop immediately, do not process further messages.
                break;
            }
            state.queue.pop_front().unwrap()
        };

        serialized.clear();
        msg.serialize(&mut serialized);
        if let Err(e) = socket.write_all(&serialized).and_then(|_| socket.flush()) {
            log::debug!("could not write message to socket: {e}");
            break;
        }
    }
    log::debug!("controller thread ended");
}
