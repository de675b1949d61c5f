//! Frame relay: the worker half shared by every threaded frame sink.
//!
//! Display, V4L2 and VNC-style sinks all follow the same shape: the decoder
//! pushes into a frame buffer (latest frame wins) and a dedicated thread
//! consumes and processes at its own pace. The relay packages that shape so
//! a concrete sink only supplies the per-frame callback.

use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::thread::JoinHandle;

use crate::frame::Frame;
use crate::frame_buffer::FrameBuffer;

struct Shared {
    fb: FrameBuffer,
    state: Mutex<State>,
    cond: Condvar,
}

#[derive(Default)]
struct State {
    has_frame: bool,
    stopped: bool,
}

pub struct FrameRelay {
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
    skipped: u64,
}

impl FrameRelay {
    /// Start the worker. `on_frame` runs on the relay thread for every
    /// consumed frame; returning an error stops the relay (the sink is
    /// failed).
    pub fn start<F>(name: &str, mut on_frame: F) -> FrameRelay
    where
        F: FnMut(Arc<Frame>) -> Result<(), crate::Error> + Send + 'static,
    {
        let shared = Arc::new(Shared {
            fb: FrameBuffer::new(),
            state: Mutex::new(State::default()),
            cond: Condvar::new(),
        });

        let thread = thread::Builder::new()
            .name(name.into())
            .spawn({
                let shared = Arc::clone(&shared);
                move || {
                    loop {
                        let mut state = shared.state.lock().unwrap();
                        while !state.stopped && !state.has_frame {
                            state = shared.cond.wait(state).unwrap();
                        }
                        if state.stopped {
                            break;
                        }
                        state.has_frame = false;
                        drop(state);

                        let frame = shared.fb.consume();
                        if let Err(e) = on_frame(frame) {
                            log::warn!("frame relay consumer failed: {e}");
                            break;
                        }
                    }
                    log::debug!("frame relay thread ended");
                }
            })
            .expect("could not spawn frame relay thread");

        FrameRelay { shared, thread: Some(thread), skipped: 0 }
    }

    /// Called from the decoder thread; never blocks.
    pub fn push(&mut self, frame: Arc<Frame>) {
        if self.shared.fb.push(frame) {
            self.skipped += 1;
            log::trace!("frame skipped ({} total)", self.skipped);
        }
        let mut state = self.shared.state.lock().unwrap();
        state.has_frame = true;
        self.shared.cond.notify_one();
    }

    /// Frames dropped because a newer one arrived before consumption.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

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

impl Drop for FrameRelay {
    fn drop(&mut self) {
        self.stop();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::AudioFrame;
    use std::sync::mpsc;
    use std::time::Duration;

    fn frame(tag: u64) -> Arc<Frame> {
        Frame::audio(Some(tag), AudioFrame { sample_rate: 48_000, channels: 2, samples: vec![] })
    }

    #[test]
    fn relays_frames_to_consumer() {
        let (tx, rx) = mpsc::channel();
        let mut relay = FrameRelay::start("relay-test", move |frame| {
            tx.send(frame.pts).unwrap();
            Ok(())
        });

        relay.push(frame(1));
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), Some(1));
        relay.push(frame(2));
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), Some(2));

        relay.stop();
        relay.join();
    }

    #[test]
    fn only_latest_frame_survives_backpressure() {
        let (gate_tx, gate_rx) = mpsc::channel::<()>();
        let (seen_tx, seen_rx) = mpsc::channel();
        let mut relay = FrameRelay::start("relay-slow", move |frame| {
            gate_rx.recv().ok();
            seen_tx.send(frame.pts).unwrap();
            Ok(())
        });

        relay.push(frame(1));
        relay.push(frame(2));
        relay.push(frame(3));
        // Unblock the consumer; it sees at most frame 1 and then frame 3.
        for _ in 0..3 {
            let _ = gate_tx.send(());
        }

        let first = seen_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(first == Some(1) || first == Some(3));
        if first == Some(1) {
            assert_eq!(seen_rx.recv_timeout(Duration::from_secs(5)).unwrap(), Some(3));
        }
        assert!(relay.skipped() >= 1);

        relay.stop();
        relay.join();
    }
}
