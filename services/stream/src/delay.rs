//! Optional display buffering.
//!
//! With a non-zero delay, decoded frames are re-emitted on a worker thread
//! at `clock(pts) + delay`, smoothing the irregular arrival times of network
//! frames into a steady presentation cadence. Downstream, the usual frame
//! buffer applies: the latest frame wins.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::thread::JoinHandle;

use tick::Tick;

use crate::clock::Clock;
use crate::frame::Frame;
use crate::frame_buffer::FrameBuffer;

/// Notified (from the pushing thread, or the buffering thread when a delay
/// is set) every time a new frame is pending.
pub trait DelaySink: Send + 'static {
    fn on_new_frame(&mut self, previous_skipped: bool);
}

impl<F: FnMut(bool) + Send + 'static> DelaySink for F {
    fn on_new_frame(&mut self, previous_skipped: bool) {
        self(previous_skipped)
    }
}

struct Entry {
    frame: Arc<Frame>,
    pts: u64,
}

#[derive(Default)]
struct Buffering {
    queue: VecDeque<Entry>,
    stopped: bool,
}

struct Shared {
    fb: FrameBuffer,
    buffering: Mutex<Buffering>,
    cond: Condvar,
    clock: Mutex<Clock>,
}

pub struct DelayBuffer {
    shared: Arc<Shared>,
    delay: Tick,
    sink: Option<Box<dyn DelaySink>>,
    thread: Option<JoinHandle<()>>,
}

impl DelayBuffer {
    pub fn new(delay: Tick) -> DelayBuffer {
        DelayBuffer {
            shared: Arc::new(Shared {
                fb: FrameBuffer::new(),
                buffering: Mutex::new(Buffering::default()),
                cond: Condvar::new(),
                clock: Mutex::new(Clock::new()),
            }),
            delay,
            sink: None,
            thread: None,
        }
    }

    pub fn start<S: DelaySink>(&mut self, sink: S) {
        if self.delay == Tick::ZERO {
            // No buffering: frames are offered synchronously from push().
            self.sink = Some(Box::new(sink));
            return;
        }

        let shared = Arc::clone(&self.shared);
        let delay = self.delay;
        let mut sink: Box<dyn DelaySink> = Box::new(sink);
        self.thread = Some(
            thread::Builder::new()
                .name("delay-buffer".into())
                .spawn(move || run_buffering(shared, delay, &mut *sink))
                .expect("could not spawn buffering thread"),
        );
    }

    /// Called on the decoder thread.
    pub fn push(&mut self, frame: Arc<Frame>) {
        if self.delay == Tick::ZERO {
            let previous_skipped = self.shared.fb.push(frame);
            if let Some(sink) = self.sink.as_mut() {
                sink.on_new_frame(previous_skipped);
            }
            return;
        }

        let pts = frame.pts.unwrap_or(0);
        self.shared.clock.lock().unwrap().update(Tick::now(), pts);
        // The deadline is computed against the fit at dequeue time; enqueue
        // just records the target pts.
        let mut buffering = self.shared.buffering.lock().unwrap();
        buffering.queue.push_back(Entry { frame, pts });
        drop(buffering);
        self.shared.cond.notify_all();
    }

    /// Latest presentation-time estimate for a device timestamp.
    pub fn estimate(&self, pts: u64) -> Option<Tick> {
        let clock = self.shared.clock.lock().unwrap();
        if clock.is_estimable() { Some(clock.to_system_time(pts) + self.delay) } else { None }
    }

    /// Take the pending output frame; valid after an `on_new_frame`.
    pub fn consume(&self) -> Arc<Frame> {
        self.shared.fb.consume()
    }

    pub fn stop(&self) {
        let mut buffering = self.shared.buffering.lock().unwrap();
        buffering.stopped = true;
        self.shared.cond.notify_all();
    }

    pub fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            thread.join().unwrap();
        }
    }
}

impl Drop for DelayBuffer {
    fn drop(&mut self) {
        self.stop();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn run_buffering(shared: Arc<Shared>, delay: Tick, sink: &mut dyn DelaySink) {
    loop {
        let mut buffering = shared.buffering.lock().unwrap();
        while !buffering.stopped && buffering.queue.is_empty() {
            buffering = shared.cond.wait(buffering).unwrap();
        }
        if buffering.stopped {
            break;
        }

        let entry = buffering.queue.pop_front().unwrap();
        drop(buffering);

        // Hold the frame until its presentation deadline, but never more
        // than `delay` past dequeue (a bad fit must not stall the stream).
        let cap = Tick::now() + delay;
        loop {
            // Refresh the estimate outside the queue lock (one mutex at a
            // time); pushes keep improving the fit while we wait.
            let mut deadline = shared.clock.lock().unwrap().to_system_time(entry.pts) + delay;
            if deadline > cap {
                deadline = cap;
            }
            let buffering = shared.buffering.lock().unwrap();
            if buffering.stopped {
                return;
            }
            let remaining = deadline.remaining();
            if remaining.is_zero() {
                break;
            }
            let (_guard, timeout) = shared.cond.wait_timeout(buffering, remaining).unwrap();
            if timeout.timed_out() {
                break;
            }
        }

        let previous_skipped = shared.fb.push(entry.frame);
        sink.on_new_frame(previous_skipped);
    }
    log::debug!("buffering thread ended");
}
