//! USB AOA HID worker.
//!
//! HID opens, inputs and closes are queued by the input processors and
//! pumped to the handset by a single worker thread issuing vendor control
//! transfers. An input event may carry an `ack_to_wait`: the transfer is
//! then held until the receiver observes the matching acknowledgement on
//! the control socket, which guarantees a SetClipboard pushed earlier has
//! been committed before the paste keystroke reaches the device.

pub mod usb;

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::thread::JoinHandle;

use control::{AckSync, WaitResult};
use hid::{HidClose, HidInput, HidOpen};
use tick::Tick;
use wire::Sequence;

pub use usb::UsbTransport;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("usb: {0}")]
    Usb(String),
    #[error("no USB device with serial {0}")]
    DeviceNotFound(String),
}

/// Abstraction over the four AOAv2 HID requests, so the worker logic can be
/// exercised without hardware.
pub trait AoaTransport: Send {
    fn register_hid(&mut self, accessory_id: u16, report_desc_size: u16) -> Result<(), Error>;
    fn set_hid_report_desc(&mut self, accessory_id: u16, report_desc: &[u8]) -> Result<(), Error>;
    fn send_hid_event(&mut self, accessory_id: u16, data: &[u8]) -> Result<(), Error>;
    fn unregister_hid(&mut self, accessory_id: u16) -> Result<(), Error>;
}

/// Do not block the worker forever if an ack never comes.
const ACK_DEADLINE: Tick = Tick::from_ms(500);

/// Queue bound; input floods (e.g. gamepad axis storms) drop at the tail.
const EVENT_QUEUE_LIMIT: usize = 64;

enum AoaEvent {
    Open { hid: HidOpen, exit_on_error: bool },
    Input { input: HidInput, ack_to_wait: Option<Sequence> },
    Close { hid: HidClose },
}

#[derive(Default)]
struct State {
    queue: VecDeque<AoaEvent>,
    stopped: bool,
}

struct Shared {
    state: Mutex<State>,
    cond: Condvar,
}

pub struct Aoa {
    shared: Arc<Shared>,
    acksync: Arc<AckSync>,
    thread: Option<JoinHandle<()>>,
}

impl Aoa {
    pub fn new(acksync: Arc<AckSync>) -> Aoa {
        Aoa {
            shared: Arc::new(Shared { state: Mutex::new(State::default()), cond: Condvar::new() }),
            acksync,
            thread: None,
        }
    }

    pub fn start<T: AoaTransport + 'static>(&mut self, transport: T) {
        assert!(self.thread.is_none(), "aoa already started");
        let shared = Arc::clone(&self.shared);
        let acksync = Arc::clone(&self.acksync);
        self.thread = Some(
            thread::Builder::new()
                .name("aoa".into())
                .spawn(move || run_aoa(shared, acksync, transport))
                .expect("could not spawn aoa thread"),
        );
    }

    fn push_event(&self, event: AoaEvent) -> bool {
        let mut state = self.shared.state.lock().unwrap();
        if state.stopped || state.queue.len() >= EVENT_QUEUE_LIMIT {
            return false;
        }
        let was_empty = state.queue.is_empty();
        state.queue.push_back(event);
        if was_empty {
            self.shared.cond.notify_one();
        }
        true
    }

    /// Request registration of a HID device. With `exit_on_error`, a failed
    /// registration terminates the worker (a missing keyboard is fatal, a
    /// missing gamepad is not).
    pub fn push_open(&self, hid: HidOpen, exit_on_error: bool) -> bool {
        self.push_event(AoaEvent::Open { hid, exit_on_error })
    }

    pub fn push_input(&self, input: HidInput) -> bool {
        self.push_event(AoaEvent::Input { input, ack_to_wait: None })
    }

    pub fn push_input_with_ack(&self, input: HidInput, ack_to_wait: Option<Sequence>) -> bool {
        self.push_event(AoaEvent::Input { input, ack_to_wait })
    }

    pub fn push_close(&self, hid: HidClose) -> bool {
        self.push_event(AoaEvent::Close { hid })
    }

    /// Idempotent. Also interrupts the ack gate so a blocked wait returns.
    pub fn stop(&self) {
        let mut state = self.shared.state.lock().unwrap();
        state.stopped = true;
        self.shared.cond.notify_all();
        drop(state);

        self.acksync.interrupt();
    }

    pub fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            thread.join().unwrap();
        }
    }
}

impl Drop for Aoa {
    fn drop(&mut self) {
        self.stop();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn run_aoa<T: AoaTransport>(shared: Arc<Shared>, acksync: Arc<AckSync>, mut transport: T) {
    log::debug!("aoa thread started");
    loop {
        let event = {
            let mut state = shared.state.lock().unwrap();
            while !state.stopped && state.queue.is_empty() {
                state = shared.cond.wait(state).unwrap();
            }
            if state.stopped {
                // Stop immediately, do not process further events.
                break;
            }
            state.queue.pop_front().unwrap()
        };

        match event {
            AoaEvent::Open { hid, exit_on_error } => {
                log::trace!("aoa open [{}]", hid.hid_id);
                let result = transport
                    .register_hid(hid.hid_id, hid.report_desc.len() as u16)
                    .and_then(|_| transport.set_hid_report_desc(hid.hid_id, hid.report_desc));
                if let Err(e) = result {
                    // Leave no half-registered device behind.
                    if transport.unregister_hid(hid.hid_id).is_err() {
                        log::warn!("could not unregister partially opened HID {}", hid.hid_id);
                    }
                    if exit_on_error {
                        log::error!("could not open HID {}: {e}", hid.hid_id);
                        break;
                    }
                    log::warn!("could not open HID {}: {e}", hid.hid_id);
                }
            }
            AoaEvent::Input { input, ack_to_wait } => {
                if let Some(sequence) = ack_to_wait {
                    log::debug!("waiting ack from server sequence={sequence}");
                    // Do not block the loop indefinitely if the ack never
                    // comes (it should never happen).
                    match acksync.wait(sequence, Tick::now() + ACK_DEADLINE) {
                        WaitResult::Timeout => {
                            log::warn!("ack not received after 500ms, discarding HID input");
                            continue;
                        }
                        WaitResult::Interrupted => break,
                        WaitResult::Ok => {}
                    }
                }
                log::trace!("aoa input [{}] {:02x?}", input.hid_id, input.bytes());
                if let Err(e) = transport.send_hid_event(input.hid_id, input.bytes()) {
                    log::warn!("could not send HID input to USB device: {e}");
                }
            }
            AoaEvent::Close { hid } => {
                log::trace!("aoa close [{}]", hid.hid_id);
                if let Err(e) = transport.unregister_hid(hid.hid_id) {
                    log::warn!("could not unregister HID {}: {e}", hid.hid_id);
                }
            }
        }
    }
    log::debug!("aoa thread ended");
}
