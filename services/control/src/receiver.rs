//! Device message receiver.
//!
//! Reads the control socket into a rolling buffer, deserializes as many
//! complete messages as available, then compacts the residue to the front.
//! Dispatch is cheap and non-blocking: clipboard to the host clipboard,
//! acks to the gate, UHID outputs to their registered receivers.

use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread;
use std::thread::JoinHandle;

use wire::{DeviceMsg, DEVICE_MSG_MAX_SIZE};

use crate::acksync::AckSync;
use crate::uhid::UhidDevices;

/// Host clipboard access, owned by the UI layer.
pub trait HostClipboard: Send {
    fn get(&mut self) -> Option<String>;
    fn set(&mut self, text: &str);
}

/// Last clipboard text received from the device, shared with the input
/// manager so it can avoid sending the same content straight back.
#[derive(Clone, Default)]
pub struct ClipboardState {
    last: Arc<Mutex<Option<String>>>,
}

impl ClipboardState {
    pub fn new() -> ClipboardState {
        ClipboardState::default()
    }

    pub fn record(&self, text: &str) {
        *self.last.lock().unwrap() = Some(text.to_owned());
    }

    pub fn is_last(&self, text: &str) -> bool {
        self.last.lock().unwrap().as_deref() == Some(text)
    }
}

pub struct Receiver {
    acksync: Arc<AckSync>,
    clipboard: Box<dyn HostClipboard>,
    clipboard_state: ClipboardState,
    uhid_devices: UhidDevices,
    thread: Option<JoinHandle<()>>,
}

impl Receiver {
    pub fn new(
        acksync: Arc<AckSync>,
        clipboard: Box<dyn HostClipboard>,
        clipboard_state: ClipboardState,
        uhid_devices: UhidDevices,
    ) -> Receiver {
        Receiver { acksync, clipboard, clipboard_state, uhid_devices, thread: None }
    }

    /// Spawn the read loop. Cancellation happens by shutting down the
    /// socket; the blocking read then returns and the thread exits.
    pub fn start<R: Read + Send + 'static>(&mut self, socket: R) {
        assert!(self.thread.is_none(), "receiver already started");
        let mut worker = Worker {
            acksync: Arc::clone(&self.acksync),
            clipboard: std::mem::replace(&mut self.clipboard, Box::new(NullClipboard)),
            clipboard_state: self.clipboard_state.clone(),
            uhid_devices: self.uhid_devices.clone(),
        };
        self.thread = Some(
            thread::Builder::new()
                .name("receiver".into())
                .spawn(move || worker.run(socket))
                .expect("could not spawn receiver thread"),
        );
    }

    pub fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            thread.join().unwrap();
        }
    }
}

struct NullClipboard;

impl HostClipboard for NullClipboard {
    fn get(&mut self) -> Option<String> {
        None
    }

    fn set(&mut self, _text: &str) {}
}

struct Worker {
    acksync: Arc<AckSync>,
    clipboard: Box<dyn HostClipboard>,
    clipboard_state: ClipboardState,
    uhid_devices: UhidDevices,
}

impl Worker {
    fn run<R: Read>(&mut self, mut socket: R) {
        log::debug!("receiver thread started");
        let mut buf = vec![0u8; DEVICE_MSG_MAX_SIZE];
        let mut head = 0usize;

        loop {
            assert!(head < DEVICE_MSG_MAX_SIZE);
            let read = match socket.read(&mut buf[head..]) {
                Ok(0) | Err(_) => {
                    log::debug!("receiver stopped");
                    break;
                }
                Ok(n) => n,
            };
            head += read;

            match self.process_msgs(&buf[..head]) {
                Ok(consumed) => {
                    if consumed > 0 {
                        // Shift the remaining bytes to the front.
                        buf.copy_within(consumed..head, 0);
                        head -= consumed;
                    }
                }
                Err(e) => {
                    log::error!("device message stream desynchronized: {e}");
                    break;
                }
            }
        }
        log::debug!("receiver thread ended");
    }

    /// Process every complete message at the front of `buf`; returns how
    /// many bytes were consumed.
    fn process_msgs(&mut self, buf: &[u8]) -> Result<usize, wire::DeserializeError> {
        let mut head = 0;
        while let Some((msg, consumed)) = DeviceMsg::deserialize(&buf[head..])? {
            self.process_msg(msg);
            head += consumed;
        }
        Ok(head)
    }

    fn process_msg(&mut self, msg: DeviceMsg) {
        match msg {
            DeviceMsg::Clipboard { text } => {
                self.clipboard_state.record(&text);
                let current = self.clipboard.get();
                if current.as_deref() == Some(text.as_str()) {
                    log::debug!("computer clipboard unchanged");
                    return;
                }
                log::info!("device clipboard copied");
                self.clipboard.set(&text);
            }
            DeviceMsg::AckClipboard { sequence } => {
                log::debug!("ack device clipboard sequence={sequence}");
                self.acksync.ack(sequence);
            }
            DeviceMsg::UhidOutput { id, data } => {
                log::trace!("UHID output [{id}] {data:02x?}");
                self.uhid_devices.route_output(id, &data);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acksync::WaitResult;
    use std::io;
    use tick::Tick;

    #[derive(Clone, Default)]
    struct FakeClipboard {
        content: Arc<Mutex<Option<String>>>,
        sets: Arc<Mutex<usize>>,
    }

    impl HostClipboard for FakeClipboard {
        fn get(&mut self) -> Option<String> {
            self.content.lock().unwrap().clone()
        }

        fn set(&mut self, text: &str) {
            *self.content.lock().unwrap() = Some(text.to_owned());
            *self.sets.lock().unwrap() += 1;
        }
    }

    /// Reader delivering its data in deliberately tiny chunks to exercise
    /// the compaction path.
    struct TrickleReader {
        data: Vec<u8>,
        pos: usize,
        chunk: usize,
    }

    impl Read for TrickleReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.pos >= self.data.len() {
                return Ok(0);
            }
            let n = self.chunk.min(self.data.len() - self.pos).min(buf.len());
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    fn run_receiver(
        data: Vec<u8>,
        chunk: usize,
    ) -> (Arc<AckSync>, FakeClipboard, ClipboardState, UhidDevices) {
        let acksync = Arc::new(AckSync::new());
        let clipboard = FakeClipboard::default();
        let state = ClipboardState::new();
        let uhid = UhidDevices::new();
        let mut receiver = Receiver::new(
            Arc::clone(&acksync),
            Box::new(clipboard.clone()),
            state.clone(),
            uhid.clone(),
        );
        receiver.start(TrickleReader { data, pos: 0, chunk });
        receiver.join();
        (acksync, clipboard, state, uhid)
    }

    #[test]
    fn clipboard_round_trip() {
        // [00][00 00 00 05]["Hello"]
        let data = vec![0x00, 0x00, 0x00, 0x00, 0x05, b'H', b'e', b'l', b'l', b'o'];
        let (_, clipboard, state, _) = run_receiver(data, 64);
        assert_eq!(clipboard.content.lock().unwrap().as_deref(), Some("Hello"));
        // The input manager can now tell this text came from the device and
        // must not send it straight back.
        assert!(state.is_last("Hello"));
        assert!(!state.is_last("Other"));
    }

    #[test]
    fn unchanged_clipboard_is_not_rewritten() {
        let mut data = Vec::new();
        DeviceMsg::Clipboard { text: "same".into() }.serialize(&mut data);
        DeviceMsg::Clipboard { text: "same".into() }.serialize(&mut data);
        let (_, clipboard, _, _) = run_receiver(data, 64);
        assert_eq!(*clipboard.sets.lock().unwrap(), 1);
    }

    #[test]
    fn acks_reach_the_gate_across_fragmented_reads() {
        let mut data = Vec::new();
        DeviceMsg::AckClipboard { sequence: 42 }.serialize(&mut data);
        DeviceMsg::AckClipboard { sequence: 43 }.serialize(&mut data);
        // One byte per read: every message spans many reads.
        let (acksync, _, _, _) = run_receiver(data, 1);
        assert_eq!(acksync.wait(43, Tick::now()), WaitResult::Ok);
    }

    #[test]
    fn uhid_output_routes_to_registered_receiver() {
        struct Probe {
            outputs: Arc<Mutex<Vec<Vec<u8>>>>,
        }
        impl crate::uhid::UhidOutputReceiver for Probe {
            fn process_output(&mut self, data: &[u8]) {
                self.outputs.lock().unwrap().push(data.to_vec());
            }
        }

        let outputs = Arc::new(Mutex::new(Vec::new()));
        let acksync = Arc::new(AckSync::new());
        let uhid = UhidDevices::new();
        uhid.register(1, Box::new(Probe { outputs: outputs.clone() }));

        let mut data = Vec::new();
        DeviceMsg::UhidOutput { id: 1, data: vec![0x01] }.serialize(&mut data);
        let mut receiver = Receiver::new(
            Arc::clone(&acksync),
            Box::new(FakeClipboard::default()),
            ClipboardState::new(),
            uhid.clone(),
        );
        receiver.start(TrickleReader { data, pos: 0, chunk: 2 });
        receiver.join();

        assert_eq!(outputs.lock().unwrap().as_slice(), [vec![0x01]]);
    }

    #[test]
    fn protocol_desync_stops_processing() {
        let mut data = Vec::new();
        DeviceMsg::AckClipboard { sequence: 1 }.serialize(&mut data);
        data.push(0x7F); // unknown type
        DeviceMsg::AckClipboard { sequence: 2 }.serialize(&mut data);

        let (acksync, _, _, _) = run_receiver(data, 64);
        assert_eq!(acksync.wait(1, Tick::now()), WaitResult::Ok);
        // Message after the desync must not have been processed.
        assert_eq!(acksync.wait(2, Tick::now()), WaitResult::Timeout);
    }
}
