//! Routing of UHID output reports to their device-side owners.
//!
//! When input is forwarded through UHID, the handset occasionally talks
//! back: keyboard LED state, gamepad rumble. Whoever created the UHID
//! device registers a receiver here; the receiver is looked up by id when
//! the corresponding device message arrives.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub trait UhidOutputReceiver: Send {
    fn process_output(&mut self, data: &[u8]);
}

#[derive(Clone, Default)]
pub struct UhidDevices {
    receivers: Arc<Mutex<HashMap<u16, Box<dyn UhidOutputReceiver>>>>,
}

impl UhidDevices {
    pub fn new() -> UhidDevices {
        UhidDevices::default()
    }

    pub fn register(&self, id: u16, receiver: Box<dyn UhidOutputReceiver>) {
        let previous = self.receivers.lock().unwrap().insert(id, receiver);
        if previous.is_some() {
            log::warn!("UHID receiver {id} replaced");
        }
    }

    pub fn unregister(&self, id: u16) {
        self.receivers.lock().unwrap().remove(&id);
    }

    /// Registration is optional: an output for an unknown id is only worth
    /// a warning.
    pub fn route_output(&self, id: u16, data: &[u8]) {
        match self.receivers.lock().unwrap().get_mut(&id) {
            Some(receiver) => receiver.process_output(data),
            None => log::warn!("no UHID receiver for id {id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe {
        outputs: Arc<Mutex<Vec<Vec<u8>>>>,
    }

    impl UhidOutputReceiver for Probe {
        fn process_output(&mut self, data: &[u8]) {
            self.outputs.lock().unwrap().push(data.to_vec());
        }
    }

    #[test]
    fn routes_by_id() {
        let devices = UhidDevices::new();
        let outputs = Arc::new(Mutex::new(Vec::new()));
        devices.register(1, Box::new(Probe { outputs: outputs.clone() }));

        devices.route_output(1, &[0x02]);
        devices.route_output(9, &[0xFF]); // unknown: warn only
        assert_eq!(outputs.lock().unwrap().as_slice(), [vec![0x02]]);

        devices.unregister(1);
        devices.route_output(1, &[0x00]);
        assert_eq!(outputs.lock().unwrap().len(), 1);
    }
}
