//! Control socket plumbing: the write worker for client → device messages,
//! the read worker for device → client messages, and the acknowledgement
//! gate connecting them to the USB HID path.

pub mod acksync;
pub mod controller;
pub mod receiver;
pub mod uhid;

pub use acksync::{AckSync, WaitResult};
pub use controller::Controller;
pub use receiver::{ClipboardState, HostClipboard, Receiver};
pub use uhid::{UhidDevices, UhidOutputReceiver};
