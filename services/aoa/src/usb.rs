//! rusb-backed AOAv2 transport.
//!
//! The Android Open Accessory v2 HID support is driven entirely through
//! vendor control transfers on the default endpoint; see
//! <https://source.android.com/devices/accessories/aoa2#hid-support>.

use std::time::Duration;

use crate::{AoaTransport, Error};

const TRANSFER_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Copy, Clone, PartialEq, Eq, num_derive::FromPrimitive, num_derive::ToPrimitive)]
#[repr(u8)]
pub enum AoaRequest {
    RegisterHid = 54,
    UnregisterHid = 55,
    SetHidReportDesc = 56,
    SendHidEvent = 57,
}

pub struct UsbTransport {
    handle: rusb::DeviceHandle<rusb::Context>,
}

impl UsbTransport {
    /// Open the USB device whose serial number matches. Devices that cannot
    /// be opened or probed are silently skipped: most USB devices on the
    /// computer are simply not ours to read.
    pub fn open(serial: &str) -> Result<UsbTransport, Error> {
        use rusb::UsbContext;

        let context = rusb::Context::new().map_err(|e| Error::Usb(e.to_string()))?;
        let devices = context.devices().map_err(|e| Error::Usb(e.to_string()))?;

        for device in devices.iter() {
            let descriptor = match device.device_descriptor() {
                Ok(descriptor) => descriptor,
                Err(_) => continue,
            };
            let handle = match device.open() {
                Ok(handle) => handle,
                Err(_) => continue,
            };
            match handle.read_serial_number_string_ascii(&descriptor) {
                Ok(sn) if sn == serial => {
                    log::debug!(
                        "USB device {:04x}:{:04x} matches serial {serial}",
                        descriptor.vendor_id(),
                        descriptor.product_id()
                    );
                    return Ok(UsbTransport { handle });
                }
                _ => continue,
            }
        }

        Err(Error::DeviceNotFound(serial.to_owned()))
    }

    fn control_out(
        &mut self,
        request: AoaRequest,
        value: u16,
        index: u16,
        data: &[u8],
    ) -> Result<(), Error> {
        let request_type = rusb::request_type(
            rusb::Direction::Out,
            rusb::RequestType::Vendor,
            rusb::Recipient::Device,
        );
        self.handle
            .write_control(request_type, request as u8, value, index, data, TRANSFER_TIMEOUT)
            .map_err(|e| Error::Usb(e.to_string()))?;
        Ok(())
    }
}

impl AoaTransport for UsbTransport {
    fn register_hid(&mut self, accessory_id: u16, report_desc_size: u16) -> Result<(), Error> {
        // value: accessory id, index: total descriptor length
        self.control_out(AoaRequest::RegisterHid, accessory_id, report_desc_size, &[])
    }

    fn set_hid_report_desc(&mut self, accessory_id: u16, report_desc: &[u8]) -> Result<(), Error> {
        // libusb splits transfers larger than the ep0 packet size itself,
        // so the whole descriptor goes in one call with offset 0.
        self.control_out(AoaRequest::SetHidReportDesc, accessory_id, 0, report_desc)
    }

    fn send_hid_event(&mut self, accessory_id: u16, data: &[u8]) -> Result<(), Error> {
        self.control_out(AoaRequest::SendHidEvent, accessory_id, 0, data)
    }

    fn unregister_hid(&mut self, accessory_id: u16) -> Result<(), Error> {
        self.control_out(AoaRequest::UnregisterHid, accessory_id, 0, &[])
    }
}
