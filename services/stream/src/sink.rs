//! Packet and frame sink traits, and the fan-out sources feeding them.
//!
//! Sinks never report errors back upstream beyond their Result: a failed
//! sink marks the whole stream as failed and the source stops pushing.

use std::sync::Arc;

use crate::frame::Frame;
use crate::packet::{CodecId, Packet};
use crate::Error;

/// Stream parameters negotiated before the first frame.
#[derive(Debug, Copy, Clone)]
pub struct StreamParams {
    pub codec: CodecId,
    /// Present for audio streams.
    pub sample_rate: Option<u32>,
    pub channels: Option<u16>,
}

impl StreamParams {
    pub fn video(codec: CodecId) -> StreamParams {
        StreamParams { codec, sample_rate: None, channels: None }
    }

    pub fn audio(codec: CodecId, sample_rate: u32, channels: u16) -> StreamParams {
        StreamParams { codec, sample_rate: Some(sample_rate), channels: Some(channels) }
    }
}

/// Component able to receive demuxed packets (decoder, recorder).
pub trait PacketSink: Send {
    fn open(&mut self, codec: CodecId) -> Result<(), Error>;
    fn push(&mut self, packet: &Packet) -> Result<(), Error>;
    fn close(&mut self, ok: bool);
}

/// Component able to receive decoded frames (display, audio player,
/// recorder-side encoders, exporters).
pub trait FrameSink: Send {
    fn open(&mut self, params: &StreamParams) -> Result<(), Error>;
    fn push(&mut self, frame: &Arc<Frame>) -> Result<(), Error>;
    fn close(&mut self);
}

pub const MAX_SINKS: usize = 2;

/// Fan-out of one packet stream to its sink set.
#[derive(Default)]
pub struct PacketSource {
    sinks: Vec<Box<dyn PacketSink>>,
}

impl PacketSource {
    pub fn new() -> PacketSource {
        PacketSource { sinks: Vec::new() }
    }

    pub fn add_sink(&mut self, sink: Box<dyn PacketSink>) {
        assert!(self.sinks.len() < MAX_SINKS);
        self.sinks.push(sink);
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Open every sink in order; on failure, close the already-opened ones
    /// in reverse order and report the error.
    pub fn open(&mut self, codec: CodecId) -> Result<(), Error> {
        for i in 0..self.sinks.len() {
            if let Err(e) = self.sinks[i].open(codec) {
                for sink in self.sinks[..i].iter_mut().rev() {
                    sink.close(false);
                }
                return Err(e);
            }
        }
        Ok(())
    }

    pub fn push(&mut self, packet: &Packet) -> Result<(), Error> {
        for sink in self.sinks.iter_mut() {
            sink.push(packet)?;
        }
        Ok(())
    }

    pub fn close(&mut self, ok: bool) {
        for sink in self.sinks.iter_mut().rev() {
            sink.close(ok);
        }
    }
}

/// Fan-out of one frame stream to its sink set.
#[derive(Default)]
pub struct FrameSource {
    sinks: Vec<Box<dyn FrameSink>>,
}

impl FrameSource {
    pub fn new() -> FrameSource {
        FrameSource { sinks: Vec::new() }
    }

    pub fn add_sink(&mut self, sink: Box<dyn FrameSink>) {
        assert!(self.sinks.len() < MAX_SINKS);
        self.sinks.push(sink);
    }

    pub fn open(&mut self, params: &StreamParams) -> Result<(), Error> {
        for i in 0..self.sinks.len() {
            if let Err(e) = self.sinks[i].open(params) {
                for sink in self.sinks[..i].iter_mut().rev() {
                    sink.close();
                }
                return Err(e);
            }
        }
        Ok(())
    }

    pub fn push(&mut self, frame: &Arc<Frame>) -> Result<(), Error> {
        for sink in self.sinks.iter_mut() {
            sink.push(frame)?;
        }
        Ok(())
    }

    pub fn close(&mut self) {
        for sink in self.sinks.iter_mut().rev() {
            sink.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Recorder {
        opened: Arc<AtomicUsize>,
        closed: Arc<AtomicUsize>,
        fail_open: bool,
    }

    impl PacketSink for Recorder {
        fn open(&mut self, _codec: CodecId) -> Result<(), Error> {
            if self.fail_open {
                return Err(Error::Codec("refused".into()));
            }
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn push(&mut self, _packet: &Packet) -> Result<(), Error> {
            Ok(())
        }

        fn close(&mut self, _ok: bool) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn open_failure_unwinds_earlier_sinks() {
        let opened = Arc::new(AtomicUsize::new(0));
        let closed = Arc::new(AtomicUsize::new(0));

        let mut source = PacketSource::new();
        source.add_sink(Box::new(Recorder {
            opened: opened.clone(),
            closed: closed.clone(),
            fail_open: false,
        }));
        source.add_sink(Box::new(Recorder {
            opened: opened.clone(),
            closed: closed.clone(),
            fail_open: true,
        }));

        assert!(source.open(CodecId::H264).is_err());
        assert_eq!(opened.load(Ordering::SeqCst), 1);
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }
}
