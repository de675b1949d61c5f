//! Media stream demultiplexing.
//!
//! The device sends, per stream: a 4-byte ASCII codec tag, then framed
//! packets. Each frame is a u64-BE header followed by the payload:
//!
//! ```text
//!  bit 63: codec-config flag
//!  bit 62: key-frame flag (informational, for recorders)
//!  bits 32..=61: payload size in bytes (30 bits, never zero)
//!  bits 0..=31: PTS in µs, all-ones meaning "no PTS" (config packet)
//! ```
//!
//! A short read at a frame boundary is a normal end of stream. A zero size
//! or an unknown codec tag means the framing is lost, which is fatal.

use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread;
use std::thread::JoinHandle;

use crate::packet::{CodecId, Packet};
use crate::sink::{PacketSink, PacketSource};

pub const PTS_NONE: u32 = u32::MAX;
pub const FRAME_SIZE_MAX: u32 = (1 << 30) - 1;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FrameHeader {
    pub config: bool,
    pub key_frame: bool,
    pub size: u32,
    pub pts: Option<u64>,
}

pub fn parse_frame_header(raw: u64) -> FrameHeader {
    let config = raw & (1 << 63) != 0;
    let key_frame = raw & (1 << 62) != 0;
    let size = ((raw >> 32) & FRAME_SIZE_MAX as u64) as u32;
    let pts_raw = (raw & 0xFFFF_FFFF) as u32;
    // The config flag and the PTS sentinel are redundant; accept either.
    let pts = if config || pts_raw == PTS_NONE { None } else { Some(pts_raw as u64) };
    FrameHeader { config, key_frame, size, pts }
}

pub fn build_frame_header(header: FrameHeader) -> u64 {
    let mut raw = (header.size as u64) << 32;
    match header.pts {
        Some(pts) => raw |= pts & 0xFFFF_FFFF,
        None => raw |= (1 << 63) | PTS_NONE as u64,
    }
    if header.key_frame {
        raw |= 1 << 62;
    }
    raw
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DemuxerStatus {
    /// The stream ended cleanly (socket closed or shut down).
    Eos,
    /// The framing was lost or a sink failed.
    Error,
}

pub struct Demuxer {
    source: Option<PacketSource>,
    thread: Option<JoinHandle<DemuxerStatus>>,
    codec: Arc<Mutex<Option<CodecId>>>,
}

impl Default for Demuxer {
    fn default() -> Self {
        Self::new()
    }
}

impl Demuxer {
    pub fn new() -> Demuxer {
        Demuxer {
            source: Some(PacketSource::new()),
            thread: None,
            codec: Arc::new(Mutex::new(None)),
        }
    }

    /// Sinks must be registered before `start()`.
    pub fn add_sink(&mut self, sink: Box<dyn PacketSink>) {
        self.source.as_mut().expect("demuxer already started").add_sink(sink);
    }

    /// The negotiated codec, once the tag has been read off the stream.
    pub fn codec(&self) -> Option<CodecId> {
        *self.codec.lock().unwrap()
    }

    /// Spawn the demuxer thread, consuming the reader. There is no explicit
    /// stop: shutting down the underlying socket makes the blocking read
    /// return and the thread exit with a clean EOS.
    pub fn start<R: Read + Send + 'static>(&mut self, reader: R) {
        let source = self.source.take().expect("demuxer already started");
        assert!(!source.is_empty());
        let codec_slot = Arc::clone(&self.codec);
        self.thread = Some(
            thread::Builder::new()
                .name("demuxer".into())
                .spawn(move || run_demuxer(reader, source, codec_slot))
                .expect("could not spawn demuxer thread"),
        );
    }

    pub fn join(&mut self) -> DemuxerStatus {
        match self.thread.take() {
            Some(handle) => handle.join().unwrap_or(DemuxerStatus::Error),
            None => DemuxerStatus::Error,
        }
    }
}

fn read_exact_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => return Ok(false),
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(true)
}

fn run_demuxer<R: Read>(
    mut reader: R,
    mut source: PacketSource,
    codec_slot: Arc<Mutex<Option<CodecId>>>,
) -> DemuxerStatus {
    log::debug!("demuxer thread started");

    let mut tag = [0u8; 4];
    match read_exact_or_eof(&mut reader, &mut tag) {
        Ok(true) => {}
        Ok(false) | Err(_) => {
            log::debug!("stream ended before codec negotiation");
            return DemuxerStatus::Eos;
        }
    }

    let codec = match CodecId::from_tag(tag) {
        Some(codec) => codec,
        None => {
            log::error!("unknown codec tag {:02x?}", tag);
            return DemuxerStatus::Error;
        }
    };
    *codec_slot.lock().unwrap() = Some(codec);
    log::info!("stream codec: {:?}", codec);

    if let Err(e) = source.open(codec) {
        log::error!("could not open packet sinks: {e}");
        return DemuxerStatus::Error;
    }

    let status = loop {
        let mut header_bytes = [0u8; 8];
        match read_exact_or_eof(&mut reader, &mut header_bytes) {
            Ok(true) => {}
            Ok(false) | Err(_) => break DemuxerStatus::Eos,
        }

        let header = parse_frame_header(u64::from_be_bytes(header_bytes));
        if header.size == 0 {
            log::error!("invalid empty frame, stream desynchronized");
            break DemuxerStatus::Error;
        }

        let mut data = vec![0u8; header.size as usize];
        match read_exact_or_eof(&mut reader, &mut data) {
            Ok(true) => {}
            Ok(false) | Err(_) => break DemuxerStatus::Eos,
        }

        let packet = Packet { data, pts: header.pts, key_frame: header.key_frame };
        log::trace!(
            "packet pts={:?} size={} config={}",
            packet.pts,
            packet.data.len(),
            packet.is_config()
        );

        if let Err(e) = source.push(&packet) {
            log::error!("packet sink failed: {e}");
            break DemuxerStatus::Error;
        }
    };

    source.close(status == DemuxerStatus::Eos);
    log::debug!("demuxer thread ended: {:?}", status);
    status
}
