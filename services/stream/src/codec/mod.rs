//! Codec engines.
//!
//! The decoder drives a `CodecEngine`; the audio engines (opus, aac, flac,
//! raw pcm) are built in, while video engines are injected by the embedder
//! together with its rendering stack.

mod opus;
mod pcm;
mod sym;

use std::sync::Arc;

use crate::frame::Frame;
use crate::packet::{CodecId, Packet};
use crate::sink::StreamParams;
use crate::Error;

/// The device encodes audio at a fixed 48 kHz stereo.
pub const AUDIO_SAMPLE_RATE: u32 = 48_000;
pub const AUDIO_CHANNELS: u16 = 2;

pub trait CodecEngine: Send {
    /// Stream parameters for opening downstream frame sinks.
    fn params(&self) -> StreamParams;

    /// Codec configuration record (extradata). Audio engines receive it
    /// directly; video engines see it merged into the next media packet.
    fn config(&mut self, data: &[u8]) -> Result<(), Error>;

    fn send(&mut self, packet: &Packet) -> Result<(), Error>;

    /// Drain one decoded frame, if any.
    fn receive(&mut self) -> Result<Option<Arc<Frame>>, Error>;
}

pub type EngineFactory = Box<dyn Fn(CodecId) -> Result<Box<dyn CodecEngine>, Error> + Send>;

/// Factory for the built-in engines.
pub fn default_engine(codec: CodecId) -> Result<Box<dyn CodecEngine>, Error> {
    match codec {
        CodecId::Opus => Ok(Box::new(opus::OpusEngine::new()?)),
        CodecId::Aac => Ok(Box::new(sym::SymphoniaEngine::aac())),
        CodecId::Flac => Ok(Box::new(sym::SymphoniaEngine::flac())),
        CodecId::Raw => Ok(Box::new(pcm::PcmEngine::new())),
        CodecId::H264 | CodecId::H265 | CodecId::Av1 => Err(Error::Codec(format!(
            "no built-in engine for {codec:?}; install one with Decoder::with_engine_factory"
        ))),
    }
}
