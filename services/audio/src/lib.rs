//! Audio playback: a byte ring between the decoder and the platform audio
//! callback, with resampling-based compensation keeping the buffer level on
//! target despite clock drift and jitter.

pub mod average;
pub mod bytebuf;
pub mod output;
pub mod player;
pub mod resampler;

pub use average::RollingAvg;
pub use bytebuf::ByteBuf;
pub use output::CpalBackend;
pub use player::{
    AudioBackend, AudioOutput, AudioPlayer, PlayerCore, OUTPUT_BUFFER_SAMPLES,
    TARGET_BUFFERED_SAMPLES,
};
pub use resampler::DriftResampler;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("audio device: {0}")]
    Device(String),
    #[error("resampler: {0}")]
    Resample(String),
}
