//! Media pipeline: stream framing, packet routing, decoding and frame
//! distribution.
//!
//! Data flow for one stream:
//!
//! ```text
//! socket → demuxer → [packet sinks: decoder, recorder]
//!                        decoder → [frame sinks: display relay, player]
//! ```
//!
//! The demuxer owns the socket read loop; every frame sink that does real
//! work owns a worker thread fed through a single-slot frame buffer, so the
//! decoder never blocks on a slow consumer.

pub mod clock;
pub mod codec;
pub mod decoder;
pub mod delay;
pub mod demuxer;
pub mod frame;
pub mod frame_buffer;
pub mod merger;
pub mod packet;
pub mod relay;
pub mod sink;

pub use clock::Clock;
pub use codec::{CodecEngine, EngineFactory};
pub use decoder::Decoder;
pub use delay::DelayBuffer;
pub use demuxer::{Demuxer, DemuxerStatus};
pub use frame::{AudioFrame, Frame, FrameData, PixelFormat, VideoFrame};
pub use frame_buffer::FrameBuffer;
pub use merger::PacketMerger;
pub use packet::{CodecId, Packet};
pub use relay::FrameRelay;
pub use sink::{FrameSink, FrameSource, PacketSink, PacketSource, StreamParams};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("codec: {0}")]
    Codec(String),
    #[error("sink: {0}")]
    Sink(String),
}
