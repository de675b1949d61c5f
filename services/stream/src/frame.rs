//! Decoded frames, shared by reference between the decoder and its sinks.

use std::sync::Arc;

/// Pixel layout of a video frame. The decoder engines negotiate this with
/// their sinks at open time; YUV420 is what every supported video codec
/// produces.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PixelFormat {
    Yuv420p,
    Rgba,
}

#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    /// One buffer per plane, with its row stride in bytes.
    pub planes: Vec<(Vec<u8>, usize)>,
}

#[derive(Debug, Clone)]
pub struct AudioFrame {
    pub sample_rate: u32,
    pub channels: u16,
    /// Interleaved f32 samples; length is a multiple of `channels`.
    pub samples: Vec<f32>,
}

impl AudioFrame {
    pub fn nb_samples(&self) -> usize {
        self.samples.len() / self.channels as usize
    }
}

#[derive(Debug, Clone)]
pub enum FrameData {
    Video(VideoFrame),
    Audio(AudioFrame),
}

#[derive(Debug, Clone)]
pub struct Frame {
    /// Device presentation timestamp, µs.
    pub pts: Option<u64>,
    pub data: FrameData,
}

impl Frame {
    pub fn audio(pts: Option<u64>, frame: AudioFrame) -> Arc<Frame> {
        Arc::new(Frame { pts, data: FrameData::Audio(frame) })
    }

    pub fn video(pts: Option<u64>, frame: VideoFrame) -> Arc<Frame> {
        Arc::new(Frame { pts, data: FrameData::Video(frame) })
    }

    pub fn as_audio(&self) -> Option<&AudioFrame> {
        match &self.data {
            FrameData::Audio(frame) => Some(frame),
            FrameData::Video(_) => None,
        }
    }

    pub fn as_video(&self) -> Option<&VideoFrame> {
        match &self.data {
            FrameData::Video(frame) => Some(frame),
            FrameData::Audio(_) => None,
        }
    }
}
