//! Raw PCM passthrough engine: the device sends interleaved s16le.

use std::sync::Arc;

use crate::codec::{CodecEngine, AUDIO_CHANNELS, AUDIO_SAMPLE_RATE};
use crate::frame::{AudioFrame, Frame};
use crate::packet::{CodecId, Packet};
use crate::sink::StreamParams;
use crate::Error;

#[derive(Default)]
pub struct PcmEngine {
    pending: Option<Arc<Frame>>,
}

impl PcmEngine {
    pub fn new() -> PcmEngine {
        PcmEngine { pending: None }
    }
}

impl CodecEngine for PcmEngine {
    fn params(&self) -> StreamParams {
        StreamParams::audio(CodecId::Raw, AUDIO_SAMPLE_RATE, AUDIO_CHANNELS)
    }

    fn config(&mut self, data: &[u8]) -> Result<(), Error> {
        log::debug!("raw pcm config ({} bytes) ignored", data.len());
        Ok(())
    }

    fn send(&mut self, packet: &Packet) -> Result<(), Error> {
        if packet.data.len() % 2 != 0 {
            return Err(Error::Codec("odd pcm payload length".into()));
        }
        let samples: Vec<f32> = packet
            .data
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32_768.0)
            .collect();
        self.pending = Some(Frame::audio(
            packet.pts,
            AudioFrame { sample_rate: AUDIO_SAMPLE_RATE, channels: AUDIO_CHANNELS, samples },
        ));
        Ok(())
    }

    fn receive(&mut self) -> Result<Option<Arc<Frame>>, Error> {
        Ok(self.pending.take())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s16le_to_f32() {
        let mut engine = PcmEngine::new();
        let data = [0x00u8, 0x40, 0x00, 0xC0]; // +0.5, -0.5
        engine.send(&Packet::media(data.to_vec(), 0)).unwrap();
        let frame = engine.receive().unwrap().unwrap();
        let audio = frame.as_audio().unwrap();
        assert_eq!(audio.samples, [0.5, -0.5]);
        assert!(engine.receive().unwrap().is_none());
    }

    #[test]
    fn odd_length_is_an_error() {
        let mut engine = PcmEngine::new();
        assert!(engine.send(&Packet::media(vec![0x00], 0)).is_err());
    }
}
