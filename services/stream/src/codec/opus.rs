//! Opus audio engine.

use std::sync::Arc;

use crate::codec::{CodecEngine, AUDIO_CHANNELS, AUDIO_SAMPLE_RATE};
use crate::frame::{AudioFrame, Frame};
use crate::packet::{CodecId, Packet};
use crate::sink::StreamParams;
use crate::Error;

// An opus frame is at most 120 ms.
const MAX_FRAME_SAMPLES: usize = AUDIO_SAMPLE_RATE as usize * 120 / 1000;

pub struct OpusEngine {
    decoder: opus::Decoder,
    pending: Option<Arc<Frame>>,
}

impl OpusEngine {
    pub fn new() -> Result<OpusEngine, Error> {
        let decoder = opus::Decoder::new(AUDIO_SAMPLE_RATE, opus::Channels::Stereo)
            .map_err(|e| Error::Codec(format!("opus init: {e}")))?;
        Ok(OpusEngine { decoder, pending: None })
    }
}

impl CodecEngine for OpusEngine {
    fn params(&self) -> StreamParams {
        StreamParams::audio(CodecId::Opus, AUDIO_SAMPLE_RATE, AUDIO_CHANNELS)
    }

    fn config(&mut self, data: &[u8]) -> Result<(), Error> {
        // The identification header fixes 48 kHz stereo, which is already
        // this decoder's configuration.
        log::debug!("opus config ({} bytes) ignored", data.len());
        Ok(())
    }

    fn send(&mut self, packet: &Packet) -> Result<(), Error> {
        let mut samples = vec![0f32; MAX_FRAME_SAMPLES * AUDIO_CHANNELS as usize];
        let decoded = self
            .decoder
            .decode_float(&packet.data, &mut samples, false)
            .map_err(|e| Error::Codec(format!("opus decode: {e}")))?;
        samples.truncate(decoded * AUDIO_CHANNELS as usize);
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
