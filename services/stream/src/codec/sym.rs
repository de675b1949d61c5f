//! AAC and FLAC engines backed by symphonia.

use std::sync::Arc;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{
    CodecParameters, CodecType, Decoder as _, DecoderOptions, CODEC_TYPE_AAC, CODEC_TYPE_FLAC,
};
use symphonia::core::formats::Packet as SymPacket;

use crate::codec::{CodecEngine, AUDIO_CHANNELS, AUDIO_SAMPLE_RATE};
use crate::frame::{AudioFrame, Frame};
use crate::packet::{CodecId, Packet};
use crate::sink::StreamParams;
use crate::Error;

pub struct SymphoniaEngine {
    codec_id: CodecId,
    codec_type: CodecType,
    extra_data: Option<Box<[u8]>>,
    decoder: Option<Box<dyn symphonia::core::codecs::Decoder>>,
    pending: Option<Arc<Frame>>,
}

impl SymphoniaEngine {
    pub fn aac() -> SymphoniaEngine {
        SymphoniaEngine::new(CodecId::Aac, CODEC_TYPE_AAC)
    }

    pub fn flac() -> SymphoniaEngine {
        SymphoniaEngine::new(CodecId::Flac, CODEC_TYPE_FLAC)
    }

    fn new(codec_id: CodecId, codec_type: CodecType) -> SymphoniaEngine {
        SymphoniaEngine { codec_id, codec_type, extra_data: None, decoder: None, pending: None }
    }

    fn make_decoder(&mut self) -> Result<(), Error> {
        let mut params = CodecParameters::new();
        params.for_codec(self.codec_type).with_sample_rate(AUDIO_SAMPLE_RATE);
        if let Some(extra) = &self.extra_data {
            params.with_extra_data(extra.clone());
        }
        let decoder = symphonia::default::get_codecs()
            .make(&params, &DecoderOptions::default())
            .map_err(|e| Error::Codec(format!("{:?} init: {e}", self.codec_id)))?;
        self.decoder = Some(decoder);
        Ok(())
    }
}

impl CodecEngine for SymphoniaEngine {
    fn params(&self) -> StreamParams {
        StreamParams::audio(self.codec_id, AUDIO_SAMPLE_RATE, AUDIO_CHANNELS)
    }

    fn config(&mut self, data: &[u8]) -> Result<(), Error> {
        // FLAC config arrives as the full stream header; the decoder only
        // wants the STREAMINFO payload behind the magic and block header.
        let extra = if self.codec_id == CodecId::Flac && data.starts_with(b"fLaC") && data.len() > 8
        {
            &data[8..]
        } else {
            data
        };
        self.extra_data = Some(extra.to_vec().into_boxed_slice());
        // Re-create the decoder so the new extradata takes effect.
        self.make_decoder()
    }

    fn send(&mut self, packet: &Packet) -> Result<(), Error> {
        if self.decoder.is_none() {
            self.make_decoder()?;
        }
        let decoder = self.decoder.as_mut().unwrap();

        let sym_packet = SymPacket::new_from_slice(0, packet.pts.unwrap_or(0), 0, &packet.data);
        let decoded = decoder
            .decode(&sym_packet)
            .map_err(|e| Error::Codec(format!("{:?} decode: {e}", self.codec_id)))?;

        let spec = *decoded.spec();
        let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buf.copy_interleaved_ref(decoded);
        self.pending = Some(Frame::audio(
            packet.pts,
            AudioFrame {
                sample_rate: spec.rate,
                channels: spec.channels.count() as u16,
                samples: buf.samples().to_vec(),
            },
        ));
        Ok(())
    }

    fn receive(&mut self) -> Result<Option<Arc<Frame>>, Error> {
        Ok(self.pending.take())
    }
}
