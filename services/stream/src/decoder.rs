//! Decoder: a packet sink driving a codec engine and fanning decoded
//! frames out to at most two frame sinks.

use crate::codec::{default_engine, CodecEngine, EngineFactory};
use crate::merger::PacketMerger;
use crate::packet::{CodecId, Packet};
use crate::sink::{FrameSink, FrameSource, PacketSink};
use crate::Error;

pub struct Decoder {
    name: &'static str,
    factory: EngineFactory,
    engine: Option<Box<dyn CodecEngine>>,
    merger: Option<PacketMerger>,
    sinks: FrameSource,
}

impl Decoder {
    /// A decoder using the built-in audio engines. Video streams need
    /// `with_engine_factory` (the platform decoder belongs to the embedder).
    pub fn new(name: &'static str) -> Decoder {
        Decoder::with_engine_factory(name, Box::new(default_engine))
    }

    pub fn with_engine_factory(name: &'static str, factory: EngineFactory) -> Decoder {
        Decoder { name, factory, engine: None, merger: None, sinks: FrameSource::new() }
    }

    pub fn add_sink(&mut self, sink: Box<dyn FrameSink>) {
        self.sinks.add_sink(sink);
    }

    fn drain(&mut self) -> Result<(), Error> {
        let engine = self.engine.as_mut().expect("decoder not open");
        while let Some(frame) = engine.receive()? {
            self.sinks.push(&frame)?;
        }
        Ok(())
    }
}

impl PacketSink for Decoder {
    fn open(&mut self, codec: CodecId) -> Result<(), Error> {
        let engine = (self.factory)(codec)?;
        log::debug!("decoder '{}' open ({:?})", self.name, codec);
        self.merger = codec.must_merge_config().then(PacketMerger::new);
        let params = engine.params();
        self.engine = Some(engine);
        self.sinks.open(&params)
    }

    fn push(&mut self, packet: &Packet) -> Result<(), Error> {
        let mut packet = packet.clone();
        match self.merger.as_mut() {
            Some(merger) => {
                merger.merge(&mut packet);
                if packet.is_config() {
                    // The pending config will ride on the next media packet.
                    return Ok(());
                }
            }
            None => {
                if packet.is_config() {
                    // Audio engines consume the config as codec extradata.
                    return self.engine.as_mut().expect("decoder not open").config(&packet.data);
                }
            }
        }

        self.engine.as_mut().expect("decoder not open").send(&packet)?;
        self.drain()
    }

    fn close(&mut self, ok: bool) {
        log::debug!("decoder '{}' close (ok={ok})", self.name);
        if self.engine.take().is_some() {
            self.sinks.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::AudioFrame;
    use crate::frame::Frame;
    use crate::sink::StreamParams;
    use std::sync::{Arc, Mutex};

    /// Engine echoing each packet's bytes as one "frame" whose sample count
    /// equals the payload length.
    struct EchoEngine {
        pending: Vec<Arc<Frame>>,
        configs: Arc<Mutex<Vec<Vec<u8>>>>,
        payloads: Arc<Mutex<Vec<Vec<u8>>>>,
    }

    impl CodecEngine for EchoEngine {
        fn params(&self) -> StreamParams {
            StreamParams::audio(CodecId::Raw, 48_000, 2)
        }

        fn config(&mut self, data: &[u8]) -> Result<(), Error> {
            self.configs.lock().unwrap().push(data.to_vec());
            Ok(())
        }

        fn send(&mut self, packet: &Packet) -> Result<(), Error> {
            self.payloads.lock().unwrap().push(packet.data.clone());
            self.pending.push(Frame::audio(
                packet.pts,
                AudioFrame {
                    sample_rate: 48_000,
                    channels: 2,
                    samples: vec![0.0; packet.data.len()],
                },
            ));
            Ok(())
        }

        fn receive(&mut self) -> Result<Option<Arc<Frame>>, Error> {
            Ok(if self.pending.is_empty() { None } else { Some(self.pending.remove(0)) })
        }
    }

    struct CountSink {
        frames: Arc<Mutex<Vec<Option<u64>>>>,
    }

    impl FrameSink for CountSink {
        fn open(&mut self, _params: &StreamParams) -> Result<(), Error> {
            Ok(())
        }

        fn push(&mut self, frame: &Arc<Frame>) -> Result<(), Error> {
            self.frames.lock().unwrap().push(frame.pts);
            Ok(())
        }

        fn close(&mut self) {}
    }

    fn decoder_with_probes(
        merging_codec: bool,
    ) -> (Decoder, Arc<Mutex<Vec<Vec<u8>>>>, Arc<Mutex<Vec<Vec<u8>>>>, Arc<Mutex<Vec<Option<u64>>>>)
    {
        let configs = Arc::new(Mutex::new(Vec::new()));
        let payloads = Arc::new(Mutex::new(Vec::new()));
        let frames = Arc::new(Mutex::new(Vec::new()));
        let configs2 = configs.clone();
        let payloads2 = payloads.clone();
        let mut decoder = Decoder::with_engine_factory(
            "test",
            Box::new(move |_codec| {
                Ok(Box::new(EchoEngine {
                    pending: Vec::new(),
                    configs: configs2.clone(),
                    payloads: payloads2.clone(),
                }))
            }),
        );
        decoder.add_sink(Box::new(CountSink { frames: frames.clone() }));
        let codec = if merging_codec { CodecId::H264 } else { CodecId::Opus };
        decoder.open(codec).unwrap();
        (decoder, configs, payloads, frames)
    }

    #[test]
    fn video_config_is_merged_into_next_packet() {
        let (mut decoder, configs, payloads, frames) = decoder_with_probes(true);

        decoder.push(&Packet::config(vec![0x00, 0x01, 0x02, 0x03])).unwrap();
        decoder.push(&Packet::media(vec![0x10, 0x11], 0)).unwrap();

        assert!(configs.lock().unwrap().is_empty());
        assert_eq!(payloads.lock().unwrap().as_slice(), [vec![0, 1, 2, 3, 0x10, 0x11]]);
        assert_eq!(frames.lock().unwrap().len(), 1);
    }

    #[test]
    fn audio_config_reaches_the_engine() {
        let (mut decoder, configs, payloads, frames) = decoder_with_probes(false);

        decoder.push(&Packet::config(vec![0xAA])).unwrap();
        decoder.push(&Packet::media(vec![0x10], 10)).unwrap();

        assert_eq!(configs.lock().unwrap().as_slice(), [vec![0xAA]]);
        assert_eq!(payloads.lock().unwrap().as_slice(), [vec![0x10]]);
        assert_eq!(frames.lock().unwrap().as_slice(), [Some(10)]);
    }

    #[test]
    fn frames_fan_out_per_media_packet() {
        let (mut decoder, _configs, _payloads, frames) = decoder_with_probes(false);
        for pts in 0..5u64 {
            decoder.push(&Packet::media(vec![0u8; 4], pts)).unwrap();
        }
        assert_eq!(frames.lock().unwrap().len(), 5);
        decoder.close(true);
    }
}
