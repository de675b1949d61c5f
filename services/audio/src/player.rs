//! Ring-buffered audio playback with drift compensation.
//!
//! Producer: the audio decoder thread pushes frames; samples are resampled
//! (for clock compensation only, rates are nominally equal) and written to
//! the byte ring, lock-free when they fit into the writable span observed
//! after the previous push. Consumer: the platform audio callback drains
//! fixed blocks under the playback lock, padding with silence on underflow.
//!
//! The producer steers the resampler so that the average buffering level
//! converges to the target:
//!
//!  - every second, request a compensation of `target − avg` samples spread
//!    over three seconds (positive when the buffer runs shallow, i.e. more
//!    output samples are needed);
//!  - silence played during an underflow cannot be unplayed, so when the
//!    matching late samples arrive they are dropped, except for the part
//!    that usefully refills the buffer toward the target.

use std::sync::{Arc, Mutex};

use stream::sink::StreamParams;
use stream::{Frame, FrameSink};
use tick::{Tick, TICK_FREQ};

use crate::average::RollingAvg;
use crate::bytebuf::ByteBuf;
use crate::resampler::DriftResampler;
use crate::Error;

/// Samples per output block (10 ms at 48 kHz).
pub const OUTPUT_BUFFER_SAMPLES: usize = 480;

/// Preferred number of buffered samples between producer and consumer.
pub const TARGET_BUFFERED_SAMPLES: usize = 3 * OUTPUT_BUFFER_SAMPLES;

/// Range of the buffering average.
const BUFFERING_AVG_RANGE: u32 = 8;

const BYTES_PER_SAMPLE: usize = std::mem::size_of::<f32>();

struct Locked {
    /// Silence samples emitted because no data was available. Only counted
    /// once real audio has been received, and zeroed by the producer when
    /// the matching late samples arrive.
    underflow: usize,
    last_consumed: Option<Tick>,
    received: bool,
    avg_buffering: RollingAvg,
    scratch: Vec<u8>,
}

/// State shared between the producer thread and the playback callback.
/// The mutex is the playback lock; the byte ring is accessed lock-free on
/// the producer fast path.
pub struct PlayerCore {
    buf: ByteBuf,
    locked: Mutex<Locked>,
    sample_rate: u32,
    channels: u16,
}

impl PlayerCore {
    pub fn new(sample_rate: u32, channels: u16) -> Arc<PlayerCore> {
        assert!(sample_rate > 0 && channels > 0);
        // One second of audio; large enough that producer and consumer
        // virtually never contend on the lock.
        let capacity = sample_rate as usize * channels as usize * BYTES_PER_SAMPLE;
        Arc::new(PlayerCore {
            buf: ByteBuf::with_capacity(capacity),
            locked: Mutex::new(Locked {
                underflow: 0,
                last_consumed: None,
                received: false,
                avg_buffering: RollingAvg::new(BUFFERING_AVG_RANGE),
                scratch: Vec::new(),
            }),
            sample_rate,
            channels,
        })
    }

    fn sample_align(&self) -> usize {
        self.channels as usize * BYTES_PER_SAMPLE
    }

    fn bytes_to_samples(&self, bytes: usize) -> usize {
        debug_assert_eq!(bytes % self.sample_align(), 0);
        bytes / self.sample_align()
    }

    fn samples_to_bytes(&self, samples: usize) -> usize {
        samples * self.sample_align()
    }

    /// The playback callback: always fills `out` completely, padding with
    /// silence when the ring runs short.
    pub fn consume(&self, out: &mut [f32]) {
        let mut locked = self.locked.lock().unwrap();

        let want = out.len() * BYTES_PER_SAMPLE;
        let read = want.min(self.buf.read_available());
        locked.scratch.resize(read, 0);
        if read > 0 {
            let mut scratch = std::mem::take(&mut locked.scratch);
            self.buf.read(&mut scratch);
            for (sample, bytes) in out.iter_mut().zip(scratch.chunks_exact(BYTES_PER_SAMPLE)) {
                *sample = f32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            }
            locked.scratch = scratch;
        }

        if read < want {
            out[read / BYTES_PER_SAMPLE..].fill(0.0);
            // Before the first frame this is not an underflow, just silence.
            if locked.received {
                locked.underflow += self.bytes_to_samples(want - read);
            }
            log::trace!("underflow: {} samples padded", self.bytes_to_samples(want - read));
        }

        locked.last_consumed = Some(Tick::now());
    }

    /// (underflow, received, average buffering) snapshot, for inspection.
    pub fn stats(&self) -> (usize, bool, f32) {
        let locked = self.locked.lock().unwrap();
        (locked.underflow, locked.received, locked.avg_buffering.get())
    }

    pub fn buffered_samples(&self) -> usize {
        self.bytes_to_samples(self.buf.read_available())
    }

    /// Producer-side write of resampled samples. `previous_write_avail` is
    /// the caller's watermark for the lockless fast path; it is refreshed
    /// before returning.
    fn push_samples(&self, samples: &[f32], previous_write_avail: &mut usize) {
        let mut bytes = Vec::with_capacity(samples.len() * BYTES_PER_SAMPLE);
        for sample in samples {
            bytes.extend_from_slice(&sample.to_ne_bytes());
        }
        let size = bytes.len();

        // The consumer only grows the writable span, so anything within the
        // previously observed span can be staged without the lock.
        let lockless = size <= *previous_write_avail;
        if lockless {
            self.buf.prepare_write(&bytes);
        }

        let mut locked = self.locked.lock().unwrap();

        // Samples consumed since the last callback must be extrapolated,
        // otherwise buffering appears to grow between callbacks.
        let extrapolated = match locked.last_consumed {
            Some(t) => {
                let elapsed = (Tick::now() - t).as_us().max(0);
                (elapsed as u64 * self.sample_rate as u64 / TICK_FREQ as u64) as usize
            }
            None => 0,
        };

        let read_avail = self.buf.read_available();
        // The consumer may not credit underflow while samples remain.
        debug_assert!(read_avail == 0 || locked.underflow == 0);

        let buffered = self.bytes_to_samples(read_avail);
        let buffering = buffered as f32 + locked.underflow as f32 - extrapolated as f32;
        locked.avg_buffering.push(buffering);

        if lockless {
            self.buf.commit_write(size);
        } else {
            // Slow path under the lock, keeping whole samples.
            let align = self.sample_align();
            let write_avail = self.buf.write_available() / align * align;
            let mut src = &bytes[..];
            if size > write_avail {
                let cap = self.buf.capacity() / align * align;
                if src.len() > cap {
                    // Keep only the tail.
                    src = &src[src.len() - cap..];
                }
                if src.len() > write_avail {
                    // Skip the oldest samples to make room.
                    self.buf.skip(src.len() - write_avail);
                }
            }
            self.buf.write(src);
        }

        if locked.underflow > 0 {
            // The late samples matching the silence already played must not
            // postpone everything that follows; drop them, except what
            // usefully refills the buffer toward the target.
            let avg = locked.avg_buffering.get();
            if avg > TARGET_BUFFERED_SAMPLES as f32 {
                let excess = (avg - TARGET_BUFFERED_SAMPLES as f32) as usize;
                let available = self.bytes_to_samples(self.buf.read_available());
                let drop = locked.underflow.min(excess).min(available);
                if drop > 0 {
                    self.buf.skip(self.samples_to_bytes(drop));
                    log::trace!("skipping {drop} late samples");
                }
            }
            locked.underflow = 0;
        }

        locked.received = true;
        *previous_write_avail = self.buf.write_available();
    }
}

/// Handle keeping a platform audio stream alive; dropping it closes the
/// stream.
pub trait AudioOutput: Send {}

/// Opens platform audio output streams that pull from a `PlayerCore`.
pub trait AudioBackend: Send {
    fn open(
        &mut self,
        sample_rate: u32,
        channels: u16,
        core: Arc<PlayerCore>,
    ) -> Result<Box<dyn AudioOutput>, Error>;
}

pub struct AudioPlayer {
    backend: Box<dyn AudioBackend>,
    core: Option<Arc<PlayerCore>>,
    output: Option<Box<dyn AudioOutput>>,
    resampler: Option<DriftResampler>,
    previous_write_avail: usize,
    samples_since_resync: usize,
}

impl AudioPlayer {
    pub fn new(backend: Box<dyn AudioBackend>) -> AudioPlayer {
        AudioPlayer {
            backend,
            core: None,
            output: None,
            resampler: None,
            previous_write_avail: 0,
            samples_since_resync: 0,
        }
    }

    pub fn core(&self) -> Option<&Arc<PlayerCore>> {
        self.core.as_ref()
    }
}

impl FrameSink for AudioPlayer {
    fn open(&mut self, params: &StreamParams) -> Result<(), stream::Error> {
        let sample_rate = params
            .sample_rate
            .ok_or_else(|| stream::Error::Sink("audio player on a video stream".into()))?;
        let channels = params
            .channels
            .ok_or_else(|| stream::Error::Sink("audio player without channel count".into()))?;

        let resampler =
            DriftResampler::new(channels).map_err(|e| stream::Error::Sink(e.to_string()))?;
        let core = PlayerCore::new(sample_rate, channels);
        // An unusable audio device is fatal for this sink.
        let output = self
            .backend
            .open(sample_rate, channels, Arc::clone(&core))
            .map_err(|e| stream::Error::Sink(e.to_string()))?;

        self.previous_write_avail = core.buf.write_available();
        self.samples_since_resync = 0;
        self.resampler = Some(resampler);
        self.output = Some(output);
        self.core = Some(core);
        log::debug!("audio player open ({sample_rate} Hz, {channels} ch)");
        Ok(())
    }

    fn push(&mut self, frame: &Arc<Frame>) -> Result<(), stream::Error> {
        let audio = frame
            .as_audio()
            .ok_or_else(|| stream::Error::Sink("video frame pushed to audio player".into()))?;
        let core = self.core.as_ref().expect("audio player not open");
        let resampler = self.resampler.as_mut().expect("audio player not open");

        let samples = match resampler.process(&audio.samples) {
            Ok(samples) => samples,
            Err(e) => {
                // Transient: drop the frame, keep the stream alive.
                log::warn!("resampling failed: {e}");
                return Ok(());
            }
        };
        if samples.is_empty() {
            return Ok(());
        }

        core.push_samples(&samples, &mut self.previous_write_avail);

        self.samples_since_resync += samples.len() / core.channels as usize;
        if self.samples_since_resync >= core.sample_rate as usize {
            // Resync every second: absorb both drift and chronic jitter.
            self.samples_since_resync = 0;
            let avg = core.locked.lock().unwrap().avg_buffering.get();
            let diff = TARGET_BUFFERED_SAMPLES as i32 - avg as i32;
            log::trace!("average buffering {avg:.1}, compensation {diff}");
            if let Err(e) = resampler.set_compensation(diff, 3 * core.sample_rate) {
                // Not fatal.
                log::warn!("compensation failed: {e}");
            }
        }

        Ok(())
    }

    fn close(&mut self) {
        log::debug!("audio player close");
        self.output = None;
        self.resampler = None;
        self.core = None;
    }
}
