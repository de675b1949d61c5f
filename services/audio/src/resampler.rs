//! Same-rate resampler with clock compensation.
//!
//! Input and output sample rates are nominally equal; the only reason to
//! resample at all is to absorb clock drift between the device and the
//! host audio clock. `set_compensation(diff, span)` requests `diff`
//! additional output samples (fewer when negative) spread over the next
//! `span` output samples, after which the ratio decays back to unity.
//!
//! Sign convention: compensation is positive when more output samples are
//! needed, i.e. when buffering is below target.

use rubato::{FastFixedIn, PolynomialDegree, Resampler};

use crate::Error;

/// Input frames fed to rubato per processing call. Smaller chunks bound
/// the buffering this wrapper introduces (~5 ms at 48 kHz).
const CHUNK_FRAMES: usize = 256;

/// Compensation never exceeds a few percent; 1.1 leaves ample headroom.
const MAX_RATIO_RELATIVE: f64 = 1.1;

pub struct DriftResampler {
    inner: FastFixedIn<f32>,
    channels: usize,
    /// Interleaved input waiting for a full chunk.
    pending: Vec<f32>,
    planar_in: Vec<Vec<f32>>,
    /// Output samples (per channel) left until the ratio resets to unity.
    compensation_remaining: Option<u64>,
}

impl DriftResampler {
    pub fn new(channels: u16) -> Result<DriftResampler, Error> {
        let channels = channels as usize;
        let inner = FastFixedIn::new(
            1.0,
            MAX_RATIO_RELATIVE,
            PolynomialDegree::Linear,
            CHUNK_FRAMES,
            channels,
        )
        .map_err(|e| Error::Resample(e.to_string()))?;
        Ok(DriftResampler {
            inner,
            channels,
            pending: Vec::new(),
            planar_in: vec![vec![0.0; CHUNK_FRAMES]; channels],
            compensation_remaining: None,
        })
    }

    /// Produce `diff` extra (or fewer) output samples across the next
    /// `span` output samples.
    pub fn set_compensation(&mut self, diff: i32, span: u32) -> Result<(), Error> {
        assert!(span > 0);
        let ratio = 1.0 + diff as f64 / span as f64;
        self.inner
            .set_resample_ratio(ratio, true)
            .map_err(|e| Error::Resample(e.to_string()))?;
        self.compensation_remaining = Some(span as u64);
        log::trace!("compensation {diff} samples over {span} (ratio {ratio:.6})");
        Ok(())
    }

    /// Feed interleaved samples; returns the resampled interleaved output
    /// accumulated from every complete chunk. Up to one chunk of input may
    /// stay buffered until the next call.
    pub fn process(&mut self, input: &[f32]) -> Result<Vec<f32>, Error> {
        assert_eq!(input.len() % self.channels, 0);
        self.pending.extend_from_slice(input);

        let mut out = Vec::with_capacity(input.len() + self.channels * 16);
        let chunk_len = CHUNK_FRAMES * self.channels;
        let mut consumed = 0;
        while self.pending.len() - consumed >= chunk_len {
            let chunk = &self.pending[consumed..consumed + chunk_len];
            for (ch, plane) in self.planar_in.iter_mut().enumerate() {
                for (frame, sample) in plane.iter_mut().enumerate() {
                    *sample = chunk[frame * self.channels + ch];
                }
            }
            let planar_out = self
                .inner
                .process(&self.planar_in, None)
                .map_err(|e| Error::Resample(e.to_string()))?;
            consumed += chunk_len;

            let produced = planar_out.first().map_or(0, Vec::len);
            for frame in 0..produced {
                for plane in &planar_out {
                    out.push(plane[frame]);
                }
            }

            if let Some(remaining) = self.compensation_remaining.as_mut() {
                *remaining = remaining.saturating_sub(produced as u64);
                if *remaining == 0 {
                    self.compensation_remaining = None;
                    self.inner
                        .set_resample_ratio(1.0, true)
                        .map_err(|e| Error::Resample(e.to_string()))?;
                }
            }
        }
        self.pending.drain(..consumed);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unity_ratio_roughly_preserves_sample_count() {
        let mut rs = DriftResampler::new(2).unwrap();
        let input = vec![0.25f32; 48_000 * 2];
        let out = rs.process(&input).unwrap();
        let frames_out = out.len() / 2;
        // Allow for the chunk held back plus filter delay.
        assert!((frames_out as i64 - 48_000).unsigned_abs() < 1_024, "frames_out={frames_out}");
    }

    #[test]
    fn positive_compensation_produces_more_samples() {
        let mut unity = DriftResampler::new(1).unwrap();
        let mut fast = DriftResampler::new(1).unwrap();
        // +1%: one extra sample per 100 output samples.
        fast.set_compensation(480, 48_000).unwrap();

        let input = vec![0.5f32; 48_000];
        let base = unity.process(&input).unwrap().len() as i64;
        let more = fast.process(&input).unwrap().len() as i64;
        let gained = more - base;
        assert!(gained > 300 && gained < 600, "gained {gained}");
    }

    #[test]
    fn compensation_expires_after_span() {
        let mut rs = DriftResampler::new(1).unwrap();
        rs.set_compensation(100, 1_000).unwrap();
        // Push far more than the span; the tail must be back near unity.
        let _ = rs.process(&vec![0.0f32; 4_000]).unwrap();
        let out = rs.process(&vec![0.0f32; 10_240]).unwrap();
        let drift = out.len() as i64 - 10_240;
        assert!(drift.abs() < 64, "drift {drift}");
    }

    #[test]
    fn partial_chunks_are_buffered_not_dropped() {
        let mut rs = DriftResampler::new(2).unwrap();
        let mut total_out = 0usize;
        // 100-frame pushes never align with the 256-frame chunk.
        for _ in 0..100 {
            total_out += rs.process(&vec![0.1f32; 100 * 2]).unwrap().len();
        }
        let frames_out = total_out / 2;
        assert!(frames_out > 9_000, "frames_out={frames_out}");
    }
}
