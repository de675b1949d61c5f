//! Device-PTS to local-time regression.
//!
//! The device timestamps frames on its own clock. To schedule presentation
//! locally, maintain a linear fit `local ≈ a·pts + b` over a sliding window
//! of observation points: split the window into an older and a newer half,
//! compute the centroid of each, and take the line through the two
//! centroids. This is the least-squares fit restricted to two aggregated
//! points, cheap and robust against jitter on individual frames.

use std::collections::VecDeque;

use tick::Tick;

pub const CLOCK_RANGE: usize = 32;

#[derive(Debug, Copy, Clone)]
struct Point {
    system: i64,
    stream: i64,
}

#[derive(Debug)]
pub struct Clock {
    points: VecDeque<Point>,
    coeff: f64,
    offset: i64,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock {
    pub fn new() -> Clock {
        Clock { points: VecDeque::with_capacity(CLOCK_RANGE), coeff: 1.0, offset: 0 }
    }

    pub fn is_estimable(&self) -> bool {
        !self.points.is_empty()
    }

    /// Record one (local time, pts) observation and refresh the fit.
    pub fn update(&mut self, now: Tick, pts: u64) {
        if self.points.len() == CLOCK_RANGE {
            self.points.pop_front();
        }
        self.points.push_back(Point { system: now.as_us(), stream: pts as i64 });

        if self.points.len() < 2 {
            // A single point pins the offset with a unit slope.
            self.coeff = 1.0;
            self.offset = now.as_us() - pts as i64;
            return;
        }

        let mid = self.points.len() / 2;
        let (left_sys, left_str) = centroid(self.points.iter().take(mid));
        let (right_sys, right_str) = centroid(self.points.iter().skip(mid));

        if (right_str - left_str).abs() < f64::EPSILON {
            return; // degenerate window, keep the previous fit
        }

        self.coeff = (right_sys - left_sys) / (right_str - left_str);
        let (all_sys, all_str) = centroid(self.points.iter());
        self.offset = (all_sys - self.coeff * all_str) as i64;
    }

    /// Estimated local time for a device timestamp. Requires at least one
    /// `update`.
    pub fn to_system_time(&self, pts: u64) -> Tick {
        assert!(self.is_estimable());
        Tick((pts as f64 * self.coeff) as i64 + self.offset)
    }

    pub fn coeff(&self) -> f64 {
        self.coeff
    }
}

fn centroid<'a>(points: impl Iterator<Item = &'a Point>) -> (f64, f64) {
    let mut sys = 0f64;
    let mut stream = 0f64;
    let mut count = 0usize;
    for p in points {
        sys += p.system as f64;
        stream += p.stream as f64;
        count += 1;
    }
    (sys / count as f64, stream / count as f64)
}
