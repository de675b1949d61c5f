//! Exponential running average with a fill-up phase.

#[derive(Debug, Clone)]
pub struct RollingAvg {
    range: u32,
    avg: f32,
    count: u32,
}

impl RollingAvg {
    pub fn new(range: u32) -> RollingAvg {
        assert!(range > 0);
        RollingAvg { range, avg: 0.0, count: 0 }
    }

    /// While fewer than `range` values have been pushed, this is the exact
    /// mean; afterwards each new value weighs 1/range.
    pub fn push(&mut self, value: f32) {
        if self.count < self.range {
            self.count += 1;
        }
        self.avg = ((self.count - 1) as f32 * self.avg + value) / self.count as f32;
    }

    pub fn get(&self) -> f32 {
        self.avg
    }
}
