use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

/// A monotonic timestamp or duration, in microseconds.
///
/// All timing decisions in the workspace (clock regression, ack deadlines,
/// audio extrapolation) are made on this single process-monotonic scale so
/// that values from different components are directly comparable.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tick(pub i64);

/// Ticks per second.
pub const TICK_FREQ: i64 = 1_000_000;

fn epoch() -> Instant {
    static EPOCH: OnceLock<Instant> = OnceLock::new();
    *EPOCH.get_or_init(Instant::now)
}

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// Current time on the process-monotonic scale.
    pub fn now() -> Tick {
        let elapsed = epoch().elapsed();
        Tick(elapsed.as_micros() as i64)
    }

    pub const fn from_ms(ms: i64) -> Tick {
        Tick(ms * 1_000)
    }

    pub const fn from_us(us: i64) -> Tick {
        Tick(us)
    }

    pub const fn as_us(self) -> i64 {
        self.0
    }

    pub const fn as_ms(self) -> i64 {
        self.0 / 1_000
    }

    /// Duration from `earlier` to `self`, saturating at zero.
    pub fn saturating_since(self, earlier: Tick) -> Duration {
        if self.0 <= earlier.0 { Duration::ZERO } else { Duration::from_micros((self.0 - earlier.0) as u64) }
    }

    /// Remaining time until this deadline, saturating at zero.
    pub fn remaining(self) -> Duration {
        Tick::now().remaining_until(self)
    }

    fn remaining_until(self, deadline: Tick) -> Duration {
        deadline.saturating_since(self)
    }

    pub fn is_elapsed(self) -> bool {
        Tick::now() >= self
    }
}

impl Add for Tick {
    type Output = Tick;

    fn add(self, rhs: Tick) -> Tick {
        Tick(self.0 + rhs.0)
    }
}

impl AddAssign for Tick {
    fn add_assign(&mut self, rhs: Tick) {
        self.0 += rhs.0;
    }
}

impl Sub for Tick {
    type Output = Tick;

    fn sub(self, rhs: Tick) -> Tick {
        Tick(self.0 - rhs.0)
    }
}

impl SubAssign for Tick {
    fn sub_assign(&mut self, rhs: Tick) {
        self.0 -= rhs.0;
    }
}
