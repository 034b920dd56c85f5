// This file is part of herodex. Copyright © 2025 herodex contributors.
// herodex is licensed under the GNU AGPL v3.0 or any later version. See LICENSE file for full text.

use std::time::{Duration, SystemTime};

/// Time as unsigned 64-bit ms since the unix epoch. All this crate needs is "stamp now" and
/// "how old is this stamp", which does not justify pulling in a whole time library.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SimpleTime {
    unix_millis: u64,
}

impl SimpleTime {
    /// The "infinitely old" sentinel. A cache stamped with this is always stale.
    pub const UNIX_EPOCH: SimpleTime = SimpleTime::from_unix_millis(0);

    #[inline(always)]
    pub const fn from_unix_millis(unix_millis: u64) -> Self {
        Self { unix_millis }
    }

    #[inline(always)]
    pub const fn as_epoch_millis(&self) -> u64 {
        self.unix_millis
    }

    /// Current time as per the system clock
    pub fn now() -> Self {
        let duration_since_epoch = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default(); // a clock set before 1970 reads as the epoch
        Self::from_unix_millis(duration_since_epoch.as_millis() as u64) // truncating cast; wraps a few hundred million years from now
    }

    /// Duration since some earlier time with millisecond precision, or zero if result was negative
    #[inline(always)]
    pub fn duration_since(&self, earlier: Self) -> Duration {
        self.unix_millis
            .checked_sub(earlier.unix_millis)
            .map(Duration::from_millis)
            .unwrap_or_default()
    }

    /// Elapsed time since this SimpleTime and the present system clock time, or zero if result was negative.
    pub fn elapsed(&self) -> Duration {
        Self::now().duration_since(*self)
    }
}
