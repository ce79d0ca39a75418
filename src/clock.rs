use chrono::{DateTime, Duration, Utc};
use hourglass_rs::SafeTimeProvider;

use crate::types::BlockHeight;

/// external sequencer supplying the height at which the current operation executes
pub trait ChainClock {
    fn height(&self) -> BlockHeight;

    fn now(&self) -> DateTime<Utc>;
}

/// derives block height from wall time: one block per `block_interval` since genesis
pub struct BlockClock {
    time: SafeTimeProvider,
    genesis: DateTime<Utc>,
    block_interval: Duration,
}

impl BlockClock {
    /// genesis is the provider's current instant, height 1
    pub fn new(time: SafeTimeProvider, block_interval_secs: u64) -> Self {
        let genesis = time.now();
        Self::with_genesis(time, genesis, block_interval_secs)
    }

    pub fn with_genesis(
        time: SafeTimeProvider,
        genesis: DateTime<Utc>,
        block_interval_secs: u64,
    ) -> Self {
        Self {
            time,
            genesis,
            block_interval: Duration::seconds(block_interval_secs.max(1) as i64),
        }
    }

    /// underlying time provider, e.g. for `test_control()`
    pub fn time(&self) -> &SafeTimeProvider {
        &self.time
    }

    pub fn genesis(&self) -> DateTime<Utc> {
        self.genesis
    }

    pub fn block_interval(&self) -> Duration {
        self.block_interval
    }

    /// time span covering `blocks` blocks
    pub fn span(&self, blocks: u64) -> Duration {
        Duration::seconds(self.block_interval.num_seconds() * blocks as i64)
    }
}

impl ChainClock for BlockClock {
    fn height(&self) -> BlockHeight {
        let elapsed = self.time.now() - self.genesis;
        if elapsed < Duration::zero() {
            return 1;
        }
        let interval = self.block_interval.num_seconds().max(1);
        1 + (elapsed.num_seconds() / interval) as BlockHeight
    }

    fn now(&self) -> DateTime<Utc> {
        self.time.now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use hourglass_rs::TimeSource;

    fn test_clock() -> BlockClock {
        let time = SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        ));
        BlockClock::new(time, 600)
    }

    #[test]
    fn test_genesis_is_height_one() {
        let clock = test_clock();
        assert_eq!(clock.height(), 1);
    }

    #[test]
    fn test_height_advances_per_interval() {
        let clock = test_clock();
        let control = clock.time().test_control().unwrap();

        control.advance(Duration::seconds(599));
        assert_eq!(clock.height(), 1);

        control.advance(Duration::seconds(1));
        assert_eq!(clock.height(), 2);

        control.advance(clock.span(10));
        assert_eq!(clock.height(), 12);
    }

    #[test]
    fn test_time_before_genesis_clamps() {
        let time = SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        ));
        let genesis = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let clock = BlockClock::with_genesis(time, genesis, 600);
        assert_eq!(clock.height(), 1);
    }
}
