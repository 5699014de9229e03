/// Time-weighted price oracle. Samples pool reserves into fixed-width time
/// buckets and answers historical price queries with a staleness bound.

use std::collections::{BTreeMap, HashMap};

use aegis_math::{full_mul, price_from_reserves, u256_to_u128, U256};
use aegis_types::{HookError, HookEvent, HookResult, PoolId};
use serde::{Deserialize, Serialize};

use crate::clock::{is_timestamp_fresh, SharedClock};
use crate::config::{ConfigError, OracleConfig};
use crate::events::EventLog;

/// Live reserves of a pool, read by the oracle
pub trait ReserveSource {
    fn get_reserves(&self, pool_id: &PoolId) -> HookResult<(u128, u128)>;
}

/// Single price observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp: i64,
    /// token1 per token0, 18 decimals
    pub price: u128,
    pub reserve0: u128,
    pub reserve1: u128,
}

pub struct TwapOracle {
    config: OracleConfig,
    clock: SharedClock,
    /// Keyed by (pool, bucket start)
    observations: BTreeMap<(PoolId, i64), Observation>,
    latest: HashMap<PoolId, Observation>,
    events: EventLog,
}

impl TwapOracle {
    pub fn new(config: OracleConfig, clock: SharedClock) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            clock,
            observations: BTreeMap::new(),
            latest: HashMap::new(),
            events: EventLog::new(),
        })
    }

    pub fn period(&self) -> i64 {
        self.config.period
    }

    /// Start of the bucket containing `timestamp`
    pub fn bucket_start(&self, timestamp: i64) -> i64 {
        timestamp.div_euclid(self.config.period) * self.config.period
    }

    // ========================================================================
    // Recording
    // ========================================================================

    /// Sample the pool and overwrite the current bucket's observation
    pub fn update_price<S: ReserveSource + ?Sized>(
        &mut self,
        source: &S,
        pool_id: &PoolId,
    ) -> HookResult<Observation> {
        let (reserve0, reserve1) = source.get_reserves(pool_id)?;
        let now = self.clock.now();
        let observation = Observation {
            timestamp: now,
            price: price_from_reserves(reserve0, reserve1)?,
            reserve0,
            reserve1,
        };
        let bucket = self.bucket_start(now);

        self.observations.insert((*pool_id, bucket), observation);
        self.latest.insert(*pool_id, observation);
        self.events.emit(HookEvent::ObservationRecorded {
            pool_id: *pool_id,
            bucket,
            price: observation.price,
            reserve0,
            reserve1,
            timestamp: now,
        });
        Ok(observation)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Price recorded for the bucket holding the first second of the span
    /// `(now - seconds_ago, now]`, searching back a bounded number of
    /// buckets when that one is empty. An observation taken at `now` is
    /// always inside the span, even on a bucket boundary.
    pub fn consult(&self, pool_id: &PoolId, seconds_ago: i64) -> HookResult<u128> {
        let period = self.config.period;
        if seconds_ago <= 0 || seconds_ago > period {
            return Err(HookError::InvalidPeriod { seconds_ago, max_period: period });
        }
        let latest = self
            .latest
            .get(pool_id)
            .ok_or(HookError::NoObservations { pool_id: *pool_id })?;

        let now = self.clock.now();
        if !is_timestamp_fresh(self.clock.as_ref(), latest.timestamp, seconds_ago) {
            return Err(HookError::StalePrice {
                age_seconds: now - latest.timestamp,
                max_age: seconds_ago,
            });
        }

        let target = self.bucket_start(now - seconds_ago + 1);
        for step in 0..=self.config.max_lookback_buckets as i64 {
            let bucket = target - step * period;
            if let Some(observation) = self.observations.get(&(*pool_id, bucket)) {
                return Ok(observation.price);
            }
        }
        Err(HookError::NoObservations { pool_id: *pool_id })
    }

    /// Latest observed reserves and their timestamp, or live reserves
    /// stamped now when nothing has been recorded.
    pub fn get_reserves<S: ReserveSource + ?Sized>(
        &self,
        source: &S,
        pool_id: &PoolId,
    ) -> HookResult<(u128, u128, i64)> {
        if let Some(latest) = self.latest.get(pool_id) {
            return Ok((latest.reserve0, latest.reserve1, latest.timestamp));
        }
        let (reserve0, reserve1) = source.get_reserves(pool_id)?;
        Ok((reserve0, reserve1, self.clock.now()))
    }

    /// Average price over the last `window` seconds, each observation
    /// weighted by how long it stayed current.
    pub fn time_weighted_price(&self, pool_id: &PoolId, window: i64) -> HookResult<u128> {
        let max_window = self.config.period * (self.config.max_lookback_buckets as i64 + 1);
        if window <= 0 || window > max_window {
            return Err(HookError::InvalidPeriod { seconds_ago: window, max_period: max_window });
        }

        let now = self.clock.now();
        let window_start = now - window;
        let mut weighted_sum = U256::ZERO;
        let mut total_time: i64 = 0;
        let mut next_time = now;

        // Newest to oldest; the first observation before the window covers
        // the gap up to the window start.
        let range = (*pool_id, i64::MIN)..=(*pool_id, self.bucket_start(now));
        for observation in self.observations.range(range).rev().map(|(_, o)| o) {
            let start = observation.timestamp.max(window_start);
            let time_weight = next_time - start;
            if time_weight > 0 {
                weighted_sum += full_mul(observation.price, time_weight as u128);
                total_time += time_weight;
            }
            if observation.timestamp <= window_start {
                break;
            }
            next_time = observation.timestamp;
        }

        if total_time == 0 {
            return Err(HookError::NoObservations { pool_id: *pool_id });
        }
        u256_to_u128(weighted_sum / U256::from(total_time as u128), "time weighted price")
    }

    pub fn observation(&self, pool_id: &PoolId, bucket: i64) -> Option<&Observation> {
        self.observations.get(&(*pool_id, bucket))
    }

    pub fn latest(&self, pool_id: &PoolId) -> Option<&Observation> {
        self.latest.get(pool_id)
    }

    pub fn drain_events(&mut self) -> Vec<HookEvent> {
        self.events.drain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use aegis_types::PRICE_PRECISION;
    use std::cell::Cell;
    use std::sync::Arc;

    struct FixedReserves(Cell<(u128, u128)>);

    impl ReserveSource for FixedReserves {
        fn get_reserves(&self, _pool_id: &PoolId) -> HookResult<(u128, u128)> {
            Ok(self.0.get())
        }
    }

    fn setup(start: i64) -> (TwapOracle, ManualClock) {
        let clock = ManualClock::new(start);
        let oracle = TwapOracle::new(OracleConfig::default(), Arc::new(clock.clone())).unwrap();
        (oracle, clock)
    }

    #[test]
    fn test_bucket_start() {
        let (oracle, _) = setup(0);
        assert_eq!(oracle.bucket_start(0), 0);
        assert_eq!(oracle.bucket_start(3_599), 0);
        assert_eq!(oracle.bucket_start(3_600), 3_600);
        assert_eq!(oracle.bucket_start(-1), -3_600);
    }

    #[test]
    fn test_same_bucket_overwrites() {
        let (mut oracle, clock) = setup(7_200);
        let pool = PoolId([1u8; 32]);
        let source = FixedReserves(Cell::new((1_000, 1_000)));

        oracle.update_price(&source, &pool).unwrap();
        clock.advance(100);
        source.0.set((1_000, 3_000));
        oracle.update_price(&source, &pool).unwrap();

        let observation = oracle.observation(&pool, 7_200).unwrap();
        assert_eq!(observation.price, 3 * PRICE_PRECISION);
        assert_eq!(observation.timestamp, 7_300);
        assert_eq!(oracle.drain_events().len(), 2);
    }

    #[test]
    fn test_consult_bounds() {
        let (mut oracle, clock) = setup(10_000);
        let pool = PoolId([2u8; 32]);
        assert!(matches!(oracle.consult(&pool, 0), Err(HookError::InvalidPeriod { .. })));
        assert!(matches!(oracle.consult(&pool, 3_601), Err(HookError::InvalidPeriod { .. })));
        assert!(matches!(oracle.consult(&pool, 60), Err(HookError::NoObservations { .. })));

        oracle
            .update_price(&FixedReserves(Cell::new((2_000, 1_000))), &pool)
            .unwrap();
        assert_eq!(oracle.consult(&pool, 1).unwrap(), PRICE_PRECISION / 2);

        clock.advance(120);
        assert_eq!(
            oracle.consult(&pool, 60),
            Err(HookError::StalePrice { age_seconds: 120, max_age: 60 })
        );
    }

    #[test]
    fn test_consult_on_bucket_boundary_reads_latest() {
        let (mut oracle, clock) = setup(3_000);
        let pool = PoolId([4u8; 32]);
        let source = FixedReserves(Cell::new((1_000, 1_000)));

        oracle.update_price(&source, &pool).unwrap();
        clock.set(3_600);
        source.0.set((1_000, 3_000));
        oracle.update_price(&source, &pool).unwrap();
        assert_eq!(oracle.consult(&pool, 1).unwrap(), 3 * PRICE_PRECISION);

        // Older span falls back to the bucket lookup
        clock.set(3_650);
        assert_eq!(oracle.consult(&pool, 100).unwrap(), PRICE_PRECISION);
    }

    #[test]
    fn test_rejects_zero_period() {
        let clock = ManualClock::new(0);
        let config = OracleConfig { period: 0, ..OracleConfig::default() };
        assert!(TwapOracle::new(config, Arc::new(clock)).is_err());
    }

    #[test]
    fn test_time_weighted_price() {
        let (mut oracle, clock) = setup(0);
        let pool = PoolId([3u8; 32]);
        let source = FixedReserves(Cell::new((1_000, 1_000)));

        oracle.update_price(&source, &pool).unwrap();
        clock.set(3_600);
        source.0.set((1_000, 3_000));
        oracle.update_price(&source, &pool).unwrap();
        clock.set(7_200);

        // Price 1.0 for the first hour, 3.0 for the second
        assert_eq!(oracle.time_weighted_price(&pool, 7_200).unwrap(), 2 * PRICE_PRECISION);
        assert_eq!(oracle.time_weighted_price(&pool, 3_600).unwrap(), 3 * PRICE_PRECISION);
        assert!(oracle.time_weighted_price(&pool, 0).is_err());
    }
}
