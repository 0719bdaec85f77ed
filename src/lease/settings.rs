//! Lease option resolution.
//!
//! Settings are resolved once, before the worker starts, and are immutable
//! while it runs. Resolution applies overrides on top of the built-in
//! defaults with the rule that zero-valued override fields are ignored
//! (the previous value is retained), then clamps `pool_volume` so a single
//! allocation pass can never be asked for more tickets than the range
//! holds.

use crate::core::config::LeaseConfig;
use anyhow::Result;
use std::time::Duration;

/// Default tickets generated per allocation pass.
pub const DEFAULT_POOL_VOLUME: u32 = 100;

/// Default renewal deadline for rented tickets.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

/// Default cooldown before a frozen ticket is recyclable.
pub const DEFAULT_TTF: Duration = Duration::from_secs(30 * 60);

/// Default inclusive lower bound of the ticket range.
pub const DEFAULT_MIN_VALUE: u32 = 100_000;

/// Default exclusive upper bound of the ticket range.
pub const DEFAULT_MAX_VALUE: u32 = 200_000;

/// Resolved, validated lease settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaseSettings {
    /// Max tickets materialized per allocation pass.
    pub pool_volume: u32,

    /// Renewal deadline: a rented ticket not relet within `ttl` of its
    /// last rent/relet is auto-frozen.
    pub ttl: Duration,

    /// Cooldown: a frozen ticket is not recycled until `ttf` after it
    /// entered the frozen state.
    pub ttf: Duration,

    /// Inclusive lower bound of the ticket range. Must be > 0: zero is
    /// the exhaustion sentinel on the wire.
    pub min_value: u32,

    /// Exclusive upper bound of the ticket range.
    pub max_value: u32,
}

impl Default for LeaseSettings {
    fn default() -> Self {
        Self {
            pool_volume: DEFAULT_POOL_VOLUME,
            ttl: DEFAULT_TTL,
            ttf: DEFAULT_TTF,
            min_value: DEFAULT_MIN_VALUE,
            max_value: DEFAULT_MAX_VALUE,
        }
    }
}

impl LeaseSettings {
    /// Resolve settings from a configuration section.
    ///
    /// Zero-valued fields keep the default. After application,
    /// `pool_volume` is clamped to the range capacity and the result is
    /// validated.
    pub fn resolve(config: &LeaseConfig) -> Result<Self> {
        let mut settings = Self::default();
        settings.apply(config);
        settings.validate()?;
        Ok(settings)
    }

    /// Apply overrides in place. Zero values are ignored.
    pub fn apply(&mut self, config: &LeaseConfig) {
        if config.pool_volume > 0 {
            self.pool_volume = config.pool_volume;
        }
        if config.ttl_ms > 0 {
            self.ttl = Duration::from_millis(config.ttl_ms);
        }
        if config.ttf_ms > 0 {
            self.ttf = Duration::from_millis(config.ttf_ms);
        }
        if config.min_value > 0 {
            self.min_value = config.min_value;
        }
        if config.max_value > 0 {
            self.max_value = config.max_value;
        }

        // Clamp to capacity: one allocation pass can never need more
        // values than the range holds.
        let capacity = self.max_value.saturating_sub(self.min_value);
        if self.pool_volume > capacity {
            self.pool_volume = capacity;
        }
    }

    /// Validate resolved settings.
    pub fn validate(&self) -> Result<()> {
        if self.min_value == 0 {
            anyhow::bail!("lease.min_value must be > 0; ticket 0 is the exhaustion sentinel");
        }
        if self.max_value <= self.min_value {
            anyhow::bail!(
                "lease ticket range [{}, {}) has zero capacity",
                self.min_value,
                self.max_value
            );
        }
        if self.ttl.is_zero() {
            anyhow::bail!("lease.ttl_ms must be > 0");
        }
        if self.ttf.is_zero() {
            anyhow::bail!("lease.ttf_ms must be > 0");
        }
        Ok(())
    }

    /// Total addressable ticket count.
    pub fn capacity(&self) -> u32 {
        self.max_value - self.min_value
    }

    /// Upper bound on free-pool length when recycling released tickets.
    pub fn pool_cap(&self) -> usize {
        5 * self.pool_volume as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overrides(
        pool_volume: u32,
        ttl_ms: u64,
        ttf_ms: u64,
        min_value: u32,
        max_value: u32,
    ) -> LeaseConfig {
        LeaseConfig {
            pool_volume,
            ttl_ms,
            ttf_ms,
            min_value,
            max_value,
        }
    }

    #[test]
    fn defaults_resolve() {
        let settings = LeaseSettings::resolve(&LeaseConfig::default()).unwrap();
        assert_eq!(settings, LeaseSettings::default());
        assert_eq!(settings.capacity(), 100_000);
    }

    #[test]
    fn zero_overrides_are_ignored() {
        let settings = LeaseSettings::resolve(&overrides(0, 0, 5_000, 0, 0)).unwrap();
        assert_eq!(settings.pool_volume, DEFAULT_POOL_VOLUME);
        assert_eq!(settings.ttl, DEFAULT_TTL);
        assert_eq!(settings.ttf, Duration::from_secs(5));
        assert_eq!(settings.min_value, DEFAULT_MIN_VALUE);
        assert_eq!(settings.max_value, DEFAULT_MAX_VALUE);
    }

    #[test]
    fn pool_volume_clamps_to_capacity() {
        // Regression: an oversized volume must clamp to the full capacity
        // of the range, not collapse to zero.
        let settings = LeaseSettings::resolve(&overrides(1000, 1_000, 1_000, 2, 5)).unwrap();
        assert_eq!(settings.capacity(), 3);
        assert_eq!(settings.pool_volume, 3);
        assert_ne!(settings.pool_volume, 0);
    }

    #[test]
    fn volume_within_capacity_is_kept() {
        let settings = LeaseSettings::resolve(&overrides(10, 0, 0, 100, 1_000)).unwrap();
        assert_eq!(settings.pool_volume, 10);
    }

    #[test]
    fn rejects_zero_capacity_range() {
        assert!(LeaseSettings::resolve(&overrides(0, 0, 0, 500, 500)).is_err());
        assert!(LeaseSettings::resolve(&overrides(0, 0, 0, 500, 100)).is_err());
    }

    #[test]
    fn rejects_min_value_overlapping_sentinel() {
        let mut settings = LeaseSettings {
            min_value: 0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
        settings.min_value = 1;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn pool_cap_scales_with_volume() {
        let settings = LeaseSettings::resolve(&overrides(40, 0, 0, 0, 0)).unwrap();
        assert_eq!(settings.pool_cap(), 200);
    }
}
