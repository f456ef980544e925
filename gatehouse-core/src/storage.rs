//! Persisted record types shared by the repositories and the checks.
use std::net::IpAddr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    address::{IpVersion, SourceAddress, as_u128, canonicalize},
    error::ValidationError,
};

/// Per-identity attempt counter with a resetting window.
///
/// `attempt_count` never decreases inside a window and drops back to 1
/// exactly when a window expires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitRecord {
    pub key: String,
    pub attempt_count: u32,
    pub window_start: DateTime<Utc>,
    pub last_attempt: DateTime<Utc>,
}

impl RateLimitRecord {
    /// The record created by the first attempt for a key.
    pub fn first(key: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            attempt_count: 1,
            window_start: now,
            last_attempt: now,
        }
    }

    /// A window is expired once strictly more than `window` has elapsed since it opened.
    pub fn is_expired(&self, now: DateTime<Utc>, window: Duration) -> bool {
        now - self.window_start > window
    }

    /// Apply one more attempt at `now`.
    ///
    /// Expired windows restart with a count of 1; otherwise the count is
    /// incremented, whether or not that takes it over the limit.
    pub fn advance(self, now: DateTime<Utc>, window: Duration) -> Self {
        if self.is_expired(now, window) {
            return Self::first(self.key, now);
        }

        Self {
            attempt_count: self.attempt_count.saturating_add(1),
            last_attempt: now,
            ..self
        }
    }

    /// Whether the counter is over `max_attempts`.
    pub fn exceeds(&self, max_attempts: u32) -> bool {
        self.attempt_count > max_attempts
    }
}

/// An address range in the reputation table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpRangeEntry {
    pub id: i64,
    pub version: IpVersion,
    pub range_start: IpAddr,
    pub range_end: IpAddr,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl IpRangeEntry {
    /// Inclusive membership test. Inactive ranges and other families never match.
    pub fn contains(&self, address: &SourceAddress) -> bool {
        if !self.active || self.version != address.version() {
            return false;
        }

        let value = as_u128(&address.ip());
        as_u128(&self.range_start) <= value && value <= as_u128(&self.range_end)
    }
}

/// Input for creating an address range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIpRange {
    pub version: IpVersion,
    pub range_start: IpAddr,
    pub range_end: IpAddr,
}

impl NewIpRange {
    /// Build a range from inclusive bounds.
    ///
    /// Both bounds are canonicalised first, so `::1` blocks `127.0.0.1`.
    pub fn new(start: IpAddr, end: IpAddr) -> Result<Self, ValidationError> {
        let start = canonicalize(start);
        let end = canonicalize(end);

        let version = IpVersion::of(&start);
        if version != IpVersion::of(&end) {
            return Err(ValidationError::InvalidRange(format!(
                "{start} and {end} belong to different address families"
            )));
        }

        if as_u128(&start) > as_u128(&end) {
            return Err(ValidationError::InvalidRange(format!(
                "range start {start} is greater than range end {end}"
            )));
        }

        Ok(Self {
            version,
            range_start: start,
            range_end: end,
        })
    }

    /// A range covering exactly one address.
    pub fn single(addr: IpAddr) -> Self {
        let addr = canonicalize(addr);
        Self {
            version: IpVersion::of(&addr),
            range_start: addr,
            range_end: addr,
        }
    }
}
