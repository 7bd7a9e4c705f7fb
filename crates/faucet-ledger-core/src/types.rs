//! Strong type definitions for the faucet ledger.
//!
//! All identifiers are newtypes to prevent mixing a request id with a
//! transaction id or an address at compile time.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::error::{Result, ValidationError};

/// Primary key of a fund request.
///
/// Opaque to the ledger; generated ids are UUID v4 strings. Ordering is
/// lexicographic, which is the order every ledger scan visits records in.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RequestId(String);

impl RequestId {
    /// Wrap an existing identifier.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(ValidationError::EmptyRequestId);
        }
        Ok(Self(id))
    }

    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RequestId({})", self.0)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RequestId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<RequestId> for String {
    fn from(id: RequestId) -> Self {
        id.0
    }
}

impl FromStr for RequestId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// Identifier of a chain transaction returned by the batch sender.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TxId(String);

impl TxId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(ValidationError::EmptyTxId);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxId({})", self.0)
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TxId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<TxId> for String {
    fn from(id: TxId) -> Self {
        id.0
    }
}

/// Destination account of a fund request.
///
/// Format checks (checksums, bech32) belong to ingress; the ledger only
/// refuses blank addresses. Surrounding whitespace is trimmed.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    pub fn new(address: impl AsRef<str>) -> Result<Self> {
        let trimmed = address.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyAddress);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Address {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

/// Creation time of a fund request, in whole seconds since the Unix epoch.
///
/// Serialized as RFC 3339 in UTC with second precision
/// (`2021-08-29T04:00:07Z`). Construction checks that the value is
/// representable in that format, so formatting never fails.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    /// The current wall-clock time, truncated to the second.
    pub fn now() -> Self {
        Self(Utc::now().timestamp())
    }

    pub fn from_secs(secs: i64) -> Result<Self> {
        DateTime::<Utc>::from_timestamp(secs, 0)
            .map(|_| Self(secs))
            .ok_or(ValidationError::TimestampOutOfRange(secs))
    }

    /// Parse an RFC 3339 timestamp. Sub-second precision is dropped.
    pub fn parse(value: &str) -> Result<Self> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| Self(dt.timestamp()))
            .map_err(|e| ValidationError::InvalidTimestamp {
                value: value.to_string(),
                reason: e.to_string(),
            })
    }

    pub fn as_secs(&self) -> i64 {
        self.0
    }

    pub fn checked_add(&self, d: Duration) -> Option<Self> {
        let secs = i64::try_from(d.as_secs()).ok()?;
        Self::from_secs(self.0.checked_add(secs)?).ok()
    }

    /// The point in time `d` before this one, clamped to `i64::MIN` seconds.
    ///
    /// Not range-checked.
    pub fn cutoff(&self, d: Duration) -> i64 {
        let secs = i64::try_from(d.as_secs()).unwrap_or(i64::MAX);
        self.0.saturating_sub(secs)
    }

    /// Whether a record created at `self` is past its time-to-live at `now`.
    ///
    /// Strict: a record exactly `ttl` old is still alive.
    pub fn is_expired(&self, now: Timestamp, ttl: Duration) -> bool {
        self.0 < now.cutoff(ttl)
    }

    fn to_datetime(self) -> DateTime<Utc> {
        // Range was checked on construction.
        DateTime::<Utc>::from_timestamp(self.0, 0).unwrap_or_default()
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_datetime().to_rfc3339_opts(SecondsFormat::Secs, true))
    }
}

impl FromStr for Timestamp {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
