// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Timestamp correction for hardware packet timestamps.

use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

/// How hardware timestamps map to output timestamps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TimestampMode {
    /// Pass the sensor's hardware timestamp through unchanged.
    #[default]
    SensorTime,
    /// Substitute the host's wall-clock arrival time.
    HostTime,
    /// Sensor time synchronized to TAI via PTP, corrected to UTC by
    /// subtracting the configured offset.
    PtpUtc,
}

impl TimestampMode {
    /// Resolve a configuration token. Unrecognized tokens fall back to
    /// sensor-time passthrough with a warning rather than failing.
    pub fn from_token(token: &str) -> Self {
        match token {
            "SENSOR_TIME" => TimestampMode::SensorTime,
            "HOST_TIME" => TimestampMode::HostTime,
            "PTP_UTC" => TimestampMode::PtpUtc,
            _ => {
                warn!(token, "unrecognized timestamp mode, using sensor time");
                TimestampMode::SensorTime
            }
        }
    }
}

/// Immutable timestamp correction context, shared read-only by the IMU
/// transform and every time-stamped spatial output.
#[derive(Clone, Copy, Debug)]
pub struct TimestampContext {
    pub mode: TimestampMode,
    pub utc_tai_offset_ns: i64,
}

impl TimestampContext {
    /// Build a context from a mode and an offset in seconds.
    pub fn new(mode: TimestampMode, utc_tai_offset_secs: f64) -> Self {
        Self {
            mode,
            utc_tai_offset_ns: (utc_tai_offset_secs * 1e9) as i64,
        }
    }

    /// Map a raw hardware timestamp to a corrected epoch timestamp. Total
    /// over all inputs; saturates instead of wrapping on underflow.
    pub fn correct(&self, raw_ns: u64) -> u64 {
        match self.mode {
            TimestampMode::SensorTime => raw_ns,
            TimestampMode::HostTime => host_time_ns(),
            TimestampMode::PtpUtc => {
                (raw_ns as i64).saturating_sub(self.utc_tai_offset_ns).max(0) as u64
            }
        }
    }
}

/// Current host wall-clock time in nanoseconds since the Unix epoch.
pub fn host_time_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
