// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Sensor metadata and channel field definitions.
//!
//! [`SensorMetadata`] is the immutable description of the sensor's current
//! configuration, deserialized from the sensor's metadata JSON document. Any
//! change to it triggers a full pipeline reconfiguration; processors only
//! ever see it through a shared read-only handle.

use crate::error::Error;
use serde::Deserialize;
use std::fmt;

/// Number of column blocks in every lidar packet.
pub const COLUMNS_PER_PACKET: usize = 16;

/// UDP data profile describing the per-beam channel block layout.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
pub enum UdpProfile {
    /// Single return: 19-bit range, 8-bit reflectivity, 16-bit signal and
    /// near-IR. 12 bytes per beam.
    #[default]
    #[serde(rename = "RNG19_RFL8_SIG16_NIR16")]
    SingleReturn,
    /// Dual return: two range/signal/reflectivity measurements per shot plus
    /// a shared near-IR sample. 16 bytes per beam.
    #[serde(rename = "RNG19_RFL8_SIG16_NIR16_DUAL")]
    DualReturn,
    /// Low data rate single return: 15-bit range, 8-bit reflectivity and
    /// near-IR, no signal channel. 8 bytes per beam.
    #[serde(rename = "RNG15_RFL8_NIR8")]
    LowDataRate,
}

impl UdpProfile {
    /// Number of simultaneous returns carried by this profile.
    pub fn return_count(&self) -> usize {
        match self {
            UdpProfile::DualReturn => 2,
            _ => 1,
        }
    }

    /// Size of one per-beam channel data block in bytes.
    pub fn channel_data_size(&self) -> usize {
        match self {
            UdpProfile::SingleReturn => 12,
            UdpProfile::DualReturn => 16,
            UdpProfile::LowDataRate => 8,
        }
    }

    /// Whether the profile carries a signal channel.
    pub fn has_signal(&self) -> bool {
        !matches!(self, UdpProfile::LowDataRate)
    }
}

impl fmt::Display for UdpProfile {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UdpProfile::SingleReturn => write!(f, "RNG19_RFL8_SIG16_NIR16"),
            UdpProfile::DualReturn => write!(f, "RNG19_RFL8_SIG16_NIR16_DUAL"),
            UdpProfile::LowDataRate => write!(f, "RNG15_RFL8_NIR8"),
        }
    }
}

/// Named per-sample measurement channels. The "2" suffixed variants are the
/// second-return counterparts present only on dual-return profiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChanField {
    Range,
    Signal,
    Reflectivity,
    NearIr,
    Range2,
    Signal2,
    Reflectivity2,
}

impl fmt::Display for ChanField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ChanField::Range => write!(f, "RANGE"),
            ChanField::Signal => write!(f, "SIGNAL"),
            ChanField::Reflectivity => write!(f, "REFLECTIVITY"),
            ChanField::NearIr => write!(f, "NEAR_IR"),
            ChanField::Range2 => write!(f, "RANGE2"),
            ChanField::Signal2 => write!(f, "SIGNAL2"),
            ChanField::Reflectivity2 => write!(f, "REFLECTIVITY2"),
        }
    }
}

/// Channel field to output topic map for single-return sensors.
const CHANNEL_FIELD_TOPICS_1: [(ChanField, &str); 4] = [
    (ChanField::Range, "range_image"),
    (ChanField::Signal, "signal_image"),
    (ChanField::Reflectivity, "reflec_image"),
    (ChanField::NearIr, "nearir_image"),
];

/// Channel field to output topic map for dual-return sensors.
const CHANNEL_FIELD_TOPICS_2: [(ChanField, &str); 7] = [
    (ChanField::Range, "range_image"),
    (ChanField::Signal, "signal_image"),
    (ChanField::Reflectivity, "reflec_image"),
    (ChanField::NearIr, "nearir_image"),
    (ChanField::Range2, "range_image2"),
    (ChanField::Signal2, "signal_image2"),
    (ChanField::Reflectivity2, "reflec_image2"),
];

/// Select the active channel-field topic map for the given return count.
///
/// The map is read-only configuration data: 4 entries for single-return
/// sensors, 7 for dual-return.
pub fn channel_field_topics(return_count: usize) -> &'static [(ChanField, &'static str)] {
    if return_count == 2 {
        &CHANNEL_FIELD_TOPICS_2
    } else {
        &CHANNEL_FIELD_TOPICS_1
    }
}

/// Immutable sensor configuration for one session.
///
/// Beam geometry angles are pre-resolved calibration data supplied by the
/// sensor; this crate consumes them as-is.
#[derive(Clone, Debug, Deserialize)]
pub struct SensorMetadata {
    /// Number of beams (rows) per column.
    pub beam_count: usize,
    /// Number of columns in one full revolution.
    pub columns_per_revolution: usize,
    /// Active UDP data profile.
    pub udp_profile: UdpProfile,
    /// Per-beam azimuth offsets in degrees.
    pub beam_azimuth_angles: Vec<f32>,
    /// Per-beam altitude angles in degrees.
    pub beam_altitude_angles: Vec<f32>,
}

impl SensorMetadata {
    /// Number of simultaneous returns for the active profile.
    pub fn return_count(&self) -> usize {
        self.udp_profile.return_count()
    }

    /// Validate the metadata document before building a pipeline from it.
    pub fn validate(&self) -> Result<(), Error> {
        if self.beam_count == 0 {
            return Err(Error::Config("beam_count must be non-zero".into()));
        }
        if self.columns_per_revolution == 0 {
            return Err(Error::Config(
                "columns_per_revolution must be non-zero".into(),
            ));
        }
        if self.beam_azimuth_angles.len() != self.beam_count
            || self.beam_altitude_angles.len() != self.beam_count
        {
            return Err(Error::Config(format!(
                "beam angle tables must have {} entries, got {}/{}",
                self.beam_count,
                self.beam_azimuth_angles.len(),
                self.beam_altitude_angles.len()
            )));
        }
        Ok(())
    }
}
