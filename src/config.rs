// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Processor selection and pipeline configuration.

use crate::{cloud::PointType, time::TimestampMode};

/// Processor kinds that can be enabled in the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessorKind {
    Imu,
    PointCloud,
    LaserScan,
    Image,
}

/// The enabled subset of processors, resolved once from a delimiter-separated
/// token string and immutable thereafter.
///
/// Recognized tokens are `IMU`, `PCL`, `SCAN`, and `IMG` (case-sensitive);
/// unrecognized tokens are ignored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProcessorMask {
    imu: bool,
    point_cloud: bool,
    laser_scan: bool,
    image: bool,
}

impl ProcessorMask {
    /// Parse a token string such as `"IMU|PCL|SCAN|IMG"`.
    pub fn parse(tokens: &str, delimiter: char) -> Self {
        let mut mask = Self::default();
        for token in tokens.split(delimiter) {
            match token {
                "IMU" => mask.imu = true,
                "PCL" => mask.point_cloud = true,
                "SCAN" => mask.laser_scan = true,
                "IMG" => mask.image = true,
                _ => {}
            }
        }
        mask
    }

    pub fn enabled(&self, kind: ProcessorKind) -> bool {
        match kind {
            ProcessorKind::Imu => self.imu,
            ProcessorKind::PointCloud => self.point_cloud,
            ProcessorKind::LaserScan => self.laser_scan,
            ProcessorKind::Image => self.image,
        }
    }

    /// Whether any spatial (lidar-packet-consuming) processor is enabled.
    pub fn any_spatial(&self) -> bool {
        self.point_cloud || self.laser_scan || self.image
    }
}

/// Configuration inputs read once at pipeline construction.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Delimiter-separated processor tokens, e.g. `"IMU|PCL"`.
    pub proc_mask: String,
    /// Token delimiter within `proc_mask`.
    pub proc_mask_delimiter: char,
    pub timestamp_mode: TimestampMode,
    /// UTC/TAI offset in seconds, converted internally to nanoseconds.
    pub utc_tai_offset: f64,
    /// Minimum valid columns for a frame to be forwarded. The default of 0
    /// accepts any non-empty frame.
    pub min_valid_columns: usize,
    pub point_type: PointType,
    /// Laser scan beam ring, clamped into `[0, beam_count - 1]`.
    pub scan_ring: i32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            proc_mask: "IMU|IMG|PCL|SCAN".to_string(),
            proc_mask_delimiter: '|',
            timestamp_mode: TimestampMode::default(),
            utc_tai_offset: 37.0,
            min_valid_columns: 0,
            point_type: PointType::default(),
            scan_ring: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_mask() {
        let mask = ProcessorMask::parse("IMU|IMG|PCL|SCAN", '|');
        assert!(mask.enabled(ProcessorKind::Imu));
        assert!(mask.enabled(ProcessorKind::PointCloud));
        assert!(mask.enabled(ProcessorKind::LaserScan));
        assert!(mask.enabled(ProcessorKind::Image));
    }

    #[test]
    fn test_parse_subset() {
        let mask = ProcessorMask::parse("IMU|PCL", '|');
        assert!(mask.enabled(ProcessorKind::Imu));
        assert!(mask.enabled(ProcessorKind::PointCloud));
        assert!(!mask.enabled(ProcessorKind::LaserScan));
        assert!(!mask.enabled(ProcessorKind::Image));
        assert!(mask.any_spatial());
    }

    #[test]
    fn test_unrecognized_tokens_ignored() {
        let mask = ProcessorMask::parse("IMU|BOGUS|pcl|", '|');
        assert!(mask.enabled(ProcessorKind::Imu));
        // Matching is case-sensitive and exact
        assert!(!mask.enabled(ProcessorKind::PointCloud));
        assert!(!mask.any_spatial());
    }

    #[test]
    fn test_alternate_delimiter() {
        let mask = ProcessorMask::parse("SCAN,IMG", ',');
        assert!(mask.enabled(ProcessorKind::LaserScan));
        assert!(mask.enabled(ProcessorKind::Image));
        assert!(!mask.enabled(ProcessorKind::Imu));
    }

    #[test]
    fn test_empty_mask() {
        let mask = ProcessorMask::parse("", '|');
        assert!(!mask.any_spatial());
        assert!(!mask.enabled(ProcessorKind::Imu));
    }
}
