// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::{cloud::PointType, config::PipelineConfig, time::TimestampMode};
use clap::Parser;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the sensor metadata JSON document.
    #[arg(env)]
    pub metadata: PathBuf,

    /// UDP port to receive lidar packets on.
    #[arg(long, env, default_value = "7502")]
    pub lidar_port: u16,

    /// UDP port to receive IMU packets on.
    #[arg(long, env, default_value = "7503")]
    pub imu_port: u16,

    /// Enabled processors as delimiter-separated tokens (IMU, PCL, SCAN, IMG).
    #[arg(long, env, default_value = "IMU|IMG|PCL|SCAN")]
    pub proc_mask: String,

    /// Timestamp correction mode token (SENSOR_TIME, HOST_TIME, PTP_UTC).
    /// Unrecognized tokens fall back to SENSOR_TIME.
    #[arg(long, env, default_value = "SENSOR_TIME")]
    pub timestamp_mode: String,

    /// UTC/TAI offset in seconds, applied in ptp-utc mode.
    #[arg(long, env, default_value = "37.0")]
    pub ptp_utc_tai_offset: f64,

    /// Minimum valid columns for a scan to be forwarded. 0 accepts any
    /// non-empty scan.
    #[arg(long, env, default_value = "0")]
    pub min_valid_columns: usize,

    /// Point cloud representation.
    #[arg(long, env, default_value = "original")]
    pub point_type: PointType,

    /// Beam ring used for the planar laser scan output.
    #[arg(long, env, default_value = "0")]
    pub scan_ring: i32,

    /// Application log level
    #[arg(long, env, default_value = "info")]
    pub rust_log: LevelFilter,
}

impl From<&Args> for PipelineConfig {
    fn from(args: &Args) -> Self {
        Self {
            proc_mask: args.proc_mask.clone(),
            proc_mask_delimiter: '|',
            timestamp_mode: TimestampMode::from_token(&args.timestamp_mode),
            utc_tai_offset: args.ptp_utc_tai_offset,
            min_valid_columns: args.min_valid_columns,
            point_type: args.point_type,
            scan_ring: args.scan_ring,
        }
    }
}
