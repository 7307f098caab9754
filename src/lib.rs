// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Lidar/IMU packet-to-frame decoding pipeline.
//!
//! This library converts a stream of fixed-format binary packets from a
//! lidar sensor and its inertial unit into multi-representation output
//! frames: organized point clouds, range-image-style channel planes, planar
//! laser scans, and corrected inertial samples.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌────────────────────────────────────────┐
//! │  RawPacket   │ ──► │  Pipeline (dispatcher)                  │
//! │  (Lidar/Imu) │     │  ├─ ScanAccumulator ─► PointCloudBuilder│
//! └──────────────┘     │  ├─ ScanAccumulator ─► LaserScanBuilder │
//!                      │  ├─ ScanAccumulator ─► ImageBuilder     │
//!                      │  └─ ImuPacketHandler                    │
//!                      └───────────────┬────────────────────────┘
//!                                      ▼
//!                              FrameSink callbacks
//! ```
//!
//! Packets are delivered one at a time through [`Pipeline::dispatch`] in
//! receipt order. Each enabled spatial processor owns a private per-revolution
//! accumulator; completed scans are validated against a minimum-valid-columns
//! threshold and pushed to the sink the moment they complete. The set of
//! processors is resolved once from a configuration token mask and rebuilt
//! only on metadata change.
//!
//! # Example
//!
//! ```ignore
//! use lidarproc::{
//!     config::PipelineConfig,
//!     pipeline::{FrameSink, PacketKind, Pipeline},
//! };
//!
//! let mut pipeline = Pipeline::new(PipelineConfig::default(), MySink::new());
//! pipeline.reconfigure(metadata)?;
//!
//! loop {
//!     let len = socket.recv(&mut buf)?;
//!     pipeline.dispatch(PacketKind::Lidar, &buf[..len]);
//! }
//! ```

pub mod args;
pub mod cloud;
pub mod config;
pub mod error;
pub mod image;
pub mod imu;
pub mod laserscan;
pub mod metadata;
pub mod packet;
pub mod pipeline;
pub mod scan;
pub mod time;

// Re-exports for convenience
pub use cloud::{PointCloudFrame, PointType};
pub use config::{PipelineConfig, ProcessorKind, ProcessorMask};
pub use error::Error;
pub use image::ImageFrame;
pub use imu::InertialSample;
pub use laserscan::LaserScanFrame;
pub use metadata::{ChanField, SensorMetadata, UdpProfile};
pub use pipeline::{FrameSink, PacketKind, Pipeline};
pub use time::{TimestampContext, TimestampMode};
