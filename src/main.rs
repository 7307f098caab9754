// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use clap::Parser;
use lidarproc::{
    args::Args,
    metadata::ChanField,
    pipeline::{FrameSink, PacketKind, Pipeline},
    ImageFrame, InertialSample, LaserScanFrame, PipelineConfig, PointCloudFrame, SensorMetadata,
};
use std::{io::ErrorKind, net::UdpSocket, thread::sleep, time::Duration};
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

/// Sink that logs a summary of every completed frame.
#[derive(Default)]
struct LogSink {
    clouds: u64,
    scans: u64,
    images: u64,
    samples: u64,
}

impl FrameSink for LogSink {
    fn point_cloud(&mut self, return_index: usize, frame: PointCloudFrame) {
        self.clouds += 1;
        debug!(
            return_index,
            points = frame.x.len(),
            valid_columns = frame.valid_columns,
            timestamp = frame.timestamp_ns,
            "point cloud"
        );
        if self.clouds % 100 == 0 {
            info!(
                clouds = self.clouds,
                scans = self.scans,
                images = self.images,
                imu = self.samples,
                "frames emitted"
            );
        }
    }

    fn laser_scan(&mut self, return_index: usize, frame: LaserScanFrame) {
        self.scans += 1;
        debug!(
            return_index,
            ring = frame.ring,
            samples = frame.ranges.len(),
            "laser scan"
        );
    }

    fn image(&mut self, field: ChanField, frame: ImageFrame) {
        self.images += 1;
        debug!(field = %field, shape = ?frame.data.dim(), "image");
    }

    fn inertial(&mut self, sample: InertialSample) {
        self.samples += 1;
        debug!(timestamp = sample.timestamp_ns, "imu sample");
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.rust_log.to_string()));
    fmt().with_env_filter(filter).init();

    let metadata: SensorMetadata =
        serde_json::from_str(&std::fs::read_to_string(&args.metadata)?)?;

    let mut pipeline = Pipeline::new(PipelineConfig::from(&args), LogSink::default());
    pipeline.reconfigure(metadata)?;

    let lidar = UdpSocket::bind(("0.0.0.0", args.lidar_port))?;
    let imu = UdpSocket::bind(("0.0.0.0", args.imu_port))?;
    lidar.set_nonblocking(true)?;
    imu.set_nonblocking(true)?;
    info!(
        lidar_port = args.lidar_port,
        imu_port = args.imu_port,
        "listening for packets"
    );

    // Single-threaded dispatch loop: both sockets are polled nonblocking so
    // the two packet streams can interleave arbitrarily while each stays in
    // receipt order.
    let mut buf = [0u8; 16 * 1024];
    loop {
        let mut idle = true;

        match lidar.recv(&mut buf) {
            Ok(len) => {
                pipeline.dispatch(PacketKind::Lidar, &buf[..len]);
                idle = false;
            }
            Err(err) if err.kind() == ErrorKind::WouldBlock => {}
            Err(err) => return Err(err.into()),
        }

        match imu.recv(&mut buf) {
            Ok(len) => {
                pipeline.dispatch(PacketKind::Imu, &buf[..len]);
                idle = false;
            }
            Err(err) if err.kind() == ErrorKind::WouldBlock => {}
            Err(err) => return Err(err.into()),
        }

        if idle {
            sleep(Duration::from_micros(200));
        }
    }
}
