// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Packet dispatch and multi-consumer fan-out.
//!
//! The [`Pipeline`] is the single entry point for raw packets. It owns the
//! resolved processor mask, one processor instance per enabled kind, and the
//! output sink. It performs no decoding itself: lidar packets are forwarded
//! to every active spatial processor (each with its own private scan
//! accumulator), IMU packets to the inertial handler. Outputs are pushed
//! through [`FrameSink`] callbacks the moment a frame completes.
//!
//! All dispatch is synchronous and single-threaded; reconfiguration is a
//! complete replace-and-discard performed between packet deliveries.

use crate::{
    cloud::{PointCloudBuilder, PointCloudFrame},
    config::{PipelineConfig, ProcessorKind, ProcessorMask},
    error::Error,
    image::{ImageBuilder, ImageFrame},
    imu::{ImuPacketHandler, InertialSample},
    laserscan::{LaserScanBuilder, LaserScanFrame},
    metadata::{ChanField, SensorMetadata},
    scan::{FrameValidator, ScanAccumulator},
    time::TimestampContext,
};
use tracing::{info, warn};

/// Classification tag for a raw datagram.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PacketKind {
    Lidar,
    Imu,
}

/// Push-model output callbacks, one per completed and validated frame.
///
/// Point cloud and laser scan frames are indexed by return
/// (`0..return_count`); image frames are keyed by channel field per the
/// active topic map. Methods default to no-ops so sinks implement only what
/// they consume.
pub trait FrameSink {
    fn point_cloud(&mut self, return_index: usize, frame: PointCloudFrame) {
        let _ = (return_index, frame);
    }

    fn laser_scan(&mut self, return_index: usize, frame: LaserScanFrame) {
        let _ = (return_index, frame);
    }

    fn image(&mut self, field: ChanField, frame: ImageFrame) {
        let _ = (field, frame);
    }

    fn inertial(&mut self, sample: InertialSample) {
        let _ = sample;
    }
}

/// One spatial processor: a private scan accumulator wired to a
/// representation-specific builder and a frame validator.
///
/// A closed enum rather than trait objects: the set of output
/// representations is fixed.
enum ScanProcessor {
    Cloud {
        accumulator: ScanAccumulator,
        builder: PointCloudBuilder,
        validator: FrameValidator,
    },
    Scan {
        accumulator: ScanAccumulator,
        builder: LaserScanBuilder,
        validator: FrameValidator,
    },
    Image {
        accumulator: ScanAccumulator,
        builder: ImageBuilder,
        validator: FrameValidator,
    },
}

impl ScanProcessor {
    fn kind(&self) -> ProcessorKind {
        match self {
            ScanProcessor::Cloud { .. } => ProcessorKind::PointCloud,
            ScanProcessor::Scan { .. } => ProcessorKind::LaserScan,
            ScanProcessor::Image { .. } => ProcessorKind::Image,
        }
    }

    fn process<S: FrameSink>(&mut self, data: &[u8], sink: &mut S) -> Result<(), Error> {
        match self {
            ScanProcessor::Cloud {
                accumulator,
                builder,
                validator,
            } => accumulator.process_packet(data, |state| {
                if !validator.check(state) {
                    return;
                }
                for (i, frame) in builder.build(state).into_iter().enumerate() {
                    sink.point_cloud(i, frame);
                }
            }),
            ScanProcessor::Scan {
                accumulator,
                builder,
                validator,
            } => accumulator.process_packet(data, |state| {
                if !validator.check(state) {
                    return;
                }
                for (i, frame) in builder.build(state).into_iter().enumerate() {
                    sink.laser_scan(i, frame);
                }
            }),
            ScanProcessor::Image {
                accumulator,
                builder,
                validator,
            } => accumulator.process_packet(data, |state| {
                if !validator.check(state) {
                    return;
                }
                for (field, frame) in builder.build(state) {
                    sink.image(field, frame);
                }
            }),
        }
    }
}

/// The packet dispatcher and processor fan-out.
pub struct Pipeline<S: FrameSink> {
    config: PipelineConfig,
    mask: ProcessorMask,
    meta: Option<SensorMetadata>,
    processors: Vec<ScanProcessor>,
    imu: Option<ImuPacketHandler>,
    sink: S,
}

impl<S: FrameSink> Pipeline<S> {
    /// Create an unconfigured pipeline. Dispatch is a no-op until
    /// [`Self::reconfigure`] succeeds with valid sensor metadata.
    pub fn new(config: PipelineConfig, sink: S) -> Self {
        let mask = ProcessorMask::parse(&config.proc_mask, config.proc_mask_delimiter);
        Self {
            config,
            mask,
            meta: None,
            processors: Vec::new(),
            imu: None,
            sink,
        }
    }

    /// Discard all processor instances and rebuild them for new metadata.
    ///
    /// In-flight scan state is lost; this is a cold restart by contract. On
    /// invalid metadata the pipeline is torn down and dispatch stays a no-op
    /// until a valid document arrives.
    pub fn reconfigure(&mut self, meta: SensorMetadata) -> Result<(), Error> {
        self.processors.clear();
        self.imu = None;
        self.meta = None;

        meta.validate()?;

        if !self.mask.any_spatial() && !self.mask.enabled(ProcessorKind::Imu) {
            warn!(
                mask = %self.config.proc_mask,
                "processor mask enables no outputs, all packets will be dropped"
            );
        }

        let timestamps =
            TimestampContext::new(self.config.timestamp_mode, self.config.utc_tai_offset);
        let validator = FrameValidator {
            min_valid_columns: self.config.min_valid_columns,
        };

        if self.mask.enabled(ProcessorKind::Imu) {
            self.imu = Some(ImuPacketHandler::new(timestamps));
        }

        if self.mask.enabled(ProcessorKind::PointCloud) {
            if self.config.point_type.requires_signal() && !meta.udp_profile.has_signal() {
                warn!(
                    point_type = ?self.config.point_type,
                    profile = %meta.udp_profile,
                    "selected point type is not compatible with the current udp profile"
                );
            }
            self.processors.push(ScanProcessor::Cloud {
                accumulator: ScanAccumulator::new(&meta),
                builder: PointCloudBuilder::new(&meta, self.config.point_type, timestamps),
                validator,
            });
        }

        if self.mask.enabled(ProcessorKind::LaserScan) {
            self.processors.push(ScanProcessor::Scan {
                accumulator: ScanAccumulator::new(&meta),
                builder: LaserScanBuilder::new(&meta, self.config.scan_ring, timestamps),
                validator,
            });
        }

        if self.mask.enabled(ProcessorKind::Image) {
            self.processors.push(ScanProcessor::Image {
                accumulator: ScanAccumulator::new(&meta),
                builder: ImageBuilder::new(&meta, timestamps),
                validator,
            });
        }

        info!(
            beams = meta.beam_count,
            columns = meta.columns_per_revolution,
            profile = %meta.udp_profile,
            returns = meta.return_count(),
            processors = self.processors.len(),
            imu = self.imu.is_some(),
            "pipeline configured"
        );

        self.meta = Some(meta);
        Ok(())
    }

    /// Route one raw packet to every active processor of its kind.
    ///
    /// Malformed packets are reported at warn level and dropped; no error in
    /// steady-state processing terminates the stream.
    pub fn dispatch(&mut self, kind: PacketKind, data: &[u8]) {
        if self.meta.is_none() {
            return;
        }

        match kind {
            PacketKind::Lidar => {
                for processor in &mut self.processors {
                    if let Err(err) = processor.process(data, &mut self.sink) {
                        warn!(kind = ?processor.kind(), %err, "dropping malformed lidar packet");
                    }
                }
            }
            PacketKind::Imu => {
                if let Some(handler) = &self.imu {
                    match handler.handle(data) {
                        Ok(sample) => self.sink.inertial(sample),
                        Err(err) => warn!(%err, "dropping malformed imu packet"),
                    }
                }
            }
        }
    }

    /// Whether the pipeline currently holds valid metadata and processors.
    pub fn is_configured(&self) -> bool {
        self.meta.is_some()
    }

    /// The active sensor metadata, if configured.
    pub fn metadata(&self) -> Option<&SensorMetadata> {
        self.meta.as_ref()
    }

    /// Kinds of spatial processors currently instantiated, in dispatch order.
    pub fn active_processors(&self) -> Vec<ProcessorKind> {
        self.processors.iter().map(|p| p.kind()).collect()
    }

    /// Whether the IMU transform is instantiated.
    pub fn imu_enabled(&self) -> bool {
        self.imu.is_some()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Tear down the pipeline, returning the sink. Any frame mid-accumulation
    /// is discarded.
    pub fn into_sink(self) -> S {
        self.sink
    }
}
