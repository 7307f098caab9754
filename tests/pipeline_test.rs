// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! End-to-end pipeline tests using synthetic packet streams.

use lidarproc::{
    metadata::{ChanField, COLUMNS_PER_PACKET},
    packet::{PacketLayout, COLUMN_HEADER_LEN, LIDAR_PACKET_TYPE, PACKET_HEADER_LEN},
    pipeline::{FrameSink, PacketKind, Pipeline},
    ImageFrame, InertialSample, LaserScanFrame, PipelineConfig, PointCloudFrame, PointType,
    SensorMetadata, TimestampMode, UdpProfile,
};

#[derive(Default)]
struct RecordingSink {
    clouds: Vec<(usize, PointCloudFrame)>,
    scans: Vec<(usize, LaserScanFrame)>,
    images: Vec<(ChanField, ImageFrame)>,
    samples: Vec<InertialSample>,
}

impl FrameSink for RecordingSink {
    fn point_cloud(&mut self, return_index: usize, frame: PointCloudFrame) {
        self.clouds.push((return_index, frame));
    }
    fn laser_scan(&mut self, return_index: usize, frame: LaserScanFrame) {
        self.scans.push((return_index, frame));
    }
    fn image(&mut self, field: ChanField, frame: ImageFrame) {
        self.images.push((field, frame));
    }
    fn inertial(&mut self, sample: InertialSample) {
        self.samples.push(sample);
    }
}

fn meta(profile: UdpProfile, beams: usize, columns: usize) -> SensorMetadata {
    SensorMetadata {
        beam_count: beams,
        columns_per_revolution: columns,
        udp_profile: profile,
        beam_azimuth_angles: vec![0.0; beams],
        beam_altitude_angles: vec![0.0; beams],
    }
}

#[derive(Clone, Copy)]
struct ColSpec {
    m_id: u16,
    frame_id: u16,
    valid: bool,
}

/// Build a lidar packet from column specs, padding to a full packet with
/// invalid columns carrying the last spec's frame id. Every valid column's
/// beam-0 range is `100 + m_id` millimeters.
fn build_packet(layout: &PacketLayout, cols: &[ColSpec]) -> Vec<u8> {
    let mut buf = vec![0u8; layout.packet_size];
    buf[0..2].copy_from_slice(&LIDAR_PACKET_TYPE.to_le_bytes());
    let last = cols.last().copied().unwrap_or(ColSpec {
        m_id: 0,
        frame_id: 0,
        valid: false,
    });
    for i in 0..COLUMNS_PER_PACKET {
        let spec = if i < cols.len() {
            cols[i]
        } else {
            ColSpec {
                valid: false,
                ..last
            }
        };
        let off = PACKET_HEADER_LEN + i * layout.column_size;
        buf[off..off + 8].copy_from_slice(&(1_000_000 + spec.m_id as u64).to_le_bytes());
        buf[off + 8..off + 10].copy_from_slice(&spec.m_id.to_le_bytes());
        buf[off + 10..off + 12].copy_from_slice(&spec.frame_id.to_le_bytes());
        let status: u32 = if spec.valid { 1 } else { 0 };
        buf[off + 12..off + 16].copy_from_slice(&status.to_le_bytes());
        let ch = off + COLUMN_HEADER_LEN;
        buf[ch..ch + 4].copy_from_slice(&(100 + spec.m_id as u32).to_le_bytes());
    }
    buf
}

fn cols(frame_id: u16, ids: std::ops::Range<u16>) -> Vec<ColSpec> {
    ids.map(|m_id| ColSpec {
        m_id,
        frame_id,
        valid: true,
    })
    .collect()
}

fn imu_packet(accel_ts: u64) -> Vec<u8> {
    let mut buf = vec![0u8; 48];
    buf[8..16].copy_from_slice(&accel_ts.to_le_bytes());
    buf
}

/// Scenario A: threshold 0, one packet completing 10/10 columns followed by
/// the start of the next revolution emits exactly one frame with
/// `valid_columns == 10`.
#[test]
fn test_full_revolution_emits_once() {
    let m = meta(UdpProfile::SingleReturn, 2, 10);
    let layout = PacketLayout::new(&m);
    let config = PipelineConfig {
        proc_mask: "PCL".into(),
        ..Default::default()
    };
    let mut pipeline = Pipeline::new(config, RecordingSink::default());
    pipeline.reconfigure(m).unwrap();

    let mut specs = cols(0, 0..10);
    specs.extend(cols(1, 0..6));
    pipeline.dispatch(PacketKind::Lidar, &build_packet(&layout, &specs));

    let sink = pipeline.sink();
    assert_eq!(sink.clouds.len(), 1);
    let (return_index, frame) = &sink.clouds[0];
    assert_eq!(*return_index, 0);
    assert_eq!(frame.valid_columns, 10);
    assert_eq!(frame.x.len(), 2 * 10);
}

/// Scenario B: threshold 5, only 3 of 10 columns received before the
/// boundary: the frame is dropped with zero sink calls.
#[test]
fn test_incomplete_frame_dropped() {
    let m = meta(UdpProfile::SingleReturn, 2, 10);
    let layout = PacketLayout::new(&m);
    let config = PipelineConfig {
        proc_mask: "PCL|SCAN|IMG".into(),
        min_valid_columns: 5,
        ..Default::default()
    };
    let mut pipeline = Pipeline::new(config, RecordingSink::default());
    pipeline.reconfigure(m).unwrap();

    let mut specs = cols(0, 0..3);
    specs.extend(cols(1, 0..6));
    pipeline.dispatch(PacketKind::Lidar, &build_packet(&layout, &specs));

    let sink = pipeline.sink();
    assert!(sink.clouds.is_empty());
    assert!(sink.scans.is_empty());
    assert!(sink.images.is_empty());
}

/// Frames at or above the threshold are delivered exactly once.
#[test]
fn test_frames_above_threshold_delivered_exactly_once() {
    let m = meta(UdpProfile::SingleReturn, 2, 10);
    let layout = PacketLayout::new(&m);
    let config = PipelineConfig {
        proc_mask: "PCL".into(),
        min_valid_columns: 5,
        ..Default::default()
    };
    let mut pipeline = Pipeline::new(config, RecordingSink::default());
    pipeline.reconfigure(m).unwrap();

    // Three complete revolutions, each closed by the next one's columns
    for frame_id in 0..3u16 {
        let mut specs = cols(frame_id, 0..10);
        specs.extend(cols(frame_id + 1, 0..4));
        pipeline.dispatch(PacketKind::Lidar, &build_packet(&layout, &specs));
    }

    let sink = pipeline.sink();
    assert_eq!(sink.clouds.len(), 3);
    assert!(sink.clouds.iter().all(|(_, f)| f.valid_columns == 10));
}

/// Duplicated packets within a revolution neither inflate the valid-column
/// count nor trigger a spurious emission; the count never exceeds the column
/// count per revolution.
#[test]
fn test_duplicate_packets_idempotent() {
    let m = meta(UdpProfile::SingleReturn, 2, 32);
    let layout = PacketLayout::new(&m);
    let config = PipelineConfig {
        proc_mask: "PCL".into(),
        ..Default::default()
    };
    let mut pipeline = Pipeline::new(config, RecordingSink::default());
    pipeline.reconfigure(m).unwrap();

    let first = build_packet(&layout, &cols(0, 0..16));
    let second = build_packet(&layout, &cols(0, 16..32));
    pipeline.dispatch(PacketKind::Lidar, &first);
    pipeline.dispatch(PacketKind::Lidar, &first);
    pipeline.dispatch(PacketKind::Lidar, &second);
    pipeline.dispatch(PacketKind::Lidar, &second);
    assert!(pipeline.sink().clouds.is_empty());

    pipeline.dispatch(PacketKind::Lidar, &build_packet(&layout, &cols(1, 0..16)));
    let sink = pipeline.sink();
    assert_eq!(sink.clouds.len(), 1);
    assert_eq!(sink.clouds[0].1.valid_columns, 32);
}

/// Dual-return sensors emit exactly two sub-payloads per spatial frame and
/// seven image planes; single-return emit one and four.
#[test]
fn test_return_multiplexing() {
    for (profile, want_returns, want_images) in [
        (UdpProfile::SingleReturn, 1usize, 4usize),
        (UdpProfile::DualReturn, 2, 7),
    ] {
        let m = meta(profile, 2, 16);
        let layout = PacketLayout::new(&m);
        let config = PipelineConfig {
            proc_mask: "PCL|SCAN|IMG".into(),
            ..Default::default()
        };
        let mut pipeline = Pipeline::new(config, RecordingSink::default());
        pipeline.reconfigure(m).unwrap();

        pipeline.dispatch(PacketKind::Lidar, &build_packet(&layout, &cols(0, 0..16)));
        pipeline.dispatch(PacketKind::Lidar, &build_packet(&layout, &cols(1, 0..16)));

        let sink = pipeline.sink();
        assert_eq!(sink.clouds.len(), want_returns);
        assert_eq!(sink.scans.len(), want_returns);
        assert_eq!(sink.images.len(), want_images);
        let indices: Vec<usize> = sink.clouds.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, (0..want_returns).collect::<Vec<_>>());
    }
}

/// Scenario C: mask "IMU|PCL" activates only the IMU transform and point
/// cloud builder; laser scans and images are never produced.
#[test]
fn test_processor_mask_limits_outputs() {
    let m = meta(UdpProfile::SingleReturn, 2, 16);
    let layout = PacketLayout::new(&m);
    let config = PipelineConfig {
        proc_mask: "IMU|PCL".into(),
        ..Default::default()
    };
    let mut pipeline = Pipeline::new(config, RecordingSink::default());
    pipeline.reconfigure(m).unwrap();

    pipeline.dispatch(PacketKind::Lidar, &build_packet(&layout, &cols(0, 0..16)));
    pipeline.dispatch(PacketKind::Lidar, &build_packet(&layout, &cols(1, 0..16)));
    pipeline.dispatch(PacketKind::Imu, &imu_packet(5));

    let sink = pipeline.sink();
    assert_eq!(sink.clouds.len(), 1);
    assert_eq!(sink.samples.len(), 1);
    assert!(sink.scans.is_empty());
    assert!(sink.images.is_empty());
}

/// Scenario D: a TAI-corrected inertial packet with a 37 s offset yields a
/// timestamp 37,000,000,000 ns earlier than the raw one.
#[test]
fn test_imu_tai_correction() {
    let m = meta(UdpProfile::SingleReturn, 2, 16);
    let config = PipelineConfig {
        proc_mask: "IMU".into(),
        timestamp_mode: TimestampMode::PtpUtc,
        utc_tai_offset: 37.0,
        ..Default::default()
    };
    let mut pipeline = Pipeline::new(config, RecordingSink::default());
    pipeline.reconfigure(m).unwrap();

    let raw = 1_700_000_000_000_000_000u64;
    pipeline.dispatch(PacketKind::Imu, &imu_packet(raw));

    let sink = pipeline.sink();
    assert_eq!(sink.samples.len(), 1);
    assert_eq!(sink.samples[0].timestamp_ns, raw - 37_000_000_000);
}

/// A malformed packet in the middle of a revolution is dropped without
/// corrupting accumulated state; the surrounding packets still complete the
/// frame.
#[test]
fn test_malformed_packet_does_not_corrupt_stream() {
    let m = meta(UdpProfile::SingleReturn, 2, 32);
    let layout = PacketLayout::new(&m);
    let config = PipelineConfig {
        proc_mask: "PCL".into(),
        ..Default::default()
    };
    let mut pipeline = Pipeline::new(config, RecordingSink::default());
    pipeline.reconfigure(m).unwrap();

    pipeline.dispatch(PacketKind::Lidar, &build_packet(&layout, &cols(0, 0..16)));
    // Truncated datagram
    pipeline.dispatch(PacketKind::Lidar, &vec![0u8; 100]);
    // Wrong packet type
    let mut bad = build_packet(&layout, &cols(0, 16..32));
    bad[0] = 9;
    pipeline.dispatch(PacketKind::Lidar, &bad);

    pipeline.dispatch(PacketKind::Lidar, &build_packet(&layout, &cols(0, 16..32)));
    pipeline.dispatch(PacketKind::Lidar, &build_packet(&layout, &cols(1, 0..16)));

    let sink = pipeline.sink();
    assert_eq!(sink.clouds.len(), 1);
    assert_eq!(sink.clouds[0].1.valid_columns, 32);
}

/// A packet straddling the revolution boundary closes the old scan with its
/// leading columns and opens the next with its trailing ones.
#[test]
fn test_straddling_packet() {
    let m = meta(UdpProfile::SingleReturn, 2, 32);
    let layout = PacketLayout::new(&m);
    let config = PipelineConfig {
        proc_mask: "SCAN".into(),
        ..Default::default()
    };
    let mut pipeline = Pipeline::new(config, RecordingSink::default());
    pipeline.reconfigure(m).unwrap();

    pipeline.dispatch(PacketKind::Lidar, &build_packet(&layout, &cols(0, 0..16)));
    let mut straddle = cols(0, 16..24);
    straddle.extend(cols(1, 0..8));
    pipeline.dispatch(PacketKind::Lidar, &build_packet(&layout, &straddle));

    let sink = pipeline.sink();
    assert_eq!(sink.scans.len(), 1);
    assert_eq!(sink.scans[0].1.valid_columns, 24);
}

/// Laser scan output reflects the beam-0 ranges written by the packets.
#[test]
fn test_laser_scan_ranges_match_packet_data() {
    let m = meta(UdpProfile::SingleReturn, 2, 16);
    let layout = PacketLayout::new(&m);
    let config = PipelineConfig {
        proc_mask: "SCAN".into(),
        scan_ring: 0,
        ..Default::default()
    };
    let mut pipeline = Pipeline::new(config, RecordingSink::default());
    pipeline.reconfigure(m).unwrap();

    pipeline.dispatch(PacketKind::Lidar, &build_packet(&layout, &cols(0, 0..16)));
    pipeline.dispatch(PacketKind::Lidar, &build_packet(&layout, &cols(1, 0..16)));

    let sink = pipeline.sink();
    let frame = &sink.scans[0].1;
    // Column 7 carried range 107 mm on beam 0
    assert!((frame.ranges[7] - 0.107).abs() < 1e-6);
    assert_eq!(frame.ranges.len(), 16);
}

/// The selected point representation controls which channel vectors the
/// cloud frames carry.
#[test]
fn test_point_type_selection_through_pipeline() {
    let m = meta(UdpProfile::SingleReturn, 2, 16);
    let layout = PacketLayout::new(&m);
    let config = PipelineConfig {
        proc_mask: "PCL".into(),
        point_type: PointType::Xyz,
        ..Default::default()
    };
    let mut pipeline = Pipeline::new(config, RecordingSink::default());
    pipeline.reconfigure(m).unwrap();

    pipeline.dispatch(PacketKind::Lidar, &build_packet(&layout, &cols(0, 0..16)));
    pipeline.dispatch(PacketKind::Lidar, &build_packet(&layout, &cols(1, 0..16)));

    let frame = &pipeline.sink().clouds[0].1;
    assert!(frame.signal.is_none());
    assert!(frame.range.is_none());
    assert!(!frame.x.is_empty());
}
