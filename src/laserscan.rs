// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Planar laser scan extraction from accumulated scans.
//!
//! Selects a single beam ring and produces, per return, a 1-D sequence of
//! range samples ordered by column.

use crate::{metadata::SensorMetadata, scan::ScanState, time::TimestampContext};
use tracing::warn;

/// One planar scan line for a single return.
#[derive(Clone, Debug)]
pub struct LaserScanFrame {
    /// Corrected timestamp of the scan's first valid column.
    pub timestamp_ns: u64,
    /// Beam ring the samples were taken from.
    pub ring: usize,
    /// Range samples in meters, ordered by column. Zero where no
    /// measurement exists.
    pub ranges: Vec<f32>,
    /// Reflectivity per column, same ordering.
    pub intensities: Vec<f32>,
    /// Columns successfully written in the source scan.
    pub valid_columns: usize,
}

/// Builds laser scan lines from scan snapshots.
pub struct LaserScanBuilder {
    ring: usize,
    cols: usize,
    timestamps: TimestampContext,
}

impl LaserScanBuilder {
    /// Create a builder for the requested ring, clamped into
    /// `[0, beam_count - 1]`. Clamping is reported once here; the compared
    /// values are the requested and clamped ones computed in this call.
    pub fn new(meta: &SensorMetadata, requested_ring: i32, timestamps: TimestampContext) -> Self {
        let ring = requested_ring.clamp(0, meta.beam_count as i32 - 1);
        if ring != requested_ring {
            warn!(
                requested = requested_ring,
                clamped = ring,
                beam_count = meta.beam_count,
                "scan ring outside available range, value clamped"
            );
        }
        Self {
            ring: ring as usize,
            cols: meta.columns_per_revolution,
            timestamps,
        }
    }

    pub fn ring(&self) -> usize {
        self.ring
    }

    /// Build one scan line per return. Does not mutate the state.
    pub fn build(&self, state: &ScanState) -> Vec<LaserScanFrame> {
        let timestamp_ns = self.timestamps.correct(state.timestamp());
        state
            .returns
            .iter()
            .map(|planes| {
                let mut ranges = vec![0.0; self.cols];
                let mut intensities = vec![0.0; self.cols];
                for c in 0..self.cols {
                    if !state.filled[c] {
                        continue;
                    }
                    ranges[c] = planes.range[[self.ring, c]] as f32 / 1000.0;
                    intensities[c] = planes.reflectivity[[self.ring, c]] as f32;
                }
                LaserScanFrame {
                    timestamp_ns,
                    ring: self.ring,
                    ranges,
                    intensities,
                    valid_columns: state.valid_columns,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::UdpProfile;
    use crate::time::TimestampMode;

    fn meta(beams: usize) -> SensorMetadata {
        SensorMetadata {
            beam_count: beams,
            columns_per_revolution: 16,
            udp_profile: UdpProfile::SingleReturn,
            beam_azimuth_angles: vec![0.0; beams],
            beam_altitude_angles: vec![0.0; beams],
        }
    }

    fn ctx() -> TimestampContext {
        TimestampContext::new(TimestampMode::SensorTime, 0.0)
    }

    #[test]
    fn test_ring_clamping() {
        let m = meta(64);
        assert_eq!(LaserScanBuilder::new(&m, -1, ctx()).ring(), 0);
        assert_eq!(LaserScanBuilder::new(&m, 64, ctx()).ring(), 63);
        assert_eq!(LaserScanBuilder::new(&m, 17, ctx()).ring(), 17);
    }

    #[test]
    fn test_extracts_selected_ring() {
        let m = meta(4);
        let mut state = ScanState::new(&m);
        for c in 0..16 {
            state.filled[c] = true;
        }
        state.valid_columns = 16;
        state.returns[0].range.row_mut(2).fill(3000);
        state.returns[0].reflectivity.row_mut(2).fill(9);
        // Other rings carry different data that must not leak through
        state.returns[0].range.row_mut(1).fill(7000);

        let frames = LaserScanBuilder::new(&m, 2, ctx()).build(&state);
        assert_eq!(frames.len(), 1);
        let frame = &frames[0];
        assert_eq!(frame.ring, 2);
        assert_eq!(frame.ranges.len(), 16);
        assert!((frame.ranges[5] - 3.0).abs() < 1e-6);
        assert_eq!(frame.intensities[5], 9.0);
    }

    #[test]
    fn test_unfilled_columns_read_zero() {
        let m = meta(2);
        let mut state = ScanState::new(&m);
        state.filled[3] = true;
        state.valid_columns = 1;
        state.returns[0].range.fill(5000);

        let frame = &LaserScanBuilder::new(&m, 0, ctx()).build(&state)[0];
        assert!((frame.ranges[3] - 5.0).abs() < 1e-6);
        assert_eq!(frame.ranges[4], 0.0);
        assert_eq!(frame.valid_columns, 1);
    }
}
