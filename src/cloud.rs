// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Point cloud construction from accumulated scans.
//!
//! The builder produces one organized cloud per active return: a
//! structure-of-arrays layout with one slot per column x beam, zeros in
//! slots whose column was never filled or whose range measurement is empty.

use crate::{
    metadata::SensorMetadata,
    scan::{ScanState, ReturnPlanes},
    time::TimestampContext,
};
use clap::ValueEnum;
use std::f32::consts::TAU;

/// Point representation selector, resolved once at construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum PointType {
    /// Coordinates plus range, signal, reflectivity, and near-IR channels.
    #[default]
    Original,
    /// Coordinates only.
    Xyz,
    /// Coordinates plus signal as intensity.
    Xyzi,
}

impl PointType {
    /// Whether the representation carries the signal channel. Used to warn
    /// when the active profile has no signal data.
    pub fn requires_signal(&self) -> bool {
        matches!(self, PointType::Original | PointType::Xyzi)
    }
}

/// One organized point cloud for a single return.
///
/// Slot order is row-major: index `beam * cols + column`. Channel vectors
/// are present only when the selected [`PointType`] includes them.
#[derive(Clone, Debug)]
pub struct PointCloudFrame {
    /// Corrected timestamp of the scan's first valid column.
    pub timestamp_ns: u64,
    /// Number of beam rows.
    pub rows: usize,
    /// Number of columns in the revolution.
    pub cols: usize,
    pub x: Vec<f32>,
    pub y: Vec<f32>,
    pub z: Vec<f32>,
    /// Raw range in millimeters.
    pub range: Option<Vec<u32>>,
    pub signal: Option<Vec<u16>>,
    pub reflectivity: Option<Vec<u16>>,
    pub nir: Option<Vec<u16>>,
    /// Columns successfully written in the source scan.
    pub valid_columns: usize,
}

/// Builds point clouds from scan snapshots using pre-resolved beam geometry.
pub struct PointCloudBuilder {
    point_type: PointType,
    rows: usize,
    cols: usize,
    /// Per-beam azimuth offsets in radians.
    azimuth: Vec<f32>,
    /// Per-beam altitude cosines and sines.
    cos_altitude: Vec<f32>,
    sin_altitude: Vec<f32>,
    timestamps: TimestampContext,
}

impl PointCloudBuilder {
    pub fn new(meta: &SensorMetadata, point_type: PointType, timestamps: TimestampContext) -> Self {
        let azimuth = meta
            .beam_azimuth_angles
            .iter()
            .map(|a| a.to_radians())
            .collect();
        let cos_altitude = meta
            .beam_altitude_angles
            .iter()
            .map(|a| a.to_radians().cos())
            .collect();
        let sin_altitude = meta
            .beam_altitude_angles
            .iter()
            .map(|a| a.to_radians().sin())
            .collect();
        Self {
            point_type,
            rows: meta.beam_count,
            cols: meta.columns_per_revolution,
            azimuth,
            cos_altitude,
            sin_altitude,
            timestamps,
        }
    }

    /// Build one cloud per return from the scan snapshot. Does not mutate
    /// the state.
    pub fn build(&self, state: &ScanState) -> Vec<PointCloudFrame> {
        let timestamp_ns = self.timestamps.correct(state.timestamp());
        state
            .returns
            .iter()
            .map(|planes| self.build_return(state, planes, timestamp_ns))
            .collect()
    }

    fn build_return(
        &self,
        state: &ScanState,
        planes: &ReturnPlanes,
        timestamp_ns: u64,
    ) -> PointCloudFrame {
        let n = self.rows * self.cols;
        let mut frame = PointCloudFrame {
            timestamp_ns,
            rows: self.rows,
            cols: self.cols,
            x: vec![0.0; n],
            y: vec![0.0; n],
            z: vec![0.0; n],
            range: None,
            signal: None,
            reflectivity: None,
            nir: None,
            valid_columns: state.valid_columns,
        };

        for b in 0..self.rows {
            for c in 0..self.cols {
                if !state.filled[c] {
                    continue;
                }
                let range_mm = planes.range[[b, c]];
                if range_mm == 0 {
                    continue;
                }
                let r = range_mm as f32 / 1000.0;
                let theta = TAU * c as f32 / self.cols as f32 + self.azimuth[b];
                let i = b * self.cols + c;
                frame.x[i] = r * theta.cos() * self.cos_altitude[b];
                frame.y[i] = -r * theta.sin() * self.cos_altitude[b];
                frame.z[i] = r * self.sin_altitude[b];
            }
        }

        match self.point_type {
            PointType::Original => {
                frame.range = Some(planes.range.iter().copied().collect());
                frame.signal = Some(planes.signal.iter().copied().collect());
                frame.reflectivity = Some(planes.reflectivity.iter().copied().collect());
                frame.nir = Some(state.nir.iter().copied().collect());
            }
            PointType::Xyzi => {
                frame.signal = Some(planes.signal.iter().copied().collect());
            }
            PointType::Xyz => {}
        }

        frame
    }
}
