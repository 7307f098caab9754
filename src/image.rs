// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Range-image-style output construction.
//!
//! Produces one 2-D sample plane per channel field in the active
//! channel-field topic map: 4 planes for single-return profiles, 7 for
//! dual-return (second-return fields are distinct map entries, not a second
//! sub-payload).

use crate::{
    metadata::{channel_field_topics, ChanField, SensorMetadata},
    scan::ScanState,
    time::TimestampContext,
};
use ndarray::Array2;

/// Millimeters per count in range image planes.
const RANGE_MM_PER_COUNT: u32 = 4;

/// One image plane for a single channel field.
#[derive(Clone, Debug)]
pub struct ImageFrame {
    /// Corrected timestamp of the scan's first valid column.
    pub timestamp_ns: u64,
    /// Samples ordered `(beam row, column)`. Range planes are quantized to
    /// 4 mm per count and saturated; other fields are native 16-bit.
    pub data: Array2<u16>,
    /// Columns successfully written in the source scan.
    pub valid_columns: usize,
}

/// Builds per-channel-field image planes from scan snapshots.
pub struct ImageBuilder {
    fields: &'static [(ChanField, &'static str)],
    timestamps: TimestampContext,
}

impl ImageBuilder {
    pub fn new(meta: &SensorMetadata, timestamps: TimestampContext) -> Self {
        Self {
            fields: channel_field_topics(meta.return_count()),
            timestamps,
        }
    }

    /// The active channel fields, in map order.
    pub fn fields(&self) -> &'static [(ChanField, &'static str)] {
        self.fields
    }

    /// Build one image per active channel field. Does not mutate the state.
    pub fn build(&self, state: &ScanState) -> Vec<(ChanField, ImageFrame)> {
        let timestamp_ns = self.timestamps.correct(state.timestamp());
        self.fields
            .iter()
            .map(|(field, _)| {
                let data = match field {
                    ChanField::Range => quantize_range(&state.returns[0].range),
                    ChanField::Signal => state.returns[0].signal.clone(),
                    ChanField::Reflectivity => state.returns[0].reflectivity.clone(),
                    ChanField::NearIr => state.nir.clone(),
                    ChanField::Range2 => quantize_range(&state.returns[1].range),
                    ChanField::Signal2 => state.returns[1].signal.clone(),
                    ChanField::Reflectivity2 => state.returns[1].reflectivity.clone(),
                };
                (
                    *field,
                    ImageFrame {
                        timestamp_ns,
                        data,
                        valid_columns: state.valid_columns,
                    },
                )
            })
            .collect()
    }
}

fn quantize_range(range_mm: &Array2<u32>) -> Array2<u16> {
    range_mm.mapv(|mm| (mm / RANGE_MM_PER_COUNT).min(u16::MAX as u32) as u16)
}
