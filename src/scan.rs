// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Per-revolution scan accumulation.
//!
//! A [`ScanAccumulator`] consumes lidar packets in arrival order and buffers
//! column data into an in-progress revolution. When a column arrives whose
//! revolution counter differs from the one being accumulated, the completed
//! scan is emitted through a caller-supplied closure and the state resets,
//! then accumulation of the new revolution begins with that same column. A
//! packet may therefore straddle a revolution boundary: its leading columns
//! close the old scan, its trailing columns open the next one.
//!
//! Out-of-order or duplicated packets within one revolution are accepted
//! idempotently. Rewriting a column slot overwrites its payload without
//! incrementing the valid-column count.

use crate::{
    error::Error,
    metadata::SensorMetadata,
    packet::{ColumnSlice, PacketLayout, PacketSlice},
};
use ndarray::Array2;
use tracing::warn;

/// Per-return sample planes, shaped `(beam_count, columns_per_revolution)`.
#[derive(Clone, Debug)]
pub struct ReturnPlanes {
    pub range: Array2<u32>,
    pub signal: Array2<u16>,
    pub reflectivity: Array2<u16>,
}

impl ReturnPlanes {
    fn new(beams: usize, columns: usize) -> Self {
        Self {
            range: Array2::zeros((beams, columns)),
            signal: Array2::zeros((beams, columns)),
            reflectivity: Array2::zeros((beams, columns)),
        }
    }

    fn reset(&mut self) {
        self.range.fill(0);
        self.signal.fill(0);
        self.reflectivity.fill(0);
    }
}

/// Accumulated state of one in-progress revolution.
///
/// Owned by exactly one [`ScanAccumulator`] and never shared; builders only
/// see it as an immutable snapshot at emit time.
#[derive(Clone, Debug)]
pub struct ScanState {
    /// One plane set per active return.
    pub returns: Vec<ReturnPlanes>,
    /// Near-IR plane, shared between returns.
    pub nir: Array2<u16>,
    /// Per-column hardware timestamps in nanoseconds.
    pub timestamps: Vec<u64>,
    /// Per-column fill flags.
    pub filled: Vec<bool>,
    /// Count of columns successfully written this revolution.
    pub valid_columns: usize,
    start_timestamp: Option<u64>,
}

impl ScanState {
    pub fn new(meta: &SensorMetadata) -> Self {
        let beams = meta.beam_count;
        let columns = meta.columns_per_revolution;
        Self {
            returns: (0..meta.return_count())
                .map(|_| ReturnPlanes::new(beams, columns))
                .collect(),
            nir: Array2::zeros((beams, columns)),
            timestamps: vec![0; columns],
            filled: vec![false; columns],
            valid_columns: 0,
            start_timestamp: None,
        }
    }

    /// Hardware timestamp of the first valid column, or 0 for an empty scan.
    pub fn timestamp(&self) -> u64 {
        self.start_timestamp.unwrap_or(0)
    }

    fn reset(&mut self) {
        for planes in &mut self.returns {
            planes.reset();
        }
        self.nir.fill(0);
        self.timestamps.fill(0);
        self.filled.fill(false);
        self.valid_columns = 0;
        self.start_timestamp = None;
    }

    fn write_column(&mut self, col: &ColumnSlice, beams: usize) {
        let m = col.measurement_id() as usize;
        if !self.filled[m] {
            self.filled[m] = true;
            self.valid_columns += 1;
        }
        let ts = col.timestamp();
        self.timestamps[m] = ts;
        if self.start_timestamp.is_none() {
            self.start_timestamp = Some(ts);
        }

        for b in 0..beams {
            let sample = col.sample(b);
            for (r, planes) in self.returns.iter_mut().enumerate() {
                planes.range[[b, m]] = sample.range[r];
                planes.signal[[b, m]] = sample.signal[r];
                planes.reflectivity[[b, m]] = sample.reflectivity[r];
            }
            self.nir[[b, m]] = sample.nir;
        }
    }
}

/// Stateful packet-to-scan accumulator.
pub struct ScanAccumulator {
    layout: PacketLayout,
    state: ScanState,
    active_frame_id: Option<u16>,
}

impl ScanAccumulator {
    pub fn new(meta: &SensorMetadata) -> Self {
        Self {
            layout: PacketLayout::new(meta),
            state: ScanState::new(meta),
            active_frame_id: None,
        }
    }

    /// Apply one lidar packet, invoking `emit` with the completed scan for
    /// every revolution boundary crossed.
    ///
    /// A malformed packet is rejected as a whole before any column is
    /// applied; accumulated state is untouched and the error is returned for
    /// the caller to report.
    pub fn process_packet<F>(&mut self, data: &[u8], mut emit: F) -> Result<(), Error>
    where
        F: FnMut(&ScanState),
    {
        let packet = PacketSlice::from_slice(data, &self.layout)?;

        for col in packet.columns() {
            let frame_id = col.frame_id();
            match self.active_frame_id {
                None => self.active_frame_id = Some(frame_id),
                Some(active) if active != frame_id => {
                    // Empty scans are never emitted
                    if self.state.valid_columns > 0 {
                        emit(&self.state);
                    }
                    self.state.reset();
                    self.active_frame_id = Some(frame_id);
                }
                Some(_) => {}
            }

            if col.valid() {
                self.state.write_column(&col, self.layout.beam_count);
            }
        }

        Ok(())
    }

    /// Snapshot of the in-progress scan (test and diagnostic use).
    pub fn state(&self) -> &ScanState {
        &self.state
    }
}

/// Drops completed scans whose valid-column count falls below the configured
/// minimum. With the default minimum of 0 any non-empty scan passes.
#[derive(Clone, Copy, Debug)]
pub struct FrameValidator {
    pub min_valid_columns: usize,
}

impl FrameValidator {
    /// Returns true when the frame should be forwarded.
    pub fn check(&self, state: &ScanState) -> bool {
        if state.valid_columns < self.min_valid_columns {
            warn!(
                got = state.valid_columns,
                expected = self.min_valid_columns,
                "incomplete scan, dropping it"
            );
            return false;
        }
        true
    }
}
