// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Zero-copy accessors over the lidar wire format.
//!
//! A lidar packet is a 32-byte packet header followed by
//! [`COLUMNS_PER_PACKET`](crate::metadata::COLUMNS_PER_PACKET) column blocks.
//! Each column block is a 16-byte column header followed by one channel data
//! block per beam; the channel block layout depends on the active
//! [`UdpProfile`]. All integer fields are little-endian.
//!
//! The accessors borrow the datagram buffer for the duration of a single
//! dispatch call and never retain it.

use crate::{
    error::Error,
    metadata::{SensorMetadata, UdpProfile, COLUMNS_PER_PACKET},
};

/// Length of the packet header in bytes.
pub const PACKET_HEADER_LEN: usize = 32;

/// Length of one column header in bytes.
pub const COLUMN_HEADER_LEN: usize = 16;

/// Packet type tag identifying lidar data packets.
pub const LIDAR_PACKET_TYPE: u16 = 1;

/// Column status bit indicating a valid measurement column.
const STATUS_VALID: u32 = 1;

/// Fixed packet geometry derived from sensor metadata.
///
/// Computed once at pipeline construction and shared by every accumulator.
#[derive(Clone, Copy, Debug)]
pub struct PacketLayout {
    pub profile: UdpProfile,
    pub beam_count: usize,
    pub columns_per_revolution: usize,
    /// Size of one column block (header plus all channel blocks).
    pub column_size: usize,
    /// Total lidar packet size.
    pub packet_size: usize,
}

impl PacketLayout {
    pub fn new(meta: &SensorMetadata) -> Self {
        let column_size = COLUMN_HEADER_LEN + meta.beam_count * meta.udp_profile.channel_data_size();
        Self {
            profile: meta.udp_profile,
            beam_count: meta.beam_count,
            columns_per_revolution: meta.columns_per_revolution,
            column_size,
            packet_size: PACKET_HEADER_LEN + COLUMNS_PER_PACKET * column_size,
        }
    }
}

/// One shot's decoded channel samples, with one slot per return.
///
/// Fields absent from the active profile read as zero. Near-IR is shared
/// between returns and only carried once.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChannelSample {
    pub range: [u32; 2],
    pub signal: [u16; 2],
    pub reflectivity: [u16; 2],
    pub nir: u16,
}

/// Borrowed view of a validated lidar packet.
#[derive(Copy, Clone, Debug)]
pub struct PacketSlice<'a> {
    slice: &'a [u8],
    layout: &'a PacketLayout,
}

impl<'a> PacketSlice<'a> {
    /// Validate a datagram against the layout and wrap it.
    ///
    /// Rejects wrong-length buffers, non-lidar packet types, and any column
    /// whose measurement id falls outside the revolution. Validation happens
    /// before any column is applied to scan state, so a rejected packet
    /// contributes nothing.
    pub fn from_slice(slice: &'a [u8], layout: &'a PacketLayout) -> Result<PacketSlice<'a>, Error> {
        if slice.len() != layout.packet_size {
            return Err(Error::UnexpectedEnd(slice.len()));
        }

        let packet_type = u16::from_le_bytes([slice[0], slice[1]]);
        if packet_type != LIDAR_PACKET_TYPE {
            return Err(Error::UnknownPacketType(packet_type));
        }

        let pkt = PacketSlice { slice, layout };
        for col in pkt.columns() {
            let id = col.measurement_id();
            if id as usize >= layout.columns_per_revolution {
                return Err(Error::ColumnOutOfRange(id));
            }
        }

        Ok(pkt)
    }

    pub fn packet_type(&self) -> u16 {
        u16::from_le_bytes([self.slice[0], self.slice[1]])
    }

    /// Revolution counter of the first column in the packet.
    pub fn frame_id(&self) -> u16 {
        u16::from_le_bytes([self.slice[2], self.slice[3]])
    }

    /// Initialization id, updated on every sensor reinit.
    pub fn init_id(&self) -> u32 {
        u32::from_le_bytes([self.slice[4], self.slice[5], self.slice[6], 0])
    }

    /// Serial number of the sensor.
    pub fn serial_number(&self) -> u64 {
        u64::from_le_bytes([
            self.slice[7],
            self.slice[8],
            self.slice[9],
            self.slice[10],
            self.slice[11],
            0,
            0,
            0,
        ])
    }

    /// Iterate the packet's column blocks in wire order.
    pub fn columns(&self) -> impl Iterator<Item = ColumnSlice<'a>> + '_ {
        let layout = self.layout;
        let slice = self.slice;
        (0..COLUMNS_PER_PACKET).map(move |i| {
            let start = PACKET_HEADER_LEN + i * layout.column_size;
            ColumnSlice {
                slice: &slice[start..start + layout.column_size],
                layout,
            }
        })
    }
}

/// Borrowed view of a single column block.
#[derive(Copy, Clone, Debug)]
pub struct ColumnSlice<'a> {
    slice: &'a [u8],
    layout: &'a PacketLayout,
}

impl ColumnSlice<'_> {
    /// Hardware timestamp of the column in nanoseconds.
    pub fn timestamp(&self) -> u64 {
        u64::from_le_bytes(self.slice[0..8].try_into().unwrap())
    }

    /// Column index within the revolution.
    pub fn measurement_id(&self) -> u16 {
        u16::from_le_bytes([self.slice[8], self.slice[9]])
    }

    /// Revolution counter. Carried per column so that a packet straddling a
    /// revolution boundary can be applied column-by-column.
    pub fn frame_id(&self) -> u16 {
        u16::from_le_bytes([self.slice[10], self.slice[11]])
    }

    pub fn status(&self) -> u32 {
        u32::from_le_bytes(self.slice[12..16].try_into().unwrap())
    }

    /// Whether the column carries a valid measurement.
    pub fn valid(&self) -> bool {
        self.status() & STATUS_VALID != 0
    }

    /// Decode the channel block for one beam.
    pub fn sample(&self, beam: usize) -> ChannelSample {
        let size = self.layout.profile.channel_data_size();
        let start = COLUMN_HEADER_LEN + beam * size;
        let b = &self.slice[start..start + size];

        match self.layout.profile {
            UdpProfile::SingleReturn => ChannelSample {
                range: [u32::from_le_bytes(b[0..4].try_into().unwrap()), 0],
                signal: [u16::from_le_bytes([b[4], b[5]]), 0],
                reflectivity: [u16::from_le_bytes([b[6], b[7]]), 0],
                nir: u16::from_le_bytes([b[8], b[9]]),
            },
            UdpProfile::DualReturn => ChannelSample {
                range: [
                    u32::from_le_bytes(b[0..4].try_into().unwrap()),
                    u32::from_le_bytes(b[4..8].try_into().unwrap()),
                ],
                signal: [
                    u16::from_le_bytes([b[8], b[9]]),
                    u16::from_le_bytes([b[10], b[11]]),
                ],
                reflectivity: [b[12] as u16, b[13] as u16],
                nir: u16::from_le_bytes([b[14], b[15]]),
            },
            UdpProfile::LowDataRate => ChannelSample {
                range: [u32::from_le_bytes(b[0..4].try_into().unwrap()), 0],
                signal: [0, 0],
                reflectivity: [b[4] as u16, 0],
                nir: b[5] as u16,
            },
        }
    }
}
