// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Common error type for the packet decoding pipeline.

use std::fmt;

/// Error type covering packet decoding and configuration failures.
///
/// Packet errors (`UnexpectedEnd`, `UnknownPacketType`, `ColumnOutOfRange`)
/// are recoverable: the offending packet is dropped and processing continues
/// with the next one. `Config` errors leave the pipeline unconfigured until
/// valid metadata arrives.
#[derive(Debug)]
pub enum Error {
    /// Unexpected end of data at given byte position
    UnexpectedEnd(usize),
    /// Unknown packet type tag
    UnknownPacketType(u16),
    /// Column measurement id outside the configured revolution
    ColumnOutOfRange(u16),
    /// Configuration or metadata error
    Config(String),
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UnexpectedEnd(len) => write!(f, "unexpected end of data at {} bytes", len),
            Error::UnknownPacketType(typ) => write!(f, "unknown packet type: {}", typ),
            Error::ColumnOutOfRange(id) => write!(f, "column measurement id out of range: {}", id),
            Error::Config(msg) => write!(f, "configuration error: {}", msg),
        }
    }
}
