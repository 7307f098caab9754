// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Inertial packet decoding.
//!
//! An IMU packet is 48 bytes, little-endian: three 8-byte hardware
//! timestamps (system, accelerometer, gyroscope), then acceleration x/y/z as
//! `f32` in g, then angular velocity x/y/z as `f32` in deg/s. The handler is
//! a pure per-packet transform producing one corrected sample.

use crate::{error::Error, time::TimestampContext};

/// IMU packet size in bytes.
pub const IMU_PACKET_SIZE: usize = 48;

/// Standard gravity, for converting acceleration from g to m/s².
const STANDARD_GRAVITY: f32 = 9.80665;

/// One corrected inertial sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InertialSample {
    /// Corrected accelerometer timestamp in nanoseconds.
    pub timestamp_ns: u64,
    /// Linear acceleration x/y/z in m/s².
    pub linear_acceleration: [f32; 3],
    /// Angular velocity x/y/z in rad/s.
    pub angular_velocity: [f32; 3],
}

/// Stateless per-packet IMU transform.
#[derive(Clone, Copy, Debug)]
pub struct ImuPacketHandler {
    timestamps: TimestampContext,
}

impl ImuPacketHandler {
    pub fn new(timestamps: TimestampContext) -> Self {
        Self { timestamps }
    }

    /// Decode one IMU packet. Fails only on structurally malformed input;
    /// the datagram must be exactly [`IMU_PACKET_SIZE`] bytes.
    pub fn handle(&self, data: &[u8]) -> Result<InertialSample, Error> {
        if data.len() != IMU_PACKET_SIZE {
            return Err(Error::UnexpectedEnd(data.len()));
        }

        let accel_ts = u64::from_le_bytes(data[8..16].try_into().unwrap());

        let mut accel = [0.0f32; 3];
        let mut gyro = [0.0f32; 3];
        for i in 0..3 {
            let a = 24 + i * 4;
            accel[i] = f32::from_le_bytes(data[a..a + 4].try_into().unwrap()) * STANDARD_GRAVITY;
            let g = 36 + i * 4;
            gyro[i] = f32::from_le_bytes(data[g..g + 4].try_into().unwrap()).to_radians();
        }

        Ok(InertialSample {
            timestamp_ns: self.timestamps.correct(accel_ts),
            linear_acceleration: accel,
            angular_velocity: gyro,
        })
    }
}
