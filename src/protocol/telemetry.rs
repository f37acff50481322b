//! Drone-to-ground telemetry messages.

use std::borrow::Cow;
use std::fmt;

use bytes::{BufMut, BytesMut};

use crate::config::LinkConfig;
use crate::core::field::{FieldReader, PutFields};
use crate::error::Result;
use crate::protocol::message::{MessageKind, WireMessage};

/// High-rate vehicle state (PID 0)
///
/// Angles travel exactly as stored; by convention they are degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CoreTelemetry {
    /// Flight state flag as sent; non-zero means airborne
    pub is_flying: u8,
    /// WGS84 latitude (degrees)
    pub latitude: f64,
    /// WGS84 longitude (degrees)
    pub longitude: f64,
    /// WGS84 altitude (m)
    pub altitude: f64,
    /// Height above ground (m)
    pub hag: f64,
    /// Velocity north (m/s)
    pub v_north: f32,
    /// Velocity east (m/s)
    pub v_east: f32,
    /// Velocity down (m/s)
    pub v_down: f32,
    /// Yaw (degrees), 0 is north, clockwise positive
    pub yaw: f64,
    /// Pitch (degrees)
    pub pitch: f64,
    /// Roll (degrees)
    pub roll: f64,
}

impl CoreTelemetry {
    pub fn flying(&self) -> bool {
        self.is_flying != 0
    }
}

impl WireMessage for CoreTelemetry {
    const KIND: MessageKind = MessageKind::CoreTelemetry;

    fn encode_payload(&self, buf: &mut BytesMut, _link: &LinkConfig) -> Result<()> {
        buf.reserve(69);
        buf.put_u8(self.is_flying);
        buf.put_f64(self.latitude);
        buf.put_f64(self.longitude);
        buf.put_f64(self.altitude);
        buf.put_f64(self.hag);
        buf.put_f32(self.v_north);
        buf.put_f32(self.v_east);
        buf.put_f32(self.v_down);
        buf.put_f64(self.yaw);
        buf.put_f64(self.pitch);
        buf.put_f64(self.roll);
        Ok(())
    }

    fn decode_payload(reader: &mut FieldReader<'_>, _link: &LinkConfig) -> Result<Self> {
        Ok(Self {
            is_flying: reader.u8()?,
            latitude: reader.f64()?,
            longitude: reader.f64()?,
            altitude: reader.f64()?,
            hag: reader.f64()?,
            v_north: reader.f32()?,
            v_east: reader.f32()?,
            v_down: reader.f32()?,
            yaw: reader.f64()?,
            pitch: reader.f64()?,
            roll: reader.f64()?,
        })
    }
}

impl fmt::Display for CoreTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "IsFlying -: {}", self.is_flying)?;
        writeln!(f, "Latitude -: {} degrees", self.latitude)?;
        writeln!(f, "Longitude : {} degrees", self.longitude)?;
        writeln!(f, "Altitude -: {} m", self.altitude)?;
        writeln!(f, "HAG ------: {} m", self.hag)?;
        writeln!(f, "V_N ------: {} m/s", self.v_north)?;
        writeln!(f, "V_E ------: {} m/s", self.v_east)?;
        writeln!(f, "V_D ------: {} m/s", self.v_down)?;
        writeln!(f, "Yaw ------: {} degrees", self.yaw)?;
        writeln!(f, "Pitch ----: {} degrees", self.pitch)?;
        writeln!(f, "Roll -----: {} degrees", self.roll)
    }
}

/// Low-rate vehicle status (PID 1)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtendedTelemetry {
    pub gnss_sat_count: u16,
    /// GNSS signal quality level
    pub gnss_signal: u8,
    /// Whether the height limit is reached
    pub max_height: u8,
    /// Whether the distance limit is reached
    pub max_dist: u8,
    /// Battery charge (percent)
    pub bat_level: u8,
    pub bat_warning: u8,
    pub wind_level: u8,
    /// Camera status flag
    pub dji_cam: u8,
    pub flight_mode: u8,
    pub mission_id: u16,
    /// Serial number bytes exactly as sent; no character set is implied
    pub drone_serial: Vec<u8>,
}

impl ExtendedTelemetry {
    /// Serial number for display, with invalid UTF-8 replaced
    pub fn serial_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.drone_serial)
    }
}

impl WireMessage for ExtendedTelemetry {
    const KIND: MessageKind = MessageKind::ExtendedTelemetry;

    fn encode_payload(&self, buf: &mut BytesMut, _link: &LinkConfig) -> Result<()> {
        buf.put_u16(self.gnss_sat_count);
        buf.put_u8(self.gnss_signal);
        buf.put_u8(self.max_height);
        buf.put_u8(self.max_dist);
        buf.put_u8(self.bat_level);
        buf.put_u8(self.bat_warning);
        buf.put_u8(self.wind_level);
        buf.put_u8(self.dji_cam);
        buf.put_u8(self.flight_mode);
        buf.put_u16(self.mission_id);
        buf.put_string_field(&self.drone_serial)
    }

    fn decode_payload(reader: &mut FieldReader<'_>, _link: &LinkConfig) -> Result<Self> {
        let mut msg = Self {
            gnss_sat_count: reader.u16()?,
            gnss_signal: reader.u8()?,
            max_height: reader.u8()?,
            max_dist: reader.u8()?,
            bat_level: reader.u8()?,
            bat_warning: reader.u8()?,
            wind_level: reader.u8()?,
            dji_cam: reader.u8()?,
            flight_mode: reader.u8()?,
            mission_id: reader.u16()?,
            drone_serial: Vec::new(),
        };
        let mut budget = reader.remaining();
        msg.drone_serial = reader.string(&mut budget);
        Ok(msg)
    }
}

impl fmt::Display for ExtendedTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "GNSSSatCount : {}", self.gnss_sat_count)?;
        writeln!(f, "GNSSSignal --: {}", self.gnss_signal)?;
        writeln!(f, "MaxHeight ---: {}", self.max_height)?;
        writeln!(f, "MaxDist -----: {}", self.max_dist)?;
        writeln!(f, "BatLevel ----: {}", self.bat_level)?;
        writeln!(f, "BatWarning --: {}", self.bat_warning)?;
        writeln!(f, "WindLevel ---: {}", self.wind_level)?;
        writeln!(f, "DJICam ------: {}", self.dji_cam)?;
        writeln!(f, "FlightMode --: {}", self.flight_mode)?;
        writeln!(f, "MissionID ---: {}", self.mission_id)?;
        writeln!(f, "DroneSerial -: {}", self.serial_lossy())
    }
}
