//! Ground-to-drone commands (PIDs 252-255).
//!
//! Commands carry angles in radians in memory and degrees on the wire. The
//! drone-side client answers each command with an
//! [`Acknowledgment`](crate::protocol::status::Acknowledgment).

use std::fmt;

use bytes::{BufMut, BytesMut};

use crate::config::{LinkConfig, FRAME_OVERHEAD};
use crate::core::field::FieldReader;
use crate::error::{ProtocolError, Result};
use crate::protocol::message::{MessageKind, WireMessage};
use crate::protocol::waypoint::{Waypoint, WaypointMission, WAYPOINT_WIRE_SIZE};

/// Interpretation of the velocity fields of a [`VirtualStickCommand`]
///
/// In both modes yaw is absolute (0 is north, clockwise positive) and height
/// is absolute above the take-off point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VirtualStickMode {
    /// `v_x` north, `v_y` east
    NorthEast,
    /// `v_x` forward, `v_y` right, in the vehicle body frame
    Body,
}

impl VirtualStickMode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(VirtualStickMode::NorthEast),
            1 => Some(VirtualStickMode::Body),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            VirtualStickMode::NorthEast => 0,
            VirtualStickMode::Body => 1,
        }
    }
}

/// Direct velocity/heading control (PID 252)
///
/// If no new command arrives within `timeout`, the drone should repeat the last
/// one with zero horizontal velocity, so commands double as a heartbeat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VirtualStickCommand {
    pub mode: u8,
    /// Heading (rad), 0 is north, clockwise positive
    pub yaw: f32,
    /// m/s, -15 to 15
    pub v_x: f32,
    /// m/s, -15 to 15
    pub v_y: f32,
    /// Height above take-off point (m)
    pub hag: f32,
    /// Seconds before the drone stops and hovers
    pub timeout: f32,
}

impl Default for VirtualStickCommand {
    fn default() -> Self {
        Self {
            mode: VirtualStickMode::NorthEast.as_u8(),
            yaw: 0.0,
            v_x: 0.0,
            v_y: 0.0,
            hag: 10.0,
            timeout: 2.0,
        }
    }
}

impl VirtualStickCommand {
    pub fn north_east(yaw: f32, v_north: f32, v_east: f32) -> Self {
        Self {
            yaw,
            v_x: v_north,
            v_y: v_east,
            ..Self::default()
        }
    }

    pub fn body(yaw: f32, v_forward: f32, v_right: f32) -> Self {
        Self {
            mode: VirtualStickMode::Body.as_u8(),
            yaw,
            v_x: v_forward,
            v_y: v_right,
            ..Self::default()
        }
    }

    pub fn stick_mode(&self) -> Option<VirtualStickMode> {
        VirtualStickMode::from_u8(self.mode)
    }

    /// Same command with horizontal velocity zeroed
    pub fn hover(&self) -> Self {
        Self {
            v_x: 0.0,
            v_y: 0.0,
            ..*self
        }
    }
}

/// Yaw in degrees folded into [-180, 180]
fn wrapped_degrees(yaw: f32) -> f32 {
    let mut deg = f64::from(yaw).to_degrees() % 360.0;
    if deg < 0.0 {
        deg += 360.0;
    }
    if deg > 180.0 {
        deg -= 360.0;
    }
    deg as f32
}

impl WireMessage for VirtualStickCommand {
    const KIND: MessageKind = MessageKind::VirtualStickCommand;

    fn encode_payload(&self, buf: &mut BytesMut, _link: &LinkConfig) -> Result<()> {
        buf.put_u8(self.mode);
        buf.put_f32(wrapped_degrees(self.yaw));
        buf.put_f32(self.v_x);
        buf.put_f32(self.v_y);
        buf.put_f32(self.hag);
        buf.put_f32(self.timeout);
        Ok(())
    }

    fn decode_payload(reader: &mut FieldReader<'_>, _link: &LinkConfig) -> Result<Self> {
        Ok(Self {
            mode: reader.u8()?,
            yaw: f64::from(reader.f32()?).to_radians() as f32,
            v_x: reader.f32()?,
            v_y: reader.f32()?,
            hag: reader.f32()?,
            timeout: reader.f32()?,
        })
    }
}

impl fmt::Display for VirtualStickCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mode ---: {}", self.mode)?;
        writeln!(f, "Yaw ----: {} degrees", wrapped_degrees(self.yaw))?;
        writeln!(f, "V_x ----: {} m/s", self.v_x)?;
        writeln!(f, "V_y ----: {} m/s", self.v_y)?;
        writeln!(f, "HAG ----: {} m", self.hag)?;
        writeln!(f, "timeout : {} s", self.timeout)
    }
}

/// Upload and start a waypoint mission (PID 253)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExecuteWaypointMission {
    /// Non-zero: land after the final waypoint
    pub land_at_end: u8,
    /// Non-zero: fly curved legs between waypoints
    pub curved_flight: u8,
    pub waypoints: Vec<Waypoint>,
}

/// Mission flags that precede the waypoint records
const MISSION_FLAGS_SIZE: usize = 2;

impl ExecuteWaypointMission {
    pub fn lands_at_end(&self) -> bool {
        self.land_at_end != 0
    }

    pub fn is_curved(&self) -> bool {
        self.curved_flight != 0
    }
}

impl From<WaypointMission> for ExecuteWaypointMission {
    fn from(mission: WaypointMission) -> Self {
        Self {
            land_at_end: u8::from(mission.land_at_last_waypoint),
            curved_flight: u8::from(mission.curved_trajectory),
            waypoints: mission.waypoints,
        }
    }
}

impl From<ExecuteWaypointMission> for WaypointMission {
    fn from(cmd: ExecuteWaypointMission) -> Self {
        Self {
            land_at_last_waypoint: cmd.lands_at_end(),
            curved_trajectory: cmd.is_curved(),
            waypoints: cmd.waypoints,
        }
    }
}

impl WireMessage for ExecuteWaypointMission {
    const KIND: MessageKind = MessageKind::ExecuteWaypointMission;

    /// # Errors
    /// An empty mission is rejected with `ProtocolError::InvalidLength`; no
    /// receiver would accept it.
    fn encode_payload(&self, buf: &mut BytesMut, _link: &LinkConfig) -> Result<()> {
        if self.waypoints.is_empty() {
            return Err(ProtocolError::InvalidLength {
                pid: Self::KIND.pid(),
                len: FRAME_OVERHEAD + MISSION_FLAGS_SIZE,
            });
        }
        buf.reserve(MISSION_FLAGS_SIZE + WAYPOINT_WIRE_SIZE * self.waypoints.len());
        buf.put_u8(self.land_at_end);
        buf.put_u8(self.curved_flight);
        for waypoint in &self.waypoints {
            waypoint.encode(buf);
        }
        Ok(())
    }

    fn decode_payload(reader: &mut FieldReader<'_>, _link: &LinkConfig) -> Result<Self> {
        let land_at_end = reader.u8()?;
        let curved_flight = reader.u8()?;

        let waypoint_bytes = reader.remaining();
        if waypoint_bytes % WAYPOINT_WIRE_SIZE != 0 {
            return Err(ProtocolError::MisalignedPayload {
                len: waypoint_bytes,
                stride: WAYPOINT_WIRE_SIZE,
            });
        }

        let waypoints = (0..waypoint_bytes / WAYPOINT_WIRE_SIZE)
            .map(|_| Waypoint::decode(reader))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            land_at_end,
            curved_flight,
            waypoints,
        })
    }
}

impl fmt::Display for ExecuteWaypointMission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "LandAtEnd ---: {}", self.land_at_end)?;
        writeln!(f, "CurvedFlight : {}", self.curved_flight)?;
        writeln!(f, "Waypoints ---: {} items", self.waypoints.len())?;
        for waypoint in &self.waypoints {
            writeln!(f, "{waypoint}")?;
        }
        Ok(())
    }
}

/// Start or stop the camera feed (PID 254)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CameraControl {
    pub action: u8,
    /// Requested frame rate (frame/s)
    pub target_fps: f32,
}

impl WireMessage for CameraControl {
    const KIND: MessageKind = MessageKind::CameraControl;

    fn encode_payload(&self, buf: &mut BytesMut, _link: &LinkConfig) -> Result<()> {
        buf.put_u8(self.action);
        buf.put_f32(self.target_fps);
        Ok(())
    }

    fn decode_payload(reader: &mut FieldReader<'_>, _link: &LinkConfig) -> Result<Self> {
        Ok(Self {
            action: reader.u8()?,
            target_fps: reader.f32()?,
        })
    }
}

impl fmt::Display for CameraControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Action ---: {}", self.action)?;
        writeln!(f, "TargetFPS : {} frame/s", self.target_fps)
    }
}

/// Stop, hover or return immediately (PID 255)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EmergencyCommand {
    pub action: u8,
}

impl WireMessage for EmergencyCommand {
    const KIND: MessageKind = MessageKind::EmergencyCommand;

    fn encode_payload(&self, buf: &mut BytesMut, _link: &LinkConfig) -> Result<()> {
        buf.put_u8(self.action);
        Ok(())
    }

    fn decode_payload(reader: &mut FieldReader<'_>, _link: &LinkConfig) -> Result<Self> {
        Ok(Self {
            action: reader.u8()?,
        })
    }
}

impl fmt::Display for EmergencyCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Action : {}", self.action)
    }
}
