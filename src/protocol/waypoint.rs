//! # Waypoints
//!
//! Waypoints and waypoint missions as carried by
//! [`ExecuteWaypointMission`](crate::protocol::command::ExecuteWaypointMission).
//!
//! In memory, angles are radians. On the wire they are degrees, so a round
//! trip reproduces latitude, longitude and gimbal pitch only up to floating
//! point error. Optional fields travel as NaN when absent.
//!
//! Altitudes are relative to the take-off point, because the vehicles have a
//! poor idea of their absolute altitude. Distances are therefore measured by
//! projecting both waypoints onto the WGS-84 ellipsoid and adding the relative
//! altitude difference for the 3D case. This is a good approximation unless the
//! waypoints are very far apart or very far from sea level.

use std::fmt;

use bytes::{BufMut, BytesMut};

use crate::core::field::FieldReader;
use crate::error::Result;

/// Bytes one waypoint occupies on the wire
pub const WAYPOINT_WIRE_SIZE: usize = 40;

/// WGS-84 semi-major axis (m)
const WGS84_A: f64 = 6_378_137.0;

/// WGS-84 first eccentricity
const WGS84_E: f64 = 0.081_819_190_842_621;

/// Earth-centred, earth-fixed position (m) of a geodetic point given in radians
pub fn lla_to_ecef(latitude: f64, longitude: f64, altitude: f64) -> [f64; 3] {
    let e2 = WGS84_E * WGS84_E;
    let (sin_lat, cos_lat) = latitude.sin_cos();
    let (sin_lon, cos_lon) = longitude.sin_cos();
    let n = WGS84_A / (1.0 - e2 * sin_lat * sin_lat).sqrt();
    [
        (n + altitude) * cos_lat * cos_lon,
        (n + altitude) * cos_lat * sin_lon,
        (n * (1.0 - e2) + altitude) * sin_lat,
    ]
}

/// One point of a waypoint mission
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    /// WGS-84 latitude (rad)
    pub latitude: f64,
    /// WGS-84 longitude (rad)
    pub longitude: f64,
    /// Height above the home point (m)
    pub rel_altitude: f64,
    /// Radius of the arc cut at this waypoint on curved missions (m)
    pub corner_radius: f32,
    /// Speed towards the next waypoint (m/s); must not be 0
    pub speed: f32,
    /// Hover time at the waypoint (s); ignored on curved missions
    pub loiter_time: Option<f32>,
    /// Gimbal pitch at the waypoint (rad); ignored on curved missions
    pub gimbal_pitch: Option<f32>,
}

impl Default for Waypoint {
    fn default() -> Self {
        Self {
            latitude: 0.0,
            longitude: 0.0,
            rel_altitude: 0.0,
            corner_radius: 0.2,
            speed: 1.0,
            loiter_time: None,
            gimbal_pitch: None,
        }
    }
}

fn nan_to_none(value: f32) -> Option<f32> {
    Some(value).filter(|v| !v.is_nan())
}

impl Waypoint {
    /// Waypoint at the given position with default speed and corner radius
    pub fn new(latitude: f64, longitude: f64, rel_altitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            rel_altitude,
            ..Self::default()
        }
    }

    pub(crate) fn encode(&self, buf: &mut BytesMut) {
        buf.put_f64(self.latitude.to_degrees());
        buf.put_f64(self.longitude.to_degrees());
        buf.put_f64(self.rel_altitude);
        buf.put_f32(self.corner_radius);
        buf.put_f32(self.speed);
        buf.put_f32(self.loiter_time.unwrap_or(f32::NAN));
        buf.put_f32(
            self.gimbal_pitch
                .map_or(f32::NAN, |pitch| f64::from(pitch).to_degrees() as f32),
        );
    }

    pub(crate) fn decode(reader: &mut FieldReader<'_>) -> Result<Self> {
        Ok(Self {
            latitude: reader.f64()?.to_radians(),
            longitude: reader.f64()?.to_radians(),
            rel_altitude: reader.f64()?,
            corner_radius: reader.f32()?,
            speed: reader.f32()?,
            loiter_time: nan_to_none(reader.f32()?),
            gimbal_pitch: nan_to_none(reader.f32()?)
                .map(|deg| f64::from(deg).to_radians() as f32),
        })
    }

    /// Horizontal distance (m) after projecting both points to the ellipsoid
    pub fn distance_2d(&self, other: &Waypoint) -> f64 {
        let a = lla_to_ecef(self.latitude, self.longitude, 0.0);
        let b = lla_to_ecef(other.latitude, other.longitude, 0.0);
        a.iter()
            .zip(b.iter())
            .map(|(p, q)| (q - p) * (q - p))
            .sum::<f64>()
            .sqrt()
    }

    /// [`distance_2d`](Self::distance_2d) combined with the relative altitude change
    pub fn distance_3d(&self, other: &Waypoint) -> f64 {
        let horizontal = self.distance_2d(other);
        let vertical = (other.rel_altitude - self.rel_altitude).abs();
        horizontal.hypot(vertical)
    }
}

impl fmt::Display for Waypoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Latitude ----: {} degrees", self.latitude.to_degrees())?;
        writeln!(f, "Longitude ---: {} degrees", self.longitude.to_degrees())?;
        writeln!(f, "RelAltitude -: {} m", self.rel_altitude)?;
        writeln!(f, "CornerRadius : {} m", self.corner_radius)?;
        writeln!(f, "Speed -------: {} m/s", self.speed)?;
        match self.loiter_time {
            Some(t) => writeln!(f, "LoiterTime --: {t} s")?,
            None => writeln!(f, "LoiterTime --: none")?,
        }
        match self.gimbal_pitch {
            Some(p) => writeln!(f, "GimbalPitch -: {} degrees", p.to_degrees()),
            None => writeln!(f, "GimbalPitch -: none"),
        }
    }
}

/// Ordered waypoints for one drone plus mission-wide flags
///
/// The vehicle's starting position is not a waypoint; it flies straight to the
/// first one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WaypointMission {
    pub waypoints: Vec<Waypoint>,
    /// Land after the final waypoint instead of hovering
    pub land_at_last_waypoint: bool,
    /// Cut corners near waypoints instead of stopping at each one
    pub curved_trajectory: bool,
}

impl WaypointMission {
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Horizontal length (m) of the mission, including the leg from `start` if given
    pub fn total_distance_2d(&self, start: Option<&Waypoint>) -> f64 {
        self.total_distance(start, Waypoint::distance_2d)
    }

    /// 3D length (m) of the mission, including the leg from `start` if given
    pub fn total_distance_3d(&self, start: Option<&Waypoint>) -> f64 {
        self.total_distance(start, Waypoint::distance_3d)
    }

    fn total_distance(&self, start: Option<&Waypoint>, leg: fn(&Waypoint, &Waypoint) -> f64) -> f64 {
        let Some(first) = self.waypoints.first() else {
            return 0.0;
        };
        let lead_in = start.map_or(0.0, |s| leg(s, first));
        lead_in
            + self
                .waypoints
                .windows(2)
                .map(|pair| leg(&pair[0], &pair[1]))
                .sum::<f64>()
    }
}
