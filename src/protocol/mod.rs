//! # Protocol Layer
//!
//! The DroneComms message catalog and message routing.
//!
//! ## Components
//! - **Message**: `WireMessage` contract, `MessageKind` PID table and the `Message` enum
//! - **Telemetry**: Core (PID 0) and extended (PID 1) vehicle state
//! - **Imagery**: Raw (PID 2) and JPEG-compressed (PID 5) frames
//! - **Status**: Acknowledgments (PID 3) and free-text messages (PID 4)
//! - **Command**: Virtual stick, waypoint mission, camera and emergency commands (PIDs 252-255)
//! - **Waypoint**: Waypoints, missions and their geometry
//! - **Frame**: RGB raster used by the imagery messages
//! - **Dispatcher**: Handler routing per message kind
//!
//! ## Units
//! Commands hold angles in radians and send degrees. Core telemetry angles are
//! sent exactly as stored.

pub mod command;
pub mod dispatcher;
pub mod frame;
pub mod imagery;
pub mod message;
pub mod status;
pub mod telemetry;
pub mod waypoint;
