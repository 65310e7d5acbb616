//! Synchronous HTTP client for the Droplet-on-Demand robot controller.
//!
//! The controller exposes its whole command surface as HTTP GET paths
//! (`/DoD/get/...`, `/DoD/do/...`, `/DoD/Connect`). This crate provides:
//!
//! - a blocking request/response [`Transceiver`](protocol::Transceiver)
//!   with a single-slot response mailbox,
//! - a JSON-file-backed [`CapabilityStore`](capability::CapabilityStore)
//!   of known endpoints,
//! - a startup discovery pass that asks the robot for the currently-legal
//!   argument values of each actuating endpoint,
//! - and [`RobotClient`], a thin one-method-per-action facade.
//!
//! Nothing here performs I/O at load time; clients are built through
//! explicit constructors.

pub mod capability;
pub mod error;
pub mod protocol;
pub mod robot;

pub use capability::{CapabilityStore, CapabilityTable};
pub use error::{ClientError, ClientResult};
pub use protocol::{ResponsePayload, RobotState};
pub use robot::RobotClient;
