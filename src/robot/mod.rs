pub mod client;

pub use client::RobotClient;
