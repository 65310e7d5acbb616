pub mod mailbox;
pub mod response;
pub mod transceiver;

pub use mailbox::Mailbox;
pub use response::{ResponsePayload, RobotState};
pub use transceiver::Transceiver;
