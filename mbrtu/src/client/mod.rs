pub use crate::client::master::RtuMaster;
pub use crate::client::requests::read_registers::ReadRequest;
pub use crate::client::requests::write_multiple::WriteMultiRequest;
pub use crate::client::requests::write_single::WriteSingleRequest;
pub use crate::client::session::{BusyPolicy, SessionConfig, SessionState};

/// API used to make requests to slaves on the link
mod master;

pub(crate) mod requests;
pub(crate) mod session;
