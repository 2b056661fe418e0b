//! An async implementation of a [Modbus](http://modbus.org/) RTU master
//! using [Tokio](https://docs.rs/tokio) and Rust's `async/await` syntax.
//!
//! # Features
//!
//! * One-request-in-flight sessions with a configurable busy policy
//! * Panic-free parsing of partial reads
//! * CRC byte order selectable per request for mixed-vendor buses
//! * Protocol decoding and hex dumps through [tracing](https://docs.rs/tracing)
//!
//! # Supported modes
//!
//! * RTU master over a serial port
//! * RTU master over any byte stream implementing [`AsyncStream`]
//!
//! # Supported Functions
//!
//! * Read Holding Registers
//! * Write Single Register
//! * Write Multiple Registers (acknowledged and fire-and-forget)
//!
//! # Example
//!
//! ```no_run
//! use mbrtu::client::RtuMaster;
//! use mbrtu::CrcByteOrder;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let master = RtuMaster::new();
//!     master.open("/dev/ttyUSB0", Duration::from_millis(500)).await?;
//!
//!     let values = master
//!         .read_holding_registers(1, 0, 3, CrcByteOrder::LittleEndian)
//!         .await?;
//!     println!("{values:?}");
//!
//!     master.close().await?;
//!     Ok(())
//! }
//! ```

/// Modbus CRC-16 engine
pub mod crc;
/// Public constant values related to the Modbus specification
pub mod constants;
/// Client (master) API
pub mod client;

mod decode;
mod error;
mod exception;
mod serial;
mod types;

// internal modules
mod common;

pub use crate::common::phys::AsyncStream;
pub use crate::crc::CrcByteOrder;
pub use crate::decode::*;
pub use crate::error::*;
pub use crate::exception::*;
pub use crate::serial::frame::{decode, encode, ModbusFrame};
pub use crate::serial::{DataBits, Parity, SerialConfig, StopBits};
pub use crate::types::*;
