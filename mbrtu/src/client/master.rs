use std::time::Duration;

use crate::client::requests::read_registers::ReadRequest;
use crate::client::requests::write_multiple::WriteMultiRequest;
use crate::client::requests::write_single::WriteSingleRequest;
use crate::client::session::{Session, SessionConfig, SessionState};
use crate::common::phys::AsyncStream;
use crate::crc::CrcByteOrder;
use crate::error::{ErrorReport, RequestError};
#[cfg(feature = "serial")]
use crate::serial::SerialConfig;
use crate::types::UnitId;

/// Modbus RTU master bound to a single serial link
///
/// Every operation takes `&self`, so the master can be shared between tasks (e.g. in an `Arc`).
/// Requests on the link are strictly sequential: concurrent callers either queue or fail
/// depending on the [`BusyPolicy`](crate::client::BusyPolicy) of the session.
pub struct RtuMaster {
    session: Session,
    last_error: std::sync::Mutex<Option<ErrorReport>>,
}

impl Default for RtuMaster {
    fn default() -> Self {
        Self::new()
    }
}

impl RtuMaster {
    /// Create a closed master with the default session configuration
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    /// Create a closed master
    pub fn with_config(config: SessionConfig) -> Self {
        Self {
            session: Session::new(config),
            last_error: std::sync::Mutex::new(None),
        }
    }

    /// Open a serial port with the link parameters of the supported device family
    ///
    /// The link is always 9600 baud, 8 data bits, no parity and 1 stop bit. Use
    /// [`RtuMaster::open_with`] for other devices.
    #[cfg(feature = "serial")]
    pub async fn open(&self, path: &str, read_timeout: Duration) -> Result<(), RequestError> {
        self.open_with(SerialConfig::fixed(path, read_timeout)).await
    }

    /// Open a serial port with arbitrary link parameters
    #[cfg(feature = "serial")]
    pub async fn open_with(&self, config: SerialConfig) -> Result<(), RequestError> {
        let result = self.session.open(&config).await;
        self.record(result)
    }

    /// Use an already connected byte stream (pseudo terminal, simulated slave, ...) as the link
    pub async fn attach<S: AsyncStream + 'static>(
        &self,
        stream: S,
        read_timeout: Duration,
    ) -> Result<(), RequestError> {
        let result = self.session.attach(stream, read_timeout).await;
        self.record(result)
    }

    /// Release the link
    ///
    /// This never fails. A failure to shut down the transport is logged and recorded as the
    /// last error, the link is released regardless.
    pub async fn close(&self) -> Result<(), RequestError> {
        if let Err(err) = self.session.close().await {
            tracing::warn!("error while closing link: {}", err);
            self.set_last_error(&err);
        }
        Ok(())
    }

    /// Read `count` holding registers starting at `start` (function code `0x03`)
    pub async fn read_holding_registers(
        &self,
        slave: u8,
        start: u16,
        count: u16,
        crc_order: CrcByteOrder,
    ) -> Result<Vec<u16>, RequestError> {
        let result = match ReadRequest::new(UnitId::new(slave), start, count) {
            Ok(request) => self.session.exchange(&request, crc_order).await,
            Err(err) => Err(err.into()),
        };
        self.record(result)
    }

    /// Write a single holding register (function code `0x06`)
    ///
    /// The value comes first, ahead of the slave address and the offset. Succeeds only if
    /// the slave echoes both the offset and the value.
    pub async fn write_single_register(
        &self,
        value: u16,
        slave: u8,
        offset: u16,
        crc_order: CrcByteOrder,
    ) -> Result<(), RequestError> {
        let request = WriteSingleRequest::new(UnitId::new(slave), offset, value);
        let result = self.session.exchange(&request, crc_order).await;
        self.record(result)
    }

    /// Write a block of holding registers (function code `0x10`)
    ///
    /// Succeeds only if the slave echoes the offset and the count.
    pub async fn write_multi_registers(
        &self,
        slave: u8,
        offset: u16,
        values: &[u16],
        crc_order: CrcByteOrder,
    ) -> Result<(), RequestError> {
        let result = match WriteMultiRequest::new(UnitId::new(slave), offset, values.to_vec()) {
            Ok(request) => self.session.exchange(&request, crc_order).await,
            Err(err) => Err(err.into()),
        };
        self.record(result)
    }

    /// Write a block of holding registers without waiting for the acknowledgment
    ///
    /// The request is framed exactly like [`RtuMaster::write_multi_registers`], but success
    /// only means the frame was written to the link. It cannot tell a slave that applied
    /// the values from one that dropped them. Use it for broadcast writes (slave `0`) or
    /// devices that never answer.
    pub async fn nr_write_multi_registers(
        &self,
        slave: u8,
        offset: u16,
        values: &[u16],
        crc_order: CrcByteOrder,
    ) -> Result<(), RequestError> {
        let result = match WriteMultiRequest::new(UnitId::new(slave), offset, values.to_vec()) {
            Ok(request) => self.session.send(&request, crc_order).await,
            Err(err) => Err(err.into()),
        };
        self.record(result)
    }

    /// Diagnostic report of the most recent failure, if any
    pub fn last_error(&self) -> Option<ErrorReport> {
        match self.last_error.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Current lifecycle state of the session
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Engine configuration of the session
    pub fn config(&self) -> SessionConfig {
        self.session.config()
    }

    fn record<T>(&self, result: Result<T, RequestError>) -> Result<T, RequestError> {
        if let Err(err) = &result {
            tracing::warn!("request failed: {}", err);
            self.set_last_error(err);
        }
        result
    }

    fn set_last_error(&self, err: &RequestError) {
        let report = ErrorReport::from(err);
        match self.last_error.lock() {
            Ok(mut guard) => *guard = Some(report),
            Err(poisoned) => *poisoned.into_inner() = Some(report),
        }
    }
}
