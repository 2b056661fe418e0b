use crate::client::requests::RequestDetails;
use crate::common::cursor::WriteCursor;
use crate::common::function::FunctionCode;
use crate::common::traits::{Loggable, Serialize};
use crate::decode::AppDecodeLevel;
use crate::error::{AduParseError, RequestError};
use crate::types::{Indexed, UnitId};

use scursor::ReadCursor;

/// Request to write a single holding register
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WriteSingleRequest {
    slave_address: UnitId,
    register: Indexed<u16>,
}

impl WriteSingleRequest {
    /// Create a request, any offset and value are valid
    pub fn new(slave_address: UnitId, offset: u16, value: u16) -> Self {
        Self {
            slave_address,
            register: Indexed::new(offset, value),
        }
    }

    /// address of the slave
    pub fn slave_address(&self) -> UnitId {
        self.slave_address
    }

    /// register offset and value
    pub fn register(&self) -> Indexed<u16> {
        self.register
    }
}

impl Serialize for WriteSingleRequest {
    fn serialize(&self, cursor: &mut WriteCursor) -> Result<(), RequestError> {
        cursor.write_u16_be(self.register.index)?;
        cursor.write_u16_be(self.register.value)?;
        Ok(())
    }
}

impl Loggable for WriteSingleRequest {
    fn log(&self, level: AppDecodeLevel, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if level.data_values() {
            write!(f, "{}", self.register)?;
        } else if level.data_headers() {
            write!(f, "idx: {:#06X}", self.register.index)?;
        }
        Ok(())
    }
}

impl RequestDetails for WriteSingleRequest {
    type Response = ();

    fn function(&self) -> FunctionCode {
        FunctionCode::WriteSingleRegister
    }

    fn unit_id(&self) -> UnitId {
        self.slave_address
    }

    fn parse_response(
        &self,
        cursor: &mut ReadCursor,
        decode: AppDecodeLevel,
    ) -> Result<Self::Response, RequestError> {
        let echo = Indexed::new(cursor.read_u16_be()?, cursor.read_u16_be()?);
        cursor.expect_empty()?;
        if echo != self.register {
            return Err(AduParseError::ReplyEchoMismatch.into());
        }

        if decode.enabled() {
            tracing::info!("PDU RX - {} {}", self.function(), echo);
        }

        Ok(())
    }
}
