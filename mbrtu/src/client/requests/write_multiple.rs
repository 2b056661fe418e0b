use crate::client::requests::RequestDetails;
use crate::common::cursor::WriteCursor;
use crate::common::function::FunctionCode;
use crate::common::traits::{Loggable, Serialize};
use crate::constants::limits;
use crate::decode::AppDecodeLevel;
use crate::error::{AduParseError, InvalidRequest, RequestError};
use crate::types::{AddressRange, Indexed, UnitId};

use scursor::ReadCursor;

/// Request to write a contiguous block of holding registers
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteMultiRequest {
    slave_address: UnitId,
    range: AddressRange,
    values: Vec<u16>,
}

impl WriteMultiRequest {
    /// Validate and create a request, the number of values must be within `1..=123`
    pub fn new(
        slave_address: UnitId,
        offset: u16,
        values: Vec<u16>,
    ) -> Result<Self, InvalidRequest> {
        if values.is_empty() {
            return Err(InvalidRequest::CountOfZero);
        }
        if values.len() > limits::MAX_WRITE_REGISTERS_COUNT as usize {
            return Err(InvalidRequest::CountTooBigForType(
                values.len(),
                limits::MAX_WRITE_REGISTERS_COUNT,
            ));
        }
        let range = AddressRange::try_from(offset, values.len() as u16)?;
        Ok(Self {
            slave_address,
            range,
            values,
        })
    }

    /// address of the slave
    pub fn slave_address(&self) -> UnitId {
        self.slave_address
    }

    /// registers written
    pub fn range(&self) -> AddressRange {
        self.range
    }

    /// values in register order
    pub fn values(&self) -> &[u16] {
        &self.values
    }
}

impl Serialize for WriteMultiRequest {
    fn serialize(&self, cursor: &mut WriteCursor) -> Result<(), RequestError> {
        cursor.write_u16_be(self.range.start)?;
        cursor.write_u16_be(self.range.count)?;
        // at most 123 values, the byte count always fits
        cursor.write_u8((2 * self.values.len()) as u8)?;
        for value in &self.values {
            cursor.write_u16_be(*value)?;
        }
        Ok(())
    }
}

impl Loggable for WriteMultiRequest {
    fn log(&self, level: AppDecodeLevel, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if level.data_headers() {
            write!(f, "{}", self.range)?;
        }

        if level.data_values() {
            for (index, value) in self.range.iter().zip(&self.values) {
                write!(f, "\n{}", Indexed::new(index, *value))?;
            }
        }

        Ok(())
    }
}

impl RequestDetails for WriteMultiRequest {
    type Response = ();

    fn function(&self) -> FunctionCode {
        FunctionCode::WriteMultipleRegisters
    }

    fn unit_id(&self) -> UnitId {
        self.slave_address
    }

    fn parse_response(
        &self,
        cursor: &mut ReadCursor,
        decode: AppDecodeLevel,
    ) -> Result<Self::Response, RequestError> {
        let start = cursor.read_u16_be()?;
        let count = cursor.read_u16_be()?;
        cursor.expect_empty()?;
        if start != self.range.start || count != self.range.count {
            return Err(AduParseError::ReplyEchoMismatch.into());
        }

        if decode.enabled() {
            tracing::info!("PDU RX - {} {}", self.function(), self.range);
        }

        Ok(())
    }
}
