use crate::client::requests::RequestDetails;
use crate::common::cursor::WriteCursor;
use crate::common::function::FunctionCode;
use crate::common::traits::{Loggable, Serialize};
use crate::constants::limits;
use crate::decode::AppDecodeLevel;
use crate::error::{AduParseError, InvalidRequest, RequestError};
use crate::types::{AddressRange, Indexed, UnitId};

use scursor::ReadCursor;

/// Request to read a contiguous block of holding registers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadRequest {
    slave_address: UnitId,
    range: AddressRange,
}

impl ReadRequest {
    /// Validate and create a request, the count must be within `1..=125`
    pub fn new(
        slave_address: UnitId,
        start_offset: u16,
        register_count: u16,
    ) -> Result<Self, InvalidRequest> {
        let range = AddressRange::try_from(start_offset, register_count)?
            .limited_count(limits::MAX_READ_REGISTERS_COUNT)?;
        Ok(Self {
            slave_address,
            range,
        })
    }

    /// address of the slave
    pub fn slave_address(&self) -> UnitId {
        self.slave_address
    }

    /// registers requested
    pub fn range(&self) -> AddressRange {
        self.range
    }
}

impl Serialize for ReadRequest {
    fn serialize(&self, cursor: &mut WriteCursor) -> Result<(), RequestError> {
        cursor.write_u16_be(self.range.start)?;
        cursor.write_u16_be(self.range.count)?;
        Ok(())
    }
}

impl Loggable for ReadRequest {
    fn log(&self, level: AppDecodeLevel, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if level.data_headers() {
            write!(f, "{}", self.range)?;
        }
        Ok(())
    }
}

impl RequestDetails for ReadRequest {
    type Response = Vec<u16>;

    fn function(&self) -> FunctionCode {
        FunctionCode::ReadHoldingRegisters
    }

    fn unit_id(&self) -> UnitId {
        self.slave_address
    }

    fn parse_response(
        &self,
        cursor: &mut ReadCursor,
        decode: AppDecodeLevel,
    ) -> Result<Self::Response, RequestError> {
        let expected = 2 * (self.range.count as usize);
        let byte_count = cursor.read_u8()? as usize;
        if byte_count != expected {
            return Err(AduParseError::RequestByteCountMismatch(expected, byte_count).into());
        }

        let mut values = Vec::with_capacity(self.range.count as usize);
        for _ in 0..self.range.count {
            values.push(cursor.read_u16_be()?);
        }
        cursor.expect_empty()?;

        if decode.enabled() {
            tracing::info!(
                "PDU RX - {} {}",
                self.function(),
                RegistersDisplay::new(decode, self.range, &values)
            );
        }

        Ok(values)
    }
}

struct RegistersDisplay<'a> {
    level: AppDecodeLevel,
    range: AddressRange,
    values: &'a [u16],
}

impl<'a> RegistersDisplay<'a> {
    fn new(level: AppDecodeLevel, range: AddressRange, values: &'a [u16]) -> Self {
        Self {
            level,
            range,
            values,
        }
    }
}

impl std::fmt::Display for RegistersDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.level.data_headers() {
            write!(f, "{}", self.range)?;
        }

        if self.level.data_values() {
            for (index, value) in self.range.iter().zip(self.values) {
                write!(f, "\n{}", Indexed::new(index, *value))?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(count: u16) -> ReadRequest {
        ReadRequest::new(UnitId::new(1), 0x10, count).unwrap()
    }

    #[test]
    fn count_must_be_between_1_and_125() {
        assert_eq!(
            ReadRequest::new(UnitId::new(1), 0, 0),
            Err(InvalidRequest::CountOfZero)
        );
        assert_eq!(
            ReadRequest::new(UnitId::new(1), 0, 126),
            Err(InvalidRequest::CountTooBigForType(126, 125))
        );
        assert!(ReadRequest::new(UnitId::new(1), 0, 125).is_ok());
        assert_eq!(
            ReadRequest::new(UnitId::new(1), 0xFFFF, 2),
            Err(InvalidRequest::AddressOverflow(0xFFFF, 2))
        );
    }

    #[test]
    fn serializes_start_and_count_big_endian() {
        let mut buffer = [0u8; 4];
        let mut cursor = WriteCursor::new(&mut buffer);
        request(3).serialize(&mut cursor).unwrap();
        assert_eq!(buffer, [0x00, 0x10, 0x00, 0x03]);
    }

    #[test]
    fn parses_register_values() {
        let mut cursor = ReadCursor::new(&[0x06, 0x12, 0x34, 0x56, 0x78, 0x23, 0x45]);
        let values = request(3)
            .parse_response(&mut cursor, AppDecodeLevel::DataValues)
            .unwrap();
        assert_eq!(values, vec![0x1234, 0x5678, 0x2345]);
    }

    #[test]
    fn rejects_byte_count_that_does_not_match_request() {
        let mut cursor = ReadCursor::new(&[0x04, 0x12, 0x34, 0x56, 0x78]);
        assert_eq!(
            request(3).parse_response(&mut cursor, AppDecodeLevel::Nothing),
            Err(RequestError::BadResponse(
                AduParseError::RequestByteCountMismatch(6, 4)
            ))
        );
    }

    #[test]
    fn rejects_truncated_and_trailing_data() {
        let mut cursor = ReadCursor::new(&[0x04, 0x12, 0x34, 0x56]);
        assert_eq!(
            request(2).parse_response(&mut cursor, AppDecodeLevel::Nothing),
            Err(RequestError::BadResponse(AduParseError::InsufficientBytes))
        );

        let mut cursor = ReadCursor::new(&[0x02, 0x12, 0x34, 0x56]);
        assert_eq!(
            request(1).parse_response(&mut cursor, AppDecodeLevel::Nothing),
            Err(RequestError::BadResponse(AduParseError::TrailingBytes(1)))
        );
    }
}
