use crate::common::buffer::ReadBuffer;
use crate::common::cursor::WriteCursor;
use crate::common::function::FunctionCode;
use crate::common::traits::Serialize;
use crate::constants::limits;
use crate::crc::{self, CrcByteOrder};
use crate::decode::FrameDecodeLevel;
use crate::error::{AduParseError, FrameParseError, InvalidRequest, RequestError};
use crate::exception::ExceptionCode;
use crate::types::UnitId;

pub(crate) mod constants {
    pub(crate) const ADDRESS_LENGTH: usize = 1;
    pub(crate) const FUNCTION_CODE_LENGTH: usize = 1;
    pub(crate) const HEADER_LENGTH: usize = ADDRESS_LENGTH + FUNCTION_CODE_LENGTH;
    pub(crate) const CRC_LENGTH: usize = 2;
    pub(crate) const MIN_FRAME_LENGTH: usize = HEADER_LENGTH + CRC_LENGTH;
}

/// A complete RTU frame: `[address][function code][payload][crc]`
///
/// The CRC always covers the address, the function code and the payload. A frame whose
/// CRC does not match is rejected by [`ModbusFrame::parse`], it is never repaired.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModbusFrame {
    /// address of the slave the frame is sent to or received from
    pub slave_address: UnitId,
    /// raw function code, the high bit is set in exception responses
    pub function_code: u8,
    /// bytes between the function code and the CRC (at most 252)
    pub payload: Vec<u8>,
    /// CRC-16 over address, function code and payload
    pub crc: u16,
    /// order in which the CRC bytes are transmitted
    pub crc_order: CrcByteOrder,
}

impl ModbusFrame {
    /// Build a frame, computing its CRC
    pub fn new(
        slave_address: UnitId,
        function_code: u8,
        payload: Vec<u8>,
        crc_order: CrcByteOrder,
    ) -> Result<Self, RequestError> {
        check_payload_length(payload.len())?;
        let crc = crc::compute_parts(&[&[slave_address.value, function_code], &payload]);
        Ok(Self {
            slave_address,
            function_code,
            payload,
            crc,
            crc_order,
        })
    }

    /// Render the frame as transmitted on the wire
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(constants::MIN_FRAME_LENGTH + self.payload.len());
        bytes.push(self.slave_address.value);
        bytes.push(self.function_code);
        bytes.extend_from_slice(&self.payload);
        bytes.extend_from_slice(&self.crc_order.render(self.crc));
        bytes
    }

    /// Parse a complete frame, validating its length and CRC
    pub fn parse(bytes: &[u8], crc_order: CrcByteOrder) -> Result<Self, RequestError> {
        if bytes.len() > limits::MAX_FRAME_LENGTH {
            return Err(FrameParseError::FrameTooLong(bytes.len(), limits::MAX_FRAME_LENGTH).into());
        }
        let (body, crc) = check_crc(bytes, crc_order)?;
        Ok(Self {
            slave_address: UnitId::new(body[0]),
            function_code: body[1],
            payload: body[constants::HEADER_LENGTH..].to_vec(),
            crc,
            crc_order,
        })
    }

    /// True if the high bit of the function code is set
    pub fn is_exception(&self) -> bool {
        self.function_code & 0x80 != 0
    }
}

/// Encode a frame: address, function code, payload and the CRC in the requested byte order
///
/// Fails with [`InvalidRequest::PayloadTooLarge`] if the payload exceeds 252 bytes.
pub fn encode(
    slave_address: u8,
    function_code: u8,
    payload: &[u8],
    crc_order: CrcByteOrder,
) -> Result<Vec<u8>, RequestError> {
    check_payload_length(payload.len())?;
    let mut bytes = Vec::with_capacity(constants::MIN_FRAME_LENGTH + payload.len());
    bytes.push(slave_address);
    bytes.push(function_code);
    bytes.extend_from_slice(payload);
    let crc = crc::compute(&bytes);
    bytes.extend_from_slice(&crc_order.render(crc));
    Ok(bytes)
}

/// Validate a response frame against the request and return its payload
///
/// The checks run in a fixed order: length, CRC, address, exception, function code.
pub fn decode(
    bytes: &[u8],
    expected_address: u8,
    expected_function_code: u8,
    crc_order: CrcByteOrder,
) -> Result<&[u8], RequestError> {
    let (body, _) = check_crc(bytes, crc_order)?;

    let address = body[0];
    if address != expected_address {
        return Err(AduParseError::AddressMismatch {
            expected: expected_address,
            received: address,
        }
        .into());
    }

    let function_code = body[1];
    let payload = &body[constants::HEADER_LENGTH..];

    if function_code == expected_function_code | 0x80 {
        return match payload.first() {
            Some(code) => Err(RequestError::Exception(ExceptionCode::from(*code))),
            None => Err(FrameParseError::FrameTooShort(bytes.len()).into()),
        };
    }

    if function_code != expected_function_code {
        return Err(AduParseError::FunctionCodeMismatch {
            expected: expected_function_code,
            received: function_code,
        }
        .into());
    }

    Ok(payload)
}

fn check_payload_length(length: usize) -> Result<(), RequestError> {
    if length > limits::MAX_PAYLOAD_LENGTH {
        return Err(InvalidRequest::PayloadTooLarge(length, limits::MAX_PAYLOAD_LENGTH).into());
    }
    Ok(())
}

// returns the frame without its CRC and the received CRC
fn check_crc(bytes: &[u8], crc_order: CrcByteOrder) -> Result<(&[u8], u16), RequestError> {
    if bytes.len() < constants::MIN_FRAME_LENGTH {
        return Err(FrameParseError::FrameTooShort(bytes.len()).into());
    }

    let (body, trailer) = bytes.split_at(bytes.len() - constants::CRC_LENGTH);
    let received = crc_order.read([trailer[0], trailer[1]]);
    let expected = crc::compute(body);

    if received != expected {
        return Err(FrameParseError::CrcMismatch { received, expected }.into());
    }

    Ok((body, received))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LengthMode {
    /// The length of the body after the function code is always the same
    Fixed(usize),
    /// You need to read X more bytes. The last byte contains the number of extra bytes to read after that
    Offset(usize),
}

/// Delimits the response to a single request in a stream of partial reads
pub(crate) struct ResponseParser {
    function: FunctionCode,
}

impl ResponseParser {
    pub(crate) fn new(function: FunctionCode) -> Self {
        Self { function }
    }

    // the received function code decides the length, matching it to the request is left to decode
    fn length_mode(&self, function_code: u8) -> Result<LengthMode, RequestError> {
        if function_code & 0x80 != 0 {
            return Ok(LengthMode::Fixed(1));
        }

        match FunctionCode::get(function_code) {
            Some(FunctionCode::ReadHoldingRegisters) => Ok(LengthMode::Offset(1)),
            Some(FunctionCode::WriteSingleRegister) => Ok(LengthMode::Fixed(4)),
            Some(FunctionCode::WriteMultipleRegisters) => Ok(LengthMode::Fixed(4)),
            // a frame that can't be delimited can't be validated either
            None => Err(AduParseError::FunctionCodeMismatch {
                expected: self.function.get_value(),
                received: function_code,
            }
            .into()),
        }
    }

    /// Length of the complete frame once it is fully buffered, `None` if more bytes are required
    pub(crate) fn frame_length(&self, buffer: &ReadBuffer) -> Result<Option<usize>, RequestError> {
        if buffer.len() < constants::HEADER_LENGTH {
            return Ok(None);
        }

        let body_length = match self.length_mode(buffer.peek_at(1)?)? {
            LengthMode::Fixed(length) => length,
            LengthMode::Offset(offset) => {
                if buffer.len() < constants::HEADER_LENGTH + offset {
                    return Ok(None);
                }
                let extra_bytes_to_read =
                    buffer.peek_at(constants::HEADER_LENGTH + offset - 1)? as usize;
                offset + extra_bytes_to_read
            }
        };

        let frame_length = constants::HEADER_LENGTH + body_length + constants::CRC_LENGTH;
        if frame_length > limits::MAX_FRAME_LENGTH {
            return Err(
                FrameParseError::FrameTooLong(frame_length, limits::MAX_FRAME_LENGTH).into(),
            );
        }

        if buffer.len() < frame_length {
            return Ok(None);
        }

        Ok(Some(frame_length))
    }
}

/// Formats requests into a fixed buffer sized for the largest RTU frame
pub(crate) struct FrameWriter {
    buffer: [u8; limits::MAX_FRAME_LENGTH],
}

impl FrameWriter {
    pub(crate) fn new() -> Self {
        Self {
            buffer: [0; limits::MAX_FRAME_LENGTH],
        }
    }

    pub(crate) fn format_request(
        &mut self,
        unit_id: UnitId,
        function: FunctionCode,
        body: &dyn Serialize,
        crc_order: CrcByteOrder,
        decode_level: FrameDecodeLevel,
    ) -> Result<&[u8], RequestError> {
        let end_pdu_body = {
            // reserve room for the CRC
            let (frame, _) = self
                .buffer
                .split_at_mut(limits::MAX_FRAME_LENGTH - constants::CRC_LENGTH);
            let mut cursor = WriteCursor::new(frame);
            cursor.write_u8(unit_id.value)?;
            cursor.write_u8(function.get_value())?;
            body.serialize(&mut cursor)?;
            cursor.position()
        };

        let crc = crc::compute(&self.buffer[..end_pdu_body]);
        let end_frame = end_pdu_body + constants::CRC_LENGTH;
        self.buffer[end_pdu_body..end_frame].copy_from_slice(&crc_order.render(crc));

        if decode_level.enabled() {
            tracing::info!(
                "RTU TX - {}",
                RtuDisplay::new(
                    decode_level,
                    unit_id,
                    &self.buffer[constants::HEADER_LENGTH..end_pdu_body],
                    crc,
                    crc_order
                )
            );
        }

        Ok(&self.buffer[..end_frame])
    }
}

pub(crate) struct RtuDisplay<'a> {
    level: FrameDecodeLevel,
    destination: UnitId,
    payload: &'a [u8],
    crc: u16,
    crc_order: CrcByteOrder,
}

impl<'a> RtuDisplay<'a> {
    pub(crate) fn new(
        level: FrameDecodeLevel,
        destination: UnitId,
        payload: &'a [u8],
        crc: u16,
        crc_order: CrcByteOrder,
    ) -> Self {
        RtuDisplay {
            level,
            destination,
            payload,
            crc,
            crc_order,
        }
    }
}

impl std::fmt::Display for RtuDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "dest: {} crc: {:#06X} ({}) (payload len = {})",
            self.destination,
            self.crc,
            self.crc_order,
            self.payload.len(),
        )?;
        if self.level.payload_enabled() {
            crate::common::phys::format_bytes(f, self.payload)?;
        }
        Ok(())
    }
}
