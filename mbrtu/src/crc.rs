//! Modbus CRC-16 (reflected polynomial `0xA001`, initial value `0xFFFF`)
//!
//! The checksum is the same for both wire renderings. [`CrcByteOrder`] only decides
//! which of its two bytes is transmitted first.

use crate::error::InvalidRequest;

/// precomputes the CRC table as a constant!
const CRC: crc::Crc<u16> = crc::Crc::<u16>::new(&crc::CRC_16_MODBUS);

const POLYNOMIAL: u16 = 0xA001;

/// Byte order of the two CRC bytes at the end of a frame
///
/// Canonical Modbus transmits the low byte first. Some devices on mixed-vendor buses
/// expect the high byte first, so the order is chosen for every request.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum CrcByteOrder {
    /// high byte first (`>`)
    BigEndian,
    /// low byte first (`<`), canonical Modbus
    #[default]
    LittleEndian,
}

impl CrcByteOrder {
    /// Render a CRC into the two bytes transmitted on the wire
    pub fn render(self, crc: u16) -> [u8; 2] {
        match self {
            CrcByteOrder::BigEndian => crc.to_be_bytes(),
            CrcByteOrder::LittleEndian => crc.to_le_bytes(),
        }
    }

    /// Read a CRC from the two bytes received on the wire
    pub fn read(self, bytes: [u8; 2]) -> u16 {
        match self {
            CrcByteOrder::BigEndian => u16::from_be_bytes(bytes),
            CrcByteOrder::LittleEndian => u16::from_le_bytes(bytes),
        }
    }
}

impl std::str::FromStr for CrcByteOrder {
    type Err = InvalidRequest;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            ">" | "be" | "big" => Ok(CrcByteOrder::BigEndian),
            "<" | "le" | "little" => Ok(CrcByteOrder::LittleEndian),
            _ => Err(InvalidRequest::UnknownCrcOrder),
        }
    }
}

impl std::fmt::Display for CrcByteOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CrcByteOrder::BigEndian => f.write_str("big endian"),
            CrcByteOrder::LittleEndian => f.write_str("little endian"),
        }
    }
}

/// Compute the CRC over a sequence of bytes using a precomputed table
pub fn compute(bytes: &[u8]) -> u16 {
    CRC.checksum(bytes)
}

/// Compute the CRC one bit at a time
///
/// Reference implementation of [`compute`], it always yields the same value.
pub fn compute_bitwise(bytes: &[u8]) -> u16 {
    bytes.iter().fold(0xFFFF, |crc, byte| {
        (0..8).fold(crc ^ u16::from(*byte), |crc, _| {
            if crc & 0x0001 != 0 {
                (crc >> 1) ^ POLYNOMIAL
            } else {
                crc >> 1
            }
        })
    })
}

/// Render a CRC in the requested byte order
pub fn render(crc: u16, order: CrcByteOrder) -> [u8; 2] {
    order.render(crc)
}

/// Read a CRC rendered in the requested byte order
pub fn read(bytes: [u8; 2], order: CrcByteOrder) -> u16 {
    order.read(bytes)
}

/// Compute the CRC over a frame that is split into several slices
pub(crate) fn compute_parts(parts: &[&[u8]]) -> u16 {
    let mut digest = CRC.digest();
    for part in parts {
        digest.update(part);
    }
    digest.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_check_value() {
        assert_eq!(compute(b"123456789"), 0x4B37);
        assert_eq!(compute_bitwise(b"123456789"), 0x4B37);
    }

    #[test]
    fn matches_known_read_request() {
        let crc = compute(&[0x01, 0x03, 0x00, 0x00, 0x00, 0x03]);
        assert_eq!(crc, 0xCB05);
        assert_eq!(render(crc, CrcByteOrder::LittleEndian), [0x05, 0xCB]);
        assert_eq!(render(crc, CrcByteOrder::BigEndian), [0xCB, 0x05]);

        let crc = compute(&[0x01, 0x03, 0x00, 0x00, 0x00, 0x01]);
        assert_eq!(render(crc, CrcByteOrder::LittleEndian), [0x84, 0x0A]);
    }

    #[test]
    fn empty_input_is_initial_value() {
        assert_eq!(compute(&[]), 0xFFFF);
        assert_eq!(compute_bitwise(&[]), 0xFFFF);
    }

    #[test]
    fn table_and_bitwise_agree() {
        let mut data = Vec::new();
        for i in 0..=u8::MAX {
            data.push(i.wrapping_mul(31).wrapping_add(7));
            assert_eq!(compute(&data), compute_bitwise(&data));
            assert_eq!(compute(&[i]), compute_bitwise(&[i]));
        }
    }

    #[test]
    fn split_digest_matches_single_pass() {
        let frame = [0x2A, 0x03, 0x06, 0x12, 0x34, 0x56, 0x78, 0x23, 0x45];
        assert_eq!(
            compute_parts(&[&frame[..2], &frame[2..5], &frame[5..]]),
            compute(&frame)
        );
    }

    #[test]
    fn read_inverts_render_for_both_orders() {
        for crc in [0x0000, 0x00FF, 0xFF00, 0x1234, 0xCB05, 0xFFFF] {
            for order in [CrcByteOrder::BigEndian, CrcByteOrder::LittleEndian] {
                assert_eq!(read(render(crc, order), order), crc);
            }
        }
    }

    #[test]
    fn parses_order_tokens() {
        assert_eq!(">".parse(), Ok(CrcByteOrder::BigEndian));
        assert_eq!("<".parse(), Ok(CrcByteOrder::LittleEndian));
        assert_eq!("BE".parse(), Ok(CrcByteOrder::BigEndian));
        assert_eq!("little".parse(), Ok(CrcByteOrder::LittleEndian));
        assert_eq!(
            "=".parse::<CrcByteOrder>(),
            Err(InvalidRequest::UnknownCrcOrder)
        );
        assert_eq!(CrcByteOrder::default(), CrcByteOrder::LittleEndian);
    }
}
