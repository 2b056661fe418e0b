/// Limits on the size of requests and frames
pub mod limits {
    /// Maximum count allowed in a read holding registers request
    pub const MAX_READ_REGISTERS_COUNT: u16 = 0x007D;
    /// Maximum count allowed in a `write multiple registers` request
    pub const MAX_WRITE_REGISTERS_COUNT: u16 = 0x007B;
    /// Maximum number of bytes between the function code and the CRC of an RTU frame
    pub const MAX_PAYLOAD_LENGTH: usize = 252;
    /// Maximum length of an RTU frame including address and CRC
    pub const MAX_FRAME_LENGTH: usize = 256;
    /// Maximum length in bytes of a diagnostic message in an [`ErrorReport`](crate::ErrorReport)
    pub const MAX_ERROR_MESSAGE_LENGTH: usize = 1024;
}

/// Fixed link parameters of the supported device family
pub mod link {
    /// Baud rate used by [`RtuMaster::open`](crate::client::RtuMaster::open)
    pub const DEFAULT_BAUD_RATE: u32 = 9600;
}

/// Raw values of the exception codes defined in the Modbus specification
pub mod exceptions {
    /// Illegal function
    pub const ILLEGAL_FUNCTION: u8 = 0x01;
    /// Illegal data address
    pub const ILLEGAL_DATA_ADDRESS: u8 = 0x02;
    /// Illegal data value
    pub const ILLEGAL_DATA_VALUE: u8 = 0x03;
    /// Slave device failure
    pub const SLAVE_DEVICE_FAILURE: u8 = 0x04;
    /// Acknowledge
    pub const ACKNOWLEDGE: u8 = 0x05;
    /// Slave device busy
    pub const SLAVE_DEVICE_BUSY: u8 = 0x06;
    /// Memory parity error
    pub const MEMORY_PARITY_ERROR: u8 = 0x08;
    /// Gateway path unavailable
    pub const GATEWAY_PATH_UNAVAILABLE: u8 = 0x0A;
    /// Gateway target device failed to respond
    pub const GATEWAY_TARGET_DEVICE_FAILED_TO_RESPOND: u8 = 0x0B;
}
