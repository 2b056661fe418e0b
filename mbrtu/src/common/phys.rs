use crate::decode::PhysDecodeLevel;
use std::fmt::Write;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::Duration;

/// Any byte stream that can stand in for a serial port, e.g. a pseudo terminal or a simulated slave
pub trait AsyncStream: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T> AsyncStream for T where T: AsyncRead + AsyncWrite + Send + Unpin {}

pub(crate) struct PhysLayer {
    layer: PhysLayerImpl,
}

// encapsulates all possible physical layers as an enum
enum PhysLayerImpl {
    #[cfg(feature = "serial")]
    Serial(
        tokio_serial::SerialStream,
        Duration,
        Option<tokio::time::Instant>,
    ),
    Stream(Box<dyn AsyncStream>),
}

impl std::fmt::Debug for PhysLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match &self.layer {
            #[cfg(feature = "serial")]
            PhysLayerImpl::Serial(_, _, _) => f.write_str("Serial"),
            PhysLayerImpl::Stream(_) => f.write_str("Stream"),
        }
    }
}

impl PhysLayer {
    #[cfg(feature = "serial")]
    pub(crate) fn new_serial(stream: tokio_serial::SerialStream) -> Self {
        use tokio_serial::SerialPort;

        let delay = match stream.baud_rate() {
            Ok(baud_rate) => inter_character_delay(baud_rate),
            Err(_) => {
                tracing::warn!(
                    "unable to determine the baud rate, defaulting to {} μs",
                    MIN_DELAY.as_micros()
                );
                MIN_DELAY
            }
        };
        Self {
            layer: PhysLayerImpl::Serial(stream, delay, None),
        }
    }

    pub(crate) fn new_stream<S: AsyncStream + 'static>(stream: S) -> Self {
        Self {
            layer: PhysLayerImpl::Stream(Box::new(stream)),
        }
    }

    pub(crate) async fn read(
        &mut self,
        buffer: &mut [u8],
        decode_level: PhysDecodeLevel,
    ) -> Result<usize, std::io::Error> {
        let length = match &mut self.layer {
            #[cfg(feature = "serial")]
            PhysLayerImpl::Serial(x, _, last_activity) => {
                let length = x.read(buffer).await?;
                *last_activity = Some(tokio::time::Instant::now());
                length
            }
            PhysLayerImpl::Stream(x) => x.read(buffer).await?,
        };

        if decode_level.enabled() {
            if let Some(x) = buffer.get(0..length) {
                tracing::info!("PHYS RX - {}", PhysDisplay::new(decode_level, x))
            }
        }

        Ok(length)
    }

    pub(crate) async fn write(
        &mut self,
        data: &[u8],
        decode_level: PhysDecodeLevel,
    ) -> Result<(), std::io::Error> {
        if decode_level.enabled() {
            tracing::info!("PHYS TX - {}", PhysDisplay::new(decode_level, data));
        }

        match &mut self.layer {
            #[cfg(feature = "serial")]
            PhysLayerImpl::Serial(x, inter_char_delay, last_activity) => {
                // Respect inter-frame silence
                if let Some(last_activity) = last_activity {
                    tokio::time::sleep_until(*last_activity + *inter_char_delay).await;
                }
                x.write_all(data).await?;
                x.flush().await?;
                *last_activity = Some(tokio::time::Instant::now());
                Ok(())
            }
            PhysLayerImpl::Stream(x) => {
                x.write_all(data).await?;
                x.flush().await
            }
        }
    }

    /// Silent interval that delimits frames on this layer
    pub(crate) fn silence(&self) -> Duration {
        match &self.layer {
            #[cfg(feature = "serial")]
            PhysLayerImpl::Serial(_, inter_char_delay, _) => *inter_char_delay,
            PhysLayerImpl::Stream(_) => MIN_DELAY,
        }
    }

    /// Discard received bytes until the line stays quiet for `quiet`
    ///
    /// Returns the number of bytes thrown away. End of stream is an error.
    pub(crate) async fn drain(
        &mut self,
        quiet: Duration,
        decode_level: PhysDecodeLevel,
    ) -> Result<usize, std::io::Error> {
        self.clear_input()?;

        let mut scratch = [0u8; 64];
        let mut discarded = 0;
        loop {
            match tokio::time::timeout(quiet, self.read(&mut scratch, decode_level)).await {
                Err(_) => return Ok(discarded),
                Ok(Ok(0)) => return Err(std::io::ErrorKind::UnexpectedEof.into()),
                Ok(Ok(count)) => discarded += count,
                Ok(Err(err)) => return Err(err),
            }
        }
    }

    fn clear_input(&self) -> Result<(), std::io::Error> {
        match &self.layer {
            #[cfg(feature = "serial")]
            PhysLayerImpl::Serial(x, _, _) => {
                use tokio_serial::SerialPort;
                x.clear(tokio_serial::ClearBuffer::Input)
                    .map_err(std::io::Error::from)
            }
            PhysLayerImpl::Stream(_) => Ok(()),
        }
    }

    pub(crate) async fn close(&mut self) -> Result<(), std::io::Error> {
        match &mut self.layer {
            #[cfg(feature = "serial")]
            PhysLayerImpl::Serial(x, _, _) => x.shutdown().await,
            PhysLayerImpl::Stream(x) => x.shutdown().await,
        }
    }
}

// If the baud rate is higher than this threshold, then the delay is fixed
const MAX_BAUD_RATE: u32 = 19200;
const MIN_DELAY: Duration = Duration::from_micros(1750);

/// Silent interval of 3.5 characters required between RTU frames
pub(crate) fn inter_character_delay(baud_rate: u32) -> Duration {
    // Modbus RTU uses 11-bit characters (1 start, 8 data, 1 parity or stop, 1 stop)
    const NUM_BITS_IN_CHAR: u64 = 11;

    if baud_rate == 0 || baud_rate > MAX_BAUD_RATE {
        return MIN_DELAY;
    }

    let character_time = Duration::from_secs(NUM_BITS_IN_CHAR) / baud_rate;
    35 * character_time / 10 // multiply by 3.5
}

pub(crate) struct PhysDisplay<'a> {
    level: PhysDecodeLevel,
    data: &'a [u8],
}

impl<'a> PhysDisplay<'a> {
    pub(crate) fn new(level: PhysDecodeLevel, data: &'a [u8]) -> Self {
        PhysDisplay { level, data }
    }
}

impl std::fmt::Display for PhysDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} bytes", self.data.len())?;
        if self.level.data_enabled() {
            format_bytes(f, self.data)?;
        }
        Ok(())
    }
}

const BYTES_PER_DECODE_LINE: usize = 18;

pub(crate) fn format_bytes(f: &mut std::fmt::Formatter, bytes: &[u8]) -> std::fmt::Result {
    for chunk in bytes.chunks(BYTES_PER_DECODE_LINE) {
        writeln!(f)?;
        let mut first = true;
        for byte in chunk {
            if !first {
                f.write_char(' ')?;
            }
            first = false;
            write!(f, "{byte:02X?}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_is_three_and_a_half_characters_at_low_baud() {
        // 11 bits at 9600 baud is 1145 μs (truncated to whole ns)
        let delay = inter_character_delay(9600);
        assert!(delay > Duration::from_micros(4010));
        assert!(delay < Duration::from_micros(4012));
        assert!(inter_character_delay(19200) > MIN_DELAY);
    }

    #[test]
    fn delay_is_fixed_above_19200_baud() {
        assert_eq!(inter_character_delay(38400), MIN_DELAY);
        assert_eq!(inter_character_delay(115200), MIN_DELAY);
        assert_eq!(inter_character_delay(0), MIN_DELAY);
    }

    #[test]
    fn hex_dump_wraps_lines() {
        let data: Vec<u8> = (0..20).collect();
        let text = PhysDisplay::new(PhysDecodeLevel::Data, &data).to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "20 bytes");
        assert_eq!(lines[1].split(' ').count(), 18);
        assert_eq!(lines[2], "12 13");

        let text = PhysDisplay::new(PhysDecodeLevel::Length, &data).to_string();
        assert_eq!(text, "20 bytes");
    }

    #[tokio::test]
    async fn stream_write_and_read_pass_through() {
        let mock = tokio_test::io::Builder::new()
            .write(&[0x01, 0x02])
            .read(&[0x03])
            .build();
        let mut phys = PhysLayer::new_stream(mock);
        phys.write(&[0x01, 0x02], PhysDecodeLevel::Data).await.unwrap();
        let mut buffer = [0u8; 4];
        assert_eq!(phys.read(&mut buffer, PhysDecodeLevel::Data).await.unwrap(), 1);
        assert_eq!(buffer[0], 0x03);
    }

    #[tokio::test(start_paused = true)]
    async fn drain_discards_until_the_line_is_quiet() {
        let (client, mut server) = tokio::io::duplex(64);
        let mut phys = PhysLayer::new_stream(client);

        let late = tokio::spawn(async move {
            server.write_all(&[0x01, 0x02, 0x03]).await.unwrap();
            tokio::time::sleep(Duration::from_millis(500)).await;
            server.write_all(&[0x04, 0x05]).await.unwrap();
            server
        });

        let quiet = Duration::from_secs(1);
        assert_eq!(phys.drain(quiet, PhysDecodeLevel::Nothing).await.unwrap(), 5);
        let _server = late.await.unwrap();
        let silence = phys.silence();
        assert_eq!(phys.drain(silence, PhysDecodeLevel::Nothing).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn drain_reports_end_of_stream() {
        let mut phys = PhysLayer::new_stream(tokio_test::io::Builder::new().build());
        assert_eq!(
            phys.drain(MIN_DELAY, PhysDecodeLevel::Nothing)
                .await
                .unwrap_err()
                .kind(),
            std::io::ErrorKind::UnexpectedEof
        );
    }
}
