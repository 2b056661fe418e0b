use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use scursor::ReadCursor;
use tokio::time::Instant;

use crate::client::requests::RequestDetails;
use crate::common::buffer::ReadBuffer;
use crate::common::phys::{AsyncStream, PhysLayer};
use crate::common::traits::LoggableDisplay;
use crate::constants::limits;
use crate::crc::CrcByteOrder;
use crate::decode::DecodeLevel;
use crate::error::RequestError;
use crate::serial::frame::{FrameWriter, ResponseParser, RtuDisplay};
#[cfg(feature = "serial")]
use crate::serial::SerialConfig;

/// Observable lifecycle state of a session
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    /// no link is held
    Closed = 0,
    /// link is held and idle
    Open = 1,
    /// an exchange is in flight
    Busy = 2,
    /// a transport error occurred, the session must be closed and re-opened
    Faulted = 3,
}

impl SessionState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => SessionState::Open,
            2 => SessionState::Busy,
            3 => SessionState::Faulted,
            _ => SessionState::Closed,
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Closed => f.write_str("closed"),
            SessionState::Open => f.write_str("open"),
            SessionState::Busy => f.write_str("busy"),
            SessionState::Faulted => f.write_str("faulted"),
        }
    }
}

/// What a request does when another request is already in flight
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum BusyPolicy {
    /// queue behind the request in flight
    #[default]
    Wait,
    /// fail immediately with [`RequestError::SessionBusy`]
    FailFast,
}

/// Engine behavior of a session, independent of the link parameters
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionConfig {
    /// behavior of concurrent requests
    pub busy_policy: BusyPolicy,
    /// protocol decoding written to the log
    pub decode: DecodeLevel,
}

impl SessionConfig {
    /// Change the busy policy
    pub fn with_busy_policy(mut self, busy_policy: BusyPolicy) -> Self {
        self.busy_policy = busy_policy;
        self
    }

    /// Change the decode level
    pub fn with_decode(mut self, decode: DecodeLevel) -> Self {
        self.decode = decode;
        self
    }
}

struct Link {
    phys: Option<PhysLayer>,
    read_timeout: Duration,
    writer: FrameWriter,
    buffer: ReadBuffer,
    // a reply may still be on its way after a timeout or an unacknowledged write
    resync: bool,
}

/// Owns at most one physical layer and runs one exchange at a time on it
pub(crate) struct Session {
    state: AtomicU8,
    config: SessionConfig,
    link: tokio::sync::Mutex<Link>,
}

// restores the state when an exchange ends, a dropped exchange leaves the line state unknown
struct BusyGuard<'a> {
    state: &'a AtomicU8,
    next: SessionState,
}

impl<'a> BusyGuard<'a> {
    fn new(state: &'a AtomicU8) -> Self {
        state.store(SessionState::Busy as u8, Ordering::SeqCst);
        Self {
            state,
            next: SessionState::Faulted,
        }
    }

    fn finish(mut self, next: SessionState) {
        self.next = next;
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        if self.next == SessionState::Faulted {
            tracing::warn!("session faulted");
        }
        self.state.store(self.next as u8, Ordering::SeqCst);
    }
}

impl Session {
    pub(crate) fn new(config: SessionConfig) -> Self {
        Self {
            state: AtomicU8::new(SessionState::Closed as u8),
            config,
            link: tokio::sync::Mutex::new(Link {
                phys: None,
                read_timeout: Duration::ZERO,
                writer: FrameWriter::new(),
                buffer: ReadBuffer::new(limits::MAX_FRAME_LENGTH),
                resync: false,
            }),
        }
    }

    pub(crate) fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub(crate) fn config(&self) -> SessionConfig {
        self.config
    }

    /// Open the serial port described by the configuration
    #[cfg(feature = "serial")]
    pub(crate) async fn open(&self, config: &SerialConfig) -> Result<(), RequestError> {
        let mut link = self.link.lock().await;
        self.check_closed()?;
        let stream = crate::serial::open(config)?;
        link.connect(PhysLayer::new_serial(stream), config.read_timeout);
        self.set_state(SessionState::Open);
        tracing::info!("opened serial port {}", config);
        Ok(())
    }

    /// Use an already connected stream as the link
    pub(crate) async fn attach<S: AsyncStream + 'static>(
        &self,
        stream: S,
        read_timeout: Duration,
    ) -> Result<(), RequestError> {
        let mut link = self.link.lock().await;
        self.check_closed()?;
        link.connect(PhysLayer::new_stream(stream), read_timeout);
        self.set_state(SessionState::Open);
        tracing::info!("attached stream");
        Ok(())
    }

    /// Release the link, closing a closed session is a no-op
    pub(crate) async fn close(&self) -> Result<(), RequestError> {
        let mut link = self.link.lock().await;
        let phys = link.phys.take();
        link.buffer.clear();
        self.set_state(SessionState::Closed);
        match phys {
            Some(mut phys) => {
                tracing::info!("closing link");
                phys.close().await?;
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Write a request and wait for the matching response
    pub(crate) async fn exchange<R: RequestDetails>(
        &self,
        request: &R,
        crc_order: CrcByteOrder,
    ) -> Result<R::Response, RequestError> {
        let mut link = self.acquire().await?;
        self.check_usable()?;
        let guard = BusyGuard::new(&self.state);
        let result = link.exchange(request, crc_order, self.config.decode).await;
        guard.finish(Self::state_after(&result));
        result
    }

    /// Write a request without waiting for any response
    pub(crate) async fn send<R: RequestDetails>(
        &self,
        request: &R,
        crc_order: CrcByteOrder,
    ) -> Result<(), RequestError> {
        let mut link = self.acquire().await?;
        self.check_usable()?;
        let guard = BusyGuard::new(&self.state);
        let result = link
            .send_unacknowledged(request, crc_order, self.config.decode)
            .await;
        guard.finish(Self::state_after(&result));
        result
    }

    async fn acquire(&self) -> Result<tokio::sync::MutexGuard<'_, Link>, RequestError> {
        match self.config.busy_policy {
            BusyPolicy::Wait => Ok(self.link.lock().await),
            BusyPolicy::FailFast => self
                .link
                .try_lock()
                .map_err(|_| RequestError::SessionBusy),
        }
    }

    fn state_after<T>(result: &Result<T, RequestError>) -> SessionState {
        match result {
            Err(err) if err.is_fatal() => SessionState::Faulted,
            _ => SessionState::Open,
        }
    }

    fn check_closed(&self) -> Result<(), RequestError> {
        match self.state() {
            SessionState::Closed => Ok(()),
            _ => Err(RequestError::AlreadyOpen),
        }
    }

    fn check_usable(&self) -> Result<(), RequestError> {
        match self.state() {
            SessionState::Closed => Err(RequestError::NoConnection),
            SessionState::Faulted => Err(RequestError::SessionFaulted),
            SessionState::Open | SessionState::Busy => Ok(()),
        }
    }

    fn set_state(&self, state: SessionState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }
}

impl Link {
    fn connect(&mut self, phys: PhysLayer, read_timeout: Duration) {
        self.phys = Some(phys);
        self.read_timeout = read_timeout;
        self.buffer.clear();
        self.resync = false;
    }

    async fn discard_stale_input(&mut self, decode: DecodeLevel) -> Result<(), RequestError> {
        let phys = self.phys.as_mut().ok_or(RequestError::NoConnection)?;
        let quiet = if self.resync {
            self.read_timeout
        } else {
            phys.silence()
        };
        let count = phys.drain(quiet, decode.physical).await?;
        if count > 0 {
            tracing::warn!("discarded {} stale bytes", count);
        }
        self.resync = false;
        Ok(())
    }

    async fn send_unacknowledged<R: RequestDetails>(
        &mut self,
        request: &R,
        crc_order: CrcByteOrder,
        decode: DecodeLevel,
    ) -> Result<(), RequestError> {
        self.send(request, crc_order, decode).await?;
        // an addressed slave may still answer
        if !request.unit_id().is_broadcast() {
            self.resync = true;
        }
        Ok(())
    }

    async fn send<R: RequestDetails>(
        &mut self,
        request: &R,
        crc_order: CrcByteOrder,
        decode: DecodeLevel,
    ) -> Result<(), RequestError> {
        let phys = self.phys.as_mut().ok_or(RequestError::NoConnection)?;

        if decode.app.enabled() {
            tracing::info!(
                "PDU TX - {} {}",
                request.function(),
                LoggableDisplay::new(request, decode.app)
            );
        }

        let bytes = self.writer.format_request(
            request.unit_id(),
            request.function(),
            request,
            crc_order,
            decode.frame,
        )?;

        phys.write(bytes, decode.physical).await?;
        Ok(())
    }

    async fn exchange<R: RequestDetails>(
        &mut self,
        request: &R,
        crc_order: CrcByteOrder,
        decode: DecodeLevel,
    ) -> Result<R::Response, RequestError> {
        // anything received outside of an exchange is stale
        self.buffer.clear();
        self.discard_stale_input(decode).await?;

        self.send(request, crc_order, decode).await?;

        let phys = self.phys.as_mut().ok_or(RequestError::NoConnection)?;
        let deadline = Instant::now() + self.read_timeout;
        let parser = ResponseParser::new(request.function());

        // accumulate partial reads until the parser can delimit a whole frame
        let length = loop {
            if let Some(length) = parser.frame_length(&self.buffer)? {
                break length;
            }

            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => {
                    self.resync = true;
                    return Err(RequestError::ResponseTimeout);
                }
                count = self.buffer.read_some(phys, decode.physical) => {
                    count?;
                }
            }
        };

        let frame = self.buffer.read(length)?;
        let payload = crate::serial::frame::decode(
            frame,
            request.unit_id().value,
            request.function().get_value(),
            crc_order,
        )?;

        if decode.frame.enabled() {
            let crc = crc_order.read([frame[length - 2], frame[length - 1]]);
            tracing::info!(
                "RTU RX - {}",
                RtuDisplay::new(decode.frame, request.unit_id(), payload, crc, crc_order)
            );
        }

        request.parse_response(&mut ReadCursor::new(payload), decode.app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::requests::read_registers::ReadRequest;
    use crate::client::requests::write_single::WriteSingleRequest;
    use crate::decode::{AppDecodeLevel, FrameDecodeLevel, PhysDecodeLevel};
    use crate::error::{AduParseError, ErrorKind, FrameParseError};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use crate::exception::ExceptionCode;
    use crate::types::UnitId;

    const TIMEOUT: Duration = Duration::from_secs(1);

    fn verbose() -> SessionConfig {
        SessionConfig::default().with_decode(DecodeLevel::new(
            AppDecodeLevel::DataValues,
            FrameDecodeLevel::Payload,
            PhysDecodeLevel::Data,
        ))
    }

    fn read_request() -> ReadRequest {
        ReadRequest::new(UnitId::new(0x2A), 0x10, 3).unwrap()
    }

    const READ_REQUEST: &[u8] = &[0x2A, 0x03, 0x00, 0x10, 0x00, 0x03, 0x02, 0x15];

    const READ_RESPONSE: &[u8] = &[
        0x2A, 0x03, 0x06, 0x12, 0x34, 0x56, 0x78, 0x23, 0x45, 0x30, 0x60,
    ];

    #[tokio::test]
    async fn reads_registers_delivered_in_fragments() {
        let session = Session::new(verbose());
        let mock = tokio_test::io::Builder::new()
            .write(READ_REQUEST)
            .read(&READ_RESPONSE[..1])
            .read(&READ_RESPONSE[1..3])
            .read(&READ_RESPONSE[3..])
            .build();
        session.attach(mock, TIMEOUT).await.unwrap();

        let values = session
            .exchange(&read_request(), CrcByteOrder::LittleEndian)
            .await
            .unwrap();
        assert_eq!(values, vec![0x1234, 0x5678, 0x2345]);
        assert_eq!(session.state(), SessionState::Open);
    }

    #[tokio::test]
    async fn protocol_errors_leave_session_open() {
        let session = Session::new(SessionConfig::default());
        let mut corrupt = READ_RESPONSE.to_vec();
        corrupt[4] ^= 0x01;
        let mock = tokio_test::io::Builder::new()
            .write(READ_REQUEST)
            .read(&corrupt)
            .write(READ_REQUEST)
            .read(&[0x2A, 0x83, 0x02, 0xB0, 0xF9])
            .build();
        session.attach(mock, TIMEOUT).await.unwrap();

        let err = session
            .exchange(&read_request(), CrcByteOrder::LittleEndian)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CrcMismatch);
        assert_eq!(session.state(), SessionState::Open);

        assert_eq!(
            session
                .exchange(&read_request(), CrcByteOrder::LittleEndian)
                .await,
            Err(RequestError::Exception(ExceptionCode::IllegalDataAddress))
        );
        assert_eq!(session.state(), SessionState::Open);
    }

    #[tokio::test]
    async fn write_error_faults_the_session() {
        let session = Session::new(SessionConfig::default());
        let mock = tokio_test::io::Builder::new()
            .write_error(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
            .build();
        session.attach(mock, TIMEOUT).await.unwrap();

        assert_eq!(
            session
                .exchange(&read_request(), CrcByteOrder::LittleEndian)
                .await,
            Err(RequestError::Io(std::io::ErrorKind::BrokenPipe))
        );
        assert_eq!(session.state(), SessionState::Faulted);
        assert_eq!(
            session
                .exchange(&read_request(), CrcByteOrder::LittleEndian)
                .await,
            Err(RequestError::SessionFaulted)
        );
    }

    #[tokio::test]
    async fn end_of_stream_faults_the_session() {
        let session = Session::new(SessionConfig::default());
        let mock = tokio_test::io::Builder::new().write(READ_REQUEST).build();
        session.attach(mock, TIMEOUT).await.unwrap();

        assert_eq!(
            session
                .exchange(&read_request(), CrcByteOrder::LittleEndian)
                .await,
            Err(RequestError::Io(std::io::ErrorKind::UnexpectedEof))
        );
        assert_eq!(session.state(), SessionState::Faulted);
    }

    #[tokio::test(start_paused = true)]
    async fn silent_slave_times_out_and_session_stays_open() {
        let session = Session::new(SessionConfig::default());
        let (client, mut server) = tokio::io::duplex(64);
        session.attach(client, TIMEOUT).await.unwrap();

        let start = Instant::now();
        assert_eq!(
            session
                .exchange(&read_request(), CrcByteOrder::LittleEndian)
                .await,
            Err(RequestError::ResponseTimeout)
        );
        assert!(start.elapsed() >= TIMEOUT);
        assert_eq!(session.state(), SessionState::Open);

        // the request still reached the line
        let mut request = [0u8; 8];
        tokio::io::AsyncReadExt::read_exact(&mut server, &mut request)
            .await
            .unwrap();
        assert_eq!(request, READ_REQUEST);
    }

    #[tokio::test(start_paused = true)]
    async fn partial_response_times_out() {
        let session = Session::new(SessionConfig::default());
        let (client, mut server) = tokio::io::duplex(64);
        session.attach(client, TIMEOUT).await.unwrap();

        // the slave goes silent in the middle of a frame
        let slave = tokio::spawn(async move {
            let mut request = [0u8; 8];
            server.read_exact(&mut request).await.unwrap();
            server.write_all(&READ_RESPONSE[..5]).await.unwrap();
            server
        });

        assert_eq!(
            session
                .exchange(&read_request(), CrcByteOrder::LittleEndian)
                .await,
            Err(RequestError::ResponseTimeout)
        );
        assert_eq!(session.state(), SessionState::Open);
        drop(slave.await.unwrap());
    }

    #[tokio::test]
    async fn bytes_received_between_exchanges_are_discarded() {
        let session = Session::new(SessionConfig::default());
        let (client, mut server) = tokio::io::duplex(64);
        session.attach(client, TIMEOUT).await.unwrap();
        // leftover of a frame nobody asked for
        server.write_all(&READ_RESPONSE[3..]).await.unwrap();

        let slave = tokio::spawn(async move {
            let mut request = [0u8; 8];
            server.read_exact(&mut request).await.unwrap();
            assert_eq!(request, READ_REQUEST);
            server.write_all(READ_RESPONSE).await.unwrap();
            server
        });

        assert_eq!(
            session
                .exchange(&read_request(), CrcByteOrder::LittleEndian)
                .await,
            Ok(vec![0x1234, 0x5678, 0x2345])
        );
        drop(slave.await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn late_reply_is_not_taken_for_the_next_response() {
        let session = Session::new(SessionConfig::default());
        let (client, mut server) = tokio::io::duplex(64);
        session.attach(client, TIMEOUT).await.unwrap();

        let reply = |values: &[u8]| {
            crate::serial::frame::encode(0x2A, 0x03, values, CrcByteOrder::LittleEndian).unwrap()
        };
        let first_reply = reply(&[0x04, 0x00, 0x0A, 0x00, 0x0B]);
        let second_reply = reply(&[0x04, 0x00, 0x0C, 0x00, 0x0D]);

        let slave = tokio::spawn(async move {
            let mut request = [0u8; 8];
            // the first answer arrives after the master gave up
            server.read_exact(&mut request).await.unwrap();
            tokio::time::sleep(Duration::from_millis(1500)).await;
            server.write_all(&first_reply).await.unwrap();
            server.read_exact(&mut request).await.unwrap();
            server.write_all(&second_reply).await.unwrap();
            server
        });

        let first = ReadRequest::new(UnitId::new(0x2A), 0, 2).unwrap();
        let second = ReadRequest::new(UnitId::new(0x2A), 2, 2).unwrap();
        assert_eq!(
            session.exchange(&first, CrcByteOrder::LittleEndian).await,
            Err(RequestError::ResponseTimeout)
        );
        assert_eq!(
            session.exchange(&second, CrcByteOrder::LittleEndian).await,
            Ok(vec![12, 13])
        );
        drop(slave.await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn echo_of_unacknowledged_write_is_discarded() {
        let session = Session::new(SessionConfig::default());
        let (client, mut server) = tokio::io::duplex(64);
        session.attach(client, TIMEOUT).await.unwrap();

        let slave = tokio::spawn(async move {
            let mut request = [0u8; 8];
            server.read_exact(&mut request).await.unwrap();
            tokio::time::sleep(Duration::from_millis(300)).await;
            server.write_all(&request).await.unwrap();
            server.read_exact(&mut request).await.unwrap();
            server.write_all(READ_RESPONSE).await.unwrap();
            server
        });

        let write = WriteSingleRequest::new(UnitId::new(0x2A), 0x10, 0x1234);
        assert_eq!(session.send(&write, CrcByteOrder::BigEndian).await, Ok(()));
        assert_eq!(
            session
                .exchange(&read_request(), CrcByteOrder::LittleEndian)
                .await,
            Ok(vec![0x1234, 0x5678, 0x2345])
        );
        drop(slave.await.unwrap());
    }

    #[tokio::test]
    async fn exception_for_another_function_is_a_mismatch() {
        let session = Session::new(SessionConfig::default());
        let reply =
            crate::serial::frame::encode(0x2A, 0x86, &[0x02], CrcByteOrder::LittleEndian).unwrap();
        let mock = tokio_test::io::Builder::new()
            .write(READ_REQUEST)
            .read(&reply)
            .build();
        session.attach(mock, TIMEOUT).await.unwrap();

        assert_eq!(
            session
                .exchange(&read_request(), CrcByteOrder::LittleEndian)
                .await,
            Err(RequestError::BadResponse(
                AduParseError::FunctionCodeMismatch {
                    expected: 0x03,
                    received: 0x86
                }
            ))
        );
        assert_eq!(session.state(), SessionState::Open);
    }

    #[tokio::test]
    async fn short_reply_for_another_function_is_a_mismatch() {
        let session = Session::new(SessionConfig::default());
        let reply =
            crate::serial::frame::encode(0x2A, 0x03, &[0x02, 0x00, 0x01], CrcByteOrder::BigEndian)
                .unwrap();
        assert_eq!(reply.len(), 7);
        let mock = tokio_test::io::Builder::new()
            .write(&[0x2A, 0x06, 0x00, 0x10, 0x12, 0x34, 0x63, 0x83])
            .read(&reply)
            .build();
        session.attach(mock, TIMEOUT).await.unwrap();

        let request = WriteSingleRequest::new(UnitId::new(0x2A), 0x10, 0x1234);
        assert_eq!(
            session.exchange(&request, CrcByteOrder::BigEndian).await,
            Err(RequestError::BadResponse(
                AduParseError::FunctionCodeMismatch {
                    expected: 0x06,
                    received: 0x03
                }
            ))
        );
        assert_eq!(session.state(), SessionState::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_exchange_faults_the_session() {
        let session = Session::new(SessionConfig::default());
        let (client, _server) = tokio::io::duplex(64);
        session.attach(client, TIMEOUT).await.unwrap();

        let result = tokio::time::timeout(
            Duration::from_millis(10),
            session.exchange(&read_request(), CrcByteOrder::LittleEndian),
        )
        .await;
        assert!(result.is_err());
        assert_eq!(session.state(), SessionState::Faulted);
    }

    #[tokio::test]
    async fn fail_fast_rejects_concurrent_request() {
        let session =
            Session::new(SessionConfig::default().with_busy_policy(BusyPolicy::FailFast));
        let (client, _server) = tokio::io::duplex(64);
        session.attach(client, TIMEOUT).await.unwrap();

        let _in_flight = session.link.lock().await;
        assert_eq!(
            session
                .exchange(&read_request(), CrcByteOrder::LittleEndian)
                .await,
            Err(RequestError::SessionBusy)
        );
    }

    #[tokio::test]
    async fn fire_and_forget_returns_after_write() {
        let session = Session::new(SessionConfig::default());
        let mock = tokio_test::io::Builder::new()
            .write(&[0x2A, 0x06, 0x00, 0x10, 0x12, 0x34, 0x63, 0x83])
            .build();
        session.attach(mock, TIMEOUT).await.unwrap();

        let request = WriteSingleRequest::new(UnitId::new(0x2A), 0x10, 0x1234);
        assert_eq!(session.send(&request, CrcByteOrder::BigEndian).await, Ok(()));
        assert_eq!(session.state(), SessionState::Open);
    }

    #[tokio::test]
    async fn lifecycle_violations() {
        let session = Session::new(SessionConfig::default());
        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(
            session
                .exchange(&read_request(), CrcByteOrder::LittleEndian)
                .await,
            Err(RequestError::NoConnection)
        );

        // closing a closed session is a no-op
        assert_eq!(session.close().await, Ok(()));

        let (client, _server) = tokio::io::duplex(64);
        session.attach(client, TIMEOUT).await.unwrap();
        let (other, _other_server) = tokio::io::duplex(64);
        assert_eq!(
            session.attach(other, TIMEOUT).await,
            Err(RequestError::AlreadyOpen)
        );

        assert_eq!(session.close().await, Ok(()));
        assert_eq!(session.close().await, Ok(()));
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn oversized_response_is_a_frame_error() {
        let session = Session::new(SessionConfig::default());
        let mock = tokio_test::io::Builder::new()
            .write(READ_REQUEST)
            .read(&[0x2A, 0x03, 0xFF])
            .build();
        session.attach(mock, TIMEOUT).await.unwrap();

        assert_eq!(
            session
                .exchange(&read_request(), CrcByteOrder::LittleEndian)
                .await,
            Err(RequestError::BadFrame(FrameParseError::FrameTooLong(260, 256)))
        );
        assert_eq!(session.state(), SessionState::Open);
    }
}
