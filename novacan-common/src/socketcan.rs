use std::sync::{
    atomic::{AtomicU8, Ordering},
    Arc,
};

use crate::{
    bus_state::BusState,
    messages::{CanError, CanId, CanMessage},
    traits::{AsyncCanReceiver, AsyncCanSender, BusStateSource, CanSendError},
    transport::TransportConfig,
};
use snafu::Snafu;
use socketcan::{CanFrame, CanSocket, EmbeddedFrame, Frame, ShouldRetry, Socket, SocketOptions};
use tokio::io::{unix::AsyncFd, Interest};

fn socketcan_id_to_novacan_id(id: socketcan::CanId) -> CanId {
    match id {
        socketcan::CanId::Standard(id) => CanId::std(id.as_raw()),
        socketcan::CanId::Extended(id) => CanId::extended(id.as_raw()),
    }
}

fn novacan_id_to_socketcan_id(id: CanId) -> Option<socketcan::CanId> {
    match id {
        CanId::Extended(id) => socketcan::ExtendedId::new(id).map(Into::into),
        CanId::Std(id) => socketcan::StandardId::new(id).map(Into::into),
    }
}

fn novacan_message_to_socket_frame(msg: &CanMessage) -> Option<socketcan::CanFrame> {
    let id = novacan_id_to_socketcan_id(msg.id())?;

    if msg.is_rtr() {
        socketcan::CanFrame::new_remote(id, msg.dlc() as usize)
    } else {
        socketcan::CanFrame::new(id, msg.data())
    }
}

/// Shared record of the controller state, updated from error frames seen by the receiver
#[derive(Debug, Default)]
struct SharedBusState(AtomicU8);

impl SharedBusState {
    fn load(&self) -> BusState {
        BusState::try_from(self.0.load(Ordering::Relaxed)).unwrap_or_default()
    }

    fn apply(&self, error: CanError, ctrl_status: u8) {
        let next = self.load().after_error(error, ctrl_status);
        self.0.store(next.into(), Ordering::Relaxed);
    }
}

/// Outcome of reading one frame from the socket
enum Received {
    Message(CanMessage),
    Error(CanError),
}

fn classify_frame(frame: CanFrame, state: &SharedBusState) -> Received {
    let id = socketcan_id_to_novacan_id(frame.can_id());

    match frame {
        CanFrame::Data(frame) => Received::Message(CanMessage::new(id, frame.data())),
        CanFrame::Remote(_) => Received::Message(CanMessage::new_rtr(id)),
        CanFrame::Error(frame) => {
            let error = CanError::from_raw(frame.error_bits());
            // Byte 1 of a controller problem frame carries the RX/TX warning and passive flags
            let ctrl_status = frame.data().get(1).copied().unwrap_or(0);
            state.apply(error, ctrl_status);
            Received::Error(error)
        }
    }
}

/// Return the first data or remote frame, folding any error frames before it into the bus state
fn next_message(
    mut frames: impl Iterator<Item = CanFrame>,
    state: &SharedBusState,
) -> Option<CanMessage> {
    frames.find_map(|frame| match classify_frame(frame, state) {
        Received::Message(msg) => Some(msg),
        Received::Error(_) => None,
    })
}

/// Errors returned by [`SocketCanReceiver`]
#[derive(Debug, Snafu)]
pub enum ReceiveError {
    /// The socket read failed
    Io {
        /// The underlying IO error
        source: socketcan::IoError,
    },
    /// The controller reported an error frame
    Can {
        /// The reported error
        source: CanError,
    },
}

/// Error returned by [`SocketCanSender`], carrying the frame which was not sent
#[derive(Debug)]
pub struct SocketCanSendError {
    msg: CanMessage,
    reason: String,
}

impl CanSendError for SocketCanSendError {
    fn into_can_message(self) -> CanMessage {
        self.msg
    }

    fn message(&self) -> String {
        self.reason.clone()
    }
}

/// Create an Async socket around a socketcan CanSocket. This is just a reimplemenation of the tokio
/// socket in the `socketcan` crate, but with support for `try_read_frame` added.
#[derive(Debug)]
struct AsyncCanSocket(AsyncFd<CanSocket>);

impl AsyncCanSocket {
    pub fn new(socket: CanSocket) -> Result<Self, std::io::Error> {
        socket.set_nonblocking(true)?;
        Ok(Self(AsyncFd::new(socket)?))
    }

    /// Attempt to read a CAN frame from the socket without blocking
    ///
    /// If no message is immediately available, a WouldBlock error is returned.
    pub fn try_read_frame(&self) -> Result<CanFrame, std::io::Error> {
        self.0.get_ref().read_frame()
    }

    /// Read a CAN frame from the socket asynchronously
    pub async fn read_frame(&self) -> Result<CanFrame, std::io::Error> {
        self.0
            .async_io(Interest::READABLE, |inner| inner.read_frame())
            .await
    }

    pub async fn write_frame(&self, frame: &CanFrame) -> Result<(), std::io::Error> {
        self.0
            .async_io(Interest::WRITABLE, |inner| inner.write_frame(frame))
            .await
    }
}

/// The receive half of a socketcan channel
#[derive(Debug, Clone)]
pub struct SocketCanReceiver {
    socket: Arc<AsyncCanSocket>,
    state: Arc<SharedBusState>,
}

impl AsyncCanReceiver for SocketCanReceiver {
    type Error = ReceiveError;

    fn try_recv(&mut self) -> Option<CanMessage> {
        let socket = &self.socket;
        next_message(
            core::iter::from_fn(|| socket.try_read_frame().ok()),
            &self.state,
        )
    }

    async fn recv(&mut self) -> Result<CanMessage, ReceiveError> {
        loop {
            match self.socket.read_frame().await {
                Ok(frame) => {
                    return match classify_frame(frame, &self.state) {
                        Received::Message(msg) => Ok(msg),
                        Received::Error(source) => Err(ReceiveError::Can { source }),
                    }
                }
                Err(e) => {
                    if !e.should_retry() {
                        return Err(ReceiveError::Io { source: e });
                    }
                }
            }
        }
    }
}

/// The transmit half of a socketcan channel
#[derive(Debug, Clone)]
pub struct SocketCanSender {
    socket: Arc<AsyncCanSocket>,
}

impl AsyncCanSender for SocketCanSender {
    type Error = SocketCanSendError;

    async fn send(&mut self, msg: CanMessage) -> Result<(), SocketCanSendError> {
        let Some(frame) = novacan_message_to_socket_frame(&msg) else {
            return Err(SocketCanSendError {
                msg,
                reason: format!("cannot build a socketcan frame for id {}", msg.id()),
            });
        };

        self.socket
            .write_frame(&frame)
            .await
            .map_err(|e| SocketCanSendError {
                msg,
                reason: e.to_string(),
            })
    }
}

/// Read-only view of the bus state tracked by a [`SocketCanReceiver`]
///
/// The state only advances while the receiver is being polled, since it is derived from the error
/// frames the receiver reads.
#[derive(Debug, Clone)]
pub struct SocketCanBusMonitor {
    state: Arc<SharedBusState>,
}

impl BusStateSource for SocketCanBusMonitor {
    fn bus_state(&self) -> BusState {
        self.state.load()
    }
}

/// Open a socketcan device and split it into sender, receiver and bus monitor objects
///
/// # Arguments
/// * `device` - The name of the socketcan device to open, e.g. "vcan0", or "can0"
/// * `config` - Channel settings. Loopback is applied to the socket; the bit rate, listen-only and
///   automatic restart must be configured on the interface itself and are only logged.
///
/// Error frames are enabled on the socket, so that the receiver can track the controller state.
#[cfg_attr(docsrs, doc(cfg(feature = "socketcan")))]
pub fn open_socketcan<S: AsRef<str>>(
    device: S,
    config: &TransportConfig,
) -> Result<(SocketCanSender, SocketCanReceiver, SocketCanBusMonitor), socketcan::IoError> {
    let device: &str = device.as_ref();
    let socket = CanSocket::open(device)?;
    socket.set_loopback(config.loopback)?;
    socket.set_error_filter_accept_all()?;

    log::info!(
        "Opened {device}: expecting bitrate {} with auto restart {}",
        config.bitrate,
        if config.auto_restart { "on" } else { "off" },
    );
    if config.silent {
        log::warn!("Listen-only mode must be enabled on {device} by the interface configuration");
    }

    let socket = Arc::new(AsyncCanSocket::new(socket)?);
    let state = Arc::new(SharedBusState::default());
    let receiver = SocketCanReceiver {
        socket: socket.clone(),
        state: state.clone(),
    };
    let sender = SocketCanSender { socket };
    let monitor = SocketCanBusMonitor { state };
    Ok((sender, receiver, monitor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use socketcan::{CanErrorFrame, StandardId};

    fn data_frame(id: u16, data: &[u8]) -> CanFrame {
        CanFrame::new(StandardId::new(id).unwrap(), data).unwrap()
    }

    fn controller_problem(ctrl_status: u8) -> CanFrame {
        CanFrame::Error(CanErrorFrame::new_error(0x04, &[0, ctrl_status]).unwrap())
    }

    #[test]
    fn test_error_frames_update_bus_state() {
        let state = SharedBusState::default();
        assert_eq!(BusState::ErrorActive, state.load());

        let received = classify_frame(controller_problem(0x20), &state);
        assert!(matches!(received, Received::Error(CanError::Controller)));
        assert_eq!(BusState::ErrorPassive, state.load());

        let bus_off = CanFrame::Error(CanErrorFrame::new_error(0x40, &[]).unwrap());
        classify_frame(bus_off, &state);
        assert_eq!(BusState::BusOff, state.load());

        let restarted = CanFrame::Error(CanErrorFrame::new_error(0x100, &[]).unwrap());
        classify_frame(restarted, &state);
        assert_eq!(BusState::ErrorActive, state.load());
    }

    #[test]
    fn test_data_frames_leave_bus_state_alone() {
        let state = SharedBusState::default();
        classify_frame(controller_problem(0x08), &state);
        let received = classify_frame(data_frame(0x5EF, b"SUPE"), &state);
        match received {
            Received::Message(msg) => {
                assert_eq!(CanId::std(0x5EF), msg.id());
                assert_eq!(b"SUPE", msg.data());
            }
            Received::Error(e) => panic!("unexpected error frame {e}"),
        }
        assert_eq!(BusState::ErrorWarning, state.load());
    }

    #[test]
    fn test_next_message_skips_error_frames() {
        let state = SharedBusState::default();
        let frames = [
            controller_problem(0x04),
            controller_problem(0x10),
            data_frame(0x5EF, &[0x43]),
            data_frame(0x5EF, &[0x44]),
        ];
        let mut frames = frames.into_iter();

        let msg = next_message(&mut frames, &state).unwrap();
        assert_eq!(&[0x43], msg.data());
        assert_eq!(BusState::ErrorPassive, state.load());
        // Only the frames up to the first data frame were consumed
        assert_eq!(1, frames.count());
    }

    #[test]
    fn test_next_message_with_only_error_frames() {
        let state = SharedBusState::default();
        let frames = [controller_problem(0x04)];
        assert_eq!(None, next_message(frames.into_iter(), &state));
        assert_eq!(BusState::ErrorWarning, state.load());
    }
}
