//! The outbound frame value
//!
//! A [`Telegram`] is one named command ready for the bus. Telegrams are built on demand by the
//! [`Catalog`](crate::Catalog), encoded into a [`CanMessage`] for transmission, and then dropped.

use novacan_common::messages::{CanId, CanMessage, MAX_DATA_LENGTH};
use snafu::Snafu;

/// Error returned when a received frame cannot be represented as a [`Telegram`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Snafu)]
pub enum DecodeError {
    /// Telegrams only use the standard identifier space
    #[snafu(display("Frame uses extended identifier {id}"))]
    ExtendedId {
        /// The received identifier
        id: CanId,
    },
    /// Remote frames carry no payload to decode
    #[snafu(display("Remote request frame on {id}"))]
    RemoteFrame {
        /// The received identifier
        id: CanId,
    },
}

/// An immutable description of one standard-identifier CAN frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Telegram {
    name: &'static str,
    id: CanId,
    payload: [u8; MAX_DATA_LENGTH],
    len: u8,
}

impl Telegram {
    /// Name given to telegrams decoded from received frames
    pub const RECEIVED: &'static str = "received";

    /// Create a telegram
    ///
    /// The identifier is masked to 11 bits. The payload length is checked at compile time.
    pub const fn new<const N: usize>(name: &'static str, id: u16, payload: [u8; N]) -> Self {
        const { assert!(N <= MAX_DATA_LENGTH, "CAN payload is limited to 8 bytes") };
        let mut buf = [0; MAX_DATA_LENGTH];
        let mut i = 0;
        while i < N {
            buf[i] = payload[i];
            i += 1;
        }
        Self {
            name,
            id: CanId::std(id),
            payload: buf,
            len: N as u8,
        }
    }

    /// The human readable command name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The destination identifier
    pub fn id(&self) -> CanId {
        self.id
    }

    /// The payload bytes
    pub fn payload(&self) -> &[u8] {
        &self.payload[..self.len as usize]
    }

    /// Encode into a standard data frame
    pub fn encode(&self) -> CanMessage {
        CanMessage::new(self.id, self.payload())
    }

    /// Decode a received data frame
    ///
    /// Received frames are not matched against any known command, so the result is named
    /// [`Telegram::RECEIVED`].
    pub fn decode(msg: &CanMessage) -> Result<Self, DecodeError> {
        let CanId::Std(id) = msg.id() else {
            return ExtendedIdSnafu { id: msg.id() }.fail();
        };
        if msg.is_rtr() {
            return RemoteFrameSnafu { id: msg.id() }.fail();
        }
        let mut payload = [0; MAX_DATA_LENGTH];
        payload[..msg.data().len()].copy_from_slice(msg.data());
        Ok(Self {
            name: Self::RECEIVED,
            id: CanId::Std(id),
            payload,
            len: msg.data().len() as u8,
        })
    }
}

impl From<&Telegram> for CanMessage {
    fn from(telegram: &Telegram) -> Self {
        telegram.encode()
    }
}

impl TryFrom<CanMessage> for Telegram {
    type Error = DecodeError;

    fn try_from(msg: CanMessage) -> Result<Self, Self::Error> {
        Telegram::decode(&msg)
    }
}
