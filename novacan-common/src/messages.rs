//! Raw CAN message types
//!
//! These are the frames exchanged with a transport adapter. They carry no CANopen meaning of their
//! own; see [`crate::sdo`] and [`crate::nmt`] for how payloads are laid out.

use snafu::Snafu;

use crate::constants::cob_ids;

/// The maximum payload of a classic CAN frame
pub const MAX_DATA_LENGTH: usize = 8;

/// The largest value which fits in a standard (11-bit) identifier
pub const MAX_STD_ID: u16 = 0x7FF;

/// The largest value which fits in an extended (29-bit) identifier
pub const MAX_EXTENDED_ID: u32 = 0x1FFF_FFFF;

/// The COB ID used for NMT commands
pub const NMT_CMD_ID: CanId = CanId::Std(cob_ids::NMT);

/// A CAN identifier, either standard or extended
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CanId {
    /// An 11-bit standard identifier
    Std(u16),
    /// A 29-bit extended identifier
    Extended(u32),
}

impl CanId {
    /// Create a standard ID, masking the value to 11 bits
    pub const fn std(id: u16) -> Self {
        CanId::Std(id & MAX_STD_ID)
    }

    /// Create an extended ID, masking the value to 29 bits
    pub const fn extended(id: u32) -> Self {
        CanId::Extended(id & MAX_EXTENDED_ID)
    }

    /// Get the raw numeric value of the ID
    pub const fn raw(&self) -> u32 {
        match self {
            CanId::Std(id) => *id as u32,
            CanId::Extended(id) => *id,
        }
    }

    /// Return true if this is an extended (29-bit) identifier
    pub const fn is_extended(&self) -> bool {
        matches!(self, CanId::Extended(_))
    }
}

impl core::fmt::Display for CanId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:#x}", self.raw())
    }
}

/// Error returned when a frame cannot be built from the supplied data
#[derive(Clone, Copy, Debug, PartialEq, Eq, Snafu)]
#[snafu(display("CAN payload of {len} bytes exceeds {MAX_DATA_LENGTH}"))]
pub struct InvalidFrameError {
    /// The offending payload length
    pub len: usize,
}

/// A classic CAN frame
///
/// Data is stored inline, so messages are `Copy` and can be queued without allocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CanMessage {
    /// The frame identifier
    pub id: CanId,
    data: [u8; MAX_DATA_LENGTH],
    dlc: u8,
    rtr: bool,
}

impl CanMessage {
    /// Create a new data frame
    ///
    /// Data beyond [`MAX_DATA_LENGTH`] bytes is dropped; use [`CanMessage::try_new`] to have an
    /// oversize payload rejected instead.
    pub fn new(id: CanId, data: &[u8]) -> Self {
        let dlc = data.len().min(MAX_DATA_LENGTH);
        let mut buf = [0; MAX_DATA_LENGTH];
        buf[..dlc].copy_from_slice(&data[..dlc]);
        Self {
            id,
            data: buf,
            dlc: dlc as u8,
            rtr: false,
        }
    }

    /// Create a new data frame, failing if the payload is longer than a classic frame allows
    pub fn try_new(id: CanId, data: &[u8]) -> Result<Self, InvalidFrameError> {
        if data.len() > MAX_DATA_LENGTH {
            Err(InvalidFrameError { len: data.len() })
        } else {
            Ok(Self::new(id, data))
        }
    }

    /// Create a new remote transmission request frame
    pub fn new_rtr(id: CanId) -> Self {
        Self {
            id,
            data: [0; MAX_DATA_LENGTH],
            dlc: 0,
            rtr: true,
        }
    }

    /// Get the frame identifier
    pub fn id(&self) -> CanId {
        self.id
    }

    /// Get the payload bytes
    pub fn data(&self) -> &[u8] {
        &self.data[..self.dlc as usize]
    }

    /// Get the data length code
    pub fn dlc(&self) -> u8 {
        self.dlc
    }

    /// Return true if this is a remote transmission request
    pub fn is_rtr(&self) -> bool {
        self.rtr
    }
}

/// Error conditions reported by a CAN controller
#[derive(Clone, Copy, Debug, PartialEq, Eq, Snafu)]
pub enum CanError {
    /// A transmission was not acknowledged by any node
    #[snafu(display("No acknowledge"))]
    NoAck,
    /// Arbitration was lost while transmitting
    #[snafu(display("Arbitration lost"))]
    ArbitrationLost,
    /// The controller reported a change in its error counters
    #[snafu(display("Controller problem"))]
    Controller,
    /// A protocol violation was detected on the bus
    #[snafu(display("Protocol violation"))]
    Protocol,
    /// The transceiver reported a physical layer problem
    #[snafu(display("Transceiver fault"))]
    Transceiver,
    /// The controller went bus off
    #[snafu(display("Bus off"))]
    BusOff,
    /// A bus error was detected
    #[snafu(display("Bus error"))]
    Bus,
    /// The controller restarted after bus off
    #[snafu(display("Controller restarted"))]
    Restarted,
    /// An error class this library does not recognize
    #[snafu(display("Unknown CAN error 0x{bits:x}"))]
    Other {
        /// The raw error class bits
        bits: u32,
    },
}

impl CanError {
    /// Interpret the error class bits of a linux CAN error frame
    ///
    /// When several classes are flagged the most severe one wins.
    pub fn from_raw(bits: u32) -> Self {
        if bits & 0x40 != 0 {
            CanError::BusOff
        } else if bits & 0x100 != 0 {
            CanError::Restarted
        } else if bits & 0x04 != 0 {
            CanError::Controller
        } else if bits & 0x02 != 0 {
            CanError::ArbitrationLost
        } else if bits & 0x08 != 0 {
            CanError::Protocol
        } else if bits & 0x10 != 0 {
            CanError::Transceiver
        } else if bits & 0x20 != 0 {
            CanError::NoAck
        } else if bits & 0x80 != 0 {
            CanError::Bus
        } else {
            CanError::Other { bits }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_truncates_and_try_new_rejects() {
        let data = [1, 2, 3, 4, 5, 6, 7, 8, 9];
        let msg = CanMessage::new(CanId::std(0x123), &data);
        assert_eq!(&data[..8], msg.data());
        assert_eq!(8, msg.dlc());
        assert_eq!(
            Err(InvalidFrameError { len: 9 }),
            CanMessage::try_new(CanId::std(0x123), &data)
        );
    }

    #[test]
    fn test_std_id_masking() {
        assert_eq!(CanId::Std(0x7FF), CanId::std(0xFFFF));
        assert!(!CanId::std(0x66F).is_extended());
        assert!(CanId::extended(0x66F).is_extended());
        assert_eq!("0x66f", CanId::std(0x66F).to_string());
    }

    #[test]
    fn test_error_class_priority() {
        assert_eq!(CanError::BusOff, CanError::from_raw(0x40 | 0x04));
        assert_eq!(CanError::Controller, CanError::from_raw(0x04));
        assert_eq!(CanError::Other { bits: 0x200 }, CanError::from_raw(0x200));
    }
}
