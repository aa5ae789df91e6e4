//! CAN controller bus state

use int_enum::IntEnum;

use crate::messages::CanError;

/// The fault confinement state of the local CAN controller
///
/// Owned by the transport adapter and only ever read by the application.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, IntEnum)]
#[repr(u8)]
pub enum BusState {
    /// Normal operation
    #[default]
    ErrorActive = 0,
    /// An error counter crossed the warning limit
    ErrorWarning = 1,
    /// An error counter crossed the passive limit; the controller no longer sends active error
    /// flags
    ErrorPassive = 2,
    /// The controller has disconnected from the bus
    BusOff = 3,
}

impl core::fmt::Display for BusState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BusState::ErrorActive => write!(f, "ERROR_ACTIVE"),
            BusState::ErrorWarning => write!(f, "ERROR_WARNING"),
            BusState::ErrorPassive => write!(f, "ERROR_PASSIVE"),
            BusState::BusOff => write!(f, "BUS_OFF"),
        }
    }
}

// Controller status bits carried in byte 1 of a linux controller-problem error frame
const CTRL_RX_WARNING: u8 = 0x04;
const CTRL_TX_WARNING: u8 = 0x08;
const CTRL_RX_PASSIVE: u8 = 0x10;
const CTRL_TX_PASSIVE: u8 = 0x20;
const CTRL_ACTIVE: u8 = 0x40;

impl BusState {
    /// Compute the state following an error report from the controller
    ///
    /// `ctrl_status` is the controller status byte accompanying a
    /// [`CanError::Controller`] report. Errors which do not describe the controller state leave it
    /// unchanged.
    pub fn after_error(self, error: CanError, ctrl_status: u8) -> BusState {
        match error {
            CanError::BusOff => BusState::BusOff,
            CanError::Restarted => BusState::ErrorActive,
            CanError::Controller => {
                if ctrl_status & (CTRL_RX_PASSIVE | CTRL_TX_PASSIVE) != 0 {
                    BusState::ErrorPassive
                } else if ctrl_status & (CTRL_RX_WARNING | CTRL_TX_WARNING) != 0 {
                    BusState::ErrorWarning
                } else if ctrl_status & CTRL_ACTIVE != 0 {
                    BusState::ErrorActive
                } else {
                    self
                }
            }
            _ => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_transitions() {
        let state = BusState::default();
        let state = state.after_error(CanError::Controller, CTRL_TX_WARNING);
        assert_eq!(BusState::ErrorWarning, state);
        let state = state.after_error(CanError::Controller, CTRL_RX_PASSIVE);
        assert_eq!(BusState::ErrorPassive, state);
        let state = state.after_error(CanError::NoAck, 0);
        assert_eq!(BusState::ErrorPassive, state);
        let state = state.after_error(CanError::BusOff, 0);
        assert_eq!(BusState::BusOff, state);
        assert_eq!(
            BusState::ErrorActive,
            state.after_error(CanError::Restarted, 0)
        );
    }

    #[test]
    fn test_raw_conversion() {
        assert_eq!(Ok(BusState::BusOff), BusState::try_from(3));
        assert_eq!(2u8, u8::from(BusState::ErrorPassive));
    }
}
