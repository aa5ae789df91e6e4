//! Common traits
//!
//! These are the seams between the application and the hardware: a CAN channel split into sender
//! and receiver halves, a read-only view of the controller's bus state, and a delay provider.

use core::time::Duration;

use crate::{bus_state::BusState, messages::CanMessage};

/// An async CAN sender trait
pub trait AsyncCanSender {
    /// Error type returned by sender
    type Error: CanSendError;
    /// Send a message to the bus
    fn send(
        &mut self,
        msg: CanMessage,
    ) -> impl core::future::Future<Output = Result<(), Self::Error>>;
}

/// A trait for CAN errors which may come from different types of interfaces
///
/// On no_std, all the error can do is return the unsent frame. With `std`, it can convert any
/// underlying errors into a String.
pub trait CanSendError: core::fmt::Debug {
    /// Convert the error into the undelivered message
    fn into_can_message(self) -> CanMessage;

    /// Get a string describing the error
    #[cfg(feature = "std")]
    #[cfg_attr(docsrs, doc(cfg(feature = "std")))]
    fn message(&self) -> String;
}

/// An async CAN receiver trait
pub trait AsyncCanReceiver {
    /// The error type returned by recv
    type Error: core::fmt::Debug;

    /// Receive available message immediately
    fn try_recv(&mut self) -> Option<CanMessage>;

    /// Wait for the next message
    ///
    /// Callers wanting a bounded wait should wrap this in a timeout; implementations must be
    /// cancel safe.
    fn recv(&mut self) -> impl core::future::Future<Output = Result<CanMessage, Self::Error>>;

    /// Remove any pending messages from the receiver
    fn flush(&mut self) {
        while self.try_recv().is_some() {}
    }
}

/// Read access to the fault confinement state of the CAN controller
pub trait BusStateSource {
    /// Get the most recently observed bus state
    fn bus_state(&self) -> BusState;
}

/// A provider of delays
///
/// Used for spacing consecutive transmissions. Injected so that tests can observe the requested
/// spacing without waiting for it.
pub trait AsyncDelay {
    /// Wait for `duration` to elapse
    fn delay(&mut self, duration: Duration) -> impl core::future::Future<Output = ()>;
}
