//! Common functionality shared among other novacan crates.
//!
//! This crate holds the wire-level pieces: CAN message types, the CANopen constants and request
//! layouts the headlight understands, and the traits a transport adapter implements. Most users
//! will reach it through the re-export in `novacan-client`.
#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs, missing_copy_implementations)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod bus_state;
pub mod constants;
pub mod messages;
pub mod nmt;
pub mod node_id;
pub mod sdo;
pub mod traits;
pub mod transport;

#[cfg(feature = "socketcan")]
mod socketcan;

#[cfg(feature = "socketcan")]
#[cfg_attr(docsrs, doc(cfg(feature = "socketcan")))]
pub use socketcan::{
    open_socketcan, ReceiveError, SocketCanBusMonitor, SocketCanReceiver, SocketCanSendError,
    SocketCanSender,
};

pub use bus_state::BusState;
pub use messages::{CanError, CanId, CanMessage};
pub use node_id::NodeId;
pub use transport::TransportConfig;
