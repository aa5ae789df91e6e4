//! Types for representing node IDs
//!

use crate::{
    constants::cob_ids::{SDO_REQUEST_BASE, SDO_RESPONSE_BASE},
    messages::CanId,
};

/// A newtype on u8 to enforce a valid CANopen node ID (1-127)
///
/// The node ID is fixed for the lifetime of a process, and every SDO identifier used to talk to
/// the device is derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "std",
    derive(serde::Deserialize),
    serde(try_from = "u8")
)]
pub struct NodeId(u8);

impl NodeId {
    /// Try to create a new NodeId
    ///
    /// It will fail if value is invalid (i.e. <1 or >127)
    pub const fn new(value: u8) -> Result<Self, InvalidNodeIdError> {
        if value > 0 && value < 128 {
            Ok(NodeId(value))
        } else {
            Err(InvalidNodeIdError(value))
        }
    }

    /// Get the raw node ID as a u8
    pub const fn raw(&self) -> u8 {
        self.0
    }

    /// The COB ID on which the device's default SDO server receives requests
    pub const fn sdo_request_id(&self) -> CanId {
        CanId::Std(SDO_REQUEST_BASE + self.0 as u16)
    }

    /// The COB ID on which the device's default SDO server responds
    pub const fn sdo_response_id(&self) -> CanId {
        CanId::Std(SDO_RESPONSE_BASE + self.0 as u16)
    }
}

impl core::fmt::Display for NodeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl From<NodeId> for u8 {
    fn from(value: NodeId) -> Self {
        value.raw()
    }
}

impl TryFrom<u8> for NodeId {
    type Error = InvalidNodeIdError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        NodeId::new(value)
    }
}

/// Error for converting u8 to a NodeId
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidNodeIdError(pub u8);

impl core::fmt::Display for InvalidNodeIdError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Invalid node ID {}", self.0)
    }
}
impl core::error::Error for InvalidNodeIdError {}
