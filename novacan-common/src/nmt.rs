//! Definitions for the NMT protocol

use int_enum::IntEnum;

use crate::{
    messages::{CanMessage, NMT_CMD_ID},
    node_id::NodeId,
};

/// NMT command specifiers, sent as the first byte of an NMT command frame
#[derive(Copy, Clone, Debug, PartialEq, Eq, IntEnum)]
#[repr(u8)]
pub enum NmtCommandSpecifier {
    /// Enter the operational state
    Start = 0x01,
    /// Enter the stopped state
    Stop = 0x02,
    /// Enter the pre-operational state
    EnterPreOp = 0x80,
    /// Reset the application
    ResetApp = 0x81,
    /// Reset communications
    ResetComm = 0x82,
}

impl core::fmt::Display for NmtCommandSpecifier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            NmtCommandSpecifier::Start => write!(f, "Start"),
            NmtCommandSpecifier::Stop => write!(f, "Stop"),
            NmtCommandSpecifier::EnterPreOp => write!(f, "EnterPreOp"),
            NmtCommandSpecifier::ResetApp => write!(f, "ResetApp"),
            NmtCommandSpecifier::ResetComm => write!(f, "ResetComm"),
        }
    }
}

/// The node targeted by an NMT command
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NmtTarget {
    /// Every node on the bus (encoded as node 0)
    All,
    /// A single node
    Node(NodeId),
}

impl NmtTarget {
    /// The byte written to the second position of the NMT frame
    pub fn raw(&self) -> u8 {
        match self {
            NmtTarget::All => 0,
            NmtTarget::Node(node_id) => node_id.raw(),
        }
    }
}

/// An NMT command frame
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct NmtCommand {
    /// The command to execute
    pub cs: NmtCommandSpecifier,
    /// The node(s) which should execute it
    pub target: NmtTarget,
}

impl NmtCommand {
    /// Get the two byte NMT payload
    pub fn to_bytes(&self) -> [u8; 2] {
        [self.cs.into(), self.target.raw()]
    }
}

impl From<NmtCommand> for CanMessage {
    fn from(cmd: NmtCommand) -> Self {
        CanMessage::new(NMT_CMD_ID, &cmd.to_bytes())
    }
}

/// An error for [`NmtCommand::try_from()`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvalidNmtCommandError;

impl core::fmt::Display for InvalidNmtCommandError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Frame is not a valid NMT command")
    }
}
impl core::error::Error for InvalidNmtCommandError {}

impl TryFrom<CanMessage> for NmtCommand {
    type Error = InvalidNmtCommandError;

    /// Attempt to interpret a received frame as an NMT command
    fn try_from(msg: CanMessage) -> Result<Self, Self::Error> {
        if msg.id() != NMT_CMD_ID || msg.data().len() != 2 {
            return Err(InvalidNmtCommandError);
        }
        let cs = NmtCommandSpecifier::try_from(msg.data()[0]).map_err(|_| InvalidNmtCommandError)?;
        let target = match msg.data()[1] {
            0 => NmtTarget::All,
            n => NmtTarget::Node(NodeId::new(n).map_err(|_| InvalidNmtCommandError)?),
        };
        Ok(NmtCommand { cs, target })
    }
}
