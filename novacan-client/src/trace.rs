//! Human readable rendering of frames on the bus
//!
//! Sent frames look like
//!
//! ```text
//! >Sent: COB_ID:0x66f len:4 data:[0x60 0x00 0x00 0x00 ] Func:getname1
//! ```
//!
//! and received frames add the payload as printable ASCII:
//!
//! ```text
//! <Recv: COB_ID:0x5ef len:8 data:[0x43 0x53 0x55 0x50 0x45 0x52 0x4e 0x4f ] chars: [CSUPERNO]
//! ```
use core::fmt::{Display, Write};

use novacan_common::CanMessage;

/// Whether a traced frame was transmitted or received
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Frame written to the bus
    Sent,
    /// Frame read from the bus
    Received,
}

impl Direction {
    fn marker(&self) -> &'static str {
        match self {
            Direction::Sent => ">Sent:",
            Direction::Received => "<Recv:",
        }
    }
}

/// A frame to be rendered as one trace line
#[derive(Clone, Copy, Debug)]
pub struct FrameTrace<'a> {
    msg: &'a CanMessage,
    direction: Direction,
    name: Option<&'a str>,
}

impl<'a> FrameTrace<'a> {
    /// Trace a frame. `name` is appended as the function name when given.
    pub fn new(msg: &'a CanMessage, direction: Direction, name: Option<&'a str>) -> Self {
        Self {
            msg,
            direction,
            name,
        }
    }

    /// Trace a transmitted frame carrying the named command
    pub fn sent(msg: &'a CanMessage, name: &'a str) -> Self {
        Self::new(msg, Direction::Sent, Some(name))
    }

    /// Trace a received frame
    pub fn received(msg: &'a CanMessage) -> Self {
        Self::new(msg, Direction::Received, None)
    }
}

fn printable(byte: u8) -> char {
    if (32..=126).contains(&byte) {
        byte as char
    } else {
        '.'
    }
}

impl Display for FrameTrace<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let data = self.msg.data();
        write!(
            f,
            "{} COB_ID:{} len:{} data:[",
            self.direction.marker(),
            self.msg.id(),
            data.len()
        )?;
        for byte in data {
            write!(f, "0x{byte:02x} ")?;
        }
        f.write_char(']')?;

        if self.direction == Direction::Received {
            f.write_str(" chars: [")?;
            for byte in data {
                f.write_char(printable(*byte))?;
            }
            f.write_char(']')?;
        }

        if let Some(name) = self.name {
            write!(f, " Func:{name}")?;
        }
        Ok(())
    }
}

/// Render one trace line for `msg`
pub fn describe(msg: &CanMessage, direction: Direction, name: Option<&str>) -> String {
    FrameTrace::new(msg, direction, name).to_string()
}
