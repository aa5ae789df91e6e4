//! Constants defining standard object indices, COB ID bases, and headlight specific values
//!
//!

/// Function code bases which are combined with a node ID to form a COB ID
pub mod cob_ids {
    /// NMT commands are always broadcast on COB ID 0
    pub const NMT: u16 = 0x000;
    /// Base for SDO server responses (server to client)
    pub const SDO_RESPONSE_BASE: u16 = 0x580;
    /// Base for SDO server requests (client to server)
    pub const SDO_REQUEST_BASE: u16 = 0x600;
}

/// Object indices for objects the headlight exposes
pub mod object_ids {
    /// The Device Type object index
    pub const DEVICE_TYPE: u16 = 0x1000;
    /// The Device Name object index
    ///
    /// The headlight answers the firmware version here.
    pub const DEVICE_NAME: u16 = 0x1008;
    /// The manufacturer specific lighting control object
    pub const LIGHT_CONTROL: u16 = 0x2200;
}

/// Function selectors written into the [`LIGHT_CONTROL`](object_ids::LIGHT_CONTROL) object
///
/// The device multiplexes its lighting functions through sub 0 of object 0x2200: the first data
/// byte selects the function, the second carries the value.
pub mod light_functions {
    /// Daytime running light on/off
    pub const DRL: u8 = 0x01;
    /// Low beam mode selector
    pub const LOW_BEAM: u8 = 0x02;
    /// High beam on/off
    pub const HIGH_BEAM: u8 = 0x03;
    /// Vehicle speed input, used by the CAN speed dependent low beam modes
    pub const SPEED: u8 = 0x04;
}

/// Identification query command bytes understood by the headlight
///
/// These are not standard SDO specifiers; the device answers each with a fragment of its name.
pub mod name_queries {
    /// Query returning the first part of the device name
    pub const NAME_PART_1: u8 = 0x60;
    /// Query returning the second part of the device name
    pub const NAME_PART_2: u8 = 0x70;
}
