//! Builders for every command the headlight understands
//!
//! All lighting functions are written through sub 0 of the manufacturer object 0x2200 with an
//! expedited SDO download: the first data byte selects the function, the second carries its value.
//! For example, selecting low beam mode 0x83 sends
//!
//! ```text
//! 0x66F: 2B 00 22 00 02 83 00 00
//!        |  \___/ |  |  |
//!        |    |   |  |  +-- value
//!        |    |   |  +----- function (low beam)
//!        |    |   +-------- sub index
//!        |    +------------ object index, little endian
//!        +----------------- two byte expedited download
//! ```

use novacan_common::{
    constants::{light_functions, name_queries, object_ids},
    nmt::{NmtCommand, NmtCommandSpecifier, NmtTarget},
    sdo::SdoRequest,
    NodeId,
};

use crate::{beam::LowBeamMode, telegram::Telegram};

/// Number of telegrams in [`Catalog::probe_sequence`]
pub const PROBE_SEQUENCE_LEN: usize = 15;

/// Builds [`Telegram`]s addressed to one headlight node
///
/// The catalog is created once at startup and handed to whatever needs to issue commands. It holds
/// no state beyond the node ID, and every method is a pure constructor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Catalog {
    node_id: NodeId,
}

impl Catalog {
    /// Create a catalog for the headlight at `node_id`
    pub const fn new(node_id: NodeId) -> Self {
        Self { node_id }
    }

    /// The node the catalog addresses
    pub const fn node_id(&self) -> NodeId {
        self.node_id
    }

    fn sdo_id(&self) -> u16 {
        self.node_id.sdo_request_id().raw() as u16
    }

    fn sdo<const N: usize>(&self, name: &'static str, payload: [u8; N]) -> Telegram {
        Telegram::new(name, self.sdo_id(), payload)
    }

    fn read_object(&self, name: &'static str, index: u16, sub: u8) -> Telegram {
        self.sdo(name, SdoRequest::initiate_upload(index, sub).to_bytes())
    }

    fn write_light(&self, name: &'static str, function: u8, value: u8) -> Telegram {
        let request =
            SdoRequest::expedited_download(object_ids::LIGHT_CONTROL, 0, [function, value]);
        self.sdo(name, request.to_bytes())
    }

    /// Query the first part of the device name
    pub fn get_name_1(&self) -> Telegram {
        self.sdo("getname1", [name_queries::NAME_PART_1, 0, 0, 0])
    }

    /// Query the second part of the device name
    pub fn get_name_2(&self) -> Telegram {
        self.sdo("getname2", [name_queries::NAME_PART_2, 0, 0, 0])
    }

    /// Read the device type object (0x1000)
    pub fn get_device_type(&self) -> Telegram {
        self.read_object("getdevtype", object_ids::DEVICE_TYPE, 0)
    }

    /// Read the firmware version (object 0x1008)
    pub fn get_firmware_version(&self) -> Telegram {
        self.read_object("getfwver", object_ids::DEVICE_NAME, 0)
    }

    /// Read the light control object, which reports the light sensor
    pub fn get_light_sensor(&self) -> Telegram {
        self.read_object("get0x2200", object_ids::LIGHT_CONTROL, 0)
    }

    /// Build an arbitrary NMT command
    ///
    /// NMT commands always go to COB ID 0, whatever node they target.
    pub fn nmt(&self, name: &'static str, cs: NmtCommandSpecifier, target: NmtTarget) -> Telegram {
        let cmd = NmtCommand { cs, target };
        Telegram::new(name, novacan_common::constants::cob_ids::NMT, cmd.to_bytes())
    }

    fn this_node(&self) -> NmtTarget {
        NmtTarget::Node(self.node_id)
    }

    /// Reset the headlight
    pub fn nmt_reset(&self) -> Telegram {
        self.nmt("nmtreset", NmtCommandSpecifier::ResetApp, self.this_node())
    }

    /// Reset every node
    pub fn nmt_reset_all(&self) -> Telegram {
        self.nmt("nmtresetall", NmtCommandSpecifier::ResetApp, NmtTarget::All)
    }

    /// Put the headlight into pre-operational
    pub fn nmt_preop(&self) -> Telegram {
        self.nmt("nmtpreop", NmtCommandSpecifier::EnterPreOp, self.this_node())
    }

    /// Put every node into pre-operational
    pub fn nmt_preop_all(&self) -> Telegram {
        self.nmt("nmtpreopall", NmtCommandSpecifier::EnterPreOp, NmtTarget::All)
    }

    /// Start the headlight
    pub fn nmt_start(&self) -> Telegram {
        self.nmt("nmtstart", NmtCommandSpecifier::Start, self.this_node())
    }

    /// Start every node
    pub fn nmt_start_all(&self) -> Telegram {
        self.nmt("nmtstartall", NmtCommandSpecifier::Start, NmtTarget::All)
    }

    /// Switch the daytime running light
    pub fn drl(&self, on: bool) -> Telegram {
        let name = if on { "drlon" } else { "drloff" };
        self.write_light(name, light_functions::DRL, on as u8)
    }

    /// Select the low beam mode
    pub fn low_beam(&self, mode: LowBeamMode) -> Telegram {
        self.write_light(mode.command_name(), light_functions::LOW_BEAM, mode.selector())
    }

    /// Switch the high beam
    pub fn high_beam(&self, on: bool) -> Telegram {
        let name = if on { "hbon" } else { "hboff" };
        self.write_light(name, light_functions::HIGH_BEAM, on as u8)
    }

    /// Feed a vehicle speed to the CAN speed dependent low beam modes
    ///
    /// Unlike the other lighting writes this is a four byte download.
    pub fn set_speed(&self, speed: u8) -> Telegram {
        let request = SdoRequest::expedited_download(
            object_ids::LIGHT_CONTROL,
            0,
            [light_functions::SPEED, speed, 0, 0],
        );
        self.sdo("setspeed", request.to_bytes())
    }

    /// Every identification, NMT and lighting command in the order used to probe a device
    pub fn probe_sequence(&self) -> [Telegram; PROBE_SEQUENCE_LEN] {
        [
            self.get_name_1(),
            self.get_name_2(),
            self.get_device_type(),
            self.get_firmware_version(),
            self.nmt_reset_all(),
            self.nmt_reset(),
            self.nmt_preop_all(),
            self.nmt_preop(),
            self.nmt_start_all(),
            self.nmt_start(),
            self.get_light_sensor(),
            self.low_beam(LowBeamMode::On),
            self.high_beam(true),
            self.low_beam(LowBeamMode::Off),
            self.high_beam(false),
        ]
    }

    /// Look up a parameterless command by its telegram name
    ///
    /// Covers the probe sequence, both DRL commands, and every named low beam mode.
    pub fn by_name(&self, name: &str) -> Option<Telegram> {
        let named_modes = [
            LowBeamMode::AutoLightSensor,
            LowBeamMode::FixedInternalSpeed,
            LowBeamMode::AutoInternalSpeed,
            LowBeamMode::FixedCanSpeed,
            LowBeamMode::AutoCanSpeed,
        ]
        .map(|mode| self.low_beam(mode));

        self.probe_sequence()
            .into_iter()
            .chain([self.drl(true), self.drl(false)])
            .chain(named_modes)
            .find(|t| t.name() == name)
    }
}
