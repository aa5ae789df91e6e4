//! Beam configuration and the phases of the switch state machine

/// Low beam behavior, as selected by the byte written to the light control object
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Deserialize)]
#[serde(from = "u8")]
pub enum LowBeamMode {
    /// Low beam off (0x00)
    Off,
    /// Low beam on at a fixed intensity (0x01)
    On,
    /// A raw intensity level for selectors not otherwise named
    Level(u8),
    /// Follow the light sensor (0x81)
    AutoLightSensor,
    /// Fixed intensity, speed from the internal sensor (0x82)
    FixedInternalSpeed,
    /// Speed dependent intensity from the internal sensor (0x83)
    AutoInternalSpeed,
    /// Fixed intensity, speed received over CAN (0x84)
    FixedCanSpeed,
    /// Speed dependent intensity, speed received over CAN (0x85)
    AutoCanSpeed,
}

impl LowBeamMode {
    /// The selector byte sent to the device
    pub const fn selector(&self) -> u8 {
        match *self {
            LowBeamMode::Off => 0x00,
            LowBeamMode::On => 0x01,
            LowBeamMode::Level(level) => level,
            LowBeamMode::AutoLightSensor => 0x81,
            LowBeamMode::FixedInternalSpeed => 0x82,
            LowBeamMode::AutoInternalSpeed => 0x83,
            LowBeamMode::FixedCanSpeed => 0x84,
            LowBeamMode::AutoCanSpeed => 0x85,
        }
    }

    /// Short command name used when tracing telegrams selecting this mode
    pub const fn command_name(&self) -> &'static str {
        match self {
            LowBeamMode::Off => "lboff",
            LowBeamMode::On => "lbon",
            LowBeamMode::Level(_) => "lblevel",
            LowBeamMode::AutoLightSensor => "lbautolight",
            LowBeamMode::FixedInternalSpeed => "lbfixspeed",
            LowBeamMode::AutoInternalSpeed => "lbautospeed",
            LowBeamMode::FixedCanSpeed => "lbfixcanspeed",
            LowBeamMode::AutoCanSpeed => "lbautocanspeed",
        }
    }
}

impl From<u8> for LowBeamMode {
    fn from(value: u8) -> Self {
        match value {
            0x00 => LowBeamMode::Off,
            0x01 => LowBeamMode::On,
            0x81 => LowBeamMode::AutoLightSensor,
            0x82 => LowBeamMode::FixedInternalSpeed,
            0x83 => LowBeamMode::AutoInternalSpeed,
            0x84 => LowBeamMode::FixedCanSpeed,
            0x85 => LowBeamMode::AutoCanSpeed,
            level => LowBeamMode::Level(level),
        }
    }
}

impl From<LowBeamMode> for u8 {
    fn from(mode: LowBeamMode) -> Self {
        mode.selector()
    }
}

impl core::fmt::Display for LowBeamMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}({:#04x})", self.command_name(), self.selector())
    }
}

/// The last commanded configuration of the headlight
///
/// This is what was sent, not what the device confirmed; the device does not acknowledge the
/// lighting writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BeamState {
    /// Low beam mode
    pub low_beam: LowBeamMode,
    /// High beam forced on
    pub high_beam: bool,
    /// Daytime running light on
    pub drl: bool,
}

impl BeamState {
    /// The state before anything has been commanded
    pub const fn new(low_beam: LowBeamMode) -> Self {
        Self {
            low_beam,
            high_beam: false,
            drl: false,
        }
    }
}

/// Phase of the switch driven beam state machine
///
/// The flash signal has no phase of its own: it runs to completion inside the tick which detected
/// the press, and the machine is back in `Default` when the tick returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BeamPhase {
    /// The configured low beam mode is active
    Default,
    /// The switch is held and the high beam is forced on
    HighBeamHeld,
}

impl core::fmt::Display for BeamPhase {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BeamPhase::Default => write!(f, "Default"),
            BeamPhase::HighBeamHeld => write!(f, "HighBeamHeld"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_round_trip() {
        for selector in [0x00, 0x01, 0x04, 0x81, 0x82, 0x83, 0x84, 0x85] {
            assert_eq!(selector, LowBeamMode::from(selector).selector());
        }
        assert_eq!(LowBeamMode::Level(4), LowBeamMode::from(4));
        assert_eq!(LowBeamMode::AutoInternalSpeed, LowBeamMode::from(0x83));
    }

    #[test]
    fn test_display() {
        assert_eq!("lbautospeed(0x83)", LowBeamMode::AutoInternalSpeed.to_string());
    }
}
