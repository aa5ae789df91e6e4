//! Settings for opening a CAN channel

/// The bit rate the headlight communicates at
pub const DEFAULT_BITRATE: u32 = 500_000;

/// Parameters for a CAN channel
///
/// Depending on the adapter, some of these can only be applied when the interface is brought up
/// (e.g. `ip link set can0 type can bitrate 500000 restart-ms 100` on linux); adapters log the
/// settings they cannot apply themselves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "std",
    derive(serde::Deserialize),
    serde(deny_unknown_fields, default)
)]
pub struct TransportConfig {
    /// Nominal bit rate in bits per second
    pub bitrate: u32,
    /// Deliver our own transmissions back to our receiver
    pub loopback: bool,
    /// Listen only, never drive the bus
    pub silent: bool,
    /// Automatically restart the controller after bus off
    pub auto_restart: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            bitrate: DEFAULT_BITRATE,
            loopback: false,
            silent: false,
            auto_restart: true,
        }
    }
}
