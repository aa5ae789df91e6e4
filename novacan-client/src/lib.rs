//! Control a SuperNova M99 (CANopen variant) e-bike headlight
//!
//! The headlight listens for SDO writes to a manufacturer object at node 0x6F. This crate builds
//! those writes, traces the frames on the bus, and turns a single handlebar switch into beam
//! commands:
//!
//! * A short press flashes the high beam twice.
//! * Holding the switch keeps the high beam on until it is released.
//! * Otherwise the configured low beam mode is active.
//!
//! # Getting Started
//!
//! Open a socketcan channel, build a [`Controller`] and hand it a [`SwitchMonitor`]:
//!
//! ```ignore
//! let config = HeadlightConfig::default();
//! let (tx, rx, bus) = common::open_socketcan("can0", &config.transport)?;
//! let mut controller = Controller::new(&config, tx, rx, bus, TokioDelay);
//! let mut switch = DebouncedSwitch::new(SysfsPin::new("/sys/class/gpio/gpio17/value"), config.debounce());
//! controller.run(&mut switch).await;
//! ```
//!
//! Set `RUST_LOG=info` to see the frame trace.
#![warn(missing_docs, missing_copy_implementations)]

pub use novacan_common as common;

mod beam;
mod catalog;
mod config;
mod controller;
mod switch;
mod telegram;
mod trace;

pub use beam::{BeamPhase, BeamState, LowBeamMode};
pub use catalog::{Catalog, PROBE_SEQUENCE_LEN};
pub use config::{
    ConfigError, HeadlightConfig, DEFAULT_DEBOUNCE_MS, DEFAULT_FLASH_DELAY_MS,
    DEFAULT_HOLD_THRESHOLD_MS, DEFAULT_LOW_BEAM, DEFAULT_NODE_ID, DEFAULT_PROBE_INTERVAL_MS,
    DEFAULT_RECEIVE_TIMEOUT_MS,
};
pub use controller::{Controller, TokioDelay, TransportError};
pub use switch::{
    debounce_all, DebouncedSwitch, Debouncer, IdleSwitch, PinLevel, SwitchMonitor, SwitchSample,
    SysfsPin, SysfsPinError,
};
pub use telegram::{DecodeError, Telegram};
pub use trace::{describe, Direction, FrameTrace};
