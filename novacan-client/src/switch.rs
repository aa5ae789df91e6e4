//! Handlebar switch sampling
//!
//! The switch is wired with a pull-up, so the line reads high while released and low while
//! pressed. A press is therefore a falling edge and a release a rising edge.
//!
//! The control loop only consumes [`SwitchSample`]s through [`SwitchMonitor`]. The
//! [`Debouncer`] turns raw pin readings into samples, and [`DebouncedSwitch`] pairs it with a
//! [`PinLevel`] source and a clock.
use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use snafu::{ResultExt, Snafu};

/// One debounced observation of the switch
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwitchSample {
    /// Current debounced line level. `false` is low, i.e. pressed.
    pub level: bool,
    /// A press was accepted since the previous sample
    pub fell: bool,
    /// A release was accepted since the previous sample
    pub rose: bool,
    /// Time spent at the current level
    pub held_duration: Duration,
}

impl SwitchSample {
    /// A released switch with no edges
    pub const fn idle() -> Self {
        Self {
            level: true,
            fell: false,
            rose: false,
            held_duration: Duration::ZERO,
        }
    }

    /// True while the switch is held down
    pub const fn is_pressed(&self) -> bool {
        !self.level
    }
}

/// A source of debounced switch samples
pub trait SwitchMonitor {
    /// Take the next sample. Edges are reported by exactly one sample.
    fn sample(&mut self) -> SwitchSample;
}

/// A switch which is never pressed, for running without switch hardware
#[derive(Clone, Copy, Debug, Default)]
pub struct IdleSwitch;

impl SwitchMonitor for IdleSwitch {
    fn sample(&mut self) -> SwitchSample {
        SwitchSample::idle()
    }
}

/// A raw digital input
pub trait PinLevel {
    /// Error returned when the pin cannot be read
    type Error: core::fmt::Display;

    /// Read the current line level, `true` for high
    fn read_level(&mut self) -> Result<bool, Self::Error>;
}

/// Software debouncer for a single input
///
/// A level change is accepted only once the raw input has held the new level for the debounce
/// interval. Shorter glitches are ignored.
#[derive(Clone, Copy, Debug)]
pub struct Debouncer {
    interval_us: u64,
    stable: bool,
    candidate: bool,
    candidate_since_us: u64,
    last_change_us: u64,
}

impl Debouncer {
    /// Create a debouncer which starts out stable at `initial_level`
    pub fn new(interval: Duration, initial_level: bool, now_us: u64) -> Self {
        Self {
            interval_us: interval.as_micros() as u64,
            stable: initial_level,
            candidate: initial_level,
            candidate_since_us: now_us,
            last_change_us: now_us,
        }
    }

    /// The last accepted level
    pub fn level(&self) -> bool {
        self.stable
    }

    /// Feed a raw reading taken at `now_us` and get the resulting sample
    pub fn update(&mut self, raw: bool, now_us: u64) -> SwitchSample {
        if raw != self.candidate {
            self.candidate = raw;
            self.candidate_since_us = now_us;
        }

        let mut fell = false;
        let mut rose = false;
        if self.candidate != self.stable
            && now_us.saturating_sub(self.candidate_since_us) >= self.interval_us
        {
            self.stable = self.candidate;
            self.last_change_us = now_us;
            fell = !self.stable;
            rose = self.stable;
        }

        SwitchSample {
            level: self.stable,
            fell,
            rose,
            held_duration: Duration::from_micros(now_us.saturating_sub(self.last_change_us)),
        }
    }
}

/// A [`PinLevel`] source debounced against the monotonic clock
///
/// The pin is read only when [`SwitchMonitor::sample`] is called, so a press must be seen by two
/// samples at least the debounce interval apart to be accepted. In the control loop one sample is
/// taken per tick, and a tick on a quiet bus lasts up to the receive timeout. A press shorter than
/// one tick can therefore be missed entirely; lower `receive_timeout_ms` to sample more often.
#[derive(Debug)]
pub struct DebouncedSwitch<P: PinLevel> {
    pin: P,
    debouncer: Debouncer,
    epoch: Instant,
    read_failed: bool,
}

impl<P: PinLevel> DebouncedSwitch<P> {
    /// Wrap `pin`, taking its current level as the initial stable level
    ///
    /// If the pin cannot be read the switch starts out released.
    pub fn new(mut pin: P, interval: Duration) -> Self {
        let (initial, read_failed) = match pin.read_level() {
            Ok(level) => (level, false),
            Err(e) => {
                log::warn!("Cannot read switch, assuming released: {e}");
                (true, true)
            }
        };
        Self {
            pin,
            debouncer: Debouncer::new(interval, initial, 0),
            epoch: Instant::now(),
            read_failed,
        }
    }

    /// Access the underlying pin
    pub fn pin(&self) -> &P {
        &self.pin
    }
}

impl<P: PinLevel> SwitchMonitor for DebouncedSwitch<P> {
    fn sample(&mut self) -> SwitchSample {
        let now_us = self.epoch.elapsed().as_micros() as u64;
        let raw = match self.pin.read_level() {
            Ok(level) => {
                if self.read_failed {
                    log::info!("Switch readable again");
                    self.read_failed = false;
                }
                level
            }
            Err(e) => {
                // A failing read holds the last accepted level instead of inventing an edge
                if !self.read_failed {
                    log::warn!("Switch read failed: {e}");
                    self.read_failed = true;
                }
                self.debouncer.level()
            }
        };
        self.debouncer.update(raw, now_us)
    }
}

/// Debounce several pins with the same interval
pub fn debounce_all<P: PinLevel>(
    pins: impl IntoIterator<Item = P>,
    interval: Duration,
) -> Vec<DebouncedSwitch<P>> {
    pins.into_iter()
        .map(|pin| DebouncedSwitch::new(pin, interval))
        .collect()
}

/// Error reading a sysfs GPIO value
#[derive(Debug, Snafu)]
pub enum SysfsPinError {
    /// The value file could not be read
    #[snafu(display("Failed to read {}: {source}", path.display()))]
    Read {
        /// Path of the value file
        path: PathBuf,
        /// The IO error
        source: std::io::Error,
    },
    /// The value file held something other than 0 or 1
    #[snafu(display("Unexpected value {value:?} in {}", path.display()))]
    Value {
        /// Path of the value file
        path: PathBuf,
        /// What was read
        value: String,
    },
}

/// A GPIO input exported through the Linux sysfs interface
///
/// `path` is the `value` file of an exported pin, e.g. `/sys/class/gpio/gpio17/value`.
#[derive(Clone, Debug)]
pub struct SysfsPin {
    path: PathBuf,
}

impl SysfsPin {
    /// Create a pin reading from the value file at `path`
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The value file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PinLevel for SysfsPin {
    type Error = SysfsPinError;

    fn read_level(&mut self) -> Result<bool, SysfsPinError> {
        let value = std::fs::read_to_string(&self.path).context(ReadSnafu {
            path: self.path.clone(),
        })?;
        match value.trim() {
            "0" => Ok(false),
            "1" => Ok(true),
            other => ValueSnafu {
                path: self.path.clone(),
                value: other,
            }
            .fail(),
        }
    }
}
