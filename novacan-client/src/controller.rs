//! The switch driven headlight control loop
//!
//! A [`Controller`] owns the CAN channel and the beam state machine. Each call to
//! [`Controller::tick`] acts on one switch sample, waits a bounded time for an inbound frame, and
//! checks the bus state. Frames are traced at info level as they are sent or received.
//!
//! The state machine has two phases, see [`BeamPhase`]. On each tick, in order:
//!
//! 1. A press runs the flash signal: high beam on, default, high beam on, default, with the flash
//!    delay between each pair.
//! 2. A press held longer than the hold threshold sends high beam on and enters
//!    [`BeamPhase::HighBeamHeld`].
//! 3. Releasing the switch while held sends the default state and returns to
//!    [`BeamPhase::Default`]. A release after a short press sends nothing, since the flash signal
//!    already ended on the default state.
use std::time::Duration;

use log::{debug, error, info, warn};
use novacan_common::{
    traits::{AsyncCanReceiver, AsyncCanSender, AsyncDelay, BusStateSource, CanSendError as _},
    BusState, CanMessage,
};
use snafu::Snafu;

use crate::{
    beam::{BeamPhase, BeamState, LowBeamMode},
    catalog::Catalog,
    config::HeadlightConfig,
    switch::{SwitchMonitor, SwitchSample},
    telegram::Telegram,
    trace::FrameTrace,
};

/// Error returned when a telegram could not be handed to the bus
#[derive(Clone, Debug, PartialEq, Eq, Snafu)]
pub enum TransportError {
    /// The adapter rejected the frame
    #[snafu(display("Failed to send CAN message: {message}"))]
    SendFailed {
        /// A string describing the error reason
        message: String,
    },
}

/// [`AsyncDelay`] backed by the tokio timer
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioDelay;

impl AsyncDelay for TokioDelay {
    async fn delay(&mut self, duration: Duration) {
        tokio::time::sleep(duration).await
    }
}

/// Drives the headlight from switch samples
#[derive(Debug)]
pub struct Controller<S, R, B, D> {
    catalog: Catalog,
    sender: S,
    receiver: R,
    bus: B,
    delay: D,
    default_low_beam: LowBeamMode,
    hold_threshold: Duration,
    flash_delay: Duration,
    receive_timeout: Duration,
    beam: BeamState,
    phase: BeamPhase,
    started: bool,
    last_bus_state: Option<BusState>,
}

impl<S, R, B, D> Controller<S, R, B, D>
where
    S: AsyncCanSender,
    R: AsyncCanReceiver,
    B: BusStateSource,
    D: AsyncDelay,
{
    /// Create a controller
    ///
    /// Nothing is sent until [`Controller::start`] or the first [`Controller::tick`].
    pub fn new(config: &HeadlightConfig, sender: S, receiver: R, bus: B, delay: D) -> Self {
        Self {
            catalog: Catalog::new(config.node_id),
            sender,
            receiver,
            bus,
            delay,
            default_low_beam: config.default_low_beam,
            hold_threshold: config.hold_threshold(),
            flash_delay: config.flash_delay(),
            receive_timeout: config.receive_timeout(),
            beam: BeamState::new(LowBeamMode::Off),
            phase: BeamPhase::Default,
            started: false,
            last_bus_state: None,
        }
    }

    /// The catalog used to build telegrams for the configured node
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The last commanded beam configuration
    pub fn beam_state(&self) -> BeamState {
        self.beam
    }

    /// The current state machine phase
    pub fn phase(&self) -> BeamPhase {
        self.phase
    }

    /// Send one telegram and trace it
    ///
    /// The frame is traced only once the adapter has accepted it.
    pub async fn send(&mut self, telegram: &Telegram) -> Result<(), TransportError> {
        let msg = telegram.encode();
        self.sender
            .send(msg)
            .await
            .map_err(|e| SendFailedSnafu { message: e.message() }.build())?;
        info!("{}", FrameTrace::sent(&msg, telegram.name()));
        Ok(())
    }

    /// Send a telegram, logging failure, and apply `update` to the beam state on success
    async fn command(&mut self, telegram: Telegram, update: impl FnOnce(&mut BeamState)) {
        match self.send(&telegram).await {
            Ok(()) => update(&mut self.beam),
            Err(e) => error!("Sending {} failed: {e}", telegram.name()),
        }
    }

    async fn send_default(&mut self) {
        let mode = self.default_low_beam;
        let telegram = self.catalog.low_beam(mode);
        self.command(telegram, |beam| {
            beam.low_beam = mode;
            beam.high_beam = false;
        })
        .await
    }

    async fn send_high_beam_on(&mut self) {
        let telegram = self.catalog.high_beam(true);
        self.command(telegram, |beam| beam.high_beam = true).await
    }

    /// Send the default state. Only the first call sends anything.
    pub async fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        info!("Starting with low beam {}", self.default_low_beam);
        self.send_default().await;
    }

    async fn flash(&mut self) {
        debug!("Flash signal");
        self.send_high_beam_on().await;
        self.delay.delay(self.flash_delay).await;
        self.send_default().await;
        self.delay.delay(self.flash_delay).await;
        self.send_high_beam_on().await;
        self.delay.delay(self.flash_delay).await;
        self.send_default().await;
    }

    fn enter(&mut self, phase: BeamPhase) {
        debug!("Beam phase {} -> {phase}", self.phase);
        self.phase = phase;
    }

    /// Act on one switch sample
    pub async fn apply_switch(&mut self, sample: &SwitchSample) {
        if sample.fell {
            self.flash().await;
        }

        if self.phase != BeamPhase::HighBeamHeld
            && sample.is_pressed()
            && sample.held_duration > self.hold_threshold
        {
            self.send_high_beam_on().await;
            self.enter(BeamPhase::HighBeamHeld);
        }

        if sample.rose && self.phase == BeamPhase::HighBeamHeld {
            self.send_default().await;
            self.enter(BeamPhase::Default);
        }
    }

    /// Wait up to the receive timeout for one inbound frame, tracing it if one arrives
    pub async fn listen_once(&mut self) -> Option<CanMessage> {
        match tokio::time::timeout(self.receive_timeout, self.receiver.recv()).await {
            Err(_) => None,
            Ok(Ok(msg)) => {
                info!("{}", FrameTrace::received(&msg));
                Some(msg)
            }
            Ok(Err(e)) => {
                warn!("Error reading from socket: {e:?}");
                None
            }
        }
    }

    fn drain_received(&mut self) {
        while let Some(msg) = self.receiver.try_recv() {
            info!("{}", FrameTrace::received(&msg));
        }
    }

    /// Read the bus state, returning it if it differs from the last observation
    ///
    /// The first observation always counts as a change.
    pub fn poll_bus_state(&mut self) -> Option<BusState> {
        let state = self.bus.bus_state();
        if self.last_bus_state == Some(state) {
            return None;
        }
        warn!("Bus state changed to {state}");
        self.last_bus_state = Some(state);
        Some(state)
    }

    /// Run one iteration of the control loop
    ///
    /// The default state is sent first if [`Controller::start`] has not been called yet.
    pub async fn tick(&mut self, sample: &SwitchSample) {
        self.start().await;
        self.apply_switch(sample).await;
        self.listen_once().await;
        self.poll_bus_state();
    }

    /// Run the control loop forever
    pub async fn run(&mut self, switch: &mut impl SwitchMonitor) {
        self.start().await;
        loop {
            let sample = switch.sample();
            self.tick(&sample).await;
        }
    }

    /// Trace inbound frames and bus state changes forever, without sending anything
    pub async fn listen(&mut self) {
        loop {
            self.listen_once().await;
            self.poll_bus_state();
        }
    }

    /// Send each telegram in turn, `interval` apart
    ///
    /// Frames received while waiting after a send are traced before the next send, so device
    /// responses appear after the request which caused them. Returns the number of telegrams the
    /// adapter accepted.
    pub async fn probe(&mut self, telegrams: &[Telegram], interval: Duration) -> usize {
        let mut sent = 0;
        self.drain_received();
        for telegram in telegrams {
            match self.send(telegram).await {
                Ok(()) => sent += 1,
                Err(e) => error!("Sending {} failed: {e}", telegram.name()),
            }
            self.delay.delay(interval).await;
            self.drain_received();
            self.poll_bus_state();
        }
        sent
    }

    /// Switch the daytime running light
    pub async fn set_drl(&mut self, on: bool) -> Result<(), TransportError> {
        let telegram = self.catalog.drl(on);
        self.send(&telegram).await?;
        self.beam.drl = on;
        Ok(())
    }

    /// Select a low beam mode
    pub async fn set_low_beam(&mut self, mode: LowBeamMode) -> Result<(), TransportError> {
        let telegram = self.catalog.low_beam(mode);
        self.send(&telegram).await?;
        self.beam.low_beam = mode;
        Ok(())
    }

    /// Switch the high beam
    pub async fn set_high_beam(&mut self, on: bool) -> Result<(), TransportError> {
        let telegram = self.catalog.high_beam(on);
        self.send(&telegram).await?;
        self.beam.high_beam = on;
        Ok(())
    }

    /// Report the vehicle speed to the headlight
    pub async fn set_speed(&mut self, speed: u8) -> Result<(), TransportError> {
        let telegram = self.catalog.set_speed(speed);
        self.send(&telegram).await
    }
}
