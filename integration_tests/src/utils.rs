use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use log::{LevelFilter, Log, Metadata, Record};
use novacan_client::{
    common::traits::AsyncDelay, Controller, Debouncer, HeadlightConfig, SwitchMonitor,
    SwitchSample,
};

use crate::sim_bus::{SimBus, SimBusReceiver, SimBusSender, SimBusState};

pub type SimController = Controller<SimBusSender, SimBusReceiver, SimBusState, RecordingDelay>;

/// Build a controller attached to a fresh simulated bus
pub fn sim_controller(config: &HeadlightConfig) -> (SimController, SimBus, RecordingDelay) {
    let bus = SimBus::new();
    let delay = RecordingDelay::default();
    let controller = Controller::new(
        config,
        bus.new_sender(),
        bus.new_receiver(),
        bus.bus_state_source(),
        delay.clone(),
    );
    (controller, bus, delay)
}

/// An [`AsyncDelay`] which records each requested delay and returns immediately
#[derive(Clone, Default)]
pub struct RecordingDelay {
    requested: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingDelay {
    pub fn requested(&self) -> Vec<Duration> {
        self.requested.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.requested.lock().unwrap().clear();
    }
}

impl AsyncDelay for RecordingDelay {
    async fn delay(&mut self, duration: Duration) {
        self.requested.lock().unwrap().push(duration);
    }
}

/// A switch replaying a fixed press/release script against a simulated clock
///
/// Each call to `sample` advances the clock by one step. After the script ends the switch stays
/// released.
pub struct ScriptedSwitch {
    step_us: u64,
    now_us: u64,
    // (end time, level) for each segment of the script
    segments: Vec<(u64, bool)>,
    debouncer: Debouncer,
}

impl ScriptedSwitch {
    pub fn new(step: Duration, debounce: Duration) -> Self {
        Self {
            step_us: step.as_micros() as u64,
            now_us: 0,
            segments: Vec::new(),
            debouncer: Debouncer::new(debounce, true, 0),
        }
    }

    fn push(mut self, level: bool, duration: Duration) -> Self {
        let start = self.segments.last().map(|s| s.0).unwrap_or(0);
        self.segments
            .push((start + duration.as_micros() as u64, level));
        self
    }

    pub fn release_for(self, duration: Duration) -> Self {
        self.push(true, duration)
    }

    pub fn press_for(self, duration: Duration) -> Self {
        self.push(false, duration)
    }

    /// Number of samples needed to play the whole script
    pub fn len(&self) -> usize {
        let end = self.segments.last().map(|s| s.0).unwrap_or(0);
        end.div_ceil(self.step_us) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn level_at(&self, t_us: u64) -> bool {
        self.segments
            .iter()
            .find(|(end, _)| t_us < *end)
            .map(|(_, level)| *level)
            .unwrap_or(true)
    }
}

impl SwitchMonitor for ScriptedSwitch {
    fn sample(&mut self) -> SwitchSample {
        self.now_us += self.step_us;
        let level = self.level_at(self.now_us);
        self.debouncer.update(level, self.now_us)
    }
}

/// Play a whole script through a controller, one tick per sample
pub async fn play(controller: &mut SimController, switch: &mut ScriptedSwitch) {
    for _ in 0..switch.len() {
        let sample = switch.sample();
        controller.tick(&sample).await;
    }
}

/// A global logger collecting formatted records, so tests can check what was logged
///
/// There is only one logger per process, so tests using it must not run concurrently.
pub struct LogCapture {
    lines: Mutex<Vec<String>>,
}

static CAPTURE: LogCapture = LogCapture {
    lines: Mutex::new(Vec::new()),
};

impl LogCapture {
    /// Install the capture logger and discard anything captured so far
    pub fn install() -> &'static LogCapture {
        log::set_logger(&CAPTURE).ok();
        log::set_max_level(LevelFilter::Debug);
        CAPTURE.take();
        &CAPTURE
    }

    /// Return and clear the captured lines
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.lines.lock().unwrap())
    }
}

impl Log for LogCapture {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        self.lines
            .lock()
            .unwrap()
            .push(format!("{} {}", record.level(), record.args()));
    }

    fn flush(&self) {}
}
