use std::sync::{
    atomic::{AtomicBool, AtomicU8, Ordering},
    Arc, Mutex,
};

use novacan_common::{
    messages::CanMessage,
    traits::{AsyncCanReceiver, AsyncCanSender, BusStateSource, CanSendError},
    BusState,
};

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// A simulated CAN channel between the controller and a pretend headlight
///
/// Frames sent by the controller are recorded. Frames from the headlight are injected with
/// [`SimBus::inject`] and delivered to every receiver.
#[derive(Clone, Default)]
pub struct SimBus {
    sent: Arc<Mutex<Vec<CanMessage>>>,
    fail_sends: Arc<AtomicBool>,
    state: Arc<AtomicU8>,
    external_channels: Arc<Mutex<Vec<UnboundedSender<CanMessage>>>>,
}

impl SimBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_sender(&self) -> SimBusSender {
        SimBusSender {
            sent: self.sent.clone(),
            fail_sends: self.fail_sends.clone(),
        }
    }

    pub fn new_receiver(&self) -> SimBusReceiver {
        let (tx, rx) = unbounded_channel();
        self.external_channels.lock().unwrap().push(tx);
        SimBusReceiver { channel_rx: rx }
    }

    pub fn bus_state_source(&self) -> SimBusState {
        SimBusState {
            state: self.state.clone(),
        }
    }

    /// Deliver a frame from the headlight to all receivers
    pub fn inject(&self, msg: CanMessage) {
        for tx in self.external_channels.lock().unwrap().iter() {
            tx.send(msg).unwrap();
        }
    }

    /// Frames accepted from senders so far
    pub fn sent(&self) -> Vec<CanMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Return and forget the frames sent so far
    pub fn take_sent(&self) -> Vec<CanMessage> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }

    /// Make every send fail until cleared
    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::Relaxed);
    }

    pub fn set_bus_state(&self, state: BusState) {
        self.state.store(state.into(), Ordering::Relaxed);
    }
}

#[derive(Debug)]
pub struct SimSendError(CanMessage);

impl CanSendError for SimSendError {
    fn into_can_message(self) -> CanMessage {
        self.0
    }

    fn message(&self) -> String {
        format!("simulated failure sending to {}", self.0.id())
    }
}

pub struct SimBusSender {
    sent: Arc<Mutex<Vec<CanMessage>>>,
    fail_sends: Arc<AtomicBool>,
}

impl AsyncCanSender for SimBusSender {
    type Error = SimSendError;

    async fn send(&mut self, msg: CanMessage) -> Result<(), SimSendError> {
        if self.fail_sends.load(Ordering::Relaxed) {
            return Err(SimSendError(msg));
        }
        self.sent.lock().unwrap().push(msg);
        Ok(())
    }
}

pub struct SimBusReceiver {
    channel_rx: UnboundedReceiver<CanMessage>,
}

impl AsyncCanReceiver for SimBusReceiver {
    type Error = ();

    async fn recv(&mut self) -> Result<CanMessage, Self::Error> {
        self.channel_rx.recv().await.ok_or(())
    }

    fn try_recv(&mut self) -> Option<CanMessage> {
        self.channel_rx.try_recv().ok()
    }

    fn flush(&mut self) {
        while self.channel_rx.try_recv().is_ok() {}
    }
}

pub struct SimBusState {
    state: Arc<AtomicU8>,
}

impl BusStateSource for SimBusState {
    fn bus_state(&self) -> BusState {
        BusState::try_from(self.state.load(Ordering::Relaxed)).unwrap()
    }
}
