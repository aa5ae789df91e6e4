pub mod sim_bus;
pub mod utils;

pub mod prelude {
    pub use super::sim_bus::{SimBus, SimBusReceiver, SimBusSender, SimBusState};
    pub use super::utils::{
        play, sim_controller, LogCapture, RecordingDelay, ScriptedSwitch, SimController,
    };
    pub use novacan_client::{
        BeamPhase, BeamState, Catalog, HeadlightConfig, LowBeamMode, SwitchMonitor, SwitchSample,
        Telegram, TransportError,
    };
    pub use novacan_common::{BusState, CanId, CanMessage, NodeId};
}
