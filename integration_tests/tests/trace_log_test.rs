//! Checks on the console output, which goes through the global logger

use std::time::Duration;

use integration_tests::prelude::*;
use novacan_client::{common::traits::AsyncDelay, Controller};
use serial_test::serial;

/// A delay which has the device answer once per wait, numbering its replies
struct ReplyingDelay {
    bus: SimBus,
    replies: u8,
}

impl AsyncDelay for ReplyingDelay {
    async fn delay(&mut self, _duration: Duration) {
        self.replies += 1;
        self.bus
            .inject(CanMessage::new(CanId::std(0x5EF), &[self.replies]));
    }
}

fn count_starting_with(lines: &[String], prefix: &str) -> usize {
    lines.iter().filter(|l| l.starts_with(prefix)).count()
}

#[tokio::test(start_paused = true)]
#[serial]
async fn test_bus_state_logged_once_per_change() {
    let log = LogCapture::install();
    let (mut controller, bus, _delay) = sim_controller(&HeadlightConfig::default());

    for _ in 0..3 {
        controller.tick(&SwitchSample::idle()).await;
    }
    bus.set_bus_state(BusState::ErrorPassive);
    for _ in 0..3 {
        controller.tick(&SwitchSample::idle()).await;
    }

    let lines = log.take();
    assert_eq!(2, count_starting_with(&lines, "WARN Bus state changed to"));
    assert!(lines.contains(&"WARN Bus state changed to ERROR_ACTIVE".to_string()));
    assert!(lines.contains(&"WARN Bus state changed to ERROR_PASSIVE".to_string()));
}

#[tokio::test(start_paused = true)]
#[serial]
async fn test_frames_are_traced() {
    let log = LogCapture::install();
    let (mut controller, bus, _delay) = sim_controller(&HeadlightConfig::default());

    controller.start().await;
    bus.inject(CanMessage::new(CanId::std(0x5EF), b"\x00SUPERNO"));
    controller.listen_once().await;

    let lines = log.take();
    assert!(lines.contains(
        &"INFO >Sent: COB_ID:0x66f len:8 data:[0x2b 0x00 0x22 0x00 0x02 0x83 0x00 0x00 ] Func:lbautospeed"
            .to_string()
    ));
    assert!(lines.contains(
        &"INFO <Recv: COB_ID:0x5ef len:8 data:[0x00 0x53 0x55 0x50 0x45 0x52 0x4e 0x4f ] chars: [.SUPERNO]"
            .to_string()
    ));
}

#[tokio::test(start_paused = true)]
#[serial]
async fn test_failed_sends_logged_not_traced() {
    let log = LogCapture::install();
    let (mut controller, bus, _delay) = sim_controller(&HeadlightConfig::default());
    bus.set_fail_sends(true);

    let press = SwitchSample {
        level: false,
        fell: true,
        rose: false,
        held_duration: Duration::ZERO,
    };
    controller.tick(&press).await;

    let lines = log.take();
    assert_eq!(0, count_starting_with(&lines, "INFO >Sent:"));
    // Startup default plus the four flash telegrams
    assert_eq!(5, count_starting_with(&lines, "ERROR Sending"));
    assert!(lines.contains(
        &"ERROR Sending hbon failed: Failed to send CAN message: simulated failure sending to 0x66f"
            .to_string()
    ));
}

#[tokio::test(start_paused = true)]
#[serial]
async fn test_probe_replies_follow_their_request() {
    let log = LogCapture::install();
    let config = HeadlightConfig::default();
    let bus = SimBus::new();
    let mut controller = Controller::new(
        &config,
        bus.new_sender(),
        bus.new_receiver(),
        bus.bus_state_source(),
        ReplyingDelay {
            bus: bus.clone(),
            replies: 0,
        },
    );

    let sequence = controller.catalog().probe_sequence();
    controller.probe(&sequence[..3], config.probe_interval()).await;

    let traced: Vec<String> = log
        .take()
        .into_iter()
        .filter(|l| l.starts_with("INFO >Sent:") || l.starts_with("INFO <Recv:"))
        .collect();
    assert_eq!(
        vec![
            "INFO >Sent: COB_ID:0x66f len:4 data:[0x60 0x00 0x00 0x00 ] Func:getname1",
            "INFO <Recv: COB_ID:0x5ef len:1 data:[0x01 ] chars: [.]",
            "INFO >Sent: COB_ID:0x66f len:4 data:[0x70 0x00 0x00 0x00 ] Func:getname2",
            "INFO <Recv: COB_ID:0x5ef len:1 data:[0x02 ] chars: [.]",
            "INFO >Sent: COB_ID:0x66f len:8 data:[0x40 0x00 0x10 0x00 0x00 0x00 0x00 0x00 ] Func:getdevtype",
            "INFO <Recv: COB_ID:0x5ef len:1 data:[0x03 ] chars: [.]",
        ],
        traced
    );
}
