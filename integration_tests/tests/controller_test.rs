use std::time::Duration;

use integration_tests::prelude::*;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn scripted_switch() -> ScriptedSwitch {
    ScriptedSwitch::new(Duration::from_millis(10), Duration::from_millis(10))
}

fn encoded(telegrams: &[Telegram]) -> Vec<CanMessage> {
    telegrams.iter().map(Telegram::encode).collect()
}

#[tokio::test(start_paused = true)]
async fn test_default_state_sent_once_at_startup() {
    init_logging();
    let config = HeadlightConfig::default();
    let (mut controller, bus, delay) = sim_controller(&config);
    let catalog = Catalog::new(config.node_id);

    controller.start().await;
    controller.start().await;
    for _ in 0..3 {
        controller.tick(&SwitchSample::idle()).await;
    }

    let sent = bus.sent();
    assert_eq!(
        encoded(&[catalog.low_beam(LowBeamMode::AutoInternalSpeed)]),
        sent
    );
    assert_eq!(CanId::Std(0x66F), sent[0].id());
    assert_eq!(&[0x2B, 0x00, 0x22, 0x00, 0x02, 0x83, 0x00, 0x00], sent[0].data());
    assert!(delay.requested().is_empty());
    assert_eq!(BeamPhase::Default, controller.phase());
    assert_eq!(
        BeamState::new(LowBeamMode::AutoInternalSpeed),
        controller.beam_state()
    );
}

#[tokio::test(start_paused = true)]
async fn test_first_tick_sends_default_before_switch_commands() {
    init_logging();
    let config = HeadlightConfig::default();
    let (mut controller, bus, _delay) = sim_controller(&config);
    let catalog = Catalog::new(config.node_id);

    let press = SwitchSample {
        level: false,
        fell: true,
        rose: false,
        held_duration: Duration::ZERO,
    };
    controller.tick(&press).await;

    let sent = bus.sent();
    assert_eq!(5, sent.len());
    assert_eq!(catalog.low_beam(LowBeamMode::AutoInternalSpeed).encode(), sent[0]);
    assert_eq!(catalog.high_beam(true).encode(), sent[1]);
}

#[tokio::test(start_paused = true)]
async fn test_short_press_flashes() {
    init_logging();
    let config = HeadlightConfig::default();
    let (mut controller, bus, delay) = sim_controller(&config);
    let catalog = Catalog::new(config.node_id);
    controller.start().await;
    bus.take_sent();

    let mut switch = scripted_switch()
        .release_for(Duration::from_millis(50))
        .press_for(Duration::from_millis(100))
        .release_for(Duration::from_millis(200));
    play(&mut controller, &mut switch).await;

    let hbon = catalog.high_beam(true);
    let default = catalog.low_beam(LowBeamMode::AutoInternalSpeed);
    assert_eq!(encoded(&[hbon, default, hbon, default]), bus.sent());
    assert_eq!(vec![Duration::from_millis(20); 3], delay.requested());
    assert_eq!(BeamPhase::Default, controller.phase());
    assert!(!controller.beam_state().high_beam);
}

#[tokio::test(start_paused = true)]
async fn test_long_press_holds_high_beam() {
    init_logging();
    let config = HeadlightConfig::default();
    let (mut controller, bus, delay) = sim_controller(&config);
    let catalog = Catalog::new(config.node_id);
    controller.start().await;

    let mut switch = scripted_switch()
        .release_for(Duration::from_millis(50))
        .press_for(Duration::from_millis(700))
        .release_for(Duration::from_millis(100));

    // Pressed at 50ms, accepted at 60ms, and held past the threshold by 600ms
    for _ in 0..60 {
        let sample = switch.sample();
        controller.tick(&sample).await;
    }
    assert_eq!(BeamPhase::HighBeamHeld, controller.phase());
    assert!(controller.beam_state().high_beam);
    bus.take_sent();
    delay.clear();

    play(&mut controller, &mut switch).await;
    // play runs the full script length again, which only adds idle samples after the release
    assert_eq!(
        encoded(&[catalog.low_beam(LowBeamMode::AutoInternalSpeed)]),
        bus.sent()
    );
    assert!(delay.requested().is_empty());
    assert_eq!(BeamPhase::Default, controller.phase());
    assert!(!controller.beam_state().high_beam);
}

#[tokio::test(start_paused = true)]
async fn test_long_press_telegram_sequence() {
    init_logging();
    let config = HeadlightConfig::default();
    let (mut controller, bus, _delay) = sim_controller(&config);
    let catalog = Catalog::new(config.node_id);
    controller.start().await;
    bus.take_sent();

    let mut switch = scripted_switch()
        .release_for(Duration::from_millis(50))
        .press_for(Duration::from_millis(600))
        .release_for(Duration::from_millis(100));
    play(&mut controller, &mut switch).await;

    let hbon = catalog.high_beam(true);
    let default = catalog.low_beam(LowBeamMode::AutoInternalSpeed);
    // The flash signal on the press, one high beam on at the threshold, one default on release
    assert_eq!(
        encoded(&[hbon, default, hbon, default, hbon, default]),
        bus.sent()
    );
}

#[tokio::test(start_paused = true)]
async fn test_configured_timing() {
    init_logging();
    let config = HeadlightConfig::load_from_str(
        r#"
            default_low_beam = 0x81
            hold_threshold_ms = 200
            flash_delay_ms = 5
        "#,
    )
    .unwrap();
    let (mut controller, bus, delay) = sim_controller(&config);
    let catalog = Catalog::new(config.node_id);

    let mut switch = scripted_switch()
        .press_for(Duration::from_millis(300))
        .release_for(Duration::from_millis(50));
    play(&mut controller, &mut switch).await;

    let hbon = catalog.high_beam(true);
    let default = catalog.low_beam(LowBeamMode::AutoLightSensor);
    assert_eq!(
        encoded(&[default, hbon, default, hbon, default, hbon, default]),
        bus.sent()
    );
    assert_eq!(vec![Duration::from_millis(5); 3], delay.requested());
}

#[tokio::test(start_paused = true)]
async fn test_send_failure_does_not_stop_loop() {
    init_logging();
    let config = HeadlightConfig::default();
    let (mut controller, bus, _delay) = sim_controller(&config);
    let catalog = Catalog::new(config.node_id);

    bus.set_fail_sends(true);
    controller.tick(&SwitchSample::idle()).await;
    assert!(bus.sent().is_empty());
    // Nothing was accepted, so nothing is recorded as commanded
    assert_eq!(BeamState::new(LowBeamMode::Off), controller.beam_state());

    let result = controller.set_high_beam(true).await;
    assert_eq!(
        Err(TransportError::SendFailed {
            message: "simulated failure sending to 0x66f".into()
        }),
        result
    );
    assert!(!controller.beam_state().high_beam);

    bus.set_fail_sends(false);
    let mut switch = scripted_switch()
        .press_for(Duration::from_millis(50))
        .release_for(Duration::from_millis(50));
    play(&mut controller, &mut switch).await;

    // The startup default is not retried
    let hbon = catalog.high_beam(true);
    let default = catalog.low_beam(LowBeamMode::AutoInternalSpeed);
    assert_eq!(encoded(&[hbon, default, hbon, default]), bus.sent());
    assert_eq!(LowBeamMode::AutoInternalSpeed, controller.beam_state().low_beam);
}

#[tokio::test(start_paused = true)]
async fn test_received_frames_do_not_change_state() {
    init_logging();
    let config = HeadlightConfig::default();
    let (mut controller, bus, _delay) = sim_controller(&config);
    controller.start().await;
    let before = controller.beam_state();

    let reply = CanMessage::new(CanId::std(0x5EF), b"\x00SUPERNO");
    bus.inject(reply);
    assert_eq!(Some(reply), controller.listen_once().await);
    assert_eq!(None, controller.listen_once().await);

    bus.inject(CanMessage::new(CanId::std(0x5EF), &[0x03, 0x01]));
    controller.tick(&SwitchSample::idle()).await;
    assert_eq!(before, controller.beam_state());
    assert_eq!(BeamPhase::Default, controller.phase());
    assert_eq!(1, bus.sent().len());
}

#[tokio::test(start_paused = true)]
async fn test_bus_state_changes_reported_once() {
    init_logging();
    let (mut controller, bus, _delay) = sim_controller(&HeadlightConfig::default());

    assert_eq!(Some(BusState::ErrorActive), controller.poll_bus_state());
    assert_eq!(None, controller.poll_bus_state());
    bus.set_bus_state(BusState::BusOff);
    assert_eq!(Some(BusState::BusOff), controller.poll_bus_state());
    assert_eq!(None, controller.poll_bus_state());
    bus.set_bus_state(BusState::ErrorActive);
    assert_eq!(Some(BusState::ErrorActive), controller.poll_bus_state());
}

#[tokio::test(start_paused = true)]
async fn test_probe_sends_sequence_in_order() {
    init_logging();
    let config = HeadlightConfig::default();
    let (mut controller, bus, delay) = sim_controller(&config);

    let sequence = controller.catalog().probe_sequence();
    bus.inject(CanMessage::new(CanId::std(0x5EF), &[0x80, 0, 0, 0]));
    let sent = controller.probe(&sequence, config.probe_interval()).await;

    assert_eq!(sequence.len(), sent);
    assert_eq!(encoded(&sequence), bus.sent());
    assert_eq!(vec![Duration::from_secs(1); sequence.len()], delay.requested());
    assert_eq!(BeamPhase::Default, controller.phase());
}

#[tokio::test(start_paused = true)]
async fn test_direct_commands_update_beam_state() {
    init_logging();
    let config = HeadlightConfig::default();
    let (mut controller, bus, _delay) = sim_controller(&config);
    let catalog = Catalog::new(config.node_id);

    controller.set_drl(true).await.unwrap();
    controller.set_low_beam(LowBeamMode::On).await.unwrap();
    controller.set_high_beam(true).await.unwrap();
    controller.set_speed(25).await.unwrap();

    assert_eq!(
        BeamState {
            low_beam: LowBeamMode::On,
            high_beam: true,
            drl: true,
        },
        controller.beam_state()
    );
    assert_eq!(
        encoded(&[
            catalog.drl(true),
            catalog.low_beam(LowBeamMode::On),
            catalog.high_beam(true),
            catalog.set_speed(25),
        ]),
        bus.sent()
    );
}
