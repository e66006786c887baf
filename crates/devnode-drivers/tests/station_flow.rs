//! End-to-end flow of a small station: sensor and outputs registered,
//! supervised, switched by control messages, then shut down.

use std::sync::Arc;
use std::time::Duration;

use devnode_core::{
    Component, DeviceRegistry, DeviceState, Error, ExecContext, MockSwitch, Supervisor,
};
use devnode_drivers::mock::{MockEnvironmentBus, MockPin};
use devnode_drivers::{
    ChannelPublisher, DigitalOutput, EnvPayload, EnvReading, EnvSensor, OutputKind, Published,
    control_topic, data_topic, dispatch_command, run_control_loop,
};
use tokio::sync::mpsc;

const STATION: &str = "station";

struct Station {
    registry: Arc<DeviceRegistry>,
    sensor: Arc<EnvSensor<MockEnvironmentBus>>,
    led: Arc<DigitalOutput<MockPin>>,
    relay: Arc<DigitalOutput<MockPin>>,
    relay_pin: MockPin,
    data_rx: mpsc::Receiver<Published>,
}

fn build_station(mock: bool) -> Station {
    let switch = Arc::new(MockSwitch::new());
    switch.set(mock);

    let (publisher, data_rx) = ChannelPublisher::new(256);
    let publisher = Arc::new(publisher);

    let (bus, _handle) = MockEnvironmentBus::with_default(EnvReading::new(10.0, 60.0, 1000.0));
    let sensor = Arc::new(EnvSensor::new(
        "bme280",
        bus,
        publisher.clone(),
        data_topic(STATION, "bme280"),
        switch.clone(),
    ));

    let led = Arc::new(DigitalOutput::new(
        "led",
        OutputKind::Led,
        MockPin::new(6),
        publisher.clone(),
        data_topic(STATION, "led"),
        switch.clone(),
    ));

    let relay_pin = MockPin::new(26);
    let relay = Arc::new(DigitalOutput::new(
        "relay",
        OutputKind::Relay,
        relay_pin.clone(),
        publisher,
        data_topic(STATION, "relay"),
        switch,
    ));

    let registry = Arc::new(DeviceRegistry::new());
    registry.add(sensor.clone()).unwrap();
    registry.add(led.clone()).unwrap();
    registry.add(relay.clone()).unwrap();

    Station {
        registry,
        sensor,
        led,
        relay,
        relay_pin,
        data_rx,
    }
}

fn spawn_all(supervisor: &mut Supervisor, station: &Station, period: Duration) {
    let sensor = station.sensor.clone();
    supervisor.spawn(station.sensor.clone(), period, move || {
        let sensor = sensor.clone();
        async move { sensor.read_publish().await }
    })
    .unwrap();

    for output in [&station.led, &station.relay] {
        let handle = output.clone();
        supervisor.spawn(output.clone(), period, move || {
            let result = handle.publish_state();
            async move { result }
        })
        .unwrap();
    }
}

fn sensor_messages(rx: &mut mpsc::Receiver<Published>) -> Vec<EnvPayload> {
    let mut payloads = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        if msg.topic == "station/bme280/data" {
            payloads.push(serde_json::from_slice(&msg.payload).unwrap());
        }
    }
    payloads
}

#[tokio::test(start_paused = true)]
async fn test_station_runs_and_stops() {
    let mut station = build_station(false);
    station.sensor.init().await.unwrap();

    let mut supervisor = Supervisor::new(ExecContext::new());
    spawn_all(&mut supervisor, &station, Duration::from_millis(100));

    tokio::time::sleep(Duration::from_millis(350)).await;

    for snapshot in station.registry.snapshots() {
        assert_eq!(snapshot.state, DeviceState::Running, "{}", snapshot.name);
        assert_eq!(snapshot.period, Duration::from_millis(100));
    }

    let report = supervisor.shutdown().await;
    assert_eq!(report.stopped, 3);
    assert!(report.is_clean());

    for snapshot in station.registry.snapshots() {
        assert_eq!(snapshot.state, DeviceState::Stopped, "{}", snapshot.name);
        assert!(!snapshot.has_error());
    }

    let readings = sensor_messages(&mut station.data_rx);
    assert_eq!(readings.len(), 3);
    for payload in readings {
        assert_eq!(payload.temperature, "50.00");
        assert_eq!(payload.humidity, "60.00");
    }
}

#[tokio::test(start_paused = true)]
async fn test_sensor_failure_is_captured_not_fatal() {
    let station = build_station(false);

    // Never initialized: every bus read fails.
    let mut supervisor = Supervisor::new(ExecContext::new());
    let sensor = station.sensor.clone();
    supervisor
        .spawn(station.sensor.clone(), Duration::from_millis(50), move || {
            let sensor = sensor.clone();
            async move { sensor.read_publish().await }
        })
        .unwrap();

    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(station.sensor.device().state(), DeviceState::Error);

    let report = supervisor.shutdown().await;
    assert_eq!(report.stopped, 1);

    let snapshot = station.sensor.device().snapshot();
    assert_eq!(snapshot.state, DeviceState::Stopped);
    assert!(snapshot.error.contains("read before init"));
}

#[tokio::test(start_paused = true)]
async fn test_mock_station_publishes_synthetic_data() {
    let mut station = build_station(true);
    station.sensor.init().await.unwrap();

    let ctx = ExecContext::with_timeout(Duration::from_millis(250));
    let mut supervisor = Supervisor::new(ctx);
    spawn_all(&mut supervisor, &station, Duration::from_millis(100));

    let report = supervisor.wait().await;
    assert_eq!(report.stopped, 3);

    let readings = sensor_messages(&mut station.data_rx);
    assert_eq!(readings.len(), 2);
    for payload in readings {
        let value: f64 = payload.humidity.parse().unwrap();
        assert!((0.0..=100.0).contains(&value));
    }
}

#[tokio::test]
async fn test_control_messages_reach_outputs() {
    let station = build_station(false);
    let (tx, rx) = mpsc::channel(8);

    let send = |device: &str, payload: &str| Published {
        topic: control_topic(STATION, device),
        payload: payload.as_bytes().to_vec(),
    };
    tx.send(send("relay", "on")).await.unwrap();
    tx.send(send("led", "1")).await.unwrap();
    tx.send(send("bme280", "on")).await.unwrap();
    tx.send(send("missing", "on")).await.unwrap();
    drop(tx);

    let applied = run_control_loop(&ExecContext::new(), &station.registry, rx).await;

    assert_eq!(applied, 2);
    assert!(station.relay_pin.is_high());
    assert!(station.led.is_on());

    let err = dispatch_command(&station.registry, "bme280", "off").unwrap_err();
    assert!(matches!(err, Error::Unsupported { .. }));
}
