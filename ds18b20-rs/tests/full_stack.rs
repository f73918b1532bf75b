//! DS18B20 behind a DS2484 behind a Bus Pirate, against a scripted serial port.

use buspirate::{
    BusPirate, Mode,
    mock::{Exchange, ScriptedPort},
};
use ds18b20::{Ds18b20, Temperature};
use ds2484::{Ds2484, Ds2484Builder};
use embedded_hal_mock::eh1::delay::NoopDelay;
use embedded_onewire::Address;

const ROM: [u8; 8] = [0x28, 0x23, 0x49, 0x83, 0x06, 0x00, 0x00, 0x6b];
const IDLE: u8 = 0x02; // presence pulse seen, not busy
const BUSY: u8 = 0x03;
// status bytes as a bridge reports them when only the busy flag is looked at
const BARE_IDLE: u8 = 0x00;
const BARE_BUSY: u8 = 0x01;

fn i2c_entry(script: &mut Vec<Exchange>) {
    script.extend([
        Exchange::handshake([0x0f]),
        Exchange::silent([0; 20]),
        Exchange::new([0x00], *b"BBIO1"),
        Exchange::new([0x02], *b"I2C1"),
        Exchange::handshake([0x4c]),
        Exchange::handshake([0x62]),
    ]);
}

/// One I2C write to the bridge: start, bulk frame with the write address, stop.
fn bridge_write(script: &mut Vec<Exchange>, payload: &[u8]) {
    let mut frame = vec![0x10 | payload.len() as u8, 0x30];
    frame.extend_from_slice(payload);
    script.extend([
        Exchange::handshake([0x02]),
        Exchange::acked(frame),
        Exchange::handshake([0x03]),
    ]);
}

/// Read pointer write followed by a one byte read from the bridge.
fn register_read(script: &mut Vec<Exchange>, selector: u8, value: u8) {
    bridge_write(script, &[0xe1, selector]);
    script.extend([
        Exchange::handshake([0x02]),
        Exchange::acked([0x10, 0x31]),
        Exchange::new([0x04], [value]),
        Exchange::handshake([0x07]),
        Exchange::handshake([0x03]),
    ]);
}

fn addressed_write(script: &mut Vec<Exchange>, statuses: &[u8], idle: u8, command: u8) {
    for &status in statuses {
        register_read(script, 0xf0, status);
    }
    bridge_write(script, &[0xb4]);
    register_read(script, 0xf0, idle);
    bridge_write(script, &[0xa5, 0x55]);
    for b in ROM {
        bridge_write(script, &[0xa5, b]);
    }
    bridge_write(script, &[0xa5, command]);
}

fn measure_then_read_script(idle: u8, busy: u8) -> Vec<Exchange> {
    let mut script = Vec::new();
    i2c_entry(&mut script);
    addressed_write(&mut script, &[busy, busy, idle], idle, 0x44);
    addressed_write(&mut script, &[idle], idle, 0xbe);
    for data in [0xa0, 0x00] {
        register_read(&mut script, 0xf0, idle);
        bridge_write(&mut script, &[0x96]);
        register_read(&mut script, 0xe1, data);
    }
    script
}

#[test]
fn measure_then_read() {
    let script = measure_then_read_script(IDLE, BUSY);

    let mut port = ScriptedPort::new(script);
    let mut pirate = BusPirate::new(&mut port, NoopDelay::new());
    pirate.enter_i2c_mode().unwrap();
    assert_eq!(pirate.mode(), Mode::I2c);

    let mut bridge = Ds2484::new(&mut pirate, NoopDelay::new());
    let sensor = Ds18b20::default();
    let rom = Address::from_bytes(ROM);
    sensor
        .measure(&mut bridge, &mut NoopDelay::new(), rom)
        .unwrap();
    let reading = sensor.read(&mut bridge, rom).unwrap();
    assert_eq!(reading.celsius(), Temperature::from_num(10));
    assert!((reading.fahrenheit() - 50.0).abs() < 1e-4);

    drop(bridge);
    drop(pirate);
    // 6 to enter I2C mode, 65 for the conversion, 87 for the scratch pad
    assert_eq!(port.writes(), 6 + 65 + 87);
    port.done();
}

#[test]
fn busy_flag_alone_gates_the_exchange() {
    let script = measure_then_read_script(BARE_IDLE, BARE_BUSY);

    let mut port = ScriptedPort::new(script);
    let mut pirate = BusPirate::new(&mut port, NoopDelay::new());
    pirate.enter_i2c_mode().unwrap();
    let mut bridge = Ds2484::new(&mut pirate, NoopDelay::new());
    let sensor = Ds18b20::default();
    let rom = Address::from_bytes(ROM);
    sensor
        .measure(&mut bridge, &mut NoopDelay::new(), rom)
        .unwrap();
    let reading = sensor.read(&mut bridge, rom).unwrap();
    assert_eq!(reading.celsius(), Temperature::from_num(10));
    assert!((reading.fahrenheit() - 50.0).abs() < 1e-4);

    drop(bridge);
    drop(pirate);
    assert_eq!(port.writes(), 6 + 65 + 87);
    port.done();
}

#[test]
fn missing_sensor_stops_the_exchange() {
    let mut script = Vec::new();
    i2c_entry(&mut script);
    // device reset, the read pointer is left on the status register
    bridge_write(&mut script, &[0xf0]);
    script.extend([
        Exchange::handshake([0x02]),
        Exchange::acked([0x10, 0x31]),
        Exchange::new([0x04], [0x10]),
        Exchange::handshake([0x07]),
        Exchange::handshake([0x03]),
    ]);
    register_read(&mut script, 0xf0, BARE_IDLE);
    bridge_write(&mut script, &[0xb4]);
    register_read(&mut script, 0xf0, BARE_IDLE);

    let mut port = ScriptedPort::new(script);
    let mut pirate = BusPirate::new(&mut port, NoopDelay::new());
    pirate.enter_i2c_mode().unwrap();
    let mut bridge = Ds2484Builder::default()
        .with_presence_check(true)
        .build(&mut pirate, NoopDelay::new())
        .unwrap();
    let res = Ds18b20::default().measure(&mut bridge, &mut NoopDelay::new(), Address::Any);
    assert!(matches!(
        res,
        Err(embedded_onewire::OneWireError::NoDevicePresent)
    ));
    drop(bridge);
    drop(pirate);
    port.done();
}
