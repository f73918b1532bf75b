use buspirate::{BusPirate, BusPirateBuilder, BusPirateError, I2cSpeed};
use clap::{Parser, ValueEnum};
use ds2484::{DeviceConfiguration, Ds2484Builder, Ds2484Error};
use ds18b20::Ds18b20;
use embedded_onewire::{Address, OneWireError};
use linux_embedded_hal::Delay;
use log::{error, info, warn};
use std::process::ExitCode;

mod serial;
use serial::SerialTransport;

/// Sensors read when no ROM id is given.
const DEFAULT_ROMS: [[u8; 8]; 2] = [
    [0x28, 0x23, 0x49, 0x83, 0x06, 0x00, 0x00, 0x6b],
    [0x28, 0xa9, 0xe8, 0x83, 0x06, 0x00, 0x00, 0xb0],
];

/// Read DS18B20 sensors through a DS2484 bridge attached to a Bus Pirate
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Serial port of the Bus Pirate (e.g., /dev/ttyUSB0)
    #[arg(short, long)]
    port: String,
    /// Serial baud rate
    #[arg(short, long, default_value_t = 115200)]
    baud: u32,
    /// ROM id of a sensor, 16 hex digits in bus order (e.g., 28:23:49:83:06:00:00:6b), or * for
    /// all sensors; repeat for several sensors
    #[arg(short, long = "rom")]
    roms: Vec<Address>,
    /// I2C clock between the Bus Pirate and the bridge
    #[arg(short, long, value_enum, default_value_t = Speed::Khz100)]
    speed: Speed,
    /// Time allowed for a temperature conversion, in milliseconds
    #[arg(short, long, default_value_t = 500)]
    conversion_ms: u32,
    /// Fail when a bus reset sees no presence pulse instead of only warning
    #[arg(long)]
    require_presence: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Speed {
    Khz5,
    Khz50,
    Khz100,
    Khz400,
}

impl From<Speed> for I2cSpeed {
    fn from(value: Speed) -> Self {
        match value {
            Speed::Khz5 => I2cSpeed::Khz5,
            Speed::Khz50 => I2cSpeed::Khz50,
            Speed::Khz100 => I2cSpeed::Khz100,
            Speed::Khz400 => I2cSpeed::Khz400,
        }
    }
}

type PirateError = BusPirateError<serialport::Error>;

#[derive(Debug)]
enum Failure {
    BusPirate(PirateError),
    Bridge(Ds2484Error<PirateError>),
    OneWire(OneWireError<Ds2484Error<PirateError>>),
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Failure::BusPirate(e) => write!(f, "Bus Pirate: {e}"),
            Failure::Bridge(e) => write!(f, "DS2484: {e}"),
            Failure::OneWire(e) => write!(f, "1-Wire: {e}"),
        }
    }
}

impl From<PirateError> for Failure {
    fn from(value: PirateError) -> Self {
        Failure::BusPirate(value)
    }
}

impl From<Ds2484Error<PirateError>> for Failure {
    fn from(value: Ds2484Error<PirateError>) -> Self {
        Failure::Bridge(value)
    }
}

impl From<OneWireError<Ds2484Error<PirateError>>> for Failure {
    fn from(value: OneWireError<Ds2484Error<PirateError>>) -> Self {
        Failure::OneWire(value)
    }
}

fn run(pirate: &mut BusPirate<SerialTransport, Delay>, args: &Args) -> Result<(), Failure> {
    pirate.enter_i2c_mode()?;
    // Reset the bridge, active pullup on, strong pullup, power-down and overdrive off
    let mut bridge = Ds2484Builder::default()
        .with_config(DeviceConfiguration::new().with_active_pullup(true))
        .with_presence_check(args.require_presence)
        .build(&mut *pirate, Delay)?;
    info!("DS2484: {}", bridge.get_status()?);
    let sensor = Ds18b20::default().with_conversion_delay_ms(args.conversion_ms);
    let roms = if args.roms.is_empty() {
        DEFAULT_ROMS.map(Address::from_bytes).to_vec()
    } else {
        args.roms.clone()
    };
    let mut delay = Delay;
    for rom in roms {
        if rom.family().is_some_and(|f| f != Ds18b20::family()) {
            warn!("{rom} is not a DS18B20 ROM id");
        }
        sensor.measure(&mut bridge, &mut delay, rom)?;
        let reading = sensor.read(&mut bridge, rom)?;
        println!(
            "{rom}: temp C = {}, temp F = {:.4}",
            reading.celsius(),
            reading.fahrenheit()
        );
    }
    Ok(())
}

fn main() -> ExitCode {
    // Initialize the logger
    env_logger::init();
    // Parse command line arguments
    let args = Args::parse();
    // Open the serial port
    let port = match SerialTransport::open(&args.port, args.baud) {
        Ok(port) => port,
        Err(e) => {
            error!("Failed to open {}: {e}", args.port);
            return ExitCode::FAILURE;
        }
    };
    let mut pirate = BusPirateBuilder::default()
        .with_speed(args.speed.into())
        .build(port, Delay);
    let res = run(&mut pirate, &args);
    // Always hand the adapter back in terminal mode
    pirate.cleanup();
    match res {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
