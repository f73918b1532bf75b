#![no_std]
//! DS18B20 digital thermometer on a 1-Wire bus.
//!
//! A measurement is two transactions: a Convert T command, after which the sensor needs up to
//! 750 ms (12-bit resolution) before the result is valid, and a Read Scratchpad command whose
//! first two bytes hold the temperature.
use core::fmt;
use embedded_hal::delay::DelayNs;
use embedded_onewire::{Address, OneWire, OneWireResult};
use fixed::types::I12F4;
use log::info;

/// Temperature in degrees Celsius, 1/16 degree resolution.
pub type Temperature = I12F4;

const DS18B20_START_CONV: u8 = 0x44;
const DS18B20_READ_SCRATCH: u8 = 0xbe;

/// Driver settings shared by every DS18B20 on a bus.
#[derive(Debug, Clone, Copy)]
pub struct Ds18b20 {
    conversion_ms: u32,
}

impl Default for Ds18b20 {
    fn default() -> Self {
        Self { conversion_ms: 500 }
    }
}

impl Ds18b20 {
    /// Family code of DS18B20 ROM ids.
    #[inline]
    pub const fn family() -> u8 {
        0x28
    }

    /// Sets how long [`measure`](Ds18b20::measure) waits for the conversion to finish.
    ///
    /// There is no completion signal; the wait must cover the worst case conversion time of
    /// the configured resolution.
    pub fn with_conversion_delay_ms(mut self, ms: u32) -> Self {
        self.conversion_ms = ms;
        self
    }

    /// Starts a temperature conversion on `address` (or on every sensor with [`Address::Any`])
    /// and waits for it to complete.
    pub fn measure<O: OneWire, D: DelayNs>(
        &self,
        bus: &mut O,
        delay: &mut D,
        address: Address,
    ) -> OneWireResult<(), O::BusError> {
        bus.write_addressed(address, &[DS18B20_START_CONV])?;
        delay.delay_ms(self.conversion_ms); // wait till conversion is finished
        Ok(())
    }

    /// Reads the last conversion result of `address`.
    ///
    /// Only the two temperature bytes of the scratch pad are read, so the CRC is not checked.
    /// [`Address::Any`] only makes sense with a single sensor on the bus.
    pub fn read<O: OneWire>(
        &self,
        bus: &mut O,
        address: Address,
    ) -> OneWireResult<Reading, O::BusError> {
        bus.write_addressed(address, &[DS18B20_READ_SCRATCH])?;
        let mut raw = [0; 2];
        bus.read_bytes(&mut raw)?;
        let reading = Reading::from_scratchpad(raw);
        info!("DS18B20 {address}: {reading}");
        Ok(reading)
    }
}

/// Temperature bytes of a DS18B20 scratch pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reading {
    raw: [u8; 2],
}

impl Reading {
    /// Wraps the first two scratch pad bytes (LSB first).
    pub const fn from_scratchpad(raw: [u8; 2]) -> Self {
        Self { raw }
    }

    /// The scratch pad bytes.
    pub const fn raw(&self) -> [u8; 2] {
        self.raw
    }

    /// Temperature in degrees Celsius.
    ///
    /// The register is a sign-extended two's complement count of 1/16 degree.
    pub fn celsius(&self) -> Temperature {
        I12F4::from_le_bytes(self.raw)
    }

    /// Temperature in degrees Fahrenheit.
    pub fn fahrenheit(&self) -> f32 {
        self.celsius().to_num::<f32>() * 1.8 + 32.0
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} C / {:.4} F", self.celsius(), self.fahrenheit())
    }
}
