use crate::{
    Ds2484, Ds2484Result,
    registers::{DeviceStatus, Register},
};
use embedded_hal::{
    delay::DelayNs,
    i2c::{I2c, SevenBitAddress},
};
use embedded_onewire::{OneWire, OneWireError, OneWireResult, OneWireStatus};
use log::{debug, warn};

pub(crate) const ONEWIRE_RESET_CMD: u8 = 0xb4;
pub(crate) const ONEWIRE_WRITE_BYTE: u8 = 0xa5;
pub(crate) const ONEWIRE_READ_BYTE: u8 = 0x96;
pub(crate) const ONEWIRE_TRIPLET: u8 = 0x78;

impl<I2C: I2c<SevenBitAddress>, D: DelayNs> Ds2484<I2C, D> {
    /// Generates a 1-Wire reset/presence-detect cycle. Returns without waiting for it to end.
    pub fn onewire_reset(&mut self) -> Ds2484Result<(), I2C::Error> {
        self.command(&[ONEWIRE_RESET_CMD])
    }

    /// Writes one byte on the 1-Wire line, then pauses for the configured pace.
    ///
    /// The byte goes out while the I2C side is already free, so the pause keeps the next
    /// command from landing on a busy line.
    pub fn onewire_write_byte(&mut self, byte: u8) -> Ds2484Result<(), I2C::Error> {
        self.command(&[ONEWIRE_WRITE_BYTE, byte])?;
        self.delay.delay_ms(self.byte_pace_ms);
        Ok(())
    }

    /// Generates eight read time slots; the result lands in the read data register.
    pub fn onewire_read_into_data(&mut self) -> Ds2484Result<(), I2C::Error> {
        self.command(&[ONEWIRE_READ_BYTE])
    }

    /// Reads the read data register.
    pub fn read_data_register(&mut self) -> Ds2484Result<u8, I2C::Error> {
        let mut buf = [0];
        self.read_register(Register::Data, &mut buf)?;
        Ok(buf[0])
    }

    /// Runs a 1-Wire triplet (two read slots and one write slot) and returns the resulting
    /// status, whose SBR, TSB and DIR bits hold the outcome.
    ///
    /// `direction` is the bit written when both read slots return 0.
    pub fn onewire_triplet(&mut self, direction: bool) -> Ds2484Result<DeviceStatus, I2C::Error> {
        self.wait_until_idle()?;
        self.command(&[ONEWIRE_TRIPLET, if direction { 0x80 } else { 0x00 }])?;
        self.wait_until_idle()
    }

    /// Waits for the line to be idle, resets the bus and waits for the presence-detect cycle to
    /// finish. This is how every addressed 1-Wire exchange begins.
    pub fn new_transaction(&mut self) -> Ds2484Result<DeviceStatus, I2C::Error> {
        self.wait_until_idle()?;
        self.onewire_reset()?;
        self.wait_until_idle()
    }
}

impl<I2C: I2c<SevenBitAddress>, D: DelayNs> OneWire for Ds2484<I2C, D> {
    type Status = DeviceStatus;

    type BusError = crate::Ds2484Error<I2C::Error>;

    fn reset(&mut self) -> OneWireResult<Self::Status, Self::BusError> {
        let status = self.new_transaction()?;
        debug!("DS2484: bus reset, {status}");
        if status.shortcircuit() {
            return Err(OneWireError::ShortCircuit);
        }
        if !status.presence() {
            if self.require_presence {
                return Err(OneWireError::NoDevicePresent);
            }
            warn!("DS2484: no presence pulse after bus reset");
        }
        Ok(status)
    }

    fn write_byte(&mut self, byte: u8) -> OneWireResult<(), Self::BusError> {
        Ok(self.onewire_write_byte(byte)?)
    }

    fn read_byte(&mut self) -> OneWireResult<u8, Self::BusError> {
        self.wait_until_idle()?;
        self.onewire_read_into_data()?;
        Ok(self.read_data_register()?)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use crate::{Address, Ds2484, Ds2484Error};
    use embedded_hal_mock::eh1::{
        delay::NoopDelay,
        i2c::{Mock as I2cMock, Transaction as I2cTransaction},
    };
    use embedded_onewire::{OneWire, OneWireError};
    use std::{vec, vec::Vec};

    const ADDR: u8 = 0x18;

    fn status_read(status: u8) -> [I2cTransaction; 2] {
        [
            I2cTransaction::write(ADDR, vec![0xe1, 0xf0]),
            I2cTransaction::read(ADDR, vec![status]),
        ]
    }

    #[test]
    fn reset_waits_before_and_after() {
        let mut expectations: Vec<I2cTransaction> = Vec::new();
        expectations.extend(status_read(0x01));
        expectations.extend(status_read(0x00));
        expectations.push(I2cTransaction::write(ADDR, vec![0xb4]));
        expectations.extend(status_read(0x01));
        expectations.extend(status_read(0x0a));
        let mut i2c = I2cMock::new(&expectations);
        let mut dev = Ds2484::new(i2c.clone(), NoopDelay::new());
        let status = dev.reset().unwrap();
        assert!(status.present_pulse_detect());
        assert!(status.logic_level());
        i2c.done();
    }

    #[test]
    fn reset_reports_bus_faults() {
        let mut expectations: Vec<I2cTransaction> = Vec::new();
        expectations.extend(status_read(0x00));
        expectations.push(I2cTransaction::write(ADDR, vec![0xb4]));
        expectations.extend(status_read(0x00));
        expectations.extend(status_read(0x00));
        expectations.push(I2cTransaction::write(ADDR, vec![0xb4]));
        expectations.extend(status_read(0x06));
        let mut i2c = I2cMock::new(&expectations);
        let mut dev = Ds2484::new(i2c.clone(), NoopDelay::new());
        dev.require_presence = true;
        assert!(matches!(dev.reset(), Err(OneWireError::NoDevicePresent)));
        assert!(matches!(dev.reset(), Err(OneWireError::ShortCircuit)));
        i2c.done();
    }

    #[test]
    fn missing_presence_pulse_is_tolerated_by_default() {
        let mut expectations: Vec<I2cTransaction> = Vec::new();
        expectations.extend(status_read(0x01));
        expectations.extend(status_read(0x00));
        expectations.push(I2cTransaction::write(ADDR, vec![0xb4]));
        expectations.extend(status_read(0x00));
        expectations.extend(status_read(0x00));
        expectations.push(I2cTransaction::write(ADDR, vec![0xb4]));
        expectations.extend(status_read(0x04));
        let mut i2c = I2cMock::new(&expectations);
        let mut dev = Ds2484::new(i2c.clone(), NoopDelay::new());
        let status = dev.reset().unwrap();
        assert!(!status.present_pulse_detect());
        assert!(matches!(dev.reset(), Err(OneWireError::ShortCircuit)));
        i2c.done();
    }

    #[test]
    fn addressed_write_sends_one_command_per_byte() {
        let rom = [0x28, 0x23, 0x49, 0x83, 0x06, 0x00, 0x00, 0x6b];
        let mut expectations: Vec<I2cTransaction> = Vec::new();
        expectations.extend(status_read(0x00));
        expectations.push(I2cTransaction::write(ADDR, vec![0xb4]));
        expectations.extend(status_read(0x02));
        expectations.push(I2cTransaction::write(ADDR, vec![0xa5, 0x55]));
        for b in rom {
            expectations.push(I2cTransaction::write(ADDR, vec![0xa5, b]));
        }
        expectations.push(I2cTransaction::write(ADDR, vec![0xa5, 0x44]));
        let mut i2c = I2cMock::new(&expectations);
        let mut dev = Ds2484::new(i2c.clone(), NoopDelay::new());
        dev.write_addressed(Address::from_bytes(rom), &[0x44]).unwrap();
        i2c.done();
    }

    #[test]
    fn read_polls_then_fetches_data_register() {
        let mut expectations: Vec<I2cTransaction> = Vec::new();
        for (busy, data) in [(0x01, 0xa0), (0x00, 0x00)] {
            expectations.extend(status_read(busy));
            if busy == 0x01 {
                expectations.extend(status_read(0x00));
            }
            expectations.push(I2cTransaction::write(ADDR, vec![0x96]));
            expectations.push(I2cTransaction::write(ADDR, vec![0xe1, 0xe1]));
            expectations.push(I2cTransaction::read(ADDR, vec![data]));
        }
        let mut i2c = I2cMock::new(&expectations);
        let mut dev = Ds2484::new(i2c.clone(), NoopDelay::new());
        let mut buf = [0; 2];
        dev.read_bytes(&mut buf).unwrap();
        assert_eq!(buf, [0xa0, 0x00]);
        i2c.done();
    }

    #[test]
    fn triplet_returns_outcome() {
        let mut expectations: Vec<I2cTransaction> = Vec::new();
        expectations.extend(status_read(0x00));
        expectations.push(I2cTransaction::write(ADDR, vec![0x78, 0x80]));
        expectations.extend(status_read(0xa0));
        let mut i2c = I2cMock::new(&expectations);
        let mut dev = Ds2484::new(i2c.clone(), NoopDelay::new());
        let status = dev.onewire_triplet(true).unwrap();
        assert!(status.single_bit_result());
        assert!(!status.triplet_second_bit());
        assert!(status.branch_dir_taken());
        i2c.done();
    }

    #[test]
    fn stuck_bridge_times_out() {
        let expectations: Vec<I2cTransaction> =
            [0x01; 3].into_iter().flat_map(status_read).collect();
        let mut i2c = I2cMock::new(&expectations);
        let mut dev = Ds2484::new(i2c.clone(), NoopDelay::new());
        dev.retries = 2;
        assert!(matches!(
            dev.reset(),
            Err(OneWireError::Other(Ds2484Error::RetriesExceeded))
        ));
        i2c.done();
    }
}
