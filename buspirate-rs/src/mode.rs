use crate::{
    BusPirate, BusPirateError, BusPirateResult, Mode, Response, Transport,
    command::{
        BINARY_MODE, Command, I2C_MODE, I2C_PERIPHERALS, I2C_POWER, I2C_PULL_UPS, I2C_SPEED,
        NULL_FLUSH_LEN, RESET, UART_MODE,
    },
};
use embedded_hal::delay::DelayNs;
use log::{debug, trace, warn};

impl<T: Transport, D: DelayNs> BusPirate<T, D> {
    /// Sends `command` with `nibble` in its low four bits and checks the reply.
    ///
    /// Stale input is discarded first. A command without a required reply consumes exactly one
    /// handshake byte; otherwise exactly as many bytes as the required reply are read and
    /// compared.
    pub fn execute(&mut self, command: &Command, nibble: u8) -> BusPirateResult<(), T::Error> {
        trace!("Bus Pirate: {}", command.name);
        let code = command.code(nibble);
        self.discard_input()?;
        self.port_write(&[code])?;
        match command.response {
            None => {
                self.read_byte()?;
            }
            Some(expected) => {
                let mut received = Response::default();
                for _ in 0..expected.len() {
                    received.push(self.read_byte()?);
                }
                trace!("   << {:?}", received);
                if received.as_bytes() != expected {
                    return Err(BusPirateError::ResponseMismatch {
                        command: command.name,
                        code,
                        expected,
                        received,
                    });
                }
            }
        }
        Ok(())
    }

    /// Reads one byte from the adapter.
    ///
    /// The link is polled for available data; after `retries` further polls spaced by the
    /// poll interval the read fails with [`BusPirateError::Timeout`].
    pub fn read_byte(&mut self) -> BusPirateResult<u8, T::Error> {
        let mut tries = 0;
        while self.port.bytes_available()? == 0 {
            if tries >= self.retries {
                return Err(BusPirateError::Timeout);
            }
            tries += 1;
            self.delay.delay_ms(self.poll_interval_ms);
        }
        Ok(self.port.read_byte()?)
    }

    /// Drops every byte waiting on the link.
    pub fn discard_input(&mut self) -> BusPirateResult<(), T::Error> {
        while self.port.bytes_available()? > 0 {
            let stale = self.port.read_byte()?;
            trace!("   discarded {stale:02x}");
        }
        Ok(())
    }

    pub(crate) fn port_write(&mut self, bytes: &[u8]) -> BusPirateResult<(), T::Error> {
        trace!("   >> {bytes:02x?}");
        self.port.write(bytes)?;
        Ok(())
    }

    /// Puts the adapter in binary mode. Does nothing if already there (or in I2C mode).
    ///
    /// The adapter is reset, flushed with null bytes and given time to settle before binary mode
    /// is requested. The mode only changes once the adapter has confirmed with `BBIO1`.
    pub fn enter_binary_mode(&mut self) -> BusPirateResult<(), T::Error> {
        if self.mode != Mode::Interactive {
            return Ok(());
        }
        debug!("Bus Pirate: entering binary mode");
        self.execute(&RESET, 0)?;
        self.port_write(&[0; NULL_FLUSH_LEN])?;
        self.delay.delay_ms(self.settle_ms);
        self.execute(&BINARY_MODE, 0)?;
        self.mode = Mode::Binary;
        Ok(())
    }

    /// Puts the adapter in I2C mode with power and pull-ups on and the configured clock.
    /// Does nothing if already in I2C mode.
    pub fn enter_i2c_mode(&mut self) -> BusPirateResult<(), T::Error> {
        if self.mode == Mode::I2c {
            return Ok(());
        }
        self.enter_binary_mode()?;
        debug!("Bus Pirate: entering I2C mode at {:?}", self.speed);
        self.execute(&I2C_MODE, 0)?;
        self.mode = Mode::I2c;
        self.execute(&I2C_PERIPHERALS, I2C_POWER | I2C_PULL_UPS)?;
        self.execute(&I2C_SPEED, self.speed as u8)?;
        Ok(())
    }

    /// Returns the adapter to its interactive terminal.
    ///
    /// Does nothing unless binary mode was entered. Failures are logged and otherwise ignored so
    /// this can run on the way out of an error.
    pub fn cleanup(&mut self) {
        if self.mode == Mode::Interactive {
            return;
        }
        self.mode = Mode::Interactive;
        debug!("Bus Pirate: cleanup");
        let res = self
            .port_write(&[0x00])
            .and_then(|_| self.execute(&RESET, 0));
        if let Err(e) = res {
            warn!("Bus Pirate: reset during cleanup failed: {e:?}");
        }
        if let Err(e) = self.execute(&UART_MODE, 0) {
            warn!("Bus Pirate: return to UART mode failed: {e:?}");
        }
    }
}
