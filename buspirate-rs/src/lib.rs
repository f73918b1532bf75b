#![no_std]
#![deny(missing_docs)]

/*! # Bus Pirate
 *
 * Drives a Bus Pirate through its binary ("bitbang") command set over a byte
 * oriented serial link, and exposes its I2C mode as an
 * [`I2c`](embedded_hal::i2c::I2c) bus so ordinary embedded-hal drivers can be
 * stacked on top of it.
 *
 * Every command and every data byte sent to the adapter is answered with a
 * handshake byte that must be consumed before the next one is sent; the
 * driver enforces that discipline, and bounds every wait for a byte with a
 * retry ceiling.
 */

pub mod command;
mod error;
mod i2c;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
mod mode;
mod traits;

pub use command::{Command, I2cSpeed};
pub use error::{BusPirateError, Response};
pub use i2c::MAX_BULK;
pub use traits::Transport;

/// Results of Bus Pirate function calls.
pub type BusPirateResult<T, E> = Result<T, BusPirateError<E>>;

/// Operating mode of the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// The user terminal the adapter boots into.
    #[default]
    Interactive,
    /// Raw binary command mode.
    Binary,
    /// Binary I2C mode.
    I2c,
}

/// A Bus Pirate session.
///
/// Owns the serial link (implementing [`Transport`]) and a timer implementing the
/// [`DelayNs`](embedded_hal::delay::DelayNs) trait, and tracks which mode the adapter is in.
pub struct BusPirate<T, D> {
    pub(crate) port: T,
    pub(crate) delay: D,
    pub(crate) mode: Mode,
    pub(crate) retries: u8,
    pub(crate) poll_interval_ms: u32,
    pub(crate) settle_ms: u32,
    pub(crate) speed: I2cSpeed,
}

impl<T, D> BusPirate<T, D> {
    /// Creates a new session with default timing. No bytes are sent.
    pub fn new(port: T, delay: D) -> Self {
        BusPirateBuilder::default().build(port, delay)
    }

    /// Current adapter mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Gives back the serial link and the timer.
    ///
    /// Call [`cleanup`](BusPirate::cleanup) first to leave the adapter in interactive mode.
    pub fn release(self) -> (T, D) {
        (self.port, self.delay)
    }
}

/// Builder for creating a [`BusPirate`] session with custom timing.
pub struct BusPirateBuilder {
    retries: u8,
    poll_interval_ms: u32,
    settle_ms: u32,
    speed: I2cSpeed,
}

impl Default for BusPirateBuilder {
    fn default() -> Self {
        BusPirateBuilder {
            retries: 100,
            poll_interval_ms: 10,
            settle_ms: 100,
            speed: I2cSpeed::Khz100,
        }
    }
}

impl BusPirateBuilder {
    /// Sets how many times the link is polled again for a reply byte before
    /// the read times out.
    pub fn with_retries(mut self, retries: u8) -> Self {
        self.retries = retries;
        self
    }

    /// Sets the wait between two polls for a reply byte.
    pub fn with_poll_interval_ms(mut self, ms: u32) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Sets the wait between the null-byte flush and the binary mode request.
    pub fn with_settle_ms(mut self, ms: u32) -> Self {
        self.settle_ms = ms;
        self
    }

    /// Sets the I2C clock selected when entering I2C mode.
    pub fn with_speed(mut self, speed: I2cSpeed) -> Self {
        self.speed = speed;
        self
    }

    /// Builds the session. The adapter is assumed to be in interactive mode.
    pub fn build<T, D>(self, port: T, delay: D) -> BusPirate<T, D> {
        BusPirate {
            port,
            delay,
            mode: Mode::Interactive,
            retries: self.retries,
            poll_interval_ms: self.poll_interval_ms,
            settle_ms: self.settle_ms,
            speed: self.speed,
        }
    }
}
