//! Binary mode command table.
//!
//! Commands are plain descriptors; [`BusPirate::execute`](crate::BusPirate::execute) sends them
//! and checks the reply.

/// A fixed Bus Pirate command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    /// Name used in traces and errors.
    pub name: &'static str,
    /// Command byte. Parameterised commands carry their argument in the low nibble.
    pub opcode: u8,
    /// Exact reply the adapter must send. `None` means a single handshake byte of any value.
    pub response: Option<&'static [u8]>,
}

impl Command {
    const fn new(name: &'static str, opcode: u8, response: Option<&'static [u8]>) -> Self {
        Command {
            name,
            opcode,
            response,
        }
    }

    /// Command byte with `nibble` placed in the low four bits.
    pub const fn code(&self, nibble: u8) -> u8 {
        self.opcode | (nibble & 0x0f)
    }
}

/// Hardware reset, returns the adapter to the user terminal.
pub const RESET: Command = Command::new("reset", 0x0f, None);
/// Enter raw binary mode.
pub const BINARY_MODE: Command = Command::new("binary mode", 0x00, Some(b"BBIO1"));
/// Enter binary I2C mode (from binary mode).
pub const I2C_MODE: Command = Command::new("I2C mode", 0x02, Some(b"I2C1"));
/// Leave binary mode for the UART terminal.
pub const UART_MODE: Command = Command::new("UART mode", 0x03, None);

/// Bulk I2C write of 1-16 bytes, low nibble = count - 1.
pub const I2C_BULK: Command = Command::new("send bulk", 0x10, None);
/// Power supply and pull-up control, low nibble = [`I2C_POWER`] | [`I2C_PULL_UPS`].
pub const I2C_PERIPHERALS: Command = Command::new("set I2C peripherals", 0x40, None);
/// I2C clock selection, low nibble = [`I2cSpeed`].
pub const I2C_SPEED: Command = Command::new("set I2C speed", 0x60, None);
/// I2C start condition.
pub const I2C_START: Command = Command::new("I2C start", 0x02, None);
/// I2C stop condition.
pub const I2C_STOP: Command = Command::new("I2C stop", 0x03, None);
/// Acknowledge the byte just read; the slave keeps transmitting.
pub const I2C_ACK: Command = Command::new("I2C ack", 0x06, None);
/// Do not acknowledge the byte just read; the slave stops transmitting.
pub const I2C_NACK: Command = Command::new("I2C nack", 0x07, None);

/// Clock one byte in from the slave. Answered with the byte, not a handshake.
pub const I2C_READ_BYTE: u8 = 0x04;

/// Peripheral flag: switch on the power supplies.
pub const I2C_POWER: u8 = 0x08;
/// Peripheral flag: switch on the pull-up resistors.
pub const I2C_PULL_UPS: u8 = 0x04;

/// Null bytes written before requesting binary mode, enough to terminate
/// any command the terminal may be half way through parsing.
pub const NULL_FLUSH_LEN: usize = 20;

/// I2C clock rates.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum I2cSpeed {
    /// ~5 kHz
    Khz5 = 0x00,
    /// ~50 kHz
    Khz50 = 0x01,
    /// ~100 kHz
    #[default]
    Khz100 = 0x02,
    /// ~400 kHz
    Khz400 = 0x03,
}
