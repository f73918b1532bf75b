use core::fmt;

/// Longest reply any [`Command`](crate::Command) may require.
pub(crate) const MAX_RESPONSE: usize = 8;

/// Bytes received in reply to a command.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct Response {
    buf: [u8; MAX_RESPONSE],
    len: usize,
}

impl Response {
    pub(crate) fn push(&mut self, byte: u8) {
        debug_assert!(self.len < MAX_RESPONSE, "reply longer than {MAX_RESPONSE} bytes");
        if self.len < MAX_RESPONSE {
            self.buf[self.len] = byte;
            self.len += 1;
        }
    }

    /// The received bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x?}", self.as_bytes())
    }
}

#[derive(Debug)]
/// Bus Pirate errors
pub enum BusPirateError<E> {
    /// Serial link errors.
    Transport(E),
    /// No byte arrived within the retry ceiling.
    Timeout,
    /// The adapter answered a command with something other than the required reply.
    ResponseMismatch {
        /// Name of the command.
        command: &'static str,
        /// Command byte that was sent.
        code: u8,
        /// Required reply.
        expected: &'static [u8],
        /// Actual reply.
        received: Response,
    },
    /// Bulk writes carry 1 to 16 bytes.
    InvalidLength(usize),
    /// I2C traffic was requested before entering I2C mode.
    NotInI2cMode,
}

impl<E> From<E> for BusPirateError<E> {
    fn from(value: E) -> Self {
        Self::Transport(value)
    }
}

impl<E: fmt::Debug> fmt::Display for BusPirateError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusPirateError::Transport(e) => write!(f, "serial link error: {e:?}"),
            BusPirateError::Timeout => f.write_str("timed out waiting for the adapter"),
            BusPirateError::ResponseMismatch {
                command,
                code,
                expected,
                received,
            } => write!(
                f,
                "{command} ({code:#04x}): expected {expected:02x?}, got {received:?}"
            ),
            BusPirateError::InvalidLength(n) => write!(f, "bulk write of {n} bytes, 1 to 16 allowed"),
            BusPirateError::NotInI2cMode => f.write_str("adapter is not in I2C mode"),
        }
    }
}

impl<E: fmt::Debug> embedded_hal::i2c::Error for BusPirateError<E> {
    fn kind(&self) -> embedded_hal::i2c::ErrorKind {
        use embedded_hal::i2c::ErrorKind;
        match self {
            BusPirateError::Transport(_)
            | BusPirateError::Timeout
            | BusPirateError::ResponseMismatch { .. } => ErrorKind::Bus,
            BusPirateError::InvalidLength(_) | BusPirateError::NotInI2cMode => ErrorKind::Other,
        }
    }
}
