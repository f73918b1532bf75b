use core::fmt;

/// Errors of the DS2484 driver, generic over the I2C bus error.
#[derive(Debug)]
pub enum Ds2484Error<E> {
    /// The I2C bus failed.
    I2c(E),
    /// The bridge stayed busy (or never reported its reset) for the whole retry budget.
    RetriesExceeded,
}

impl<E> From<E> for Ds2484Error<E> {
    fn from(value: E) -> Self {
        Self::I2c(value)
    }
}

impl<E: fmt::Debug> fmt::Display for Ds2484Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ds2484Error::I2c(e) => write!(f, "I2C error: {e:?}"),
            Ds2484Error::RetriesExceeded => f.write_str("bridge busy, retries exceeded"),
        }
    }
}
