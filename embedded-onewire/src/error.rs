use core::fmt;

/// Failure of a 1-Wire exchange.
#[derive(Debug)]
pub enum OneWireError<E> {
    /// The bus master failed; wraps its own error.
    Other(E),
    /// The reset cycle saw no presence pulse.
    NoDevicePresent,
    /// The reset cycle found the line shorted to ground.
    ShortCircuit,
}

impl<E> From<E> for OneWireError<E> {
    fn from(other: E) -> Self {
        Self::Other(other)
    }
}

impl<E: fmt::Display> fmt::Display for OneWireError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OneWireError::Other(e) => write!(f, "{e}"),
            OneWireError::NoDevicePresent => f.write_str("no device present on the 1-Wire bus"),
            OneWireError::ShortCircuit => f.write_str("1-Wire bus short circuit"),
        }
    }
}
