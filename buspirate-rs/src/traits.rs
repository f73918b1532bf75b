/// Byte oriented duplex link to the adapter, usually a serial port.
///
/// The link knows nothing about the protocol; reads block without a timeout, so callers
/// check [`bytes_available`](Transport::bytes_available) before reading.
pub trait Transport {
    /// Errors raised by the link.
    type Error: core::fmt::Debug;

    /// Writes all of `bytes` in one go.
    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Number of received bytes waiting to be read.
    fn bytes_available(&mut self) -> Result<usize, Self::Error>;

    /// Reads one received byte.
    fn read_byte(&mut self) -> Result<u8, Self::Error>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    type Error = T::Error;

    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        T::write(self, bytes)
    }

    fn bytes_available(&mut self) -> Result<usize, Self::Error> {
        T::bytes_available(self)
    }

    fn read_byte(&mut self) -> Result<u8, Self::Error> {
        T::read_byte(self)
    }
}
