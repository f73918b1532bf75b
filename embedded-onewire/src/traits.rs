use crate::{Address, ONEWIRE_MATCH_ROM_CMD, ONEWIRE_SKIP_ROM_CMD, OneWireResult};

/// Bus status reported by a 1-Wire master after a reset/presence-detect cycle.
pub trait OneWireStatus {
    /// Returns whether a presence pulse was detected.
    fn presence(&self) -> bool;
    /// Returns whether a short circuit was detected.
    fn shortcircuit(&self) -> bool;
    /// Returns the logic level of the bus, if the master samples it.
    fn logic_level(&self) -> Option<bool> {
        None
    }
}

/// Trait for 1-Wire communication.
///
/// Implementors provide the three byte-level primitives. The provided methods compose them into
/// the addressed transaction every 1-Wire device command is built from.
pub trait OneWire {
    /// The status type returned by the reset operation.
    /// This type must implement the [OneWireStatus] trait.
    type Status: OneWireStatus;
    /// The error type returned by the operations of this trait.
    /// This type is used to indicate errors in the underlying hardware or communication.
    type BusError;

    /// Resets the 1-Wire bus and returns the status of the bus.
    ///
    /// # Returns
    /// A result containing the status of the bus after the reset operation.
    ///
    /// # Errors
    /// This method returns an error if the reset operation fails, if no presence pulse is seen, or if
    /// the bus is shorted.
    fn reset(&mut self) -> OneWireResult<Self::Status, Self::BusError>;

    /// Writes a byte to the 1-Wire bus.
    /// # Arguments
    /// * `byte` - The byte to write to the bus.
    ///
    /// # Errors
    /// This method returns an error if the write operation fails.
    fn write_byte(&mut self, byte: u8) -> OneWireResult<(), Self::BusError>;

    /// Reads a byte from the 1-Wire bus.
    /// # Returns
    /// Byte read from the bus.
    ///
    /// # Errors
    /// This method returns an error if the read operation fails.
    fn read_byte(&mut self) -> OneWireResult<u8, Self::BusError>;

    /// Sends the ROM function command selecting `address`.
    ///
    /// [`Address::Rom`] sends Match ROM followed by the 8 ROM bytes, [`Address::Any`] sends Skip ROM.
    /// The bus must have been reset immediately before.
    fn select(&mut self, address: Address) -> OneWireResult<(), Self::BusError> {
        match address {
            Address::Rom(rom) => {
                self.write_byte(ONEWIRE_MATCH_ROM_CMD)?;
                for byte in rom.to_le_bytes() {
                    self.write_byte(byte)?;
                }
            }
            Address::Any => self.write_byte(ONEWIRE_SKIP_ROM_CMD)?,
        }
        Ok(())
    }

    /// Starts a new transaction: resets the bus, selects `address` and writes `bytes`.
    ///
    /// # Errors
    /// Errors from the reset or from any byte write are returned as-is; the remaining bytes are not sent.
    fn write_addressed(&mut self, address: Address, bytes: &[u8]) -> OneWireResult<(), Self::BusError> {
        log::debug!("1-Wire: {} <- {:02x?}", address, bytes);
        self.reset()?;
        self.select(address)?;
        for &byte in bytes {
            self.write_byte(byte)?;
        }
        Ok(())
    }

    /// Fills `buf` with bytes read from the bus, in order.
    fn read_bytes(&mut self, buf: &mut [u8]) -> OneWireResult<(), Self::BusError> {
        for byte in buf.iter_mut() {
            *byte = self.read_byte()?;
        }
        log::debug!("1-Wire: -> {:02x?}", buf);
        Ok(())
    }
}

impl<T: OneWire + ?Sized> OneWire for &mut T {
    type Status = T::Status;
    type BusError = T::BusError;

    fn reset(&mut self) -> OneWireResult<Self::Status, Self::BusError> {
        T::reset(self)
    }

    fn write_byte(&mut self, byte: u8) -> OneWireResult<(), Self::BusError> {
        T::write_byte(self, byte)
    }

    fn read_byte(&mut self) -> OneWireResult<u8, Self::BusError> {
        T::read_byte(self)
    }
}
