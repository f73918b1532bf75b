#![no_std]
#![deny(missing_docs)]

/*! # DS2484
 *
 * Driver for the Analog Devices DS2484 I2C to 1-Wire bridge.
 *
 * The bridge is driven through single byte function commands written to its
 * I2C address, and answers through a read pointer that selects one of four
 * registers. Every 1-Wire operation runs asynchronously inside the bridge;
 * the host polls the busy flag of the [`DeviceStatus`] register before
 * issuing the next one. The driver implements [`OneWire`] so 1-Wire device
 * drivers can run on top of it.
 */

pub use embedded_onewire::{Address, OneWire, OneWireError, OneWireResult};
mod error;
mod onewire;
mod registers;
mod traits;

pub use error::Ds2484Error;
pub use registers::{
    DeviceConfiguration, DeviceStatus, Ds2484, Ds2484Builder, OneWirePortConfiguration,
    PortParameter, Register,
};
pub use traits::{Addressing, Interact};

/// Results of DS2484-specific function calls.
pub type Ds2484Result<T, E> = Result<T, Ds2484Error<E>>;
