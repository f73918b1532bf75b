#![no_std]
#![deny(missing_docs)]
//! # embedded-onewire
//! A no-std description of byte-oriented 1-Wire transactions.
//!
//! The [OneWire] trait defines the three primitives a 1-Wire master has to provide: a bus reset
//! with presence detection, a byte write and a byte read. On top of those the trait composes
//! the addressed exchanges every 1-Wire device command uses: reset the bus, select one device
//! by its 64-bit ROM id (or all devices at once), then send the command bytes.
//!
//! Devices are selected with an [Address].

mod address;
pub mod consts;
mod error;
mod traits;
pub use address::{Address, AddressParseError};
pub use error::OneWireError;
pub use traits::{OneWire, OneWireStatus};

/// Error type for 1-Wire operations.
pub type OneWireResult<T, E> = Result<T, OneWireError<E>>;

/// Command to match a specific ROM address in 1-Wire communication (non-overdrive mode)
pub const ONEWIRE_MATCH_ROM_CMD: u8 = consts::ONEWIRE_MATCH_ROM_CMD;

/// Command to skip ROM address in 1-Wire communication (non-overdrive mode)
pub const ONEWIRE_SKIP_ROM_CMD: u8 = consts::ONEWIRE_SKIP_ROM_CMD;
