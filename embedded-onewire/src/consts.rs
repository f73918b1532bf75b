//! Command constants for 1-Wire communication.

/// Command to match a specific ROM address in 1-Wire communication (non-overdrive mode).
///
/// Followed by the 8 bytes of the ROM id, family code first. Only the device
/// whose ROM matches responds to the function command that follows.
pub const ONEWIRE_MATCH_ROM_CMD: u8 = 0x55;

/// Command to skip ROM address in 1-Wire communication (non-overdrive mode).
///
/// Every device on the bus responds to the function command that follows,
/// which is useful to start a conversion everywhere at once but not to read
/// data back when more than one device is attached.
pub const ONEWIRE_SKIP_ROM_CMD: u8 = 0xcc;
