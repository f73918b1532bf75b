use core::{fmt, str::FromStr};

/// Target of a 1-Wire function command.
///
/// A ROM id is stored as the little-endian `u64` of the 8 bytes as they travel on the bus,
/// so the family code is the least significant byte.
///
/// | Bit | Description |
/// |-----|-------------|
/// | 0-7 | Family code (e.g., 0x28 for DS18B20) |
/// | 8-55 | Serial number |
/// | 56-63 | CRC-8 |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Address {
    /// A single device, selected with Match ROM.
    Rom(u64),
    /// Every device on the bus, selected with Skip ROM.
    Any,
}

impl Address {
    /// Builds a ROM address from the 8 bytes in bus order.
    pub const fn from_bytes(bytes: [u8; 8]) -> Self {
        Address::Rom(u64::from_le_bytes(bytes))
    }

    /// The ROM bytes in bus order, or `None` for [`Address::Any`].
    pub const fn bytes(&self) -> Option<[u8; 8]> {
        match self {
            Address::Rom(rom) => Some(rom.to_le_bytes()),
            Address::Any => None,
        }
    }

    /// Family code of the addressed device.
    pub const fn family(&self) -> Option<u8> {
        match self {
            Address::Rom(rom) => Some((*rom & 0xff) as u8),
            Address::Any => None,
        }
    }
}

impl From<[u8; 8]> for Address {
    fn from(bytes: [u8; 8]) -> Self {
        Address::from_bytes(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bytes() {
            Some(bytes) => {
                for (i, b) in bytes.iter().enumerate() {
                    if i > 0 {
                        f.write_str(":")?;
                    }
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
            None => f.write_str("*"),
        }
    }
}

/// Error returned when parsing an [`Address`] from text fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressParseError {
    /// A character that is neither a hex digit nor a `:`/`-` separator.
    InvalidDigit(char),
    /// The text does not hold exactly 16 hex digits.
    InvalidLength(usize),
}

impl fmt::Display for AddressParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressParseError::InvalidDigit(c) => write!(f, "invalid character {c:?} in ROM id"),
            AddressParseError::InvalidLength(n) => {
                write!(f, "ROM id must have 16 hex digits, found {n}")
            }
        }
    }
}

impl core::error::Error for AddressParseError {}

/// Parses `*` as [`Address::Any`], otherwise 16 hex digits in bus order, optionally separated by
/// `:` or `-` (`28:23:49:83:06:00:00:6b`).
impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "*" {
            return Ok(Address::Any);
        }
        let mut bytes = [0u8; 8];
        let mut digits = 0;
        for c in s.chars().filter(|c| !matches!(c, ':' | '-')) {
            let nibble = c.to_digit(16).ok_or(AddressParseError::InvalidDigit(c))? as u8;
            if digits < 16 {
                bytes[digits / 2] = (bytes[digits / 2] << 4) | nibble;
            }
            digits += 1;
        }
        if digits != 16 {
            return Err(AddressParseError::InvalidLength(digits));
        }
        Ok(Address::from_bytes(bytes))
    }
}
