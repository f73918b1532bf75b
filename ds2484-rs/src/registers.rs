use crate::{Ds2484Error, Ds2484Result, traits::Addressing, traits::Interact};
use bitfield_struct::bitfield;
use core::fmt;
use embedded_hal::{
    delay::DelayNs,
    i2c::{I2c, SevenBitAddress},
};
use embedded_onewire::OneWireStatus;
use log::trace;

pub(crate) const READ_PTR_CMD: u8 = 0xe1; // Set the read pointer
pub(crate) const DEVICE_RST_CMD: u8 = 0xf0; // Reset the device

/// Registers reachable through the read pointer.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    /// [`DeviceStatus`]
    Status = 0xf0,
    /// Byte received by the last 1-Wire Read Byte command.
    Data = 0xe1,
    /// [`DeviceConfiguration`]
    Configuration = 0xc3,
    /// [`OneWirePortConfiguration`]
    PortConfiguration = 0xb4,
}

/// A DS2484 bridge at I2C address 0x18.
///
/// Owns (or mutably borrows) the I2C bus it sits on and the timer used for busy polling and
/// byte pacing.
pub struct Ds2484<I, D> {
    pub(crate) i2c: I,
    pub(crate) addr: u8,
    pub(crate) delay: D,
    pub(crate) retries: u8,
    pub(crate) poll_interval_ms: u32,
    pub(crate) byte_pace_ms: u32,
    pub(crate) reset_poll_ms: u32,
    pub(crate) require_presence: bool,
}

impl<I, D> Ds2484<I, D> {
    /// Creates a new instance of `Ds2484` on the given I2C bus with default timing.
    ///
    /// The device is not touched; see [`Ds2484Builder`] to reset and configure it.
    pub fn new(i2c: I, delay: D) -> Self {
        let builder = Ds2484Builder::default();
        Ds2484 {
            i2c,
            addr: 0x18,
            delay,
            retries: builder.retries,
            poll_interval_ms: builder.poll_interval_ms,
            byte_pace_ms: builder.byte_pace_ms,
            reset_poll_ms: builder.reset_poll_ms,
            require_presence: builder.require_presence,
        }
    }

    /// Gives back the I2C bus and the timer.
    pub fn release(self) -> (I, D) {
        (self.i2c, self.delay)
    }
}

/// Timing, configuration and port parameters applied when a [`Ds2484`] is built.
pub struct Ds2484Builder {
    pub(crate) retries: u8,
    pub(crate) poll_interval_ms: u32,
    pub(crate) byte_pace_ms: u32,
    pub(crate) reset_poll_ms: u32,
    pub(crate) require_presence: bool,
    pub(crate) config: Option<DeviceConfiguration>,
    pub(crate) port: Option<OneWirePortConfiguration>,
}

impl Default for Ds2484Builder {
    fn default() -> Self {
        Ds2484Builder {
            retries: 100,
            poll_interval_ms: 50,
            byte_pace_ms: 10,
            reset_poll_ms: 1,
            require_presence: false,
            config: None,
            port: None,
        }
    }
}

impl Ds2484Builder {
    /// Sets how many extra status polls a busy wait makes before giving up with
    /// [`Ds2484Error::RetriesExceeded`].
    pub fn with_retries(mut self, retries: u8) -> Self {
        self.retries = retries;
        self
    }

    /// Sets the wait between two busy polls of the status register.
    pub fn with_poll_interval_ms(mut self, ms: u32) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Sets the pause after every 1-Wire Write Byte command.
    pub fn with_byte_pace_ms(mut self, ms: u32) -> Self {
        self.byte_pace_ms = ms;
        self
    }

    /// Sets the wait between two status polls while waiting for a device reset to complete.
    pub fn with_reset_poll_ms(mut self, ms: u32) -> Self {
        self.reset_poll_ms = ms;
        self
    }

    /// Makes a 1-Wire reset without a presence pulse fail with
    /// [`OneWireError::NoDevicePresent`](embedded_onewire::OneWireError::NoDevicePresent).
    ///
    /// Off by default: the missing pulse is only logged and the exchange goes on.
    pub fn with_presence_check(mut self, require: bool) -> Self {
        self.require_presence = require;
        self
    }

    /// Sets the device configuration written after the reset.
    pub fn with_config(mut self, config: DeviceConfiguration) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the 1-Wire port parameters written after the reset.
    pub fn with_port_config(mut self, port: OneWirePortConfiguration) -> Self {
        self.port = Some(port);
        self
    }

    /// Builds a new `Ds2484` instance: resets the device, then writes the configuration and port
    /// parameters if any were given.
    pub fn build<I: I2c<SevenBitAddress>, D: DelayNs>(
        self,
        i2c: I,
        delay: D,
    ) -> Ds2484Result<Ds2484<I, D>, I::Error> {
        let mut dev = Ds2484 {
            i2c,
            addr: 0x18,
            delay,
            retries: self.retries,
            poll_interval_ms: self.poll_interval_ms,
            byte_pace_ms: self.byte_pace_ms,
            reset_poll_ms: self.reset_poll_ms,
            require_presence: self.require_presence,
        };
        dev.device_reset()?;
        if let Some(mut config) = self.config {
            config.write(&mut dev)?;
        }
        if let Some(mut port) = self.port {
            port.write(&mut dev)?;
        }
        Ok(dev)
    }
}

impl<I: I2c<SevenBitAddress>, D: DelayNs> Ds2484<I, D> {
    /// Reads the status register.
    pub fn get_status(&mut self) -> Ds2484Result<DeviceStatus, I::Error> {
        let mut status = DeviceStatus::new();
        status.read(self)?;
        Ok(status)
    }

    /// Reads `buf.len()` bytes starting at `reg`.
    ///
    /// The read pointer is set in one I2C write, the bytes are fetched with a separate I2C read.
    pub fn read_register(&mut self, reg: Register, buf: &mut [u8]) -> Ds2484Result<(), I::Error> {
        self.read_pointer(reg as u8, buf)
    }

    pub(crate) fn read_pointer(&mut self, ptr: u8, buf: &mut [u8]) -> Ds2484Result<(), I::Error> {
        self.i2c.write(self.addr, &[READ_PTR_CMD, ptr])?;
        self.i2c.read(self.addr, buf)?;
        Ok(())
    }

    /// Writes a function command with its parameter bytes.
    pub(crate) fn command(&mut self, frame: &[u8]) -> Ds2484Result<(), I::Error> {
        trace!("DS2484: command {frame:02x?}");
        self.i2c.write(self.addr, frame)?;
        Ok(())
    }

    /// Reset the device.
    ///
    /// Performs a global reset of device state machine logic. Terminates any ongoing 1-Wire
    /// communication. The reset leaves the read pointer on the status register, which is polled
    /// until it reports the reset.
    pub fn device_reset(&mut self) -> Ds2484Result<DeviceStatus, I::Error> {
        self.command(&[DEVICE_RST_CMD])?;
        let mut tries = 0;
        loop {
            let mut buf = [0];
            self.i2c.read(self.addr, &mut buf)?;
            let status = DeviceStatus::from_bits(buf[0]);
            if status.device_reset() {
                return Ok(status);
            }
            if tries >= self.retries {
                return Err(Ds2484Error::RetriesExceeded);
            }
            tries += 1;
            self.delay.delay_ms(self.reset_poll_ms);
        }
    }

    /// Polls the status register until the 1-Wire busy flag clears.
    ///
    /// Gives up with [`Ds2484Error::RetriesExceeded`] after `retries` further polls.
    pub fn wait_until_idle(&mut self) -> Ds2484Result<DeviceStatus, I::Error> {
        let mut tries = 0;
        loop {
            let status = self.get_status()?;
            trace!("DS2484: {status}");
            if !status.onewire_busy() {
                return Ok(status);
            }
            if tries >= self.retries {
                return Err(Ds2484Error::RetriesExceeded);
            }
            tries += 1;
            self.delay.delay_ms(self.poll_interval_ms);
        }
    }

    /// Reads the device configuration.
    pub fn read_config(&mut self) -> Ds2484Result<DeviceConfiguration, I::Error> {
        let mut config = DeviceConfiguration::new();
        config.read(self)?;
        Ok(config)
    }

    /// Writes a new device configuration. The new settings take effect immediately.
    pub fn write_config(
        &mut self,
        mut config: DeviceConfiguration,
    ) -> Ds2484Result<DeviceConfiguration, I::Error> {
        config.write(self)?;
        Ok(config)
    }

    /// Updates the 1-Wire port parameters and returns them as read back.
    pub fn adjust_port(
        &mut self,
        mut port: OneWirePortConfiguration,
    ) -> Ds2484Result<OneWirePortConfiguration, I::Error> {
        port.write(self)?;
        Ok(port)
    }

    /// Reads the 1-Wire port parameters.
    pub fn read_port_config(&mut self) -> Ds2484Result<OneWirePortConfiguration, I::Error> {
        let mut port = OneWirePortConfiguration::default();
        port.read(self)?;
        Ok(port)
    }
}

/// Status register.
///
/// Read-only. Carries the 1-Wire busy flag, the outcome of the last bus reset and of the last
/// single bit or triplet command, and whether the bridge has been reset since the last
/// configuration write. Only some commands refresh it.
#[bitfield(u8)]
#[derive(PartialEq, Eq)]
pub struct DeviceStatus {
    /// 1WB: a 1-Wire command is still running. Poll until clear before the next command.
    pub onewire_busy: bool,
    /// PPD: a presence pulse was seen during the last reset cycle.
    pub present_pulse_detect: bool,
    /// SD: the line was already low when the presence pulse was due, i.e. it is shorted.
    pub short_detect: bool,
    /// LL: level of the 1-Wire line, sampled on every status read.
    pub logic_level: bool,
    /// RST: the bridge went through a power-on or Device Reset. Cleared by the next
    /// configuration write.
    pub device_reset: bool,
    /// SBR: line level sampled by a single bit command or the first slot of a triplet.
    pub single_bit_result: bool,
    /// TSB: line level sampled by the second slot of a triplet.
    pub triplet_second_bit: bool,
    /// DIR: branch direction written by the third slot of a triplet.
    pub branch_dir_taken: bool,
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("status =")?;
        let flags = [
            (self.branch_dir_taken(), " DIR"),
            (self.triplet_second_bit(), " TSB"),
            (self.single_bit_result(), " SBR"),
            (self.device_reset(), " RST"),
            (self.logic_level(), " LL^"),
            (!self.logic_level(), " LLv"),
            (self.short_detect(), " SD"),
            (self.present_pulse_detect(), " PPD"),
            (self.onewire_busy(), " OWB"),
        ];
        for (set, name) in flags {
            if set {
                f.write_str(name)?;
            }
        }
        Ok(())
    }
}

impl OneWireStatus for DeviceStatus {
    fn presence(&self) -> bool {
        self.present_pulse_detect()
    }

    fn shortcircuit(&self) -> bool {
        self.short_detect()
    }

    fn logic_level(&self) -> Option<bool> {
        Some(DeviceStatus::logic_level(self))
    }
}

impl Addressing for DeviceStatus {
    const WRITE_CMD: u8 = 0x0;

    const READ_PTR: u8 = Register::Status as u8;
}

impl Interact for DeviceStatus {
    fn read<I: I2c<SevenBitAddress>, D: DelayNs>(
        &mut self,
        dev: &mut Ds2484<I, D>,
    ) -> Result<(), Ds2484Error<I::Error>> {
        let mut buf = [0];
        dev.read_pointer(Self::READ_PTR, &mut buf)?;
        *self = DeviceStatus::from_bits(buf[0]);
        Ok(())
    }

    fn write<I: I2c<SevenBitAddress>, D: DelayNs>(
        &mut self,
        _dev: &mut Ds2484<I, D>,
    ) -> Result<(), Ds2484Error<I::Error>> {
        Ok(())
    }
}

#[bitfield(u8)]
#[derive(PartialEq, Eq)]
/// Device configuration register: APU, PDN, SPU and 1WS in the lower nibble.
///
/// On the wire the upper nibble must be the one's complement of the lower
/// nibble or the device ignores the write; reads return 0 in the upper nibble.
/// After a device reset the register reads 00h.
pub struct DeviceConfiguration {
    /// Drive the 1-Wire line high through the low impedance pullup transistor
    /// instead of the weak pullup resistor. Generally recommended.
    pub active_pullup: bool,
    /// Remove power from the 1-Wire port. No 1-Wire communication is possible
    /// while set.
    pub power_down_1wire: bool,
    /// Apply the strong pullup after the next Write Byte or Single Bit command,
    /// for parasitically powered devices. Clears itself once the strong
    /// pullup has ended.
    pub strong_pullup: bool,
    /// Overdrive timing when set, standard speed otherwise.
    pub onewire_speed: bool,
    #[bits(4)]
    __: u8,
}

impl DeviceConfiguration {
    /// The byte sent with the Write Device Configuration command.
    pub const fn to_register(&self) -> u8 {
        let cfg = self.into_bits() & 0x0f;
        cfg | ((!cfg & 0x0f) << 4)
    }
}

impl Addressing for DeviceConfiguration {
    const WRITE_CMD: u8 = 0xd2;
    const READ_PTR: u8 = Register::Configuration as u8;
}

impl Interact for DeviceConfiguration {
    fn read<I: I2c<SevenBitAddress>, D: DelayNs>(
        &mut self,
        dev: &mut Ds2484<I, D>,
    ) -> Result<(), Ds2484Error<I::Error>> {
        let mut buf = [0];
        dev.read_pointer(Self::READ_PTR, &mut buf)?;
        *self = DeviceConfiguration::from_bits(buf[0] & 0x0f);
        Ok(())
    }

    /// Waits for the 1-Wire line to be idle, writes the configuration and reads back what the
    /// device accepted (the read pointer is left on the configuration register).
    fn write<I: I2c<SevenBitAddress>, D: DelayNs>(
        &mut self,
        dev: &mut Ds2484<I, D>,
    ) -> Result<(), Ds2484Error<I::Error>> {
        dev.wait_until_idle()?;
        dev.command(&[Self::WRITE_CMD, self.to_register()])?;
        let mut buf = [0];
        dev.i2c.read(dev.addr, &mut buf)?;
        *self = DeviceConfiguration::from_bits(buf[0] & 0x0f);
        Ok(())
    }
}

/// Selector of a 1-Wire port parameter, in the upper nibble of the Adjust
/// 1-Wire Port control byte.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortParameter {
    /// Reset low time, standard speed (tRSTL).
    ResetLow = 0b0000,
    /// Reset low time, overdrive.
    ResetLowOverdrive = 0b0001,
    /// Presence-detect sampling time, standard speed (tMSP).
    PresenceSample = 0b0010,
    /// Presence-detect sampling time, overdrive.
    PresenceSampleOverdrive = 0b0011,
    /// Write zero low time, standard speed (tW0L).
    WriteZeroLow = 0b0100,
    /// Write zero low time, overdrive.
    WriteZeroLowOverdrive = 0b0101,
    /// Write zero recovery time (tREC0).
    WriteZeroRecovery = 0b0110,
    /// Weak pullup resistor (RWPU).
    WeakPullup = 0b1000,
}

impl PortParameter {
    const ALL: [PortParameter; 8] = [
        PortParameter::ResetLow,
        PortParameter::ResetLowOverdrive,
        PortParameter::PresenceSample,
        PortParameter::PresenceSampleOverdrive,
        PortParameter::WriteZeroLow,
        PortParameter::WriteZeroLowOverdrive,
        PortParameter::WriteZeroRecovery,
        PortParameter::WeakPullup,
    ];

    const fn slot(self) -> usize {
        match self {
            PortParameter::WeakPullup => 7,
            other => other as usize,
        }
    }
}

/// 1-Wire port parameters.
///
/// Affects the 1-Wire timing or pull-up resistors. Each parameter is a 4-bit code; after a
/// power-on reset or a Device Reset command every code is 0110b.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OneWirePortConfiguration {
    codes: [u8; 8],
}

impl Default for OneWirePortConfiguration {
    fn default() -> Self {
        OneWirePortConfiguration { codes: [0b0110; 8] }
    }
}

impl OneWirePortConfiguration {
    /// The 4-bit code of `param`.
    pub fn get(&self, param: PortParameter) -> u8 {
        self.codes[param.slot()]
    }

    /// Sets the 4-bit code of `param`.
    pub fn with(mut self, param: PortParameter, code: u8) -> Self {
        self.codes[param.slot()] = code & 0x0f;
        self
    }

    /// Reset low time in ns (tRSTL).
    pub fn reset_time(&self) -> u32 {
        self.get(PortParameter::ResetLow) as u32 * 20000 + 440000
    }

    /// Presence-detect sampling time in ns (tMSP).
    pub fn presence_detect_time(&self) -> u32 {
        (match self.get(PortParameter::PresenceSample) as u32 {
            0..=1 => 58,
            11.. => 76,
            code => 60 + (code - 2) * 2,
        }) * 1000
    }

    /// Write zero low time in ns (tW0L).
    pub fn write_zero_low_time(&self) -> u32 {
        match self.get(PortParameter::WriteZeroLow) as u32 {
            10.. => 70000,
            code => 52000 + code * 2000,
        }
    }

    /// Write zero recovery time in ns (tREC0).
    pub fn write_zero_recovery_time(&self) -> u32 {
        match self.get(PortParameter::WriteZeroRecovery) as u32 {
            0..=5 => 2750,
            15.. => 25250,
            code => 2750 + (code - 5) * 2500,
        }
    }

    /// Weak pull-up resistor value in Ohms (R_WPU).
    pub fn weak_pullup_resistor(&self) -> u16 {
        if self.get(PortParameter::WeakPullup) < 0b0110 {
            500
        } else {
            1000
        }
    }

    pub(crate) fn to_bytes(self) -> [u8; 9] {
        let mut frame = [Self::WRITE_CMD; 9];
        for (byte, param) in frame[1..].iter_mut().zip(PortParameter::ALL) {
            *byte = ((param as u8) << 4) | self.get(param);
        }
        frame
    }

    pub(crate) fn from_bytes(bytes: [u8; 8]) -> Self {
        let mut codes = [0; 8];
        for (code, byte) in codes.iter_mut().zip(bytes) {
            *code = byte & 0x0f;
        }
        OneWirePortConfiguration { codes }
    }
}

impl Addressing for OneWirePortConfiguration {
    const WRITE_CMD: u8 = 0xc3;

    const READ_PTR: u8 = Register::PortConfiguration as u8;
}

impl Interact for OneWirePortConfiguration {
    fn read<I: I2c<SevenBitAddress>, D: DelayNs>(
        &mut self,
        dev: &mut Ds2484<I, D>,
    ) -> Result<(), Ds2484Error<I::Error>> {
        let mut buf = [0; 8];
        dev.read_pointer(Self::READ_PTR, &mut buf)?;
        *self = Self::from_bytes(buf);
        Ok(())
    }

    fn write<I: I2c<SevenBitAddress>, D: DelayNs>(
        &mut self,
        dev: &mut Ds2484<I, D>,
    ) -> Result<(), Ds2484Error<I::Error>> {
        dev.wait_until_idle()?;
        dev.command(&self.to_bytes())?;
        self.read(dev)
    }
}
