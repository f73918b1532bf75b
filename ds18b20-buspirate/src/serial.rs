use buspirate::Transport;
use serialport::SerialPort;
use std::{
    io::{Read, Write},
    time::Duration,
};

/// Bus Pirate serial link.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
}

impl SerialTransport {
    /// Opens `path` at `baud` bits per second, 8N1.
    pub fn open(path: &str, baud: u32) -> serialport::Result<Self> {
        let port = serialport::new(path, baud)
            .timeout(Duration::from_secs(1))
            .open()?;
        Ok(Self { port })
    }
}

impl Transport for SerialTransport {
    type Error = serialport::Error;

    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.port.write_all(bytes)?;
        self.port.flush()?;
        Ok(())
    }

    fn bytes_available(&mut self) -> Result<usize, Self::Error> {
        Ok(self.port.bytes_to_read()? as usize)
    }

    fn read_byte(&mut self) -> Result<u8, Self::Error> {
        let mut buf = [0];
        self.port.read_exact(&mut buf)?;
        Ok(buf[0])
    }
}
