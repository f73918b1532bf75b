use crate::{
    BusPirate, BusPirateError, BusPirateResult, Mode, Transport,
    command::{I2C_ACK, I2C_BULK, I2C_NACK, I2C_READ_BYTE, I2C_START, I2C_STOP},
};
use embedded_hal::{
    delay::DelayNs,
    i2c::{ErrorType, I2c, Operation, SevenBitAddress},
};
use log::trace;

/// Largest payload of a single bulk write.
pub const MAX_BULK: usize = 16;

impl<T: Transport, D: DelayNs> BusPirate<T, D> {
    /// Sends an I2C start condition.
    pub fn start_transaction(&mut self) -> BusPirateResult<(), T::Error> {
        if self.mode != Mode::I2c {
            return Err(BusPirateError::NotInI2cMode);
        }
        trace!("  {{ -- i2c transaction --");
        self.execute(&I2C_START, 0)
    }

    /// Sends an I2C stop condition.
    pub fn end_transaction(&mut self) -> BusPirateResult<(), T::Error> {
        trace!("  }}");
        self.execute(&I2C_STOP, 0)
    }

    /// Writes 1 to 16 bytes on the I2C bus inside the current transaction.
    ///
    /// The adapter answers the command byte and every data byte with a handshake, all of which
    /// are consumed before returning.
    pub fn bulk_write(&mut self, data: &[u8]) -> BusPirateResult<(), T::Error> {
        let len = data.len();
        if len == 0 || len > MAX_BULK {
            return Err(BusPirateError::InvalidLength(len));
        }
        let mut frame = [0u8; MAX_BULK + 1];
        frame[0] = I2C_BULK.code((len - 1) as u8);
        frame[1..=len].copy_from_slice(data);
        self.discard_input()?;
        self.port_write(&frame[..=len])?;
        for _ in 0..=len {
            self.read_byte()?;
        }
        Ok(())
    }

    /// Addresses a slave for reading and fills `buf` from it.
    ///
    /// `address` is the address byte(s) as they go on the wire, read bit included. Every byte is
    /// acknowledged except the last, which is not so the slave releases the bus.
    pub fn read_i2c(&mut self, address: &[u8], buf: &mut [u8]) -> BusPirateResult<(), T::Error> {
        self.bulk_write(address)?;
        self.read_run(buf, true)
    }

    fn read_run(&mut self, buf: &mut [u8], nack_last: bool) -> BusPirateResult<(), T::Error> {
        let last = buf.len().saturating_sub(1);
        for (i, byte) in buf.iter_mut().enumerate() {
            self.port_write(&[I2C_READ_BYTE])?;
            *byte = self.read_byte()?;
            let reply = if nack_last && i == last {
                &I2C_NACK
            } else {
                &I2C_ACK
            };
            self.execute(reply, 0)?;
        }
        trace!("   << {buf:02x?}");
        Ok(())
    }

    fn run_operations(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> BusPirateResult<(), T::Error> {
        // None before the first operation, then whether the previous one was a read
        let mut previous: Option<bool> = None;
        for i in 0..operations.len() {
            // empty reads clock nothing, so the nack goes to the last byte actually read
            let next_is_read = operations[i + 1..]
                .iter()
                .find(|op| !matches!(op, Operation::Read(buf) if buf.is_empty()))
                .is_some_and(|op| matches!(op, Operation::Read(_)));
            match &mut operations[i] {
                Operation::Write(data) => {
                    let mut rest: &[u8] = data;
                    if previous != Some(false) {
                        if previous.is_some() {
                            self.execute(&I2C_START, 0)?;
                        }
                        let head = rest.len().min(MAX_BULK - 1);
                        let mut frame = [0u8; MAX_BULK];
                        frame[0] = address << 1;
                        frame[1..=head].copy_from_slice(&rest[..head]);
                        self.bulk_write(&frame[..=head])?;
                        rest = &rest[head..];
                    }
                    for chunk in rest.chunks(MAX_BULK) {
                        self.bulk_write(chunk)?;
                    }
                    previous = Some(false);
                }
                Operation::Read(buf) if buf.is_empty() => {}
                Operation::Read(buf) => {
                    if previous != Some(true) {
                        if previous.is_some() {
                            self.execute(&I2C_START, 0)?;
                        }
                        self.bulk_write(&[(address << 1) | 1])?;
                    }
                    self.read_run(buf, !next_is_read)?;
                    previous = Some(true);
                }
            }
        }
        Ok(())
    }
}

impl<T: Transport, D> ErrorType for BusPirate<T, D> {
    type Error = BusPirateError<T::Error>;
}

/// Every transaction is bracketed by a start and a stop condition. A repeated start and the
/// address byte are sent whenever the direction changes; writes longer than a bulk frame are
/// split over several bulk writes.
impl<T: Transport, D: DelayNs> I2c<SevenBitAddress> for BusPirate<T, D> {
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.start_transaction()?;
        let res = self.run_operations(address, operations);
        let end = self.end_transaction();
        res?;
        end
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use crate::{
        BusPirate, BusPirateError,
        mock::{Exchange, ScriptedPort},
    };
    use embedded_hal::i2c::{I2c, Operation};
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use std::{vec, vec::Vec};

    fn i2c_entry() -> Vec<Exchange> {
        vec![
            Exchange::handshake([0x0f]),
            Exchange::silent([0; 20]),
            Exchange::new([0x00], *b"BBIO1"),
            Exchange::new([0x02], *b"I2C1"),
            Exchange::handshake([0x4c]),
            Exchange::handshake([0x62]),
        ]
    }

    #[test]
    fn bulk_header_carries_length() {
        let payload: Vec<u8> = (0x80..0x90).collect();
        for n in 1..=16 {
            let mut frame = vec![0x10 | (n as u8 - 1)];
            frame.extend_from_slice(&payload[..n]);
            let mut port = ScriptedPort::new([Exchange::acked(frame)]);
            let mut bp = BusPirate::new(&mut port, NoopDelay::new());
            bp.bulk_write(&payload[..n]).unwrap();
            drop(bp);
            assert_eq!(port.writes(), 1);
            port.done();
        }
    }

    #[test]
    fn bulk_rejects_bad_lengths() {
        let mut port = ScriptedPort::new([]);
        let mut bp = BusPirate::new(&mut port, NoopDelay::new());
        assert!(matches!(
            bp.bulk_write(&[]),
            Err(BusPirateError::InvalidLength(0))
        ));
        assert!(matches!(
            bp.bulk_write(&[0; 17]),
            Err(BusPirateError::InvalidLength(17))
        ));
        drop(bp);
        assert_eq!(port.writes(), 0);
    }

    #[test]
    fn bulk_needs_every_handshake() {
        // one handshake short of header + 2 bytes
        let mut port = ScriptedPort::new([Exchange::new([0x11, 0x30, 0xf0], [0x01, 0x01])]);
        let mut bp = BusPirate::new(&mut port, NoopDelay::new());
        assert!(matches!(
            bp.bulk_write(&[0x30, 0xf0]),
            Err(BusPirateError::Timeout)
        ));
    }

    #[test]
    fn read_acks_all_but_last() {
        let mut port = ScriptedPort::new([
            Exchange::acked([0x10, 0x31]),
            Exchange::new([0x04], [0xaa]),
            Exchange::handshake([0x06]),
            Exchange::new([0x04], [0xbb]),
            Exchange::handshake([0x06]),
            Exchange::new([0x04], [0xcc]),
            Exchange::handshake([0x07]),
        ]);
        let mut bp = BusPirate::new(&mut port, NoopDelay::new());
        let mut buf = [0; 3];
        bp.read_i2c(&[0x31], &mut buf).unwrap();
        assert_eq!(buf, [0xaa, 0xbb, 0xcc]);
        drop(bp);
        port.done();
    }

    #[test]
    fn transactions_need_i2c_mode() {
        let mut port = ScriptedPort::new([]);
        let mut bp = BusPirate::new(&mut port, NoopDelay::new());
        assert!(matches!(
            bp.write(0x18, &[0xf0]),
            Err(BusPirateError::NotInI2cMode)
        ));
        drop(bp);
        assert_eq!(port.writes(), 0);
    }

    #[test]
    fn hal_write_and_read() {
        let mut script = i2c_entry();
        script.extend([
            Exchange::handshake([0x02]),
            Exchange::acked([0x12, 0x30, 0xa5, 0x44]),
            Exchange::handshake([0x03]),
            Exchange::handshake([0x02]),
            Exchange::acked([0x10, 0x31]),
            Exchange::new([0x04], [0x18]),
            Exchange::handshake([0x07]),
            Exchange::handshake([0x03]),
        ]);
        let mut port = ScriptedPort::new(script);
        let mut bp = BusPirate::new(&mut port, NoopDelay::new());
        bp.enter_i2c_mode().unwrap();
        bp.write(0x18, &[0xa5, 0x44]).unwrap();
        let mut buf = [0];
        bp.read(0x18, &mut buf).unwrap();
        assert_eq!(buf, [0x18]);
        drop(bp);
        port.done();
    }

    #[test]
    fn hal_write_read_uses_repeated_start() {
        let mut script = i2c_entry();
        script.extend([
            Exchange::handshake([0x02]),
            Exchange::acked([0x12, 0x30, 0xe1, 0xf0]),
            Exchange::handshake([0x02]),
            Exchange::acked([0x10, 0x31]),
            Exchange::new([0x04], [0x0a]),
            Exchange::handshake([0x07]),
            Exchange::handshake([0x03]),
        ]);
        let mut port = ScriptedPort::new(script);
        let mut bp = BusPirate::new(&mut port, NoopDelay::new());
        bp.enter_i2c_mode().unwrap();
        let mut buf = [0];
        bp.write_read(0x18, &[0xe1, 0xf0], &mut buf).unwrap();
        assert_eq!(buf, [0x0a]);
        drop(bp);
        port.done();
    }

    #[test]
    fn empty_trailing_read_still_nacks_last_byte() {
        let mut script = i2c_entry();
        script.extend([
            Exchange::handshake([0x02]),
            Exchange::acked([0x10, 0x31]),
            Exchange::new([0x04], [0x5a]),
            Exchange::handshake([0x07]),
            Exchange::handshake([0x03]),
        ]);
        let mut port = ScriptedPort::new(script);
        let mut bp = BusPirate::new(&mut port, NoopDelay::new());
        bp.enter_i2c_mode().unwrap();
        let mut first = [0];
        let mut empty: [u8; 0] = [];
        bp.transaction(
            0x18,
            &mut [Operation::Read(&mut first), Operation::Read(&mut empty)],
        )
        .unwrap();
        assert_eq!(first, [0x5a]);
        drop(bp);
        port.done();
    }

    #[test]
    fn long_writes_are_split() {
        let data: Vec<u8> = (0..20).collect();
        let mut first = vec![0x1f, 0x30];
        first.extend_from_slice(&data[..15]);
        let mut second = vec![0x14];
        second.extend_from_slice(&data[15..]);
        let mut script = i2c_entry();
        script.extend([
            Exchange::handshake([0x02]),
            Exchange::acked(first),
            Exchange::acked(second),
            Exchange::handshake([0x03]),
        ]);
        let mut port = ScriptedPort::new(script);
        let mut bp = BusPirate::new(&mut port, NoopDelay::new());
        bp.enter_i2c_mode().unwrap();
        bp.write(0x18, &data).unwrap();
        drop(bp);
        port.done();
    }

    #[test]
    fn failed_operation_still_stops() {
        let mut script = i2c_entry();
        script.extend([
            Exchange::handshake([0x02]),
            // address byte never acknowledged
            Exchange::silent([0x10, 0x31]),
            Exchange::handshake([0x03]),
        ]);
        let mut port = ScriptedPort::new(script);
        let mut bp = crate::BusPirateBuilder::default()
            .with_retries(1)
            .build(&mut port, NoopDelay::new());
        bp.enter_i2c_mode().unwrap();
        let mut buf = [0];
        assert!(matches!(
            bp.read(0x18, &mut buf),
            Err(BusPirateError::Timeout)
        ));
        drop(bp);
        port.done();
    }
}
