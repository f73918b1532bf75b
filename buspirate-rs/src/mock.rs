//! Scripted in-memory [`Transport`] for tests.
//!
//! The port is loaded with the exact sequence of writes it expects. Each write is compared with
//! the next [`Exchange`] and the exchange's reply is queued for reading, the way the adapter
//! answers a command. Unexpected writes panic.
extern crate std;

use crate::Transport;
use std::{collections::VecDeque, vec::Vec};

/// One expected write and the bytes the adapter sends back for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    write: Vec<u8>,
    reply: Vec<u8>,
}

impl Exchange {
    /// Expect `write` and answer with `reply`.
    pub fn new(write: impl Into<Vec<u8>>, reply: impl Into<Vec<u8>>) -> Self {
        Exchange {
            write: write.into(),
            reply: reply.into(),
        }
    }

    /// Expect `write` and answer with one handshake byte per byte written.
    pub fn acked(write: impl Into<Vec<u8>>) -> Self {
        let write = write.into();
        let reply = std::vec![0x01; write.len()];
        Exchange { write, reply }
    }

    /// Expect a command and answer with a single handshake byte.
    pub fn handshake(write: impl Into<Vec<u8>>) -> Self {
        Exchange::new(write, [0x01])
    }

    /// Expect `write` and answer with nothing.
    pub fn silent(write: impl Into<Vec<u8>>) -> Self {
        Exchange::new(write, Vec::new())
    }
}

/// Errors of the scripted port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockError {
    /// A read was attempted with nothing queued.
    Empty,
}

/// A [`Transport`] that replays a script of [`Exchange`]s.
#[derive(Debug, Default)]
pub struct ScriptedPort {
    expected: VecDeque<Exchange>,
    rx: VecDeque<u8>,
    writes: usize,
    polls: usize,
}

impl ScriptedPort {
    /// Creates a port expecting `script` in order.
    pub fn new(script: impl IntoIterator<Item = Exchange>) -> Self {
        ScriptedPort {
            expected: script.into_iter().collect(),
            ..Default::default()
        }
    }

    /// Number of write calls so far.
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Number of [`bytes_available`](Transport::bytes_available) calls so far.
    pub fn polls(&self) -> usize {
        self.polls
    }

    /// Asserts that the whole script was played.
    pub fn done(&self) {
        assert!(
            self.expected.is_empty(),
            "{} exchange(s) never happened, next: {:02x?}",
            self.expected.len(),
            self.expected.front()
        );
    }
}

impl Transport for ScriptedPort {
    type Error = MockError;

    fn write(&mut self, bytes: &[u8]) -> Result<(), MockError> {
        let Some(exchange) = self.expected.pop_front() else {
            panic!("write #{} {:02x?} after the end of the script", self.writes, bytes);
        };
        assert_eq!(
            bytes,
            exchange.write.as_slice(),
            "write #{} does not match the script",
            self.writes
        );
        self.writes += 1;
        self.rx.extend(exchange.reply);
        Ok(())
    }

    fn bytes_available(&mut self) -> Result<usize, MockError> {
        self.polls += 1;
        Ok(self.rx.len())
    }

    fn read_byte(&mut self) -> Result<u8, MockError> {
        self.rx.pop_front().ok_or(MockError::Empty)
    }
}
