//! Addressed register access over a bus.

use crate::bus::Bus;
use crate::error::{WireError, WireResult};
use crate::retry::RetryPolicy;

/// Data written to a register: a single byte or a contiguous block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload<'a> {
    Byte(u8),
    Block(&'a [u8]),
}

impl From<u8> for Payload<'_> {
    fn from(value: u8) -> Self {
        Self::Byte(value)
    }
}

impl<'a> From<&'a [u8]> for Payload<'a> {
    fn from(value: &'a [u8]) -> Self {
        Self::Block(value)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for Payload<'a> {
    fn from(value: &'a [u8; N]) -> Self {
        Self::Block(value.as_slice())
    }
}

impl<'a> From<&'a Vec<u8>> for Payload<'a> {
    fn from(value: &'a Vec<u8>) -> Self {
        Self::Block(value.as_slice())
    }
}

/// One device on a bus.
///
/// All operations share the same retry contract: each call gets a fresh
/// budget of [`RetryPolicy::max_attempts`] attempts, and identical operations
/// are repeated until one succeeds or the budget runs out.
#[derive(Debug)]
pub struct Wire<B> {
    bus: B,
    address: u8,
    policy: RetryPolicy,
}

impl<B: Bus> Wire<B> {
    /// Bind a device at `address`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `address` is 0 or outside the 7-bit range.
    pub fn new(bus: B, address: u8, policy: RetryPolicy) -> WireResult<Self> {
        if address == 0 || address > 0x7F {
            return Err(WireError::Configuration {
                what: format!("no valid device address (got 0x{:02X})", address),
            });
        }
        Ok(Self {
            bus,
            address,
            policy,
        })
    }

    /// Bind a board with an address jumper: `jumper` is used when the jumper is closed.
    pub fn with_jumper(
        bus: B,
        default: u8,
        jumper: u8,
        use_jumper: bool,
        policy: RetryPolicy,
    ) -> WireResult<Self> {
        let address = if use_jumper && jumper != 0 {
            jumper
        } else {
            default
        };
        Self::new(bus, address, policy)
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    fn retrying<T>(
        &mut self,
        register: u8,
        mut op: impl FnMut(&mut B, u8) -> Result<T, crate::bus::BusFault>,
    ) -> WireResult<T> {
        let address = self.address;
        let bus = &mut self.bus;
        self.policy
            .run(|| op(&mut *bus, address))
            .map_err(|(attempts, source)| {
                tracing::warn!(
                    address,
                    register,
                    attempts,
                    %source,
                    "bus operation failed after retries"
                );
                WireError::Transport {
                    address,
                    register,
                    attempts,
                    source,
                }
            })
    }

    /// Write a byte or a block at `register`.
    pub fn write<'a>(&mut self, register: u8, payload: impl Into<Payload<'a>>) -> WireResult<()> {
        match payload.into() {
            Payload::Byte(value) => self.write_byte(register, value),
            Payload::Block(data) => self.write_block(register, data),
        }
    }

    pub fn write_byte(&mut self, register: u8, value: u8) -> WireResult<()> {
        self.retrying(register, |bus, address| {
            bus.write_byte(address, register, value)
        })
    }

    pub fn write_block(&mut self, register: u8, data: &[u8]) -> WireResult<()> {
        self.retrying(register, |bus, address| {
            bus.write_block(address, register, data)
        })
    }

    /// Send a bare command byte (no register, no data).
    pub fn command(&mut self, command: u8) -> WireResult<()> {
        self.write_block(command, &[])
    }

    /// Read one byte at `register`.
    pub fn read(&mut self, register: u8) -> WireResult<u8> {
        self.retrying(register, |bus, address| bus.read_byte(address, register))
    }

    /// Read `size` consecutive bytes starting at `register`.
    pub fn read_block(&mut self, register: u8, size: usize) -> WireResult<Vec<u8>> {
        let mut buf = vec![0u8; size];
        self.retrying(register, |bus, address| {
            bus.read_block(address, register, &mut buf)
        })?;
        Ok(buf)
    }

    /// Write a big-endian 16-bit word.
    pub fn write_word(&mut self, register: u8, word: u16) -> WireResult<()> {
        self.write_block(register, &word.to_be_bytes())
    }

    /// Read a big-endian 16-bit word.
    pub fn read_word(&mut self, register: u8) -> WireResult<u16> {
        let bytes = self.read_block(register, 2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Write consecutive big-endian words as one `2 * N` byte block.
    pub fn write_words(&mut self, register: u8, words: &[u16]) -> WireResult<()> {
        self.write_block(register, &encode_words(words))
    }

    /// Read `count` consecutive big-endian words.
    pub fn read_words(&mut self, register: u8, count: usize) -> WireResult<Vec<u16>> {
        let bytes = self.read_block(register, count * 2)?;
        Ok(decode_words(&bytes))
    }
}

pub fn encode_words(words: &[u16]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_be_bytes()).collect()
}

pub fn decode_words(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect()
}
