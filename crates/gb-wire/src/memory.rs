//! In-memory register file with fault injection.

use std::collections::HashMap;

use crate::bus::{Bus, BusFault};

/// Bus backed by a plain register map, one byte per `(address, register)`.
///
/// Block transfers touch consecutive registers. Faults can be injected for
/// the next `n` operations or permanently; every operation, failed or not,
/// counts as an attempt.
#[derive(Debug, Default, Clone)]
pub struct MemoryBus {
    registers: HashMap<(u8, u8), u8>,
    fail_next: u32,
    fail_always: bool,
    attempts: u32,
    writes: Vec<(u8, u8, Vec<u8>)>,
}

impl MemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, address: u8, register: u8, value: u8) {
        self.registers.insert((address, register), value);
    }

    pub fn get(&self, address: u8, register: u8) -> u8 {
        self.registers
            .get(&(address, register))
            .copied()
            .unwrap_or(0)
    }

    /// Fail the next `n` operations, then behave normally.
    pub fn fail_next(&mut self, n: u32) {
        self.fail_next = n;
    }

    /// Fail every operation from now on.
    pub fn fail_always(&mut self) {
        self.fail_always = true;
    }

    pub fn heal(&mut self) {
        self.fail_next = 0;
        self.fail_always = false;
    }

    /// Operations attempted so far, including failed ones.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Successful writes as `(address, register, data)`.
    pub fn writes(&self) -> &[(u8, u8, Vec<u8>)] {
        &self.writes
    }

    fn attempt(&mut self) -> Result<(), BusFault> {
        self.attempts += 1;
        if self.fail_always {
            return Err(BusFault::new("injected fault (permanent)"));
        }
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(BusFault::new("injected fault"));
        }
        Ok(())
    }
}

impl Bus for MemoryBus {
    fn write_byte(&mut self, address: u8, register: u8, value: u8) -> Result<(), BusFault> {
        self.attempt()?;
        self.set(address, register, value);
        self.writes.push((address, register, vec![value]));
        Ok(())
    }

    fn write_block(&mut self, address: u8, register: u8, data: &[u8]) -> Result<(), BusFault> {
        self.attempt()?;
        for (offset, value) in data.iter().enumerate() {
            self.set(address, register.wrapping_add(offset as u8), *value);
        }
        self.writes.push((address, register, data.to_vec()));
        Ok(())
    }

    fn read_byte(&mut self, address: u8, register: u8) -> Result<u8, BusFault> {
        self.attempt()?;
        Ok(self.get(address, register))
    }

    fn read_block(&mut self, address: u8, register: u8, buf: &mut [u8]) -> Result<(), BusFault> {
        self.attempt()?;
        for (offset, slot) in buf.iter_mut().enumerate() {
            *slot = self.get(address, register.wrapping_add(offset as u8));
        }
        Ok(())
    }
}
