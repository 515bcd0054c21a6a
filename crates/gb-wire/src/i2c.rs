//! Adapter from `embedded-hal` I2C buses.
//!
//! Any HAL implementing `embedded_hal::i2c::I2c` (linux-embedded-hal,
//! rp2040-hal, esp-hal, ...) can back a [`Wire`](crate::Wire) through
//! [`I2cBus`]. Register access is expressed as a register-byte write,
//! optionally followed by a repeated-start read.

use embedded_hal::i2c::I2c;

use crate::bus::{Bus, BusFault};

#[derive(Debug)]
pub struct I2cBus<I> {
    i2c: I,
}

impl<I: I2c> I2cBus<I> {
    pub fn new(i2c: I) -> Self {
        Self { i2c }
    }

    pub fn into_inner(self) -> I {
        self.i2c
    }
}

fn fault<E: embedded_hal::i2c::Error>(err: E) -> BusFault {
    BusFault::new(format!("i2c: {:?}", err.kind()))
}

impl<I: I2c> Bus for I2cBus<I> {
    fn write_byte(&mut self, address: u8, register: u8, value: u8) -> Result<(), BusFault> {
        self.i2c.write(address, &[register, value]).map_err(fault)
    }

    fn write_block(&mut self, address: u8, register: u8, data: &[u8]) -> Result<(), BusFault> {
        let mut frame = Vec::with_capacity(data.len() + 1);
        frame.push(register);
        frame.extend_from_slice(data);
        self.i2c.write(address, &frame).map_err(fault)
    }

    fn read_byte(&mut self, address: u8, register: u8) -> Result<u8, BusFault> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(address, &[register], &mut buf)
            .map_err(fault)?;
        Ok(buf[0])
    }

    fn read_block(&mut self, address: u8, register: u8, buf: &mut [u8]) -> Result<(), BusFault> {
        self.i2c
            .write_read(address, &[register], buf)
            .map_err(fault)
    }
}
