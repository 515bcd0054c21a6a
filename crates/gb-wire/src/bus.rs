//! Raw bus abstraction.

use std::cell::RefCell;
use std::rc::Rc;

/// A transient fault reported by the bus for a single operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct BusFault {
    pub message: String,
}

impl BusFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Register-addressable bus (SMBus-style byte and block transfers).
///
/// A block write with an empty `data` slice transmits the register byte
/// alone, which is how command-style devices are driven.
pub trait Bus {
    fn write_byte(&mut self, address: u8, register: u8, value: u8) -> Result<(), BusFault>;

    fn write_block(&mut self, address: u8, register: u8, data: &[u8]) -> Result<(), BusFault>;

    fn read_byte(&mut self, address: u8, register: u8) -> Result<u8, BusFault>;

    fn read_block(&mut self, address: u8, register: u8, buf: &mut [u8]) -> Result<(), BusFault>;
}

/// A bus shared by every device on the same physical lines.
///
/// The loop is single threaded; one operation completes before the next
/// starts, so a `RefCell` is all the coordination needed. `SharedBus<dyn Bus>`
/// shares a bus whose concrete type is only known at runtime.
pub type SharedBus<B> = Rc<RefCell<B>>;

pub fn shared<B: Bus>(bus: B) -> SharedBus<B> {
    Rc::new(RefCell::new(bus))
}

impl<B: Bus + ?Sized> Bus for Rc<RefCell<B>> {
    fn write_byte(&mut self, address: u8, register: u8, value: u8) -> Result<(), BusFault> {
        self.borrow_mut().write_byte(address, register, value)
    }

    fn write_block(&mut self, address: u8, register: u8, data: &[u8]) -> Result<(), BusFault> {
        self.borrow_mut().write_block(address, register, data)
    }

    fn read_byte(&mut self, address: u8, register: u8) -> Result<u8, BusFault> {
        self.borrow_mut().read_byte(address, register)
    }

    fn read_block(&mut self, address: u8, register: u8, buf: &mut [u8]) -> Result<(), BusFault> {
        self.borrow_mut().read_block(address, register, buf)
    }
}

impl<B: Bus + ?Sized> Bus for Box<B> {
    fn write_byte(&mut self, address: u8, register: u8, value: u8) -> Result<(), BusFault> {
        (**self).write_byte(address, register, value)
    }

    fn write_block(&mut self, address: u8, register: u8, data: &[u8]) -> Result<(), BusFault> {
        (**self).write_block(address, register, data)
    }

    fn read_byte(&mut self, address: u8, register: u8) -> Result<u8, BusFault> {
        (**self).read_byte(address, register)
    }

    fn read_block(&mut self, address: u8, register: u8, buf: &mut [u8]) -> Result<(), BusFault> {
        (**self).read_block(address, register, buf)
    }
}
