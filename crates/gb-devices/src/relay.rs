//! Qwiic/SparkFun-style quad relay board.
//!
//! Register map:
//! - `0x01..=0x04`: toggle relay 1..4 (command byte, no payload)
//! - `0x0A` / `0x0B` / `0x0C`: all off / all on / toggle all
//! - `0x05..=0x08`: status of relay 1..4, `0` = off, `15` = on
//!
//! Status reads occasionally return garbage while a relay is switching.
//! Those are re-read a few times and reported as unknown if they never settle.

use std::cell::RefCell;
use std::rc::Rc;

use gb_core::{FieldKind, Value};
use gb_wire::{Bus, BusFault, Wire};

use crate::device::{Device, Sample};
use crate::error::{DeviceError, DeviceResult};
use crate::switch::Switch;

pub const DEFAULT_ADDRESS: u8 = 0x6D;
pub const JUMPER_ADDRESS: u8 = 0x6C;
pub const RELAY_COUNT: usize = 4;

const STATUS_OFFSET: u8 = 0x05;
const STATUS_ON: u8 = 15;
const STATUS_OFF: u8 = 0;
const STATUS_READS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum QuadRelayCommand {
    AllOff = 0x0A,
    AllOn = 0x0B,
    AllToggle = 0x0C,
}

fn decode_status(raw: u8) -> Option<bool> {
    match raw {
        STATUS_ON => Some(true),
        STATUS_OFF => Some(false),
        _ => None,
    }
}

fn toggle_register(relay: usize) -> u8 {
    relay as u8 + 1
}

fn status_register(relay: usize) -> u8 {
    STATUS_OFFSET + relay as u8
}

#[derive(Debug)]
pub struct QuadRelay<B> {
    name: String,
    wire: Wire<B>,
}

impl<B: Bus> QuadRelay<B> {
    pub fn new(name: impl Into<String>, wire: Wire<B>) -> Self {
        Self {
            name: name.into(),
            wire,
        }
    }

    pub fn wire(&self) -> &Wire<B> {
        &self.wire
    }

    fn check_index(&self, relay: usize) -> DeviceResult<()> {
        if relay >= RELAY_COUNT {
            return Err(DeviceError::Configuration {
                what: format!(
                    "{}: relay index {relay} out of range (0..{RELAY_COUNT})",
                    self.name
                ),
            });
        }
        Ok(())
    }

    pub fn send(&mut self, command: QuadRelayCommand) -> DeviceResult<()> {
        self.wire.command(command as u8)?;
        Ok(())
    }

    pub fn all_off(&mut self) -> DeviceResult<()> {
        self.send(QuadRelayCommand::AllOff)
    }

    pub fn all_on(&mut self) -> DeviceResult<()> {
        self.send(QuadRelayCommand::AllOn)
    }

    pub fn all_toggle(&mut self) -> DeviceResult<()> {
        self.send(QuadRelayCommand::AllToggle)
    }

    /// Relay indices are 0-based.
    pub fn toggle(&mut self, relay: usize) -> DeviceResult<()> {
        self.check_index(relay)?;
        self.wire.command(toggle_register(relay))?;
        Ok(())
    }

    /// `None` when the board never reported a recognizable state.
    pub fn status(&mut self, relay: usize) -> DeviceResult<Option<bool>> {
        self.check_index(relay)?;
        let register = status_register(relay);
        for attempt in 1..=STATUS_READS {
            let raw = self.wire.read(register)?;
            if let Some(state) = decode_status(raw) {
                return Ok(Some(state));
            }
            tracing::debug!(device = %self.name, relay, raw, attempt, "unrecognized relay status");
        }
        tracing::warn!(device = %self.name, relay, "relay status unknown");
        Ok(None)
    }

    /// All four statuses from a single block read, re-read while any is garbled.
    pub fn statuses(&mut self) -> DeviceResult<[Option<bool>; RELAY_COUNT]> {
        let mut states = [None; RELAY_COUNT];
        for _ in 0..STATUS_READS {
            let raw = self.wire.read_block(STATUS_OFFSET, RELAY_COUNT)?;
            for (slot, byte) in states.iter_mut().zip(raw) {
                *slot = decode_status(byte);
            }
            if states.iter().all(Option::is_some) {
                break;
            }
        }
        Ok(states)
    }

    /// Drive one relay to `on`, toggling only when it is in the other state.
    pub fn set(&mut self, relay: usize, on: bool) -> DeviceResult<()> {
        match self.status(relay)? {
            Some(current) if current == on => Ok(()),
            Some(_) => self.toggle(relay),
            None => Err(DeviceError::InvalidData {
                device: self.name.clone(),
                what: format!("relay {} state unknown, refusing to toggle", relay + 1),
            }),
        }
    }

    pub fn on(&mut self, relay: usize) -> DeviceResult<()> {
        self.set(relay, true)
    }

    pub fn off(&mut self, relay: usize) -> DeviceResult<()> {
        self.set(relay, false)
    }
}

impl<B: Bus> Device for QuadRelay<B> {
    fn name(&self) -> &str {
        &self.name
    }

    fn begin(&mut self) -> DeviceResult<()> {
        let states = self.statuses()?;
        tracing::info!(device = %self.name, address = self.wire.address(), ?states, "quad relay ready");
        Ok(())
    }

    fn telemetry(&self) -> Vec<FieldKind> {
        vec![FieldKind::Relays]
    }

    fn read(&mut self, field: FieldKind) -> DeviceResult<Sample> {
        if field != FieldKind::Relays {
            return Err(DeviceError::Unsupported {
                device: self.name.clone(),
                field,
            });
        }
        let group = self
            .statuses()?
            .iter()
            .enumerate()
            .map(|(i, state)| {
                let value = match state {
                    Some(on) => Value::Int(i64::from(*on)),
                    None => Value::from("?"),
                };
                (format!("relay{}", i + 1), value)
            })
            .collect();
        Ok(Sample::Group(group))
    }
}

/// One channel of a shared [`QuadRelay`], usable wherever a [`Switch`] is.
#[derive(Debug)]
pub struct RelayChannel<B> {
    relay: Rc<RefCell<QuadRelay<B>>>,
    index: usize,
    on: bool,
}

impl<B: Bus> RelayChannel<B> {
    pub fn new(relay: Rc<RefCell<QuadRelay<B>>>, index: usize) -> DeviceResult<Self> {
        relay.borrow().check_index(index)?;
        Ok(Self {
            relay,
            index,
            on: false,
        })
    }
}

impl<B: Bus> Switch for RelayChannel<B> {
    fn set(&mut self, on: bool) -> DeviceResult<()> {
        self.relay.borrow_mut().set(self.index, on)?;
        self.on = on;
        Ok(())
    }

    fn is_on(&self) -> bool {
        self.on
    }

    fn describe(&self) -> String {
        format!("{}:relay{}", self.relay.borrow().name, self.index + 1)
    }
}

/// Bus-level emulation of a quad relay board at one address.
///
/// Any other address does not acknowledge.
#[derive(Debug, Clone)]
pub struct QuadRelayBoard {
    address: u8,
    relays: [bool; RELAY_COUNT],
    noisy_reads: u32,
}

impl QuadRelayBoard {
    pub fn new(address: u8) -> Self {
        Self {
            address,
            relays: [false; RELAY_COUNT],
            noisy_reads: 0,
        }
    }

    pub fn is_on(&self, relay: usize) -> bool {
        self.relays.get(relay).copied().unwrap_or(false)
    }

    pub fn relays(&self) -> [bool; RELAY_COUNT] {
        self.relays
    }

    /// The next `n` status reads return a mid-switch value.
    pub fn garble_status(&mut self, n: u32) {
        self.noisy_reads = n;
    }

    fn ack(&self, address: u8) -> Result<(), BusFault> {
        if address == self.address {
            Ok(())
        } else {
            Err(BusFault::new(format!("no ack from 0x{address:02X}")))
        }
    }

    fn status_byte(&mut self, register: u8) -> Result<u8, BusFault> {
        let relay = register
            .checked_sub(STATUS_OFFSET)
            .map(usize::from)
            .filter(|r| *r < RELAY_COUNT)
            .ok_or_else(|| BusFault::new(format!("register 0x{register:02X} not readable")))?;
        if self.noisy_reads > 0 {
            self.noisy_reads -= 1;
            return Ok(7);
        }
        Ok(if self.relays[relay] { STATUS_ON } else { STATUS_OFF })
    }
}

impl Bus for QuadRelayBoard {
    fn write_byte(&mut self, address: u8, register: u8, _value: u8) -> Result<(), BusFault> {
        self.ack(address)?;
        Err(BusFault::new(format!(
            "register 0x{register:02X} takes no payload"
        )))
    }

    fn write_block(&mut self, address: u8, register: u8, data: &[u8]) -> Result<(), BusFault> {
        self.ack(address)?;
        if !data.is_empty() {
            return Err(BusFault::new(format!(
                "register 0x{register:02X} takes no payload"
            )));
        }
        match register {
            0x01..=0x04 => {
                let relay = usize::from(register - 1);
                self.relays[relay] = !self.relays[relay];
            }
            0x0A => self.relays = [false; RELAY_COUNT],
            0x0B => self.relays = [true; RELAY_COUNT],
            0x0C => self.relays.iter_mut().for_each(|r| *r = !*r),
            other => return Err(BusFault::new(format!("unknown command 0x{other:02X}"))),
        }
        Ok(())
    }

    fn read_byte(&mut self, address: u8, register: u8) -> Result<u8, BusFault> {
        self.ack(address)?;
        self.status_byte(register)
    }

    fn read_block(&mut self, address: u8, register: u8, buf: &mut [u8]) -> Result<(), BusFault> {
        self.ack(address)?;
        for (offset, slot) in buf.iter_mut().enumerate() {
            *slot = self.status_byte(register + offset as u8)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gb_wire::{RetryPolicy, SharedBus, shared};

    fn relay() -> (SharedBus<QuadRelayBoard>, QuadRelay<SharedBus<QuadRelayBoard>>) {
        let board = shared(QuadRelayBoard::new(DEFAULT_ADDRESS));
        let wire = Wire::new(board.clone(), DEFAULT_ADDRESS, RetryPolicy::default()).unwrap();
        (board, QuadRelay::new("relay", wire))
    }

    #[test]
    fn toggle_flips_one_relay() {
        let (board, mut relay) = relay();
        relay.toggle(2).unwrap();
        assert_eq!(board.borrow().relays(), [false, false, true, false]);
        assert_eq!(relay.status(2).unwrap(), Some(true));
    }

    #[test]
    fn on_is_idempotent() {
        let (board, mut relay) = relay();
        relay.on(0).unwrap();
        relay.on(0).unwrap();
        assert!(board.borrow().is_on(0));
        relay.off(0).unwrap();
        assert!(!board.borrow().is_on(0));
    }

    #[test]
    fn bulk_commands() {
        let (board, mut relay) = relay();
        relay.all_on().unwrap();
        assert_eq!(board.borrow().relays(), [true; 4]);
        relay.toggle(1).unwrap();
        relay.all_toggle().unwrap();
        assert_eq!(board.borrow().relays(), [false, true, false, false]);
        relay.all_off().unwrap();
        assert_eq!(board.borrow().relays(), [false; 4]);
    }

    #[test]
    fn garbled_status_is_reread() {
        let (board, mut relay) = relay();
        relay.toggle(0).unwrap();
        board.borrow_mut().garble_status(2);
        assert_eq!(relay.status(0).unwrap(), Some(true));
    }

    #[test]
    fn persistent_garble_reports_unknown() {
        let (board, mut relay) = relay();
        board.borrow_mut().garble_status(3);
        assert_eq!(relay.status(3).unwrap(), None);
    }

    #[test]
    fn unknown_state_refuses_to_toggle() {
        let (board, mut relay) = relay();
        board.borrow_mut().garble_status(3);
        let err = relay.on(1).unwrap_err();
        assert!(matches!(err, DeviceError::InvalidData { .. }));
        assert!(!board.borrow().is_on(1));
    }

    #[test]
    fn relays_telemetry_group() {
        let (_board, mut relay) = relay();
        relay.on(3).unwrap();
        let sample = relay.read(FieldKind::Relays).unwrap();
        assert_eq!(
            sample,
            Sample::Group(vec![
                ("relay1".into(), Value::Int(0)),
                ("relay2".into(), Value::Int(0)),
                ("relay3".into(), Value::Int(0)),
                ("relay4".into(), Value::Int(1)),
            ])
        );
    }

    #[test]
    fn garbled_block_marks_unknown_relays() {
        let (board, mut relay) = relay();
        // Block reads take one status per relay, so 12 garbles cover all three passes.
        board.borrow_mut().garble_status(12);
        let sample = relay.read(FieldKind::Relays).unwrap();
        let Sample::Group(values) = sample else {
            panic!("expected group");
        };
        assert!(values.iter().all(|(_, v)| *v == Value::from("?")));
    }

    #[test]
    fn index_out_of_range_is_configuration() {
        let (_board, mut relay) = relay();
        let err = relay.toggle(4).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn wrong_address_is_transport_error() {
        let board = shared(QuadRelayBoard::new(JUMPER_ADDRESS));
        let wire = Wire::new(board, DEFAULT_ADDRESS, RetryPolicy::default()).unwrap();
        let mut relay = QuadRelay::new("relay", wire);
        let err = relay.all_off().unwrap_err();
        assert!(matches!(err, DeviceError::Wire(ref w) if w.is_transport()));
        assert!(!err.is_configuration());
    }

    #[test]
    fn channel_switch_drives_board() {
        let board = shared(QuadRelayBoard::new(DEFAULT_ADDRESS));
        let wire = Wire::new(board.clone(), DEFAULT_ADDRESS, RetryPolicy::default()).unwrap();
        let relay = Rc::new(RefCell::new(QuadRelay::new("relay", wire)));
        let mut ch = RelayChannel::new(relay, 1).unwrap();
        ch.set(true).unwrap();
        assert!(board.borrow().is_on(1));
        assert_eq!(ch.describe(), "relay:relay2");
    }
}
