//! On/off outputs.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::DeviceResult;

/// A single on/off output (relay channel, MOSFET pin, ...).
pub trait Switch {
    fn set(&mut self, on: bool) -> DeviceResult<()>;

    /// Last commanded state.
    fn is_on(&self) -> bool;

    fn describe(&self) -> String;
}

/// In-memory switch. Clones share state, so tests keep a clone to inspect it.
#[derive(Debug, Clone, Default)]
pub struct SimSwitch {
    label: String,
    history: Rc<RefCell<Vec<bool>>>,
}

impl SimSwitch {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            history: Rc::default(),
        }
    }

    /// Every state the switch was set to, in order.
    pub fn history(&self) -> Vec<bool> {
        self.history.borrow().clone()
    }
}

impl Switch for SimSwitch {
    fn set(&mut self, on: bool) -> DeviceResult<()> {
        self.history.borrow_mut().push(on);
        Ok(())
    }

    fn is_on(&self) -> bool {
        self.history.borrow().last().copied().unwrap_or(false)
    }

    fn describe(&self) -> String {
        format!("sim:{}", self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_history() {
        let observer = SimSwitch::new("fan");
        let mut sw = observer.clone();
        sw.set(true).unwrap();
        sw.set(false).unwrap();
        assert_eq!(observer.history(), vec![true, false]);
        assert!(!observer.is_on());
    }
}
