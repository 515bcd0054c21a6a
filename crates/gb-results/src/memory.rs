//! In-memory sink.

use std::cell::RefCell;
use std::rc::Rc;

use gb_core::Reading;

use crate::ResultsResult;
use crate::sink::ReadingSink;

/// Clones share one buffer: hand one clone to the loop, inspect another.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    rows: Rc<RefCell<Vec<Reading>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> Vec<Reading> {
        self.rows.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.rows.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.borrow().is_empty()
    }

    pub fn last(&self) -> Option<Reading> {
        self.rows.borrow().last().cloned()
    }
}

impl ReadingSink for MemorySink {
    fn append(&mut self, reading: &Reading) -> ResultsResult<()> {
        self.rows.borrow_mut().push(reading.clone());
        Ok(())
    }
}
