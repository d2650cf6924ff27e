//! Activation gate shared by every registration of one plugin activation.
//!
//! The bus, router and scheduler keep a gated registration stored while the
//! gate is pending, act on it only while it is open, and ignore it once it is
//! closed. Opening and closing are single atomic steps, so all three
//! registries switch over together.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

const PENDING: u8 = 0;
const OPEN: u8 = 1;
const CLOSED: u8 = 2;

#[derive(Debug, Clone)]
pub struct Gate(Arc<AtomicU8>);

impl Gate {
    /// Registrations stay invisible until [`Gate::open`]
    pub fn pending() -> Self {
        Self(Arc::new(AtomicU8::new(PENDING)))
    }

    /// Always open; used by the runtime's own registrations
    pub fn always() -> Self {
        Self(Arc::new(AtomicU8::new(OPEN)))
    }

    /// Pending to open; false if the gate was already closed
    pub fn open(&self) -> bool {
        match self.0.compare_exchange(PENDING, OPEN, Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) => true,
            Err(state) => state == OPEN,
        }
    }

    pub fn close(&self) {
        self.0.store(CLOSED, Ordering::Release);
    }

    pub fn is_open(&self) -> bool {
        self.0.load(Ordering::Acquire) == OPEN
    }

    pub fn is_closed(&self) -> bool {
        self.0.load(Ordering::Acquire) == CLOSED
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::always()
    }
}
