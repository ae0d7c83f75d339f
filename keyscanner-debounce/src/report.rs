//! Hand-off of key state snapshots from the scan interrupt to the transport.
//!
//! The scan side pushes a snapshot whenever something changed; the transport
//! side pops them in order. When the transport falls behind, the oldest
//! snapshot is dropped: every snapshot carries the full state, so the newest
//! one always wins.

use core::cell::RefCell;

use critical_section::Mutex;
use heapless::Deque;

use crate::scanner::KeyState;

pub struct ReportQueue<const BANKS: usize, const DEPTH: usize> {
    inner: Mutex<RefCell<Deque<KeyState<BANKS>, DEPTH>>>,
}

impl<const BANKS: usize, const DEPTH: usize> ReportQueue<BANKS, DEPTH> {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Deque::new())),
        }
    }

    /// Queue a snapshot. Returns `true` if an older one had to be dropped.
    pub fn push(&self, state: KeyState<BANKS>) -> bool {
        critical_section::with(|cs| {
            let mut queue = self.inner.borrow_ref_mut(cs);
            let mut dropped = false;
            if queue.is_full() {
                queue.pop_front();
                dropped = true;
            }
            if queue.push_back(state).is_err() {
                // Only possible with DEPTH == 0.
                return true;
            }
            dropped
        })
    }

    pub fn pop(&self) -> Option<KeyState<BANKS>> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).pop_front())
    }

    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.inner.borrow_ref(cs).len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).clear());
    }
}

impl<const BANKS: usize, const DEPTH: usize> Default for ReportQueue<BANKS, DEPTH> {
    fn default() -> Self {
        Self::new()
    }
}
