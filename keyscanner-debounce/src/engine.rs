//! Per-key debouncing.
//!
//! Each key runs its own copy of the lifecycle FSM. A key only reports a
//! change when it arrives, by natural expiry, in a phase marked
//! `emits_change`; every other move is silent.

use crate::phase::PhaseId;
use crate::table::LifecycleTable;

/// Keys sharing one debounced-state byte.
pub const KEYS_PER_BANK: usize = 8;

/// Mutable FSM state of one key.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct KeyRuntime {
    phase: PhaseId,
    ticks_remaining: u8,
}

impl KeyRuntime {
    /// Released, in `Off`, with nothing left to count.
    pub const fn new() -> Self {
        Self::at(PhaseId::Off, 0)
    }

    pub(crate) const fn at(phase: PhaseId, ticks_remaining: u8) -> Self {
        Self {
            phase,
            ticks_remaining,
        }
    }

    pub const fn phase(&self) -> PhaseId {
        self.phase
    }

    pub const fn ticks_remaining(&self) -> u8 {
        self.ticks_remaining
    }

    /// Feed one sample. Returns the new runtime and whether the debounced
    /// bit flips.
    ///
    /// Unexpected data moves the key to its glitch phase at once, unless
    /// the key already sits there, in which case the sample is absorbed and
    /// the countdown carries on. The countdown is decrement-then-compare,
    /// floored at zero.
    pub const fn advance(self, table: &LifecycleTable, sample: bool) -> (KeyRuntime, bool) {
        let current = table.phase(self.phase);

        if sample != current.expected_sample && !current.is_lock() {
            let glitch = table.phase(current.glitch_phase);
            return (KeyRuntime::at(glitch.id, glitch.hold_ticks), false);
        }

        let ticks = self.ticks_remaining.saturating_sub(1);
        if ticks == 0 && !current.is_stable() {
            let next = table.phase(current.next_phase);
            return (KeyRuntime::at(next.id, next.hold_ticks), next.emits_change);
        }

        (KeyRuntime::at(self.phase, ticks), false)
    }
}

impl Default for KeyRuntime {
    fn default() -> Self {
        Self::new()
    }
}

/// Eight keys and their debounced state byte.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Bank {
    keys: [KeyRuntime; KEYS_PER_BANK],
    state: u8,
}

impl Bank {
    pub const fn new() -> Self {
        Self {
            keys: [KeyRuntime::new(); KEYS_PER_BANK],
            state: 0,
        }
    }

    /// Debounced state, bit i = key i pressed.
    pub const fn state(&self) -> u8 {
        self.state
    }

    pub const fn keys(&self) -> &[KeyRuntime; KEYS_PER_BANK] {
        &self.keys
    }

    pub fn key(&self, index: usize) -> Option<&KeyRuntime> {
        self.keys.get(index)
    }

    /// Bitmap of keys currently on the noisy-switch track.
    pub fn noisy_keys(&self) -> u8 {
        self.keys
            .iter()
            .enumerate()
            .filter(|(_, key)| key.phase.is_noisy())
            .fold(0, |mask, (i, _)| mask | 1 << i)
    }

    /// Back to power-on state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for Bank {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs the shared lifecycle table over banks of keys.
#[derive(Copy, Clone, Debug)]
pub struct Debouncer<'t> {
    table: &'t LifecycleTable,
}

impl<'t> Debouncer<'t> {
    pub const fn new(table: &'t LifecycleTable) -> Self {
        Self { table }
    }

    pub const fn table(&self) -> &'t LifecycleTable {
        self.table
    }

    /// Debounce one sample of a bank. Call once per scan tick.
    ///
    /// `sample` must already be canonicalized: bit i set means key i's
    /// contact is closed. Returns the bits of `bank.state()` that flipped.
    pub fn process_sample(&self, sample: u8, bank: &mut Bank) -> u8 {
        let mut changes = 0u8;

        for (i, key) in bank.keys.iter_mut().enumerate() {
            let (next, flipped) = key.advance(self.table, sample & (1 << i) != 0);
            *key = next;
            if flipped {
                changes |= 1 << i;
            }
        }

        bank.state ^= changes;
        changes
    }
}
