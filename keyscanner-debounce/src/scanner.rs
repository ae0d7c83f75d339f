//! Glue between a key matrix and the debouncer.
//!
//! One [`KeyScanner::scan`] call is one tick: every bank is read once,
//! canonicalized and debounced. When anything changed, the scan hands back a
//! snapshot of all state bytes for the transport to send.

use crate::engine::{Bank, Debouncer};
use crate::table::LifecycleTable;

/// Raw access to the switch matrix, one 8-key bank at a time.
pub trait Matrix {
    /// Drive bank `bank` and return its eight input pins.
    fn read_bank(&mut self, bank: usize) -> u8;
}

/// Electrical level of a closed switch.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Polarity {
    ActiveHigh,
    /// Inputs with pull-ups read low when the switch closes.
    #[default]
    ActiveLow,
}

impl Polarity {
    /// Raw pins to "bit set = contact closed".
    pub const fn canonicalize(self, pins: u8) -> u8 {
        match self {
            Polarity::ActiveHigh => pins,
            Polarity::ActiveLow => !pins,
        }
    }
}

/// Debounced state of every bank, bit set = pressed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyState<const BANKS: usize>(pub [u8; BANKS]);

impl<const BANKS: usize> KeyState<BANKS> {
    pub const fn bytes(&self) -> &[u8; BANKS] {
        &self.0
    }

    pub fn is_pressed(&self, bank: usize, key: usize) -> bool {
        key < 8 && self.0.get(bank).is_some_and(|b| *b & (1u8 << key) != 0)
    }

    /// Number of keys down across all banks.
    pub fn pressed_count(&self) -> u32 {
        self.0.iter().map(|b| b.count_ones()).sum()
    }
}

pub struct KeyScanner<const BANKS: usize> {
    debouncer: Debouncer<'static>,
    banks: [Bank; BANKS],
    polarity: Polarity,
    noisy: [u8; BANKS],
}

impl<const BANKS: usize> KeyScanner<BANKS> {
    pub const fn new(table: &'static LifecycleTable, polarity: Polarity) -> Self {
        Self {
            debouncer: Debouncer::new(table),
            banks: [Bank::new(); BANKS],
            polarity,
            noisy: [0; BANKS],
        }
    }

    /// Run one tick. Returns a snapshot if any key changed.
    pub fn scan<M: Matrix>(&mut self, matrix: &mut M) -> Option<KeyState<BANKS>> {
        let mut changes = 0u8;

        for (index, bank) in self.banks.iter_mut().enumerate() {
            let sample = self.polarity.canonicalize(matrix.read_bank(index));
            let changed = self.debouncer.process_sample(sample, bank);
            if changed != 0 {
                log::trace!(
                    "bank {}: changed {:08b}, state {:08b}",
                    index,
                    changed,
                    bank.state()
                );
            }
            changes |= changed;

            let noisy = bank.noisy_keys();
            let newly_noisy = noisy & !self.noisy[index];
            if newly_noisy != 0 {
                log::debug!("bank {}: keys {:08b} now on the noisy track", index, newly_noisy);
            }
            self.noisy[index] = noisy;
        }

        if changes == 0 {
            return None;
        }
        Some(self.state())
    }

    pub fn state(&self) -> KeyState<BANKS> {
        KeyState(core::array::from_fn(|i| self.banks[i].state()))
    }

    pub fn bank(&self, index: usize) -> Option<&Bank> {
        self.banks.get(index)
    }

    /// Per-bank bitmap of keys on the noisy track, as of the last scan.
    pub fn noisy_keys(&self) -> [u8; BANKS] {
        self.noisy
    }

    pub const fn polarity(&self) -> Polarity {
        self.polarity
    }

    pub fn reset(&mut self) {
        self.banks = [Bank::new(); BANKS];
        self.noisy = [0; BANKS];
    }
}
