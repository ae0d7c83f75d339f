//! Phase identities and the per-phase transition rules of the debounce FSM.

/// Every phase a key can be in.
///
/// The first six form the primary track. The `Noisy*` phases duplicate them
/// for switches that have been caught chattering; only the chatter-defense
/// table defines those.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PhaseId {
    /// Released and idle. Any contact starts a press check.
    Off = 0,
    /// A contact was seen; waiting for it to hold.
    TurningOn = 1,
    /// Press confirmed; the key reads as pressed no matter what the pin says.
    LockedOn = 2,
    /// Pressed and idle. Any open contact starts a release check.
    On = 3,
    /// An open contact was seen; waiting for it to hold.
    TurningOff = 4,
    /// Release confirmed; contrary samples are ignored for the hold.
    LockedOff = 5,
    NoisyOff = 6,
    NoisyTurningOn = 7,
    NoisyLockedOn = 8,
    NoisyOn = 9,
    NoisyTurningOff = 10,
    NoisyLockedOff = 11,
}

impl PhaseId {
    /// Number of phase identities.
    pub const COUNT: usize = 12;

    /// All phase identities, in index order.
    pub const ALL: [PhaseId; PhaseId::COUNT] = [
        PhaseId::Off,
        PhaseId::TurningOn,
        PhaseId::LockedOn,
        PhaseId::On,
        PhaseId::TurningOff,
        PhaseId::LockedOff,
        PhaseId::NoisyOff,
        PhaseId::NoisyTurningOn,
        PhaseId::NoisyLockedOn,
        PhaseId::NoisyOn,
        PhaseId::NoisyTurningOff,
        PhaseId::NoisyLockedOff,
    ];

    /// Array index of this phase.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Inverse of [`PhaseId::index`].
    pub const fn from_index(index: usize) -> Option<PhaseId> {
        if index < PhaseId::COUNT {
            Some(PhaseId::ALL[index])
        } else {
            None
        }
    }

    /// Whether this phase belongs to the noisy-switch track.
    pub const fn is_noisy(self) -> bool {
        self as u8 >= PhaseId::NoisyOff as u8
    }

    /// `==` usable in `const` context.
    pub const fn same(self, other: PhaseId) -> bool {
        self as u8 == other as u8
    }

    /// Name used in tables, logs and graphs.
    pub fn name(self) -> &'static str {
        match self {
            PhaseId::Off => "OFF",
            PhaseId::TurningOn => "TURNING_ON",
            PhaseId::LockedOn => "LOCKED_ON",
            PhaseId::On => "ON",
            PhaseId::TurningOff => "TURNING_OFF",
            PhaseId::LockedOff => "LOCKED_OFF",
            PhaseId::NoisyOff => "NOISY_OFF",
            PhaseId::NoisyTurningOn => "NOISY_TURNING_ON",
            PhaseId::NoisyLockedOn => "NOISY_LOCKED_ON",
            PhaseId::NoisyOn => "NOISY_ON",
            PhaseId::NoisyTurningOff => "NOISY_TURNING_OFF",
            PhaseId::NoisyLockedOff => "NOISY_LOCKED_OFF",
        }
    }
}

impl core::fmt::Display for PhaseId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// One row of a lifecycle table.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Phase {
    pub id: PhaseId,
    /// Sample value this phase normally observes (true = contact closed).
    pub expected_sample: bool,
    /// Calls with expected data before the natural transition is honored.
    pub hold_ticks: u8,
    /// Destination on natural expiry. Pointing at `id` makes the phase stable.
    pub next_phase: PhaseId,
    /// Destination entered immediately on unexpected data. Pointing at `id`
    /// makes the phase a lock window that absorbs contrary samples.
    pub glitch_phase: PhaseId,
    /// Arriving here by natural expiry flips the debounced bit.
    pub emits_change: bool,
}

impl Phase {
    /// Never exits naturally.
    pub const fn is_stable(&self) -> bool {
        self.next_phase.same(self.id)
    }

    /// Contrary samples are absorbed instead of redirecting the key.
    pub const fn is_lock(&self) -> bool {
        self.glitch_phase.same(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_roundtrip() {
        for (i, id) in PhaseId::ALL.iter().enumerate() {
            assert_eq!(id.index(), i);
            assert_eq!(PhaseId::from_index(i), Some(*id));
        }
        assert_eq!(PhaseId::from_index(PhaseId::COUNT), None);
    }

    #[test]
    fn test_noisy_track_membership() {
        assert!(!PhaseId::LockedOff.is_noisy());
        assert!(PhaseId::NoisyOff.is_noisy());
        assert!(PhaseId::NoisyLockedOff.is_noisy());
        assert_eq!(PhaseId::ALL.iter().filter(|p| p.is_noisy()).count(), 6);
    }

    #[test]
    fn test_stable_and_lock() {
        let on = Phase {
            id: PhaseId::On,
            expected_sample: true,
            hold_ticks: 1,
            next_phase: PhaseId::On,
            glitch_phase: PhaseId::TurningOff,
            emits_change: false,
        };
        assert!(on.is_stable());
        assert!(!on.is_lock());

        let locked = Phase {
            id: PhaseId::LockedOn,
            next_phase: PhaseId::On,
            glitch_phase: PhaseId::LockedOn,
            ..on
        };
        assert!(!locked.is_stable());
        assert!(locked.is_lock());
    }
}
