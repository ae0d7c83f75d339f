//! Validated lifecycle tables.
//!
//! A [`LifecycleTable`] is built once, from a slice of [`Phase`] rows, by a
//! `const fn`. Preset tables are `static`s, so a malformed preset stops the
//! build instead of reaching a device.

use crate::engine::KeyRuntime;
use crate::phase::{Phase, PhaseId};

/// A role every usable table has to fill.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Role {
    StableOff,
    StableOn,
    TurningOn,
    TurningOff,
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Role::StableOff => "stable-off",
            Role::StableOn => "stable-on",
            Role::TurningOn => "turning-on",
            Role::TurningOff => "turning-off",
        })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    #[error("lifecycle table is empty")]
    Empty,
    #[error("phase {0} is defined more than once")]
    Duplicate(PhaseId),
    #[error("phase {0} is not defined")]
    MissingPhase(PhaseId),
    #[error("phase {from} expires into undefined phase {to}")]
    DanglingNext { from: PhaseId, to: PhaseId },
    #[error("phase {from} redirects glitches into undefined phase {to}")]
    DanglingGlitch { from: PhaseId, to: PhaseId },
    #[error("phase {0} cannot be reached from OFF")]
    Unreachable(PhaseId),
    #[error("phase {0} can be reached both pressed and released")]
    InconsistentLevel(PhaseId),
    #[error("constant input {sample} starting in {start} never reaches a stable phase")]
    NoFixedPoint { start: PhaseId, sample: bool },
    #[error("stable phase {0} reports the opposite of what it expects")]
    MisreportedStable(PhaseId),
    #[error("no {0} phase")]
    MissingRole(Role),
}

impl TableError {
    /// Fixed message for `const` panics, where formatting is unavailable.
    pub const fn summary(&self) -> &'static str {
        match self {
            TableError::Empty => "lifecycle table is empty",
            TableError::Duplicate(_) => "lifecycle table defines a phase twice",
            TableError::MissingPhase(_) => "lifecycle table has no OFF phase",
            TableError::DanglingNext { .. } => "lifecycle table has a dangling next_phase",
            TableError::DanglingGlitch { .. } => "lifecycle table has a dangling glitch_phase",
            TableError::Unreachable(_) => "lifecycle table has an unreachable phase",
            TableError::InconsistentLevel(_) => "lifecycle table has a phase with two levels",
            TableError::NoFixedPoint { .. } => "lifecycle table does not settle under constant input",
            TableError::MisreportedStable(_) => "lifecycle table has a misreported stable phase",
            TableError::MissingRole(_) => "lifecycle table is missing a required role",
        }
    }
}

/// The debounce FSM shared by every key of every bank.
#[derive(Clone, Debug)]
pub struct LifecycleTable {
    slots: [Phase; PhaseId::COUNT],
    /// Bit per `PhaseId` present in the table.
    defined: u16,
    /// Bit per `PhaseId` whose logical level is "pressed".
    levels: u16,
}

const fn bit(id: PhaseId) -> u16 {
    1 << id.index()
}

/// Placeholder for ids a table leaves out. Validation guarantees nothing
/// refers to them.
const fn parked(id: PhaseId) -> Phase {
    Phase {
        id,
        expected_sample: false,
        hold_ticks: 0,
        next_phase: id,
        glitch_phase: id,
        emits_change: false,
    }
}

impl LifecycleTable {
    /// Build and validate a table.
    ///
    /// Checks, in order: structure (non-empty, no duplicates, `Off`
    /// present), that every reference resolves, reachability from `Off`,
    /// that every phase has one logical level, that constant input always
    /// settles in a stable phase, that stable phases report what they
    /// expect, and that all [`Role`]s are present.
    pub const fn new(phases: &[Phase]) -> Result<Self, TableError> {
        if phases.is_empty() {
            return Err(TableError::Empty);
        }

        let mut slots = [parked(PhaseId::Off); PhaseId::COUNT];
        let mut i = 0;
        while i < PhaseId::COUNT {
            slots[i] = parked(PhaseId::ALL[i]);
            i += 1;
        }

        let mut defined = 0u16;
        let mut i = 0;
        while i < phases.len() {
            let phase = phases[i];
            if defined & bit(phase.id) != 0 {
                return Err(TableError::Duplicate(phase.id));
            }
            defined |= bit(phase.id);
            slots[phase.id.index()] = phase;
            i += 1;
        }

        if defined & bit(PhaseId::Off) == 0 {
            return Err(TableError::MissingPhase(PhaseId::Off));
        }

        let mut i = 0;
        while i < phases.len() {
            let phase = phases[i];
            if defined & bit(phase.next_phase) == 0 {
                return Err(TableError::DanglingNext {
                    from: phase.id,
                    to: phase.next_phase,
                });
            }
            if defined & bit(phase.glitch_phase) == 0 {
                return Err(TableError::DanglingGlitch {
                    from: phase.id,
                    to: phase.glitch_phase,
                });
            }
            i += 1;
        }

        let mut table = LifecycleTable {
            slots,
            defined,
            levels: 0,
        };

        match table.assign_levels() {
            Ok(levels) => table.levels = levels,
            Err(e) => return Err(e),
        }
        if let Err(e) = table.check_fixed_points() {
            return Err(e);
        }
        if let Err(e) = table.check_stable_levels() {
            return Err(e);
        }
        if let Err(e) = table.check_roles() {
            return Err(e);
        }

        Ok(table)
    }

    /// [`LifecycleTable::new`] for `static` presets: a bad table fails
    /// const evaluation.
    pub const fn validated(phases: &[Phase]) -> Self {
        match Self::new(phases) {
            Ok(table) => table,
            Err(e) => panic!("{}", e.summary()),
        }
    }

    /// Row for `id`. Only meaningful for ids the table defines.
    pub const fn phase(&self, id: PhaseId) -> &Phase {
        &self.slots[id.index()]
    }

    pub const fn contains(&self, id: PhaseId) -> bool {
        self.defined & bit(id) != 0
    }

    /// Number of phases defined.
    pub const fn len(&self) -> usize {
        self.defined.count_ones() as usize
    }

    /// Whether the table carries the noisy-switch track.
    pub const fn has_noisy_track(&self) -> bool {
        let mut i = 0;
        while i < PhaseId::COUNT {
            if PhaseId::ALL[i].is_noisy() && self.defined & (1 << i) != 0 {
                return true;
            }
            i += 1;
        }
        false
    }

    /// Debounced level a key reports while in `id` (true = pressed).
    pub const fn level(&self, id: PhaseId) -> bool {
        self.levels & bit(id) != 0
    }

    /// Defined phases in id order.
    pub fn phases(&self) -> impl Iterator<Item = &Phase> + '_ {
        self.slots.iter().filter(move |p| self.contains(p.id))
    }

    /// Propagate levels from `Off` (released): a natural edge into an
    /// emitting phase flips the level, every other edge keeps it.
    const fn assign_levels(&self) -> Result<u16, TableError> {
        let mut known = bit(PhaseId::Off);
        let mut levels = 0u16;

        loop {
            let mut changed = false;
            let mut i = 0;
            while i < PhaseId::COUNT {
                let phase = self.slots[i];
                if known & bit(phase.id) != 0 && self.contains(phase.id) {
                    let level = levels & bit(phase.id) != 0;

                    if !phase.is_stable() {
                        let next = self.phase(phase.next_phase);
                        let next_level = level != next.emits_change;
                        match Self::settle(known, levels, next.id, next_level) {
                            Ok((k, l)) => {
                                changed |= k != known;
                                known = k;
                                levels = l;
                            }
                            Err(e) => return Err(e),
                        }
                    }
                    if !phase.is_lock() {
                        match Self::settle(known, levels, phase.glitch_phase, level) {
                            Ok((k, l)) => {
                                changed |= k != known;
                                known = k;
                                levels = l;
                            }
                            Err(e) => return Err(e),
                        }
                    }
                }
                i += 1;
            }
            if !changed {
                break;
            }
        }

        let mut i = 0;
        while i < PhaseId::COUNT {
            let id = PhaseId::ALL[i];
            if self.contains(id) && known & bit(id) == 0 {
                return Err(TableError::Unreachable(id));
            }
            i += 1;
        }

        Ok(levels)
    }

    const fn settle(
        known: u16,
        levels: u16,
        id: PhaseId,
        level: bool,
    ) -> Result<(u16, u16), TableError> {
        if known & bit(id) != 0 {
            if (levels & bit(id) != 0) != level {
                return Err(TableError::InconsistentLevel(id));
            }
            return Ok((known, levels));
        }
        let levels = if level { levels | bit(id) } else { levels };
        Ok((known | bit(id), levels))
    }

    /// Upper bound on calls a key can spend before constant input either
    /// settles or is proven to cycle.
    const fn settle_bound(&self) -> u32 {
        let mut bound = 0u32;
        let mut i = 0;
        while i < PhaseId::COUNT {
            if self.defined & (1 << i) != 0 {
                bound += self.slots[i].hold_ticks as u32 + 2;
            }
            i += 1;
        }
        bound
    }

    const fn check_fixed_points(&self) -> Result<(), TableError> {
        let bound = self.settle_bound();
        let mut i = 0;
        while i < PhaseId::COUNT {
            let start = self.slots[i];
            if self.contains(start.id) {
                let mut s = 0;
                while s < 2 {
                    let sample = s == 1;
                    let full = KeyRuntime::at(start.id, start.hold_ticks);
                    let empty = KeyRuntime::at(start.id, 0);
                    if !self.settles(full, sample, bound) || !self.settles(empty, sample, bound) {
                        return Err(TableError::NoFixedPoint {
                            start: start.id,
                            sample,
                        });
                    }
                    s += 1;
                }
            }
            i += 1;
        }
        Ok(())
    }

    const fn settles(&self, mut key: KeyRuntime, sample: bool, bound: u32) -> bool {
        let mut steps = 0;
        while steps <= bound {
            let phase = self.phase(key.phase());
            if phase.is_stable() && phase.expected_sample == sample {
                return true;
            }
            key = key.advance(self, sample).0;
            steps += 1;
        }
        false
    }

    const fn check_stable_levels(&self) -> Result<(), TableError> {
        let mut i = 0;
        while i < PhaseId::COUNT {
            let phase = self.slots[i];
            if self.contains(phase.id)
                && phase.is_stable()
                && self.level(phase.id) != phase.expected_sample
            {
                return Err(TableError::MisreportedStable(phase.id));
            }
            i += 1;
        }
        Ok(())
    }

    const fn check_roles(&self) -> Result<(), TableError> {
        let mut stable_off = false;
        let mut stable_on = false;
        let mut turning_on = false;
        let mut turning_off = false;

        let mut i = 0;
        while i < PhaseId::COUNT {
            let phase = self.slots[i];
            if self.contains(phase.id) {
                let level = self.level(phase.id);
                if phase.is_stable() {
                    stable_off |= !phase.expected_sample;
                    stable_on |= phase.expected_sample;
                } else {
                    turning_on |= phase.expected_sample && !level;
                    turning_off |= !phase.expected_sample && level;
                }
            }
            i += 1;
        }

        if !stable_off {
            Err(TableError::MissingRole(Role::StableOff))
        } else if !stable_on {
            Err(TableError::MissingRole(Role::StableOn))
        } else if !turning_on {
            Err(TableError::MissingRole(Role::TurningOn))
        } else if !turning_off {
            Err(TableError::MissingRole(Role::TurningOff))
        } else {
            Ok(())
        }
    }
}
