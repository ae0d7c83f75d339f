//! Preset lifecycle tables.
//!
//! Hold lengths are in scan ticks. At the default scan interval a tick is
//! roughly half a millisecond, so `TURNING_OFF(16)` delays a release by
//! about 7 ms.

use crate::phase::{Phase, PhaseId::*};
use crate::table::LifecycleTable;

/// Rows of [`MINIMAL`].
pub const MINIMAL_PHASES: [Phase; 6] = [
    // Idle and released. A single closed contact starts a press check.
    Phase {
        id: Off,
        expected_sample: false,
        hold_ticks: 1,
        next_phase: Off,
        glitch_phase: TurningOn,
        emits_change: false,
    },
    // One more closed sample confirms the press.
    Phase {
        id: TurningOn,
        expected_sample: true,
        hold_ticks: 1,
        next_phase: LockedOn,
        glitch_phase: Off,
        emits_change: false,
    },
    // Press reported. Open samples are chatter and are ignored.
    Phase {
        id: LockedOn,
        expected_sample: true,
        hold_ticks: 10,
        next_phase: On,
        glitch_phase: LockedOn,
        emits_change: true,
    },
    Phase {
        id: On,
        expected_sample: true,
        hold_ticks: 1,
        next_phase: On,
        glitch_phase: TurningOff,
        emits_change: false,
    },
    // Release latency: the contact must stay open for the whole hold.
    Phase {
        id: TurningOff,
        expected_sample: false,
        hold_ticks: 16,
        next_phase: LockedOff,
        glitch_phase: On,
        emits_change: false,
    },
    Phase {
        id: LockedOff,
        expected_sample: false,
        hold_ticks: 1,
        next_phase: Off,
        glitch_phase: LockedOff,
        emits_change: true,
    },
];

/// Rows of [`CHATTER_DEFENSE`].
pub const CHATTER_DEFENSE_PHASES: [Phase; 12] = [
    Phase {
        id: Off,
        expected_sample: false,
        hold_ticks: 1,
        next_phase: Off,
        glitch_phase: TurningOn,
        emits_change: false,
    },
    Phase {
        id: TurningOn,
        expected_sample: true,
        hold_ticks: 1,
        next_phase: LockedOn,
        glitch_phase: Off,
        emits_change: false,
    },
    // An open contact inside the lock window marks the switch as noisy.
    Phase {
        id: LockedOn,
        expected_sample: true,
        hold_ticks: 10,
        next_phase: On,
        glitch_phase: NoisyLockedOn,
        emits_change: true,
    },
    Phase {
        id: On,
        expected_sample: true,
        hold_ticks: 1,
        next_phase: On,
        glitch_phase: TurningOff,
        emits_change: false,
    },
    // A contact that closes again mid-release is a spurious open: noisy.
    Phase {
        id: TurningOff,
        expected_sample: false,
        hold_ticks: 16,
        next_phase: LockedOff,
        glitch_phase: NoisyOn,
        emits_change: false,
    },
    Phase {
        id: LockedOff,
        expected_sample: false,
        hold_ticks: 1,
        next_phase: Off,
        glitch_phase: NoisyOff,
        emits_change: true,
    },
    Phase {
        id: NoisyOff,
        expected_sample: false,
        hold_ticks: 1,
        next_phase: NoisyOff,
        glitch_phase: NoisyTurningOn,
        emits_change: false,
    },
    Phase {
        id: NoisyTurningOn,
        expected_sample: true,
        hold_ticks: 1,
        next_phase: NoisyLockedOn,
        glitch_phase: NoisyOff,
        emits_change: false,
    },
    Phase {
        id: NoisyLockedOn,
        expected_sample: true,
        hold_ticks: 100,
        next_phase: NoisyOn,
        glitch_phase: NoisyLockedOn,
        emits_change: true,
    },
    Phase {
        id: NoisyOn,
        expected_sample: true,
        hold_ticks: 1,
        next_phase: NoisyOn,
        glitch_phase: NoisyTurningOff,
        emits_change: false,
    },
    Phase {
        id: NoisyTurningOff,
        expected_sample: false,
        hold_ticks: 59,
        next_phase: NoisyLockedOff,
        glitch_phase: NoisyOn,
        emits_change: false,
    },
    // A completed noisy release hands the key back to the primary track.
    Phase {
        id: NoisyLockedOff,
        expected_sample: false,
        hold_ticks: 1,
        next_phase: Off,
        glitch_phase: NoisyLockedOff,
        emits_change: true,
    },
];

/// Six-phase table: confirm, lock, release with latency.
pub static MINIMAL: LifecycleTable = LifecycleTable::validated(&MINIMAL_PHASES);

/// Twelve-phase table with a slow track for switches caught chattering.
pub static CHATTER_DEFENSE: LifecycleTable = LifecycleTable::validated(&CHATTER_DEFENSE_PHASES);

/// Build-time choice of preset.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum TableVariant {
    Minimal,
    #[default]
    ChatterDefense,
}

impl TableVariant {
    pub const ALL: [TableVariant; 2] = [TableVariant::Minimal, TableVariant::ChatterDefense];

    pub fn table(self) -> &'static LifecycleTable {
        match self {
            TableVariant::Minimal => &MINIMAL,
            TableVariant::ChatterDefense => &CHATTER_DEFENSE,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TableVariant::Minimal => "minimal",
            TableVariant::ChatterDefense => "chatter-defense",
        }
    }
}

impl core::fmt::Display for TableVariant {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}
