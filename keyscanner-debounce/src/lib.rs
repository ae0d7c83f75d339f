//! Table-driven key switch debouncing.
//!
//! Every key runs a small finite-state machine whose phases, hold lengths and
//! transitions come from a [`LifecycleTable`]. Keys are handled in banks of
//! eight that share one debounced-state byte, so a scan tick costs one
//! [`Debouncer::process_sample`] call per bank.
//!
//! This crate is `no_std` so the same engine runs in the scan interrupt and
//! in the native replay tool.

#![cfg_attr(not(test), no_std)]

pub mod engine;
pub mod interval;
pub mod phase;
pub mod report;
pub mod scanner;
pub mod table;
pub mod tables;

pub use engine::{Bank, Debouncer, KeyRuntime, KEYS_PER_BANK};
pub use interval::{ScanInterval, ScanIntervalError};
pub use phase::{Phase, PhaseId};
pub use report::ReportQueue;
pub use scanner::{KeyScanner, KeyState, Matrix, Polarity};
pub use table::{LifecycleTable, Role, TableError};
pub use tables::{TableVariant, CHATTER_DEFENSE, MINIMAL};
