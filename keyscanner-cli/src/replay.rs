//! Replay recorded traces through a debouncer, the way the scanner would
//! have sampled them.

use crate::trace::Trace;
use keyscanner_debounce::{Bank, Debouncer, LifecycleTable, ScanInterval};
use std::fmt;

/// Rate the default scan interval is nominally run at: two scans per
/// millisecond. Recorded results were produced against this figure.
pub const NOMINAL_DEFAULT_RATE: u32 = 2000;

/// Idle samples fed before each run.
const LEAD_IN: usize = 100;
/// Idle samples fed after each run, long enough for any release to land.
const LEAD_OUT: usize = 200;
/// Averaging thresholds, in percent of closed samples.
const AVERAGE_THRESHOLDS: [u32; 3] = [33, 50, 66];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Issue {
    /// A bit other than key 0 changed or was set.
    Overflow,
    /// The returned change bits disagree with the state byte.
    ChangesMiss,
    /// A run ended with the key still reported as pressed.
    PressReleaseMismatched,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Issue::Overflow => "overflow",
            Issue::ChangesMiss => "changes_miss",
            Issue::PressReleaseMismatched => "press_rel_mismatched",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// Each kind of issue is recorded once, in order of first occurrence.
    pub issues: Vec<Issue>,
    pub runs: u32,
    pub presses: u32,
    pub releases: u32,
    pub expected_presses: u32,
}

impl Outcome {
    pub fn passed(&self) -> bool {
        self.issues.is_empty() && self.presses == self.expected_presses
    }

    /// Average surplus (or shortfall) of presses per run.
    pub fn press_delta(&self) -> f64 {
        (self.presses as f64 - self.expected_presses as f64) / self.runs.max(1) as f64
    }

    /// `0` when the press count is right, otherwise the signed per-run delta.
    pub fn result(&self) -> String {
        if self.presses == self.expected_presses {
            "0".to_string()
        } else {
            format!("{:+.2}", self.press_delta())
        }
    }
}

/// Simulated sampling rate for `interval`.
///
/// The default interval replays at [`NOMINAL_DEFAULT_RATE`] unless `exact`
/// asks for the rate the timer actually produces; other intervals always use
/// the timer rate.
pub fn target_rate(interval: ScanInterval, exact: bool) -> u32 {
    if interval == ScanInterval::DEFAULT && !exact {
        NOMINAL_DEFAULT_RATE
    } else {
        interval.sampling_rate_hz()
    }
}

/// Output for one trace: a `table;file;issue` line per issue, then the
/// `table;file;result` line.
pub fn report_lines(table: &str, file: &str, outcome: &Outcome) -> Vec<String> {
    outcome
        .issues
        .iter()
        .map(ToString::to_string)
        .chain(std::iter::once(outcome.result()))
        .map(|what| format!("{};{};{}", table, file, what))
        .collect()
}

/// Debouncer state and counters shared by every run over one trace.
struct Harness<'t> {
    debouncer: Debouncer<'t>,
    bank: Bank,
    last_state: u8,
    presses: u32,
    releases: u32,
    issues: Vec<Issue>,
}

impl<'t> Harness<'t> {
    fn new(table: &'t LifecycleTable) -> Self {
        Self {
            debouncer: Debouncer::new(table),
            bank: Bank::new(),
            last_state: 0,
            presses: 0,
            releases: 0,
            issues: Vec::new(),
        }
    }

    fn flag(&mut self, issue: Issue) {
        if !self.issues.contains(&issue) {
            self.issues.push(issue);
        }
    }

    fn step(&mut self, sample: bool) {
        let changes = self.debouncer.process_sample(sample as u8, &mut self.bank);
        let state = self.bank.state();

        if (changes | state) & !1 != 0 {
            self.flag(Issue::Overflow);
        }
        let said_changed = changes != 0;
        let state_changed = state != self.last_state;
        self.last_state = state;
        if said_changed != state_changed {
            self.flag(Issue::ChangesMiss);
        }
        if said_changed {
            if state != 0 {
                self.presses += 1;
            } else {
                self.releases += 1;
            }
        }
        log::trace!("{} {}", sample as u8, state);
    }

    fn idle(&mut self, count: usize) {
        for _ in 0..count {
            self.step(false);
        }
    }

    fn end_run(&mut self) {
        if self.presses != self.releases {
            self.flag(Issue::PressReleaseMismatched);
        }
    }
}

/// Replay `trace` against `table` as if scanned at `target_rate` Hz.
///
/// Every run is framed by idle samples. Nearest-sample runs are repeated for
/// each sampling offset the rate ratio allows; when the trace holds at least
/// twice the needed data, averaging runs are added on top. The debouncer is
/// not reset between runs.
pub fn replay(table: &LifecycleTable, trace: &Trace, target_rate: u32) -> Outcome {
    let data_rate = trace.sampling_rate as u64;
    let target = target_rate.max(1) as u64;
    let len = trace.samples.len();
    let target_count = (target * len as u64 / data_rate) as usize;
    let source_index = |i: usize| (i as u64 * data_rate / target) as usize;

    let mut harness = Harness::new(table);
    let mut runs = 0u32;

    let jitter = if data_rate > target {
        1 + (data_rate as usize - 1) / target as usize
    } else {
        0
    };
    for offset in 0..=jitter {
        log::debug!("nearest-sample run, offset {}", offset);
        harness.idle(LEAD_IN);
        for i in 0..target_count.saturating_sub(1) {
            let di = (source_index(i) + offset).min(len - 1);
            harness.step(trace.samples[di]);
        }
        harness.idle(LEAD_OUT);
        runs += 1;
        harness.end_run();
    }

    if data_rate / target > 1 {
        for threshold in AVERAGE_THRESHOLDS {
            log::debug!("averaging run, threshold {}%", threshold);
            harness.idle(LEAD_IN);
            let mut last_di = 0;
            for i in 0..target_count {
                let di = source_index(i).min(len - 1);
                let window = trace.samples[(last_di + 1).min(di)..di]
                    .iter()
                    .chain(std::iter::once(&trace.samples[di]));
                let (closed, count) =
                    window.fold((0u32, 0u32), |(closed, count), &s| (closed + s as u32, count + 1));
                last_di = di;
                harness.step(closed * 100 >= threshold * count);
            }
            harness.idle(LEAD_OUT);
            runs += 1;
            harness.end_run();
        }
    }

    log::debug!(
        "{} runs: {} presses, {} releases, {} expected",
        runs,
        harness.presses,
        harness.releases,
        trace.presses * runs
    );

    Outcome {
        issues: harness.issues,
        runs,
        presses: harness.presses,
        releases: harness.releases,
        expected_presses: trace.presses * runs,
    }
}
