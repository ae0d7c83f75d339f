use anyhow::{bail, Context, Result};
use keyscanner_debounce::{Bank, Debouncer, LifecycleTable, PhaseId};

/// Expand a run-length pattern such as `0x100 1x50 0x100` into samples.
///
/// Each token is a sample (`0` or `1`), optionally followed by `xN`. A bare
/// token of several digits, like `0011`, is taken literally.
pub fn parse_pattern(pattern: &str) -> Result<Vec<bool>> {
    let mut samples = Vec::new();

    for token in pattern.split(|c: char| c.is_whitespace() || c == ',') {
        if token.is_empty() {
            continue;
        }
        match token.split_once(['x', '*']) {
            Some((level, count)) => {
                let level = match level {
                    "0" => false,
                    "1" => true,
                    _ => bail!("bad sample {:?} in {:?}", level, token),
                };
                let count: usize = count
                    .parse()
                    .with_context(|| format!("bad repeat count in {:?}", token))?;
                samples.extend(std::iter::repeat(level).take(count));
            }
            None => {
                for ch in token.chars() {
                    match ch {
                        '0' => samples.push(false),
                        '1' => samples.push(true),
                        _ => bail!("bad sample {:?} in {:?}", ch, token),
                    }
                }
            }
        }
    }

    if samples.is_empty() {
        bail!("empty pattern");
    }
    Ok(samples)
}

/// A debounced-state change seen on key 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Change {
    /// 1-based sample position.
    pub sample: usize,
    pub pressed: bool,
}

/// One sample's worth of key 0 state, for verbose output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub input: bool,
    pub phase: PhaseId,
    pub ticks_remaining: u8,
    pub state: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Simulation {
    pub changes: Vec<Change>,
    pub steps: Vec<Step>,
}

impl Simulation {
    pub fn presses(&self) -> usize {
        self.changes.iter().filter(|c| c.pressed).count()
    }

    pub fn releases(&self) -> usize {
        self.changes.len() - self.presses()
    }
}

/// Feed `samples` to key 0 of a fresh bank.
pub fn simulate(table: &LifecycleTable, samples: &[bool]) -> Simulation {
    let debouncer = Debouncer::new(table);
    let mut bank = Bank::new();
    let mut sim = Simulation::default();

    for (n, &input) in samples.iter().enumerate() {
        let changes = debouncer.process_sample(input as u8, &mut bank);
        let pressed = bank.state() & 1 != 0;
        if changes & 1 != 0 {
            sim.changes.push(Change {
                sample: n + 1,
                pressed,
            });
        }
        let key = bank.keys()[0];
        sim.steps.push(Step {
            input,
            phase: key.phase(),
            ticks_remaining: key.ticks_remaining(),
            state: pressed,
        });
    }

    sim
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyscanner_debounce::MINIMAL;

    #[test]
    fn test_parse_pattern() {
        let samples = parse_pattern("0x2 1*3, 01").unwrap();
        assert_eq!(samples, [false, false, true, true, true, false, true]);
    }

    #[test]
    fn test_parse_pattern_errors() {
        assert!(parse_pattern("").is_err());
        assert!(parse_pattern("2x4").is_err());
        assert!(parse_pattern("1xlots").is_err());
        assert!(parse_pattern("0102").is_err());
    }

    #[test]
    fn test_simulate_press_and_release() {
        let samples = parse_pattern("0x100 1x50 0x100").unwrap();
        let sim = simulate(&MINIMAL, &samples);
        assert_eq!(
            sim.changes,
            [
                Change {
                    sample: 102,
                    pressed: true
                },
                Change {
                    sample: 167,
                    pressed: false
                },
            ]
        );
        assert_eq!(sim.presses(), 1);
        assert_eq!(sim.releases(), 1);
        assert_eq!(sim.steps.len(), 250);
        assert_eq!(sim.steps[101].phase, PhaseId::LockedOn);
        assert_eq!(sim.steps[101].ticks_remaining, 10);
        assert!(sim.steps[101].state);
    }
}
