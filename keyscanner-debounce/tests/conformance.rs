//! Behavioural checks that hold for every preset table.

use keyscanner_debounce::{
    Bank, Debouncer, KeyRuntime, LifecycleTable, PhaseId, TableVariant, CHATTER_DEFENSE, MINIMAL,
};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Feeds a run of identical samples to key 0 and returns the 1-based
/// positions within the run where the debounced bit flipped.
fn feed(debouncer: &Debouncer<'_>, bank: &mut Bank, sample: bool, count: usize) -> Vec<usize> {
    (1..=count)
        .filter(|_| debouncer.process_sample(sample as u8, bank) & 1 != 0)
        .collect()
}

/// A random trace for key 0, biased towards long runs like a real switch.
fn random_trace(rng: &mut SmallRng, len: usize) -> Vec<bool> {
    let mut level = false;
    let flip = rng.gen_range(0.02..0.4);
    (0..len)
        .map(|_| {
            if rng.gen_bool(flip) {
                level = !level;
            }
            level
        })
        .collect()
}

#[test]
fn test_scenario_press_and_release() {
    let debouncer = Debouncer::new(&MINIMAL);
    let mut bank = Bank::new();

    assert!(feed(&debouncer, &mut bank, false, 100).is_empty());

    let mut presses = Vec::new();
    for n in 1..=50 {
        if debouncer.process_sample(1, &mut bank) != 0 {
            presses.push(n);
        }
        if n == 11 {
            assert_eq!(bank.keys()[0].phase(), PhaseId::LockedOn);
        }
        if n == 12 {
            // The lock window has run out: contrary samples count from here.
            assert_eq!(bank.keys()[0].phase(), PhaseId::On);
        }
    }
    assert_eq!(presses, [2]);
    assert_eq!(bank.state(), 1);

    assert_eq!(feed(&debouncer, &mut bank, false, 100), [17]);
    assert_eq!(bank.state(), 0);
}

#[test]
fn test_scenario_single_sample_glitch() {
    for variant in TableVariant::ALL {
        let debouncer = Debouncer::new(variant.table());
        let mut bank = Bank::new();

        assert!(feed(&debouncer, &mut bank, false, 20).is_empty());
        assert!(feed(&debouncer, &mut bank, true, 1).is_empty());
        assert_eq!(bank.keys()[0].phase(), PhaseId::TurningOn);
        assert!(feed(&debouncer, &mut bank, false, 20).is_empty());
        assert_eq!(bank.keys()[0].phase(), PhaseId::Off);
        assert_eq!(bank.state(), 0);
    }
}

#[test]
fn test_constant_input_settles() {
    // Starting anywhere, a long constant input ends in a stable phase
    // reporting that input.
    for variant in TableVariant::ALL {
        let table = variant.table();
        let debouncer = Debouncer::new(table);
        let mut rng = SmallRng::seed_from_u64(7);

        for _ in 0..200 {
            let mut bank = Bank::new();
            for sample in random_trace(&mut rng, 64) {
                debouncer.process_sample(sample as u8, &mut bank);
            }
            let last = rng.gen_bool(0.5);
            feed(&debouncer, &mut bank, last, 400);

            let key = bank.keys()[0];
            assert!(table.phase(key.phase()).is_stable(), "{} in {}", variant, key.phase());
            assert_eq!(bank.state() & 1 != 0, last);

            // And stays there.
            assert!(feed(&debouncer, &mut bank, last, 50).is_empty());
            assert_eq!(bank.keys()[0].phase(), key.phase());
        }
    }
}

#[test]
fn test_presses_and_releases_balance() {
    for variant in TableVariant::ALL {
        let table = variant.table();
        let debouncer = Debouncer::new(table);
        let mut rng = SmallRng::seed_from_u64(0x5eed);

        for _ in 0..100 {
            let mut bank = Bank::new();
            let (mut presses, mut releases) = (0u32, 0u32);

            let mut trace = random_trace(&mut rng, 2000);
            trace.extend(core::iter::repeat(false).take(300));

            for sample in trace {
                if debouncer.process_sample(sample as u8, &mut bank) & 1 != 0 {
                    if bank.state() & 1 != 0 {
                        presses += 1;
                    } else {
                        releases += 1;
                    }
                }
                // The reported bit always matches the level of the phase.
                assert_eq!(bank.state() & 1 != 0, table.level(bank.keys()[0].phase()));
            }

            assert_eq!(presses, releases, "{}", variant);
            assert_eq!(bank.state(), 0);
        }
    }
}

#[test]
fn test_countdown_is_monotonic() {
    for variant in TableVariant::ALL {
        let debouncer = Debouncer::new(variant.table());
        let mut rng = SmallRng::seed_from_u64(42);
        let mut bank = Bank::new();

        for sample in random_trace(&mut rng, 5000) {
            let before = bank.keys()[0];
            debouncer.process_sample(sample as u8, &mut bank);
            let after = bank.keys()[0];
            if after.phase() == before.phase() {
                assert_eq!(after.ticks_remaining(), before.ticks_remaining().saturating_sub(1));
            }
        }
    }
}

#[test]
fn test_isolated_glitches_never_report() {
    for variant in TableVariant::ALL {
        let debouncer = Debouncer::new(variant.table());
        let mut bank = Bank::new();

        // Single closed samples against an open switch.
        for _ in 0..20 {
            assert!(feed(&debouncer, &mut bank, true, 1).is_empty());
            assert!(feed(&debouncer, &mut bank, false, 3).is_empty());
        }

        // Single open samples against a held switch, once the lock is over.
        assert_eq!(feed(&debouncer, &mut bank, true, 200), [2]);
        for _ in 0..20 {
            assert!(feed(&debouncer, &mut bank, false, 1).is_empty());
            assert!(feed(&debouncer, &mut bank, true, 3).is_empty());
        }
        assert_eq!(bank.state(), 1);
    }
}

#[test]
fn test_noisy_track_round_trip() {
    let debouncer = Debouncer::new(&CHATTER_DEFENSE);
    let mut bank = Bank::new();

    feed(&debouncer, &mut bank, false, 100);
    assert_eq!(feed(&debouncer, &mut bank, true, 2), [2]);

    // Bounce inside the lock window: the key is reclassified, still pressed.
    assert!(feed(&debouncer, &mut bank, false, 1).is_empty());
    assert_eq!(bank.keys()[0].phase(), PhaseId::NoisyLockedOn);
    assert_eq!(bank.state(), 1);

    assert!(feed(&debouncer, &mut bank, true, 150).is_empty());
    assert_eq!(bank.keys()[0].phase(), PhaseId::NoisyOn);

    // A noisy release takes far longer than the primary one.
    assert_eq!(feed(&debouncer, &mut bank, false, 61), [60]);
    assert_eq!(bank.state(), 0);
    assert_eq!(bank.keys()[0].phase(), PhaseId::Off);

    // Back on the primary track, with primary timing.
    assert_eq!(feed(&debouncer, &mut bank, true, 20), [2]);
    assert_eq!(feed(&debouncer, &mut bank, false, 30), [17]);
    assert_eq!(bank.noisy_keys(), 0);
}

#[test]
fn test_bank_matches_per_key_runtime() {
    let mut rng = SmallRng::seed_from_u64(1234);

    for table in [&MINIMAL, &CHATTER_DEFENSE] {
        let debouncer = Debouncer::new(table);
        let mut bank = Bank::new();
        let mut keys = [KeyRuntime::new(); 8];
        let traces: Vec<Vec<bool>> = (0..8).map(|_| random_trace(&mut rng, 3000)).collect();

        for t in 0..3000 {
            let sample = (0..8).fold(0u8, |acc, i| acc | (traces[i][t] as u8) << i);
            let changes = debouncer.process_sample(sample, &mut bank);

            let mut expected = 0u8;
            for (i, key) in keys.iter_mut().enumerate() {
                let (next, flipped) = key.advance(table, traces[i][t]);
                *key = next;
                expected |= (flipped as u8) << i;
            }

            assert_eq!(changes, expected);
            assert_eq!(bank.keys(), &keys);
        }
    }
}

#[test]
fn test_presets_are_complete() {
    fn check(table: &LifecycleTable, len: usize) {
        assert_eq!(table.len(), len);
        assert!(table.contains(PhaseId::Off));
        assert!(!table.level(PhaseId::Off));
    }
    check(&MINIMAL, 6);
    check(&CHATTER_DEFENSE, 12);
    assert!(!MINIMAL.has_noisy_track());
    assert!(CHATTER_DEFENSE.has_noisy_track());
}
