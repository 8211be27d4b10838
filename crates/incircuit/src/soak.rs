//! Soak test: run the whole-board checks in random order until one fails.

use incircuit_common::{Error, Key};
use incircuit_game::Game;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::operation::Operation;

pub const SELECTIONS: [Operation; 8] = [
    Operation::RomCheckAll,
    Operation::RamCheckAll,
    Operation::RamCheckAllRandomAccess,
    Operation::RamCheckAllChipSelect,
    Operation::InterruptCheck,
    Operation::RamWriteAllAddress,
    Operation::RamWriteAllLow,
    Operation::RamWriteAllHigh,
];

#[derive(Debug, PartialEq)]
pub struct SoakReport {
    /// Passes started, the failing one included.
    pub passes: u64,
    pub failure: Option<(Operation, Error)>,
}

/// The first selection gets two of the `n + 1` draws.
pub fn pick<R: Rng>(rng: &mut R) -> Operation {
    let mut selection = rng.gen_range(0..=SELECTIONS.len());
    if selection != 0 {
        selection -= 1;
    }
    SELECTIONS[selection]
}

/// Run random selections until one fails or `limit` passes have run.
pub fn soak(game: &mut dyn Game, limit: Option<u64>) -> SoakReport {
    let mut rng = StdRng::seed_from_u64(0);
    let mut pass = 1u64;
    loop {
        if limit.is_some_and(|limit| pass > limit) {
            return SoakReport {
                passes: pass - 1,
                failure: None,
            };
        }

        let operation = pick(&mut rng);
        log::debug!("* {} {}", pass, operation.label());
        let result = operation.run(game, Key::Select);

        // The checks reseed their own streams, so without this the soak could
        // lock onto one selection.
        rng = StdRng::seed_from_u64(pass);

        if let Err(error) = result {
            log::warn!("Soak failed on pass {} at {}: {}", pass, operation.label(), error);
            return SoakReport {
                passes: pass,
                failure: Some((operation, error)),
            };
        }
        pass += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use incircuit_common::{Result, Status};

    use super::*;

    /// Counts the selections it is asked to run and fails the `fail_on`th.
    #[derive(Default)]
    struct Counting {
        runs: u64,
        fail_on: Option<u64>,
        seen: HashMap<&'static str, u64>,
    }

    impl Counting {
        fn note(&mut self, name: &'static str) -> Result<Status> {
            self.runs += 1;
            *self.seen.entry(name).or_default() += 1;
            if self.fail_on == Some(self.runs) {
                return Err(Error::Unexpected);
            }
            Ok(Status::Ok)
        }
    }

    impl Game for Counting {
        fn bus_idle(&mut self) -> Result<Status> {
            Ok(Status::Ok)
        }
        fn bus_check(&mut self) -> Result<Status> {
            Ok(Status::Ok)
        }
        fn rom_check_all(&mut self) -> Result<Status> {
            self.note("rom")
        }
        fn ram_check_all(&mut self) -> Result<Status> {
            self.note("ram")
        }
        fn ram_check_all_chip_select(&mut self) -> Result<Status> {
            self.note("cs")
        }
        fn ram_check_all_random_access(&mut self) -> Result<Status> {
            self.note("ra")
        }
        fn interrupt_check(&mut self) -> Result<Status> {
            self.note("int")
        }
        fn input_read(&mut self, _key: Key) -> Result<Status> {
            unreachable!()
        }
        fn output_write(&mut self, _key: Key) -> Result<Status> {
            unreachable!()
        }
        fn rom_check(&mut self, _key: Key) -> Result<Status> {
            unreachable!()
        }
        fn rom_crc(&mut self, _key: Key) -> Result<Status> {
            unreachable!()
        }
        fn rom_read(&mut self, _key: Key) -> Result<Status> {
            unreachable!()
        }
        fn ram_check(&mut self, _key: Key) -> Result<Status> {
            unreachable!()
        }
        fn ram_check_random_access(&mut self, _key: Key) -> Result<Status> {
            unreachable!()
        }
        fn ram_check_address(&mut self, _key: Key) -> Result<Status> {
            unreachable!()
        }
        fn ram_write_read(&mut self, _key: Key) -> Result<Status> {
            unreachable!()
        }
        fn rom_read_all(&mut self) -> Result<Status> {
            unreachable!()
        }
        fn ram_write_all_address(&mut self) -> Result<Status> {
            self.note("ad")
        }
        fn ram_write_all_low(&mut self) -> Result<Status> {
            self.note("lo")
        }
        fn ram_write_all_high(&mut self) -> Result<Status> {
            self.note("hi")
        }
        fn ram_read_all(&mut self) -> Result<Status> {
            unreachable!()
        }
        fn custom(&mut self, _key: Key) -> Result<Status> {
            unreachable!()
        }
    }

    #[test]
    fn first_selection_is_favoured() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut counts = HashMap::new();
        for _ in 0..9000 {
            *counts.entry(pick(&mut rng)).or_insert(0u32) += 1;
        }
        assert_eq!(counts.len(), SELECTIONS.len());
        let first = counts[&Operation::RomCheckAll];
        let second = counts[&Operation::RamCheckAll];
        assert!(first > second + second / 2, "{} vs {}", first, second);
    }

    #[test]
    fn runs_to_the_limit_without_failures() {
        let mut game = Counting::default();
        let report = soak(&mut game, Some(200));
        assert_eq!(
            report,
            SoakReport {
                passes: 200,
                failure: None
            }
        );
        assert_eq!(game.runs, 200);
        // Reseeding per pass keeps every selection in play.
        assert_eq!(game.seen.len(), SELECTIONS.len());
    }

    #[test]
    fn stops_on_the_first_failure() {
        let mut game = Counting {
            fail_on: Some(37),
            ..Counting::default()
        };
        let report = soak(&mut game, None);
        assert_eq!(report.passes, 37);
        assert!(matches!(report.failure, Some((_, Error::Unexpected))));
        assert_eq!(game.runs, 37);
    }

    #[test]
    fn same_stream_every_time() {
        let mut first = Counting::default();
        let mut second = Counting::default();
        soak(&mut first, Some(50));
        soak(&mut second, Some(50));
        assert_eq!(first.seen, second.seen);
    }
}
