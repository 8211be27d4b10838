pub mod operation;
pub mod registry;
pub mod session;
pub mod soak;

use anyhow::{bail, Context, Result};
use incircuit_common::Key;

pub use operation::Operation;
pub use registry::{GameEntry, GAMES};
pub use session::Session;

/// What to do once a game is selected.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Step {
    Run(Operation, Key),
    /// Soak test, optionally bounded to a number of passes.
    Soak(Option<u64>),
}

/// Checks run when no steps are given.
pub const DEFAULT_STEPS: [Step; 4] = [
    Step::Run(Operation::BusCheck, Key::Select),
    Step::Run(Operation::RomCheckAll, Key::Select),
    Step::Run(Operation::RamCheckAll, Key::Select),
    Step::Run(Operation::InterruptCheck, Key::Select),
];

pub fn parse_step(s: &str) -> Result<Step> {
    match s.split_once(':') {
        Some(("soak", passes)) => {
            let passes = passes
                .parse()
                .with_context(|| format!("bad soak pass count '{}'", passes))?;
            Ok(Step::Soak(Some(passes)))
        }
        None if s == "soak" => Ok(Step::Soak(None)),
        _ => {
            let (operation, key) = operation::parse_step(s)?;
            Ok(Step::Run(operation, key))
        }
    }
}

/// Select `game` and run `steps` in order, printing each display. Returns
/// whether every step passed.
pub fn run(game: &str, steps: &[Step]) -> Result<bool> {
    let mut session = Session::new();
    session.select(game)?;

    let mut passed = true;
    for step in steps {
        match *step {
            Step::Run(operation, key) => {
                let result = session.dispatch(operation, key)?;
                passed &= result.is_ok();
                println!("{:<16} | {}", operation.label(), session::display_line(&result));
            }
            Step::Soak(limit) => {
                let report = session.soak(limit)?;
                match report.failure {
                    Some((operation, error)) => {
                        passed = false;
                        println!("{:<16} | {}", operation.label(), error.description());
                        println!("* {}", report.passes);
                    }
                    None => println!("{:<16} | OK: {} passes", "Soak Test", report.passes),
                }
            }
        }
    }
    Ok(passed)
}

/// `incircuit <game> [step]...`
pub fn run_args(args: &[String]) -> Result<bool> {
    let Some((game, rest)) = args.split_first() else {
        bail!("no game given");
    };
    let steps = if rest.is_empty() {
        DEFAULT_STEPS.to_vec()
    } else {
        rest.iter()
            .map(|s| parse_step(s))
            .collect::<Result<Vec<_>>>()?
    };
    run(game, &steps)
}
