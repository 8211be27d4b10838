use anyhow::{anyhow, Context};
use incircuit_common::{Key, Result, Status};
use incircuit_game::Game;

use crate::operation::Operation;
use crate::registry::{self, GameEntry};
use crate::soak::{self, SoakReport};

/// The live game and what the menu is parked on.
#[derive(Default)]
pub struct Session {
    entry: Option<&'static GameEntry>,
    game: Option<Box<dyn Game>>,
    selection: Option<Operation>,
}

/// Second display line for a result.
pub fn display_line(result: &Result<Status>) -> String {
    match result {
        Ok(status) => status.description(),
        Err(error) => error.description(),
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn game_name(&self) -> Option<&'static str> {
        self.entry.map(|entry| entry.name)
    }

    /// Operation the menu was last left on.
    pub fn selection(&self) -> Option<Operation> {
        self.selection
    }

    /// Swap to another game. The previous one is idled and dropped first.
    pub fn select(&mut self, name: &str) -> anyhow::Result<()> {
        let entry = registry::find(name).ok_or_else(|| {
            anyhow!(
                "unknown game '{}'. Supported: {}",
                name,
                registry::names().join(", ")
            )
        })?;
        self.teardown();

        let mut game = (entry.create)().with_context(|| format!("building '{}'", entry.name))?;
        if let Err(error) = game.bus_idle() {
            log::warn!("{}: idle failed: {}", entry.name, error);
        }
        log::info!("Selected {} ({})", entry.name, entry.description);
        self.entry = Some(entry);
        self.game = Some(game);
        self.selection = None;
        Ok(())
    }

    pub fn teardown(&mut self) {
        if let Some(mut game) = self.game.take() {
            if let Err(error) = game.bus_idle() {
                log::warn!("idle on teardown failed: {}", error);
            }
            if let Some(entry) = self.entry.take() {
                log::info!("Released {}", entry.name);
            }
        }
        self.selection = None;
    }

    /// Run `operation` on the live game and log its display line.
    pub fn dispatch(&mut self, operation: Operation, key: Key) -> anyhow::Result<Result<Status>> {
        let game = self.game.as_mut().context("no game selected")?;
        self.selection = Some(operation);
        let result = operation.run(game.as_mut(), key);
        log::info!("{:<16} {:?} -> {}", operation.label(), key, display_line(&result));
        Ok(result)
    }

    /// Soak the live game. On failure the menu is left on the failing
    /// selection.
    pub fn soak(&mut self, limit: Option<u64>) -> anyhow::Result<SoakReport> {
        let game = self.game.as_mut().context("no game selected")?;
        let report = soak::soak(game.as_mut(), limit);
        if let Some((operation, _)) = &report.failure {
            self.selection = Some(*operation);
        }
        Ok(report)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.teardown();
    }
}
