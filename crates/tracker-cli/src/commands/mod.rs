pub mod config;
pub mod habit;
pub mod remind;

use std::time::Duration;

use tracker_core::{Config, HabitDb, StreakEngine};

/// Everything a command needs to talk to the store.
pub struct Context {
    pub config: Config,
    pub db: HabitDb,
    pub engine: StreakEngine,
    pub user_id: String,
}

impl Context {
    pub fn open(user: Option<String>) -> Result<Self, Box<dyn std::error::Error>> {
        let config = Config::load()?;
        config.validate()?;
        let timeout: Duration = config.store.timeout();
        let db = HabitDb::open(timeout)?;
        let engine = StreakEngine::from_config(&config.engine);
        let user_id = user.unwrap_or_else(|| config.user.id.clone());
        tracing::debug!(%user_id, "opened habit store");
        Ok(Self {
            config,
            db,
            engine,
            user_id,
        })
    }
}
