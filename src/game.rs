use std::time::Instant;

use tracing::{info, warn};

use crate::infra::Environment;
use crate::rl::{ExecutionContext, SparseAgent};

/// Ticks slower than this are reported
const SLOW_TICK_MS: u128 = 100;

/// Plays episodes of an environment with one agent
pub struct Game<E: Environment> {
    environment: E,
    agent: SparseAgent,
}

impl<E: Environment> Game<E> {
    pub fn new(environment: E, agent: SparseAgent) -> Self {
        Self { environment, agent }
    }

    pub fn agent(&self) -> &SparseAgent {
        &self.agent
    }

    pub fn environment(&self) -> &E {
        &self.environment
    }

    pub fn run(&mut self, episodes: usize) -> Result<(), E::Error> {
        for episode in 1..=episodes {
            let reward = self.run_episode(episode)?;
            info!("Episode {}/{} ended with reward {}", episode, episodes, reward);
        }
        Ok(())
    }

    /// Play one episode to its last step; returns the terminal reward
    pub fn run_episode(&mut self, episode: usize) -> Result<f64, E::Error> {
        self.agent.start_episode(episode);
        let mut ctx = ExecutionContext::new();
        let mut obs = self.environment.reset()?;
        let mut tick = 0usize;

        loop {
            let tick_start = Instant::now();
            let primitive = self.agent.step(&mut ctx, &obs);
            if obs.is_last() {
                return Ok(obs.reward);
            }

            obs = self.environment.step(&primitive)?;
            tick += 1;

            let tick_duration = tick_start.elapsed();
            if tick_duration.as_millis() > SLOW_TICK_MS {
                warn!(
                    "Tick {} took {:.2}ms (primitive: {})",
                    tick,
                    tick_duration.as_secs_f64() * 1000.0,
                    primitive
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AgentConfig;
    use crate::infra::NullObserver;
    use crate::rl::{GzipFileStore, MemoryStore, TableStore};
    use crate::sim::{ScriptedEnvironment, SimConfig};
    use crate::state::TerranCatalog;
    use tempfile::TempDir;

    fn config(seed: u64) -> AgentConfig {
        AgentConfig {
            seed: Some(seed),
            episode_ticks: 120,
            ..AgentConfig::default()
        }
    }

    fn game(config: &AgentConfig, store: Box<dyn TableStore>) -> Game<ScriptedEnvironment> {
        let environment = ScriptedEnvironment::new(SimConfig {
            episode_ticks: config.episode_ticks,
            minimap_size: config.minimap_size,
            seed: config.seed,
        });
        let agent = SparseAgent::new(config, Box::new(TerranCatalog::new()), store)
            .with_observer(NullObserver);
        Game::new(environment, agent)
    }

    #[test]
    fn test_every_episode_terminates_and_is_recorded() {
        let config = config(7);
        let mut game = game(&config, Box::new(MemoryStore::new()));

        game.run(3).unwrap();

        let metrics = game.agent().metrics();
        assert_eq!(metrics.episodes, 3);
        assert_eq!(metrics.wins + metrics.losses + metrics.ties, 3);
        assert!(!game.agent().table().is_empty());
        assert!(game.environment().tick() <= config.episode_ticks);
    }

    #[test]
    fn test_table_survives_restart() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sparse_agent_data.gz");
        let config = config(11);

        let mut first = game(&config, Box::new(GzipFileStore::new(&path)));
        first.run(2).unwrap();
        let learned = first.agent().table().clone();
        assert!(path.exists());

        let second = game(&config, Box::new(GzipFileStore::new(&path)));
        assert_eq!(second.agent().table().data(), learned.data());
    }
}
