//! Agent configuration, read from `SPARSE_*` environment variables

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::warn;

use crate::rl::QLearningParams;

pub const DEFAULT_DATA_FILE: &str = "sparse_agent_data.gz";

#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    pub learning_rate: f64,
    pub discount: f64,
    /// Probability of acting greedily
    pub epsilon: f64,
    pub data_file: PathBuf,
    /// Seed for every random choice the agent makes; `None` draws from the OS
    pub seed: Option<u64>,
    pub episodes: usize,
    /// Tick limit of a scripted episode
    pub episode_ticks: usize,
    /// Edge length of the square minimap, fixes the attack grid
    pub minimap_size: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        let params = QLearningParams::default();
        Self {
            learning_rate: params.learning_rate,
            discount: params.discount,
            epsilon: params.epsilon,
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            seed: None,
            episodes: 10,
            episode_ticks: 400,
            minimap_size: 64,
        }
    }
}

impl AgentConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup; unset keys keep their default
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            learning_rate: unit_var(&lookup, "SPARSE_LEARNING_RATE", defaults.learning_rate),
            discount: unit_var(&lookup, "SPARSE_DISCOUNT", defaults.discount),
            epsilon: unit_var(&lookup, "SPARSE_EPSILON", defaults.epsilon),
            data_file: lookup("SPARSE_DATA_FILE")
                .filter(|s| !s.is_empty())
                .map_or(defaults.data_file, PathBuf::from),
            seed: lookup("SPARSE_SEED").and_then(|raw| match raw.parse::<u64>() {
                Ok(seed) => Some(seed),
                Err(_) => {
                    warn!("Ignoring invalid SPARSE_SEED {:?}", raw);
                    None
                }
            }),
            episodes: parse_var(&lookup, "SPARSE_EPISODES", defaults.episodes),
            episode_ticks: parse_var(&lookup, "SPARSE_EPISODE_TICKS", defaults.episode_ticks),
            minimap_size: parse_var(&lookup, "SPARSE_MINIMAP_SIZE", defaults.minimap_size),
        }
    }

    pub fn q_learning(&self) -> QLearningParams {
        QLearningParams {
            learning_rate: self.learning_rate,
            discount: self.discount,
            epsilon: self.epsilon,
        }
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid {} {:?}, using default", key, raw);
            default
        }),
    }
}

/// A probability or rate in `[0, 1]`
fn unit_var(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: f64) -> f64 {
    let value = parse_var(lookup, key, default);
    if (0.0..=1.0).contains(&value) {
        value
    } else {
        warn!("{} = {} is outside [0, 1], using default", key, value);
        default
    }
}
