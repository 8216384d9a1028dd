//! Episode metrics for the learning agent

use std::collections::VecDeque;

use tracing::info;

/// Moving average over the most recent `window_size` values
#[derive(Debug, Clone)]
pub struct MovingAverage {
    values: VecDeque<f64>,
    window_size: usize,
    sum: f64,
}

impl MovingAverage {
    pub fn new(window_size: usize) -> Self {
        let window_size = window_size.max(1);
        Self {
            values: VecDeque::with_capacity(window_size),
            window_size,
            sum: 0.0,
        }
    }

    pub fn push(&mut self, value: f64) {
        if self.values.len() >= self.window_size
            && let Some(old) = self.values.pop_front()
        {
            self.sum -= old;
        }
        self.values.push_back(value);
        self.sum += value;
    }

    pub fn average(&self) -> f64 {
        if self.values.is_empty() {
            0.0
        } else {
            self.sum / self.values.len() as f64
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Outcome of a finished episode, read from the sign of the terminal reward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeOutcome {
    Win,
    Loss,
    Tie,
}

impl EpisodeOutcome {
    pub fn from_reward(reward: f64) -> Self {
        if reward > 0.0 {
            EpisodeOutcome::Win
        } else if reward < 0.0 {
            EpisodeOutcome::Loss
        } else {
            EpisodeOutcome::Tie
        }
    }
}

#[derive(Debug, Clone)]
pub struct EpisodeMetrics {
    /// Terminal rewards
    pub rewards: MovingAverage,
    /// Ticks per episode
    pub lengths: MovingAverage,
    /// 1.0 per win, 0.0 otherwise
    pub win_rate: MovingAverage,
    pub episodes: usize,
    pub wins: usize,
    pub losses: usize,
    pub ties: usize,
}

impl EpisodeMetrics {
    pub fn new(window_size: usize) -> Self {
        Self {
            rewards: MovingAverage::new(window_size),
            lengths: MovingAverage::new(window_size),
            win_rate: MovingAverage::new(window_size),
            episodes: 0,
            wins: 0,
            losses: 0,
            ties: 0,
        }
    }

    pub fn record_episode(&mut self, reward: f64, ticks: usize) -> EpisodeOutcome {
        let outcome = EpisodeOutcome::from_reward(reward);
        self.episodes += 1;
        match outcome {
            EpisodeOutcome::Win => self.wins += 1,
            EpisodeOutcome::Loss => self.losses += 1,
            EpisodeOutcome::Tie => self.ties += 1,
        }

        self.rewards.push(reward);
        self.lengths.push(ticks as f64);
        self.win_rate
            .push(if outcome == EpisodeOutcome::Win { 1.0 } else { 0.0 });
        outcome
    }

    pub fn log_summary(&self) {
        info!(
            "Episode {} | W/L/T {}/{}/{} | reward={:.2}, length={:.1}, win rate={:.1}%",
            self.episodes,
            self.wins,
            self.losses,
            self.ties,
            self.rewards.average(),
            self.lengths.average(),
            self.win_rate.average() * 100.0
        );
    }
}

impl Default for EpisodeMetrics {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moving_average_window() {
        let mut avg = MovingAverage::new(3);
        assert_eq!(avg.average(), 0.0);

        for v in [1.0, 2.0, 3.0, 10.0] {
            avg.push(v);
        }
        assert_eq!(avg.len(), 3);
        assert!((avg.average() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_record_episode_outcomes() {
        let mut metrics = EpisodeMetrics::new(10);
        assert_eq!(metrics.record_episode(1.0, 100), EpisodeOutcome::Win);
        assert_eq!(metrics.record_episode(-1.0, 300), EpisodeOutcome::Loss);
        assert_eq!(metrics.record_episode(0.0, 200), EpisodeOutcome::Tie);
        assert_eq!(metrics.record_episode(1.0, 200), EpisodeOutcome::Win);

        assert_eq!(metrics.episodes, 4);
        assert_eq!((metrics.wins, metrics.losses, metrics.ties), (2, 1, 1));
        assert!((metrics.win_rate.average() - 0.5).abs() < 1e-12);
        assert!((metrics.lengths.average() - 200.0).abs() < 1e-12);
    }
}
