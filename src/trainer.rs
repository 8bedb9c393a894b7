//! Episode loop around a [`LearningAgent`].
//!
//! The trainer owns the exploration schedule, the trailing score window and
//! the exploration RNG. Each episode runs the select / step / record cycle
//! until the environment reports done or the step limit is hit, then decays
//! epsilon once and checks the solved criterion.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Serialize, Deserialize};

use crate::agent::LearningAgent;
use crate::checkpoint;
use crate::config::TrainerConfig;
use crate::env::Environment;
use crate::error::Result;
use crate::metrics::{MetricsTracker, ScoreWindow};
use crate::replay_buffer::Transition;

/// Exponential epsilon decay with a floor: `eps = max(eps_min, eps * decay)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpsilonSchedule {
    epsilon: f32,
    min: f32,
    decay: f32,
}

impl EpsilonSchedule {
    pub fn new(start: f32, min: f32, decay: f32) -> Self {
        EpsilonSchedule {
            epsilon: start.min(1.0).max(min),
            min,
            decay,
        }
    }

    /// Current exploration rate
    pub fn value(&self) -> f32 {
        self.epsilon
    }

    /// Apply one decay step and return the new value
    pub fn step(&mut self) -> f32 {
        self.epsilon = (self.epsilon * self.decay).max(self.min);
        self.epsilon
    }
}

/// Outcome of a single episode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeSummary {
    pub score: f32,
    pub steps: usize,
    pub learn_steps: usize,
}

/// Outcome of [`Trainer::train`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    /// Episodes run
    pub episodes: usize,
    pub solved: bool,
    /// Trailing-window mean score after the last episode
    pub final_average: f32,
    /// Epsilon after the last decay
    pub epsilon: f32,
    pub total_steps: usize,
    /// Score of every episode, in order
    pub scores: Vec<f32>,
}

pub struct Trainer {
    config: TrainerConfig,
    schedule: EpsilonSchedule,
    window: ScoreWindow,
    tracker: MetricsTracker,
    rng: StdRng,
}

impl Trainer {
    pub fn new(config: TrainerConfig) -> Result<Self> {
        config.validate()?;
        let schedule = EpsilonSchedule::new(config.epsilon_start, config.epsilon_min, config.epsilon_decay);
        let window = ScoreWindow::new(config.solved_window);
        let rng = StdRng::seed_from_u64(config.seed);
        Ok(Trainer {
            config,
            schedule,
            window,
            tracker: MetricsTracker::default(),
            rng,
        })
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    pub fn epsilon(&self) -> f32 {
        self.schedule.value()
    }

    pub fn metrics(&self) -> &MetricsTracker {
        &self.tracker
    }

    /// Trailing mean score over the solved window
    pub fn average_score(&self) -> Option<f32> {
        self.window.mean()
    }

    /// Play one episode with the current epsilon, feeding every transition to the agent.
    pub fn run_episode<A, E>(&mut self, agent: &mut A, env: &mut E) -> Result<EpisodeSummary>
    where
        A: LearningAgent,
        E: Environment,
    {
        let epsilon = self.schedule.value();
        let (mut state, _info) = env.reset()?;
        self.tracker.start_episode();
        let mut learn_steps = 0;

        for _ in 0..self.config.max_steps_per_episode {
            let action = agent.select_action(state.view(), epsilon, &mut self.rng)?;
            let step = env.step(action)?;
            let done = step.done();
            self.tracker.step(step.reward);

            let transition = Transition::new(state, action, step.reward, step.observation.clone(), done);
            if let Some(report) = agent.record_and_maybe_learn(transition)? {
                self.tracker.record_learning(report.loss, report.mean_q);
                learn_steps += 1;
            }

            state = step.observation;
            if done {
                break;
            }
        }

        let steps = self.tracker.current_episode_length();
        let score = self.tracker.end_episode(epsilon);
        Ok(EpisodeSummary {
            score,
            steps,
            learn_steps,
        })
    }

    /// Run episodes until the trailing mean reaches the solved threshold or
    /// `max_episodes` is exhausted.
    ///
    /// When solved and a checkpoint path is configured, the agent's
    /// parameters are written there before returning.
    pub fn train<A, E>(&mut self, agent: &mut A, env: &mut E) -> Result<TrainingReport>
    where
        A: LearningAgent,
        E: Environment,
    {
        let mut scores = Vec::new();
        let mut solved = false;

        for episode in 1..=self.config.max_episodes {
            let summary = self.run_episode(agent, env)?;
            scores.push(summary.score);
            self.window.push(summary.score);
            self.schedule.step();

            let average = self.window.mean().unwrap_or(summary.score);
            debug!(
                "episode {}: score={:.2} steps={} learn_steps={} average={:.2} epsilon={:.3}",
                episode, summary.score, summary.steps, summary.learn_steps, average, self.schedule.value()
            );
            if self.config.log_every > 0 && episode % self.config.log_every == 0 {
                info!("Episode {}\tAverage Score: {:.2}", episode, average);
            }

            if average >= self.config.solved_threshold {
                info!("Environment solved in {} episodes! Average Score: {:.2}", episode, average);
                if let Some(path) = &self.config.checkpoint_path {
                    checkpoint::save(path, &agent.checkpoint())?;
                }
                solved = true;
                break;
            }
        }

        Ok(TrainingReport {
            episodes: scores.len(),
            solved,
            final_average: self.window.mean().unwrap_or(0.0),
            epsilon: self.schedule.value(),
            total_steps: self.tracker.total_steps(),
            scores,
        })
    }
}

/// Greedy rollouts of `agent`, returning the score of each episode.
pub fn evaluate<A, E>(agent: &A, env: &mut E, episodes: usize, max_steps: usize) -> Result<Vec<f32>>
where
    A: LearningAgent,
    E: Environment,
{
    // epsilon is zero, so this rng never influences the chosen actions
    let mut rng = StdRng::seed_from_u64(0);
    let mut scores = Vec::with_capacity(episodes);

    for _ in 0..episodes {
        let (mut state, _info) = env.reset()?;
        let mut score = 0.0;
        for _ in 0..max_steps {
            let action = agent.select_action(state.view(), 0.0, &mut rng)?;
            let step = env.step(action)?;
            score += step.reward;
            let done = step.done();
            state = step.observation;
            if done {
                break;
            }
        }
        scores.push(score);
    }
    Ok(scores)
}
