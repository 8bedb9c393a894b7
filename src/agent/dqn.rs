use log::{debug, warn};
use ndarray::{Array1, Array2, ArrayView1, Zip};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;

use crate::checkpoint;
use crate::config::AgentConfig;
use crate::debug::{check_gradients, check_network, NumericalIssue};
use crate::device::Device;
use crate::error::{LanderError, Result};
use crate::loss::{Loss, MSE};
use crate::network::{argmax, hard_update, soft_update, Architecture, QNetwork, StateDict};
use crate::optimizer::{Optimizer, OptimizerWrapper};
use crate::replay_buffer::{Batch, ReplayBuffer, Transition};
use super::traits::{LearnReport, LearningAgent, ValueBasedAgent};

/// Deep Q-Network agent with a soft-updated target network.
///
/// The agent owns:
/// - the online network, trained by gradient descent on the TD error
/// - the target network, which follows the online one by Polyak averaging
///   with factor `tau` after every learning step
/// - the replay buffer and the optimizer state
/// - a step counter that runs a learning step every `update_period` recorded
///   transitions, once the buffer holds more than `minibatch_size` of them
///
/// # Example
///
/// ```rust
/// use lander::agent::DqnAgent;
/// use lander::config::AgentConfig;
/// use lander::replay_buffer::Transition;
/// use ndarray::array;
///
/// let config = AgentConfig { minibatch_size: 2, buffer_capacity: 16, ..AgentConfig::default() };
/// let mut agent = DqnAgent::builder(2, 3).config(config).build().unwrap();
///
/// for i in 0..8 {
///     let x = i as f32 / 8.0;
///     let transition = Transition::new(array![x, -x], i % 3, 1.0, array![x + 0.1, -x], false);
///     agent.record_and_maybe_learn(transition).unwrap();
/// }
/// // learning runs on the 4th and 8th transition
/// assert_eq!(agent.learn_steps(), 2);
/// ```
pub struct DqnAgent {
    online: QNetwork,
    target: QNetwork,
    memory: ReplayBuffer,
    optimizer: OptimizerWrapper,
    config: AgentConfig,
    /// Recorded transitions modulo `update_period`
    t_step: usize,
    learn_steps: usize,
    rng: StdRng,
}

impl DqnAgent {
    /// Start building an agent for `state_size` observations and `action_size` actions.
    pub fn builder(state_size: usize, action_size: usize) -> DqnAgentBuilder {
        DqnAgentBuilder::new(state_size, action_size)
    }

    /// Agent with the default configuration on the CPU.
    pub fn new(state_size: usize, action_size: usize) -> Result<Self> {
        Self::builder(state_size, action_size).build()
    }

    pub fn online(&self) -> &QNetwork {
        &self.online
    }

    pub fn target(&self) -> &QNetwork {
        &self.target
    }

    pub fn memory(&self) -> &ReplayBuffer {
        &self.memory
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn optimizer(&self) -> &OptimizerWrapper {
        &self.optimizer
    }

    pub fn state_size(&self) -> usize {
        self.online.state_size()
    }

    pub fn action_size(&self) -> usize {
        self.online.action_size()
    }

    /// Number of learning steps performed
    pub fn learn_steps(&self) -> usize {
        self.learn_steps
    }

    /// Position of the update counter within the current `update_period`
    pub fn t_step(&self) -> usize {
        self.t_step
    }

    fn check_observation(&self, observation: ArrayView1<f32>) -> Result<()> {
        if observation.len() != self.state_size() {
            return Err(LanderError::shape_mismatch(
                format!("observation of width {}", self.state_size()),
                format!("width {}", observation.len()),
            ));
        }
        Ok(())
    }

    fn check_action(&self, action: usize) -> Result<()> {
        if action >= self.action_size() {
            return Err(LanderError::InvalidAction {
                action,
                action_count: self.action_size(),
            });
        }
        Ok(())
    }

    /// Best action under the online network; ties go to the lowest index.
    pub fn greedy_action(&self, observation: ArrayView1<f32>) -> Result<usize> {
        let q_values = self.online.forward(observation)?;
        argmax(q_values.view())
    }

    /// Epsilon-greedy action selection.
    ///
    /// With probability `epsilon` a uniformly random action, otherwise the
    /// greedy one. The observation width is checked either way.
    pub fn select_action<R: Rng + ?Sized>(
        &self,
        observation: ArrayView1<f32>,
        epsilon: f32,
        rng: &mut R,
    ) -> Result<usize> {
        self.check_observation(observation)?;
        if rng.gen::<f32>() < epsilon {
            Ok(rng.gen_range(0..self.action_size()))
        } else {
            self.greedy_action(observation)
        }
    }

    /// Push a transition and run a learning step every `update_period` calls
    /// once the buffer holds more than `minibatch_size` transitions.
    pub fn record_and_maybe_learn(&mut self, transition: Transition) -> Result<Option<LearnReport>> {
        self.check_action(transition.action)?;
        self.memory.push(transition)?;

        self.t_step = (self.t_step + 1) % self.config.update_period;
        if self.t_step != 0 || self.memory.len() <= self.config.minibatch_size {
            return Ok(None);
        }

        let batch = self.memory.sample(self.config.minibatch_size, &mut self.rng)?;
        self.learn(&batch).map(Some)
    }

    /// Bootstrap targets `r + gamma * max_a target(s')[a]`, or just `r` for terminal rows.
    pub fn compute_targets(&self, batch: &Batch) -> Result<Array1<f32>> {
        let next_q = self.target.forward_batch(batch.next_states.view())?;
        if let Some((row, q)) = next_q
            .indexed_iter()
            .find(|(_, q)| !q.is_finite())
            .map(|((row, _), &q)| (row, q))
        {
            return Err(LanderError::NumericInstability(format!(
                "target action-value {} for next state in row {}",
                q, row
            )));
        }
        let gamma = self.config.discount_factor;

        let mut targets = Array1::<f32>::zeros(batch.len());
        Zip::from(&mut targets)
            .and(next_q.rows())
            .and(&batch.rewards)
            .and(&batch.dones)
            .for_each(|target, next, &reward, &done| {
                *target = if done > 0.5 {
                    reward
                } else {
                    let max_next = next.fold(f32::NEG_INFINITY, |m, &q| m.max(q));
                    reward + gamma * max_next
                };
            });
        Ok(targets)
    }

    /// One gradient step on the online network followed by a soft target update.
    ///
    /// The online network and optimizer are only replaced once the update is
    /// known to be finite, so a failed step leaves the agent unchanged.
    pub fn learn(&mut self, batch: &Batch) -> Result<LearnReport> {
        if batch.is_empty() {
            return Err(LanderError::InsufficientData { requested: 1, available: 0 });
        }
        for &action in batch.actions.iter() {
            self.check_action(action)?;
        }

        let targets = self.compute_targets(batch)?;

        let (q_values, caches) = self.online.forward_train(batch.states.view())?;
        let predictions: Array1<f32> = batch
            .actions
            .iter()
            .enumerate()
            .map(|(i, &a)| q_values[[i, a]])
            .collect();

        let loss = MSE.compute(predictions.view(), targets.view());
        if !loss.is_finite() {
            warn!("Non-finite loss {} at learning step {}", loss, self.learn_steps + 1);
            return Err(LanderError::NumericInstability(format!("loss is {}", loss)));
        }

        // only the taken action receives a gradient
        let loss_grad = MSE.gradient(predictions.view(), targets.view());
        let mut output_grad = Array2::<f32>::zeros(q_values.dim());
        for (i, &a) in batch.actions.iter().enumerate() {
            output_grad[[i, a]] = loss_grad[i];
        }
        let gradients = self.online.backward(&caches, output_grad.view())?;
        let issues = check_gradients(&gradients);
        if issues.iter().any(|issue| !matches!(issue, NumericalIssue::Overflow { .. })) {
            return Err(LanderError::NumericInstability(format!("gradients: {:?}", issues)));
        }

        let mut online = self.online.clone();
        let mut optimizer = self.optimizer.clone();
        optimizer.step(&mut online, &gradients, self.config.learning_rate)?;
        if !online.is_finite() {
            let issues = check_network(&online);
            return Err(LanderError::NumericInstability(format!("parameters: {:?}", issues)));
        }
        self.online = online;
        self.optimizer = optimizer;

        soft_update(&mut self.target, &self.online, self.config.tau)?;
        self.learn_steps += 1;

        let mean_q = predictions.mean().unwrap_or(0.0);
        debug!("learn step {}: loss={:.5} mean_q={:.4}", self.learn_steps, loss, mean_q);

        Ok(LearnReport {
            loss,
            mean_q,
            step: self.learn_steps,
        })
    }

    /// Parameters of the online network.
    pub fn state_dict(&self) -> StateDict {
        self.online.state_dict()
    }

    /// Write the online network parameters to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        checkpoint::save(path, &self.online.state_dict())
    }

    /// Overwrite the online network and copy it into the target network.
    pub fn load_state_dict(&mut self, state_dict: &StateDict) -> Result<()> {
        self.online.load_state_dict(state_dict)?;
        hard_update(&mut self.target, &self.online)
    }

    /// Restore the online network from `path` and copy it into the target network.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let state_dict = checkpoint::load(path)?;
        self.load_state_dict(&state_dict)
    }
}

impl LearningAgent for DqnAgent {
    fn select_action<R: Rng + ?Sized>(&self, observation: ArrayView1<f32>, epsilon: f32, rng: &mut R) -> Result<usize> {
        DqnAgent::select_action(self, observation, epsilon, rng)
    }

    fn record_and_maybe_learn(&mut self, transition: Transition) -> Result<Option<LearnReport>> {
        DqnAgent::record_and_maybe_learn(self, transition)
    }

    fn checkpoint(&self) -> StateDict {
        self.state_dict()
    }
}

impl ValueBasedAgent for DqnAgent {
    fn q_values(&self, observation: ArrayView1<f32>) -> Result<Array1<f32>> {
        self.online.forward(observation)
    }
}

/// Builder pattern for DqnAgent
pub struct DqnAgentBuilder {
    state_size: usize,
    action_size: usize,
    config: AgentConfig,
    device: Device,
}

impl DqnAgentBuilder {
    pub fn new(state_size: usize, action_size: usize) -> Self {
        DqnAgentBuilder {
            state_size,
            action_size,
            config: AgentConfig::default(),
            device: Device::default(),
        }
    }

    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn build(self) -> Result<DqnAgent> {
        self.config.validate()?;
        let architecture = Architecture::new(self.state_size, self.action_size, &self.config.hidden_sizes)?
            .with_weight_init(self.config.weight_init)?;

        // both networks start from the same seeded draw
        let online = architecture.build(self.device, &mut StdRng::seed_from_u64(self.config.seed));
        let target = architecture.build(self.device, &mut StdRng::seed_from_u64(self.config.seed));
        let optimizer = self.config.optimizer.build(&online);
        let memory = ReplayBuffer::new(self.config.buffer_capacity, self.state_size)?;
        let rng = StdRng::seed_from_u64(self.config.seed.wrapping_add(1));

        debug!(
            "built DQN agent: layers={:?} params={} device={}",
            architecture.layer_sizes(),
            online.num_parameters(),
            self.device
        );

        Ok(DqnAgent {
            online,
            target,
            memory,
            optimizer,
            config: self.config,
            t_step: 0,
            learn_steps: 0,
            rng,
        })
    }
}
