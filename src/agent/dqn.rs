use log::{debug, info, warn};
use ndarray::{Array1, Array2, ArrayView1};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::{Path, PathBuf};

use crate::approximator::QFunction;
use crate::config::{AgentConfig, DecaySchedule};
use crate::error::{DqnError, Result};
use crate::network::NeuralNetwork;
use crate::optimizer::OptimizerWrapper;
use crate::policy::EpsilonGreedy;
use crate::replay_buffer::{ReplayBuffer, Transition};
use crate::target::TargetNetwork;

/// Largest value of a row, or NaN if the row holds one.
fn max_value(values: ArrayView1<f32>) -> f32 {
    values.iter().fold(f32::NEG_INFINITY, |best, &v| {
        if best.is_nan() || v.is_nan() {
            f32::NAN
        } else {
            best.max(v)
        }
    })
}

/// Deep Q-Network agent with experience replay and a periodically synced target network.
///
/// # Example
///
/// ```rust
/// use deepq::agent::DqnAgent;
/// use deepq::config::AgentConfig;
/// use ndarray::array;
///
/// let config = AgentConfig { seed: Some(7), ..AgentConfig::tictactoe() };
/// let mut agent = DqnAgent::from_config(2, 3, &config).unwrap();
///
/// // legal moves come from the environment
/// let state = array![0.0, 1.0];
/// let action = agent.select_action(state.view(), Some(&[0, 2])).unwrap();
/// assert!(action == 0 || action == 2);
///
/// agent.remember(state, action, 1.0, array![1.0, 1.0], true).unwrap();
/// let loss = agent.train_step().unwrap();
/// assert!(loss.is_finite());
/// ```
pub struct DqnAgent<M: QFunction = NeuralNetwork> {
    online: M,
    target: TargetNetwork<M>,
    buffer: ReplayBuffer,
    policy: EpsilonGreedy,
    gamma: f32,
    batch_size: usize,
    decay_schedule: DecaySchedule,
    train_steps: usize,
    skipped_updates: usize,
    rng: StdRng,
}

impl DqnAgent<NeuralNetwork> {
    /// Build an agent around a fresh ReLU network shaped by `config.hidden_layers` and
    /// initialised with `config.weight_init`.
    pub fn from_config(state_size: usize, action_size: usize, config: &AgentConfig) -> Result<Self> {
        Self::from_config_with_optimizer(state_size, action_size, config, OptimizerWrapper::default())
    }

    pub fn from_config_with_optimizer(
        state_size: usize,
        action_size: usize,
        config: &AgentConfig,
        optimizer: OptimizerWrapper,
    ) -> Result<Self> {
        config.validate()?;
        let mut rng = seeded_rng(config.seed);
        let network = NeuralNetwork::q_network(
            state_size,
            &config.hidden_layers,
            action_size,
            config.weight_init,
            optimizer,
            &mut rng,
        )?
        .with_learning_rate(config.learning_rate);
        Self::assemble(network, config, rng)
    }
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

impl<M: QFunction> DqnAgent<M> {
    /// Wrap an existing approximator. The target network starts as a snapshot of it.
    pub fn new(online: M, config: &AgentConfig) -> Result<Self> {
        config.validate()?;
        Self::assemble(online, config, seeded_rng(config.seed))
    }

    fn assemble(online: M, config: &AgentConfig, rng: StdRng) -> Result<Self> {
        if online.num_actions() == 0 {
            return Err(DqnError::invalid_parameter("model", "model must produce at least one action value"));
        }
        let target = TargetNetwork::new(&online, config.max_tau);
        Ok(DqnAgent {
            online,
            target,
            buffer: ReplayBuffer::with_capacity(config.buffer_capacity)?,
            policy: EpsilonGreedy::new(config.epsilon, config.epsilon_min, config.epsilon_decay),
            gamma: config.gamma,
            batch_size: config.batch_size,
            decay_schedule: config.decay_schedule,
            train_steps: 0,
            skipped_updates: 0,
            rng,
        })
    }

    pub fn num_actions(&self) -> usize {
        self.online.num_actions()
    }

    fn check_action(&self, action: usize) -> Result<()> {
        let max_actions = self.num_actions();
        if action >= max_actions {
            return Err(DqnError::InvalidAction { action, max_actions });
        }
        Ok(())
    }

    /// Epsilon-greedy action for `state`, restricted to `legal` when the environment masks moves.
    ///
    /// The model is only evaluated when the policy exploits.
    pub fn select_action(&mut self, state: ArrayView1<f32>, legal: Option<&[usize]>) -> Result<usize> {
        if let Some(legal) = legal {
            for &action in legal {
                self.check_action(action)?;
            }
        }

        if self.policy.explore(&mut self.rng) {
            self.policy.random_action(self.num_actions(), legal, &mut self.rng)
        } else {
            let q_values = self.online.predict_one(state)?;
            self.policy.greedy_action(q_values.view(), legal)
        }
    }

    /// Action values of the online model for one state.
    pub fn q_values(&self, state: ArrayView1<f32>) -> Result<Array1<f32>> {
        self.online.predict_one(state)
    }

    /// Number of features the online model expects per state
    pub fn state_size(&self) -> usize {
        self.online.input_size()
    }

    /// Store a transition for later replay.
    ///
    /// Transitions the model could never be trained on are rejected instead of buffered.
    pub fn store(&mut self, transition: Transition) -> Result<()> {
        self.check_action(transition.action)?;
        if transition.state.len() != self.state_size() {
            return Err(DqnError::dimension_mismatch(
                format!("state of length {}", self.state_size()),
                format!("{}", transition.state.len()),
            ));
        }
        if transition.state.len() != transition.next_state.len() {
            return Err(DqnError::dimension_mismatch(
                format!("next_state of length {}", transition.state.len()),
                format!("{}", transition.next_state.len()),
            ));
        }
        self.buffer.store(transition);
        Ok(())
    }

    pub fn remember(
        &mut self,
        state: Array1<f32>,
        action: usize,
        reward: f32,
        next_state: Array1<f32>,
        done: bool,
    ) -> Result<()> {
        self.store(Transition::new(state, action, reward, next_state, done))
    }

    /// Inputs and regression targets for one minibatch.
    ///
    /// Each target row is the online model's current prediction for the state, with only the
    /// taken action replaced by `reward + gamma * max_a target(next_state)[a]`. Terminal
    /// transitions bootstrap from zero.
    pub fn compute_targets(&self, batch: &[&Transition]) -> Result<(Array2<f32>, Array2<f32>)> {
        let state_size = match batch.first() {
            Some(first) => first.state.len(),
            None => return Ok((Array2::zeros((0, 0)), Array2::zeros((0, self.num_actions())))),
        };

        let mut states = Array2::zeros((batch.len(), state_size));
        let mut next_states = Array2::zeros((batch.len(), state_size));
        for (i, transition) in batch.iter().enumerate() {
            if transition.state.len() != state_size || transition.next_state.len() != state_size {
                return Err(DqnError::dimension_mismatch(
                    format!("states of length {}", state_size),
                    format!("{} / {}", transition.state.len(), transition.next_state.len()),
                ));
            }
            states.row_mut(i).assign(&transition.state);
            next_states.row_mut(i).assign(&transition.next_state);
        }

        let mut targets = self.online.predict(states.view())?;
        let next_values = self.target.predict(next_states.view())?;

        for (i, transition) in batch.iter().enumerate() {
            let bootstrap = if transition.done {
                0.0
            } else {
                max_value(next_values.row(i))
            };
            targets[[i, transition.action]] = transition.reward + self.gamma * bootstrap;
        }

        Ok((states, targets))
    }

    /// One DQN update: advance the target counter, replay a minibatch and take one gradient
    /// step on the online model.
    ///
    /// Returns the reported loss, or `0.0` when nothing was trained (empty buffer or a batch
    /// whose targets are not finite).
    pub fn train_step(&mut self) -> Result<f32> {
        self.target.tick(&self.online);

        if self.buffer.is_empty() {
            debug!("replay buffer is empty, skipping training step");
            return Ok(0.0);
        }

        let batch = self.buffer.sample(self.batch_size, &mut self.rng);
        let (states, targets) = self.compute_targets(&batch)?;

        if targets.iter().any(|v| !v.is_finite()) {
            self.skipped_updates += 1;
            warn!(
                "skipping update with non-finite targets (skipped {} so far)",
                self.skipped_updates
            );
            return Ok(0.0);
        }

        let loss = self.online.fit(states.view(), targets.view())?;
        self.train_steps += 1;
        if !loss.is_finite() {
            warn!("training step {} reported a non-finite loss", self.train_steps);
        }

        if self.decay_schedule == DecaySchedule::PerTrainStep {
            self.policy.decay();
        }

        Ok(loss)
    }

    /// Episode boundary hook. Decays exploration under the per-episode schedule.
    pub fn end_episode(&mut self) {
        if self.decay_schedule == DecaySchedule::PerEpisode {
            self.policy.decay();
        }
    }

    /// Copy the online parameters into the target network now.
    pub fn sync_target(&mut self) {
        self.target.sync(&self.online);
    }

    pub fn save_model<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.online.save(path.as_ref())
    }

    /// Replace the online model with one loaded from `path`.
    ///
    /// A loaded model is assumed to be trained, so exploration drops to `epsilon_min` and the
    /// target is resynced. A missing, unreadable or incompatible file keeps the current model
    /// and returns `false`.
    pub fn load_model<P: AsRef<Path>>(&mut self, path: P) -> bool {
        let path = path.as_ref();
        match M::load(path) {
            Ok(model) if model.num_actions() == self.num_actions() && model.input_size() == self.state_size() => {
                info!("loaded model from {}", path.display());
                self.online = model;
                self.target.sync(&self.online);
                self.policy.force_min();
                true
            }
            Ok(model) => {
                info!(
                    "model at {} maps {} inputs to {} actions, expected {} to {}; keeping a fresh model",
                    path.display(),
                    model.input_size(),
                    model.num_actions(),
                    self.state_size(),
                    self.num_actions()
                );
                false
            }
            Err(err) => {
                info!("could not load model from {} ({}); keeping a fresh model", path.display(), err);
                false
            }
        }
    }

    pub fn epsilon(&self) -> f32 {
        self.policy.epsilon
    }

    pub fn policy(&self) -> &EpsilonGreedy {
        &self.policy
    }

    pub fn policy_mut(&mut self) -> &mut EpsilonGreedy {
        &mut self.policy
    }

    pub fn gamma(&self) -> f32 {
        self.gamma
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn online(&self) -> &M {
        &self.online
    }

    /// Direct access to the online model, e.g. to seed weights in tests.
    pub fn online_mut(&mut self) -> &mut M {
        &mut self.online
    }

    pub fn target(&self) -> &TargetNetwork<M> {
        &self.target
    }

    pub fn buffer(&self) -> &ReplayBuffer {
        &self.buffer
    }

    /// Number of gradient steps taken
    pub fn train_steps(&self) -> usize {
        self.train_steps
    }

    pub fn skipped_updates(&self) -> usize {
        self.skipped_updates
    }
}

/// Builder pattern for a [`DqnAgent`] backed by [`NeuralNetwork`]
pub struct DqnAgentBuilder {
    state_size: Option<usize>,
    action_size: Option<usize>,
    config: AgentConfig,
    optimizer: Option<OptimizerWrapper>,
    model: Option<NeuralNetwork>,
    load_path: Option<PathBuf>,
}

impl DqnAgentBuilder {
    pub fn new() -> Self {
        DqnAgentBuilder {
            state_size: None,
            action_size: None,
            config: AgentConfig::default(),
            optimizer: None,
            model: None,
            load_path: None,
        }
    }

    pub fn state_size(mut self, size: usize) -> Self {
        self.state_size = Some(size);
        self
    }

    pub fn action_size(mut self, size: usize) -> Self {
        self.action_size = Some(size);
        self
    }

    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn epsilon(mut self, epsilon: f32) -> Self {
        self.config.epsilon = epsilon;
        self
    }

    pub fn gamma(mut self, gamma: f32) -> Self {
        self.config.gamma = gamma;
        self
    }

    pub fn max_tau(mut self, max_tau: usize) -> Self {
        self.config.max_tau = max_tau;
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    pub fn hidden_layers(mut self, hidden_layers: &[usize]) -> Self {
        self.config.hidden_layers = hidden_layers.to_vec();
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    pub fn optimizer(mut self, optimizer: OptimizerWrapper) -> Self {
        self.optimizer = Some(optimizer);
        self
    }

    /// Start from an existing network instead of a freshly initialised one.
    pub fn model(mut self, model: NeuralNetwork) -> Self {
        self.model = Some(model);
        self
    }

    /// Try to start from a saved model; falls back to a fresh one when it cannot be read.
    pub fn load_weights<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.load_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<DqnAgent> {
        if let Some(model) = self.model {
            if let Some(state_size) = self.state_size {
                if state_size != model.input_size() {
                    return Err(DqnError::dimension_mismatch(
                        format!("model input of size {}", state_size),
                        format!("{}", model.input_size()),
                    ));
                }
            }
            if let Some(action_size) = self.action_size {
                if action_size != model.output_size() {
                    return Err(DqnError::dimension_mismatch(
                        format!("model output of size {}", action_size),
                        format!("{}", model.output_size()),
                    ));
                }
            }
            let mut agent = DqnAgent::new(model, &self.config)?;
            if let Some(path) = self.load_path {
                agent.load_model(path);
            }
            return Ok(agent);
        }

        let state_size = self.state_size.ok_or_else(|| {
            DqnError::invalid_parameter("state_size", "state size must be specified")
        })?;
        let action_size = self.action_size.ok_or_else(|| {
            DqnError::invalid_parameter("action_size", "action size must be specified")
        })?;

        let optimizer = self.optimizer.unwrap_or_default();
        let mut agent = DqnAgent::from_config_with_optimizer(state_size, action_size, &self.config, optimizer)?;
        if let Some(path) = self.load_path {
            agent.load_model(path);
        }
        Ok(agent)
    }
}

impl Default for DqnAgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}
