use deepq::{
    agent::{DqnAgent, DqnAgentBuilder},
    approximator::QFunction,
    config::{AgentConfig, TrainerConfig},
    environment::{Environment, RandomOpponent, Step},
    error::{DqnError, Result},
    metrics::{CsvMetricsWriter, EpisodeSummary, MetricsSink, MetricsTracker},
    network::NeuralNetwork,
    runner::Trainer,
};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use std::path::Path;

/// Walk right along a line of cells; reaching the end pays 1.
struct Corridor {
    length: usize,
    position: usize,
    steps: usize,
    fail_at: Option<usize>,
    closed: bool,
}

impl Corridor {
    fn new(length: usize) -> Self {
        Corridor {
            length,
            position: 0,
            steps: 0,
            fail_at: None,
            closed: false,
        }
    }

    fn observation(&self) -> Array1<f32> {
        let mut obs = Array1::zeros(self.length);
        obs[self.position] = 1.0;
        obs
    }
}

impl Environment for Corridor {
    fn observation_size(&self) -> usize {
        self.length
    }

    fn action_count(&self) -> usize {
        2
    }

    fn reset(&mut self) -> Result<Array1<f32>> {
        self.position = 0;
        Ok(self.observation())
    }

    fn step(&mut self, action: usize) -> Result<Step> {
        self.steps += 1;
        if Some(self.steps) == self.fail_at {
            return Err(DqnError::environment("simulator crashed"));
        }
        if action == 1 {
            self.position = (self.position + 1).min(self.length - 1);
        } else {
            self.position = self.position.saturating_sub(1);
        }
        let done = self.position == self.length - 1;
        Ok(Step::new(self.observation(), if done { 1.0 } else { -0.01 }, done))
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

/// Two seats alternate filling a row of cells; the game ends when the row is full.
/// Every move pays its mover 0.5, and the move that fills the row also wins 1 from the
/// other seat.
struct FillTheRow {
    cells: Array1<f32>,
    turn: usize,
    moves_by_seat: [usize; 2],
}

impl FillTheRow {
    fn new() -> Self {
        FillTheRow {
            cells: Array1::zeros(6),
            turn: 0,
            moves_by_seat: [0, 0],
        }
    }
}

impl Environment for FillTheRow {
    fn observation_size(&self) -> usize {
        6
    }

    fn action_count(&self) -> usize {
        6
    }

    fn reset(&mut self) -> Result<Array1<f32>> {
        self.cells.fill(0.0);
        self.turn = 0;
        Ok(self.cells.clone())
    }

    fn step(&mut self, action: usize) -> Result<Step> {
        if self.cells[action] != 0.0 {
            return Err(DqnError::environment(format!("cell {} is taken", action)));
        }
        let mover = self.turn;
        self.cells[action] = if mover == 0 { 1.0 } else { -1.0 };
        self.moves_by_seat[mover] += 1;
        self.turn = 1 - mover;
        let done = self.cells.iter().all(|&c| c != 0.0);

        let mut rewards = vec![0.0; 2];
        rewards[mover] += 0.5;
        if done {
            rewards[mover] += 1.0;
            rewards[1 - mover] -= 1.0;
        }
        Ok(Step::per_player(self.cells.clone(), rewards, done))
    }

    fn legal_actions(&self, state: ArrayView1<f32>) -> Vec<usize> {
        (0..6).filter(|&i| state[i] == 0.0).collect()
    }

    fn current_player(&self) -> usize {
        self.turn
    }

    fn num_players(&self) -> usize {
        2
    }
}

#[derive(Default)]
struct RecordingSink {
    summaries: Vec<EpisodeSummary>,
    flushed: bool,
}

impl MetricsSink for RecordingSink {
    fn record(&mut self, summary: &EpisodeSummary) -> Result<()> {
        self.summaries.push(summary.clone());
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.flushed = true;
        Ok(())
    }
}

fn init_logging() {
    deepq::logging::init_test_logging();
}

fn trainer_config(dir: &Path, episodes: usize) -> TrainerConfig {
    TrainerConfig {
        max_episodes: episodes,
        max_steps: 50,
        model_dir: dir.to_path_buf(),
        run_id: "test".to_string(),
        ..TrainerConfig::default()
    }
}

fn agent_config() -> AgentConfig {
    AgentConfig {
        batch_size: 8,
        learning_rate: 0.01,
        max_tau: 20,
        seed: Some(21),
        ..AgentConfig::tictactoe()
    }
}

#[test]
fn test_end_to_end_training() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let mut env = Corridor::new(5);
    let mut agent = DqnAgent::from_config(5, 2, &agent_config()).unwrap();
    let mut sink = RecordingSink::default();

    let mut trainer = Trainer::new(trainer_config(dir.path(), 5)).unwrap();
    let report = trainer.run(&mut agent, &mut env, &mut sink).unwrap();

    assert_eq!(report.episodes, 5);
    assert_eq!(sink.summaries.len(), 5);
    assert!(sink.flushed);
    assert!(env.closed);
    assert_eq!(report.train_errors, 0);
    assert_eq!(agent.buffer().len(), report.total_steps);
    assert!(sink.summaries.iter().all(|s| s.loss.is_finite() && s.steps > 0));

    let model_path = report.model_path.unwrap();
    assert_eq!(model_path, dir.path().join("model_test.bin"));
    assert!(NeuralNetwork::load(&model_path).is_ok());

    // epsilon only goes down across episodes
    let epsilons: Vec<f32> = sink.summaries.iter().map(|s| s.epsilon).collect();
    assert!(epsilons.windows(2).all(|w| w[1] <= w[0]));

    let mut seen = Vec::new();
    for summary in &sink.summaries {
        seen.push(summary.reward(0));
        let mean = seen.iter().sum::<f32>() / seen.len() as f32;
        assert!((summary.reward_average(0).unwrap() - mean).abs() < 1e-4);
    }
}

#[test]
fn test_environment_failure_still_saves_and_closes() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let mut env = Corridor::new(5);
    env.fail_at = Some(3);
    let mut agent = DqnAgent::from_config(5, 2, &agent_config()).unwrap();
    let mut sink = RecordingSink::default();

    let mut trainer = Trainer::new(trainer_config(dir.path(), 5)).unwrap();
    let result = trainer.run(&mut agent, &mut env, &mut sink);

    assert!(matches!(result, Err(DqnError::Environment(_))));
    assert!(env.closed);
    assert!(sink.flushed);
    assert!(dir.path().join("model_test.bin").exists());
    assert_eq!(agent.buffer().len(), 2);
}

#[test]
fn test_turn_based_only_learns_its_own_moves() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let mut env = FillTheRow::new();
    let mut agent = DqnAgentBuilder::new()
        .state_size(6)
        .action_size(6)
        .config(agent_config())
        .build()
        .unwrap();
    let mut tracker = MetricsTracker::default();

    let mut trainer = Trainer::new(trainer_config(dir.path(), 4))
        .unwrap()
        .with_opponent(Box::new(RandomOpponent::seeded(8)));
    let report = trainer.run(&mut agent, &mut env, &mut tracker).unwrap();

    assert_eq!(report.episodes, 4);
    assert_eq!(report.total_steps, 24);
    assert_eq!(agent.buffer().len(), 12);
    assert_eq!(agent.train_steps(), 12);
    assert_eq!(env.moves_by_seat, [12, 12]);
    assert!(agent.buffer().iter().all(|t| t.state.iter().filter(|&&c| c != 0.0).count() % 2 == 0));
    // the learner never makes the final move, so it only stores its own move rewards
    assert!(agent.buffer().iter().all(|t| t.reward == 0.5 && !t.done));

    // seat 1 always fills the row, which costs seat 0 one point
    assert_eq!(tracker.avg_episode_reward(0, 100), Some(0.5));
    assert_eq!(tracker.avg_episode_reward(1, 100), Some(2.5));
}

#[test]
fn test_turn_based_without_opponent_aborts() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let mut env = FillTheRow::new();
    let mut agent = DqnAgent::from_config(6, 6, &agent_config()).unwrap();
    let mut sink = RecordingSink::default();

    let mut trainer = Trainer::new(trainer_config(dir.path(), 2)).unwrap();
    let result = trainer.run(&mut agent, &mut env, &mut sink);

    assert!(result.is_err());
    assert_eq!(agent.buffer().len(), 1);
    assert!(sink.flushed);
}

/// Predicts zeros and refuses every update.
#[derive(Clone)]
struct BrokenFit;

impl QFunction for BrokenFit {
    fn input_size(&self) -> usize {
        3
    }

    fn num_actions(&self) -> usize {
        2
    }

    fn predict(&self, states: ArrayView2<f32>) -> Result<Array2<f32>> {
        Ok(Array2::zeros((states.nrows(), 2)))
    }

    fn fit(&mut self, _states: ArrayView2<f32>, _targets: ArrayView2<f32>) -> Result<f32> {
        Err(DqnError::NumericalError("gradient exploded".to_string()))
    }

    fn save(&self, _path: &Path) -> Result<()> {
        Ok(())
    }

    fn load(path: &Path) -> Result<Self> {
        Err(DqnError::environment(format!("nothing stored at {}", path.display())))
    }
}

#[test]
fn test_training_errors_are_counted_not_fatal() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let mut env = Corridor::new(3);
    let mut agent = DqnAgent::new(BrokenFit, &agent_config()).unwrap();
    let mut sink = RecordingSink::default();

    let mut trainer = Trainer::new(TrainerConfig {
        max_steps: 4,
        ..trainer_config(dir.path(), 3)
    })
    .unwrap();
    let report = trainer.run(&mut agent, &mut env, &mut sink).unwrap();

    assert_eq!(report.episodes, 3);
    assert_eq!(report.train_errors, report.total_steps);
    assert_eq!(agent.train_steps(), 0);
}

#[test]
fn test_csv_sink_in_a_run() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let mut env = Corridor::new(4);
    let mut agent = DqnAgent::from_config(4, 2, &agent_config()).unwrap();
    let mut sink = CsvMetricsWriter::new(dir.path().join("logs"), "csv-run").unwrap();

    let mut trainer = Trainer::new(trainer_config(dir.path(), 2)).unwrap();
    trainer.run(&mut agent, &mut env, &mut sink).unwrap();

    let contents = std::fs::read_to_string(dir.path().join("logs").join("csv-run").join("scalars.csv")).unwrap();
    assert!(contents.lines().any(|line| line.starts_with("1,loss,")));
    assert!(contents.lines().any(|line| line.starts_with("1,reward_avg/player_0,")));
}
