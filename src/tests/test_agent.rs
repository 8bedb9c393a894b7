use ndarray::{array, Array1, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::agent::{DqnAgent, LearningAgent, ValueBasedAgent};
use crate::config::AgentConfig;
use crate::error::LanderError;
use crate::layers::WeightInit;
use crate::optimizer::OptimizerWrapper;
use crate::replay_buffer::{Batch, Transition};

fn small_config() -> AgentConfig {
    AgentConfig {
        minibatch_size: 4,
        buffer_capacity: 64,
        ..AgentConfig::default()
    }
}

fn transition(i: usize, done: bool) -> Transition {
    let x = i as f32 * 0.1;
    Transition::new(array![x, -x, 0.5 * x], i % 3, 1.0 - x, array![x + 0.05, -x, 0.5 * x], done)
}

fn agent(config: AgentConfig) -> DqnAgent {
    DqnAgent::builder(3, 3).config(config).build().unwrap()
}

#[test]
fn test_dqn_builder() {
    let agent = DqnAgent::builder(8, 4).seed(7).build().unwrap();
    assert_eq!(agent.state_size(), 8);
    assert_eq!(agent.action_size(), 4);
    assert_eq!(agent.config().seed, 7);
    assert_eq!(agent.online().layers.len(), 3);
    assert_eq!(agent.memory().capacity(), 100_000);
    assert!(matches!(agent.optimizer(), OptimizerWrapper::Adam(_)));
    assert_eq!(agent.learn_steps(), 0);
}

#[test]
fn test_builder_rejects_invalid_config() {
    let config = AgentConfig {
        minibatch_size: 64,
        buffer_capacity: 64,
        ..AgentConfig::default()
    };
    assert!(matches!(
        DqnAgent::builder(8, 4).config(config).build(),
        Err(LanderError::InvalidParameter { .. })
    ));
    assert!(DqnAgent::new(0, 4).is_err());
}

#[test]
fn test_weight_init_from_config() {
    let config = AgentConfig {
        weight_init: WeightInit::Zeros,
        ..small_config()
    };
    let zeros = agent(config);
    assert!(zeros.online().layers.iter().all(|l| l.weights.iter().all(|&w| w == 0.0)));
    assert!(zeros.online().layers.iter().all(|l| l.biases.iter().all(|&b| b == 0.0)));
    assert_eq!(zeros.online(), zeros.target());

    let config = AgentConfig {
        weight_init: WeightInit::HeUniform,
        ..small_config()
    };
    let he = agent(config);
    let fan_in_default = agent(small_config());
    assert_ne!(he.state_dict(), fan_in_default.state_dict());
    assert!(he.online().layers.iter().all(|l| l.biases.iter().all(|&b| b == 0.0)));

    let config = AgentConfig {
        weight_init: WeightInit::Uniform { min: 0.3, max: f32::NAN },
        ..small_config()
    };
    assert!(matches!(
        DqnAgent::builder(3, 3).config(config).build(),
        Err(LanderError::InvalidParameter { .. })
    ));
}

#[test]
fn test_target_starts_equal_to_online() {
    let agent = DqnAgent::new(8, 4).unwrap();
    assert_eq!(agent.online().state_dict(), agent.target().state_dict());
}

/// Zero the output weights and set the output biases, so Q(s, .) == biases for every s.
fn flatten_output(agent: &mut DqnAgent, biases: &[f32]) {
    let mut state = agent.state_dict();
    let weight = state.get_mut("fc3.weight").unwrap();
    weight.data.iter_mut().for_each(|w| *w = 0.0);
    state.get_mut("fc3.bias").unwrap().data = biases.to_vec();
    agent.load_state_dict(&state).unwrap();
}

#[test]
fn test_greedy_selection_breaks_ties_low() {
    let mut agent = agent(small_config());
    flatten_output(&mut agent, &[0.5, 0.5, 0.5]);

    let mut rng = StdRng::seed_from_u64(0);
    for _ in 0..20 {
        let action = agent.select_action(array![0.3, 0.1, -0.2].view(), 0.0, &mut rng).unwrap();
        assert_eq!(action, 0);
    }

    flatten_output(&mut agent, &[0.5, 0.7, 0.7]);
    let action = agent.select_action(array![0.3, 0.1, -0.2].view(), 0.0, &mut rng).unwrap();
    assert_eq!(action, 1);
}

#[test]
fn test_greedy_matches_argmax_of_q_values() {
    let agent = DqnAgent::new(8, 4).unwrap();
    let mut rng = StdRng::seed_from_u64(1);
    let obs = Array1::linspace(-1.0, 1.0, 8);
    let q = agent.q_values(obs.view()).unwrap();
    let greedy = agent.select_action(obs.view(), 0.0, &mut rng).unwrap();
    assert!(q.iter().all(|&v| v <= q[greedy]));
    assert_eq!(agent.state_value(obs.view()).unwrap(), q[greedy]);
}

#[test]
fn test_random_selection_is_roughly_uniform() {
    let agent = DqnAgent::new(8, 4).unwrap();
    let mut rng = StdRng::seed_from_u64(2);
    let obs = Array1::zeros(8);
    let mut counts = [0usize; 4];
    for _ in 0..4000 {
        let action = agent.select_action(obs.view(), 1.0, &mut rng).unwrap();
        counts[action] += 1;
    }
    for &count in &counts {
        assert!(count > 850 && count < 1150, "counts {:?}", counts);
    }
}

#[test]
fn test_select_action_checks_width() {
    let agent = DqnAgent::new(8, 4).unwrap();
    let mut rng = StdRng::seed_from_u64(0);
    let result = agent.select_action(Array1::zeros(3).view(), 1.0, &mut rng);
    assert!(matches!(result, Err(LanderError::ShapeMismatch { .. })));
}

#[test]
fn test_learning_is_gated() {
    let mut agent = agent(small_config());

    // the buffer must hold more than minibatch_size transitions
    for i in 0..4 {
        assert!(agent.record_and_maybe_learn(transition(i, false)).unwrap().is_none());
    }
    assert_eq!(agent.t_step(), 0);
    assert_eq!(agent.learn_steps(), 0);

    let mut learned_at = Vec::new();
    for i in 4..16 {
        if agent.record_and_maybe_learn(transition(i, false)).unwrap().is_some() {
            learned_at.push(i + 1);
        }
    }
    assert_eq!(learned_at, vec![8, 12, 16]);
    assert_eq!(agent.learn_steps(), 3);
    assert_eq!(agent.memory().len(), 16);
}

#[test]
fn test_record_rejects_invalid_action() {
    let mut agent = agent(small_config());
    let bad = Transition::new(array![0.0, 0.0, 0.0], 3, 0.0, array![0.0, 0.0, 0.0], false);
    assert!(matches!(
        agent.record_and_maybe_learn(bad),
        Err(LanderError::InvalidAction { action: 3, action_count: 3 })
    ));
    assert!(agent.memory().is_empty());
    assert_eq!(agent.t_step(), 0);
}

#[test]
fn test_terminal_target_is_reward() {
    let agent = agent(small_config());
    let terminal = Transition::new(array![0.1, 0.2, 0.3], 0, -3.5, array![5.0, -5.0, 5.0], true);
    let running = Transition::new(array![0.1, 0.2, 0.3], 1, -3.5, array![5.0, -5.0, 5.0], false);
    let batch = Batch::from_transitions(&[&terminal, &running]).unwrap();
    let targets = agent.compute_targets(&batch).unwrap();

    assert_eq!(targets[0], -3.5);
    let next_q = agent.target().forward(array![5.0, -5.0, 5.0].view()).unwrap();
    let max_next = next_q.fold(f32::NEG_INFINITY, |m, &q| m.max(q));
    assert!((targets[1] - (-3.5 + 0.99 * max_next)).abs() < 1e-5);
}

#[test]
fn test_non_finite_next_value_is_reported() {
    let mut poisoned = agent(small_config());
    // one NaN action-value next to finite ones, which a plain max would skip
    flatten_output(&mut poisoned, &[0.5, f32::NAN, 0.25]);
    let batch = Batch::from_transitions(&[&transition(1, false), &transition(2, false)]).unwrap();
    assert!(matches!(poisoned.compute_targets(&batch), Err(LanderError::NumericInstability(_))));

    let online = poisoned.online().clone();
    assert!(matches!(poisoned.learn(&batch), Err(LanderError::NumericInstability(_))));
    assert_eq!(poisoned.online(), &online);
    assert_eq!(poisoned.learn_steps(), 0);

    let nan_state = Transition::new(array![0.1, 0.2, 0.3], 0, 1.0, array![f32::NAN, 0.0, 0.0], false);
    let clean = agent(small_config());
    let batch = Batch::from_transitions(&[&nan_state]).unwrap();
    assert!(matches!(clean.compute_targets(&batch), Err(LanderError::NumericInstability(_))));
    assert_eq!(clean.learn_steps(), 0);
}

#[test]
fn test_learn_reduces_loss_on_fixed_batch() {
    let mut config = small_config();
    config.learning_rate = 1e-2;
    let mut agent = agent(config);
    let transitions: Vec<Transition> = (0..8).map(|i| transition(i, true)).collect();
    let refs: Vec<&Transition> = transitions.iter().collect();
    let batch = Batch::from_transitions(&refs).unwrap();

    let first = agent.learn(&batch).unwrap();
    let mut last = first;
    for _ in 0..50 {
        last = agent.learn(&batch).unwrap();
    }
    assert!(last.loss < first.loss, "{} -> {}", first.loss, last.loss);
    assert_eq!(last.step, 51);
    match agent.optimizer() {
        OptimizerWrapper::Adam(adam) => assert_eq!(adam.t, 51),
        other => panic!("unexpected optimizer {:?}", other),
    }
}

#[test]
fn test_target_trails_online() {
    let mut agent = agent(small_config());
    let transitions: Vec<Transition> = (0..8).map(|i| transition(i, i % 2 == 0)).collect();
    let refs: Vec<&Transition> = transitions.iter().collect();
    let batch = Batch::from_transitions(&refs).unwrap();

    let target_before = agent.target().clone();
    agent.learn(&batch).unwrap();
    let tau = agent.config().tau;

    assert_ne!(agent.online().state_dict(), target_before.state_dict());
    for ((after, before), online) in agent
        .target()
        .layers
        .iter()
        .zip(&target_before.layers)
        .zip(&agent.online().layers)
    {
        for ((&ta, &tb), &o) in after.weights.iter().zip(before.weights.iter()).zip(online.weights.iter()) {
            assert!((ta - tb).abs() <= tau * (o - tb).abs() + 1e-6);
        }
        for ((&ta, &tb), &o) in after.biases.iter().zip(before.biases.iter()).zip(online.biases.iter()) {
            assert!((ta - tb).abs() <= tau * (o - tb).abs() + 1e-6);
        }
    }
}

#[test]
fn test_non_finite_batch_leaves_agent_unchanged() {
    let mut agent = agent(small_config());
    let poisoned = Transition::new(array![0.1, 0.2, 0.3], 0, f32::NAN, array![0.1, 0.2, 0.3], false);
    let clean = transition(1, false);
    let batch = Batch::from_transitions(&[&poisoned, &clean]).unwrap();

    let online = agent.online().clone();
    let target = agent.target().clone();
    assert!(matches!(agent.learn(&batch), Err(LanderError::NumericInstability(_))));
    assert_eq!(agent.online(), &online);
    assert_eq!(agent.target(), &target);
    assert_eq!(agent.learn_steps(), 0);
}

#[test]
fn test_save_and_load_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("checkpoint.bin");

    let mut trained = agent(small_config());
    for i in 0..12 {
        trained.record_and_maybe_learn(transition(i, false)).unwrap();
    }
    trained.save(&path).unwrap();

    let mut fresh = DqnAgent::builder(3, 3).config(small_config()).seed(99).build().unwrap();
    fresh.load(&path).unwrap();
    assert_eq!(fresh.online().state_dict(), trained.online().state_dict());
    assert_eq!(fresh.target().state_dict(), trained.online().state_dict());
    assert_eq!(trained.checkpoint(), trained.state_dict());

    let mut other = DqnAgent::new(5, 3).unwrap();
    assert!(other.load(&path).is_err());
}

#[test]
fn test_same_seed_same_training() {
    let run = || {
        let mut agent = agent(small_config());
        for i in 0..20 {
            agent.record_and_maybe_learn(transition(i, i % 7 == 6)).unwrap();
        }
        agent.online().state_dict()
    };
    assert_eq!(run(), run());
}

#[test]
fn test_batch_q_values_shape() {
    let agent = agent(small_config());
    let states = Array2::<f32>::zeros((5, 3));
    assert_eq!(agent.online().forward_batch(states.view()).unwrap().dim(), (5, 3));
}
