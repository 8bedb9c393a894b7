//! Lunar Lander DQN Example
//!
//! Trains a DQN agent on a simplified two-dimensional lander: eight
//! observations (position, velocity, angle, angular velocity, leg contacts)
//! and four actions (do nothing, fire left engine, fire main engine, fire
//! right engine).
//!
//! Run with `RUST_LOG=info cargo run --example train_lander [config.json]`.

use lander::agent::DqnAgent;
use lander::config::Config;
use lander::env::{Environment, Info, Step};
use lander::error::Result;
use lander::trainer::{evaluate, Trainer};
use ndarray::{array, Array1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const GRAVITY: f32 = -10.0;
const MAIN_ENGINE: f32 = 13.0;
const SIDE_ENGINE: f32 = 0.6;
const SIDE_TORQUE: f32 = 2.5;
const DT: f32 = 0.02;
const FRAMES_PER_STEP: usize = 3;

/// Simplified Lunar Lander Environment
struct Lander {
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
    angle: f32,
    angular_velocity: f32,
    left_contact: bool,
    right_contact: bool,
    previous_shaping: Option<f32>,
    rng: StdRng,
}

impl Lander {
    fn new(seed: u64) -> Self {
        Lander {
            x: 0.0,
            y: 1.4,
            vx: 0.0,
            vy: 0.0,
            angle: 0.0,
            angular_velocity: 0.0,
            left_contact: false,
            right_contact: false,
            previous_shaping: None,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn observation(&self) -> Array1<f32> {
        let contact = |c: bool| if c { 1.0 } else { 0.0 };
        array![
            self.x,
            self.y,
            self.vx,
            self.vy,
            self.angle,
            self.angular_velocity,
            contact(self.left_contact),
            contact(self.right_contact)
        ]
    }

    fn shaping(&self) -> f32 {
        let distance = (self.x * self.x + self.y * self.y).sqrt();
        let speed = (self.vx * self.vx + self.vy * self.vy).sqrt();
        let legs = self.left_contact as u8 as f32 + self.right_contact as u8 as f32;
        -100.0 * distance - 100.0 * speed - 100.0 * self.angle.abs() + 10.0 * legs
    }
}

impl Environment for Lander {
    fn observation_size(&self) -> usize {
        8
    }

    fn action_count(&self) -> usize {
        4
    }

    fn reset(&mut self) -> Result<(Array1<f32>, Info)> {
        self.x = self.rng.gen_range(-0.3..0.3);
        self.y = 1.4;
        self.vx = self.rng.gen_range(-0.5..0.5);
        self.vy = self.rng.gen_range(-0.5..0.0);
        self.angle = self.rng.gen_range(-0.1..0.1);
        self.angular_velocity = 0.0;
        self.left_contact = false;
        self.right_contact = false;
        self.previous_shaping = None;
        Ok((self.observation(), Info::new()))
    }

    fn step(&mut self, action: usize) -> Result<Step> {
        let (main, side) = match action {
            1 => (0.0, -1.0),
            2 => (1.0, 0.0),
            3 => (0.0, 1.0),
            _ => (0.0, 0.0),
        };

        for _ in 0..FRAMES_PER_STEP {
            let (sin, cos) = self.angle.sin_cos();
            let ax = -sin * MAIN_ENGINE * main + cos * SIDE_ENGINE * side;
            let ay = GRAVITY + cos * MAIN_ENGINE * main + sin * SIDE_ENGINE * side;
            self.vx += ax * DT;
            self.vy += ay * DT;
            self.angular_velocity += -side * SIDE_TORQUE * DT;
            self.x += self.vx * DT;
            self.y += self.vy * DT;
            self.angle += self.angular_velocity * DT;
        }

        let touching = self.y <= 0.0;
        if touching {
            self.y = 0.0;
        }
        self.left_contact = touching && self.angle >= -0.2;
        self.right_contact = touching && self.angle <= 0.2;

        let shaping = self.shaping();
        let mut reward = match self.previous_shaping {
            Some(previous) => shaping - previous,
            None => 0.0,
        };
        self.previous_shaping = Some(shaping);
        reward -= main * 0.3 + side.abs() * 0.03;

        let mut info = Info::new();
        let mut terminated = false;
        if self.x.abs() >= 1.0 || (touching && (self.vy < -1.0 || self.angle.abs() > 0.4)) {
            reward = -100.0;
            terminated = true;
            info.insert("crashed".to_string(), 1.0);
        } else if touching && self.vx.abs() < 0.2 && self.vy.abs() < 0.2 {
            reward = 100.0;
            terminated = true;
            info.insert("landed".to_string(), 1.0);
        } else if touching {
            self.vy = 0.0;
            self.vx *= 0.5;
        }

        Ok(Step {
            observation: self.observation(),
            reward,
            terminated,
            truncated: false,
            info,
        })
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(path)?,
        None => {
            let mut config = Config::default();
            config.trainer.checkpoint_path = Some("checkpoint.bin".into());
            config
        }
    };

    println!("Lunar Lander DQN Example");
    println!("========================\n");

    let mut env = Lander::new(config.trainer.seed);
    let mut agent = DqnAgent::builder(env.observation_size(), env.action_count())
        .config(config.agent.clone())
        .build()?;
    let mut trainer = Trainer::new(config.trainer.clone())?;

    println!(
        "Training... (goal: average {:.0} over {} episodes)",
        config.trainer.solved_threshold, config.trainer.solved_window
    );
    let report = trainer.train(&mut agent, &mut env)?;

    if report.solved {
        println!("\nSolved in {} episodes! Average Score: {:.2}", report.episodes, report.final_average);
    } else {
        println!("\nNot solved after {} episodes. Average Score: {:.2}", report.episodes, report.final_average);
    }
    println!("Learning steps: {}, environment steps: {}", agent.learn_steps(), report.total_steps);

    println!("\nTesting trained agent (10 episodes)...");
    let scores = evaluate(&agent, &mut env, 10, config.trainer.max_steps_per_episode)?;
    for (i, score) in scores.iter().enumerate() {
        println!("Test {}: score={:.2}", i + 1, score);
    }
    let mean = scores.iter().sum::<f32>() / scores.len().max(1) as f32;
    println!("Average test score: {:.2}", mean);

    Ok(())
}
