use crate::math::atomic::AtomicF64;
use crate::optim::settings::{OptimizerMode, OptimizerSettings};

/// Training-wide step counter read by the Adam rule.
///
/// Owned by the training session, advanced once per iteration after all
/// weights were updated, and only read while updating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdamClock {
    step: u64,
}

impl AdamClock {
    pub fn new() -> AdamClock {
        AdamClock { step: 0 }
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    /// Moves to the next step, wrapping to zero once `reset_after` is
    /// exceeded (`0` never wraps).
    pub fn advance(&mut self, reset_after: u64) {
        self.step += 1;
        if reset_after != 0 && self.step > reset_after {
            self.step = 0;
        }
    }
}

/// Everything an update needs besides the weight itself.
#[derive(Debug, Clone, Copy)]
pub struct UpdateContext<'a> {
    pub settings: &'a OptimizerSettings,
    pub step: u64,
}

/// Hidden state of one weight's update rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpdateRule {
    Plain,
    Momentum { velocity: f64 },
    Adam { m: f64, v: f64 },
}

impl UpdateRule {
    pub fn new(mode: OptimizerMode) -> UpdateRule {
        match mode {
            OptimizerMode::Sgd => UpdateRule::Plain,
            OptimizerMode::Momentum => UpdateRule::Momentum { velocity: 0.0 },
            OptimizerMode::Adam => UpdateRule::Adam { m: 0.0, v: 0.0 },
        }
    }
}

/// Per-weight optimizer state: the gradient accumulated during the current
/// iteration plus the rule's own memory.
///
/// The accumulator can be added to from several threads at once; the update
/// itself needs exclusive access.
#[derive(Debug, Clone)]
pub struct OptimizerState {
    gradient: AtomicF64,
    rule: UpdateRule,
}

impl OptimizerState {
    pub fn new(mode: OptimizerMode) -> OptimizerState {
        OptimizerState {
            gradient: AtomicF64::new(0.0),
            rule: UpdateRule::new(mode),
        }
    }

    pub fn accumulate(&self, delta: f64) {
        self.gradient.fetch_add(delta);
    }

    pub fn gradient(&self) -> f64 {
        self.gradient.load()
    }

    pub fn rule(&self) -> &UpdateRule {
        &self.rule
    }

    /// Applies the rule to `weight` using the accumulated gradient, then
    /// clears the accumulator for the next iteration.
    pub fn update(&mut self, weight: &mut f64, learning_rate: f64, ctx: UpdateContext<'_>) {
        let g = self.gradient.take();
        match &mut self.rule {
            UpdateRule::Plain => *weight -= learning_rate * g,
            UpdateRule::Momentum { velocity } => {
                *velocity = ctx.settings.momentum.gamma() * *velocity + learning_rate * g;
                *weight -= *velocity;
            }
            UpdateRule::Adam { m, v } => {
                let adam = &ctx.settings.adam;
                let (b1, b2) = (adam.beta1(), adam.beta2());
                let t = ctx.step as f64;

                *m = b1 * *m + (1.0 - b1) * g;
                *v = b2 * *v + (1.0 - b2) * g * g;

                let m_hat = *m / (1.0 - b1.powf(t));
                let v_hat = *v / (1.0 - b2.powf(t));
                let delta = learning_rate * m_hat / (adam.epsilon() + v_hat).sqrt();

                // At t = 0 the bias correction divides by zero.
                if delta.is_finite() {
                    *weight -= delta;
                } else {
                    *weight -= learning_rate * g;
                }

                if adam.reset_after() != 0 && ctx.step == adam.reset_after() {
                    *m = 0.0;
                    *v = 0.0;
                }
            }
        }
    }
}
