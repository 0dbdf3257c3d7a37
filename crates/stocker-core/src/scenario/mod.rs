pub mod config;
pub mod engine;
pub mod metrics;
pub mod piecewise;
pub mod projection;
pub mod schedule;

pub use config::{ScenarioConfig, DEFAULT_INFLATION_RATE_PCT};
pub use engine::{PositionReturn, Scenario, ScenarioState, YearRecord};
pub use metrics::{ReturnMetrics, ScenarioMetrics};
pub use piecewise::PiecewiseScenario;
pub use schedule::{AllocationSchedule, ScheduleStep};

use crate::sampling::ReturnSampler;
use crate::types::Money;
use crate::StockerResult;

/// Anything that can be run repeatedly as a Monte Carlo trial.
///
/// `run_with` must restart from the configured initial state on every
/// call, so one template can be cloned and run any number of times.
pub trait Simulation: Clone + Send + Sync {
    fn name(&self) -> &str;
    fn start_value(&self) -> Money;
    fn run_with(&mut self, sampler: &mut dyn ReturnSampler) -> StockerResult<()>;
    fn history(&self) -> &[YearRecord];
    fn state(&self) -> &ScenarioState;
    fn metrics(&self) -> Option<&ScenarioMetrics>;
}

impl Simulation for Scenario {
    fn name(&self) -> &str {
        Scenario::name(self)
    }

    fn start_value(&self) -> Money {
        self.initial_portfolio().total_value()
    }

    fn run_with(&mut self, sampler: &mut dyn ReturnSampler) -> StockerResult<()> {
        self.run(sampler)
    }

    fn history(&self) -> &[YearRecord] {
        Scenario::history(self)
    }

    fn state(&self) -> &ScenarioState {
        Scenario::state(self)
    }

    fn metrics(&self) -> Option<&ScenarioMetrics> {
        Scenario::metrics(self)
    }
}

impl Simulation for PiecewiseScenario {
    fn name(&self) -> &str {
        PiecewiseScenario::name(self)
    }

    fn start_value(&self) -> Money {
        PiecewiseScenario::start_value(self)
    }

    fn run_with(&mut self, sampler: &mut dyn ReturnSampler) -> StockerResult<()> {
        self.run(sampler)
    }

    fn history(&self) -> &[YearRecord] {
        PiecewiseScenario::history(self)
    }

    fn state(&self) -> &ScenarioState {
        PiecewiseScenario::state(self)
    }

    fn metrics(&self) -> Option<&ScenarioMetrics> {
        PiecewiseScenario::metrics(self)
    }
}

/// A single scenario or a piecewise plan.
#[derive(Debug, Clone)]
pub enum Plan {
    Single(Scenario),
    Piecewise(PiecewiseScenario),
}

impl Plan {
    pub fn num_years(&self) -> u32 {
        match self {
            Plan::Single(s) => s.num_years(),
            Plan::Piecewise(p) => p.num_years(),
        }
    }
}

impl From<Scenario> for Plan {
    fn from(s: Scenario) -> Self {
        Plan::Single(s)
    }
}

impl From<PiecewiseScenario> for Plan {
    fn from(p: PiecewiseScenario) -> Self {
        Plan::Piecewise(p)
    }
}

macro_rules! delegate {
    ($self:ident, $inner:ident => $body:expr) => {
        match $self {
            Plan::Single($inner) => $body,
            Plan::Piecewise($inner) => $body,
        }
    };
}

impl Simulation for Plan {
    fn name(&self) -> &str {
        delegate!(self, s => Simulation::name(s))
    }

    fn start_value(&self) -> Money {
        delegate!(self, s => Simulation::start_value(s))
    }

    fn run_with(&mut self, sampler: &mut dyn ReturnSampler) -> StockerResult<()> {
        delegate!(self, s => s.run_with(sampler))
    }

    fn history(&self) -> &[YearRecord] {
        delegate!(self, s => Simulation::history(s))
    }

    fn state(&self) -> &ScenarioState {
        delegate!(self, s => Simulation::state(s))
    }

    fn metrics(&self) -> Option<&ScenarioMetrics> {
        delegate!(self, s => Simulation::metrics(s))
    }
}
