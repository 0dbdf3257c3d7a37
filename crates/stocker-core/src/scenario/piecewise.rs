use tracing::debug;

use super::engine::{Scenario, ScenarioState, YearRecord};
use super::metrics::ScenarioMetrics;
use crate::error::StockerError;
use crate::sampling::ReturnSampler;
use crate::types::Money;
use crate::StockerResult;

/// Several scenarios chained end to end, e.g. accumulation followed by
/// retirement distributions.
///
/// The first stage starts from its own portfolio value. Every later stage
/// starts from the previous stage's final value, spread over its own
/// allocation. Year numbering runs on across stages.
#[derive(Debug, Clone)]
pub struct PiecewiseScenario {
    name: String,
    stages: Vec<Scenario>,
    history: Vec<YearRecord>,
    state: ScenarioState,
    metrics: Option<ScenarioMetrics>,
}

impl PiecewiseScenario {
    pub fn new(name: impl Into<String>, stages: Vec<Scenario>) -> StockerResult<Self> {
        if stages.is_empty() {
            return Err(StockerError::config("stages", "At least one stage is required"));
        }
        Ok(Self {
            name: name.into(),
            stages,
            history: Vec::new(),
            state: ScenarioState::Configured,
            metrics: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stages(&self) -> &[Scenario] {
        &self.stages
    }

    pub fn num_years(&self) -> u32 {
        self.stages.iter().map(|s| s.num_years()).sum()
    }

    pub fn start_value(&self) -> Money {
        self.stages[0].initial_portfolio().total_value()
    }

    pub fn history(&self) -> &[YearRecord] {
        &self.history
    }

    pub fn state(&self) -> &ScenarioState {
        &self.state
    }

    pub fn metrics(&self) -> Option<&ScenarioMetrics> {
        self.metrics.as_ref()
    }

    pub fn run<S: ReturnSampler + ?Sized>(&mut self, sampler: &mut S) -> StockerResult<()> {
        self.history.clear();
        self.metrics = None;
        self.state = ScenarioState::Running;

        let mut carried: Option<Money> = None;
        let mut offset = 0;
        for stage in &mut self.stages {
            let outcome = stage.run_from(sampler, offset, carried);
            self.history.extend_from_slice(stage.history());
            if let Err(e) = outcome {
                self.state = stage.state().clone();
                return Err(e);
            }
            debug!(plan = %self.name, stage = %stage.name(), "stage completed");
            offset += stage.num_years();
            carried = Some(stage.portfolio().total_value());
        }

        let start_value = self.start_value();
        self.metrics = ScenarioMetrics::from_history(start_value, &self.history);
        self.state = ScenarioState::Completed;
        Ok(())
    }
}
