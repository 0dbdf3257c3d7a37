use serde::{Deserialize, Serialize};

use crate::error::StockerError;
use crate::presets;
use crate::types::Percent;
use crate::StockerResult;

/// An asset class: a name plus the mean and standard deviation of its
/// annual return, both in percent.
///
/// Positions are immutable once built and compare by value, so the same
/// asset class can appear in many portfolios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PositionSpec")]
pub struct Position {
    name: String,
    average_return: Percent,
    std_dev: Percent,
}

impl Position {
    pub fn new(
        name: impl Into<String>,
        average_return: Percent,
        std_dev: Percent,
    ) -> StockerResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(StockerError::config("name", "Position name must not be empty"));
        }
        if !average_return.is_finite() {
            return Err(StockerError::config(
                "average_return",
                format!("'{name}' average return must be finite"),
            ));
        }
        if !std_dev.is_finite() || std_dev < 0.0 {
            return Err(StockerError::config(
                "std_dev",
                format!("'{name}' standard deviation must be finite and >= 0"),
            ));
        }
        Ok(Self {
            name,
            average_return,
            std_dev,
        })
    }

    /// Build a position from constants already known to be valid.
    pub(crate) fn from_static(
        name: String,
        average_return: Percent,
        std_dev: Percent,
    ) -> Self {
        Self {
            name,
            average_return,
            std_dev,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn average_return(&self) -> Percent {
        self.average_return
    }

    pub fn std_dev(&self) -> Percent {
        self.std_dev
    }
}

/// How a position is written in an input file: either a reference to the
/// built-in table or explicit parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PositionSpec {
    Preset {
        preset: String,
    },
    Custom {
        name: String,
        average_return: Percent,
        std_dev: Percent,
    },
}

impl TryFrom<PositionSpec> for Position {
    type Error = StockerError;

    fn try_from(spec: PositionSpec) -> StockerResult<Self> {
        match spec {
            PositionSpec::Preset { preset } => presets::position(&preset),
            PositionSpec::Custom {
                name,
                average_return,
                std_dev,
            } => Position::new(name, average_return, std_dev),
        }
    }
}
