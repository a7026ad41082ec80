// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::path::PathBuf;
use thiserror::Error;
use tricull_core::renderer::{RenderError, ResourceError};
use tricull_core::{ConfigError, StrategyError};

/// Errors raised while configuring or running a benchmark.
#[derive(Debug, Error)]
pub enum BenchError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid RON configuration: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid visibility settings: {0}")]
    Visibility(#[from] ConfigError),

    #[error("Unknown strategy '{0}'")]
    UnknownStrategy(String),

    #[error("Failed to load model: {0:#}")]
    Model(anyhow::Error),

    #[error("Strategy {name} failed: {source}")]
    Strategy {
        name: &'static str,
        #[source]
        source: StrategyError,
    },

    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl BenchError {
    pub(crate) fn strategy(name: &'static str) -> impl FnOnce(StrategyError) -> Self {
        move |source| BenchError::Strategy { name, source }
    }
}
