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

//! The benchmark report and its JSON form.

use crate::metrics::{FrameSeries, FrameSummary};
use crate::monitoring::HostInfo;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Measurements of one strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyReport {
    pub strategy: String,
    pub warmup_frames: u32,
    /// `None` when no frame was measured.
    pub frame_time: Option<FrameSummary>,
    pub samples_ms: Vec<f64>,
}

impl StrategyReport {
    pub fn from_series(series: &FrameSeries, warmup_frames: u32) -> Self {
        Self {
            strategy: series.name().to_string(),
            warmup_frames,
            frame_time: series.summary(),
            samples_ms: series.samples().to_vec(),
        }
    }
}

/// Everything one benchmark run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchReport {
    pub adapter: String,
    pub host: HostInfo,
    pub resolution: [u32; 2],
    pub model_triangles: u64,
    pub strategies: Vec<StrategyReport>,
}

impl BenchReport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Writes the pretty-printed JSON report to `path`.
    pub fn write_json(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        let json = self.to_json().context("Failed to serialize the report")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        log::info!("Report written to {}", path.display());
        Ok(())
    }

    pub fn strategy(&self, name: &str) -> Option<&StrategyReport> {
        self.strategies.iter().find(|s| s.strategy == name)
    }
}

/// A fixed-width table, one row per strategy.
impl fmt::Display for BenchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} | {}x{} | {} triangles",
            self.adapter, self.resolution[0], self.resolution[1], self.model_triangles
        )?;
        writeln!(
            f,
            "{:<20} {:>7} {:>9} {:>9} {:>9} {:>9}",
            "strategy", "frames", "mean ms", "p50 ms", "p95 ms", "max ms"
        )?;
        for s in &self.strategies {
            match &s.frame_time {
                Some(t) => writeln!(
                    f,
                    "{:<20} {:>7} {:>9.3} {:>9.3} {:>9.3} {:>9.3}",
                    s.strategy, t.count, t.mean, t.p50, t.p95, t.max
                )?,
                None => writeln!(f, "{:<20} {:>7}", s.strategy, 0)?,
            }
        }
        Ok(())
    }
}
