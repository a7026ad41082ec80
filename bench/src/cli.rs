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

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tricull_agents::{BenchConfig, ModelSource, StrategyKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Headless wgpu on the best available adapter.
    Wgpu,
    /// The CPU reference device. Slow, but needs no GPU.
    Software,
}

/// Compares draw strategies by frame time, on a shared camera path.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    /// RON configuration file. Missing fields use the defaults.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value_t = Backend::Wgpu)]
    pub backend: Backend,

    /// Measured frames per strategy.
    #[arg(short, long)]
    pub frames: Option<u32>,

    /// Warm-up frames per strategy.
    #[arg(long)]
    pub warmup: Option<u32>,

    /// Strategy to run; repeat to run several. Replaces the configured list.
    #[arg(short, long = "strategy")]
    pub strategies: Vec<StrategyKind>,

    /// Loads the model from an OBJ file instead of the configured source.
    #[arg(long)]
    pub obj: Option<PathBuf>,

    /// Writes the JSON report to this path.
    #[arg(short, long)]
    pub report: Option<PathBuf>,

    /// Runs one visibility sweep first and saves its ID texture as PNG.
    #[arg(long, value_name = "PNG")]
    pub dump_id_texture: Option<PathBuf>,

    /// Prints the effective configuration as RON and exits.
    #[arg(long)]
    pub print_config: bool,
}

impl Cli {
    pub fn apply_overrides(&self, config: &mut BenchConfig) {
        if let Some(frames) = self.frames {
            config.measured_frames = frames;
        }
        if let Some(warmup) = self.warmup {
            config.warmup_frames = warmup;
        }
        if !self.strategies.is_empty() {
            config.strategies = self.strategies.clone();
        }
        if let Some(path) = &self.obj {
            config.model = ModelSource::Obj { path: path.clone() };
        }
    }
}
