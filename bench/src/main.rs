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

// tricull benchmark
// Renders the same model with every draw strategy and compares frame times.

mod cli;
mod id_dump;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Backend, Cli};
use std::sync::Arc;
use tricull_agents::{BenchAgent, BenchConfig};
use tricull_core::renderer::GraphicsDevice;
use tricull_infra::{SoftwareDevice, WgpuDevice};

fn create_device(backend: Backend) -> Result<Arc<dyn GraphicsDevice>> {
    Ok(match backend {
        Backend::Wgpu => Arc::new(
            WgpuDevice::new_headless().context("Failed to create a headless wgpu device")?,
        ),
        Backend::Software => Arc::new(SoftwareDevice::new()),
    })
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info"))
        .filter_module("wgpu_hal", log::LevelFilter::Error)
        .filter_module("wgpu_core", log::LevelFilter::Warn)
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => BenchConfig::load(path)?,
        None => BenchConfig::default(),
    };
    cli.apply_overrides(&mut config);

    if cli.print_config {
        let pretty = ron::ser::PrettyConfig::default().indentor("  ".to_string());
        println!("{}", ron::ser::to_string_pretty(&config, pretty)?);
        return Ok(());
    }

    let device = create_device(cli.backend)?;
    log::info!("Using {}", device.adapter_info());

    let model = config.model.build()?;
    let mut agent = BenchAgent::new(device, config)?;

    if let Some(path) = &cli.dump_id_texture {
        id_dump::dump_id_texture(&mut agent, &model, path)?;
    }

    agent.add_configured_strategies();
    agent.prepare_all(&model)?;
    let report = agent.run()?;

    println!("{report}");
    if let Some(path) = &cli.report {
        report.write_json(path)?;
    }
    Ok(())
}
