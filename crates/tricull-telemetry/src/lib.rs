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

//! # tricull Telemetry
//!
//! Measures what the benchmark harness cares about: how long each frame of
//! each strategy takes, and on which machine.

pub mod metrics;
pub mod monitoring;
pub mod report;
pub mod service;
pub mod utils;

pub use metrics::{FrameSeries, FrameSummary};
pub use monitoring::HostInfo;
pub use report::{BenchReport, StrategyReport};
pub use service::TelemetryService;
pub use utils::{ScopedFrameTimer, Stopwatch};
