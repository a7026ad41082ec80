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

//! # tricull Agents
//!
//! The orchestration layer: [`BenchAgent`] owns the frame targets and the
//! strategies under test, drives them frame by frame and collects their
//! timings into a [`BenchReport`](tricull_telemetry::BenchReport).

pub mod bench_agent;

pub use bench_agent::{
    BenchAgent, BenchConfig, BenchError, FrameTargets, ModelSource, OrbitConfig, StrategyKind,
};
