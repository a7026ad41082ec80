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

//! # tricull Core
//!
//! Traits, core types and interface contracts shared by every tricull crate.
//! Nothing in here talks to a concrete graphics API: backends live in
//! `tricull-infra`, strategies in `tricull-lanes`.

#![warn(missing_docs)]

pub mod config;
pub mod macros;
pub mod math;
pub mod renderer;
pub mod scene;
pub mod strategy;

pub use config::{ConfigError, VisibilityConfig};
pub use strategy::{DrawStrategy, FrameContext, FrameView, StrategyError, TargetFormats};
