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

//! # Draw strategies
//!
//! A **draw strategy** is one interchangeable way of rendering the benchmark
//! model. The harness drives every strategy through the same lifecycle and
//! compares their frame cost; strategies never know about each other.
//!
//! ## Lifecycle
//!
//! 1. [`DrawStrategy::prepare`] once, with the model and the frame target formats.
//! 2. [`DrawStrategy::set_enabled`] to start or stop drawing. Idempotent.
//! 3. Every frame while the harness runs: [`DrawStrategy::late_update`], then
//!    [`DrawStrategy::render`] inside the frame's render pass.
//! 4. [`DrawStrategy::dispose`] once, after disabling.

use crate::math::Mat4;
use crate::renderer::{GraphicsDevice, RenderError, RenderPass, ResourceError, TextureFormat};
use crate::scene::{Camera, ModelNode};
use std::fmt;

/// Error type of strategy lifecycle operations.
#[derive(Debug)]
pub enum StrategyError {
    /// A per-frame hook ran before a successful `prepare`.
    NotPrepared,
    /// `prepare` was called twice without `dispose`.
    AlreadyPrepared,
    /// The model cannot be drawn by this strategy.
    InvalidModel(String),
    /// The camera of the frame does not produce a valid projection.
    InvalidCamera,
    /// A GPU resource could not be created or accessed.
    Resource(ResourceError),
    /// GPU work could not be submitted. Not retried; the host decides.
    Render(RenderError),
    /// A domain-specific error occurred while preparing.
    PrepareFailed(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for StrategyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyError::NotPrepared => write!(f, "Strategy used before prepare"),
            StrategyError::AlreadyPrepared => write!(f, "Strategy already prepared"),
            StrategyError::InvalidModel(msg) => write!(f, "Model rejected: {msg}"),
            StrategyError::InvalidCamera => write!(f, "Camera has no valid view-projection"),
            StrategyError::Resource(e) => write!(f, "Strategy resource error: {e}"),
            StrategyError::Render(e) => write!(f, "Strategy render error: {e}"),
            StrategyError::PrepareFailed(e) => write!(f, "Strategy preparation failed: {e}"),
        }
    }
}

impl std::error::Error for StrategyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StrategyError::Resource(e) => Some(e),
            StrategyError::Render(e) => Some(e),
            StrategyError::PrepareFailed(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<ResourceError> for StrategyError {
    fn from(e: ResourceError) -> Self {
        StrategyError::Resource(e)
    }
}

impl From<RenderError> for StrategyError {
    fn from(e: RenderError) -> Self {
        StrategyError::Render(e)
    }
}

/// Formats of the frame targets strategies draw into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetFormats {
    /// Color target format.
    pub color: TextureFormat,
    /// Depth target format, if the frame pass has one.
    pub depth: Option<TextureFormat>,
}

impl Default for TargetFormats {
    fn default() -> Self {
        Self {
            color: TextureFormat::Rgba8Unorm,
            depth: Some(TextureFormat::Depth32Float),
        }
    }
}

/// How the model is seen this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameView {
    /// The main camera.
    pub camera: Camera,
    /// Model-root to world transform.
    pub root_transform: Mat4,
}

/// Per-frame context handed to strategy hooks.
pub struct FrameContext<'a> {
    /// The device all GPU work goes through.
    pub device: &'a dyn GraphicsDevice,
    /// The main view of this frame.
    pub view: &'a FrameView,
    /// Monotonic frame counter of the harness.
    pub frame_index: u64,
}

/// The lifecycle every rendering strategy implements.
pub trait DrawStrategy: Send {
    /// A short, stable name used in logs and reports.
    fn strategy_name(&self) -> &'static str;

    /// One-time setup: uploads the model and creates every GPU resource.
    fn prepare(
        &mut self,
        device: &dyn GraphicsDevice,
        model: &ModelNode,
        targets: &TargetFormats,
    ) -> Result<(), StrategyError>;

    /// Starts or stops drawing. Calling it twice with the same value is a no-op.
    fn set_enabled(&mut self, enabled: bool);

    /// Whether the strategy currently draws.
    fn is_enabled(&self) -> bool;

    /// Per-frame tick, before the frame's render pass is recorded.
    ///
    /// Strategies with multi-frame work advance it here; they may submit
    /// their own command buffers.
    fn late_update(&mut self, _ctx: &FrameContext<'_>) -> Result<(), StrategyError> {
        Ok(())
    }

    /// Records this frame's draws into the harness's render pass.
    fn render(
        &mut self,
        ctx: &FrameContext<'_>,
        pass: &mut dyn RenderPass,
    ) -> Result<(), StrategyError>;

    /// Releases every GPU resource.
    ///
    /// Callers must disable the strategy first. Disposing an enabled strategy
    /// is a precondition violation; implementations stop their work before
    /// releasing so nothing dangling is ever submitted.
    fn dispose(&mut self, device: &dyn GraphicsDevice);
}
