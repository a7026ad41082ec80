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

//! Command recording descriptors.

use super::texture::TextureViewId;
use crate::math::LinearRgba;
use std::borrow::Cow;

/// An opaque handle to a finished, not yet submitted command buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandBufferId(pub usize);

/// What happens to an attachment at the start of a pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoadOp<V> {
    /// Clear to the given value.
    Clear(V),
    /// Keep the previous contents.
    Load,
}

/// What happens to an attachment at the end of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    /// Write the results back.
    Store,
    /// Results may be discarded.
    Discard,
}

/// Load and store operations of one attachment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Operations<V> {
    /// Operation at the start of the pass.
    pub load: LoadOp<V>,
    /// Operation at the end of the pass.
    pub store: StoreOp,
}

/// Clear value of a color attachment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearValue {
    /// For normalized and float formats.
    Float(LinearRgba),
    /// For integer formats; only the components the format has are used.
    Uint([u32; 4]),
}

/// A color attachment of a render pass.
#[derive(Debug, Clone)]
pub struct RenderPassColorAttachment {
    /// The view rendered into.
    pub view: TextureViewId,
    /// Load/store behaviour.
    pub ops: Operations<ClearValue>,
}

/// The depth attachment of a render pass.
#[derive(Debug, Clone)]
pub struct RenderPassDepthStencilAttachment {
    /// The depth view.
    pub view: TextureViewId,
    /// Depth load/store behaviour.
    pub depth_ops: Operations<f32>,
}

/// Describes a render pass with a single color target.
#[derive(Debug, Clone)]
pub struct RenderPassDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The color target.
    pub color_attachment: RenderPassColorAttachment,
    /// The optional depth target.
    pub depth_stencil_attachment: Option<RenderPassDepthStencilAttachment>,
}

/// Describes a compute pass.
#[derive(Debug, Clone, Default)]
pub struct ComputePassDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
}
