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

//! Bind groups: sets of resources bound together at one group index.

use super::buffer::BufferId;
use super::pipeline::{ComputePipelineId, RenderPipelineId};
use super::texture::TextureViewId;
use std::borrow::Cow;

/// An opaque handle to a bind group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindGroupId(pub usize);

/// Where the layout of a bind group comes from.
///
/// Layouts are derived from the program a pipeline was built with, so a bind
/// group names the pipeline and the group index it will be bound at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindGroupLayoutSource {
    /// Group `.1` of a render pipeline.
    Render(RenderPipelineId, u32),
    /// Group `.1` of a compute pipeline.
    Compute(ComputePipelineId, u32),
}

/// A resource bound at one binding slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingResource {
    /// The whole buffer.
    Buffer(BufferId),
    /// A texture view.
    TextureView(TextureViewId),
}

/// One entry of a bind group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindGroupEntry {
    /// The binding index inside the group.
    pub binding: u32,
    /// The bound resource.
    pub resource: BindingResource,
}

impl BindGroupEntry {
    /// Binds a whole buffer at `binding`.
    pub const fn buffer(binding: u32, buffer: BufferId) -> Self {
        Self {
            binding,
            resource: BindingResource::Buffer(buffer),
        }
    }

    /// Binds a texture view at `binding`.
    pub const fn texture_view(binding: u32, view: TextureViewId) -> Self {
        Self {
            binding,
            resource: BindingResource::TextureView(view),
        }
    }
}

/// Describes a bind group.
#[derive(Debug, Clone)]
pub struct BindGroupDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The pipeline group this bind group is compatible with.
    pub layout: BindGroupLayoutSource,
    /// The bound resources.
    pub entries: &'a [BindGroupEntry],
}
