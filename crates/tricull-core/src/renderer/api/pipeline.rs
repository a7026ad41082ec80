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

//! Logical GPU programs and the pipelines built from them.
//!
//! Pipelines are requested by *what they do*, never by shader source. Each
//! backend owns the implementation of every program, and both sides agree on
//! the binding contract documented on each variant. `view` always means a
//! [`ViewUniforms`](super::ViewUniforms) uniform at group 0, binding 0.

use super::texture::TextureFormat;
use std::borrow::Cow;

/// Render programs understood by every backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderProgram {
    /// Indexed mesh from a [`MeshVertex`](super::MeshVertex) vertex buffer in slot 0.
    ///
    /// Group 0: view. Group 1, binding 0: [`ObjectUniforms`](super::ObjectUniforms).
    /// Group 2, binding 0: [`MaterialUniforms`](super::MaterialUniforms).
    FlatColor,
    /// Procedural draw through an index buffer held in storage.
    ///
    /// Group 0: view. Group 1: binding 0 `u32` indices, binding 1
    /// [`StructuredVertex`](super::StructuredVertex) records, binding 2
    /// [`PartAttributes`](super::PartAttributes).
    /// Vertex `i` reads `records[indices[i]]`.
    IndexedProcedural,
    /// Procedural draw over fully unpacked records.
    ///
    /// Group 0: view. Group 1: binding 0 records, binding 1 part attributes.
    /// Vertex `i` reads `records[i]`.
    UnpackedProcedural,
    /// Writes the global triangle index of every covered texel.
    ///
    /// Group 0: view, whose `triangle_offset` is the first triangle of the
    /// draw. Group 1: binding 0 records, binding 1 part attributes.
    /// Vertex `i` reads `records[triangle_offset * 3 + i]` and emits triangle
    /// `triangle_offset + i / 3`. Target format is [`TextureFormat::R32Uint`].
    TriangleIds,
    /// Draws only the compacted visible set, colored by source part.
    ///
    /// Group 0: view. Group 1: binding 0 records, binding 1 part attributes,
    /// binding 2 the visible-set buffer ([`VisibleSetHeader`](super::VisibleSetHeader)
    /// followed by `u32` triangle indices). Vertex `i` reads
    /// `records[indices[i / 3] * 3 + i % 3]`. Drawn with an indirect draw.
    VisibleTriangles,
}

impl RenderProgram {
    /// The color format the program writes.
    pub const fn color_format(&self) -> Option<TextureFormat> {
        match self {
            RenderProgram::TriangleIds => Some(TextureFormat::R32Uint),
            _ => None,
        }
    }

    /// Returns `true` when vertex data comes from bound vertex buffers.
    pub const fn uses_vertex_buffers(&self) -> bool {
        matches!(self, RenderProgram::FlatColor)
    }
}

/// Compute kernels understood by every backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComputeKernel {
    /// One invocation per ID-texture texel. Marks `flags[id] = 1` for every
    /// texel whose id is not [`ID_SENTINEL`](super::ID_SENTINEL) and lies
    /// inside the flag buffer.
    ///
    /// Group 0: binding 0 the `R32Uint` ID texture, binding 1 `u32` flags.
    AccumulateIds,
    /// One invocation per triangle flag. A set flag is cleared and its index
    /// appended to the visible set; slots at or beyond capacity are dropped.
    /// The grid comes from [`linear_workgroups`](ComputeKernel::linear_workgroups).
    ///
    /// Group 0: binding 0 flags, binding 1 the visible-set buffer.
    CompactVisible,
    /// Single invocation writing [`DrawIndirectArgs`](super::DrawIndirectArgs)
    /// with `min(count, capacity) * 3` vertices.
    ///
    /// Group 0: binding 0 the visible-set buffer, binding 1 the args buffer.
    WriteDrawArgs,
}

impl ComputeKernel {
    /// The workgroup size the kernel is compiled with.
    pub const fn workgroup_size(&self) -> [u32; 3] {
        match self {
            ComputeKernel::AccumulateIds => [8, 8, 1],
            ComputeKernel::CompactVisible => [64, 1, 1],
            ComputeKernel::WriteDrawArgs => [1, 1, 1],
        }
    }

    /// Number of workgroups needed to cover `extent` invocations.
    pub fn workgroups_for(&self, extent: [u32; 3]) -> [u32; 3] {
        let size = self.workgroup_size();
        [
            extent[0].div_ceil(size[0]).max(1),
            extent[1].div_ceil(size[1]).max(1),
            extent[2].div_ceil(size[2]).max(1),
        ]
    }

    /// Workgroups covering `count` invocations of a one-dimensional kernel,
    /// folded into rows of at most `max_per_dimension` workgroups.
    ///
    /// Invocation `(x, y)` of the resulting grid `[gx, gy, 1]` handles item
    /// `y * gx * width + x`, `width` being the workgroup width. The last row
    /// may run past `count`, so kernels bound-check their index.
    pub fn linear_workgroups(&self, count: u32, max_per_dimension: u32) -> [u32; 3] {
        let groups = count.div_ceil(self.workgroup_size()[0]).max(1);
        let row = groups.min(max_per_dimension.max(1));
        [row, groups.div_ceil(row), 1]
    }
}

/// An opaque handle to a render pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderPipelineId(pub usize);

/// An opaque handle to a compute pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComputePipelineId(pub usize);

/// Describes a render pipeline.
#[derive(Debug, Clone)]
pub struct RenderPipelineDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The program to run.
    pub program: RenderProgram,
    /// Format of the single color target.
    pub color_format: TextureFormat,
    /// Format of the depth target. Depth testing uses `Less` when present.
    pub depth_format: Option<TextureFormat>,
}

/// Describes a compute pipeline.
#[derive(Debug, Clone)]
pub struct ComputePipelineDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The kernel to run.
    pub kernel: ComputeKernel,
}
