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

//! Plain-old-data records shared between the CPU and every GPU program.
//!
//! Layouts follow WGSL host-shareable rules; the size assertions in the tests
//! pin them down.

use crate::math::{LinearRgba, Mat4, Vec3};
use bytemuck::{Pod, Zeroable};

/// Texel value of the ID target where no triangle was rasterized.
pub const ID_SENTINEL: u32 = u32::MAX;

/// Vertex-buffer vertex of [`RenderProgram::FlatColor`](super::RenderProgram::FlatColor).
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct MeshVertex {
    /// Object-space position.
    pub position: [f32; 3],
    /// Object-space normal.
    pub normal: [f32; 3],
}

/// One record of the attribute buffer: one vertex of one triangle.
///
/// `part` indexes the part-attribute buffer, which is how a triangle finds
/// the transform and color of the sub-mesh it came from.
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct StructuredVertex {
    /// Position in the part's local space.
    pub position: [f32; 3],
    /// Index of the source part.
    pub part: u32,
    /// Normal in the part's local space.
    pub normal: [f32; 3],
    /// Keeps the record 16-byte aligned.
    pub _pad: u32,
}

impl StructuredVertex {
    /// Creates a record.
    pub fn new(position: Vec3, normal: Vec3, part: u32) -> Self {
        Self {
            position: position.to_array(),
            part,
            normal: normal.to_array(),
            _pad: 0,
        }
    }
}

/// Per-part record of the other-attributes buffer.
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct PartAttributes {
    /// Part space to model-root space.
    pub model: [[f32; 4]; 4],
    /// Uniform color of the part.
    pub color: [f32; 4],
}

impl PartAttributes {
    /// Creates a record from a transform and a color.
    pub fn new(model: &Mat4, color: LinearRgba) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            color: color.to_array(),
        }
    }
}

/// Per-view uniforms bound at group 0 of every render program.
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct ViewUniforms {
    /// Projection times view.
    pub view_proj: [[f32; 4]; 4],
    /// Model-root to world transform.
    pub root: [[f32; 4]; 4],
    /// First triangle of the current draw; only read by `TriangleIds`.
    pub triangle_offset: u32,
    /// Padding to a 16-byte multiple.
    pub _pad: [u32; 3],
}

impl ViewUniforms {
    /// Creates view uniforms with a zero triangle offset.
    pub fn new(view_proj: &Mat4, root: &Mat4) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            root: root.to_cols_array_2d(),
            triangle_offset: 0,
            _pad: [0; 3],
        }
    }

    /// Returns a copy with another triangle offset.
    pub fn with_triangle_offset(mut self, offset: u32) -> Self {
        self.triangle_offset = offset;
        self
    }
}

/// Per-object uniforms of `FlatColor`.
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct ObjectUniforms {
    /// Object to model-root transform.
    pub model: [[f32; 4]; 4],
}

/// Per-material uniforms of `FlatColor`.
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct MaterialUniforms {
    /// Base color.
    pub color: [f32; 4],
}

/// Arguments of a non-indexed indirect draw, in the order GPUs read them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
#[repr(C)]
pub struct DrawIndirectArgs {
    /// Number of vertices to draw.
    pub vertex_count: u32,
    /// Number of instances to draw.
    pub instance_count: u32,
    /// First vertex index.
    pub first_vertex: u32,
    /// First instance index.
    pub first_instance: u32,
}

/// Header of the visible-set buffer, followed by `capacity` `u32` indices.
///
/// `count` is the append counter. It may exceed the capacity when more
/// triangles were found visible than fit; only `min(count, capacity)`
/// indices are valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
#[repr(C)]
pub struct VisibleSetHeader {
    /// Number of append attempts since the last reset.
    pub count: u32,
    /// Padding to 16 bytes.
    pub _pad: [u32; 3],
}

impl VisibleSetHeader {
    /// Size of the header in bytes.
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;

    /// Size in bytes of a visible-set buffer holding `capacity` indices.
    pub const fn buffer_size(capacity: u32) -> u64 {
        Self::SIZE + capacity as u64 * 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    #[test]
    fn record_sizes_match_wgsl_layouts() {
        assert_eq!(size_of::<MeshVertex>(), 24);
        assert_eq!(size_of::<StructuredVertex>(), 32);
        assert_eq!(size_of::<PartAttributes>(), 80);
        assert_eq!(size_of::<ViewUniforms>(), 144);
        assert_eq!(size_of::<ObjectUniforms>(), 64);
        assert_eq!(size_of::<MaterialUniforms>(), 16);
        assert_eq!(size_of::<DrawIndirectArgs>(), 16);
        assert_eq!(VisibleSetHeader::SIZE, 16);
    }

    #[test]
    fn visible_set_buffer_size_includes_header() {
        assert_eq!(VisibleSetHeader::buffer_size(4), 32);
    }
}
