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

//! WGSL implementations of the logical programs and kernels.

use tricull_core::renderer::api::{ComputeKernel, MeshVertex, RenderProgram};

macro_rules! render_source {
    ($file:literal) => {
        concat!(include_str!("shaders/common.wgsl"), include_str!($file))
    };
}

pub(crate) const VERTEX_ENTRY: &str = "vs_main";
pub(crate) const FRAGMENT_ENTRY: &str = "fs_main";
pub(crate) const COMPUTE_ENTRY: &str = "cs_main";

/// WGSL source of a render program.
pub(crate) fn render_program_source(program: RenderProgram) -> &'static str {
    match program {
        RenderProgram::FlatColor => render_source!("shaders/flat_color.wgsl"),
        RenderProgram::IndexedProcedural => render_source!("shaders/indexed_procedural.wgsl"),
        RenderProgram::UnpackedProcedural => render_source!("shaders/unpacked_procedural.wgsl"),
        RenderProgram::VisibleTriangles => render_source!("shaders/visible_triangles.wgsl"),
        RenderProgram::TriangleIds => include_str!("shaders/triangle_ids.wgsl"),
    }
}

/// WGSL source of a compute kernel.
pub(crate) fn compute_kernel_source(kernel: ComputeKernel) -> &'static str {
    match kernel {
        ComputeKernel::AccumulateIds => include_str!("shaders/accumulate_ids.wgsl"),
        ComputeKernel::CompactVisible => include_str!("shaders/compact_visible.wgsl"),
        ComputeKernel::WriteDrawArgs => include_str!("shaders/write_draw_args.wgsl"),
    }
}

static MESH_VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

/// Vertex buffer layouts fetched by the fixed-function stage. Empty for
/// programs that pull their vertices from storage buffers.
pub(crate) fn vertex_buffer_layouts(program: RenderProgram) -> Vec<wgpu::VertexBufferLayout<'static>> {
    if !program.uses_vertex_buffers() {
        return Vec::new();
    }
    vec![wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &MESH_VERTEX_ATTRIBUTES,
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROGRAMS: [RenderProgram; 5] = [
        RenderProgram::FlatColor,
        RenderProgram::IndexedProcedural,
        RenderProgram::UnpackedProcedural,
        RenderProgram::TriangleIds,
        RenderProgram::VisibleTriangles,
    ];

    #[test]
    fn every_program_has_both_stages() {
        for program in PROGRAMS {
            let source = render_program_source(program);
            assert!(source.contains("fn vs_main"), "{program:?}");
            assert!(source.contains("fn fs_main"), "{program:?}");
        }
    }

    #[test]
    fn only_flat_color_fetches_vertex_buffers() {
        for program in PROGRAMS {
            let layouts = vertex_buffer_layouts(program);
            assert_eq!(layouts.is_empty(), program != RenderProgram::FlatColor);
        }
    }

    #[test]
    fn kernel_workgroup_sizes_match_the_wgsl() {
        for (kernel, attribute) in [
            (ComputeKernel::AccumulateIds, "@workgroup_size(8, 8, 1)"),
            (ComputeKernel::CompactVisible, "@workgroup_size(64, 1, 1)"),
            (ComputeKernel::WriteDrawArgs, "@workgroup_size(1, 1, 1)"),
        ] {
            assert!(compute_kernel_source(kernel).contains(attribute));
        }
    }
}
