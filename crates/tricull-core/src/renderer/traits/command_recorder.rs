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

use crate::renderer::api::{
    BindGroupId, BufferId, CommandBufferId, ComputePassDescriptor, ComputePipelineId,
    IndexFormat, RenderPassDescriptor, RenderPipelineId,
};
use std::ops::Range;

/// An active render pass, used for recording drawing commands.
///
/// Obtained from [`CommandEncoder::begin_render_pass`]; the pass ends when
/// the object is dropped.
pub trait RenderPass {
    /// Sets the pipeline used by subsequent draws.
    fn set_pipeline(&mut self, pipeline: RenderPipelineId);

    /// Binds a bind group at `index`.
    fn set_bind_group(&mut self, index: u32, bind_group: BindGroupId);

    /// Binds a vertex buffer to a slot.
    fn set_vertex_buffer(&mut self, slot: u32, buffer: BufferId, offset: u64);

    /// Binds an index buffer.
    fn set_index_buffer(&mut self, buffer: BufferId, offset: u64, format: IndexFormat);

    /// Records a non-indexed draw.
    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>);

    /// Records an indexed draw.
    fn draw_indexed(&mut self, indices: Range<u32>, base_vertex: i32, instances: Range<u32>);

    /// Records a non-indexed draw whose arguments are read from `buffer` at
    /// execution time, laid out as [`DrawIndirectArgs`](crate::renderer::DrawIndirectArgs).
    fn draw_indirect(&mut self, buffer: BufferId, offset: u64);
}

/// An active compute pass, used for recording dispatches.
pub trait ComputePass {
    /// Sets the pipeline used by subsequent dispatches.
    fn set_pipeline(&mut self, pipeline: ComputePipelineId);

    /// Binds a bind group at `index`.
    fn set_bind_group(&mut self, index: u32, bind_group: BindGroupId);

    /// Dispatches a grid of workgroups.
    fn dispatch_workgroups(&mut self, x: u32, y: u32, z: u32);
}

/// Records a sequence of GPU commands into a command buffer.
///
/// Commands execute in recording order. Work in later passes observes every
/// write made by earlier passes of the same or earlier submissions.
pub trait CommandEncoder {
    /// Begins a render pass. Only one pass can be open at a time.
    fn begin_render_pass<'encoder>(
        &'encoder mut self,
        descriptor: &RenderPassDescriptor<'_>,
    ) -> Box<dyn RenderPass + 'encoder>;

    /// Begins a compute pass.
    fn begin_compute_pass<'encoder>(
        &'encoder mut self,
        descriptor: &ComputePassDescriptor<'_>,
    ) -> Box<dyn ComputePass + 'encoder>;

    /// Zeroes `size` bytes of `buffer` starting at `offset`; `None` clears to the end.
    fn clear_buffer(&mut self, buffer: BufferId, offset: u64, size: Option<u64>);

    /// Copies bytes between two buffers.
    fn copy_buffer_to_buffer(
        &mut self,
        source: BufferId,
        source_offset: u64,
        destination: BufferId,
        destination_offset: u64,
        size: u64,
    );

    /// Finishes recording. The returned handle is submitted through
    /// [`GraphicsDevice::submit_command_buffer`](super::GraphicsDevice::submit_command_buffer).
    fn finish(self: Box<Self>) -> CommandBufferId;
}
