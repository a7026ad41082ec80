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
    BindGroupDescriptor, BindGroupId, BufferDescriptor, BufferId, CommandBufferId,
    ComputePipelineDescriptor, ComputePipelineId, DeviceLimits, RenderPipelineDescriptor,
    RenderPipelineId, RendererAdapterInfo, TextureDescriptor, TextureId, TextureViewId,
};
use crate::renderer::error::{RenderError, ResourceError};
use crate::renderer::traits::CommandEncoder;
use std::fmt::Debug;

/// The backend-agnostic interface to a GPU (or something pretending to be one).
///
/// Every resource is referenced through an opaque id. Ids stay valid until
/// the matching `destroy_*` call; using a destroyed id yields
/// [`ResourceError::NotFound`].
pub trait GraphicsDevice: Send + Sync + Debug + 'static {
    // --- Buffers ---

    /// Creates an uninitialized (zeroed) buffer.
    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError>;

    /// Creates a buffer initialized with `data`; `descriptor.size` must equal `data.len()`.
    fn create_buffer_with_data(
        &self,
        descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, ResourceError>;

    /// Destroys a buffer.
    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError>;

    /// Schedules a host write. It is ordered before every command buffer
    /// submitted afterwards.
    fn write_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError>;

    /// Blocks until all submitted work is done and returns the buffer contents.
    ///
    /// Readback is slow; it exists for tests, diagnostics and reports.
    fn read_buffer(&self, id: BufferId) -> Result<Vec<u8>, ResourceError>;

    // --- Textures ---

    /// Creates a texture.
    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError>;

    /// Destroys a texture. Views created from it must be destroyed first.
    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError>;

    /// Creates a view covering the whole texture.
    fn create_texture_view(&self, texture: TextureId) -> Result<TextureViewId, ResourceError>;

    /// Destroys a texture view.
    fn destroy_texture_view(&self, id: TextureViewId) -> Result<(), ResourceError>;

    /// Blocks until all submitted work is done and returns tightly packed
    /// texel rows of the texture.
    fn read_texture(&self, id: TextureId) -> Result<Vec<u8>, ResourceError>;

    // --- Pipelines and bind groups ---

    /// Creates a render pipeline for a logical program.
    fn create_render_pipeline(
        &self,
        descriptor: &RenderPipelineDescriptor,
    ) -> Result<RenderPipelineId, ResourceError>;

    /// Destroys a render pipeline.
    fn destroy_render_pipeline(&self, id: RenderPipelineId) -> Result<(), ResourceError>;

    /// Creates a compute pipeline for a logical kernel.
    fn create_compute_pipeline(
        &self,
        descriptor: &ComputePipelineDescriptor,
    ) -> Result<ComputePipelineId, ResourceError>;

    /// Destroys a compute pipeline.
    fn destroy_compute_pipeline(&self, id: ComputePipelineId) -> Result<(), ResourceError>;

    /// Creates a bind group compatible with one group of a pipeline.
    fn create_bind_group(
        &self,
        descriptor: &BindGroupDescriptor,
    ) -> Result<BindGroupId, ResourceError>;

    /// Destroys a bind group.
    fn destroy_bind_group(&self, id: BindGroupId) -> Result<(), ResourceError>;

    // --- Commands ---

    /// Creates a command encoder.
    fn create_command_encoder(&self, label: Option<&str>) -> Box<dyn CommandEncoder>;

    /// Submits a finished command buffer to the queue.
    fn submit_command_buffer(&self, command_buffer: CommandBufferId) -> Result<(), RenderError>;

    /// Blocks until every submitted command buffer has finished executing.
    fn wait_idle(&self) -> Result<(), RenderError>;

    /// Describes the adapter in use.
    fn adapter_info(&self) -> RendererAdapterInfo;

    /// The resource limits the device was created with.
    fn limits(&self) -> DeviceLimits;
}
