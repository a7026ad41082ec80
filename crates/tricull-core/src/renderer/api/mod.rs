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

//! Data types of the rendering API: handles, descriptors and GPU record layouts.

pub mod adapter;
pub mod bind_group;
pub mod buffer;
pub mod command;
pub mod gpu_types;
pub mod pipeline;
pub mod texture;

pub use self::adapter::{DeviceLimits, RendererAdapterInfo, RendererBackendType};
pub use self::bind_group::{
    BindGroupDescriptor, BindGroupEntry, BindGroupId, BindGroupLayoutSource, BindingResource,
};
pub use self::buffer::{BufferDescriptor, BufferId, BufferUsage, IndexFormat};
pub use self::command::{
    ClearValue, CommandBufferId, ComputePassDescriptor, LoadOp, Operations,
    RenderPassColorAttachment, RenderPassDepthStencilAttachment, RenderPassDescriptor, StoreOp,
};
pub use self::gpu_types::{
    DrawIndirectArgs, MaterialUniforms, MeshVertex, ObjectUniforms, PartAttributes,
    StructuredVertex, ViewUniforms, VisibleSetHeader, ID_SENTINEL,
};
pub use self::pipeline::{
    ComputeKernel, ComputePipelineDescriptor, ComputePipelineId, RenderPipelineDescriptor,
    RenderPipelineId, RenderProgram,
};
pub use self::texture::{
    TextureDescriptor, TextureFormat, TextureId, TextureUsage, TextureViewId,
};
