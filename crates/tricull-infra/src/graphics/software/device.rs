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

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use tricull_core::renderer::api::{
    BindGroupDescriptor, BindGroupEntry, BindGroupId, BindGroupLayoutSource, BindingResource,
    BufferDescriptor, BufferId, BufferUsage, CommandBufferId, ComputeKernel,
    ComputePipelineDescriptor, ComputePipelineId, DeviceLimits, RenderPipelineDescriptor,
    RenderPipelineId, RenderProgram, RendererAdapterInfo, RendererBackendType, TextureDescriptor,
    TextureFormat, TextureId, TextureUsage, TextureViewId,
};
use tricull_core::renderer::error::{PipelineError, RenderError, ResourceError};
use tricull_core::renderer::traits::{CommandEncoder, GraphicsDevice};

use super::command::{Command, SoftwareCommandEncoder};

/// One draw as executed by the software device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawRecord {
    /// The program of the bound pipeline.
    pub program: RenderProgram,
    /// Vertices per instance.
    pub vertex_count: u32,
    /// Instance count.
    pub instance_count: u32,
    /// `triangle_offset` of the bound view uniforms, for `TriangleIds` draws.
    pub triangle_offset: Option<u32>,
    /// Fragments that passed the depth test.
    pub fragments_written: u64,
}

/// A command as it was executed, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutedCommand {
    /// A render pass and the draws it contained.
    RenderPass {
        /// Pass label.
        label: Option<String>,
        /// Color target of the pass.
        target: TextureId,
        /// `true` if the color target was cleared at the start of the pass.
        cleared: bool,
        /// Executed draws.
        draws: Vec<DrawRecord>,
    },
    /// One compute dispatch.
    Dispatch {
        /// Label of the enclosing pass.
        label: Option<String>,
        /// The kernel run.
        kernel: ComputeKernel,
        /// Workgroup grid.
        workgroups: [u32; 3],
    },
    /// A buffer clear.
    ClearBuffer {
        /// The cleared buffer.
        buffer: BufferId,
    },
    /// A buffer-to-buffer copy.
    CopyBuffer {
        /// Copy source.
        source: BufferId,
        /// Copy destination.
        destination: BufferId,
    },
}

#[derive(Debug)]
pub(crate) struct SoftwareBuffer {
    pub(crate) data: Vec<u8>,
    pub(crate) usage: BufferUsage,
}

/// Texels are stored as `u32`: packed RGBA8, raw ids or `f32` depth bits.
#[derive(Debug)]
pub(crate) struct SoftwareTexture {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) format: TextureFormat,
    pub(crate) usage: TextureUsage,
    pub(crate) texels: Vec<u32>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct RenderPipelineState {
    pub(crate) program: RenderProgram,
    pub(crate) color_format: TextureFormat,
    pub(crate) depth_format: Option<TextureFormat>,
}

#[derive(Debug, Clone)]
pub(crate) struct BindGroupState {
    pub(crate) entries: Vec<BindGroupEntry>,
}

impl BindGroupState {
    pub(crate) fn resource(&self, binding: u32) -> Result<BindingResource, ResourceError> {
        self.entries
            .iter()
            .find(|e| e.binding == binding)
            .map(|e| e.resource)
            .ok_or_else(|| ResourceError::InvalidDescriptor(format!("binding {binding} is not bound")))
    }

    pub(crate) fn buffer(&self, binding: u32) -> Result<BufferId, ResourceError> {
        match self.resource(binding)? {
            BindingResource::Buffer(id) => Ok(id),
            BindingResource::TextureView(_) => Err(ResourceError::InvalidHandle),
        }
    }

    pub(crate) fn texture_view(&self, binding: u32) -> Result<TextureViewId, ResourceError> {
        match self.resource(binding)? {
            BindingResource::TextureView(id) => Ok(id),
            BindingResource::Buffer(_) => Err(ResourceError::InvalidHandle),
        }
    }
}

#[derive(Debug)]
pub(crate) struct PendingCommandBuffer {
    pub(crate) label: Option<String>,
    pub(crate) commands: Vec<Command>,
}

/// Every resource of the device, behind one lock.
#[derive(Debug, Default)]
pub(crate) struct SoftwareState {
    next_id: usize,
    pub(crate) buffers: HashMap<BufferId, SoftwareBuffer>,
    pub(crate) textures: HashMap<TextureId, SoftwareTexture>,
    pub(crate) views: HashMap<TextureViewId, TextureId>,
    pub(crate) render_pipelines: HashMap<RenderPipelineId, RenderPipelineState>,
    pub(crate) compute_pipelines: HashMap<ComputePipelineId, ComputeKernel>,
    pub(crate) bind_groups: HashMap<BindGroupId, BindGroupState>,
    pending: HashMap<CommandBufferId, PendingCommandBuffer>,
    pub(crate) log: Vec<ExecutedCommand>,
    submissions: u64,
    pub(crate) limits: DeviceLimits,
}

impl SoftwareState {
    fn next_id(&mut self) -> usize {
        self.next_id += 1;
        self.next_id
    }

    pub(crate) fn register_command_buffer(
        &mut self,
        label: Option<String>,
        commands: Vec<Command>,
    ) -> CommandBufferId {
        let id = CommandBufferId(self.next_id());
        self.pending.insert(id, PendingCommandBuffer { label, commands });
        id
    }

    pub(crate) fn view_texture(&self, view: TextureViewId) -> Result<TextureId, ResourceError> {
        self.views.get(&view).copied().ok_or(ResourceError::NotFound)
    }

    fn check_binding(&self, resource: &BindingResource) -> Result<(), ResourceError> {
        match resource {
            BindingResource::Buffer(id) => {
                let buffer = self.buffers.get(id).ok_or(ResourceError::NotFound)?;
                if !buffer.usage.intersects(BufferUsage::UNIFORM | BufferUsage::STORAGE) {
                    return Err(ResourceError::InvalidDescriptor(format!(
                        "buffer {id:?} is neither UNIFORM nor STORAGE"
                    )));
                }
                let size = buffer.data.len() as u64;
                if buffer.usage.contains(BufferUsage::STORAGE)
                    && size > self.limits.max_storage_buffer_binding_size
                {
                    return Err(ResourceError::InvalidDescriptor(format!(
                        "storage binding of {size} bytes exceeds the limit of {}",
                        self.limits.max_storage_buffer_binding_size
                    )));
                }
                Ok(())
            }
            BindingResource::TextureView(id) => {
                let texture = self.view_texture(*id)?;
                let texture = self.textures.get(&texture).ok_or(ResourceError::NotFound)?;
                if !texture.usage.contains(TextureUsage::TEXTURE_BINDING) {
                    return Err(ResourceError::InvalidDescriptor(format!(
                        "texture view {id:?} lacks TEXTURE_BINDING"
                    )));
                }
                Ok(())
            }
        }
    }
}

/// A [`GraphicsDevice`] that runs everything on the calling thread.
///
/// Cloning yields another handle to the same device.
#[derive(Clone, Default)]
pub struct SoftwareDevice {
    state: Arc<Mutex<SoftwareState>>,
}

impl fmt::Debug for SoftwareDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("SoftwareDevice");
        if let Ok(state) = self.state.lock() {
            s.field("buffers", &state.buffers.len())
                .field("textures", &state.textures.len())
                .field("submissions", &state.submissions);
        }
        s.finish_non_exhaustive()
    }
}

impl SoftwareDevice {
    /// Creates an empty device without resource limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty device that rejects what a GPU with `limits` would.
    pub fn with_limits(limits: DeviceLimits) -> Self {
        let device = Self::default();
        if let Ok(mut state) = device.state.lock() {
            state.limits = limits;
        }
        device
    }

    fn lock(&self) -> Result<MutexGuard<'_, SoftwareState>, ResourceError> {
        self.state
            .lock()
            .map_err(|e| ResourceError::BackendError(format!("Mutex poisoned (state): {e}")))
    }

    /// Drains the log of executed commands.
    pub fn take_command_log(&self) -> Vec<ExecutedCommand> {
        match self.state.lock() {
            Ok(mut state) => std::mem::take(&mut state.log),
            Err(_) => Vec::new(),
        }
    }

    /// Number of command buffers executed so far.
    pub fn submission_count(&self) -> u64 {
        self.state.lock().map(|s| s.submissions).unwrap_or(0)
    }

    /// Number of live buffers.
    pub fn live_buffer_count(&self) -> usize {
        self.state.lock().map(|s| s.buffers.len()).unwrap_or(0)
    }

    /// Number of live textures.
    pub fn live_texture_count(&self) -> usize {
        self.state.lock().map(|s| s.textures.len()).unwrap_or(0)
    }
}

fn check_render_target(descriptor: &RenderPipelineDescriptor) -> Result<(), PipelineError> {
    let expected = descriptor
        .program
        .color_format()
        .unwrap_or(TextureFormat::Rgba8Unorm);
    if descriptor.color_format != expected {
        return Err(PipelineError::IncompatibleTarget(format!(
            "{:?} writes {:?}, not {:?}",
            descriptor.program, expected, descriptor.color_format
        )));
    }
    match descriptor.depth_format {
        Some(format) if !format.is_depth() => Err(PipelineError::IncompatibleTarget(format!(
            "{format:?} is not a depth format"
        ))),
        _ => Ok(()),
    }
}

impl GraphicsDevice for SoftwareDevice {
    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError> {
        if descriptor.size % 4 != 0 {
            return Err(ResourceError::InvalidDescriptor(format!(
                "buffer size {} is not a multiple of 4",
                descriptor.size
            )));
        }
        let mut state = self.lock()?;
        if descriptor.size > state.limits.max_buffer_size {
            return Err(ResourceError::InvalidDescriptor(format!(
                "buffer size {} exceeds the limit of {}",
                descriptor.size, state.limits.max_buffer_size
            )));
        }
        let id = BufferId(state.next_id());
        state.buffers.insert(
            id,
            SoftwareBuffer {
                data: vec![0; descriptor.size as usize],
                usage: descriptor.usage,
            },
        );
        log::trace!(
            "SoftwareDevice: created buffer {:?} '{}' ({} bytes)",
            id,
            descriptor.label.as_deref().unwrap_or(""),
            descriptor.size
        );
        Ok(id)
    }

    fn create_buffer_with_data(
        &self,
        descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, ResourceError> {
        if descriptor.size != data.len() as u64 {
            return Err(ResourceError::InvalidDescriptor(format!(
                "buffer size {} does not match {} bytes of data",
                descriptor.size,
                data.len()
            )));
        }
        let id = self.create_buffer(descriptor)?;
        let mut state = self.lock()?;
        if let Some(buffer) = state.buffers.get_mut(&id) {
            buffer.data.copy_from_slice(data);
        }
        Ok(id)
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError> {
        self.lock()?
            .buffers
            .remove(&id)
            .map(|_| ())
            .ok_or(ResourceError::NotFound)
    }

    fn write_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError> {
        let mut state = self.lock()?;
        let buffer = state.buffers.get_mut(&id).ok_or(ResourceError::NotFound)?;
        let start = offset as usize;
        let end = start + data.len();
        buffer
            .data
            .get_mut(start..end)
            .ok_or(ResourceError::OutOfBounds)?
            .copy_from_slice(data);
        Ok(())
    }

    fn read_buffer(&self, id: BufferId) -> Result<Vec<u8>, ResourceError> {
        let state = self.lock()?;
        let buffer = state.buffers.get(&id).ok_or(ResourceError::NotFound)?;
        Ok(buffer.data.clone())
    }

    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError> {
        let size = descriptor.size;
        if size.width == 0 || size.height == 0 {
            return Err(ResourceError::InvalidDescriptor(
                "texture extent must be non-zero".to_owned(),
            ));
        }
        let clear = match descriptor.format {
            TextureFormat::Depth32Float => 1.0f32.to_bits(),
            _ => 0,
        };
        let mut state = self.lock()?;
        let id = TextureId(state.next_id());
        state.textures.insert(
            id,
            SoftwareTexture {
                width: size.width,
                height: size.height,
                format: descriptor.format,
                usage: descriptor.usage,
                texels: vec![clear; size.area() as usize],
            },
        );
        Ok(id)
    }

    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError> {
        let mut state = self.lock()?;
        state.textures.remove(&id).ok_or(ResourceError::NotFound)?;
        state.views.retain(|_, texture| *texture != id);
        Ok(())
    }

    fn create_texture_view(&self, texture: TextureId) -> Result<TextureViewId, ResourceError> {
        let mut state = self.lock()?;
        if !state.textures.contains_key(&texture) {
            return Err(ResourceError::NotFound);
        }
        let id = TextureViewId(state.next_id());
        state.views.insert(id, texture);
        Ok(id)
    }

    fn destroy_texture_view(&self, id: TextureViewId) -> Result<(), ResourceError> {
        self.lock()?
            .views
            .remove(&id)
            .map(|_| ())
            .ok_or(ResourceError::NotFound)
    }

    fn read_texture(&self, id: TextureId) -> Result<Vec<u8>, ResourceError> {
        let state = self.lock()?;
        let texture = state.textures.get(&id).ok_or(ResourceError::NotFound)?;
        Ok(bytemuck::cast_slice(&texture.texels).to_vec())
    }

    fn create_render_pipeline(
        &self,
        descriptor: &RenderPipelineDescriptor,
    ) -> Result<RenderPipelineId, ResourceError> {
        check_render_target(descriptor)?;
        let mut state = self.lock()?;
        let id = RenderPipelineId(state.next_id());
        state.render_pipelines.insert(
            id,
            RenderPipelineState {
                program: descriptor.program,
                color_format: descriptor.color_format,
                depth_format: descriptor.depth_format,
            },
        );
        Ok(id)
    }

    fn destroy_render_pipeline(&self, id: RenderPipelineId) -> Result<(), ResourceError> {
        self.lock()?
            .render_pipelines
            .remove(&id)
            .map(|_| ())
            .ok_or(ResourceError::NotFound)
    }

    fn create_compute_pipeline(
        &self,
        descriptor: &ComputePipelineDescriptor,
    ) -> Result<ComputePipelineId, ResourceError> {
        let mut state = self.lock()?;
        let id = ComputePipelineId(state.next_id());
        state.compute_pipelines.insert(id, descriptor.kernel);
        Ok(id)
    }

    fn destroy_compute_pipeline(&self, id: ComputePipelineId) -> Result<(), ResourceError> {
        self.lock()?
            .compute_pipelines
            .remove(&id)
            .map(|_| ())
            .ok_or(ResourceError::NotFound)
    }

    fn create_bind_group(
        &self,
        descriptor: &BindGroupDescriptor,
    ) -> Result<BindGroupId, ResourceError> {
        let mut state = self.lock()?;
        let layout_exists = match descriptor.layout {
            BindGroupLayoutSource::Render(pipeline, _) => {
                state.render_pipelines.contains_key(&pipeline)
            }
            BindGroupLayoutSource::Compute(pipeline, _) => {
                state.compute_pipelines.contains_key(&pipeline)
            }
        };
        if !layout_exists {
            return Err(ResourceError::NotFound);
        }
        for entry in descriptor.entries {
            state.check_binding(&entry.resource)?;
        }
        let id = BindGroupId(state.next_id());
        state.bind_groups.insert(
            id,
            BindGroupState {
                entries: descriptor.entries.to_vec(),
            },
        );
        Ok(id)
    }

    fn destroy_bind_group(&self, id: BindGroupId) -> Result<(), ResourceError> {
        self.lock()?
            .bind_groups
            .remove(&id)
            .map(|_| ())
            .ok_or(ResourceError::NotFound)
    }

    fn create_command_encoder(&self, label: Option<&str>) -> Box<dyn CommandEncoder> {
        Box::new(SoftwareCommandEncoder {
            label: label.map(str::to_owned),
            commands: Vec::new(),
            state: Arc::clone(&self.state),
        })
    }

    fn submit_command_buffer(&self, command_buffer: CommandBufferId) -> Result<(), RenderError> {
        let mut state = self.lock()?;
        let pending = state
            .pending
            .remove(&command_buffer)
            .ok_or(RenderError::Resource(ResourceError::NotFound))?;
        log::trace!(
            "SoftwareDevice: executing '{}' ({} commands)",
            pending.label.as_deref().unwrap_or("unlabeled"),
            pending.commands.len()
        );
        state.submissions += 1;
        state.execute(pending.commands)?;
        Ok(())
    }

    fn wait_idle(&self) -> Result<(), RenderError> {
        Ok(())
    }

    fn adapter_info(&self) -> RendererAdapterInfo {
        RendererAdapterInfo {
            name: "tricull software rasterizer".to_owned(),
            backend_type: RendererBackendType::Software,
            driver: String::new(),
        }
    }

    fn limits(&self) -> DeviceLimits {
        self.state
            .lock()
            .map(|state| state.limits)
            .unwrap_or_default()
    }
}
