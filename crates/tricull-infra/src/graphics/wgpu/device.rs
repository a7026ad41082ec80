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

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex, MutexGuard};

use wgpu::util::DeviceExt;

use tricull_core::renderer::api::{
    BindGroupDescriptor, BindGroupId, BindGroupLayoutSource, BindingResource, BufferDescriptor,
    BufferId, CommandBufferId, ComputePipelineDescriptor, ComputePipelineId, DeviceLimits,
    RenderPipelineDescriptor, RenderPipelineId, RendererAdapterInfo, TextureDescriptor,
    TextureFormat, TextureId, TextureViewId,
};
use tricull_core::renderer::traits::{CommandEncoder, GraphicsDevice};
use tricull_core::renderer::{PipelineError, RenderError, ResourceError};

use super::command::WgpuCommandEncoder;
use super::context::WgpuGraphicsContext;
use super::conversions::{from_wgpu_backend, from_wgpu_limits, IntoWgpu};
use super::programs;

#[derive(Debug)]
pub(crate) struct WgpuBufferEntry {
    pub(crate) wgpu_buffer: Arc<wgpu::Buffer>,
    pub(crate) size: u64,
}

#[derive(Debug)]
pub(crate) struct WgpuTextureEntry {
    pub(crate) wgpu_texture: Arc<wgpu::Texture>,
    pub(crate) format: TextureFormat,
}

#[derive(Debug)]
pub(crate) struct WgpuRenderPipelineEntry {
    pub(crate) wgpu_pipeline: Arc<wgpu::RenderPipeline>,
}

#[derive(Debug)]
pub(crate) struct WgpuComputePipelineEntry {
    pub(crate) wgpu_pipeline: Arc<wgpu::ComputePipeline>,
}

/// A finished command buffer, or the reason it cannot be submitted.
pub(crate) type PendingCommandBuffer = Result<wgpu::CommandBuffer, String>;

/// The internal, non-clonable state of the WgpuDevice.
#[derive(Debug)]
pub(crate) struct WgpuDeviceInternal {
    context: WgpuGraphicsContext,
    buffers: Mutex<HashMap<BufferId, WgpuBufferEntry>>,
    textures: Mutex<HashMap<TextureId, WgpuTextureEntry>>,
    texture_views: Mutex<HashMap<TextureViewId, Arc<wgpu::TextureView>>>,
    render_pipelines: Mutex<HashMap<RenderPipelineId, WgpuRenderPipelineEntry>>,
    compute_pipelines: Mutex<HashMap<ComputePipelineId, WgpuComputePipelineEntry>>,
    bind_groups: Mutex<HashMap<BindGroupId, Arc<wgpu::BindGroup>>>,
    pending_command_buffers: Mutex<HashMap<CommandBufferId, PendingCommandBuffer>>,
    next_id: AtomicUsize,
}

/// A clonable, thread-safe handle to a headless wgpu device.
///
/// Pipelines are built from logical program names; bind group layouts are
/// derived from the pipelines' shaders.
#[derive(Clone, Debug)]
pub struct WgpuDevice {
    internal: Arc<WgpuDeviceInternal>,
}

fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> Result<MutexGuard<'a, T>, ResourceError> {
    mutex
        .lock()
        .map_err(|e| ResourceError::BackendError(format!("Mutex poisoned ({what}): {e}")))
}

impl WgpuDevice {
    pub fn new(context: WgpuGraphicsContext) -> Self {
        Self {
            internal: Arc::new(WgpuDeviceInternal {
                context,
                buffers: Mutex::new(HashMap::new()),
                textures: Mutex::new(HashMap::new()),
                texture_views: Mutex::new(HashMap::new()),
                render_pipelines: Mutex::new(HashMap::new()),
                compute_pipelines: Mutex::new(HashMap::new()),
                bind_groups: Mutex::new(HashMap::new()),
                pending_command_buffers: Mutex::new(HashMap::new()),
                next_id: AtomicUsize::new(1),
            }),
        }
    }

    /// Creates a headless context on any available backend and wraps it.
    pub fn new_headless() -> anyhow::Result<Self> {
        Ok(Self::new(WgpuGraphicsContext::new_headless_blocking(
            wgpu::Backends::all(),
        )?))
    }

    fn next_id(&self) -> usize {
        self.internal.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn device(&self) -> &wgpu::Device {
        &self.internal.context.device
    }

    fn queue(&self) -> &wgpu::Queue {
        &self.internal.context.queue
    }

    /// Runs `operation` inside a validation error scope and reports the
    /// first validation error instead of letting it reach the uncaptured
    /// error handler.
    pub(crate) fn validated<R>(
        &self,
        operation: impl FnOnce(&wgpu::Device) -> R,
    ) -> Result<R, String> {
        let device = self.device();
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let result = operation(device);
        match pollster::block_on(device.pop_error_scope()) {
            Some(error) => Err(error.to_string()),
            None => Ok(result),
        }
    }

    pub(crate) fn get_wgpu_buffer(&self, id: BufferId) -> Option<Arc<wgpu::Buffer>> {
        let buffers = self.internal.buffers.lock().ok()?;
        buffers.get(&id).map(|entry| Arc::clone(&entry.wgpu_buffer))
    }

    pub(crate) fn get_wgpu_texture_view(&self, id: TextureViewId) -> Option<Arc<wgpu::TextureView>> {
        let views = self.internal.texture_views.lock().ok()?;
        views.get(&id).map(Arc::clone)
    }

    pub(crate) fn get_wgpu_render_pipeline(
        &self,
        id: RenderPipelineId,
    ) -> Option<Arc<wgpu::RenderPipeline>> {
        let pipelines = self.internal.render_pipelines.lock().ok()?;
        pipelines.get(&id).map(|entry| Arc::clone(&entry.wgpu_pipeline))
    }

    pub(crate) fn get_wgpu_compute_pipeline(
        &self,
        id: ComputePipelineId,
    ) -> Option<Arc<wgpu::ComputePipeline>> {
        let pipelines = self.internal.compute_pipelines.lock().ok()?;
        pipelines.get(&id).map(|entry| Arc::clone(&entry.wgpu_pipeline))
    }

    pub(crate) fn get_wgpu_bind_group(&self, id: BindGroupId) -> Option<Arc<wgpu::BindGroup>> {
        let groups = self.internal.bind_groups.lock().ok()?;
        groups.get(&id).map(Arc::clone)
    }

    pub(crate) fn create_wgpu_encoder(&self, label: Option<&str>) -> wgpu::CommandEncoder {
        self.device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label })
    }

    /// Registers a finished command buffer and returns its abstract id.
    pub(crate) fn register_command_buffer(&self, buffer: PendingCommandBuffer) -> CommandBufferId {
        let id = CommandBufferId(self.next_id());
        match self.internal.pending_command_buffers.lock() {
            Ok(mut pending) => {
                pending.insert(id, buffer);
            }
            Err(e) => log::error!("WgpuDevice: pending command buffers poisoned: {e}"),
        }
        id
    }

    /// Copies `size` bytes of `source` into a mappable buffer and reads them
    /// back, blocking until the GPU is done.
    fn read_back(
        &self,
        size: u64,
        record_copy: impl FnOnce(&mut wgpu::CommandEncoder, &wgpu::Buffer),
    ) -> Result<Vec<u8>, ResourceError> {
        let staging = self.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some("tricull readback staging"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let mut encoder = self.create_wgpu_encoder(Some("tricull readback"));
        record_copy(&mut encoder, &staging);
        self.queue().submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (sender, receiver) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            // The receiver only disappears if the read was abandoned.
            let _ = sender.send(result);
        });
        self.device()
            .poll(wgpu::PollType::Wait)
            .map_err(|e| ResourceError::BackendError(format!("Device poll failed: {e}")))?;
        receiver
            .recv()
            .map_err(|e| ResourceError::BackendError(format!("Readback never completed: {e}")))?
            .map_err(|e| ResourceError::BackendError(format!("Buffer mapping failed: {e}")))?;

        let bytes = slice.get_mapped_range().to_vec();
        staging.unmap();
        Ok(bytes)
    }
}

/// Bytes per row of a texture copy, padded to wgpu's copy alignment.
fn padded_bytes_per_row(width: u32, bytes_per_texel: u32) -> u32 {
    let unpadded = width * bytes_per_texel;
    unpadded.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT) * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT
}

impl GraphicsDevice for WgpuDevice {
    // --- Buffers ---

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError> {
        let wgpu_buffer = self.device().create_buffer(&wgpu::BufferDescriptor {
            label: descriptor.label.as_deref(),
            size: descriptor.size,
            usage: descriptor.usage.into_wgpu(),
            mapped_at_creation: false,
        });
        let id = BufferId(self.next_id());
        lock(&self.internal.buffers, "buffers")?.insert(
            id,
            WgpuBufferEntry {
                wgpu_buffer: Arc::new(wgpu_buffer),
                size: descriptor.size,
            },
        );
        log::trace!(
            "WgpuDevice: Created buffer '{}' with ID: {:?}, size: {} bytes",
            descriptor.label.as_deref().unwrap_or_default(),
            id,
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
        let wgpu_buffer = self
            .device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: descriptor.label.as_deref(),
                contents: data,
                usage: descriptor.usage.into_wgpu(),
            });
        let id = BufferId(self.next_id());
        lock(&self.internal.buffers, "buffers")?.insert(
            id,
            WgpuBufferEntry {
                wgpu_buffer: Arc::new(wgpu_buffer),
                size: descriptor.size,
            },
        );
        Ok(id)
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError> {
        let entry = lock(&self.internal.buffers, "buffers")?
            .remove(&id)
            .ok_or(ResourceError::NotFound)?;
        entry.wgpu_buffer.destroy();
        log::trace!("WgpuDevice: Destroyed buffer with ID: {id:?}");
        Ok(())
    }

    fn write_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError> {
        let buffer = {
            let buffers = lock(&self.internal.buffers, "buffers")?;
            let entry = buffers.get(&id).ok_or(ResourceError::NotFound)?;
            if offset + data.len() as u64 > entry.size {
                return Err(ResourceError::OutOfBounds);
            }
            Arc::clone(&entry.wgpu_buffer)
        };
        self.queue().write_buffer(&buffer, offset, data);
        Ok(())
    }

    fn read_buffer(&self, id: BufferId) -> Result<Vec<u8>, ResourceError> {
        let (buffer, size) = {
            let buffers = lock(&self.internal.buffers, "buffers")?;
            let entry = buffers.get(&id).ok_or(ResourceError::NotFound)?;
            (Arc::clone(&entry.wgpu_buffer), entry.size)
        };
        if size == 0 {
            return Ok(Vec::new());
        }
        // Copies must be 4-byte aligned.
        let copy_size = size.div_ceil(wgpu::COPY_BUFFER_ALIGNMENT) * wgpu::COPY_BUFFER_ALIGNMENT;
        let mut bytes = self.read_back(copy_size, |encoder, staging| {
            encoder.copy_buffer_to_buffer(&buffer, 0, staging, 0, copy_size.min(buffer.size()));
        })?;
        bytes.truncate(size as usize);
        Ok(bytes)
    }

    // --- Textures ---

    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError> {
        if descriptor.size.width == 0 || descriptor.size.height == 0 {
            return Err(ResourceError::InvalidDescriptor(
                "texture dimensions must be non-zero".to_owned(),
            ));
        }
        let texture = self.device().create_texture(&wgpu::TextureDescriptor {
            label: descriptor.label.as_deref(),
            size: descriptor.size.into_wgpu(),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: descriptor.format.into_wgpu(),
            usage: descriptor.usage.into_wgpu(),
            view_formats: &[],
        });
        let id = TextureId(self.next_id());
        lock(&self.internal.textures, "textures")?.insert(
            id,
            WgpuTextureEntry {
                wgpu_texture: Arc::new(texture),
                format: descriptor.format,
            },
        );
        log::trace!(
            "WgpuDevice: Created texture '{}' {}x{} {:?}",
            descriptor.label.as_deref().unwrap_or_default(),
            descriptor.size.width,
            descriptor.size.height,
            descriptor.format
        );
        Ok(id)
    }

    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError> {
        let entry = lock(&self.internal.textures, "textures")?
            .remove(&id)
            .ok_or(ResourceError::NotFound)?;
        entry.wgpu_texture.destroy();
        Ok(())
    }

    fn create_texture_view(&self, texture: TextureId) -> Result<TextureViewId, ResourceError> {
        let view = {
            let textures = lock(&self.internal.textures, "textures")?;
            let entry = textures.get(&texture).ok_or(ResourceError::NotFound)?;
            entry
                .wgpu_texture
                .create_view(&wgpu::TextureViewDescriptor::default())
        };
        let id = TextureViewId(self.next_id());
        lock(&self.internal.texture_views, "texture_views")?.insert(id, Arc::new(view));
        Ok(id)
    }

    fn destroy_texture_view(&self, id: TextureViewId) -> Result<(), ResourceError> {
        lock(&self.internal.texture_views, "texture_views")?
            .remove(&id)
            .map(|_| ())
            .ok_or(ResourceError::NotFound)
    }

    fn read_texture(&self, id: TextureId) -> Result<Vec<u8>, ResourceError> {
        let (texture, format) = {
            let textures = lock(&self.internal.textures, "textures")?;
            let entry = textures.get(&id).ok_or(ResourceError::NotFound)?;
            (Arc::clone(&entry.wgpu_texture), entry.format)
        };
        let (width, height) = (texture.width(), texture.height());
        let texel = format.bytes_per_texel();
        let padded = padded_bytes_per_row(width, texel);
        let aspect = if format.is_depth() {
            wgpu::TextureAspect::DepthOnly
        } else {
            wgpu::TextureAspect::All
        };

        let padded_bytes = self.read_back(padded as u64 * height as u64, |encoder, staging| {
            encoder.copy_texture_to_buffer(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect,
                },
                wgpu::TexelCopyBufferInfo {
                    buffer: staging,
                    layout: wgpu::TexelCopyBufferLayout {
                        offset: 0,
                        bytes_per_row: Some(padded),
                        rows_per_image: Some(height),
                    },
                },
                texture.size(),
            );
        })?;

        let row = (width * texel) as usize;
        let mut bytes = Vec::with_capacity(row * height as usize);
        for chunk in padded_bytes.chunks(padded as usize).take(height as usize) {
            bytes.extend_from_slice(&chunk[..row]);
        }
        Ok(bytes)
    }

    // --- Pipelines and bind groups ---

    fn create_render_pipeline(
        &self,
        descriptor: &RenderPipelineDescriptor,
    ) -> Result<RenderPipelineId, ResourceError> {
        let program = descriptor.program;
        log::debug!(
            "WgpuDevice: Creating render pipeline '{}' for {:?}",
            descriptor.label.as_deref().unwrap_or_default(),
            program
        );
        let expected_color = program.color_format();
        if expected_color.is_some_and(|format| format != descriptor.color_format)
            || (expected_color.is_none() && descriptor.color_format != TextureFormat::Rgba8Unorm)
        {
            return Err(PipelineError::IncompatibleTarget(format!(
                "{program:?} cannot write {:?}",
                descriptor.color_format
            ))
            .into());
        }
        if descriptor.depth_format.is_some_and(|format| !format.is_depth()) {
            return Err(PipelineError::IncompatibleTarget(format!(
                "{:?} is not a depth format",
                descriptor.depth_format
            ))
            .into());
        }

        let label = descriptor.label.as_deref();
        let vertex_buffers = programs::vertex_buffer_layouts(program);
        let targets = [Some(wgpu::ColorTargetState {
            format: descriptor.color_format.into_wgpu(),
            blend: None,
            write_mask: wgpu::ColorWrites::ALL,
        })];
        let pipeline = self
            .validated(|device| {
                let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label,
                    source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(
                        programs::render_program_source(program),
                    )),
                });
                device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label,
                    layout: None,
                    vertex: wgpu::VertexState {
                        module: &module,
                        entry_point: Some(programs::VERTEX_ENTRY),
                        compilation_options: Default::default(),
                        buffers: &vertex_buffers,
                    },
                    primitive: wgpu::PrimitiveState {
                        topology: wgpu::PrimitiveTopology::TriangleList,
                        front_face: wgpu::FrontFace::Ccw,
                        cull_mode: None,
                        ..Default::default()
                    },
                    depth_stencil: descriptor.depth_format.map(|format| wgpu::DepthStencilState {
                        format: format.into_wgpu(),
                        depth_write_enabled: true,
                        depth_compare: wgpu::CompareFunction::Less,
                        stencil: wgpu::StencilState::default(),
                        bias: wgpu::DepthBiasState::default(),
                    }),
                    multisample: wgpu::MultisampleState::default(),
                    fragment: Some(wgpu::FragmentState {
                        module: &module,
                        entry_point: Some(programs::FRAGMENT_ENTRY),
                        compilation_options: Default::default(),
                        targets: &targets,
                    }),
                    multiview: None,
                    cache: None,
                })
            })
            .map_err(|details| PipelineError::CompilationFailed {
                label: label.map(str::to_owned),
                details,
            })?;

        let id = RenderPipelineId(self.next_id());
        lock(&self.internal.render_pipelines, "render_pipelines")?.insert(
            id,
            WgpuRenderPipelineEntry {
                wgpu_pipeline: Arc::new(pipeline),
            },
        );
        Ok(id)
    }

    fn destroy_render_pipeline(&self, id: RenderPipelineId) -> Result<(), ResourceError> {
        lock(&self.internal.render_pipelines, "render_pipelines")?
            .remove(&id)
            .map(|_| ())
            .ok_or(ResourceError::NotFound)
    }

    fn create_compute_pipeline(
        &self,
        descriptor: &ComputePipelineDescriptor,
    ) -> Result<ComputePipelineId, ResourceError> {
        let kernel = descriptor.kernel;
        let label = descriptor.label.as_deref();
        log::debug!(
            "WgpuDevice: Creating compute pipeline '{}' for {:?}",
            label.unwrap_or_default(),
            kernel
        );
        let pipeline = self
            .validated(|device| {
                let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label,
                    source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(
                        programs::compute_kernel_source(kernel),
                    )),
                });
                device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                    label,
                    layout: None,
                    module: &module,
                    entry_point: Some(programs::COMPUTE_ENTRY),
                    compilation_options: Default::default(),
                    cache: None,
                })
            })
            .map_err(|details| PipelineError::CompilationFailed {
                label: label.map(str::to_owned),
                details,
            })?;

        let id = ComputePipelineId(self.next_id());
        lock(&self.internal.compute_pipelines, "compute_pipelines")?.insert(
            id,
            WgpuComputePipelineEntry {
                wgpu_pipeline: Arc::new(pipeline),
            },
        );
        Ok(id)
    }

    fn destroy_compute_pipeline(&self, id: ComputePipelineId) -> Result<(), ResourceError> {
        lock(&self.internal.compute_pipelines, "compute_pipelines")?
            .remove(&id)
            .map(|_| ())
            .ok_or(ResourceError::NotFound)
    }

    fn create_bind_group(
        &self,
        descriptor: &BindGroupDescriptor,
    ) -> Result<BindGroupId, ResourceError> {
        let layout = match descriptor.layout {
            BindGroupLayoutSource::Render(id, group) => self
                .get_wgpu_render_pipeline(id)
                .ok_or(ResourceError::NotFound)?
                .get_bind_group_layout(group),
            BindGroupLayoutSource::Compute(id, group) => self
                .get_wgpu_compute_pipeline(id)
                .ok_or(ResourceError::NotFound)?
                .get_bind_group_layout(group),
        };

        enum Bound {
            Buffer(Arc<wgpu::Buffer>),
            View(Arc<wgpu::TextureView>),
        }
        let mut bound = Vec::with_capacity(descriptor.entries.len());
        for entry in descriptor.entries {
            let resource = match entry.resource {
                BindingResource::Buffer(id) => {
                    Bound::Buffer(self.get_wgpu_buffer(id).ok_or(ResourceError::NotFound)?)
                }
                BindingResource::TextureView(id) => {
                    Bound::View(self.get_wgpu_texture_view(id).ok_or(ResourceError::NotFound)?)
                }
            };
            bound.push((entry.binding, resource));
        }
        let entries: Vec<wgpu::BindGroupEntry> = bound
            .iter()
            .map(|(binding, resource)| wgpu::BindGroupEntry {
                binding: *binding,
                resource: match resource {
                    Bound::Buffer(buffer) => buffer.as_entire_binding(),
                    Bound::View(view) => wgpu::BindingResource::TextureView(view),
                },
            })
            .collect();

        let label = descriptor.label.as_deref();
        let bind_group = self
            .validated(|device| {
                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label,
                    layout: &layout,
                    entries: &entries,
                })
            })
            .map_err(ResourceError::InvalidDescriptor)?;

        let id = BindGroupId(self.next_id());
        lock(&self.internal.bind_groups, "bind_groups")?.insert(id, Arc::new(bind_group));
        Ok(id)
    }

    fn destroy_bind_group(&self, id: BindGroupId) -> Result<(), ResourceError> {
        lock(&self.internal.bind_groups, "bind_groups")?
            .remove(&id)
            .map(|_| ())
            .ok_or(ResourceError::NotFound)
    }

    // --- Commands ---

    fn create_command_encoder(&self, label: Option<&str>) -> Box<dyn CommandEncoder> {
        Box::new(WgpuCommandEncoder::new(
            self.create_wgpu_encoder(label),
            self.clone(),
        ))
    }

    fn submit_command_buffer(&self, command_buffer: CommandBufferId) -> Result<(), RenderError> {
        let pending = lock(&self.internal.pending_command_buffers, "pending_command_buffers")?
            .remove(&command_buffer)
            .ok_or(ResourceError::InvalidHandle)?;
        let buffer = pending.map_err(RenderError::SubmissionFailed)?;
        self.validated(|_| self.queue().submit(std::iter::once(buffer)))
            .map(|_| ())
            .map_err(RenderError::SubmissionFailed)
    }

    fn wait_idle(&self) -> Result<(), RenderError> {
        self.device()
            .poll(wgpu::PollType::Wait)
            .map(|_| ())
            .map_err(|e| RenderError::SubmissionFailed(format!("Device poll failed: {e}")))
    }

    fn adapter_info(&self) -> RendererAdapterInfo {
        let context = &self.internal.context;
        RendererAdapterInfo {
            name: context.adapter_name.clone(),
            backend_type: from_wgpu_backend(context.adapter_backend),
            driver: context.adapter_driver.clone(),
        }
    }

    fn limits(&self) -> DeviceLimits {
        from_wgpu_limits(&self.internal.context.device_limits)
    }
}
