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

//! Execution of recorded command lists.

use tricull_core::renderer::api::{
    BindGroupId, BufferId, BufferUsage, ClearValue, ComputeKernel, DrawIndirectArgs, IndexFormat,
    LoadOp, RenderProgram, TextureFormat, TextureUsage,
};
use tricull_core::renderer::error::{PipelineError, ResourceError};

use super::command::{Command, ComputeCommand, ComputePassRecord, RenderCommand, RenderPassRecord};
use super::device::{
    BindGroupState, DrawRecord, ExecutedCommand, RenderPipelineState, SoftwareBuffer,
    SoftwareState, SoftwareTexture,
};
use super::kernels;
use super::programs::{read_pod, ProgramInputs, ViewState};
use super::raster::RasterTarget;

const MAX_BIND_GROUPS: usize = 4;

/// Binding state accumulated while walking a render pass.
#[derive(Default)]
struct RenderBindings {
    pipeline: Option<RenderPipelineState>,
    groups: [Option<BindGroupId>; MAX_BIND_GROUPS],
    vertex_buffer: Option<(BufferId, u64)>,
    index_buffer: Option<(BufferId, u64, IndexFormat)>,
}

impl SoftwareState {
    pub(crate) fn execute(&mut self, commands: Vec<Command>) -> Result<(), ResourceError> {
        for command in commands {
            match command {
                Command::Render(record) => self.execute_render_pass(record)?,
                Command::Compute(record) => self.execute_compute_pass(record)?,
                Command::ClearBuffer {
                    buffer,
                    offset,
                    size,
                } => {
                    let target = self.buffers.get_mut(&buffer).ok_or(ResourceError::NotFound)?;
                    let start = offset as usize;
                    let end = match size {
                        Some(size) => start + size as usize,
                        None => target.data.len(),
                    };
                    target
                        .data
                        .get_mut(start..end)
                        .ok_or(ResourceError::OutOfBounds)?
                        .fill(0);
                    self.log.push(ExecutedCommand::ClearBuffer { buffer });
                }
                Command::CopyBuffer {
                    source,
                    source_offset,
                    destination,
                    destination_offset,
                    size,
                } => {
                    let src = self.buffers.get(&source).ok_or(ResourceError::NotFound)?;
                    let (start, len) = (source_offset as usize, size as usize);
                    let bytes = src
                        .data
                        .get(start..start + len)
                        .ok_or(ResourceError::OutOfBounds)?
                        .to_vec();
                    let dst = self
                        .buffers
                        .get_mut(&destination)
                        .ok_or(ResourceError::NotFound)?;
                    let start = destination_offset as usize;
                    dst.data
                        .get_mut(start..start + len)
                        .ok_or(ResourceError::OutOfBounds)?
                        .copy_from_slice(&bytes);
                    self.log.push(ExecutedCommand::CopyBuffer {
                        source,
                        destination,
                    });
                }
            }
        }
        Ok(())
    }

    // --- Render passes ---

    fn execute_render_pass(&mut self, record: RenderPassRecord) -> Result<(), ResourceError> {
        let color_id = self.view_texture(record.color.view)?;
        let depth_id = match &record.depth {
            Some(depth) => Some(self.view_texture(depth.view)?),
            None => None,
        };
        if Some(color_id) == depth_id {
            return Err(ResourceError::InvalidHandle);
        }

        // Attachments are taken out of the map while the pass runs so shader
        // inputs can be borrowed from the rest of the state.
        let mut color = self.textures.remove(&color_id).ok_or(ResourceError::NotFound)?;
        let mut depth = match depth_id {
            Some(id) => match self.textures.remove(&id) {
                Some(texture) => Some(texture),
                None => {
                    self.textures.insert(color_id, color);
                    return Err(ResourceError::NotFound);
                }
            },
            None => None,
        };

        let result = self.run_render_pass(&record, &mut color, depth.as_mut());

        self.textures.insert(color_id, color);
        if let (Some(id), Some(texture)) = (depth_id, depth) {
            self.textures.insert(id, texture);
        }

        let draws = result?;
        self.log.push(ExecutedCommand::RenderPass {
            label: record.label,
            target: color_id,
            cleared: matches!(record.color.ops.load, LoadOp::Clear(_)),
            draws,
        });
        Ok(())
    }

    fn run_render_pass(
        &self,
        record: &RenderPassRecord,
        color: &mut SoftwareTexture,
        mut depth: Option<&mut SoftwareTexture>,
    ) -> Result<Vec<DrawRecord>, ResourceError> {
        if !color.usage.contains(TextureUsage::RENDER_ATTACHMENT) {
            return Err(ResourceError::InvalidDescriptor(
                "color target lacks RENDER_ATTACHMENT".to_owned(),
            ));
        }
        if let LoadOp::Clear(value) = record.color.ops.load {
            let texel = match (value, color.format) {
                (ClearValue::Uint(v), _) => v[0],
                (ClearValue::Float(c), TextureFormat::Rgba8Unorm) => c.to_rgba8(),
                (ClearValue::Float(c), _) => c.r as u32,
            };
            color.texels.fill(texel);
        }
        if let (Some(texture), Some(attachment)) = (depth.as_deref_mut(), record.depth.as_ref()) {
            if texture.width != color.width || texture.height != color.height {
                return Err(ResourceError::InvalidDescriptor(
                    "depth and color attachments differ in size".to_owned(),
                ));
            }
            if let LoadOp::Clear(value) = attachment.depth_ops.load {
                texture.texels.fill(value.to_bits());
            }
        }

        let mut bindings = RenderBindings::default();
        let mut draws = Vec::new();
        for command in &record.commands {
            match command {
                RenderCommand::SetPipeline(id) => {
                    let pipeline = *self.render_pipelines.get(id).ok_or(ResourceError::NotFound)?;
                    check_attachments(&pipeline, color, depth.as_deref())?;
                    bindings.pipeline = Some(pipeline);
                }
                RenderCommand::SetBindGroup(index, id) => {
                    let slot = bindings
                        .groups
                        .get_mut(*index as usize)
                        .ok_or(ResourceError::OutOfBounds)?;
                    *slot = Some(*id);
                }
                RenderCommand::SetVertexBuffer(slot, id, offset) => {
                    if *slot != 0 {
                        return Err(ResourceError::OutOfBounds);
                    }
                    bindings.vertex_buffer = Some((*id, *offset));
                }
                RenderCommand::SetIndexBuffer(id, offset, format) => {
                    bindings.index_buffer = Some((*id, *offset, *format));
                }
                RenderCommand::Draw {
                    vertices,
                    instances,
                } => {
                    let indices: Vec<u32> = vertices.clone().collect();
                    let instances = instances.len() as u32;
                    draws.push(self.draw(&bindings, &indices, instances, color, depth.as_deref_mut())?);
                }
                RenderCommand::DrawIndexed {
                    indices,
                    base_vertex,
                    instances,
                } => {
                    let (id, offset, format) =
                        bindings.index_buffer.ok_or_else(|| missing("index buffer"))?;
                    let data = self.buffer_bytes(id, BufferUsage::INDEX)?;
                    let data = data.get(offset as usize..).ok_or(ResourceError::OutOfBounds)?;
                    let mut resolved = Vec::with_capacity(indices.len());
                    for i in indices.clone() {
                        let index = match format {
                            IndexFormat::Uint16 => read_pod::<u16>(data, i as usize)? as i64,
                            IndexFormat::Uint32 => read_pod::<u32>(data, i as usize)? as i64,
                        };
                        let vertex = u32::try_from(index + *base_vertex as i64)
                            .map_err(|_| ResourceError::OutOfBounds)?;
                        resolved.push(vertex);
                    }
                    let instances = instances.len() as u32;
                    draws.push(self.draw(&bindings, &resolved, instances, color, depth.as_deref_mut())?);
                }
                RenderCommand::DrawIndirect(id, offset) => {
                    let data = self.buffer_bytes(*id, BufferUsage::INDIRECT)?;
                    let data = data.get(*offset as usize..).ok_or(ResourceError::OutOfBounds)?;
                    let args: DrawIndirectArgs = read_pod(data, 0)?;
                    let first = args.first_vertex;
                    let indices: Vec<u32> = (first..first + args.vertex_count).collect();
                    let instances = args.instance_count;
                    draws.push(self.draw(&bindings, &indices, instances, color, depth.as_deref_mut())?);
                }
            }
        }
        Ok(draws)
    }

    fn draw(
        &self,
        bindings: &RenderBindings,
        vertex_indices: &[u32],
        instance_count: u32,
        color: &mut SoftwareTexture,
        depth: Option<&mut SoftwareTexture>,
    ) -> Result<DrawRecord, ResourceError> {
        let pipeline = bindings.pipeline.ok_or_else(|| missing("pipeline"))?;
        let inputs = self.program_inputs(pipeline.program, bindings)?;
        let mut target = RasterTarget {
            width: color.width,
            height: color.height,
            color: &mut color.texels,
            depth: depth.map(|d| d.texels.as_mut_slice()),
        };

        let mut written = 0;
        for _ in 0..instance_count {
            for triangle in vertex_indices.chunks_exact(3) {
                let a = inputs.shade(triangle[0])?;
                let b = inputs.shade(triangle[1])?;
                let c = inputs.shade(triangle[2])?;
                written += target.draw_triangle([a.clip, b.clip, c.clip], a.texel);
            }
        }

        Ok(DrawRecord {
            program: pipeline.program,
            vertex_count: vertex_indices.len() as u32,
            instance_count,
            triangle_offset: (pipeline.program == RenderProgram::TriangleIds)
                .then(|| inputs.view().triangle_offset),
            fragments_written: written,
        })
    }

    fn program_inputs(
        &self,
        program: RenderProgram,
        bindings: &RenderBindings,
    ) -> Result<ProgramInputs<'_>, ResourceError> {
        let view_bytes =
            self.buffer_bytes(self.bound_group(bindings, 0)?.buffer(0)?, BufferUsage::UNIFORM)?;
        let view = ViewState::from_uniform_bytes(view_bytes)?;

        match program {
            RenderProgram::FlatColor => {
                let (vertex_id, offset) = bindings
                    .vertex_buffer
                    .ok_or_else(|| missing("vertex buffer"))?;
                let vertices = self.buffer_bytes(vertex_id, BufferUsage::VERTEX)?;
                let vertices = vertices.get(offset as usize..).ok_or(ResourceError::OutOfBounds)?;
                let object = self.uniform_binding(self.bound_group(bindings, 1)?, 0)?;
                let material = self.uniform_binding(self.bound_group(bindings, 2)?, 0)?;
                ProgramInputs::flat_color(view_bytes, object, material, vertices)
            }
            RenderProgram::IndexedProcedural => {
                let g = self.bound_group(bindings, 1)?;
                Ok(ProgramInputs::IndexedProcedural {
                    view,
                    indices: self.storage_binding(g, 0)?,
                    records: self.storage_binding(g, 1)?,
                    parts: self.storage_binding(g, 2)?,
                })
            }
            RenderProgram::UnpackedProcedural => {
                let g = self.bound_group(bindings, 1)?;
                Ok(ProgramInputs::UnpackedProcedural {
                    view,
                    records: self.storage_binding(g, 0)?,
                    parts: self.storage_binding(g, 1)?,
                })
            }
            RenderProgram::TriangleIds => {
                let g = self.bound_group(bindings, 1)?;
                Ok(ProgramInputs::TriangleIds {
                    view,
                    records: self.storage_binding(g, 0)?,
                    parts: self.storage_binding(g, 1)?,
                })
            }
            RenderProgram::VisibleTriangles => {
                let g = self.bound_group(bindings, 1)?;
                Ok(ProgramInputs::VisibleTriangles {
                    view,
                    records: self.storage_binding(g, 0)?,
                    parts: self.storage_binding(g, 1)?,
                    visible: self.storage_binding(g, 2)?,
                })
            }
        }
    }

    fn bound_group(
        &self,
        bindings: &RenderBindings,
        index: usize,
    ) -> Result<&BindGroupState, ResourceError> {
        let id = bindings.groups[index].ok_or_else(|| missing("bind group"))?;
        self.bind_groups.get(&id).ok_or(ResourceError::NotFound)
    }

    fn uniform_binding(&self, group: &BindGroupState, binding: u32) -> Result<&[u8], ResourceError> {
        self.buffer_bytes(group.buffer(binding)?, BufferUsage::UNIFORM)
    }

    fn storage_binding(&self, group: &BindGroupState, binding: u32) -> Result<&[u8], ResourceError> {
        self.buffer_bytes(group.buffer(binding)?, BufferUsage::STORAGE)
    }

    fn buffer_bytes(&self, id: BufferId, usage: BufferUsage) -> Result<&[u8], ResourceError> {
        let buffer = self.buffers.get(&id).ok_or(ResourceError::NotFound)?;
        if !buffer.usage.contains(usage) {
            return Err(ResourceError::InvalidDescriptor(format!(
                "buffer {id:?} used as {usage:?} without that usage"
            )));
        }
        Ok(&buffer.data)
    }

    // --- Compute passes ---

    fn execute_compute_pass(&mut self, record: ComputePassRecord) -> Result<(), ResourceError> {
        let mut kernel = None;
        let mut groups: [Option<BindGroupId>; MAX_BIND_GROUPS] = Default::default();
        for command in record.commands {
            match command {
                ComputeCommand::SetPipeline(id) => {
                    kernel = Some(*self.compute_pipelines.get(&id).ok_or(ResourceError::NotFound)?);
                }
                ComputeCommand::SetBindGroup(index, id) => {
                    *groups
                        .get_mut(index as usize)
                        .ok_or(ResourceError::OutOfBounds)? = Some(id);
                }
                ComputeCommand::Dispatch(workgroups) => {
                    let kernel = kernel.ok_or_else(|| missing("compute pipeline"))?;
                    let group_id = groups[0].ok_or_else(|| missing("bind group"))?;
                    let group = self
                        .bind_groups
                        .get(&group_id)
                        .cloned()
                        .ok_or(ResourceError::NotFound)?;
                    let max = self.limits.max_compute_workgroups_per_dimension;
                    if workgroups.iter().any(|&n| n > max) {
                        return Err(ResourceError::InvalidDescriptor(format!(
                            "dispatch of {workgroups:?} workgroups exceeds {max} per dimension"
                        )));
                    }
                    let size = kernel.workgroup_size();
                    let invocations = [
                        workgroups[0].saturating_mul(size[0]),
                        workgroups[1].saturating_mul(size[1]),
                    ];
                    self.dispatch(kernel, &group, invocations)?;
                    self.log.push(ExecutedCommand::Dispatch {
                        label: record.label.clone(),
                        kernel,
                        workgroups,
                    });
                }
            }
        }
        Ok(())
    }

    fn dispatch(
        &mut self,
        kernel: ComputeKernel,
        group: &BindGroupState,
        invocations: [u32; 2],
    ) -> Result<(), ResourceError> {
        match kernel {
            ComputeKernel::AccumulateIds => {
                let texture_id = self.view_texture(group.texture_view(0)?)?;
                let flags_id = group.buffer(1)?;
                let mut flags = self.take_storage(flags_id)?;
                let result = match self.textures.get(&texture_id) {
                    Some(texture) if texture.format == TextureFormat::R32Uint => {
                        kernels::accumulate_ids(
                            &texture.texels,
                            texture.width,
                            texture.height,
                            invocations,
                            &mut flags.data,
                        );
                        Ok(())
                    }
                    Some(_) => Err(ResourceError::InvalidHandle),
                    None => Err(ResourceError::NotFound),
                };
                self.buffers.insert(flags_id, flags);
                result
            }
            ComputeKernel::CompactVisible => {
                let (flags_id, visible_id) = (group.buffer(0)?, group.buffer(1)?);
                if flags_id == visible_id {
                    return Err(ResourceError::InvalidHandle);
                }
                let mut flags = self.take_storage(flags_id)?;
                let mut visible = match self.take_storage(visible_id) {
                    Ok(visible) => visible,
                    Err(e) => {
                        self.buffers.insert(flags_id, flags);
                        return Err(e);
                    }
                };
                // Rows of a folded grid continue the same linear index.
                let linear = u64::from(invocations[0]) * u64::from(invocations[1]);
                let result = kernels::compact_visible(linear, &mut flags.data, &mut visible.data);
                self.buffers.insert(flags_id, flags);
                self.buffers.insert(visible_id, visible);
                result
            }
            ComputeKernel::WriteDrawArgs => {
                let (visible_id, args_id) = (group.buffer(0)?, group.buffer(1)?);
                let mut args = self.take_storage(args_id)?;
                let result = match self.buffers.get(&visible_id) {
                    Some(visible) => kernels::write_draw_args(&visible.data, &mut args.data),
                    None => Err(ResourceError::NotFound),
                };
                self.buffers.insert(args_id, args);
                result
            }
        }
    }

    fn take_storage(&mut self, id: BufferId) -> Result<SoftwareBuffer, ResourceError> {
        let buffer = self.buffers.remove(&id).ok_or(ResourceError::NotFound)?;
        if !buffer.usage.contains(BufferUsage::STORAGE) {
            self.buffers.insert(id, buffer);
            return Err(ResourceError::InvalidDescriptor(format!(
                "buffer {id:?} is written by a kernel without STORAGE usage"
            )));
        }
        Ok(buffer)
    }
}

fn check_attachments(
    pipeline: &RenderPipelineState,
    color: &SoftwareTexture,
    depth: Option<&SoftwareTexture>,
) -> Result<(), ResourceError> {
    if pipeline.color_format != color.format {
        return Err(PipelineError::IncompatibleTarget(format!(
            "pipeline writes {:?} but the pass targets {:?}",
            pipeline.color_format, color.format
        ))
        .into());
    }
    if pipeline.depth_format != depth.map(|d| d.format) {
        return Err(PipelineError::IncompatibleTarget(format!(
            "pipeline expects depth {:?} but the pass has {:?}",
            pipeline.depth_format,
            depth.map(|d| d.format)
        ))
        .into());
    }
    Ok(())
}

fn missing(what: &str) -> ResourceError {
    ResourceError::InvalidDescriptor(format!("draw or dispatch without a bound {what}"))
}
