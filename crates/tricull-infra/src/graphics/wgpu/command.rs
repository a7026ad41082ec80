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

use std::ops::Range;

use tricull_core::renderer::api::{
    BindGroupId, BufferId, CommandBufferId, ComputePassDescriptor, ComputePipelineId, IndexFormat,
    RenderPassDescriptor, RenderPipelineId,
};
use tricull_core::renderer::traits::{CommandEncoder, ComputePass, RenderPass};

use super::conversions::IntoWgpu;
use super::device::WgpuDevice;

pub struct WgpuRenderPass<'a> {
    pub(crate) pass: wgpu::RenderPass<'a>,
    pub(crate) device: &'a WgpuDevice,
}

impl RenderPass for WgpuRenderPass<'_> {
    fn set_pipeline(&mut self, pipeline_id: RenderPipelineId) {
        if let Some(pipeline) = self.device.get_wgpu_render_pipeline(pipeline_id) {
            self.pass.set_pipeline(&pipeline);
        } else {
            log::warn!("WgpuRenderPass: RenderPipelineId {pipeline_id:?} not found.");
        }
    }

    fn set_bind_group(&mut self, index: u32, bind_group_id: BindGroupId) {
        if let Some(bind_group) = self.device.get_wgpu_bind_group(bind_group_id) {
            self.pass.set_bind_group(index, bind_group.as_ref(), &[]);
        } else {
            log::warn!("WgpuRenderPass: BindGroupId {bind_group_id:?} not found.");
        }
    }

    fn set_vertex_buffer(&mut self, slot: u32, buffer_id: BufferId, offset: u64) {
        if let Some(buffer) = self.device.get_wgpu_buffer(buffer_id) {
            self.pass.set_vertex_buffer(slot, buffer.slice(offset..));
        } else {
            log::warn!("WgpuRenderPass: Vertex BufferId {buffer_id:?} not found.");
        }
    }

    fn set_index_buffer(&mut self, buffer_id: BufferId, offset: u64, index_format: IndexFormat) {
        if let Some(buffer) = self.device.get_wgpu_buffer(buffer_id) {
            self.pass
                .set_index_buffer(buffer.slice(offset..), index_format.into_wgpu());
        } else {
            log::warn!("WgpuRenderPass: Index BufferId {buffer_id:?} not found.");
        }
    }

    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>) {
        self.pass.draw(vertices, instances);
    }

    fn draw_indexed(&mut self, indices: Range<u32>, base_vertex: i32, instances: Range<u32>) {
        self.pass.draw_indexed(indices, base_vertex, instances);
    }

    fn draw_indirect(&mut self, buffer_id: BufferId, offset: u64) {
        if let Some(buffer) = self.device.get_wgpu_buffer(buffer_id) {
            self.pass.draw_indirect(&buffer, offset);
        } else {
            log::warn!("WgpuRenderPass: Indirect BufferId {buffer_id:?} not found.");
        }
    }
}

/// Stands in for a pass whose attachments could not be resolved. The owning
/// encoder is already marked invalid, so recorded commands are dropped.
struct DiscardedRenderPass;

impl RenderPass for DiscardedRenderPass {
    fn set_pipeline(&mut self, _pipeline: RenderPipelineId) {}
    fn set_bind_group(&mut self, _index: u32, _bind_group: BindGroupId) {}
    fn set_vertex_buffer(&mut self, _slot: u32, _buffer: BufferId, _offset: u64) {}
    fn set_index_buffer(&mut self, _buffer: BufferId, _offset: u64, _format: IndexFormat) {}
    fn draw(&mut self, _vertices: Range<u32>, _instances: Range<u32>) {}
    fn draw_indexed(&mut self, _indices: Range<u32>, _base_vertex: i32, _instances: Range<u32>) {}
    fn draw_indirect(&mut self, _buffer: BufferId, _offset: u64) {}
}

pub struct WgpuComputePass<'a> {
    pub(crate) pass: wgpu::ComputePass<'a>,
    pub(crate) device: &'a WgpuDevice,
}

impl ComputePass for WgpuComputePass<'_> {
    fn set_pipeline(&mut self, pipeline_id: ComputePipelineId) {
        if let Some(pipeline) = self.device.get_wgpu_compute_pipeline(pipeline_id) {
            self.pass.set_pipeline(&pipeline);
        } else {
            log::warn!("WgpuComputePass: ComputePipelineId {pipeline_id:?} not found.");
        }
    }

    fn set_bind_group(&mut self, index: u32, bind_group_id: BindGroupId) {
        if let Some(bind_group) = self.device.get_wgpu_bind_group(bind_group_id) {
            self.pass.set_bind_group(index, bind_group.as_ref(), &[]);
        } else {
            log::warn!("WgpuComputePass: BindGroupId {bind_group_id:?} not found.");
        }
    }

    fn dispatch_workgroups(&mut self, x: u32, y: u32, z: u32) {
        self.pass.dispatch_workgroups(x, y, z);
    }
}

pub struct WgpuCommandEncoder {
    encoder: wgpu::CommandEncoder,
    device: WgpuDevice,
    /// Set when a recorded command referenced a missing resource.
    invalid: Option<String>,
}

impl WgpuCommandEncoder {
    pub(crate) fn new(encoder: wgpu::CommandEncoder, device: WgpuDevice) -> Self {
        Self {
            encoder,
            device,
            invalid: None,
        }
    }

    fn invalidate(&mut self, reason: String) {
        log::error!("WgpuCommandEncoder: {reason}");
        self.invalid.get_or_insert(reason);
    }
}

impl CommandEncoder for WgpuCommandEncoder {
    fn begin_render_pass<'encoder>(
        &'encoder mut self,
        descriptor: &RenderPassDescriptor<'_>,
    ) -> Box<dyn RenderPass + 'encoder> {
        let color = &descriptor.color_attachment;
        let Some(color_view) = self.device.get_wgpu_texture_view(color.view) else {
            self.invalidate(format!("color attachment {:?} not found", color.view));
            return Box::new(DiscardedRenderPass);
        };
        let depth = match &descriptor.depth_stencil_attachment {
            Some(ds) => match self.device.get_wgpu_texture_view(ds.view) {
                Some(view) => Some((view, ds.depth_ops)),
                None => {
                    self.invalidate(format!("depth attachment {:?} not found", ds.view));
                    return Box::new(DiscardedRenderPass);
                }
            },
            None => None,
        };

        let color_attachments = [Some(wgpu::RenderPassColorAttachment {
            view: &color_view,
            depth_slice: None,
            resolve_target: None,
            ops: wgpu::Operations {
                load: color.ops.load.into_wgpu(),
                store: color.ops.store.into_wgpu(),
            },
        })];
        let depth_stencil_attachment =
            depth
                .as_ref()
                .map(|(view, ops)| wgpu::RenderPassDepthStencilAttachment {
                    view: view.as_ref(),
                    depth_ops: Some(wgpu::Operations {
                        load: ops.load.into_wgpu(),
                        store: ops.store.into_wgpu(),
                    }),
                    stencil_ops: None,
                });

        let pass = self
            .encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: descriptor.label.as_deref(),
                color_attachments: &color_attachments,
                depth_stencil_attachment,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

        Box::new(WgpuRenderPass {
            pass,
            device: &self.device,
        })
    }

    fn begin_compute_pass<'encoder>(
        &'encoder mut self,
        descriptor: &ComputePassDescriptor<'_>,
    ) -> Box<dyn ComputePass + 'encoder> {
        let pass = self
            .encoder
            .begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: descriptor.label.as_deref(),
                timestamp_writes: None,
            });

        Box::new(WgpuComputePass {
            pass,
            device: &self.device,
        })
    }

    fn clear_buffer(&mut self, buffer: BufferId, offset: u64, size: Option<u64>) {
        match self.device.get_wgpu_buffer(buffer) {
            Some(wgpu_buffer) => self.encoder.clear_buffer(&wgpu_buffer, offset, size),
            None => self.invalidate(format!("cleared buffer {buffer:?} not found")),
        }
    }

    fn copy_buffer_to_buffer(
        &mut self,
        source: BufferId,
        source_offset: u64,
        destination: BufferId,
        destination_offset: u64,
        size: u64,
    ) {
        if let (Some(source_buffer), Some(destination_buffer)) = (
            self.device.get_wgpu_buffer(source),
            self.device.get_wgpu_buffer(destination),
        ) {
            self.encoder.copy_buffer_to_buffer(
                &source_buffer,
                source_offset,
                &destination_buffer,
                destination_offset,
                size,
            );
        } else {
            self.invalidate(format!("copy between {source:?} and {destination:?} failed"));
        }
    }

    fn finish(self: Box<Self>) -> CommandBufferId {
        let WgpuCommandEncoder {
            encoder,
            device,
            invalid,
        } = *self;
        // Pass errors, such as an oversized dispatch, surface when the encoder finishes.
        let buffer = match invalid {
            Some(reason) => Err(reason),
            None => device
                .validated(|_| encoder.finish())
                .inspect_err(|e| log::error!("WgpuCommandEncoder: command buffer rejected: {e}")),
        };
        device.register_command_buffer(buffer)
    }
}
