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
use std::sync::{Arc, Mutex};

use tricull_core::renderer::api::{
    BindGroupId, BufferId, CommandBufferId, ComputePassDescriptor, ComputePipelineId,
    IndexFormat, RenderPassColorAttachment, RenderPassDepthStencilAttachment,
    RenderPassDescriptor, RenderPipelineId,
};
use tricull_core::renderer::traits::{CommandEncoder, ComputePass, RenderPass};

use super::device::SoftwareState;

#[derive(Debug, Clone)]
pub(crate) enum RenderCommand {
    SetPipeline(RenderPipelineId),
    SetBindGroup(u32, BindGroupId),
    SetVertexBuffer(u32, BufferId, u64),
    SetIndexBuffer(BufferId, u64, IndexFormat),
    Draw {
        vertices: Range<u32>,
        instances: Range<u32>,
    },
    DrawIndexed {
        indices: Range<u32>,
        base_vertex: i32,
        instances: Range<u32>,
    },
    DrawIndirect(BufferId, u64),
}

#[derive(Debug, Clone)]
pub(crate) enum ComputeCommand {
    SetPipeline(ComputePipelineId),
    SetBindGroup(u32, BindGroupId),
    Dispatch([u32; 3]),
}

#[derive(Debug, Clone)]
pub(crate) struct RenderPassRecord {
    pub(crate) label: Option<String>,
    pub(crate) color: RenderPassColorAttachment,
    pub(crate) depth: Option<RenderPassDepthStencilAttachment>,
    pub(crate) commands: Vec<RenderCommand>,
}

#[derive(Debug, Clone)]
pub(crate) struct ComputePassRecord {
    pub(crate) label: Option<String>,
    pub(crate) commands: Vec<ComputeCommand>,
}

#[derive(Debug, Clone)]
pub(crate) enum Command {
    Render(RenderPassRecord),
    Compute(ComputePassRecord),
    ClearBuffer {
        buffer: BufferId,
        offset: u64,
        size: Option<u64>,
    },
    CopyBuffer {
        source: BufferId,
        source_offset: u64,
        destination: BufferId,
        destination_offset: u64,
        size: u64,
    },
}

/// Render pass that appends its record to the encoder when dropped.
pub struct SoftwareRenderPass<'a> {
    sink: &'a mut Vec<Command>,
    record: Option<RenderPassRecord>,
}

impl SoftwareRenderPass<'_> {
    fn push(&mut self, command: RenderCommand) {
        if let Some(record) = self.record.as_mut() {
            record.commands.push(command);
        }
    }
}

impl Drop for SoftwareRenderPass<'_> {
    fn drop(&mut self) {
        if let Some(record) = self.record.take() {
            self.sink.push(Command::Render(record));
        }
    }
}

impl RenderPass for SoftwareRenderPass<'_> {
    fn set_pipeline(&mut self, pipeline: RenderPipelineId) {
        self.push(RenderCommand::SetPipeline(pipeline));
    }

    fn set_bind_group(&mut self, index: u32, bind_group: BindGroupId) {
        self.push(RenderCommand::SetBindGroup(index, bind_group));
    }

    fn set_vertex_buffer(&mut self, slot: u32, buffer: BufferId, offset: u64) {
        self.push(RenderCommand::SetVertexBuffer(slot, buffer, offset));
    }

    fn set_index_buffer(&mut self, buffer: BufferId, offset: u64, format: IndexFormat) {
        self.push(RenderCommand::SetIndexBuffer(buffer, offset, format));
    }

    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>) {
        self.push(RenderCommand::Draw {
            vertices,
            instances,
        });
    }

    fn draw_indexed(&mut self, indices: Range<u32>, base_vertex: i32, instances: Range<u32>) {
        self.push(RenderCommand::DrawIndexed {
            indices,
            base_vertex,
            instances,
        });
    }

    fn draw_indirect(&mut self, buffer: BufferId, offset: u64) {
        self.push(RenderCommand::DrawIndirect(buffer, offset));
    }
}

/// Compute pass that appends its record to the encoder when dropped.
pub struct SoftwareComputePass<'a> {
    sink: &'a mut Vec<Command>,
    record: Option<ComputePassRecord>,
}

impl SoftwareComputePass<'_> {
    fn push(&mut self, command: ComputeCommand) {
        if let Some(record) = self.record.as_mut() {
            record.commands.push(command);
        }
    }
}

impl Drop for SoftwareComputePass<'_> {
    fn drop(&mut self) {
        if let Some(record) = self.record.take() {
            self.sink.push(Command::Compute(record));
        }
    }
}

impl ComputePass for SoftwareComputePass<'_> {
    fn set_pipeline(&mut self, pipeline: ComputePipelineId) {
        self.push(ComputeCommand::SetPipeline(pipeline));
    }

    fn set_bind_group(&mut self, index: u32, bind_group: BindGroupId) {
        self.push(ComputeCommand::SetBindGroup(index, bind_group));
    }

    fn dispatch_workgroups(&mut self, x: u32, y: u32, z: u32) {
        self.push(ComputeCommand::Dispatch([x, y, z]));
    }
}

/// Records commands until `finish` hands them to the device.
pub struct SoftwareCommandEncoder {
    pub(crate) label: Option<String>,
    pub(crate) commands: Vec<Command>,
    pub(crate) state: Arc<Mutex<SoftwareState>>,
}

impl CommandEncoder for SoftwareCommandEncoder {
    fn begin_render_pass<'encoder>(
        &'encoder mut self,
        descriptor: &RenderPassDescriptor<'_>,
    ) -> Box<dyn RenderPass + 'encoder> {
        Box::new(SoftwareRenderPass {
            sink: &mut self.commands,
            record: Some(RenderPassRecord {
                label: descriptor.label.as_deref().map(str::to_owned),
                color: descriptor.color_attachment.clone(),
                depth: descriptor.depth_stencil_attachment.clone(),
                commands: Vec::new(),
            }),
        })
    }

    fn begin_compute_pass<'encoder>(
        &'encoder mut self,
        descriptor: &ComputePassDescriptor<'_>,
    ) -> Box<dyn ComputePass + 'encoder> {
        Box::new(SoftwareComputePass {
            sink: &mut self.commands,
            record: Some(ComputePassRecord {
                label: descriptor.label.as_deref().map(str::to_owned),
                commands: Vec::new(),
            }),
        })
    }

    fn clear_buffer(&mut self, buffer: BufferId, offset: u64, size: Option<u64>) {
        self.commands.push(Command::ClearBuffer {
            buffer,
            offset,
            size,
        });
    }

    fn copy_buffer_to_buffer(
        &mut self,
        source: BufferId,
        source_offset: u64,
        destination: BufferId,
        destination_offset: u64,
        size: u64,
    ) {
        self.commands.push(Command::CopyBuffer {
            source,
            source_offset,
            destination,
            destination_offset,
            size,
        });
    }

    fn finish(self: Box<Self>) -> CommandBufferId {
        let this = *self;
        let id = match this.state.lock() {
            Ok(mut state) => state.register_command_buffer(this.label, this.commands),
            Err(poisoned) => poisoned
                .into_inner()
                .register_command_buffer(this.label, this.commands),
        };
        id
    }
}
