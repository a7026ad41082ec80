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

//! GPU resource plumbing shared by every strategy lane.

use ahash::AHashMap;
use bytemuck::Pod;
use std::sync::Arc;
use tricull_core::renderer::{
    BindGroupDescriptor, BindGroupEntry, BindGroupId, BindGroupLayoutSource, BufferDescriptor,
    BufferId, BufferUsage, ComputePipelineId, GraphicsDevice, IndexFormat, MeshVertex,
    RenderPass, RenderPipelineId, ResourceError, TextureId, TextureViewId, ViewUniforms,
};
use tricull_core::scene::{Mesh, ModelNode, RenderablePart};
use tricull_core::{FrameView, StrategyError};

/// Every resource a lane created, released together on dispose.
///
/// Lanes register resources as they create them, so a `prepare` failing
/// halfway can release whatever was already allocated.
#[derive(Debug, Default)]
pub(crate) struct ResourceLedger {
    buffers: Vec<BufferId>,
    textures: Vec<TextureId>,
    views: Vec<TextureViewId>,
    bind_groups: Vec<BindGroupId>,
    render_pipelines: Vec<RenderPipelineId>,
    compute_pipelines: Vec<ComputePipelineId>,
}

impl ResourceLedger {
    pub(crate) fn buffer(&mut self, id: BufferId) -> BufferId {
        self.buffers.push(id);
        id
    }

    pub(crate) fn texture(&mut self, id: TextureId) -> TextureId {
        self.textures.push(id);
        id
    }

    pub(crate) fn view(&mut self, id: TextureViewId) -> TextureViewId {
        self.views.push(id);
        id
    }

    pub(crate) fn bind_group(&mut self, id: BindGroupId) -> BindGroupId {
        self.bind_groups.push(id);
        id
    }

    pub(crate) fn render_pipeline(&mut self, id: RenderPipelineId) -> RenderPipelineId {
        self.render_pipelines.push(id);
        id
    }

    pub(crate) fn compute_pipeline(&mut self, id: ComputePipelineId) -> ComputePipelineId {
        self.compute_pipelines.push(id);
        id
    }

    pub(crate) fn uniform<T: Pod>(
        &mut self,
        device: &dyn GraphicsDevice,
        label: &str,
        value: &T,
    ) -> Result<BufferId, ResourceError> {
        let bytes = bytemuck::bytes_of(value);
        let id = device.create_buffer_with_data(
            &BufferDescriptor {
                label: Some(label.into()),
                size: bytes.len() as u64,
                usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
            },
            bytes,
        )?;
        Ok(self.buffer(id))
    }

    pub(crate) fn storage<T: Pod>(
        &mut self,
        device: &dyn GraphicsDevice,
        label: &str,
        data: &[T],
    ) -> Result<BufferId, ResourceError> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let id = device.create_buffer_with_data(
            &BufferDescriptor {
                label: Some(label.into()),
                size: bytes.len() as u64,
                usage: BufferUsage::STORAGE | BufferUsage::COPY_SRC,
            },
            bytes,
        )?;
        Ok(self.buffer(id))
    }

    pub(crate) fn create_bind_group(
        &mut self,
        device: &dyn GraphicsDevice,
        label: &str,
        layout: BindGroupLayoutSource,
        entries: &[BindGroupEntry],
    ) -> Result<BindGroupId, ResourceError> {
        let id = device.create_bind_group(&BindGroupDescriptor {
            label: Some(label.into()),
            layout,
            entries,
        })?;
        Ok(self.bind_group(id))
    }

    /// Destroys everything, dependents first. Failures are logged, not returned.
    pub(crate) fn release(self, device: &dyn GraphicsDevice) {
        fn report(what: &str, result: Result<(), ResourceError>) {
            if let Err(e) = result {
                log::warn!("Failed to release {what}: {e}");
            }
        }
        for id in self.bind_groups {
            report("bind group", device.destroy_bind_group(id));
        }
        for id in self.render_pipelines {
            report("render pipeline", device.destroy_render_pipeline(id));
        }
        for id in self.compute_pipelines {
            report("compute pipeline", device.destroy_compute_pipeline(id));
        }
        for id in self.views {
            report("texture view", device.destroy_texture_view(id));
        }
        for id in self.textures {
            report("texture", device.destroy_texture(id));
        }
        for id in self.buffers {
            report("buffer", device.destroy_buffer(id));
        }
    }
}

/// A lane's prepared state together with the resources backing it.
pub(crate) struct Prepared<S> {
    pub(crate) ledger: ResourceLedger,
    pub(crate) scene: S,
}

impl<S> Prepared<S> {
    /// Runs `build` against a fresh ledger, releasing it again if `build` fails.
    pub(crate) fn build(
        device: &dyn GraphicsDevice,
        build: impl FnOnce(&mut ResourceLedger) -> Result<S, StrategyError>,
    ) -> Result<Self, StrategyError> {
        let mut ledger = ResourceLedger::default();
        match build(&mut ledger) {
            Ok(scene) => Ok(Self { ledger, scene }),
            Err(e) => {
                ledger.release(device);
                Err(e)
            }
        }
    }
}

/// View uniforms and the group-0 bind group exposing them to one pipeline.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ViewBinding {
    pub(crate) buffer: BufferId,
    pub(crate) bind_group: BindGroupId,
}

impl ViewBinding {
    pub(crate) fn new(
        device: &dyn GraphicsDevice,
        ledger: &mut ResourceLedger,
        label: &str,
        pipeline: RenderPipelineId,
    ) -> Result<Self, ResourceError> {
        let zeroed: ViewUniforms = bytemuck::Zeroable::zeroed();
        let buffer = ledger.uniform(device, label, &zeroed)?;
        let bind_group = ledger.create_bind_group(
            device,
            label,
            BindGroupLayoutSource::Render(pipeline, 0),
            &[BindGroupEntry::buffer(0, buffer)],
        )?;
        Ok(Self { buffer, bind_group })
    }

    pub(crate) fn write(
        &self,
        device: &dyn GraphicsDevice,
        uniforms: &ViewUniforms,
    ) -> Result<(), ResourceError> {
        device.write_buffer(self.buffer, 0, bytemuck::bytes_of(uniforms))
    }
}

/// The main view of a frame as uniforms.
pub(crate) fn frame_view_uniforms(view: &FrameView) -> Result<ViewUniforms, StrategyError> {
    let view_proj = view
        .camera
        .view_projection()
        .ok_or(StrategyError::InvalidCamera)?;
    Ok(ViewUniforms::new(&view_proj, &view.root_transform))
}

/// Flattens the model and drops parts without triangles.
pub(crate) fn drawable_parts(model: &ModelNode) -> Result<Vec<RenderablePart>, StrategyError> {
    let parts: Vec<_> = model
        .renderable_parts()
        .into_iter()
        .filter(|p| p.mesh.triangle_count() > 0)
        .collect();
    if parts.is_empty() {
        return Err(StrategyError::InvalidModel(format!(
            "'{}' has no triangles to draw",
            model.name
        )));
    }
    Ok(parts)
}

/// Vertex and index buffers of one mesh.
#[derive(Debug, Clone, Copy)]
pub(crate) struct GpuMesh {
    vertex_buffer: BufferId,
    index_buffer: BufferId,
    index_count: u32,
}

impl GpuMesh {
    pub(crate) fn draw(&self, pass: &mut dyn RenderPass) {
        pass.set_vertex_buffer(0, self.vertex_buffer, 0);
        pass.set_index_buffer(self.index_buffer, 0, IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

/// Uploads each distinct mesh once, however many parts share it.
#[derive(Default)]
pub(crate) struct MeshCache {
    uploaded: AHashMap<*const Mesh, GpuMesh>,
}

impl MeshCache {
    pub(crate) fn upload(
        &mut self,
        device: &dyn GraphicsDevice,
        ledger: &mut ResourceLedger,
        mesh: &Arc<Mesh>,
    ) -> Result<GpuMesh, ResourceError> {
        let key = Arc::as_ptr(mesh);
        if let Some(gpu) = self.uploaded.get(&key) {
            return Ok(*gpu);
        }
        let vertices: Vec<MeshVertex> = mesh
            .positions()
            .iter()
            .zip(mesh.normals())
            .map(|(p, n)| MeshVertex {
                position: p.to_array(),
                normal: n.to_array(),
            })
            .collect();
        let vertex_bytes: &[u8] = bytemuck::cast_slice(&vertices);
        let vertex_buffer = ledger.buffer(device.create_buffer_with_data(
            &BufferDescriptor {
                label: Some("mesh vertices".into()),
                size: vertex_bytes.len() as u64,
                usage: BufferUsage::VERTEX,
            },
            vertex_bytes,
        )?);
        let index_bytes: &[u8] = bytemuck::cast_slice(mesh.indices());
        let index_buffer = ledger.buffer(device.create_buffer_with_data(
            &BufferDescriptor {
                label: Some("mesh indices".into()),
                size: index_bytes.len() as u64,
                usage: BufferUsage::INDEX,
            },
            index_bytes,
        )?);
        let gpu = GpuMesh {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices().len() as u32,
        };
        self.uploaded.insert(key, gpu);
        Ok(gpu)
    }

    pub(crate) fn len(&self) -> usize {
        self.uploaded.len()
    }
}
