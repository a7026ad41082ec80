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

//! Draws every part through vertex buffers, sharing one material per colour.
//!
//! Parts with the same colour share a material bind group and are drawn back
//! to back, so the material only changes once per distinct colour.

use super::resources::{
    drawable_parts, frame_view_uniforms, GpuMesh, MeshCache, Prepared, ResourceLedger,
    ViewBinding,
};
use super::{frame_pipeline, switch_enabled};
use ahash::AHashMap;
use tricull_core::renderer::{
    BindGroupEntry, BindGroupId, BindGroupLayoutSource, GraphicsDevice, MaterialUniforms,
    ObjectUniforms, RenderPass, RenderPipelineId, RenderProgram,
};
use tricull_core::scene::ModelNode;
use tricull_core::{DrawStrategy, FrameContext, StrategyError, TargetFormats};

struct PartDraw {
    object: BindGroupId,
    mesh: GpuMesh,
}

struct MaterialBatch {
    material: BindGroupId,
    draws: Vec<PartDraw>,
}

struct BatchScene {
    pipeline: RenderPipelineId,
    view: ViewBinding,
    batches: Vec<MaterialBatch>,
}

/// Scene-graph style rendering with materials deduplicated by colour.
#[derive(Default)]
pub struct MaterialBatchLane {
    enabled: bool,
    prepared: Option<Prepared<BatchScene>>,
}

impl MaterialBatchLane {
    /// Creates an unprepared, disabled lane.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct materials, once prepared.
    pub fn material_count(&self) -> usize {
        self.prepared.as_ref().map_or(0, |p| p.scene.batches.len())
    }

    fn build(
        device: &dyn GraphicsDevice,
        model: &ModelNode,
        targets: &TargetFormats,
        ledger: &mut ResourceLedger,
    ) -> Result<BatchScene, StrategyError> {
        let parts = drawable_parts(model)?;
        let pipeline = frame_pipeline(device, ledger, RenderProgram::FlatColor, targets)?;
        let view = ViewBinding::new(device, ledger, "material batch view", pipeline)?;

        let mut meshes = MeshCache::default();
        let mut batch_of_color: AHashMap<[u32; 4], usize> = AHashMap::new();
        let mut batches: Vec<MaterialBatch> = Vec::new();
        for part in &parts {
            let key = part.color.to_array().map(f32::to_bits);
            let batch = match batch_of_color.get(&key) {
                Some(&index) => index,
                None => {
                    let uniforms = ledger.uniform(
                        device,
                        "material",
                        &MaterialUniforms {
                            color: part.color.to_array(),
                        },
                    )?;
                    let material = ledger.create_bind_group(
                        device,
                        "material",
                        BindGroupLayoutSource::Render(pipeline, 2),
                        &[BindGroupEntry::buffer(0, uniforms)],
                    )?;
                    batches.push(MaterialBatch {
                        material,
                        draws: Vec::new(),
                    });
                    batch_of_color.insert(key, batches.len() - 1);
                    batches.len() - 1
                }
            };

            let object_uniforms = ledger.uniform(
                device,
                &part.name,
                &ObjectUniforms {
                    model: part.transform.to_cols_array_2d(),
                },
            )?;
            let object = ledger.create_bind_group(
                device,
                &part.name,
                BindGroupLayoutSource::Render(pipeline, 1),
                &[BindGroupEntry::buffer(0, object_uniforms)],
            )?;
            let mesh = meshes.upload(device, ledger, &part.mesh)?;
            batches[batch].draws.push(PartDraw { object, mesh });
        }

        log::info!(
            "MaterialBatch: prepared {} parts ({} triangles, {} meshes) into {} materials",
            parts.len(),
            model.triangle_count(),
            meshes.len(),
            batches.len()
        );
        Ok(BatchScene {
            pipeline,
            view,
            batches,
        })
    }
}

impl DrawStrategy for MaterialBatchLane {
    fn strategy_name(&self) -> &'static str {
        "MaterialBatch"
    }

    fn prepare(
        &mut self,
        device: &dyn GraphicsDevice,
        model: &ModelNode,
        targets: &TargetFormats,
    ) -> Result<(), StrategyError> {
        if self.prepared.is_some() {
            return Err(StrategyError::AlreadyPrepared);
        }
        let prepared = Prepared::build(device, |ledger| {
            Self::build(device, model, targets, ledger)
        })?;
        self.prepared = Some(prepared);
        Ok(())
    }

    fn set_enabled(&mut self, enabled: bool) {
        switch_enabled(self.strategy_name(), &mut self.enabled, enabled);
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn render(
        &mut self,
        ctx: &FrameContext<'_>,
        pass: &mut dyn RenderPass,
    ) -> Result<(), StrategyError> {
        if !self.enabled {
            return Ok(());
        }
        let prepared = &self.prepared.as_ref().ok_or(StrategyError::NotPrepared)?.scene;
        prepared.view.write(ctx.device, &frame_view_uniforms(ctx.view)?)?;

        pass.set_pipeline(prepared.pipeline);
        pass.set_bind_group(0, prepared.view.bind_group);
        for batch in &prepared.batches {
            pass.set_bind_group(2, batch.material);
            for draw in &batch.draws {
                pass.set_bind_group(1, draw.object);
                draw.mesh.draw(pass);
            }
        }
        Ok(())
    }

    fn dispose(&mut self, device: &dyn GraphicsDevice) {
        if self.enabled {
            log::warn!("MaterialBatch: disposed while enabled, disabling first");
            self.enabled = false;
        }
        if let Some(prepared) = self.prepared.take() {
            prepared.ledger.release(device);
            log::debug!("MaterialBatch: disposed");
        }
    }
}
