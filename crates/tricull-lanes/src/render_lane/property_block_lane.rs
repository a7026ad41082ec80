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

//! One shared program, with each draw's transform and colour in its own block.

use super::resources::{
    drawable_parts, frame_view_uniforms, GpuMesh, MeshCache, Prepared, ResourceLedger,
    ViewBinding,
};
use super::{frame_pipeline, switch_enabled};
use tricull_core::renderer::{
    BindGroupEntry, BindGroupId, BindGroupLayoutSource, GraphicsDevice, MaterialUniforms,
    ObjectUniforms, RenderPass, RenderPipelineId, RenderProgram,
};
use tricull_core::scene::ModelNode;
use tricull_core::{DrawStrategy, FrameContext, StrategyError, TargetFormats};

/// The per-draw property block: a transform group and a colour group.
struct BlockDraw {
    object: BindGroupId,
    color: BindGroupId,
    mesh: GpuMesh,
}

struct BlockScene {
    pipeline: RenderPipelineId,
    view: ViewBinding,
    draws: Vec<BlockDraw>,
}

/// Draws every part in model order with its own property block.
#[derive(Default)]
pub struct PropertyBlockLane {
    enabled: bool,
    prepared: Option<Prepared<BlockScene>>,
}

impl PropertyBlockLane {
    /// Creates an unprepared, disabled lane.
    pub fn new() -> Self {
        Self::default()
    }

    fn build(
        device: &dyn GraphicsDevice,
        model: &ModelNode,
        targets: &TargetFormats,
        ledger: &mut ResourceLedger,
    ) -> Result<BlockScene, StrategyError> {
        let parts = drawable_parts(model)?;
        let pipeline = frame_pipeline(device, ledger, RenderProgram::FlatColor, targets)?;
        let view = ViewBinding::new(device, ledger, "property block view", pipeline)?;

        let mut meshes = MeshCache::default();
        let mut draws = Vec::with_capacity(parts.len());
        for part in &parts {
            let transform = ledger.uniform(
                device,
                &part.name,
                &ObjectUniforms {
                    model: part.transform.to_cols_array_2d(),
                },
            )?;
            let color = ledger.uniform(
                device,
                &part.name,
                &MaterialUniforms {
                    color: part.color.to_array(),
                },
            )?;
            draws.push(BlockDraw {
                object: ledger.create_bind_group(
                    device,
                    &part.name,
                    BindGroupLayoutSource::Render(pipeline, 1),
                    &[BindGroupEntry::buffer(0, transform)],
                )?,
                color: ledger.create_bind_group(
                    device,
                    &part.name,
                    BindGroupLayoutSource::Render(pipeline, 2),
                    &[BindGroupEntry::buffer(0, color)],
                )?,
                mesh: meshes.upload(device, ledger, &part.mesh)?,
            });
        }

        log::info!(
            "PropertyBlock: prepared {} parts ({} triangles)",
            draws.len(),
            model.triangle_count()
        );
        Ok(BlockScene {
            pipeline,
            view,
            draws,
        })
    }
}

impl DrawStrategy for PropertyBlockLane {
    fn strategy_name(&self) -> &'static str {
        "PropertyBlock"
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
        for draw in &prepared.draws {
            pass.set_bind_group(1, draw.object);
            pass.set_bind_group(2, draw.color);
            draw.mesh.draw(pass);
        }
        Ok(())
    }

    fn dispose(&mut self, device: &dyn GraphicsDevice) {
        if self.enabled {
            log::warn!("PropertyBlock: disposed while enabled, disabling first");
            self.enabled = false;
        }
        if let Some(prepared) = self.prepared.take() {
            prepared.ledger.release(device);
            log::debug!("PropertyBlock: disposed");
        }
    }
}
