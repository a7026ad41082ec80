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

//! Procedural draws: no vertex buffers, the vertex program reads storage buffers.

use super::resources::{
    drawable_parts, frame_view_uniforms, Prepared, ResourceLedger, ViewBinding,
};
use super::{frame_pipeline, switch_enabled};
use crate::import_lane::StructuredBufferImporter;
use tricull_core::renderer::{
    BindGroupEntry, BindGroupId, BindGroupLayoutSource, GraphicsDevice, PartAttributes,
    RenderPass, RenderPipelineId, RenderProgram,
};
use tricull_core::scene::ModelNode;
use tricull_core::{DrawStrategy, FrameContext, StrategyError, TargetFormats};

/// How each part's mesh is laid out in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProceduralLayout {
    /// Index buffer plus one record per vertex; vertex `i` reads `records[indices[i]]`.
    Indexed,
    /// Three records per triangle; vertex `i` reads `records[i]`.
    Unpacked,
}

impl ProceduralLayout {
    fn program(self) -> RenderProgram {
        match self {
            ProceduralLayout::Indexed => RenderProgram::IndexedProcedural,
            ProceduralLayout::Unpacked => RenderProgram::UnpackedProcedural,
        }
    }
}

struct ProceduralDraw {
    bind_group: BindGroupId,
    vertex_count: u32,
}

struct ProceduralScene {
    pipeline: RenderPipelineId,
    view: ViewBinding,
    draws: Vec<ProceduralDraw>,
}

/// One procedural draw per part, each from the part's own imported buffers.
pub struct ProceduralLane {
    layout: ProceduralLayout,
    enabled: bool,
    prepared: Option<Prepared<ProceduralScene>>,
}

impl ProceduralLane {
    /// Creates an unprepared, disabled lane.
    pub fn new(layout: ProceduralLayout) -> Self {
        Self {
            layout,
            enabled: false,
            prepared: None,
        }
    }

    /// The storage layout this lane draws from.
    pub fn layout(&self) -> ProceduralLayout {
        self.layout
    }

    fn build(
        &self,
        device: &dyn GraphicsDevice,
        model: &ModelNode,
        targets: &TargetFormats,
        ledger: &mut ResourceLedger,
    ) -> Result<ProceduralScene, StrategyError> {
        let parts = drawable_parts(model)?;
        let pipeline = frame_pipeline(device, ledger, self.layout.program(), targets)?;
        let view = ViewBinding::new(device, ledger, "procedural view", pipeline)?;
        let importer = StructuredBufferImporter::new(device);

        let mut draws = Vec::with_capacity(parts.len());
        for part in &parts {
            // Records are tagged with part 0, so each part gets a one-entry table.
            let attributes = ledger.storage(
                device,
                &part.name,
                &[PartAttributes::new(&part.transform, part.color)],
            )?;
            let layout = BindGroupLayoutSource::Render(pipeline, 1);
            let draw = match self.layout {
                ProceduralLayout::Indexed => {
                    let import = importer.import(&part.mesh)?;
                    ledger.buffer(import.index_buffer);
                    ledger.buffer(import.attribute_buffer);
                    ProceduralDraw {
                        bind_group: ledger.create_bind_group(
                            device,
                            &part.name,
                            layout,
                            &[
                                BindGroupEntry::buffer(0, import.index_buffer),
                                BindGroupEntry::buffer(1, import.attribute_buffer),
                                BindGroupEntry::buffer(2, attributes),
                            ],
                        )?,
                        vertex_count: import.index_count,
                    }
                }
                ProceduralLayout::Unpacked => {
                    let import = importer.import_and_unpack(&part.mesh)?;
                    ledger.buffer(import.attribute_buffer);
                    ProceduralDraw {
                        bind_group: ledger.create_bind_group(
                            device,
                            &part.name,
                            layout,
                            &[
                                BindGroupEntry::buffer(0, import.attribute_buffer),
                                BindGroupEntry::buffer(1, attributes),
                            ],
                        )?,
                        vertex_count: import.vertex_count,
                    }
                }
            };
            draws.push(draw);
        }

        log::info!(
            "{}: prepared {} parts ({} triangles)",
            self.strategy_name(),
            draws.len(),
            model.triangle_count()
        );
        Ok(ProceduralScene {
            pipeline,
            view,
            draws,
        })
    }
}

impl DrawStrategy for ProceduralLane {
    fn strategy_name(&self) -> &'static str {
        match self.layout {
            ProceduralLayout::Indexed => "IndexedProcedural",
            ProceduralLayout::Unpacked => "UnpackedProcedural",
        }
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
        let prepared = Prepared::build(device, |ledger| self.build(device, model, targets, ledger))?;
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
            pass.set_bind_group(1, draw.bind_group);
            pass.draw(0..draw.vertex_count, 0..1);
        }
        Ok(())
    }

    fn dispose(&mut self, device: &dyn GraphicsDevice) {
        if self.enabled {
            log::warn!("{}: disposed while enabled, disabling first", self.strategy_name());
            self.enabled = false;
        }
        if let Some(prepared) = self.prepared.take() {
            prepared.ledger.release(device);
            log::debug!("{}: disposed", self.strategy_name());
        }
    }
}
