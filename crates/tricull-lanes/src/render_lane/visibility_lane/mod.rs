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

//! GPU visible-triangle determination.
//!
//! The lane finds which triangles of the model are visible from a slightly
//! widened copy of the main camera, then draws only those.
//!
//! 1. **ID pass.** Every triangle is rasterised into an `R32Uint` target with
//!    its global index as the colour. The depth test keeps the nearest
//!    surface, so each texel ends up holding the id of the visible triangle,
//!    or the sentinel if nothing covers it. The work is spread over several
//!    frames, one chunk of triangles per frame.
//! 2. **Dispatch.** One submission accumulates the ids into a flag per
//!    triangle, compacts the flags into the visible set and turns its size
//!    into indirect draw arguments.
//! 3. **Final draw.** Every frame the render hook draws the current visible
//!    set with a single indirect draw, whatever sweep is in progress.
//!
//! The final draw may show the previous sweep's result while the next one is
//! being rendered. A dispatch is a single submission, so the visible set is
//! never observed half written.

mod sweep;

pub use sweep::{ChunkPlan, SweepDriver, SweepPhase, SweepStep, SweepTask};

use super::resources::{frame_view_uniforms, Prepared, ResourceLedger, ViewBinding};
use super::switch_enabled;
use crate::import_lane::StructuredBufferImporter;
use std::ops::Range;
use tricull_core::math::{Extent2D, Mat4};
use tricull_core::renderer::{
    BindGroupEntry, BindGroupId, BindGroupLayoutSource, BufferDescriptor, BufferId, BufferUsage,
    ClearValue, ComputeKernel, ComputePassDescriptor, ComputePipelineDescriptor,
    ComputePipelineId, DrawIndirectArgs, GraphicsDevice, LoadOp, Operations, PartAttributes,
    RenderPass, RenderPassColorAttachment, RenderPassDepthStencilAttachment, RenderPassDescriptor,
    RenderPipelineDescriptor, RenderPipelineId, RenderProgram, ResourceError, StoreOp, TextureDescriptor,
    TextureFormat, TextureId, TextureUsage, TextureViewId, ViewUniforms, VisibleSetHeader,
    ID_SENTINEL,
};
use tricull_core::scene::{Camera, ModelNode};
use tricull_core::{
    ConfigError, DrawStrategy, FrameContext, StrategyError, TargetFormats, VisibilityConfig,
};

const NAME: &str = "VisibleTriangles";

/// A snapshot of the visible set, read back from the GPU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleSet {
    /// Raw append counter. Exceeds `capacity` when triangles were dropped.
    pub count: u32,
    /// Capacity of the visible set.
    pub capacity: u32,
    /// The retained triangle ids, `min(count, capacity)` of them.
    pub triangles: Vec<u32>,
}

impl VisibleSet {
    /// Returns `true` if more triangles were visible than the set could hold.
    pub fn overflowed(&self) -> bool {
        self.count > self.capacity
    }
}

/// Counters describing a prepared lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityStats {
    /// Triangles in the model.
    pub triangles: u32,
    /// Chunks per sweep.
    pub chunks: usize,
    /// Capacity of the visible set.
    pub capacity: u32,
    /// Sweeps completed since the lane was prepared.
    pub sweeps: u64,
}

/// Everything the ID pass, the dispatch and the final draw bind.
struct VisibilityScene {
    plan: ChunkPlan,
    id_texture: TextureId,
    id_target: TextureViewId,
    id_depth: TextureViewId,
    id_pipeline: RenderPipelineId,
    id_view: ViewBinding,
    id_scene: BindGroupId,
    draw_pipeline: RenderPipelineId,
    draw_view: ViewBinding,
    draw_scene: BindGroupId,
    accumulate: (ComputePipelineId, BindGroupId),
    compact: (ComputePipelineId, BindGroupId),
    write_args: (ComputePipelineId, BindGroupId),
    visible_buffer: BufferId,
    args_buffer: BufferId,
    /// View of the sweep in progress, snapshotted when it began.
    sweep_view: ViewUniforms,
}

/// Draws only the triangles an incremental ID-buffer sweep found visible.
pub struct VisibilityLane {
    config: VisibilityConfig,
    enabled: bool,
    task: Option<SweepTask>,
    world_transform: Option<Mat4>,
    sweeps_completed: u64,
    prepared: Option<Prepared<VisibilityScene>>,
}

impl VisibilityLane {
    /// Creates an unprepared, disabled lane.
    pub fn new(config: VisibilityConfig) -> Self {
        Self {
            config,
            enabled: false,
            task: None,
            world_transform: None,
            sweeps_completed: 0,
            prepared: None,
        }
    }

    /// The lane's configuration.
    pub fn config(&self) -> &VisibilityConfig {
        &self.config
    }

    /// Phase of the running sweep task, `None` while disabled.
    pub fn phase(&self) -> Option<SweepPhase> {
        self.task.as_ref().map(SweepTask::phase)
    }

    /// Sweeps completed since the lane was prepared, across enable cycles.
    pub fn sweeps_completed(&self) -> u64 {
        self.sweeps_completed
    }

    /// Counters of the prepared lane.
    pub fn stats(&self) -> Option<VisibilityStats> {
        self.prepared.as_ref().map(|p| VisibilityStats {
            triangles: p.scene.plan.total(),
            chunks: p.scene.plan.chunk_count(),
            capacity: self.config.max_triangles,
            sweeps: self.sweeps_completed,
        })
    }

    /// Reads the visible set back. Blocks until the GPU is done with it.
    pub fn read_visible_set(&self, device: &dyn GraphicsDevice) -> Result<VisibleSet, StrategyError> {
        let scene = &self.prepared.as_ref().ok_or(StrategyError::NotPrepared)?.scene;
        let bytes = device.read_buffer(scene.visible_buffer)?;
        let header_size = VisibleSetHeader::SIZE as usize;
        let header: VisibleSetHeader = bytes
            .get(..header_size)
            .map(bytemuck::pod_read_unaligned)
            .ok_or(StrategyError::Resource(ResourceError::OutOfBounds))?;

        let capacity = self.config.max_triangles;
        let retained = header.count.min(capacity) as usize;
        let triangles = bytes[header_size..]
            .chunks_exact(4)
            .take(retained)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        let set = VisibleSet {
            count: header.count,
            capacity,
            triangles,
        };
        if set.overflowed() {
            log::warn!(
                "{NAME}: {} triangles visible but the visible set holds {}; {} dropped",
                set.count,
                capacity,
                set.count - capacity
            );
        }
        Ok(set)
    }

    /// Reads the ID texture back, one `u32` per texel in row-major order.
    pub fn read_id_texture(&self, device: &dyn GraphicsDevice) -> Result<Vec<u32>, StrategyError> {
        let scene = &self.prepared.as_ref().ok_or(StrategyError::NotPrepared)?.scene;
        let bytes = device.read_texture(scene.id_texture)?;
        Ok(bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect())
    }

    fn start_task(&mut self) {
        if self.task.is_none() {
            if let Some(prepared) = &self.prepared {
                self.task = Some(SweepTask::new(prepared.scene.plan));
            }
        }
    }

    fn build(
        &self,
        device: &dyn GraphicsDevice,
        model: &ModelNode,
        targets: &TargetFormats,
        ledger: &mut ResourceLedger,
    ) -> Result<VisibilityScene, StrategyError> {
        // Widening is clamped per frame once the camera is known.
        self.config
            .validate(0.0)
            .map_err(|e| StrategyError::PrepareFailed(Box::new(e)))?;
        let capacity = self.config.max_triangles;
        if VisibleSetHeader::buffer_size(capacity) > device.limits().max_storage_buffer() {
            return Err(StrategyError::PrepareFailed(Box::new(ConfigError::OutOfRange {
                field: "max_triangles",
                expected: "a visible set within the device's storage binding limit",
            })));
        }

        let parts = model.renderable_parts();
        let meshes: Vec<_> = parts.iter().map(|p| p.mesh.clone()).collect();
        let import = StructuredBufferImporter::new(device).import_all_and_unpack(&meshes)?;
        let records = ledger.buffer(import.attribute_buffer);
        let part_table: Vec<_> = parts
            .iter()
            .map(|p| PartAttributes::new(&p.transform, p.color))
            .collect();
        let part_buffer = ledger.storage(device, "part attributes", &part_table)?;

        let triangles = import.triangle_count;
        let flags_buffer = ledger.buffer(device.create_buffer(&BufferDescriptor {
            label: Some("triangle flags".into()),
            size: u64::from(triangles) * 4,
            usage: BufferUsage::STORAGE,
        })?);
        let visible_buffer = ledger.buffer(device.create_buffer(&BufferDescriptor {
            label: Some("visible set".into()),
            size: VisibleSetHeader::buffer_size(capacity),
            usage: BufferUsage::STORAGE | BufferUsage::COPY_DST | BufferUsage::COPY_SRC,
        })?);
        let args_buffer = ledger.buffer(device.create_buffer(&BufferDescriptor {
            label: Some("visible draw args".into()),
            size: std::mem::size_of::<DrawIndirectArgs>() as u64,
            usage: BufferUsage::STORAGE | BufferUsage::INDIRECT,
        })?);

        let resolution = Extent2D::square(self.config.id_resolution);
        let id_texture = ledger.texture(device.create_texture(&TextureDescriptor {
            label: Some("triangle ids".into()),
            size: resolution,
            format: TextureFormat::R32Uint,
            usage: TextureUsage::RENDER_ATTACHMENT
                | TextureUsage::TEXTURE_BINDING
                | TextureUsage::COPY_SRC,
        })?);
        let id_target = ledger.view(device.create_texture_view(id_texture)?);
        let id_depth_texture = ledger.texture(device.create_texture(&TextureDescriptor {
            label: Some("triangle ids depth".into()),
            size: resolution,
            format: TextureFormat::Depth32Float,
            usage: TextureUsage::RENDER_ATTACHMENT,
        })?);
        let id_depth = ledger.view(device.create_texture_view(id_depth_texture)?);

        let id_pipeline = ledger.render_pipeline(device.create_render_pipeline(
            &RenderPipelineDescriptor {
                label: Some("triangle ids".into()),
                program: RenderProgram::TriangleIds,
                color_format: TextureFormat::R32Uint,
                depth_format: Some(TextureFormat::Depth32Float),
            },
        )?);
        let id_view = ViewBinding::new(device, ledger, "triangle ids view", id_pipeline)?;
        let id_scene = ledger.create_bind_group(
            device,
            "triangle ids scene",
            BindGroupLayoutSource::Render(id_pipeline, 1),
            &[
                BindGroupEntry::buffer(0, records),
                BindGroupEntry::buffer(1, part_buffer),
            ],
        )?;

        let draw_pipeline = ledger.render_pipeline(device.create_render_pipeline(
            &RenderPipelineDescriptor {
                label: Some("visible triangles".into()),
                program: RenderProgram::VisibleTriangles,
                color_format: targets.color,
                depth_format: targets.depth,
            },
        )?);
        let draw_view = ViewBinding::new(device, ledger, "visible triangles view", draw_pipeline)?;
        let draw_scene = ledger.create_bind_group(
            device,
            "visible triangles scene",
            BindGroupLayoutSource::Render(draw_pipeline, 1),
            &[
                BindGroupEntry::buffer(0, records),
                BindGroupEntry::buffer(1, part_buffer),
                BindGroupEntry::buffer(2, visible_buffer),
            ],
        )?;

        let mut compute = |kernel: ComputeKernel,
                           entries: &[BindGroupEntry]|
         -> Result<(ComputePipelineId, BindGroupId), StrategyError> {
            let label = format!("{kernel:?}");
            let pipeline = ledger.compute_pipeline(device.create_compute_pipeline(
                &ComputePipelineDescriptor {
                    label: Some(label.as_str().into()),
                    kernel,
                },
            )?);
            let bind_group = ledger.create_bind_group(
                device,
                &label,
                BindGroupLayoutSource::Compute(pipeline, 0),
                entries,
            )?;
            Ok((pipeline, bind_group))
        };
        let accumulate = compute(
            ComputeKernel::AccumulateIds,
            &[
                BindGroupEntry::texture_view(0, id_target),
                BindGroupEntry::buffer(1, flags_buffer),
            ],
        )?;
        let compact = compute(
            ComputeKernel::CompactVisible,
            &[
                BindGroupEntry::buffer(0, flags_buffer),
                BindGroupEntry::buffer(1, visible_buffer),
            ],
        )?;
        let write_args = compute(
            ComputeKernel::WriteDrawArgs,
            &[
                BindGroupEntry::buffer(0, visible_buffer),
                BindGroupEntry::buffer(1, args_buffer),
            ],
        )?;

        let plan = ChunkPlan::new(triangles, self.config.frames_per_sweep);
        log::info!(
            "{NAME}: prepared {} parts ({} triangles), {}x{} id target, {} chunks of {} triangles, capacity {}",
            parts.len(),
            triangles,
            resolution.width,
            resolution.height,
            plan.chunk_count(),
            plan.chunk_size(),
            capacity
        );
        Ok(VisibilityScene {
            plan,
            id_texture,
            id_target,
            id_depth,
            id_pipeline,
            id_view,
            id_scene,
            draw_pipeline,
            draw_view,
            draw_scene,
            accumulate,
            compact,
            write_args,
            visible_buffer,
            args_buffer,
            sweep_view: ViewUniforms::new(&Mat4::IDENTITY, &Mat4::IDENTITY),
        })
    }
}

/// The lane's side of a sweep, borrowed for one `advance`.
struct SweepIo<'a> {
    device: &'a dyn GraphicsDevice,
    camera: &'a Camera,
    fov_ratio: f32,
    id_resolution: u32,
    world_transform: Option<Mat4>,
    scene: &'a mut VisibilityScene,
}

impl SweepDriver for SweepIo<'_> {
    fn world_transform(&self) -> Option<Mat4> {
        self.world_transform
    }

    fn begin_sweep(&mut self, root: Mat4) -> Result<(), StrategyError> {
        // Keeps the main camera's aspect even though the ID target is square.
        let culling = self.camera.widened(self.fov_ratio);
        let view_proj = culling
            .view_projection()
            .ok_or(StrategyError::InvalidCamera)?;
        self.scene.sweep_view = ViewUniforms::new(&view_proj, &root);
        Ok(())
    }

    fn render_chunk(&mut self, index: usize, triangles: Range<u32>) -> Result<(), StrategyError> {
        let scene = &*self.scene;
        scene.id_view.write(
            self.device,
            &scene.sweep_view.with_triangle_offset(triangles.start),
        )?;

        let first = index == 0;
        let mut encoder = self.device.create_command_encoder(Some("triangle ids"));
        {
            let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some(format!("triangle ids chunk {index}").into()),
                color_attachment: RenderPassColorAttachment {
                    view: scene.id_target,
                    ops: Operations {
                        load: if first {
                            LoadOp::Clear(ClearValue::Uint([ID_SENTINEL; 4]))
                        } else {
                            LoadOp::Load
                        },
                        store: StoreOp::Store,
                    },
                },
                depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                    view: scene.id_depth,
                    depth_ops: Operations {
                        load: if first { LoadOp::Clear(1.0) } else { LoadOp::Load },
                        store: StoreOp::Store,
                    },
                }),
            });
            pass.set_pipeline(scene.id_pipeline);
            pass.set_bind_group(0, scene.id_view.bind_group);
            pass.set_bind_group(1, scene.id_scene);
            pass.draw(0..triangles.len() as u32 * 3, 0..1);
        }
        self.device.submit_command_buffer(encoder.finish())?;
        log::trace!(
            "{NAME}: rendered id chunk {index} (triangles {}..{}) at {}px",
            triangles.start,
            triangles.end,
            self.id_resolution
        );
        Ok(())
    }

    fn dispatch(&mut self) -> Result<(), StrategyError> {
        let scene = &*self.scene;
        let triangles = scene.plan.total();
        let max_workgroups = self.device.limits().max_compute_workgroups_per_dimension;
        let mut encoder = self.device.create_command_encoder(Some("visibility dispatch"));
        // Resets the append counter only; the flags were cleared by the last compaction.
        encoder.clear_buffer(scene.visible_buffer, 0, Some(4));

        let steps = [
            (
                scene.accumulate,
                ComputeKernel::AccumulateIds,
                ComputeKernel::AccumulateIds
                    .workgroups_for([self.id_resolution, self.id_resolution, 1]),
            ),
            (
                scene.compact,
                ComputeKernel::CompactVisible,
                ComputeKernel::CompactVisible.linear_workgroups(triangles, max_workgroups),
            ),
            (scene.write_args, ComputeKernel::WriteDrawArgs, [1, 1, 1]),
        ];
        for ((pipeline, bind_group), kernel, [x, y, z]) in steps {
            let mut pass = encoder.begin_compute_pass(&ComputePassDescriptor {
                label: Some(format!("{kernel:?}").into()),
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, bind_group);
            pass.dispatch_workgroups(x, y, z);
        }
        self.device.submit_command_buffer(encoder.finish())?;
        Ok(())
    }
}

impl DrawStrategy for VisibilityLane {
    fn strategy_name(&self) -> &'static str {
        NAME
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
        self.sweeps_completed = 0;
        if self.enabled {
            self.start_task();
        }
        Ok(())
    }

    fn set_enabled(&mut self, enabled: bool) {
        if !switch_enabled(NAME, &mut self.enabled, enabled) {
            return;
        }
        if enabled {
            self.start_task();
        } else if let Some(task) = self.task.take() {
            log::debug!("{NAME}: sweep task cancelled in {:?}", task.phase());
        }
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn late_update(&mut self, ctx: &FrameContext<'_>) -> Result<(), StrategyError> {
        let Some(task) = self.task.as_mut() else {
            return Ok(());
        };
        let scene = &mut self.prepared.as_mut().ok_or(StrategyError::NotPrepared)?.scene;
        let mut io = SweepIo {
            device: ctx.device,
            camera: &ctx.view.camera,
            fov_ratio: self.config.fov_ratio,
            id_resolution: self.config.id_resolution,
            world_transform: self.world_transform,
            scene,
        };
        if let SweepStep::Dispatched { sweep } = task.advance(&mut io)? {
            self.sweeps_completed += 1;
            log::debug!(
                "{NAME}: sweep {sweep} dispatched ({} in total) at frame {}",
                self.sweeps_completed,
                ctx.frame_index
            );
        }
        Ok(())
    }

    fn render(
        &mut self,
        ctx: &FrameContext<'_>,
        pass: &mut dyn RenderPass,
    ) -> Result<(), StrategyError> {
        self.world_transform = Some(ctx.view.root_transform);
        if !self.enabled {
            return Ok(());
        }
        let scene = &self.prepared.as_ref().ok_or(StrategyError::NotPrepared)?.scene;
        if self.sweeps_completed == 0 {
            return Ok(());
        }
        scene.draw_view.write(ctx.device, &frame_view_uniforms(ctx.view)?)?;

        pass.set_pipeline(scene.draw_pipeline);
        pass.set_bind_group(0, scene.draw_view.bind_group);
        pass.set_bind_group(1, scene.draw_scene);
        pass.draw_indirect(scene.args_buffer, 0);
        Ok(())
    }

    fn dispose(&mut self, device: &dyn GraphicsDevice) {
        if self.enabled {
            log::warn!("{NAME}: disposed while enabled, cancelling the sweep first");
            self.set_enabled(false);
        }
        if let Some(prepared) = self.prepared.take() {
            prepared.ledger.release(device);
            log::debug!("{NAME}: disposed after {} sweeps", self.sweeps_completed);
        }
        self.sweeps_completed = 0;
        self.world_transform = None;
    }
}
