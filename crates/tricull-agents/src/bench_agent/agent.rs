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

//! Defines the BenchAgent, which drives every strategy through the same frames.

use super::{BenchConfig, BenchError};
use std::sync::Arc;
use tricull_core::math::{Extent2D, LinearRgba};
use tricull_core::renderer::{
    ClearValue, GraphicsDevice, LoadOp, Operations, RenderPassColorAttachment,
    RenderPassDepthStencilAttachment, RenderPassDescriptor, ResourceError, StoreOp,
    TextureDescriptor, TextureFormat, TextureId, TextureUsage, TextureViewId,
};
use tricull_core::scene::ModelNode;
use tricull_core::{DrawStrategy, FrameContext, FrameView, TargetFormats};
use tricull_telemetry::{BenchReport, HostInfo, TelemetryService};

const BACKGROUND: LinearRgba = LinearRgba::rgb(0.05, 0.05, 0.08);

/// The colour and depth textures every strategy renders into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameTargets {
    /// Size of both textures.
    pub size: Extent2D,
    /// The colour texture, readable with `read_texture`.
    pub color: TextureId,
    /// The view bound as the colour attachment.
    pub color_view: TextureViewId,
    /// The depth texture.
    pub depth: TextureId,
    /// The view bound as the depth attachment.
    pub depth_view: TextureViewId,
}

impl FrameTargets {
    /// Creates both textures and their views in the formats of [`TargetFormats::default`].
    pub fn create(device: &dyn GraphicsDevice, size: Extent2D) -> Result<Self, ResourceError> {
        let formats = TargetFormats::default();
        let color = device.create_texture(&TextureDescriptor {
            label: Some("frame color".into()),
            size,
            format: formats.color,
            usage: TextureUsage::RENDER_ATTACHMENT | TextureUsage::COPY_SRC,
        })?;
        let depth = device.create_texture(&TextureDescriptor {
            label: Some("frame depth".into()),
            size,
            format: formats.depth.unwrap_or(TextureFormat::Depth32Float),
            usage: TextureUsage::RENDER_ATTACHMENT,
        })?;
        Ok(Self {
            size,
            color,
            color_view: device.create_texture_view(color)?,
            depth,
            depth_view: device.create_texture_view(depth)?,
        })
    }

    /// The formats strategies must build their pipelines for.
    pub fn formats(&self) -> TargetFormats {
        TargetFormats::default()
    }

    /// Destroys the views, then the textures.
    pub fn release(&self, device: &dyn GraphicsDevice) {
        let results = [
            device.destroy_texture_view(self.color_view),
            device.destroy_texture_view(self.depth_view),
            device.destroy_texture(self.color),
            device.destroy_texture(self.depth),
        ];
        for e in results.into_iter().filter_map(Result::err) {
            log::warn!("Failed to release frame target: {e}");
        }
    }
}

/// Renders one frame of `strategy`: tick, frame pass, submit, wait.
fn render_frame(
    device: &dyn GraphicsDevice,
    targets: &FrameTargets,
    view: &FrameView,
    frame_index: u64,
    strategy: &mut dyn DrawStrategy,
) -> Result<(), BenchError> {
    let name = strategy.strategy_name();
    let ctx = FrameContext {
        device,
        view,
        frame_index,
    };
    strategy
        .late_update(&ctx)
        .map_err(BenchError::strategy(name))?;

    let mut encoder = device.create_command_encoder(Some("frame"));
    {
        let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some("frame".into()),
            color_attachment: RenderPassColorAttachment {
                view: targets.color_view,
                ops: Operations {
                    load: LoadOp::Clear(ClearValue::Float(BACKGROUND)),
                    store: StoreOp::Store,
                },
            },
            depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                view: targets.depth_view,
                depth_ops: Operations {
                    load: LoadOp::Clear(1.0),
                    store: StoreOp::Store,
                },
            }),
        });
        strategy
            .render(&ctx, pass.as_mut())
            .map_err(BenchError::strategy(name))?;
    }
    device.submit_command_buffer(encoder.finish())?;
    device.wait_idle()?;
    Ok(())
}

/// The benchmark harness.
///
/// Owns the device handle, the frame targets and the strategies under test.
/// Strategies run one after the other with identical camera paths, so their
/// frame times are comparable.
pub struct BenchAgent {
    device: Arc<dyn GraphicsDevice>,
    config: BenchConfig,
    targets: FrameTargets,
    strategies: Vec<Box<dyn DrawStrategy>>,
    telemetry: TelemetryService,
    model_triangles: u64,
    // Monotonic across strategies.
    frame_index: u64,
}

impl BenchAgent {
    /// Validates `config` and creates the frame targets.
    pub fn new(device: Arc<dyn GraphicsDevice>, config: BenchConfig) -> Result<Self, BenchError> {
        config.validate()?;
        let targets = FrameTargets::create(device.as_ref(), config.extent())?;
        log::info!(
            "BenchAgent: {}x{} targets on {}",
            targets.size.width,
            targets.size.height,
            device.adapter_info()
        );
        Ok(Self {
            device,
            config,
            targets,
            strategies: Vec::new(),
            telemetry: TelemetryService::new(),
            model_triangles: 0,
            frame_index: 0,
        })
    }

    pub fn device(&self) -> &Arc<dyn GraphicsDevice> {
        &self.device
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    pub fn targets(&self) -> &FrameTargets {
        &self.targets
    }

    pub fn telemetry(&self) -> &TelemetryService {
        &self.telemetry
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.strategy_name()).collect()
    }

    pub fn add_strategy(&mut self, strategy: Box<dyn DrawStrategy>) {
        log::debug!("BenchAgent: added strategy {}", strategy.strategy_name());
        self.strategies.push(strategy);
    }

    /// Adds every strategy listed in the configuration.
    pub fn add_configured_strategies(&mut self) {
        let kinds = self.config.strategies.clone();
        for kind in kinds {
            let strategy = kind.build(&self.config.visibility);
            self.add_strategy(strategy);
        }
    }

    /// Prepares every added strategy with `model`.
    pub fn prepare_all(&mut self, model: &ModelNode) -> Result<(), BenchError> {
        let formats = self.targets.formats();
        self.model_triangles = model.triangle_count() as u64;
        for strategy in &mut self.strategies {
            strategy
                .prepare(self.device.as_ref(), model, &formats)
                .map_err(BenchError::strategy(strategy.strategy_name()))?;
        }
        log::info!(
            "BenchAgent: prepared {} strategies for {} triangles",
            self.strategies.len(),
            self.model_triangles
        );
        Ok(())
    }

    /// The main view of the next frame.
    pub fn next_view(&self) -> FrameView {
        self.config
            .orbit
            .view_at(self.frame_index, self.targets.size.aspect_ratio())
    }

    /// Renders one frame of a strategy the agent does not own.
    ///
    /// The caller is responsible for the strategy's lifecycle.
    pub fn drive_frame(&mut self, strategy: &mut dyn DrawStrategy) -> Result<(), BenchError> {
        let view = self.next_view();
        render_frame(
            self.device.as_ref(),
            &self.targets,
            &view,
            self.frame_index,
            strategy,
        )?;
        self.frame_index += 1;
        Ok(())
    }

    /// Runs every strategy in order, then disposes all of them.
    ///
    /// On failure the remaining strategies are skipped but still disposed.
    pub fn run(&mut self) -> Result<BenchReport, BenchError> {
        for index in 0..self.strategies.len() {
            if let Err(e) = self.run_strategy(index) {
                log::error!("BenchAgent: {e}");
                self.dispose_all();
                return Err(e);
            }
        }
        self.dispose_all();
        Ok(self.report())
    }

    fn run_strategy(&mut self, index: usize) -> Result<(), BenchError> {
        let aspect = self.targets.size.aspect_ratio();
        let device = self.device.as_ref();
        let strategy = self.strategies[index].as_mut();
        let name = strategy.strategy_name();
        log::info!(
            "BenchAgent: running {name} ({} warm-up, {} measured frames)",
            self.config.warmup_frames,
            self.config.measured_frames
        );

        strategy.set_enabled(true);
        let total = self.config.warmup_frames + self.config.measured_frames;
        for frame in 0..total {
            let view = self.config.orbit.view_at(self.frame_index, aspect);
            let measured = frame >= self.config.warmup_frames;
            let timer = measured.then(|| self.telemetry.frame_timer(name));
            let result = render_frame(device, &self.targets, &view, self.frame_index, strategy);
            self.frame_index += 1;
            if let Err(e) = result {
                if let Some(timer) = timer {
                    timer.discard();
                }
                strategy.set_enabled(false);
                return Err(e);
            }
        }
        strategy.set_enabled(false);

        if let Some(summary) = self.telemetry.series(name).and_then(|s| s.summary()) {
            log::info!(
                "BenchAgent: {name} mean {:.3} ms, p95 {:.3} ms",
                summary.mean,
                summary.p95
            );
        }
        Ok(())
    }

    /// Disables and disposes every owned strategy.
    pub fn dispose_all(&mut self) {
        for mut strategy in self.strategies.drain(..) {
            strategy.set_enabled(false);
            strategy.dispose(self.device.as_ref());
        }
    }

    /// Reads back the colour target as packed RGBA8 texels.
    pub fn read_frame(&self) -> Result<Vec<u32>, BenchError> {
        let bytes = self.device.read_texture(self.targets.color)?;
        Ok(bytemuck::pod_collect_to_vec(&bytes))
    }

    pub fn report(&self) -> BenchReport {
        BenchReport {
            adapter: self.device.adapter_info().to_string(),
            host: HostInfo::collect(),
            resolution: [self.targets.size.width, self.targets.size.height],
            model_triangles: self.model_triangles,
            strategies: self.telemetry.strategy_reports(self.config.warmup_frames),
        }
    }
}

impl Drop for BenchAgent {
    fn drop(&mut self) {
        self.dispose_all();
        self.targets.release(self.device.as_ref());
    }
}
