use std::sync::Arc;
use tricull_core::math::{degrees_to_radians, Extent2D, LinearRgba, Mat4, Vec3};
use tricull_core::renderer::*;
use tricull_core::scene::{Camera, Mesh, ModelNode};
use tricull_core::{DrawStrategy, FrameContext, FrameView, StrategyError, TargetFormats};
use tricull_infra::{ExecutedCommand, SoftwareDevice};
use tricull_lanes::{box_grid, MaterialBatchLane, ProceduralLane, ProceduralLayout, PropertyBlockLane};

const SIZE: u32 = 48;

struct Frame {
    device: SoftwareDevice,
    color: TextureId,
    color_view: TextureViewId,
    depth_view: TextureViewId,
    view: FrameView,
}

impl Frame {
    fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let device = SoftwareDevice::new();
        let color = device
            .create_texture(&TextureDescriptor {
                label: Some("frame color".into()),
                size: Extent2D::square(SIZE),
                format: TextureFormat::Rgba8Unorm,
                usage: TextureUsage::RENDER_ATTACHMENT | TextureUsage::COPY_SRC,
            })
            .unwrap();
        let depth = device
            .create_texture(&TextureDescriptor {
                label: Some("frame depth".into()),
                size: Extent2D::square(SIZE),
                format: TextureFormat::Depth32Float,
                usage: TextureUsage::RENDER_ATTACHMENT,
            })
            .unwrap();
        let color_view = device.create_texture_view(color).unwrap();
        let depth_view = device.create_texture_view(depth).unwrap();
        let view = FrameView {
            camera: Camera::looking_at(
                Vec3::new(1.0, 2.0, 6.0),
                Vec3::ZERO,
                degrees_to_radians(60.0),
                1.0,
            ),
            root_transform: Mat4::from_rotation_y(0.3),
        };
        Self {
            device,
            color,
            color_view,
            depth_view,
            view,
        }
    }

    /// Renders one frame and returns its texels.
    fn draw(&self, strategy: &mut dyn DrawStrategy) -> Result<Vec<u32>, StrategyError> {
        let ctx = FrameContext {
            device: &self.device,
            view: &self.view,
            frame_index: 0,
        };
        strategy.late_update(&ctx)?;
        let mut encoder = self.device.create_command_encoder(Some("frame"));
        {
            let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("frame".into()),
                color_attachment: RenderPassColorAttachment {
                    view: self.color_view,
                    ops: Operations {
                        load: LoadOp::Clear(ClearValue::Float(LinearRgba::BLACK)),
                        store: StoreOp::Store,
                    },
                },
                depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                    view: self.depth_view,
                    depth_ops: Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    },
                }),
            });
            strategy.render(&ctx, pass.as_mut())?;
        }
        self.device.submit_command_buffer(encoder.finish())?;
        let bytes = self.device.read_texture(self.color)?;
        Ok(bytemuck::pod_collect_to_vec(&bytes))
    }
}

fn strategies() -> Vec<Box<dyn DrawStrategy>> {
    vec![
        Box::new(MaterialBatchLane::new()),
        Box::new(PropertyBlockLane::new()),
        Box::new(ProceduralLane::new(ProceduralLayout::Indexed)),
        Box::new(ProceduralLane::new(ProceduralLayout::Unpacked)),
    ]
}

#[test]
fn every_simple_strategy_renders_the_same_image() {
    let frame = Frame::new();
    let model = box_grid(3, 2, 2, 1.0);
    let background = LinearRgba::BLACK.to_rgba8();

    let mut images = Vec::new();
    for mut strategy in strategies() {
        strategy
            .prepare(&frame.device, &model, &TargetFormats::default())
            .unwrap();
        strategy.set_enabled(true);
        images.push((strategy.strategy_name(), frame.draw(strategy.as_mut()).unwrap()));
        strategy.set_enabled(false);
        strategy.dispose(&frame.device);
    }

    let (reference_name, reference) = &images[0];
    let covered = reference.iter().filter(|&&t| t != background).count();
    assert!(covered > 100, "only {covered} texels covered");
    for (name, image) in &images[1..] {
        assert!(image == reference, "{name} differs from {reference_name}");
    }
}

#[test]
fn disabled_strategies_draw_nothing() {
    let frame = Frame::new();
    let model = box_grid(2, 1, 1, 1.0);
    for mut strategy in strategies() {
        strategy
            .prepare(&frame.device, &model, &TargetFormats::default())
            .unwrap();
        frame.device.take_command_log();
        frame.draw(strategy.as_mut()).unwrap();
        let log = frame.device.take_command_log();
        assert!(
            matches!(&log[..], [ExecutedCommand::RenderPass { draws, .. }] if draws.is_empty()),
            "{} drew while disabled",
            strategy.strategy_name()
        );
        strategy.dispose(&frame.device);
    }
}

#[test]
fn set_enabled_is_idempotent() {
    for mut strategy in strategies() {
        strategy.set_enabled(true);
        strategy.set_enabled(true);
        assert!(strategy.is_enabled());
        strategy.set_enabled(false);
        strategy.set_enabled(false);
        assert!(!strategy.is_enabled());
    }
}

#[test]
fn lifecycle_misuse_is_reported() {
    let frame = Frame::new();
    let model = box_grid(1, 1, 1, 1.0);
    for mut strategy in strategies() {
        strategy.set_enabled(true);
        assert!(matches!(
            frame.draw(strategy.as_mut()),
            Err(StrategyError::NotPrepared)
        ));
        assert!(matches!(
            strategy.prepare(&frame.device, &ModelNode::new("empty"), &TargetFormats::default()),
            Err(StrategyError::InvalidModel(_))
        ));
        strategy
            .prepare(&frame.device, &model, &TargetFormats::default())
            .unwrap();
        assert!(matches!(
            strategy.prepare(&frame.device, &model, &TargetFormats::default()),
            Err(StrategyError::AlreadyPrepared)
        ));
        strategy.set_enabled(false);
        strategy.dispose(&frame.device);
    }
}

#[test]
fn dispose_releases_every_buffer() {
    let frame = Frame::new();
    let baseline = frame.device.live_buffer_count();
    let model = box_grid(2, 2, 1, 1.0);
    for mut strategy in strategies() {
        strategy
            .prepare(&frame.device, &model, &TargetFormats::default())
            .unwrap();
        assert!(frame.device.live_buffer_count() > baseline);
        // Disposing an enabled strategy disables it first.
        strategy.set_enabled(true);
        strategy.dispose(&frame.device);
        assert!(!strategy.is_enabled());
        assert_eq!(
            frame.device.live_buffer_count(),
            baseline,
            "{} leaked buffers",
            strategy.strategy_name()
        );
    }
}

#[test]
fn materials_are_shared_between_parts_of_the_same_colour() {
    let frame = Frame::new();
    let mesh = Arc::new(Mesh::quad(1.0, 1.0));
    let model = ModelNode::new("root")
        .with_child(ModelNode::new("a").with_part(mesh.clone(), LinearRgba::RED))
        .with_child(ModelNode::new("b").with_part(mesh.clone(), LinearRgba::BLUE))
        .with_child(ModelNode::new("c").with_part(mesh, LinearRgba::RED));

    let mut lane = MaterialBatchLane::new();
    lane.prepare(&frame.device, &model, &TargetFormats::default())
        .unwrap();
    assert_eq!(lane.material_count(), 2);

    lane.set_enabled(true);
    frame.device.take_command_log();
    frame.draw(&mut lane).unwrap();
    let draws = match &frame.device.take_command_log()[..] {
        [ExecutedCommand::RenderPass { draws, .. }] => draws.clone(),
        other => panic!("unexpected log {other:?}"),
    };
    assert_eq!(draws.len(), 3);
    assert!(draws.iter().all(|d| d.program == RenderProgram::FlatColor && d.vertex_count == 6));
}

#[test]
fn procedural_draws_one_call_per_part() {
    let frame = Frame::new();
    let model = box_grid(2, 2, 1, 1.0);
    for layout in [ProceduralLayout::Indexed, ProceduralLayout::Unpacked] {
        let mut lane = ProceduralLane::new(layout);
        lane.prepare(&frame.device, &model, &TargetFormats::default())
            .unwrap();
        lane.set_enabled(true);
        frame.device.take_command_log();
        frame.draw(&mut lane).unwrap();
        let log = frame.device.take_command_log();
        let [ExecutedCommand::RenderPass { draws, .. }] = &log[..] else {
            panic!("unexpected log {log:?}");
        };
        assert_eq!(draws.len(), 4);
        // A cuboid has 12 triangles.
        assert!(draws.iter().all(|d| d.vertex_count == 36));
        lane.set_enabled(false);
        lane.dispose(&frame.device);
    }
}
