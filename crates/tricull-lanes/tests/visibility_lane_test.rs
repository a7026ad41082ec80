use std::sync::Arc;
use tricull_core::math::{degrees_to_radians, Extent2D, LinearRgba, Mat4, Vec3};
use tricull_core::renderer::*;
use tricull_core::scene::{Camera, Mesh, ModelNode};
use tricull_core::{DrawStrategy, FrameContext, FrameView, StrategyError, TargetFormats, VisibilityConfig};
use tricull_infra::graphics::software::DrawRecord;
use tricull_infra::{ExecutedCommand, SoftwareDevice};
use tricull_lanes::asset_lane::{OCCLUDED_PANEL, OCCLUDER_WALL};
use tricull_lanes::{occluder_scene, ChunkPlan, SweepPhase, VisibilityLane};

const FRAME_SIZE: u32 = 48;

struct FrameTarget {
    color: TextureViewId,
    depth: TextureViewId,
}

fn frame_target(device: &SoftwareDevice) -> FrameTarget {
    let texture = |format, usage| {
        let id = device
            .create_texture(&TextureDescriptor {
                label: None,
                size: Extent2D::square(FRAME_SIZE),
                format,
                usage,
            })
            .unwrap();
        device.create_texture_view(id).unwrap()
    };
    FrameTarget {
        color: texture(
            TextureFormat::Rgba8Unorm,
            TextureUsage::RENDER_ATTACHMENT | TextureUsage::COPY_SRC,
        ),
        depth: texture(TextureFormat::Depth32Float, TextureUsage::RENDER_ATTACHMENT),
    }
}

fn front_view() -> FrameView {
    FrameView {
        camera: Camera::looking_at(
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::ZERO,
            degrees_to_radians(60.0),
            1.0,
        ),
        root_transform: Mat4::IDENTITY,
    }
}

fn config(max_triangles: u32) -> VisibilityConfig {
    VisibilityConfig {
        id_resolution: 64,
        frames_per_sweep: 5,
        fov_ratio: 1.25,
        max_triangles,
    }
}

/// A 10-triangle part and a 20-triangle part, side by side and facing the camera.
fn two_part_model() -> ModelNode {
    ModelNode::new("two parts")
        .with_child(
            ModelNode::new("ten")
                .with_transform(Mat4::from_translation(Vec3::new(-1.5, 0.0, 0.0)))
                .with_part(Arc::new(Mesh::grid(2.0, 1.0, 5, 1)), LinearRgba::RED),
        )
        .with_child(
            ModelNode::new("twenty")
                .with_transform(Mat4::from_translation(Vec3::new(1.5, 0.0, 0.0)))
                .with_part(Arc::new(Mesh::grid(2.0, 2.0, 5, 2)), LinearRgba::GREEN),
        )
}

struct Harness {
    device: SoftwareDevice,
    target: FrameTarget,
    view: FrameView,
    frame: u64,
}

impl Harness {
    fn new() -> Self {
        Self::with_device(SoftwareDevice::new())
    }

    fn with_device(device: SoftwareDevice) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let target = frame_target(&device);
        Self {
            device,
            target,
            view: front_view(),
            frame: 0,
        }
    }

    fn prepare(&self, lane: &mut VisibilityLane, model: &ModelNode) -> Result<(), StrategyError> {
        lane.prepare(&self.device, model, &TargetFormats::default())
    }

    /// One harness frame: late update, then the frame pass with the render hook.
    fn frame(&mut self, lane: &mut VisibilityLane) {
        let ctx = FrameContext {
            device: &self.device,
            view: &self.view,
            frame_index: self.frame,
        };
        lane.late_update(&ctx).unwrap();
        let mut encoder = self.device.create_command_encoder(Some("frame"));
        {
            let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("frame".into()),
                color_attachment: RenderPassColorAttachment {
                    view: self.target.color,
                    ops: Operations {
                        load: LoadOp::Clear(ClearValue::Float(LinearRgba::BLACK)),
                        store: StoreOp::Store,
                    },
                },
                depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                    view: self.target.depth,
                    depth_ops: Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    },
                }),
            });
            lane.render(&ctx, pass.as_mut()).unwrap();
        }
        self.device.submit_command_buffer(encoder.finish()).unwrap();
        self.frame += 1;
    }

    fn run_until_sweep(&mut self, lane: &mut VisibilityLane, sweeps: u64) {
        for _ in 0..100 {
            if lane.sweeps_completed() >= sweeps {
                return;
            }
            self.frame(lane);
        }
        panic!("no sweep completed within 100 frames");
    }
}

fn frame_draws(log: &[ExecutedCommand]) -> Vec<DrawRecord> {
    log.iter()
        .filter_map(|c| match c {
            ExecutedCommand::RenderPass { label, draws, .. } if label.as_deref() == Some("frame") => {
                Some(draws.clone())
            }
            _ => None,
        })
        .flatten()
        .collect()
}

#[test]
fn every_unoccluded_triangle_is_found_visible() {
    let mut h = Harness::new();
    let mut lane = VisibilityLane::new(config(1024));
    h.prepare(&mut lane, &two_part_model()).unwrap();
    lane.set_enabled(true);
    h.run_until_sweep(&mut lane, 1);

    let set = lane.read_visible_set(&h.device).unwrap();
    assert_eq!(set.count, 30);
    assert_eq!(set.triangles, (0..30).collect::<Vec<_>>());
    assert!(!set.overflowed());

    let stats = lane.stats().unwrap();
    assert_eq!(stats.triangles, 30);
    assert_eq!(stats.chunks, 5);
    assert_eq!(stats.sweeps, 1);
}

#[test]
fn hidden_triangles_are_culled() {
    let mut h = Harness::new();
    let model = occluder_scene();
    let parts = model.renderable_parts();
    assert_eq!(parts[0].name, OCCLUDED_PANEL);
    assert_eq!(parts[1].name, OCCLUDER_WALL);
    let panel = parts[0].mesh.triangle_count() as u32;
    let wall = parts[1].mesh.triangle_count() as u32;

    let mut lane = VisibilityLane::new(config(1024));
    h.prepare(&mut lane, &model).unwrap();
    lane.set_enabled(true);
    h.run_until_sweep(&mut lane, 1);

    let set = lane.read_visible_set(&h.device).unwrap();
    assert_eq!(set.triangles, (panel..panel + wall).collect::<Vec<_>>());

    // The wall does not fill the widened view: corners stay empty, the centre is wall.
    let ids = lane.read_id_texture(&h.device).unwrap();
    assert_eq!(ids[0], ID_SENTINEL);
    assert_eq!(ids[ids.len() - 1], ID_SENTINEL);
    let centre = ids[32 * 64 + 32];
    assert!((panel..panel + wall).contains(&centre), "centre id {centre}");
}

#[test]
fn final_draw_waits_for_the_first_sweep() {
    let mut h = Harness::new();
    let mut lane = VisibilityLane::new(config(1024));
    h.prepare(&mut lane, &two_part_model()).unwrap();
    lane.set_enabled(true);

    // Frame 0 only records the transform; chunks follow, then the dispatch.
    for _ in 0..6 {
        h.frame(&mut lane);
    }
    assert_eq!(lane.sweeps_completed(), 0);
    assert!(frame_draws(&h.device.take_command_log()).is_empty());

    h.frame(&mut lane);
    assert_eq!(lane.sweeps_completed(), 1);
    let draws = frame_draws(&h.device.take_command_log());
    assert_eq!(draws.len(), 1);
    assert_eq!(draws[0].program, RenderProgram::VisibleTriangles);
    assert_eq!(draws[0].vertex_count, 90);
    assert!(draws[0].fragments_written > 0);
}

#[test]
fn every_dispatch_follows_the_complete_chunk_sequence() {
    let mut h = Harness::new();
    let mut lane = VisibilityLane::new(config(1024));
    h.prepare(&mut lane, &two_part_model()).unwrap();
    lane.set_enabled(true);
    h.run_until_sweep(&mut lane, 3);

    let expected: Vec<u32> = ChunkPlan::new(30, 5).chunks().map(|c| c.start).collect();
    let mut offsets = Vec::new();
    let mut dispatches = 0;
    for command in h.device.take_command_log() {
        match command {
            ExecutedCommand::RenderPass { draws, cleared, .. }
                if draws.iter().any(|d| d.program == RenderProgram::TriangleIds) =>
            {
                assert_eq!(cleared, offsets.is_empty(), "only the first chunk clears");
                offsets.extend(draws.iter().filter_map(|d| d.triangle_offset));
            }
            ExecutedCommand::ClearBuffer { .. } => {
                assert_eq!(offsets, expected);
                offsets.clear();
            }
            ExecutedCommand::Dispatch { kernel, .. } => {
                assert!(offsets.is_empty());
                if kernel == ComputeKernel::WriteDrawArgs {
                    dispatches += 1;
                }
            }
            _ => {}
        }
    }
    assert_eq!(dispatches, 3);
}

#[test]
fn reads_between_frames_never_see_a_partial_set() {
    let mut h = Harness::new();
    let mut lane = VisibilityLane::new(config(1024));
    h.prepare(&mut lane, &two_part_model()).unwrap();
    lane.set_enabled(true);

    let mut seen_complete = false;
    for _ in 0..25 {
        h.frame(&mut lane);
        let set = lane.read_visible_set(&h.device).unwrap();
        if seen_complete || lane.sweeps_completed() > 0 {
            seen_complete = true;
            assert_eq!(set.triangles.len(), 30);
        } else {
            assert_eq!(set.count, 0);
        }
    }
    assert!(lane.sweeps_completed() >= 3);
}

#[test]
fn visible_set_overflow_keeps_the_capacity_and_the_true_count() {
    let mut h = Harness::new();
    let mut lane = VisibilityLane::new(config(8));
    h.prepare(&mut lane, &two_part_model()).unwrap();
    lane.set_enabled(true);
    h.run_until_sweep(&mut lane, 1);

    let set = lane.read_visible_set(&h.device).unwrap();
    assert!(set.overflowed());
    assert_eq!(set.count, 30);
    assert_eq!(set.triangles, (0..8).collect::<Vec<_>>());

    h.device.take_command_log();
    h.frame(&mut lane);
    let draws = frame_draws(&h.device.take_command_log());
    assert_eq!(draws[0].vertex_count, 24);
}

#[test]
fn enabling_twice_keeps_the_running_sweep() {
    let mut h = Harness::new();
    let mut lane = VisibilityLane::new(config(1024));
    h.prepare(&mut lane, &two_part_model()).unwrap();
    lane.set_enabled(true);
    for _ in 0..3 {
        h.frame(&mut lane);
    }
    let phase = lane.phase();
    assert_eq!(phase, Some(SweepPhase::RenderingChunk(2)));

    lane.set_enabled(true);
    assert_eq!(lane.phase(), phase);
    assert!(lane.is_enabled());
}

#[test]
fn disabling_cancels_and_re_enabling_starts_a_fresh_sweep() {
    let mut h = Harness::new();
    let mut lane = VisibilityLane::new(config(1024));
    h.prepare(&mut lane, &two_part_model()).unwrap();
    lane.set_enabled(true);
    for _ in 0..3 {
        h.frame(&mut lane);
    }

    lane.set_enabled(false);
    lane.set_enabled(false);
    assert_eq!(lane.phase(), None);
    let submissions = h.device.submission_count();
    h.frame(&mut lane);
    // Only the frame pass itself was submitted.
    assert_eq!(h.device.submission_count(), submissions + 1);

    lane.set_enabled(true);
    assert_eq!(lane.phase(), Some(SweepPhase::WaitingForTransform));
    h.device.take_command_log();
    h.frame(&mut lane);
    let restarted = h.device.take_command_log().into_iter().any(|c| {
        matches!(c, ExecutedCommand::RenderPass { cleared: true, ref draws, .. }
            if draws.iter().any(|d| d.triangle_offset == Some(0)))
    });
    assert!(restarted, "the new sweep starts over at chunk 0");
}

#[test]
fn dispose_while_enabled_cancels_and_releases_everything() {
    let h = Harness::new();
    let buffers = h.device.live_buffer_count();
    let textures = h.device.live_texture_count();

    let mut lane = VisibilityLane::new(config(1024));
    h.prepare(&mut lane, &two_part_model()).unwrap();
    lane.set_enabled(true);
    assert!(h.device.live_buffer_count() > buffers);

    lane.dispose(&h.device);
    assert!(!lane.is_enabled());
    assert_eq!(lane.phase(), None);
    assert_eq!(h.device.live_buffer_count(), buffers);
    assert_eq!(h.device.live_texture_count(), textures);
    assert!(matches!(
        lane.read_visible_set(&h.device),
        Err(StrategyError::NotPrepared)
    ));
}

#[test]
fn lifecycle_misuse_is_reported() {
    let h = Harness::new();
    let mut lane = VisibilityLane::new(config(1024));
    assert!(matches!(
        h.prepare(&mut lane, &ModelNode::new("empty")),
        Err(StrategyError::InvalidModel(_))
    ));
    h.prepare(&mut lane, &two_part_model()).unwrap();
    assert!(matches!(
        h.prepare(&mut lane, &two_part_model()),
        Err(StrategyError::AlreadyPrepared)
    ));

    let mut invalid = VisibilityLane::new(VisibilityConfig {
        fov_ratio: 0.5,
        ..config(16)
    });
    assert!(matches!(
        h.prepare(&mut invalid, &two_part_model()),
        Err(StrategyError::PrepareFailed(_))
    ));
}

fn limited(max_storage_bytes: u64, max_workgroups: u32) -> SoftwareDevice {
    SoftwareDevice::with_limits(DeviceLimits {
        max_buffer_size: 1 << 20,
        max_storage_buffer_binding_size: max_storage_bytes,
        max_compute_workgroups_per_dimension: max_workgroups,
    })
}

#[test]
fn models_beyond_the_storage_limit_are_rejected_before_allocation() {
    // 30 triangles unpack into 2880 bytes of records.
    let h = Harness::with_device(limited(2048, 65535));
    let buffers = h.device.live_buffer_count();
    let mut lane = VisibilityLane::new(config(16));
    let err = h.prepare(&mut lane, &two_part_model()).unwrap_err();
    assert!(matches!(err, StrategyError::InvalidModel(_)), "{err}");
    assert_eq!(h.device.live_buffer_count(), buffers);

    let h = Harness::with_device(limited(4096, 65535));
    let mut oversized_set = VisibilityLane::new(config(1024));
    assert!(matches!(
        h.prepare(&mut oversized_set, &two_part_model()),
        Err(StrategyError::PrepareFailed(_))
    ));
    let mut lane = VisibilityLane::new(config(16));
    h.prepare(&mut lane, &two_part_model()).unwrap();
}

#[test]
fn compaction_folds_its_grid_under_a_tight_workgroup_limit() {
    let model = ModelNode::new("dense")
        .with_part(Arc::new(Mesh::grid(4.0, 4.0, 20, 20)), LinearRgba::WHITE);
    let sweep = |device: SoftwareDevice| {
        let mut h = Harness::with_device(device);
        let mut lane = VisibilityLane::new(config(1024));
        h.prepare(&mut lane, &model).unwrap();
        lane.set_enabled(true);
        h.run_until_sweep(&mut lane, 1);
        let grids: Vec<_> = h
            .device
            .take_command_log()
            .into_iter()
            .filter_map(|c| match c {
                ExecutedCommand::Dispatch {
                    kernel: ComputeKernel::CompactVisible,
                    workgroups,
                    ..
                } => Some(workgroups),
                _ => None,
            })
            .collect();
        (lane.read_visible_set(&h.device).unwrap(), grids)
    };

    let (reference, grids) = sweep(SoftwareDevice::new());
    assert_eq!(grids, vec![[13, 1, 1]]);
    // 800 triangles need 13 workgroups, folded into rows of 8.
    let (folded, grids) = sweep(limited(1 << 20, 8));
    assert_eq!(grids, vec![[8, 2, 1]]);

    assert_eq!(folded, reference);
    assert!(folded.triangles.iter().any(|&t| t >= 8 * 64), "second row contributes");
}
