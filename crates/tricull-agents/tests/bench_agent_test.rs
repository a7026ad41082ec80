use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tricull_agents::{
    BenchAgent, BenchConfig, BenchError, FrameTargets, ModelSource, OrbitConfig, StrategyKind,
};
use tricull_core::math::Extent2D;
use tricull_core::renderer::{GraphicsDevice, RenderPass};
use tricull_core::scene::ModelNode;
use tricull_core::{DrawStrategy, FrameContext, StrategyError, TargetFormats, VisibilityConfig};
use tricull_infra::SoftwareDevice;
use tricull_lanes::VisibilityLane;

fn small_config() -> BenchConfig {
    BenchConfig {
        resolution: [32, 24],
        warmup_frames: 2,
        measured_frames: 3,
        orbit: OrbitConfig {
            radius: 5.0,
            height: 2.0,
            ..Default::default()
        },
        model: ModelSource::Procedural {
            cols: 2,
            rows: 2,
            layers: 1,
            spacing: 1.5,
        },
        visibility: VisibilityConfig {
            id_resolution: 32,
            frames_per_sweep: 2,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn agent_with(device: &Arc<SoftwareDevice>, config: BenchConfig) -> BenchAgent {
    let _ = env_logger::builder().is_test(true).try_init();
    BenchAgent::new(device.clone(), config).unwrap()
}

/// Counts lifecycle calls and fails to render from a given frame on.
struct ScriptedStrategy {
    enabled: bool,
    fail_at: Option<u64>,
    renders: Arc<AtomicUsize>,
    disposals: Arc<AtomicUsize>,
}

impl ScriptedStrategy {
    fn new(fail_at: Option<u64>) -> (Self, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let renders = Arc::new(AtomicUsize::new(0));
        let disposals = Arc::new(AtomicUsize::new(0));
        let strategy = Self {
            enabled: false,
            fail_at,
            renders: renders.clone(),
            disposals: disposals.clone(),
        };
        (strategy, renders, disposals)
    }
}

impl DrawStrategy for ScriptedStrategy {
    fn strategy_name(&self) -> &'static str {
        "Scripted"
    }

    fn prepare(
        &mut self,
        _device: &dyn GraphicsDevice,
        _model: &ModelNode,
        _targets: &TargetFormats,
    ) -> Result<(), StrategyError> {
        Ok(())
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn render(
        &mut self,
        ctx: &FrameContext<'_>,
        _pass: &mut dyn RenderPass,
    ) -> Result<(), StrategyError> {
        assert!(self.enabled, "rendered while disabled");
        if self.fail_at.is_some_and(|frame| ctx.frame_index >= frame) {
            return Err(StrategyError::InvalidCamera);
        }
        self.renders.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn dispose(&mut self, _device: &dyn GraphicsDevice) {
        assert!(!self.enabled, "disposed while enabled");
        self.disposals.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn run_measures_every_configured_strategy() {
    let device = Arc::new(SoftwareDevice::new());
    let config = small_config();
    let model = config.model.build().unwrap();
    let mut agent = agent_with(&device, config);
    agent.add_configured_strategies();
    assert_eq!(agent.strategy_names().len(), StrategyKind::ALL.len());
    agent.prepare_all(&model).unwrap();

    let report = agent.run().unwrap();

    assert_eq!(report.resolution, [32, 24]);
    assert_eq!(report.model_triangles, 4 * 12);
    let names: Vec<_> = report.strategies.iter().map(|s| s.strategy.as_str()).collect();
    let expected: Vec<_> = StrategyKind::ALL.iter().map(|k| k.name()).collect();
    assert_eq!(names, expected);
    for strategy in &report.strategies {
        assert_eq!(strategy.samples_ms.len(), 3, "{}", strategy.strategy);
        assert_eq!(strategy.frame_time.unwrap().count, 3);
        assert_eq!(strategy.warmup_frames, 2);
    }
    assert!(agent.strategy_names().is_empty(), "run disposes every strategy");
    assert_eq!(device.live_buffer_count(), 0);
}

#[test]
fn strategies_run_one_at_a_time_in_order() {
    let device = Arc::new(SoftwareDevice::new());
    let mut agent = agent_with(&device, small_config());
    let (first, first_renders, first_disposals) = ScriptedStrategy::new(None);
    let (second, second_renders, second_disposals) = ScriptedStrategy::new(None);
    agent.add_strategy(Box::new(first));
    agent.add_strategy(Box::new(second));
    agent.prepare_all(&ModelNode::new("unused")).unwrap();

    let report = agent.run().unwrap();

    // Warm-up frames render too.
    assert_eq!(first_renders.load(Ordering::SeqCst), 5);
    assert_eq!(second_renders.load(Ordering::SeqCst), 5);
    assert_eq!(first_disposals.load(Ordering::SeqCst), 1);
    assert_eq!(second_disposals.load(Ordering::SeqCst), 1);
    // Both share the name, so their samples land in one series.
    assert_eq!(report.strategies.len(), 1);
    assert_eq!(report.strategies[0].samples_ms.len(), 6);
}

#[test]
fn a_failing_strategy_aborts_the_run_and_everything_is_disposed() {
    let device = Arc::new(SoftwareDevice::new());
    let config = small_config();
    let model = config.model.build().unwrap();
    let mut agent = agent_with(&device, config);
    let (failing, renders, disposals) = ScriptedStrategy::new(Some(3));
    agent.add_strategy(Box::new(failing));
    agent.add_strategy(StrategyKind::MaterialBatch.build(&VisibilityConfig::default()));
    agent.prepare_all(&model).unwrap();
    assert!(device.live_buffer_count() > 0);

    let err = agent.run().unwrap_err();

    assert!(matches!(
        err,
        BenchError::Strategy {
            name: "Scripted",
            source: StrategyError::InvalidCamera
        }
    ));
    assert_eq!(renders.load(Ordering::SeqCst), 3);
    assert_eq!(disposals.load(Ordering::SeqCst), 1);
    assert_eq!(device.live_buffer_count(), 0);
    // The failed frame is not part of the series.
    assert_eq!(agent.telemetry().series("Scripted").unwrap().len(), 1);
}

#[test]
fn external_strategies_can_be_driven_frame_by_frame() {
    let device = Arc::new(SoftwareDevice::new());
    let config = small_config();
    let model = ModelSource::Occluder.build().unwrap();
    let mut agent = agent_with(&device, config.clone());

    let mut lane = VisibilityLane::new(config.visibility.clone());
    lane.prepare(device.as_ref(), &model, &agent.targets().formats())
        .unwrap();
    lane.set_enabled(true);
    // One stalled frame until the transform is known, one per chunk, one dispatch.
    for _ in 0..config.visibility.frames_per_sweep + 2 {
        agent.drive_frame(&mut lane).unwrap();
    }
    assert_eq!(lane.sweeps_completed(), 1);
    let ids = lane.read_id_texture(device.as_ref()).unwrap();
    assert_eq!(ids.len(), 32 * 32);

    lane.set_enabled(false);
    lane.dispose(device.as_ref());
}

#[test]
fn frames_are_drawn_into_the_colour_target() {
    let device = Arc::new(SoftwareDevice::new());
    let config = BenchConfig {
        strategies: vec![StrategyKind::PropertyBlock],
        ..small_config()
    };
    let model = config.model.build().unwrap();
    let mut agent = agent_with(&device, config);

    let mut strategy = StrategyKind::PropertyBlock.build(&VisibilityConfig::default());
    strategy
        .prepare(device.as_ref(), &model, &agent.targets().formats())
        .unwrap();
    agent.drive_frame(strategy.as_mut()).unwrap();
    let background = agent.read_frame().unwrap();
    assert!(background.windows(2).all(|w| w[0] == w[1]), "disabled draws nothing");

    strategy.set_enabled(true);
    agent.drive_frame(strategy.as_mut()).unwrap();
    let drawn = agent.read_frame().unwrap();
    assert!(drawn.iter().zip(&background).any(|(a, b)| a != b));

    strategy.set_enabled(false);
    strategy.dispose(device.as_ref());
}

#[test]
fn invalid_configurations_are_rejected_before_any_allocation() {
    let device = Arc::new(SoftwareDevice::new());
    let config = BenchConfig {
        resolution: [0, 24],
        ..small_config()
    };
    assert!(matches!(
        BenchAgent::new(device.clone(), config),
        Err(BenchError::InvalidConfig(_))
    ));
    assert_eq!(device.live_texture_count(), 0);
}

#[test]
fn configuration_loads_from_a_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        "(resolution: (64, 48), strategies: [MaterialBatch, VisibleTriangles])"
    )
    .unwrap();
    let config = BenchConfig::load(file.path()).unwrap();
    assert_eq!(config.resolution, [64, 48]);
    assert_eq!(
        config.strategies,
        [StrategyKind::MaterialBatch, StrategyKind::VisibleTriangles]
    );

    assert!(matches!(
        BenchConfig::load(file.path().with_extension("missing")),
        Err(BenchError::Io { .. })
    ));
}

#[test]
fn frame_targets_are_created_in_the_formats_strategies_build_for() {
    let device = SoftwareDevice::new();
    let targets = FrameTargets::create(&device, Extent2D::new(32, 24)).unwrap();
    assert_eq!(targets.formats(), TargetFormats::default());
    assert_eq!(device.live_texture_count(), 2);

    // Four bytes per texel of the default colour format.
    let texels = device.read_texture(targets.color).unwrap();
    assert_eq!(texels.len(), 32 * 24 * 4);

    targets.release(&device);
    assert_eq!(device.live_texture_count(), 0);
}
