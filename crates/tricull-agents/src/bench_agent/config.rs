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

//! Benchmark configuration, read from RON.

use super::BenchError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tricull_core::math::{degrees_to_radians, Extent2D, Mat4, Vec3};
use tricull_core::scene::{Camera, ModelNode};
use tricull_core::{DrawStrategy, FrameView, VisibilityConfig};
use tricull_lanes::{
    box_grid, occluder_scene, MaterialBatchLane, ObjModelLoader, ProceduralLane,
    ProceduralLayout, PropertyBlockLane, VisibilityLane,
};

/// The strategies the harness knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyKind {
    MaterialBatch,
    PropertyBlock,
    IndexedProcedural,
    UnpackedProcedural,
    VisibleTriangles,
}

impl StrategyKind {
    /// Every strategy, in the order they are benchmarked by default.
    pub const ALL: [StrategyKind; 5] = [
        StrategyKind::MaterialBatch,
        StrategyKind::PropertyBlock,
        StrategyKind::IndexedProcedural,
        StrategyKind::UnpackedProcedural,
        StrategyKind::VisibleTriangles,
    ];

    /// Same as the built strategy's `strategy_name()`.
    pub fn name(self) -> &'static str {
        match self {
            StrategyKind::MaterialBatch => "MaterialBatch",
            StrategyKind::PropertyBlock => "PropertyBlock",
            StrategyKind::IndexedProcedural => "IndexedProcedural",
            StrategyKind::UnpackedProcedural => "UnpackedProcedural",
            StrategyKind::VisibleTriangles => "VisibleTriangles",
        }
    }

    pub fn build(self, visibility: &VisibilityConfig) -> Box<dyn DrawStrategy> {
        match self {
            StrategyKind::MaterialBatch => Box::new(MaterialBatchLane::new()),
            StrategyKind::PropertyBlock => Box::new(PropertyBlockLane::new()),
            StrategyKind::IndexedProcedural => {
                Box::new(ProceduralLane::new(ProceduralLayout::Indexed))
            }
            StrategyKind::UnpackedProcedural => {
                Box::new(ProceduralLane::new(ProceduralLayout::Unpacked))
            }
            StrategyKind::VisibleTriangles => Box::new(VisibilityLane::new(visibility.clone())),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Case-insensitive, so `--strategy materialbatch` works.
impl FromStr for StrategyKind {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StrategyKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| BenchError::UnknownStrategy(s.to_string()))
    }
}

/// Where the benchmark model comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModelSource {
    /// A grid of boxes, one part per box.
    Procedural {
        cols: u32,
        rows: u32,
        layers: u32,
        spacing: f32,
    },
    /// The small occlusion test scene: a wall hiding a panel.
    Occluder,
    /// A Wavefront OBJ file.
    Obj { path: PathBuf },
}

impl Default for ModelSource {
    fn default() -> Self {
        ModelSource::Procedural {
            cols: 16,
            rows: 16,
            layers: 8,
            spacing: 1.5,
        }
    }
}

impl ModelSource {
    pub fn build(&self) -> Result<ModelNode, BenchError> {
        match self {
            ModelSource::Procedural {
                cols,
                rows,
                layers,
                spacing,
            } => Ok(box_grid(*cols, *rows, *layers, *spacing)),
            ModelSource::Occluder => Ok(occluder_scene()),
            ModelSource::Obj { path } => ObjModelLoader
                .load_file(path)
                .map_err(BenchError::Model),
        }
    }
}

/// The camera circles the origin at a fixed height, advancing every frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitConfig {
    pub radius: f32,
    pub height: f32,
    pub degrees_per_frame: f32,
    pub fov_y_degrees: f32,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            radius: 30.0,
            height: 10.0,
            degrees_per_frame: 0.5,
            fov_y_degrees: 60.0,
        }
    }
}

impl OrbitConfig {
    /// The main view of frame `frame_index`.
    pub fn view_at(&self, frame_index: u64, aspect: f32) -> FrameView {
        // Wrapped so the angle keeps its precision on long runs.
        let degrees = (frame_index as f64 * self.degrees_per_frame as f64).rem_euclid(360.0);
        let angle = degrees_to_radians(degrees as f32);
        let position = Vec3::new(
            self.radius * angle.cos(),
            self.height,
            self.radius * angle.sin(),
        );
        FrameView {
            camera: Camera::looking_at(
                position,
                Vec3::ZERO,
                degrees_to_radians(self.fov_y_degrees),
                aspect,
            ),
            root_transform: Mat4::IDENTITY,
        }
    }
}

/// Everything one benchmark run needs.
///
/// Missing RON fields fall back to [`BenchConfig::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Frame target size, `[width, height]`.
    pub resolution: [u32; 2],
    /// Frames rendered before measuring each strategy.
    pub warmup_frames: u32,
    /// Frames measured per strategy.
    pub measured_frames: u32,
    pub orbit: OrbitConfig,
    pub model: ModelSource,
    /// Strategies to run, in order.
    pub strategies: Vec<StrategyKind>,
    pub visibility: VisibilityConfig,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            resolution: [1280, 720],
            warmup_frames: 30,
            measured_frames: 300,
            orbit: OrbitConfig::default(),
            model: ModelSource::default(),
            strategies: StrategyKind::ALL.to_vec(),
            visibility: VisibilityConfig::default(),
        }
    }
}

impl BenchConfig {
    pub fn from_ron_str(ron: &str) -> Result<Self, BenchError> {
        Ok(ron::from_str(ron)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, BenchError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| BenchError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_ron_str(&text)?;
        log::info!("Loaded benchmark configuration from {}", path.display());
        Ok(config)
    }

    pub fn extent(&self) -> Extent2D {
        Extent2D::new(self.resolution[0], self.resolution[1])
    }

    pub fn validate(&self) -> Result<(), BenchError> {
        let invalid = |msg: &str| Err(BenchError::InvalidConfig(msg.to_string()));
        if self.resolution.contains(&0) {
            return invalid("resolution must be at least 1x1");
        }
        if self.measured_frames == 0 {
            return invalid("measured_frames must be at least 1");
        }
        if self.strategies.is_empty() {
            return invalid("at least one strategy is required");
        }
        if self.orbit.radius.is_nan() || self.orbit.radius <= 0.0 {
            return invalid("orbit radius must be positive");
        }
        if !(self.orbit.fov_y_degrees > 0.0 && self.orbit.fov_y_degrees < 179.0) {
            return invalid("orbit fov_y_degrees must be in (0, 179)");
        }
        self.visibility
            .validate(degrees_to_radians(self.orbit.fov_y_degrees))?;
        Ok(())
    }
}
