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

//! # tricull Lanes
//!
//! The hot-path implementations behind the `tricull-core` contracts.
//!
//! * [`import_lane`]: packs meshes into the structured records the procedural
//!   programs read, and uploads them.
//! * [`render_lane`]: every [`DrawStrategy`](tricull_core::DrawStrategy) the
//!   benchmark compares, including the GPU visible-triangle engine.
//! * [`asset_lane`]: model sources, from OBJ files or generated procedurally.

pub mod asset_lane;
pub mod import_lane;
pub mod render_lane;

pub use asset_lane::{box_grid, occluder_scene, ObjModelLoader};
pub use import_lane::{ImportError, IndexedImport, StructuredBufferImporter, UnpackedImport};
pub use render_lane::{
    ChunkPlan, MaterialBatchLane, ProceduralLane, ProceduralLayout, PropertyBlockLane,
    SweepDriver, SweepPhase, SweepStep, SweepTask, VisibilityLane, VisibilityStats, VisibleSet,
};
