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

//! The draw strategies compared by the benchmark.
//!
//! Every lane draws the same model and produces the same image from a
//! different submission scheme:
//!
//! | Lane | Scheme |
//! |---|---|
//! | [`MaterialBatchLane`] | vertex buffers, one material per distinct colour, draws grouped by material |
//! | [`PropertyBlockLane`] | vertex buffers, one shared program, per-draw transform and colour |
//! | [`ProceduralLane`] | storage buffers read by a procedural draw, indexed or unpacked |
//! | [`VisibilityLane`] | only the triangles an ID-buffer sweep found visible, one indirect draw |

mod material_batch_lane;
mod procedural_lane;
mod property_block_lane;
pub(crate) mod resources;
mod visibility_lane;

pub use material_batch_lane::MaterialBatchLane;
pub use procedural_lane::{ProceduralLane, ProceduralLayout};
pub use property_block_lane::PropertyBlockLane;
pub use visibility_lane::{
    ChunkPlan, SweepDriver, SweepPhase, SweepStep, SweepTask, VisibilityLane, VisibilityStats,
    VisibleSet,
};

use resources::ResourceLedger;
use tricull_core::renderer::{
    GraphicsDevice, RenderPipelineDescriptor, RenderPipelineId, RenderProgram, ResourceError,
};
use tricull_core::TargetFormats;

/// Logs an enable/disable transition. Returns `false` if nothing changed.
pub(crate) fn switch_enabled(name: &str, current: &mut bool, requested: bool) -> bool {
    if *current == requested {
        return false;
    }
    *current = requested;
    log::debug!("{name}: {}", if requested { "enabled" } else { "disabled" });
    true
}

/// Creates a pipeline drawing into the harness's frame targets.
pub(crate) fn frame_pipeline(
    device: &dyn GraphicsDevice,
    ledger: &mut ResourceLedger,
    program: RenderProgram,
    targets: &TargetFormats,
) -> Result<RenderPipelineId, ResourceError> {
    let id = device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some(format!("{program:?}").into()),
        program,
        color_format: targets.color,
        depth_format: targets.depth,
    })?;
    Ok(ledger.render_pipeline(id))
}
