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

//! Saves the visibility lane's triangle-ID texture as an image.

use anyhow::{bail, Context, Result};
use image::{ImageFormat, Rgba, RgbaImage};
use std::path::Path;
use tricull_agents::BenchAgent;
use tricull_core::renderer::ID_SENTINEL;
use tricull_core::scene::ModelNode;
use tricull_core::DrawStrategy;
use tricull_lanes::asset_lane::palette_color;
use tricull_lanes::VisibilityLane;

/// Colours an ID texture: empty texels black, every id its own colour.
pub fn id_image(ids: &[u32], size: u32) -> RgbaImage {
    RgbaImage::from_fn(size, size, |x, y| {
        match ids.get((y * size + x) as usize) {
            Some(&id) if id != ID_SENTINEL => {
                Rgba(palette_color(id as usize).to_rgba8().to_le_bytes())
            }
            _ => Rgba([0, 0, 0, 255]),
        }
    })
}

/// Runs a fresh visibility lane through one full sweep on the agent's frame
/// path and writes its ID texture to `path`.
pub fn dump_id_texture(agent: &mut BenchAgent, model: &ModelNode, path: &Path) -> Result<()> {
    let device = agent.device().clone();
    let config = agent.config().visibility.clone();
    let mut lane = VisibilityLane::new(config.clone());
    lane.prepare(device.as_ref(), model, &agent.targets().formats())?;
    lane.set_enabled(true);

    let result = (|| -> Result<()> {
        // One stalled frame, one per chunk, one dispatch.
        let max_frames = config.frames_per_sweep + 2;
        for _ in 0..max_frames {
            if lane.sweeps_completed() > 0 {
                break;
            }
            agent.drive_frame(&mut lane)?;
        }
        if lane.sweeps_completed() == 0 {
            bail!("No visibility sweep completed within {max_frames} frames");
        }
        let ids = lane.read_id_texture(device.as_ref())?;
        if let Ok(visible) = lane.read_visible_set(device.as_ref()) {
            log::info!(
                "Visibility sweep found {} of {} triangles",
                visible.count,
                model.triangle_count()
            );
        }
        id_image(&ids, config.id_resolution)
            .save_with_format(path, ImageFormat::Png)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("ID texture written to {}", path.display());
        Ok(())
    })();

    lane.set_enabled(false);
    lane.dispose(device.as_ref());
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_texels_are_black_and_ids_are_coloured() {
        let image = id_image(&[ID_SENTINEL, 0, 7, ID_SENTINEL], 2);
        assert_eq!(image.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
        assert_eq!(image.get_pixel(1, 1), &Rgba([0, 0, 0, 255]));
        assert_ne!(image.get_pixel(1, 0), image.get_pixel(0, 1));
        assert_eq!(image.get_pixel(1, 0)[3], 255);
    }
}
