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

//! Model sources: OBJ files and procedural scenes.

mod obj_loader_lane;
mod procedural;

pub use obj_loader_lane::ObjModelLoader;
pub use procedural::{box_grid, occluder_scene, OCCLUDED_PANEL, OCCLUDER_WALL};

use tricull_core::math::LinearRgba;

/// A deterministic, well-spread colour for part `index`.
pub fn palette_color(index: usize) -> LinearRgba {
    // Golden-ratio hue steps never repeat and stay far apart for neighbours.
    const GOLDEN: f32 = 0.618_034;
    LinearRgba::from_hsv((index as f32 * GOLDEN).fract(), 0.65, 0.9)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighbouring_palette_entries_differ() {
        for i in 0..32 {
            assert_ne!(palette_color(i), palette_color(i + 1));
        }
        assert_eq!(palette_color(5), palette_color(5));
    }
}
