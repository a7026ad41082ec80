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

//! Generated scenes with known structure.

use super::palette_color;
use std::sync::Arc;
use tricull_core::math::{LinearRgba, Mat4, Vec3};
use tricull_core::scene::{Mesh, ModelNode};

/// Name of the wall part of [`occluder_scene`].
pub const OCCLUDER_WALL: &str = "wall";
/// Name of the hidden part of [`occluder_scene`].
pub const OCCLUDED_PANEL: &str = "hidden panel";

/// A `cols x rows x layers` block of boxes centred on the origin.
///
/// Layers stack along `-Z`, so seen from `+Z` only the front layer and the
/// sides are visible. All boxes share one mesh; each has its own colour.
pub fn box_grid(cols: u32, rows: u32, layers: u32, spacing: f32) -> ModelNode {
    let cube = Arc::new(Mesh::cuboid(Vec3::ONE * (spacing * 0.8)));
    let center = |count: u32| (count.max(1) - 1) as f32 * spacing * 0.5;
    let (cx, cy) = (center(cols), center(rows));

    let mut root = ModelNode::new("box grid");
    let mut index = 0;
    for layer in 0..layers.max(1) {
        for row in 0..rows.max(1) {
            for col in 0..cols.max(1) {
                let offset = Vec3::new(
                    col as f32 * spacing - cx,
                    row as f32 * spacing - cy,
                    -(layer as f32) * spacing,
                );
                root = root.with_child(
                    ModelNode::new(format!("box {col},{row},{layer}"))
                        .with_transform(Mat4::from_translation(offset))
                        .with_part(Arc::clone(&cube), palette_color(index)),
                );
                index += 1;
            }
        }
    }
    root
}

/// A small panel at `z = 0` entirely hidden behind a larger wall at `z = 1`,
/// for a camera on the `+Z` axis looking at the origin.
///
/// The panel is part 0 and the wall part 1, so the panel's triangles are
/// rasterised first and must lose the depth test.
pub fn occluder_scene() -> ModelNode {
    ModelNode::new("occluder scene")
        .with_child(
            ModelNode::new(OCCLUDED_PANEL)
                .with_part(Arc::new(Mesh::grid(1.0, 1.0, 2, 2)), LinearRgba::RED),
        )
        .with_child(
            ModelNode::new(OCCLUDER_WALL)
                .with_transform(Mat4::from_translation(Vec3::new(0.0, 0.0, 1.0)))
                .with_part(Arc::new(Mesh::grid(3.0, 3.0, 2, 2)), LinearRgba::BLUE),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_grid_shares_one_mesh() {
        let model = box_grid(3, 2, 2, 1.0);
        let parts = model.renderable_parts();
        assert_eq!(parts.len(), 12);
        assert_eq!(model.triangle_count(), 12 * 12);
        assert!(parts.iter().all(|p| Arc::ptr_eq(&p.mesh, &parts[0].mesh)));
    }

    #[test]
    fn box_grid_is_centred() {
        let parts = box_grid(3, 1, 1, 2.0).renderable_parts();
        let xs: Vec<f32> = parts
            .iter()
            .map(|p| p.transform.transform_point3(Vec3::ZERO).x)
            .collect();
        assert_eq!(xs, vec![-2.0, 0.0, 2.0]);
    }

    #[test]
    fn occluder_scene_puts_the_panel_first() {
        let parts = occluder_scene().renderable_parts();
        assert_eq!(parts[0].name, OCCLUDED_PANEL);
        assert_eq!(parts[1].name, OCCLUDER_WALL);
        assert_eq!(parts[0].mesh.triangle_count(), 8);
    }
}
