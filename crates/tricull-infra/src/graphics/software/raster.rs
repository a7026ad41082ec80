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

//! Triangle rasterization into `u32` texel grids.
//!
//! Conventions match wgpu: clip space has `0 <= z <= w`, NDC `+y` is up and
//! framebuffer row 0 is the top. Pixels are sampled at their centers, no face
//! culling is applied and the depth test is `Less`.

use tricull_core::math::Vec4;

const W_EPSILON: f32 = 1e-6;

/// A color target and an optional depth target of identical size.
pub(crate) struct RasterTarget<'a> {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) color: &'a mut [u32],
    /// `f32` depth values stored as bits.
    pub(crate) depth: Option<&'a mut [u32]>,
}

#[derive(Debug, Clone, Copy)]
struct ScreenVertex {
    x: f32,
    y: f32,
    z: f32,
}

impl RasterTarget<'_> {
    /// Rasterizes one triangle with a flat texel value.
    ///
    /// Returns the number of fragments that passed the depth test.
    pub(crate) fn draw_triangle(&mut self, clip: [Vec4; 3], texel: u32) -> u64 {
        let polygon = clip_polygon(&clip);
        if polygon.len() < 3 {
            return 0;
        }
        let screen: Vec<ScreenVertex> = polygon.iter().map(|v| self.to_screen(*v)).collect();
        let mut written = 0;
        for i in 1..screen.len() - 1 {
            written += self.fill(screen[0], screen[i], screen[i + 1], texel);
        }
        written
    }

    fn to_screen(&self, v: Vec4) -> ScreenVertex {
        let inv_w = 1.0 / v.w;
        ScreenVertex {
            x: (v.x * inv_w * 0.5 + 0.5) * self.width as f32,
            y: (0.5 - v.y * inv_w * 0.5) * self.height as f32,
            z: (v.z * inv_w).clamp(0.0, 1.0),
        }
    }

    fn fill(&mut self, a: ScreenVertex, b: ScreenVertex, c: ScreenVertex, texel: u32) -> u64 {
        let area = edge(a, b, c.x, c.y);
        if area == 0.0 || !area.is_finite() {
            return 0;
        }
        // Orient every triangle the same way so one fill rule serves both windings.
        let (b, c, area) = if area < 0.0 { (c, b, -area) } else { (b, c, area) };

        let min_x = a.x.min(b.x).min(c.x).floor().max(0.0) as u32;
        let min_y = a.y.min(b.y).min(c.y).floor().max(0.0) as u32;
        let max_x = (a.x.max(b.x).max(c.x).ceil().max(0.0) as u32).min(self.width);
        let max_y = (a.y.max(b.y).max(c.y).ceil().max(0.0) as u32).min(self.height);

        let owns_bc = owns_edge(b, c);
        let owns_ca = owns_edge(c, a);
        let owns_ab = owns_edge(a, b);

        let mut written = 0;
        for py in min_y..max_y {
            let sy = py as f32 + 0.5;
            for px in min_x..max_x {
                let sx = px as f32 + 0.5;
                let w0 = edge(b, c, sx, sy);
                let w1 = edge(c, a, sx, sy);
                let w2 = edge(a, b, sx, sy);
                if !(covers(w0, owns_bc) && covers(w1, owns_ca) && covers(w2, owns_ab)) {
                    continue;
                }
                let z = (w0 * a.z + w1 * b.z + w2 * c.z) / area;
                let index = (py * self.width + px) as usize;
                if let Some(depth) = self.depth.as_deref_mut() {
                    if z >= f32::from_bits(depth[index]) {
                        continue;
                    }
                    depth[index] = z.to_bits();
                }
                self.color[index] = texel;
                written += 1;
            }
        }
        written
    }
}

/// Signed doubled area of `(a, b, p)`; positive when `p` is on the interior
/// side of a positively oriented triangle.
fn edge(a: ScreenVertex, b: ScreenVertex, px: f32, py: f32) -> f32 {
    (b.x - a.x) * (py - a.y) - (b.y - a.y) * (px - a.x)
}

/// Tie-break for samples exactly on an edge. Two triangles sharing an edge
/// traverse it in opposite directions, so exactly one of them owns it.
fn owns_edge(a: ScreenVertex, b: ScreenVertex) -> bool {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    dy > 0.0 || (dy == 0.0 && dx < 0.0)
}

fn covers(w: f32, owns: bool) -> bool {
    w > 0.0 || (w == 0.0 && owns)
}

/// Clips a triangle against `w > 0`, the near plane `z >= 0` and the far
/// plane `z <= w`. X and Y are left to the viewport scissor.
fn clip_polygon(triangle: &[Vec4; 3]) -> Vec<Vec4> {
    let planes: [fn(&Vec4) -> f32; 3] = [|v| v.w - W_EPSILON, |v| v.z, |v| v.w - v.z];
    let mut polygon: Vec<Vec4> = triangle.to_vec();
    for plane in planes {
        if polygon.is_empty() {
            break;
        }
        let mut clipped = Vec::with_capacity(polygon.len() + 1);
        for i in 0..polygon.len() {
            let current = polygon[i];
            let next = polygon[(i + 1) % polygon.len()];
            let (dc, dn) = (plane(&current), plane(&next));
            if dc >= 0.0 {
                clipped.push(current);
            }
            if (dc >= 0.0) != (dn >= 0.0) {
                clipped.push(current.lerp(next, dc / (dc - dn)));
            }
        }
        polygon = clipped;
    }
    polygon
}
