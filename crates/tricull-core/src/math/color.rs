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

//! Linear-space colors.

/// A color in **linear RGBA** space with `f32` components.
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable, serde::Serialize, serde::Deserialize)]
#[repr(C)]
pub struct LinearRgba {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
    /// Alpha.
    pub a: f32,
}

impl LinearRgba {
    /// Opaque red.
    pub const RED: Self = Self::rgb(1.0, 0.0, 0.0);
    /// Opaque green.
    pub const GREEN: Self = Self::rgb(0.0, 1.0, 0.0);
    /// Opaque blue.
    pub const BLUE: Self = Self::rgb(0.0, 0.0, 1.0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);

    /// Creates a color from all four components.
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Creates an opaque color.
    #[inline]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// Returns `[r, g, b, a]`.
    #[inline]
    pub const fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Builds a color from an HSV triple; `hue` is in turns (`0.0..1.0`).
    pub fn from_hsv(hue: f32, saturation: f32, value: f32) -> Self {
        let h = hue.rem_euclid(1.0) * 6.0;
        let c = value * saturation;
        let x = c * (1.0 - ((h % 2.0) - 1.0).abs());
        let m = value - c;
        let (r, g, b) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        Self::rgb(r + m, g + m, b + m)
    }

    /// Packs the color into `0xAABBGGRR`, the texel layout of `Rgba8Unorm`.
    pub fn to_rgba8(self) -> u32 {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u32;
        q(self.r) | (q(self.g) << 8) | (q(self.b) << 16) | (q(self.a) << 24)
    }

    /// Unpacks a `0xAABBGGRR` texel.
    pub fn from_rgba8(texel: u32) -> Self {
        let f = |shift: u32| ((texel >> shift) & 0xFF) as f32 / 255.0;
        Self::new(f(0), f(8), f(16), f(24))
    }

    /// Returns a copy with RGB multiplied by `factor`, alpha untouched.
    pub fn scale_rgb(self, factor: f32) -> Self {
        Self::new(self.r * factor, self.g * factor, self.b * factor, self.a)
    }
}

impl Default for LinearRgba {
    fn default() -> Self {
        Self::WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn rgba8_packing_round_trips_within_quantization() {
        let c = LinearRgba::new(0.2, 0.4, 0.6, 1.0);
        let back = LinearRgba::from_rgba8(c.to_rgba8());
        assert_abs_diff_eq!(back.r, c.r, epsilon = 1.0 / 255.0);
        assert_abs_diff_eq!(back.b, c.b, epsilon = 1.0 / 255.0);
        assert_eq!(LinearRgba::RED.to_rgba8(), 0xFF00_00FF);
    }

    #[test]
    fn hsv_primaries() {
        assert_eq!(LinearRgba::from_hsv(0.0, 1.0, 1.0), LinearRgba::RED);
        let green = LinearRgba::from_hsv(1.0 / 3.0, 1.0, 1.0);
        assert_abs_diff_eq!(green.g, 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(green.r, 0.0, epsilon = 1e-5);
    }
}
