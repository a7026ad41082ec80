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

//! Perspective cameras.

use crate::math::{Mat4, Vec3, DEG_TO_RAD};

/// Widest vertical field of view a camera may be widened to.
pub const MAX_FOV_Y: f32 = 179.0 * DEG_TO_RAD;

/// A right-handed perspective camera with a `[0, 1]` depth range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Eye position in world space.
    pub position: Vec3,
    /// Point looked at.
    pub target: Vec3,
    /// World up direction.
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Width over height of the image.
    pub aspect: f32,
    /// Near plane distance.
    pub near: f32,
    /// Far plane distance.
    pub far: f32,
}

impl Camera {
    /// A camera at `position` looking at `target` with `+Y` up.
    pub fn looking_at(position: Vec3, target: Vec3, fov_y: f32, aspect: f32) -> Self {
        Self {
            position,
            target,
            up: Vec3::Y,
            fov_y,
            aspect,
            near: 0.1,
            far: 1000.0,
        }
    }

    /// Sets the clip planes.
    pub fn with_clip_planes(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    /// World to view transform, `None` if the framing is degenerate.
    pub fn view(&self) -> Option<Mat4> {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// View to clip transform, `None` if the projection parameters are invalid.
    pub fn projection(&self) -> Option<Mat4> {
        Mat4::perspective_rh_zo(self.fov_y, self.aspect, self.near, self.far)
    }

    /// World to clip transform.
    pub fn view_projection(&self) -> Option<Mat4> {
        Some(self.projection()? * self.view()?)
    }

    /// A copy with the vertical field of view multiplied by `ratio`.
    ///
    /// The result is clamped to [`MAX_FOV_Y`]. Position, aspect and clip
    /// planes are unchanged.
    pub fn widened(&self, ratio: f32) -> Self {
        Self {
            fov_y: (self.fov_y * ratio).min(MAX_FOV_Y),
            ..*self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Vec4, FRAC_PI_2};
    use approx::assert_abs_diff_eq;

    #[test]
    fn widening_scales_fov_and_keeps_framing() {
        let cam = Camera::looking_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, 1.0, 16.0 / 9.0);
        let wide = cam.widened(1.25);
        assert_abs_diff_eq!(wide.fov_y, 1.25);
        assert_eq!(wide.position, cam.position);
        assert_eq!(wide.aspect, cam.aspect);
        assert_eq!(cam.widened(100.0).fov_y, MAX_FOV_Y);
    }

    #[test]
    fn widened_camera_sees_points_just_outside_the_original_frustum() {
        let cam = Camera::looking_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, FRAC_PI_2, 1.0);
        // tan(45deg) * 10 = 10 at the focal plane; 10.5 is just outside.
        let p = Vec4::new(0.0, 10.5, 0.0, 1.0);
        let inside = |c: &Camera| {
            let clip = c.view_projection().unwrap() * p;
            clip.y.abs() <= clip.w
        };
        assert!(!inside(&cam));
        assert!(inside(&cam.widened(1.25)));
    }

    #[test]
    fn degenerate_framing_has_no_view() {
        let cam = Camera::looking_at(Vec3::ZERO, Vec3::ZERO, 1.0, 1.0);
        assert!(cam.view_projection().is_none());
    }
}
