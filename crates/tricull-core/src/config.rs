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

//! Tunables of the visibility pipeline.

use crate::scene::camera::MAX_FOV_Y;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A rejected configuration value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A field holds a value outside its valid range.
    OutOfRange {
        /// The field name.
        field: &'static str,
        /// Human readable constraint.
        expected: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::OutOfRange { field, expected } => {
                write!(f, "invalid value for '{field}': expected {expected}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Settings of the visible-triangle pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilityConfig {
    /// Side length in texels of the square ID target.
    pub id_resolution: u32,
    /// Number of frames one ID-buffer sweep is spread over.
    pub frames_per_sweep: u32,
    /// Multiplier applied to the main camera's field of view when rendering IDs.
    pub fov_ratio: f32,
    /// Capacity of the visible set; extra visible triangles are dropped.
    pub max_triangles: u32,
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            id_resolution: 1024,
            frames_per_sweep: 5,
            fov_ratio: 1.25,
            max_triangles: 350_000,
        }
    }
}

impl VisibilityConfig {
    /// Checks every field; `camera_fov_y` is the main camera's field of view.
    pub fn validate(&self, camera_fov_y: f32) -> Result<(), ConfigError> {
        if self.id_resolution == 0 {
            return Err(ConfigError::OutOfRange {
                field: "id_resolution",
                expected: "at least 1 texel",
            });
        }
        if self.frames_per_sweep == 0 {
            return Err(ConfigError::OutOfRange {
                field: "frames_per_sweep",
                expected: "at least 1 frame",
            });
        }
        if self.fov_ratio.is_nan()
            || self.fov_ratio < 1.0
            || camera_fov_y * self.fov_ratio >= MAX_FOV_Y
        {
            return Err(ConfigError::OutOfRange {
                field: "fov_ratio",
                expected: "a ratio >= 1.0 keeping the widened field of view below 179 degrees",
            });
        }
        if self.max_triangles == 0 {
            return Err(ConfigError::OutOfRange {
                field: "max_triangles",
                expected: "a capacity of at least 1 triangle",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(VisibilityConfig::default().validate(1.0).is_ok());
    }

    #[test]
    fn rejects_narrowing_ratio() {
        let config = VisibilityConfig {
            fov_ratio: 0.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(1.0),
            Err(ConfigError::OutOfRange { field: "fov_ratio", .. })
        ));
    }

    #[test]
    fn rejects_nan_ratio() {
        let config = VisibilityConfig {
            fov_ratio: f32::NAN,
            ..Default::default()
        };
        assert!(config.validate(1.0).is_err());
    }

    #[test]
    fn partial_ron_falls_back_to_defaults() {
        let config: VisibilityConfig = ron::from_str("(frames_per_sweep: 3)").unwrap();
        assert_eq!(config.frames_per_sweep, 3);
        assert_eq!(config.id_resolution, 1024);
        assert_eq!(config.max_triangles, 350_000);
    }
}
