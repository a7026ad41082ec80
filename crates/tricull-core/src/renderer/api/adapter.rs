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

//! Information about the adapter a device runs on, and the limits it enforces.

use std::fmt;

/// The graphics API family behind a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum RendererBackendType {
    /// Vulkan.
    Vulkan,
    /// Metal.
    Metal,
    /// Direct3D 12.
    Dx12,
    /// OpenGL / OpenGL ES.
    OpenGl,
    /// WebGPU in a browser.
    WebGpu,
    /// The CPU reference implementation.
    Software,
    /// Anything else.
    Unknown,
}

/// A backend-neutral summary of the active adapter.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RendererAdapterInfo {
    /// The adapter's human readable name.
    pub name: String,
    /// The API family used to drive it.
    pub backend_type: RendererBackendType,
    /// Driver description, empty when unknown.
    pub driver: String,
}

impl fmt::Display for RendererAdapterInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.name, self.backend_type)?;
        if !self.driver.is_empty() {
            write!(f, " [{}]", self.driver)?;
        }
        Ok(())
    }
}

/// Resource limits a device enforces. Lanes size their buffers and dispatch
/// grids against them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceLimits {
    /// Largest buffer that can be created, in bytes.
    pub max_buffer_size: u64,
    /// Largest range one storage buffer binding may cover, in bytes.
    pub max_storage_buffer_binding_size: u64,
    /// Largest workgroup count along any single dispatch dimension.
    pub max_compute_workgroups_per_dimension: u32,
}

impl DeviceLimits {
    /// Limits that never reject anything.
    pub const UNBOUNDED: Self = Self {
        max_buffer_size: u64::MAX,
        max_storage_buffer_binding_size: u64::MAX,
        max_compute_workgroups_per_dimension: u32::MAX,
    };

    /// Largest buffer that can be created and bound whole as storage.
    pub fn max_storage_buffer(&self) -> u64 {
        self.max_buffer_size.min(self.max_storage_buffer_binding_size)
    }
}

impl Default for DeviceLimits {
    fn default() -> Self {
        Self::UNBOUNDED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_buffers_are_bounded_by_both_limits() {
        let limits = DeviceLimits {
            max_buffer_size: 256 << 20,
            max_storage_buffer_binding_size: 128 << 20,
            max_compute_workgroups_per_dimension: 65535,
        };
        assert_eq!(limits.max_storage_buffer(), 128 << 20);
        assert_eq!(DeviceLimits::default().max_storage_buffer(), u64::MAX);
    }
}
