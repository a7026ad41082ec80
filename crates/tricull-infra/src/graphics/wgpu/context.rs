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

use anyhow::{anyhow, Result};
use wgpu::{Adapter, Backends, Instance};

/// Holds the core wgpu state objects of a headless device.
///
/// No surface is involved: every render target is an offscreen texture, so
/// the context can be created on CI machines with a software Vulkan driver.
#[derive(Debug)]
pub struct WgpuGraphicsContext {
    #[allow(dead_code)]
    pub adapter: Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,

    // Store info for easy access
    pub adapter_name: String,
    pub adapter_backend: wgpu::Backend,
    pub adapter_driver: String,
    pub device_limits: wgpu::Limits,
}

impl WgpuGraphicsContext {
    /// Asynchronously selects an adapter and creates a logical device.
    ///
    /// `backends` restricts adapter selection; `WGPU_BACKEND` in the
    /// environment overrides it.
    pub async fn new_headless(backends: Backends) -> Result<Self> {
        log::info!("Initializing headless wgpu graphics context...");

        let instance = Instance::new(&wgpu::InstanceDescriptor {
            backends: Backends::from_env().unwrap_or(backends),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: None,
            })
            .await
            .map_err(|e| anyhow!("No suitable graphics adapter found: {e}"))?;

        let adapter_info = adapter.get_info();
        log::info!(
            "Using graphics adapter: \"{}\" (Backend: {:?}, Driver: {})",
            adapter_info.name,
            adapter_info.backend,
            adapter_info.driver
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("tricull headless device"),
                required_features: wgpu::Features::empty(),
                required_limits: required_limits(adapter.limits()),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::default(),
            })
            .await
            .map_err(|e| anyhow!("Failed to create logical device: {e}"))?;
        log::info!("Logical device and command queue created.");

        device.on_uncaptured_error(Box::new(|e| {
            log::error!("wgpu uncaptured error: {e}");
        }));

        let device_limits = device.limits();
        log::debug!("Device limits: {device_limits:?}");

        Ok(Self {
            adapter,
            device,
            queue,
            adapter_name: adapter_info.name,
            adapter_backend: adapter_info.backend,
            adapter_driver: adapter_info.driver,
            device_limits,
        })
    }

    /// Blocking variant of [`new_headless`](Self::new_headless).
    pub fn new_headless_blocking(backends: Backends) -> Result<Self> {
        pollster::block_on(Self::new_headless(backends))
    }
}

/// Default limits, raised to whatever the adapter supports for texture sizes
/// and for the storage buffers a whole model is unpacked into.
fn required_limits(adapter: wgpu::Limits) -> wgpu::Limits {
    wgpu::Limits {
        max_buffer_size: adapter.max_buffer_size,
        max_storage_buffer_binding_size: adapter.max_storage_buffer_binding_size,
        ..wgpu::Limits::default().using_resolution(adapter)
    }
}

#[cfg(test)]
mod tests {
    use super::required_limits;

    #[test]
    fn storage_limits_follow_the_adapter() {
        let adapter = wgpu::Limits {
            max_buffer_size: 4 << 30,
            max_storage_buffer_binding_size: 1 << 30,
            max_texture_dimension_2d: 16384,
            ..wgpu::Limits::default()
        };
        let limits = required_limits(adapter);
        assert_eq!(limits.max_buffer_size, 4 << 30);
        assert_eq!(limits.max_storage_buffer_binding_size, 1 << 30);
        assert_eq!(limits.max_texture_dimension_2d, 16384);
        assert_eq!(
            limits.max_compute_workgroups_per_dimension,
            wgpu::Limits::default().max_compute_workgroups_per_dimension
        );
    }
}
