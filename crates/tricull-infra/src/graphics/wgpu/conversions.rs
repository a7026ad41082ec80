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

//! Conversions from `tricull-core` renderer types to their wgpu equivalents.

use tricull_core::math::Extent2D;
use tricull_core::renderer::api::{
    BufferUsage, ClearValue, DeviceLimits, IndexFormat, LoadOp, RendererBackendType, StoreOp,
    TextureFormat, TextureUsage,
};

/// A local extension trait to convert tricull types into wgpu types.
/// It sidesteps the orphan rule while keeping an `.into_wgpu()` call syntax.
pub trait IntoWgpu<T> {
    /// Consumes self and converts it into a wgpu type.
    fn into_wgpu(self) -> T;
}

impl IntoWgpu<wgpu::Extent3d> for Extent2D {
    fn into_wgpu(self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        }
    }
}

impl IntoWgpu<wgpu::TextureFormat> for TextureFormat {
    fn into_wgpu(self) -> wgpu::TextureFormat {
        match self {
            TextureFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
            TextureFormat::R32Uint => wgpu::TextureFormat::R32Uint,
            TextureFormat::Depth32Float => wgpu::TextureFormat::Depth32Float,
        }
    }
}

impl IntoWgpu<wgpu::IndexFormat> for IndexFormat {
    fn into_wgpu(self) -> wgpu::IndexFormat {
        match self {
            IndexFormat::Uint16 => wgpu::IndexFormat::Uint16,
            IndexFormat::Uint32 => wgpu::IndexFormat::Uint32,
        }
    }
}

// Every buffer can be written from the CPU and read back for diagnostics.
impl IntoWgpu<wgpu::BufferUsages> for BufferUsage {
    fn into_wgpu(self) -> wgpu::BufferUsages {
        let mut usages = wgpu::BufferUsages::COPY_SRC | wgpu::BufferUsages::COPY_DST;
        for (flag, usage) in [
            (BufferUsage::VERTEX, wgpu::BufferUsages::VERTEX),
            (BufferUsage::INDEX, wgpu::BufferUsages::INDEX),
            (BufferUsage::UNIFORM, wgpu::BufferUsages::UNIFORM),
            (BufferUsage::STORAGE, wgpu::BufferUsages::STORAGE),
            (BufferUsage::INDIRECT, wgpu::BufferUsages::INDIRECT),
        ] {
            if self.contains(flag) {
                usages |= usage;
            }
        }
        usages
    }
}

impl IntoWgpu<wgpu::TextureUsages> for TextureUsage {
    fn into_wgpu(self) -> wgpu::TextureUsages {
        let mut usages = wgpu::TextureUsages::COPY_SRC;
        if self.contains(TextureUsage::TEXTURE_BINDING) {
            usages |= wgpu::TextureUsages::TEXTURE_BINDING;
        }
        if self.contains(TextureUsage::RENDER_ATTACHMENT) {
            usages |= wgpu::TextureUsages::RENDER_ATTACHMENT;
        }
        usages
    }
}

impl IntoWgpu<wgpu::Color> for ClearValue {
    fn into_wgpu(self) -> wgpu::Color {
        match self {
            ClearValue::Float(c) => wgpu::Color {
                r: c.r as f64,
                g: c.g as f64,
                b: c.b as f64,
                a: c.a as f64,
            },
            // Integer targets take the clear color's channels as exact integers.
            ClearValue::Uint([r, g, b, a]) => wgpu::Color {
                r: r as f64,
                g: g as f64,
                b: b as f64,
                a: a as f64,
            },
        }
    }
}

impl<V, W> IntoWgpu<wgpu::LoadOp<W>> for LoadOp<V>
where
    V: IntoWgpu<W>,
{
    fn into_wgpu(self) -> wgpu::LoadOp<W> {
        match self {
            LoadOp::Clear(value) => wgpu::LoadOp::Clear(value.into_wgpu()),
            LoadOp::Load => wgpu::LoadOp::Load,
        }
    }
}

impl IntoWgpu<f32> for f32 {
    fn into_wgpu(self) -> f32 {
        self
    }
}

impl IntoWgpu<wgpu::StoreOp> for StoreOp {
    fn into_wgpu(self) -> wgpu::StoreOp {
        match self {
            StoreOp::Store => wgpu::StoreOp::Store,
            StoreOp::Discard => wgpu::StoreOp::Discard,
        }
    }
}

/// Maps a wgpu backend to the backend-neutral enum.
pub fn from_wgpu_backend(backend: wgpu::Backend) -> RendererBackendType {
    match backend {
        wgpu::Backend::Vulkan => RendererBackendType::Vulkan,
        wgpu::Backend::Metal => RendererBackendType::Metal,
        wgpu::Backend::Dx12 => RendererBackendType::Dx12,
        wgpu::Backend::Gl => RendererBackendType::OpenGl,
        wgpu::Backend::BrowserWebGpu => RendererBackendType::WebGpu,
        wgpu::Backend::Noop => RendererBackendType::Unknown,
    }
}

/// Extracts the limits lanes size their resources against.
pub fn from_wgpu_limits(limits: &wgpu::Limits) -> DeviceLimits {
    DeviceLimits {
        max_buffer_size: limits.max_buffer_size,
        max_storage_buffer_binding_size: u64::from(limits.max_storage_buffer_binding_size),
        max_compute_workgroups_per_dimension: limits.max_compute_workgroups_per_dimension,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tricull_core::math::LinearRgba;

    #[test]
    fn buffer_usage_is_always_copyable() {
        let usages: wgpu::BufferUsages = (BufferUsage::STORAGE | BufferUsage::INDIRECT).into_wgpu();
        assert!(usages.contains(
            wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::INDIRECT
                | wgpu::BufferUsages::COPY_SRC
                | wgpu::BufferUsages::COPY_DST
        ));
        assert!(!usages.contains(wgpu::BufferUsages::VERTEX));
    }

    #[test]
    fn sentinel_clear_survives_the_f64_round_trip() {
        let color: wgpu::Color = ClearValue::Uint([u32::MAX, 0, 0, 0]).into_wgpu();
        assert_eq!(color.r as u32, u32::MAX);
    }

    #[test]
    fn load_ops_convert_their_clear_values() {
        let op: wgpu::LoadOp<wgpu::Color> =
            LoadOp::Clear(ClearValue::Float(LinearRgba::RED)).into_wgpu();
        assert_eq!(op, wgpu::LoadOp::Clear(wgpu::Color::RED));
        let depth: wgpu::LoadOp<f32> = LoadOp::<f32>::Load.into_wgpu();
        assert_eq!(depth, wgpu::LoadOp::Load);
    }
}
