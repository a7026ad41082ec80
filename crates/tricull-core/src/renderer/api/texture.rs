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

//! Texture handles and descriptors.

use crate::math::Extent2D;
use std::borrow::Cow;

/// The texel formats the renderers use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum TextureFormat {
    /// 8-bit normalized RGBA, the frame color target.
    Rgba8Unorm,
    /// One 32-bit unsigned integer per texel, the triangle-ID target.
    R32Uint,
    /// 32-bit float depth.
    Depth32Float,
}

impl TextureFormat {
    /// Size of one texel in bytes.
    pub const fn bytes_per_texel(&self) -> u32 {
        4
    }

    /// Returns `true` for depth formats.
    pub const fn is_depth(&self) -> bool {
        matches!(self, TextureFormat::Depth32Float)
    }
}

crate::tricull_bitflags! {
    /// Allowed usages of a texture.
    pub struct TextureUsage: u32 {
        /// Source of a copy or readback.
        const COPY_SRC = 1 << 0;
        /// Sampled or loaded from shaders.
        const TEXTURE_BINDING = 1 << 1;
        /// Color or depth attachment of a render pass.
        const RENDER_ATTACHMENT = 1 << 2;
    }
}

/// A descriptor used to create a 2D texture with a single mip level.
#[derive(Debug, Clone)]
pub struct TextureDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// Size in texels.
    pub size: Extent2D,
    /// Texel format.
    pub format: TextureFormat,
    /// How the texture will be used.
    pub usage: TextureUsage,
}

/// An opaque handle to a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub usize);

/// An opaque handle to a full view of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureViewId(pub usize);
