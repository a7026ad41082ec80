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

//! GPU buffer handles and descriptors.

use std::borrow::Cow;

crate::tricull_bitflags! {
    /// Allowed usages of a buffer. Backends validate bindings against these.
    pub struct BufferUsage: u32 {
        /// Source of a copy or readback.
        const COPY_SRC = 1 << 0;
        /// Destination of a copy, clear or host write.
        const COPY_DST = 1 << 1;
        /// Vertex input.
        const VERTEX = 1 << 2;
        /// Index input.
        const INDEX = 1 << 3;
        /// Uniform binding.
        const UNIFORM = 1 << 4;
        /// Storage binding, readable and writable from shaders.
        const STORAGE = 1 << 5;
        /// Arguments of an indirect draw.
        const INDIRECT = 1 << 6;
    }
}

/// A descriptor used to create a buffer.
#[derive(Debug, Clone)]
pub struct BufferDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The size in bytes. Must be a multiple of 4.
    pub size: u64,
    /// How the buffer will be used.
    pub usage: BufferUsage,
}

/// An opaque handle to a GPU buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub usize);

/// The element type of an index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    /// 16-bit unsigned indices.
    Uint16,
    /// 32-bit unsigned indices.
    Uint32,
}

impl IndexFormat {
    /// Size of one index in bytes.
    pub const fn size(&self) -> u64 {
        match self {
            IndexFormat::Uint16 => 2,
            IndexFormat::Uint32 => 4,
        }
    }
}
