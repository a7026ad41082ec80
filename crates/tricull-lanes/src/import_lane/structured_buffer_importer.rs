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

//! Uploads packed meshes into storage buffers.

use super::{pack_indexed, unpack, unpack_all, ImportError};
use bytemuck::Pod;
use std::borrow::Borrow;
use std::ops::Range;
use tricull_core::renderer::{BufferDescriptor, BufferId, BufferUsage, GraphicsDevice};
use tricull_core::scene::Mesh;

/// Buffers of an indexed import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedImport {
    /// `u32` triangle-list indices into the attribute buffer.
    pub index_buffer: BufferId,
    /// One [`StructuredVertex`](tricull_core::renderer::StructuredVertex) per mesh vertex.
    pub attribute_buffer: BufferId,
    /// Number of indices, the vertex count of the procedural draw.
    pub index_count: u32,
    /// Number of triangles.
    pub triangle_count: u32,
}

impl IndexedImport {
    /// Destroys both buffers.
    pub fn release(self, device: &dyn GraphicsDevice) {
        release_buffer(device, self.index_buffer);
        release_buffer(device, self.attribute_buffer);
    }
}

/// The buffer of an unpacked import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnpackedImport {
    /// Three records per triangle.
    pub attribute_buffer: BufferId,
    /// Number of records, the vertex count of the procedural draw.
    pub vertex_count: u32,
    /// Number of triangles.
    pub triangle_count: u32,
    /// Global triangle range of every input mesh.
    pub triangle_ranges: Vec<Range<u32>>,
}

impl UnpackedImport {
    /// Destroys the attribute buffer.
    pub fn release(self, device: &dyn GraphicsDevice) {
        release_buffer(device, self.attribute_buffer);
    }
}

fn release_buffer(device: &dyn GraphicsDevice, buffer: BufferId) {
    if let Err(e) = device.destroy_buffer(buffer) {
        log::warn!("Failed to release structured buffer {buffer:?}: {e}");
    }
}

/// Turns meshes into GPU storage buffers.
///
/// Every buffer is created with `STORAGE | COPY_SRC` so it can be bound by the
/// procedural programs and read back for inspection. Data that would not fit
/// one storage binding of the device is rejected before anything is created.
pub struct StructuredBufferImporter<'a> {
    device: &'a dyn GraphicsDevice,
}

impl<'a> StructuredBufferImporter<'a> {
    /// Creates an importer uploading to `device`.
    pub fn new(device: &'a dyn GraphicsDevice) -> Self {
        Self { device }
    }

    /// Uploads the mesh's indices and one record per vertex.
    pub fn import(&self, mesh: &Mesh) -> Result<IndexedImport, ImportError> {
        let packed = pack_indexed(mesh)?;
        let index_buffer = self.upload("structured indices", &packed.indices)?;
        let attribute_buffer = match self.upload("structured attributes", &packed.records) {
            Ok(buffer) => buffer,
            Err(e) => {
                release_buffer(self.device, index_buffer);
                return Err(e);
            }
        };
        Ok(IndexedImport {
            index_buffer,
            attribute_buffer,
            index_count: packed.indices.len() as u32,
            triangle_count: mesh.triangle_count() as u32,
        })
    }

    /// Uploads three records per triangle of a single mesh, tagged with part 0.
    pub fn import_and_unpack(&self, mesh: &Mesh) -> Result<UnpackedImport, ImportError> {
        let records = unpack(mesh, 0)?;
        let triangle_count = mesh.triangle_count() as u32;
        Ok(UnpackedImport {
            attribute_buffer: self.upload("unpacked attributes", &records)?,
            vertex_count: records.len() as u32,
            triangle_count,
            triangle_ranges: vec![0..triangle_count],
        })
    }

    /// Uploads every mesh, in order, into one attribute buffer.
    ///
    /// Mesh `k` is tagged with part `k`; its triangles occupy
    /// `triangle_ranges[k]` in the global numbering.
    pub fn import_all_and_unpack<M: Borrow<Mesh>>(
        &self,
        meshes: &[M],
    ) -> Result<UnpackedImport, ImportError> {
        let model = unpack_all(meshes)?;
        let triangle_count = model.triangle_count();
        log::debug!(
            "Unpacked {} meshes into {} triangles",
            meshes.len(),
            triangle_count
        );
        Ok(UnpackedImport {
            attribute_buffer: self.upload("unpacked model attributes", &model.records)?,
            vertex_count: model.records.len() as u32,
            triangle_count,
            triangle_ranges: model.triangle_ranges,
        })
    }

    fn upload<T: Pod>(&self, label: &'static str, data: &[T]) -> Result<BufferId, ImportError> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let size = bytes.len() as u64;
        let limit = self.device.limits().max_storage_buffer();
        if size > limit {
            return Err(ImportError::ExceedsDeviceLimit { label, size, limit });
        }
        let buffer = self.device.create_buffer_with_data(
            &BufferDescriptor {
                label: Some(label.into()),
                size,
                usage: BufferUsage::STORAGE | BufferUsage::COPY_SRC,
            },
            bytes,
        )?;
        Ok(buffer)
    }
}
