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

//! Structured buffers: meshes repacked into the records procedural programs read.
//!
//! The packing functions are pure and deterministic. Their output only depends
//! on the meshes and the order they are given in, which is what makes triangle
//! ids stable: triangle `t` of the `k`-th input always lands at global index
//! `offset_k + t`, where `offset_k` is the triangle count of inputs `0..k`.

mod structured_buffer_importer;

pub use structured_buffer_importer::{IndexedImport, StructuredBufferImporter, UnpackedImport};

use std::borrow::Borrow;
use std::ops::Range;
use thiserror::Error;
use tricull_core::renderer::{ResourceError, StructuredVertex};
use tricull_core::scene::Mesh;
use tricull_core::StrategyError;

/// Largest triangle count an import may hold.
///
/// Record indices (`3 * triangle + corner`) must fit in a `u32`, and so must
/// every triangle id without ever reaching the ID-texture sentinel.
pub const MAX_IMPORT_TRIANGLES: u64 = u32::MAX as u64 / 3;

/// Errors raised while packing or uploading structured buffers.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The input holds no triangle at all.
    #[error("nothing to import: the input holds no triangles")]
    Empty,
    /// The input holds more triangles than 32-bit ids can address.
    #[error("{count} triangles exceed the import limit of {MAX_IMPORT_TRIANGLES}")]
    TooManyTriangles {
        /// Total triangle count of the input.
        count: u64,
    },
    /// A packed buffer is larger than the device can bind as storage.
    #[error("{label} needs {size} bytes but the device binds at most {limit} bytes of storage")]
    ExceedsDeviceLimit {
        /// Label of the buffer that does not fit.
        label: &'static str,
        /// Size of the packed data, in bytes.
        size: u64,
        /// The device's largest storage buffer.
        limit: u64,
    },
    /// A buffer could not be created on the device.
    #[error("failed to upload structured buffers: {0}")]
    Resource(#[from] ResourceError),
}

/// A mesh packed for an indexed procedural draw.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedIndexed {
    /// The mesh's own triangle-list indices.
    pub indices: Vec<u32>,
    /// One record per mesh vertex, tagged with part 0.
    pub records: Vec<StructuredVertex>,
}

/// Several meshes unpacked into one record stream.
#[derive(Debug, Clone, PartialEq)]
pub struct UnpackedModel {
    /// Three records per triangle, inputs concatenated in order.
    pub records: Vec<StructuredVertex>,
    /// Global triangle range of each input, in input order.
    pub triangle_ranges: Vec<Range<u32>>,
}

impl UnpackedModel {
    /// Total number of triangles.
    pub fn triangle_count(&self) -> u32 {
        self.triangle_ranges.last().map_or(0, |r| r.end)
    }
}

impl From<ImportError> for StrategyError {
    fn from(e: ImportError) -> Self {
        match e {
            ImportError::Resource(e) => StrategyError::Resource(e),
            e @ (ImportError::Empty
            | ImportError::TooManyTriangles { .. }
            | ImportError::ExceedsDeviceLimit { .. }) => StrategyError::InvalidModel(e.to_string()),
        }
    }
}

fn checked_triangle_count(count: u64) -> Result<u32, ImportError> {
    if count == 0 {
        return Err(ImportError::Empty);
    }
    if count > MAX_IMPORT_TRIANGLES {
        return Err(ImportError::TooManyTriangles { count });
    }
    Ok(count as u32)
}

/// Packs a mesh for an indexed procedural draw. Indices are kept as they are.
pub fn pack_indexed(mesh: &Mesh) -> Result<PackedIndexed, ImportError> {
    checked_triangle_count(mesh.triangle_count() as u64)?;
    let records = mesh
        .positions()
        .iter()
        .zip(mesh.normals())
        .map(|(p, n)| StructuredVertex::new(*p, *n, 0))
        .collect();
    Ok(PackedIndexed {
        indices: mesh.indices().to_vec(),
        records,
    })
}

/// Unpacks a mesh into three records per triangle, each tagged with `part`.
pub fn unpack(mesh: &Mesh, part: u32) -> Result<Vec<StructuredVertex>, ImportError> {
    checked_triangle_count(mesh.triangle_count() as u64)?;
    let mut records = Vec::with_capacity(mesh.indices().len());
    append_unpacked(mesh, part, &mut records);
    Ok(records)
}

/// Unpacks every mesh, in order, into one record stream.
///
/// Mesh `k` is tagged with part `k`. Meshes without triangles get an empty
/// range; the whole input must still hold at least one triangle.
pub fn unpack_all<M: Borrow<Mesh>>(meshes: &[M]) -> Result<UnpackedModel, ImportError> {
    let total: u64 = meshes
        .iter()
        .map(|m| m.borrow().triangle_count() as u64)
        .sum();
    checked_triangle_count(total)?;

    let mut records = Vec::with_capacity(total as usize * 3);
    let mut triangle_ranges = Vec::with_capacity(meshes.len());
    let mut offset = 0u32;
    for (part, mesh) in meshes.iter().enumerate() {
        let mesh = mesh.borrow();
        append_unpacked(mesh, part as u32, &mut records);
        let end = offset + mesh.triangle_count() as u32;
        triangle_ranges.push(offset..end);
        offset = end;
    }
    Ok(UnpackedModel {
        records,
        triangle_ranges,
    })
}

fn append_unpacked(mesh: &Mesh, part: u32, out: &mut Vec<StructuredVertex>) {
    let (positions, normals) = (mesh.positions(), mesh.normals());
    out.extend(mesh.indices().iter().map(|&i| {
        let i = i as usize;
        StructuredVertex::new(positions[i], normals[i], part)
    }));
}
