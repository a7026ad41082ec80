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

//! Indexed triangle meshes.

use crate::math::Vec3;
use std::fmt;

/// Why a mesh was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
    /// The index count is not a multiple of three.
    NotTriangleList {
        /// The offending index count.
        index_count: usize,
    },
    /// An index points past the vertex array.
    IndexOutOfRange {
        /// The offending index.
        index: u32,
        /// Number of vertices available.
        vertex_count: usize,
    },
    /// Normals were supplied but not one per vertex.
    NormalCountMismatch {
        /// Number of positions.
        positions: usize,
        /// Number of normals.
        normals: usize,
    },
}

impl fmt::Display for MeshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeshError::NotTriangleList { index_count } => {
                write!(f, "index count {index_count} is not a multiple of 3")
            }
            MeshError::IndexOutOfRange {
                index,
                vertex_count,
            } => write!(f, "index {index} out of range for {vertex_count} vertices"),
            MeshError::NormalCountMismatch { positions, normals } => {
                write!(f, "{normals} normals for {positions} positions")
            }
        }
    }
}

impl std::error::Error for MeshError {}

/// A validated indexed triangle list.
///
/// Fields are private so a `Mesh` can only exist in a valid state: every
/// index is in range, there is one normal per position and the index count
/// is a multiple of three.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    indices: Vec<u32>,
}

impl Mesh {
    /// Builds a mesh and derives area-weighted vertex normals.
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> Result<Self, MeshError> {
        validate_indices(&indices, positions.len())?;
        let normals = compute_vertex_normals(&positions, &indices);
        Ok(Self {
            positions,
            normals,
            indices,
        })
    }

    /// Builds a mesh with explicit normals.
    pub fn with_normals(
        positions: Vec<Vec3>,
        normals: Vec<Vec3>,
        indices: Vec<u32>,
    ) -> Result<Self, MeshError> {
        if normals.len() != positions.len() {
            return Err(MeshError::NormalCountMismatch {
                positions: positions.len(),
                normals: normals.len(),
            });
        }
        validate_indices(&indices, positions.len())?;
        Ok(Self {
            positions,
            normals,
            indices,
        })
    }

    /// Vertex positions.
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Vertex normals, one per position.
    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    /// Triangle-list indices.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// The three vertex indices of triangle `t`.
    ///
    /// # Panics
    /// Panics if `t >= self.triangle_count()`.
    pub fn triangle(&self, t: usize) -> [u32; 3] {
        [
            self.indices[t * 3],
            self.indices[t * 3 + 1],
            self.indices[t * 3 + 2],
        ]
    }

    /// An axis-aligned quad in the XY plane facing +Z, centered at the origin.
    pub fn quad(width: f32, height: f32) -> Self {
        let (hw, hh) = (width * 0.5, height * 0.5);
        Self {
            positions: vec![
                Vec3::new(-hw, -hh, 0.0),
                Vec3::new(hw, -hh, 0.0),
                Vec3::new(hw, hh, 0.0),
                Vec3::new(-hw, hh, 0.0),
            ],
            normals: vec![Vec3::Z; 4],
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }

    /// An axis-aligned box centered at the origin with per-face normals.
    pub fn cuboid(size: Vec3) -> Self {
        let h = size * 0.5;
        // (normal, tangent u, tangent v); u x v == normal
        let faces = [
            (Vec3::X, Vec3::new(0.0, 0.0, -1.0), Vec3::Y),
            (-Vec3::X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::new(0.0, 0.0, -1.0)),
            (-Vec3::Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (-Vec3::Z, -Vec3::X, Vec3::Y),
        ];
        let mut positions = Vec::with_capacity(24);
        let mut normals = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (n, u, v) in faces {
            let base = positions.len() as u32;
            let center = Vec3::new(n.x * h.x, n.y * h.y, n.z * h.z);
            let du = Vec3::new(u.x * h.x, u.y * h.y, u.z * h.z);
            let dv = Vec3::new(v.x * h.x, v.y * h.y, v.z * h.z);
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                positions.push(center + du * su + dv * sv);
                normals.push(n);
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        Self {
            positions,
            normals,
            indices,
        }
    }

    /// A `cols x rows` grid of quads in the XY plane, two triangles per cell.
    pub fn grid(width: f32, height: f32, cols: u32, rows: u32) -> Self {
        let cols = cols.max(1);
        let rows = rows.max(1);
        let mut positions = Vec::with_capacity(((cols + 1) * (rows + 1)) as usize);
        for y in 0..=rows {
            for x in 0..=cols {
                positions.push(Vec3::new(
                    width * (x as f32 / cols as f32 - 0.5),
                    height * (y as f32 / rows as f32 - 0.5),
                    0.0,
                ));
            }
        }
        let stride = cols + 1;
        let mut indices = Vec::with_capacity((cols * rows * 6) as usize);
        for y in 0..rows {
            for x in 0..cols {
                let i = y * stride + x;
                indices.extend_from_slice(&[i, i + 1, i + stride + 1, i, i + stride + 1, i + stride]);
            }
        }
        let normals = vec![Vec3::Z; positions.len()];
        Self {
            positions,
            normals,
            indices,
        }
    }
}

fn validate_indices(indices: &[u32], vertex_count: usize) -> Result<(), MeshError> {
    if indices.len() % 3 != 0 {
        return Err(MeshError::NotTriangleList {
            index_count: indices.len(),
        });
    }
    match indices.iter().find(|&&i| i as usize >= vertex_count) {
        Some(&index) => Err(MeshError::IndexOutOfRange {
            index,
            vertex_count,
        }),
        None => Ok(()),
    }
}

fn compute_vertex_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        // Unnormalized cross product weights each face by its area.
        let face = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        normals[a] = normals[a] + face;
        normals[b] = normals[b] + face;
        normals[c] = normals[c] + face;
    }
    normals.into_iter().map(Vec3::normalize).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_partial_triangles() {
        let err = Mesh::new(vec![Vec3::ZERO; 3], vec![0, 1]).unwrap_err();
        assert_eq!(err, MeshError::NotTriangleList { index_count: 2 });
    }

    #[test]
    fn rejects_out_of_range_indices() {
        let err = Mesh::new(vec![Vec3::ZERO; 3], vec![0, 1, 3]).unwrap_err();
        assert_eq!(
            err,
            MeshError::IndexOutOfRange {
                index: 3,
                vertex_count: 3
            }
        );
    }

    #[test]
    fn derived_normals_follow_winding() {
        let mesh = Mesh::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![0, 1, 2],
        )
        .unwrap();
        assert!(mesh.normals().iter().all(|n| *n == Vec3::Z));
    }

    #[test]
    fn primitive_triangle_counts() {
        assert_eq!(Mesh::quad(1.0, 1.0).triangle_count(), 2);
        assert_eq!(Mesh::cuboid(Vec3::ONE).triangle_count(), 12);
        assert_eq!(Mesh::grid(1.0, 1.0, 5, 1).triangle_count(), 10);
        assert_eq!(Mesh::grid(1.0, 1.0, 5, 2).triangle_count(), 20);
    }

    #[test]
    fn cuboid_faces_wind_outwards() {
        let mesh = Mesh::cuboid(Vec3::new(2.0, 2.0, 2.0));
        for t in 0..mesh.triangle_count() {
            let [a, b, c] = mesh.triangle(t);
            let p = mesh.positions();
            let face = (p[b as usize] - p[a as usize]).cross(p[c as usize] - p[a as usize]);
            assert!(face.dot(mesh.normals()[a as usize]) > 0.0, "triangle {t}");
        }
    }
}
