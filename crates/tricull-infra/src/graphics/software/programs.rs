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

//! CPU versions of the vertex stage of every render program.
//!
//! Each function mirrors the WGSL program of the same name in the wgpu
//! backend. Fragment outputs are flat, taken from the first vertex of each
//! triangle, so a shaded vertex carries its final texel value.

use bytemuck::Pod;
use tricull_core::math::{LinearRgba, Mat4, Vec3, Vec4};
use tricull_core::renderer::api::{
    MaterialUniforms, MeshVertex, ObjectUniforms, PartAttributes, StructuredVertex, ViewUniforms,
    VisibleSetHeader,
};
use tricull_core::renderer::error::ResourceError;

/// Direction towards the light, in world space. Same constant as the WGSL programs.
const LIGHT_DIRECTION: Vec3 = Vec3::new(0.301_511_35, 0.904_534_05, 0.301_511_35);
const AMBIENT: f32 = 0.35;

#[derive(Debug, Clone, Copy)]
pub(crate) struct ShadedVertex {
    pub(crate) clip: Vec4,
    pub(crate) texel: u32,
}

/// Reads element `index` of a tightly packed array of `T`.
pub(crate) fn read_pod<T: Pod>(bytes: &[u8], index: usize) -> Result<T, ResourceError> {
    let size = std::mem::size_of::<T>();
    let start = index.checked_mul(size).ok_or(ResourceError::OutOfBounds)?;
    bytes
        .get(start..start + size)
        .map(bytemuck::pod_read_unaligned)
        .ok_or(ResourceError::OutOfBounds)
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ViewState {
    view_proj: Mat4,
    root: Mat4,
    pub(crate) triangle_offset: u32,
}

impl ViewState {
    pub(crate) fn from_uniform_bytes(bytes: &[u8]) -> Result<Self, ResourceError> {
        let view: ViewUniforms = read_pod(bytes, 0)?;
        Ok(Self {
            view_proj: Mat4::from_cols_array_2d(&view.view_proj),
            root: Mat4::from_cols_array_2d(&view.root),
            triangle_offset: view.triangle_offset,
        })
    }

    fn shade(&self, model: &Mat4, position: [f32; 3], normal: [f32; 3], color: [f32; 4]) -> ShadedVertex {
        let to_world = self.root * *model;
        let world = to_world * Vec4::from_vec3(Vec3::from_array(position), 1.0);
        let n = to_world.transform_vector3(Vec3::from_array(normal)).normalize();
        let light = AMBIENT + (1.0 - AMBIENT) * n.dot(LIGHT_DIRECTION).max(0.0);
        let [r, g, b, a] = color;
        ShadedVertex {
            clip: self.view_proj * world,
            texel: LinearRgba::new(r, g, b, a).scale_rgb(light).to_rgba8(),
        }
    }

    fn clip_only(&self, model: &Mat4, position: [f32; 3]) -> Vec4 {
        self.view_proj * (self.root * *model) * Vec4::from_vec3(Vec3::from_array(position), 1.0)
    }
}

/// The resolved inputs of one draw.
pub(crate) enum ProgramInputs<'a> {
    FlatColor {
        view: ViewState,
        model: Mat4,
        color: [f32; 4],
        vertices: &'a [u8],
    },
    IndexedProcedural {
        view: ViewState,
        indices: &'a [u8],
        records: &'a [u8],
        parts: &'a [u8],
    },
    UnpackedProcedural {
        view: ViewState,
        records: &'a [u8],
        parts: &'a [u8],
    },
    TriangleIds {
        view: ViewState,
        records: &'a [u8],
        parts: &'a [u8],
    },
    VisibleTriangles {
        view: ViewState,
        records: &'a [u8],
        parts: &'a [u8],
        visible: &'a [u8],
    },
}

impl<'a> ProgramInputs<'a> {
    pub(crate) fn flat_color(
        view: &[u8],
        object: &[u8],
        material: &[u8],
        vertices: &'a [u8],
    ) -> Result<Self, ResourceError> {
        let object: ObjectUniforms = read_pod(object, 0)?;
        let material: MaterialUniforms = read_pod(material, 0)?;
        Ok(ProgramInputs::FlatColor {
            view: ViewState::from_uniform_bytes(view)?,
            model: Mat4::from_cols_array_2d(&object.model),
            color: material.color,
            vertices,
        })
    }

    pub(crate) fn view(&self) -> &ViewState {
        match self {
            ProgramInputs::FlatColor { view, .. }
            | ProgramInputs::IndexedProcedural { view, .. }
            | ProgramInputs::UnpackedProcedural { view, .. }
            | ProgramInputs::TriangleIds { view, .. }
            | ProgramInputs::VisibleTriangles { view, .. } => view,
        }
    }

    /// Runs the vertex stage for one vertex index.
    pub(crate) fn shade(&self, vertex_index: u32) -> Result<ShadedVertex, ResourceError> {
        let vi = vertex_index as usize;
        match self {
            ProgramInputs::FlatColor {
                view,
                model,
                color,
                vertices,
            } => {
                let v: MeshVertex = read_pod(vertices, vi)?;
                Ok(view.shade(model, v.position, v.normal, *color))
            }
            ProgramInputs::IndexedProcedural {
                view,
                indices,
                records,
                parts,
            } => {
                let index: u32 = read_pod(indices, vi)?;
                shade_record(view, records, parts, index as usize)
            }
            ProgramInputs::UnpackedProcedural {
                view,
                records,
                parts,
            } => shade_record(view, records, parts, vi),
            ProgramInputs::TriangleIds {
                view,
                records,
                parts,
            } => {
                let first = view.triangle_offset as usize * 3;
                let record: StructuredVertex = read_pod(records, first + vi)?;
                let part: PartAttributes = read_pod(parts, record.part as usize)?;
                let model = Mat4::from_cols_array_2d(&part.model);
                Ok(ShadedVertex {
                    clip: view.clip_only(&model, record.position),
                    texel: view.triangle_offset + vertex_index / 3,
                })
            }
            ProgramInputs::VisibleTriangles {
                view,
                records,
                parts,
                visible,
            } => {
                let header = VisibleSetHeader::SIZE as usize;
                let indices = visible.get(header..).ok_or(ResourceError::OutOfBounds)?;
                let triangle: u32 = read_pod(indices, vi / 3)?;
                shade_record(view, records, parts, triangle as usize * 3 + vi % 3)
            }
        }
    }
}

fn shade_record(
    view: &ViewState,
    records: &[u8],
    parts: &[u8],
    index: usize,
) -> Result<ShadedVertex, ResourceError> {
    let record: StructuredVertex = read_pod(records, index)?;
    let part: PartAttributes = read_pod(parts, record.part as usize)?;
    let model = Mat4::from_cols_array_2d(&part.model);
    Ok(view.shade(&model, record.position, record.normal, part.color))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn light_direction_is_normalized() {
        assert_abs_diff_eq!(LIGHT_DIRECTION.length(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn read_pod_rejects_short_buffers() {
        let bytes = [0u8; 6];
        assert!(read_pod::<u32>(&bytes, 0).is_ok());
        assert!(matches!(read_pod::<u32>(&bytes, 1), Err(ResourceError::OutOfBounds)));
    }

    #[test]
    fn triangle_ids_offset_the_vertex_fetch() {
        let view = ViewUniforms::new(&Mat4::IDENTITY, &Mat4::IDENTITY).with_triangle_offset(1);
        let records: Vec<StructuredVertex> = (0..6)
            .map(|i| StructuredVertex::new(Vec3::new(i as f32, 0.0, 0.5), Vec3::Z, 0))
            .collect();
        let parts = [PartAttributes::new(&Mat4::IDENTITY, LinearRgba::WHITE)];
        let inputs = ProgramInputs::TriangleIds {
            view: ViewState::from_uniform_bytes(bytemuck::bytes_of(&view)).unwrap(),
            records: bytemuck::cast_slice(&records),
            parts: bytemuck::cast_slice(&parts),
        };

        let v = inputs.shade(2).unwrap();
        assert_eq!(v.texel, 1);
        assert_eq!(v.clip.x, 5.0);
        assert!(inputs.shade(3).is_err());
    }
}
