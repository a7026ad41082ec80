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

//! Hierarchical models made of colored parts.

use super::mesh::Mesh;
use crate::math::{LinearRgba, Mat4};
use std::sync::Arc;

/// The drawable payload of a node: a mesh and its uniform color.
#[derive(Debug, Clone)]
pub struct ModelPart {
    /// Shared mesh data.
    pub mesh: Arc<Mesh>,
    /// Uniform color of the whole part.
    pub color: LinearRgba,
}

/// A node of a model hierarchy.
#[derive(Debug, Clone)]
pub struct ModelNode {
    /// Debug name.
    pub name: String,
    /// Transform relative to the parent node.
    pub transform: Mat4,
    /// Optional drawable payload.
    pub part: Option<ModelPart>,
    /// Child nodes, in draw order.
    pub children: Vec<ModelNode>,
}

/// A part flattened out of a hierarchy, with its transform relative to the model root.
#[derive(Debug, Clone)]
pub struct RenderablePart {
    /// Name of the node that carried the part.
    pub name: String,
    /// Shared mesh data.
    pub mesh: Arc<Mesh>,
    /// Part space to model-root space.
    pub transform: Mat4,
    /// Uniform color.
    pub color: LinearRgba,
}

impl ModelNode {
    /// Creates an empty node with an identity transform.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Mat4::IDENTITY,
            part: None,
            children: Vec::new(),
        }
    }

    /// Sets the local transform.
    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    /// Attaches a drawable part.
    pub fn with_part(mut self, mesh: Arc<Mesh>, color: LinearRgba) -> Self {
        self.part = Some(ModelPart { mesh, color });
        self
    }

    /// Appends a child node.
    pub fn with_child(mut self, child: ModelNode) -> Self {
        self.children.push(child);
        self
    }

    /// Flattens the hierarchy into parts, depth-first, parents before children.
    ///
    /// Transforms are relative to `self`: the root's own transform is not
    /// applied, since the model's world placement is supplied every frame.
    /// The order is stable, which matters because triangle ids are assigned
    /// in this order.
    pub fn renderable_parts(&self) -> Vec<RenderablePart> {
        let mut parts = Vec::new();
        self.collect_parts(Mat4::IDENTITY, &mut parts);
        parts
    }

    fn collect_parts(&self, to_root: Mat4, out: &mut Vec<RenderablePart>) {
        if let Some(part) = &self.part {
            out.push(RenderablePart {
                name: self.name.clone(),
                mesh: Arc::clone(&part.mesh),
                transform: to_root,
                color: part.color,
            });
        }
        for child in &self.children {
            child.collect_parts(to_root * child.transform, out);
        }
    }

    /// Total number of triangles over every part of the hierarchy.
    pub fn triangle_count(&self) -> usize {
        self.part.as_ref().map_or(0, |p| p.mesh.triangle_count())
            + self.children.iter().map(ModelNode::triangle_count).sum::<usize>()
    }
}
