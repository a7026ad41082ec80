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

//! Error types of the rendering subsystem.

use crate::renderer::api::pipeline::{ComputeKernel, RenderProgram};
use std::fmt;

/// An error raised while creating a render or compute pipeline.
#[derive(Debug)]
pub enum PipelineError {
    /// The backend has no implementation for the requested render program.
    UnsupportedProgram(RenderProgram),
    /// The backend has no implementation for the requested compute kernel.
    UnsupportedKernel(ComputeKernel),
    /// The color or depth format does not match what the program writes.
    IncompatibleTarget(String),
    /// The backend failed to compile the pipeline.
    CompilationFailed {
        /// The pipeline label, if any.
        label: Option<String>,
        /// Backend diagnostics.
        details: String,
    },
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::UnsupportedProgram(program) => {
                write!(f, "Render program {program:?} is not supported by this backend")
            }
            PipelineError::UnsupportedKernel(kernel) => {
                write!(f, "Compute kernel {kernel:?} is not supported by this backend")
            }
            PipelineError::IncompatibleTarget(msg) => {
                write!(f, "Incompatible render target: {msg}")
            }
            PipelineError::CompilationFailed { label, details } => write!(
                f,
                "Pipeline compilation failed for '{}': {}",
                label.as_deref().unwrap_or("Unknown"),
                details
            ),
        }
    }
}

impl std::error::Error for PipelineError {}

/// An error related to the creation or use of a GPU resource.
#[derive(Debug)]
pub enum ResourceError {
    /// A pipeline-specific error occurred.
    Pipeline(PipelineError),
    /// No live resource is registered under the given handle.
    NotFound,
    /// The handle refers to a resource of the wrong kind or shape.
    InvalidHandle,
    /// An access fell outside of the resource's bounds.
    OutOfBounds,
    /// A descriptor was rejected before reaching the backend.
    InvalidDescriptor(String),
    /// An error reported by the backend.
    BackendError(String),
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::Pipeline(err) => write!(f, "Pipeline resource error: {err}"),
            ResourceError::NotFound => write!(f, "Resource not found with ID."),
            ResourceError::InvalidHandle => write!(f, "Invalid resource handle or ID."),
            ResourceError::OutOfBounds => write!(f, "Resource access out of bounds."),
            ResourceError::InvalidDescriptor(msg) => write!(f, "Invalid descriptor: {msg}"),
            ResourceError::BackendError(msg) => {
                write!(f, "Backend-specific resource error: {msg}")
            }
        }
    }
}

impl std::error::Error for ResourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResourceError::Pipeline(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PipelineError> for ResourceError {
    fn from(err: PipelineError) -> Self {
        ResourceError::Pipeline(err)
    }
}

/// An error raised while recording or submitting GPU work.
#[derive(Debug)]
pub enum RenderError {
    /// A resource could not be created or accessed.
    Resource(ResourceError),
    /// The backend rejected a submission.
    SubmissionFailed(String),
    /// The device was lost; nothing submitted afterwards will execute.
    DeviceLost,
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Resource(err) => write!(f, "Render resource error: {err}"),
            RenderError::SubmissionFailed(msg) => write!(f, "Command submission failed: {msg}"),
            RenderError::DeviceLost => write!(f, "The graphics device was lost"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Resource(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ResourceError> for RenderError {
    fn from(err: ResourceError) -> Self {
        RenderError::Resource(err)
    }
}
