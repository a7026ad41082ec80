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

//! A headless wgpu backend.
//!
//! Every [`RenderProgram`](tricull_core::renderer::RenderProgram) and
//! [`ComputeKernel`](tricull_core::renderer::ComputeKernel) maps to a WGSL
//! module under `shaders/`. Pipelines use layouts derived from the shaders,
//! which is why bind groups name the pipeline they are created for.

mod command;
mod context;
mod conversions;
mod device;
mod programs;

pub use self::command::{WgpuCommandEncoder, WgpuComputePass, WgpuRenderPass};
pub use self::context::WgpuGraphicsContext;
pub use self::conversions::IntoWgpu;
pub use self::device::WgpuDevice;
