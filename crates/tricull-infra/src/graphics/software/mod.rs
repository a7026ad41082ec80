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

//! A CPU implementation of [`GraphicsDevice`](tricull_core::renderer::GraphicsDevice).
//!
//! Command buffers are recorded as plain command lists and executed
//! synchronously on submit, so "GPU" work is complete as soon as
//! `submit_command_buffer` returns. Results are bit-for-bit reproducible.

mod command;
mod device;
mod execute;
mod kernels;
mod programs;
mod raster;

pub use self::device::{DrawRecord, ExecutedCommand, SoftwareDevice};
