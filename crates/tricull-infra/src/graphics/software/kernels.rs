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

//! CPU versions of the compute kernels.
//!
//! Invocations run sequentially in ascending order. Every kernel honours the
//! same bounds checks as its WGSL counterpart, so a grid larger than the data
//! is harmless.

use tricull_core::renderer::api::{DrawIndirectArgs, VisibleSetHeader, ID_SENTINEL};
use tricull_core::renderer::error::ResourceError;

fn load_u32(bytes: &[u8], index: usize) -> u32 {
    let start = index * 4;
    u32::from_le_bytes([bytes[start], bytes[start + 1], bytes[start + 2], bytes[start + 3]])
}

fn store_u32(bytes: &mut [u8], index: usize, value: u32) {
    bytes[index * 4..index * 4 + 4].copy_from_slice(&value.to_le_bytes());
}

fn split_visible_set(visible: &mut [u8]) -> Result<(&mut [u8], &mut [u8]), ResourceError> {
    let header = VisibleSetHeader::SIZE as usize;
    if visible.len() < header {
        return Err(ResourceError::OutOfBounds);
    }
    Ok(visible.split_at_mut(header))
}

/// `AccumulateIds`: marks every triangle id found in the texture.
pub(crate) fn accumulate_ids(
    texels: &[u32],
    width: u32,
    height: u32,
    grid: [u32; 2],
    flags: &mut [u8],
) -> u64 {
    let flag_count = flags.len() / 4;
    let mut marked = 0;
    for y in 0..grid[1].min(height) {
        for x in 0..grid[0].min(width) {
            let id = texels[(y * width + x) as usize];
            if id != ID_SENTINEL && (id as usize) < flag_count {
                store_u32(flags, id as usize, 1);
                marked += 1;
            }
        }
    }
    marked
}

/// `CompactVisible`: appends the index of every set flag and clears it.
pub(crate) fn compact_visible(
    invocations: u64,
    flags: &mut [u8],
    visible: &mut [u8],
) -> Result<(), ResourceError> {
    let (header, indices) = split_visible_set(visible)?;
    let capacity = indices.len() / 4;
    let triangle_count = (flags.len() as u64 / 4).min(invocations) as usize;
    let mut count = load_u32(header, 0);
    for i in 0..triangle_count {
        if load_u32(flags, i) == 0 {
            continue;
        }
        store_u32(flags, i, 0);
        let slot = count as usize;
        count = count.wrapping_add(1);
        if slot < capacity {
            store_u32(indices, slot, i as u32);
        }
    }
    store_u32(header, 0, count);
    Ok(())
}

/// `WriteDrawArgs`: turns the append counter into indirect draw arguments.
pub(crate) fn write_draw_args(visible: &[u8], args: &mut [u8]) -> Result<(), ResourceError> {
    let header = VisibleSetHeader::SIZE as usize;
    if visible.len() < header || args.len() < std::mem::size_of::<DrawIndirectArgs>() {
        return Err(ResourceError::OutOfBounds);
    }
    let capacity = ((visible.len() - header) / 4) as u32;
    let count = load_u32(visible, 0).min(capacity);
    let draw = DrawIndirectArgs {
        vertex_count: count * 3,
        instance_count: 1,
        first_vertex: 0,
        first_instance: 0,
    };
    args[..std::mem::size_of::<DrawIndirectArgs>()].copy_from_slice(bytemuck::bytes_of(&draw));
    Ok(())
}
