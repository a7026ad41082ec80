use tricull_core::math::{Extent2D, LinearRgba, Mat4, Vec3};
use tricull_core::renderer::*;
use tricull_infra::{ExecutedCommand, SoftwareDevice};

const SIZE: u32 = 32;

fn storage(device: &SoftwareDevice, data: &[u8], extra: BufferUsage) -> BufferId {
    device
        .create_buffer_with_data(
            &BufferDescriptor {
                label: None,
                size: data.len() as u64,
                usage: BufferUsage::STORAGE | BufferUsage::COPY_DST | BufferUsage::COPY_SRC | extra,
            },
            data,
        )
        .unwrap()
}

fn full_screen_records(z: f32) -> Vec<StructuredVertex> {
    let n = Vec3::new(0.0, 0.0, 1.0);
    [
        [-1.0, -1.0],
        [1.0, -1.0],
        [-1.0, 1.0],
        [1.0, -1.0],
        [1.0, 1.0],
        [-1.0, 1.0],
    ]
    .iter()
    .map(|[x, y]| StructuredVertex::new(Vec3::new(*x, *y, z), n, 0))
    .collect()
}

struct IdTarget {
    texture: TextureId,
    view: TextureViewId,
    depth_view: TextureViewId,
}

fn id_target(device: &SoftwareDevice) -> IdTarget {
    let texture = device
        .create_texture(&TextureDescriptor {
            label: Some("ids".into()),
            size: Extent2D::square(SIZE),
            format: TextureFormat::R32Uint,
            usage: TextureUsage::RENDER_ATTACHMENT
                | TextureUsage::TEXTURE_BINDING
                | TextureUsage::COPY_SRC,
        })
        .unwrap();
    let depth = device
        .create_texture(&TextureDescriptor {
            label: Some("ids depth".into()),
            size: Extent2D::square(SIZE),
            format: TextureFormat::Depth32Float,
            usage: TextureUsage::RENDER_ATTACHMENT,
        })
        .unwrap();
    IdTarget {
        texture,
        view: device.create_texture_view(texture).unwrap(),
        depth_view: device.create_texture_view(depth).unwrap(),
    }
}

fn render_ids(device: &SoftwareDevice, target: &IdTarget, records: &[StructuredVertex]) {
    let view = ViewUniforms::new(&Mat4::IDENTITY, &Mat4::IDENTITY);
    let view_buffer = device
        .create_buffer_with_data(
            &BufferDescriptor {
                label: None,
                size: std::mem::size_of::<ViewUniforms>() as u64,
                usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
            },
            bytemuck::bytes_of(&view),
        )
        .unwrap();
    let parts = [PartAttributes::new(&Mat4::IDENTITY, LinearRgba::WHITE)];
    let vertex_count = records.len() as u32;
    let records = storage(device, bytemuck::cast_slice(records), BufferUsage::empty());
    let parts = storage(device, bytemuck::cast_slice(&parts), BufferUsage::empty());

    let pipeline = device
        .create_render_pipeline(&RenderPipelineDescriptor {
            label: None,
            program: RenderProgram::TriangleIds,
            color_format: TextureFormat::R32Uint,
            depth_format: Some(TextureFormat::Depth32Float),
        })
        .unwrap();
    let group0 = device
        .create_bind_group(&BindGroupDescriptor {
            label: None,
            layout: BindGroupLayoutSource::Render(pipeline, 0),
            entries: &[BindGroupEntry::buffer(0, view_buffer)],
        })
        .unwrap();
    let group1 = device
        .create_bind_group(&BindGroupDescriptor {
            label: None,
            layout: BindGroupLayoutSource::Render(pipeline, 1),
            entries: &[BindGroupEntry::buffer(0, records), BindGroupEntry::buffer(1, parts)],
        })
        .unwrap();

    let mut encoder = device.create_command_encoder(Some("ids"));
    {
        let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some("ids".into()),
            color_attachment: RenderPassColorAttachment {
                view: target.view,
                ops: Operations {
                    load: LoadOp::Clear(ClearValue::Uint([ID_SENTINEL, 0, 0, 0])),
                    store: StoreOp::Store,
                },
            },
            depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                view: target.depth_view,
                depth_ops: Operations {
                    load: LoadOp::Clear(1.0),
                    store: StoreOp::Store,
                },
            }),
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, group0);
        pass.set_bind_group(1, group1);
        pass.draw(0..vertex_count, 0..1);
    }
    let buffer = encoder.finish();
    device.submit_command_buffer(buffer).unwrap();
}

fn texel_ids(device: &SoftwareDevice, texture: TextureId) -> Vec<u32> {
    bytemuck::pod_collect_to_vec(&device.read_texture(texture).unwrap())
}

#[test]
fn triangle_ids_cover_the_target_without_sentinels() {
    let device = SoftwareDevice::new();
    let target = id_target(&device);
    render_ids(&device, &target, &full_screen_records(0.5));

    let ids = texel_ids(&device, target.texture);
    assert_eq!(ids.len(), (SIZE * SIZE) as usize);
    assert!(ids.iter().all(|&id| id == 0 || id == 1));
    assert!(ids.contains(&0) && ids.contains(&1));
}

#[test]
fn nearer_triangle_wins_the_id_texture() {
    let device = SoftwareDevice::new();
    let target = id_target(&device);
    let mut records = full_screen_records(0.8);
    records.truncate(3);
    // A nearer copy of triangle 0 drawn second.
    records.extend(full_screen_records(0.2).into_iter().take(3));
    render_ids(&device, &target, &records);

    let ids = texel_ids(&device, target.texture);
    assert!(ids.iter().all(|&id| id == 1 || id == ID_SENTINEL));
    assert!(ids.contains(&1));
}

#[test]
fn compute_chain_builds_the_visible_set_and_draw_args() {
    let device = SoftwareDevice::new();
    let target = id_target(&device);
    render_ids(&device, &target, &full_screen_records(0.5));
    device.take_command_log();

    let triangles = 4u32;
    let flags = storage(&device, &vec![0u8; triangles as usize * 4], BufferUsage::empty());
    let visible = storage(
        &device,
        &vec![0u8; VisibleSetHeader::buffer_size(triangles) as usize],
        BufferUsage::empty(),
    );
    let args = storage(
        &device,
        bytemuck::bytes_of(&DrawIndirectArgs::default()),
        BufferUsage::INDIRECT,
    );

    let kernel = |k| {
        device
            .create_compute_pipeline(&ComputePipelineDescriptor { label: None, kernel: k })
            .unwrap()
    };
    let accumulate = kernel(ComputeKernel::AccumulateIds);
    let compact = kernel(ComputeKernel::CompactVisible);
    let write_args = kernel(ComputeKernel::WriteDrawArgs);
    let group = |pipeline, entries: &[BindGroupEntry]| {
        device
            .create_bind_group(&BindGroupDescriptor {
                label: None,
                layout: BindGroupLayoutSource::Compute(pipeline, 0),
                entries,
            })
            .unwrap()
    };
    let accumulate_group = group(
        accumulate,
        &[BindGroupEntry::texture_view(0, target.view), BindGroupEntry::buffer(1, flags)],
    );
    let compact_group = group(
        compact,
        &[BindGroupEntry::buffer(0, flags), BindGroupEntry::buffer(1, visible)],
    );
    let args_group = group(
        write_args,
        &[BindGroupEntry::buffer(0, visible), BindGroupEntry::buffer(1, args)],
    );

    let mut encoder = device.create_command_encoder(Some("dispatch"));
    encoder.clear_buffer(visible, 0, Some(4));
    for (pipeline, bind_group, wg) in [
        (
            accumulate,
            accumulate_group,
            ComputeKernel::AccumulateIds.workgroups_for([SIZE, SIZE, 1]),
        ),
        (
            compact,
            compact_group,
            ComputeKernel::CompactVisible.workgroups_for([triangles, 1, 1]),
        ),
        (write_args, args_group, [1, 1, 1]),
    ] {
        let mut pass = encoder.begin_compute_pass(&ComputePassDescriptor::default());
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, bind_group);
        pass.dispatch_workgroups(wg[0], wg[1], wg[2]);
    }
    let buffer = encoder.finish();
    device.submit_command_buffer(buffer).unwrap();

    let set: Vec<u32> = bytemuck::pod_collect_to_vec(&device.read_buffer(visible).unwrap());
    assert_eq!(set[0], 2);
    assert_eq!(&set[4..6], &[0, 1]);
    let draw: DrawIndirectArgs = bytemuck::pod_read_unaligned(&device.read_buffer(args).unwrap());
    assert_eq!(draw.vertex_count, 6);
    assert_eq!(draw.instance_count, 1);
    let cleared: Vec<u32> = bytemuck::pod_collect_to_vec(&device.read_buffer(flags).unwrap());
    assert!(cleared.iter().all(|&f| f == 0));

    let kernels: Vec<_> = device
        .take_command_log()
        .into_iter()
        .filter_map(|c| match c {
            ExecutedCommand::Dispatch { kernel, .. } => Some(kernel),
            _ => None,
        })
        .collect();
    assert_eq!(
        kernels,
        vec![
            ComputeKernel::AccumulateIds,
            ComputeKernel::CompactVisible,
            ComputeKernel::WriteDrawArgs
        ]
    );
}

#[test]
fn pipeline_and_target_format_mismatch_fails_submission() {
    let device = SoftwareDevice::new();
    let color = device
        .create_texture(&TextureDescriptor {
            label: None,
            size: Extent2D::square(4),
            format: TextureFormat::Rgba8Unorm,
            usage: TextureUsage::RENDER_ATTACHMENT,
        })
        .unwrap();
    let view = device.create_texture_view(color).unwrap();
    let pipeline = device
        .create_render_pipeline(&RenderPipelineDescriptor {
            label: None,
            program: RenderProgram::TriangleIds,
            color_format: TextureFormat::R32Uint,
            depth_format: None,
        })
        .unwrap();

    let mut encoder = device.create_command_encoder(None);
    {
        let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
            label: None,
            color_attachment: RenderPassColorAttachment {
                view,
                ops: Operations {
                    load: LoadOp::Clear(ClearValue::Float(LinearRgba::BLACK)),
                    store: StoreOp::Store,
                },
            },
            depth_stencil_attachment: None,
        });
        pass.set_pipeline(pipeline);
    }
    let buffer = encoder.finish();
    assert!(device.submit_command_buffer(buffer).is_err());
}

fn limited(max_bytes: u64, max_workgroups: u32) -> SoftwareDevice {
    SoftwareDevice::with_limits(DeviceLimits {
        max_buffer_size: max_bytes * 2,
        max_storage_buffer_binding_size: max_bytes,
        max_compute_workgroups_per_dimension: max_workgroups,
    })
}

#[test]
fn limits_reject_oversized_buffers_and_storage_bindings() {
    let device = limited(64, 16);
    assert_eq!(device.limits().max_storage_buffer(), 64);

    let oversized = device.create_buffer(&BufferDescriptor {
        label: None,
        size: 132,
        usage: BufferUsage::STORAGE,
    });
    assert!(matches!(oversized, Err(ResourceError::InvalidDescriptor(_))));

    let pipeline = device
        .create_compute_pipeline(&ComputePipelineDescriptor {
            label: None,
            kernel: ComputeKernel::CompactVisible,
        })
        .unwrap();
    let flags = storage(&device, &[0u8; 128], BufferUsage::empty());
    let visible = storage(&device, &[0u8; 32], BufferUsage::empty());
    let group = device.create_bind_group(&BindGroupDescriptor {
        label: None,
        layout: BindGroupLayoutSource::Compute(pipeline, 0),
        entries: &[BindGroupEntry::buffer(0, flags), BindGroupEntry::buffer(1, visible)],
    });
    assert!(matches!(group, Err(ResourceError::InvalidDescriptor(_))));
}

#[test]
fn folded_compaction_grid_reaches_every_flag() {
    let device = limited(4096, 2);
    let triangles = 300u32;
    let mut marked = vec![0u32; triangles as usize];
    for i in [0, 130, 299] {
        marked[i] = 1;
    }
    let flags = storage(&device, bytemuck::cast_slice(&marked), BufferUsage::empty());
    let visible = storage(
        &device,
        &vec![0u8; VisibleSetHeader::buffer_size(8) as usize],
        BufferUsage::empty(),
    );
    let pipeline = device
        .create_compute_pipeline(&ComputePipelineDescriptor {
            label: None,
            kernel: ComputeKernel::CompactVisible,
        })
        .unwrap();
    let group = device
        .create_bind_group(&BindGroupDescriptor {
            label: None,
            layout: BindGroupLayoutSource::Compute(pipeline, 0),
            entries: &[BindGroupEntry::buffer(0, flags), BindGroupEntry::buffer(1, visible)],
        })
        .unwrap();
    let compact = |workgroups: [u32; 3]| {
        let mut encoder = device.create_command_encoder(None);
        {
            let mut pass = encoder.begin_compute_pass(&ComputePassDescriptor::default());
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, group);
            pass.dispatch_workgroups(workgroups[0], workgroups[1], workgroups[2]);
        }
        device.submit_command_buffer(encoder.finish())
    };

    // Five workgroups do not fit a single row of two.
    assert!(compact(ComputeKernel::CompactVisible.workgroups_for([triangles, 1, 1])).is_err());

    let grid = ComputeKernel::CompactVisible.linear_workgroups(triangles, 2);
    assert_eq!(grid, [2, 3, 1]);
    compact(grid).unwrap();
    let set: Vec<u32> = bytemuck::pod_collect_to_vec(&device.read_buffer(visible).unwrap());
    assert_eq!(set[0], 3);
    assert_eq!(&set[4..7], &[0, 130, 299]);
}
