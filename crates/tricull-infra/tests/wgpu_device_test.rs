//! Runs against a real adapter when one is available and skips otherwise.

use tricull_core::math::{Extent2D, LinearRgba, Mat4, Vec3};
use tricull_core::renderer::*;
use tricull_infra::WgpuDevice;

fn device() -> Option<WgpuDevice> {
    let _ = env_logger::builder().is_test(true).try_init();
    match WgpuDevice::new_headless() {
        Ok(device) => Some(device),
        Err(e) => {
            eprintln!("skipping: {e}");
            None
        }
    }
}

#[test]
fn buffers_round_trip_through_the_gpu() {
    let Some(device) = device() else { return };
    let data: Vec<u8> = (0..64).collect();
    let buffer = device
        .create_buffer_with_data(
            &BufferDescriptor {
                label: Some("round trip".into()),
                size: data.len() as u64,
                usage: BufferUsage::STORAGE,
            },
            &data,
        )
        .unwrap();
    assert_eq!(device.read_buffer(buffer).unwrap(), data);
    device.write_buffer(buffer, 4, &[9, 9, 9, 9]).unwrap();
    assert_eq!(&device.read_buffer(buffer).unwrap()[4..8], &[9, 9, 9, 9]);
}

#[test]
fn every_program_and_kernel_compiles() {
    let Some(device) = device() else { return };
    for program in [
        RenderProgram::FlatColor,
        RenderProgram::IndexedProcedural,
        RenderProgram::UnpackedProcedural,
        RenderProgram::VisibleTriangles,
    ] {
        device
            .create_render_pipeline(&RenderPipelineDescriptor {
                label: None,
                program,
                color_format: TextureFormat::Rgba8Unorm,
                depth_format: Some(TextureFormat::Depth32Float),
            })
            .unwrap_or_else(|e| panic!("{program:?}: {e}"));
    }
    device
        .create_render_pipeline(&RenderPipelineDescriptor {
            label: None,
            program: RenderProgram::TriangleIds,
            color_format: TextureFormat::R32Uint,
            depth_format: Some(TextureFormat::Depth32Float),
        })
        .unwrap();
    for kernel in [
        ComputeKernel::AccumulateIds,
        ComputeKernel::CompactVisible,
        ComputeKernel::WriteDrawArgs,
    ] {
        device
            .create_compute_pipeline(&ComputePipelineDescriptor {
                label: None,
                kernel,
            })
            .unwrap_or_else(|e| panic!("{kernel:?}: {e}"));
    }
}

#[test]
fn triangle_ids_are_written_with_the_sentinel_clear() {
    let Some(device) = device() else { return };
    let size = 16;
    let texture = device
        .create_texture(&TextureDescriptor {
            label: None,
            size: Extent2D::square(size),
            format: TextureFormat::R32Uint,
            usage: TextureUsage::RENDER_ATTACHMENT | TextureUsage::COPY_SRC,
        })
        .unwrap();
    let view = device.create_texture_view(texture).unwrap();
    let pipeline = device
        .create_render_pipeline(&RenderPipelineDescriptor {
            label: None,
            program: RenderProgram::TriangleIds,
            color_format: TextureFormat::R32Uint,
            depth_format: None,
        })
        .unwrap();

    // One triangle covering the lower-left half, offset to global id 7.
    let n = Vec3::new(0.0, 0.0, 1.0);
    let mut records = vec![StructuredVertex::new(Vec3::new(0.0, 0.0, 0.0), n, 0); 21];
    records.extend([
        StructuredVertex::new(Vec3::new(-1.0, -1.0, 0.5), n, 0),
        StructuredVertex::new(Vec3::new(1.0, -1.0, 0.5), n, 0),
        StructuredVertex::new(Vec3::new(-1.0, 1.0, 0.5), n, 0),
    ]);
    let parts = [PartAttributes::new(&Mat4::IDENTITY, LinearRgba::WHITE)];
    let uniforms = ViewUniforms::new(&Mat4::IDENTITY, &Mat4::IDENTITY).with_triangle_offset(7);
    let buffer = |bytes: &[u8], usage| {
        device
            .create_buffer_with_data(
                &BufferDescriptor {
                    label: None,
                    size: bytes.len() as u64,
                    usage,
                },
                bytes,
            )
            .unwrap()
    };
    let view_buffer = buffer(bytemuck::bytes_of(&uniforms), BufferUsage::UNIFORM);
    let record_buffer = buffer(bytemuck::cast_slice(&records), BufferUsage::STORAGE);
    let part_buffer = buffer(bytemuck::cast_slice(&parts), BufferUsage::STORAGE);
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
            entries: &[
                BindGroupEntry::buffer(0, record_buffer),
                BindGroupEntry::buffer(1, part_buffer),
            ],
        })
        .unwrap();

    let mut encoder = device.create_command_encoder(None);
    {
        let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
            label: None,
            color_attachment: RenderPassColorAttachment {
                view,
                ops: Operations {
                    load: LoadOp::Clear(ClearValue::Uint([ID_SENTINEL, 0, 0, 0])),
                    store: StoreOp::Store,
                },
            },
            depth_stencil_attachment: None,
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, group0);
        pass.set_bind_group(1, group1);
        pass.draw(0..3, 0..1);
    }
    let command_buffer = encoder.finish();
    device.submit_command_buffer(command_buffer).unwrap();
    device.wait_idle().unwrap();

    let ids: Vec<u32> = bytemuck::pod_collect_to_vec(&device.read_texture(texture).unwrap());
    assert_eq!(ids.len(), (size * size) as usize);
    assert!(ids.iter().all(|&id| id == 7 || id == ID_SENTINEL));
    assert!(ids.contains(&7));
    assert!(ids.contains(&ID_SENTINEL));
}

#[test]
fn storage_limits_cover_the_default_binding_size() {
    let Some(device) = device() else { return };
    let limits = device.limits();
    assert!(limits.max_storage_buffer_binding_size >= 128 << 20);
    assert!(limits.max_buffer_size >= limits.max_storage_buffer_binding_size);
    assert!(limits.max_compute_workgroups_per_dimension >= 65535);
}

#[test]
fn oversized_dispatches_fail_at_submission() {
    let Some(device) = device() else { return };
    let pipeline = device
        .create_compute_pipeline(&ComputePipelineDescriptor {
            label: None,
            kernel: ComputeKernel::WriteDrawArgs,
        })
        .unwrap();
    let buffer = |size, usage| {
        device
            .create_buffer(&BufferDescriptor {
                label: None,
                size,
                usage,
            })
            .unwrap()
    };
    let visible = buffer(VisibleSetHeader::buffer_size(4), BufferUsage::STORAGE);
    let args = buffer(16, BufferUsage::STORAGE | BufferUsage::INDIRECT);
    let group = device
        .create_bind_group(&BindGroupDescriptor {
            label: None,
            layout: BindGroupLayoutSource::Compute(pipeline, 0),
            entries: &[BindGroupEntry::buffer(0, visible), BindGroupEntry::buffer(1, args)],
        })
        .unwrap();

    let too_many = device.limits().max_compute_workgroups_per_dimension + 1;
    let mut encoder = device.create_command_encoder(None);
    {
        let mut pass = encoder.begin_compute_pass(&ComputePassDescriptor { label: None });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, group);
        pass.dispatch_workgroups(too_many, 1, 1);
    }
    let result = device.submit_command_buffer(encoder.finish());
    assert!(matches!(result, Err(RenderError::SubmissionFailed(_))), "{result:?}");
}
