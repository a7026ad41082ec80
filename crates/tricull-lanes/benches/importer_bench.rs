use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use tricull_core::math::Vec3;
use tricull_core::scene::Mesh;
use tricull_infra::SoftwareDevice;
use tricull_lanes::import_lane::{pack_indexed, unpack, unpack_all};
use tricull_lanes::StructuredBufferImporter;

fn bench_packing(c: &mut Criterion) {
    // 128 x 128 cells, 32k triangles
    let grid = Mesh::grid(10.0, 10.0, 128, 128);
    let parts: Vec<Mesh> = (0..64).map(|i| Mesh::cuboid(Vec3::ONE * (1.0 + i as f32))).collect();

    let mut group = c.benchmark_group("Structured packing");

    group.bench_function("Indexed (grid)", |b| {
        b.iter(|| black_box(pack_indexed(black_box(&grid))))
    });

    group.bench_function("Unpacked (grid)", |b| {
        b.iter(|| black_box(unpack(black_box(&grid), 0)))
    });

    group.bench_function("Unpacked model (64 parts)", |b| {
        b.iter(|| black_box(unpack_all(black_box(&parts))))
    });

    group.finish();
}

fn bench_upload(c: &mut Criterion) {
    let device = SoftwareDevice::new();
    let grid = Mesh::grid(10.0, 10.0, 128, 128);

    c.bench_function("Import and release (software device)", |b| {
        b.iter(|| {
            let importer = StructuredBufferImporter::new(&device);
            if let Ok(import) = importer.import_and_unpack(black_box(&grid)) {
                import.release(&device);
            }
        })
    });
}

criterion_group!(benches, bench_packing, bench_upload);
criterion_main!(benches);
