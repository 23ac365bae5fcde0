use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use optflow_image::GrayImage;
use optflow_imgproc::pyramid::{pyrdown, pyrdown_size, ImagePyramid};

fn bench_pyramid(c: &mut Criterion) {
    let mut group = c.benchmark_group("Pyramid Operations");

    for (width, height) in [(256, 224), (512, 448), (1024, 896)].iter() {
        group.throughput(criterion::Throughput::Elements((*width * *height) as u64));

        let parameter_string = format!("{}x{}", width, height);

        let image_size = [*width, *height].into();
        let image = GrayImage::from_fn(image_size, |x, y, _| ((x * 3 + y * 5) % 256) as u8).unwrap();
        let down = GrayImage::from_size_val(pyrdown_size(image_size), 0).unwrap();

        group.bench_with_input(
            BenchmarkId::new("pyrdown", &parameter_string),
            &(&image, &down),
            |b, i| {
                let (src, mut dst) = (i.0, i.1.clone());
                b.iter(|| {
                    black_box(pyrdown(src, &mut dst)).unwrap();
                })
            },
        );

        group.bench_with_input(
            BenchmarkId::new("pyramid_4_levels", &parameter_string),
            &image,
            |b, src| {
                b.iter(|| {
                    black_box(ImagePyramid::build(src, 4)).unwrap();
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_pyramid);
criterion_main!(benches);
