#[path = "../util/util.rs"]
mod util;

use util::benchmark_images;

use std::time::Duration;

use criterion::{
    criterion_group, criterion_main, measurement::WallTime, Bencher, BenchmarkId, Criterion,
    SamplingMode,
};
use ditherlab::{presets, ColorMatcher, ColorMetric, DitherMethod, Ditherer, PixelBuffer};

fn bench(
    c: &mut Criterion,
    group: &str,
    images: &[(String, PixelBuffer)],
    mut f: impl FnMut(&mut Bencher<WallTime>, &(DitherMethod, &PixelBuffer)),
) {
    let mut group = c.benchmark_group(group);
    group
        .sample_size(30)
        .noise_threshold(0.05)
        .sampling_mode(SamplingMode::Flat)
        .warm_up_time(Duration::from_secs(2));

    for method in DitherMethod::ALL {
        for (path, image) in images {
            group.bench_with_input(
                BenchmarkId::new(method.id(), path),
                &(method, image),
                &mut f,
            );
        }
    }
}

fn matcher() -> ColorMatcher {
    ColorMatcher::new(
        presets::find("vaporwave").unwrap().palette(),
        ColorMetric::Euclidean,
    )
}

fn dither_single(c: &mut Criterion) {
    let matcher = matcher();
    bench(c, "dither_single", benchmark_images(), |b, &(method, image)| {
        let ditherer = Ditherer::new(method).serpentine(true);
        b.iter(|| ditherer.dither(image, &matcher))
    })
}

fn dither_par(c: &mut Criterion) {
    let matcher = matcher();
    bench(c, "dither_par", benchmark_images(), |b, &(method, image)| {
        let ditherer = Ditherer::new(method).serpentine(true);
        b.iter(|| ditherer.dither_par(image, &matcher))
    })
}

fn dither_redmean_single(c: &mut Criterion) {
    let matcher = ColorMatcher::new(
        presets::find("vaporwave").unwrap().palette(),
        ColorMetric::Redmean,
    );
    bench(
        c,
        "dither_redmean_single",
        benchmark_images(),
        |b, &(method, image)| {
            let ditherer = Ditherer::new(method);
            b.iter(|| ditherer.dither(image, &matcher))
        },
    )
}

criterion_group!(benches, dither_single, dither_par, dither_redmean_single);
criterion_main!(benches);
