#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    sync::OnceLock,
};

use ditherlab::PixelBuffer;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

/// Environment variable pointing to a directory of images to benchmark with instead of
/// the synthetic ones.
pub const IMAGE_DIR_VAR: &str = "DITHERLAB_BENCH_IMAGES";

pub fn load_images(images: &[PathBuf]) -> Vec<(String, PixelBuffer)> {
    images
        .iter()
        .map(|path| {
            image::open(path).map(|image| {
                (
                    path.file_name().unwrap().to_owned().into_string().unwrap(),
                    PixelBuffer::from(&image.into_rgba8()),
                )
            })
        })
        .collect::<Result<_, _>>()
        .expect("loaded each image")
}

pub fn load_image_dir(dir: impl AsRef<Path>) -> Vec<(String, PixelBuffer)> {
    let mut paths = std::fs::read_dir(dir)
        .expect("read img directory")
        .collect::<Result<Vec<_>, _>>()
        .expect("read each file")
        .iter()
        .map(std::fs::DirEntry::path)
        .collect::<Vec<_>>();

    paths.sort();

    load_images(&paths)
}

/// A diagonal color gradient with some per-pixel noise on top.
pub fn gradient(width: u32, height: u32, seed: u64) -> PixelBuffer {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut data = Vec::with_capacity(width as usize * height as usize * 4);
    for y in 0..height {
        for x in 0..width {
            let u = x as f32 / width as f32;
            let v = y as f32 / height as f32;
            let noise = rng.gen_range(-12.0..12.0);
            let channel = |value: f32| (value * 255.0 + noise).clamp(0.0, 255.0) as u8;
            data.extend([channel(u), channel(v), channel(1.0 - (u + v) / 2.0), 255]);
        }
    }
    PixelBuffer::new(width, height, data).unwrap()
}

/// Uniformly random opaque pixels, the worst case for the quantizers.
pub fn noise(width: u32, height: u32, seed: u64) -> PixelBuffer {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let data = (0..width as usize * height as usize)
        .flat_map(|_| [rng.gen(), rng.gen(), rng.gen(), 255])
        .collect();
    PixelBuffer::new(width, height, data).unwrap()
}

pub fn load_synthetic_images() -> Vec<(String, PixelBuffer)> {
    vec![
        ("gradient_640x480".to_owned(), gradient(640, 480, 1)),
        ("gradient_1920x1080".to_owned(), gradient(1920, 1080, 2)),
        ("noise_640x480".to_owned(), noise(640, 480, 3)),
    ]
}

static BENCHMARK_IMAGES: OnceLock<Vec<(String, PixelBuffer)>> = OnceLock::new();

/// The images in the directory named by [`IMAGE_DIR_VAR`], or synthetic images if it is unset.
pub fn benchmark_images() -> &'static [(String, PixelBuffer)] {
    BENCHMARK_IMAGES.get_or_init(|| match std::env::var_os(IMAGE_DIR_VAR) {
        Some(dir) => load_image_dir(dir),
        None => load_synthetic_images(),
    })
}
