// NOTE: every test will complain about the functions it doesn't use
#![allow(unused)]

use std::path::PathBuf;

use image::RgbImage;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use stills_common::utils::imgutils::filled;

pub const WIDTH: u32 = 32;
pub const HEIGHT: u32 = 18;

/// Returns cargo's tmpdir
pub fn cargo_tmpdir() -> PathBuf {
    PathBuf::from(option_env!("CARGO_TARGET_TMPDIR").expect("no cargo tmpdir???"))
}

/// A video of `len` frames that starts out black and flips between black and white at
/// every frame in `cuts`.
pub fn cut_video(len: usize, cuts: &[usize]) -> Vec<RgbImage> {
    let black = filled(WIDTH, HEIGHT, 0, 0, 0);
    let white = filled(WIDTH, HEIGHT, 255, 255, 255);
    let mut is_white = false;
    (0..len)
        .map(|i| {
            if cuts.contains(&i) {
                is_white = !is_white;
            }
            if is_white {
                white.clone()
            } else {
                black.clone()
            }
        })
        .collect()
}

/// `len` frames of random noise
pub fn noise_video(seed: u64, len: usize) -> Vec<RgbImage> {
    let mut rng = SmallRng::seed_from_u64(seed);
    (0..len)
        .map(|_| RgbImage::from_fn(WIDTH, HEIGHT, |_, _| image::Rgb(rng.gen())))
        .collect()
}
