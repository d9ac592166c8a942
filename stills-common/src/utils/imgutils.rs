use image::{GenericImageView, ImageBuffer, Pixel, Rgb, RgbImage};

pub const GRAY_LEVELS: usize = 256;

/// Number of pixels per gray level
pub type Histogram = [u32; GRAY_LEVELS];

/// Rec.601 luma in 14 bit fixed point, rounded. The same integer conversion as OpenCV's
/// `BGR2GRAY`, so gray levels match what is commonly used for histogram comparisons.
pub fn luma(rgb: Rgb<u8>) -> u8 {
    const R: u32 = 4899;
    const G: u32 = 9617;
    const B: u32 = 1868;
    const SHIFT: u32 = 14;
    let [r, g, b] = rgb.0.map(u32::from);
    // the weights sum to 1 << SHIFT, so this is at most 255
    ((r * R + g * G + b * B + (1 << (SHIFT - 1))) >> SHIFT) as u8
}

/// Histogram of the gray levels of the pixels
pub fn histogram<I>(img: &I) -> Histogram
where
    I: GenericImageView,
    I::Pixel: Pixel<Subpixel = u8>,
{
    let mut hist = [0; GRAY_LEVELS];
    img.pixels()
        .for_each(|(_, _, p)| hist[usize::from(luma(p.to_rgb()))] += 1);
    hist
}

pub fn filled(width: u32, height: u32, red: u8, green: u8, blue: u8) -> RgbImage {
    let mut buf = ImageBuffer::new(width, height);
    buf.enumerate_pixels_mut()
        .for_each(|(_, _, pixel)| *pixel = image::Rgb([red, green, blue]));
    buf
}

/// An image one pixel high where pixel `x` has the gray level `levels[x]`
pub fn gray_strip(levels: &[u8]) -> RgbImage {
    let width = u32::try_from(levels.len()).expect("a reasonable amount of levels");
    RgbImage::from_fn(width, 1, |x, _| {
        let l = levels[x as usize];
        image::Rgb([l, l, l])
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn histogram_of_filled() {
        let img = filled(4, 5, 10, 10, 10);
        let hist = histogram(&img);
        assert_eq!(20, hist[10]);
        assert_eq!(20, hist.iter().sum::<u32>());
    }

    #[test]
    fn luma_weights() {
        assert_eq!(76, luma(Rgb([255, 0, 0])));
        assert_eq!(150, luma(Rgb([0, 255, 0])));
        assert_eq!(29, luma(Rgb([0, 0, 255])));
        assert_eq!(76, luma(Rgb([0, 130, 0])));
        assert_eq!(255, luma(Rgb([255, 255, 255])));
        assert_eq!(0, luma(Rgb([0, 0, 0])));
    }

    #[test]
    fn red_lands_in_its_luma_bin() {
        let hist = histogram(&filled(4, 4, 255, 0, 0));
        assert_eq!(16, hist[76]);
    }

    #[test]
    fn gray_strip_keeps_levels() {
        let levels: Vec<u8> = (0..=255).collect();
        let hist = histogram(&gray_strip(&levels));
        assert!(hist.iter().all(|&count| count == 1));
    }
}
