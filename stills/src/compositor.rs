use std::path::{Path, PathBuf};

use image::{buffer::ConvertBuffer, imageops, ImageOutputFormat, RgbaImage};
use stills_common::utils::fsutils;

use crate::{error::StillsError, frame_source::FrameSource};

pub const STILLS_SUFFIX: &str = "_stills.png";

/// Places the frames at `indices` next to each other, left to right in the given order,
/// top aligned and without any spacing. Indices without a frame are skipped. Everything
/// not covered by a frame is fully transparent.
pub fn compose<S>(source: &S, indices: &[usize]) -> Result<RgbaImage, StillsError>
where
    S: FrameSource + ?Sized,
{
    let frames: Vec<_> = indices
        .iter()
        .filter_map(|&i| {
            let frame = source.frame(i);
            if frame.is_none() {
                log::debug!(
                    "Skipping keyframe {i}, there are only {} frames",
                    source.frame_count()
                );
            }
            frame
        })
        .collect();

    if frames.is_empty() {
        return Err(StillsError::NothingToComposite);
    }

    let width = frames.iter().map(|f| f.width()).sum();
    let height = frames.iter().map(|f| f.height()).max().unwrap_or(0);

    // NOTE: starts out as all zeroes, i.e., transparent
    let mut canvas = RgbaImage::new(width, height);
    let mut x_offset: i64 = 0;
    for frame in frames {
        let opaque: RgbaImage = frame.convert();
        imageops::replace(&mut canvas, &opaque, x_offset, 0);
        x_offset += i64::from(frame.width());
    }

    Ok(canvas)
}

/// Where the stills of `video` are written: `<stem>_stills.png` next to the video, or in
/// `outdir` if there is one.
pub fn stills_path(video: impl AsRef<Path>, outdir: Option<&Path>) -> PathBuf {
    let video = video.as_ref();
    let mut name = video.file_stem().unwrap_or_default().to_owned();
    name.push(STILLS_SUFFIX);
    match outdir {
        Some(dir) => dir.join(name),
        None => video.with_file_name(name),
    }
}

/// Writes the composite as a PNG. The file at `path` is either completely written or
/// left untouched.
pub fn save_png(composite: &RgbaImage, path: impl AsRef<Path>) -> Result<(), StillsError> {
    let path = path.as_ref();
    fsutils::write_atomically(path, |w| composite.write_to(w, ImageOutputFormat::Png))
        .map_err(|source| StillsError::Write {
            path: path.to_owned(),
            source,
        })
}

#[cfg(test)]
mod test {
    use super::*;
    use image::Rgba;
    use stills_common::utils::imgutils::filled;

    fn three_frames() -> Vec<image::RgbImage> {
        vec![
            filled(100, 60, 255, 0, 0),
            filled(150, 60, 0, 255, 0),
            filled(80, 90, 0, 0, 255),
        ]
    }

    #[test]
    fn geometry() {
        let canvas = compose(&three_frames(), &[0, 1, 2]).unwrap();
        assert_eq!((330, 90), canvas.dimensions());

        assert_eq!(&Rgba([255, 0, 0, 255]), canvas.get_pixel(0, 0));
        assert_eq!(&Rgba([255, 0, 0, 255]), canvas.get_pixel(99, 59));
        assert_eq!(&Rgba([0, 255, 0, 255]), canvas.get_pixel(100, 0));
        assert_eq!(&Rgba([0, 255, 0, 255]), canvas.get_pixel(249, 59));
        assert_eq!(&Rgba([0, 0, 255, 255]), canvas.get_pixel(250, 0));
        assert_eq!(&Rgba([0, 0, 255, 255]), canvas.get_pixel(329, 89));
    }

    #[test]
    fn uncovered_is_transparent() {
        let frames = three_frames();
        let canvas = compose(&frames, &[0, 1, 2]).unwrap();
        let covered = |x: u32, y: u32| match x {
            0..=99 => y < 60,
            100..=249 => y < 60,
            _ => y < 90,
        };
        for (x, y, p) in canvas.enumerate_pixels() {
            if covered(x, y) {
                assert_eq!(255, p[3], "({x}, {y})");
            } else {
                assert_eq!(0, p[3], "({x}, {y})");
            }
        }
    }

    #[test]
    fn out_of_range_is_skipped() {
        let frames = three_frames();
        let canvas = compose(&frames, &[0, 2, 3, 17]).unwrap();
        assert_eq!((180, 90), canvas.dimensions());
        assert_eq!(&Rgba([0, 0, 255, 255]), canvas.get_pixel(100, 0));
    }

    #[test]
    fn repeated_indices_are_repeated() {
        let canvas = compose(&three_frames(), &[0, 0]).unwrap();
        assert_eq!((200, 60), canvas.dimensions());
    }

    #[test]
    fn nothing_to_compose() {
        assert!(matches!(
            compose(&three_frames(), &[5]),
            Err(StillsError::NothingToComposite)
        ));
        assert!(matches!(
            compose(&Vec::<image::RgbImage>::new(), &[0, 0, 0]),
            Err(StillsError::NothingToComposite)
        ));
    }

    #[test]
    fn naming() {
        assert_eq!(
            PathBuf::from("dir/clip_stills.png"),
            stills_path("dir/clip.mp4", None)
        );
        assert_eq!(
            PathBuf::from("out/clip.v2_stills.png"),
            stills_path("dir/clip.v2.MP4", Some(Path::new("out")))
        );
        assert_eq!(PathBuf::from("clip_stills.png"), stills_path("clip.mp4", None));
    }

    #[test]
    fn saved_png_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x_stills.png");
        let canvas = compose(&three_frames(), &[1, 2]).unwrap();
        save_png(&canvas, &path).unwrap();

        let read = image::open(&path).unwrap().into_rgba8();
        assert_eq!(canvas, read);
        assert_eq!(1, std::fs::read_dir(dir.path()).unwrap().count());
    }

    #[test]
    #[cfg(unix)]
    fn saved_png_is_as_readable_as_any_file() {
        use std::os::unix::fs::PermissionsExt;
        let mode = |p: &Path| std::fs::metadata(p).unwrap().permissions().mode() & 0o777;

        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("plain.txt");
        std::fs::write(&plain, "").unwrap();
        let path = dir.path().join("clip_stills.png");
        save_png(&compose(&three_frames(), &[0]).unwrap(), &path).unwrap();

        assert_eq!(mode(&plain), mode(&path));
    }
}
