extern crate ffmpeg_next as ffmpeg;

use std::{fmt, path::Path, sync::OnceLock};

use color_eyre::eyre::{self, Context};
use ffmpeg::{
    codec, decoder,
    format::{self, Pixel},
    frame,
    software::scaling,
    util::log as ffmpeglog,
};
use image::{imageops, RgbImage};

use super::logger::{self, fault, verbose, warning};
use crate::frame_source::Frames;

pub type Result<T> = eyre::Result<T>;

/// Decodes the frames of the best video stream in a file, one at a time and in order.
/// Everything ffmpeg holds for the file is released when this is dropped.
pub struct FrameExtractor<L: logger::Logger = logger::LogLogger> {
    logger: L,

    input: format::context::Input,
    decoder: decoder::Video,
    scaler: scaling::Context,

    stream: usize,
    rotation: Rotation,
    produced: usize,
    flushed: bool,
}

fn init_ffmpeg() -> Result<()> {
    static INIT: OnceLock<std::result::Result<(), ffmpeg::Error>> = OnceLock::new();
    let res = INIT.get_or_init(|| {
        ffmpeg::init()?;
        ffmpeglog::set_level(ffmpeglog::Level::Error);
        Ok(())
    });
    (*res).wrap_err("Failed to initialize ffmpeg")
}

impl FrameExtractor<logger::LogLogger> {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        Self::new_with_logger(path, logger::LogLogger)
    }
}

impl<L: logger::Logger> FrameExtractor<L> {
    pub fn new_with_logger(path: impl AsRef<Path>, logger: L) -> Result<Self> {
        init_ffmpeg()?;
        let mut input = format::input(&path).wrap_err("Failed to open the file")?;

        let (stream, rotation, decoder) = {
            let video = input
                .streams()
                .best(ffmpeg::media::Type::Video)
                .ok_or_else(|| eyre::eyre!("The file has no video stream"))?;

            let rotation = Rotation::of_stream(&video).unwrap_or_else(|| {
                warning!(logger, "Unsupported display rotation, ignoring it");
                Rotation::None
            });

            let decoder = codec::Context::from_parameters(video.parameters())
                .and_then(|ctx| ctx.decoder().video())
                .wrap_err("Found no video decoder for the stream")?;

            (video.index(), rotation, decoder)
        };

        eyre::ensure!(
            decoder.format() != Pixel::None,
            "The decoder has no pixel format"
        );
        let scaler = scaling::Context::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::RGB24,
            decoder.width(),
            decoder.height(),
            scaling::Flags::FAST_BILINEAR,
        )
        .wrap_err("Failed to create an RGB converter")?;

        for mut other in input.streams_mut().filter(|s| s.index() != stream) {
            discard_stream(&mut other);
        }

        verbose!(
            logger,
            "Decoding stream {stream}, {}x{}, rotated {rotation:?}",
            decoder.width(),
            decoder.height()
        );

        Ok(Self {
            logger,
            input,
            decoder,
            scaler,
            stream,
            rotation,
            produced: 0,
            flushed: false,
        })
    }

    /// The next frame, or None when the stream has ended
    pub fn next(&mut self) -> Result<Option<RgbImage>> {
        let mut decoded = frame::Video::empty();
        loop {
            // avcodec_receive_frame in
            // https://ffmpeg.org/doxygen/trunk/group__lavc__decoding.html
            match self.decoder.receive_frame(&mut decoded) {
                Ok(()) => break,
                Err(ffmpeg::Error::Other {
                    errno: libc::EAGAIN,
                }) if !self.flushed => self.send_next_packet()?,
                // the decoder wants more even after EOF was sent, it will never get any
                Err(ffmpeg::Error::Other {
                    errno: libc::EAGAIN,
                }) => return Ok(None),
                Err(ffmpeg::Error::Eof) => return Ok(None),
                Err(e) => return Err(e).wrap_err("The decoder failed to produce a frame"),
            }
        }

        let mut rgb = frame::Video::empty();
        self.scaler
            .run(&decoded, &mut rgb)
            .wrap_err("Failed to convert a frame to RGB")?;
        let img = to_rgb_image(&rgb)?;
        self.produced += 1;
        Ok(Some(self.rotation.upright(img)))
    }

    /// Gives the decoder the next packet of the video stream, or EOF if there are no more.
    /// Packets the decoder rejects are logged and skipped.
    fn send_next_packet(&mut self) -> Result<()> {
        loop {
            let mut packet = ffmpeg::Packet::empty();
            // av_read_frame in
            // https://ffmpeg.org/doxygen/trunk/group__lavf__decoding.html
            match packet.read(&mut self.input) {
                Ok(()) if packet.stream() != self.stream => (),
                Ok(()) => match self.decoder.send_packet(&packet) {
                    Ok(()) => return Ok(()),
                    Err(e) => fault!(
                        self.logger,
                        "Skipping a broken packet after frame {}: {e}",
                        self.produced
                    ),
                },
                Err(ffmpeg::Error::Eof) => {
                    self.flushed = true;
                    return self
                        .decoder
                        .send_eof()
                        .wrap_err("The decoder did not accept EOF");
                }
                Err(e) => return Err(e).wrap_err("Failed to read a packet"),
            }
        }
    }

    /// How many frames have been returned so far
    pub fn decoded(&self) -> usize {
        self.produced
    }

    pub fn iter(&mut self) -> FrameExtractorIter<'_, L> {
        FrameExtractorIter { extractor: self }
    }
}

/// Decodes every frame of the video at `path`.
pub fn read_frames(path: impl AsRef<Path>) -> Result<Frames> {
    let path = path.as_ref();
    let mut extractor =
        FrameExtractor::new_with_logger(path, logger::ContextLogger::new(path))?;
    let frames = extractor.iter().collect::<Result<Frames>>()?;
    Ok(frames)
}

pub struct FrameExtractorIter<'a, L: logger::Logger> {
    extractor: &'a mut FrameExtractor<L>,
}

impl<L: logger::Logger> Iterator for FrameExtractorIter<'_, L> {
    type Item = Result<RgbImage>;

    fn next(&mut self) -> Option<Self::Item> {
        self.extractor.next().transpose()
    }
}

/// How far clockwise the decoded frames must be turned to be upright
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Rotation {
    None,
    Quarter,
    Half,
    ThreeQuarters,
}

impl Rotation {
    /// Reads the display matrix of the stream. None if it rotates by something other than
    /// a multiple of 90 degrees.
    fn of_stream(stream: &ffmpeg::Stream<'_>) -> Option<Self> {
        let Some(matrix) = stream
            .side_data()
            .find(|d| d.kind() == ffmpeg::packet::side_data::Type::DisplayMatrix)
        else {
            return Some(Self::None);
        };

        // counterclockwise degrees
        let degrees = unsafe {
            ffmpeg_sys_next::av_display_rotation_get(matrix.data().as_ptr() as *const i32)
        };
        if !degrees.is_finite() {
            return Some(Self::None);
        }

        match (degrees.round() as i32).rem_euclid(360) {
            0 => Some(Self::None),
            90 => Some(Self::ThreeQuarters),
            180 => Some(Self::Half),
            270 => Some(Self::Quarter),
            _ => None,
        }
    }

    fn upright(self, img: RgbImage) -> RgbImage {
        match self {
            Self::None => img,
            Self::Quarter => imageops::rotate90(&img),
            Self::Half => imageops::rotate180(&img),
            Self::ThreeQuarters => imageops::rotate270(&img),
        }
    }
}

/// Copies a packed RGB24 frame, whose lines might be padded, into an image.
fn to_rgb_image(rgb: &frame::Video) -> Result<RgbImage> {
    eyre::ensure!(
        rgb.format() == Pixel::RGB24 && rgb.planes() == 1,
        "Expected packed RGB24, got {:?}",
        rgb.format()
    );

    let (width, height) = (rgb.width(), rgb.height());
    let line = 3 * width as usize;
    let stride = rgb.stride(0);
    eyre::ensure!(stride >= line, "Lines are shorter than the width");

    let pixels: Vec<u8> = rgb
        .data(0)
        .chunks(stride)
        .take(height as usize)
        .flat_map(|padded| &padded[..line])
        .copied()
        .collect();

    RgbImage::from_raw(width, height, pixels)
        .ok_or_else(|| eyre::eyre!("The frame holds less than {width}x{height} pixels"))
}

fn discard_stream(stream: &mut ffmpeg::StreamMut<'_>) {
    unsafe {
        let ptr = stream.as_mut_ptr();
        if !ptr.is_null() {
            (*ptr).discard = ffmpeg_sys_next::AVDiscard::AVDISCARD_ALL;
        }
    }
}

impl<L: logger::Logger> fmt::Debug for FrameExtractor<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameExtractor")
            .field("stream", &self.stream)
            .field("rotation", &self.rotation)
            .field("decoded", &self.produced)
            .field("flushed", &self.flushed)
            .finish()
    }
}
