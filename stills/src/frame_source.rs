use image::RgbImage;

/// An ordered, finite sequence of decoded frames.
pub trait FrameSource {
    fn frame_count(&self) -> usize;

    /// The frame at `index`, or None if the index is out of range
    fn frame(&self, index: usize) -> Option<&RgbImage>;

    fn is_empty(&self) -> bool {
        self.frame_count() == 0
    }

    /// All frames in order
    fn frames(&self) -> FrameIter<'_, Self> {
        FrameIter {
            source: self,
            next: 0,
        }
    }
}

pub struct FrameIter<'a, S: ?Sized> {
    source: &'a S,
    next: usize,
}

impl<'a, S> Iterator for FrameIter<'a, S>
where
    S: FrameSource + ?Sized,
{
    type Item = &'a RgbImage;

    fn next(&mut self) -> Option<Self::Item> {
        let frame = self.source.frame(self.next)?;
        self.next += 1;
        Some(frame)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.source.frame_count().saturating_sub(self.next);
        (left, Some(left))
    }
}

impl<S> ExactSizeIterator for FrameIter<'_, S> where S: FrameSource + ?Sized {}

impl FrameSource for [RgbImage] {
    fn frame_count(&self) -> usize {
        self.len()
    }

    fn frame(&self, index: usize) -> Option<&RgbImage> {
        self.get(index)
    }
}

impl FrameSource for Vec<RgbImage> {
    fn frame_count(&self) -> usize {
        self.len()
    }

    fn frame(&self, index: usize) -> Option<&RgbImage> {
        self.get(index)
    }
}

/// All frames of a video, held in memory
#[derive(Debug, Default, Clone)]
pub struct Frames(Vec<RgbImage>);

impl FrameSource for Frames {
    fn frame_count(&self) -> usize {
        self.0.len()
    }

    fn frame(&self, index: usize) -> Option<&RgbImage> {
        self.0.get(index)
    }
}

impl FromIterator<RgbImage> for Frames {
    fn from_iter<T: IntoIterator<Item = RgbImage>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
