use crate::*;

/// Single still raster of the animation.
///
/// Frames are plain values: cloning one yields an independent copy, so editing
/// the frame under the cursor can never reach back into a stored one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    image: RgbImage,
}

impl Frame {
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            image: RgbImage::from_pixel(width, height, palette::WHITE),
        }
    }

    pub fn from_image(image: RgbImage) -> Self {
        Self { image }
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// # Panics
    ///
    /// Panics if `(x, y)` lies outside of the frame; see [`Frame::contains`].
    pub fn pixel(&self, x: u32, y: u32) -> Rgb<u8> {
        *self.image.get_pixel(x, y)
    }

    /// # Panics
    ///
    /// Panics if `(x, y)` lies outside of the frame; see [`Frame::contains`].
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Rgb<u8>) {
        self.image.put_pixel(x, y, color);
    }

    /// Copy of `self` with one pixel repainted; panics like [`Frame::set_pixel`].
    pub fn with_pixel(&self, x: u32, y: u32, color: Rgb<u8>) -> Self {
        let mut frame = self.clone();
        frame.set_pixel(x, y, color);
        frame
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x < self.width() && y < self.height()
    }

    /// Yields every pixel of `self` that differs from `prev`, scanning all y
    /// for x = 0, then all y for x = 1 and so on.
    ///
    /// Both frames must share dimensions.
    pub fn changes_from<'a>(&'a self, prev: &'a Frame) -> impl Iterator<Item = Change> + 'a {
        debug_assert_eq!(self.dimensions(), prev.dimensions());

        let (width, height) = self.dimensions();

        (0..width)
            .flat_map(move |x| (0..height).map(move |y| (x, y)))
            .filter_map(move |(x, y)| {
                let curr = self.pixel(x, y);

                if curr == prev.pixel(x, y) {
                    None
                } else {
                    Some(Change { x, y, color: curr })
                }
            })
    }

    /// Raw RGB bytes, row-major.
    pub fn as_rgb_bytes(&self) -> &[u8] {
        self.image.as_raw()
    }
}

/// One pixel that differs from the reference frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Change {
    pub x: u32,
    pub y: u32,
    pub color: Rgb<u8>,
}
