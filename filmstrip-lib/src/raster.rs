//! Pure geometric transforms over frames.

use crate::*;
use ::image::{imageops, ImageBuffer};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RasterError {
    #[error("scale factors must be positive, got {scale_x}x{scale_y}")]
    ZeroScale { scale_x: u32, scale_y: u32 },

    #[error("scaled frame would be too large: {width}x{height} times {scale_x}x{scale_y}")]
    TooLarge {
        width: u32,
        height: u32,
        scale_x: u32,
        scale_y: u32,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rotation {
    /// Quarter turn counter-clockwise.
    ToLandscape,
    /// Quarter turn clockwise.
    ToPortrait,
}

/// Nearest-neighbour upscale: every source pixel becomes a uniform
/// `scale_x` x `scale_y` block.
pub fn scale(frame: &Frame, scale_x: u32, scale_y: u32) -> Result<Frame, RasterError> {
    if scale_x == 0 || scale_y == 0 {
        return Err(RasterError::ZeroScale { scale_x, scale_y });
    }

    let (width, height) = frame.dimensions();

    let too_large = || RasterError::TooLarge {
        width,
        height,
        scale_x,
        scale_y,
    };

    let out_width = width.checked_mul(scale_x).ok_or_else(too_large)?;
    let out_height = height.checked_mul(scale_y).ok_or_else(too_large)?;

    if (scale_x, scale_y) == (1, 1) {
        return Ok(frame.clone());
    }

    let image = ImageBuffer::from_fn(out_width, out_height, |x, y| {
        frame.pixel(x / scale_x, y / scale_y)
    });

    Ok(Frame::from_image(image))
}

pub fn scale_all(frames: &[Frame], scale_x: u32, scale_y: u32) -> Result<Vec<Frame>, RasterError> {
    frames
        .iter()
        .map(|frame| scale(frame, scale_x, scale_y))
        .collect()
}

pub fn rotate(frame: &Frame, rotation: Rotation) -> Frame {
    let image = match rotation {
        Rotation::ToLandscape => imageops::rotate270(frame.image()),
        Rotation::ToPortrait => imageops::rotate90(frame.image()),
    };

    Frame::from_image(image)
}

pub fn rotate_all(frames: &[Frame], rotation: Rotation) -> Vec<Frame> {
    frames.iter().map(|frame| rotate(frame, rotation)).collect()
}
