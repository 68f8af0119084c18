use crate::*;
use ::image::ImageReader;
use anyhow::{Context, Result};
use std::path::Path;

/// Frames loaded from a directory of images, in file name order.
pub struct Source {
    frames: Vec<Frame>,
}

impl Source {
    pub fn from_dir(path: impl AsRef<Path>) -> Result<Self> {
        let pattern = path.as_ref().join("*.*");
        let paths = glob::glob(&pattern.to_string_lossy()).context("Couldn't find frames")?;

        let frames = paths.into_iter().map(|frame| {
            let path = frame.context("Couldn't find frame")?;

            let image = ImageReader::open(&path)
                .with_context(|| format!("Couldn't open frame: {}", path.display()))?
                .with_guessed_format()
                .with_context(|| format!("Couldn't open frame: {}", path.display()))?
                .decode()
                .with_context(|| format!("Couldn't decode frame: {}", path.display()))?;

            Ok(Frame::from_image(image.to_rgb8()))
        });

        Ok(Self {
            frames: frames.collect::<Result<_>>()?,
        })
    }

    pub fn frames(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter()
    }

    pub fn into_stack(self) -> Result<FrameStack> {
        FrameStack::from_frames(self.frames).context("Couldn't build animation")
    }
}
