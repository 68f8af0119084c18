mod archive;
mod codec;
mod export;
mod frame;
mod library;
pub mod palette;
pub mod raster;
mod source;
mod stack;
mod stats;

pub use ::image::{Rgb, RgbImage};

pub use self::{
    archive::*, codec::*, export::*, frame::*, library::*, palette::Palette, raster::*,
    source::*, stack::*, stats::*,
};
