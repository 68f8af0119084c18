//! Colours offered by the drawing palette.
//!
//! The codec itself stores any 24-bit colour; these are just the ones the
//! editor hands out.

use crate::*;

pub const RED: Rgb<u8> = Rgb([255, 0, 0]);
pub const ORANGE: Rgb<u8> = Rgb([255, 128, 0]);
pub const YELLOW: Rgb<u8> = Rgb([255, 255, 0]);
pub const GREEN: Rgb<u8> = Rgb([0, 128, 0]);
pub const BLUE: Rgb<u8> = Rgb([0, 0, 255]);
pub const PURPLE: Rgb<u8> = Rgb([128, 0, 128]);
pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
pub const GRAY: Rgb<u8> = Rgb([128, 128, 128]);
pub const LIGHT_GRAY: Rgb<u8> = Rgb([211, 211, 211]);

/// Blank canvas colour; also the implicit reference before the first frame.
pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

pub struct Palette;

impl Palette {
    pub const ALL: [(&'static str, Rgb<u8>); 10] = [
        ("red", RED),
        ("orange", ORANGE),
        ("yellow", YELLOW),
        ("green", GREEN),
        ("blue", BLUE),
        ("purple", PURPLE),
        ("black", BLACK),
        ("gray", GRAY),
        ("light gray", LIGHT_GRAY),
        ("white", WHITE),
    ];

    pub fn name_of(color: Rgb<u8>) -> Option<&'static str> {
        Self::ALL
            .iter()
            .find(|(_, c)| *c == color)
            .map(|(name, _)| *name)
    }

    pub fn by_name(name: &str) -> Option<Rgb<u8>> {
        Self::ALL
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, c)| *c)
    }
}
