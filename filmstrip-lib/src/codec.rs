//! Delta codec for saved projects.
//!
//! ```text
//! [width: u8] [height: u8]
//! per frame:
//!   [count: u16 BE]
//!   count * [x: u8] [y: u8] [r: u8] [g: u8] [b: u8]
//! ```
//!
//! Every frame is stored as the pixels that differ from the frame before it;
//! the first frame is compared against an all-white canvas. Changes are listed
//! column by column (all y for x = 0, then x = 1, ...). There is no magic
//! number and no version tag, the stream simply ends after the last frame.

use crate::*;

pub const MAX_DIMENSION: u32 = u8::MAX as u32;
pub const MAX_CHANGES: usize = u16::MAX as usize;

const HEADER_LEN: usize = 2;
const COUNT_LEN: usize = 2;
const RECORD_LEN: usize = 5;

#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("stream is {len} byte(s) long, too short for the width/height header")]
    MalformedHeader { len: usize },

    #[error("stream ends inside frame {frame} (at byte {offset})")]
    TruncatedStream { frame: usize, offset: usize },

    #[error("frames are {width}x{height}, but at most {max}x{max} can be stored", max = MAX_DIMENSION)]
    DimensionOverflow { width: u32, height: u32 },

    #[error("frame {frame} changes {changes} pixels, but at most {max} can be stored", max = MAX_CHANGES)]
    ChangeCountOverflow { frame: usize, changes: usize },

    #[error("frame {frame} is {found:?}, expected {expected:?}")]
    DimensionMismatch {
        frame: usize,
        expected: (u32, u32),
        found: (u32, u32),
    },

    #[error("frame {frame} paints ({x}, {y}), outside of the canvas (at byte {offset})")]
    OutOfBounds {
        frame: usize,
        offset: usize,
        x: u32,
        y: u32,
    },

    #[error("stream contains no frames")]
    NoFrames,
}

/// Incremental encoder; frames are diffed against the previously added one.
#[derive(Debug)]
pub struct Encoder {
    stats: Stats,
    buffer: Vec<u8>,
    prev: Frame,
}

impl Encoder {
    pub fn new(width: u32, height: u32) -> Result<Self, CodecError> {
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(CodecError::DimensionOverflow { width, height });
        }

        let mut buffer = Vec::new();

        buffer.push(width as u8);
        buffer.push(height as u8);

        Ok(Self {
            stats: Default::default(),
            buffer,
            prev: Frame::blank(width, height),
        })
    }

    /// Appends a frame. On error nothing is written and the encoder stays
    /// usable.
    pub fn add(&mut self, curr: &Frame) -> Result<(), CodecError> {
        let frame = self.stats.frames;

        if curr.dimensions() != self.prev.dimensions() {
            return Err(CodecError::DimensionMismatch {
                frame,
                expected: self.prev.dimensions(),
                found: curr.dimensions(),
            });
        }

        let changes: Vec<_> = curr.changes_from(&self.prev).collect();
        let packet = Self::build_packet(frame, &changes)?;

        log::debug!("frame {}: {} change(s)", frame, changes.len());

        self.buffer.extend(packet);
        self.stats.frames += 1;
        self.stats.changes.push(changes.len());
        self.prev = curr.clone();

        Ok(())
    }

    pub fn finish(mut self) -> (Stats, Vec<u8>) {
        self.stats.bytes = self.buffer.len();

        (self.stats, self.buffer)
    }

    fn build_packet(frame: usize, changes: &[Change]) -> Result<Vec<u8>, CodecError> {
        if changes.len() > MAX_CHANGES {
            return Err(CodecError::ChangeCountOverflow {
                frame,
                changes: changes.len(),
            });
        }

        let mut packet = Vec::with_capacity(COUNT_LEN + changes.len() * RECORD_LEN);

        packet.extend((changes.len() as u16).to_be_bytes());

        for change in changes {
            let Rgb([r, g, b]) = change.color;

            packet.extend([change.x as u8, change.y as u8, r, g, b]);
        }

        Ok(packet)
    }
}

/// Encodes a whole sequence; `Ok(None)` when there is nothing to encode.
pub fn encode(frames: &[Frame]) -> Result<Option<Vec<u8>>, CodecError> {
    Ok(encode_with_stats(frames)?.map(|(_, bytes)| bytes))
}

pub fn encode_with_stats(frames: &[Frame]) -> Result<Option<(Stats, Vec<u8>)>, CodecError> {
    let Some(first) = frames.first() else {
        return Ok(None);
    };

    let mut encoder = Encoder::new(first.width(), first.height())?;

    for frame in frames {
        encoder.add(frame)?;
    }

    Ok(Some(encoder.finish()))
}

struct Cursor<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        let chunk = self.bytes.get(self.offset..self.offset.checked_add(len)?)?;
        self.offset += len;
        Some(chunk)
    }
}

/// Decodes a stream produced by [`encode`].
///
/// Either the whole stream is valid and every frame is returned, or an error
/// describing the first problem is; partially decoded frames are discarded.
pub fn decode(bytes: &[u8]) -> Result<Vec<Frame>, CodecError> {
    let mut cursor = Cursor { bytes, offset: 0 };

    let (width, height) = match cursor.take(HEADER_LEN) {
        Some(&[width, height]) => (width as u32, height as u32),
        _ => return Err(CodecError::MalformedHeader { len: bytes.len() }),
    };

    let mut frames: Vec<Frame> = Vec::new();
    let mut reference = Frame::blank(width, height);

    while cursor.remaining() > 0 {
        let frame = frames.len();

        let truncated = |offset| CodecError::TruncatedStream { frame, offset };

        let count = match cursor.take(COUNT_LEN) {
            Some(&[hi, lo]) => u16::from_be_bytes([hi, lo]) as usize,
            _ => return Err(truncated(cursor.offset)),
        };

        if cursor.remaining() < count * RECORD_LEN {
            return Err(truncated(cursor.offset));
        }

        let mut curr = reference.clone();

        for _ in 0..count {
            let offset = cursor.offset;

            let Some(&[x, y, r, g, b]) = cursor.take(RECORD_LEN) else {
                return Err(truncated(offset));
            };

            let (x, y) = (x as u32, y as u32);

            if !curr.contains(x, y) {
                return Err(CodecError::OutOfBounds {
                    frame,
                    offset,
                    x,
                    y,
                });
            }

            curr.set_pixel(x, y, Rgb([r, g, b]));
        }

        log::debug!("frame {}: {} change(s)", frame, count);

        reference = curr.clone();
        frames.push(curr);
    }

    if frames.is_empty() {
        return Err(CodecError::NoFrames);
    }

    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::{BLUE, RED, WHITE};

    #[test]
    fn single_white_frame() {
        let frames = vec![Frame::blank(2, 2)];

        assert_eq!(encode(&frames).unwrap(), Some(vec![2, 2, 0, 0]));
        assert_eq!(decode(&[2, 2, 0, 0]).unwrap(), frames);
    }

    #[test]
    fn single_pixel_change() {
        let first = Frame::blank(2, 2);
        let second = first.with_pixel(0, 0, RED);
        let frames = vec![first, second];

        let bytes = encode(&frames).unwrap().unwrap();

        assert_eq!(bytes, vec![2, 2, 0, 0, 0, 1, 0, 0, 255, 0, 0]);
        assert_eq!(decode(&bytes).unwrap(), frames);
    }

    #[test]
    fn diff_is_against_previous_frame() {
        let a = Frame::blank(3, 1).with_pixel(0, 0, RED);
        let b = a.with_pixel(2, 0, BLUE);
        let c = b.with_pixel(0, 0, WHITE);

        let (stats, bytes) = encode_with_stats(&[a.clone(), b.clone(), c.clone()])
            .unwrap()
            .unwrap();

        assert_eq!(stats.frames, 3);
        assert_eq!(stats.changes, vec![1, 1, 1]);
        assert_eq!(stats.bytes, bytes.len());

        #[rustfmt::skip]
        let expected = vec![
            3, 1,
            0, 1, 0, 0, 255, 0, 0,
            0, 1, 2, 0, 0, 0, 255,
            0, 1, 0, 0, 255, 255, 255,
        ];

        assert_eq!(bytes, expected);
        assert_eq!(decode(&bytes).unwrap(), vec![a, b, c]);
    }

    #[test]
    fn empty_input_yields_no_data() {
        assert_eq!(encode(&[]).unwrap(), None);
    }

    #[test]
    fn largest_canvas_round_trips() {
        let mut frame = Frame::blank(255, 255);
        frame.set_pixel(254, 254, RED);
        frame.set_pixel(0, 254, BLUE);

        let frames = vec![Frame::blank(255, 255), frame];
        let bytes = encode(&frames).unwrap().unwrap();

        assert_eq!(&bytes[..2], &[255, 255]);
        assert_eq!(decode(&bytes).unwrap(), frames);
    }

    #[test]
    fn fully_changed_largest_canvas_fits() {
        let frame = Frame::from_image(RgbImage::from_pixel(255, 255, RED));
        let (stats, bytes) = encode_with_stats(&[frame.clone()]).unwrap().unwrap();

        assert_eq!(stats.changes, vec![255 * 255]);
        assert_eq!(&bytes[2..4], &(255u16 * 255).to_be_bytes());
        assert_eq!(decode(&bytes).unwrap(), vec![frame]);
    }

    #[test]
    fn oversized_canvas_is_rejected() {
        assert_eq!(
            encode(&[Frame::blank(256, 10)]),
            Err(CodecError::DimensionOverflow {
                width: 256,
                height: 10
            })
        );

        assert_eq!(
            encode(&[Frame::blank(1, 300)]),
            Err(CodecError::DimensionOverflow {
                width: 1,
                height: 300
            })
        );
    }

    #[test]
    fn too_many_changes_are_rejected() {
        let changes = vec![
            Change {
                x: 0,
                y: 0,
                color: RED,
            };
            MAX_CHANGES + 1
        ];

        assert_eq!(
            Encoder::build_packet(4, &changes),
            Err(CodecError::ChangeCountOverflow {
                frame: 4,
                changes: MAX_CHANGES + 1
            })
        );

        assert!(Encoder::build_packet(4, &changes[1..]).is_ok());
    }

    #[test]
    fn mismatched_frames_are_rejected() {
        let frames = vec![Frame::blank(2, 2), Frame::blank(2, 3)];

        assert_eq!(
            encode(&frames),
            Err(CodecError::DimensionMismatch {
                frame: 1,
                expected: (2, 2),
                found: (2, 3)
            })
        );
    }

    #[test]
    fn failed_add_leaves_encoder_intact() {
        let mut encoder = Encoder::new(2, 2).unwrap();

        assert!(encoder.add(&Frame::blank(3, 3)).is_err());
        encoder.add(&Frame::blank(2, 2)).unwrap();

        assert_eq!(encoder.finish().1, vec![2, 2, 0, 0]);
    }

    #[test]
    fn missing_header() {
        assert_eq!(decode(&[]), Err(CodecError::MalformedHeader { len: 0 }));
        assert_eq!(decode(&[7]), Err(CodecError::MalformedHeader { len: 1 }));
    }

    #[test]
    fn header_without_frames() {
        assert_eq!(decode(&[2, 2]), Err(CodecError::NoFrames));
    }

    #[test]
    fn dangling_count_byte() {
        assert_eq!(
            decode(&[2, 2, 0, 0, 0]),
            Err(CodecError::TruncatedStream {
                frame: 1,
                offset: 4
            })
        );
    }

    #[test]
    fn count_exceeding_remaining_bytes() {
        assert_eq!(
            decode(&[2, 2, 0, 2, 0, 0, 255, 0, 0, 1]),
            Err(CodecError::TruncatedStream {
                frame: 0,
                offset: 4
            })
        );
    }

    #[test]
    fn high_count_byte_is_unsigned() {
        // 0x80 0x00 would be negative if read as a signed short
        let mut bytes = vec![1, 1, 0x80, 0x00];
        bytes.extend([0, 0, 1, 2, 3]);

        assert_eq!(
            decode(&bytes),
            Err(CodecError::TruncatedStream {
                frame: 0,
                offset: 4
            })
        );
    }

    #[test]
    fn coordinates_are_unsigned() {
        let bytes = vec![200, 200, 0, 1, 199, 150, 10, 20, 30];
        let frames = decode(&bytes).unwrap();

        assert_eq!(frames[0].pixel(199, 150), Rgb([10, 20, 30]));
        assert_eq!(encode(&frames).unwrap().unwrap(), bytes);
    }

    #[test]
    fn change_outside_canvas() {
        assert_eq!(
            decode(&[2, 2, 0, 0, 0, 1, 2, 0, 1, 1, 1]),
            Err(CodecError::OutOfBounds {
                frame: 1,
                offset: 6,
                x: 2,
                y: 0
            })
        );
    }
}
