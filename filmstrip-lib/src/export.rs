//! Animated GIF export.
//!
//! The LZW bitstream itself is produced by the `gif` crate; this module takes
//! care of scaling, palette quantisation, timing and looping, and of making
//! sure that a failed export never leaves a half-written GIF behind.

use crate::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::{
    io::{self, Write},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    thread,
};

pub const DEFAULT_FPS: u32 = 12;

/// NeuQuant sampling factor (1 = best, 30 = fastest); only matters for frames
/// with more than 256 distinct colours.
const QUANTIZER_SPEED: i32 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("couldn't write GIF")]
    Io(#[from] io::Error),

    #[error("couldn't encode GIF")]
    Encoding(#[from] ::gif::EncodingError),

    #[error("couldn't scale frames")]
    Raster(#[from] RasterError),

    #[error("animation has no frames")]
    Empty,

    #[error("frame {frame} is {found:?}, expected {expected:?}")]
    DimensionMismatch {
        frame: usize,
        expected: (u32, u32),
        found: (u32, u32),
    },

    #[error("GIF frames can be at most 65535x65535, got {width}x{height}")]
    DimensionOverflow { width: u32, height: u32 },

    #[error("export was cancelled")]
    Cancelled,

    #[error("export thread panicked")]
    Panicked,
}

/// Frame delay, in GIF's native unit of 1/100 s.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Delay(u16);

impl Delay {
    pub fn from_centis(centis: u16) -> Self {
        Self(centis)
    }

    /// Rounds to the nearest centisecond.
    pub fn from_millis(millis: u32) -> Self {
        let centis = (millis.saturating_add(5) / 10).min(u16::MAX as u32);
        Self(centis as u16)
    }

    pub fn from_fps(fps: u32) -> Self {
        Self::from_millis(1000 / fps.max(1))
    }

    pub fn centis(self) -> u16 {
        self.0
    }
}

impl Default for Delay {
    fn default() -> Self {
        Self::from_fps(DEFAULT_FPS)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Playback {
    #[default]
    Loop,
    Once,
}

impl Playback {
    fn repeat(self) -> ::gif::Repeat {
        match self {
            Playback::Loop => ::gif::Repeat::Infinite,
            Playback::Once => ::gif::Repeat::Finite(1),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportParams {
    /// Output pixels per source pixel, horizontally.
    pub scale_x: u32,
    /// Output pixels per source pixel, vertically.
    pub scale_y: u32,
    pub delay: Delay,
    pub playback: Playback,
}

impl Default for ExportParams {
    fn default() -> Self {
        Self {
            scale_x: 1,
            scale_y: 1,
            delay: Delay::default(),
            playback: Playback::Loop,
        }
    }
}

/// Receives a notification after each frame has been prepared.
///
/// Frames are prepared in parallel, so `done` is a running count rather than
/// a frame index.
pub trait Progress: Sync {
    fn frame_done(&self, done: usize, total: usize);
}

impl Progress for () {
    fn frame_done(&self, _: usize, _: usize) {}
}

#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Renders `frames` into a complete GIF held in memory.
pub fn render(
    frames: &[Frame],
    params: &ExportParams,
    progress: &dyn Progress,
    cancel: &CancelToken,
) -> Result<Vec<u8>, ExportError> {
    let expected = frames.first().ok_or(ExportError::Empty)?.dimensions();

    for (frame, found) in frames.iter().map(Frame::dimensions).enumerate() {
        if found != expected {
            return Err(ExportError::DimensionMismatch {
                frame,
                expected,
                found,
            });
        }
    }

    // checked before scaling, so oversized exports fail without allocating
    let width = expected.0.saturating_mul(params.scale_x);
    let height = expected.1.saturating_mul(params.scale_y);

    let (Ok(gif_width), Ok(gif_height)) = (u16::try_from(width), u16::try_from(height)) else {
        return Err(ExportError::DimensionOverflow { width, height });
    };

    let frames = raster::scale_all(frames, params.scale_x, params.scale_y)?;

    log::info!(
        "exporting {} frame(s) at {}x{}, {} cs per frame",
        frames.len(),
        width,
        height,
        params.delay.centis()
    );

    let total = frames.len();
    let done = AtomicUsize::new(0);

    let gif_frames = frames
        .par_iter()
        .map(|frame| {
            if cancel.is_cancelled() {
                return Err(ExportError::Cancelled);
            }

            let mut gif_frame = ::gif::Frame::from_rgb_speed(
                gif_width,
                gif_height,
                frame.as_rgb_bytes(),
                QUANTIZER_SPEED,
            );

            gif_frame.delay = params.delay.centis();
            progress.frame_done(done.fetch_add(1, Ordering::SeqCst) + 1, total);

            Ok(gif_frame)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut buffer = Vec::new();
    let mut encoder = ::gif::Encoder::new(&mut buffer, gif_width, gif_height, &[])?;

    encoder.set_repeat(params.playback.repeat())?;

    for (idx, gif_frame) in gif_frames.iter().enumerate() {
        if cancel.is_cancelled() {
            return Err(ExportError::Cancelled);
        }

        log::debug!("writing frame {}", idx);
        encoder.write_frame(gif_frame)?;
    }

    encoder.into_inner()?;

    Ok(buffer)
}

/// Renders `frames` and writes the finished GIF to `sink` in one go.
///
/// Returns the number of bytes written.
pub fn export(
    frames: &[Frame],
    params: &ExportParams,
    sink: &mut impl Write,
    progress: &dyn Progress,
) -> Result<usize, ExportError> {
    export_cancellable(frames, params, sink, progress, &CancelToken::default())
}

pub fn export_cancellable(
    frames: &[Frame],
    params: &ExportParams,
    sink: &mut impl Write,
    progress: &dyn Progress,
    cancel: &CancelToken,
) -> Result<usize, ExportError> {
    let gif = render(frames, params, progress, cancel)?;

    if cancel.is_cancelled() {
        return Err(ExportError::Cancelled);
    }

    sink.write_all(&gif)?;
    sink.flush()?;

    log::info!("wrote {} byte(s) of GIF", gif.len());

    Ok(gif.len())
}

/// Export running on a background thread.
///
/// The job owns its frames, so the animation it was taken from can keep being
/// edited while the export runs.
pub struct ExportJob<W> {
    handle: thread::JoinHandle<Result<W, ExportError>>,
    cancel: CancelToken,
}

impl<W> ExportJob<W>
where
    W: Write + Send + 'static,
{
    pub fn spawn<P>(frames: Vec<Frame>, params: ExportParams, mut sink: W, progress: P) -> Self
    where
        P: Progress + Send + 'static,
    {
        let cancel = CancelToken::default();

        let handle = thread::spawn({
            let cancel = cancel.clone();

            move || {
                export_cancellable(&frames, &params, &mut sink, &progress, &cancel)?;
                Ok(sink)
            }
        });

        Self { handle, cancel }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the export and hands the sink back.
    pub fn join(self) -> Result<W, ExportError> {
        self.handle.join().map_err(|_| ExportError::Panicked)?
    }
}
