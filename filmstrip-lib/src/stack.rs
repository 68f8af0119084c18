use crate::*;

#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum StackError {
    #[error("cannot load an animation without frames")]
    Empty,

    #[error("frame {frame} is {found:?}, expected {expected:?}")]
    DimensionMismatch {
        frame: usize,
        expected: (u32, u32),
        found: (u32, u32),
    },

    #[error("({x}, {y}) lies outside of the {width}x{height} canvas")]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
}

/// Library entry the animation was last loaded from or saved to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveIdentity {
    pub id: SaveId,
    pub name: String,
}

/// The animation being edited: a non-empty run of equally-sized frames plus a
/// cursor pointing at the frame on the canvas.
#[derive(Clone, Debug)]
pub struct FrameStack {
    frames: Vec<Frame>,
    index: usize,
    identity: Option<SaveIdentity>,
}

impl FrameStack {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            frames: vec![Frame::blank(width, height)],
            index: 0,
            identity: None,
        }
    }

    /// Replaces the whole animation, e.g. after decoding a saved project.
    pub fn load(
        &mut self,
        frames: Vec<Frame>,
        identity: Option<SaveIdentity>,
    ) -> Result<(), StackError> {
        let expected = frames.first().ok_or(StackError::Empty)?.dimensions();

        if let Some((frame, found)) = frames
            .iter()
            .map(Frame::dimensions)
            .enumerate()
            .find(|(_, dims)| *dims != expected)
        {
            return Err(StackError::DimensionMismatch {
                frame,
                expected,
                found,
            });
        }

        self.frames = frames;
        self.index = 0;
        self.identity = identity;

        Ok(())
    }

    pub fn from_frames(frames: Vec<Frame>) -> Result<Self, StackError> {
        let mut this = Self::new(0, 0);
        this.load(frames, None)?;
        Ok(this)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn current(&self) -> &Frame {
        &self.frames[self.index]
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    /// 1-based position, as shown to the user.
    pub fn display_position(&self) -> usize {
        self.index + 1
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.frames[0].dimensions()
    }

    pub fn next(&mut self) -> bool {
        if self.index + 1 < self.frames.len() {
            self.index += 1;
            true
        } else {
            false
        }
    }

    pub fn prev(&mut self) -> bool {
        if self.index > 0 {
            self.index -= 1;
            true
        } else {
            false
        }
    }

    /// Duplicates the current frame right after itself and moves onto the copy.
    pub fn insert_frame(&mut self) {
        let copy = self.current().clone();

        self.index += 1;
        self.frames.insert(self.index, copy);
    }

    /// Removes the current frame; the last remaining frame gets blanked
    /// instead.
    pub fn delete_current(&mut self) {
        if self.frames.len() == 1 {
            let (width, height) = self.dimensions();
            self.frames[0] = Frame::blank(width, height);
        } else {
            self.frames.remove(self.index);
            self.index = self.index.saturating_sub(1).min(self.frames.len() - 1);
        }
    }

    /// Starts over with a single blank frame and forgets the save identity.
    pub fn clear(&mut self) {
        let (width, height) = self.dimensions();

        self.frames = vec![Frame::blank(width, height)];
        self.index = 0;
        self.identity = None;
    }

    pub fn paint(&mut self, x: u32, y: u32, color: Rgb<u8>) -> Result<(), StackError> {
        let current = self.current();

        if !current.contains(x, y) {
            let (width, height) = current.dimensions();
            return Err(StackError::OutOfBounds {
                x,
                y,
                width,
                height,
            });
        }

        let painted = current.with_pixel(x, y, color);
        self.frames[self.index] = painted;

        Ok(())
    }

    pub fn replace_current(&mut self, frame: Frame) -> Result<(), StackError> {
        let expected = self.dimensions();

        if frame.dimensions() != expected {
            return Err(StackError::DimensionMismatch {
                frame: self.index,
                expected,
                found: frame.dimensions(),
            });
        }

        self.frames[self.index] = frame;
        Ok(())
    }

    pub fn rotate(&mut self, rotation: Rotation) {
        self.frames = raster::rotate_all(&self.frames, rotation);
    }

    /// Deep copy of all frames, to be handed over to a background export.
    pub fn snapshot(&self) -> Vec<Frame> {
        self.frames.clone()
    }

    pub fn save_identity(&self) -> Option<&SaveIdentity> {
        self.identity.as_ref()
    }

    pub fn set_save_identity(&mut self, identity: Option<SaveIdentity>) {
        self.identity = identity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::{BLUE, GREEN, RED, WHITE};

    fn stack_of(colors: &[Rgb<u8>]) -> FrameStack {
        let frames = colors
            .iter()
            .map(|&c| Frame::blank(2, 2).with_pixel(0, 0, c))
            .collect();

        FrameStack::from_frames(frames).unwrap()
    }

    fn marker(stack: &FrameStack) -> Rgb<u8> {
        stack.current().pixel(0, 0)
    }

    #[test]
    fn starts_with_one_blank_frame() {
        let stack = FrameStack::new(4, 3);

        assert_eq!(stack.len(), 1);
        assert_eq!(stack.current_index(), 0);
        assert_eq!(stack.display_position(), 1);
        assert_eq!(stack.current(), &Frame::blank(4, 3));
    }

    #[test]
    fn navigation_is_clamped() {
        let mut stack = stack_of(&[RED, GREEN]);

        assert!(!stack.prev());
        assert!(stack.next());
        assert_eq!(marker(&stack), GREEN);
        assert!(!stack.next());
        assert_eq!(stack.current_index(), 1);
    }

    #[test]
    fn insert_duplicates_current_frame() {
        let mut stack = stack_of(&[RED, GREEN]);

        stack.insert_frame();

        assert_eq!(stack.len(), 3);
        assert_eq!(stack.current_index(), 1);
        assert_eq!(stack.frames()[1], stack.frames()[0]);
        assert_eq!(stack.frames()[2].pixel(0, 0), GREEN);
    }

    #[test]
    fn editing_a_copy_does_not_touch_its_source() {
        let mut stack = stack_of(&[RED]);

        stack.insert_frame();
        stack.paint(1, 1, BLUE).unwrap();

        assert_eq!(stack.frames()[0].pixel(1, 1), WHITE);
        assert_eq!(stack.frames()[1].pixel(1, 1), BLUE);
    }

    #[test]
    fn delete_moves_cursor_back() {
        let mut stack = stack_of(&[RED, GREEN, BLUE]);
        stack.next();
        stack.next();

        stack.delete_current();
        assert_eq!(stack.len(), 2);
        assert_eq!(marker(&stack), GREEN);

        stack.prev();
        stack.delete_current();
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.current_index(), 0);
        assert_eq!(marker(&stack), GREEN);
    }

    #[test]
    fn deleting_last_frame_blanks_it() {
        let mut stack = stack_of(&[RED]);

        stack.delete_current();

        assert_eq!(stack.len(), 1);
        assert_eq!(stack.current(), &Frame::blank(2, 2));
    }

    #[test]
    fn clear_resets_everything() {
        let mut stack = stack_of(&[RED, GREEN]);
        stack.set_save_identity(Some(SaveIdentity {
            id: SaveId(3),
            name: "walk".into(),
        }));
        stack.next();

        stack.clear();

        assert_eq!(stack.len(), 1);
        assert_eq!(stack.current_index(), 0);
        assert_eq!(stack.current(), &Frame::blank(2, 2));
        assert_eq!(stack.save_identity(), None);
    }

    #[test]
    fn load_validates_frames() {
        let mut stack = FrameStack::new(2, 2);

        assert_eq!(stack.load(vec![], None), Err(StackError::Empty));
        assert_eq!(
            stack.load(vec![Frame::blank(2, 2), Frame::blank(3, 2)], None),
            Err(StackError::DimensionMismatch {
                frame: 1,
                expected: (2, 2),
                found: (3, 2)
            })
        );
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn paint_rejects_outside_pixels() {
        let mut stack = FrameStack::new(2, 2);

        assert!(matches!(
            stack.paint(2, 0, RED),
            Err(StackError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn snapshot_is_detached() {
        let mut stack = stack_of(&[RED]);
        let snapshot = stack.snapshot();

        stack.paint(0, 0, BLUE).unwrap();

        assert_eq!(snapshot[0].pixel(0, 0), RED);
    }

    #[test]
    fn rotate_turns_every_frame() {
        let mut stack = FrameStack::from_frames(vec![Frame::blank(3, 1); 2]).unwrap();

        stack.rotate(Rotation::ToLandscape);

        assert_eq!(stack.dimensions(), (1, 3));
        assert!(stack.frames().iter().all(|f| f.dimensions() == (1, 3)));
    }
}
