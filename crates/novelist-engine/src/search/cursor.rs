/// A point inside the document: scene, block within the scene, and byte
/// offset within the block's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub scene: usize,
    pub block: usize,
    pub offset: usize,
}

impl Position {
    pub fn new(scene: usize, block: usize, offset: usize) -> Self {
        Self {
            scene,
            block,
            offset,
        }
    }

    pub fn origin() -> Self {
        Self::default()
    }

    pub fn is_origin(&self) -> bool {
        *self == Self::origin()
    }
}

/// Resumable search position.
///
/// `ExhaustedForward` corresponds to a scene index equal to the scene count,
/// `ExhaustedBackward` to a scene index of -1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    Active(Position),
    ExhaustedForward,
    ExhaustedBackward,
}

impl Default for Cursor {
    fn default() -> Self {
        Cursor::Active(Position::origin())
    }
}

impl Cursor {
    pub fn at(scene: usize, block: usize, offset: usize) -> Self {
        Cursor::Active(Position::new(scene, block, offset))
    }

    pub fn position(&self) -> Option<Position> {
        match self {
            Cursor::Active(position) => Some(*position),
            _ => None,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        !matches!(self, Cursor::Active(_))
    }

    /// Scene coordinate in the flat numbering: -1 before the first scene,
    /// `scene_count` past the last one.
    pub fn scene_index(&self, scene_count: usize) -> isize {
        match self {
            Cursor::Active(position) => position.scene as isize,
            Cursor::ExhaustedForward => scene_count as isize,
            Cursor::ExhaustedBackward => -1,
        }
    }
}
