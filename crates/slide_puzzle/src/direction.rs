use bevy::prelude::*;
use strum::{Display, EnumIter};

/// Grid offsets use `x` for columns and `y` for rows, with row 0 at the top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Right => Self::Left,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
        }
    }

    #[must_use]
    pub const fn offset(self) -> IVec2 {
        match self {
            Self::Up => IVec2::new(0, -1),
            Self::Right => IVec2::new(1, 0),
            Self::Down => IVec2::new(0, 1),
            Self::Left => IVec2::new(-1, 0),
        }
    }

    /// World-space unit vector for animating along this direction (y points up).
    #[must_use]
    pub const fn unit_vector(self) -> Vec3 {
        match self {
            Self::Up => Vec3::Y,
            Self::Right => Vec3::X,
            Self::Down => Vec3::NEG_Y,
            Self::Left => Vec3::NEG_X,
        }
    }

    /// Cardinal direction of an axis-aligned offset. `None` for zero or
    /// diagonal offsets.
    #[must_use]
    pub const fn from_offset(offset: IVec2) -> Option<Self> {
        match (offset.x.signum(), offset.y.signum()) {
            (0, -1) => Some(Self::Up),
            (1, 0) => Some(Self::Right),
            (0, 1) => Some(Self::Down),
            (-1, 0) => Some(Self::Left),
            _ => None,
        }
    }

    #[must_use]
    pub const fn axis(self) -> Axis {
        match self {
            Self::Up | Self::Down => Axis::Column,
            Self::Right | Self::Left => Axis::Row,
        }
    }
}

/// A line of cells through the hole: its row or its column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter)]
pub enum Axis {
    #[default]
    Row,
    Column,
}

impl Axis {
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Row => Self::Column,
            Self::Column => Self::Row,
        }
    }
}
