//! Grid coordinates and movement directions.

/// A single grid cell. Components are integer-valued but kept in floats
/// for arithmetic convenience; [`GridPos::wrap`] renormalizes them into
/// `[0, grid)` per axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GridPos {
    pub x: f32,
    pub z: f32,
}

impl GridPos {
    pub fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }

    /// Toroidal wrap: stepping off one edge re-enters from the opposite one.
    pub fn wrap(&mut self, grid: GridPos) {
        if self.x < 0.0 {
            self.x = grid.x - 1.0;
        } else if self.x >= grid.x {
            self.x = 0.0;
        }

        if self.z < 0.0 {
            self.z = grid.z - 1.0;
        } else if self.z >= grid.z {
            self.z = 0.0;
        }
    }
}

/// Heading of a snake. Forward points toward negative Z.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
}

impl Direction {
    /// Unit cell offset `(dx, dz)` for one tick of movement.
    pub fn offset(self) -> (f32, f32) {
        match self {
            Direction::Forward => (0.0, -1.0),
            Direction::Backward => (0.0, 1.0),
            Direction::Left => (-1.0, 0.0),
            Direction::Right => (1.0, 0.0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn is_opposite(self, other: Direction) -> bool {
        self.opposite() == other
    }

    pub fn to_wire(self) -> u8 {
        match self {
            Direction::Forward => 0,
            Direction::Backward => 1,
            Direction::Left => 2,
            Direction::Right => 3,
        }
    }

    pub fn from_wire(byte: u8) -> Option<Direction> {
        match byte {
            0 => Some(Direction::Forward),
            1 => Some(Direction::Backward),
            2 => Some(Direction::Left),
            3 => Some(Direction::Right),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_negative_x() {
        let grid = GridPos::new(10.0, 10.0);
        let mut pos = GridPos::new(-1.0, 5.0);
        pos.wrap(grid);
        assert_eq!(pos, GridPos::new(9.0, 5.0));
    }

    #[test]
    fn test_wrap_past_far_edge() {
        let grid = GridPos::new(10.0, 8.0);
        let mut pos = GridPos::new(10.0, 8.0);
        pos.wrap(grid);
        assert_eq!(pos, GridPos::new(0.0, 0.0));
    }

    #[test]
    fn test_wrap_interior_untouched() {
        let grid = GridPos::new(10.0, 10.0);
        let mut pos = GridPos::new(3.0, 7.0);
        pos.wrap(grid);
        assert_eq!(pos, GridPos::new(3.0, 7.0));
    }

    #[test]
    fn test_opposites() {
        assert!(Direction::Forward.is_opposite(Direction::Backward));
        assert!(Direction::Backward.is_opposite(Direction::Forward));
        assert!(Direction::Left.is_opposite(Direction::Right));
        assert!(Direction::Right.is_opposite(Direction::Left));
        assert!(!Direction::Forward.is_opposite(Direction::Left));
        assert!(!Direction::Right.is_opposite(Direction::Forward));
    }

    #[test]
    fn test_direction_wire_roundtrip() {
        for dir in [
            Direction::Forward,
            Direction::Backward,
            Direction::Left,
            Direction::Right,
        ] {
            assert_eq!(Direction::from_wire(dir.to_wire()), Some(dir));
        }
        assert_eq!(Direction::from_wire(4), None);
    }
}
