#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Position {
        Position::new(self.x + dx, self.y + dy)
    }

    pub fn distance(&self, other: &Position) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    pub fn clamped(&self, bounds: &Bounds) -> Position {
        Position::new(
            self.x.clamp(bounds.min_x, bounds.max_x),
            self.y.clamp(bounds.min_y, bounds.max_y),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

impl Bounds {
    pub fn new(min_x: i32, max_x: i32, min_y: i32, max_y: i32) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// Bounds of a `width` x `height` grid anchored at the origin
    pub fn of_grid(width: usize, height: usize) -> Self {
        Self::new(0, width as i32 - 1, 0, height as i32 - 1)
    }

    pub fn contains(&self, pos: &Position) -> bool {
        pos.x >= self.min_x && pos.x <= self.max_x && pos.y >= self.min_y && pos.y <= self.max_y
    }
}

/// Which corner of the map the agent's base started in.
///
/// Everything the agent learns is expressed relative to a top-left start;
/// `Other` flips coordinates and quadrant order so both spawns share states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    TopLeft,
    Other,
}

impl Orientation {
    pub fn is_top_left(self) -> bool {
        self == Orientation::TopLeft
    }

    /// Move `distance` away from `origin`, towards the map center
    pub fn transform_distance(self, origin: Position, dx: i32, dy: i32) -> Position {
        match self {
            Orientation::TopLeft => origin.offset(dx, dy),
            Orientation::Other => origin.offset(-dx, -dy),
        }
    }

    /// Mirror a location across both axes of a `size` x `size` map
    pub fn transform_location(self, location: Position, size: i32) -> Position {
        match self {
            Orientation::TopLeft => location,
            Orientation::Other => Position::new(size - location.x, size - location.y),
        }
    }
}
