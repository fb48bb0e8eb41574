//! Snake entity: an ordered body of grid cells, head first.

use crate::position::{Direction, GridPos};
use crate::MAX_SNAKE_SIZE;

#[derive(Debug, Clone)]
pub struct Snake {
    body: Vec<GridPos>,
    current_direction: Direction,
    last_direction: Direction,
    alive: bool,
}

impl Snake {
    /// A snake starts empty and is seeded with segments at game start.
    pub fn new() -> Self {
        Self {
            body: Vec::with_capacity(MAX_SNAKE_SIZE),
            current_direction: Direction::Forward,
            last_direction: Direction::Forward,
            alive: true,
        }
    }

    pub fn reset(&mut self) {
        self.body.clear();
        self.current_direction = Direction::Forward;
        self.last_direction = Direction::Forward;
        self.alive = true;
    }

    /// Moves one cell along the current direction, wrapping at the grid
    /// edges. The body shifts one slot toward the tail and the new head
    /// lands in slot 0. Self-collision is evaluated post-move against the
    /// remaining segments; a hit kills the snake.
    pub fn advance(&mut self, grid: GridPos) {
        if !self.alive {
            return;
        }
        let Some(&head) = self.body.first() else {
            return;
        };

        let (dx, dz) = self.current_direction.offset();
        let mut new_head = GridPos::new(head.x + dx, head.z + dz);
        new_head.wrap(grid);
        self.last_direction = self.current_direction;

        for i in (1..self.body.len()).rev() {
            self.body[i] = self.body[i - 1];
        }
        self.body[0] = new_head;

        if self.check_collision() {
            self.alive = false;
        }
    }

    /// Rejects an exact 180° reversal of the direction applied on the
    /// previous tick; anything else overwrites the pending direction.
    pub fn set_direction(&mut self, dir: Direction) -> bool {
        if dir.is_opposite(self.last_direction) {
            return false;
        }
        self.current_direction = dir;
        true
    }

    /// Appends a segment while under capacity; extra calls are silently
    /// ignored.
    pub fn add_body_part(&mut self, pos: GridPos) {
        if self.body.len() >= MAX_SNAKE_SIZE {
            return;
        }
        self.body.push(pos);
    }

    /// Grows by cloning the current tail. This is how apple consumption
    /// lengthens the snake.
    pub fn grow(&mut self) {
        if let Some(&tail) = self.body.last() {
            self.add_body_part(tail);
        }
    }

    /// True when the head occupies any other body segment.
    pub fn check_collision(&self) -> bool {
        let Some(&head) = self.body.first() else {
            return false;
        };
        self.body.iter().skip(1).any(|&part| part == head)
    }

    pub fn has_eaten(&self, apple: GridPos) -> bool {
        self.body.first() == Some(&apple)
    }

    /// Replaces the whole body with a replicated snapshot.
    pub fn apply_snapshot(&mut self, parts: &[GridPos]) {
        self.body.clear();
        self.body
            .extend(parts.iter().take(MAX_SNAKE_SIZE).copied());
    }

    pub fn head(&self) -> Option<GridPos> {
        self.body.first().copied()
    }

    pub fn body(&self) -> &[GridPos] {
        &self.body
    }

    pub fn current_direction(&self) -> Direction {
        self.current_direction
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }
}

impl Default for Snake {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(head: GridPos) -> Snake {
        let mut snake = Snake::new();
        snake.add_body_part(head);
        snake.add_body_part(GridPos::new(head.x - 1.0, head.z));
        snake.add_body_part(GridPos::new(head.x - 2.0, head.z));
        snake
    }

    #[test]
    fn test_advance_moves_head_and_shifts_body() {
        let grid = GridPos::new(10.0, 10.0);
        let mut snake = seeded(GridPos::new(5.0, 5.0));
        snake.advance(grid);

        assert_eq!(
            snake.body(),
            &[
                GridPos::new(5.0, 4.0),
                GridPos::new(5.0, 5.0),
                GridPos::new(4.0, 5.0),
            ]
        );
        assert!(snake.is_alive());
    }

    #[test]
    fn test_advance_wraps_on_every_axis() {
        let directions = [
            Direction::Forward,
            Direction::Backward,
            Direction::Left,
            Direction::Right,
        ];
        for grid_size in [4.0, 7.0, 40.0] {
            let grid = GridPos::new(grid_size, grid_size);
            for dir in directions {
                // Boundary cells in each corner plus one interior cell.
                for start in [
                    GridPos::new(0.0, 0.0),
                    GridPos::new(grid_size - 1.0, 0.0),
                    GridPos::new(0.0, grid_size - 1.0),
                    GridPos::new(grid_size - 1.0, grid_size - 1.0),
                    GridPos::new(2.0, 2.0),
                ] {
                    let mut snake = Snake::new();
                    snake.add_body_part(start);
                    // last_direction must not oppose the tested direction
                    snake.last_direction = dir;
                    assert!(snake.set_direction(dir));
                    snake.advance(grid);
                    let head = snake.head().unwrap();
                    assert!(
                        (0.0..grid_size).contains(&head.x),
                        "x out of range: {head:?} after {dir:?}"
                    );
                    assert!(
                        (0.0..grid_size).contains(&head.z),
                        "z out of range: {head:?} after {dir:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_set_direction_rejects_exact_reversals_only() {
        let pairs = [
            (Direction::Forward, Direction::Backward),
            (Direction::Backward, Direction::Forward),
            (Direction::Left, Direction::Right),
            (Direction::Right, Direction::Left),
        ];
        let all = [
            Direction::Forward,
            Direction::Backward,
            Direction::Left,
            Direction::Right,
        ];
        for last in all {
            for next in all {
                let mut snake = Snake::new();
                snake.last_direction = last;
                let accepted = snake.set_direction(next);
                let reversal = pairs.contains(&(last, next));
                assert_eq!(accepted, !reversal, "last {last:?} next {next:?}");
                if accepted {
                    assert_eq!(snake.current_direction(), next);
                }
            }
        }
    }

    #[test]
    fn test_direction_change_applies_next_tick_only() {
        let grid = GridPos::new(10.0, 10.0);
        let mut snake = seeded(GridPos::new(5.0, 5.0));
        snake.advance(grid); // last_direction becomes Forward
        assert!(!snake.set_direction(Direction::Backward));
        assert!(snake.set_direction(Direction::Left));
        snake.advance(grid);
        assert_eq!(snake.head(), Some(GridPos::new(4.0, 4.0)));
    }

    #[test]
    fn test_self_collision_kills_post_move() {
        let grid = GridPos::new(10.0, 10.0);
        let mut snake = Snake::new();
        // Hook shape: advancing left runs the head into the old tail slot,
        // which still holds (4, 5) after the shift because of the extra
        // trailing segment.
        for pos in [
            GridPos::new(5.0, 5.0),
            GridPos::new(5.0, 4.0),
            GridPos::new(4.0, 4.0),
            GridPos::new(4.0, 5.0),
            GridPos::new(3.0, 5.0),
        ] {
            snake.add_body_part(pos);
        }
        assert!(snake.set_direction(Direction::Left));
        snake.advance(grid);
        assert!(!snake.is_alive());
        assert!(snake.check_collision());
    }

    #[test]
    fn test_tail_cell_is_safe_to_enter() {
        let grid = GridPos::new(10.0, 10.0);
        let mut snake = Snake::new();
        // Square of four: the tail vacates the cell the head enters.
        for pos in [
            GridPos::new(5.0, 5.0),
            GridPos::new(5.0, 4.0),
            GridPos::new(4.0, 4.0),
            GridPos::new(4.0, 5.0),
        ] {
            snake.add_body_part(pos);
        }
        assert!(snake.set_direction(Direction::Left));
        snake.advance(grid);
        assert!(snake.is_alive());
    }

    #[test]
    fn test_grow_clones_tail_and_respects_capacity() {
        let mut snake = seeded(GridPos::new(5.0, 5.0));
        snake.grow();
        assert_eq!(snake.body().len(), 4);
        assert_eq!(snake.body()[3], snake.body()[2]);

        while snake.body().len() < MAX_SNAKE_SIZE {
            snake.grow();
        }
        snake.grow();
        assert_eq!(snake.body().len(), MAX_SNAKE_SIZE);
    }

    #[test]
    fn test_dead_snake_does_not_move() {
        let grid = GridPos::new(10.0, 10.0);
        let mut snake = seeded(GridPos::new(5.0, 5.0));
        snake.alive = false;
        snake.advance(grid);
        assert_eq!(snake.head(), Some(GridPos::new(5.0, 5.0)));
    }

    #[test]
    fn test_reset_clears_body_and_revives() {
        let mut snake = seeded(GridPos::new(5.0, 5.0));
        snake.alive = false;
        snake.reset();
        assert!(snake.body().is_empty());
        assert!(snake.is_alive());
        assert_eq!(snake.current_direction(), Direction::Forward);
    }
}
