//! Cross-snake collision resolution.

use crate::position::GridPos;

/// Outcome of a finished match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    Tie,
    Snake1,
    Snake2,
}

impl GameResult {
    pub fn to_wire(self) -> u8 {
        match self {
            GameResult::Tie => 0,
            GameResult::Snake1 => 1,
            GameResult::Snake2 => 2,
        }
    }

    pub fn from_wire(byte: u8) -> Option<GameResult> {
        match byte {
            0 => Some(GameResult::Tie),
            1 => Some(GameResult::Snake1),
            2 => Some(GameResult::Snake2),
            _ => None,
        }
    }
}

/// Resolves collisions between the two post-move bodies. Precedence, first
/// match wins:
///
/// 1. Tie: heads share a cell, or the snakes swapped head positions in one
///    step (each head now equals the other body's second segment, i.e. the
///    opponent's pre-move head). The swap check catches the pass-through
///    case where adjacent snakes cross without their heads ever sharing a
///    cell on the same tick.
/// 2. Snake2 wins: snake1's head is inside snake2's body.
/// 3. Snake1 wins: snake2's head is inside snake1's body.
///
/// Self-collisions are not handled here; the caller consults each snake's
/// own check afterwards, snake1 first.
pub fn resolve(snake1: &[GridPos], snake2: &[GridPos]) -> Option<GameResult> {
    let (Some(&head1), Some(&head2)) = (snake1.first(), snake2.first()) else {
        return None;
    };

    let swapped = snake1.len() > 1
        && snake2.len() > 1
        && head1 == snake2[1]
        && head2 == snake1[1];
    if head1 == head2 || swapped {
        return Some(GameResult::Tie);
    }

    if snake2.contains(&head1) {
        return Some(GameResult::Snake2);
    }

    if snake1.contains(&head2) {
        return Some(GameResult::Snake1);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(head: (f32, f32), len: usize) -> Vec<GridPos> {
        (0..len)
            .map(|i| GridPos::new(head.0 - i as f32, head.1))
            .collect()
    }

    #[test]
    fn test_no_collision_when_apart() {
        let s1 = row((2.0, 2.0), 3);
        let s2 = row((8.0, 8.0), 3);
        assert_eq!(resolve(&s1, &s2), None);
    }

    #[test]
    fn test_shared_head_cell_is_tie() {
        let s1 = vec![
            GridPos::new(5.0, 5.0),
            GridPos::new(4.0, 5.0),
            GridPos::new(3.0, 5.0),
        ];
        let s2 = vec![
            GridPos::new(5.0, 5.0),
            GridPos::new(6.0, 5.0),
            GridPos::new(7.0, 5.0),
        ];
        assert_eq!(resolve(&s1, &s2), Some(GameResult::Tie));
    }

    #[test]
    fn test_head_swap_is_tie() {
        // Post-move bodies after two head-on snakes exchanged cells: each
        // head sits where the other's head was last tick.
        let s1 = vec![
            GridPos::new(6.0, 5.0),
            GridPos::new(5.0, 5.0),
            GridPos::new(4.0, 5.0),
        ];
        let s2 = vec![
            GridPos::new(5.0, 5.0),
            GridPos::new(6.0, 5.0),
            GridPos::new(7.0, 5.0),
        ];
        assert_eq!(resolve(&s1, &s2), Some(GameResult::Tie));
    }

    #[test]
    fn test_tie_precedes_body_hit() {
        // Both the swap condition and a head-into-body condition hold at
        // once; rule 1 must win.
        let a = GridPos::new(5.0, 5.0);
        let b = GridPos::new(6.0, 5.0);
        let s1 = vec![a, b];
        let s2 = vec![b, a, a];
        assert!(s2.contains(&a)); // snake1's head is also inside snake2
        assert_eq!(resolve(&s1, &s2), Some(GameResult::Tie));
    }

    #[test]
    fn test_head_into_opponent_body() {
        let mut s2 = row((8.0, 8.0), 4);
        let s1 = vec![
            s2[2], // snake1's head inside snake2's body
            GridPos::new(6.0, 9.0),
            GridPos::new(5.0, 9.0),
        ];
        assert_eq!(resolve(&s1, &s2), Some(GameResult::Snake2));

        // Symmetric case.
        s2 = vec![
            s1[1],
            GridPos::new(6.0, 10.0),
            GridPos::new(6.0, 11.0),
        ];
        assert_eq!(resolve(&s1, &s2), Some(GameResult::Snake1));
    }

    #[test]
    fn test_empty_bodies_never_collide() {
        assert_eq!(resolve(&[], &row((2.0, 2.0), 3)), None);
        assert_eq!(resolve(&row((2.0, 2.0), 3), &[]), None);
    }
}
