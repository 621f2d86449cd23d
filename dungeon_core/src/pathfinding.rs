use std::collections::{HashSet, VecDeque};

use crate::{Position, command::Direction, perception::Perception};

/// A position discovered during the search, linked to the node it was reached from.
#[derive(Debug, Clone, Copy)]
struct Node {
    position: Position,
    parent: Option<usize>,
}

/// Breadth-first search across a perception window.
///
/// Any non-wall cell inside the window is walkable. Neighbours are expanded
/// north, east, south, west. Returns the path from the cell after `start` up
/// to and including `goal`; `start == goal` gives an empty path and an
/// unreachable goal gives `None`.
pub fn find_path(window: &Perception, start: Position, goal: Position) -> Option<Vec<Position>> {
    if !window.is_traversable(goal) {
        return None;
    }

    // Nodes are never removed, so parent indices stay valid for reconstruction.
    let mut arena = vec![Node {
        position: start,
        parent: None,
    }];
    let mut visited = HashSet::from([start]);
    let mut frontier = VecDeque::from([0usize]);

    while let Some(current) = frontier.pop_front() {
        let node = arena[current];
        if node.position == goal {
            return Some(reconstruct(&arena, current));
        }

        for direction in Direction::SEARCH_ORDER {
            let Some(next) = node.position.step(direction) else {
                continue;
            };
            if !window.is_traversable(next) || !visited.insert(next) {
                continue;
            }
            arena.push(Node {
                position: next,
                parent: Some(current),
            });
            frontier.push_back(arena.len() - 1);
        }
    }

    None
}

fn reconstruct(arena: &[Node], goal: usize) -> Vec<Position> {
    let mut path = Vec::new();
    let mut current = goal;
    while let Some(parent) = arena[current].parent {
        path.push(arena[current].position);
        current = parent;
    }
    path.reverse();
    path
}

/// Converts a move between two adjacent positions into a direction.
///
/// A row change is checked before a column change.
pub fn direction_between(from: Position, to: Position) -> Option<Direction> {
    if to.row > from.row {
        Some(Direction::South)
    } else if to.row < from.row {
        Some(Direction::North)
    } else if to.col > from.col {
        Some(Direction::East)
    } else if to.col < from.col {
        Some(Direction::West)
    } else {
        None
    }
}

/// Translates a path that begins next to `start` into single-step moves.
pub fn path_to_moves(start: Position, path: &[Position]) -> Vec<Direction> {
    let mut moves = Vec::with_capacity(path.len());
    let mut current = start;
    for &next in path {
        if let Some(direction) = direction_between(current, next) {
            moves.push(direction);
        }
        current = next;
    }
    moves
}
