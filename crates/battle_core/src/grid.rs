//! Battle grid and geometry: movement reachability, attack range, AoE.
//!
//! Movement search is obstacle- and occupancy-aware (tactical positioning
//! matters); ranged effects are range-only and ignore terrain, consistent
//! with tactics-RPG conventions. All search results are returned in sorted
//! order for deterministic iteration.

use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};

/// Board side length in tiles. The grid is always square.
pub const GRID_SIZE: i32 = 10;

/// Fixed damage dealt when a combatant enters a hazard tile.
pub const HAZARD_DAMAGE: u32 = 5;

/// A cell `(col, row)` on the battle board.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct GridPosition {
    /// Column, in `[0, GRID_SIZE)`.
    pub col: i32,
    /// Row, in `[0, GRID_SIZE)`.
    pub row: i32,
}

impl GridPosition {
    /// Create a new grid position.
    #[must_use]
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    /// Check whether the position lies on the board.
    #[must_use]
    pub const fn in_bounds(self) -> bool {
        self.col >= 0 && self.col < GRID_SIZE && self.row >= 0 && self.row < GRID_SIZE
    }

    /// Manhattan distance to another position.
    #[must_use]
    pub const fn manhattan(self, other: Self) -> u32 {
        self.col.abs_diff(other.col) + self.row.abs_diff(other.row)
    }
}

/// Terrain kind of a single tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TileType {
    /// Plain walkable terrain.
    #[default]
    Normal,
    /// Impassable terrain, never traversable.
    Blocked,
    /// Walkable terrain granting cover (presentation concern; traversable).
    Cover,
    /// Walkable terrain that damages a combatant on entry.
    Hazard,
}

impl TileType {
    /// Returns true if a combatant may stand on this tile.
    #[must_use]
    pub const fn is_traversable(self) -> bool {
        !matches!(self, Self::Blocked)
    }
}

/// The battle board: a fixed-size square grid of tiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainGrid {
    /// Tile data stored in row-major order.
    tiles: Vec<TileType>,
}

impl TerrainGrid {
    /// Create a grid with every tile normal.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tiles: vec![TileType::Normal; (GRID_SIZE * GRID_SIZE) as usize],
        }
    }

    #[inline]
    fn index(pos: GridPosition) -> usize {
        (pos.row * GRID_SIZE + pos.col) as usize
    }

    /// Get the tile at a position. Returns `None` if out of bounds.
    #[must_use]
    pub fn tile(&self, pos: GridPosition) -> Option<TileType> {
        if pos.in_bounds() {
            Some(self.tiles[Self::index(pos)])
        } else {
            None
        }
    }

    /// Set the tile at a position. Returns `false` if out of bounds.
    pub fn set_tile(&mut self, pos: GridPosition, tile: TileType) -> bool {
        if pos.in_bounds() {
            self.tiles[Self::index(pos)] = tile;
            true
        } else {
            false
        }
    }

    /// Check whether a combatant may stand on the tile.
    #[must_use]
    pub fn is_traversable(&self, pos: GridPosition) -> bool {
        self.tile(pos).is_some_and(TileType::is_traversable)
    }
}

impl Default for TerrainGrid {
    fn default() -> Self {
        Self::new()
    }
}

/// Direction offsets for 8-directional movement.
const DIRECTIONS: [(i32, i32); 8] = [
    (1, 0),   // East
    (1, 1),   // Southeast
    (0, 1),   // South
    (-1, 1),  // Southwest
    (-1, 0),  // West
    (-1, -1), // Northwest
    (0, -1),  // North
    (1, -1),  // Northeast
];

/// Breadth-first movement reachability from `from`, up to `max_steps`.
///
/// Each 8-way neighbor costs one step. Blocked tiles never enter the
/// frontier; tiles in `occupied` (living combatants other than the mover)
/// are excluded. The starting tile itself is not part of the result.
#[must_use]
pub fn movement_range(
    grid: &TerrainGrid,
    occupied: &[GridPosition],
    from: GridPosition,
    max_steps: u32,
) -> Vec<GridPosition> {
    let occupied: HashSet<GridPosition> = occupied.iter().copied().filter(|p| *p != from).collect();

    let mut visited: HashSet<GridPosition> = HashSet::new();
    let mut reachable: Vec<GridPosition> = Vec::new();
    let mut frontier: VecDeque<(GridPosition, u32)> = VecDeque::new();

    visited.insert(from);
    frontier.push_back((from, 0));

    while let Some((pos, steps)) = frontier.pop_front() {
        if steps >= max_steps {
            continue;
        }
        for &(dc, dr) in &DIRECTIONS {
            let next = GridPosition::new(pos.col + dc, pos.row + dr);
            if !next.in_bounds()
                || visited.contains(&next)
                || !grid.is_traversable(next)
                || occupied.contains(&next)
            {
                continue;
            }
            visited.insert(next);
            reachable.push(next);
            frontier.push_back((next, steps + 1));
        }
    }

    reachable.sort_unstable();
    reachable
}

/// All tiles with `1 <= manhattan(from, tile) <= range`, ignoring obstacles.
///
/// Ranged attacks and skills are not blocked by terrain or combatants;
/// melee is enforced by the action's own range argument (typically 1).
#[must_use]
pub fn attack_range(from: GridPosition, range: u32) -> Vec<GridPosition> {
    let mut tiles = Vec::new();
    let r = range as i32;
    for dc in -r..=r {
        for dr in -r..=r {
            let tile = GridPosition::new(from.col + dc, from.row + dr);
            let dist = from.manhattan(tile);
            if tile.in_bounds() && dist >= 1 && dist <= range {
                tiles.push(tile);
            }
        }
    }
    tiles.sort_unstable();
    tiles
}

/// All tiles with `manhattan(center, tile) <= radius`.
///
/// A radius of 0 yields just the center tile.
#[must_use]
pub fn aoe_area(center: GridPosition, radius: u32) -> Vec<GridPosition> {
    let mut tiles = Vec::new();
    let r = radius as i32;
    for dc in -r..=r {
        for dr in -r..=r {
            let tile = GridPosition::new(center.col + dc, center.row + dr);
            if tile.in_bounds() && center.manhattan(tile) <= radius {
                tiles.push(tile);
            }
        }
    }
    tiles.sort_unstable();
    tiles
}
