use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default board dimension (4x4).
pub const DEFAULT_SIZE: usize = 4;

/// A direction to move/merge tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    pub const ALL: [Move; 4] = [Move::Up, Move::Down, Move::Left, Move::Right];
}

/// Stable identity of a tile on the board.
///
/// A tile that slides keeps its id; a merge keeps the resident tile's id and
/// discards the incoming one. Ids are allocated per `Game`, never globally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileId(u64);

/// A numbered tile: stable id plus a power-of-two value (2, 4, 8, ...).
///
/// The value changes only by doubling when two equal tiles merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    id: TileId,
    value: u32,
}

impl Tile {
    #[inline]
    pub fn id(&self) -> TileId {
        self.id
    }

    #[inline]
    pub fn value(&self) -> u32 {
        self.value
    }
}

/// One grid cell. `Resolving` only exists while a move is being applied: a
/// second equal-valued tile has slid in and waits for the merge commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellState {
    Empty,
    Occupied(Tile),
    Resolving { resident: Tile, incoming: Tile },
}

impl CellState {
    #[inline]
    fn is_empty(&self) -> bool {
        matches!(self, CellState::Empty)
    }

    /// The settled tile in this cell, if any.
    #[inline]
    fn resident(&self) -> Option<Tile> {
        match *self {
            CellState::Empty => None,
            CellState::Occupied(tile) => Some(tile),
            CellState::Resolving { resident, .. } => Some(resident),
        }
    }

    /// True if `tile` may slide here: the cell is empty, or holds an
    /// equal-valued resident with no merge already queued.
    #[inline]
    fn can_accept(&self, tile: Tile) -> bool {
        match *self {
            CellState::Empty => true,
            CellState::Occupied(resident) => resident.value == tile.value,
            CellState::Resolving { .. } => false,
        }
    }
}

/// Head-first traversal lines, one set per direction.
///
/// Each set holds N lines of N cell indices; index 0 of a line is the cell
/// tiles slide toward. Built once at grid construction, never mutated.
#[derive(Debug, Clone)]
struct Traversals {
    up: Vec<Vec<usize>>,
    down: Vec<Vec<usize>>,
    left: Vec<Vec<usize>>,
    right: Vec<Vec<usize>>,
}

impl Traversals {
    fn new(size: usize) -> Self {
        let mut up = Vec::with_capacity(size);
        for x in 0..size {
            up.push((0..size).map(|y| y * size + x).collect::<Vec<_>>());
        }
        let mut left = Vec::with_capacity(size);
        for y in 0..size {
            left.push((0..size).map(|x| y * size + x).collect::<Vec<_>>());
        }
        let down = reverse_lines(&up);
        let right = reverse_lines(&left);
        Traversals { up, down, left, right }
    }
}

fn reverse_lines(lines: &[Vec<usize>]) -> Vec<Vec<usize>> {
    lines
        .iter()
        .map(|line| line.iter().rev().copied().collect())
        .collect()
}

/// N x N collection of cells, stored flat in row-major order, plus the four
/// precomputed traversal groups.
#[derive(Debug, Clone)]
struct Grid {
    size: usize,
    cells: Vec<CellState>,
    traversals: Traversals,
}

impl Grid {
    fn new(size: usize) -> Self {
        Grid {
            size,
            cells: vec![CellState::Empty; size * size],
            traversals: Traversals::new(size),
        }
    }

    #[inline]
    fn coords(&self, idx: usize) -> (usize, usize) {
        (idx % self.size, idx / self.size)
    }

    fn lines(&self, dir: Move) -> &[Vec<usize>] {
        match dir {
            Move::Up => &self.traversals.up,
            Move::Down => &self.traversals.down,
            Move::Left => &self.traversals.left,
            Move::Right => &self.traversals.right,
        }
    }

    fn clear(&mut self) {
        for cell in &mut self.cells {
            *cell = CellState::Empty;
        }
    }

    fn empty_cells(&self) -> Vec<usize> {
        (0..self.cells.len())
            .filter(|&idx| self.cells[idx].is_empty())
            .collect()
    }

    /// Slide every tile as far toward its line head as acceptance allows,
    /// queueing merges via `Resolving`. Returns true if any tile moved.
    ///
    /// Lines are walked head-to-tail so a tile relocated earlier in the pass
    /// is visible to the backward scans of the tiles behind it.
    fn slide(&mut self, dir: Move) -> bool {
        let lines = match dir {
            Move::Up => &self.traversals.up,
            Move::Down => &self.traversals.down,
            Move::Left => &self.traversals.left,
            Move::Right => &self.traversals.right,
        };
        let mut moved = false;
        for line in lines {
            for i in 1..line.len() {
                let src = line[i];
                let tile = match self.cells[src] {
                    CellState::Occupied(tile) => tile,
                    _ => continue,
                };
                // Backward scan: the farthest cell that still accepts the
                // tile is the target; stop at the first one that doesn't.
                let mut target = None;
                for &candidate in line[..i].iter().rev() {
                    if self.cells[candidate].can_accept(tile) {
                        target = Some(candidate);
                    } else {
                        break;
                    }
                }
                let dst = match target {
                    Some(dst) => dst,
                    None => continue,
                };
                self.cells[src] = CellState::Empty;
                self.cells[dst] = match self.cells[dst] {
                    CellState::Empty => CellState::Occupied(tile),
                    CellState::Occupied(resident) => CellState::Resolving {
                        resident,
                        incoming: tile,
                    },
                    CellState::Resolving { .. } => unreachable!("target rejected by can_accept"),
                };
                moved = true;
            }
        }
        moved
    }

    /// Commit every queued merge: the resident doubles and keeps its id, the
    /// incoming tile is discarded. Merges in different cells are independent.
    fn commit_merges(&mut self) -> Vec<Merge> {
        let mut merges = Vec::new();
        for idx in 0..self.cells.len() {
            if let CellState::Resolving { resident, incoming } = self.cells[idx] {
                let value = resident.value + incoming.value;
                self.cells[idx] = CellState::Occupied(Tile {
                    id: resident.id,
                    value,
                });
                let (x, y) = self.coords(idx);
                merges.push(Merge { x, y, value });
            }
        }
        merges
    }

    /// Single-step lookahead: some non-head tile whose immediate predecessor
    /// in the line accepts it.
    fn has_move(&self, dir: Move) -> bool {
        self.lines(dir).iter().any(|line| {
            line.windows(2).any(|pair| match self.cells[pair[1]] {
                CellState::Occupied(tile) => self.cells[pair[0]].can_accept(tile),
                _ => false,
            })
        })
    }
}

/// Running score total. Merges add; only a new game resets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Score {
    total: u64,
}

impl Score {
    #[inline]
    pub fn add(&mut self, points: u64) {
        self.total += points;
    }

    #[inline]
    pub fn reset(&mut self) {
        self.total = 0;
    }

    #[inline]
    pub fn total(&self) -> u64 {
        self.total
    }
}

/// A tile spawned after a board-changing move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spawn {
    pub x: usize,
    pub y: usize,
    pub value: u32,
}

/// A merge committed at `(x, y)`, producing `value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Merge {
    pub x: usize,
    pub y: usize,
    pub value: u32,
}

/// What one `apply_move` call did, for the caller to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveResult {
    /// True iff at least one tile moved or merged.
    pub changed: bool,
    /// The tile spawned after the move; `None` for a no-op move.
    pub spawned: Option<Spawn>,
    /// All merges committed by this move.
    pub merges: Vec<Merge>,
    /// True iff no direction has a legal move left.
    pub game_over: bool,
}

/// One cell's persisted record: position plus the resident value, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedCell {
    pub x: u8,
    pub y: u8,
    pub value: Option<u32>,
}

/// Full persisted state: every cell exactly once, in grid order, plus the
/// score total. See the `serialization` module for the wire format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub cells: Vec<SavedCell>,
    pub score: u64,
}

/// Why a snapshot was rejected. Restore is all-or-nothing: on any error the
/// game is left exactly as it was.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreError {
    #[error("snapshot has {got} cell records, expected {expected}")]
    CellCount { expected: usize, got: usize },
    #[error("cell ({x}, {y}) is outside the {size}x{size} grid")]
    OutOfRange { x: u8, y: u8, size: usize },
    #[error("cell ({x}, {y}) appears more than once")]
    DuplicateCell { x: u8, y: u8 },
    #[error("{0} is not a valid tile value")]
    BadTileValue(u32),
}

/// The board engine: a grid plus its score, with no process-wide state.
///
/// All randomized operations take an `Rng` so callers can inject a seeded
/// generator; `apply_move_thread` covers the common thread-RNG case. Callers
/// must serialize moves: each `apply_move` is a single synchronous
/// transformation that assumes a quiescent grid.
#[derive(Debug, Clone)]
pub struct Game {
    grid: Grid,
    score: Score,
    next_id: u64,
}

impl Game {
    /// Start a 4x4 game with the initial two spawned tiles.
    ///
    /// ```
    /// use twenty48::engine::Game;
    /// use rand::{rngs::StdRng, SeedableRng};
    ///
    /// let mut rng = StdRng::seed_from_u64(42);
    /// let game = Game::new(&mut rng);
    /// assert_eq!(game.count_empty(), 14);
    /// assert_eq!(game.score(), 0);
    /// ```
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::with_size(DEFAULT_SIZE, rng)
    }

    /// Start an N x N game with the initial two spawned tiles.
    pub fn with_size<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Self {
        let mut game = Self::empty_with_size(size);
        game.spawn_tile(rng);
        game.spawn_tile(rng);
        game
    }

    /// A 4x4 board with no tiles, e.g. as the target of a `restore`.
    pub fn empty() -> Self {
        Self::empty_with_size(DEFAULT_SIZE)
    }

    /// An N x N board with no tiles.
    pub fn empty_with_size(size: usize) -> Self {
        Game {
            grid: Grid::new(size),
            score: Score::default(),
            next_id: 0,
        }
    }

    /// Board dimension N.
    #[inline]
    pub fn size(&self) -> usize {
        self.grid.size
    }

    /// Current score total.
    #[inline]
    pub fn score(&self) -> u64 {
        self.score.total()
    }

    /// The settled tile at `(x, y)`, if any.
    pub fn tile(&self, x: usize, y: usize) -> Option<Tile> {
        if x >= self.grid.size || y >= self.grid.size {
            return None;
        }
        self.grid.cells[y * self.grid.size + x].resident()
    }

    /// Count the empty cells on the board.
    pub fn count_empty(&self) -> usize {
        self.grid.cells.iter().filter(|cell| cell.is_empty()).count()
    }

    /// The highest tile value present (0 on an empty board).
    pub fn highest_tile(&self) -> u32 {
        self.grid
            .cells
            .iter()
            .filter_map(CellState::resident)
            .map(|tile| tile.value)
            .max()
            .unwrap_or(0)
    }

    /// Slide and merge toward `dir`, then (iff the board changed) spawn one
    /// tile and recheck for game over.
    ///
    /// A move that cannot change the board is a normal outcome, not an
    /// error: `changed` is false and no state is mutated.
    ///
    /// ```
    /// use twenty48::engine::{Game, Move};
    /// use rand::{rngs::StdRng, SeedableRng};
    ///
    /// let mut rng = StdRng::seed_from_u64(1);
    /// let mut game = Game::new(&mut rng);
    /// let result = game.apply_move(Move::Left, &mut rng);
    /// // A changed move always spawns exactly one tile.
    /// assert_eq!(result.changed, result.spawned.is_some());
    /// ```
    pub fn apply_move<R: Rng + ?Sized>(&mut self, dir: Move, rng: &mut R) -> MoveResult {
        let (changed, merges) = self.resolve(dir);
        if !changed {
            return MoveResult {
                changed: false,
                spawned: None,
                merges,
                game_over: self.is_game_over(),
            };
        }
        let spawned = self.spawn_tile(rng);
        MoveResult {
            changed: true,
            spawned,
            merges,
            game_over: self.is_game_over(),
        }
    }

    /// Convenience: like `apply_move` but uses the thread-local RNG.
    pub fn apply_move_thread(&mut self, dir: Move) -> MoveResult {
        let mut rng = rand::thread_rng();
        self.apply_move(dir, &mut rng)
    }

    /// Slide, then commit merges and score them. No spawn, no terminal check.
    fn resolve(&mut self, dir: Move) -> (bool, Vec<Merge>) {
        let moved = self.grid.slide(dir);
        let merges = self.grid.commit_merges();
        for merge in &merges {
            self.score.add(u64::from(merge.value));
        }
        (moved, merges)
    }

    /// Spawn one tile (2 or 4, even odds) in a uniformly chosen empty cell.
    /// Skipped when no cell is empty; never retries.
    fn spawn_tile<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Spawn> {
        let empties = self.grid.empty_cells();
        if empties.is_empty() {
            return None;
        }
        let idx = empties[rng.gen_range(0..empties.len())];
        let value = random_tile_value(rng);
        let tile = self.alloc_tile(value);
        self.grid.cells[idx] = CellState::Occupied(tile);
        let (x, y) = self.grid.coords(idx);
        Some(Spawn { x, y, value })
    }

    fn alloc_tile(&mut self, value: u32) -> Tile {
        let id = TileId(self.next_id);
        self.next_id += 1;
        Tile { id, value }
    }

    /// True if a move in `dir` would change the board.
    pub fn can_move(&self, dir: Move) -> bool {
        self.grid.has_move(dir)
    }

    /// The directions that currently have a legal move, in `Move::ALL` order.
    pub fn available_moves(&self) -> Vec<Move> {
        Move::ALL
            .iter()
            .copied()
            .filter(|&dir| self.grid.has_move(dir))
            .collect()
    }

    /// True if no legal move remains in any direction.
    ///
    /// ```
    /// use twenty48::engine::Game;
    /// // No tile can move on an empty board.
    /// assert!(Game::empty().is_game_over());
    /// ```
    pub fn is_game_over(&self) -> bool {
        Move::ALL.iter().all(|&dir| !self.grid.has_move(dir))
    }

    /// New game: clear the board, reset the score, spawn the initial two
    /// tiles.
    pub fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.grid.clear();
        self.score.reset();
        self.next_id = 0;
        self.spawn_tile(rng);
        self.spawn_tile(rng);
    }

    /// Capture the full persisted state: every cell in grid order, then the
    /// score total.
    ///
    /// ```
    /// use twenty48::engine::{Game, Move};
    /// use rand::{rngs::StdRng, SeedableRng};
    ///
    /// let mut rng = StdRng::seed_from_u64(7);
    /// let mut game = Game::new(&mut rng);
    /// game.apply_move(Move::Left, &mut rng);
    ///
    /// let snapshot = game.snapshot();
    /// let mut restored = Game::empty();
    /// restored.restore(&snapshot).unwrap();
    /// assert_eq!(restored.snapshot(), snapshot);
    /// ```
    pub fn snapshot(&self) -> Snapshot {
        let mut cells = Vec::with_capacity(self.grid.cells.len());
        for idx in 0..self.grid.cells.len() {
            let (x, y) = self.grid.coords(idx);
            cells.push(SavedCell {
                x: x as u8,
                y: y as u8,
                value: self.grid.cells[idx].resident().map(|tile| tile.value),
            });
        }
        Snapshot {
            cells,
            score: self.score.total(),
        }
    }

    /// Replace all cell contents and the score from a snapshot.
    ///
    /// Validation happens before any mutation: on error the game is left
    /// untouched. Restored tiles get fresh identities.
    pub fn restore(&mut self, snapshot: &Snapshot) -> Result<(), RestoreError> {
        let size = self.grid.size;
        let expected = size * size;
        if snapshot.cells.len() != expected {
            return Err(RestoreError::CellCount {
                expected,
                got: snapshot.cells.len(),
            });
        }
        let mut cells = vec![CellState::Empty; expected];
        let mut seen = vec![false; expected];
        let mut next_id = 0;
        for saved in &snapshot.cells {
            let (x, y) = (usize::from(saved.x), usize::from(saved.y));
            if x >= size || y >= size {
                return Err(RestoreError::OutOfRange {
                    x: saved.x,
                    y: saved.y,
                    size,
                });
            }
            let idx = y * size + x;
            if seen[idx] {
                return Err(RestoreError::DuplicateCell {
                    x: saved.x,
                    y: saved.y,
                });
            }
            seen[idx] = true;
            if let Some(value) = saved.value {
                if !is_tile_value(value) {
                    return Err(RestoreError::BadTileValue(value));
                }
                cells[idx] = CellState::Occupied(Tile {
                    id: TileId(next_id),
                    value,
                });
                next_id += 1;
            }
        }
        self.grid.cells = cells;
        self.score = Score {
            total: snapshot.score,
        };
        self.next_id = next_id;
        Ok(())
    }
}

/// Valid tile values are powers of two starting at 2.
#[inline]
fn is_tile_value(value: u32) -> bool {
    value >= 2 && value.is_power_of_two()
}

/// 2 or 4, even odds.
fn random_tile_value<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    if rng.gen_range(0..2) == 0 {
        2
    } else {
        4
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        for y in 0..self.grid.size {
            if y > 0 {
                writeln!(f, "{}", "-".repeat(self.grid.size * 8))?;
            }
            let row: Vec<String> = (0..self.grid.size)
                .map(|x| format_val(self.tile(x, y).map(|tile| tile.value).unwrap_or(0)))
                .collect();
            writeln!(f, "{}", row.join("|"))?;
        }
        Ok(())
    }
}

fn format_val(val: u32) -> String {
    match val {
        0 => String::from("       "),
        x => {
            let mut x = x.to_string();
            while x.len() < 7 {
                match x.len() {
                    6 => x = format!(" {}", x),
                    _ => x = format!(" {} ", x),
                }
            }
            x
        }
    }
}
