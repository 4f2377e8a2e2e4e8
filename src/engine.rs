use rand::Rng;
use std::fmt;
use std::sync::OnceLock;

/// A direction to slide/merge tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    /// All four directions, in a fixed order.
    pub const ALL: [Move; 4] = [Move::Up, Move::Down, Move::Left, Move::Right];
}

/// Board side length. The game is fixed at 4x4.
pub const SIZE: usize = 4;

/// Largest tile a nibble can hold (exponent 15). A pair of these does not
/// merge further.
pub const MAX_TILE: u32 = 1 << 15;

const LINE_TABLE_SIZE: usize = 0x1_0000; // 65,536 possible 16-bit lines

struct Stores {
    shift_left: Box<[u64]>,
    shift_right: Box<[u64]>,
    shift_up: Box<[u64]>,
    shift_down: Box<[u64]>,
    // Points gained by a line slid toward its front (left/up) or its back
    // (right/down). The two differ when a merged tile cascades into its
    // successor, so both orientations are tabled.
    points_front: Box<[u64]>,
    points_back: Box<[u64]>,
}

type BoardRaw = u64;
type Line = u64;
type Points = u64;

/// Packed 4x4 2048 board as 16 4-bit exponent nibbles in a `u64`.
///
/// Nibble 0 (most significant) is cell (0, 0); cells run row-major. An
/// exponent `e > 0` is the tile value `1 << e`; 0 is an empty cell. Cell
/// accessors speak actual tile values (2, 4, 8, ...), with a raw escape
/// hatch for tests and advanced use.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Board(BoardRaw);

impl Board {
    /// A constant empty board (all zeros).
    pub const EMPTY: Board = Board(0);

    /// Construct a `Board` from its raw packed representation.
    #[inline]
    pub fn from_raw(raw: BoardRaw) -> Self {
        Board(raw)
    }

    /// Borrow the raw packed `u64` for this `Board`.
    #[inline]
    pub fn raw(&self) -> BoardRaw {
        self.0
    }

    /// Tile value at `(row, col)`: 0 for empty, otherwise a power of two.
    #[inline]
    pub fn get(self, row: usize, col: usize) -> u32 {
        match self.exponent_at(row, col) {
            0 => 0,
            e => 1 << e,
        }
    }

    /// Put `value` (0 to clear, otherwise a power of two in `2..=MAX_TILE`)
    /// at `(row, col)`. Bounds are checked; the value invariant is the
    /// caller's contract.
    pub fn set(&mut self, row: usize, col: usize, value: u32) {
        let shift = nibble_shift(row, col);
        let exponent = exponent_of(value) as u64;
        self.0 = (self.0 & !(0xf << shift)) | (exponent << shift);
    }

    /// True if the cell at `(row, col)` holds no tile.
    #[inline]
    pub fn is_empty(self, row: usize, col: usize) -> bool {
        self.exponent_at(row, col) == 0
    }

    /// Coordinates of every empty cell, in row-major scan order.
    /// Recomputed on each call.
    pub fn empty_cells(self) -> Vec<(usize, usize)> {
        let mut cells = Vec::with_capacity(16);
        for row in 0..SIZE {
            for col in 0..SIZE {
                if self.is_empty(row, col) {
                    cells.push((row, col));
                }
            }
        }
        cells
    }

    /// Count the number of empty cells on the board.
    #[inline]
    pub fn count_empty(self) -> u64 {
        16 - count_non_empty(self)
    }

    /// The 16 tile values in row-major order.
    pub fn to_values(self) -> [u32; 16] {
        let mut values = [0u32; 16];
        for (idx, slot) in values.iter_mut().enumerate() {
            *slot = self.get(idx / SIZE, idx % SIZE);
        }
        values
    }

    /// Rebuild a board from 16 row-major tile values.
    pub fn from_values(values: [u32; 16]) -> Self {
        let mut board = Board::EMPTY;
        for (idx, &value) in values.iter().enumerate() {
            board.set(idx / SIZE, idx % SIZE, value);
        }
        board
    }

    /// Slide and merge every line toward `dir`, returning the new board and
    /// the points gained from merges. No random insert.
    ///
    /// ```
    /// use cli_2048::engine::{Board, Move};
    /// let mut b = Board::EMPTY;
    /// b.set(0, 1, 2);
    /// b.set(0, 3, 2);
    /// let (moved, points) = b.shift(Move::Left);
    /// assert_eq!(moved.get(0, 0), 4);
    /// assert_eq!(points, 4);
    /// ```
    #[inline]
    pub fn shift(self, dir: Move) -> (Self, Points) {
        match dir {
            Move::Left | Move::Right => shift_rows(self, dir),
            Move::Up | Move::Down => shift_cols(self, dir),
        }
    }

    /// Insert a 2 (90%) or 4 (10%) into an empty cell chosen uniformly at
    /// random. Returns `None` on a full board, leaving nothing to undo.
    ///
    /// ```
    /// use cli_2048::engine::Board;
    /// use rand::{rngs::StdRng, SeedableRng};
    /// let mut rng = StdRng::seed_from_u64(123);
    /// let b = Board::EMPTY.try_spawn(&mut rng).unwrap();
    /// assert_eq!(b.count_empty(), 15);
    /// ```
    pub fn try_spawn<R: Rng + ?Sized>(self, rng: &mut R) -> Option<Self> {
        let open = self.empty_cells();
        if open.is_empty() {
            return None;
        }
        let (row, col) = open[rng.gen_range(0..open.len())];
        let value = if rng.gen_range(0..10) < 9 { 2 } else { 4 };
        let mut next = self;
        next.set(row, col, value);
        Some(next)
    }

    /// True while some input can still change the board: an empty cell, or
    /// two equal tiles side by side. Purely structural; no move is simulated.
    /// Checking each cell's right and down neighbor covers every adjacent
    /// pair once.
    pub fn has_any_move(self) -> bool {
        for row in 0..SIZE {
            for col in 0..SIZE {
                let exponent = self.exponent_at(row, col);
                if exponent == 0 {
                    return true;
                }
                if col + 1 < SIZE && self.exponent_at(row, col + 1) == exponent {
                    return true;
                }
                if row + 1 < SIZE && self.exponent_at(row + 1, col) == exponent {
                    return true;
                }
            }
        }
        false
    }

    #[inline]
    fn exponent_at(self, row: usize, col: usize) -> u8 {
        ((self.0 >> nibble_shift(row, col)) & 0xf) as u8
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board({:#018x})", self.0)
    }
}

/// Fixed-width console rendering: 3-character right-aligned cells, blank
/// when empty, ` |` between columns and a dash rule between rows.
impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..SIZE {
            for col in 0..SIZE {
                match self.get(row, col) {
                    0 => write!(f, "   ")?,
                    value => write!(f, "{value:>3}")?,
                }
                if col + 1 < SIZE {
                    write!(f, " |")?;
                }
            }
            writeln!(f)?;
            if row + 1 < SIZE {
                writeln!(f, "-------------------")?;
            }
        }
        Ok(())
    }
}

impl From<BoardRaw> for Board {
    fn from(raw: BoardRaw) -> Self {
        Board::from_raw(raw)
    }
}
impl From<Board> for BoardRaw {
    fn from(board: Board) -> Self {
        board.raw()
    }
}

/// Precompute the line tables. Safe to call multiple times; any shift will
/// also initialize them lazily on first use.
pub fn init() {
    let _ = stores();
}

#[inline]
fn nibble_shift(row: usize, col: usize) -> u64 {
    assert!(row < SIZE && col < SIZE);
    60 - 4 * (row * SIZE + col) as u64
}

#[inline]
fn exponent_of(value: u32) -> u8 {
    debug_assert!(
        value == 0 || (value.is_power_of_two() && (2..=MAX_TILE).contains(&value)),
        "not a tile value: {value}"
    );
    match value {
        0 => 0,
        v => v.trailing_zeros() as u8,
    }
}

static STORES: OnceLock<Stores> = OnceLock::new();

#[inline(always)]
fn stores() -> &'static Stores {
    STORES.get_or_init(create_stores)
}

fn create_stores() -> Stores {
    // Heap-allocated so the 64K-entry tables never touch the stack
    let mut shift_left = vec![0u64; LINE_TABLE_SIZE];
    let mut shift_right = vec![0u64; LINE_TABLE_SIZE];
    let mut shift_up = vec![0u64; LINE_TABLE_SIZE];
    let mut shift_down = vec![0u64; LINE_TABLE_SIZE];
    let mut points_front = vec![0u64; LINE_TABLE_SIZE];
    let mut points_back = vec![0u64; LINE_TABLE_SIZE];

    for val in 0..LINE_TABLE_SIZE {
        let tiles = unpack_line(val as Line);
        let (front, front_points) = slide_line(tiles);
        let (slid_back, back_points) = slide_line(reversed(tiles));
        let back = reversed(slid_back);

        shift_left[val] = pack_row(front);
        shift_right[val] = pack_row(back);
        shift_up[val] = pack_col(front);
        shift_down[val] = pack_col(back);
        points_front[val] = front_points;
        points_back[val] = back_points;
    }

    Stores {
        shift_left: shift_left.into_boxed_slice(),
        shift_right: shift_right.into_boxed_slice(),
        shift_up: shift_up.into_boxed_slice(),
        shift_down: shift_down.into_boxed_slice(),
        points_front: points_front.into_boxed_slice(),
        points_back: points_back.into_boxed_slice(),
    }
}

#[inline(always)]
fn line_entry(table: &[u64], idx: u16) -> u64 {
    debug_assert!((idx as usize) < LINE_TABLE_SIZE);
    unsafe { *table.get_unchecked(idx as usize) }
}

/// Slide one line of exponents toward index 0: compress out the zeros, then
/// a single forward merge scan. After a merge the scan re-examines the same
/// index, so a run of equals pairs from the front ([2,2,2] -> [4,2]) and a
/// just-merged tile may absorb an equal successor ([2,2,4] -> [8]).
/// Exponent 15 tiles never merge (nibble cap).
fn slide_line(tiles: [u8; 4]) -> ([u8; 4], Points) {
    let mut line = [0u8; 4];
    let mut len = 0;
    for &tile in &tiles {
        if tile != 0 {
            line[len] = tile;
            len += 1;
        }
    }

    let mut points = 0u64;
    let mut i = 0;
    while i + 1 < len {
        if line[i] == line[i + 1] && line[i] < 0xf {
            line[i] += 1;
            points += 1u64 << line[i];
            for j in i + 1..len - 1 {
                line[j] = line[j + 1];
            }
            len -= 1;
            line[len] = 0;
        } else {
            i += 1;
        }
    }
    (line, points)
}

fn unpack_line(line: Line) -> [u8; 4] {
    [
        ((line >> 12) & 0xf) as u8,
        ((line >> 8) & 0xf) as u8,
        ((line >> 4) & 0xf) as u8,
        (line & 0xf) as u8,
    ]
}

fn reversed(tiles: [u8; 4]) -> [u8; 4] {
    [tiles[3], tiles[2], tiles[1], tiles[0]]
}

fn pack_row(tiles: [u8; 4]) -> Line {
    (tiles[0] as u64) << 12 | (tiles[1] as u64) << 8 | (tiles[2] as u64) << 4 | tiles[3] as u64
}

fn pack_col(tiles: [u8; 4]) -> Line {
    (tiles[0] as u64) << 48 | (tiles[1] as u64) << 32 | (tiles[2] as u64) << 16 | tiles[3] as u64
}

fn shift_rows(board: Board, dir: Move) -> (Board, Points) {
    let s = stores();
    let (table, points_table): (&[u64], &[u64]) = match dir {
        Move::Left => (&s.shift_left, &s.points_front),
        Move::Right => (&s.shift_right, &s.points_back),
        _ => unreachable!("shift_rows only handles Left/Right"),
    };
    let mut raw = 0;
    let mut points = 0;
    for row_idx in 0..4 {
        let row_val = line_at(board.0, row_idx) as u16;
        raw |= line_entry(table, row_val) << (48 - 16 * row_idx);
        points += line_entry(points_table, row_val);
    }
    (Board(raw), points)
}

fn shift_cols(board: Board, dir: Move) -> (Board, Points) {
    let transposed = transpose(board.0);
    let s = stores();
    let (table, points_table): (&[u64], &[u64]) = match dir {
        Move::Up => (&s.shift_up, &s.points_front),
        Move::Down => (&s.shift_down, &s.points_back),
        _ => unreachable!("shift_cols only handles Up/Down"),
    };
    let mut raw = 0;
    let mut points = 0;
    for col_idx in 0..4 {
        let col_val = line_at(transposed, col_idx) as u16;
        raw |= line_entry(table, col_val) << (12 - 4 * col_idx);
        points += line_entry(points_table, col_val);
    }
    (Board(raw), points)
}

#[inline]
fn line_at(raw: BoardRaw, line_idx: usize) -> Line {
    (raw >> ((3 - line_idx) * 16)) & 0xffff
}

// Credit to Nneonneo
fn transpose(x: BoardRaw) -> BoardRaw {
    let a1 = x & 0xF0F00F0FF0F00F0F;
    let a2 = x & 0x0000F0F00000F0F0;
    let a3 = x & 0x0F0F00000F0F0000;
    let a = a1 | (a2 << 12) | (a3 >> 12);
    let b1 = a & 0xFF00FF0000FF00FF;
    let b2 = a & 0x00FF00FF00000000;
    let b3 = a & 0x00000000FF00FF00;
    b1 | (b2 >> 24) | (b3 << 24)
}

// https://stackoverflow.com/questions/38225571/count-number-of-zero-nibbles-in-an-unsigned-64-bit-integer
fn count_non_empty(board: Board) -> u64 {
    let mut raw = board.0;
    raw |= raw >> 1;
    raw |= raw >> 2;
    raw &= 0x1111111111111111;
    raw.count_ones() as u64
}
