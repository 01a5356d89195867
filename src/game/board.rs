use std::fmt;

pub const ROWS: usize = 6;
pub const COLS: usize = 7;

/// Number of pieces in a line needed to win.
const CONNECT: usize = 4;

/// Column `col` seen in a left-right mirror. Out-of-range columns map to themselves.
pub fn mirror_column(col: usize) -> usize {
    if col < COLS {
        COLS - 1 - col
    } else {
        col
    }
}

/// A per-column vector (values, policy) reversed to match a mirrored board.
pub fn mirror_columns<T: Clone>(values: &[T]) -> Vec<T> {
    values.iter().rev().cloned().collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Empty,
    Red,
    Yellow,
}

impl Cell {
    /// Signed numeric value: Red = +1, Yellow = -1, Empty = 0.
    pub fn value(self) -> i8 {
        match self {
            Cell::Empty => 0,
            Cell::Red => 1,
            Cell::Yellow => -1,
        }
    }

    /// The same cell seen from the other side of the table.
    pub fn flipped(self) -> Cell {
        match self {
            Cell::Empty => Cell::Empty,
            Cell::Red => Cell::Yellow,
            Cell::Yellow => Cell::Red,
        }
    }

    fn symbol(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::Red => 'X',
            Cell::Yellow => 'O',
        }
    }
}

/// A 6x7 Connect Four grid. Row 0 is the top, row 5 the bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    cells: [[Cell; COLS]; ROWS],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropError {
    ColumnFull,
    InvalidColumn,
}

impl Board {
    pub fn new() -> Self {
        Board {
            cells: [[Cell::Empty; COLS]; ROWS],
        }
    }

    pub fn get(&self, row: usize, col: usize) -> Cell {
        self.cells[row][col]
    }

    pub fn is_column_full(&self, col: usize) -> bool {
        col >= COLS || self.cells[0][col] != Cell::Empty
    }

    /// Drop a piece in a column, returning the row where it landed.
    pub fn drop_piece(&mut self, col: usize, cell: Cell) -> Result<usize, DropError> {
        if col >= COLS {
            return Err(DropError::InvalidColumn);
        }
        let row = (0..ROWS)
            .rev()
            .find(|&row| self.cells[row][col] == Cell::Empty)
            .ok_or(DropError::ColumnFull)?;
        self.cells[row][col] = cell;
        Ok(row)
    }

    pub fn is_full(&self) -> bool {
        (0..COLS).all(|col| self.is_column_full(col))
    }

    /// Whether the piece at (row, col) completes a line of four.
    pub fn check_win(&self, row: usize, col: usize) -> bool {
        let cell = self.get(row, col);
        if cell == Cell::Empty {
            return false;
        }
        const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];
        DIRECTIONS.iter().any(|&(dr, dc)| {
            1 + self.run_length(row, col, dr, dc, cell) + self.run_length(row, col, -dr, -dc, cell)
                >= CONNECT
        })
    }

    /// Count consecutive `cell` pieces starting one step away from (row, col).
    fn run_length(&self, row: usize, col: usize, dr: isize, dc: isize, cell: Cell) -> usize {
        let mut count = 0;
        let (mut r, mut c) = (row as isize + dr, col as isize + dc);
        while (0..ROWS as isize).contains(&r)
            && (0..COLS as isize).contains(&c)
            && self.cells[r as usize][c as usize] == cell
        {
            count += 1;
            r += dr;
            c += dc;
        }
        count
    }

    /// Number of cells holding `cell`.
    pub fn count(&self, cell: Cell) -> usize {
        self.cells.iter().flatten().filter(|&&c| c == cell).count()
    }

    /// Sign-inverted copy: Red pieces become Yellow and vice versa.
    pub fn flipped(&self) -> Board {
        let mut out = *self;
        for cell in out.cells.iter_mut().flatten() {
            *cell = cell.flipped();
        }
        out
    }

    /// Left-right reflection. Lines of four map onto lines of four.
    pub fn mirrored(&self) -> Board {
        let mut out = *self;
        for row in out.cells.iter_mut() {
            row.reverse();
        }
        out
    }

    /// Row-major signed values, one byte per cell. Stable across runs.
    pub fn key(&self) -> Vec<u8> {
        self.cells
            .iter()
            .flatten()
            .map(|c| c.value() as u8)
            .collect()
    }

    /// Row-major signed values as estimator features.
    pub fn features(&self) -> [f32; ROWS * COLS] {
        let mut out = [0.0f32; ROWS * COLS];
        for (slot, cell) in out.iter_mut().zip(self.cells.iter().flatten()) {
            *slot = f32::from(cell.value());
        }
        out
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let border = "-".repeat(COLS * 3 + 2);
        writeln!(f, " {border}")?;
        for row in &self.cells {
            write!(f, "|")?;
            for cell in row {
                write!(f, " {} ", cell.symbol())?;
            }
            writeln!(f, " |")?;
        }
        writeln!(f, " {border}")?;
        write!(f, " ")?;
        for col in 0..COLS {
            write!(f, " {col} ")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_board_is_empty() {
        let board = Board::new();
        assert_eq!(board.count(Cell::Empty), ROWS * COLS);
        assert!(!board.is_full());
    }

    #[test]
    fn test_drop_piece_stacks() {
        let mut board = Board::new();
        assert_eq!(board.drop_piece(3, Cell::Red).unwrap(), 5);
        assert_eq!(board.drop_piece(3, Cell::Yellow).unwrap(), 4);
        assert_eq!(board.get(5, 3), Cell::Red);
        assert_eq!(board.get(4, 3), Cell::Yellow);
    }

    #[test]
    fn test_column_full_and_invalid() {
        let mut board = Board::new();
        for _ in 0..ROWS {
            board.drop_piece(0, Cell::Red).unwrap();
        }
        assert!(board.is_column_full(0));
        assert_eq!(board.drop_piece(0, Cell::Yellow), Err(DropError::ColumnFull));
        assert_eq!(board.drop_piece(COLS, Cell::Red), Err(DropError::InvalidColumn));
    }

    #[test]
    fn test_horizontal_and_vertical_wins() {
        let mut board = Board::new();
        for col in 0..4 {
            board.drop_piece(col, Cell::Red).unwrap();
        }
        assert!(board.check_win(5, 1));

        let mut board = Board::new();
        for _ in 0..4 {
            board.drop_piece(6, Cell::Yellow).unwrap();
        }
        assert!(board.check_win(2, 6));
    }

    #[test]
    fn test_diagonal_wins() {
        // '/' diagonal ending at column 3
        let mut board = Board::new();
        for (col, fillers) in [(0, 0), (1, 1), (2, 2), (3, 3)] {
            for _ in 0..fillers {
                board.drop_piece(col, Cell::Yellow).unwrap();
            }
            board.drop_piece(col, Cell::Red).unwrap();
        }
        assert!(board.check_win(2, 3));

        // '\' diagonal ending at column 3
        let mut board = Board::new();
        for (col, fillers) in [(6, 0), (5, 1), (4, 2), (3, 3)] {
            for _ in 0..fillers {
                board.drop_piece(col, Cell::Red).unwrap();
            }
            board.drop_piece(col, Cell::Yellow).unwrap();
        }
        assert!(board.check_win(2, 3));
    }

    #[test]
    fn test_three_is_not_a_win() {
        let mut board = Board::new();
        for col in 0..3 {
            board.drop_piece(col, Cell::Red).unwrap();
        }
        assert!(!board.check_win(5, 1));
    }

    #[test]
    fn test_flipped_negates_values() {
        let mut board = Board::new();
        board.drop_piece(2, Cell::Red).unwrap();
        board.drop_piece(4, Cell::Yellow).unwrap();
        let flipped = board.flipped();
        assert_eq!(flipped.get(5, 2), Cell::Yellow);
        assert_eq!(flipped.get(5, 4), Cell::Red);
        assert_eq!(flipped.flipped(), board);
        let sum: f32 = board
            .features()
            .iter()
            .zip(flipped.features().iter())
            .map(|(a, b)| a + b)
            .sum();
        assert_eq!(sum, 0.0);
    }

    #[test]
    fn test_mirror_twice_is_identity_and_keeps_wins() {
        let mut board = Board::new();
        for (col, fillers) in [(0, 0), (1, 1), (2, 2), (3, 3)] {
            for _ in 0..fillers {
                board.drop_piece(col, Cell::Yellow).unwrap();
            }
            board.drop_piece(col, Cell::Red).unwrap();
        }
        board.drop_piece(6, Cell::Yellow).unwrap();

        let mirrored = board.mirrored();
        assert_ne!(mirrored, board);
        assert_eq!(mirrored.mirrored(), board);
        assert_eq!(mirrored.get(5, 6), Cell::Red);
        assert_eq!(mirrored.get(5, 0), Cell::Yellow);
        assert!(board.check_win(2, 3));
        assert!(mirrored.check_win(2, mirror_column(3)));
        assert!(mirrored.check_win(5, mirror_column(0)));
        assert!(!mirrored.check_win(5, mirror_column(6)));
    }

    #[test]
    fn test_mirror_column_helpers() {
        assert_eq!(mirror_column(0), COLS - 1);
        assert_eq!(mirror_column(3), 3);
        assert_eq!(mirror_column(COLS), COLS);
        assert_eq!(mirror_columns(&[1, 2, 3, 4, 5, 6, 7]), vec![7, 6, 5, 4, 3, 2, 1]);
        let values = [0.1f32, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7];
        let mirrored = mirror_columns(&values);
        for col in 0..COLS {
            assert_eq!(mirrored[mirror_column(col)], values[col]);
        }
    }

    #[test]
    fn test_key_distinguishes_boards() {
        let empty = Board::new();
        let mut one = Board::new();
        one.drop_piece(0, Cell::Red).unwrap();
        assert_eq!(empty.key().len(), ROWS * COLS);
        assert_ne!(empty.key(), one.key());
        assert_eq!(one.key(), one.clone().key());
    }

    #[test]
    fn test_display_uses_symbols() {
        let mut board = Board::new();
        board.drop_piece(0, Cell::Red).unwrap();
        board.drop_piece(1, Cell::Yellow).unwrap();
        let text = board.to_string();
        let bottom = text.lines().nth(ROWS).unwrap();
        assert!(bottom.starts_with("| X  O  . "));
        assert_eq!(text.matches('X').count(), 1);
        assert_eq!(text.matches('O').count(), 1);
    }
}
