//! Stateless board scans over length-4 windows.
//!
//! Every scan walks all windows of every requested orientation, so the
//! results never depend on where the last piece was dropped.

use std::collections::HashSet;

use super::{Board, Cell, Player};

/// Cells in a window, and in a winning line.
pub const WINDOW: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Horizontal,
    Vertical,
    /// Bottom-left to top-right, /
    DiagonalUp,
    /// Top-left to bottom-right, \
    DiagonalDown,
}

impl Orientation {
    pub const ALL: [Orientation; 4] = [
        Orientation::Horizontal,
        Orientation::Vertical,
        Orientation::DiagonalUp,
        Orientation::DiagonalDown,
    ];

    /// Orientations counted by [`count_open_runs`].
    pub const STRAIGHT: [Orientation; 2] = [Orientation::Horizontal, Orientation::Vertical];

    /// (row, col) step between consecutive cells of a window.
    fn step(self) -> (isize, isize) {
        match self {
            Orientation::Horizontal => (0, 1),
            Orientation::Vertical => (1, 0),
            Orientation::DiagonalUp => (1, 1),
            Orientation::DiagonalDown => (-1, 1),
        }
    }
}

/// Positions of the cells in one window, in scan order.
pub type Window = [(usize, usize); WINDOW];

/// All windows of one orientation that fit on the board.
pub fn windows(board: &Board, orientation: Orientation) -> impl Iterator<Item = Window> {
    let rows = board.rows() as isize;
    let cols = board.cols() as isize;
    let (dr, dc) = orientation.step();
    let reach = WINDOW as isize - 1;

    (0..rows)
        .flat_map(move |r| (0..cols).map(move |c| (r, c)))
        .filter_map(move |(r, c)| {
            let (end_r, end_c) = (r + dr * reach, c + dc * reach);
            if end_r < 0 || end_r >= rows || end_c < 0 || end_c >= cols {
                return None;
            }
            let mut window = [(0, 0); WINDOW];
            for (i, slot) in window.iter_mut().enumerate() {
                let i = i as isize;
                *slot = ((r + dr * i) as usize, (c + dc * i) as usize);
            }
            Some(window)
        })
}

/// What one window holds from the point of view of one piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Tally {
    own: usize,
    empty: usize,
    first_empty: Option<(usize, usize)>,
}

fn tally(board: &Board, window: &Window, cell: Cell) -> Tally {
    let mut t = Tally {
        own: 0,
        empty: 0,
        first_empty: None,
    };
    for &(row, col) in window {
        match board.get(row, col) {
            c if c == cell => t.own += 1,
            Cell::Empty => {
                t.empty += 1;
                t.first_empty.get_or_insert((row, col));
            }
            _ => {}
        }
    }
    t
}

/// The cell one step before (`dir = -1`) or after (`dir = 1`) `pos` along
/// `orientation`, if it is on the board.
fn neighbour(
    board: &Board,
    (row, col): (usize, usize),
    orientation: Orientation,
    dir: isize,
) -> Option<(usize, usize)> {
    let (dr, dc) = orientation.step();
    let r = row as isize + dr * dir;
    let c = col as isize + dc * dir;
    (r >= 0 && c >= 0 && (r as usize) < board.rows() && (c as usize) < board.cols())
        .then_some((r as usize, c as usize))
}

/// First cell of the open run `window` holds, if any: exactly `length`
/// contiguous `cell`s, every other cell of the window empty, and no `cell`
/// directly before or after the run on its line.
fn open_run_start(
    board: &Board,
    orientation: Orientation,
    window: &Window,
    cell: Cell,
    length: usize,
) -> Option<(usize, usize)> {
    let t = tally(board, window, cell);
    if t.own != length || t.empty != WINDOW - length {
        return None;
    }
    let first = window.iter().position(|&(r, c)| board.get(r, c) == cell)?;
    let run = window.get(first..first + length)?;
    if !run.iter().all(|&(r, c)| board.get(r, c) == cell) {
        return None;
    }
    let before = neighbour(board, run[0], orientation, -1);
    let after = neighbour(board, run[length - 1], orientation, 1);
    if [before, after]
        .into_iter()
        .flatten()
        .any(|(r, c)| board.get(r, c) == cell)
    {
        return None;
    }
    Some(run[0])
}

/// A cell is playable when the next piece dropped in its column lands there.
fn is_playable(board: &Board, (row, col): (usize, usize)) -> bool {
    board.get(row, col) == Cell::Empty && (row == 0 || board.get(row - 1, col) != Cell::Empty)
}

/// Four consecutive `piece` cells in any orientation.
pub fn has_four_in_a_row(board: &Board, piece: Player) -> bool {
    let cell = piece.to_cell();
    Orientation::ALL.iter().any(|&o| {
        windows(board, o).any(|w| w.iter().all(|&(r, c)| board.get(r, c) == cell))
    })
}

/// Count horizontal and vertical runs of exactly `length` contiguous `piece`
/// cells that some window extends with empty cells only. Each run counts
/// once however many windows hold it, and a run is never counted as a
/// shorter one. Diagonals are not counted.
pub fn count_open_runs(board: &Board, piece: Player, length: usize) -> usize {
    assert!(
        (1..=WINDOW).contains(&length),
        "run length {length} outside 1..={WINDOW}"
    );
    let cell = piece.to_cell();
    Orientation::STRAIGHT
        .iter()
        .flat_map(|&o| windows(board, o).map(move |w| (o, w)))
        .filter_map(|(o, w)| open_run_start(board, o, &w, cell, length).map(|start| (o, start)))
        .collect::<HashSet<_>>()
        .len()
}

/// `piece` has three in a window whose fourth cell is empty and can be
/// played right now.
pub fn is_immediate_threat(board: &Board, piece: Player) -> bool {
    let cell = piece.to_cell();
    Orientation::ALL
        .iter()
        .flat_map(|&o| windows(board, o))
        .any(|w| {
            let t = tally(board, &w, cell);
            match t.first_empty {
                Some(pos) if t.own == WINDOW - 1 && t.empty == 1 => is_playable(board, pos),
                _ => false,
            }
        })
}

pub fn is_board_full(board: &Board) -> bool {
    board.is_full()
}
