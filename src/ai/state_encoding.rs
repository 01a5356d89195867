use burn::prelude::*;
use burn::tensor::TensorData;

use crate::game::{Board, COLS, ROWS};

/// Width of one encoded board.
pub const FEATURES: usize = ROWS * COLS;

/// Encode boards as a `[batch, 42]` tensor of signed cell values, row-major.
///
/// Boards are expected in canonical form, so the side to move reads as +1.
pub fn encode_boards<B: Backend>(boards: &[Board], device: &B::Device) -> Tensor<B, 2> {
    let mut flat = Vec::with_capacity(boards.len() * FEATURES);
    for board in boards {
        flat.extend_from_slice(&board.features());
    }
    Tensor::<B, 2>::from_data(TensorData::new(flat, [boards.len(), FEATURES]), device)
}
