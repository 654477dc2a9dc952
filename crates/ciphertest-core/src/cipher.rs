//! Mask cipher for the transmitted answer key.
//!
//! The server XORs each cell with the mask rotated left by one, indexed by
//! column modulo the mask length. This is obfuscation against casual
//! inspection of the payload, not encryption.
//!
//! XOR is its own inverse, so [`encode`] and [`decrypt`] are the same
//! transform. Applying the unrotated mask instead does not undo it unless the
//! mask is constant.

use crate::error::TestError;
use crate::model::{EncryptedPayload, KeyGrid};

/// Rotate the mask left by one position.
pub fn shift_mask(mask: &[u8]) -> Vec<u8> {
    let mut shifted = mask.to_vec();
    if !shifted.is_empty() {
        shifted.rotate_left(1);
    }
    shifted
}

/// Recover the plaintext key grid from a server payload.
pub fn decrypt(payload: &EncryptedPayload) -> Result<KeyGrid, TestError> {
    apply(&payload.data, &payload.mask).map(KeyGrid::new)
}

/// Obfuscate a plaintext key grid with `mask`, producing a payload that
/// [`decrypt`] maps back to `grid`.
pub fn encode(grid: &KeyGrid, mask: &[u8]) -> Result<EncryptedPayload, TestError> {
    Ok(EncryptedPayload {
        data: apply(&grid.rows, mask)?,
        mask: mask.to_vec(),
    })
}

fn apply(rows: &[Vec<u8>], mask: &[u8]) -> Result<Vec<Vec<u8>>, TestError> {
    if mask.is_empty() {
        return Err(TestError::config("mask is empty"));
    }
    let shifted = shift_mask(mask);
    Ok(rows
        .iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .map(|(col, &value)| value ^ shifted[col % shifted.len()])
                .collect()
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(data: Vec<Vec<u8>>, mask: Vec<u8>) -> EncryptedPayload {
        EncryptedPayload { data, mask }
    }

    #[test]
    fn shift_moves_head_to_tail() {
        assert_eq!(shift_mask(&[1, 2, 3, 4]), vec![2, 3, 4, 1]);
        assert_eq!(shift_mask(&[7]), vec![7]);
        assert!(shift_mask(&[]).is_empty());
    }

    #[test]
    fn decrypt_two_column_example() {
        let grid = decrypt(&payload(vec![vec![5, 6]], vec![1, 2])).unwrap();
        assert_eq!(grid.rows, vec![vec![7, 7]]);
    }

    #[test]
    fn short_mask_repeats_across_columns() {
        // shifted mask [3, 1]
        let grid = decrypt(&payload(vec![vec![0, 0, 0, 0, 0]], vec![1, 3])).unwrap();
        assert_eq!(grid.rows, vec![vec![3, 1, 3, 1, 3]]);
    }

    #[test]
    fn column_position_restarts_on_each_row() {
        let grid = decrypt(&payload(vec![vec![0, 0, 0], vec![0, 0]], vec![4, 5, 6])).unwrap();
        assert_eq!(grid.rows, vec![vec![5, 6, 4], vec![5, 6]]);
    }

    #[test]
    fn empty_mask_is_rejected() {
        let err = decrypt(&payload(vec![vec![1]], vec![])).unwrap_err();
        assert_eq!(err, TestError::InvalidConfiguration("mask is empty".into()));
    }

    #[test]
    fn encode_then_decrypt_recovers_grid() {
        let masks: [&[u8]; 4] = [&[1], &[1, 2], &[9, 0, 3], &[2, 7, 5, 1, 8, 6, 4, 3, 0, 9, 11]];
        let grid = KeyGrid::new(vec![
            vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 1],
            vec![9, 8, 7, 6, 5, 4, 3, 2, 1, 9],
            vec![4, 4, 4],
        ]);
        for mask in masks {
            let encoded = encode(&grid, mask).unwrap();
            assert_eq!(encoded.mask, mask);
            assert_eq!(decrypt(&encoded).unwrap(), grid, "mask {mask:?}");
        }
    }

    #[test]
    fn decrypt_preserves_shape() {
        let data = vec![vec![1, 2, 3], vec![], vec![4]];
        let grid = decrypt(&payload(data, vec![6, 2])).unwrap();
        let shape: Vec<usize> = grid.rows.iter().map(Vec::len).collect();
        assert_eq!(shape, vec![3, 0, 1]);
    }
}
