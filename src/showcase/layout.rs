//! Horizontal placement of slots.
//!
//! Slots are laid out on the x axis by request index. After the first slot
//! `gap` empty positions are skipped, so with the defaults slot 0 stands alone
//! on the left and the others form a group to its right.

/// Position index on the row after the gap has been inserted.
pub fn offset_index(index: usize, gap: usize) -> usize {
    if index >= 1 { index + gap } else { index }
}

/// x coordinate of the slot with request index `index` out of `count`.
///
/// The row starts at `-(count * spacing) / 2`. The gap is not part of the row
/// width, so the row is not centred on the origin when `gap > 0`.
pub fn slot_position_x(index: usize, count: usize, spacing: f32, gap: usize) -> f32 {
    offset_index(index, gap) as f32 * spacing - (count as f32 * spacing) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_slot_has_no_offset() {
        assert_eq!(offset_index(0, 1), 0);
        assert_eq!(offset_index(1, 1), 2);
        assert_eq!(offset_index(3, 1), 4);
    }

    #[test]
    fn four_slots_with_spacing_ten() {
        let xs: Vec<f32> = (0..4).map(|i| slot_position_x(i, 4, 10.0, 1)).collect();
        assert_eq!(xs, vec![-20.0, 0.0, 10.0, 20.0]);
    }

    #[test]
    fn without_gap_the_row_is_contiguous() {
        let xs: Vec<f32> = (0..3).map(|i| slot_position_x(i, 3, 2.0, 0)).collect();
        assert_eq!(xs, vec![-3.0, -1.0, 1.0]);
    }

    #[test]
    fn single_slot() {
        assert_eq!(slot_position_x(0, 1, 10.0, 1), -5.0);
    }
}
