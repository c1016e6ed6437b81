//! Move detection over a correspondence map.
//!
//! The old indices, read in new order, form a permutation of the
//! corresponding items. Items on a longest increasing subsequence of that
//! permutation are unmoved; every other corresponding item moved up or
//! down relative to the nearest unmoved item before it.

use crate::correspondence::{CorrespondenceMap, Move};

/// Move tags for every new index of `map`. Empty if nothing corresponds.
pub fn compute_moves(map: &CorrespondenceMap) -> Vec<Move> {
    moves_from_targets(&map.new_to_old_targets())
}

/// Move tags from the old index of each new index (`None` for inserts).
pub fn moves_from_targets(new_to_old: &[Option<usize>]) -> Vec<Move> {
    let mapped: Vec<(usize, usize)> = new_to_old
        .iter()
        .enumerate()
        .filter_map(|(new, old)| old.map(|old| (new, old)))
        .collect();
    if mapped.is_empty() {
        return Vec::new();
    }

    let sequence: Vec<usize> = mapped.iter().map(|(_, old)| *old).collect();
    let mut unmoved = vec![false; new_to_old.len()];
    for position in longest_increasing_subsequence(&sequence) {
        unmoved[mapped[position].0] = true;
    }

    let mut latest_unmoved: Option<usize> = None;
    new_to_old
        .iter()
        .enumerate()
        .map(|(new, old)| match *old {
            None => Move::Unmoved,
            Some(old) if unmoved[new] => {
                latest_unmoved = Some(old);
                Move::Unmoved
            }
            Some(old) => match latest_unmoved {
                None => Move::Up,
                Some(anchor) if old > anchor => Move::Up,
                Some(_) => Move::Down,
            },
        })
        .collect()
}

/// Positions in `sequence` of a longest strictly increasing subsequence.
///
/// Patience sorting with binary search, O(n log n). Among several longest
/// subsequences the one completed first is returned.
pub fn longest_increasing_subsequence(sequence: &[usize]) -> Vec<usize> {
    // tails[k]: position of the smallest tail of an increasing run of length k + 1.
    let mut tails: Vec<usize> = Vec::new();
    let mut previous: Vec<Option<usize>> = vec![None; sequence.len()];
    let mut end = None;

    for (position, value) in sequence.iter().enumerate() {
        let length = tails.partition_point(|tail| sequence[*tail] < *value);
        previous[position] = length.checked_sub(1).map(|k| tails[k]);
        if length == tails.len() {
            tails.push(position);
            end = Some(position);
        } else {
            tails[length] = position;
        }
    }

    let mut result = Vec::with_capacity(tails.len());
    let mut cursor = end;
    while let Some(position) = cursor {
        result.push(position);
        cursor = previous[position];
    }
    result.reverse();
    result
}
