//! Zhang–Shasha ordered tree edit distance with edit-script recovery.
//!
//! Costs are unit: removing or inserting a node costs 1, changing an old
//! node into a new node costs 0 when the caller's equality holds and 1
//! otherwise. The distance table is filled for every pair of key roots;
//! the mapping is then recovered by retracing forest distances from the
//! root pair, descending into subtree pairs where the optimum used them.

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::debug;

use crate::error::{AlignError, AlignResult};
use crate::tree::OrderedTree;

/// One node-level edit. Indices are post-order positions.
///
/// - `old` only: the old node was removed.
/// - `new` only: the new node was inserted.
/// - both: the old node was changed into the new node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct EditOp {
    pub old: Option<usize>,
    pub new: Option<usize>,
}

impl EditOp {
    pub fn is_remove(&self) -> bool {
        self.old.is_some() && self.new.is_none()
    }

    pub fn is_insert(&self) -> bool {
        self.old.is_none() && self.new.is_some()
    }

    pub fn is_change(&self) -> bool {
        self.old.is_some() && self.new.is_some()
    }
}

/// The minimal edit script between two trees and the node correspondence
/// it implies. Equal mapped pairs are in the correspondence but not in the
/// script.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Alignment {
    pub script: Vec<EditOp>,
    pub cost: usize,
    pub old_to_new: Vec<Option<usize>>,
    pub new_to_old: Vec<Option<usize>>,
}

impl Alignment {
    /// Mapped `(old, new)` pairs in old post-order.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.old_to_new
            .iter()
            .enumerate()
            .filter_map(|(old, new)| new.map(|new| (old, new)))
    }
}

const UNKNOWN: u8 = u8::MAX;

struct ZhangShasha<'a, A, B, F> {
    old: &'a OrderedTree<A>,
    new: &'a OrderedTree<B>,
    equal: F,
    l1: Vec<usize>,
    l2: Vec<usize>,
    /// Subtree distances, `old.len() x new.len()`.
    td: Vec<usize>,
    /// Change costs, filled lazily.
    costs: Vec<u8>,
}

impl<'a, A, B, F> ZhangShasha<'a, A, B, F>
where
    F: FnMut(&A, &B) -> bool,
{
    fn new(old: &'a OrderedTree<A>, new: &'a OrderedTree<B>, equal: F) -> Self {
        let cells = old.len() * new.len();
        Self {
            old,
            new,
            equal,
            l1: old.leftmost(),
            l2: new.leftmost(),
            td: vec![0; cells],
            costs: vec![UNKNOWN; cells],
        }
    }

    fn cell(&self, x: usize, y: usize) -> usize {
        x * self.new.len() + y
    }

    fn cost(&mut self, x: usize, y: usize) -> usize {
        let cell = self.cell(x, y);
        if self.costs[cell] == UNKNOWN {
            let same = (self.equal)(&self.old.nodes()[x].item, &self.new.nodes()[y].item);
            self.costs[cell] = u8::from(!same);
        }
        usize::from(self.costs[cell])
    }

    /// Forest distances between `l1[i]..=i` and `l2[j]..=j`, indexed by
    /// offsets shifted by one so that row and column 0 are empty forests.
    /// Updates the subtree table for every pair of whole subtrees met.
    fn forest_distance(&mut self, i: usize, j: usize) -> Vec<Vec<usize>> {
        let (li, lj) = (self.l1[i], self.l2[j]);
        let rows = i - li + 2;
        let cols = j - lj + 2;
        let mut fd = vec![vec![0usize; cols]; rows];
        for (rx, row) in fd.iter_mut().enumerate() {
            row[0] = rx;
        }
        for (ry, cell) in fd[0].iter_mut().enumerate() {
            *cell = ry;
        }

        for x in li..=i {
            let rx = x - li + 1;
            for y in lj..=j {
                let ry = y - lj + 1;
                let remove = fd[rx - 1][ry] + 1;
                let insert = fd[rx][ry - 1] + 1;
                if self.l1[x] == li && self.l2[y] == lj {
                    let change = fd[rx - 1][ry - 1] + self.cost(x, y);
                    let best = remove.min(insert).min(change);
                    fd[rx][ry] = best;
                    let cell = self.cell(x, y);
                    self.td[cell] = best;
                } else {
                    let subtree = fd[self.l1[x] - li][self.l2[y] - lj] + self.td[self.cell(x, y)];
                    fd[rx][ry] = remove.min(insert).min(subtree);
                }
            }
        }
        fd
    }

    fn backtrack(&mut self, i: usize, j: usize, pairs: &mut Vec<(usize, usize)>) {
        let fd = self.forest_distance(i, j);
        let (li, lj) = (self.l1[i], self.l2[j]);
        let mut rx = i - li + 1;
        let mut ry = j - lj + 1;

        while rx > 0 || ry > 0 {
            if rx > 0 && ry > 0 {
                let x = li + rx - 1;
                let y = lj + ry - 1;
                if self.l1[x] == li && self.l2[y] == lj {
                    if fd[rx][ry] == fd[rx - 1][ry - 1] + self.cost(x, y) {
                        pairs.push((x, y));
                        rx -= 1;
                        ry -= 1;
                        continue;
                    }
                } else {
                    let (sx, sy) = (self.l1[x] - li, self.l2[y] - lj);
                    if fd[rx][ry] == fd[sx][sy] + self.td[self.cell(x, y)] {
                        self.backtrack(x, y, pairs);
                        rx = sx;
                        ry = sy;
                        continue;
                    }
                }
            }
            if rx > 0 && fd[rx][ry] == fd[rx - 1][ry] + 1 {
                rx -= 1;
                continue;
            }
            debug_assert!(ry > 0, "forest distance table is inconsistent");
            ry -= 1;
        }
    }
}

fn key_roots(leftmost: &[usize]) -> Vec<usize> {
    let mut seen = vec![false; leftmost.len()];
    let mut roots = Vec::new();
    for index in (0..leftmost.len()).rev() {
        if !seen[leftmost[index]] {
            seen[leftmost[index]] = true;
            roots.push(index);
        }
    }
    roots.reverse();
    roots
}

/// Compute the minimal edit script turning `old` into `new`.
///
/// `equal` decides whether a mapped pair is a free match or a change.
/// With `timeout`, the wall-clock budget is checked between key-root pairs
/// and [`AlignError::TimedOut`] is returned once it is exceeded.
pub fn align<A, B, F>(
    old: &OrderedTree<A>,
    new: &OrderedTree<B>,
    equal: F,
    timeout: Option<Duration>,
) -> AlignResult<Alignment>
where
    F: FnMut(&A, &B) -> bool,
{
    let started = Instant::now();
    let mut pairs = Vec::new();

    if !old.is_empty() && !new.is_empty() {
        let mut zs = ZhangShasha::new(old, new, equal);
        let old_roots = key_roots(&zs.l1);
        let new_roots = key_roots(&zs.l2);

        for &i in &old_roots {
            for &j in &new_roots {
                if let Some(budget) = timeout {
                    let elapsed = started.elapsed();
                    if elapsed >= budget {
                        return Err(AlignError::TimedOut { elapsed });
                    }
                }
                zs.forest_distance(i, j);
            }
        }

        zs.backtrack(old.len() - 1, new.len() - 1, &mut pairs);
        pairs.sort_unstable();

        let mut alignment = Alignment {
            script: Vec::new(),
            cost: 0,
            old_to_new: vec![None; old.len()],
            new_to_old: vec![None; new.len()],
        };
        for &(x, y) in &pairs {
            alignment.old_to_new[x] = Some(y);
            alignment.new_to_old[y] = Some(x);
        }
        for x in 0..old.len() {
            match alignment.old_to_new[x] {
                None => alignment.script.push(EditOp { old: Some(x), new: None }),
                Some(y) if zs.cost(x, y) == 1 => alignment.script.push(EditOp { old: Some(x), new: Some(y) }),
                Some(_) => {}
            }
        }
        push_inserts(&mut alignment);
        alignment.cost = alignment.script.len();

        debug_assert_eq!(alignment.cost, zs.td[zs.cell(old.len() - 1, new.len() - 1)]);
        debug!(
            old = old.len(),
            new = new.len(),
            cost = alignment.cost,
            "aligned trees"
        );
        return Ok(alignment);
    }

    let mut alignment = Alignment {
        script: (0..old.len()).map(|x| EditOp { old: Some(x), new: None }).collect(),
        cost: 0,
        old_to_new: vec![None; old.len()],
        new_to_old: vec![None; new.len()],
    };
    push_inserts(&mut alignment);
    alignment.cost = alignment.script.len();
    Ok(alignment)
}

fn push_inserts(alignment: &mut Alignment) {
    let inserts: Vec<EditOp> = alignment
        .new_to_old
        .iter()
        .enumerate()
        .filter(|(_, old)| old.is_none())
        .map(|(y, _)| EditOp { old: None, new: Some(y) })
        .collect();
    alignment.script.extend(inserts);
}
