/**
 * SimReco
 * Copyright (C) 2018 Sebastian Schelter
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Candidate item with its score, used to find the top-n items via a binary heap.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct ScoredItem {
    pub index: u32,
    pub score: f64,
}

/// Better ranked items compare as smaller: higher scores first, ties broken by the lower
/// index. A max-heap of `ScoredItem`s therefore keeps the worst of the current top-n on top.
/// There is no total order on floating point numbers, incomparable scores count as a tie.
fn cmp_ranking(a: &ScoredItem, b: &ScoredItem) -> Ordering {
    match b.score.partial_cmp(&a.score) {
        Some(Ordering::Equal) | None => a.index.cmp(&b.index),
        Some(ordering) => ordering,
    }
}

impl Eq for ScoredItem {}

impl Ord for ScoredItem {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_ranking(self, other)
    }
}

impl PartialOrd for ScoredItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(cmp_ranking(self, other))
    }
}

/// The `n` best candidates, best first. Returns all candidates if there are fewer than `n`.
pub fn top_n<I>(candidates: I, n: usize) -> Vec<ScoredItem>
    where I: IntoIterator<Item = ScoredItem> {

    if n == 0 {
        return Vec::new();
    }

    let mut heap = BinaryHeap::with_capacity(n);

    for scored_item in candidates {
        if heap.len() < n {
            heap.push(scored_item);
        } else if let Some(mut top) = heap.peek_mut() {
            if scored_item < *top {
                *top = scored_item;
            }
        }
    }

    heap.into_sorted_vec()
}
