// Copyright 2025 Lars Brubaker
// License: MIT

//! The sweep's event queue.
//!
//! Two stores back it: the initial vertices, known up front, live in a
//! pre-sorted array consumed front to back; intersection vertices discovered
//! mid-sweep go into a binary heap. The minimum across both sides is served
//! in sweep order. Removal (vertices merged away before their event fires)
//! tombstones the entry in place.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::collections::HashSet;

use crate::geom::{sweep_leq, Pt};
use crate::mesh::{VertId, NIL};

/// Queue handle stored on a vertex: a non-negative index into the sorted
/// array, [`SLOT_HEAP`] for heap entries, [`SLOT_NONE`] when not queued.
pub(crate) const SLOT_HEAP: i32 = -1;
pub(crate) const SLOT_NONE: i32 = -2;

struct Entry {
    pt: Pt,
    seq: u32,
    vert: VertId,
}

impl Ord for Entry {
    fn cmp(&self, o: &Self) -> Ordering {
        self.pt
            .u
            .total_cmp(&o.pt.u)
            .then(self.pt.v.total_cmp(&o.pt.v))
            .then(self.seq.cmp(&o.seq))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, o: &Self) -> Option<Ordering> {
        Some(self.cmp(o))
    }
}

impl PartialEq for Entry {
    fn eq(&self, o: &Self) -> bool {
        self.cmp(o) == Ordering::Equal
    }
}

impl Eq for Entry {}

pub(crate) struct EventQueue {
    sorted: Vec<(Pt, VertId)>,
    cursor: usize,
    heap: BinaryHeap<Reverse<Entry>>,
    dead: HashSet<VertId>,
    seq: u32,
}

impl EventQueue {
    pub fn new() -> Self {
        EventQueue {
            sorted: Vec::new(),
            cursor: 0,
            heap: BinaryHeap::new(),
            dead: HashSet::new(),
            seq: 0,
        }
    }

    /// Install the initial event set. Sorts into sweep order; the caller
    /// reads the final slot of each vertex back via [`sorted`](Self::sorted).
    pub fn fill(&mut self, mut events: Vec<(Pt, VertId)>) {
        events.sort_unstable_by(|a, b| {
            if sweep_leq(a.0, b.0) {
                Ordering::Less
            } else {
                Ordering::Greater
            }
        });
        self.sorted = events;
        self.cursor = 0;
    }

    pub fn sorted(&self) -> &[(Pt, VertId)] {
        &self.sorted
    }

    /// Queue an intersection vertex discovered mid-sweep.
    pub fn push(&mut self, pt: Pt, vert: VertId) {
        let seq = self.seq;
        self.seq += 1;
        self.heap.push(Reverse(Entry { pt, seq, vert }));
    }

    /// Remove a queued vertex by its stored slot.
    pub fn remove(&mut self, vert: VertId, slot: i32) {
        if slot >= 0 {
            self.sorted[slot as usize].1 = NIL;
        } else if slot == SLOT_HEAP {
            self.dead.insert(vert);
        }
    }

    fn skim_heap(&mut self) {
        while let Some(Reverse(top)) = self.heap.peek() {
            if self.dead.remove(&top.vert) {
                self.heap.pop();
            } else {
                break;
            }
        }
    }

    fn sorted_min(&self) -> Option<(usize, Pt, VertId)> {
        let mut at = self.cursor;
        while at < self.sorted.len() {
            let (pt, v) = self.sorted[at];
            if v != NIL {
                return Some((at, pt, v));
            }
            at += 1;
        }
        None
    }

    /// The next event in sweep order, without consuming it.
    pub fn peek(&mut self) -> Option<VertId> {
        self.skim_heap();
        let s = self.sorted_min();
        let h = self.heap.peek().map(|Reverse(e)| (e.pt, e.vert));
        match (s, h) {
            (None, None) => None,
            (Some((_, _, v)), None) => Some(v),
            (None, Some((_, v))) => Some(v),
            (Some((_, spt, sv)), Some((hpt, hv))) => {
                if sweep_leq(spt, hpt) {
                    Some(sv)
                } else {
                    Some(hv)
                }
            }
        }
    }

    /// Consume and return the next event in sweep order.
    pub fn pop(&mut self) -> Option<VertId> {
        self.skim_heap();
        let s = self.sorted_min();
        let h = self.heap.peek().map(|Reverse(e)| (e.pt, e.vert));
        let take_sorted = match (s, h) {
            (None, None) => return None,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (Some((_, spt, _)), Some((hpt, _))) => sweep_leq(spt, hpt),
        };
        if take_sorted {
            let (at, _, v) = s.unwrap();
            self.cursor = at + 1;
            Some(v)
        } else {
            self.heap.pop().map(|Reverse(e)| e.vert)
        }
    }
}
