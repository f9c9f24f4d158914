// Copyright 2025 Lars Brubaker
// License: MIT

//! The sweep engine.
//!
//! One [`SweepContext`] owns everything a single run needs: the mesh being
//! rebuilt into a planar subdivision, the active-edge dictionary, the event
//! queue, and the region pool. Vertices are pulled in sweep order; edges
//! ending at the event are retired, edges starting there are inserted, and
//! any crossing discovered between newly adjacent edges splits both and
//! queues the intersection as a fresh event. Each active region accumulates
//! its winding number as it opens, so by the time the queue drains every
//! face knows whether it is interior.
//!
//! Degenerate input (coincident vertices, zero-length edges, edges passing
//! exactly through an event) is absorbed by merging: coincident events are
//! spliced together, and the splice checks snap almost-touching origins and
//! destinations onto one another instead of letting the dictionary order
//! wobble.

use crate::error::TessError;
use crate::geom::{
    chord_offset, chord_sign, intersect, intersection_coords, sweep_eq, sweep_leq, Pt,
};
use crate::mesh::{twin, HalfId, Mesh, VertId, FACE_HEAD, HALF_HEAD, NIL, VERT_HEAD};
use crate::order::{ActiveOrder, NodeId, HEAD as ORDER_HEAD};
use crate::pool::Pool;
use crate::queue::{EventQueue, SLOT_HEAP, SLOT_NONE};
use crate::winding::WindingRule;

type RegionId = u32;

/// The strip of plane between two adjacent active edges.
struct Region {
    /// Upper bounding edge, directed so its destination is the left end.
    up: HalfId,
    /// This region's node in the active-edge dictionary.
    node: NodeId,
    /// Winding number of the region itself.
    winding: i32,
    inside: bool,
    /// Marks the fake edges bounding the sweep at v = ±infinity.
    sentinel: bool,
    /// A bounding edge changed; re-check the neighbor relationships.
    dirty: bool,
    /// Upper edge is a placeholder spanning a right vertex, to be replaced
    /// once the real connecting edge is known.
    fix_upper: bool,
}

impl Default for Region {
    fn default() -> Self {
        Region {
            up: NIL,
            node: NIL,
            winding: 0,
            inside: false,
            sentinel: false,
            dirty: false,
            fix_upper: false,
        }
    }
}

/// Is the upper edge of `r1` at or below the upper edge of `r2` where the
/// sweep line currently stands? Active edges hold their destination to the
/// left of the event and their origin at or to the right of it, so the
/// event is a valid probe point for both.
fn region_leq(mesh: &Mesh, regions: &Pool<Region>, ev: Pt, r1: RegionId, r2: RegionId) -> bool {
    edge_pair_leq(mesh, ev, regions[r1].up, regions[r2].up)
}

fn edge_pair_leq(mesh: &Mesh, ev: Pt, e1: HalfId, e2: HalfId) -> bool {
    if e1 == NIL {
        return true;
    }
    if e2 == NIL {
        return false;
    }

    let e1_dst = mesh.dest_pt(e1);
    let e1_org = mesh.origin_pt(e1);
    let e2_dst = mesh.dest_pt(e2);
    let e2_org = mesh.origin_pt(e2);

    if sweep_eq(e1_dst, ev) {
        if sweep_eq(e2_dst, ev) {
            // Both edges end at the event; sort by the other endpoints.
            if sweep_leq(e1_org, e2_org) {
                return chord_sign(e2_dst, e1_org, e2_org) <= 0.0;
            }
            return chord_sign(e1_dst, e2_org, e1_org) >= 0.0;
        }
        return chord_sign(e2_dst, ev, e2_org) <= 0.0;
    }
    if sweep_eq(e2_dst, ev) {
        return chord_sign(e1_dst, ev, e1_org) >= 0.0;
    }

    chord_offset(e1_dst, ev, e1_org) >= chord_offset(e2_dst, ev, e2_org)
}

pub(crate) struct SweepContext {
    mesh: Mesh,
    rule: WindingRule,
    order: ActiveOrder,
    queue: EventQueue,
    regions: Pool<Region>,
    event: VertId,
    event_pt: Pt,
}

impl SweepContext {
    pub fn new(mesh: Mesh, rule: WindingRule) -> Self {
        SweepContext {
            mesh,
            rule,
            order: ActiveOrder::new(),
            queue: EventQueue::new(),
            regions: Pool::new(),
            event: NIL,
            event_pt: Pt::default(),
        }
    }

    pub fn into_mesh(self) -> Mesh {
        self.mesh
    }

    /// Run the whole sweep. On return the mesh is a planar subdivision and
    /// every face's `inside` flag reflects the winding rule.
    pub fn run(&mut self) -> Result<(), TessError> {
        self.remove_degenerate_edges();
        self.init_queue();
        self.install_sentinels().ok_or(TessError::Resource)?;

        while let Some(v) = self.queue.pop() {
            // Fold vertices at identical positions into one event.
            while let Some(next_v) = self.queue.peek() {
                if !sweep_eq(self.mesh.pt(v), self.mesh.pt(next_v)) {
                    break;
                }
                let next_v = self.queue.pop().expect("peeked event");
                let a = self.mesh.vert(v).half;
                let b = self.mesh.vert(next_v).half;
                if a != NIL && b != NIL {
                    self.mesh.splice(a, b);
                }
            }
            self.process_event(v).ok_or(TessError::Resource)?;
        }

        self.teardown_dictionary();
        self.remove_degenerate_faces();
        Ok(())
    }

    // ── preparation ─────────────────────────────────────────────────────

    /// Delete zero-length edges and contours that collapsed to fewer than
    /// three edges before the sweep ever sees them.
    fn remove_degenerate_edges(&mut self) {
        let mut h = self.mesh.edge(HALF_HEAD).all_next;
        while h != HALF_HEAD {
            let mut h_next = self.mesh.edge(h).all_next;
            let mut h_loop = self.mesh.edge(h).next;

            let org = self.mesh.edge(h).origin;
            let dst = self.mesh.dest(h);
            if org != NIL
                && dst != NIL
                && sweep_eq(self.mesh.pt(org), self.mesh.pt(dst))
                && self.mesh.edge(h_loop).next != h
            {
                // Zero-length edge inside a loop that keeps three or more.
                self.mesh.splice(h_loop, h);
                self.mesh.remove_edge(h);
                h = h_loop;
                h_loop = self.mesh.edge(h).next;
            }

            if self.mesh.edge(h_loop).next == h {
                // One- or two-edge contour: delete it outright.
                if h_loop != h {
                    if h_loop == h_next || h_loop == twin(h_next) {
                        h_next = self.mesh.edge(h_next).all_next;
                    }
                    self.mesh.remove_edge(h_loop);
                }
                if h == h_next || h == twin(h_next) {
                    h_next = self.mesh.edge(h_next).all_next;
                }
                self.mesh.remove_edge(h);
            }

            h = h_next;
        }
    }

    fn init_queue(&mut self) {
        let mut events = Vec::new();
        let mut v = self.mesh.vert(VERT_HEAD).next;
        while v != VERT_HEAD {
            events.push((self.mesh.pt(v), v));
            v = self.mesh.vert(v).next;
        }
        self.queue.fill(events);
        for (slot, &(_, v)) in self.queue.sorted().iter().enumerate() {
            self.mesh.vert_mut(v).queue_slot = slot as i32;
        }
    }

    /// Two horizontal phantom edges far above and below the input bound the
    /// dictionary, so every real edge always has a neighbor on both sides.
    fn install_sentinels(&mut self) -> Option<()> {
        let mut first = true;
        let (mut umin, mut umax, mut vmin, mut vmax) = (0.0f32, 0.0f32, 0.0f32, 0.0f32);
        let mut v = self.mesh.vert(VERT_HEAD).next;
        while v != VERT_HEAD {
            let p = self.mesh.pt(v);
            if first {
                umin = p.u;
                umax = p.u;
                vmin = p.v;
                vmax = p.v;
                first = false;
            } else {
                umin = umin.min(p.u);
                umax = umax.max(p.u);
                vmin = vmin.min(p.v);
                vmax = vmax.max(p.v);
            }
            v = self.mesh.vert(v).next;
        }

        let w = (umax - umin) + 0.01;
        let h = (vmax - vmin) + 0.01;
        self.add_sentinel(umin - w, umax + w, vmin - h)?;
        self.add_sentinel(umin - w, umax + w, vmax + h)?;
        Some(())
    }

    fn add_sentinel(&mut self, umin: f32, umax: f32, at_v: f32) -> Option<()> {
        let e = self.mesh.make_edge()?;
        let org = self.mesh.edge(e).origin;
        let dst = self.mesh.dest(e);
        {
            let vx = self.mesh.vert_mut(org);
            vx.u = umax;
            vx.v = at_v;
        }
        {
            let vx = self.mesh.vert_mut(dst);
            vx.u = umin;
            vx.v = at_v;
        }
        // Seed the event position so the ordering predicate has an anchor.
        self.event = dst;
        self.event_pt = self.mesh.pt(dst);

        let reg = self.regions.insert(Region {
            up: e,
            sentinel: true,
            ..Region::default()
        });
        let node = self.insert_region_sorted(reg);
        self.regions[reg].node = node;
        self.mesh.edge_mut(e).region = reg;
        Some(())
    }

    fn teardown_dictionary(&mut self) {
        loop {
            let node = self.order.first();
            if node == ORDER_HEAD {
                break;
            }
            let key = self.order.key(node);
            self.drop_region(key);
        }
    }

    /// Fold each two-edge face left over from the sweep into its neighbor,
    /// carrying the winding across so boundary extraction stays honest.
    fn remove_degenerate_faces(&mut self) {
        let mut f = self.mesh.face(FACE_HEAD).next;
        while f != FACE_HEAD {
            let next = self.mesh.face(f).next;
            let e = self.mesh.face(f).half;
            if e != NIL && self.mesh.edge(self.mesh.edge(e).next).next == e {
                let ring = self.mesh.edge(e).ring;
                let w = self.mesh.edge(e).winding;
                let wt = self.mesh.edge(twin(e)).winding;
                self.mesh.edge_mut(ring).winding += w;
                self.mesh.edge_mut(twin(ring)).winding += wt;
                self.mesh.remove_edge(e);
            }
            f = next;
        }
    }

    // ── region bookkeeping ──────────────────────────────────────────────

    fn insert_region_sorted(&mut self, reg: RegionId) -> NodeId {
        let ev = self.event_pt;
        let Self {
            order,
            regions,
            mesh,
            ..
        } = self;
        order.insert(reg, |a, b| region_leq(mesh, regions, ev, a, b))
    }

    /// Region just above `reg` in the dictionary (NIL at the top sentinel).
    fn above(&self, reg: RegionId) -> RegionId {
        self.order.key(self.order.after(self.regions[reg].node))
    }

    fn below(&self, reg: RegionId) -> RegionId {
        self.order.key(self.order.before(self.regions[reg].node))
    }

    /// Open a new region whose upper edge is `up`, computing its winding
    /// from the region that ends up above it.
    fn open_region_below(&mut self, up: HalfId) -> RegionId {
        let reg = self.regions.insert(Region {
            up,
            ..Region::default()
        });
        let node = self.insert_region_sorted(reg);
        self.regions[reg].node = node;
        self.mesh.edge_mut(up).region = reg;
        self.compute_winding(reg);
        reg
    }

    fn compute_winding(&mut self, reg: RegionId) {
        let above = self.above(reg);
        let above_winding = if above != NIL {
            self.regions[above].winding
        } else {
            0
        };
        let up = self.regions[reg].up;
        let winding = above_winding + self.mesh.edge(up).winding;
        self.regions[reg].winding = winding;
        self.regions[reg].inside = self.rule.contains(winding);
    }

    fn drop_region(&mut self, reg: RegionId) {
        let up = self.regions[reg].up;
        if up != NIL {
            self.mesh.edge_mut(up).region = NIL;
        }
        let node = self.regions[reg].node;
        self.order.remove(node);
        self.regions.remove(reg);
    }

    /// Swap in the real upper edge for a placeholder.
    fn replace_upper_edge(&mut self, reg: RegionId, new_up: HalfId) {
        let old = self.regions[reg].up;
        if old != NIL {
            self.mesh.remove_edge(old);
        }
        let r = &mut self.regions[reg];
        r.fix_upper = false;
        r.up = new_up;
        self.mesh.edge_mut(new_up).region = reg;
    }

    /// The region is fully swept: stamp its inside flag onto its face and
    /// release it.
    fn retire_region(&mut self, reg: RegionId) {
        let up = self.regions[reg].up;
        if up != NIL {
            let face = self.mesh.edge(up).face;
            if face != NIL {
                let inside = self.regions[reg].inside;
                self.mesh.face_mut(face).inside = inside;
                self.mesh.face_mut(face).half = up;
            }
        }
        self.drop_region(reg);
    }

    /// Walk upward to the region just above the topmost region whose upper
    /// edge shares `reg`'s upper-edge origin, resolving a placeholder on
    /// the way if one caps the stack.
    fn upper_left_region(&mut self, reg: RegionId) -> RegionId {
        let org = {
            let up = self.regions[reg].up;
            if up == NIL {
                return NIL;
            }
            self.mesh.edge(up).origin
        };

        let mut r = reg;
        loop {
            r = self.above(r);
            if r == NIL {
                return NIL;
            }
            let up = self.regions[r].up;
            if up == NIL {
                return NIL;
            }
            if self.mesh.edge(up).origin != org {
                break;
            }
        }

        if self.regions[r].fix_upper {
            let below = self.below(r);
            if below == NIL {
                return NIL;
            }
            let below_up = self.regions[below].up;
            let r_up_next = self.mesh.edge(self.regions[r].up).next;
            let new_e = match self.mesh.connect(twin(below_up), r_up_next) {
                Some(e) => e,
                None => return NIL,
            };
            self.replace_upper_edge(r, new_e);
            r = self.above(r);
        }
        r
    }

    /// Same walk keyed by the shared destination.
    fn upper_right_region(&self, reg: RegionId) -> RegionId {
        let dst = {
            let up = self.regions[reg].up;
            if up == NIL {
                return NIL;
            }
            self.mesh.dest(up)
        };
        let mut r = reg;
        loop {
            r = self.above(r);
            if r == NIL {
                return NIL;
            }
            let up = self.regions[r].up;
            if up == NIL {
                return NIL;
            }
            if self.mesh.dest(up) != dst {
                break;
            }
        }
        r
    }

    // ── event processing ────────────────────────────────────────────────

    /// Retire the chain of regions whose upper edges all end at the current
    /// event, from `first` down to (not including) `last`; NIL for `last`
    /// means "until the chain breaks". Returns the last left-going edge
    /// seen, the anchor for attaching the event's right-going edges.
    fn close_left_regions(&mut self, first: RegionId, last: RegionId) -> HalfId {
        let mut reg_prev = first;
        let mut e_prev = self.regions[first].up;

        while reg_prev != last {
            self.regions[reg_prev].fix_upper = false;
            let reg = self.below(reg_prev);
            if reg == NIL {
                break;
            }
            let mut e = self.regions[reg].up;
            if e == NIL || e_prev == NIL {
                break;
            }

            if self.mesh.edge(e).origin != self.mesh.edge(e_prev).origin {
                if !self.regions[reg].fix_upper {
                    // The chain of edges ending here stops: finish off the
                    // last region and quit.
                    self.retire_region(reg_prev);
                    break;
                }
                // The placeholder below still spans this vertex; replace it
                // with a real edge ending at the event.
                let ep_lprev = self.mesh.lprev(e_prev);
                let new_e = match self.mesh.connect(ep_lprev, twin(e)) {
                    Some(ne) => ne,
                    None => return NIL,
                };
                self.replace_upper_edge(reg, new_e);
                e = new_e;
            }

            // Make sure e_prev and e sit next to each other in the origin
            // ring before the region between them is retired.
            if self.mesh.edge(e_prev).ring != e {
                let e_oprev = self.mesh.oprev(e);
                self.mesh.splice(e_oprev, e);
                self.mesh.splice(e_prev, e);
            }

            self.retire_region(reg_prev);
            e_prev = self.regions[reg].up;
            reg_prev = reg;
        }

        e_prev
    }

    /// Insert the right-going edges `first..last` (an origin-ring range) as
    /// new active regions below `reg_up`, fix up their winding, and merge
    /// any that turn out to be coincident.
    fn start_right_edges(
        &mut self,
        reg_up: RegionId,
        e_first: HalfId,
        e_last: HalfId,
        e_top_left: HalfId,
        clean_up: bool,
    ) {
        let mut e = e_first;
        loop {
            self.open_region_below(twin(e));
            e = self.mesh.edge(e).ring;
            if e == e_last {
                break;
            }
        }

        let e_top_left = if e_top_left == NIL {
            let below = self.below(reg_up);
            if below == NIL {
                return;
            }
            let below_up = self.regions[below].up;
            if below_up == NIL {
                return;
            }
            self.mesh.rprev(below_up)
        } else {
            e_top_left
        };

        let mut reg_prev = reg_up;
        let mut e_prev = e_top_left;
        let mut first_time = true;

        loop {
            let reg = self.below(reg_prev);
            if reg == NIL {
                break;
            }
            let up = self.regions[reg].up;
            if up == NIL {
                break;
            }
            let e = twin(up);
            if self.mesh.edge(e).origin != self.mesh.edge(e_prev).origin {
                break;
            }

            if self.mesh.edge(e).ring != e_prev {
                let e_oprev = self.mesh.oprev(e);
                self.mesh.splice(e_oprev, e);
                let ep_oprev = self.mesh.oprev(e_prev);
                self.mesh.splice(ep_oprev, e);
            }

            // Winding relative to the region above; edges are crossed
            // downward here, hence the subtraction.
            let winding = self.regions[reg_prev].winding - self.mesh.edge(e).winding;
            self.regions[reg].winding = winding;
            self.regions[reg].inside = self.rule.contains(winding);

            self.regions[reg_prev].dirty = true;
            if !first_time && self.check_right_splice(reg_prev) {
                // e and e_prev turned out to be the same edge: merge their
                // winding and drop the duplicate.
                let wp = self.mesh.edge(e_prev).winding;
                let wpt = self.mesh.edge(twin(e_prev)).winding;
                self.mesh.edge_mut(e).winding += wp;
                self.mesh.edge_mut(twin(e)).winding += wpt;
                self.drop_region(reg_prev);
                self.mesh.remove_edge(e_prev);
            }
            first_time = false;
            reg_prev = reg;
            e_prev = e;
        }

        self.regions[reg_prev].dirty = true;

        if clean_up {
            self.settle_dirty_regions(reg_prev);
        }
    }

    /// When two adjacent active edges' origins disagree about their
    /// vertical order near the event, snap the later origin onto the other
    /// edge (splitting it) or merge the coincident origins. Returns true
    /// if the topology changed.
    fn check_right_splice(&mut self, reg_up: RegionId) -> bool {
        let reg_lo = self.below(reg_up);
        if reg_lo == NIL {
            return false;
        }
        let e_up = self.regions[reg_up].up;
        let e_lo = self.regions[reg_lo].up;
        if e_up == NIL || e_lo == NIL {
            return false;
        }

        let up_org = self.mesh.edge(e_up).origin;
        let lo_org = self.mesh.edge(e_lo).origin;
        let up_org_pt = self.mesh.pt(up_org);
        let lo_org_pt = self.mesh.pt(lo_org);
        let up_dst_pt = self.mesh.dest_pt(e_up);
        let lo_dst_pt = self.mesh.dest_pt(e_lo);

        if sweep_leq(up_org_pt, lo_org_pt) {
            if chord_sign(lo_dst_pt, up_org_pt, lo_org_pt) > 0.0 {
                return false;
            }
            if !sweep_eq(up_org_pt, lo_org_pt) {
                // Splice e_up's origin into e_lo.
                if self.mesh.split_edge(twin(e_lo)).is_none() {
                    return false;
                }
                let e_lo_oprev = self.mesh.oprev(e_lo);
                self.mesh.splice(e_up, e_lo_oprev);
                self.regions[reg_up].dirty = true;
                self.regions[reg_lo].dirty = true;
            } else if up_org != lo_org {
                // Same position, distinct vertices: merge, discarding
                // e_up's origin (and its pending event).
                let slot = self.mesh.vert(up_org).queue_slot;
                self.queue.remove(up_org, slot);
                self.mesh.vert_mut(up_org).queue_slot = SLOT_NONE;
                let e_lo_oprev = self.mesh.oprev(e_lo);
                self.mesh.splice(e_lo_oprev, e_up);
            }
        } else {
            if chord_sign(up_dst_pt, lo_org_pt, up_org_pt) < 0.0 {
                return false;
            }
            // e_lo's origin sits above e_up: splice it in.
            let above = self.above(reg_up);
            if above != NIL {
                self.regions[above].dirty = true;
            }
            self.regions[reg_up].dirty = true;
            if self.mesh.split_edge(twin(e_up)).is_none() {
                return false;
            }
            let e_lo_oprev = self.mesh.oprev(e_lo);
            self.mesh.splice(e_lo_oprev, e_up);
        }
        true
    }

    /// Mirror of `check_right_splice` for the left (destination) ends of
    /// two adjacent active edges.
    fn check_left_splice(&mut self, reg_up: RegionId) -> bool {
        let reg_lo = self.below(reg_up);
        if reg_lo == NIL {
            return false;
        }
        let e_up = self.regions[reg_up].up;
        let e_lo = self.regions[reg_lo].up;
        if e_up == NIL || e_lo == NIL {
            return false;
        }

        let up_dst_pt = self.mesh.dest_pt(e_up);
        let lo_dst_pt = self.mesh.dest_pt(e_lo);
        if sweep_eq(up_dst_pt, lo_dst_pt) {
            return false;
        }
        let up_org_pt = self.mesh.origin_pt(e_up);
        let lo_org_pt = self.mesh.origin_pt(e_lo);

        if sweep_leq(up_dst_pt, lo_dst_pt) {
            if chord_sign(up_dst_pt, lo_dst_pt, up_org_pt) < 0.0 {
                return false;
            }
            // e_lo's destination is above e_up: split e_up there.
            let above = self.above(reg_up);
            if above != NIL {
                self.regions[above].dirty = true;
            }
            self.regions[reg_up].dirty = true;
            let new_e = match self.mesh.split_edge(e_up) {
                Some(e) => e,
                None => return false,
            };
            self.mesh.splice(twin(e_lo), new_e);
            let face = self.mesh.edge(new_e).face;
            if face != NIL {
                let inside = self.regions[reg_up].inside;
                self.mesh.face_mut(face).inside = inside;
            }
        } else {
            if chord_sign(lo_dst_pt, up_dst_pt, lo_org_pt) > 0.0 {
                return false;
            }
            // e_up's destination is below e_lo: split e_lo there.
            self.regions[reg_up].dirty = true;
            self.regions[reg_lo].dirty = true;
            let new_e = match self.mesh.split_edge(e_lo) {
                Some(e) => e,
                None => return false,
            };
            let e_up_next = self.mesh.edge(e_up).next;
            self.mesh.splice(e_up_next, twin(e_lo));
            let rface = self.mesh.rface(new_e);
            if rface != NIL {
                let inside = self.regions[reg_up].inside;
                self.mesh.face_mut(rface).inside = inside;
            }
        }
        true
    }

    /// Check two adjacent active edges for a genuine crossing. A crossing
    /// right of the event splits both edges and queues the intersection as
    /// a new vertex event; near-misses at endpoints degrade into the splice
    /// checks. Returns true when the caller's region stack was rebuilt and
    /// it should stop walking.
    fn check_intersect(&mut self, reg_up: RegionId) -> bool {
        let reg_lo = self.below(reg_up);
        if reg_lo == NIL {
            return false;
        }
        let e_up = self.regions[reg_up].up;
        let e_lo = self.regions[reg_lo].up;
        if e_up == NIL || e_lo == NIL {
            return false;
        }
        if self.regions[reg_up].fix_upper || self.regions[reg_lo].fix_upper {
            return false;
        }

        let up_org = self.mesh.edge(e_up).origin;
        let lo_org = self.mesh.edge(e_lo).origin;
        let up_dst = self.mesh.dest(e_up);
        let lo_dst = self.mesh.dest(e_lo);

        let ou = self.mesh.pt(up_org);
        let ol = self.mesh.pt(lo_org);
        let du = self.mesh.pt(up_dst);
        let dl = self.mesh.pt(lo_dst);
        let ev = self.event_pt;

        if sweep_eq(du, dl) {
            return false;
        }

        if ou.v.min(du.v) > ol.v.max(dl.v) {
            return false;
        }
        if sweep_leq(ou, ol) {
            if chord_sign(dl, ou, ol) > 0.0 {
                return false;
            }
        } else if chord_sign(du, ol, ou) < 0.0 {
            return false;
        }

        let mut at = intersect(du, ou, dl, ol);
        // Keep the intersection on or right of the sweep line, and left of
        // both right endpoints, whatever roundoff says.
        if sweep_leq(at, ev) {
            at = ev;
        }
        let org_min = if sweep_leq(ou, ol) { ou } else { ol };
        if sweep_leq(org_min, at) {
            at = org_min;
        }

        if sweep_eq(at, ou) || sweep_eq(at, ol) {
            // Grazes an origin: the splice check handles it exactly.
            self.check_right_splice(reg_up);
            return false;
        }

        let du_not_event = !sweep_eq(du, ev);
        let dl_not_event = !sweep_eq(dl, ev);
        if (du_not_event && chord_sign(du, ev, at) >= 0.0)
            || (dl_not_event && chord_sign(dl, ev, at) <= 0.0)
        {
            // The intersection lands on the wrong side of the event: the
            // edges already passed each other. Snap things onto the event
            // instead of creating an out-of-order event.
            if lo_dst == self.event {
                // The event is e_lo's left endpoint: splice it into e_up.
                if self.mesh.split_edge(twin(e_up)).is_none() {
                    return false;
                }
                let e_up2 = self.regions[reg_up].up;
                self.mesh.splice(twin(e_lo), e_up2);
                let reg_up2 = self.upper_left_region(reg_up);
                if reg_up2 == NIL {
                    return false;
                }
                let below = self.below(reg_up2);
                if below == NIL {
                    return false;
                }
                let e_up_new = self.regions[below].up;
                self.close_left_regions(below, reg_lo);
                let e_oprev = self.mesh.oprev(e_up_new);
                self.start_right_edges(reg_up2, e_oprev, e_up_new, e_up_new, true);
                return true;
            }
            if up_dst == self.event {
                // Symmetric case: event is e_up's left endpoint.
                if self.mesh.split_edge(twin(e_lo)).is_none() {
                    return false;
                }
                let e_up_next = self.mesh.edge(e_up).next;
                let e_lo_oprev = self.mesh.oprev(e_lo);
                self.mesh.splice(e_up_next, e_lo_oprev);
                let reg_lo2 = reg_up;
                let reg_up2 = self.upper_right_region(reg_up);
                if reg_up2 == NIL {
                    return false;
                }
                let below = self.below(reg_up2);
                if below == NIL {
                    return false;
                }
                let e_finish = self.mesh.rprev(self.regions[below].up);
                let new_lo_up = self.mesh.oprev(e_lo);
                self.regions[reg_lo2].up = new_lo_up;
                let e_bottom = self.close_left_regions(reg_lo2, NIL);
                if e_bottom == NIL {
                    return false;
                }
                let e_first = self.mesh.edge(e_bottom).ring;
                let e_last = self.mesh.rprev(e_up);
                self.start_right_edges(reg_up2, e_first, e_last, e_finish, true);
                return true;
            }
            // General near-miss: cut each offending edge at the event.
            if chord_sign(du, ev, at) >= 0.0 {
                let above = self.above(reg_up);
                if above != NIL {
                    self.regions[above].dirty = true;
                }
                self.regions[reg_up].dirty = true;
                if self.mesh.split_edge(twin(e_up)).is_none() {
                    return false;
                }
                let org = self.mesh.edge(self.regions[reg_up].up).origin;
                let vx = self.mesh.vert_mut(org);
                vx.u = ev.u;
                vx.v = ev.v;
            }
            if chord_sign(dl, ev, at) <= 0.0 {
                self.regions[reg_up].dirty = true;
                self.regions[reg_lo].dirty = true;
                if self.mesh.split_edge(twin(e_lo)).is_none() {
                    return false;
                }
                let org = self.mesh.edge(self.regions[reg_lo].up).origin;
                let vx = self.mesh.vert_mut(org);
                vx.u = ev.u;
                vx.v = ev.v;
            }
            return false;
        }

        // Genuine interior crossing: split both edges, merge the cut points
        // into one intersection vertex, and queue it as a future event.
        let org_up_coords = self.mesh.vert(up_org).coords;
        let dst_up_coords = self.mesh.vert(up_dst).coords;
        let org_lo_coords = self.mesh.vert(lo_org).coords;
        let dst_lo_coords = self.mesh.vert(lo_dst).coords;

        if self.mesh.split_edge(twin(e_up)).is_none() {
            return false;
        }
        if self.mesh.split_edge(twin(e_lo)).is_none() {
            return false;
        }
        let e_lo2 = self.regions[reg_lo].up;
        let e_up2 = self.regions[reg_up].up;
        let e_lo2_oprev = self.mesh.oprev(e_lo2);
        self.mesh.splice(e_lo2_oprev, e_up2);

        let isect = self.mesh.edge(e_up2).origin;
        {
            let coords = intersection_coords(
                at,
                (ou, org_up_coords),
                (du, dst_up_coords),
                (ol, org_lo_coords),
                (dl, dst_lo_coords),
            );
            let vx = self.mesh.vert_mut(isect);
            vx.u = at.u;
            vx.v = at.v;
            vx.coords = coords;
            vx.src_id = NIL;
            vx.queue_slot = SLOT_HEAP;
        }
        self.queue.push(at, isect);

        let above = self.above(reg_up);
        if above != NIL {
            self.regions[above].dirty = true;
        }
        self.regions[reg_up].dirty = true;
        self.regions[reg_lo].dirty = true;

        false
    }

    /// Re-establish the dictionary invariants around every region marked
    /// dirty, walking up and down until nothing changes: neighbors whose
    /// endpoints drifted get spliced, crossings get split, and coincident
    /// edges collapse into one.
    fn settle_dirty_regions(&mut self, reg_start: RegionId) {
        let mut reg_up = reg_start;
        let mut reg_lo = self.below(reg_up);

        loop {
            while reg_lo != NIL && self.regions[reg_lo].dirty {
                reg_up = reg_lo;
                reg_lo = self.below(reg_lo);
            }
            if !self.regions[reg_up].dirty {
                reg_lo = reg_up;
                reg_up = self.above(reg_up);
                if reg_up == NIL || !self.regions[reg_up].dirty {
                    return;
                }
            }

            self.regions[reg_up].dirty = false;
            if reg_lo == NIL {
                return;
            }
            let mut e_up = self.regions[reg_up].up;
            let mut e_lo = self.regions[reg_lo].up;
            if e_up == NIL || e_lo == NIL {
                continue;
            }

            if self.mesh.dest(e_up) != self.mesh.dest(e_lo) && self.check_left_splice(reg_up) {
                // A splice may have exposed a placeholder that is no longer
                // needed; retire it and re-anchor the walk.
                if self.regions[reg_lo].fix_upper {
                    let dead = self.regions[reg_lo].up;
                    self.drop_region(reg_lo);
                    if dead != NIL {
                        self.mesh.remove_edge(dead);
                    }
                    reg_lo = self.below(reg_up);
                    if reg_lo == NIL {
                        return;
                    }
                    e_lo = self.regions[reg_lo].up;
                } else if self.regions[reg_up].fix_upper {
                    let dead = self.regions[reg_up].up;
                    self.drop_region(reg_up);
                    if dead != NIL {
                        self.mesh.remove_edge(dead);
                    }
                    reg_up = self.above(reg_lo);
                    if reg_up == NIL {
                        return;
                    }
                    e_up = self.regions[reg_up].up;
                }
            }
            if e_up == NIL || e_lo == NIL {
                continue;
            }

            if self.mesh.edge(e_up).origin != self.mesh.edge(e_lo).origin {
                let dst_differ = self.mesh.dest(e_up) != self.mesh.dest(e_lo);
                let fixed = self.regions[reg_up].fix_upper || self.regions[reg_lo].fix_upper;
                let at_event = self.mesh.dest(e_up) == self.event
                    || self.mesh.dest(e_lo) == self.event;
                if dst_differ && !fixed && at_event {
                    if self.check_intersect(reg_up) {
                        return;
                    }
                } else {
                    self.check_right_splice(reg_up);
                }
            }

            let e_up2 = self.regions[reg_up].up;
            let e_lo2 = self.regions[reg_lo].up;
            if e_up2 != NIL
                && e_lo2 != NIL
                && self.mesh.edge(e_up2).origin == self.mesh.edge(e_lo2).origin
                && self.mesh.dest(e_up2) == self.mesh.dest(e_lo2)
            {
                // Two coincident edges: keep one, sum the winding.
                let w = self.mesh.edge(e_up2).winding;
                let wt = self.mesh.edge(twin(e_up2)).winding;
                self.mesh.edge_mut(e_lo2).winding += w;
                self.mesh.edge_mut(twin(e_lo2)).winding += wt;
                self.drop_region(reg_up);
                self.mesh.remove_edge(e_up2);
                reg_up = self.above(reg_lo);
                if reg_up == NIL {
                    return;
                }
            }
        }
    }

    /// The event has left-going edges but no right-going ones: it closes a
    /// chain without opening a new one. Bridge it rightward with a
    /// placeholder edge so the region structure stays connected; the
    /// placeholder is replaced when the real right neighbor shows up.
    fn handle_right_vertex(&mut self, reg_up: RegionId, e_bottom_left: HalfId) {
        let mut e_top_left = self.mesh.edge(e_bottom_left).ring;
        let mut e_bottom_left = e_bottom_left;
        let mut reg_up = reg_up;

        let reg_lo = self.below(reg_up);
        if reg_lo == NIL {
            return;
        }
        let e_up = self.regions[reg_up].up;
        let e_lo = self.regions[reg_lo].up;
        if e_up == NIL || e_lo == NIL {
            return;
        }

        if self.mesh.dest(e_up) != self.mesh.dest(e_lo) && self.check_intersect(reg_up) {
            return;
        }

        // The neighbors may graze the event exactly; merge before bridging.
        let mut degenerate = false;
        let reg_lo = self.below(reg_up);
        if reg_lo == NIL {
            return;
        }
        let e_up = self.regions[reg_up].up;
        if e_up == NIL {
            return;
        }

        if sweep_eq(self.mesh.origin_pt(e_up), self.event_pt) {
            let e_tl_oprev = self.mesh.oprev(e_top_left);
            self.mesh.splice(e_tl_oprev, e_up);
            reg_up = self.upper_left_region(reg_up);
            if reg_up == NIL {
                return;
            }
            let below = self.below(reg_up);
            if below == NIL {
                return;
            }
            e_top_left = self.regions[below].up;
            self.close_left_regions(below, reg_lo);
            degenerate = true;
        }

        let reg_lo2 = self.below(reg_up);
        if reg_lo2 == NIL {
            return;
        }
        let e_lo2 = self.regions[reg_lo2].up;
        if e_lo2 != NIL && sweep_eq(self.mesh.origin_pt(e_lo2), self.event_pt) {
            let e_lo_oprev = self.mesh.oprev(e_lo2);
            self.mesh.splice(e_bottom_left, e_lo_oprev);
            e_bottom_left = self.close_left_regions(reg_lo2, NIL);
            degenerate = true;
        }

        if degenerate {
            if e_bottom_left != NIL && e_top_left != NIL {
                let e_first = self.mesh.edge(e_bottom_left).ring;
                self.start_right_edges(reg_up, e_first, e_top_left, e_top_left, true);
            }
            return;
        }

        // Bridge to whichever neighbor's origin comes first.
        let e_up2 = self.regions[reg_up].up;
        let reg_lo3 = self.below(reg_up);
        if reg_lo3 == NIL || e_up2 == NIL {
            return;
        }
        let e_lo3 = self.regions[reg_lo3].up;
        if e_lo3 == NIL {
            return;
        }

        let target = if sweep_leq(self.mesh.origin_pt(e_lo3), self.mesh.origin_pt(e_up2)) {
            self.mesh.oprev(e_lo3)
        } else {
            e_up2
        };

        let e_bl_lprev = self.mesh.lprev(e_bottom_left);
        let e_new = match self.mesh.connect(e_bl_lprev, target) {
            Some(e) => e,
            None => return,
        };

        let e_new_ring = self.mesh.edge(e_new).ring;
        self.start_right_edges(reg_up, e_new, e_new_ring, e_new_ring, false);
        let placeholder = self.mesh.edge(twin(e_new)).region;
        if placeholder != NIL {
            self.regions[placeholder].fix_upper = true;
        }
        self.settle_dirty_regions(reg_up);
    }

    /// The event lies exactly on an active edge (or on one of its
    /// endpoints).
    fn handle_degenerate_left(&mut self, reg_up: RegionId, v_event: VertId) {
        let e = self.regions[reg_up].up;
        if e == NIL {
            return;
        }

        if sweep_eq(self.mesh.origin_pt(e), self.event_pt) {
            // The edge's origin is an unprocessed vertex at the same spot:
            // merge and let its own event do the connecting.
            let v_half = self.mesh.vert(v_event).half;
            if v_half != NIL {
                self.mesh.splice(e, v_half);
            }
            return;
        }

        if !sweep_eq(self.mesh.dest_pt(e), self.event_pt) {
            // The event splits the edge's interior.
            if self.mesh.split_edge(twin(e)).is_none() {
                return;
            }
            if self.regions[reg_up].fix_upper {
                // The unused stub of a placeholder has no business staying.
                let stub = self.mesh.edge(e).ring;
                self.mesh.remove_edge(stub);
                self.regions[reg_up].fix_upper = false;
            }
            let v_half = self.mesh.vert(v_event).half;
            if v_half != NIL {
                self.mesh.splice(v_half, e);
            }
            let _ = self.process_event(v_event);
            return;
        }

        // The event coincides with the (already processed) destination:
        // splice its right-going edges in next to the existing ones.
        let reg_up2 = self.upper_right_region(reg_up);
        if reg_up2 == NIL {
            return;
        }
        let reg = self.below(reg_up2);
        if reg == NIL {
            return;
        }
        let mut e_top_right = twin(self.regions[reg].up);
        let e_top_left = self.mesh.edge(e_top_right).ring;
        let e_last = e_top_left;
        if self.regions[reg].fix_upper {
            let dead = self.regions[reg].up;
            self.drop_region(reg);
            self.mesh.remove_edge(twin(dead));
            e_top_right = self.mesh.oprev(e_top_left);
        }
        let v_half = self.mesh.vert(v_event).half;
        if v_half != NIL {
            self.mesh.splice(v_half, e_top_right);
        }
        let e_top_left = if self.mesh.goes_left(e_top_left) {
            e_top_left
        } else {
            NIL
        };
        let e_first = self.mesh.edge(e_top_right).ring;
        self.start_right_edges(reg_up2, e_first, e_last, e_top_left, true);
    }

    /// First region (bottom up) whose upper edge is at or above `probe` at
    /// the current event, found with a throwaway probe region.
    fn locate_region(&mut self, probe: HalfId) -> RegionId {
        let tmp = self.regions.insert(Region {
            up: probe,
            ..Region::default()
        });
        let ev = self.event_pt;
        let node = {
            let Self {
                order,
                regions,
                mesh,
                ..
            } = self;
            order.search(tmp, |a, b| region_leq(mesh, regions, ev, a, b))
        };
        let found = self.order.key(node);
        self.regions.remove(tmp);
        found
    }

    /// The event has only right-going edges: it opens new regions inside
    /// whatever region currently contains it.
    fn handle_left_vertex(&mut self, v_event: VertId) {
        let an_edge = self.mesh.vert(v_event).half;
        if an_edge == NIL {
            return;
        }

        let reg_up = self.locate_region(twin(an_edge));
        if reg_up == NIL {
            return;
        }
        let reg_lo = self.below(reg_up);
        if reg_lo == NIL {
            return;
        }
        let e_up = self.regions[reg_up].up;
        let e_lo = self.regions[reg_lo].up;
        if e_up == NIL || e_lo == NIL {
            return;
        }

        if chord_sign(self.mesh.dest_pt(e_up), self.event_pt, self.mesh.origin_pt(e_up)) == 0.0 {
            self.handle_degenerate_left(reg_up, v_event);
            return;
        }

        // Connect to the rightmost already-processed vertex of whichever
        // bounding chain ends later.
        let reg = if sweep_leq(self.mesh.dest_pt(e_lo), self.mesh.dest_pt(e_up)) {
            reg_up
        } else {
            reg_lo
        };

        if self.regions[reg_up].inside || self.regions[reg].fix_upper {
            let e_new = if reg == reg_up {
                let e_up_next = self.mesh.edge(e_up).next;
                self.mesh.connect(twin(an_edge), e_up_next)
            } else {
                let e_lo_dnext = self.mesh.dnext(e_lo);
                self.mesh.connect(e_lo_dnext, an_edge).map(twin)
            };
            let e_new = match e_new {
                Some(e) => e,
                None => return,
            };

            if self.regions[reg].fix_upper {
                self.replace_upper_edge(reg, e_new);
            } else {
                self.open_region_below(e_new);
            }
            let _ = self.process_event(v_event);
        } else {
            // Outside the polygon: just add the new edges to the sweep.
            self.start_right_edges(reg_up, an_edge, an_edge, NIL, true);
        }
    }

    /// Process one vertex event.
    fn process_event(&mut self, v_event: VertId) -> Option<()> {
        self.event = v_event;
        self.event_pt = self.mesh.pt(v_event);

        let an_edge = self.mesh.vert(v_event).half;
        if an_edge == NIL {
            return Some(());
        }

        // Is any edge at this vertex already in the dictionary? If so the
        // event is the right endpoint of an active chain.
        let mut e = an_edge;
        let active = loop {
            if self.mesh.edge(e).region != NIL {
                break Some(e);
            }
            e = self.mesh.edge(e).ring;
            if e == an_edge {
                break None;
            }
        };

        let Some(e) = active else {
            self.handle_left_vertex(v_event);
            return Some(());
        };

        let reg_up = {
            let reg = self.mesh.edge(e).region;
            self.upper_left_region(reg)
        };
        if reg_up == NIL {
            return None;
        }
        let reg_below = self.below(reg_up);
        if reg_below == NIL {
            return Some(());
        }
        let e_top_left = self.regions[reg_below].up;
        let e_bottom_left = self.close_left_regions(reg_below, NIL);
        if e_bottom_left == NIL {
            return Some(());
        }

        let e_bl_ring = self.mesh.edge(e_bottom_left).ring;
        if e_bl_ring == e_top_left {
            // No new right-going edges at this vertex.
            self.handle_right_vertex(reg_up, e_bottom_left);
        } else {
            self.start_right_edges(reg_up, e_bl_ring, e_top_left, e_top_left, true);
        }
        Some(())
    }
}
