// Copyright 2025 Lars Brubaker
// License: MIT

//! Triangulation of the winding-resolved mesh.
//!
//! After the sweep, every interior face is monotone in the sweep direction:
//! its boundary splits at the leftmost and rightmost vertices into an upper
//! and a lower chain. `triangulate_monotone` walks the two chains once,
//! emitting a fan of diagonals; `merge_convex_faces` is the reverse knob for
//! callers that want polygons larger than triangles.

use crate::geom::{chord_sign, sweep_leq};
use crate::mesh::{twin, FaceId, Mesh, FACE_HEAD, HALF_HEAD, NIL};

/// Fan one monotone interior face into triangles. Loops of fewer than three
/// edges are left alone (they carry no area and are dropped at output).
pub(crate) fn triangulate_monotone(mesh: &mut Mesh, face: FaceId) -> Option<()> {
    let mut up = mesh.face(face).half;
    if mesh.edge(up).next == up || mesh.edge(mesh.edge(up).next).next == up {
        return Some(());
    }

    // Move `up` to the right end of the loop: the edge whose origin is the
    // rightmost vertex in sweep order.
    while sweep_leq(mesh.dest_pt(up), mesh.origin_pt(up)) {
        up = mesh.lprev(up);
    }
    while sweep_leq(mesh.origin_pt(up), mesh.dest_pt(up)) {
        up = mesh.edge(up).next;
    }

    let mut lo = mesh.lprev(up);

    while mesh.edge(up).next != lo {
        if sweep_leq(mesh.dest_pt(up), mesh.origin_pt(lo)) {
            // up's destination is the leftward vertex: fan from lo's origin
            // back along the lower chain while the corner stays convex.
            while mesh.edge(lo).next != up {
                let lo_next = mesh.edge(lo).next;
                let turn = chord_sign(
                    mesh.origin_pt(lo),
                    mesh.dest_pt(lo),
                    mesh.dest_pt(lo_next),
                );
                if !mesh.goes_left(lo_next) && turn > 0.0 {
                    break;
                }
                let diag = mesh.connect(lo_next, lo)?;
                lo = twin(diag);
            }
            lo = mesh.lprev(lo);
        } else {
            // Mirror case along the upper chain.
            while mesh.edge(lo).next != up {
                let up_prev = mesh.lprev(up);
                let turn = chord_sign(
                    mesh.dest_pt(up),
                    mesh.origin_pt(up),
                    mesh.origin_pt(up_prev),
                );
                if !mesh.goes_right(up_prev) && turn < 0.0 {
                    break;
                }
                let diag = mesh.connect(up, up_prev)?;
                up = twin(diag);
            }
            up = mesh.edge(up).next;
        }
    }

    // Whatever remains is a fan from the leftmost vertex.
    while mesh.edge(mesh.edge(lo).next).next != up {
        let lo_next = mesh.edge(lo).next;
        let diag = mesh.connect(lo_next, lo)?;
        lo = twin(diag);
    }

    Some(())
}

/// Triangulate every interior face. Faces created mid-pass inherit the
/// interior flag, so the output numbering sees them.
pub(crate) fn triangulate_interior(mesh: &mut Mesh) -> Option<()> {
    let mut f = mesh.face(FACE_HEAD).next;
    while f != FACE_HEAD {
        let next = mesh.face(f).next;
        if mesh.face(f).inside {
            triangulate_monotone(mesh, f)?;
        }
        f = next;
    }
    Some(())
}

/// Merge adjacent interior faces across shared edges wherever the merged
/// loop stays convex and within `bound` vertices.
pub(crate) fn merge_convex_faces(mesh: &mut Mesh, bound: usize) {
    let mut h = mesh.edge(HALF_HEAD).all_next;
    while h != HALF_HEAD {
        let next = mesh.edge(h).all_next;
        let lf = mesh.edge(h).face;
        let rf = mesh.rface(h);

        let both_interior = lf != NIL
            && mesh.face(lf).inside
            && rf != NIL
            && mesh.face(rf).inside;
        if !both_interior {
            h = next;
            continue;
        }

        // Removing the shared edge drops two loop slots.
        if mesh.face_len(lf) + mesh.face_len(rf) - 2 > bound {
            h = next;
            continue;
        }

        if mesh.merge_keeps_convex(h) {
            let after = if h == next || h == twin(next) {
                mesh.edge(next).all_next
            } else {
                next
            };
            mesh.remove_edge(h);
            h = after;
            continue;
        }

        h = next;
    }
}
