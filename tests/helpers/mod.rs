// Copyright 2025 Lars Brubaker
// Shared utilities for the integration tests.

#![allow(dead_code)]

use sweepfill::loader::parse_contours;
use sweepfill::{Options, Point3, Tessellator, NO_VERTEX};

/// Parse a `.dat` polygon description and load every contour.
pub fn load_contours(tess: &mut Tessellator, text: &str) {
    for contour in parse_contours(text) {
        tess.add_contour_points(&contour);
    }
}

/// Tessellate a `.dat` description with the given options.
pub fn tessellate_text(text: &str, opts: &Options) -> Tessellator {
    let mut tess = Tessellator::new();
    load_contours(&mut tess, text);
    tess.tessellate(opts).expect("tessellation failed");
    tess
}

pub fn triangle_area(a: (f32, f32), b: (f32, f32), c: (f32, f32)) -> f32 {
    0.5 * ((b.0 - a.0) * (c.1 - a.1) - (c.0 - a.0) * (b.1 - a.1))
}

fn vertex_xy(tess: &Tessellator, index: u32) -> (f32, f32) {
    let base = index as usize * 3;
    (tess.vertices()[base], tess.vertices()[base + 1])
}

/// Total absolute area of a triangle-element result. Padded slots make a
/// triangle degenerate only if the caller let them; sentinel triples are
/// skipped.
pub fn total_area(tess: &Tessellator) -> f32 {
    let mut total = 0.0;
    for tri in tess.elements().chunks(3) {
        if tri.len() < 3 || tri.iter().any(|&i| i == NO_VERTEX) {
            continue;
        }
        let a = vertex_xy(tess, tri[0]);
        let b = vertex_xy(tess, tri[1]);
        let c = vertex_xy(tess, tri[2]);
        total += triangle_area(a, b, c).abs();
    }
    total
}

/// Every coordinate finite, every non-sentinel index within the vertex
/// count.
pub fn verify_valid_output(tess: &Tessellator) {
    for (i, &c) in tess.vertices().iter().enumerate() {
        assert!(c.is_finite(), "vertex component [{i}] = {c} is not finite");
    }
    for (i, &idx) in tess.elements().iter().enumerate() {
        if idx == NO_VERTEX {
            continue;
        }
        assert!(
            (idx as usize) < tess.vertex_count(),
            "element[{i}] = {idx} out of range (vertex_count={})",
            tess.vertex_count()
        );
    }
    assert_eq!(tess.vertex_indices().len(), tess.vertex_count());
}

/// No triangle in the output may have (absolute) area at or below `eps`.
pub fn verify_no_degenerate_triangles(tess: &Tessellator, eps: f32) {
    for (i, tri) in tess.elements().chunks(3).enumerate() {
        if tri.len() < 3 || tri.iter().any(|&x| x == NO_VERTEX) {
            continue;
        }
        let a = vertex_xy(tess, tri[0]);
        let b = vertex_xy(tess, tri[1]);
        let c = vertex_xy(tess, tri[2]);
        let area = triangle_area(a, b, c).abs();
        assert!(area > eps, "triangle {i} is degenerate (area={area})");
    }
}

/// All output vertices as `Point3`, in buffer order.
pub fn output_points(tess: &Tessellator) -> Vec<Point3> {
    tess.vertices()
        .chunks_exact(3)
        .map(|c| Point3::new(c[0], c[1], c[2]))
        .collect()
}
