// Copyright 2025 Lars Brubaker
// Output correctness: exact index sequences for reference inputs, area
// preservation, and index validity.

mod helpers;

use sweepfill::{Options, Tessellator, WindingRule};

fn triangles(winding_rule: WindingRule) -> Options {
    Options {
        winding_rule,
        ..Options::default()
    }
}

fn tessellate_single(contour: &[f32]) -> Tessellator {
    let mut tess = Tessellator::new();
    tess.add_contour(2, contour);
    tess.tessellate(&triangles(WindingRule::EvenOdd)).unwrap();
    tess
}

// --- Reference index sequences ---

#[test]
fn single_triangle_returns_input_order() {
    let tess = helpers::tessellate_text("0,0,0\n0,1,0\n1,1,0", &Options::default());
    assert_eq!(tess.element_count(), 1);
    assert_eq!(tess.elements(), &[0, 1, 2]);
    assert_eq!(tess.vertex_count(), 3);
}

#[test]
fn rectangle_splits_on_consistent_diagonal() {
    let tess = helpers::tessellate_text("50,50\n300,50\n300,200\n50,200", &Options::default());
    assert_eq!(tess.element_count(), 2);
    assert_eq!(tess.elements(), &[0, 1, 2, 1, 0, 3]);
}

// --- Area preservation ---

#[test]
fn area_unit_square() {
    let tess = tessellate_single(&[0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0]);
    let area = helpers::total_area(&tess);
    assert!((area - 1.0).abs() < 0.001, "unit square area {area}");
}

#[test]
fn area_unit_triangle() {
    let tess = tessellate_single(&[0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
    let area = helpers::total_area(&tess);
    assert!((area - 0.5).abs() < 0.001, "unit triangle area {area}");
}

#[test]
fn area_regular_hexagon() {
    use std::f32::consts::PI;
    let mut hex = Vec::new();
    for i in 0..6 {
        let angle = PI / 3.0 * i as f32;
        hex.push(angle.cos());
        hex.push(angle.sin());
    }
    let tess = tessellate_single(&hex);
    let expected = 3.0 * 3.0f32.sqrt() / 2.0;
    let area = helpers::total_area(&tess);
    assert!((area - expected).abs() < 0.01, "hexagon area {area}");
}

#[test]
fn area_square_with_hole() {
    let mut tess = Tessellator::new();
    tess.add_contour(2, &[0.0, 0.0, 3.0, 0.0, 3.0, 3.0, 0.0, 3.0]);
    // Hole wound the other way.
    tess.add_contour(2, &[1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 2.0, 1.0]);
    tess.tessellate(&triangles(WindingRule::Positive)).unwrap();

    assert_eq!(tess.element_count(), 8, "3x3 ring needs 8 triangles");
    helpers::verify_valid_output(&tess);
    let area = helpers::total_area(&tess);
    assert!((area - 8.0).abs() < 0.01, "ring area {area}");
}

#[test]
fn area_two_separate_triangles() {
    let mut tess = Tessellator::new();
    tess.add_contour(2, &[0.0, 0.0, 1.0, 0.0, 0.5, 1.0]);
    tess.add_contour(2, &[5.0, 5.0, 6.0, 5.0, 5.5, 6.0]);
    tess.tessellate(&triangles(WindingRule::Positive)).unwrap();
    let area = helpers::total_area(&tess);
    assert!((area - 1.0).abs() < 0.01, "two triangles area {area}");
    helpers::verify_valid_output(&tess);
}

// --- Index validity ---

#[test]
fn valid_indices_for_star() {
    let star = "350,75\n379,161\n469,161\n397,215\n423,301\n350,250\n277,301\n303,215\n231,161\n321,161";
    for rule in [
        WindingRule::EvenOdd,
        WindingRule::NonZero,
        WindingRule::Positive,
    ] {
        let tess = helpers::tessellate_text(star, &triangles(rule));
        helpers::verify_valid_output(&tess);
        assert!(tess.element_count() > 0, "{rule:?} produced nothing");
    }
}

#[test]
fn no_degenerate_triangles_for_clean_input() {
    let tess = tessellate_single(&[0.0, 0.0, 10.0, 0.0, 10.0, 10.0, 0.0, 10.0]);
    helpers::verify_no_degenerate_triangles(&tess, 1e-6);
}

#[test]
fn output_vertices_stay_within_input_bounds() {
    let tess = tessellate_single(&[10.0, 20.0, 50.0, 20.0, 50.0, 80.0, 10.0, 80.0]);
    for p in helpers::output_points(&tess) {
        assert!((10.0..=50.0).contains(&p.x), "x={} out of bounds", p.x);
        assert!((20.0..=80.0).contains(&p.y), "y={} out of bounds", p.y);
    }
}

#[test]
fn vertex_indices_map_back_to_input_order() {
    let tess = tessellate_single(&[0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0]);
    let indices = tess.vertex_indices();
    assert_eq!(indices.len(), tess.vertex_count());
    // A simple quad introduces no intersection vertices, so every output
    // vertex maps to one of the four inputs, each exactly once.
    let mut seen: Vec<u32> = indices.to_vec();
    seen.sort_unstable();
    assert_eq!(seen, vec![0, 1, 2, 3]);
}

#[test]
fn elements_length_matches_element_count() {
    let tess = tessellate_single(&[0.0, 0.0, 3.0, 0.0, 3.0, 3.0, 0.0, 3.0]);
    assert_eq!(tess.elements().len(), tess.element_count() * 3);
}

// --- Self-intersecting input ---

#[test]
fn bowtie_resolves_into_planar_triangles() {
    // Self-intersecting "bowtie": crossing point is not an input vertex.
    let mut tess = Tessellator::new();
    tess.add_contour(2, &[0.0, 0.0, 2.0, 2.0, 2.0, 0.0, 0.0, 2.0]);
    tess.tessellate(&triangles(WindingRule::EvenOdd)).unwrap();
    helpers::verify_valid_output(&tess);
    // Two opposing wings of area 1 each.
    let area = helpers::total_area(&tess);
    assert!((area - 2.0).abs() < 0.01, "bowtie area {area}");
    // The crossing introduced a vertex that maps to no input point.
    assert!(
        tess.vertex_indices().contains(&sweepfill::NO_VERTEX),
        "expected an intersection vertex"
    );
}
