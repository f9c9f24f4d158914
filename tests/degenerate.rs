// Copyright 2025 Lars Brubaker
// Degenerate and near-degenerate input must tessellate without panicking,
// for every winding rule, even when the result is visually meaningless.

mod helpers;

use sweepfill::{ElementType, Options, Tessellator, WindingRule};

const ALL_RULES: [WindingRule; 5] = [
    WindingRule::EvenOdd,
    WindingRule::NonZero,
    WindingRule::Positive,
    WindingRule::Negative,
    WindingRule::AbsGeqTwo,
];

fn run_all_rules(text: &str) {
    for rule in ALL_RULES {
        let mut tess = Tessellator::new();
        helpers::load_contours(&mut tess, text);
        let result = tess.tessellate(&Options {
            winding_rule: rule,
            ..Options::default()
        });
        if result.is_ok() {
            helpers::verify_valid_output(&tess);
        }
    }
}

#[test]
fn thin_quad_does_not_crash() {
    // Sub-ulp z extent; the projected edges are nearly coincident columns.
    run_all_rules(
        "9.5,7.5,-0.5\n9.5,2,-0.5\n9.5,2,-0.4999999701976776123\n9.5,7.5,-0.4999999701976776123",
    );
}

#[test]
fn nearly_coincident_x_coordinates_do_not_crash() {
    run_all_rules("0,0\n1e-7,10\n2e-7,0\n10,5");
}

#[test]
fn repeated_points_collapse_and_still_tessellate() {
    let mut tess = Tessellator::new();
    tess.add_contour(
        2,
        &[0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 1.0, 1.0, 1.0],
    );
    tess.tessellate(&Options::default()).unwrap();
    assert_eq!(tess.element_count(), 1);
    helpers::verify_valid_output(&tess);
}

#[test]
fn zero_area_spike_does_not_crash() {
    // A square with a zero-width spike folded into one edge.
    run_all_rules("0,0\n5,0\n5,2\n5,0\n5,5\n0,5");
}

#[test]
fn collinear_contour_does_not_crash() {
    run_all_rules("0,0\n1,0\n2,0\n3,0");
}

#[test]
fn duplicate_contours_every_rule() {
    let square = "0,0\n4,0\n4,4\n0,4";
    let doubled = format!("{square}\n\n{square}");
    run_all_rules(&doubled);
}

#[test]
fn coincident_vertical_slivers_every_mode() {
    let sliver = "1,0\n1,10\n1.0000001,10\n1.0000001,0";
    run_all_rules(sliver);
    for rule in ALL_RULES {
        let mut tess = Tessellator::new();
        helpers::load_contours(&mut tess, sliver);
        let _ = tess.tessellate(&Options {
            winding_rule: rule,
            element_type: ElementType::BoundaryContours,
            ..Options::default()
        });
    }
}

#[test]
fn float_extremes_fail_without_panic() {
    let mut tess = Tessellator::new();
    tess.add_contour(
        2,
        &[f32::MIN, f32::MIN, f32::MIN, f32::MAX, f32::MAX, f32::MAX],
    );
    assert!(tess.tessellate(&Options::default()).is_err());
}

#[test]
fn degenerate_xz_plane_polygon_with_suppression() {
    // A folded polygon lying in the y = 0 plane; suppression must leave no
    // sentinel padding behind.
    let mut tess = Tessellator::new();
    helpers::load_contours(&mut tess, "2,0,4\n2,0,2\n4,0,2\n4,0,0\n0,0,0\n0,0,4");
    tess.tessellate(&Options {
        no_empty_polygons: true,
        ..Options::default()
    })
    .unwrap();
    assert!(tess.elements().iter().all(|&i| i != sweepfill::NO_VERTEX));
    assert_eq!(tess.elements().len() % 3, 0);
    helpers::verify_valid_output(&tess);
    assert!(
        (3..=4).contains(&tess.element_count()),
        "hexagon fans into at most four triangles, got {}",
        tess.element_count()
    );
}
