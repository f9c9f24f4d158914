// Copyright 2025 Lars Brubaker
// Winding rule behavior on nested and overlapping contours.

mod helpers;

use sweepfill::{Options, Tessellator, WindingRule};

const ALL_RULES: [WindingRule; 5] = [
    WindingRule::EvenOdd,
    WindingRule::NonZero,
    WindingRule::Positive,
    WindingRule::Negative,
    WindingRule::AbsGeqTwo,
];

fn triangles(winding_rule: WindingRule) -> Options {
    Options {
        winding_rule,
        ..Options::default()
    }
}

/// Three nested squares: outer 6x6 CCW, middle 4x4 CW, inner 2x2 CCW.
/// Winding numbers from outside in: 0, 1, 0, 1.
fn nested_squares(rule: WindingRule) -> Tessellator {
    let mut tess = Tessellator::new();
    tess.add_contour(2, &[-3.0, -3.0, 3.0, -3.0, 3.0, 3.0, -3.0, 3.0]);
    tess.add_contour(2, &[-2.0, -2.0, -2.0, 2.0, 2.0, 2.0, 2.0, -2.0]);
    tess.add_contour(2, &[-1.0, -1.0, 1.0, -1.0, 1.0, 1.0, -1.0, 1.0]);
    tess.tessellate(&triangles(rule)).expect("tessellation failed");
    tess
}

#[test]
fn even_odd_fills_ring_and_core() {
    let tess = nested_squares(WindingRule::EvenOdd);
    helpers::verify_valid_output(&tess);
    // Ring between outer and middle (36-16) plus the inner core (4).
    let area = helpers::total_area(&tess);
    assert!((area - 24.0).abs() < 0.05, "EvenOdd area {area}");
}

#[test]
fn nonzero_fills_same_as_even_odd_here() {
    let tess = nested_squares(WindingRule::NonZero);
    helpers::verify_valid_output(&tess);
    let area = helpers::total_area(&tess);
    assert!((area - 24.0).abs() < 0.05, "NonZero area {area}");
}

#[test]
fn positive_matches_nonzero_for_ccw_dominant_input() {
    let tess = nested_squares(WindingRule::Positive);
    helpers::verify_valid_output(&tess);
    let area = helpers::total_area(&tess);
    assert!((area - 24.0).abs() < 0.05, "Positive area {area}");
}

#[test]
fn negative_fills_nothing_for_ccw_dominant_input() {
    let tess = nested_squares(WindingRule::Negative);
    helpers::verify_valid_output(&tess);
    let area = helpers::total_area(&tess);
    assert!(area < 0.05, "Negative should fill nothing, got {area}");
}

#[test]
fn abs_geq_two_needs_double_cover() {
    // No region of the nested squares reaches |winding| >= 2.
    let tess = nested_squares(WindingRule::AbsGeqTwo);
    helpers::verify_valid_output(&tess);
    let area = helpers::total_area(&tess);
    assert!(area < 0.05, "AbsGeqTwo should fill nothing, got {area}");
}

#[test]
fn abs_geq_two_fills_overlap_of_two_squares() {
    let square = [0.0, 0.0, 4.0, 0.0, 4.0, 4.0, 0.0, 4.0];
    let mut tess = Tessellator::new();
    tess.add_contour(2, &square);
    tess.add_contour(2, &square);
    tess.tessellate(&triangles(WindingRule::AbsGeqTwo)).unwrap();
    let area = helpers::total_area(&tess);
    assert!((area - 16.0).abs() < 0.1, "doubled square area {area}");
}

#[test]
fn partially_overlapping_squares_nonzero_vs_abs_geq_two() {
    // Two 2x2 squares overlapping in a 1x1 region.
    let make = |rule| {
        let mut tess = Tessellator::new();
        tess.add_contour(2, &[0.0, 0.0, 2.0, 0.0, 2.0, 2.0, 0.0, 2.0]);
        tess.add_contour(2, &[1.0, 1.0, 3.0, 1.0, 3.0, 3.0, 1.0, 3.0]);
        tess.tessellate(&triangles(rule)).unwrap();
        helpers::total_area(&tess)
    };
    let union = make(WindingRule::NonZero);
    let overlap = make(WindingRule::AbsGeqTwo);
    assert!((union - 7.0).abs() < 0.05, "union area {union}");
    assert!((overlap - 1.0).abs() < 0.05, "overlap area {overlap}");
}

#[test]
fn every_rule_handles_self_intersecting_star() {
    let star = "350,75\n379,161\n469,161\n397,215\n423,301\n350,250\n277,301\n303,215\n231,161\n321,161";
    let mut counts = Vec::new();
    for rule in ALL_RULES {
        let tess = helpers::tessellate_text(star, &triangles(rule));
        helpers::verify_valid_output(&tess);
        counts.push((rule, tess.element_count()));
    }
    let odd = counts[0].1;
    let nonzero = counts[1].1;
    // EvenOdd excludes the pentagonal core, NonZero keeps it.
    assert!(
        odd <= nonzero,
        "EvenOdd ({odd}) should not exceed NonZero ({nonzero})"
    );
}

#[test]
fn winding_sum_consistency_between_rules() {
    // The union (NonZero) of the nested squares equals EvenOdd plus the
    // region with winding 0 between middle and inner; for this input both
    // fill the same set, and Positive agrees because every filled region
    // has winding exactly +1.
    let even_odd = helpers::total_area(&nested_squares(WindingRule::EvenOdd));
    let positive = helpers::total_area(&nested_squares(WindingRule::Positive));
    assert!((even_odd - positive).abs() < 0.05);
}
