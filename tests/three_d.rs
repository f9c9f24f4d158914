// Copyright 2025 Lars Brubaker
// Third-coordinate passthrough and off-plane projection.

mod helpers;

use approx::assert_relative_eq;
use sweepfill::{Options, Point3, Tessellator};

#[test]
fn z_rides_along_unmodified() {
    let tess = helpers::tessellate_text("50,50,10\n300,50,20\n300,200,5\n50,200,30", &Options::default());
    assert_eq!(tess.elements(), &[0, 1, 2, 1, 0, 3]);

    let mut got: Vec<(i32, i32, i32)> = helpers::output_points(&tess)
        .iter()
        .map(|p| (p.x as i32, p.y as i32, p.z as i32))
        .collect();
    got.sort_unstable();
    assert_eq!(
        got,
        vec![
            (50, 50, 10),
            (50, 200, 30),
            (300, 50, 20),
            (300, 200, 5)
        ]
    );
}

#[test]
fn polygon_in_vertical_plane_projects_across_x() {
    // All points share x = 5; the sweep must pick the x axis as normal.
    let mut tess = Tessellator::new();
    tess.add_contour_points(&[
        Point3::new(5.0, 0.0, 0.0),
        Point3::new(5.0, 4.0, 0.0),
        Point3::new(5.0, 4.0, 4.0),
        Point3::new(5.0, 0.0, 4.0),
    ]);
    tess.tessellate(&Options::default()).unwrap();

    assert_eq!(tess.element_count(), 2);
    for p in helpers::output_points(&tess) {
        assert_relative_eq!(p.x, 5.0);
    }
    // Projected area within the plane is preserved.
    let mut area = 0.0;
    for tri in tess.elements().chunks(3) {
        let pts = helpers::output_points(&tess);
        let (a, b, c) = (pts[tri[0] as usize], pts[tri[1] as usize], pts[tri[2] as usize]);
        area += helpers::triangle_area((a.y, a.z), (b.y, b.z), (c.y, c.z)).abs();
    }
    assert_relative_eq!(area, 16.0, epsilon = 1e-3);
}

#[test]
fn tilted_plane_triangulates_with_original_coordinates() {
    // A quad on the plane z = x + y.
    let quad = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(2.0, 0.0, 2.0),
        Point3::new(2.0, 2.0, 4.0),
        Point3::new(0.0, 2.0, 2.0),
    ];
    let (verts, indices) = Tessellator::triangulate_3d(&quad).unwrap();
    assert_eq!(indices.len(), 6);
    for v in &verts {
        assert_relative_eq!(v.z, v.x + v.y, epsilon = 1e-4);
    }
}

#[test]
fn triangulate_2d_helper_matches_facade() {
    let (verts, indices) =
        Tessellator::triangulate_2d(&[(50.0, 50.0), (300.0, 50.0), (300.0, 200.0), (50.0, 200.0)])
            .unwrap();
    assert_eq!(indices, vec![0, 1, 2, 1, 0, 3]);
    assert_eq!(verts.len(), 4);
    assert!(verts.iter().all(|v| v.z == 0.0));
}
