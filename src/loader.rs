// Copyright 2025 Lars Brubaker
// License: MIT

//! Parser for the human-readable polygon description format: one point per
//! line as `x,y` or `x,y,z` (comma or whitespace separated), blank lines
//! separating contours. The tessellator itself only needs the resulting
//! contour list; this module exists so test assets and tooling share one
//! reader.

use crate::geom::{Point3, Real};

/// Parse a polygon description into contours. Lenient by design: tokens
/// that do not parse as numbers are skipped, a trailing contour without a
/// closing blank line is accepted, and a line with two coordinates gets
/// `z = 0`.
pub fn parse_contours(text: &str) -> Vec<Vec<Point3>> {
    let mut contours: Vec<Vec<Point3>> = Vec::new();
    let mut current: Vec<Point3> = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if !current.is_empty() {
                contours.push(std::mem::take(&mut current));
            }
            continue;
        }
        let nums: Vec<Real> = trimmed
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .filter_map(|s| s.parse::<Real>().ok())
            .collect();
        if nums.len() >= 2 {
            let z = if nums.len() >= 3 { nums[2] } else { 0.0 };
            current.push(Point3::new(nums[0], nums[1], z));
        }
    }
    if !current.is_empty() {
        contours.push(current);
    }
    contours
}
