// Copyright 2025 Lars Brubaker
// License: MIT

//! The public tessellation facade.
//!
//! A [`Tessellator`] collects contours, runs the sweep pipeline on demand,
//! and exposes the resulting buffers. One instance is reusable: every
//! `tessellate` call consumes the loaded contours and leaves the instance
//! fresh, whether it succeeded or failed. Instances share nothing, so
//! independent instances can run on separate threads.

use crate::error::TessError;
use crate::geom::{Point3, Real};
use crate::mesh::{twin, FaceId, Mesh, VertId, FACE_HEAD, NIL, VERT_HEAD};
use crate::mono;
use crate::sweep::SweepContext;
use crate::winding::WindingRule;

/// Sentinel index padding element slots that have no vertex.
pub const NO_VERTEX: u32 = u32::MAX;

// Coordinates are kept small enough that f32 still resolves the splice
// tolerance arithmetic; anything larger is rejected as invalid input.
const MAX_COORD: Real = (1u32 << 23) as Real;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ElementType {
    /// Triangles, or n-gons up to `poly_size` vertices.
    Polygons,
    /// Closed loops tracing the filled region's boundary; each element is a
    /// `(first_vertex, vertex_count)` pair into the vertex buffer.
    BoundaryContours,
}

/// Configuration for one tessellation run.
#[derive(Copy, Clone, Debug)]
pub struct Options {
    pub winding_rule: WindingRule,
    pub element_type: ElementType,
    /// Maximum vertices per output element; at least 3.
    pub poly_size: usize,
    /// Drop output elements with fewer than three distinct vertices instead
    /// of padding them with [`NO_VERTEX`].
    pub no_empty_polygons: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            winding_rule: WindingRule::EvenOdd,
            element_type: ElementType::Polygons,
            poly_size: 3,
            no_empty_polygons: false,
        }
    }
}

pub struct Tessellator {
    mesh: Option<Mesh>,
    contour_count: usize,
    next_src_id: u32,
    pending_err: Option<TessError>,

    out_vertices: Vec<Real>,
    out_elements: Vec<u32>,
    out_vertex_indices: Vec<u32>,
    out_vertex_count: usize,
    out_element_count: usize,
}

impl Tessellator {
    pub fn new() -> Self {
        Tessellator {
            mesh: None,
            contour_count: 0,
            next_src_id: 0,
            pending_err: None,
            out_vertices: Vec::new(),
            out_elements: Vec::new(),
            out_vertex_indices: Vec::new(),
            out_vertex_count: 0,
            out_element_count: 0,
        }
    }

    /// Add one closed contour from a flat coordinate array with
    /// `coords_per_point` (2 or 3) components per point. The closing edge
    /// back to the first point is implicit.
    pub fn add_contour(&mut self, coords_per_point: usize, coords: &[Real]) {
        let size = coords_per_point.clamp(2, 3);
        let points: Vec<Point3> = coords
            .chunks_exact(size)
            .map(|c| Point3::new(c[0], c[1], if size > 2 { c[2] } else { 0.0 }))
            .collect();
        self.add_contour_points(&points);
    }

    /// Add one closed contour of points. Contours that collapse to fewer
    /// than three distinct points are discarded silently.
    pub fn add_contour_points(&mut self, points: &[Point3]) {
        if self.pending_err.is_some() {
            return;
        }
        for p in points {
            if !coord_ok(p.x) || !coord_ok(p.y) || !coord_ok(p.z) {
                self.pending_err = Some(TessError::InvalidInput(
                    "non-finite or out-of-range coordinate",
                ));
                return;
            }
        }

        // Collapse runs of duplicate points, including across the implicit
        // closing edge. Deliberately exact: sub-epsilon geometry (thin
        // quads) must reach the sweep, which merges coincident projected
        // vertices itself.
        let mut distinct: Vec<Point3> = Vec::with_capacity(points.len());
        for &p in points {
            match distinct.last() {
                Some(&last) if last == p => {}
                _ => distinct.push(p),
            }
        }
        while distinct.len() >= 2 && distinct.first() == distinct.last() {
            distinct.pop();
        }
        if distinct.len() < 3 {
            return;
        }

        let mesh = self.mesh.get_or_insert_with(Mesh::new);
        let mut e = NIL;
        for p in distinct {
            if e == NIL {
                e = match mesh.make_edge() {
                    Some(e) => e,
                    None => {
                        self.pending_err = Some(TessError::Resource);
                        return;
                    }
                };
                mesh.splice(e, twin(e));
            } else {
                if mesh.split_edge(e).is_none() {
                    self.pending_err = Some(TessError::Resource);
                    return;
                }
                e = mesh.edge(e).next;
            }

            let org = mesh.edge(e).origin;
            {
                let v = mesh.vert_mut(org);
                v.coords = p;
                v.src_id = self.next_src_id;
            }
            self.next_src_id += 1;

            mesh.edge_mut(e).winding = 1;
            mesh.edge_mut(twin(e)).winding = -1;
        }
        self.contour_count += 1;
    }

    /// Run the pipeline over the loaded contours. Consumes them: on return
    /// (success or failure) the instance is fresh and ready for new
    /// contours, with the result buffers retrievable until the next run.
    pub fn tessellate(&mut self, opts: &Options) -> Result<(), TessError> {
        let result = self.run(opts);
        self.reset_input();
        result
    }

    fn run(&mut self, opts: &Options) -> Result<(), TessError> {
        self.out_vertices.clear();
        self.out_elements.clear();
        self.out_vertex_indices.clear();
        self.out_vertex_count = 0;
        self.out_element_count = 0;

        if opts.poly_size < 3 {
            return Err(TessError::InvalidInput("element size must be at least 3"));
        }
        if let Some(err) = self.pending_err.take() {
            return Err(err);
        }
        let mut mesh = match self.mesh.take() {
            Some(m) if self.contour_count > 0 => m,
            _ => return Err(TessError::InvalidInput("no usable contours")),
        };

        project_to_sweep_plane(&mut mesh);

        let mut sweep = SweepContext::new(mesh, opts.winding_rule);
        sweep.run()?;
        let mut mesh = sweep.into_mesh();

        match opts.element_type {
            ElementType::BoundaryContours => {
                mesh.keep_boundary_edges(1);
                self.export_contours(&mesh);
            }
            ElementType::Polygons => {
                mono::triangulate_interior(&mut mesh).ok_or(TessError::Resource)?;
                if opts.poly_size > 3 {
                    mono::merge_convex_faces(&mut mesh, opts.poly_size);
                }
                self.export_polygons(&mut mesh, opts);
            }
        }
        Ok(())
    }

    fn reset_input(&mut self) {
        self.mesh = None;
        self.contour_count = 0;
        self.next_src_id = 0;
        self.pending_err = None;
    }

    // ── results ─────────────────────────────────────────────────────────

    /// Flat vertex buffer, three coordinates per vertex.
    pub fn vertices(&self) -> &[Real] {
        &self.out_vertices
    }

    /// Flat element buffer; interpretation depends on the element type.
    pub fn elements(&self) -> &[u32] {
        &self.out_elements
    }

    /// For each output vertex, its index in the input point order, or
    /// [`NO_VERTEX`] for vertices created at intersections.
    pub fn vertex_indices(&self) -> &[u32] {
        &self.out_vertex_indices
    }

    pub fn vertex_count(&self) -> usize {
        self.out_vertex_count
    }

    pub fn element_count(&self) -> usize {
        self.out_element_count
    }

    // ── one-shot helpers ────────────────────────────────────────────────

    /// Triangulate a single 2D contour with the default options.
    pub fn triangulate_2d(points: &[(Real, Real)]) -> Result<(Vec<Point3>, Vec<u32>), TessError> {
        let points: Vec<Point3> = points
            .iter()
            .map(|&(x, y)| Point3::new(x, y, 0.0))
            .collect();
        Self::triangulate_3d(&points)
    }

    /// Triangulate a single 3D contour with the default options.
    pub fn triangulate_3d(points: &[Point3]) -> Result<(Vec<Point3>, Vec<u32>), TessError> {
        let mut tess = Tessellator::new();
        tess.add_contour_points(points);
        tess.tessellate(&Options::default())?;
        let verts = tess
            .out_vertices
            .chunks_exact(3)
            .map(|c| Point3::new(c[0], c[1], c[2]))
            .collect();
        Ok((verts, tess.out_elements.clone()))
    }

    // ── output building ─────────────────────────────────────────────────

    fn export_polygons(&mut self, mesh: &mut Mesh, opts: &Options) {
        let mut v = mesh.vert(VERT_HEAD).next;
        while v != VERT_HEAD {
            mesh.vert_mut(v).out_id = NO_VERTEX;
            v = mesh.vert(v).next;
        }

        // First pass: number the vertices and faces that will be emitted.
        let mut n_verts = 0u32;
        let mut n_faces = 0u32;
        let mut f = mesh.face(FACE_HEAD).next;
        while f != FACE_HEAD {
            mesh.face_mut(f).out_id = NO_VERTEX;
            let emit = mesh.face(f).inside
                && !(opts.no_empty_polygons && distinct_face_verts(mesh, f) < 3);
            if emit {
                let start = mesh.face(f).half;
                let mut h = start;
                loop {
                    let org = mesh.edge(h).origin;
                    if mesh.vert(org).out_id == NO_VERTEX {
                        mesh.vert_mut(org).out_id = n_verts;
                        n_verts += 1;
                    }
                    h = mesh.edge(h).next;
                    if h == start {
                        break;
                    }
                }
                mesh.face_mut(f).out_id = n_faces;
                n_faces += 1;
            }
            f = mesh.face(f).next;
        }

        self.out_vertex_count = n_verts as usize;
        self.out_element_count = n_faces as usize;
        self.out_vertices = vec![0.0; n_verts as usize * 3];
        self.out_vertex_indices = vec![NO_VERTEX; n_verts as usize];
        self.out_elements = vec![NO_VERTEX; n_faces as usize * opts.poly_size];

        let mut v = mesh.vert(VERT_HEAD).next;
        while v != VERT_HEAD {
            let out = mesh.vert(v).out_id;
            if out != NO_VERTEX {
                let base = out as usize * 3;
                let c = mesh.vert(v).coords;
                self.out_vertices[base] = c.x;
                self.out_vertices[base + 1] = c.y;
                self.out_vertices[base + 2] = c.z;
                self.out_vertex_indices[out as usize] = mesh.vert(v).src_id;
            }
            v = mesh.vert(v).next;
        }

        let mut f = mesh.face(FACE_HEAD).next;
        while f != FACE_HEAD {
            let out = mesh.face(f).out_id;
            if out != NO_VERTEX {
                let mut ep = out as usize * opts.poly_size;
                let start = mesh.face(f).half;
                let mut h = start;
                loop {
                    let org = mesh.edge(h).origin;
                    self.out_elements[ep] = mesh.vert(org).out_id;
                    ep += 1;
                    h = mesh.edge(h).next;
                    if h == start {
                        break;
                    }
                }
                // Remaining slots stay NO_VERTEX padding.
            }
            f = mesh.face(f).next;
        }
    }

    fn export_contours(&mut self, mesh: &Mesh) {
        let mut total_verts = 0usize;
        let mut total_elems = 0usize;
        let mut f = mesh.face(FACE_HEAD).next;
        while f != FACE_HEAD {
            if mesh.face(f).inside {
                total_verts += mesh.face_len(f);
                total_elems += 1;
            }
            f = mesh.face(f).next;
        }

        self.out_vertex_count = total_verts;
        self.out_element_count = total_elems;
        self.out_vertices = vec![0.0; total_verts * 3];
        self.out_vertex_indices = vec![NO_VERTEX; total_verts];
        self.out_elements = vec![0; total_elems * 2];

        let mut vp = 0usize;
        let mut ep = 0usize;
        let mut start_vert = 0usize;
        let mut f = mesh.face(FACE_HEAD).next;
        while f != FACE_HEAD {
            if !mesh.face(f).inside {
                f = mesh.face(f).next;
                continue;
            }
            let start = mesh.face(f).half;
            let mut h = start;
            let mut count = 0usize;
            loop {
                let org = mesh.edge(h).origin;
                let c = mesh.vert(org).coords;
                self.out_vertices[vp * 3] = c.x;
                self.out_vertices[vp * 3 + 1] = c.y;
                self.out_vertices[vp * 3 + 2] = c.z;
                self.out_vertex_indices[vp] = mesh.vert(org).src_id;
                vp += 1;
                count += 1;
                h = mesh.edge(h).next;
                if h == start {
                    break;
                }
            }
            self.out_elements[ep] = start_vert as u32;
            self.out_elements[ep + 1] = count as u32;
            ep += 2;
            start_vert += count;
            f = mesh.face(f).next;
        }
    }
}

impl Default for Tessellator {
    fn default() -> Self {
        Self::new()
    }
}

fn coord_ok(c: Real) -> bool {
    c.is_finite() && (-MAX_COORD..=MAX_COORD).contains(&c)
}

fn distinct_face_verts(mesh: &Mesh, f: FaceId) -> usize {
    let start = mesh.face(f).half;
    let mut seen: Vec<VertId> = Vec::new();
    let mut h = start;
    loop {
        let org = mesh.edge(h).origin;
        if !seen.contains(&org) {
            seen.push(org);
        }
        h = mesh.edge(h).next;
        if h == start {
            break;
        }
    }
    seen.len()
}

// ── projection ──────────────────────────────────────────────────────────

/// Project every vertex onto the plane across the dominant normal axis and
/// flip the second coordinate if the signed area came out negative, so the
/// output winding mirrors the input contours' orientation.
fn project_to_sweep_plane(mesh: &mut Mesh) {
    let norm = compute_normal(mesh);

    let axis = long_axis(norm);
    let mut s_unit = [0.0; 3];
    let mut t_unit = [0.0; 3];
    s_unit[(axis + 1) % 3] = 1.0;
    t_unit[(axis + 2) % 3] = if norm.axis(axis) > 0.0 { 1.0 } else { -1.0 };

    let mut v = mesh.vert(VERT_HEAD).next;
    while v != VERT_HEAD {
        let c = mesh.vert(v).coords;
        let vx = mesh.vert_mut(v);
        vx.u = c.x * s_unit[0] + c.y * s_unit[1] + c.z * s_unit[2];
        vx.v = c.x * t_unit[0] + c.y * t_unit[1] + c.z * t_unit[2];
        v = mesh.vert(v).next;
    }

    fixup_orientation(mesh);
}

fn long_axis(v: Point3) -> usize {
    let mut i = 0;
    if v.y.abs() > v.x.abs() {
        i = 1;
    }
    if v.z.abs() > v.axis(i).abs() {
        i = 2;
    }
    i
}

fn short_axis(v: Point3) -> usize {
    let mut i = 0;
    if v.y.abs() < v.x.abs() {
        i = 1;
    }
    if v.z.abs() < v.axis(i).abs() {
        i = 2;
    }
    i
}

/// Pick the plane normal that maximizes the projected area: the longest
/// cross product of a diameter chord with any other vertex offset.
fn compute_normal(mesh: &Mesh) -> Point3 {
    let first = mesh.vert(VERT_HEAD).next;
    if first == VERT_HEAD {
        return Point3::new(0.0, 0.0, 1.0);
    }

    let mut min_val = [0.0; 3];
    let mut max_val = [0.0; 3];
    let mut min_vert = [first; 3];
    let mut max_vert = [first; 3];
    for i in 0..3 {
        let c = mesh.vert(first).coords.axis(i);
        min_val[i] = c;
        max_val[i] = c;
    }

    let mut v = mesh.vert(VERT_HEAD).next;
    while v != VERT_HEAD {
        for i in 0..3 {
            let c = mesh.vert(v).coords.axis(i);
            if c < min_val[i] {
                min_val[i] = c;
                min_vert[i] = v;
            }
            if c > max_val[i] {
                max_val[i] = c;
                max_vert[i] = v;
            }
        }
        v = mesh.vert(v).next;
    }

    let mut i = 0;
    if max_val[1] - min_val[1] > max_val[0] - min_val[0] {
        i = 1;
    }
    if max_val[2] - min_val[2] > max_val[i] - min_val[i] {
        i = 2;
    }
    if min_val[i] >= max_val[i] {
        // All points coincide; any plane will do.
        return Point3::new(0.0, 0.0, 1.0);
    }

    let d1 = mesh
        .vert(min_vert[i])
        .coords
        .sub(mesh.vert(max_vert[i]).coords);
    let mut norm = Point3::default();
    let mut max_len2 = 0.0;
    let mut v = mesh.vert(VERT_HEAD).next;
    while v != VERT_HEAD {
        let d2 = mesh.vert(v).coords.sub(mesh.vert(max_vert[i]).coords);
        let tn = d1.cross(d2);
        let len2 = tn.dot(tn);
        if len2 > max_len2 {
            max_len2 = len2;
            norm = tn;
        }
        v = mesh.vert(v).next;
    }

    if max_len2 <= 0.0 {
        // Degenerate (collinear) input: pick the axis with least spread.
        let mut n = [0.0; 3];
        n[short_axis(d1)] = 1.0;
        norm = Point3::new(n[0], n[1], n[2]);
    }
    norm
}

/// Sum the signed projected area of the positively wound contours; if it
/// comes out negative, mirror the v axis so they read counter-clockwise.
fn fixup_orientation(mesh: &mut Mesh) {
    let mut area = 0.0;
    let mut f = mesh.face(FACE_HEAD).next;
    while f != FACE_HEAD {
        let start = mesh.face(f).half;
        if start != NIL && mesh.edge(start).winding > 0 {
            let mut h = start;
            loop {
                let o = mesh.origin_pt(h);
                let d = mesh.dest_pt(h);
                area += (o.u - d.u) * (o.v + d.v);
                h = mesh.edge(h).next;
                if h == start {
                    break;
                }
            }
        }
        f = mesh.face(f).next;
    }
    if area < 0.0 {
        let mut v = mesh.vert(VERT_HEAD).next;
        while v != VERT_HEAD {
            let vx = mesh.vert_mut(v);
            vx.v = -vx.v;
            v = mesh.vert(v).next;
        }
    }
}
