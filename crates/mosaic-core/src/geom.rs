//! Plane geometry helpers on top of `kurbo`.

pub use kurbo::{CubicBez, Line, ParamCurve, Point, Rect, Size, Vec2};

/// Inclusive AABB overlap: rects that merely touch count as overlapping.
pub fn rect_overlaps(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && a.x1 >= b.x0 && a.y0 <= b.y1 && a.y1 >= b.y0
}

/// Inclusive point-in-rect test.
pub fn rect_contains(r: Rect, p: Point) -> bool {
    p.x >= r.x0 && p.x <= r.x1 && p.y >= r.y0 && p.y <= r.y1
}

/// Parametric segment intersection.
///
/// Parallel (and collinear) segments never intersect. Both parameters must
/// fall in `[0, 1]`.
pub fn segments_intersect(a: Line, b: Line) -> bool {
    let r = a.p1 - a.p0;
    let s = b.p1 - b.p0;
    let denom = r.cross(s);
    if denom == 0.0 {
        return false;
    }
    let qp = b.p0 - a.p0;
    let t = qp.cross(s) / denom;
    let u = qp.cross(r) / denom;
    (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u)
}

/// Whether any segment of polyline `a` crosses any segment of polyline `b`.
pub fn polylines_intersect(a: &[Point], b: &[Point]) -> bool {
    a.windows(2).any(|sa| {
        let la = Line::new(sa[0], sa[1]);
        b.windows(2)
            .any(|sb| segments_intersect(la, Line::new(sb[0], sb[1])))
    })
}
