use super::PixelPoint;

/// A 2D affine transform stored as a homogeneous 3x3 matrix (last row `0 0 1`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    m: [[f32; 3]; 3],
}

impl Default for Affine {
    fn default() -> Self {
        Self::identity()
    }
}

impl Affine {
    pub const fn identity() -> Self {
        Self {
            m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    pub const fn translate(dx: f32, dy: f32) -> Self {
        Self {
            m: [[1.0, 0.0, dx], [0.0, 1.0, dy], [0.0, 0.0, 1.0]],
        }
    }

    pub const fn scale(sx: f32, sy: f32) -> Self {
        Self {
            m: [[sx, 0.0, 0.0], [0.0, sy, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    /// Clockwise rotation in screen space (y points down).
    pub fn rotate_degrees(degrees: f32) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self {
            m: [[cos, -sin, 0.0], [sin, cos, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    pub fn skew_degrees(horizontal: f32, vertical: f32) -> Self {
        Self {
            m: [
                [1.0, horizontal.to_radians().tan(), 0.0],
                [vertical.to_radians().tan(), 1.0, 0.0],
                [0.0, 0.0, 1.0],
            ],
        }
    }

    /// `self` followed by `next`.
    pub fn then(&self, next: &Affine) -> Affine {
        Affine {
            m: multiply(&next.m, &self.m),
        }
    }

    pub fn map(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.m[0][0] * x + self.m[0][1] * y + self.m[0][2],
            self.m[1][0] * x + self.m[1][1] * y + self.m[1][2],
        )
    }

    pub fn map_point(&self, point: PixelPoint) -> PixelPoint {
        let (x, y) = self.map(point.x as f32, point.y as f32);
        PixelPoint::new(x.round() as i32, y.round() as i32)
    }

    /// `None` for a degenerate (non-invertible) transform.
    pub fn inverse(&self) -> Option<Affine> {
        let [[a, b, c], [d, e, f], _] = self.m;
        let det = a * e - b * d;
        if det.abs() < f32::EPSILON {
            return None;
        }

        let inv_det = 1.0 / det;
        Some(Affine {
            m: [
                [e * inv_det, -b * inv_det, (b * f - c * e) * inv_det],
                [-d * inv_det, a * inv_det, (c * d - a * f) * inv_det],
                [0.0, 0.0, 1.0],
            ],
        })
    }
}

/// `a * b`, so `b` is applied first.
fn multiply(a: &[[f32; 3]; 3], b: &[[f32; 3]; 3]) -> [[f32; 3]; 3] {
    std::array::from_fn(|i| std::array::from_fn(|j| (0..3).map(|k| a[i][k] * b[k][j]).sum()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_turn_maps_axes() {
        let rotate = Affine::rotate_degrees(90.0);
        let (x, y) = rotate.map(1.0, 0.0);
        assert!(x.abs() < 1e-5 && (y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn then_applies_in_order() {
        let t = Affine::translate(1.0, 0.0).then(&Affine::scale(10.0, 10.0));
        assert_eq!(t.map(0.0, 0.0), (10.0, 0.0));
        let t = Affine::scale(10.0, 10.0).then(&Affine::translate(1.0, 0.0));
        assert_eq!(t.map(0.0, 0.0), (1.0, 0.0));
    }

    #[test]
    fn inverse_undoes_transform() {
        let t = Affine::scale(2.0, 3.0)
            .then(&Affine::rotate_degrees(30.0))
            .then(&Affine::translate(5.0, -4.0));
        let inv = t.inverse().expect("invertible");
        let (x, y) = t.map(7.0, 11.0);
        let (bx, by) = inv.map(x, y);
        assert!((bx - 7.0).abs() < 1e-3 && (by - 11.0).abs() < 1e-3);
    }

    #[test]
    fn degenerate_has_no_inverse() {
        assert!(Affine::scale(0.0, 1.0).inverse().is_none());
    }
}
