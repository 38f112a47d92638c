//! Bezier timing curves with fixed endpoints (0,0) and (1,1).
//!
//! Curves are stored as polynomial coefficients so a cached slot only has to solve
//! x(s) = progress and sample y(s).

use serde::{Deserialize, Serialize};

/// Memo key shared by every curve that degenerates to a straight line.
pub const IDENTITY_KEY: &str = "0,0,1,1";

const NEWTON_ITERATIONS: usize = 8;
const BISECTION_ITERATIONS: usize = 32;
const SOLVE_EPSILON: f64 = 1e-7;

/// Parameters written into an arena slot.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CurveParams {
    CubicBezier { x1: f64, y1: f64, x2: f64, y2: f64 },
    QuadraticBezier { x: f64, y: f64 },
}

impl CurveParams {
    pub fn cubic(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self::CubicBezier { x1, y1, x2, y2 }
    }

    pub fn quadratic(x: f64, y: f64) -> Self {
        Self::QuadraticBezier { x, y }
    }

    /// Control points on the diagonal produce y == x everywhere.
    #[inline]
    pub fn is_identity(&self) -> bool {
        match *self {
            CurveParams::CubicBezier { x1, y1, x2, y2 } => x1 == y1 && x2 == y2,
            CurveParams::QuadraticBezier { x, y } => x == y,
        }
    }

    /// Canonical string used to deduplicate memoized curves.
    pub fn memo_key(&self) -> String {
        if self.is_identity() {
            return IDENTITY_KEY.to_string();
        }
        match *self {
            CurveParams::CubicBezier { x1, y1, x2, y2 } => format!("{x1},{y1},{x2},{y2}"),
            CurveParams::QuadraticBezier { x, y } => format!("{x},{y}"),
        }
    }

    pub fn coefficients(&self) -> CurveCoefficients {
        match *self {
            CurveParams::CubicBezier { x1, y1, x2, y2 } => {
                let (ax, bx, cx) = cubic_coefficients(x1, x2);
                let (ay, by, cy) = cubic_coefficients(y1, y2);
                CurveCoefficients {
                    ax,
                    bx,
                    cx,
                    ay,
                    by,
                    cy,
                }
            }
            // B(s) = 2s(1-s)P1 + s^2, i.e. (1 - 2p)s^2 + 2p*s
            CurveParams::QuadraticBezier { x, y } => CurveCoefficients {
                ax: 0.0,
                bx: 1.0 - 2.0 * x,
                cx: 2.0 * x,
                ay: 0.0,
                by: 1.0 - 2.0 * y,
                cy: 2.0 * y,
            },
        }
    }
}

#[inline]
fn cubic_coefficients(p1: f64, p2: f64) -> (f64, f64, f64) {
    let c = 3.0 * p1;
    let b = 3.0 * (p2 - p1) - c;
    let a = 1.0 - c - b;
    (a, b, c)
}

/// Power-basis form of a unit curve: x(s) = ((ax*s + bx)*s + cx)*s, same for y.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CurveCoefficients {
    ax: f64,
    bx: f64,
    cx: f64,
    ay: f64,
    by: f64,
    cy: f64,
}

impl CurveCoefficients {
    #[inline]
    fn sample_x(&self, s: f64) -> f64 {
        ((self.ax * s + self.bx) * s + self.cx) * s
    }

    #[inline]
    fn sample_y(&self, s: f64) -> f64 {
        ((self.ay * s + self.by) * s + self.cy) * s
    }

    #[inline]
    fn sample_dx(&self, s: f64) -> f64 {
        (3.0 * self.ax * s + 2.0 * self.bx) * s + self.cx
    }

    /// Find s with x(s) == x. Newton first, bisection when the slope is too flat.
    fn solve_x(&self, x: f64) -> f64 {
        let mut s = x;
        for _ in 0..NEWTON_ITERATIONS {
            let err = self.sample_x(s) - x;
            if err.abs() < SOLVE_EPSILON {
                return s;
            }
            let d = self.sample_dx(s);
            if d.abs() < 1e-6 {
                break;
            }
            s -= err / d;
        }

        let mut lo = 0.0f64;
        let mut hi = 1.0f64;
        s = x;
        for _ in 0..BISECTION_ITERATIONS {
            let sx = self.sample_x(s);
            if (sx - x).abs() < SOLVE_EPSILON {
                break;
            }
            if sx < x {
                lo = s;
            } else {
                hi = s;
            }
            s = 0.5 * (lo + hi);
        }
        s
    }

    /// Eased amount for normalized progress (clamped to [0, 1] before solving).
    #[inline]
    pub fn ease(&self, progress: f64) -> f64 {
        let x = progress.clamp(0.0, 1.0);
        if x == 0.0 || x == 1.0 {
            return x;
        }
        self.sample_y(self.solve_x(x))
    }
}
