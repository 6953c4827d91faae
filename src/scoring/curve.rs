use super::config::{CurveConfig, CurveKind};
use crate::event::RankFacts;

const ERFINV_LOW: f64 = -6.0;
const ERFINV_HIGH: f64 = 6.0;
const ERFINV_ITERATIONS: usize = 100;

/// Error function via the Chebyshev-fitted complementary form (fractional error below 1.2e-7).
pub fn erf(x: f64) -> f64 {
    if x == 0.0 {
        return 0.0;
    }
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let poly = -z * z - 1.265_512_23
        + t * (1.000_023_68
            + t * (0.374_091_96
                + t * (0.096_784_18
                    + t * (-0.186_288_06
                        + t * (0.278_868_07
                            + t * (-1.135_203_98
                                + t * (1.488_515_87 + t * (-0.822_152_23 + t * 0.170_872_77))))))));
    let erfc = t * poly.exp();
    if x >= 0.0 {
        1.0 - erfc
    } else {
        erfc - 1.0
    }
}

/// Inverse error function by bisection over a fixed bracket.
///
/// The bracket never depends on `x`, so the result is monotonic in `x`
/// bit-for-bit. Returns `None` outside the open interval (-1, 1).
pub fn erfinv(x: f64) -> Option<f64> {
    if !(x > -1.0 && x < 1.0) {
        return None;
    }
    if x == 0.0 {
        return Some(0.0);
    }
    let mut low = ERFINV_LOW;
    let mut high = ERFINV_HIGH;
    for _ in 0..ERFINV_ITERATIONS {
        let mid = (low + high) / 2.0;
        if erf(mid) > x {
            high = mid;
        } else {
            low = mid;
        }
    }
    Some((low + high) / 2.0)
}

/// Qualification points for a rank, clamped into `[0, max]`.
///
/// Non-increasing in rank for a fixed field size. A field of one team always
/// earns the maximum.
pub fn qualification_points(curve: &CurveConfig, max: f64, facts: RankFacts) -> f64 {
    let n = f64::from(facts.field_size);
    let r = f64::from(facts.rank);
    if facts.field_size <= 1 || facts.rank == 1 {
        return max.max(0.0);
    }

    let raw = match curve.kind {
        CurveKind::Linear => max * (n - r) / (n - 1.0),
        CurveKind::InverseErf => {
            let x = (n - 2.0 * r + 2.0) / (curve.alpha * n);
            match (erfinv(x), erfinv(1.0 / curve.alpha)) {
                (Some(num), Some(den)) if den > 0.0 => curve.offset + curve.scale * num / den,
                // Unreachable with a validated curve (alpha > 1)
                _ => 0.0,
            }
        }
    };

    raw.clamp(0.0, max.max(0.0))
}
