//! Gamma and Beta variates.
//!
//! Gamma draws use the Marsaglia–Tsang squeeze method for `shape >= 1` and
//! the `U^(1/shape)` boost for `shape < 1`. A Beta(α, β) variate is the
//! ratio `X / (X + Y)` of independent `X ~ Gamma(α, 1)`, `Y ~ Gamma(β, 1)`.

use tracing::warn;

use crate::random::Variates;

/// Upper bound on Marsaglia–Tsang proposals per draw.
///
/// Acceptance probability is above 0.95 for every `shape >= 1`, so this is
/// never reached by a real generator.
pub const MAX_REJECTIONS: usize = 10_000;

/// Draw from Gamma(`shape`, `scale`).
///
/// Returns 0 when either parameter is not strictly positive.
pub fn sample_gamma<V: Variates + ?Sized>(shape: f64, scale: f64, variates: &V) -> f64 {
    if !(shape > 0.0 && scale > 0.0) {
        return 0.0;
    }
    if shape < 1.0 {
        return sample_gamma(shape + 1.0, scale, variates) * variates.uniform().powf(1.0 / shape);
    }

    let d = shape - 1.0 / 3.0;
    let c = 1.0 / (9.0 * d).sqrt();
    let mut candidate = scale * d;

    for _ in 0..MAX_REJECTIONS {
        let x = variates.standard_normal();
        let mut v = 1.0 + c * x;
        if v <= 0.0 {
            continue;
        }
        v = v * v * v;
        candidate = scale * d * v;

        let u = variates.uniform();
        if u < 1.0 - 0.331 * x.powi(4) {
            return candidate;
        }
        if u.ln() < 0.5 * x * x + d * (1.0 - v + v.ln()) {
            return candidate;
        }
    }

    warn!(shape, scale, "gamma sampler hit rejection cap; returning last proposal");
    candidate
}

/// Draw from Beta(`alpha`, `beta`).
///
/// The result lies in `[0, 1]`. It is NaN only when both Gamma draws are
/// zero, which needs non-positive parameters.
pub fn sample_beta<V: Variates + ?Sized>(alpha: f64, beta: f64, variates: &V) -> f64 {
    let x = sample_gamma(alpha, 1.0, variates);
    let y = sample_gamma(beta, 1.0, variates);
    x / (x + y)
}
