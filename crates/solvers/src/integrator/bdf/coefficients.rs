//! Variable-step BDF coefficients from Lagrange interpolation.
//!
//! With nodes `τ_0 > τ_1 > … > τ_k`, where `τ_0` is the new time and the
//! rest are accepted history times, BDF-k reads
//!
//! ```text
//! Σ_j α_j x(τ_j) = h · f(τ_0, x(τ_0)),   α_j = h · l_j'(τ_0)
//! ```
//!
//! where `l_j` is the Lagrange basis polynomial of node `j`. The same basis,
//! evaluated instead of differentiated, gives the predictor.

/// Writes `α_j = h · l_j'(nodes[0])` into `alpha[..nodes.len()]`.
pub(super) fn bdf_coefficients(nodes: &[f64], h: f64, alpha: &mut [f64]) {
    let t0 = nodes[0];

    alpha[0] = h * nodes[1..].iter().map(|&tm| 1.0 / (t0 - tm)).sum::<f64>();

    for j in 1..nodes.len() {
        let tj = nodes[j];
        let mut numerator = 1.0;
        let mut denominator = 1.0;
        for (m, &tm) in nodes.iter().enumerate() {
            if m == j {
                continue;
            }
            if m != 0 {
                numerator *= t0 - tm;
            }
            denominator *= tj - tm;
        }
        alpha[j] = h * numerator / denominator;
    }
}

/// Writes the Lagrange basis values `l_j(t)` for `nodes` into `weights[..nodes.len()]`.
pub(super) fn interpolation_weights(t: f64, nodes: &[f64], weights: &mut [f64]) {
    for (j, &tj) in nodes.iter().enumerate() {
        let mut w = 1.0;
        for (m, &tm) in nodes.iter().enumerate() {
            if m != j {
                w *= (t - tm) / (tj - tm);
            }
        }
        weights[j] = w;
    }
}
