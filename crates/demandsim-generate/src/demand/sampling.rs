use rand::Rng;
use rand_distr::{Distribution, Gamma, Poisson};

/// Lower bound on the negative-binomial shape.
pub const MIN_DISPERSION: f64 = 1e-6;

/// Effective shape: `max(1e-6, dispersion * max(0.1, dispersion_scale))`.
pub fn effective_dispersion(dispersion: f64, dispersion_scale: f64) -> f64 {
    (dispersion * dispersion_scale.max(0.1)).max(MIN_DISPERSION)
}

/// Negative-binomial draw with the given mean and shape, as a
/// Gamma(k, mean / k) mixed Poisson. Non-positive means return 0 without
/// touching the stream.
pub fn sample_negative_binomial(mean: f64, dispersion: f64, rng: &mut impl Rng) -> u64 {
    if !mean.is_finite() || mean <= 0.0 {
        return 0;
    }
    let shape = dispersion.max(MIN_DISPERSION);
    let Ok(gamma) = Gamma::new(shape, mean / shape) else {
        return 0;
    };
    let lambda: f64 = gamma.sample(rng);
    if !lambda.is_finite() || lambda <= 0.0 {
        return 0;
    }
    match Poisson::new(lambda) {
        Ok(poisson) => {
            let draw: f64 = poisson.sample(rng);
            draw.max(0.0) as u64
        }
        Err(_) => lambda.round() as u64,
    }
}
