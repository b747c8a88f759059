use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

/// Exponential moving average seeded with the first value.
pub fn ema(series: &[f64], alpha: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(series.len());
    let mut prev: Option<f64> = None;
    for value in series {
        let next = match prev {
            Some(prev) => alpha * value + (1.0 - alpha) * prev,
            None => *value,
        };
        out.push(next);
        prev = Some(next);
    }
    out
}

/// AR(1) path `x[t] = rho * x[t-1] + eps[t]` with `x[0] = eps[0]`.
///
/// All innovations are drawn before returning so the stream position after
/// the call depends only on `n`.
pub fn ar1(n: usize, rho: f64, sigma: f64, rng: &mut impl Rng) -> Vec<f64> {
    let innovations: Vec<f64> = (0..n)
        .map(|_| {
            let z: f64 = StandardNormal.sample(rng);
            sigma * z
        })
        .collect();
    let mut path = Vec::with_capacity(n);
    for (idx, eps) in innovations.iter().enumerate() {
        let value = if idx == 0 {
            *eps
        } else {
            rho * path[idx - 1] + eps
        };
        path.push(value);
    }
    path
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn ema_seeds_with_first_value() {
        let smoothed = ema(&[10.0, 0.0, 0.0], 0.5);
        assert_eq!(smoothed, vec![10.0, 5.0, 2.5]);
        assert!(ema(&[], 0.3).is_empty());
    }

    #[test]
    fn ar1_without_noise_is_flat_zero() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let path = ar1(20, 0.6, 0.0, &mut rng);
        assert!(path.iter().all(|value| *value == 0.0));
    }

    #[test]
    fn ar1_is_reproducible_and_correlated() {
        let a = ar1(500, 0.9, 0.2, &mut ChaCha8Rng::seed_from_u64(3));
        let b = ar1(500, 0.9, 0.2, &mut ChaCha8Rng::seed_from_u64(3));
        assert_eq!(a, b);

        let mean = a.iter().sum::<f64>() / a.len() as f64;
        let (mut num, mut den) = (0.0, 0.0);
        for pair in a.windows(2) {
            num += (pair[0] - mean) * (pair[1] - mean);
        }
        for value in &a {
            den += (value - mean).powi(2);
        }
        assert!(num / den > 0.5, "lag-1 autocorrelation too weak");
    }
}
