//! Sample statistics over `f64` slices.
//!
//! Conventions are fixed:
//! - variance and covariance use the `n - 1` denominator;
//! - skewness is the adjusted Fisher-Pearson estimator `G1`;
//! - kurtosis is the bias-corrected excess kurtosis `G2` (normal = 0);
//! - percentiles interpolate linearly between closest ranks, `h = (n - 1) * p / 100`.
//!
//! Functions return `None` when the statistic is undefined for the input
//! (too few observations or zero dispersion).

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Spread below which a sample counts as having no dispersion, relative to
/// its largest magnitude. Returns derived from a constant growth rate differ
/// only in the last few bits.
pub const DISPERSION_TOLERANCE: f64 = 1e-12;

/// Values equal up to rounding. Their dispersion is reported as exactly zero
/// rather than whatever residue the arithmetic leaves behind.
fn is_constant(values: &[f64]) -> bool {
    let (lo, hi, scale) = values.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY, 0.0_f64),
        |(lo, hi, scale), &v| (lo.min(v), hi.max(v), scale.max(v.abs())),
    );
    values.len() < 2 || hi - lo <= DISPERSION_TOLERANCE * scale
}

pub fn sample_covariance(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len();
    if n < 2 || ys.len() != n {
        return None;
    }
    if is_constant(xs) || is_constant(ys) {
        return Some(0.0);
    }
    let mx = mean(xs)?;
    let my = mean(ys)?;
    let sum: f64 = xs
        .iter()
        .zip(ys)
        .map(|(x, y)| (x - mx) * (y - my))
        .sum();
    Some(sum / (n - 1) as f64)
}

pub fn sample_variance(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    if is_constant(values) {
        return Some(0.0);
    }
    let m = mean(values)?;
    let sum: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some(sum / (n - 1) as f64)
}

pub fn sample_std(values: &[f64]) -> Option<f64> {
    sample_variance(values).map(f64::sqrt)
}

/// Pearson correlation; `None` if either side has zero variance.
pub fn correlation(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let cov = sample_covariance(xs, ys)?;
    let sx = sample_std(xs)?;
    let sy = sample_std(ys)?;
    if sx == 0.0 || sy == 0.0 {
        return None;
    }
    Some((cov / (sx * sy)).clamp(-1.0, 1.0))
}

/// Central moments `(m2, m3, m4)` with the `n` denominator.
fn central_moments(values: &[f64]) -> Option<(f64, f64, f64)> {
    let n = values.len() as f64;
    let m = mean(values)?;
    if is_constant(values) {
        return Some((0.0, 0.0, 0.0));
    }
    let (mut s2, mut s3, mut s4) = (0.0, 0.0, 0.0);
    for v in values {
        let d = v - m;
        let d2 = d * d;
        s2 += d2;
        s3 += d2 * d;
        s4 += d2 * d2;
    }
    Some((s2 / n, s3 / n, s4 / n))
}

pub fn skewness(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 3 {
        return None;
    }
    let (m2, m3, _) = central_moments(values)?;
    if m2 == 0.0 {
        return None;
    }
    let nf = n as f64;
    let g1 = m3 / m2.powf(1.5);
    Some(g1 * (nf * (nf - 1.0)).sqrt() / (nf - 2.0))
}

pub fn excess_kurtosis(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 4 {
        return None;
    }
    let (m2, _, m4) = central_moments(values)?;
    if m2 == 0.0 {
        return None;
    }
    let nf = n as f64;
    let g2 = m4 / (m2 * m2) - 3.0;
    Some((nf - 1.0) / ((nf - 2.0) * (nf - 3.0)) * ((nf + 1.0) * g2 + 6.0))
}

/// Linear-interpolation percentile, `pct` in `[0, 100]`.
pub fn percentile(values: &[f64], pct: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=100.0).contains(&pct) {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let h = (sorted.len() - 1) as f64 * pct / 100.0;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    let frac = h - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}
