//! Approximate tail probabilities for significance testing
//!
//! These are numerical approximations, not exact CDFs. Each is monotonic in
//! the magnitude of its statistic, which is what significance ranking needs.

const LANCZOS_COEFFICIENTS: [f64; 6] = [
    76.180_091_729_471_46,
    -86.505_320_329_416_77,
    24.014_098_240_830_91,
    -1.231_739_572_450_155,
    0.120_865_097_386_617_9e-2,
    -0.539_523_938_495_3e-5,
];

const BETACF_MAX_ITERATIONS: usize = 200;
const BETACF_EPSILON: f64 = 3.0e-14;
const BETACF_FLOOR: f64 = 1.0e-300;

/// Degrees of freedom at which the t-distribution is replaced by the normal
pub const NORMAL_APPROXIMATION_DF: f64 = 30.0;

/// Natural log of the gamma function (Lanczos approximation), for `x > 0`
pub fn ln_gamma(x: f64) -> f64 {
    let mut y = x;
    let tmp = x + 5.5;
    let tmp = tmp - (x + 0.5) * tmp.ln();
    let mut series = 1.000_000_000_190_015;
    for coefficient in LANCZOS_COEFFICIENTS {
        y += 1.0;
        series += coefficient / y;
    }
    -tmp + (2.506_628_274_631_000_5 * series / x).ln()
}

/// Continued fraction for the incomplete beta function (modified Lentz)
fn beta_continued_fraction(a: f64, b: f64, x: f64) -> f64 {
    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;

    let clamp = |v: f64| if v.abs() < BETACF_FLOOR { BETACF_FLOOR } else { v };

    let mut c = 1.0;
    let mut d = 1.0 / clamp(1.0 - qab * x / qap);
    let mut h = d;

    for m in 1..=BETACF_MAX_ITERATIONS {
        let m = m as f64;
        let m2 = 2.0 * m;

        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 / clamp(1.0 + aa * d);
        c = clamp(1.0 + aa / c);
        h *= d * c;

        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 / clamp(1.0 + aa * d);
        c = clamp(1.0 + aa / c);
        let delta = d * c;
        h *= delta;

        if (delta - 1.0).abs() < BETACF_EPSILON {
            break;
        }
    }
    h
}

/// Regularized incomplete beta function I_x(a, b)
pub fn regularized_incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    let front = (ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b)
        + a * x.ln()
        + b * (1.0 - x).ln())
    .exp();

    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(a, b, x) / a
    } else {
        1.0 - front * beta_continued_fraction(b, a, 1.0 - x) / b
    }
}

/// Error function (Abramowitz and Stegun 7.1.26, |error| < 1.5e-7)
pub fn erf(x: f64) -> f64 {
    const A1: f64 = 0.254_829_592;
    const A2: f64 = -0.284_496_736;
    const A3: f64 = 1.421_413_741;
    const A4: f64 = -1.453_152_027;
    const A5: f64 = 1.061_405_429;
    const P: f64 = 0.327_591_1;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + P * x);
    let poly = ((((A5 * t + A4) * t + A3) * t + A2) * t + A1) * t;
    sign * (1.0 - poly * (-x * x).exp())
}

/// Two-sided tail probability of a standard normal statistic
pub fn normal_two_sided_p(z: f64) -> f64 {
    let p = 1.0 - erf(z.abs() / std::f64::consts::SQRT_2);
    p.clamp(0.0, 1.0)
}

/// Two-sided tail probability of a Student t statistic
pub fn t_two_sided_p(t: f64, df: f64) -> f64 {
    if !t.is_finite() {
        return 0.0;
    }
    if df <= 0.0 {
        return 1.0;
    }
    if df >= NORMAL_APPROXIMATION_DF {
        return normal_two_sided_p(t);
    }
    let x = df / (df + t * t);
    regularized_incomplete_beta(df / 2.0, 0.5, x).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ln_gamma_known_values() {
        assert!(ln_gamma(1.0).abs() < 1e-9);
        assert!(ln_gamma(2.0).abs() < 1e-9);
        assert!((ln_gamma(5.0) - 24f64.ln()).abs() < 1e-9);
        assert!((ln_gamma(0.5) - std::f64::consts::PI.sqrt().ln()).abs() < 1e-9);
    }

    #[test]
    fn test_incomplete_beta_uniform_case() {
        for x in [0.1, 0.25, 0.5, 0.9] {
            assert!((regularized_incomplete_beta(1.0, 1.0, x) - x).abs() < 1e-9);
        }
        assert_eq!(regularized_incomplete_beta(2.0, 3.0, 0.0), 0.0);
        assert_eq!(regularized_incomplete_beta(2.0, 3.0, 1.0), 1.0);
    }

    #[test]
    fn test_normal_critical_value() {
        assert!((normal_two_sided_p(1.959_964) - 0.05).abs() < 1e-4);
        assert!((normal_two_sided_p(0.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_t_critical_values() {
        // t(0.975, 10) = 2.228
        assert!((t_two_sided_p(2.228, 10.0) - 0.05).abs() < 1e-3);
        // t(0.995, 5) = 4.032
        assert!((t_two_sided_p(4.032, 5.0) - 0.01).abs() < 1e-3);
        assert!((t_two_sided_p(0.0, 5.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_t_p_value_monotonic_in_abs_t() {
        for df in [1.0, 4.0, 12.0, 29.0, 40.0] {
            let mut previous = 1.0 + 1e-12;
            for step in 0..60 {
                let t = step as f64 * 0.25;
                let p = t_two_sided_p(t, df);
                assert!(p <= previous, "df={df} t={t} p={p} previous={previous}");
                assert_eq!(p, t_two_sided_p(-t, df));
                previous = p;
            }
        }
    }

    #[test]
    fn test_infinite_t_is_zero_p() {
        assert_eq!(t_two_sided_p(f64::INFINITY, 3.0), 0.0);
    }
}
