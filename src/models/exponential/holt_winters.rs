//! Holt-Winters forecasting model with simulated sample paths.
//!
//! Additive trend, plus additive seasonality whenever the seasonal period is
//! greater than one. The seasonal period defaults to the number of periods
//! per year of the training series (52, 12, 4 or 1).

use crate::core::{Period, SampledForecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::Forecaster;
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use crate::utils::stats::mean_square;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use statrs::distribution::Normal;
use tracing::debug;

const PARAM_BOUNDS: (f64, f64) = (0.0001, 0.9999);

/// Holt-Winters forecaster.
///
/// The model equations:
/// - Level: `l_t = α(y_t - s_{t-m}) + (1-α)(l_{t-1} + b_{t-1})`
/// - Trend: `b_t = β(l_t - l_{t-1}) + (1-β)b_{t-1}`
/// - Seasonal: `s_t = γ(y_t - l_t) + (1-γ)s_{t-m}`
/// - Forecast: `ŷ_{t+h} = l_t + h*b_t + s_{t+h-m}`
///
/// Without seasonality the `s` terms vanish and the model is Holt's linear
/// trend method.
///
/// Sample paths run the same recursions forward, feeding each step's
/// prediction plus a Gaussian error back in as the next observation.
#[derive(Debug, Clone)]
pub struct HoltWinters {
    /// Level smoothing parameter (0 < alpha < 1).
    alpha: Option<f64>,
    /// Trend smoothing parameter (0 < beta < 1).
    beta: Option<f64>,
    /// Seasonal smoothing parameter (0 < gamma < 1).
    gamma: Option<f64>,
    /// Seasonal period override; taken from the series when `None`.
    seasonal_period: Option<usize>,
    optimize: bool,
    seed: Option<u64>,
    state: Option<FittedState>,
}

#[derive(Debug, Clone)]
struct FittedState {
    /// Effective seasonal period; 1 means no seasonality.
    m: usize,
    level: f64,
    trend: f64,
    /// Seasonal indices, position `t % m` for observation `t`.
    seasonals: Vec<f64>,
    fitted: Vec<f64>,
    sigma: f64,
    n: usize,
    last_timestamp: DateTime<Utc>,
    period: Option<Period>,
    label: String,
}

/// Result of running the smoothing recursions over a series.
struct Smoothed {
    level: f64,
    trend: f64,
    seasonals: Vec<f64>,
    fitted: Vec<f64>,
    residuals: Vec<f64>,
}

impl HoltWinters {
    /// Create a model with fixed smoothing parameters.
    pub fn new(alpha: f64, beta: f64, gamma: f64) -> Self {
        Self {
            alpha: Some(alpha.clamp(PARAM_BOUNDS.0, PARAM_BOUNDS.1)),
            beta: Some(beta.clamp(PARAM_BOUNDS.0, PARAM_BOUNDS.1)),
            gamma: Some(gamma.clamp(PARAM_BOUNDS.0, PARAM_BOUNDS.1)),
            seasonal_period: None,
            optimize: false,
            seed: None,
            state: None,
        }
    }

    /// Create a model whose parameters are chosen by minimising in-sample SSE.
    pub fn auto() -> Self {
        Self {
            alpha: None,
            beta: None,
            gamma: None,
            seasonal_period: None,
            optimize: true,
            seed: None,
            state: None,
        }
    }

    /// Use `m` as the seasonal period instead of the series' periods per year.
    pub fn with_seasonal_period(mut self, m: usize) -> Self {
        self.seasonal_period = Some(m.max(1));
        self
    }

    /// Seed the sampler so repeated predictions draw the same paths.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn alpha(&self) -> Option<f64> {
        self.alpha
    }

    pub fn beta(&self) -> Option<f64> {
        self.beta
    }

    /// Seasonal smoothing; `None` after fitting a non-seasonal model.
    pub fn gamma(&self) -> Option<f64> {
        self.gamma
    }

    /// Seasonal period in effect, known once fitted unless overridden.
    pub fn seasonal_period(&self) -> Option<usize> {
        self.state.as_ref().map(|s| s.m).or(self.seasonal_period)
    }

    pub fn level(&self) -> Option<f64> {
        self.state.as_ref().map(|s| s.level)
    }

    pub fn trend(&self) -> Option<f64> {
        self.state.as_ref().map(|s| s.trend)
    }

    pub fn seasonals(&self) -> Option<&[f64]> {
        self.state.as_ref().map(|s| s.seasonals.as_slice())
    }

    /// Standard deviation of the one-step residuals.
    pub fn residual_std(&self) -> Option<f64> {
        self.state.as_ref().map(|s| s.sigma)
    }

    /// Deterministic point forecast `ŷ_{n+h}` for `h = 1..=horizon`.
    pub fn point_forecast(&self, horizon: usize) -> Result<Vec<f64>> {
        let state = self.state.as_ref().ok_or(ForecastError::FitRequired)?;
        Ok((1..=horizon)
            .map(|h| {
                let s = if state.m > 1 {
                    state.seasonals[(state.n + h - 1) % state.m]
                } else {
                    0.0
                };
                state.level + h as f64 * state.trend + s
            })
            .collect())
    }

    /// Initial level, trend and seasonal indices, plus the first index the
    /// recursions update from.
    fn initialize_state(values: &[f64], m: usize) -> (f64, f64, Vec<f64>, usize) {
        if m <= 1 {
            return (values[0], values[1] - values[0], Vec::new(), 1);
        }

        // Level: average of the first season. Trend: mean slope between the
        // first two seasons.
        let level = values[..m].iter().sum::<f64>() / m as f64;
        let trend = (0..m)
            .map(|i| (values[m + i] - values[i]) / m as f64)
            .sum::<f64>()
            / m as f64;

        let mut seasonals: Vec<f64> = values[..m].iter().map(|y| y - level).collect();
        let adjustment = seasonals.iter().sum::<f64>() / m as f64;
        for s in seasonals.iter_mut() {
            *s -= adjustment;
        }

        (level, trend, seasonals, m)
    }

    fn smooth(values: &[f64], alpha: f64, beta: f64, gamma: f64, m: usize) -> Smoothed {
        let (mut level, mut trend, mut seasonals, start) = Self::initialize_state(values, m);
        let seasonal = m > 1;

        // Observations used for initialisation are their own fit.
        let mut fitted: Vec<f64> = values[..start].to_vec();
        let mut residuals = Vec::with_capacity(values.len() - start);

        for (t, &y) in values.iter().enumerate().skip(start) {
            let idx = if seasonal { t % m } else { 0 };
            let s = if seasonal { seasonals[idx] } else { 0.0 };

            let forecast = level + trend + s;
            fitted.push(forecast);
            residuals.push(y - forecast);

            let level_prev = level;
            level = alpha * (y - s) + (1.0 - alpha) * (level_prev + trend);
            trend = beta * (level - level_prev) + (1.0 - beta) * trend;
            if seasonal {
                seasonals[idx] = gamma * (y - level) + (1.0 - gamma) * s;
            }
        }

        Smoothed {
            level,
            trend,
            seasonals,
            fitted,
            residuals,
        }
    }

    fn sse(values: &[f64], alpha: f64, beta: f64, gamma: f64, m: usize) -> f64 {
        Self::smooth(values, alpha, beta, gamma, m)
            .residuals
            .iter()
            .map(|e| e * e)
            .sum()
    }

    fn optimize_params(values: &[f64], m: usize) -> (f64, f64, f64) {
        let config = NelderMeadConfig {
            max_iter: 1000,
            tolerance: 1e-8,
            ..Default::default()
        };

        if m > 1 {
            let result = nelder_mead(
                |p| Self::sse(values, p[0], p[1], p[2], m),
                &[0.3, 0.1, 0.1],
                &[PARAM_BOUNDS; 3],
                &config,
            );
            (result.point[0], result.point[1], result.point[2])
        } else {
            let result = nelder_mead(
                |p| Self::sse(values, p[0], p[1], 0.0, m),
                &[0.3, 0.1],
                &[PARAM_BOUNDS; 2],
                &config,
            );
            (result.point[0], result.point[1], 0.0)
        }
    }
}

impl Default for HoltWinters {
    fn default() -> Self {
        Self::auto()
    }
}

impl Forecaster for HoltWinters {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let values = series.primary_values();
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::MissingValues);
        }
        let last_timestamp = *series.timestamps().last().ok_or(ForecastError::EmptyData)?;

        let period = series.period().or_else(|| series.infer_period().ok());
        let m = self
            .seasonal_period
            .or(period.map(|p| p.periods_per_year()))
            .unwrap_or(1);

        let needed = if m > 1 { 2 * m } else { 3 };
        if values.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                got: values.len(),
            });
        }

        if self.optimize {
            let (alpha, beta, gamma) = Self::optimize_params(values, m);
            self.alpha = Some(alpha);
            self.beta = Some(beta);
            self.gamma = Some(gamma);
        }

        let alpha = self.alpha.ok_or(ForecastError::FitRequired)?;
        let beta = self.beta.ok_or(ForecastError::FitRequired)?;
        let gamma = if m > 1 {
            self.gamma.ok_or(ForecastError::FitRequired)?
        } else {
            0.0
        };
        if m <= 1 {
            self.gamma = None;
        }

        let smoothed = Self::smooth(values, alpha, beta, gamma, m);
        let sigma = mean_square(&smoothed.residuals).sqrt();
        if !sigma.is_finite() {
            return Err(ForecastError::ComputationError(
                "residual variance is not finite".to_string(),
            ));
        }

        debug!(alpha, beta, gamma, m, sigma, n = values.len(), "fitted Holt-Winters");

        self.state = Some(FittedState {
            m,
            level: smoothed.level,
            trend: smoothed.trend,
            seasonals: smoothed.seasonals,
            fitted: smoothed.fitted,
            sigma,
            n: values.len(),
            last_timestamp,
            period,
            label: series.label(0),
        });
        Ok(())
    }

    fn predict(&self, horizon: usize, num_samples: usize) -> Result<SampledForecast> {
        let state = self.state.as_ref().ok_or(ForecastError::FitRequired)?;
        if num_samples == 0 {
            return Err(ForecastError::InvalidParameter(
                "at least one sample is required".to_string(),
            ));
        }
        let period = state.period.ok_or_else(|| {
            ForecastError::FrequencyInference("training series has no period".to_string())
        })?;
        let timestamps = period.following_labels(&state.last_timestamp, horizon);

        let alpha = self.alpha.ok_or(ForecastError::FitRequired)?;
        let beta = self.beta.ok_or(ForecastError::FitRequired)?;
        let gamma = self.gamma.unwrap_or(0.0);
        let seasonal = state.m > 1;

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        // A perfect fit leaves nothing to sample; every path is the point forecast.
        let noise = if state.sigma > 0.0 {
            Some(
                Normal::new(0.0, state.sigma)
                    .map_err(|e| ForecastError::ComputationError(e.to_string()))?,
            )
        } else {
            None
        };

        let mut samples = vec![Vec::with_capacity(num_samples); horizon];
        for _ in 0..num_samples {
            let mut level = state.level;
            let mut trend = state.trend;
            let mut seasonals = state.seasonals.clone();

            for (h, step) in samples.iter_mut().enumerate() {
                let idx = if seasonal { (state.n + h) % state.m } else { 0 };
                let s = if seasonal { seasonals[idx] } else { 0.0 };
                let error = match &noise {
                    Some(dist) => rand::distributions::Distribution::sample(dist, &mut rng),
                    None => 0.0,
                };
                let y = level + trend + s + error;
                step.push(y);

                let level_prev = level;
                level = alpha * (y - s) + (1.0 - alpha) * (level_prev + trend);
                trend = beta * (level - level_prev) + (1.0 - beta) * trend;
                if seasonal {
                    seasonals[idx] = gamma * (y - level) + (1.0 - gamma) * s;
                }
            }
        }

        Ok(SampledForecast::new(timestamps, samples)?.with_label(state.label.clone()))
    }

    fn name(&self) -> &str {
        "HoltWinters"
    }

    fn is_fitted(&self) -> bool {
        self.state.is_some()
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.state.as_ref().map(|s| s.fitted.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    fn series_with_period(values: Vec<f64>, period: Period) -> TimeSeries {
        let start = Utc.with_ymd_and_hms(2009, 12, 31, 0, 0, 0).unwrap();
        let timestamps = period.following_labels(&start, values.len());
        let mut ts = TimeSeries::univariate(timestamps, values).unwrap();
        ts.set_period(period);
        ts
    }

    fn seasonal_monthly(n: usize, noise: bool) -> TimeSeries {
        let pattern = [5.0, 3.0, 1.0, -1.0, -3.0, -5.0, -5.0, -3.0, -1.0, 1.0, 3.0, 5.0];
        let values = (0..n)
            .map(|i| {
                let jitter = if noise { ((i * 7919) % 13) as f64 * 0.1 - 0.6 } else { 0.0 };
                50.0 + 0.5 * i as f64 + pattern[i % 12] + jitter
            })
            .collect();
        series_with_period(values, Period::Monthly)
    }

    #[test]
    fn seasonal_period_follows_series_period() {
        let mut model = HoltWinters::auto().with_seed(1);
        model.fit(&seasonal_monthly(48, true)).unwrap();
        assert_eq!(model.seasonal_period(), Some(12));
        assert_eq!(model.seasonals().unwrap().len(), 12);
        assert!(model.gamma().is_some());
    }

    #[test]
    fn override_replaces_series_period() {
        let mut model = HoltWinters::auto().with_seasonal_period(4);
        model.fit(&seasonal_monthly(24, true)).unwrap();
        assert_eq!(model.seasonal_period(), Some(4));
    }

    #[test]
    fn yearly_series_is_not_seasonal() {
        let values: Vec<f64> = (0..10).map(|i| 100.0 + 3.0 * i as f64).collect();
        let mut model = HoltWinters::auto();
        model.fit(&series_with_period(values, Period::Yearly)).unwrap();

        assert_eq!(model.seasonal_period(), Some(1));
        assert!(model.gamma().is_none());
        let point = model.point_forecast(2).unwrap();
        assert_relative_eq!(point[0], 130.0, epsilon = 1e-6);
        assert_relative_eq!(point[1], 133.0, epsilon = 1e-6);
    }

    #[test]
    fn captures_trend_and_season() {
        let mut model = HoltWinters::auto();
        let series = seasonal_monthly(120, false);
        model.fit(&series).unwrap();

        let point = model.point_forecast(12).unwrap();
        let pattern = [5.0, 3.0, 1.0, -1.0, -3.0, -5.0, -5.0, -3.0, -1.0, 1.0, 3.0, 5.0];
        for (h, p) in point.iter().enumerate() {
            let i = 120 + h;
            let expected = 50.0 + 0.5 * i as f64 + pattern[i % 12];
            assert_relative_eq!(*p, expected, epsilon = 1.5);
        }
    }

    #[test]
    fn requires_two_seasons_or_three_points() {
        let mut model = HoltWinters::auto();
        assert_eq!(
            model.fit(&seasonal_monthly(23, false)).unwrap_err(),
            ForecastError::InsufficientData { needed: 24, got: 23 }
        );

        let mut model = HoltWinters::auto();
        let short = series_with_period(vec![1.0, 2.0], Period::Yearly);
        assert_eq!(
            model.fit(&short).unwrap_err(),
            ForecastError::InsufficientData { needed: 3, got: 2 }
        );
    }

    #[test]
    fn rejects_missing_values() {
        let mut values: Vec<f64> = (0..30).map(|i| i as f64).collect();
        values[10] = f64::NAN;
        let mut model = HoltWinters::auto();
        let err = model
            .fit(&series_with_period(values, Period::Monthly))
            .unwrap_err();
        assert_eq!(err, ForecastError::MissingValues);
        assert_eq!(err.category(), crate::error::ErrorCategory::Model);
    }

    #[test]
    fn predict_requires_fit() {
        let model = HoltWinters::auto();
        assert_eq!(model.predict(3, 10).unwrap_err(), ForecastError::FitRequired);
    }

    #[test]
    fn samples_have_requested_shape_and_timestamps() {
        let series = seasonal_monthly(84, true);
        let mut model = HoltWinters::auto().with_seed(42);
        model.fit(&series).unwrap();

        let forecast = model.predict(36, 1000).unwrap();
        assert_eq!(forecast.horizon(), 36);
        assert_eq!(forecast.num_samples(), 1000);
        assert_eq!(forecast.timestamps(), series.future_timestamps(36).unwrap().as_slice());
        assert_eq!(forecast.label(), "value");
    }

    #[test]
    fn seeded_sampling_is_reproducible() {
        let series = seasonal_monthly(48, true);
        let mut a = HoltWinters::auto().with_seed(9);
        let mut b = HoltWinters::auto().with_seed(9);
        a.fit(&series).unwrap();
        b.fit(&series).unwrap();
        assert_eq!(a.predict(6, 50).unwrap(), b.predict(6, 50).unwrap());
    }

    #[test]
    fn sample_median_tracks_point_forecast() {
        let series = seasonal_monthly(72, true);
        let mut model = HoltWinters::auto().with_seed(3);
        model.fit(&series).unwrap();

        let forecast = model.predict(3, 4000).unwrap();
        let point = model.point_forecast(3).unwrap();
        let sigma = model.residual_std().unwrap();
        for (m, p) in forecast.median().iter().zip(&point) {
            assert!((m - p).abs() < 3.0 * sigma.max(0.05));
        }
    }

    #[test]
    fn perfect_fit_gives_degenerate_samples() {
        let values: Vec<f64> = (0..6).map(|i| 2.0 * i as f64).collect();
        let mut model = HoltWinters::new(0.5, 0.5, 0.5);
        model.fit(&series_with_period(values, Period::Yearly)).unwrap();

        assert_relative_eq!(model.residual_std().unwrap(), 0.0, epsilon = 1e-12);
        let forecast = model.predict(2, 5).unwrap();
        for v in forecast.step(0).unwrap() {
            assert_relative_eq!(*v, 12.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn zero_samples_are_rejected() {
        let mut model = HoltWinters::auto();
        model.fit(&seasonal_monthly(36, true)).unwrap();
        assert!(model.predict(3, 0).is_err());
    }
}
