//! Per-company training and multi-month extrapolation.
//!
//! For each company with at least `MIN_OBSERVATIONS` records:
//! - features are the 0-based positions `0..n` within the company's history
//! - a fresh `ProfitRegressor` is trained on `(index, profit)` pairs
//! - the model is evaluated at `n + k - 1` for `k = 1..=horizon`, each result
//!   clamped to `>= 0` and dated `k` months after the last observation
//!
//! Companies are independent, so they are trained on the rayon pool by
//! default. Every company derives its own RNG seed from the run seed and its
//! name, so results do not depend on scheduling order.

use log::{debug, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;

use crate::data::{CompanyGroup, CompanyGroups, add_months, month_label};
use crate::domain::{CompanyFit, ForecastConfig, MIN_OBSERVATIONS, PredictionRecord};
use crate::error::ForecastError;
use crate::models::{ProfitRegressor, TrainOptions};

/// One company's trained result.
#[derive(Debug, Clone, PartialEq)]
pub struct CompanyForecast {
    pub fit: CompanyFit,
    pub predictions: Vec<PredictionRecord>,
}

/// Company that produced no forecast, with a human-readable reason.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedCompany {
    pub company: String,
    pub reason: String,
}

/// Output of a forecast run over all companies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastReport {
    /// All companies' predictions, stable-sorted by date.
    pub predictions: Vec<PredictionRecord>,
    /// Training diagnostics in company first-appearance order.
    pub fits: Vec<CompanyFit>,
    pub skipped: Vec<SkippedCompany>,
}

impl ForecastReport {
    /// Predictions for one company, in date order.
    pub fn for_company<'a>(&'a self, company: &'a str) -> impl Iterator<Item = &'a PredictionRecord> + 'a {
        self.predictions.iter().filter(move |p| p.company == company)
    }
}

/// Forecast every company in `groups`.
///
/// Per-company failures never abort the run: the company is listed in
/// `skipped` and the rest proceed.
pub fn forecast_companies(groups: &CompanyGroups, config: &ForecastConfig) -> ForecastReport {
    let outcomes: Vec<(&str, Result<CompanyForecast, ForecastError>)> = if config.parallel {
        groups
            .as_slice()
            .par_iter()
            .map(|g| (g.company.as_str(), forecast_company(g, config)))
            .collect()
    } else {
        groups
            .iter()
            .map(|g| (g.company.as_str(), forecast_company(g, config)))
            .collect()
    };

    let mut report = ForecastReport::default();
    for (company, outcome) in outcomes {
        match outcome {
            Ok(forecast) => {
                debug!(
                    "{company}: loss={:.4} val_loss={} seed={}",
                    forecast.fit.final_loss,
                    forecast
                        .fit
                        .final_val_loss
                        .map(|v| format!("{v:.4}"))
                        .unwrap_or_else(|| "n/a".to_string()),
                    forecast.fit.seed
                );
                report.fits.push(forecast.fit);
                report.predictions.extend(forecast.predictions);
            }
            Err(err) => {
                match err {
                    ForecastError::TooFewObservations { .. } => debug!("{company}: no forecast ({err})"),
                    _ => warn!("{company}: forecast skipped ({err})"),
                }
                report.skipped.push(SkippedCompany {
                    company: company.to_string(),
                    reason: err.to_string(),
                });
            }
        }
    }

    // Stable: same-date predictions keep company first-appearance order.
    report.predictions.sort_by_key(|p| p.date);
    report
}

/// Train one company's regressor and extrapolate `config.horizon` months.
///
/// The model is dropped before returning.
pub fn forecast_company(group: &CompanyGroup, config: &ForecastConfig) -> Result<CompanyForecast, ForecastError> {
    let n = group.len();
    let Some(last) = group.records.last() else {
        return Err(ForecastError::TooFewObservations {
            required: MIN_OBSERVATIONS,
            got: 0,
        });
    };
    if n < MIN_OBSERVATIONS {
        return Err(ForecastError::TooFewObservations {
            required: MIN_OBSERVATIONS,
            got: n,
        });
    }

    let xs: Vec<f64> = (0..n).map(|i| i as f64).collect();
    let ys = group.profits();

    let seed = company_seed(config.seed, &group.company);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut model = ProfitRegressor::new(&mut rng);
    let opts = TrainOptions::from(config);
    let history = model.fit(&xs, &ys, &opts, &mut rng)?;

    let mut predictions = Vec::with_capacity(config.horizon as usize);
    for step in 1..=config.horizon {
        let index = (n + step as usize - 1) as f64;
        let raw = model.predict(index);
        if !raw.is_finite() {
            return Err(ForecastError::Diverged { epoch: opts.epochs });
        }
        let date = add_months(last.date, step).ok_or(ForecastError::DateOverflow { step })?;
        predictions.push(PredictionRecord {
            date,
            company: group.company.clone(),
            profit: raw.max(0.0),
            month: month_label(date),
            is_prediction: true,
        });
    }

    Ok(CompanyForecast {
        fit: CompanyFit {
            company: group.company.clone(),
            observations: n,
            train_samples: history.train_samples,
            validation_samples: history.validation_samples,
            epochs: history.loss.len(),
            final_loss: history.final_loss().unwrap_or(f64::NAN),
            final_val_loss: history.final_val_loss(),
            seed,
        },
        predictions,
    })
}

/// Per-company seed derived from the run seed and the company name.
///
/// FNV-1a over the name mixed with splitmix64, fixed across toolchains
/// (`DefaultHasher` output is not).
pub fn company_seed(base: u64, company: &str) -> u64 {
    let name = company.bytes().fold(0xcbf2_9ce4_8422_2325_u64, |h, b| {
        (h ^ u64::from(b)).wrapping_mul(0x0000_0100_0000_01b3)
    });
    splitmix64(splitmix64(base) ^ name)
}

fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
