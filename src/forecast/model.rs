use std::{fs, path::Path, time::Instant};

use chrono::{DateTime, Utc};
use linfa::{Dataset, dataset::Records, traits::Fit};
use linfa_linear::LinearRegression;
use ndarray::{Array1, Array2, Axis, aview0, aview1};
use serde::{Deserialize, Serialize};

use crate::{
    forecast::features::{FEATURE_NAMES, Features, N_FEATURES},
    history::History,
    prelude::*,
    quantity::price::KilowattHourPrice,
};

/// Trained linear price model artifact.
#[must_use]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Model {
    pub features: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    pub n_samples: usize,

    /// In-sample mean absolute error, p/kWh.
    pub mean_absolute_error: f64,

    pub trained_at: DateTime<Utc>,
}

impl Model {
    /// Fit the model on every known price that has all the features.
    #[instrument(skip_all)]
    pub fn train(history: &History) -> Result<Self> {
        let mut dataset = Dataset::new(Array2::zeros((0, N_FEATURES)), Array1::zeros(0));
        for (at, price) in &history.prices {
            if let Some(features) = Features::at(history, *at) {
                dataset.records.push_row(aview1(&features.0))?;
                dataset.targets.push(Axis(0), aview0(&price.0))?;
            }
        }
        ensure!(
            dataset.nsamples() > 2 * N_FEATURES,
            "not enough samples to train on ({}), collect more history first",
            dataset.nsamples(),
        );

        info!(n_samples = dataset.nsamples(), "fitting…");
        let start_time = Instant::now();
        let regression = LinearRegression::new()
            .fit(&dataset)
            .context("failed to fit the regression, try again with more history")?;
        info!(elapsed = ?start_time.elapsed(), "regression has been fit");

        let coefficients = regression.params().to_vec();
        let intercept = regression.intercept();
        let predictions = dataset.records.dot(regression.params()) + intercept;
        #[expect(clippy::cast_precision_loss)]
        let mean_absolute_error = (predictions - &dataset.targets).mapv(f64::abs).sum()
            / dataset.nsamples() as f64;
        info!(mean_absolute_error, ?coefficients, intercept, "trained");

        Ok(Self {
            features: FEATURE_NAMES.iter().map(ToString::to_string).collect(),
            coefficients,
            intercept,
            n_samples: dataset.nsamples(),
            mean_absolute_error,
            trained_at: Utc::now(),
        })
    }

    /// Read the artifact, a missing one is an error.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn read_from(path: &Path) -> Result<Self> {
        ensure!(
            path.is_file(),
            "the forecast model `{}` does not exist, run `train` first",
            path.display(),
        );
        let model: Self = toml::from_str(
            &fs::read_to_string(path).context("failed to read the forecast model")?,
        )
        .context("failed to parse the forecast model")?;
        model.validate()?;
        info!(n_samples = model.n_samples, trained_at = %model.trained_at, "loaded");
        Ok(model)
    }

    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn write_to(&self, path: &Path) -> Result {
        info!("saving…");
        let text = toml::to_string(self).context("failed to serialize the forecast model")?;
        fs::write(path, text).context("failed to write the forecast model")
    }

    fn validate(&self) -> Result {
        ensure!(
            self.features.iter().map(String::as_str).eq(FEATURE_NAMES),
            "the forecast model features {:?} do not match {FEATURE_NAMES:?}, retrain the model",
            self.features,
        );
        ensure!(
            self.coefficients.len() == N_FEATURES,
            "the forecast model has {} coefficients instead of {N_FEATURES}",
            self.coefficients.len(),
        );
        Ok(())
    }

    pub fn predict(&self, features: &Features) -> KilowattHourPrice {
        KilowattHourPrice(
            self.intercept
                + self.coefficients.iter().zip(features.0).map(|(lhs, rhs)| lhs * rhs).sum::<f64>(),
        )
    }
}
