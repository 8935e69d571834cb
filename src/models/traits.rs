//! StepModel trait defining the interface of a one-step predictor.

use crate::error::Result;
use std::sync::Arc;

/// A trained one-step regression model.
///
/// `predict` receives the scaled input window (one row per hour, oldest
/// first) and returns the scaled physical fields of the next hour. The first
/// five outputs are read as temperature, humidity, pressure, wind speed and
/// precipitation; extra outputs are ignored.
///
/// Implementations must be deterministic and free of side effects. This trait
/// is object-safe and can be used with `Box<dyn StepModel>`.
pub trait StepModel {
    /// Predict the next scaled physical row from a window of scaled features.
    fn predict(&self, window: &[Vec<f64>]) -> Result<Vec<f64>>;

    /// Get the model name.
    fn name(&self) -> &str {
        "StepModel"
    }
}

impl<T: StepModel + ?Sized> StepModel for &T {
    fn predict(&self, window: &[Vec<f64>]) -> Result<Vec<f64>> {
        (**self).predict(window)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<T: StepModel + ?Sized> StepModel for Box<T> {
    fn predict(&self, window: &[Vec<f64>]) -> Result<Vec<f64>> {
        (**self).predict(window)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<T: StepModel + ?Sized> StepModel for Arc<T> {
    fn predict(&self, window: &[Vec<f64>]) -> Result<Vec<f64>> {
        (**self).predict(window)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Type alias for boxed model trait objects.
///
/// # Example
///
/// ```
/// use meteo_forecast::models::{BoxedModel, StepModel};
/// use meteo_forecast::models::baseline::Persistence;
///
/// let model: BoxedModel = Box::new(Persistence::new());
/// assert_eq!(model.name(), "Persistence");
/// ```
pub type BoxedModel = Box<dyn StepModel + Send + Sync>;

/// Adapts a closure into a [`StepModel`].
///
/// # Example
///
/// ```
/// use meteo_forecast::models::{FnModel, StepModel};
///
/// let model = FnModel::new("constant", |_window: &[Vec<f64>]| Ok(vec![0.5; 5]));
/// assert_eq!(model.predict(&[vec![0.0; 9]]).unwrap(), vec![0.5; 5]);
/// ```
pub struct FnModel<F> {
    name: String,
    f: F,
}

impl<F> FnModel<F>
where
    F: Fn(&[Vec<f64>]) -> Result<Vec<f64>>,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> StepModel for FnModel<F>
where
    F: Fn(&[Vec<f64>]) -> Result<Vec<f64>>,
{
    fn predict(&self, window: &[Vec<f64>]) -> Result<Vec<f64>> {
        (self.f)(window)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl<F> std::fmt::Debug for FnModel<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnModel").field("name", &self.name).finish()
    }
}
