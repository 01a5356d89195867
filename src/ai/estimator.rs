use std::path::Path;

use crate::error::EstimatorError;

/// Function approximator from a state to one value per action.
///
/// The agent treats implementations as black boxes: it never looks at the
/// parameters it copies between its online and target estimators.
pub trait ValueEstimator<S> {
    /// Opaque parameter snapshot, copied verbatim by [`set_parameters`](Self::set_parameters).
    type Parameters: Clone;

    /// Width of every prediction row.
    fn action_count(&self) -> usize;

    /// One row of action values per input state.
    fn predict(&self, states: &[S]) -> Result<Vec<Vec<f32>>, EstimatorError>;

    /// One optimization step moving predictions for `states` toward `targets`.
    /// Returns the training loss before the step.
    fn fit(&mut self, states: &[S], targets: &[Vec<f32>]) -> Result<f32, EstimatorError>;

    fn parameters(&self) -> Self::Parameters;

    fn set_parameters(&mut self, parameters: Self::Parameters);

    fn save_file(&self, path: &Path) -> Result<(), EstimatorError>;

    fn load_file(&mut self, path: &Path) -> Result<(), EstimatorError>;
}
