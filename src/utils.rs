//! Helper functions

/// Returns the median of `values`.
///
/// ## Panics
/// If `values` is empty or contains NaN.
pub fn median_of_floats(mut values: Vec<f64>) -> f64 {
    assert!(!values.is_empty(), "median of empty list");
    values.sort_by(|a, b| a.partial_cmp(b).expect("NaN in median input"));

    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}
