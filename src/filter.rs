//! Outlier rejection for a batch of distance samples.
//!
//! Ultrasonic sensors produce the occasional wild reading: a side lobe hitting a closer
//! object, a missed echo, a reflection from the previous burst. Most samples of a quick
//! batch still cluster around the true distance, so the median-ranked sample is taken
//! as the reference and everything further away from it than the accuracy error is
//! dropped before averaging.

use libm::fabs;

/// Index of the reference sample in a sorted batch of `len` samples.
///
/// The lower median for even sizes. Always in bounds for `len > 0`.
pub const fn reference_index(len: usize) -> usize {
    len / 2
}

/// Sort `batch` and average the samples within `accuracy_error_mm` of the reference.
///
/// Returns `None` when the batch is empty, when no sample passes the threshold, or when
/// the average is zero, meaning no sample saw an echo.
pub fn average_excluding_outliers(batch: &mut [f64], accuracy_error_mm: f64) -> Option<f64> {
    if batch.is_empty() {
        return None;
    }

    batch.sort_unstable_by(f64::total_cmp);
    let reference = batch[reference_index(batch.len())];

    let (sum, count) = batch
        .iter()
        .filter(|&&sample| fabs(sample - reference) <= accuracy_error_mm)
        .fold((0.0, 0usize), |(sum, count), sample| (sum + sample, count + 1));

    // a negative or NaN threshold rejects even the reference
    if count == 0 {
        return None;
    }

    let average = sum / count as f64;
    if average == 0.0 {
        None
    } else {
        Some(average)
    }
}
