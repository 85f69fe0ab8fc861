//! Quality comparator - decides whether a candidate reading supersedes the
//! current best.
//!
//! # Selection Logic
//!
//! 1. Anything beats no reading at all
//! 2. More than one minute newer always wins, more than one minute older always loses
//! 3. Strictly more accurate wins
//! 4. Newer and not less accurate wins
//! 5. Newer from the same provider wins unless it lost more than 200m of accuracy

use chrono::TimeDelta;

use super::reading::Reading;

/// Window (seconds) inside which accuracy is weighed against recency.
pub const FRESHNESS_WINDOW_SECS: i64 = 60;

/// Largest accuracy loss (meters) tolerated for a newer same-provider reading.
pub const SIGNIFICANT_ACCURACY_LOSS: i64 = 200;

/// Returns true if `candidate` should replace `current`.
///
/// Accuracy is compared on the truncated integer difference so that sub-meter
/// noise does not flip the decision back and forth.
pub fn is_better(candidate: &Reading, current: Option<&Reading>) -> bool {
    let Some(current) = current else {
        return true;
    };

    let window = TimeDelta::seconds(FRESHNESS_WINDOW_SECS);
    let time_delta = candidate.timestamp - current.timestamp;
    if time_delta > window {
        return true;
    }
    if time_delta < -window {
        return false;
    }

    let is_newer = time_delta > TimeDelta::zero();
    let accuracy_delta = (candidate.accuracy - current.accuracy) as i64;
    let is_more_accurate = accuracy_delta < 0;
    let is_less_accurate = accuracy_delta > 0;
    let is_significantly_less_accurate = accuracy_delta > SIGNIFICANT_ACCURACY_LOSS;
    let is_same_provider = candidate.provider == current.provider;

    if is_more_accurate {
        return true;
    }

    if is_newer && !is_less_accurate {
        return true;
    }

    is_newer && !is_significantly_less_accurate && is_same_provider
}

/// Fold readings through [`is_better`], returning the best one.
pub fn best_of<I>(readings: I) -> Option<Reading>
where
    I: IntoIterator<Item = Reading>,
{
    readings.into_iter().fold(None, |best, reading| {
        if is_better(&reading, best.as_ref()) {
            Some(reading)
        } else {
            best
        }
    })
}
