//! Temporal value extraction

use chrono::NaiveDateTime;
use clinrule_model::AbstractedObservation;

/// The observation of `concept` valid at `instant` with the latest start.
///
/// Validity bounds are inclusive. When several candidates share the latest start, the
/// first one in input order wins.
pub fn latest_observation<'a>(
    observations: &'a [AbstractedObservation],
    concept: &str,
    instant: NaiveDateTime,
) -> Option<&'a AbstractedObservation> {
    observations
        .iter()
        .filter(|obs| obs.concept == concept && obs.is_valid_at(instant))
        .fold(None, |best: Option<&AbstractedObservation>, obs| match best {
            Some(current) if obs.start <= current.start => Some(current),
            _ => Some(obs),
        })
}

/// Value of [`latest_observation`]
pub fn latest_value<'a>(
    observations: &'a [AbstractedObservation],
    concept: &str,
    instant: NaiveDateTime,
) -> Option<&'a str> {
    latest_observation(observations, concept, instant).map(|obs| obs.value.as_str())
}
