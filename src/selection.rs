//! Academic field and subject selection.
//!
//! Finds the single field most similar to the input, then the top-K
//! subjects whose year lies strictly beyond the input year in the requested
//! direction, ranked by a blend of similarity to the field and to the raw
//! input.

use crate::dataset::MasterRecord;
use crate::features::ConceptFeature;
use crate::similarity::composite;

/// Weight of the field-to-subject similarity in the blended subject score.
pub const WEIGHT_FIELD_SIMILARITY: f64 = 0.4;
/// Weight of the input-to-subject similarity in the blended subject score.
pub const WEIGHT_INPUT_SIMILARITY: f64 = 0.6;

/// Which side of the input year subjects are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearDirection {
    /// More advanced subjects: `subject.year > input year`.
    Future,
    /// More foundational subjects: `subject.year < input year`.
    Past,
}

impl YearDirection {
    /// Strict year filter; subjects without a year never qualify.
    fn admits(self, subject_year: Option<i32>, input_year: i32) -> bool {
        match (self, subject_year) {
            (YearDirection::Future, Some(year)) => year > input_year,
            (YearDirection::Past, Some(year)) => year < input_year,
            (_, None) => false,
        }
    }
}

/// The field most similar to the input, or `None` when the dataset is
/// empty. Ties break toward the earliest row.
pub fn select_field<'a>(
    input: &ConceptFeature,
    fields: &'a [MasterRecord],
) -> Option<&'a MasterRecord> {
    let input_sig = input.signature();

    let mut best: Option<(&MasterRecord, f64)> = None;
    for field in fields {
        let score = composite(&input_sig, &field.signature());
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((field, score)),
        }
    }

    if let Some((field, score)) = best {
        tracing::info!(field = %field.label, score, "selected most similar academic field");
    }
    best.map(|(field, _)| field)
}

/// Top-K subjects in the given year direction, ranked by
/// `0.4 * sim(field, subject) + 0.6 * sim(input, subject)`.
///
/// An empty filter result is a valid outcome, not an error. Ties break
/// toward dataset order.
pub fn select_subjects<'a>(
    input: &ConceptFeature,
    field: &MasterRecord,
    subjects: &'a [MasterRecord],
    input_year: i32,
    direction: YearDirection,
    top_k: usize,
) -> Vec<&'a MasterRecord> {
    let input_sig = input.signature();
    let field_sig = field.signature();

    let mut scored: Vec<(&MasterRecord, f64)> = subjects
        .iter()
        .filter(|s| direction.admits(s.year, input_year))
        .map(|subject| {
            let subject_sig = subject.signature();
            let blended = composite(&field_sig, &subject_sig) * WEIGHT_FIELD_SIMILARITY
                + composite(&input_sig, &subject_sig) * WEIGHT_INPUT_SIMILARITY;
            (subject, blended)
        })
        .collect();

    if scored.is_empty() {
        tracing::warn!(?direction, input_year, "no subjects satisfy the year filter");
        return Vec::new();
    }

    // Stable sort keeps dataset order among equal scores.
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(top_k);

    tracing::info!(
        ?direction,
        selected = scored.len(),
        "selected related subjects"
    );
    scored.into_iter().map(|(subject, _)| subject).collect()
}
