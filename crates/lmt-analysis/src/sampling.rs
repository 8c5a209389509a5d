//! Row and coordinate access shared by the analyses.

use lmt_table::{Event, IndividualState, Tag, WideRow, WideTable};

use crate::{
    AnalysisConfigError,
    batch::Trial,
    exclusion::{Exclusion, ExclusionTally},
    role::{RoleSelection, RoleTable},
};

/// Lever-press events of `table`. Presses by individuals without a column are
/// tallied as [`Exclusion::UnknownActor`].
pub(crate) fn table_events(table: &WideTable, exclusions: &mut ExclusionTally) -> Vec<Event> {
    let extracted = table.lever_press_events();
    exclusions.record_many(Exclusion::UnknownActor, extracted.unknown_actors);
    extracted.events
}

/// State of column `col` in an aligned row.
pub(crate) fn state_at(row: Option<&WideRow>, col: usize) -> Result<&IndividualState, Exclusion> {
    let row = row.ok_or(Exclusion::MissingRow)?;
    row.states
        .get(col)
        .and_then(Option::as_ref)
        .ok_or(Exclusion::MissingCoordinate)
}

/// Center of mass with both coordinates present and non-negative.
pub(crate) fn valid_mass(state: &IndividualState) -> Result<(f64, f64), Exclusion> {
    let (x, y) = state.mass().ok_or(Exclusion::MissingCoordinate)?;
    if x < 0.0 || y < 0.0 {
        return Err(Exclusion::NegativeCoordinate);
    }
    Ok((x, y))
}

/// Center of mass and front point, all coordinates present and non-negative.
pub(crate) fn valid_mass_and_front(
    state: &IndividualState,
) -> Result<((f64, f64), (f64, f64)), Exclusion> {
    let mass = valid_mass(state)?;
    let (x, y) = state.front().ok_or(Exclusion::MissingCoordinate)?;
    if x < 0.0 || y < 0.0 {
        return Err(Exclusion::NegativeCoordinate);
    }
    Ok((mass, (x, y)))
}

/// Tags of `selection` among all individuals of `trials`, in first-seen order.
pub(crate) fn selected_tags(
    trials: &[Trial],
    roles: &RoleTable,
    selection: &RoleSelection,
) -> Result<Vec<Tag>, AnalysisConfigError> {
    if selection.is_empty() {
        return Err(AnalysisConfigError::EmptyRoleSelection);
    }
    let mut all = Vec::<Tag>::new();
    for tag in trials.iter().flat_map(|trial| trial.table.tags()) {
        if !all.contains(tag) {
            all.push(tag.clone());
        }
    }
    let selected = roles.select(&all, selection);
    if selected.is_empty() {
        return Err(AnalysisConfigError::NoMatchingIndividuals {
            selection: selection.to_string(),
        });
    }
    tracing::info!(
        selection = %selection,
        selected = selected.len(),
        individuals = all.len(),
        "selected individuals by role"
    );
    Ok(selected)
}
