//! Scenario ordering by `Priority<N>` tags.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::ast::{Scenario, Specification};
use crate::diagnostic::{Warning, WarningKind};

const PRIORITY_PREFIX: &str = "Priority";

/// Reorder scenarios by priority.
///
/// Scenarios tagged `Priority<N>` come first, grouped by ascending `N`;
/// untagged scenarios follow. Source order is kept inside each group. When
/// a scenario carries several priority tags the lowest value applies. A
/// priority tag with a non-numeric suffix produces a warning and ends the
/// scan of that scenario's tags; only valid tags before it count.
///
/// After reordering, the span of whichever scenario is now last ends at
/// `last_line`, the line of the final token in the file.
#[must_use]
pub fn prioritize(
    mut spec: Specification,
    last_line: Option<usize>,
) -> (Specification, Vec<Warning>) {
    let mut warnings = Vec::new();
    let mut buckets: BTreeMap<u64, Vec<Scenario>> = BTreeMap::new();
    let mut unprioritized = Vec::new();

    for scenario in std::mem::take(&mut spec.scenarios) {
        match scenario_priority(&scenario, &spec.file_name, &mut warnings) {
            Some(priority) => {
                debug!(scenario = %scenario.heading.value, priority, "prioritized scenario");
                buckets.entry(priority).or_default().push(scenario);
            }
            None => unprioritized.push(scenario),
        }
    }

    spec.scenarios = buckets.into_values().flatten().chain(unprioritized).collect();

    if let (Some(last), Some(line)) = (spec.scenarios.last_mut(), last_line) {
        last.span.end = line;
    }
    (spec, warnings)
}

fn scenario_priority(
    scenario: &Scenario,
    file: &str,
    warnings: &mut Vec<Warning>,
) -> Option<u64> {
    let span = scenario.tags.as_ref().map(|t| t.span).unwrap_or_default();
    let mut lowest: Option<u64> = None;
    for tag in scenario.tag_values() {
        let Some((_, suffix)) = tag.split_once(PRIORITY_PREFIX) else {
            continue;
        };
        match suffix.parse::<i64>() {
            Ok(value) => {
                if let Ok(value) = u64::try_from(value) {
                    lowest = Some(lowest.map_or(value, |current| current.min(value)));
                }
            }
            Err(err) => {
                // Tags after an unreadable priority are not considered.
                warn!(tag, %err, "ignoring priority tag");
                warnings.push(Warning::new(
                    WarningKind::InvalidPriorityTag {
                        tag: tag.to_string(),
                    },
                    file,
                    span,
                ));
                break;
            }
        }
    }
    lowest
}
