//! Selection of the greatest version satisfying a constraint

use crate::version::constraint::Constraint;
use crate::version::goversion::Version;

/// Find the greatest version in `versions` that satisfies `constraint`.
///
/// Single pass over the input; order and duplicates don't matter.
/// Returns `None` when nothing satisfies the constraint.
pub fn max_match<'a, I>(constraint: &Constraint, versions: I) -> Option<&'a Version>
where
    I: IntoIterator<Item = &'a Version>,
{
    let mut best: Option<&Version> = None;
    for v in versions {
        if !constraint.check(v) {
            continue;
        }
        if best.is_none_or(|b| v.greater_than(b)) {
            best = Some(v);
        }
    }
    best
}
