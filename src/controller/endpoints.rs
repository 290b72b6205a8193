use crate::member::Member;
use std::collections::BTreeSet;

fn non_blank(endpoint: Option<String>) -> Option<String> {
    endpoint.filter(|endpoint| !endpoint.trim().is_empty())
}

/// Sorted, de-duplicated endpoints of every member.
pub(super) fn member_endpoints(members: &[Member]) -> Vec<String> {
    members
        .iter()
        .filter_map(|member| non_blank(member.handle().endpoint()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// The primary endpoint as reported by the members. While the set is transitioning, members can
/// disagree; the first report wins and the disagreement is logged.
pub(super) fn primary_endpoint(logger: &slog::Logger, members: &[Member]) -> Option<String> {
    let reports: Vec<String> = members
        .iter()
        .filter_map(|member| non_blank(member.handle().reported_primary_endpoint()))
        .collect();

    let distinct: BTreeSet<&String> = reports.iter().collect();
    if distinct.len() > 1 {
        slog::warn!(
            logger,
            "Members report multiple primaries (transitioning?): {:?}",
            distinct
        );
    }

    reports.into_iter().next()
}
