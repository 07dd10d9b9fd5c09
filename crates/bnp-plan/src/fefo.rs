//! First-expired-first-out post-pass over the batch-level allocation.
//!
//! The solver couples demand to cohorts without caring which entry-date
//! batch inside a `(node, product, prod_date, date, state)` group supplies
//! the units; any split prices identically. This pass rewrites the split
//! deterministically: oldest entry date first, bounded by each batch's
//! recorded availability, with a stable tie-break on production date and
//! node order. Availability is fixed at extraction, so re-applying the
//! pass is a no-op.

use crate::schema::CohortConsumption;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Allocation group: reallocation never crosses these boundaries, so the
/// totals the solver priced (freshness by production date, state-specific
/// holding) are untouched.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct GroupKey {
    node: String,
    product: String,
    prod_date: NaiveDate,
    date: NaiveDate,
    state: bnp_core::StorageState,
}

/// Reallocate consumption oldest-entry-first. Returns the rewritten
/// entries, dropping batches that end up with zero allocation.
pub fn fefo_allocate(entries: Vec<CohortConsumption>) -> Vec<CohortConsumption> {
    let mut groups: BTreeMap<GroupKey, Vec<CohortConsumption>> = BTreeMap::new();
    for entry in entries {
        groups
            .entry(GroupKey {
                node: entry.node.clone(),
                product: entry.product.clone(),
                prod_date: entry.prod_date,
                date: entry.date,
                state: entry.state,
            })
            .or_default()
            .push(entry);
    }

    let mut result = Vec::new();
    for (_, mut members) in groups {
        let total: f64 = members.iter().map(|m| m.units).sum();
        // Oldest entry first; prod_date and node are group-constant, so the
        // entry date is the only live sort key, kept stable.
        members.sort_by(|a, b| {
            (a.entry_date, a.prod_date, a.node.as_str())
                .cmp(&(b.entry_date, b.prod_date, b.node.as_str()))
        });

        let mut remaining = total;
        for mut member in members {
            let take = remaining.min(member.available_units).max(0.0);
            member.units = take;
            remaining -= take;
            if member.units > 1e-9 {
                result.push(member);
            }
        }
        // Availability always covers the solver's own allocation, so
        // nothing is left over; guard against float dust anyway.
        debug_assert!(remaining < 1e-6, "FEFO left {remaining} units unallocated");
    }
    result
}
