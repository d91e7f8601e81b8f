//! Timeline aggregation: folds consecutive change sets into per-provision
//! histories.
//!
//! A provision is followed across boundaries through its identifiers: the
//! record of boundary `k` whose earlier identifier equals the later
//! identifier of a record at boundary `k - 1` continues the same history.
//! Histories are keyed by the last identifier the provision had. When a
//! removed provision's identifier is later taken by another provision, the
//! removed history is keyed `<identifier>@removed<year>` instead, so the
//! two histories never merge.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::diff::{ChangeRecord, ChangeSet, ChangeType};
use crate::error::{CoreError, Result};

/// What happened to one provision across one year boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEntry {
    /// Later year of the boundary.
    pub year: i32,
    pub change_type: ChangeType,
    pub magnitude: f64,
    pub text_delta: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier_from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier_to: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub renumbered: bool,
}

impl TimelineEntry {
    fn from_record(year: i32, record: &ChangeRecord) -> Self {
        Self {
            year,
            change_type: record.change_type,
            magnitude: record.magnitude,
            text_delta: record.text_delta,
            identifier_from: record.node_identifier_from.clone(),
            identifier_to: record.node_identifier_to.clone(),
            renumbered: record.renumbered,
        }
    }
}

/// History of one provision, oldest boundary first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timeline {
    /// Most recent identifier of the provision.
    pub identifier: String,
    pub entries: Vec<TimelineEntry>,
}

impl Timeline {
    #[must_use]
    pub fn empty(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries that record an actual change.
    pub fn changes(&self) -> impl Iterator<Item = &TimelineEntry> {
        self.entries
            .iter()
            .filter(|e| e.change_type != ChangeType::Unchanged)
    }
}

struct Chain {
    identifier: String,
    entries: Vec<TimelineEntry>,
}

impl Chain {
    /// Year of the boundary that removed the provision, if it ended that way.
    fn removed_in(&self) -> Option<i32> {
        self.entries
            .last()
            .filter(|e| e.change_type == ChangeType::Removed)
            .map(|e| e.year)
    }
}

/// Fold change sets for consecutive boundaries into timelines.
///
/// Years in which a provision does not exist produce no entry. An empty
/// slice yields an empty map.
///
/// # Arguments
/// * `change_sets` - Change sets of one section for consecutive boundaries,
///   oldest first (`[y0→y1, y1→y2, ...]`).
///
/// # Returns
/// One timeline per provision history, keyed by the provision's last
/// identifier. A removed history whose identifier was reused is keyed
/// `<identifier>@removed<year>`.
///
/// # Errors
/// `InvalidTimeline` when the change sets cover different sections, when
/// a boundary does not move forward in time, or when consecutive change
/// sets do not share their boundary year.
pub fn aggregate(change_sets: &[ChangeSet]) -> Result<BTreeMap<String, Timeline>> {
    validate_chronology(change_sets)?;

    let mut chains: Vec<Chain> = Vec::new();
    // Identifier in the most recent year -> chain index.
    let mut open: HashMap<String, usize> = HashMap::new();

    for set in change_sets {
        let mut next_open = HashMap::new();

        for record in set.iter() {
            let continued = record
                .node_identifier_from
                .as_deref()
                .and_then(|id| open.get(id).copied());

            let index = match continued {
                Some(index) => index,
                None => {
                    chains.push(Chain {
                        identifier: record.identifier().to_string(),
                        entries: Vec::new(),
                    });
                    chains.len() - 1
                }
            };

            let chain = &mut chains[index];
            chain
                .entries
                .push(TimelineEntry::from_record(set.to_year, record));
            if let Some(to) = &record.node_identifier_to {
                chain.identifier.clone_from(to);
                next_open.insert(to.clone(), index);
            }
        }

        open = next_open;
    }

    let mut claims: HashMap<&str, usize> = HashMap::new();
    for chain in &chains {
        *claims.entry(chain.identifier.as_str()).or_default() += 1;
    }
    let shared: Vec<bool> = chains
        .iter()
        .map(|c| claims[c.identifier.as_str()] > 1)
        .collect();

    let mut timelines: BTreeMap<String, Timeline> = BTreeMap::new();
    for (chain, shared) in chains.into_iter().zip(shared) {
        let key = match chain.removed_in() {
            Some(year) if shared => format!("{}@removed{year}", chain.identifier),
            _ => chain.identifier.clone(),
        };
        timelines.insert(
            key,
            Timeline {
                identifier: chain.identifier,
                entries: chain.entries,
            },
        );
    }

    tracing::debug!(
        boundaries = change_sets.len(),
        timelines = timelines.len(),
        "Timelines aggregated"
    );

    Ok(timelines)
}

fn validate_chronology(change_sets: &[ChangeSet]) -> Result<()> {
    let Some(first) = change_sets.first() else {
        return Ok(());
    };

    for set in change_sets {
        if set.section_id != first.section_id {
            return Err(CoreError::InvalidTimeline(format!(
                "change sets cover both '{}' and '{}'",
                first.section_id, set.section_id
            )));
        }
        if set.from_year >= set.to_year {
            return Err(CoreError::InvalidTimeline(format!(
                "boundary {} -> {} does not move forward",
                set.from_year, set.to_year
            )));
        }
    }

    for pair in change_sets.windows(2) {
        if pair[0].to_year != pair[1].from_year {
            return Err(CoreError::InvalidTimeline(format!(
                "boundary ending in {} is followed by one starting in {}",
                pair[0].to_year, pair[1].from_year
            )));
        }
    }

    Ok(())
}
