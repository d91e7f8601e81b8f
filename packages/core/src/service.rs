//! In-process entry point for the serving layer.
//!
//! [`HistoryService`] ties an [`ExtractSource`] to the tree cache and the
//! diff engine. The core performs no I/O itself; whatever the source does
//! to obtain raw extracts is the caller's concern.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::cache::TreeCache;
use crate::config::{validate_section_id, validate_years, EngineConfig};
use crate::diff::{ChangeSet, DiffEngine};
use crate::error::{CoreError, Result};
use crate::timeline::{aggregate, Timeline};
use crate::tree::ProvisionTree;
use crate::types::{SourceFormat, TreeKey};

/// Raw markup of one section in one year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawExtract {
    pub format: SourceFormat,
    pub content: String,
}

impl RawExtract {
    pub fn new(format: SourceFormat, content: impl Into<String>) -> Self {
        Self {
            format,
            content: content.into(),
        }
    }
}

/// Supplier of raw extracts.
///
/// Implementations return `ExtractNotFound` when no extract exists for the
/// requested year.
pub trait ExtractSource: Send + Sync {
    fn fetch(&self, section_id: &str, year: i32) -> Result<RawExtract>;
}

/// Extracts held in memory, keyed by section and year.
#[derive(Debug, Clone, Default)]
pub struct MemoryExtractSource {
    extracts: HashMap<(String, i32), RawExtract>,
}

impl MemoryExtractSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an extract, replacing any previous one for the same year.
    pub fn insert(&mut self, section_id: impl Into<String>, year: i32, extract: RawExtract) {
        self.extracts.insert((section_id.into(), year), extract);
    }

    #[must_use]
    pub fn with_extract(
        mut self,
        section_id: impl Into<String>,
        year: i32,
        extract: RawExtract,
    ) -> Self {
        self.insert(section_id, year, extract);
        self
    }

    /// Years with an extract for `section_id`, ascending.
    #[must_use]
    pub fn years(&self, section_id: &str) -> Vec<i32> {
        let mut years: Vec<i32> = self
            .extracts
            .keys()
            .filter(|(id, _)| id == section_id)
            .map(|(_, year)| *year)
            .collect();
        years.sort_unstable();
        years
    }
}

impl ExtractSource for MemoryExtractSource {
    fn fetch(&self, section_id: &str, year: i32) -> Result<RawExtract> {
        self.extracts
            .get(&(section_id.to_string(), year))
            .cloned()
            .ok_or_else(|| CoreError::ExtractNotFound {
                section_id: section_id.to_string(),
                year,
            })
    }
}

/// Trees, diffs and timelines for sections supplied by an extract source.
pub struct HistoryService {
    source: Box<dyn ExtractSource>,
    cache: TreeCache,
    engine: DiffEngine,
}

impl HistoryService {
    /// Service with the default engine configuration.
    pub fn new(source: impl ExtractSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            cache: TreeCache::new(),
            engine: DiffEngine::default(),
        }
    }

    /// Service with a custom engine configuration.
    pub fn with_config(source: impl ExtractSource + 'static, config: EngineConfig) -> Result<Self> {
        Ok(Self {
            source: Box::new(source),
            cache: TreeCache::new(),
            engine: DiffEngine::new(config)?,
        })
    }

    #[must_use]
    pub fn cache(&self) -> &TreeCache {
        &self.cache
    }

    /// Provision tree of `section_id` in `year`, built at most once per
    /// distinct extract.
    pub fn tree(&self, section_id: &str, year: i32) -> Result<Arc<ProvisionTree>> {
        validate_section_id(section_id)?;
        let extract = self.source.fetch(section_id, year)?;
        let key = TreeKey::new(section_id, year, extract.format);
        self.cache.get_or_build(&extract.content, &key)
    }

    /// Changes of `section_id` from `from_year` to `to_year`.
    pub fn diff_years(&self, section_id: &str, from_year: i32, to_year: i32) -> Result<ChangeSet> {
        let from = self.tree(section_id, from_year)?;
        let to = self.tree(section_id, to_year)?;
        self.engine.diff(&from, &to)
    }

    /// Per-provision histories over `years`, which must be strictly
    /// increasing.
    ///
    /// With a single year there is no boundary to cross: every provision of
    /// that year maps to an empty timeline.
    ///
    /// # Errors
    /// `InvalidTimeline` for an empty or unordered year list,
    /// `ExtractNotFound` when any year has no extract, and any error from
    /// building or diffing the trees.
    pub fn aggregate_timeline(
        &self,
        section_id: &str,
        years: &[i32],
    ) -> Result<BTreeMap<String, Timeline>> {
        validate_years(years)?;

        let trees = years
            .iter()
            .map(|year| self.tree(section_id, *year))
            .collect::<Result<Vec<_>>>()?;

        if let [tree] = trees.as_slice() {
            return Ok(tree
                .iter()
                .filter(|id| *id != tree.root())
                .map(|id| {
                    let identifier = tree.node(id).identifier.clone();
                    (identifier.clone(), Timeline::empty(identifier))
                })
                .collect());
        }

        let change_sets = trees
            .windows(2)
            .map(|pair| self.engine.diff(&pair[0], &pair[1]))
            .collect::<Result<Vec<_>>>()?;

        aggregate(&change_sets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::ChangeType;

    const SECTION: &str = "/us/usc/t18/s922";

    fn styled(body: &str) -> RawExtract {
        RawExtract::new(SourceFormat::Styled, format!("<div>{body}</div>"))
    }

    fn service() -> HistoryService {
        let source = MemoryExtractSource::new()
            .with_extract(
                SECTION,
                2010,
                styled(r#"<p class="statutory-body">(a) X</p><p class="statutory-body">(b) Possession of firearms</p>"#),
            )
            .with_extract(
                SECTION,
                2015,
                styled(r#"<p class="statutory-body">(a) X</p><p class="statutory-body">(b) Manufacture</p><p class="statutory-body">(c) Possession of firearms</p>"#),
            );
        HistoryService::new(source)
    }

    #[test]
    fn test_tree_is_cached() {
        let service = service();
        let first = service.tree(SECTION, 2010).unwrap();
        let second = service.tree(SECTION, 2010).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(service.cache().build_count(), 1);
    }

    #[test]
    fn test_missing_year_is_not_found() {
        let err = service().tree(SECTION, 2020).unwrap_err();
        assert_eq!(
            err,
            CoreError::ExtractNotFound {
                section_id: SECTION.to_string(),
                year: 2020
            }
        );
    }

    #[test]
    fn test_diff_years() {
        let set = service().diff_years(SECTION, 2010, 2015).unwrap();
        assert_eq!(set.summary().added, 1);
        assert_eq!(
            set.find(&format!("{SECTION}/c")).unwrap().change_type,
            ChangeType::Unchanged
        );
    }

    #[test]
    fn test_single_year_timeline_is_empty() {
        let timelines = service().aggregate_timeline(SECTION, &[2010]).unwrap();
        assert_eq!(timelines.len(), 2);
        assert!(timelines.values().all(Timeline::is_empty));
    }

    #[test]
    fn test_timeline_over_two_years() {
        let timelines = service()
            .aggregate_timeline(SECTION, &[2010, 2015])
            .unwrap();
        assert_eq!(timelines.len(), 3);
        assert_eq!(
            timelines[&format!("{SECTION}/b")].entries[0].change_type,
            ChangeType::Added
        );
    }

    #[test]
    fn test_memory_source_years() {
        let source = MemoryExtractSource::new()
            .with_extract(SECTION, 2015, styled(""))
            .with_extract(SECTION, 2010, styled(""))
            .with_extract("/other", 2000, styled(""));
        assert_eq!(source.years(SECTION), vec![2010, 2015]);
    }
}
