//! End-to-end tests over fixture extracts of 18 U.S.C. § 922.
//!
//! 2010 and 2015 are nested markup, 2015 and 2020 are also available as
//! styled markup. Between 2010 and 2015 a new subsection (b) is inserted
//! and the old (b) and (c) move to (c) and (d). In 2020 subsection (c) is
//! amended and (d) gains clauses with no paragraph between them.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use pretty_assertions::assert_eq;

use lexhistory_core::{
    diff, normalize, ChangeType, CoreError, ErrorClass, HistoryService, Level, MemoryExtractSource,
    NodeFlag, ProvisionTree, RawExtract, SourceFormat, TreeKey,
};

const SECTION: &str = "/us/usc/t18/s922";

/// Load fixture file content.
fn load_fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("s922")
        .join(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to load {}: {}", path.display(), e))
}

fn format_of(name: &str) -> SourceFormat {
    if name.ends_with(".xml") {
        SourceFormat::Nested
    } else {
        SourceFormat::Styled
    }
}

fn tree(name: &str) -> ProvisionTree {
    let year: i32 = name[..4].parse().unwrap();
    let key = TreeKey::new(SECTION, year, format_of(name));
    normalize(&load_fixture(name), &key).unwrap()
}

fn id(suffix: &str) -> String {
    format!("{SECTION}/{suffix}")
}

fn service() -> HistoryService {
    let mut source = MemoryExtractSource::new();
    for name in ["2010.xml", "2015.xml", "2020.html"] {
        let year: i32 = name[..4].parse().unwrap();
        source.insert(
            SECTION,
            year,
            RawExtract::new(format_of(name), load_fixture(name)),
        );
    }
    HistoryService::new(source)
}

#[test]
fn test_both_representations_build_the_same_tree() {
    let nested = tree("2015.xml");
    let styled = tree("2015.html");

    assert_eq!(nested.to_view(), styled.to_view());

    let a = nested.get(&id("a")).unwrap();
    assert_eq!(a.heading.as_deref(), Some("In general"));
    assert_eq!(
        a.text,
        "It shall be unlawful— except as provided in this chapter."
    );
    assert_eq!(a.source_identifier.as_deref(), Some(id("a").as_str()));
    assert_eq!(
        nested.node(nested.root()).heading.as_deref(),
        Some("Unlawful acts")
    );
}

#[test]
fn test_skipped_markup_does_not_leak_into_text() {
    let tree = tree("2015.xml");
    let d = tree.get(&id("d")).unwrap();
    assert_eq!(
        d.text,
        "It shall be unlawful for any individual knowingly to possess a firearm in a school zone."
    );
    assert!(!tree.subtree_text(tree.root()).contains("Pub. L."));
}

#[test]
fn test_diff_against_itself_is_unchanged() {
    for name in ["2010.xml", "2015.html", "2020.html"] {
        let t = tree(name);
        let set = diff(&t, &t).unwrap();

        assert_eq!(set.iter().count(), t.len() - 1, "{name}");
        assert!(set.iter().all(|r| r.change_type == ChangeType::Unchanged
            && r.magnitude == 0.0
            && r.text_delta == 0));
    }
}

#[test]
fn test_structural_invariant_holds() {
    for name in ["2010.xml", "2015.xml", "2015.html", "2020.html"] {
        let t = tree(name);
        for node_id in t.iter() {
            let node = t.node(node_id);
            let Some(parent_id) = node.parent() else {
                assert_eq!(node.level, Level::Section);
                continue;
            };
            let parent = t.node(parent_id);
            assert_eq!(node.level.depth(), parent.level.depth() + 1, "{}", node.identifier);
            assert!(node
                .identifier
                .starts_with(&format!("{}/", parent.identifier)));
        }
    }
}

#[test]
fn test_inserted_subsection_does_not_shift_the_diff() {
    let set = diff(&tree("2010.xml"), &tree("2015.xml")).unwrap();

    let top: Vec<_> = set
        .records
        .iter()
        .map(|r| {
            (
                r.node_identifier_from.clone(),
                r.node_identifier_to.clone(),
                r.change_type,
            )
        })
        .collect();
    assert_eq!(
        top,
        vec![
            (Some(id("a")), Some(id("a")), ChangeType::Unchanged),
            (None, Some(id("b")), ChangeType::Added),
            (Some(id("b")), Some(id("c")), ChangeType::Unchanged),
            (Some(id("c")), Some(id("d")), ChangeType::Unchanged),
        ]
    );

    let amended = set.find(&id("a/2")).unwrap();
    assert_eq!(amended.change_type, ChangeType::Modified);
    assert_eq!(amended.text_delta, " or ammunition".chars().count() as i64);
    assert!(set.find(&id("c")).unwrap().renumbered);
}

#[test]
fn test_magnitude_bounds() {
    let sets = [
        diff(&tree("2010.xml"), &tree("2015.xml")).unwrap(),
        diff(&tree("2015.html"), &tree("2020.html")).unwrap(),
        diff(&tree("2010.xml"), &tree("2020.html")).unwrap(),
    ];

    for record in sets.iter().flat_map(|s| s.iter()) {
        assert!((0.0..=1.0).contains(&record.magnitude));
        match record.change_type {
            ChangeType::Added | ChangeType::Removed => assert_eq!(record.magnitude, 1.0),
            ChangeType::Unchanged => assert_eq!(record.magnitude, 0.0),
            ChangeType::Modified => assert!(record.magnitude < 1.0),
        }
    }
}

#[test]
fn test_level_gap_gets_synthetic_placeholders() {
    let t = tree("2020.html");

    let synthetic: Vec<_> = t
        .iter()
        .map(|id| t.node(id))
        .filter(|n| n.is_synthetic())
        .map(|n| (n.identifier.clone(), n.level))
        .collect();
    assert_eq!(
        synthetic,
        vec![
            (id("d/_"), Level::Paragraph),
            (id("d/_/_"), Level::Subparagraph),
        ]
    );

    let clause = t.id_of(&id("d/_/_/i")).unwrap();
    assert_eq!(t.path(clause).len(), 5);
    assert_eq!(t.node(clause).level, Level::Clause);
}

#[test]
fn test_unrecognized_style_is_kept_and_flagged() {
    let t = tree("2020.html");
    let last = t.get(&id("d/_/_/ii")).unwrap();
    assert!(last.has_flag(NodeFlag::UnrecognizedStyle));
    assert!(last.text.ends_with("restructured in 2018."));
}

#[test]
fn test_concurrent_diffs_are_identical() {
    let from = Arc::new(tree("2010.xml"));
    let to = Arc::new(tree("2020.html"));
    let before = ((*from).clone(), (*to).clone());

    let outputs: Vec<String> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let from = Arc::clone(&from);
                let to = Arc::clone(&to);
                scope.spawn(move || serde_json::to_string(&diff(&from, &to).unwrap()).unwrap())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(outputs.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(*from, before.0);
    assert_eq!(*to, before.1);
}

#[test]
fn test_single_year_timeline_is_empty() {
    let timelines = service().aggregate_timeline(SECTION, &[2015]).unwrap();

    assert_eq!(timelines.len(), tree("2015.xml").len() - 1);
    assert!(timelines.values().all(|t| t.entries.is_empty()));
}

#[test]
fn test_timeline_across_three_years() {
    let timelines = service()
        .aggregate_timeline(SECTION, &[2010, 2015, 2020])
        .unwrap();

    // Old (b) moved to (c) in 2015 and was amended in 2020.
    let moved = &timelines[&id("c")];
    let history: Vec<_> = moved
        .entries
        .iter()
        .map(|e| (e.year, e.change_type))
        .collect();
    assert_eq!(
        history,
        vec![(2015, ChangeType::Unchanged), (2020, ChangeType::Modified)]
    );
    assert_eq!(moved.entries[0].identifier_from.as_deref(), Some(id("b").as_str()));

    // The inserted (b) has no entry for the boundary before it existed.
    let inserted = &timelines[&id("b")];
    assert_eq!(inserted.entries.len(), 2);
    assert_eq!(inserted.entries[0].change_type, ChangeType::Added);

    // Clauses added in 2020 have a single entry.
    let clause = &timelines[&id("d/_/_/i")];
    assert_eq!(clause.entries.len(), 1);
    assert_eq!(clause.entries[0].year, 2020);
}

#[test]
fn test_missing_year_is_not_found() {
    let err = service()
        .aggregate_timeline(SECTION, &[2010, 2012])
        .unwrap_err();

    assert_eq!(
        err,
        CoreError::ExtractNotFound {
            section_id: SECTION.to_string(),
            year: 2012
        }
    );
    assert_eq!(err.class(), ErrorClass::NotFound);
}

#[test]
fn test_missing_section_is_distinct_from_missing_year() {
    let key = TreeKey::new("/us/usc/t18/s923", 2010, SourceFormat::Nested);
    let err = normalize(&load_fixture("2010.xml"), &key).unwrap_err();

    assert!(matches!(err, CoreError::SectionNotFound { .. }));
    assert_eq!(err.class(), ErrorClass::NotFound);
}

#[test]
fn test_diff_across_sections_is_rejected() {
    let other = normalize(
        r#"<div><p class="statutory-body">(a) Text.</p></div>"#,
        &TreeKey::new("/us/usc/t18/s923", 2015, SourceFormat::Styled),
    )
    .unwrap();

    let err = diff(&tree("2010.xml"), &other).unwrap_err();
    assert!(matches!(err, CoreError::SectionMismatch { .. }));
    assert_eq!(err.class(), ErrorClass::ContractViolation);
}
