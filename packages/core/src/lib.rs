//! Lexhistory core - provision trees and their history across years.
//!
//! This crate normalizes two legislative markup representations into one
//! canonical provision tree per (section, year), diffs trees of the same
//! section across years, and folds the diffs into per-provision timelines.
//!
//! # Example
//!
//! ```
//! use lexhistory_core::{diff, normalize, ChangeType, SourceFormat, TreeKey};
//!
//! let section = "/us/usc/t18/s922";
//! let old = r#"<div>
//!     <p class="statutory-body">(a) X</p>
//!     <p class="statutory-body">(b) Possession of firearms</p>
//! </div>"#;
//! let new = r#"<div>
//!     <p class="statutory-body">(a) X</p>
//!     <p class="statutory-body">(b) Manufacture of firearms</p>
//!     <p class="statutory-body">(c) Possession of firearms</p>
//! </div>"#;
//!
//! let from = normalize(old, &TreeKey::new(section, 2010, SourceFormat::Styled)).unwrap();
//! let to = normalize(new, &TreeKey::new(section, 2015, SourceFormat::Styled)).unwrap();
//! let changes = diff(&from, &to).unwrap();
//!
//! let moved = changes.find("/us/usc/t18/s922/c").unwrap();
//! assert_eq!(moved.change_type, ChangeType::Unchanged);
//! assert_eq!(moved.node_identifier_from.as_deref(), Some("/us/usc/t18/s922/b"));
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Constants, validation and engine configuration
//! - [`error`]: Error types and Result alias
//! - [`types`]: Levels, flat items and tree keys
//! - [`text`]: Text normalization helpers
//! - [`xml`]: XML utilities
//! - [`normalize`]: Format normalizers for both markup representations
//! - [`tree`]: Provision trees and the hierarchy reconstructor
//! - [`diff`]: Sibling alignment and the tree diff engine
//! - [`timeline`]: Timeline aggregation
//! - [`cache`]: Tree cache with in-flight build coalescing
//! - [`service`]: Extract sources and the history service

pub mod cache;
pub mod config;
pub mod diff;
pub mod error;
pub mod normalize;
pub mod service;
pub mod text;
pub mod timeline;
pub mod tree;
pub mod types;
pub mod xml;

// Re-export main functions
pub use diff::diff;
pub use normalize::normalize;
pub use timeline::aggregate;

// Re-export commonly used items
pub use cache::{CacheKey, TreeCache};
pub use config::EngineConfig;
pub use diff::{ChangeRecord, ChangeSet, ChangeType, DiffEngine};
pub use error::{CoreError, ErrorClass, Result};
pub use service::{ExtractSource, HistoryService, MemoryExtractSource, RawExtract};
pub use timeline::{Timeline, TimelineEntry};
pub use tree::{NodeId, ProvisionNode, ProvisionTree};
pub use types::{FlatItem, Level, NodeFlag, SourceFormat, TreeKey};
