//! XML helpers shared by both markup representations.

mod utils;

pub use utils::{collect_text, find_child, get_tag_name, has_class};
