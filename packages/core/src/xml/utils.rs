//! XML utility functions for navigating and extracting data from DOM trees.

use roxmltree::Node;

/// Get the tag name without namespace prefix.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use lexhistory_core::xml::get_tag_name;
///
/// let xml = r#"<uslm:section xmlns:uslm="http://xml.house.gov/schemas/uslm/1.0"/>"#;
/// let doc = Document::parse(xml).unwrap();
/// assert_eq!(get_tag_name(doc.root_element()), "section");
/// ```
pub fn get_tag_name<'a>(node: Node<'a, '_>) -> &'a str {
    node.tag_name().name()
}

/// Find the first child element with the given tag name.
pub fn find_child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|child| child.is_element() && get_tag_name(*child) == tag)
}

/// Check whether an element's `class` attribute contains `class_name`.
pub fn has_class(node: Node<'_, '_>, class_name: &str) -> bool {
    node.attribute("class")
        .is_some_and(|classes| classes.split_whitespace().any(|c| c == class_name))
}

/// Collect all descendant text of a node, in document order.
///
/// Elements whose tag name is in `skip` contribute nothing. Text nodes are
/// concatenated as-is; callers normalize whitespace afterwards.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use lexhistory_core::xml::collect_text;
///
/// let xml = "<content>Hello <ref>world</ref><note>x</note>!</content>";
/// let doc = Document::parse(xml).unwrap();
/// assert_eq!(collect_text(doc.root_element(), &["note"]), "Hello world!");
/// ```
pub fn collect_text(node: Node<'_, '_>, skip: &[&str]) -> String {
    let mut text = String::new();
    push_text(node, skip, &mut text);
    text
}

fn push_text(node: Node<'_, '_>, skip: &[&str], out: &mut String) {
    for child in node.children() {
        if child.is_text() {
            if let Some(t) = child.text() {
                out.push_str(t);
            }
        } else if child.is_element() && !skip.contains(&get_tag_name(child)) {
            push_text(child, skip, out);
        }
    }
}
