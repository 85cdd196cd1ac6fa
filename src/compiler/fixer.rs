//! HTML structure fix-ups for the Bulma theme.
//!
//! Only tags and attributes are rewritten; text nodes are carried through
//! untouched. Rules apply to the direct children of the node being fixed, and
//! recursion descends through `section` elements only.
//!
//! | Source                          | Result                                   |
//! |---------------------------------|------------------------------------------|
//! | `<section>`                     | `class="content"`, its `h1`s `title`     |
//! | `<dl>`                          | `class="box has-background-success-light"` |
//! | `<table>`                       | `class="table"`                          |
//! | `<aside class="admonition …">`  | `div.message` with header and body       |

use crate::utils::xml::{Element, Node, XmlError, parse_fragment, write_fragment};
use thiserror::Error;

/// Admonition kind to Bulma message modifier.
const ADMONITION_CLASSES: &[(&str, &str)] = &[
    ("caution", "is-warning"),
    ("note", "is-info"),
    ("warning", "is-danger"),
    ("tip", "is-success"),
];

/// Moved into `message-body`, tag by tag.
const MESSAGE_BODY_TAGS: &[&str] = &["p", "ul"];

#[derive(Debug, Error)]
#[error("failed to fix HTML structure")]
pub struct FixError(#[from] XmlError);

/// Parse a fragment, fix it up and serialize it again.
pub fn fix_html(fragment: &str) -> Result<String, FixError> {
    let mut root = parse_fragment(fragment)?;
    fix(&mut root);
    Ok(write_fragment(&root)?)
}

/// Apply the theme rules to the direct children of `node`.
pub fn fix(node: &mut Element) {
    for child in &mut node.children {
        let Node::Element(elem) = child else {
            continue;
        };
        match elem.tag.as_str() {
            "section" => {
                elem.set_attr("class", "content");
                for h1 in elem.children_named_mut("h1") {
                    h1.set_attr("class", "title");
                }
                fix(elem);
            }
            "dl" => elem.set_attr("class", "box has-background-success-light"),
            "table" => elem.set_attr("class", "table"),
            "aside" if elem.has_class("admonition") => convert_admonition(elem),
            _ => {}
        }
    }
}

/// Turn an admonition `aside` into a Bulma message box.
fn convert_admonition(aside: &mut Element) {
    let mut class = String::from("message");
    for (kind, modifier) in ADMONITION_CLASSES {
        if aside.has_class(kind) {
            class.push(' ');
            class.push_str(modifier);
        }
    }
    aside.tag = "div".into();
    aside.set_attr("class", &class);

    let mut header = Element::new("div").with_attr("class", "message-header");
    for mut h1 in aside.take_children_named("h1") {
        h1.tag = "p".into();
        header.children.push(Node::Element(h1));
    }

    let mut body = Element::new("div").with_attr("class", "message-body");
    for tag in MESSAGE_BODY_TAGS {
        body.children
            .extend(aside.take_children_named(tag).into_iter().map(Node::Element));
    }

    // Appended after whatever was not moved (`pre`, `ol`), matching the theme's markup
    aside.children.push(Node::Element(header));
    aside.children.push(Node::Element(body));
}
