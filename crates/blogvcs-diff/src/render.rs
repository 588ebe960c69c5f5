//! Inline markup for edit scripts.
//!
//! Every piece of text, whatever its kind, is HTML-escaped before it is
//! placed in the output, so a diffed string can never break out of the
//! `<ins>`/`<del>` wrappers.

use serde::{Deserialize, Serialize};

use crate::script::{EditScript, OpKind};

/// Class hooks attached to the insertion and deletion markers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkupStyle {
    pub insert_class: String,
    pub delete_class: String,
}

impl Default for MarkupStyle {
    fn default() -> Self {
        Self {
            insert_class: "vcs-ins".into(),
            delete_class: "vcs-del".into(),
        }
    }
}

/// Render a script with the default `vcs-ins` / `vcs-del` classes.
pub fn render(script: &EditScript) -> String {
    render_with(script, &MarkupStyle::default())
}

/// Render a script as inline markup.
///
/// Equal runs are emitted escaped, insertions wrapped in `<ins>`, deletions
/// wrapped in `<del>`.
pub fn render_with(script: &EditScript, style: &MarkupStyle) -> String {
    let ins_open = format!("<ins class=\"{}\">", escape_html(&style.insert_class));
    let del_open = format!("<del class=\"{}\">", escape_html(&style.delete_class));

    let capacity = script.iter().map(|op| op.text.len() + 32).sum();
    let mut out = String::with_capacity(capacity);
    for op in script {
        match op.kind {
            OpKind::Equal => push_escaped(&mut out, &op.text),
            OpKind::Insert => {
                out.push_str(&ins_open);
                push_escaped(&mut out, &op.text);
                out.push_str("</ins>");
            }
            OpKind::Delete => {
                out.push_str(&del_open);
                push_escaped(&mut out, &op.text);
                out.push_str("</del>");
            }
        }
    }
    out
}

/// Escape the five HTML-special characters.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    push_escaped(&mut out, text);
    out
}

fn push_escaped(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
}
