//! HTML payload post-processing.
//!
//! Models honor the "full HTML structure" instruction inconsistently, so
//! every `text/html` payload passes through three ordered fixups that
//! guarantee uniform presentation without rejecting non-conformant replies:
//!
//! 1. A payload with no `<html` tag is a bare fragment: wrap it in a full
//!    document with the shared style block and a trailing back link.
//! 2. A document without a `<style` tag gets the shared style block
//!    injected before `</head>`.
//! 3. A document whose body lacks the `back-to-search` marker gets the back
//!    link inserted before `</body>`.
//!
//! Each fixup is idempotent; processing twice yields the same document as
//! processing once. The splicing is deliberately substring-based and kept
//! behind this module's contract so it could move to a document-tree
//! implementation without observable change.

use crate::path::RequestPath;
use crate::templates::{BACK_LINK, CONTENT_STYLE};

/// Normalize a generated HTML payload for the given request path.
pub fn process_html(html: &str, path: &RequestPath) -> String {
    let lower = html.to_ascii_lowercase();

    if !lower.contains("<html") {
        return wrap_fragment(html, path);
    }

    let mut out = html.to_string();

    if !lower.contains("<style") {
        out = inject_before(&out, "</head>", &format!("    {CONTENT_STYLE}\n"), FindFrom::Start);
    }

    let lower = out.to_ascii_lowercase();
    if !lower.contains("back-to-search") && lower.contains("</body>") {
        out = inject_before(&out, "</body>", &format!("\n{BACK_LINK}\n"), FindFrom::End);
    }

    out
}

/// Wrap a bare HTML fragment in a full document shell.
fn wrap_fragment(fragment: &str, path: &RequestPath) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    {style}
</head>
<body>
    {fragment}
    {back}
</body>
</html>"#,
        title = path.display_title(),
        style = CONTENT_STYLE,
        back = BACK_LINK,
    )
}

enum FindFrom {
    Start,
    End,
}

/// Insert `insertion` immediately before the case-insensitive `marker`.
/// Returns the input unchanged when the marker is absent.
fn inject_before(html: &str, marker: &str, insertion: &str, from: FindFrom) -> String {
    let lower = html.to_ascii_lowercase();
    let idx = match from {
        FindFrom::Start => lower.find(marker),
        FindFrom::End => lower.rfind(marker),
    };
    match idx {
        Some(i) => {
            let mut out = String::with_capacity(html.len() + insertion.len());
            out.push_str(&html[..i]);
            out.push_str(insertion);
            out.push_str(&html[i..]);
            out
        }
        None => html.to_string(),
    }
}
