use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// A complete tag, closing tag or comment. Attributes must carry a value, so
/// `a<b and c>d` reads as text rather than a `<b>` element.
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)<!--.*?-->|</[A-Za-z][A-Za-z0-9-]*\s*>|<[A-Za-z][A-Za-z0-9-]*(?:\s+[A-Za-z_:][-A-Za-z0-9_:.]*\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'=<>`]+))*\s*/?>"#,
    )
    .expect("valid tag regex")
});

/// Strips markup from admin-entered text before it is stored.
///
/// Question and option text are rendered verbatim by the quiz screens, so no
/// tag survives, and `<script>`/`<style>` lose their content too:
/// `<b>2</b> + 2` is stored as `2 + 2`. A `<` that does not open a tag is
/// escaped first and comes back unchanged: `a<b` stays `a<b`.
pub fn clean_text(input: &str) -> String {
    let cleaned = ammonia::Builder::new()
        .tags(HashSet::new())
        .clean(&escape_stray_lt(input))
        .to_string();
    // Undo the entity escaping ammonia applies to bare text. `&amp;` last.
    cleaned
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", "\u{a0}")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

fn escape_stray_lt(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last = 0;
    for tag in TAG_RE.find_iter(input) {
        out.push_str(&input[last..tag.start()].replace('<', "&lt;"));
        out.push_str(tag.as_str());
        last = tag.end();
    }
    out.push_str(&input[last..].replace('<', "&lt;"));
    out
}
