//! Enumeration documentation recovered from free-text schema comments.
//!
//! Many schemas document enumeration values in XML comments rather than in
//! `xs:annotation` elements. The declaration of a value is located inside the
//! text of its own `simpleType`, then the comment right after it or right
//! before it is taken as its documentation. Comments that list several values
//! (`A = Active, B = Blocked`) are the last resort.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::xml::writer::escape_attribute;

static DECLARATION: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r#"<(?:[\w.-]+:)?enumeration\s+value\s*=\s*(?:"([^"]*)"|'([^']*)')[^>]*>"#).ok()
});
static OPENING: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r#"<(?:[\w.-]+:)?(simpleType|element)\s[^>]*?\bname\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .ok()
});
static SIMPLE_TYPE_END: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"</(?:[\w.-]+:)?simpleType\s*>").ok());
static COMMENT: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(?s)<!--(.*?)-->").ok());

/// Which declaration owns the enumeration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Owner {
    /// A named top-level `simpleType`
    SimpleType,
    /// An element with an inline `simpleType`
    Element,
}

impl Owner {
    const fn tag(self) -> &'static str {
        match self {
            Self::SimpleType => "simpleType",
            Self::Element => "element",
        }
    }
}

/// Text of the first `simpleType` owned by the named declaration, together
/// with the comments directly above the declaration. The whole source when
/// the declaration cannot be located.
pub fn scope<'s>(source: &'s str, owner: Owner, name: &str) -> &'s str {
    declaration_span(source, owner, name)
        .and_then(|(start, end)| source.get(start..end))
        .unwrap_or(source)
}

fn declaration_span(source: &str, owner: Owner, name: &str) -> Option<(usize, usize)> {
    let opening = OPENING.as_ref()?.captures_iter(source).find(|caps| {
        caps.get(1).is_some_and(|tag| tag.as_str() == owner.tag())
            && quoted(caps).is_some_and(|found| found == name || found == escape_attribute(name))
    })?;
    let tag = opening.get(0)?;
    let end = SIMPLE_TYPE_END.as_ref()?.find_at(source, tag.end())?.end();
    Some((leading_comments_start(source, tag.start()), end))
}

/// Start of the run of comments that ends right before `start`
fn leading_comments_start(source: &str, mut start: usize) -> usize {
    while let Some(open) = source
        .get(..start)
        .map(str::trim_end)
        .and_then(|before| before.strip_suffix("-->"))
        .and_then(|body| body.rfind("<!--"))
    {
        start = open;
    }
    start
}

/// Attribute value captured by one of the two quote alternatives
fn quoted<'h>(caps: &regex::Captures<'h>) -> Option<&'h str> {
    caps.get(2).or_else(|| caps.get(3)).map(|m| m.as_str())
}

/// Comment documenting `value`, searched around its enumeration declaration
/// inside `scope`
pub fn recover(scope: &str, value: &str) -> Option<String> {
    let declaration = DECLARATION.as_ref()?;
    let escaped = escape_attribute(value);
    let mut same_line = None;
    let mut preceding = None;
    let mut next_line = None;

    let matches = declaration.captures_iter(scope).filter_map(|caps| {
        let found = quoted(&caps)?;
        let whole = caps.get(0)?;
        (found == escaped || found == value).then_some((whole.start(), whole.end()))
    });
    for (start, end) in matches {
        let after = scope.get(end..).unwrap_or_default();
        let before = scope.get(..start).unwrap_or_default();
        if same_line.is_none() {
            same_line = comment_after(after, false);
        }
        if preceding.is_none() {
            preceding = comment_before(before);
        }
        if next_line.is_none() {
            next_line = comment_after(after, true);
        }
    }

    same_line
        .or(preceding)
        .or(next_line)
        .or_else(|| listed_in_comment(scope, value))
        .map(|comment| strip_value_prefix(&comment, value))
        .filter(|doc| !doc.is_empty())
}

/// Comment starting right after a declaration, optionally past a line break
fn comment_after(after: &str, allow_newline: bool) -> Option<String> {
    let after = skip_closing_tag(after);
    let gap_len = after.len() - after.trim_start().len();
    let gap = after.get(..gap_len).unwrap_or_default();
    if gap.contains('\n') != allow_newline {
        return None;
    }
    if gap.matches('\n').count() > 1 {
        return None;
    }
    let rest = after.get(gap_len..)?.strip_prefix("<!--")?;
    let end = rest.find("-->")?;
    Some(rest.get(..end)?.trim().to_string())
}

/// Text past an `</enumeration>` that directly follows the opening tag
fn skip_closing_tag(after: &str) -> &str {
    let trimmed = after.trim_start();
    let Some(tag) = trimmed.strip_prefix("</") else {
        return after;
    };
    match tag.find('>') {
        Some(end) if tag.get(..end).is_some_and(|name| name.trim_end().ends_with("enumeration")) => {
            tag.get(end + 1..).unwrap_or_default()
        }
        _ => after,
    }
}

/// Comment ending right before a declaration, on the same or previous line
fn comment_before(before: &str) -> Option<String> {
    let trimmed = before.trim_end();
    if before.get(trimmed.len()..)?.matches('\n').count() > 1 {
        return None;
    }
    let body = trimmed.strip_suffix("-->")?;
    let start = body.rfind("<!--")?;
    let comment = body.get(start + 4..)?;
    // a comment closed after another declaration on its line belongs to that one
    let line_start = body.get(..start)?.rfind('\n').map_or(0, |i| i + 1);
    let line_prefix = body.get(line_start..start)?;
    if line_prefix.contains("enumeration") {
        return None;
    }
    Some(comment.trim().to_string())
}

/// `value = text` inside any comment that enumerates several values
fn listed_in_comment(scope: &str, value: &str) -> Option<String> {
    let found = COMMENT
        .as_ref()?
        .captures_iter(scope)
        .filter_map(|caps| caps.get(1))
        .find_map(|comment| listed_entry(comment.as_str(), value));
    found
}

fn listed_entry(comment: &str, value: &str) -> Option<String> {
    if value.is_empty() {
        return None;
    }
    comment.match_indices(value).find_map(|(at, _)| {
        let boundary = comment
            .get(..at)?
            .chars()
            .next_back()
            .map_or(true, |c| c.is_whitespace() || matches!(c, ',' | ';' | '('));
        if !boundary {
            return None;
        }
        let rest = comment.get(at + value.len()..)?.trim_start();
        let rest = rest.strip_prefix(['=', ':', '-'])?.trim_start();
        let end = rest.find([',', ';', '\n', ')']).unwrap_or(rest.len());
        let doc = rest.get(..end)?.trim();
        (!doc.is_empty()).then(|| doc.to_string())
    })
}

/// `A - Active` documents value `A` as `Active`
fn strip_value_prefix(comment: &str, value: &str) -> String {
    comment
        .strip_prefix(value)
        .map(|rest| rest.trim_start())
        .and_then(|rest| rest.strip_prefix(['=', ':', '-']))
        .map_or(comment, str::trim)
        .to_string()
}
