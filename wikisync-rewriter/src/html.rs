//! Markup reference rewriting.
//!
//! The document is parsed with `tl` to find real tags. Only opening tags are
//! edited: URL attributes (`src`, `href`, `poster`, `data`, `action`),
//! `srcset` and inline `style="..."` values, plus the text of `<style>`
//! elements. Comments, text and `<script>` bodies are copied through
//! untouched. Edits are spliced into the original source so the rest of the
//! document keeps its exact formatting.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::css::rewrite_css;
use crate::links::LinkContext;

static URL_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)(\s(?:src|href|poster|data|action)\s*=\s*)(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#,
    )
    .expect("valid attribute regex")
});

static SRCSET_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(\ssrcset\s*=\s*)(?:"([^"]*)"|'([^']*)')"#).expect("valid srcset regex")
});

static STYLE_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(\sstyle\s*=\s*)(?:"([^"]*)"|'([^']*)')"#).expect("valid style regex")
});

/// Replacement of `source[start..end]`.
struct Edit {
    start: usize,
    end: usize,
    text: String,
}

pub fn rewrite_html(content: &str, links: &LinkContext<'_>) -> String {
    let dom = match tl::parse(content, tl::ParserOptions::default()) {
        Ok(dom) => dom,
        Err(e) => {
            tracing::warn!(
                "{}: could not parse markup ({e:?}); links left as written",
                links.source_path()
            );
            return content.to_string();
        }
    };
    let parser = dom.parser();
    let mut edits = Vec::new();
    for handle in dom.children() {
        collect_edits(*handle, parser, content, links, &mut edits);
    }
    splice(content, edits)
}

fn collect_edits(
    handle: tl::NodeHandle,
    parser: &tl::Parser<'_>,
    source: &str,
    links: &LinkContext<'_>,
    edits: &mut Vec<Edit>,
) {
    // Text and comments never carry references.
    let Some(tl::Node::Tag(tag)) = handle.get(parser) else {
        return;
    };

    if let Some(start) = offset_in(source, tag.raw().as_bytes()) {
        if source.as_bytes().get(start) == Some(&b'<') {
            let end = start + opening_tag_len(&source.as_bytes()[start..]);
            if let Some(open) = source.get(start..end) {
                let text = rewrite_opening_tag(open, links);
                if text != open {
                    edits.push(Edit { start, end, text });
                }
            }
        }
    }

    let name = tag.name().as_utf8_str().to_ascii_lowercase();
    match name.as_str() {
        "script" => {}
        "style" => {
            for child in tag.children().top().iter() {
                let Some(tl::Node::Raw(text)) = child.get(parser) else {
                    continue;
                };
                let bytes = text.as_bytes();
                let Some(start) = offset_in(source, bytes) else {
                    continue;
                };
                let end = start + bytes.len();
                if let Some(css) = source.get(start..end) {
                    let text = rewrite_css(css, links);
                    if text != css {
                        edits.push(Edit { start, end, text });
                    }
                }
            }
        }
        _ => {
            for child in tag.children().top().iter() {
                collect_edits(*child, parser, source, links, edits);
            }
        }
    }
}

/// Position of `part` inside `source`. The parser hands out slices of its
/// input, so this is plain pointer distance.
fn offset_in(source: &str, part: &[u8]) -> Option<usize> {
    let at = (part.as_ptr() as usize).checked_sub(source.as_ptr() as usize)?;
    (at + part.len() <= source.len()).then_some(at)
}

/// Length of the opening tag at the start of `tag`, up to and including the
/// first `>` outside a quoted attribute value.
fn opening_tag_len(tag: &[u8]) -> usize {
    let mut quote = None;
    for (i, &b) in tag.iter().enumerate() {
        match (quote, b) {
            (Some(q), _) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(b),
            (None, b'>') => return i + 1,
            (None, _) => {}
        }
    }
    tag.len()
}

fn rewrite_opening_tag(open: &str, links: &LinkContext<'_>) -> String {
    let attrs = URL_ATTR.replace_all(open, |caps: &Captures<'_>| {
        let (value, quote) = attr_value(caps);
        match links.rewrite_reference(value) {
            Some(url) => format!("{}{quote}{url}{quote}", &caps[1]),
            None => caps[0].to_string(),
        }
    });
    let srcsets = SRCSET_ATTR.replace_all(&attrs, |caps: &Captures<'_>| {
        let (value, quote) = attr_value(caps);
        format!("{}{quote}{}{quote}", &caps[1], rewrite_srcset(value, links))
    });
    STYLE_ATTR
        .replace_all(&srcsets, |caps: &Captures<'_>| {
            let (value, quote) = attr_value(caps);
            format!("{}{quote}{}{quote}", &caps[1], rewrite_css(value, links))
        })
        .into_owned()
}

fn splice(source: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by_key(|e| e.start);
    let mut out = String::with_capacity(source.len());
    let mut pos = 0;
    for edit in edits {
        if edit.start < pos {
            continue;
        }
        out.push_str(&source[pos..edit.start]);
        out.push_str(&edit.text);
        pos = edit.end;
    }
    out.push_str(&source[pos..]);
    out
}

fn attr_value<'c>(caps: &'c Captures<'_>) -> (&'c str, &'static str) {
    if let Some(m) = caps.get(2) {
        (m.as_str(), "\"")
    } else if let Some(m) = caps.get(3) {
        (m.as_str(), "'")
    } else {
        (caps.get(4).map_or("", |m| m.as_str()), "")
    }
}

/// `a.png 1x, b.png 2x` → each candidate URL rewritten, descriptors kept.
fn rewrite_srcset(value: &str, links: &LinkContext<'_>) -> String {
    value
        .split(',')
        .map(|candidate| {
            let candidate = candidate.trim();
            let (url, descriptor) = candidate
                .split_once(char::is_whitespace)
                .map_or((candidate, ""), |(u, d)| (u, d.trim()));
            let url = links
                .rewrite_reference(url)
                .unwrap_or_else(|| url.to_string());
            if descriptor.is_empty() {
                url
            } else {
                format!("{url} {descriptor}")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}
