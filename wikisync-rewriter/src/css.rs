//! Stylesheet reference rewriting: `url(...)` and `@import "..."`.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::links::LinkContext;

static URL_FN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)url\(\s*(?:"([^"]*)"|'([^']*)'|([^)"'\s]*))\s*\)"#)
        .expect("valid url() regex")
});

static IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)@import\s+(?:"([^"]*)"|'([^']*)')"#).expect("valid @import regex")
});

/// Rewrite every local reference in CSS text. The markup rewriter reuses it
/// for `<style>` blocks and `style="..."` attributes.
pub fn rewrite_css(content: &str, links: &LinkContext<'_>) -> String {
    let with_urls = URL_FN.replace_all(content, |caps: &Captures<'_>| {
        let (value, quote) = quoted_value(caps);
        match links.rewrite_reference(value) {
            Some(url) => format!("url({quote}{url}{quote})"),
            None => caps[0].to_string(),
        }
    });
    IMPORT
        .replace_all(&with_urls, |caps: &Captures<'_>| {
            let (value, quote) = quoted_value(caps);
            match links.rewrite_reference(value) {
                Some(url) => format!("@import {quote}{url}{quote}"),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Value and quote character of a `"..."` / `'...'` / bare alternative in
/// capture groups 1, 2, 3.
fn quoted_value<'c>(caps: &'c Captures<'_>) -> (&'c str, &'static str) {
    if let Some(m) = caps.get(1) {
        (m.as_str(), "\"")
    } else if let Some(m) = caps.get(2) {
        (m.as_str(), "'")
    } else {
        (caps.get(3).map_or("", |m| m.as_str()), "")
    }
}
