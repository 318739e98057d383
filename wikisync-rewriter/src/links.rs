//! Reference resolution shared by the HTML and CSS rewriters.
//!
//! A reference found in a source file (`../img/logo.png?v=2#top`) is turned
//! into a normalized local path relative to the source root
//! (`img/logo.png`), handed to a [`LinkResolver`], and the resulting URL gets
//! the original fragment re-attached. Anything that is not a local reference
//! (absolute URLs, `mailto:`, `data:`, in-page anchors) is left alone.

use std::borrow::Cow;

use percent_encoding::percent_decode_str;

/// Maps a normalized local path to the remote URL it will be reachable at.
pub trait LinkResolver {
    fn resolve(&self, local_path: &str) -> Option<String>;
}

impl<F> LinkResolver for F
where
    F: Fn(&str) -> Option<String>,
{
    fn resolve(&self, local_path: &str) -> Option<String> {
        self(local_path)
    }
}

/// Resolution context for one source file.
pub struct LinkContext<'a> {
    source_path: &'a str,
    resolver: &'a dyn LinkResolver,
}

impl<'a> LinkContext<'a> {
    /// `source_path` is the manifest key of the file being rewritten.
    pub fn new(source_path: &'a str, resolver: &'a dyn LinkResolver) -> Self {
        Self {
            source_path,
            resolver,
        }
    }

    pub fn source_path(&self) -> &str {
        self.source_path
    }

    /// Remote URL for `reference`, or `None` when it should stay untouched.
    pub fn rewrite_reference(&self, reference: &str) -> Option<String> {
        let reference = reference.trim();
        if !is_local(reference) {
            return None;
        }
        let (path, fragment) = match reference.split_once('#') {
            Some((path, fragment)) => (path, Some(fragment)),
            None => (reference, None),
        };
        let path = path.split_once('?').map_or(path, |(p, _)| p);
        let target = resolve_relative(self.source_path, path)?;

        let Some(url) = self.resolver.resolve(&target) else {
            tracing::debug!(
                "{}: no remote URL for `{reference}` ({target}); left as is",
                self.source_path
            );
            return None;
        };
        Some(match fragment {
            Some(f) if !f.is_empty() => format!("{url}#{f}"),
            _ => url,
        })
    }
}

/// `true` for references that point into the source tree.
pub fn is_local(reference: &str) -> bool {
    if reference.is_empty()
        || reference.starts_with('#')
        || reference.starts_with("//")
        || reference.starts_with('{')
        || reference.starts_with('$')
    {
        return false;
    }
    // A `:` before the first path/query/fragment delimiter means a scheme.
    let head_end = reference.find(['/', '?', '#']).unwrap_or(reference.len());
    !reference[..head_end].contains(':')
}

/// Join `reference` onto the directory of `source_path` and normalize it.
///
/// Leading `/` anchors at the source root. Returns `None` when the path
/// climbs above the root. A trailing `/` points at the directory's
/// `index.html`.
pub fn resolve_relative(source_path: &str, reference: &str) -> Option<String> {
    let decoded: Cow<'_, str> = percent_decode_str(reference)
        .decode_utf8()
        .unwrap_or(Cow::Borrowed(reference));

    let mut parts: Vec<&str> = if decoded.starts_with('/') {
        Vec::new()
    } else {
        let mut dir: Vec<&str> = source_path.split('/').filter(|s| !s.is_empty()).collect();
        dir.pop();
        dir
    };
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            s => parts.push(s),
        }
    }
    if decoded.is_empty() || decoded.ends_with('/') {
        parts.push("index.html");
    }
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}
