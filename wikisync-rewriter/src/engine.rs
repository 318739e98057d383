//! Per-category rewriters.
//!
//! | Category    | Rewriter            | References rewritten                          |
//! |-------------|---------------------|-----------------------------------------------|
//! | Markup      | [`HtmlRewriter`]    | URL attributes, `srcset`, inline CSS          |
//! | Stylesheet  | [`CssRewriter`]     | `url(...)`, `@import "..."`                   |
//! | Script      | [`ScriptRewriter`]  | none, content passes through unchanged        |
//! | Asset       | —                   | uploaded verbatim, never rewritten            |

use wikisync_core::types::FileCategory;

use crate::css::rewrite_css;
use crate::html::rewrite_html;
use crate::links::LinkContext;

/// Capability shared by every code category.
pub trait Rewrite {
    fn rewrite(&self, content: &str, links: &LinkContext<'_>) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlRewriter;

#[derive(Debug, Clone, Copy, Default)]
pub struct CssRewriter;

#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptRewriter;

impl Rewrite for HtmlRewriter {
    fn rewrite(&self, content: &str, links: &LinkContext<'_>) -> String {
        rewrite_html(content, links)
    }
}

impl Rewrite for CssRewriter {
    fn rewrite(&self, content: &str, links: &LinkContext<'_>) -> String {
        rewrite_css(content, links)
    }
}

impl Rewrite for ScriptRewriter {
    fn rewrite(&self, content: &str, _links: &LinkContext<'_>) -> String {
        content.to_string()
    }
}

/// Rewriter for a category; `None` for assets and unsupported files.
pub fn rewriter_for(category: FileCategory) -> Option<&'static dyn Rewrite> {
    match category {
        FileCategory::Markup => Some(&HtmlRewriter),
        FileCategory::Stylesheet => Some(&CssRewriter),
        FileCategory::Script => Some(&ScriptRewriter),
        FileCategory::Asset | FileCategory::Unsupported => None,
    }
}
