//! # wikisync-rewriter
//!
//! Rewrites relative references in HTML and CSS to the absolute URLs they
//! resolve to on the wiki.
//!
//! ## Usage
//!
//! ```rust
//! use wikisync_core::types::FileCategory;
//! use wikisync_rewriter::{rewriter_for, LinkContext};
//!
//! let resolver = |path: &str| (path == "logo.png").then(|| "https://w/logo.png".to_string());
//! let links = LinkContext::new("index.html", &resolver);
//! let html = r#"<img src="logo.png">"#;
//! let out = rewriter_for(FileCategory::Markup).unwrap().rewrite(html, &links);
//! assert_eq!(out, r#"<img src="https://w/logo.png">"#);
//! ```

pub mod css;
pub mod engine;
pub mod html;
pub mod links;

pub use engine::{rewriter_for, CssRewriter, HtmlRewriter, Rewrite, ScriptRewriter};
pub use links::{LinkContext, LinkResolver};
