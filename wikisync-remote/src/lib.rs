//! # wikisync-remote
//!
//! HTTP implementation of [`wikisync_core::RemoteSite`] for the iGEM wiki:
//! account login, MediaWiki page edits and file uploads over a persistent
//! cookie session.

pub mod client;
pub mod error;
pub mod multipart;
pub mod session;

pub use client::{page_title, WikiClient, LOGIN_URL};
pub use error::SessionError;
pub use session::CookieJarLoad;
