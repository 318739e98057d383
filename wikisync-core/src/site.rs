//! Remote URL layout of a team wiki.
//!
//! | Source            | Link URL                                                       |
//! |-------------------|----------------------------------------------------------------|
//! | `index.html`      | `https://<year>.igem.org/Team:<Team>`                          |
//! | `a/b.html`        | `https://<year>.igem.org/Team:<Team>/a/b`                      |
//! | `a/index.html`    | `https://<year>.igem.org/Team:<Team>/a`                        |
//! | `css/site.css`    | `…/Template:<Team>/CSS/css/site?action=raw&ctype=text/css`     |
//! | `js/app.js`       | `…/Template:<Team>/JS/js/app?action=raw&ctype=text/javascript` |
//! | `img/logo.png`    | uploaded as `T--<Team>--img--logo.png`, URL assigned remotely  |
//!
//! Page URLs depend only on team, year and path, so pages can link to each
//! other before either has been uploaded.

use crate::types::FileCategory;

/// Team identity plus competition year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteLayout {
    team: String,
    year: u16,
}

impl SiteLayout {
    pub fn new(team: &str, year: u16) -> Self {
        Self {
            team: team.trim().replace(' ', "_"),
            year,
        }
    }

    /// Team name as it appears in URLs (spaces replaced by `_`).
    pub fn team(&self) -> &str {
        &self.team
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    /// `https://<year>.igem.org`
    pub fn base_url(&self) -> String {
        format!("https://{}.igem.org", self.year)
    }

    /// `https://<year>.igem.org/Team:<Team>`, which identifies the wiki a
    /// manifest was recorded for.
    pub fn home_url(&self) -> String {
        format!("{}/Team:{}", self.base_url(), self.team)
    }

    /// MediaWiki API endpoint of the year's wiki.
    pub fn api_url(&self) -> String {
        format!("{}/wiki/api.php", self.base_url())
    }

    /// Deterministic link URL for a code file; `None` for assets and
    /// unsupported files, whose URLs are assigned by the platform.
    pub fn link_url(&self, rel_path: &str, category: FileCategory) -> Option<String> {
        let stem = strip_extension(rel_path).replace(' ', "_");
        let base = self.base_url();
        let team = &self.team;
        match category {
            FileCategory::Markup => {
                let page = match stem.rsplit_once('/') {
                    Some((dir, "index")) => format!("/{dir}"),
                    None if stem == "index" => String::new(),
                    _ => format!("/{stem}"),
                };
                Some(format!("{}{page}", self.home_url()))
            }
            FileCategory::Stylesheet => Some(format!(
                "{base}/Template:{team}/CSS/{stem}?action=raw&ctype=text/css"
            )),
            FileCategory::Script => Some(format!(
                "{base}/Template:{team}/JS/{stem}?action=raw&ctype=text/javascript"
            )),
            FileCategory::Asset | FileCategory::Unsupported => None,
        }
    }

    /// Filename requested when uploading an asset. The platform may still
    /// rename it.
    pub fn asset_filename(&self, rel_path: &str) -> String {
        format!(
            "T--{}--{}",
            self.team,
            rel_path.replace('/', "--").replace(' ', "_")
        )
    }
}

fn strip_extension(rel_path: &str) -> &str {
    let file_start = rel_path.rfind('/').map_or(0, |i| i + 1);
    match rel_path[file_start..].rfind('.') {
        Some(dot) if dot > 0 => &rel_path[..file_start + dot],
        _ => rel_path,
    }
}
