//! End-to-end sync runs against an in-memory wiki.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use rstest::rstest;
use tempfile::TempDir;
use wikisync_core::{
    manifest, AssetUpload, ConfigFile, Credentials, FileCategory, RemoteError, RemoteSite,
    SyncConfig, UploadedFile,
};
use wikisync_sync::{inspect, run, FileOutcome, FileState, Session, SkipReason, SyncError};

// ---------------------------------------------------------------------------
// Fake remote
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FakeWiki {
    logins: usize,
    reject_login: bool,
    /// Asset keys whose upload fails.
    failing_assets: HashSet<String>,
    /// Page URLs whose upload fails.
    failing_pages: HashSet<String>,
    files: Vec<String>,
    pages: Vec<(String, String)>,
}

impl FakeWiki {
    fn uploads(&self) -> usize {
        self.files.len() + self.pages.len()
    }

    fn page(&self, url: &str) -> Option<&str> {
        self.pages
            .iter()
            .rev()
            .find(|(u, _)| u == url)
            .map(|(_, content)| content.as_str())
    }
}

impl RemoteSite for FakeWiki {
    fn login(&mut self, _: &Credentials) -> Result<(), RemoteError> {
        self.logins += 1;
        if self.reject_login {
            return Err(RemoteError::Rejected("wrong password".into()));
        }
        Ok(())
    }

    fn upload_file(&mut self, file: &AssetUpload<'_>) -> Result<UploadedFile, RemoteError> {
        if self.failing_assets.contains(file.rel_path) {
            return Err(RemoteError::Transport("connection reset".into()));
        }
        self.files.push(file.rel_path.to_owned());
        Ok(UploadedFile {
            url: format!(
                "https://static.example.org/{}/{}",
                &file.content_hash[..8],
                file.filename
            ),
            filename: file.filename.to_owned(),
        })
    }

    fn upload_page(&mut self, content: &str, target_url: &str) -> Result<(), RemoteError> {
        if self.failing_pages.contains(target_url) {
            return Err(RemoteError::Status {
                status: 503,
                url: target_url.to_owned(),
            });
        }
        self.pages.push((target_url.to_owned(), content.to_owned()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const INDEX_URL: &str = "https://2020.igem.org/Team:Example";
const STYLE_URL: &str =
    "https://2020.igem.org/Template:Example/CSS/style?action=raw&ctype=text/css";

fn config(root: &Path) -> SyncConfig {
    config_for(root, 2020)
}

fn config_for(root: &Path, year: u16) -> SyncConfig {
    ConfigFile {
        team: Some("Example".into()),
        year: Some(year),
        src_dir: Some(root.join("src")),
        build_dir: Some(root.join("build")),
        manifest: Some(root.join("upload_map.yml")),
        cookies: Some(root.join("cookies.json")),
    }
    .resolve()
    .unwrap()
}

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join("src").join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn small_site(root: &Path) {
    write(
        root,
        "index.html",
        r#"<link href="style.css" rel="stylesheet"><img src="logo.png">"#,
    );
    write(root, "style.css", "body { background: url(logo.png); }");
    write(root, "logo.png", "\u{89}PNG fake");
}

fn live(cfg: &SyncConfig, wiki: &mut FakeWiki) -> Result<wikisync_sync::SyncReport, SyncError> {
    let creds = Credentials::new("alice", "secret");
    run(
        cfg,
        Session::Live {
            remote: wiki,
            credentials: &creds,
        },
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn first_run_uploads_everything_and_second_run_nothing() {
    let tmp = TempDir::new().unwrap();
    small_site(tmp.path());
    let cfg = config(tmp.path());

    let mut wiki = FakeWiki::default();
    let first = live(&cfg, &mut wiki).unwrap();
    assert_eq!(first.uploaded(), 3);
    assert_eq!(wiki.files, ["logo.png"]);
    assert_eq!(wiki.pages.len(), 2);

    let mut wiki = FakeWiki::default();
    let second = live(&cfg, &mut wiki).unwrap();
    assert_eq!(wiki.uploads(), 0);
    assert_eq!(second.unchanged(), 3);
    assert_eq!(wiki.logins, 1);
}

#[rstest]
#[case("style.css", "body { color: red; }", STYLE_URL, "index.html")]
#[case("index.html", "<p>edited</p>", INDEX_URL, "style.css")]
fn only_the_edited_file_is_uploaded_again(
    #[case] edited: &str,
    #[case] contents: &str,
    #[case] url: &str,
    #[case] untouched: &str,
) {
    let tmp = TempDir::new().unwrap();
    small_site(tmp.path());
    let cfg = config(tmp.path());
    live(&cfg, &mut FakeWiki::default()).unwrap();

    write(tmp.path(), edited, contents);
    let mut wiki = FakeWiki::default();
    let report = live(&cfg, &mut wiki).unwrap();

    assert!(wiki.files.is_empty());
    assert_eq!(wiki.pages.len(), 1);
    assert_eq!(wiki.pages[0].0, url);
    assert!(matches!(
        report.outcome(untouched),
        Some(FileOutcome::Unchanged { .. })
    ));
}

#[test]
fn switching_year_uploads_everything_to_the_new_wiki() {
    let tmp = TempDir::new().unwrap();
    small_site(tmp.path());
    live(&config_for(tmp.path(), 2020), &mut FakeWiki::default()).unwrap();

    let next = config_for(tmp.path(), 2021);
    let mut wiki = FakeWiki::default();
    let report = live(&next, &mut wiki).unwrap();

    assert_eq!(report.uploaded(), 3);
    assert_eq!(wiki.files, ["logo.png"]);
    assert!(wiki.page("https://2021.igem.org/Team:Example").is_some());
    assert!(wiki
        .pages
        .iter()
        .all(|(url, _)| url.starts_with("https://2021.igem.org/")));

    let saved = manifest::load_or_default(&next.manifest_path).unwrap();
    assert_eq!(
        saved.html["index.html"].remote_url,
        "https://2021.igem.org/Team:Example"
    );
}

#[test]
fn status_after_a_clean_sync_has_nothing_pending() {
    let tmp = TempDir::new().unwrap();
    small_site(tmp.path());
    write(tmp.path(), "js/app.js", "console.log('hi');");
    let cfg = config(tmp.path());
    live(&cfg, &mut FakeWiki::default()).unwrap();

    let statuses = inspect(&cfg).unwrap();
    assert_eq!(statuses.len(), 4);
    assert!(statuses.iter().all(|s| s.state == FileState::Unchanged), "{statuses:?}");

    write(tmp.path(), "style.css", "body { color: red; }");
    let pending: Vec<_> = inspect(&cfg)
        .unwrap()
        .into_iter()
        .filter(|s| s.state.needs_sync())
        .map(|s| (s.path, s.state))
        .collect();
    assert_eq!(pending, [("style.css".to_owned(), FileState::Changed)]);
}

#[test]
fn pages_link_to_the_url_assigned_by_the_platform() {
    let tmp = TempDir::new().unwrap();
    small_site(tmp.path());
    let cfg = config(tmp.path());
    let mut wiki = FakeWiki::default();
    live(&cfg, &mut wiki).unwrap();

    let saved = manifest::load_or_default(&cfg.manifest_path).unwrap();
    let asset_url = &saved.assets["logo.png"].remote_url;
    assert!(asset_url.starts_with("https://static.example.org/"));

    let index = wiki.page(INDEX_URL).unwrap();
    assert!(index.contains(asset_url.as_str()), "{index}");
    assert!(index.contains(STYLE_URL), "{index}");
    assert!(wiki.page(STYLE_URL).unwrap().contains(asset_url.as_str()));

    let built = fs::read_to_string(cfg.build_dir.join("index.html")).unwrap();
    assert_eq!(built, index);
}

#[test]
fn failed_asset_upload_keeps_earlier_work_and_prior_entry() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "a.png", "a");
    write(tmp.path(), "b.png", "b");
    write(tmp.path(), "c.png", "c");
    write(tmp.path(), "index.html", "<p>home</p>");
    let cfg = config(tmp.path());
    live(&cfg, &mut FakeWiki::default()).unwrap();
    let before = manifest::load_or_default(&cfg.manifest_path).unwrap();

    write(tmp.path(), "a.png", "a2");
    write(tmp.path(), "b.png", "b2");
    write(tmp.path(), "c.png", "c2");
    let mut wiki = FakeWiki {
        failing_assets: ["b.png".to_owned()].into(),
        ..FakeWiki::default()
    };
    let err = live(&cfg, &mut wiki).unwrap_err();
    assert!(matches!(err, SyncError::AssetUpload { ref path, .. } if path == "b.png"));
    assert!(wiki.pages.is_empty());

    let after = manifest::load_or_default(&cfg.manifest_path).unwrap();
    assert_ne!(after.assets["a.png"], before.assets["a.png"]);
    assert_eq!(after.assets["b.png"], before.assets["b.png"]);
    assert_eq!(after.assets["c.png"], before.assets["c.png"]);
}

#[test]
fn failed_page_upload_is_retried_next_run() {
    let tmp = TempDir::new().unwrap();
    small_site(tmp.path());
    let cfg = config(tmp.path());

    let mut wiki = FakeWiki {
        failing_pages: [INDEX_URL.to_owned()].into(),
        ..FakeWiki::default()
    };
    let report = live(&cfg, &mut wiki).unwrap();
    assert!(matches!(
        report.outcome("index.html"),
        Some(FileOutcome::Skipped {
            reason: SkipReason::Upload(_),
            ..
        })
    ));
    let saved = manifest::load_or_default(&cfg.manifest_path).unwrap();
    assert!(saved.html["index.html"].content_hash.is_empty());

    let mut wiki = FakeWiki::default();
    let report = live(&cfg, &mut wiki).unwrap();
    assert_eq!(wiki.pages.len(), 1);
    assert_eq!(wiki.pages[0].0, INDEX_URL);
    assert!(matches!(
        report.outcome("index.html"),
        Some(FileOutcome::Uploaded { .. })
    ));
}

#[test]
fn dry_run_reports_work_without_uploading_or_saving() {
    let tmp = TempDir::new().unwrap();
    small_site(tmp.path());
    write(tmp.path(), "notes.md", "not published");
    let cfg = config(tmp.path());

    let report = run(&cfg, Session::DryRun).unwrap();

    assert_eq!(report.would_upload(), 3);
    assert_eq!(report.unsupported.len(), 1);
    assert!(!cfg.manifest_path.exists());
    assert!(cfg.build_dir.join("style.css").is_file());
    assert!(!cfg.build_dir.join("notes.md").exists());
}

#[test]
fn rejected_login_aborts_before_any_upload() {
    let tmp = TempDir::new().unwrap();
    small_site(tmp.path());
    let cfg = config(tmp.path());
    let mut wiki = FakeWiki {
        reject_login: true,
        ..FakeWiki::default()
    };

    let err = live(&cfg, &mut wiki).unwrap_err();

    assert!(matches!(err, SyncError::Auth(_)));
    assert_eq!(wiki.uploads(), 0);
}

#[test]
fn corrupt_manifest_means_a_full_upload() {
    let tmp = TempDir::new().unwrap();
    small_site(tmp.path());
    let cfg = config(tmp.path());
    fs::write(&cfg.manifest_path, "{{ not yaml").unwrap();

    let mut wiki = FakeWiki::default();
    let report = live(&cfg, &mut wiki).unwrap();

    assert_eq!(report.uploaded(), 3);
    let saved = manifest::load_or_default(&cfg.manifest_path).unwrap();
    assert_eq!(saved.css["style.css"].remote_url, STYLE_URL);
}

#[test]
fn outcomes_list_assets_before_code_files() {
    let tmp = TempDir::new().unwrap();
    small_site(tmp.path());
    write(tmp.path(), "js/app.js", "console.log('hi');");
    let cfg = config(tmp.path());

    let report = run(&cfg, Session::DryRun).unwrap();
    let order: Vec<_> = report.outcomes.iter().map(|o| o.category()).collect();
    assert_eq!(
        order,
        [
            FileCategory::Asset,
            FileCategory::Markup,
            FileCategory::Stylesheet,
            FileCategory::Script,
        ]
    );
}
