//! `WikiClient` against a canned local HTTP server.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

use tempfile::TempDir;
use wikisync_core::{AssetUpload, Credentials, RemoteError, RemoteSite, SiteLayout};
use wikisync_remote::WikiClient;

/// Serve `responses` in order, one connection each, and hand back every
/// request as `"<request line>\n<body>"`.
fn serve(responses: Vec<(u16, String)>) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let handle = thread::spawn(move || {
        let mut seen = Vec::new();
        for (status, body) in responses {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);

            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            let mut content_length = 0usize;
            loop {
                let mut header = String::new();
                reader.read_line(&mut header).unwrap();
                if header == "\r\n" || header.is_empty() {
                    break;
                }
                if let Some((name, value)) = header.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap();
                    }
                }
            }
            let mut request_body = vec![0; content_length];
            reader.read_exact(&mut request_body).unwrap();
            seen.push(format!(
                "{}\n{}",
                request_line.trim_end(),
                String::from_utf8_lossy(&request_body)
            ));

            let mut stream = reader.into_inner();
            write!(
                stream,
                "HTTP/1.1 {status} OK\r\nContent-Type: application/json\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
            .unwrap();
        }
        seen
    });
    (base, handle)
}

fn client(base: &str, jar: &TempDir) -> WikiClient {
    WikiClient::new(&SiteLayout::new("Example", 2020), jar.path().join("jar.cookies"))
        .with_endpoints(format!("{base}/Login2"), format!("{base}/wiki/api.php"))
}

const TOKEN: &str = r#"{"query":{"tokens":{"csrftoken":"tok+\\"}}}"#;

#[test]
fn login_confirms_and_saves_the_session() {
    let jar = TempDir::new().unwrap();
    let (base, server) = serve(vec![(200, "You have successfully logged in.".into())]);

    client(&base, &jar)
        .login(&Credentials::new("alice", "s3cret"))
        .unwrap();

    let requests = server.join().unwrap();
    assert!(requests[0].starts_with("POST /Login2"));
    assert!(requests[0].contains("username=alice"));
    assert!(requests[0].contains("password=s3cret"));
    assert!(jar.path().join("jar.cookies").exists());
}

#[test]
fn login_without_confirmation_is_rejected() {
    let jar = TempDir::new().unwrap();
    let (base, server) = serve(vec![(200, "Incorrect password.".into())]);

    let err = client(&base, &jar)
        .login(&Credentials::new("alice", "wrong"))
        .unwrap_err();

    server.join().unwrap();
    assert!(matches!(err, RemoteError::Rejected(_)));
    assert!(!jar.path().join("jar.cookies").exists());
}

#[test]
fn pages_are_edited_by_title_with_a_cached_token() {
    let jar = TempDir::new().unwrap();
    let edit_ok = r#"{"edit":{"result":"Success"}}"#.to_string();
    let (base, server) = serve(vec![
        (200, TOKEN.into()),
        (200, edit_ok.clone()),
        (200, edit_ok),
    ]);
    let mut wiki = client(&base, &jar);

    wiki.upload_page("<p>a</p>", "https://2020.igem.org/Team:Example/about")
        .unwrap();
    wiki.upload_page(
        "body{}",
        "https://2020.igem.org/Template:Example/CSS/style?action=raw&ctype=text/css",
    )
    .unwrap();

    let requests = server.join().unwrap();
    assert_eq!(requests.len(), 3, "token fetched once");
    assert!(requests[0].starts_with("GET /wiki/api.php?action=query&meta=tokens"));
    assert!(requests[1].contains("action=edit"));
    assert!(requests[1].contains("title=Team%3AExample%2Fabout"));
    assert!(requests[1].contains("token=tok%2B%5C"));
    assert!(requests[2].contains("title=Template%3AExample%2FCSS%2Fstyle"));
}

#[test]
fn file_upload_is_multipart_and_returns_the_assigned_url() {
    let jar = TempDir::new().unwrap();
    let (base, server) = serve(vec![
        (200, TOKEN.into()),
        (
            200,
            r#"{"upload":{"result":"Success","filename":"T--Example--logo.png",
                "imageinfo":{"url":"https://2020.igem.org/wiki/images/9/9f/T--Example--logo.png"}}}"#
                .into(),
        ),
    ]);
    let mut wiki = client(&base, &jar);

    let uploaded = wiki
        .upload_file(&AssetUpload {
            rel_path: "logo.png",
            filename: "T--Example--logo.png",
            content_hash: "cafebabe",
            bytes: b"PNGDATA",
        })
        .unwrap();

    assert_eq!(
        uploaded.url,
        "https://2020.igem.org/wiki/images/9/9f/T--Example--logo.png"
    );
    let requests = server.join().unwrap();
    let upload = &requests[1];
    assert!(upload.starts_with("POST /wiki/api.php"));
    assert!(upload.contains("--wikisync-cafebabe\r\n"));
    assert!(upload.contains("name=\"ignorewarnings\"\r\n\r\n1\r\n"));
    assert!(upload.contains("filename=\"T--Example--logo.png\""));
    assert!(upload.contains("PNGDATA"));
}

#[test]
fn http_errors_surface_as_status() {
    let jar = TempDir::new().unwrap();
    let (base, server) = serve(vec![(503, "{}".into())]);

    let err = client(&base, &jar)
        .upload_page("x", "https://2020.igem.org/Team:Example")
        .unwrap_err();

    server.join().unwrap();
    assert!(matches!(err, RemoteError::Status { status: 503, .. }));
}
