use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    CONTENT_TYPE,
};
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;
use wordalign_core::{AlignPipeline, Invocation, PipelineConfig, ProcessOutput, ProcessRunner};
use wordalign_server::router;

const BOUNDARY: &str = "wordalign-test-boundary";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Failure {
    #[default]
    None,
    Aligner,
    Symmetrizer,
    /// The symmetrizer exits successfully but leaves no output file.
    OutputMissing,
}

/// Stands in for eflomal and atools.
///
/// The "aligner" copies the encoded source corpus to the forward output and
/// the encoded target corpus to the reverse output; the "symmetrizer" copies
/// the forward output to its redirected stdout. A successful response body
/// is therefore the encoded source corpus.
#[derive(Default)]
struct FakeTools {
    failure: Failure,
    calls: Mutex<Vec<Invocation>>,
    encoded: Mutex<Vec<(String, String)>>,
}

impl FakeTools {
    fn failing(failure: Failure) -> Self {
        Self {
            failure,
            ..Self::default()
        }
    }

    fn path(inv: &Invocation, flag: &str) -> PathBuf {
        PathBuf::from(inv.flag_value(flag).expect("flag present"))
    }

    fn exited(success: bool, output: &str) -> ProcessOutput {
        ProcessOutput {
            success,
            code: Some(if success { 0 } else { 1 }),
            output: output.as_bytes().to_vec(),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl ProcessRunner for FakeTools {
    fn run(&self, inv: &Invocation) -> io::Result<ProcessOutput> {
        self.calls.lock().unwrap().push(inv.clone());

        match inv.output_file.as_ref() {
            None => {
                let src = fs::read_to_string(Self::path(inv, "-s"))?;
                let tgt = fs::read_to_string(Self::path(inv, "-t"))?;
                self.encoded.lock().unwrap().push((src.clone(), tgt.clone()));
                if self.failure == Failure::Aligner {
                    return Ok(Self::exited(false, "ERROR: sentence counts differ"));
                }
                fs::write(Self::path(inv, "-f"), src)?;
                fs::write(Self::path(inv, "-r"), tgt)?;
                Ok(Self::exited(true, ""))
            }
            Some(out) => {
                match self.failure {
                    Failure::Symmetrizer => {
                        fs::write(out, "atools: malformed alignment line 3")?;
                        return Ok(Self::exited(false, ""));
                    }
                    Failure::OutputMissing => {
                        fs::remove_file(out)?;
                        return Ok(Self::exited(true, ""));
                    }
                    _ => {}
                }
                fs::copy(Self::path(inv, "-i"), out)?;
                Ok(Self::exited(true, ""))
            }
        }
    }
}

struct Harness {
    app: Router,
    tools: Arc<FakeTools>,
    root: tempfile::TempDir,
}

impl Harness {
    fn new(tools: FakeTools) -> Self {
        let root = tempfile::tempdir().unwrap();
        let tools = Arc::new(tools);
        let config = PipelineConfig::new().with_work_dir(root.path());
        let pipeline = AlignPipeline::with_runner(config, tools.clone());
        Self {
            app: router(pipeline, None),
            tools,
            root,
        }
    }

    fn work_dir_is_empty(&self) -> bool {
        is_empty_dir(self.root.path())
    }
}

fn is_empty_dir(path: &Path) -> bool {
    fs::read_dir(path).unwrap().next().is_none()
}

fn field<'a>(name: &'a str, content: &'a [u8]) -> (&'a str, &'a [u8]) {
    (name, content)
}

fn push_part(body: &mut Vec<u8>, name: &str, filename: Option<&str>, content: &[u8]) {
    let disposition = match filename {
        Some(filename) => format!("form-data; name=\"{name}\"; filename=\"{filename}\""),
        None => format!("form-data; name=\"{name}\""),
    };
    body.extend_from_slice(
        format!("--{BOUNDARY}\r\nContent-Disposition: {disposition}\r\nContent-Type: text/plain\r\n\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(b"\r\n");
}

/// Every field is sent as a file part named `<field>.txt`.
fn multipart_body(fields: &[(&str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, content) in fields {
        push_part(&mut body, name, Some(&format!("{name}.txt")), content);
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/align")
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn align_request(fields: &[(&str, &[u8])]) -> Request<Body> {
    multipart_request(multipart_body(fields))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, String::from_utf8_lossy(&body).into_owned())
}

#[tokio::test]
async fn align_returns_symmetrized_output() {
    let harness = Harness::new(FakeTools::default());

    let (status, headers, body) = send(
        &harness.app,
        align_request(&[field("src", b"Hello world\n\n"), field("tgt", b"Bonjour monde\n\n")]),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[CONTENT_TYPE], "text/plain");
    assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(body, "2 2\n2 0 1\n0\n");

    let encoded = harness.tools.encoded.lock().unwrap().clone();
    assert_eq!(
        encoded,
        [("2 2\n2 0 1\n0\n".to_string(), "2 2\n2 0 1\n0\n".to_string())]
    );

    let calls = harness.tools.calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].flag_value("-m").unwrap(), "3");
    assert_eq!(calls[0].flag_value("-N").unwrap(), "0.2");
    assert_eq!(calls[0].flag_value("-n").unwrap(), "1");
    assert_eq!(calls[1].flag_value("-c").unwrap(), "grow-diag-final-and");

    assert!(harness.work_dir_is_empty());
}

#[tokio::test]
async fn extra_fields_are_ignored() {
    let harness = Harness::new(FakeTools::default());

    let (status, _, body) = send(
        &harness.app,
        align_request(&[
            field("note", b"ignored"),
            field("tgt", b"b\n"),
            field("src", b"a\n"),
        ]),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "1 1\n1 0\n");
}

#[tokio::test]
async fn missing_tgt_is_bad_request() {
    let harness = Harness::new(FakeTools::default());

    let (status, headers, body) =
        send(&harness.app, align_request(&[field("src", b"Hello world\n")])).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Missing tgt file");
    assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(harness.tools.call_count(), 0);
    assert!(harness.work_dir_is_empty());
}

#[tokio::test]
async fn missing_src_is_bad_request() {
    let harness = Harness::new(FakeTools::default());

    let (status, _, body) = send(&harness.app, align_request(&[field("tgt", b"Bonjour\n")])).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Missing src file");
    assert!(harness.work_dir_is_empty());
}

#[tokio::test]
async fn plain_field_is_not_a_file() {
    let harness = Harness::new(FakeTools::default());
    let mut body = Vec::new();
    push_part(&mut body, "src", None, b"Hello world\n");
    push_part(&mut body, "tgt", Some("tgt.txt"), b"Bonjour monde\n");
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let (status, _, body) = send(&harness.app, multipart_request(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Missing src file");
    assert_eq!(harness.tools.call_count(), 0);
    assert!(harness.work_dir_is_empty());
}

#[tokio::test]
async fn non_multipart_body_is_bad_request() {
    let harness = Harness::new(FakeTools::default());
    let request = Request::builder()
        .method(Method::POST)
        .uri("/align")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"src":"a"}"#))
        .unwrap();

    let (status, _, body) = send(&harness.app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Invalid form");
    assert!(harness.work_dir_is_empty());
}

#[tokio::test]
async fn preflight_returns_cors_headers() {
    let harness = Harness::new(FakeTools::default());
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/align")
        .body(Body::empty())
        .unwrap();

    let (status, headers, body) = send(&harness.app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
    assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(headers[ACCESS_CONTROL_ALLOW_METHODS], "POST, OPTIONS");
    assert_eq!(headers[ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type");
    assert_eq!(harness.tools.call_count(), 0);
}

#[tokio::test]
async fn aligner_failure_reports_output_and_cleans_up() {
    let harness = Harness::new(FakeTools::failing(Failure::Aligner));

    let (status, headers, body) =
        send(&harness.app, align_request(&[field("src", b"a\n"), field("tgt", b"b\n")])).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "eflomal-align failed: ERROR: sentence counts differ");
    assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(harness.tools.call_count(), 1);
    assert!(harness.work_dir_is_empty());
}

#[tokio::test]
async fn symmetrizer_failure_reports_output_and_cleans_up() {
    let harness = Harness::new(FakeTools::failing(Failure::Symmetrizer));

    let (status, _, body) =
        send(&harness.app, align_request(&[field("src", b"a\n"), field("tgt", b"b\n")])).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "atools failed: atools: malformed alignment line 3");
    assert_eq!(harness.tools.call_count(), 2);
    assert!(harness.work_dir_is_empty());
}

#[tokio::test]
async fn missing_output_file_is_server_error() {
    let harness = Harness::new(FakeTools::failing(Failure::OutputMissing));

    let (status, headers, body) =
        send(&harness.app, align_request(&[field("src", b"a\n"), field("tgt", b"b\n")])).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Failed to read output");
    assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(harness.tools.call_count(), 2);
    assert!(harness.work_dir_is_empty());
}

#[tokio::test]
async fn invalid_utf8_is_encoding_failure() {
    let harness = Harness::new(FakeTools::default());

    let (status, _, body) = send(
        &harness.app,
        align_request(&[field("src", &[b'a', b'\n', 0xff, 0xfe, b'\n']), field("tgt", b"b\n")]),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.starts_with("Failed to convert src file: "), "{body}");
    assert_eq!(harness.tools.call_count(), 0);
    assert!(harness.work_dir_is_empty());
}

#[tokio::test]
async fn unusable_work_dir_is_server_error() {
    let root = tempfile::tempdir().unwrap();
    let config = PipelineConfig::new().with_work_dir(root.path().join("missing"));
    let pipeline = AlignPipeline::with_runner(config, Arc::new(FakeTools::default()));
    let app = router(pipeline, None);

    let (status, _, body) = send(&app, align_request(&[field("src", b"a\n"), field("tgt", b"b\n")])).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Temp dir error");
}

#[tokio::test]
async fn other_methods_are_rejected() {
    let harness = Harness::new(FakeTools::default());
    let request = Request::builder()
        .method(Method::GET)
        .uri("/align")
        .body(Body::empty())
        .unwrap();

    let (status, headers, _) = send(&harness.app, request).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn large_upload_is_accepted_without_limit() {
    let harness = Harness::new(FakeTools::default());
    // Well past axum's built-in 2 MB default.
    let src = "hello world\n".repeat(300_000);

    let (status, _, body) = send(
        &harness.app,
        align_request(&[field("src", src.as_bytes()), field("tgt", b"bonjour\n")]),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.starts_with("300000 2\n2 0 1\n"), "{body:.64}");
    assert_eq!(harness.tools.call_count(), 2);
    assert!(harness.work_dir_is_empty());
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let root = tempfile::tempdir().unwrap();
    let config = PipelineConfig::new().with_work_dir(root.path());
    let tools = Arc::new(FakeTools::default());
    let pipeline = AlignPipeline::with_runner(config, tools.clone());
    let app = router(pipeline, Some(64));

    let big = vec![b'a'; 1024];
    let (status, _, body) =
        send(&app, align_request(&[field("src", &big), field("tgt", b"b\n")])).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body, "Upload too large");
    assert_eq!(tools.call_count(), 0);
    assert!(is_empty_dir(root.path()));
}

#[tokio::test]
async fn concurrent_requests_do_not_interfere() {
    let harness = Harness::new(FakeTools::default());

    let mut handles = Vec::new();
    for i in 0..8usize {
        let app = harness.app.clone();
        handles.push(tokio::spawn(async move {
            let words: Vec<String> = (0..=i).map(|w| format!("w{w}")).collect();
            let src = format!("{}\n", words.join(" "));
            let (status, _, body) = send(
                &app,
                align_request(&[field("src", src.as_bytes()), field("tgt", b"x\n")]),
            )
            .await;
            (i, status, body)
        }));
    }

    for handle in handles {
        let (i, status, body) = handle.await.unwrap();
        let indices: Vec<String> = (0..=i).map(|w| w.to_string()).collect();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, format!("1 {}\n{} {}\n", i + 1, i + 1, indices.join(" ")));
    }

    assert_eq!(harness.tools.call_count(), 16);
    assert!(harness.work_dir_is_empty());
}
