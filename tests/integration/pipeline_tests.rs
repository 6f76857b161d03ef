//! Integration tests for the harvest pipeline
//!
//! These tests use wiremock to serve PDFs (and things that are not PDFs) and
//! run the full select -> extract -> fetch -> merge cycle end-to-end.

use lopdf::{dictionary, Dictionary, Document, Object, Stream};
use pdf_harvest::config::Config;
use pdf_harvest::merge::{Accumulator, PdfAccumulator};
use pdf_harvest::output::FailureKind;
use pdf_harvest::pipeline::{harvest, prepare_batch, DocumentFetcher, MergeOrchestrator};
use pdf_harvest::progress::ProgressRecorder;
use pdf_harvest::source::InputBatch;
use pdf_harvest::state::RunState;
use pdf_harvest::MergeError;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Builds a PDF with one page per width; the width tags each page's MediaBox
fn sample_pdf(widths: &[i64]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let kids: Vec<Object> = widths
        .iter()
        .map(|width| {
            let content_id = doc.add_object(Stream::new(Dictionary::new(), b"q Q".to_vec()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(*width),
                    Object::Integer(842),
                ],
            });
            Object::Reference(page_id)
        })
        .collect();

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => widths.len() as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("Failed to build sample PDF");
    buffer
}

/// MediaBox widths of the pages in `path`, in page order
fn page_widths(path: &Path) -> Vec<i64> {
    let doc = Document::load(path).expect("Failed to load merged PDF");
    doc.get_pages()
        .into_values()
        .map(|id| {
            let page = doc.get_dictionary(id).unwrap();
            page.get(b"MediaBox").unwrap().as_array().unwrap()[2]
                .as_i64()
                .unwrap()
        })
        .collect()
}

fn pdf_response(widths: &[i64]) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(sample_pdf(widths), "application/pdf")
}

async fn mount(server: &MockServer, route: &str, template: ResponseTemplate) -> String {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(template)
        .mount(server)
        .await;
    format!("{}{}", server.uri(), route)
}

fn orchestrator<A: Accumulator>(accumulator: A, output: &Path) -> MergeOrchestrator<A> {
    let fetcher =
        DocumentFetcher::new(&Config::default().http).expect("Failed to build HTTP client");
    MergeOrchestrator::new(fetcher, accumulator, output)
}

/// Accumulator that only remembers which staged files it saw
#[derive(Default)]
struct RecordingAccumulator {
    appended: Vec<String>,
}

impl Accumulator for RecordingAccumulator {
    fn append(&mut self, path: &Path) -> Result<usize, MergeError> {
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        self.appended.push(name);
        Ok(1)
    }

    fn len(&self) -> usize {
        self.appended.len()
    }

    fn page_count(&self) -> usize {
        self.appended.len()
    }

    fn render(&mut self) -> Result<Vec<u8>, MergeError> {
        Ok(self.appended.join("\n").into_bytes())
    }
}

/// In-memory log sink shared with the subscriber
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap();
        String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[tokio::test]
async fn test_mixed_batch_skips_failure_and_keeps_order() {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("pdf_harvest=info"))
        .with_writer(logs.clone())
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let server = MockServer::start().await;
    let u1 = mount(&server, "/u1", pdf_response(&[101, 102])).await;
    let u2 = mount(&server, "/u2", ResponseTemplate::new(500)).await;
    let u3 = mount(&server, "/u3", pdf_response(&[301])).await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("output.pdf");
    let batch = InputBatch::new(None, vec![u1.clone(), u2.clone(), u3.clone()]);
    let mut progress = ProgressRecorder::default();

    let summary = orchestrator(PdfAccumulator::new(), &output)
        .run(&batch, &mut progress)
        .await
        .expect("Run failed");

    assert_eq!(summary.state, RunState::Done);
    assert_eq!(summary.total, 3);
    assert_eq!(summary.merged_count(), 2);
    assert_eq!(summary.merged[0].url, u1);
    assert_eq!(summary.merged[1].url, u3);
    assert_eq!(summary.page_count(), 3);

    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].url, u2);
    assert_eq!(summary.failures[0].kind, FailureKind::Fetch);

    assert_eq!(summary.output.as_deref(), Some(output.as_path()));
    assert_eq!(page_widths(&output), vec![101, 102, 301]);

    assert_eq!(progress.total, Some(3));
    assert_eq!(progress.updates, vec![1.0 / 3.0, 2.0 / 3.0, 1.0]);
    assert!(progress.finished);

    let lines = logs.lines();
    let errors: Vec<&String> = lines.iter().filter(|l| l.contains("ERROR")).collect();
    assert_eq!(errors.len(), 1, "unexpected error records: {:?}", errors);
    assert!(errors[0].contains(&u2));
    assert!(lines.iter().any(|l| l.contains("END MERGING")));
}

#[tokio::test]
async fn test_append_order_follows_batch() {
    let server = MockServer::start().await;
    let first = mount(
        &server,
        "/a",
        pdf_response(&[1]).insert_header("content-disposition", "attachment; filename=first.pdf"),
    )
    .await;
    let broken = mount(&server, "/b", ResponseTemplate::new(404)).await;
    let third = mount(
        &server,
        "/c",
        pdf_response(&[3]).insert_header("content-disposition", "attachment; filename=third.pdf"),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("order.txt");
    let batch = InputBatch::new(None, vec![third.clone(), broken, first.clone(), third]);

    let summary = orchestrator(RecordingAccumulator::default(), &output)
        .run(&batch, &mut ProgressRecorder::default())
        .await
        .expect("Run failed");

    assert_eq!(summary.merged_count(), 3);
    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        "third.pdf\nfirst.pdf\nthird_1.pdf"
    );
}

#[tokio::test]
async fn test_all_failing_produces_no_output() {
    let server = MockServer::start().await;
    let html = mount(
        &server,
        "/page",
        ResponseTemplate::new(200).set_body_raw(b"<html></html>".to_vec(), "text/html"),
    )
    .await;
    let missing = mount(&server, "/missing", ResponseTemplate::new(404)).await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("output.pdf");
    let batch = InputBatch::new(None, vec![html, missing]);
    let mut progress = ProgressRecorder::default();

    let summary = orchestrator(PdfAccumulator::new(), &output)
        .run(&batch, &mut progress)
        .await
        .expect("Run failed");

    assert_eq!(summary.state, RunState::Empty);
    assert!(summary.is_empty_result());
    assert_eq!(summary.failures.len(), 2);
    assert!(summary.output.is_none());
    assert!(!output.exists());
    assert_eq!(progress.updates, vec![0.5, 1.0]);
}

#[tokio::test]
async fn test_empty_batch_makes_no_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(pdf_response(&[1]))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("output.pdf");
    let mut progress = ProgressRecorder::default();

    let summary = orchestrator(PdfAccumulator::new(), &output)
        .run(&InputBatch::default(), &mut progress)
        .await
        .expect("Run failed");

    assert_eq!(summary.state, RunState::Empty);
    assert_eq!(summary.total, 0);
    assert!(!output.exists());
    assert_eq!(progress.total, Some(0));
    assert!(progress.updates.is_empty());
    assert!(progress.finished);
}

#[tokio::test]
async fn test_content_type_rules_end_to_end() {
    let server = MockServer::start().await;
    let octet_pdf = mount(
        &server,
        "/octet-pdf",
        ResponseTemplate::new(200)
            .set_body_raw(sample_pdf(&[10]), "application/octet-stream")
            .insert_header("content-disposition", "attachment; filename=x.pdf"),
    )
    .await;
    let octet_txt = mount(
        &server,
        "/octet-txt",
        ResponseTemplate::new(200)
            .set_body_raw(sample_pdf(&[20]), "application/octet-stream")
            .insert_header("content-disposition", "attachment; filename=x.txt"),
    )
    .await;
    let octet_bare = mount(
        &server,
        "/octet-bare",
        ResponseTemplate::new(200).set_body_raw(sample_pdf(&[30]), "application/octet-stream"),
    )
    .await;
    let pdf_with_txt_hint = mount(
        &server,
        "/pdf",
        pdf_response(&[40]).insert_header("content-disposition", "attachment; filename=y.txt"),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("output.pdf");
    let batch = InputBatch::new(
        None,
        vec![octet_pdf, octet_txt, octet_bare, pdf_with_txt_hint],
    );

    let summary = orchestrator(PdfAccumulator::new(), &output)
        .run(&batch, &mut ProgressRecorder::default())
        .await
        .expect("Run failed");

    let failed: Vec<usize> = summary.failures.iter().map(|f| f.index).collect();
    assert_eq!(failed, vec![1, 2]);
    assert_eq!(page_widths(&output), vec![10, 40]);
}

fn write_csv(dir: &Path, name: &str, rows: &[&str]) -> PathBuf {
    let path = dir.join(name);
    let mut content = String::from("title,pdf\n");
    for (i, url) in rows.iter().enumerate() {
        content.push_str(&format!("doc {},{}\n", i, url));
    }
    std::fs::write(&path, content).unwrap();
    path
}

fn test_config(root: &Path) -> Config {
    let mut config = Config::default();
    config.source.directory = root.join("csv");
    config.output.path = root.join("output.pdf");
    config
}

#[tokio::test]
async fn test_full_pipeline_is_idempotent() {
    let server = MockServer::start().await;
    let a = mount(&server, "/a.pdf", pdf_response(&[100, 101])).await;
    let b = mount(&server, "/b.pdf", pdf_response(&[200])).await;
    let dead = mount(&server, "/dead.pdf", ResponseTemplate::new(404)).await;

    let root = TempDir::new().unwrap();
    std::fs::create_dir(root.path().join("csv")).unwrap();
    write_csv(&root.path().join("csv"), "batch.csv", &[&a, &dead, &b, &a]);
    let config = test_config(root.path());

    let batch = prepare_batch(&config, None);
    assert_eq!(batch.len(), 4);

    let first = harvest(&config, &batch, &mut ProgressRecorder::default())
        .await
        .expect("First run failed");
    let first_bytes = std::fs::read(&config.output.path).unwrap();
    assert_eq!(first.merged_count(), 3);
    assert_eq!(
        page_widths(&config.output.path),
        vec![100, 101, 200, 100, 101]
    );

    let batch = prepare_batch(&config, None);
    let second = harvest(&config, &batch, &mut ProgressRecorder::default())
        .await
        .expect("Second run failed");
    let second_bytes = std::fs::read(&config.output.path).unwrap();

    assert_eq!(first_bytes, second_bytes);
    assert_eq!(first.output_sha256, second.output_sha256);
}

#[tokio::test]
async fn test_missing_column_degrades_to_empty_run() {
    let root = TempDir::new().unwrap();
    std::fs::create_dir(root.path().join("csv")).unwrap();
    std::fs::write(
        root.path().join("csv/batch.csv"),
        "wrong_header,other\nhttp://example.com/a.pdf,x\n",
    )
    .unwrap();
    let config = test_config(root.path());

    let batch = prepare_batch(&config, None);
    assert!(batch.is_empty());

    let summary = harvest(&config, &batch, &mut ProgressRecorder::default())
        .await
        .expect("Run failed");
    assert_eq!(summary.state, RunState::Empty);
    assert!(!config.output.path.exists());
}

#[tokio::test]
async fn test_no_source_table_degrades_to_empty_run() {
    let root = TempDir::new().unwrap();
    let config = test_config(root.path());

    let batch = prepare_batch(&config, None);
    assert!(batch.is_empty());
    assert!(batch.source().is_none());

    let summary = harvest(&config, &batch, &mut ProgressRecorder::default())
        .await
        .expect("Run failed");
    assert_eq!(summary.state, RunState::Empty);
}

#[tokio::test]
async fn test_explicit_input_overrides_selection() {
    let server = MockServer::start().await;
    let a = mount(&server, "/a.pdf", pdf_response(&[7])).await;

    let root = TempDir::new().unwrap();
    std::fs::create_dir(root.path().join("csv")).unwrap();
    write_csv(&root.path().join("csv"), "newest.csv", &["http://127.0.0.1:9/x.pdf"]);
    let explicit = write_csv(root.path(), "chosen.csv", &[&a]);
    let config = test_config(root.path());

    let batch = prepare_batch(&config, Some(&explicit));
    assert_eq!(batch.urls(), [a]);
    assert_eq!(batch.source(), Some(explicit.as_path()));
}
