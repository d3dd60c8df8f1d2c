//! Integration tests for the export orchestrator, using recording mocks for
//! the renderer and PDF writer.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use folio::error::{Error, Result};
use folio::export::{
    export_document, CancelFlag, ExportMode, ExportOptions, ExportStage, Exporter, PdfBackend,
    PdfWriter, TitlePage, VisualRenderer,
};
use folio::paginate::{PhysicalPage, RasterImage, TextLayoutOptions, TextPage};
use folio::{Document, Node, PageGeometry};

/// Renderer returning images of preset heights, one per call.
struct MockRenderer {
    heights: Vec<f64>,
    scale: f64,
    fail_on: Option<usize>,
    calls: Mutex<Vec<(String, f64)>>,
}

impl MockRenderer {
    fn new(heights: Vec<f64>) -> Self {
        Self {
            heights,
            scale: 1.0,
            fail_on: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn failing_on(mut self, call: usize) -> Self {
        self.fail_on = Some(call);
        self
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl VisualRenderer for MockRenderer {
    async fn render(&self, html: &str, width: f64) -> Result<RasterImage> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((html.to_string(), width));
            calls.len()
        };
        if self.fail_on == Some(call) {
            return Err(Error::Render {
                page: 0,
                message: "canvas lost".into(),
            });
        }
        let height = self.heights[call - 1];
        Ok(RasterImage::new(
            width * self.scale,
            height * self.scale,
            vec![0; 4],
        ))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Title(TitlePage),
    Image(String),
    Page(PhysicalPage),
    Text(TextPage),
    Finish,
}

#[derive(Default)]
struct MockBackend {
    events: Arc<Mutex<Vec<Event>>>,
    fail_on_append: Option<usize>,
}

impl MockBackend {
    fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn finished(&self) -> bool {
        self.events().contains(&Event::Finish)
    }
}

struct MockWriter {
    events: Arc<Mutex<Vec<Event>>>,
    fail_on_append: Option<usize>,
    appended: usize,
}

#[async_trait]
impl PdfBackend for MockBackend {
    async fn begin(&self, _geometry: &PageGeometry) -> Result<Box<dyn PdfWriter>> {
        Ok(Box::new(MockWriter {
            events: Arc::clone(&self.events),
            fail_on_append: self.fail_on_append,
            appended: 0,
        }))
    }
}

#[async_trait]
impl PdfWriter for MockWriter {
    async fn add_title_page(&mut self, page: &TitlePage) -> Result<()> {
        self.events.lock().unwrap().push(Event::Title(page.clone()));
        Ok(())
    }

    async fn add_image(&mut self, id: &str, _image: &RasterImage) -> Result<()> {
        self.events.lock().unwrap().push(Event::Image(id.to_string()));
        Ok(())
    }

    async fn append_page(&mut self, page: &PhysicalPage) -> Result<()> {
        self.appended += 1;
        if self.fail_on_append == Some(self.appended) {
            return Err(Error::Write("disk full".into()));
        }
        self.events.lock().unwrap().push(Event::Page(page.clone()));
        Ok(())
    }

    async fn append_text_page(&mut self, page: &TextPage) -> Result<()> {
        self.events.lock().unwrap().push(Event::Text(page.clone()));
        Ok(())
    }

    async fn finish(&mut self) -> Result<Vec<u8>> {
        self.events.lock().unwrap().push(Event::Finish);
        Ok(b"%PDF-mock".to_vec())
    }
}

/// Backend whose writers only draw images.
struct ImageOnlyBackend;

struct ImageOnlyWriter;

#[async_trait]
impl PdfBackend for ImageOnlyBackend {
    async fn begin(&self, _geometry: &PageGeometry) -> Result<Box<dyn PdfWriter>> {
        Ok(Box::new(ImageOnlyWriter))
    }
}

#[async_trait]
impl PdfWriter for ImageOnlyWriter {
    async fn add_title_page(&mut self, _page: &TitlePage) -> Result<()> {
        Ok(())
    }

    async fn add_image(&mut self, _id: &str, _image: &RasterImage) -> Result<()> {
        Ok(())
    }

    async fn append_page(&mut self, _page: &PhysicalPage) -> Result<()> {
        Ok(())
    }

    async fn finish(&mut self) -> Result<Vec<u8>> {
        Ok(Vec::new())
    }
}

fn two_page_document() -> Document {
    let mut doc = Document::new("Quarterly Report");
    doc.set_page_content(
        0,
        Node::paragraph(vec![Node::text("first page")]),
    )
    .unwrap();
    doc.add_page();
    doc.set_page_content(
        1,
        Node::paragraph(vec![Node::text("second page")]),
    )
    .unwrap();
    doc
}

fn options() -> ExportOptions {
    ExportOptions::new().with_generated_at(Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap())
}

#[tokio::test]
async fn test_export_sequence() {
    // A4: content width 170, slice limit 237
    let renderer = Arc::new(MockRenderer::new(vec![400.0, 100.0]));
    let backend = Arc::new(MockBackend::default());
    let exporter = Exporter::new(renderer.clone(), backend.clone(), options()).unwrap();

    let artifact = exporter.export(&two_page_document()).await.unwrap();

    assert_eq!(artifact.file_name, "quarterly_report.pdf");
    assert_eq!(artifact.bytes, b"%PDF-mock");
    assert_eq!(artifact.physical_pages, 4);

    let events = backend.events();
    assert_eq!(events.len(), 7);
    match &events[0] {
        Event::Title(title) => {
            assert_eq!(
                title.lines(),
                vec!["Quarterly Report", "Created: 2024-05-01", "Pages: 2"]
            );
        }
        other => panic!("expected title page, got {other:?}"),
    }
    assert_eq!(events[1], Event::Image("page-1".into()));
    assert_eq!(events[4], Event::Image("page-2".into()));
    assert_eq!(events[6], Event::Finish);

    let pages: Vec<&PhysicalPage> = events
        .iter()
        .filter_map(|e| match e {
            Event::Page(p) => Some(p),
            _ => None,
        })
        .collect();
    let indices: Vec<usize> = pages.iter().map(|p| p.index).collect();
    assert_eq!(indices, vec![1, 2, 3]);
    assert_eq!(pages[0].content_height(), 237.0);
    assert_eq!(pages[1].content_height(), 163.0);
    assert_eq!(pages[1].footer, "Page 1 of 2 (continued)");
    assert_eq!(pages[2].footer, "Page 2 of 2");
    assert_eq!(pages[2].placements[0].source_image_id, "page-2");
}

#[tokio::test]
async fn test_renderer_receives_styled_page_html() {
    let renderer = Arc::new(MockRenderer::new(vec![10.0, 10.0]));
    let backend = Arc::new(MockBackend::default());
    let exporter = Exporter::new(renderer.clone(), backend, options()).unwrap();
    exporter.export(&two_page_document()).await.unwrap();

    let calls = renderer.calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].1, 170.0);
    assert!(calls[0].0.starts_with(r#"<div style="font-family: Arial, sans-serif;"#));
    assert!(calls[0].0.contains("<p>first page</p>"));
    assert!(calls[1].0.contains("<p>second page</p>"));
}

#[tokio::test]
async fn test_renderer_width_mismatch_scales_height() {
    let mut renderer = MockRenderer::new(vec![200.0]);
    renderer.scale = 2.0;
    let backend = Arc::new(MockBackend::default());
    let exporter = Exporter::new(Arc::new(renderer), backend.clone(), options()).unwrap();

    let artifact = exporter.export(&Document::new("One")).await.unwrap();
    assert_eq!(artifact.physical_pages, 2);
    let heights: Vec<f64> = backend
        .events()
        .iter()
        .filter_map(|e| match e {
            Event::Page(p) => Some(p.content_height()),
            _ => None,
        })
        .collect();
    assert_eq!(heights, vec![200.0]);
}

#[tokio::test]
async fn test_render_failure_aborts_without_output() {
    let renderer = Arc::new(MockRenderer::new(vec![10.0, 10.0]).failing_on(2));
    let backend = Arc::new(MockBackend::default());
    let exporter = Exporter::new(renderer, backend.clone(), options()).unwrap();

    let err = exporter.export(&two_page_document()).await.unwrap_err();
    match err {
        Error::Render { page, message } => {
            assert_eq!(page, 2);
            assert_eq!(message, "canvas lost");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!backend.finished());
}

#[tokio::test]
async fn test_oversized_render_aborts_as_render_failure() {
    let renderer = Arc::new(MockRenderer::new(vec![10.0, 1e20]));
    let backend = Arc::new(MockBackend::default());
    let exporter = Exporter::new(renderer, backend.clone(), options()).unwrap();

    let err = exporter.export(&two_page_document()).await.unwrap_err();
    assert!(matches!(err, Error::Render { page: 2, .. }));
    assert!(!backend.finished());
}

#[tokio::test]
async fn test_write_failure_aborts_without_output() {
    let renderer = Arc::new(MockRenderer::new(vec![10.0, 10.0]));
    let backend = Arc::new(MockBackend {
        fail_on_append: Some(2),
        ..Default::default()
    });
    let exporter = Exporter::new(renderer.clone(), backend.clone(), options()).unwrap();

    let err = exporter.export(&two_page_document()).await.unwrap_err();
    assert!(matches!(err, Error::Write(_)));
    assert!(err.is_export_failure());
    assert!(!backend.finished());
    assert_eq!(renderer.call_count(), 2);
}

#[tokio::test]
async fn test_cancel_between_pages() {
    let renderer = Arc::new(MockRenderer::new(vec![10.0, 10.0]));
    let backend = Arc::new(MockBackend::default());
    let cancel = CancelFlag::new();

    let trigger = cancel.clone();
    let exporter = Exporter::new(renderer.clone(), backend.clone(), options())
        .unwrap()
        .with_progress(Arc::new(move |stage| {
            if stage == (ExportStage::ContentPage { page: 1, total: 2 }) {
                trigger.cancel();
            }
        }));

    let err = exporter
        .export_with_cancel(&two_page_document(), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Cancelled));
    assert_eq!(renderer.call_count(), 1);
    assert!(!backend.finished());
}

#[tokio::test]
async fn test_progress_stages_in_order() {
    let stages = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&stages);
    let exporter = Exporter::new(
        Arc::new(MockRenderer::new(vec![10.0, 10.0])),
        Arc::new(MockBackend::default()),
        options(),
    )
    .unwrap()
    .with_progress(Arc::new(move |stage| sink.lock().unwrap().push(stage)));

    exporter.export(&two_page_document()).await.unwrap();
    assert_eq!(
        *stages.lock().unwrap(),
        vec![
            ExportStage::TitlePage,
            ExportStage::ContentPage { page: 1, total: 2 },
            ExportStage::ContentPage { page: 2, total: 2 },
            ExportStage::Done,
        ]
    );
}

#[tokio::test]
async fn test_parallel_matches_sequential() {
    let sequential = Arc::new(MockBackend::default());
    let parallel = Arc::new(MockBackend::default());
    let doc = two_page_document();

    for (backend, flag) in [(&sequential, false), (&parallel, true)] {
        let exporter = Exporter::new(
            Arc::new(MockRenderer::new(vec![300.0, 50.0])),
            backend.clone(),
            options().with_parallel(flag),
        )
        .unwrap();
        exporter.export(&doc).await.unwrap();
    }
    assert_eq!(sequential.events(), parallel.events());
}

#[tokio::test]
async fn test_unusable_geometry_rejected_before_rendering() {
    let renderer = Arc::new(MockRenderer::new(vec![]));
    let geometry = PageGeometry {
        width: 100.0,
        height: 50.0,
        margin: 15.0,
    };
    let result = Exporter::new(
        renderer.clone(),
        Arc::new(MockBackend::default()),
        ExportOptions::new().with_geometry(geometry),
    );
    assert!(matches!(result, Err(Error::Configuration(_))));
    assert_eq!(renderer.call_count(), 0);
}

#[tokio::test]
async fn test_export_document_helper() {
    let backend = Arc::new(MockBackend::default());
    let artifact = export_document(
        &Document::new("Hello, World!"),
        PageGeometry::letter(),
        Arc::new(MockRenderer::new(vec![0.0])),
        backend.clone(),
    )
    .await
    .unwrap();

    assert_eq!(artifact.file_name, "hello__world_.pdf");
    assert_eq!(artifact.physical_pages, 2);
    assert!(backend.finished());
}

#[tokio::test]
async fn test_text_mode_lays_out_without_renderer() {
    let renderer = Arc::new(MockRenderer::new(vec![]));
    let backend = Arc::new(MockBackend::default());
    let exporter = Exporter::new(
        renderer.clone(),
        backend.clone(),
        options().with_mode(ExportMode::Text),
    )
    .unwrap();

    let artifact = exporter.export(&two_page_document()).await.unwrap();
    assert_eq!(artifact.physical_pages, 3);
    assert_eq!(renderer.call_count(), 0);

    let events = backend.events();
    assert!(matches!(events[0], Event::Title(_)));
    assert_eq!(events[3], Event::Finish);
    let pages: Vec<&TextPage> = events
        .iter()
        .filter_map(|e| match e {
            Event::Text(p) => Some(p),
            _ => None,
        })
        .collect();
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].index, 1);
    assert_eq!(pages[1].index, 2);
    assert_eq!(pages[0].lines[0].text, "Page 1");
    assert_eq!(pages[0].body().next().unwrap().text, "first page");
    assert_eq!(pages[1].footer().unwrap().text, "Page 2 of 2");
}

#[tokio::test]
async fn test_text_mode_long_page_continues() {
    let mut doc = Document::new("Long");
    let paragraphs = (0..60)
        .map(|i| Node::paragraph(vec![Node::text(format!("line {}", i))]))
        .collect();
    doc.set_page_content(0, Node::doc(paragraphs)).unwrap();

    let backend = Arc::new(MockBackend::default());
    let exporter = Exporter::new(
        Arc::new(MockRenderer::new(vec![])),
        backend.clone(),
        options()
            .with_mode(ExportMode::Text)
            .with_text_layout(TextLayoutOptions::new().with_line_height(10.0)),
    )
    .unwrap();
    let artifact = exporter.export(&doc).await.unwrap();

    let pages: Vec<TextPage> = backend
        .events()
        .into_iter()
        .filter_map(|e| match e {
            Event::Text(p) => Some(p),
            _ => None,
        })
        .collect();
    assert!(pages.len() > 1);
    assert_eq!(artifact.physical_pages, pages.len() + 1);
    assert!(pages[1..].iter().all(|p| p.continued && p.logical_index == 0));
    let footers = pages.iter().filter(|p| p.footer().is_some()).count();
    assert_eq!(footers, 1);
    assert!(pages.last().unwrap().footer().is_some());
}

#[tokio::test]
async fn test_text_mode_needs_writer_support() {
    let exporter = Exporter::new(
        Arc::new(MockRenderer::new(vec![])),
        Arc::new(ImageOnlyBackend),
        options().with_mode(ExportMode::Text),
    )
    .unwrap();
    let err = exporter.export(&two_page_document()).await.unwrap_err();
    assert!(matches!(err, Error::Write(_)));
}
