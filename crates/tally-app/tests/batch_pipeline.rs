//! Batch pipeline against a scripted provider and in-memory images

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::Cursor;

use image::{DynamicImage, ImageFormat, RgbaImage};

use tally_app::export::{export_to_excel, export_to_tsv, ExportOptions};
use tally_app::results::ResultsFile;
use tally_app::{BatchOptions, BatchService, ImageInput, ImageOutcome, Session};
use tally_vision::{BackendError, ClientOptions, ExtractionClient, GenerationRequest, ModelBackend, ModelInfo};

const CANDIDATES: [&str; 3] = ["tally-flash", "tally-flash-lite", "tally-pro"];

/// Replies in order; discovery is bypassed by pinning the candidates
struct QueueBackend {
    replies: RefCell<VecDeque<Result<String, BackendError>>>,
    seen: RefCell<Vec<String>>,
}

impl QueueBackend {
    fn new(replies: Vec<Result<String, BackendError>>) -> Self {
        Self {
            replies: RefCell::new(replies.into()),
            seen: RefCell::new(Vec::new()),
        }
    }
}

impl ModelBackend for QueueBackend {
    fn list_models(&self) -> Result<Vec<ModelInfo>, BackendError> {
        panic!("pinned candidates must not trigger discovery");
    }

    fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, BackendError> {
        self.seen.borrow_mut().push(request.model.to_string());
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::Network("no more replies".into())))
    }
}

fn service(replies: Vec<Result<String, BackendError>>, options: BatchOptions) -> BatchService<QueueBackend> {
    let client_options =
        ClientOptions::default().with_pinned_models(CANDIDATES.iter().map(|m| m.to_string()).collect());
    BatchService::new(ExtractionClient::new(QueueBackend::new(replies), client_options), options)
}

fn png(name: &str) -> ImageInput {
    let img = RgbaImage::from_pixel(8, 6, image::Rgba([200, 10, 10, 128]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    ImageInput::new(name, bytes)
}

fn rate_limited() -> Result<String, BackendError> {
    Err(BackendError::RateLimited("RESOURCE_EXHAUSTED".into()))
}

#[test]
fn failures_stay_per_image_and_rows_keep_their_images() {
    let first = r#"{"vessel_name": "KM ALPHA", "imp_20_full": 3, "imp_40_empty": 1, "hatch_cover": 250}"#;
    let third = r#"{"vessel_name": "KM GAMMA", "exp_20_ts_full": 2, "imp_40_ts_empty": 1}"#;
    let mut batch = service(
        vec![Ok(first.into()), rate_limited(), rate_limited(), Ok(third.into())],
        BatchOptions::default(),
    );
    let mut session = Session::new();

    let inputs = vec![
        png("alpha.png"),
        ImageInput::new("broken.jpg", b"not an image at all".to_vec()),
        png("gamma.png"),
    ];
    let mut progress_names = Vec::new();
    let mut on_progress = |report: &tally_app::ImageReport| progress_names.push(report.name.clone());
    let report = batch.process_batch(&mut session, inputs, Some(&mut on_progress));

    assert_eq!(progress_names, vec!["alpha.png", "broken.jpg", "gamma.png"]);
    assert_eq!(report.successful(), 2);
    assert_eq!(report.failed(), 1);
    assert!(matches!(report.images[1].outcome, ImageOutcome::Skipped { .. }));
    assert_eq!(
        report.images[2].outcome,
        ImageOutcome::Added {
            seq: 2,
            model: "tally-pro".into()
        }
    );

    // The broken image never reached the provider
    assert_eq!(
        *batch.client().backend().seen.borrow(),
        vec!["tally-flash", "tally-flash", "tally-flash-lite", "tally-pro"]
    );

    let rows = session.rows();
    assert_eq!(rows.len(), 2);

    assert_eq!(rows[0].seq, Some(1));
    assert_eq!(rows[0].vessel, "KM ALPHA");
    assert_eq!(rows[0].service, "-");
    assert_eq!(rows[0].import.boxes, 4);
    assert_eq!(rows[0].import.teu, 5.0);
    assert_eq!(rows[0].hatch_cover, 0);
    assert_eq!(rows[0].total_boxes, 4);

    assert_eq!(rows[1].seq, Some(2));
    assert_eq!(rows[1].source.as_deref(), Some("gamma.png"));
    assert_eq!(rows[1].transhipment.laden.twenty, 2);
    assert_eq!(rows[1].transhipment.empty.forty, 1);
    assert_eq!(rows[1].transhipment.teu, 4.0);

    assert_eq!(session.source_image(1).unwrap().file_name, "alpha.png");
    assert_eq!(session.source_image(2).unwrap().file_name, "gamma.png");
}

#[test]
fn batch_identity_overrides_extracted_names() {
    let payload = r#"{"vessel_name": "READ FROM IMAGE", "service_name": "X1", "ts_45_full": 1}"#;
    let options = BatchOptions::default()
        .with_vessel(Some("KM SUPPLIED".into()))
        .with_keep_images(false);
    let mut batch = service(vec![Ok(payload.into())], options);
    let mut session = Session::new();

    let mut input = png("one.png");
    input.service = Some("JKT-PNK".into());
    let (seq, model) = batch.process_image(&mut session, input).unwrap();

    let row = session.table().get(seq).unwrap();
    assert_eq!(model, "tally-flash");
    assert_eq!(row.vessel, "KM SUPPLIED");
    assert_eq!(row.service, "JKT-PNK");
    assert_eq!(row.transhipment.teu, 2.25);
    assert_eq!(session.image_count(), 0);
}

#[test]
fn exhausted_candidates_skip_the_image() {
    let mut batch = service(
        vec![rate_limited(), rate_limited(), rate_limited(), Ok(r#"{"imp_20_full": 1}"#.into())],
        BatchOptions::default(),
    );
    let mut session = Session::new();

    let report = batch.process_batch(&mut session, vec![png("a.png"), png("b.png")], None);

    match &report.images[0].outcome {
        ImageOutcome::Skipped { reason } => assert!(reason.contains("all 3 candidate models failed"), "{}", reason),
        other => panic!("unexpected outcome {:?}", other),
    }
    assert!(report.images[1].is_added());
    assert_eq!(session.rows()[0].seq, Some(1));
    assert_eq!(session.rows()[0].source.as_deref(), Some("b.png"));
}

#[test]
fn processed_session_exports_and_reloads() {
    let payloads = vec![
        Ok(r#"{"vessel_name": "KM ONE", "imp_20_full": 2, "imp_20_dg": 1}"#.to_string()),
        Ok(r#"{"vessel_name": "KM TWO", "exp_40_full": 4, "total_shift_box": 3, "total_shift_teus": 5}"#.to_string()),
    ];
    let mut batch = service(payloads, BatchOptions::default());
    let mut session = Session::new();
    let report = batch.process_batch(&mut session, vec![png("1.png"), png("2.png")], None);
    assert_eq!(report.failed(), 0);

    let combined = session.combine(&[1, 2]).unwrap();
    assert_eq!(combined.vessel, "COMBINED");
    assert_eq!(combined.total_boxes, 3 + 4 + 3);
    assert_eq!(combined.total_teu, 3.0 + 8.0 + 5.0);
    assert_eq!(session.rows().len(), 2);

    let dir = tempfile::tempdir().unwrap();
    let options = ExportOptions { include_recon: true };
    let xlsx = dir.path().join("rekap.xlsx");
    let tsv = dir.path().join("rekap.tsv");
    export_to_excel(session.rows(), options, &xlsx).unwrap();
    export_to_tsv(session.rows(), options, &tsv).unwrap();

    assert!(std::fs::read(&xlsx).unwrap().starts_with(b"PK"));
    let text = std::fs::read_to_string(&tsv).unwrap();
    assert_eq!(text.lines().count(), 3);
    assert!(text.lines().next().unwrap().contains("imp_20_dg"));

    let results_path = dir.path().join("results.json");
    ResultsFile::from_session(&session, &report).save(&results_path).unwrap();
    let reloaded = ResultsFile::load(&results_path).unwrap().into_session();
    assert_eq!(reloaded.rows(), session.rows());
}

#[test]
fn rejected_request_skips_only_that_image() {
    let mut batch = service(
        vec![
            Err(BackendError::from_status(401, "API key not valid")),
            Ok(r#"{"vessel_name": "KM NEXT", "exp_20_full": 2}"#.into()),
        ],
        BatchOptions::default(),
    );
    let mut session = Session::new();

    let report = batch.process_batch(&mut session, vec![png("first.png"), png("second.png")], None);

    match &report.images[0].outcome {
        ImageOutcome::Skipped { reason } => assert!(reason.contains("rejected (401)"), "{}", reason),
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(
        report.images[1].outcome,
        ImageOutcome::Added {
            seq: 1,
            model: "tally-flash".into()
        }
    );
    // A rejection does not rotate to the other candidates
    assert_eq!(*batch.client().backend().seen.borrow(), vec!["tally-flash", "tally-flash"]);
    assert_eq!(session.rows()[0].vessel, "KM NEXT");
    assert_eq!(session.rows()[0].export.boxes, 2);
}

#[test]
fn unreadable_file_is_skipped_and_the_batch_continues() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("moved-away.png");
    let present = dir.path().join("present.png");
    std::fs::write(&present, png("present.png").bytes).unwrap();

    let mut batch = service(vec![Ok(r#"{"imp_40_full": 1}"#.into())], BatchOptions::default());
    let mut session = Session::new();
    let mut progress_names = Vec::new();
    let mut on_progress = |report: &tally_app::ImageReport| progress_names.push(report.name.clone());

    let report = batch.process_paths(&mut session, &[missing, present], Some(&mut on_progress));

    assert_eq!(progress_names, vec!["moved-away.png", "present.png"]);
    assert!(matches!(report.images[0].outcome, ImageOutcome::Skipped { .. }));
    assert_eq!(report.added_seqs(), vec![1]);
    assert_eq!(session.rows()[0].source.as_deref(), Some("present.png"));
    assert_eq!(session.rows()[0].import.teu, 2.0);
    // Only the readable file reached the provider
    assert_eq!(batch.client().backend().seen.borrow().len(), 1);
}
