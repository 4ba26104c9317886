//! Batch Service - the per-image pipeline
//!
//! For each image, strictly one after another:
//! 1. Normalize the image (RGB, JPEG)
//! 2. Extract raw cell values through the candidate models
//! 3. Reconcile them into a summary row
//! 4. Append the row (and the source image) to the session
//!
//! Failures stay at the image boundary: the image gets no row, the report
//! records the reason and the batch moves on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use tally_domain::{reconcile_with_identity, RowIdentity};
use tally_types::{Error, Result};
use tally_vision::{normalize_image, ExtractionClient, ModelBackend, DEFAULT_JPEG_QUALITY};

use super::session::{Session, SourceImage};

/// Options shared by every image of a batch
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Vessel name applied to every row (otherwise read from the image)
    pub vessel: Option<String>,
    /// Service/voyage label applied to every row
    pub service: Option<String>,
    pub jpeg_quality: u8,
    /// Keep the original bytes in the session's image cache
    pub keep_images: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            vessel: None,
            service: None,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            keep_images: true,
        }
    }
}

impl BatchOptions {
    pub fn with_vessel(mut self, vessel: Option<String>) -> Self {
        self.vessel = vessel;
        self
    }

    pub fn with_service(mut self, service: Option<String>) -> Self {
        self.service = service;
        self
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    pub fn with_keep_images(mut self, keep: bool) -> Self {
        self.keep_images = keep;
        self
    }
}

/// One uploaded image
#[derive(Debug, Clone)]
pub struct ImageInput {
    pub name: String,
    pub bytes: Vec<u8>,
    /// Per-image identity, overriding the batch values
    pub vessel: Option<String>,
    pub service: Option<String>,
}

impl ImageInput {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
            vessel: None,
            service: None,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(Self::new(display_name(path), bytes))
    }
}

/// File name of `path`, or the whole path when it has none
fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}

/// What happened to one image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ImageOutcome {
    Added { seq: u64, model: String },
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageReport {
    pub name: String,
    #[serde(flatten)]
    pub outcome: ImageOutcome,
}

impl ImageReport {
    pub fn skipped(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            outcome: ImageOutcome::Skipped {
                reason: reason.into(),
            },
        }
    }

    pub fn is_added(&self) -> bool {
        matches!(self.outcome, ImageOutcome::Added { .. })
    }
}

/// Per-batch summary of outcomes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub images: Vec<ImageReport>,
}

impl BatchReport {
    pub fn successful(&self) -> usize {
        self.images.iter().filter(|r| r.is_added()).count()
    }

    pub fn failed(&self) -> usize {
        self.images.len() - self.successful()
    }

    pub fn added_seqs(&self) -> Vec<u64> {
        self.images
            .iter()
            .filter_map(|r| match r.outcome {
                ImageOutcome::Added { seq, .. } => Some(seq),
                ImageOutcome::Skipped { .. } => None,
            })
            .collect()
    }
}

pub struct BatchService<B> {
    client: ExtractionClient<B>,
    options: BatchOptions,
}

impl<B: ModelBackend> BatchService<B> {
    pub fn new(client: ExtractionClient<B>, options: BatchOptions) -> Self {
        Self { client, options }
    }

    pub fn client(&self) -> &ExtractionClient<B> {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut ExtractionClient<B> {
        &mut self.client
    }

    /// Run one image through the pipeline and append its row.
    ///
    /// Returns the new sequence number and the model that answered.
    pub fn process_image(&mut self, session: &mut Session, input: ImageInput) -> Result<(u64, String)> {
        let normalized = normalize_image(&input.bytes, self.options.jpeg_quality)?;
        let extraction = self.client.extract(&normalized)?;

        let identity = RowIdentity {
            vessel: input.vessel.clone().or_else(|| self.options.vessel.clone()),
            service: input.service.clone().or_else(|| self.options.service.clone()),
            source: Some(input.name.clone()),
        };
        let row = reconcile_with_identity(&extraction.raw, &identity);

        if extraction.raw.known_key_count() > 0 && row.total_boxes == 0 && row.hatch_cover == 0 {
            warn!(image = %input.name, "extraction produced an all-zero row");
        }

        let image = self.options.keep_images.then(|| SourceImage {
            file_name: input.name,
            bytes: input.bytes,
        });
        let seq = session.add_row(row, image);
        Ok((seq, extraction.model))
    }

    /// Process images in order; each failure is recorded and skipped
    pub fn process_batch<I>(
        &mut self,
        session: &mut Session,
        inputs: I,
        progress: Option<&mut dyn FnMut(&ImageReport)>,
    ) -> BatchReport
    where
        I: IntoIterator<Item = ImageInput>,
    {
        self.run(session, inputs.into_iter().map(Ok), progress)
    }

    /// Read and process files in order.
    ///
    /// Each file is read just before it is processed; an unreadable file is
    /// skipped like any other per-image failure.
    pub fn process_paths<P: AsRef<Path>>(
        &mut self,
        session: &mut Session,
        paths: &[P],
        progress: Option<&mut dyn FnMut(&ImageReport)>,
    ) -> BatchReport {
        let inputs = paths.iter().map(|path| {
            let path = path.as_ref();
            ImageInput::from_path(path).map_err(|e| (display_name(path), e))
        });
        self.run(session, inputs, progress)
    }

    fn run<I>(
        &mut self,
        session: &mut Session,
        inputs: I,
        mut progress: Option<&mut dyn FnMut(&ImageReport)>,
    ) -> BatchReport
    where
        I: IntoIterator<Item = std::result::Result<ImageInput, (String, Error)>>,
    {
        let started_at = Utc::now();
        let mut images = Vec::new();

        for input in inputs {
            let (name, result) = match input {
                Ok(input) => (input.name.clone(), self.process_image(session, input)),
                Err((name, e)) => (name, Err(e)),
            };
            let report = match result {
                Ok((seq, model)) => {
                    info!(image = %name, seq, model = %model, "row added");
                    ImageReport {
                        name,
                        outcome: ImageOutcome::Added { seq, model },
                    }
                }
                Err(e) => {
                    warn!(image = %name, error = %e, "image skipped");
                    ImageReport::skipped(name, e.to_string())
                }
            };

            if let Some(callback) = progress.as_mut() {
                callback(&report);
            }
            images.push(report);
        }

        BatchReport {
            started_at,
            completed_at: Utc::now(),
            images,
        }
    }
}
