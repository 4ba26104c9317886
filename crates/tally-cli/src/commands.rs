//! Command handlers

use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

use tally_app::config::API_KEY_ENV;
use tally_app::export::{export_to_excel, export_to_tsv, ExportOptions};
use tally_app::results::ResultsFile;
use tally_app::scanner::collect_inputs;
use tally_app::{BatchOptions, BatchService, Config, ImageOutcome, ImageReport, Session};
use tally_infra::GeminiBackend;
use tally_types::{Error, OutputFormat, Result};
use tally_vision::ExtractionClient;

use crate::cli::{Cli, Commands};
use crate::output::output_rows;
use crate::workflow::{
    api_key, apply_overrides, combine_selection, default_export_path, finish_batch, ProcessOutputs,
};

/// Execute CLI command
pub fn execute(cli: Cli) -> Result<()> {
    // Load config
    let mut config = Config::load()?;

    apply_overrides(&cli, &mut config);
    let output_format = cli.format.unwrap_or(config.output_format);

    match &cli.command {
        Commands::Process {
            paths,
            vessel,
            service,
            output,
            tsv,
            json,
            combine,
            recon,
        } => {
            let options = ExportOptions {
                include_recon: *recon || config.include_recon,
            };
            let batch_options = BatchOptions::default()
                .with_vessel(vessel.clone())
                .with_service(service.clone())
                .with_jpeg_quality(config.jpeg_quality)
                .with_keep_images(false);
            let outputs = ProcessOutputs {
                xlsx: output.clone(),
                tsv: tsv.clone(),
                json: json.clone(),
            };
            cmd_process(&cli, &config, paths, batch_options, outputs, combine, options, output_format)
        }

        Commands::Combine {
            results,
            select,
            output,
            tsv,
        } => {
            let options = ExportOptions {
                include_recon: config.include_recon,
            };
            cmd_combine(results, select, output.clone(), tsv.clone(), options, output_format)
        }

        Commands::Export {
            results,
            output,
            tsv,
            recon,
        } => {
            let options = ExportOptions {
                include_recon: *recon || config.include_recon,
            };
            cmd_export(results, output.clone(), tsv.clone(), options)
        }

        Commands::Models => cmd_models(&cli, &config),

        Commands::Config {
            show,
            set_api_key,
            set_models,
            set_output,
            set_recon,
            set_jpeg_quality,
            reset,
        } => cmd_config(ConfigChanges {
            show: *show,
            api_key: set_api_key.clone(),
            models: set_models.clone(),
            output: *set_output,
            recon: *set_recon,
            jpeg_quality: *set_jpeg_quality,
            reset: *reset,
        }),
    }
}

fn extraction_client(cli: &Cli, config: &Config) -> Result<ExtractionClient<GeminiBackend>> {
    let api_key = api_key(cli, config, std::env::var(API_KEY_ENV).ok())?;
    let backend = GeminiBackend::new(api_key, config.gemini_options())
        .map_err(|e| Error::ExtractionFailed(e.to_string()))?;
    Ok(ExtractionClient::new(backend, config.client_options()))
}

#[allow(clippy::too_many_arguments)]
fn cmd_process(
    cli: &Cli,
    config: &Config,
    paths: &[PathBuf],
    batch_options: BatchOptions,
    outputs: ProcessOutputs,
    combine: &[u64],
    options: ExportOptions,
    output_format: OutputFormat,
) -> Result<()> {
    let images = collect_inputs(paths)?;
    if images.is_empty() {
        return Err(Error::FileNotFound("No images found in the given paths".to_string()));
    }

    if cli.verbose {
        eprintln!("Found {} images to process", images.len());
    }

    let mut service = BatchService::new(extraction_client(cli, config)?, batch_options);
    let mut session = Session::new();

    let pb = ProgressBar::new(images.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    let mut on_image = |report: &ImageReport| {
        match &report.outcome {
            ImageOutcome::Added { seq, model } => {
                pb.set_message(format!("#{} {} ({})", seq, report.name, model));
            }
            ImageOutcome::Skipped { reason } => {
                pb.println(format!("Failed to process {}: {}", report.name, reason));
            }
        }
        pb.inc(1);
    };
    let report = service.process_paths(&mut session, &images, Some(&mut on_image));
    pb.finish_with_message("Complete");

    println!("\nBatch Processing Complete");
    println!("=========================");
    println!("Total:      {}", report.images.len());
    println!("Successful: {}", report.successful());
    println!("Failed:     {}", report.failed());
    println!(
        "Duration:   {:.1}s",
        (report.completed_at - report.started_at).num_milliseconds() as f64 / 1000.0
    );

    output_rows(output_format, session.rows(), options)?;

    let finished = finish_batch(&session, &report, &outputs, combine, options)?;
    for path in &finished.written {
        println!("Exported to: {}", path.display());
    }

    if let Some(combined) = finished.combined {
        let combined = combined?;
        println!("\nCombined rows {:?}", combine);
        output_rows(output_format, std::slice::from_ref(&combined), options)?;
    }

    Ok(())
}

fn cmd_combine(
    results_path: &Path,
    select: &[u64],
    output: Option<PathBuf>,
    tsv: Option<PathBuf>,
    options: ExportOptions,
    output_format: OutputFormat,
) -> Result<()> {
    let session = ResultsFile::load(results_path)?.into_session();
    let rows = combine_selection(&session, select)?;

    output_rows(output_format, &rows, options)?;

    if let Some(path) = output {
        export_to_excel(&rows, options, &path)?;
        println!("Exported to: {}", path.display());
    }
    if let Some(path) = tsv {
        export_to_tsv(&rows, options, &path)?;
        println!("Exported to: {}", path.display());
    }
    Ok(())
}

fn cmd_export(
    results_path: &Path,
    output: Option<PathBuf>,
    tsv: Option<PathBuf>,
    options: ExportOptions,
) -> Result<()> {
    let results = ResultsFile::load(results_path)?;

    let output_path = output.unwrap_or_else(|| default_export_path(results_path));

    export_to_excel(&results.rows, options, &output_path)?;
    println!("Exported to: {}", output_path.display());

    if let Some(path) = tsv {
        export_to_tsv(&results.rows, options, &path)?;
        println!("Exported to: {}", path.display());
    }
    Ok(())
}

fn cmd_models(cli: &Cli, config: &Config) -> Result<()> {
    let mut client = extraction_client(cli, config)?;
    let candidates = client.candidates()?;

    if config.models.is_empty() {
        println!("Discovered candidates (in priority order):");
    } else {
        println!("Pinned candidates:");
    }
    for (i, model) in candidates.iter().enumerate() {
        println!("  {}. {}", i + 1, model);
    }
    Ok(())
}

struct ConfigChanges {
    show: bool,
    api_key: Option<String>,
    models: Option<Vec<String>>,
    output: Option<OutputFormat>,
    recon: Option<bool>,
    jpeg_quality: Option<u8>,
    reset: bool,
}

fn cmd_config(changes: ConfigChanges) -> Result<()> {
    if changes.reset {
        let config = Config::default();
        config.save()?;
        println!("Configuration reset to defaults");
        println!("\n{}", config);
        return Ok(());
    }

    let mut config = Config::load()?;
    let mut modified = false;

    if let Some(api_key) = changes.api_key {
        let api_key = api_key.trim().to_string();
        config.api_key = (!api_key.is_empty()).then_some(api_key);
        modified = true;
    }

    if let Some(models) = changes.models {
        config.models = models
            .into_iter()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();
        modified = true;
    }

    if let Some(output_format) = changes.output {
        config.output_format = output_format;
        modified = true;
    }

    if let Some(include_recon) = changes.recon {
        config.include_recon = include_recon;
        modified = true;
    }

    if let Some(quality) = changes.jpeg_quality {
        config.jpeg_quality = quality;
        modified = true;
    }

    if modified {
        config.save()?;
        println!("Configuration updated");
    }

    if changes.show || !modified {
        println!("{}", config);
    }

    Ok(())
}
