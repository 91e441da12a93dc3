//! # forktree - Main Entry Point
//!
//! Reads a trace file, rebuilds the task model and prints the process tree.
//! Optionally dumps raw task records and exports a Chrome trace timeline.

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write};

use forktree::cli::Args;
use forktree::domain::IngestError;
use forktree::export::ChromeTraceExporter;
use forktree::layout::TextLayouter;
use forktree::model::TaskModel;
use forktree::trace_data::TraceParser;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_DATAERR: i32 = 65;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e:#}");
            code
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<IngestError>() {
        Some(IngestError::Inconsistent { .. }) => EXIT_DATAERR,
        _ => EXIT_ERROR,
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    let mut model = TaskModel::new();
    let stats = TraceParser::new(&mut model).parse_file(&args.trace)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if !args.no_tree {
        for line in TextLayouter::new(&model).lines() {
            writeln!(out, "{line}")?;
        }
    }

    if args.dump {
        if !args.no_tree {
            writeln!(out)?;
        }
        write!(out, "{}", model.dump())?;
    }
    out.flush()?;

    if let Some(ref export_path) = args.export {
        let file = File::create(export_path).with_context(|| {
            format!("Failed to create timeline output file {}", export_path.display())
        })?;
        ChromeTraceExporter::new(&model)
            .with_kernel_threads(!args.hide_kthreads)
            .export(BufWriter::new(file))
            .context("Failed to export timeline")?;
        info!("Timeline written to {}", export_path.display());

        if !args.quiet {
            eprintln!("saved: {}", export_path.display());
        }
    }

    if !args.quiet {
        eprintln!(
            "{} tasks from {} events ({} lines, {} skipped)",
            model.task_count(),
            stats.events,
            stats.lines,
            stats.skipped
        );
    }

    Ok(())
}
