//! `observe` - check resources against the remote
//!
//! Each resource file is loaded, its GET mapping sent, and the response
//! compared with its PUT mapping. Resources share no state, so they are
//! observed in parallel.

use anyhow::{Result, bail};
use rayon::prelude::*;
use reconcile::{Error as ObserveError, Evaluator, ObserveResult, Request};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::Context;
use crate::cli::ObserveArgs;
use crate::config::{self, TransportConfig};
use crate::transport::UreqTransport;
use crate::ui;

/// Longest body shown inline
const BODY_PREVIEW_LEN: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Synced,
    OutOfDate,
    NotFound,
    Error,
}

/// Outcome of observing one resource file
#[derive(Debug, Serialize)]
pub struct Outcome {
    pub file: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub verdict: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transport_error: Option<String>,
    #[serde(skip)]
    pub observed: Option<String>,
    #[serde(skip)]
    pub desired: Option<String>,
}

impl Outcome {
    fn failed(file: &Path, name: Option<String>, verdict: Verdict, error: String) -> Self {
        Self {
            file: file.to_path_buf(),
            name,
            verdict,
            status_code: None,
            error: Some(error),
            transport_error: None,
            observed: None,
            desired: None,
        }
    }

    fn label(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.file.display().to_string())
    }
}

pub fn run(ctx: &Context, args: ObserveArgs) -> Result<()> {
    let transport = UreqTransport::new(&TransportConfig::with_timeout_secs(args.timeout));
    let evaluator = Evaluator::new(transport);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.jobs.max(1))
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to create thread pool: {}", e))?;

    let outcomes: Vec<Outcome> = pool.install(|| {
        args.files
            .par_iter()
            .map(|path| observe_file(&evaluator, path, args.diff))
            .collect()
    });

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcomes)?);
    } else {
        report(ctx, &outcomes, args.diff);
    }

    let pending = outcomes
        .iter()
        .filter(|o| o.verdict != Verdict::Synced)
        .count();
    if pending > 0 {
        bail!("{} of {} resources are not up to date", pending, outcomes.len());
    }
    Ok(())
}

fn observe_file(evaluator: &Evaluator, path: &Path, with_desired: bool) -> Outcome {
    let request = match config::load_request(path) {
        Ok(request) => request,
        Err(e) => return Outcome::failed(path, None, Verdict::Error, format!("{e:#}")),
    };

    log::info!("Observing {} ({})", request.name, path.display());
    let result = evaluator.evaluate(&request);
    outcome(evaluator, path, &request, result, with_desired)
}

fn outcome(
    evaluator: &Evaluator,
    path: &Path,
    request: &Request,
    result: reconcile::Result<ObserveResult>,
    with_desired: bool,
) -> Outcome {
    let name = Some(request.name.clone());
    match result {
        Ok(result) => {
            let verdict = if result.synced {
                Verdict::Synced
            } else {
                Verdict::OutOfDate
            };
            let desired = if with_desired && !result.synced {
                evaluator.desired_state(request).ok()
            } else {
                None
            };
            Outcome {
                file: path.to_path_buf(),
                name,
                verdict,
                status_code: Some(result.details.response.status_code),
                error: None,
                transport_error: result.response_error.map(|e| e.message),
                observed: Some(result.details.response.body),
                desired,
            }
        }
        Err(e @ ObserveError::ObjectNotFound) => {
            Outcome::failed(path, name, Verdict::NotFound, e.to_string())
        }
        Err(e) => Outcome::failed(
            path,
            name,
            Verdict::Error,
            format!("{} ({})", e, e.category()),
        ),
    }
}

fn report(ctx: &Context, outcomes: &[Outcome], diff: bool) {
    for outcome in outcomes {
        let label = outcome.label();
        match outcome.verdict {
            Verdict::Synced => {
                if !ctx.quiet {
                    ui::success(&format!("{label}: up to date"));
                }
            }
            Verdict::OutOfDate => {
                let code = outcome
                    .status_code
                    .map(|c| format!(" (HTTP {c})"))
                    .unwrap_or_default();
                ui::warn(&format!("{label}: out of date{code}"));
                if let Some(observed) = &outcome.observed {
                    if diff {
                        if let Some(desired) = &outcome.desired {
                            ui::print_diff(observed, desired);
                        }
                    } else if ctx.verbose > 0 {
                        ui::kv("observed", &ui::truncate(observed, BODY_PREVIEW_LEN));
                    }
                }
            }
            Verdict::NotFound => ui::warn(&format!(
                "{label}: {}",
                outcome.error.as_deref().unwrap_or_default()
            )),
            Verdict::Error => ui::error(&format!(
                "{label}: {}",
                outcome.error.as_deref().unwrap_or_default()
            )),
        }

        if let Some(err) = &outcome.transport_error {
            ui::dim(&format!("transport: {err}"));
        }
    }

    if !ctx.quiet && outcomes.len() > 1 {
        let synced = outcomes
            .iter()
            .filter(|o| o.verdict == Verdict::Synced)
            .count();
        ui::header("Summary");
        ui::kv("up to date", &synced.to_string());
        ui::kv("needs attention", &(outcomes.len() - synced).to_string());
    }
}
