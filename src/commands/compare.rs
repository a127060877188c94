//! `compare` - run the state comparator on saved bodies

use anyhow::{Context as AnyhowContext, Result, bail};
use reconcile::{Comparator, CompareType, HttpDetails, HttpResponse, ObserveResult};
use std::fs;

use crate::Context;
use crate::cli::CompareArgs;
use crate::config::expand_path;
use crate::ui;

pub fn run(ctx: &Context, args: CompareArgs) -> Result<()> {
    let response_path = expand_path(&args.response);
    let desired_path = expand_path(&args.desired);
    let response = fs::read_to_string(&response_path)
        .with_context(|| format!("Could not read {}", response_path.display()))?;
    let desired = fs::read_to_string(&desired_path)
        .with_context(|| format!("Could not read {}", desired_path.display()))?;

    let compare_type = CompareType::from(args.compare_type.as_str());
    let result = compare_bodies(&response, &desired, args.status, &compare_type)?;

    if !ctx.quiet {
        ui::kv("compare type", &compare_type.to_string());
        ui::kv("status", &args.status.to_string());
    }

    if result.synced {
        ui::success("Response matches the desired body");
        Ok(())
    } else {
        ui::print_diff(&response, &desired);
        bail!("Response does not match the desired body");
    }
}

/// Compare bodies with the built-in strategies
pub fn compare_bodies(
    response: &str,
    desired: &str,
    status: u16,
    compare_type: &CompareType,
) -> Result<ObserveResult> {
    let details = HttpDetails {
        response: HttpResponse {
            status_code: status,
            body: response.trim_end().to_string(),
            ..Default::default()
        },
        ..Default::default()
    };

    Comparator::default()
        .compare(details, None, desired.trim_end(), compare_type)
        .map_err(Into::into)
}
