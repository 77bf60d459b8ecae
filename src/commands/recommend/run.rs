use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use tracing::info;

use super::client::{ChatCompletionsClient, ChatSettings, CompletionClient};
use super::prompt::recommendation_prompt;
use super::retry::{ERROR_PREFIX, RetrySchedule, complete_with_retry};
use crate::cli::RecommendArgs;
use crate::commands::components::{DEPENDENT, ENABLING};
use crate::sheet::{SheetLayout, Table, load_table, write_table};
use crate::util::{duration_from_secs, pause};

pub(super) const RECOMMENDATION_COLUMN: &str = "Recommendation";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(super) struct RecommendSummary {
    pub generated: usize,
    pub failed: usize,
    pub already_done: usize,
    pub missing_descriptions: usize,
}

pub fn run(args: RecommendArgs) -> Result<()> {
    let client = ChatCompletionsClient::new(
        &args.api_key,
        ChatSettings {
            endpoint: args.endpoint.clone(),
            model: args.model.clone(),
            temperature: args.temperature,
            max_tokens: args.max_tokens,
        },
        Duration::from_secs(args.timeout_secs),
    )?;

    let summary = run_with_client(&args, &client, &mut pause)?;
    info!(
        path = %args.output.display(),
        generated = summary.generated,
        failed = summary.failed,
        already_done = summary.already_done,
        missing_descriptions = summary.missing_descriptions,
        "all recommendations saved"
    );

    Ok(())
}

pub(super) fn run_with_client(
    args: &RecommendArgs,
    client: &dyn CompletionClient,
    sleep: &mut dyn FnMut(Duration),
) -> Result<RecommendSummary> {
    let schedule = RetrySchedule {
        max_attempts: args.max_attempts.max(1),
        rate_limit_cooldown: duration_from_secs(
            args.rate_limit_cooldown_secs,
            "--rate-limit-cooldown-secs",
        )?,
        api_error_cooldown: duration_from_secs(
            args.api_error_cooldown_secs,
            "--api-error-cooldown-secs",
        )?,
    };

    let (mut table, source) = load_starting_table(args)?;
    let enabling = table.require_column(ENABLING.description, source)?;
    let dependent = table.require_column(DEPENDENT.description, source)?;
    let recommendation = table.ensure_column(RECOMMENDATION_COLUMN);

    let layout = SheetLayout {
        wrap_columns: vec![recommendation],
        ..SheetLayout::default()
    };

    let mut summary = RecommendSummary::default();
    let mut unsaved = 0usize;
    for row in 0..table.len() {
        if !table.cell(row, recommendation).trim().is_empty() {
            summary.already_done += 1;
            continue;
        }

        let enabling_text = table.cell(row, enabling).trim();
        let dependent_text = table.cell(row, dependent).trim();
        if enabling_text.is_empty() || dependent_text.is_empty() {
            summary.missing_descriptions += 1;
            continue;
        }

        info!(row = row + 1, "generating recommendation");
        let prompt = recommendation_prompt(enabling_text, dependent_text);
        let text = complete_with_retry(client, &schedule, &prompt, sleep);
        if text.starts_with(ERROR_PREFIX) {
            summary.failed += 1;
        } else {
            summary.generated += 1;
        }
        table.set_cell(row, recommendation, text);

        unsaved += 1;
        if args.save_interval > 0 && unsaved >= args.save_interval {
            write_table(&args.output, &table, &layout)?;
            info!(row = row + 1, path = %args.output.display(), "progress saved");
            unsaved = 0;
        }
    }

    write_table(&args.output, &table, &layout)?;
    Ok(summary)
}

/// The previous output when one exists, so finished rows are not requested
/// again; otherwise the input with every recommendation cleared.
fn load_starting_table(args: &RecommendArgs) -> Result<(Table, &Path)> {
    if args.output.exists() {
        let table = load_table(&args.output)?;
        info!(path = %args.output.display(), rows = table.len(), "resuming from previous output");
        return Ok((table, &args.output));
    }

    let mut table = load_table(&args.input)?;
    let recommendation = table.ensure_column(RECOMMENDATION_COLUMN);
    for row in 0..table.len() {
        table.set_cell(row, recommendation, "");
    }
    info!(path = %args.input.display(), rows = table.len(), "starting from input workbook");
    Ok((table, &args.input))
}
