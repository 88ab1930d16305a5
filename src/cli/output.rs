//! CLI output formatting

use crate::core::{Configuration, PipelineError};
use crate::engine::PipelineResult;
use crate::execution::PipelineEvent;
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "! ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Spinner shown while the engine runs
pub fn create_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Format a pipeline event for display
pub fn format_pipeline_event(event: &PipelineEvent) -> String {
    match event {
        PipelineEvent::ConfigurationResolved {
            run_id,
            result_path,
        } => format!(
            "{} Configuration resolved ({}), results in {}",
            INFO,
            style(&run_id.to_string()[..8]).dim(),
            style(result_path.display()).cyan()
        ),
        PipelineEvent::ObjectiveDefaulted { objective } => format!(
            "{} No objective given, using {}",
            WARN,
            style(objective).yellow()
        ),
        PipelineEvent::AbundanceValidated { samples, features } => format!(
            "{} Abundances normalized: {} organisms x {} samples",
            CHECK,
            style(features).cyan(),
            style(samples).cyan()
        ),
        PipelineEvent::DietResolved {
            personalized,
            files,
        } => {
            if *personalized {
                format!("{} {} per-individual diets found", CHECK, style(files).cyan())
            } else {
                format!("{} Diet file found", CHECK)
            }
        }
        PipelineEvent::StratificationMissing => format!(
            "{} No stratification file, group statistics skipped",
            WARN
        ),
        PipelineEvent::PoolReady { workers, reused } => {
            let how = if *reused { "reusing" } else { "started" };
            format!(
                "{} Worker pool {} ({} workers)",
                CHECK,
                how,
                style(workers).cyan()
            )
        }
        PipelineEvent::Initialized => format!("{} Pipeline initialized", ROCKET),
        PipelineEvent::EngineStarted {
            model_path,
            abundance_path,
            result_path,
        } => format!(
            "{} Models: {}\n{} Abundances: {}\n{} Results: {}",
            INFO,
            style(model_path.display()).dim(),
            INFO,
            style(abundance_path.display()).dim(),
            INFO,
            style(result_path.display()).dim()
        ),
        PipelineEvent::EngineFinished { success } => {
            if *success {
                format!("{} Modeling engine {}", CHECK, style("finished").green())
            } else {
                format!("{} Modeling engine {}", CROSS, style("failed").red())
            }
        }
    }
}

/// One line per key configuration value
pub fn format_configuration(config: &Configuration) -> String {
    let diet = match serde_json::to_value(config.diet_file_path()) {
        Ok(Value::String(s)) => s,
        Ok(Value::Array(items)) => format!("{} per-individual diets", items.len()),
        _ => String::from("?"),
    };
    let info = config
        .info_file_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "-".to_string());

    [
        format!("  Models: {}", style(config.model_path().display()).bold()),
        format!("  Abundances: {}", style(config.abundance_path().display()).bold()),
        format!("  Results: {}", style(config.result_path().display()).bold()),
        format!("  Diet: {}", style(diet).cyan()),
        format!("  Stratification: {}", style(info).cyan()),
        format!("  Objective: {}", style(config.objre().join(", ")).cyan()),
        format!("  Workers: {}", style(config.num_workers()).cyan()),
        format!("  Compute profiles: {}", style(config.compute_profiles()).cyan()),
    ]
    .join("\n")
}

/// Short description of which result parts the engine filled in
pub fn format_result_summary(result: &PipelineResult) -> String {
    let parts = [
        ("secretion fluxes", &result.net_secretion_fluxes),
        ("uptake fluxes", &result.net_uptake_fluxes),
        ("ordination", &result.ordination),
        ("model statistics", &result.model_stats),
        ("summary", &result.summary),
        ("stratified statistics", &result.stratified_stats),
    ];
    let present: Vec<&str> = parts
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(name, _)| *name)
        .collect();

    let validity = if result.models_ok {
        style("all models valid").green().to_string()
    } else {
        style("some models invalid").yellow().to_string()
    };

    if present.is_empty() {
        format!("{} No outputs returned ({})", INFO, validity)
    } else {
        format!("{} Outputs: {} ({})", INFO, present.join(", "), validity)
    }
}

/// Format an error with a hint for the most common fixes
pub fn format_error(error: &PipelineError) -> String {
    let hint = match error {
        PipelineError::SequentialModeUnsupported { .. } => {
            Some("use --num-workers 2 or more")
        }
        PipelineError::NotNormalized { .. } => {
            Some("normalize abundances so every sample sums to 1")
        }
        PipelineError::MissingFile { .. } => Some("check the path and file extension"),
        PipelineError::PoolCreation { .. } => Some("try a smaller --num-workers"),
        _ => None,
    };

    match hint {
        Some(hint) => format!(
            "{} {}\n  {} {}",
            CROSS,
            style(error).red(),
            style("hint:").dim(),
            hint
        ),
        None => format!("{} {}", CROSS, style(error).red()),
    }
}
