use anyhow::{Context, Result};
use mgpipe::cli::commands::{RunCommand, ValidateCommand};
use mgpipe::cli::output::*;
use mgpipe::cli::{Cli, Command};
use mgpipe::engine::{EngineClientConfig, SubprocessEngine};
use mgpipe::execution::{PipelineOrchestrator, ProcessContext};
use mgpipe::PipelineError;
use std::sync::Arc;
use tracing::error;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging; RUST_LOG wins over --verbose
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    // Execute command
    match &cli.command {
        Command::Run(cmd) => run_pipeline(cmd).await?,
        Command::Validate(cmd) => validate_inputs(cmd)?,
    }

    Ok(())
}

fn build_orchestrator(cmd: &RunCommand) -> PipelineOrchestrator<SubprocessEngine> {
    let mut engine_config = EngineClientConfig::new();
    if let Some(program) = &cmd.engine {
        engine_config = engine_config.with_program(program.clone());
    }
    for arg in &cmd.engine_args {
        engine_config = engine_config.with_arg(arg.clone());
    }

    let context = Arc::new(ProcessContext::with_rayon());
    PipelineOrchestrator::new(context, SubprocessEngine::new(engine_config))
}

async fn run_pipeline(cmd: &RunCommand) -> Result<()> {
    let optional = cmd
        .inputs
        .optional()
        .context("Failed to load optional parameters")?;
    let orchestrator = build_orchestrator(cmd);

    println!(
        "{} Running with engine {}",
        ROCKET,
        style(orchestrator.engine().program()).bold()
    );
    let spinner = create_spinner("Preparing and running community models...");

    // Set up event handler for console output, printed above the spinner
    let printer = spinner.clone();
    orchestrator.add_event_handler(move |event| {
        printer.println(format_pipeline_event(&event));
    });

    let result = orchestrator.execute(cmd.inputs.required(), optional).await;
    spinner.finish_and_clear();

    match result {
        Ok(outcome) => {
            println!("{}", format_result_summary(&outcome.result));
            if cmd.json {
                println!("{}", serde_json::to_string_pretty(&outcome.result)?);
            }
            let elapsed = outcome.completed_at - outcome.started_at;
            println!(
                "\n{} Run {} completed {} in {}s",
                CHECK,
                style(&outcome.run_id.to_string()[..8]).dim(),
                style("successfully").green(),
                elapsed.num_seconds()
            );
            Ok(())
        }
        Err(e) => fail(e),
    }
}

fn validate_inputs(cmd: &ValidateCommand) -> Result<()> {
    println!("{} Validating inputs...", INFO);

    let optional = cmd
        .inputs
        .optional()
        .context("Failed to load optional parameters")?;
    let context = Arc::new(ProcessContext::with_rayon());
    let orchestrator = PipelineOrchestrator::new(
        context,
        SubprocessEngine::new(EngineClientConfig::default()),
    );
    orchestrator.add_event_handler(|event| {
        println!("{}", format_pipeline_event(&event));
    });

    match orchestrator.prepare(cmd.inputs.required(), optional) {
        Ok(prepared) => {
            println!("{} Inputs are valid!", CHECK);
            println!("{}", format_configuration(&prepared.config));
            if cmd.json {
                let json = serde_json::to_string_pretty(&prepared.config)?;
                println!("\n{}", json);
            }
            Ok(())
        }
        Err(e) => fail(e),
    }
}

fn fail(e: PipelineError) -> ! {
    println!("{}", format_error(&e));
    error!("{}", e);
    std::process::exit(1);
}
