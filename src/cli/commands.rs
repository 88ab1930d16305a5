//! CLI command definitions

use crate::core::{DietInput, OptionalParams, PipelineError, RequiredParams};
use clap::{ArgAction, Args};
use std::path::PathBuf;

/// Run the modeling pipeline
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    #[command(flatten)]
    pub inputs: InputArgs,

    /// Path to the modeling engine executable
    #[arg(long)]
    pub engine: Option<String>,

    /// Extra argument passed to the engine (repeatable)
    #[arg(long = "engine-arg", allow_hyphen_values = true)]
    pub engine_args: Vec<String>,

    /// Print the engine result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Validate inputs without starting workers or the engine
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    #[command(flatten)]
    pub inputs: InputArgs,

    /// Output the resolved configuration in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Required parameters plus optional overrides
#[derive(Debug, Args, Clone)]
pub struct InputArgs {
    /// Directory containing the per-organism models
    #[arg(short, long)]
    pub model_path: PathBuf,

    /// Abundance table (rows = organisms, columns = samples)
    #[arg(short, long)]
    pub abundance: PathBuf,

    /// Compute flux profiles (true/false)
    #[arg(long, required = true, action = ArgAction::Set)]
    pub compute_profiles: bool,

    /// YAML file with optional parameters
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Result directory [default: ./Results]
    #[arg(short, long)]
    pub result_path: Option<PathBuf>,

    /// Diet shared by all individuals [default: AverageEuropeanDiet]
    #[arg(long, conflicts_with = "individual_diet")]
    pub diet: Option<String>,

    /// Per-individual diet, in sample order (repeatable)
    #[arg(long)]
    pub individual_diet: Vec<String>,

    /// Sample stratification table
    #[arg(long)]
    pub info_file: Option<PathBuf>,

    /// Host model file
    #[arg(long, requires = "host_biomass_rxn")]
    pub host_path: Option<PathBuf>,

    /// Biomass reaction of the host model
    #[arg(long)]
    pub host_biomass_rxn: Option<String>,

    /// Flux through the host biomass reaction
    #[arg(long)]
    pub host_biomass_rxn_flux: Option<f64>,

    /// Objective reaction (repeatable) [default: EX_biomass(e)]
    #[arg(long = "objective")]
    pub objectives: Vec<String>,

    /// Number of parallel workers (at least 2)
    #[arg(short = 'w', long)]
    pub num_workers: Option<usize>,

    /// Lower bound on community biomass
    #[arg(long)]
    pub lower_bm_bound: Option<f64>,

    /// Maximum accepted per-sample abundance total
    #[arg(long)]
    pub normalization_tolerance: Option<f64>,

    #[arg(long, action = ArgAction::Set)]
    pub save_constr_models: Option<bool>,

    /// Simulate a rich diet
    #[arg(long, action = ArgAction::Set)]
    pub r_diet: Option<bool>,

    /// Simulate personalized diets
    #[arg(long, action = ArgAction::Set)]
    pub p_diet: Option<bool>,

    #[arg(long, action = ArgAction::Set)]
    pub include_human_mets: Option<bool>,

    #[arg(long, action = ArgAction::Set)]
    pub repeat_sim: Option<bool>,

    #[arg(long, action = ArgAction::Set)]
    pub adapt_medium: Option<bool>,

    #[arg(long, action = ArgAction::Set)]
    pub remove_blocked_rxns: Option<bool>,
}

impl InputArgs {
    pub fn required(&self) -> RequiredParams {
        RequiredParams::new(&self.model_path, &self.abundance, self.compute_profiles)
    }

    /// Optional parameters from `--config`, overridden by flags
    pub fn optional(&self) -> Result<OptionalParams, PipelineError> {
        let from_file = match &self.config {
            Some(path) => OptionalParams::from_file(path)?,
            None => OptionalParams::default(),
        };
        Ok(from_file.merge(self.overrides()))
    }

    fn overrides(&self) -> OptionalParams {
        let diet_file_path = if !self.individual_diet.is_empty() {
            Some(DietInput::PerIndividual(self.individual_diet.clone()))
        } else {
            self.diet.clone().map(DietInput::Shared)
        };

        OptionalParams {
            result_path: self.result_path.clone(),
            diet_file_path,
            info_file_path: self.info_file.clone(),
            host_path: self.host_path.clone(),
            host_biomass_rxn: self.host_biomass_rxn.clone(),
            host_biomass_rxn_flux: self.host_biomass_rxn_flux,
            objre: (!self.objectives.is_empty()).then(|| self.objectives.clone()),
            save_constr_models: self.save_constr_models,
            num_workers: self.num_workers,
            r_diet: self.r_diet,
            p_diet: self.p_diet,
            include_human_mets: self.include_human_mets,
            lower_bm_bound: self.lower_bm_bound,
            repeat_sim: self.repeat_sim,
            adapt_medium: self.adapt_medium,
            remove_blocked_rxns: self.remove_blocked_rxns,
            normalization_tolerance: self.normalization_tolerance,
        }
    }
}
