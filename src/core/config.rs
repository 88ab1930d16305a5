//! Parameter resolution: required inputs plus optional overrides merged
//! with the documented defaults into one immutable [`Configuration`].

use crate::core::abundance::NORMALIZATION_TOLERANCE;
use crate::core::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf, MAIN_SEPARATOR_STR};
use tracing::{debug, warn};

/// Default diet basename, resolved relative to the working directory
pub const DEFAULT_DIET: &str = "AverageEuropeanDiet";

/// Objective used when none is supplied
pub const DEFAULT_OBJECTIVE: &str = "EX_biomass(e)";

/// Default result directory name under the working directory
pub const DEFAULT_RESULT_DIR: &str = "Results";

pub const DEFAULT_NUM_WORKERS: usize = 2;
pub const DEFAULT_HOST_BIOMASS_FLUX: f64 = 1.0;
pub const DEFAULT_LOWER_BM_BOUND: f64 = 0.4;

/// Diet specification as given by the user: one shared file or one file
/// per individual (in sample order)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DietInput {
    Shared(String),
    PerIndividual(Vec<String>),
}

impl Default for DietInput {
    fn default() -> Self {
        DietInput::Shared(DEFAULT_DIET.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl From<OneOrMany> for Vec<String> {
    fn from(value: OneOrMany) -> Self {
        match value {
            OneOrMany::One(s) if s.is_empty() => Vec::new(),
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

fn deserialize_objectives<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<OneOrMany> = Option::deserialize(deserializer)?;
    Ok(value.map(Into::into))
}

/// Parameters every run must provide
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredParams {
    /// Directory (or file) holding the per-organism models
    pub model_path: PathBuf,
    /// Abundance table location
    pub abundance_path: PathBuf,
    /// Whether the engine should compute flux profiles
    pub compute_profiles: bool,
}

impl RequiredParams {
    pub fn new(
        model_path: impl Into<PathBuf>,
        abundance_path: impl Into<PathBuf>,
        compute_profiles: bool,
    ) -> Self {
        Self {
            model_path: model_path.into(),
            abundance_path: abundance_path.into(),
            compute_profiles,
        }
    }
}

/// Optional parameters. Every field left as `None` takes its default.
///
/// Field names follow the camelCase option names so the same struct can be
/// loaded from a YAML parameter file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OptionalParams {
    #[serde(default, alias = "resPath")]
    pub result_path: Option<PathBuf>,

    #[serde(default)]
    pub diet_file_path: Option<DietInput>,

    #[serde(default)]
    pub info_file_path: Option<PathBuf>,

    #[serde(default)]
    pub host_path: Option<PathBuf>,

    #[serde(default)]
    pub host_biomass_rxn: Option<String>,

    #[serde(default)]
    pub host_biomass_rxn_flux: Option<f64>,

    /// Objective reaction(s); a single string or a list
    #[serde(default, deserialize_with = "deserialize_objectives")]
    pub objre: Option<Vec<String>>,

    #[serde(default)]
    pub save_constr_models: Option<bool>,

    #[serde(default)]
    pub num_workers: Option<usize>,

    #[serde(default)]
    pub r_diet: Option<bool>,

    #[serde(default)]
    pub p_diet: Option<bool>,

    #[serde(default)]
    pub include_human_mets: Option<bool>,

    #[serde(default, rename = "lowerBMBound")]
    pub lower_bm_bound: Option<f64>,

    #[serde(default)]
    pub repeat_sim: Option<bool>,

    #[serde(default)]
    pub adapt_medium: Option<bool>,

    #[serde(default)]
    pub remove_blocked_rxns: Option<bool>,

    #[serde(default)]
    pub normalization_tolerance: Option<f64>,
}

impl OptionalParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load optional parameters from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, PipelineError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse optional parameters from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, PipelineError> {
        // An empty document means "all defaults"
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Overlay `overrides` on top of `self`; set fields in `overrides` win
    pub fn merge(self, overrides: OptionalParams) -> OptionalParams {
        OptionalParams {
            result_path: overrides.result_path.or(self.result_path),
            diet_file_path: overrides.diet_file_path.or(self.diet_file_path),
            info_file_path: overrides.info_file_path.or(self.info_file_path),
            host_path: overrides.host_path.or(self.host_path),
            host_biomass_rxn: overrides.host_biomass_rxn.or(self.host_biomass_rxn),
            host_biomass_rxn_flux: overrides.host_biomass_rxn_flux.or(self.host_biomass_rxn_flux),
            objre: overrides.objre.or(self.objre),
            save_constr_models: overrides.save_constr_models.or(self.save_constr_models),
            num_workers: overrides.num_workers.or(self.num_workers),
            r_diet: overrides.r_diet.or(self.r_diet),
            p_diet: overrides.p_diet.or(self.p_diet),
            include_human_mets: overrides.include_human_mets.or(self.include_human_mets),
            lower_bm_bound: overrides.lower_bm_bound.or(self.lower_bm_bound),
            repeat_sim: overrides.repeat_sim.or(self.repeat_sim),
            adapt_medium: overrides.adapt_medium.or(self.adapt_medium),
            remove_blocked_rxns: overrides.remove_blocked_rxns.or(self.remove_blocked_rxns),
            normalization_tolerance: overrides
                .normalization_tolerance
                .or(self.normalization_tolerance),
        }
    }

    pub fn with_result_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.result_path = Some(path.into());
        self
    }

    pub fn with_diet(mut self, diet: impl Into<String>) -> Self {
        self.diet_file_path = Some(DietInput::Shared(diet.into()));
        self
    }

    pub fn with_per_individual_diets<I, S>(mut self, diets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let diets = diets.into_iter().map(Into::into).collect();
        self.diet_file_path = Some(DietInput::PerIndividual(diets));
        self
    }

    pub fn with_info_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.info_file_path = Some(path.into());
        self
    }

    pub fn with_host(mut self, path: impl Into<PathBuf>, biomass_rxn: impl Into<String>) -> Self {
        self.host_path = Some(path.into());
        self.host_biomass_rxn = Some(biomass_rxn.into());
        self
    }

    pub fn with_objectives<I, S>(mut self, objectives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.objre = Some(objectives.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_num_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = Some(num_workers);
        self
    }

    pub fn with_lower_bm_bound(mut self, bound: f64) -> Self {
        self.lower_bm_bound = Some(bound);
        self
    }

    pub fn with_normalization_tolerance(mut self, tolerance: f64) -> Self {
        self.normalization_tolerance = Some(tolerance);
        self
    }
}

/// Fully resolved, read-only run configuration.
///
/// Only [`ConfigResolver`] builds one; fields are read through accessors.
/// Serialized as-is into the engine request, so field names follow the
/// option names.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    model_path: PathBuf,
    abundance_path: PathBuf,
    compute_profiles: bool,
    /// Always absolute, always ends with a path separator
    result_path: PathBuf,
    diet_file_path: DietInput,
    info_file_path: Option<PathBuf>,
    host_path: Option<PathBuf>,
    host_biomass_rxn: Option<String>,
    host_biomass_rxn_flux: f64,
    objre: Vec<String>,
    /// Set when `objre` fell back to [`DEFAULT_OBJECTIVE`]
    #[serde(skip)]
    objective_defaulted: bool,
    save_constr_models: bool,
    num_workers: usize,
    r_diet: bool,
    p_diet: bool,
    include_human_mets: bool,
    #[serde(rename = "lowerBMBound")]
    lower_bm_bound: f64,
    repeat_sim: bool,
    adapt_medium: bool,
    remove_blocked_rxns: bool,
    normalization_tolerance: f64,
}

impl Configuration {
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn abundance_path(&self) -> &Path {
        &self.abundance_path
    }

    pub fn compute_profiles(&self) -> bool {
        self.compute_profiles
    }

    /// Always absolute, always ends with a path separator
    pub fn result_path(&self) -> &Path {
        &self.result_path
    }

    /// The diet as given; see [`DietResolver`](crate::core::DietResolver)
    /// for the resolved files
    pub fn diet_file_path(&self) -> &DietInput {
        &self.diet_file_path
    }

    pub fn info_file_path(&self) -> Option<&Path> {
        self.info_file_path.as_deref()
    }

    pub fn host_path(&self) -> Option<&Path> {
        self.host_path.as_deref()
    }

    pub fn host_biomass_rxn(&self) -> Option<&str> {
        self.host_biomass_rxn.as_deref()
    }

    pub fn host_biomass_rxn_flux(&self) -> f64 {
        self.host_biomass_rxn_flux
    }

    /// Objective reactions, never empty
    pub fn objre(&self) -> &[String] {
        &self.objre
    }

    /// True when no objective was given and [`DEFAULT_OBJECTIVE`] is used
    pub fn objective_defaulted(&self) -> bool {
        self.objective_defaulted
    }

    pub fn save_constr_models(&self) -> bool {
        self.save_constr_models
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    pub fn r_diet(&self) -> bool {
        self.r_diet
    }

    pub fn p_diet(&self) -> bool {
        self.p_diet
    }

    pub fn include_human_mets(&self) -> bool {
        self.include_human_mets
    }

    pub fn lower_bm_bound(&self) -> f64 {
        self.lower_bm_bound
    }

    pub fn repeat_sim(&self) -> bool {
        self.repeat_sim
    }

    pub fn adapt_medium(&self) -> bool {
        self.adapt_medium
    }

    pub fn remove_blocked_rxns(&self) -> bool {
        self.remove_blocked_rxns
    }

    pub fn normalization_tolerance(&self) -> f64 {
        self.normalization_tolerance
    }

    /// Stratified significance testing is only possible with an info file
    pub fn has_stratification(&self) -> bool {
        self.info_file_path.is_some()
    }
}

/// Merges required and optional parameters into a [`Configuration`]
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    base_dir: PathBuf,
}

impl ConfigResolver {
    /// Resolver anchored at the current working directory
    pub fn new() -> Result<Self, PipelineError> {
        Ok(Self::with_base_dir(std::env::current_dir()?))
    }

    /// Resolver anchored at an explicit directory; relative paths and the
    /// default result directory are taken relative to it
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Resolve parameters into a configuration.
    ///
    /// Creates the result directory if it does not exist yet.
    pub fn resolve(
        &self,
        required: RequiredParams,
        optional: OptionalParams,
    ) -> Result<Configuration, PipelineError> {
        let model_path = self.required_path("modelPath", required.model_path)?;
        let abundance_path = self.required_path("abundancePath", required.abundance_path)?;

        let diet_file_path = match optional.diet_file_path.unwrap_or_default() {
            DietInput::Shared(path) if path.trim().is_empty() => {
                return Err(PipelineError::validation("dietFilePath", "must not be empty"));
            }
            DietInput::PerIndividual(paths) if paths.is_empty() => {
                return Err(PipelineError::validation(
                    "dietFilePath",
                    "per-individual diet list must not be empty",
                ));
            }
            DietInput::PerIndividual(paths) if paths.iter().any(|p| p.trim().is_empty()) => {
                return Err(PipelineError::validation(
                    "dietFilePath",
                    "per-individual diet list contains an empty entry",
                ));
            }
            diet => diet,
        };

        let info_file_path = non_empty(optional.info_file_path).map(|p| self.absolutize(p));
        let host_path = non_empty(optional.host_path).map(|p| self.absolutize(p));
        let host_biomass_rxn = optional.host_biomass_rxn.filter(|r| !r.trim().is_empty());
        if host_path.is_some() && host_biomass_rxn.is_none() {
            return Err(PipelineError::validation(
                "hostBiomassRxn",
                "a host model requires its biomass reaction",
            ));
        }

        let host_biomass_rxn_flux = non_negative(
            "hostBiomassRxnFlux",
            optional.host_biomass_rxn_flux.unwrap_or(DEFAULT_HOST_BIOMASS_FLUX),
        )?;
        let lower_bm_bound = non_negative(
            "lowerBMBound",
            optional.lower_bm_bound.unwrap_or(DEFAULT_LOWER_BM_BOUND),
        )?;

        let normalization_tolerance = optional
            .normalization_tolerance
            .unwrap_or(NORMALIZATION_TOLERANCE);
        if !normalization_tolerance.is_finite() || normalization_tolerance <= 0.0 {
            return Err(PipelineError::validation(
                "normalizationTolerance",
                format!("must be a positive number, got {}", normalization_tolerance),
            ));
        }

        let mut objre = optional.objre.unwrap_or_default();
        if objre.iter().any(|o| o.trim().is_empty()) {
            return Err(PipelineError::validation(
                "objre",
                "objective reaction ids must not be empty",
            ));
        }
        let objective_defaulted = objre.is_empty();
        if objective_defaulted {
            warn!(
                "No objective reaction given, using the default '{}'",
                DEFAULT_OBJECTIVE
            );
            objre.push(DEFAULT_OBJECTIVE.to_string());
        }

        let result_path = self.prepare_result_dir(optional.result_path)?;

        let config = Configuration {
            model_path,
            abundance_path,
            compute_profiles: required.compute_profiles,
            result_path,
            diet_file_path,
            info_file_path,
            host_path,
            host_biomass_rxn,
            host_biomass_rxn_flux,
            objre,
            objective_defaulted,
            save_constr_models: optional.save_constr_models.unwrap_or(false),
            num_workers: optional.num_workers.unwrap_or(DEFAULT_NUM_WORKERS),
            r_diet: optional.r_diet.unwrap_or(false),
            p_diet: optional.p_diet.unwrap_or(false),
            include_human_mets: optional.include_human_mets.unwrap_or(true),
            lower_bm_bound,
            repeat_sim: optional.repeat_sim.unwrap_or(false),
            adapt_medium: optional.adapt_medium.unwrap_or(true),
            remove_blocked_rxns: optional.remove_blocked_rxns.unwrap_or(false),
            normalization_tolerance,
        };

        debug!("Resolved configuration: {:?}", config);
        Ok(config)
    }

    fn required_path(&self, field: &'static str, path: PathBuf) -> Result<PathBuf, PipelineError> {
        if path.as_os_str().is_empty() {
            return Err(PipelineError::validation(field, "path must not be empty"));
        }
        Ok(self.absolutize(path))
    }

    fn absolutize(&self, path: PathBuf) -> PathBuf {
        if path.is_absolute() {
            path
        } else {
            self.base_dir.join(path)
        }
    }

    fn prepare_result_dir(&self, result_path: Option<PathBuf>) -> Result<PathBuf, PipelineError> {
        let dir = match non_empty(result_path) {
            Some(path) => self.absolutize(path),
            None => self.base_dir.join(DEFAULT_RESULT_DIR),
        };
        if !dir.is_dir() {
            debug!("Creating result directory {}", dir.display());
            std::fs::create_dir_all(&dir)?;
        }
        Ok(with_trailing_separator(dir))
    }
}

fn non_empty(path: Option<PathBuf>) -> Option<PathBuf> {
    path.filter(|p| !p.as_os_str().is_empty())
}

fn non_negative(field: &'static str, value: f64) -> Result<f64, PipelineError> {
    if !value.is_finite() || value < 0.0 {
        return Err(PipelineError::validation(
            field,
            format!("must be a finite non-negative number, got {}", value),
        ));
    }
    Ok(value)
}

/// Append a path separator unless the path already ends with one
pub fn with_trailing_separator(path: PathBuf) -> PathBuf {
    if path.as_os_str().to_string_lossy().ends_with(MAIN_SEPARATOR_STR) {
        return path;
    }
    let mut raw = path.into_os_string();
    raw.push(MAIN_SEPARATOR_STR);
    PathBuf::from(raw)
}
