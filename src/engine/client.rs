//! Engine client configuration

/// Default name of the modeling engine executable
pub const DEFAULT_ENGINE_PROGRAM: &str = "mgpipe-engine";

/// Configuration for the engine client
#[derive(Debug, Clone, Default)]
pub struct EngineClientConfig {
    /// Path to the engine executable.
    ///
    /// If not provided, defaults to [`DEFAULT_ENGINE_PROGRAM`] (assumes it's on PATH).
    pub program: Option<String>,

    /// Extra arguments passed before the engine reads its request
    pub args: Vec<String>,
}

impl EngineClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = Some(program.into());
        self
    }

    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Executable to launch
    pub fn program(&self) -> &str {
        self.program.as_deref().unwrap_or(DEFAULT_ENGINE_PROGRAM)
    }
}
