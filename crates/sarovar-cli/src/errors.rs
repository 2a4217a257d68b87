use console::style;
use std::fmt;

/// Enhanced error type with suggestions
pub struct CliError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
    pub help_command: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), context: None, suggestions: Vec::new(), help_command: None }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_help(mut self, command: impl Into<String>) -> Self {
        self.help_command = Some(command.into());
        self
    }

    pub fn display(&self) {
        eprintln!("{} {}\n", style("✗").red().bold(), style(&self.message).red().bold());

        if let Some(ref context) = self.context {
            eprintln!("{}", context);
            eprintln!();
        }

        if !self.suggestions.is_empty() {
            eprintln!("{}", style("To fix this:").yellow().bold());
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, suggestion);
            }
            eprintln!();
        }

        if let Some(ref help_cmd) = self.help_command {
            eprintln!("{} {}", style("Need help?").cyan(), style(help_cmd).cyan().bold());
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Create error for a boundary file that cannot be read
pub fn boundary_file_unreadable(path: &str, error: &str) -> CliError {
    CliError::new("Cannot read boundary file")
        .with_context(format!("Path: {}\nError: {}", path, error))
        .with_suggestion("Check the file path and try again")
        .with_suggestion("Export the boundary as KML from your GIS tool")
        .with_help("Run: sarovar resolve --help")
}

/// Create error for an ROI the resolver rejected
pub fn roi_rejected(mode: &str, error: &str) -> CliError {
    CliError::new("Could not resolve the region of interest")
        .with_context(format!("Input mode: {}\nError: {}", mode, error))
        .with_suggestion("Boundary files need a <coordinates> block with at least three points")
        .with_suggestion("Points are given as --point LAT,LON with a positive --radius")
        .with_help("Run: sarovar resolve --help")
}

/// Create error for an unregistered module id
pub fn unknown_module(id: &str, known: &[String]) -> CliError {
    CliError::new(format!("Unknown analysis module: {}", id))
        .with_context(format!("Available modules: {}", known.join(", ")))
        .with_suggestion("List modules and their parameters: sarovar modules --params")
        .with_help("Run: sarovar run --help")
}

/// Create error for a backend that refused the project
pub fn permission_denied(message: &str, remediation: &str) -> CliError {
    CliError::new("Compute backend permission denied")
        .with_context(message.to_string())
        .with_suggestion(remediation.to_string())
        .with_suggestion("Pass the right project with --project or SAROVAR_PROJECT_ID")
        .with_help("Run: sarovar doctor")
}

/// Create error for a fixture that failed to load
pub fn fixture_failed(path: &str, error: &str) -> CliError {
    CliError::new("Cannot load backend fixture")
        .with_context(format!("Path: {}\nError: {}", path, error))
        .with_suggestion("Check the TOML syntax of the fixture")
        .with_suggestion("Or drop --fixture to use the bundled demo data")
        .with_help("Run: sarovar doctor --verbose")
}
