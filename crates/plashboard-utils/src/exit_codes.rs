//! Process exit codes for the `plashboard` CLI binary.

/// Exit codes returned by one-shot CLI subcommands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    ConfigError,
    TemplateError,
    RunInProgress,
    RunFailed,
    IoError,
}

impl ExitCode {
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::ConfigError => 2,
            Self::TemplateError => 3,
            Self::RunInProgress => 4,
            Self::RunFailed => 5,
            Self::IoError => 6,
        }
    }
}
