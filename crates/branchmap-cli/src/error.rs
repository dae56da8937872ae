use branchmap_analysis::{AnalysisError, ChartError};
use branchmap_core::CoreError;
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] branchmap_core::ValidationError),

    #[error("command error: {0}")]
    Command(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("could not install logging: {0}")]
    Logging(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::Command(_) | Self::Logging(_) => 2,
            Self::Core(CoreError::Validation(_)) => 2,
            Self::Core(CoreError::Serialization(_)) | Self::Serialization(_) => 4,
            Self::Core(CoreError::Csv { .. } | CoreError::Io { .. }) => 10,
            Self::Analysis(
                AnalysisError::Io { .. }
                | AnalysisError::Csv { .. }
                | AnalysisError::Chart(ChartError::Io { .. }),
            ) => 10,
            Self::Analysis(_) => 2,
            Self::Io(_) => 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn categories_map_to_exit_codes() {
        let missing_focus = CliError::from(AnalysisError::FocusBankMissing {
            bank: String::from("Nobody"),
        });
        let empty = CliError::from(AnalysisError::EmptyDataset {
            path: PathBuf::from("data/combined_atms.csv"),
        });
        let io = CliError::from(std::io::Error::other("disk full"));
        let serialization = CliError::from(
            serde_json::from_str::<serde_json::Value>("{").expect_err("invalid json"),
        );

        assert_eq!(missing_focus.exit_code(), 2);
        assert_eq!(empty.exit_code(), 2);
        assert_eq!(io.exit_code(), 10);
        assert_eq!(serialization.exit_code(), 4);
        assert_eq!(CliError::Command(String::from("no banks")).exit_code(), 2);
    }
}
