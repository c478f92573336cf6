use std::{io, path::PathBuf};

use thiserror::Error;

use crate::species_tables::Species;

pub type Result<T> = std::result::Result<T, EosError>;

#[derive(Error, Debug)]
pub enum EosError {
    #[error("EOS data not found at {}", path.display())]
    DataNotFound { path: PathBuf },
    #[error("malformed EOS table {}:{line}: {reason}", path.display())]
    Format {
        path: PathBuf,
        line: usize,
        reason: String,
    },
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("no {} table supplied", species.name())]
    MissingSpecies { species: Species },
    #[error("{quantity} is not finite ({value})")]
    Domain { quantity: &'static str, value: f64 },
}

impl EosError {
    pub(crate) fn format(path: impl Into<PathBuf>, line: usize, reason: impl Into<String>) -> Self {
        Self::Format {
            path: path.into(),
            line,
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            Self::DataNotFound { path }
        } else {
            Self::Io { path, source }
        }
    }
}
