use crate::config::ConfigError;
use crate::resolver::ResolveError;
use crate::store::StoreError;
use crate::tree::{Level, Phase};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("{phase} phase failed at {level} level: {source}")]
    Store {
        phase: Phase,
        level: Level,
        #[source]
        source: StoreError,
    },
    #[error("{phase} phase failed at {level} level: {source}")]
    Resolve {
        phase: Phase,
        level: Level,
        #[source]
        source: ResolveError,
    },
}

impl Error {
    /// Phase and level that were in progress, if the error came from one.
    pub fn location(&self) -> Option<(Phase, Level)> {
        match self {
            Error::Config(_) => None,
            Error::Store { phase, level, .. } | Error::Resolve { phase, level, .. } => {
                Some((*phase, *level))
            }
        }
    }
}

/// Attaches the phase and level in progress to a lower-level failure.
pub(crate) trait AtLevel<T> {
    fn at(self, phase: Phase, level: Level) -> Result<T, Error>;
}

impl<T> AtLevel<T> for Result<T, StoreError> {
    fn at(self, phase: Phase, level: Level) -> Result<T, Error> {
        self.map_err(|source| Error::Store {
            phase,
            level,
            source,
        })
    }
}

impl<T> AtLevel<T> for Result<T, ResolveError> {
    fn at(self, phase: Phase, level: Level) -> Result<T, Error> {
        self.map_err(|source| Error::Resolve {
            phase,
            level,
            source,
        })
    }
}
