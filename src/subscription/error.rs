use thiserror::Error;

/// Terminal validation failures of a subscription stream. Each one ends the
/// session with an INVALID_ARGUMENT status on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubscribeError {
    #[error("sport list can't be empty")]
    EmptySportList,

    #[error("sport name is unknown")]
    UnknownSport,

    #[error("periodicity of sending lines is more frequent than their pulling periodicity")]
    PeriodicityTooFast,

    #[error("duplicates in sport list")]
    DuplicateSport,
}

impl SubscribeError {
    pub fn code(&self) -> &'static str {
        "INVALID_ARGUMENT"
    }
}
