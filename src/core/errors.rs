use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("page_size must be greater than zero")]
    ZeroPageSize,

    #[error("checkpoint_every must be greater than zero")]
    ZeroCheckpointCadence,

    #[error("max_consecutive_failures must be at least one")]
    ZeroFailureBudget,
}
