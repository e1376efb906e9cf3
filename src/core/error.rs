use thiserror::Error;

use crate::core::types::ActorId;

#[derive(Error, Debug)]
pub enum CombatError {
    #[error("Actor not found: {0}")]
    UnknownActor(ActorId),

    #[error("Actor {0} is not player controlled")]
    NotPlayerControlled(ActorId),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CombatError>;
