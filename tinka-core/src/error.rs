use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("Données indisponibles : {0}")]
    DataUnavailable(String),

    #[error("Ligne invalide (tirage '{draw_id}') : {reason}")]
    MalformedRecord { draw_id: String, reason: String },

    #[error("Sélection invalide : {0}")]
    InvalidSelection(String),

    #[error("Configuration incomplète : {0}")]
    UndefinedConfiguration(String),

    #[error("Simulation interrompue")]
    Cancelled,

    #[error("Erreur de configuration : {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
