use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("command template is empty: {template:?}")]
    EmptyCommand { template: String },

    #[error("unknown placeholder ${name} in command template {template:?}")]
    UnknownPlaceholder { template: String, name: String },

    #[error("redirection without a target in command template {template:?}")]
    MissingRedirectTarget { template: String },
}

pub type Result<T> = std::result::Result<T, ModelError>;
