use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("invalid option: {0}")]
    InvalidOption(#[from] livepdf_protocol::ParseOptionError),
    #[error("unknown option `{name}`")]
    UnknownOption { name: String },
    #[error("option `{name}` requires a value")]
    MissingValue { name: &'static str },
}

impl DomainError {
    pub fn unknown_option(name: impl Into<String>) -> Self {
        Self::UnknownOption { name: name.into() }
    }
}
