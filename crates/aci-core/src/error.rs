use thiserror::Error;

#[derive(Debug, Error)]
pub enum AciError {
    #[error("Parameter `{parameter}` is required for command: {command}.")]
    ParameterMissing { command: String, parameter: String },

    #[error("{}", invalid_parameter_message(.parameter, .value, .hint))]
    ParameterInvalid {
        parameter: String,
        value: String,
        hint: Option<String>,
    },

    #[error("File validation failed for {path}: {reason}")]
    FileValidation { path: String, reason: String },

    #[error("{0}")]
    Tool(String),

    #[error("Command '{cmd}' timed out after {elapsed:.2} seconds")]
    Timeout { cmd: String, elapsed: f64 },

    #[error("Language {0} is not supported.")]
    UnsupportedLanguage(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl AciError {
    pub fn invalid(parameter: &str, value: impl ToString, hint: impl Into<String>) -> Self {
        AciError::ParameterInvalid {
            parameter: parameter.to_string(),
            value: value.to_string(),
            hint: Some(hint.into()),
        }
    }

    pub fn missing(command: impl ToString, parameter: &str) -> Self {
        AciError::ParameterMissing {
            command: command.to_string(),
            parameter: parameter.to_string(),
        }
    }

    /// Errors the editor hands back to the agent as an `ERROR:` result
    /// instead of failing the whole call.
    pub fn is_tool_error(&self) -> bool {
        matches!(
            self,
            AciError::ParameterMissing { .. }
                | AciError::ParameterInvalid { .. }
                | AciError::FileValidation { .. }
                | AciError::Tool(_)
                | AciError::Timeout { .. }
                | AciError::UnsupportedLanguage(_)
        )
    }
}

fn invalid_parameter_message(parameter: &str, value: &str, hint: &Option<String>) -> String {
    match hint {
        Some(hint) => format!("Invalid `{parameter}` parameter: {value}. {hint}"),
        None => format!("Invalid `{parameter}` parameter: {value}."),
    }
}

pub type Result<T> = std::result::Result<T, AciError>;
