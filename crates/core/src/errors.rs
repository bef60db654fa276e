use thiserror::Error;

/// Failures raised while turning an inbound payload into a command.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error("request body is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("request body does not match the expected shape: {0}")]
    UnexpectedShape(String),
    #[error("request body must be sent with `Content-Type: application/json`")]
    UnsupportedContentType,
    #[error("request body could not be read: {0}")]
    UnreadableBody(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        Self::BadRequest { message: value.to_string(), correlation_id: "unassigned".to_owned() }
    }
}
