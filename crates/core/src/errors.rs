use thiserror::Error;

use crate::{domain::component::ComponentId, flows::StepTransitionError};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid selection: {0}")]
    InvalidSelection(String),
    #[error("unknown component category `{0}`")]
    UnknownCategory(String),
    #[error("unknown component id `{0}`")]
    UnknownComponentId(ComponentId),
    #[error(transparent)]
    StepTransition(#[from] StepTransitionError),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("persistence write failure: {0}")]
    PersistenceWrite(String),
    #[error("persistence decode failure: {0}")]
    PersistenceDecode(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The selection could not be processed. Check the chosen parts and try again."
            }
            Self::ServiceUnavailable { .. } => {
                "Saved quotes are temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Domain(error) => {
                Self::BadRequest { message: error.to_string(), correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::PersistenceWrite(message)
            | ApplicationError::PersistenceDecode(message) => {
                Self::ServiceUnavailable { message, correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::Configuration(message) => {
                Self::Internal { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::component::ComponentId;
    use crate::errors::{ApplicationError, DomainError, InterfaceError};
    use crate::flows::{SessionStep, StepTransitionError};

    #[test]
    fn domain_error_maps_to_bad_request_interface_error() {
        let interface = ApplicationError::from(DomainError::UnknownComponentId(ComponentId(
            "MOTOR-999".to_owned(),
        )))
        .into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::BadRequest {
                ref correlation_id,
                ref message,
            } if correlation_id == "req-1" && message.contains("MOTOR-999")
        ));
    }

    #[test]
    fn step_errors_convert_into_domain_errors() {
        let error = DomainError::from(StepTransitionError::MissingBaseComponent {
            step: SessionStep::SelectingBase,
        });

        let interface = ApplicationError::from(error).into_interface("req-2");
        assert_eq!(
            interface.user_message(),
            "The selection could not be processed. Check the chosen parts and try again."
        );
    }

    #[test]
    fn persistence_write_error_maps_to_service_unavailable() {
        let interface = ApplicationError::PersistenceWrite("database lock timeout".to_owned())
            .into_interface("req-3");

        assert!(matches!(interface, InterfaceError::ServiceUnavailable { .. }));
        assert_eq!(
            interface.user_message(),
            "Saved quotes are temporarily unavailable. Please retry shortly."
        );
    }

    #[test]
    fn configuration_error_maps_to_internal() {
        let interface = ApplicationError::Configuration("tax_rate out of range".to_owned())
            .into_interface("req-4");

        assert!(matches!(interface, InterfaceError::Internal { .. }));
        assert_eq!(interface.user_message(), "An unexpected internal error occurred.");
    }
}
