use std::fmt::Display;

use thiserror::Error;

use rssync_core::ClientError;

const ITEM_ALREADY_EXISTS_CODE: &str = "rsItemAlreadyExists";
const ITEM_ALREADY_EXISTS_EXCEPTION: &str = "ItemAlreadyExistsException";

/// A SOAP fault returned by the report server.
///
/// `code` is the server's `ErrorCode` detail when present, else the SOAP
/// `faultcode`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct SoapFault {
    pub code: String,
    pub message: String,
}

impl SoapFault {
    pub fn is_already_exists(&self) -> bool {
        self.code == ITEM_ALREADY_EXISTS_CODE
            || self.message.contains(ITEM_ALREADY_EXISTS_EXCEPTION)
    }

    /// Map onto the catalog contract; `target` names the item the call was for.
    pub fn into_client_error(self, target: &str) -> ClientError {
        if self.is_already_exists() {
            ClientError::AlreadyExists {
                path: target.to_string(),
            }
        } else {
            ClientError::Fault {
                code: self.code,
                message: self.message,
            }
        }
    }
}

pub(crate) fn transport_err(err: impl Display) -> ClientError {
    ClientError::Transport(err.to_string())
}

pub(crate) fn protocol_err(err: impl Display) -> ClientError {
    ClientError::Protocol(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_marks_already_exists() {
        let fault = SoapFault {
            code: "rsItemAlreadyExists".into(),
            message: "The item '/A' already exists.".into(),
        };
        assert!(fault.into_client_error("/A").is_already_exists());
    }

    #[test]
    fn exception_name_in_message_marks_already_exists() {
        let fault = SoapFault {
            code: "soap:Server".into(),
            message: "---> Microsoft.ReportingServices.Diagnostics.Utilities.ItemAlreadyExistsException: exists".into(),
        };
        match fault.into_client_error("/A/B") {
            ClientError::AlreadyExists { path } => assert_eq!(path, "/A/B"),
            other => panic!("expected AlreadyExists, got {other:?}"),
        }
    }

    #[test]
    fn other_faults_keep_code_and_message() {
        let fault = SoapFault {
            code: "rsAccessDenied".into(),
            message: "denied".into(),
        };
        match fault.into_client_error("/A") {
            ClientError::Fault { code, message } => {
                assert_eq!(code, "rsAccessDenied");
                assert_eq!(message, "denied");
            }
            other => panic!("expected Fault, got {other:?}"),
        }
    }
}
