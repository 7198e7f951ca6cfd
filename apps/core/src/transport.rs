use serde::{Deserialize, Serialize};

use crate::action_executor::{self, ActionError};
use crate::config::parse_limit;
use crate::contract::{CopyResponse, CoreRequest, CoreResponse, RenderResultList};
use crate::query_service::QueryHandler;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidJson,
    InvalidRequest,
    Clipboard,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TransportResponse {
    Ok { response: CoreResponse },
    Err { error: ErrorResponse },
}

/// Executes copy actions on behalf of the host.
pub type CopyFn<'a> = dyn FnMut(&str) -> Result<(), ActionError> + 'a;

pub struct Transport<'a, H> {
    handler: H,
    default_limit: usize,
    copy: Box<CopyFn<'a>>,
}

impl<'a, H: QueryHandler> Transport<'a, H> {
    pub fn new(handler: H, default_limit: usize) -> Self {
        Self {
            handler,
            default_limit,
            copy: Box::new(action_executor::copy_to_clipboard),
        }
    }

    pub fn with_copy_fn(
        mut self,
        copy: impl FnMut(&str) -> Result<(), ActionError> + 'a,
    ) -> Self {
        self.copy = Box::new(copy);
        self
    }

    pub fn handle_request(&mut self, request: CoreRequest) -> TransportResponse {
        match self.dispatch(request) {
            Ok(response) => TransportResponse::Ok { response },
            Err(error) => TransportResponse::Err { error },
        }
    }

    pub fn handle_json(&mut self, payload: &str) -> String {
        let response = match serde_json::from_str::<CoreRequest>(payload) {
            Ok(request) => self.handle_request(request),
            Err(error) => TransportResponse::Err {
                error: ErrorResponse {
                    code: ErrorCode::InvalidJson,
                    message: error.to_string(),
                },
            },
        };

        encode_response(&response)
    }

    fn dispatch(&mut self, request: CoreRequest) -> Result<CoreResponse, ErrorResponse> {
        match request {
            CoreRequest::Query(query) => {
                let limit = match query.limit.as_deref() {
                    Some(raw) => parse_limit(raw).map_err(|e| ErrorResponse {
                        code: ErrorCode::InvalidRequest,
                        message: e.to_string(),
                    })?,
                    None => self.default_limit,
                };
                let text = query.query.unwrap_or_default();
                let items = self.handler.handle_query(&text, limit);
                Ok(CoreResponse::RenderResultList(RenderResultList { items }))
            }
            CoreRequest::Copy(copy) => {
                (self.copy)(&copy.text).map_err(map_action_error)?;
                Ok(CoreResponse::Copy(CopyResponse { copied: true }))
            }
            CoreRequest::Refresh => {
                self.handler.refresh();
                Ok(CoreResponse::Refresh)
            }
        }
    }
}

fn encode_response(response: &TransportResponse) -> String {
    serde_json::to_string(response).unwrap_or_else(|error| {
        format!(
            r#"{{"status":"err","error":{{"code":"invalid_json","message":"{}"}}}}"#,
            error.to_string().replace('"', "'")
        )
    })
}

fn map_action_error(error: ActionError) -> ErrorResponse {
    match error {
        ActionError::EmptyText => ErrorResponse {
            code: ErrorCode::InvalidRequest,
            message: error.to_string(),
        },
        ActionError::NoClipboardTool | ActionError::CopyFailed { .. } => ErrorResponse {
            code: ErrorCode::Clipboard,
            message: error.to_string(),
        },
    }
}
