//! Response-producing handler kinds: `default`, `json`, `text` and `status`.

use super::{HandlerError, HandlerFactory, MockRequest, MockResponse, Outcome, VariantHandler};
use crate::definitions::{Reply, Responder, RouteDefinition, ValidationError, VariantDefinition};
use crate::response::ResponseBuilder;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// How the `response.body` of a variant is turned into bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyMode {
    /// Strings raw, anything else as JSON
    Auto,
    /// Always JSON, strings included
    Json,
    /// Plain text; body must be a string
    Text,
    /// Status and headers only
    Empty,
}

/// Factory for the response-producing kinds.
pub struct RespondFactory {
    kind: &'static str,
    mode: BodyMode,
}

impl RespondFactory {
    pub fn new(kind: &'static str, mode: BodyMode) -> Self {
        Self { kind, mode }
    }
}

impl HandlerFactory for RespondFactory {
    fn kind(&self) -> &str {
        self.kind
    }

    fn validate(&self, variant: &VariantDefinition) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let accepts_responder = self.mode == BodyMode::Auto;

        if variant.responder.is_some() && !accepts_responder {
            errors.push(ValidationError::new(
                "response",
                format!("Handler '{}' does not accept a function response", self.kind),
            ));
        }

        let response = match variant.payload.get("response") {
            Some(response) => response,
            None if accepts_responder && variant.responder.is_some() => return errors,
            None => {
                errors.push(ValidationError::new(
                    "response",
                    "Missing required field 'response'",
                ));
                return errors;
            }
        };

        let Some(object) = response.as_object() else {
            errors.push(ValidationError::new("response", "'response' must be an object"));
            return errors;
        };

        if let Some(status) = object.get("status") {
            match status.as_u64() {
                Some(code) if (100..=599).contains(&code) => {}
                _ => errors.push(ValidationError::new(
                    "response.status",
                    format!("Status must be an integer between 100 and 599, got {status}"),
                )),
            }
        }

        if let Some(headers) = object.get("headers") {
            match headers.as_object() {
                Some(map) => {
                    for (name, value) in map {
                        if !value.is_string() {
                            errors.push(ValidationError::new(
                                format!("response.headers.{name}"),
                                "Header values must be strings",
                            ));
                        }
                    }
                }
                None => errors.push(ValidationError::new(
                    "response.headers",
                    "'headers' must be an object",
                )),
            }
        }

        match (self.mode, object.get("body")) {
            (BodyMode::Text, Some(body)) if !body.is_string() => errors.push(
                ValidationError::new("response.body", "Text body must be a string"),
            ),
            (BodyMode::Text | BodyMode::Json, None) => errors.push(ValidationError::new(
                "response.body",
                "Missing required field 'body'",
            )),
            _ => {}
        }

        errors
    }

    fn create(
        &self,
        _route: &RouteDefinition,
        variant: &VariantDefinition,
    ) -> Result<Arc<dyn VariantHandler>, HandlerError> {
        let response = match variant.payload.get("response") {
            Some(value) => Some(
                serde_json::from_value::<MockResponse>(value.clone())
                    .map_err(|e| HandlerError::InvalidPayload(e.to_string()))?,
            ),
            None => None,
        };

        if response.is_none() && variant.responder.is_none() {
            return Err(HandlerError::InvalidPayload(
                "variant has neither 'response' nor a responder".to_string(),
            ));
        }

        Ok(Arc::new(RespondHandler {
            mode: self.mode,
            response,
            responder: variant.responder.clone(),
        }))
    }
}

struct RespondHandler {
    mode: BodyMode,
    response: Option<MockResponse>,
    responder: Option<Responder>,
}

impl RespondHandler {
    fn render(&self, response: MockResponse) -> Outcome {
        let rendered = match self.mode {
            BodyMode::Auto => response.into_response(),
            BodyMode::Json => {
                let body = response.body.unwrap_or(Value::Null);
                ResponseBuilder::from_u16(response.status)
                    .merge_headers(response.headers.iter().map(|(k, v)| (k.as_str(), v.as_str())))
                    .default_header("content-type", "application/json")
                    .body(serde_json::to_vec(&body).unwrap_or_default())
                    .build_full()
            }
            BodyMode::Text => {
                let body = match response.body {
                    Some(Value::String(text)) => text,
                    Some(other) => other.to_string(),
                    None => String::new(),
                };
                ResponseBuilder::from_u16(response.status)
                    .merge_headers(response.headers.iter().map(|(k, v)| (k.as_str(), v.as_str())))
                    .default_header("content-type", "text/plain; charset=utf-8")
                    .body(body)
                    .build_full()
            }
            BodyMode::Empty => MockResponse {
                body: None,
                ..response
            }
            .into_response(),
        };
        Outcome::Respond(rendered)
    }
}

#[async_trait]
impl VariantHandler for RespondHandler {
    async fn handle(&self, request: &MockRequest) -> Outcome {
        if let Some(responder) = &self.responder {
            return match responder(request) {
                Reply::Respond(response) => self.render(response),
                Reply::Next => Outcome::Next,
            };
        }
        match &self.response {
            Some(response) => self.render(response.clone()),
            None => Outcome::Next,
        }
    }

    fn preview(&self) -> Value {
        match (&self.response, &self.responder) {
            (_, Some(_)) => serde_json::json!({ "responder": true }),
            (Some(response), None) => serde_json::to_value(response).unwrap_or(Value::Null),
            (None, None) => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::json;

    fn route() -> RouteDefinition {
        RouteDefinition::new("r1", "GET", "/x")
    }

    async fn body_of(outcome: Outcome) -> (u16, String, Option<String>) {
        let Outcome::Respond(response) = outcome else {
            panic!("expected a response");
        };
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get("content-type")
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap(), content_type)
    }

    #[tokio::test]
    async fn test_default_static_response() {
        let factory = RespondFactory::new("default", BodyMode::Auto);
        let variant = VariantDefinition::new("v1").with_response(200, json!({"id": 1}));
        assert!(factory.validate(&variant).is_empty());
        let handler = factory.create(&route(), &variant).unwrap();
        let (status, body, content_type) = body_of(handler.handle(&MockRequest::get("/x")).await).await;
        assert_eq!(status, 200);
        assert_eq!(body, r#"{"id":1}"#);
        assert_eq!(content_type.as_deref(), Some("application/json"));
    }

    #[tokio::test]
    async fn test_default_responder_can_pass_through() {
        let factory = RespondFactory::new("default", BodyMode::Auto);
        let variant = VariantDefinition::new("v1").with_responder(|req: &MockRequest| {
            if req.param("id") == Some("1") {
                Reply::Respond(MockResponse::json(200, json!({"id": 1})))
            } else {
                Reply::Next
            }
        });
        assert!(factory.validate(&variant).is_empty());
        let handler = factory.create(&route(), &variant).unwrap();

        let mut request = MockRequest::get("/users/1");
        request.params.insert("id".to_string(), "1".to_string());
        let (status, _, _) = body_of(handler.handle(&request).await).await;
        assert_eq!(status, 200);

        request.params.insert("id".to_string(), "2".to_string());
        assert!(handler.handle(&request).await.is_next());
    }

    #[tokio::test]
    async fn test_json_mode_serializes_string_bodies() {
        let factory = RespondFactory::new("json", BodyMode::Json);
        let variant = VariantDefinition::new("v1").with_response(200, json!("quoted"));
        let handler = factory.create(&route(), &variant).unwrap();
        let (_, body, content_type) = body_of(handler.handle(&MockRequest::get("/x")).await).await;
        assert_eq!(body, r#""quoted""#);
        assert_eq!(content_type.as_deref(), Some("application/json"));
    }

    #[tokio::test]
    async fn test_text_and_status_modes() {
        let text = RespondFactory::new("text", BodyMode::Text);
        let variant = VariantDefinition::new("v1").with_response(200, json!("plain"));
        let handler = text.create(&route(), &variant).unwrap();
        let (_, body, content_type) = body_of(handler.handle(&MockRequest::get("/x")).await).await;
        assert_eq!(body, "plain");
        assert_eq!(content_type.as_deref(), Some("text/plain; charset=utf-8"));

        let status = RespondFactory::new("status", BodyMode::Empty);
        let variant = VariantDefinition::new("v1").with_response(204, json!({"ignored": true}));
        let handler = status.create(&route(), &variant).unwrap();
        let (code, body, _) = body_of(handler.handle(&MockRequest::get("/x")).await).await;
        assert_eq!(code, 204);
        assert!(body.is_empty());
    }

    #[test]
    fn test_validation_errors() {
        let factory = RespondFactory::new("default", BodyMode::Auto);
        let missing = VariantDefinition::new("v1");
        assert_eq!(factory.validate(&missing)[0].path, "response");

        let not_object = VariantDefinition::new("v1").with_payload("response", json!(5));
        assert_eq!(
            factory.validate(&not_object)[0].message,
            "'response' must be an object"
        );

        let bad_headers = VariantDefinition::new("v1")
            .with_payload("response", json!({"headers": {"x-count": 3}}));
        assert_eq!(factory.validate(&bad_headers)[0].path, "response.headers.x-count");

        let text = RespondFactory::new("text", BodyMode::Text);
        let numeric = VariantDefinition::new("v1").with_response(200, json!(12));
        assert_eq!(text.validate(&numeric)[0].path, "response.body");

        let responder = VariantDefinition::new("v1").with_responder(|_| Reply::Next);
        assert_eq!(text.validate(&responder).len(), 2);
    }
}
