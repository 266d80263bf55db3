//! JSON-over-HTTP administrative API backend.
//!
//! Every call is a `POST` of an envelope to a single endpoint:
//!
//! ```json
//! { "action": "run_sql", "session": "<token>", "app": "shop", "schema": "shop", "data": { "sql": "..." } }
//! ```
//!
//! The HTTP status is not consulted; a call succeeded iff the response
//! body's `code` equals the configured success code.
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde_json::{Value, json};

use super::{Backend, ExecutionResult, registration_document};
use crate::config::ApiConfig;
use crate::directive::{Directive, Kind, Subtype};

/// A channel able to post a JSON document and return the JSON reply.
#[cfg_attr(test, mockall::automock)]
pub trait Transport {
    /// Post `body` and decode the response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent or the response is
    /// not JSON.
    fn post(&self, body: &Value) -> Result<Value>;
}

/// [`Transport`] over a [`ureq::Agent`].
pub struct UreqTransport {
    agent: ureq::Agent,
    url: String,
}

impl std::fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UreqTransport")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl UreqTransport {
    /// Create a transport posting to `url` with a whole-request `timeout`.
    #[must_use]
    pub fn new(url: &str, timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
            url: url.to_string(),
        }
    }
}

impl Transport for UreqTransport {
    fn post(&self, body: &Value) -> Result<Value> {
        let mut response = self
            .agent
            .post(&self.url)
            .send_json(body)
            .with_context(|| format!("POST {} failed", self.url))?;
        response
            .body_mut()
            .read_json::<Value>()
            .with_context(|| format!("response from {} is not JSON", self.url))
    }
}

/// [`Backend`] that forwards directives to the administrative API.
#[derive(Debug)]
pub struct ApiBackend<T> {
    transport: T,
    app: String,
    schema: String,
    session: String,
    success_code: u16,
}

fn code_of(response: &Value) -> Option<u64> {
    response.get("code").and_then(Value::as_u64)
}

impl<T: Transport> ApiBackend<T> {
    /// Log in with the configured credentials and keep the session token.
    ///
    /// # Errors
    ///
    /// Returns an error if the login call fails, the response code is not
    /// the success code, or the response carries no `data.session` token.
    pub fn login(transport: T, config: &ApiConfig) -> Result<Self> {
        let response = transport
            .post(&json!({
                "action": "login",
                "app": config.app,
                "data": {
                    "username": config.username,
                    "password": config.password,
                },
            }))
            .context("login request failed")?;

        if code_of(&response) != Some(u64::from(config.success_code)) {
            bail!(
                "login rejected: {}",
                ExecutionResult::failure_with(response).message()
            );
        }
        let Some(session) = response.pointer("/data/session").and_then(Value::as_str) else {
            bail!("login response carries no session token");
        };

        Ok(Self {
            session: session.to_string(),
            transport,
            app: config.app.clone(),
            schema: config.schema.clone(),
            success_code: config.success_code,
        })
    }

    /// The session token obtained at login.
    #[must_use]
    pub fn session(&self) -> &str {
        &self.session
    }

    /// Wrap `data` in the standard request envelope.
    #[must_use]
    pub fn envelope(&self, action: &str, data: Value) -> Value {
        json!({
            "action": action,
            "session": self.session,
            "app": self.app,
            "schema": self.schema,
            "data": data,
        })
    }

    /// Prepare a literal `API` payload: it must be a JSON object, gains
    /// `app` and `schema` when absent, and always carries the session token.
    fn api_payload(&self, content: &str) -> Result<Value, String> {
        let value: Value = serde_json::from_str(content)
            .map_err(|e| format!("API payload is not valid JSON: {e}"))?;
        let Value::Object(mut map) = value else {
            return Err("API payload must be a JSON object".to_string());
        };
        map.entry("app").or_insert_with(|| json!(self.app));
        map.entry("schema").or_insert_with(|| json!(self.schema));
        map.insert("session".to_string(), json!(self.session));
        Ok(Value::Object(map))
    }

    fn request(&self, directive: &Directive) -> Result<Value, String> {
        Ok(match (directive.kind, directive.subtype) {
            (Kind::Api, _) => return self.api_payload(&directive.content),
            (Kind::Begin, _) => self.envelope("run_sql", json!({"sql": "BEGIN"})),
            (Kind::Commit, _) => self.envelope("run_sql", json!({"sql": "COMMIT"})),
            (Kind::Sql, Subtype::Raw) => {
                self.envelope("run_sql", json!({"sql": directive.content}))
            }
            (Kind::Sql, subtype) => self.envelope(
                &format!("register_{subtype}"),
                registration_document(directive),
            ),
        })
    }
}

impl<T: Transport + std::fmt::Debug> Backend for ApiBackend<T> {
    fn execute(&mut self, directive: &Directive) -> ExecutionResult {
        let body = match self.request(directive) {
            Ok(body) => body,
            Err(message) => return ExecutionResult::failure(message),
        };
        match self.transport.post(&body) {
            Ok(response) if code_of(&response) == Some(u64::from(self.success_code)) => {
                ExecutionResult::ok(response)
            }
            Ok(response) => ExecutionResult::failure_with(response),
            Err(e) => ExecutionResult::failure(format!("{e:#}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::backend::TxControl;
    use std::path::PathBuf;

    fn config() -> ApiConfig {
        ApiConfig {
            url: "https://admin.example.com/api".to_string(),
            username: "deployer".to_string(),
            password: "secret".to_string(),
            app: "shop".to_string(),
            schema: "shop".to_string(),
            timeout_secs: 30,
            success_code: 200,
        }
    }

    fn backend(transport: MockTransport) -> ApiBackend<MockTransport> {
        ApiBackend {
            transport,
            app: "shop".to_string(),
            schema: "shop".to_string(),
            session: "tok-1".to_string(),
            success_code: 200,
        }
    }

    #[test]
    fn login_posts_credentials_and_keeps_token() {
        let mut transport = MockTransport::new();
        transport
            .expect_post()
            .withf(|body| {
                body == &json!({
                    "action": "login",
                    "app": "shop",
                    "data": {"username": "deployer", "password": "secret"},
                })
            })
            .times(1)
            .returning(|_| Ok(json!({"code": 200, "data": {"session": "tok-1"}})));

        let backend = ApiBackend::login(transport, &config()).unwrap();
        assert_eq!(backend.session(), "tok-1");
    }

    #[test]
    fn login_rejected_by_code() {
        let mut transport = MockTransport::new();
        transport
            .expect_post()
            .returning(|_| Ok(json!({"code": 401, "message": "bad credentials"})));

        let err = ApiBackend::login(transport, &config()).unwrap_err();
        assert!(err.to_string().contains("bad credentials"));
    }

    #[test]
    fn login_without_token_fails() {
        let mut transport = MockTransport::new();
        transport
            .expect_post()
            .returning(|_| Ok(json!({"code": 200, "data": {}})));

        assert!(ApiBackend::login(transport, &config()).is_err());
    }

    #[test]
    fn raw_sql_uses_run_sql_envelope() {
        let mut transport = MockTransport::new();
        transport
            .expect_post()
            .withf(|body| {
                body == &json!({
                    "action": "run_sql",
                    "session": "tok-1",
                    "app": "shop",
                    "schema": "shop",
                    "data": {"sql": "DELETE FROM carts"},
                })
            })
            .times(1)
            .returning(|_| Ok(json!({"code": 200, "data": []})));

        let result = backend(transport).execute(&Directive::literal(Kind::Sql, "DELETE FROM carts"));
        assert!(result.success);
    }

    #[test]
    fn registration_uses_subtype_action() {
        let mut transport = MockTransport::new();
        transport
            .expect_post()
            .withf(|body| {
                body["action"] == "register_script"
                    && body["data"]
                        == json!({
                            "name": "cleanup",
                            "content": "DELETE FROM sessions",
                            "options": {"schedule": "daily"},
                        })
            })
            .times(1)
            .returning(|_| Ok(json!({"code": 200})));

        let mut options = serde_json::Map::new();
        options.insert("schedule".to_string(), json!("daily"));
        let directive = Directive {
            kind: Kind::Sql,
            subtype: Subtype::Script,
            options: Some(options),
            content: "DELETE FROM sessions".to_string(),
            source: Some(PathBuf::from("scripts/cleanup.sql")),
        };
        assert!(backend(transport).execute(&directive).success);
    }

    #[test]
    fn api_payload_gains_defaults_and_session() {
        let mut transport = MockTransport::new();
        transport
            .expect_post()
            .withf(|body| {
                body == &json!({
                    "action": "create_user",
                    "schema": "reporting",
                    "app": "shop",
                    "session": "tok-1",
                })
            })
            .times(1)
            .returning(|_| Ok(json!({"code": 200})));

        let directive = Directive::literal(
            Kind::Api,
            r#"{"action": "create_user", "schema": "reporting", "session": "stale"}"#,
        );
        assert!(backend(transport).execute(&directive).success);
    }

    #[test]
    fn non_object_api_payload_fails_without_a_call() {
        let mut transport = MockTransport::new();
        transport.expect_post().never();
        let mut backend = backend(transport);

        let result = backend.execute(&Directive::literal(Kind::Api, "[1, 2]"));
        assert!(!result.success);
        assert!(result.message().contains("JSON object"));

        let result = backend.execute(&Directive::literal(Kind::Api, "not json"));
        assert!(!result.success);
    }

    #[test]
    fn non_success_code_is_failure_with_response() {
        let mut transport = MockTransport::new();
        transport
            .expect_post()
            .returning(|_| Ok(json!({"code": 500, "message": "relation does not exist"})));

        let result = backend(transport).execute(&Directive::literal(Kind::Sql, "SELECT * FROM nope"));
        assert!(!result.success);
        assert_eq!(result.diagnostic["code"], 500);
        assert_eq!(result.message(), "relation does not exist");
    }

    #[test]
    fn transport_error_is_failure() {
        let mut transport = MockTransport::new();
        transport
            .expect_post()
            .returning(|_| Err(anyhow::anyhow!("connection refused")));

        let result = backend(transport).execute(&Directive::literal(Kind::Sql, "SELECT 1"));
        assert!(!result.success);
        assert!(result.message().contains("connection refused"));
    }

    #[test]
    fn transaction_control_is_sent_as_sql() {
        let mut transport = MockTransport::new();
        transport
            .expect_post()
            .withf(|body| body["action"] == "run_sql" && body["data"]["sql"] == "BEGIN")
            .times(1)
            .returning(|_| Ok(json!({"code": 200})));

        assert!(backend(transport).transaction(TxControl::Begin).success);
    }

    #[test]
    fn custom_success_code_is_honored() {
        let mut transport = MockTransport::new();
        transport
            .expect_post()
            .returning(|_| Ok(json!({"code": 0})));
        let mut backend = backend(transport);
        backend.success_code = 0;

        assert!(backend.execute(&Directive::literal(Kind::Sql, "SELECT 1")).success);
    }
}
