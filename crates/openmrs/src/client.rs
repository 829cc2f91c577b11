//! HTTP client for the host's REST API.
//!
//! One GET per call, no retries, no caching. Caching is left to the caller (see the
//! quantity-unit lookup in `supply-core`).

use crate::concept::{Concept, ConceptResource};
use crate::order::{OrderResource, PlacedOrder};
use crate::{OpenmrsError, OpenmrsResult, REST_BASE_PATH};
use supply_types::ResourceUuid;

/// HTTP basic-auth credentials.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// REST client bound to one server.
#[derive(Clone, Debug)]
pub struct RestClient {
    http: reqwest::Client,
    rest_root: String,
    credentials: Option<Credentials>,
}

impl RestClient {
    /// Create a client for the server at `base_url` (for example `http://localhost:8080/openmrs`).
    ///
    /// # Errors
    ///
    /// Returns [`OpenmrsError::InvalidInput`] if `base_url` is not an `http`/`https` URL, or
    /// [`OpenmrsError::Http`] if the underlying HTTP client cannot be built.
    pub fn new(base_url: &str, credentials: Option<Credentials>) -> OpenmrsResult<Self> {
        let base = base_url.trim().trim_end_matches('/');
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(OpenmrsError::InvalidInput(format!(
                "base URL must start with http:// or https://, got '{base_url}'"
            )));
        }

        let http = reqwest::Client::builder().build()?;

        Ok(Self {
            http,
            rest_root: format!("{base}{REST_BASE_PATH}"),
            credentials,
        })
    }

    /// Root of the REST API, e.g. `http://localhost:8080/openmrs/ws/rest/v1`.
    pub fn rest_root(&self) -> &str {
        &self.rest_root
    }

    /// Fetch a concept with its set members and answers.
    pub async fn get_concept(&self, uuid: &ResourceUuid) -> OpenmrsResult<Concept> {
        let body = self.get_text(&format!("concept/{uuid}"), &[]).await?;
        ConceptResource::parse(&body)
    }

    /// Fetch the full representation of a placed order.
    pub async fn get_order(&self, uuid: &ResourceUuid) -> OpenmrsResult<PlacedOrder> {
        let body = self.get_text(&format!("order/{uuid}"), &[("v", "full")]).await?;
        OrderResource::parse(&body)
    }

    async fn get_text(&self, path: &str, query: &[(&str, &str)]) -> OpenmrsResult<String> {
        let url = format!("{}/{path}", self.rest_root);
        tracing::debug!("GET {}", url);

        let mut request = self
            .http
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json");
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(creds) = &self.credentials {
            request = request.basic_auth(&creds.username, Some(&creds.password));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!("GET {} returned {}", url, status);
            return Err(OpenmrsError::Status {
                status: status.as_u16(),
                url,
            });
        }

        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn uuid(s: &str) -> ResourceUuid {
        ResourceUuid::new(s).expect("valid uuid")
    }

    #[test]
    fn rejects_non_http_base_url() {
        let err = RestClient::new("localhost:8080", None).expect_err("scheme required");
        assert!(matches!(err, OpenmrsError::InvalidInput(_)));
    }

    #[test]
    fn strips_trailing_slash_from_base_url() {
        let client = RestClient::new("http://localhost:8080/openmrs/", None).expect("client");
        assert_eq!(client.rest_root(), "http://localhost:8080/openmrs/ws/rest/v1");
    }

    #[tokio::test]
    async fn fetches_concept() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ws/rest/v1/concept/units"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "uuid": "units",
                "display": "Units",
                "setMembers": [{"uuid": "u1", "display": "Box"}],
                "answers": [{"uuid": "u2", "display": "Roll"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = RestClient::new(&server.uri(), None).expect("client");
        let concept = client.get_concept(&uuid("units")).await.expect("fetch");
        assert_eq!(concept.set_members[0].display, "Box");
        assert_eq!(concept.answers[0].uuid, "u2");
    }

    #[tokio::test]
    async fn fetches_full_order_with_basic_auth() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ws/rest/v1/order/o1"))
            .and(query_param("v", "full"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "uuid": "o1",
                "orderer": {"uuid": "pr1"},
                "careSetting": {"uuid": "cs1"},
                "orderType": {"uuid": "t1"},
                "concept": {"uuid": "c1", "display": "Gauze"}
            })))
            .mount(&server)
            .await;

        let creds = Credentials {
            username: "admin".into(),
            password: "Admin123".into(),
        };
        let client = RestClient::new(&server.uri(), Some(creds)).expect("client");
        let order = client.get_order(&uuid("o1")).await.expect("fetch");
        assert_eq!(order.orderer_uuid, "pr1");
        assert_eq!(order.concept.display.as_deref(), Some("Gauze"));
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ws/rest/v1/concept/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = RestClient::new(&server.uri(), None).expect("client");
        let err = client
            .get_concept(&uuid("missing"))
            .await
            .expect_err("404 should fail");
        match err {
            OpenmrsError::Status { status, url } => {
                assert_eq!(status, 404);
                assert!(url.ends_with("/concept/missing"));
            }
            other => panic!("expected Status error, got {other:?}"),
        }
    }

    #[test]
    fn debug_output_redacts_password() {
        let creds = Credentials {
            username: "admin".into(),
            password: "secret".into(),
        };
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("admin"));
        assert!(!rendered.contains("secret"));
    }
}
