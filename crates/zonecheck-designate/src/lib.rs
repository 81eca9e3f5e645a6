// # Designate Zone Client
//
// HTTP implementation of `ZoneClient` for the Designate v2 zones API.
//
// ## Behaviour
//
// - One HTTP request per trait call; no retries, no waiting for convergence
//   (that is owned by `StatePoller`)
// - Non-success responses are classified through `Error::from_status`
//   (401, 403, 404, 409, 5xx, other)
// - HTTP timeout configured per endpoint (30 seconds by default)
//
// ## Security Requirements
//
// - Auth token NEVER appears in logs or `Debug` output
// - Client construction fails fast if the token is empty
//
// ## API Reference
//
// - Create Zone: POST `/v2/zones`
// - Show Zone: GET `/v2/zones/:zone_id` (`?all_projects=True` for admins)
// - List Zones: GET `/v2/zones?name=...&status=...&limit=...`
// - Update Zone: PATCH `/v2/zones/:zone_id`
// - Delete Zone: DELETE `/v2/zones/:zone_id`

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use zonecheck_core::config::EndpointConfig;
use zonecheck_core::{
    ApiResponse, Error, IdentityConfig, ListParams, Result, ShowParams, Zone, ZoneAttributes,
    ZoneClient, ZoneClientFactory, ZoneList, ZoneUpdate,
};

/// Auth token header
const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// Act on behalf of another project (admin only)
const SUDO_PROJECT_HEADER: &str = "X-Auth-Sudo-Project-Id";

/// Error document returned by Designate on non-success responses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(rename = "type", default)]
    error_type: Option<String>,
}

/// Designate v2 zones client bound to one identity
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the auth token.
pub struct DesignateClient {
    /// Base URL without a trailing slash (e.g. `http://127.0.0.1:9001`)
    base_url: String,

    /// Role name, for logging
    identity: String,

    /// Auth token
    /// ⚠️ NEVER log this value
    auth_token: String,

    /// Project to sudo into; only sent for admin identities
    sudo_project_id: Option<String>,

    client: reqwest::Client,
}

// Custom Debug implementation that hides the auth token
impl std::fmt::Debug for DesignateClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DesignateClient")
            .field("base_url", &self.base_url)
            .field("identity", &self.identity)
            .field("auth_token", &"<REDACTED>")
            .field("sudo_project_id", &self.sudo_project_id)
            .finish()
    }
}

impl DesignateClient {
    /// Create a client acting as `identity` against `endpoint`
    ///
    /// # Parameters
    ///
    /// - `endpoint`: Base URL and HTTP timeout
    /// - `identity`: Credentials; admin identities with a `project_id` send it
    ///   as the sudo project
    ///
    /// # Returns
    ///
    /// - `Ok(DesignateClient)`: Ready to use
    /// - `Err(Error::Config)`: Invalid endpoint or empty token
    pub fn new(endpoint: &EndpointConfig, identity: &IdentityConfig) -> Result<Self> {
        endpoint.validate()?;
        identity.validate()?;

        let client = reqwest::Client::builder()
            .timeout(endpoint.timeout())
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        let sudo_project_id = if identity.admin {
            identity.project_id.clone()
        } else {
            None
        };

        Ok(Self {
            base_url: endpoint.url.trim_end_matches('/').to_string(),
            identity: identity.name.clone(),
            auth_token: identity.auth_token.clone(),
            sudo_project_id,
            client,
        })
    }

    fn zones_url(&self) -> String {
        format!("{}/v2/zones", self.base_url)
    }

    fn zone_url(&self, id: &str) -> String {
        format!("{}/v2/zones/{}", self.base_url, id)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header(AUTH_TOKEN_HEADER, &self.auth_token)
            .header("Accept", "application/json");

        match self.sudo_project_id {
            Some(ref project) => builder.header(SUDO_PROJECT_HEADER, project),
            None => builder,
        }
    }

    /// Send a request and decode a success body
    ///
    /// # Returns
    ///
    /// - `Ok(ApiResponse<T>)`: 2xx with a decodable body
    /// - `Err(Error)`: Transport failure (`Http`), classified non-success
    ///   status, or undecodable body (`Json`)
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<ApiResponse<T>> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::http(format!("{} failed: {}", what, e)))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| Error::http(format!("{}: failed to read response: {}", what, e)))?;

        if !(200..300).contains(&status) {
            tracing::debug!("{} as {} returned {}: {}", what, self.identity, status, text);
            return Err(Error::from_status(status, error_message(what, &text)));
        }

        let body = serde_json::from_str(&text)?;
        tracing::debug!("{} as {} returned {}", what, self.identity, status);
        Ok(ApiResponse::new(status, body))
    }
}

/// Best-effort human message from an error response body
fn error_message(what: &str, text: &str) -> String {
    match serde_json::from_str::<ErrorBody>(text) {
        Ok(ErrorBody {
            message: Some(message),
            error_type,
        }) => match error_type {
            Some(error_type) => format!("{}: {} ({})", what, message, error_type),
            None => format!("{}: {}", what, message),
        },
        _ if text.trim().is_empty() => what.to_string(),
        _ => format!("{}: {}", what, text.trim()),
    }
}

#[async_trait]
impl ZoneClient for DesignateClient {
    /// ```http
    /// POST /v2/zones
    /// {"name": "example.com.", "email": "admin@example.com", "ttl": 3600}
    /// ```
    async fn create_zone(&self, attrs: &ZoneAttributes) -> Result<ApiResponse<Zone>> {
        tracing::info!("Creating zone {} as {}", attrs.name, self.identity);
        let request = self.request(Method::POST, &self.zones_url()).json(attrs);
        self.send(request, "Create zone").await
    }

    async fn show_zone(&self, id: &str, params: &ShowParams) -> Result<ApiResponse<Zone>> {
        let mut request = self.request(Method::GET, &self.zone_url(id));
        if params.all_projects {
            request = request.query(&[("all_projects", "True")]);
        }
        self.send(request, "Show zone").await
    }

    async fn list_zones(&self, params: &ListParams) -> Result<ApiResponse<ZoneList>> {
        let request = self
            .request(Method::GET, &self.zones_url())
            .query(&params.to_query());
        self.send(request, "List zones").await
    }

    async fn update_zone(&self, id: &str, update: &ZoneUpdate) -> Result<ApiResponse<Zone>> {
        if update.is_empty() {
            return Err(Error::invalid_input("Zone update carries no changes"));
        }

        tracing::info!("Updating zone {} as {}", id, self.identity);
        let request = self.request(Method::PATCH, &self.zone_url(id)).json(update);
        self.send(request, "Update zone").await
    }

    async fn delete_zone(&self, id: &str) -> Result<ApiResponse<Zone>> {
        tracing::info!("Deleting zone {} as {}", id, self.identity);
        let request = self.request(Method::DELETE, &self.zone_url(id));
        self.send(request, "Delete zone").await
    }

    fn identity(&self) -> &str {
        &self.identity
    }
}

/// Factory producing `DesignateClient`s for one endpoint
#[derive(Debug, Clone)]
pub struct DesignateFactory {
    endpoint: EndpointConfig,
}

impl DesignateFactory {
    pub fn new(endpoint: EndpointConfig) -> Self {
        Self { endpoint }
    }
}

impl ZoneClientFactory for DesignateFactory {
    fn client_for(&self, identity: &IdentityConfig) -> Result<Arc<dyn ZoneClient>> {
        Ok(Arc::new(DesignateClient::new(&self.endpoint, identity)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint() -> EndpointConfig {
        EndpointConfig::new("http://127.0.0.1:9001/")
    }

    #[test]
    fn test_client_creation() {
        let client = DesignateClient::new(&endpoint(), &IdentityConfig::new("primary", "t1")).unwrap();

        assert_eq!(client.identity(), "primary");
        assert_eq!(client.zones_url(), "http://127.0.0.1:9001/v2/zones");
        assert_eq!(client.zone_url("abc"), "http://127.0.0.1:9001/v2/zones/abc");
    }

    #[test]
    fn test_empty_token_rejected() {
        let err = DesignateClient::new(&endpoint(), &IdentityConfig::new("primary", "")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_invalid_scheme_rejected() {
        let endpoint = EndpointConfig::new("ftp://127.0.0.1");
        let err = DesignateClient::new(&endpoint, &IdentityConfig::new("primary", "t1")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_sudo_only_for_admin() {
        let user = IdentityConfig::new("primary", "t1").with_project("p1");
        let admin = IdentityConfig::new("admin", "t2").with_project("p2").with_admin(true);

        let client = DesignateClient::new(&endpoint(), &user).unwrap();
        assert_eq!(client.sudo_project_id, None);

        let client = DesignateClient::new(&endpoint(), &admin).unwrap();
        assert_eq!(client.sudo_project_id.as_deref(), Some("p2"));
    }

    #[test]
    fn test_auth_token_not_exposed_in_debug() {
        let client =
            DesignateClient::new(&endpoint(), &IdentityConfig::new("primary", "secret_token_12345")).unwrap();

        let debug_str = format!("{:?}", client);
        assert!(!debug_str.contains("secret_token"));
        assert!(debug_str.contains("DesignateClient"));
    }

    #[test]
    fn test_error_message_extraction() {
        let body = r#"{"code": 409, "type": "duplicate_zone", "message": "Duplicate Zone"}"#;
        assert_eq!(
            error_message("Create zone", body),
            "Create zone: Duplicate Zone (duplicate_zone)"
        );
        assert_eq!(error_message("Show zone", ""), "Show zone");
        assert_eq!(error_message("Show zone", "<html>oops</html>"), "Show zone: <html>oops</html>");
    }

    #[test]
    fn test_factory_builds_clients() {
        let factory = DesignateFactory::new(endpoint());
        let client = factory.client_for(&IdentityConfig::new("alt", "t3")).unwrap();
        assert_eq!(client.identity(), "alt");

        assert!(factory.client_for(&IdentityConfig::new("alt", "")).is_err());
    }
}
