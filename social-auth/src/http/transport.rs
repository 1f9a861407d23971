//! Transport abstraction over provider HTTP endpoints.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use tracing::debug;

use super::HttpClient;
use crate::error::Error;

/// Status and body of a provider response.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Minimal HTTP capability consumed by provider networks.
///
/// Non-2xx responses are returned, not turned into errors; interpreting them is
/// the network's job. Errors are reserved for requests that produced no response.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a GET with query `params`, optionally authorized with a bearer token.
    async fn get(
        &self,
        url: &str,
        params: &[(&str, &str)],
        bearer: Option<&str>,
    ) -> Result<TransportResponse, Error>;

    /// Issue a form-encoded POST.
    async fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<TransportResponse, Error>;
}

/// [`Transport`] backed by the middleware HTTP client.
#[derive(Clone)]
pub struct HttpTransport {
    client: HttpClient,
}

impl HttpTransport {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(
        &self,
        url: &str,
        params: &[(&str, &str)],
        bearer: Option<&str>,
    ) -> Result<TransportResponse, Error> {
        debug!("GET {}", url);
        let mut request = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .query(params);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(TransportResponse { status, body })
    }

    async fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<TransportResponse, Error> {
        debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .header(ACCEPT, "application/json")
            .form(form)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(TransportResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpClientBuilder;
    use mockito::Matcher;

    fn transport() -> HttpTransport {
        HttpTransport::new(HttpClientBuilder::new().build().unwrap())
    }

    #[tokio::test]
    async fn test_get_sends_query_and_bearer() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/me")
            .match_query(Matcher::UrlEncoded("fields".into(), "id,email".into()))
            .match_header("authorization", "Bearer tok123")
            .with_status(200)
            .with_body(r#"{"id":"99"}"#)
            .create_async()
            .await;

        let response = transport()
            .get(
                &format!("{}/me", server.url()),
                &[("fields", "id,email")],
                Some("tok123"),
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(response.is_success());
        assert_eq!(response.body, r#"{"id":"99"}"#);
    }

    #[tokio::test]
    async fn test_post_form_returns_error_statuses() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/token")
            .match_body(Matcher::UrlEncoded("code".into(), "abc".into()))
            .with_status(400)
            .with_body("bad_verification_code")
            .create_async()
            .await;

        let response = transport()
            .post_form(&format!("{}/token", server.url()), &[("code", "abc")])
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(!response.is_success());
        assert_eq!(response.status, 400);
    }
}
