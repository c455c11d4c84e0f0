// auto.ria.com developers API client.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use crate::client::traits::{AdSource, DetailSource};
use crate::criteria::SearchCriteria;
use crate::model::{AdvertId, AveragePrice, ClientError, RefItem, SearchPage};

/// Developer API host: search, details and reference lists.
pub const RIA_DEV_URL: &str = "https://developers.ria.com";
/// Public site, used to absolutize advertisement links.
pub const RIA_SITE_URL: &str = "https://auto.ria.com";

/// Every remote call blocks with this timeout; there is no retry.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Passenger-cars category; all category-scoped endpoints use it.
pub const CATEGORY_CARS: u32 = 1;

pub struct RiaClient {
    client: Client,
    api_key: String,
}

impl RiaClient {
    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .user_agent("ria-scout/0.1")
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");

        Self { client, api_key }
    }

    /// GET `path` with the api key and `params`, expecting a 200 JSON body.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<T, ClientError> {
        let url = format!("{RIA_DEV_URL}{path}");
        debug!(
            "sending request to {} with {} parameter(s)",
            url,
            params.len()
        );

        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(decode_api_error(status, &body));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|err| ClientError::Malformed(err.to_string()))
    }

    /// Fetch one reference list (makes, body styles, models of a make, ...).
    pub async fn reference_list(&self, path: &str) -> Result<Vec<RefItem>, ClientError> {
        self.get_json(path, &[]).await
    }

    pub async fn average_price(
        &self,
        criteria: &SearchCriteria,
    ) -> Result<AveragePrice, ClientError> {
        self.get_json("/auto/average_price", criteria.params()).await
    }
}

#[async_trait]
impl AdSource for RiaClient {
    async fn search_page(
        &self,
        criteria: &SearchCriteria,
        page: u64,
        page_size: u64,
    ) -> Result<SearchPage, ClientError> {
        #[derive(Deserialize)]
        struct Envelope {
            result: ResultWrap,
        }
        #[derive(Deserialize)]
        struct ResultWrap {
            search_result: SearchPage,
        }

        let mut params: Vec<(String, String)> = vec![
            ("category_id".into(), CATEGORY_CARS.to_string()),
            ("countpage".into(), page_size.to_string()),
            ("page".into(), page.to_string()),
        ];
        params.extend(criteria.params().iter().cloned());

        let envelope: Envelope = self.get_json("/auto/search/", &params).await?;
        Ok(envelope.result.search_result)
    }
}

#[async_trait]
impl DetailSource for RiaClient {
    async fn advert_details(&self, id: &AdvertId) -> Result<Value, ClientError> {
        self.get_json("/auto/info/", &[("auto_id".to_string(), id.to_string())])
            .await
    }
}

/// Decode the service's non-200 convention: a body shaped
/// `{error: {code, message}}`, with HTTP 403 as the authorization hard stop.
fn decode_api_error(status: StatusCode, body: &str) -> ClientError {
    let decoded = serde_json::from_str::<Value>(body).ok().and_then(|value| {
        let err = value.get("error")?;
        let code = match err.get("code")? {
            Value::String(code) => code.clone(),
            other => other.to_string(),
        };
        let message = err.get("message")?.as_str()?.to_string();
        Some((code, message))
    });

    match decoded {
        Some((code, message)) => {
            error!("{}: {}", code, message);
            if status == StatusCode::FORBIDDEN {
                ClientError::AuthRejected(message)
            } else {
                ClientError::Api { code, message }
            }
        }
        None => {
            error!("ERROR response: {}", status);
            if status == StatusCode::FORBIDDEN {
                ClientError::AuthRejected(format!("HTTP {status}"))
            } else {
                ClientError::Malformed(format!("undecodable error body for HTTP {status}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forbidden_with_error_body_is_auth_rejected() {
        let body = r#"{"error": {"code": "API_KEY_REJECTED", "message": "key expired"}}"#;
        let err = decode_api_error(StatusCode::FORBIDDEN, body);
        assert!(matches!(err, ClientError::AuthRejected(message) if message == "key expired"));
    }

    #[test]
    fn other_status_with_error_body_is_api_error() {
        let body = r#"{"error": {"code": "LIMIT_REACHED", "message": "too many requests"}}"#;
        let err = decode_api_error(StatusCode::TOO_MANY_REQUESTS, body);
        match err {
            ClientError::Api { code, message } => {
                assert_eq!(code, "LIMIT_REACHED");
                assert_eq!(message, "too many requests");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn numeric_error_code_is_accepted() {
        let body = r#"{"error": {"code": 42, "message": "nope"}}"#;
        let err = decode_api_error(StatusCode::BAD_REQUEST, body);
        assert!(matches!(err, ClientError::Api { code, .. } if code == "42"));
    }

    #[test]
    fn garbage_error_body_is_malformed() {
        let err = decode_api_error(StatusCode::INTERNAL_SERVER_ERROR, "<html>boom</html>");
        assert!(matches!(err, ClientError::Malformed(_)));
    }

    #[test]
    fn forbidden_with_garbage_body_still_hard_stops() {
        let err = decode_api_error(StatusCode::FORBIDDEN, "");
        assert!(matches!(err, ClientError::AuthRejected(_)));
    }
}
