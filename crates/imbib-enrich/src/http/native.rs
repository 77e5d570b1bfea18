//! Native HTTP client using reqwest

use reqwest::Client;
use std::time::Duration;

use super::{HttpError, HttpResponse};

pub struct HttpClient {
    client: Client,
    user_agent: String,
}

impl HttpClient {
    pub fn new(user_agent: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            user_agent: user_agent.to_string(),
        }
    }

    pub async fn get(&self, url: &str, bearer_token: Option<&str>) -> Result<HttpResponse, HttpError> {
        let mut request = self.client.get(url).header("User-Agent", &self.user_agent);
        if let Some(token) = bearer_token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                HttpError::Timeout
            } else {
                HttpError::RequestFailed {
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status().as_u16();

        match status {
            401 => return Err(HttpError::Unauthorized),
            404 => return Err(HttpError::NotFound),
            429 => {
                let retry_after_secs = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok());
                return Err(HttpError::RateLimited { retry_after_secs });
            }
            500..=599 => return Err(HttpError::ServerError { status }),
            _ => {}
        }

        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();

        let body = response.text().await.map_err(|e| HttpError::ParseError {
            message: e.to_string(),
        })?;

        Ok(HttpResponse {
            status,
            body,
            headers,
        })
    }

    pub async fn get_with_params(
        &self,
        url: &str,
        params: &[(&str, &str)],
        bearer_token: Option<&str>,
    ) -> Result<HttpResponse, HttpError> {
        let url =
            reqwest::Url::parse_with_params(url, params).map_err(|_| HttpError::InvalidUrl {
                url: url.to_string(),
            })?;

        self.get(url.as_str(), bearer_token).await
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new("imbib/1.0 (https://imbib.app)")
    }
}
