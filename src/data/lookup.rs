//! Remote VIN lookup client
//!
//! Issues exactly one HTTP request per lookup and reports any failure, bad
//! status or transport error alike, as [`LookupFailed`]. Retrying is layered
//! on top by [`crate::retry::RetryPolicy`].

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use super::{VehicleRecord, Vin};

/// Default endpoint; `{vin}` is replaced with the VIN being looked up
pub const DEFAULT_API_URL: &str = "https://db.vin/api/v1/vin/{vin}";

/// Placeholder substituted in the URL template
const VIN_PLACEHOLDER: &str = "{vin}";

/// A lookup that did not produce a vehicle record
///
/// `status` is `None` when no HTTP response was received at all (timeout,
/// DNS failure, connection refused).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", describe_failure(.status, .body))]
pub struct LookupFailed {
    pub status: Option<u16>,
    pub body: String,
}

fn describe_failure(status: &Option<u16>, body: &str) -> String {
    match status {
        Some(code) => format!("API error {}: {}", code, body),
        None => format!("request failed: {}", body),
    }
}

impl LookupFailed {
    fn transport(err: reqwest::Error) -> Self {
        Self {
            status: err.status().map(|s| s.as_u16()),
            body: err.to_string(),
        }
    }
}

/// Anything that can produce a vehicle record for a VIN
pub trait VehicleSource {
    fn fetch(&self, vin: &Vin) -> impl Future<Output = Result<VehicleRecord, LookupFailed>> + Send;
}

/// HTTP client for the VIN decoding API
#[derive(Debug, Clone)]
pub struct LookupClient {
    http_client: Client,
    url_template: String,
}

impl LookupClient {
    /// Creates a client for the given URL template with a bounded request timeout
    pub fn new(url_template: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(http_client, url_template))
    }

    /// Creates a client around an existing HTTP client
    pub fn with_client(http_client: Client, url_template: impl Into<String>) -> Self {
        Self {
            http_client,
            url_template: url_template.into(),
        }
    }

    /// Builds the request URL for a VIN
    ///
    /// Templates without a `{vin}` placeholder get the VIN appended as the
    /// last path segment.
    pub fn url_for(&self, vin: &Vin) -> String {
        if self.url_template.contains(VIN_PLACEHOLDER) {
            self.url_template.replace(VIN_PLACEHOLDER, vin.as_str())
        } else {
            format!("{}/{}", self.url_template.trim_end_matches('/'), vin)
        }
    }
}

impl VehicleSource for LookupClient {
    /// Fetches the record for a VIN
    ///
    /// # Returns
    /// * `Ok(VehicleRecord)` for a 2xx response whose body is a JSON object.
    ///   The queried VIN is added under `vin` if the API left it out.
    /// * `Err(LookupFailed)` for any other status, an unparseable body or a
    ///   transport error
    async fn fetch(&self, vin: &Vin) -> Result<VehicleRecord, LookupFailed> {
        let url = self.url_for(vin);
        debug!(%vin, %url, "requesting vehicle data");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(LookupFailed::transport)?;

        let status = response.status();
        let body = response.text().await.map_err(LookupFailed::transport)?;

        if !status.is_success() {
            return Err(LookupFailed {
                status: Some(status.as_u16()),
                body,
            });
        }

        let mut record: VehicleRecord =
            serde_json::from_str(&body).map_err(|e| LookupFailed {
                status: Some(status.as_u16()),
                body: format!("invalid response body: {}", e),
            })?;
        record.ensure_vin(vin);

        Ok(record)
    }
}
