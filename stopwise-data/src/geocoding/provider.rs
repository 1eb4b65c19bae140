//! HTTP-based `Geocoder` using the Google Geocoding API.
//!
//! Each [`Geocoder::resolve`] call issues one `GET` request of the form
//! `{base_url}?address={address}&key={api_key}` and maps the payload onto a
//! [`GeocodeResult`]. `ZERO_RESULTS` is a normal outcome and yields an
//! unmatched result; every other non-`OK` status is surfaced as
//! [`GeocodeError::ProviderStatus`].
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use stopwise_core::Geocoder;
//! use stopwise_data::geocoding::{HttpGeocoder, HttpGeocoderConfig};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HttpGeocoderConfig::new("my-api-key")
//!     .with_timeout(Duration::from_secs(5))
//!     .with_user_agent("my-app/1.0");
//! let geocoder = HttpGeocoder::with_config(config)?;
//!
//! let result = geocoder.resolve("10 Downing St, London").await?;
//! println!("{} -> {:?}", result.formatted_address, result.location);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use stopwise_core::{GeoPoint, GeocodeError, GeocodeResult, Geocoder};
use thiserror::Error;
use url::Url;

use super::google::{GeocodeResponse, STATUS_OK, STATUS_ZERO_RESULTS};

/// Default endpoint for the Google Geocoding API.
pub const DEFAULT_GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

/// Default user agent for geocoding requests.
pub const DEFAULT_USER_AGENT: &str = "stopwise-geocoder/0.1";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Error type for [`HttpGeocoder`] construction failures.
#[derive(Debug, Error)]
pub enum ProviderBuildError {
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    /// The configured endpoint is not an absolute URL.
    #[error("invalid geocoding endpoint {url:?}: {source}")]
    InvalidBaseUrl {
        /// Rejected endpoint.
        url: String,
        /// Parser failure.
        #[source]
        source: url::ParseError,
    },
}

/// Configuration for [`HttpGeocoder`].
#[derive(Clone)]
pub struct HttpGeocoderConfig {
    /// API key appended to every request.
    pub api_key: String,
    /// Geocoding endpoint.
    pub base_url: String,
    /// Request timeout duration.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl fmt::Debug for HttpGeocoderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpGeocoderConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl HttpGeocoderConfig {
    /// Create a configuration for `api_key` with default settings.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_GEOCODE_URL.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }

    /// Point requests at a different endpoint.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Geocoder backed by the Google Geocoding API.
pub struct HttpGeocoder {
    client: Client,
    endpoint: Url,
    config: HttpGeocoderConfig,
}

impl fmt::Debug for HttpGeocoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpGeocoder")
            .field("endpoint", &self.endpoint.as_str())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HttpGeocoder {
    /// Create a geocoder for `api_key` with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ProviderBuildError> {
        Self::with_config(HttpGeocoderConfig::new(api_key))
    }

    /// Create a geocoder with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is not a valid URL or the HTTP client
    /// fails to build.
    pub fn with_config(config: HttpGeocoderConfig) -> Result<Self, ProviderBuildError> {
        let endpoint =
            Url::parse(&config.base_url).map_err(|source| ProviderBuildError::InvalidBaseUrl {
                url: config.base_url.clone(),
                source,
            })?;
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(ProviderBuildError::HttpClient)?;
        Ok(Self {
            client,
            endpoint,
            config,
        })
    }

    /// Request URL for `address`, with or without the API key.
    ///
    /// The keyless form is what appears in logs and errors.
    fn request_url(&self, address: &str, with_key: bool) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("address", address);
            if with_key {
                query.append_pair("key", &self.config.api_key);
            }
        }
        url
    }

    /// Convert a reqwest error to a `GeocodeError`.
    ///
    /// The request URL is stripped from the message since it carries the key.
    fn convert_reqwest_error(&self, error: reqwest::Error, url: &str) -> GeocodeError {
        if error.is_timeout() {
            return GeocodeError::Timeout {
                target: url.to_owned(),
                timeout_ms: u64::try_from(self.config.timeout.as_millis()).unwrap_or(u64::MAX),
            };
        }

        if let Some(status) = error.status() {
            return GeocodeError::HttpError {
                url: url.to_owned(),
                status: status.as_u16(),
                message: error.without_url().to_string(),
            };
        }

        GeocodeError::NetworkError {
            url: url.to_owned(),
            message: error.without_url().to_string(),
        }
    }
}

/// Map a decoded payload onto the lookup outcome for `address`.
fn convert_response(
    response: GeocodeResponse,
    address: &str,
) -> Result<GeocodeResult, GeocodeError> {
    match response.status.as_str() {
        STATUS_OK => Ok(response.best().map_or_else(
            || GeocodeResult::unmatched(address),
            |candidate| GeocodeResult {
                formatted_address: candidate
                    .formatted_address
                    .as_deref()
                    .map(str::trim)
                    .filter(|text| !text.is_empty())
                    .unwrap_or(address)
                    .to_owned(),
                location: candidate
                    .location()
                    .map_or(GeoPoint::UNRESOLVED, |point| GeoPoint::new(point.lat, point.lng)),
            },
        )),
        STATUS_ZERO_RESULTS => Ok(GeocodeResult::unmatched(address)),
        _ => Err(GeocodeError::ProviderStatus {
            status: response.status,
            message: response.error_message.unwrap_or_default(),
        }),
    }
}

#[async_trait]
impl Geocoder for HttpGeocoder {
    async fn resolve(&self, address: &str) -> Result<GeocodeResult, GeocodeError> {
        let display_url = self.request_url(address, false).to_string();
        debug!("GET {display_url}");

        let response = self
            .client
            .get(self.request_url(address, true))
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(err, &display_url))?
            .error_for_status()
            .map_err(|err| self.convert_reqwest_error(err, &display_url))?;

        let body = response
            .text()
            .await
            .map_err(|err| self.convert_reqwest_error(err, &display_url))?;
        let payload: GeocodeResponse =
            serde_json::from_str(&body).map_err(|err| GeocodeError::ParseError {
                message: err.to_string(),
            })?;

        convert_response(payload, address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn geocoder() -> HttpGeocoder {
        HttpGeocoder::with_config(
            HttpGeocoderConfig::new("secret-key").with_base_url("https://geo.example.com/json"),
        )
        .expect("geocoder should build")
    }

    fn parse(json: &str) -> GeocodeResponse {
        serde_json::from_str(json).expect("fixture should deserialise")
    }

    #[rstest]
    fn request_url_encodes_address(geocoder: HttpGeocoder) {
        let url = geocoder.request_url("1 Main St, Springfield & Co", true);

        assert_eq!(
            url.as_str(),
            "https://geo.example.com/json?address=1+Main+St%2C+Springfield+%26+Co&key=secret-key"
        );
    }

    #[rstest]
    fn display_url_omits_key(geocoder: HttpGeocoder) {
        let url = geocoder.request_url("Main St", false);

        assert!(!url.as_str().contains("secret-key"));
        assert!(!format!("{geocoder:?}").contains("secret-key"));
    }

    #[rstest]
    fn rejects_relative_endpoint() {
        let err = HttpGeocoder::with_config(HttpGeocoderConfig::new("k").with_base_url("/json"))
            .expect_err("relative URL should fail");

        assert!(matches!(err, ProviderBuildError::InvalidBaseUrl { .. }));
    }

    #[rstest]
    fn convert_response_takes_best_candidate() {
        let response = parse(
            r#"{ "status": "OK", "results": [
                { "formatted_address": "First", "geometry": { "location": { "lat": 1.0, "lng": 2.0 } } },
                { "formatted_address": "Second", "geometry": { "location": { "lat": 3.0, "lng": 4.0 } } }
            ] }"#,
        );

        let result = convert_response(response, "input").expect("should convert");

        assert_eq!(result.formatted_address, "First");
        assert_eq!(result.location, GeoPoint::new(1.0, 2.0));
    }

    #[rstest]
    fn convert_response_falls_back_to_input_text() {
        let response = parse(
            r#"{ "status": "OK", "results": [
                { "formatted_address": "  ", "geometry": { "location": { "lat": 1.0, "lng": 2.0 } } }
            ] }"#,
        );

        let result = convert_response(response, "input").expect("should convert");

        assert_eq!(result.formatted_address, "input");
        assert!(result.location.is_resolved());
    }

    #[rstest]
    fn convert_response_keeps_text_when_geometry_is_missing() {
        let response =
            parse(r#"{ "status": "OK", "results": [{ "formatted_address": "Somewhere" }] }"#);

        let result = convert_response(response, "raw").expect("missing geometry is not fatal");

        assert_eq!(result.formatted_address, "Somewhere");
        assert_eq!(result.location, GeoPoint::UNRESOLVED);
    }

    #[rstest]
    #[case(r#"{ "status": "ZERO_RESULTS", "results": [] }"#)]
    #[case(r#"{ "status": "OK", "results": [] }"#)]
    fn convert_response_reports_unmatched(#[case] json: &str) {
        let result = convert_response(parse(json), "Nowhere").expect("should convert");

        assert_eq!(result, GeocodeResult::unmatched("Nowhere"));
    }

    #[rstest]
    #[case("OVER_QUERY_LIMIT")]
    #[case("REQUEST_DENIED")]
    #[case("INVALID_REQUEST")]
    #[case("UNKNOWN_ERROR")]
    fn convert_response_surfaces_provider_status(#[case] status: &str) {
        let response = parse(&format!(
            r#"{{ "status": "{status}", "error_message": "nope" }}"#
        ));

        let err = convert_response(response, "x").expect_err("should fail");

        assert_eq!(
            err,
            GeocodeError::ProviderStatus {
                status: status.to_owned(),
                message: "nope".to_owned(),
            }
        );
    }

    #[rstest]
    fn config_builder_pattern() {
        let config = HttpGeocoderConfig::new("key")
            .with_base_url("http://localhost:8080/geocode")
            .with_timeout(Duration::from_secs(3))
            .with_user_agent("test-agent/1.0");

        assert_eq!(config.api_key, "key");
        assert_eq!(config.base_url, "http://localhost:8080/geocode");
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.user_agent, "test-agent/1.0");
    }
}
