pub mod atlas;
pub mod fichub;
pub mod http;
pub mod traits;

pub mod ao3;

pub use atlas::AtlasClient;
pub use fichub::FichubClient;
pub use traits::StoryProvider;

pub use ao3::Ao3Client;

use crate::error::ProviderError;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;

/// Decode a provider response. 404 is the provider's negative answer; any
/// other non-success status or a malformed body is a provider failure.
pub(crate) async fn read_json<T: DeserializeOwned>(
    provider: &'static str,
    response: reqwest::Response,
) -> Result<Option<T>, ProviderError> {
    if response.status() == reqwest::StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !response.status().is_success() {
        return Err(ProviderError::Status {
            provider,
            status: response.status().as_u16(),
        });
    }
    let payload = response
        .json::<T>()
        .await
        .map_err(|e| ProviderError::Payload {
            provider,
            message: e.to_string(),
        })?;
    Ok(Some(payload))
}

/// Parse the calendar-date prefix of an ISO 8601 timestamp string.
pub(crate) fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    let prefix = raw?.get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}
