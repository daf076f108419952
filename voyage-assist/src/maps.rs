use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use voyage_core::providers::Geocoder;
use voyage_core::search::Coordinates;
use voyage_core::CoreResult;

use crate::error::{ProviderError, ProviderResult};
use crate::http::{client, read_json, str_of};

const SERVICE: &str = "google_maps";
pub const GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

/// Google Maps Geocoding API client.
#[derive(Clone)]
pub struct MapsGeocoder {
    http: reqwest::Client,
    api_key: Option<String>,
    url: String,
}

impl MapsGeocoder {
    pub fn new(api_key: Option<String>, timeout: Duration) -> ProviderResult<Self> {
        Ok(Self {
            http: client(timeout)?,
            api_key: api_key.filter(|k| !k.is_empty()),
            url: GEOCODE_URL.to_string(),
        })
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }
}

#[async_trait]
impl Geocoder for MapsGeocoder {
    async fn geocode(&self, address: &str) -> CoreResult<Option<Coordinates>> {
        let api_key = self.api_key.as_deref().ok_or(ProviderError::NotConfigured(SERVICE))?;
        let response = self
            .http
            .get(&self.url)
            .query(&[("address", address), ("key", api_key)])
            .send()
            .await
            .map_err(ProviderError::from)?;
        let value = read_json(SERVICE, response).await?;

        let coordinates = parse_geocode(&value)?;
        debug!(address, found = coordinates.is_some(), "Geocoded");
        Ok(coordinates)
    }
}

/// First result of a geocoding response; `ZERO_RESULTS` is `None`.
pub fn parse_geocode(value: &Value) -> ProviderResult<Option<Coordinates>> {
    match value["status"].as_str() {
        Some("OK") => {}
        Some("ZERO_RESULTS") => return Ok(None),
        status => {
            return Err(ProviderError::Upstream {
                service: SERVICE,
                status: 200,
                message: value["error_message"]
                    .as_str()
                    .or(status)
                    .unwrap_or("missing status")
                    .to_string(),
            })
        }
    }

    let Some(first) = value["results"].get(0) else {
        return Ok(None);
    };
    let location = &first["geometry"]["location"];
    match (location["lat"].as_f64(), location["lng"].as_f64()) {
        (Some(latitude), Some(longitude)) => Ok(Some(Coordinates {
            latitude,
            longitude,
            formatted_address: str_of(first, "formatted_address"),
        })),
        _ => Err(ProviderError::decode(SERVICE, "result without geometry")),
    }
}
