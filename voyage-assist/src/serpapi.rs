use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};
use voyage_core::providers::{FlightSearch, HotelSearch};
use voyage_core::search::{
    Coordinates, FlightOffer, FlightQuery, HotelDetails, HotelDetailsQuery, HotelOffer, HotelPrice, HotelQuery,
};
use voyage_core::CoreResult;

use crate::error::{ProviderError, ProviderResult};
use crate::http::{client, read_json, str_of};

const SERVICE: &str = "serpapi";
pub const SERPAPI_URL: &str = "https://serpapi.com/search.json";

/// SerpApi reports "nothing found" as an error string on a 200 response.
const NO_RESULTS: &str = "hasn't returned any results";

/// SerpApi client for the `google_flights` and `google_hotels` engines.
#[derive(Clone)]
pub struct SerpApiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    url: String,
}

impl SerpApiClient {
    pub fn new(api_key: Option<String>, timeout: Duration) -> ProviderResult<Self> {
        Ok(Self {
            http: client(timeout)?,
            api_key: api_key.filter(|k| !k.is_empty()),
            url: SERPAPI_URL.to_string(),
        })
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }

    /// Runs one search. `None` when the engine found nothing.
    async fn search(&self, mut params: Vec<(&'static str, String)>) -> ProviderResult<Option<Value>> {
        let api_key = self.api_key.as_deref().ok_or(ProviderError::NotConfigured(SERVICE))?;
        params.push(("api_key", api_key.to_string()));
        params.push(("hl", "en".to_string()));

        let response = self.http.get(&self.url).query(&params).send().await?;
        let value = read_json(SERVICE, response).await?;

        match value.get("error").and_then(Value::as_str) {
            Some(message) if message.contains(NO_RESULTS) => Ok(None),
            Some(message) => Err(ProviderError::Upstream {
                service: SERVICE,
                status: 200,
                message: message.to_string(),
            }),
            None => Ok(Some(value)),
        }
    }
}

#[async_trait]
impl FlightSearch for SerpApiClient {
    async fn search_flights(&self, query: &FlightQuery) -> CoreResult<Vec<FlightOffer>> {
        let mut params = vec![
            ("engine", "google_flights".to_string()),
            ("departure_id", query.origin.clone()),
            ("arrival_id", query.destination.clone()),
            ("outbound_date", query.outbound_date.to_string()),
            ("adults", query.adults.to_string()),
            ("currency", query.currency.clone()),
            ("travel_class", query.travel_class_code().to_string()),
        ];
        match query.return_date {
            Some(date) => {
                params.push(("type", "1".to_string()));
                params.push(("return_date", date.to_string()));
            }
            None => params.push(("type", "2".to_string())),
        }

        let offers = match self.search(params).await? {
            Some(value) => flight_offers(&value, &query.currency),
            None => Vec::new(),
        };
        info!(
            "Flight search {} -> {} on {}: {} offers",
            query.origin,
            query.destination,
            query.outbound_date,
            offers.len()
        );
        Ok(offers)
    }
}

#[async_trait]
impl HotelSearch for SerpApiClient {
    async fn search_hotels(&self, query: &HotelQuery) -> CoreResult<Vec<HotelOffer>> {
        let params = vec![
            ("engine", "google_hotels".to_string()),
            ("q", query.location.clone()),
            ("check_in_date", query.check_in.to_string()),
            ("check_out_date", query.check_out.to_string()),
            ("adults", query.adults.to_string()),
            ("currency", query.currency.clone()),
        ];

        let offers = match self.search(params).await? {
            Some(value) => hotel_offers(&value, &query.currency),
            None => Vec::new(),
        };
        info!("Hotel search '{}': {} properties", query.location, offers.len());
        Ok(offers)
    }

    async fn hotel_details(&self, query: &HotelDetailsQuery) -> CoreResult<HotelDetails> {
        let params = vec![
            ("engine", "google_hotels".to_string()),
            ("q", query.location.clone().unwrap_or_else(|| "hotel".to_string())),
            ("property_token", query.property_token.clone()),
            ("check_in_date", query.check_in.to_string()),
            ("check_out_date", query.check_out.to_string()),
            ("adults", query.adults.to_string()),
            ("currency", query.currency.clone()),
        ];

        match self.search(params).await? {
            Some(value) => {
                debug!(property_token = %query.property_token, "Hotel details fetched");
                Ok(hotel_details(&value, &query.currency)?)
            }
            None => Err(voyage_core::CoreError::NotFound(format!(
                "Hotel '{}' not found",
                query.property_token
            ))),
        }
    }
}

fn extracted_price(value: &Value) -> Option<f64> {
    value
        .get("extracted_lowest")
        .and_then(Value::as_f64)
        .or_else(|| value.as_f64())
}

fn coordinates(value: &Value) -> Option<Coordinates> {
    let gps = value.get("gps_coordinates")?;
    Some(Coordinates {
        latitude: gps.get("latitude")?.as_f64()?,
        longitude: gps.get("longitude")?.as_f64()?,
        formatted_address: None,
    })
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

fn hotel_class(value: &Value) -> Option<String> {
    str_of(value, "hotel_class").or_else(|| {
        value
            .get("extracted_hotel_class")
            .and_then(Value::as_u64)
            .map(|n| format!("{}-star hotel", n))
    })
}

/// Best flights first, then the rest, in SerpApi's order.
pub fn flight_offers(value: &Value, currency: &str) -> Vec<FlightOffer> {
    ["best_flights", "other_flights"]
        .iter()
        .filter_map(|key| value.get(*key).and_then(Value::as_array))
        .flatten()
        .filter_map(|itinerary| flight_offer(itinerary, currency))
        .collect()
}

fn flight_offer(itinerary: &Value, currency: &str) -> Option<FlightOffer> {
    let legs = itinerary.get("flights")?.as_array()?;
    let first = legs.first()?;
    let last = legs.last()?;

    let mut airlines: Vec<String> = Vec::new();
    for leg in legs {
        if let Some(airline) = str_of(leg, "airline") {
            if !airlines.contains(&airline) {
                airlines.push(airline);
            }
        }
    }

    let stops = itinerary
        .get("layovers")
        .and_then(Value::as_array)
        .map_or(legs.len().saturating_sub(1), Vec::len);

    Some(FlightOffer {
        airline: airlines.join(" / "),
        airline_logo: str_of(itinerary, "airline_logo").or_else(|| str_of(first, "airline_logo")),
        flight_numbers: legs.iter().filter_map(|l| str_of(l, "flight_number")).collect(),
        departure_airport: str_of(&first["departure_airport"], "id")?,
        arrival_airport: str_of(&last["arrival_airport"], "id")?,
        departure_time: str_of(&first["departure_airport"], "time").unwrap_or_default(),
        arrival_time: str_of(&last["arrival_airport"], "time").unwrap_or_default(),
        duration_minutes: itinerary
            .get("total_duration")
            .and_then(Value::as_u64)
            .and_then(|m| u32::try_from(m).ok()),
        stops: u32::try_from(stops).unwrap_or(u32::MAX),
        price: itinerary.get("price").and_then(Value::as_f64),
        currency: currency.to_string(),
        booking_token: str_of(itinerary, "booking_token").or_else(|| str_of(itinerary, "departure_token")),
    })
}

pub fn hotel_offers(value: &Value, currency: &str) -> Vec<HotelOffer> {
    value
        .get("properties")
        .and_then(Value::as_array)
        .map(|properties| {
            properties
                .iter()
                .filter_map(|p| {
                    Some(HotelOffer {
                        name: str_of(p, "name")?,
                        property_token: str_of(p, "property_token"),
                        rate_per_night: p.get("rate_per_night").and_then(extracted_price),
                        total_rate: p.get("total_rate").and_then(extracted_price),
                        currency: currency.to_string(),
                        rating: p.get("overall_rating").and_then(Value::as_f64),
                        reviews: p.get("reviews").and_then(Value::as_u64),
                        hotel_class: hotel_class(p),
                        thumbnail: p
                            .get("images")
                            .and_then(|images| images.get(0))
                            .and_then(|image| str_of(image, "thumbnail")),
                        amenities: string_list(p.get("amenities")),
                        coordinates: coordinates(p),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

pub fn hotel_details(value: &Value, currency: &str) -> ProviderResult<HotelDetails> {
    let name = str_of(value, "name").ok_or_else(|| ProviderError::decode(SERVICE, "hotel without name"))?;

    let prices = value
        .get("prices")
        .and_then(Value::as_array)
        .map(|prices| {
            prices
                .iter()
                .filter_map(|p| {
                    Some(HotelPrice {
                        source: str_of(p, "source")?,
                        rate_per_night: p.get("rate_per_night").and_then(extracted_price),
                        link: str_of(p, "link"),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let images = value
        .get("images")
        .and_then(Value::as_array)
        .map(|images| {
            images
                .iter()
                .filter_map(|i| str_of(i, "original_image").or_else(|| str_of(i, "thumbnail")))
                .collect()
        })
        .unwrap_or_default();

    Ok(HotelDetails {
        name,
        address: str_of(value, "address"),
        phone: str_of(value, "phone"),
        description: str_of(value, "description"),
        link: str_of(value, "link"),
        rating: value.get("overall_rating").and_then(Value::as_f64),
        reviews: value.get("reviews").and_then(Value::as_u64),
        rate_per_night: value.get("rate_per_night").and_then(extracted_price),
        total_rate: value.get("total_rate").and_then(extracted_price),
        currency: currency.to_string(),
        amenities: string_list(value.get("amenities")),
        images,
        prices,
        coordinates: coordinates(value),
    })
}
