use axum::{extract::State, routing::post, Json, Router};
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use tracing::{debug, warn};
use voyage_core::search::{
    Coordinates, FlightOffer, FlightQuery, HotelDetails, HotelDetailsQuery, HotelOffer, HotelQuery,
};
use voyage_core::CoreResult;
use voyage_store::redis_repo::search_cache_key;

use crate::error::AppError;
use crate::extract::ApiJson;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/flights/search", post(search_flights))
        .route("/api/hotel-search", post(search_hotels))
        .route("/api/hotel-details", post(hotel_details))
}

/// Serves `fetch` through the Redis search cache when one is configured.
/// Cache failures only cost the cache.
async fn cached<T, Q, F, Fut>(state: &AppState, kind: &str, query: &Q, fetch: F) -> Result<T, AppError>
where
    T: Serialize + DeserializeOwned,
    Q: Serialize,
    F: FnOnce() -> Fut,
    Fut: Future<Output = CoreResult<T>>,
{
    let Some(redis) = state.redis.as_ref() else {
        return Ok(fetch().await?);
    };

    let key = search_cache_key(kind, query);
    match redis.get_cached::<T>(&key).await {
        Ok(Some(hit)) => return Ok(hit),
        Ok(None) => debug!("Cache miss: {}", key),
        Err(e) => warn!("Search cache read failed: {}", e),
    }

    let value = fetch().await?;
    if let Err(e) = redis.set_cached(&key, &value, state.search_cache_ttl).await {
        warn!("Search cache write failed: {}", e);
    }
    Ok(value)
}

#[derive(Debug, Serialize)]
struct FlightsResponse {
    flights: Vec<FlightOffer>,
}

async fn search_flights(
    State(state): State<AppState>,
    ApiJson(query): ApiJson<FlightQuery>,
) -> Result<Json<FlightsResponse>, AppError> {
    let query = query.normalized()?;
    let flights = cached(&state, "flights", &query, || {
        state.providers.flights.search_flights(&query)
    })
    .await?;

    Ok(Json(FlightsResponse { flights }))
}

#[derive(Debug, Serialize)]
struct HotelsResponse {
    hotels: Vec<HotelOffer>,
}

async fn search_hotels(
    State(state): State<AppState>,
    ApiJson(query): ApiJson<HotelQuery>,
) -> Result<Json<HotelsResponse>, AppError> {
    let query = query.normalized()?;
    let hotels = cached(&state, "hotels", &query, || {
        state.providers.hotels.search_hotels(&query)
    })
    .await?;

    Ok(Json(HotelsResponse { hotels }))
}

#[derive(Debug, Serialize)]
struct HotelDetailsResponse {
    hotel: HotelDetails,
    coordinates: Option<Coordinates>,
}

async fn hotel_details(
    State(state): State<AppState>,
    ApiJson(query): ApiJson<HotelDetailsQuery>,
) -> Result<Json<HotelDetailsResponse>, AppError> {
    let query = query.normalized()?;
    let mut hotel = cached(&state, "hotel_details", &query, || {
        state.providers.hotels.hotel_details(&query)
    })
    .await?;

    if hotel.coordinates.is_none() {
        let address = hotel.address.clone().or_else(|| query.location.clone());
        if let Some(address) = address {
            match state.providers.geocoder.geocode(&address).await {
                Ok(found) => hotel.coordinates = found,
                Err(e) => warn!("Geocoding '{}' failed: {}", address, e),
            }
        }
    }

    Ok(Json(HotelDetailsResponse {
        coordinates: hotel.coordinates.clone(),
        hotel,
    }))
}
