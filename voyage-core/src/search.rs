use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::validation::{normalize_currency, required_str};
use crate::{CoreError, CoreResult};

pub const DEFAULT_CURRENCY: &str = "INR";

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn one() -> u32 {
    1
}

fn two() -> u32 {
    2
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightQuery {
    pub origin: String,
    pub destination: String,
    pub outbound_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    #[serde(default = "one")]
    pub adults: u32,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub travel_class: Option<String>,
}

impl FlightQuery {
    /// Upper-cases airport codes and currency, checks dates and party size.
    pub fn normalized(mut self) -> CoreResult<Self> {
        self.origin = airport_code(&self.origin, "origin")?;
        self.destination = airport_code(&self.destination, "destination")?;
        if self.origin == self.destination {
            return Err(CoreError::validation("'origin' and 'destination' must differ"));
        }
        if let Some(ret) = self.return_date {
            if ret < self.outbound_date {
                return Err(CoreError::validation("'return_date' is before 'outbound_date'"));
            }
        }
        check_party(self.adults)?;
        self.currency = normalize_currency(&self.currency)?;
        Ok(self)
    }

    /// SerpApi `travel_class`: 1 economy, 2 premium economy, 3 business, 4 first.
    pub fn travel_class_code(&self) -> u8 {
        match self.travel_class.as_deref().map(str::to_ascii_lowercase).as_deref() {
            Some("premium_economy") | Some("premium economy") => 2,
            Some("business") => 3,
            Some("first") => 4,
            _ => 1,
        }
    }
}

fn airport_code(value: &str, field: &str) -> CoreResult<String> {
    let code = required_str(Some(value), field)?;
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(CoreError::Validation(format!(
            "'{}' must be a 3-letter airport code",
            field
        )));
    }
    Ok(code.to_ascii_uppercase())
}

fn check_party(adults: u32) -> CoreResult<()> {
    if !(1..=9).contains(&adults) {
        return Err(CoreError::validation("'adults' must be between 1 and 9"));
    }
    Ok(())
}

fn check_stay(check_in: NaiveDate, check_out: NaiveDate) -> CoreResult<()> {
    if check_out <= check_in {
        return Err(CoreError::validation("'check_out' must be after 'check_in'"));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlightOffer {
    pub airline: String,
    pub airline_logo: Option<String>,
    pub flight_numbers: Vec<String>,
    pub departure_airport: String,
    pub arrival_airport: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub duration_minutes: Option<u32>,
    pub stops: u32,
    pub price: Option<f64>,
    pub currency: String,
    pub booking_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotelQuery {
    pub location: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    #[serde(default = "two")]
    pub adults: u32,
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl HotelQuery {
    pub fn normalized(mut self) -> CoreResult<Self> {
        self.location = required_str(Some(&self.location), "location")?;
        check_stay(self.check_in, self.check_out)?;
        check_party(self.adults)?;
        self.currency = normalize_currency(&self.currency)?;
        Ok(self)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
    pub formatted_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HotelOffer {
    pub name: String,
    pub property_token: Option<String>,
    pub rate_per_night: Option<f64>,
    pub total_rate: Option<f64>,
    pub currency: String,
    pub rating: Option<f64>,
    pub reviews: Option<u64>,
    pub hotel_class: Option<String>,
    pub thumbnail: Option<String>,
    pub amenities: Vec<String>,
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotelDetailsQuery {
    pub property_token: String,
    /// Search text the token came from; SerpApi wants it alongside the token.
    pub location: Option<String>,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    #[serde(default = "two")]
    pub adults: u32,
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl HotelDetailsQuery {
    pub fn normalized(mut self) -> CoreResult<Self> {
        self.property_token = required_str(Some(&self.property_token), "property_token")?;
        check_stay(self.check_in, self.check_out)?;
        check_party(self.adults)?;
        self.currency = normalize_currency(&self.currency)?;
        Ok(self)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HotelPrice {
    pub source: String,
    pub rate_per_night: Option<f64>,
    pub link: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HotelDetails {
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub description: Option<String>,
    pub link: Option<String>,
    pub rating: Option<f64>,
    pub reviews: Option<u64>,
    pub rate_per_night: Option<f64>,
    pub total_rate: Option<f64>,
    pub currency: String,
    pub amenities: Vec<String>,
    pub images: Vec<String>,
    pub prices: Vec<HotelPrice>,
    pub coordinates: Option<Coordinates>,
}
