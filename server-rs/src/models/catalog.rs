use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Hotel {
    pub id: Uuid,
    pub name: String,
    pub city: String,
    pub price_per_night: i64,
    pub rating: Option<f64>,
    pub amenities: Option<serde_json::Value>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Flight {
    pub id: Uuid,
    pub airline: String,
    pub flight_number: String,
    pub from_city: String,
    pub to_city: String,
    pub departure_at: DateTime<Utc>,
    pub arrival_at: DateTime<Utc>,
    pub base_fare: i64,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Train {
    pub id: Uuid,
    pub train_number: String,
    pub name: String,
    pub from_city: String,
    pub to_city: String,
    pub departure_at: DateTime<Utc>,
    pub base_fare: i64,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bus {
    pub id: Uuid,
    pub operator_name: String,
    pub bus_type: String,
    pub from_city: String,
    pub to_city: String,
    pub departure_at: DateTime<Utc>,
    pub base_fare: i64,
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateHotelRequest {
    pub name: String,
    pub city: String,
    #[serde(rename = "pricePerNight")]
    pub price_per_night: i64,
    pub rating: Option<f64>,
    pub amenities: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct CreateFlightRequest {
    pub airline: String,
    #[serde(rename = "flightNumber")]
    pub flight_number: String,
    #[serde(rename = "fromCity")]
    pub from_city: String,
    #[serde(rename = "toCity")]
    pub to_city: String,
    #[serde(rename = "departureAt")]
    pub departure_at: DateTime<Utc>,
    #[serde(rename = "arrivalAt")]
    pub arrival_at: DateTime<Utc>,
    #[serde(rename = "baseFare")]
    pub base_fare: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateTrainRequest {
    #[serde(rename = "trainNumber")]
    pub train_number: String,
    pub name: String,
    #[serde(rename = "fromCity")]
    pub from_city: String,
    #[serde(rename = "toCity")]
    pub to_city: String,
    #[serde(rename = "departureAt")]
    pub departure_at: DateTime<Utc>,
    #[serde(rename = "baseFare")]
    pub base_fare: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateBusRequest {
    #[serde(rename = "operatorName")]
    pub operator_name: String,
    #[serde(rename = "busType")]
    pub bus_type: String,
    #[serde(rename = "fromCity")]
    pub from_city: String,
    #[serde(rename = "toCity")]
    pub to_city: String,
    #[serde(rename = "departureAt")]
    pub departure_at: DateTime<Utc>,
    #[serde(rename = "baseFare")]
    pub base_fare: i64,
}
