use serde::{Deserialize, Serialize};

// Data structures for the reservations endpoint JSON response.
// The endpoint is undocumented, so every field is optional and defaults when missing.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ReservationsPage {
    pub reservations: Vec<RawReservation>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RawReservation {
    pub user_facing_status_localized: Option<String>,
    pub confirmation_code: Option<String>,
    pub listing_name: Option<String>,
    pub booked_date: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub nights: Option<u32>,
    pub earnings: Option<RawAmount>,
    pub guest_user: Option<RawGuestUser>,
    pub guest_details: Option<RawGuestDetails>,
}

// Earnings usually arrive as a localized string ("R$1.234,56") but some
// listings report a bare number.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawAmount {
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RawGuestUser {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RawGuestDetails {
    pub number_of_adults: Option<u32>,
    pub number_of_children: Option<u32>,
    pub number_of_infants: Option<u32>,
    pub number_of_pets: Option<u32>,
}
