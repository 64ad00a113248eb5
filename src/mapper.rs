// Flattens raw reservations from the hosting API into the exported record shape.
use crate::upstream::{RawAmount, RawGuestDetails, RawGuestUser, RawReservation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const CURRENCY_SYMBOL: &str = "R$";

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct Reservation {
    pub status: String,
    pub confirmation_code: String,
    pub property_name: String,
    pub booking_date: String,
    pub check_in: String,
    pub check_out: String,
    pub nights: u32,
    pub earnings: f64,
    pub guest: Guest,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct Guest {
    pub name: String,
    pub phone: String,
    pub location: String,
    pub details: GuestDetails,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct GuestDetails {
    pub adults: u32,
    pub children: u32,
    pub infants: u32,
    pub pets: u32,
}

impl From<RawReservation> for Reservation {
    fn from(raw: RawReservation) -> Self {
        let earnings = match &raw.earnings {
            Some(amount) => parse_amount(amount),
            None => 0.0,
        };

        let reservation = Reservation {
            status: raw.user_facing_status_localized.unwrap_or_default(),
            confirmation_code: raw.confirmation_code.unwrap_or_default(),
            property_name: raw.listing_name.unwrap_or_default(),
            booking_date: raw.booked_date.unwrap_or_default(),
            check_in: raw.start_date.unwrap_or_default(),
            check_out: raw.end_date.unwrap_or_default(),
            nights: raw.nights.unwrap_or_default(),
            earnings,
            guest: Guest::from_parts(raw.guest_user, raw.guest_details),
        };

        debug!(
            confirmation_code = %reservation.confirmation_code,
            "reservation mapped"
        );
        reservation
    }
}

impl Guest {
    fn from_parts(user: Option<RawGuestUser>, details: Option<RawGuestDetails>) -> Self {
        let user = user.unwrap_or_default();
        let details = details.unwrap_or_default();

        Guest {
            name: user.full_name.unwrap_or_default(),
            phone: user.phone.unwrap_or_default(),
            location: user.location.unwrap_or_default(),
            details: GuestDetails {
                adults: details.number_of_adults.unwrap_or_default(),
                children: details.number_of_children.unwrap_or_default(),
                infants: details.number_of_infants.unwrap_or_default(),
                pets: details.number_of_pets.unwrap_or_default(),
            },
        }
    }
}

// Map a whole page of raw records, keeping upstream order.
pub fn map_reservations(raw: Vec<RawReservation>) -> Vec<Reservation> {
    raw.into_iter().map(Reservation::from).collect()
}

fn parse_amount(amount: &RawAmount) -> f64 {
    match amount {
        RawAmount::Number(value) if value.is_finite() => *value,
        RawAmount::Number(value) => {
            warn!(value = %value, "non-finite earnings value, using 0.0");
            0.0
        }
        RawAmount::Text(text) => parse_earnings(text),
    }
}

/// Converts a Brazilian-formatted currency string (`R$1.234,56`) into a float.
///
/// Unparseable input yields `0.0` and a warning.
pub fn parse_earnings(text: &str) -> f64 {
    let normalized: String = text
        .replace(CURRENCY_SYMBOL, "")
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '.')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    match normalized.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => {
            warn!(earnings = %text, "failed to parse earnings, using 0.0");
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::ReservationsPage;
    use test_case::test_case;

    #[test_case("R$1.234,56", 1234.56; "thousands separator")]
    #[test_case("R$500,00", 500.0; "plain amount")]
    #[test_case("R$ 2.000.150,10", 2_000_150.10; "space after symbol and millions")]
    #[test_case("R$\u{a0}89,90", 89.90; "non breaking space")]
    #[test_case("-R$50,00", -50.0; "negative amount")]
    #[test_case("", 0.0; "empty string")]
    #[test_case("grátis", 0.0; "not a number")]
    fn test_parse_earnings(input: &str, expected: f64) {
        let parsed = parse_earnings(input);
        assert!(
            (parsed - expected).abs() < 1e-9,
            "parsed {} from {:?}, expected {}",
            parsed,
            input,
            expected
        );
    }

    #[test]
    fn test_map_full_reservation() {
        let json = r#"{
            "user_facing_status_localized": "Confirmada",
            "confirmation_code": "HMABC123",
            "listing_name": "Casa da Praia",
            "booked_date": "2024-11-02",
            "start_date": "2024-12-20",
            "end_date": "2024-12-27",
            "nights": 7,
            "earnings": "R$3.450,70",
            "guest_user": {
                "full_name": "Maria Souza",
                "phone": "+55 11 99999-0000",
                "location": "São Paulo, Brasil"
            },
            "guest_details": {
                "number_of_adults": 2,
                "number_of_children": 1,
                "number_of_infants": 0,
                "number_of_pets": 1
            }
        }"#;
        let raw: RawReservation = serde_json::from_str(json).unwrap();
        let reservation = Reservation::from(raw);

        assert_eq!(reservation.status, "Confirmada");
        assert_eq!(reservation.confirmation_code, "HMABC123");
        assert_eq!(reservation.property_name, "Casa da Praia");
        assert_eq!(reservation.booking_date, "2024-11-02");
        assert_eq!(reservation.check_in, "2024-12-20");
        assert_eq!(reservation.check_out, "2024-12-27");
        assert_eq!(reservation.nights, 7);
        assert!((reservation.earnings - 3450.70).abs() < 1e-9);
        assert_eq!(reservation.guest.name, "Maria Souza");
        assert_eq!(reservation.guest.phone, "+55 11 99999-0000");
        assert_eq!(reservation.guest.location, "São Paulo, Brasil");
        assert_eq!(
            reservation.guest.details,
            GuestDetails {
                adults: 2,
                children: 1,
                infants: 0,
                pets: 1
            }
        );
    }

    #[test]
    fn test_map_sparse_reservation_uses_defaults() {
        let reservation = Reservation::from(RawReservation::default());
        assert_eq!(reservation, Reservation::default());
    }

    #[test]
    fn test_numeric_earnings_pass_through() {
        let raw = RawReservation {
            earnings: Some(RawAmount::Number(120.25)),
            ..Default::default()
        };
        assert_eq!(Reservation::from(raw).earnings, 120.25);
    }

    #[test]
    fn test_map_reservations_keeps_order() {
        let page: ReservationsPage = serde_json::from_str(
            r#"{"reservations": [
                {"confirmation_code": "B"},
                {"confirmation_code": "A"},
                {"confirmation_code": "C"}
            ]}"#,
        )
        .unwrap();

        let codes: Vec<String> = map_reservations(page.reservations)
            .into_iter()
            .map(|r| r.confirmation_code)
            .collect();
        assert_eq!(codes, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_serialized_shape() {
        let reservation = Reservation {
            confirmation_code: "HM1".to_string(),
            nights: 2,
            ..Default::default()
        };
        let value = serde_json::to_value(&reservation).unwrap();

        assert_eq!(value["confirmation_code"], "HM1");
        assert_eq!(value["nights"], 2);
        assert_eq!(value["guest"]["details"]["adults"], 0);
        assert!(value["guest"].get("name").is_some());
    }
}
