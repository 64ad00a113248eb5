// Aggregate statistics over one run's reservations.
use crate::mapper::Reservation;
use chrono::NaiveDateTime;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;

pub const DEFAULT_CURRENCY_SYMBOL: &str = "R$";
pub const GENERATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Summary {
    pub generated_at: String,
    pub reservations_sum: usize,
    pub earnings_sum: String,
    pub nights_sum: u64,
    pub status_count: OrderedMap<usize>,
    pub guest_details: GuestTotals,
    pub reservations_per_property: OrderedMap<PropertyShare>,
    pub earnings_per_property: OrderedMap<PropertyEarnings>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct GuestTotals {
    pub adults_sum: u64,
    pub children_sum: u64,
    pub infants_sum: u64,
    pub pets_sum: u64,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PropertyShare {
    pub count: usize,
    pub percentage: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PropertyEarnings {
    pub earnings: String,
    pub percentage: String,
}

/// String-keyed map that serializes its entries in insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrderedMap<V>(Vec<(String, V)>);

impl<V> OrderedMap<V> {
    pub fn get(&self, key: &str) -> Option<&V> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }
}

impl<V> FromIterator<(String, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        OrderedMap(iter.into_iter().collect())
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

// Accumulates per-key totals while remembering the order keys were first seen,
// so equal totals keep upstream order after the stable sort.
struct Tally<T> {
    index: HashMap<String, usize>,
    entries: Vec<(String, T)>,
}

impl<T: Default> Tally<T> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    fn entry(&mut self, key: &str) -> &mut T {
        let position = match self.index.get(key).copied() {
            Some(position) => position,
            None => {
                self.entries.push((key.to_string(), T::default()));
                self.index.insert(key.to_string(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        &mut self.entries[position].1
    }

    fn into_sorted_by<F>(mut self, mut compare: F) -> Vec<(String, T)>
    where
        F: FnMut(&T, &T) -> std::cmp::Ordering,
    {
        self.entries.sort_by(|(_, a), (_, b)| compare(b, a));
        self.entries
    }
}

impl Summary {
    pub fn compute(reservations: &[Reservation], generated_at: NaiveDateTime) -> Self {
        let reservations_sum = reservations.len();
        let earnings_total: f64 = reservations.iter().map(|r| r.earnings).sum();
        let nights_sum: u64 = reservations.iter().map(|r| u64::from(r.nights)).sum();

        let mut statuses: Tally<usize> = Tally::new();
        let mut property_counts: Tally<usize> = Tally::new();
        let mut property_earnings: Tally<f64> = Tally::new();
        let mut guest_details = GuestTotals::default();

        for reservation in reservations {
            *statuses.entry(&reservation.status) += 1;
            *property_counts.entry(&reservation.property_name) += 1;
            *property_earnings.entry(&reservation.property_name) += reservation.earnings;

            let details = &reservation.guest.details;
            guest_details.adults_sum += u64::from(details.adults);
            guest_details.children_sum += u64::from(details.children);
            guest_details.infants_sum += u64::from(details.infants);
            guest_details.pets_sum += u64::from(details.pets);
        }

        let status_count = statuses.into_sorted_by(|a, b| a.cmp(b)).into_iter().collect();

        let reservations_per_property = property_counts
            .into_sorted_by(|a, b| a.cmp(b))
            .into_iter()
            .map(|(name, count)| {
                let share = PropertyShare {
                    count,
                    percentage: format_percentage(count as f64, reservations_sum as f64),
                };
                (name, share)
            })
            .collect();

        let earnings_per_property = property_earnings
            .into_sorted_by(|a, b| a.total_cmp(b))
            .into_iter()
            .map(|(name, earnings)| {
                let entry = PropertyEarnings {
                    earnings: format_currency(earnings, DEFAULT_CURRENCY_SYMBOL),
                    percentage: format_percentage(earnings, earnings_total),
                };
                (name, entry)
            })
            .collect();

        Summary {
            generated_at: generated_at.format(GENERATED_AT_FORMAT).to_string(),
            reservations_sum,
            earnings_sum: format_currency(earnings_total, DEFAULT_CURRENCY_SYMBOL),
            nights_sum,
            status_count,
            guest_details,
            reservations_per_property,
            earnings_per_property,
        }
    }
}

/// Formats an amount as `R$1,234.56`: comma thousands separator, two decimals.
pub fn format_currency(amount: f64, symbol: &str) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let is_negative = amount < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0');
    let sign = if is_negative { "-" } else { "" };
    format!("{}{}{}.{}", symbol, sign, grouped, fraction)
}

/// Formats `part / whole` as a percentage with two decimals. A zero whole yields `0.00%`.
pub fn format_percentage(part: f64, whole: f64) -> String {
    if whole == 0.0 {
        return "0.00%".to_string();
    }
    format!("{:.2}%", part / whole * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::{Guest, GuestDetails};
    use chrono::NaiveDate;
    use test_case::test_case;

    fn stamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 12, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    fn reservation(status: &str, property: &str, nights: u32, earnings: f64) -> Reservation {
        Reservation {
            status: status.to_string(),
            confirmation_code: format!("HM-{}-{}", property, nights),
            property_name: property.to_string(),
            nights,
            earnings,
            guest: Guest {
                details: GuestDetails {
                    adults: 2,
                    children: 1,
                    infants: 0,
                    pets: 1,
                },
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test_case(1234.56, "R$1,234.56"; "thousands")]
    #[test_case(0.0, "R$0.00"; "zero")]
    #[test_case(999.999, "R$1,000.00"; "rounding carries into thousands")]
    #[test_case(1_234_567.8, "R$1,234,567.80"; "millions")]
    #[test_case(-1234.5, "R$-1,234.50"; "negative")]
    #[test_case(-0.001, "R$0.00"; "negative rounds to zero")]
    #[test_case(12.0, "R$12.00"; "small")]
    fn test_format_currency(amount: f64, expected: &str) {
        assert_eq!(format_currency(amount, DEFAULT_CURRENCY_SYMBOL), expected);
    }

    #[test_case(1.0, 8.0, "12.50%"; "one eighth")]
    #[test_case(2.0, 3.0, "66.67%"; "rounded")]
    #[test_case(5.0, 5.0, "100.00%"; "whole")]
    #[test_case(0.0, 0.0, "0.00%"; "zero whole")]
    fn test_format_percentage(part: f64, whole: f64, expected: &str) {
        assert_eq!(format_percentage(part, whole), expected);
    }

    #[test]
    fn test_summary_totals_match_inputs() {
        let reservations = vec![
            reservation("Confirmada", "Casa da Praia", 3, 1500.0),
            reservation("Cancelada", "Loft Centro", 2, 0.0),
            reservation("Confirmada", "Loft Centro", 4, 800.5),
            reservation("Confirmada", "Casa da Praia", 1, 300.25),
        ];

        let summary = Summary::compute(&reservations, stamp());

        assert_eq!(summary.generated_at, "2024-12-01 09:30:00");
        assert_eq!(summary.reservations_sum, 4);
        assert_eq!(summary.nights_sum, 10);
        assert_eq!(summary.earnings_sum, "R$2,600.75");
        assert_eq!(
            summary.guest_details,
            GuestTotals {
                adults_sum: 8,
                children_sum: 4,
                infants_sum: 0,
                pets_sum: 4,
            }
        );

        assert_eq!(summary.status_count.get("Confirmada"), Some(&3));
        assert_eq!(summary.status_count.get("Cancelada"), Some(&1));
        let status_total: usize = reservations
            .iter()
            .filter(|r| summary.status_count.get(&r.status).is_some())
            .count();
        assert_eq!(status_total, summary.reservations_sum);
    }

    #[test]
    fn test_status_count_ordered_by_frequency() {
        let reservations = vec![
            reservation("Cancelada", "A", 1, 0.0),
            reservation("Pedido", "A", 1, 0.0),
            reservation("Confirmada", "A", 1, 0.0),
            reservation("Confirmada", "A", 1, 0.0),
            reservation("Confirmada", "A", 1, 0.0),
        ];

        let summary = Summary::compute(&reservations, stamp());
        let order: Vec<&str> = summary.status_count.keys().collect();
        // Ties keep first-seen order.
        assert_eq!(order, vec!["Confirmada", "Cancelada", "Pedido"]);
    }

    #[test]
    fn test_property_breakdowns() {
        let reservations = vec![
            reservation("Confirmada", "Loft Centro", 2, 200.0),
            reservation("Confirmada", "Casa da Praia", 3, 1800.0),
            reservation("Confirmada", "Loft Centro", 2, 200.0),
            reservation("Confirmada", "Loft Centro", 2, 200.0),
        ];

        let summary = Summary::compute(&reservations, stamp());

        let by_count: Vec<&str> = summary.reservations_per_property.keys().collect();
        assert_eq!(by_count, vec!["Loft Centro", "Casa da Praia"]);
        assert_eq!(
            summary.reservations_per_property.get("Loft Centro"),
            Some(&PropertyShare {
                count: 3,
                percentage: "75.00%".to_string(),
            })
        );

        let by_earnings: Vec<&str> = summary.earnings_per_property.keys().collect();
        assert_eq!(by_earnings, vec!["Casa da Praia", "Loft Centro"]);
        assert_eq!(
            summary.earnings_per_property.get("Casa da Praia"),
            Some(&PropertyEarnings {
                earnings: "R$1,800.00".to_string(),
                percentage: "75.00%".to_string(),
            })
        );
    }

    #[test]
    fn test_zero_earnings_percentages() {
        let reservations = vec![reservation("Cancelada", "Loft", 1, 0.0)];
        let summary = Summary::compute(&reservations, stamp());

        assert_eq!(summary.earnings_sum, "R$0.00");
        assert_eq!(
            summary.earnings_per_property.get("Loft").map(|e| e.percentage.as_str()),
            Some("0.00%")
        );
    }

    #[test]
    fn test_serialized_key_order() {
        let reservations = vec![
            reservation("Cancelada", "B", 1, 10.0),
            reservation("Confirmada", "A", 1, 20.0),
            reservation("Confirmada", "A", 1, 20.0),
        ];
        let json = serde_json::to_string(&Summary::compute(&reservations, stamp())).unwrap();

        let confirmed = json.find("\"Confirmada\"").unwrap();
        let cancelled = json.find("\"Cancelada\"").unwrap();
        assert!(confirmed < cancelled, "status_count not ordered: {}", json);

        let generated = json.find("\"generated_at\"").unwrap();
        let properties = json.find("\"earnings_per_property\"").unwrap();
        assert!(generated < properties);
    }
}
