//! iCalendar (RFC 5545) rendering of reservations.
//!
//! Each reservation becomes an all-day `VEVENT` spanning check-in to
//! check-out, so the file can be subscribed to from any calendar client.

use crate::mapper::Reservation;
use crate::summary::{format_currency, DEFAULT_CURRENCY_SYMBOL};
use chrono::{NaiveDate, NaiveDateTime};
use tracing::warn;

pub const PRODUCT_ID: &str = "-//host-reservations-export//EN";
pub const CALENDAR_NAME: &str = "Reservas";
const UID_DOMAIN: &str = "reservations";

// Content lines are limited to 75 octets, excluding the CRLF.
const MAX_LINE_OCTETS: usize = 75;
const CRLF: &str = "\r\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    Confirmed,
    Cancelled,
}

impl EventStatus {
    // Status labels are localized, so match on the shared stem.
    pub fn from_label(label: &str) -> Self {
        let lower = label.to_lowercase();
        if lower.contains("cancel") {
            EventStatus::Cancelled
        } else {
            EventStatus::Confirmed
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            EventStatus::Confirmed => "CONFIRMED",
            EventStatus::Cancelled => "CANCELLED",
        }
    }
}

/// Renders the reservations as a complete `VCALENDAR` document.
///
/// Reservations without valid `YYYY-MM-DD` check-in and check-out dates are
/// skipped with a warning.
pub fn render_calendar(reservations: &[Reservation], stamp: NaiveDateTime) -> String {
    let mut out = String::new();
    push_line(&mut out, "BEGIN:VCALENDAR");
    push_line(&mut out, "VERSION:2.0");
    push_line(&mut out, &format!("PRODID:{}", PRODUCT_ID));
    push_line(&mut out, "CALSCALE:GREGORIAN");
    push_line(&mut out, "METHOD:PUBLISH");
    push_line(&mut out, &format!("X-WR-CALNAME:{}", escape_text(CALENDAR_NAME)));

    let dtstamp = stamp.format("%Y%m%dT%H%M%SZ").to_string();
    for (index, reservation) in reservations.iter().enumerate() {
        match event_dates(reservation) {
            Some((start, end)) => render_event(&mut out, reservation, index, start, end, &dtstamp),
            None => warn!(
                confirmation_code = %reservation.confirmation_code,
                check_in = %reservation.check_in,
                check_out = %reservation.check_out,
                "skipping calendar event with invalid dates"
            ),
        }
    }

    push_line(&mut out, "END:VCALENDAR");
    out
}

fn event_dates(reservation: &Reservation) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::parse_from_str(&reservation.check_in, "%Y-%m-%d").ok()?;
    let end = NaiveDate::parse_from_str(&reservation.check_out, "%Y-%m-%d").ok()?;
    // DTEND is exclusive; same-day stays still need a one-day event.
    if end <= start {
        return start.succ_opt().map(|next| (start, next));
    }
    Some((start, end))
}

fn render_event(
    out: &mut String,
    reservation: &Reservation,
    index: usize,
    start: NaiveDate,
    end: NaiveDate,
    dtstamp: &str,
) {
    // Without a confirmation code the position keeps UIDs unique per file.
    let uid = if reservation.confirmation_code.is_empty() {
        format!(
            "{}-{}-{}@{}",
            start.format("%Y%m%d"),
            end.format("%Y%m%d"),
            index,
            UID_DOMAIN
        )
    } else {
        format!("{}@{}", reservation.confirmation_code, UID_DOMAIN)
    };

    let guest = if reservation.guest.name.is_empty() {
        "Hóspede"
    } else {
        reservation.guest.name.as_str()
    };
    let summary = format!("{} - {}", guest, reservation.property_name);

    push_line(out, "BEGIN:VEVENT");
    push_line(out, &format!("UID:{}", escape_text(&uid)));
    push_line(out, &format!("DTSTAMP:{}", dtstamp));
    push_line(out, &format!("DTSTART;VALUE=DATE:{}", start.format("%Y%m%d")));
    push_line(out, &format!("DTEND;VALUE=DATE:{}", end.format("%Y%m%d")));
    push_line(out, &format!("SUMMARY:{}", escape_text(&summary)));
    if !reservation.property_name.is_empty() {
        push_line(out, &format!("LOCATION:{}", escape_text(&reservation.property_name)));
    }
    push_line(out, &format!("DESCRIPTION:{}", escape_text(&describe(reservation))));
    push_line(
        out,
        &format!("STATUS:{}", EventStatus::from_label(&reservation.status).as_str()),
    );
    push_line(out, "TRANSP:OPAQUE");
    push_line(out, "END:VEVENT");
}

fn describe(reservation: &Reservation) -> String {
    let details = &reservation.guest.details;
    let mut lines = vec![
        format!("Status: {}", reservation.status),
        format!("Código: {}", reservation.confirmation_code),
        format!("Noites: {}", reservation.nights),
        format!(
            "Ganhos: {}",
            format_currency(reservation.earnings, DEFAULT_CURRENCY_SYMBOL)
        ),
        format!(
            "Hóspedes: {} adultos, {} crianças, {} bebês, {} pets",
            details.adults, details.children, details.infants, details.pets
        ),
    ];
    if !reservation.guest.phone.is_empty() {
        lines.push(format!("Telefone: {}", reservation.guest.phone));
    }
    if !reservation.guest.location.is_empty() {
        lines.push(format!("Origem: {}", reservation.guest.location));
    }
    if !reservation.booking_date.is_empty() {
        lines.push(format!("Reservado em: {}", reservation.booking_date));
    }
    lines.join("\n")
}

/// Escapes a TEXT property value.
pub fn escape_text(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            ';' => escaped.push_str("\\;"),
            ',' => escaped.push_str("\\,"),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Folds a content line into 75-octet chunks without splitting UTF-8 sequences.
/// Continuation lines start with a single space.
pub fn fold_line(line: &str) -> String {
    let mut folded = String::with_capacity(line.len() + line.len() / MAX_LINE_OCTETS * 3);
    let mut width = 0;
    for c in line.chars() {
        let len = c.len_utf8();
        if width + len > MAX_LINE_OCTETS {
            folded.push_str(CRLF);
            folded.push(' ');
            // The leading space counts towards the continuation line.
            width = 1;
        }
        folded.push(c);
        width += len;
    }
    folded
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(&fold_line(line));
    out.push_str(CRLF);
}
