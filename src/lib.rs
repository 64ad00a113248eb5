// Host reservations export: fetches a host's bookings from the hosting API and
// writes a JSON report and an iCalendar file.

pub mod calendar;
pub mod client;
pub mod config;
pub mod logging;
pub mod mapper;
pub mod output;
pub mod pipeline;
pub mod summary;
pub mod upstream;

// Re-export key types for convenience
pub use calendar::render_calendar;
pub use client::{fetch_all, ApiError, ClientConfig, ClientStats, HostApiClient, ReservationSource};
pub use config::{Config, ConfigError};
pub use mapper::{Guest, GuestDetails, Reservation};
pub use output::{OutputError, Report};
pub use pipeline::{run, RunOutcome};
pub use summary::Summary;
pub use upstream::{RawReservation, ReservationsPage};
