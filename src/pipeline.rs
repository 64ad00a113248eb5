// One export run: fetch, summarize, write.
use crate::calendar::render_calendar;
use crate::client::{fetch_all, ClientStats, HostApiClient, ReservationSource};
use crate::config::Config;
use crate::output::{render_report, write_output, Report};
use crate::summary::Summary;
use anyhow::Context;
use chrono::{Local, Utc};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub reservation_count: usize,
    pub json_output: PathBuf,
    pub calendar_output: PathBuf,
    pub client_stats: ClientStats,
    pub elapsed: Duration,
}

/// Runs the export against the live API described by `config`.
pub async fn run(config: &Config) -> anyhow::Result<RunOutcome> {
    config.validate().context("invalid configuration")?;
    let client =
        HostApiClient::new(config.client_config()).context("failed to build API client")?;
    export(&client, config).await
}

/// Fetches every reservation from `source` and writes the JSON report and calendar.
pub async fn export(source: &dyn ReservationSource, config: &Config) -> anyhow::Result<RunOutcome> {
    let started = Instant::now();

    let reservations = fetch_all(source, config.page_size)
        .await
        .context("failed to fetch reservations")?;

    let calendar = render_calendar(&reservations, Utc::now().naive_utc());

    let report = if reservations.is_empty() {
        warn!("no reservations found");
        Report::empty()
    } else {
        let summary = Summary::compute(&reservations, Local::now().naive_local());
        info!(
            reservations = summary.reservations_sum,
            nights = summary.nights_sum,
            earnings = %summary.earnings_sum,
            "summary computed"
        );
        Report::new(summary, reservations)
    };

    let json = render_report(&report).context("failed to render report")?;
    write_output(&config.json_output, &json).context("failed to write JSON report")?;
    write_output(&config.calendar_output, &calendar).context("failed to write calendar")?;

    let elapsed = started.elapsed();
    info!("export finished in {:.4} seconds", elapsed.as_secs_f64());

    Ok(RunOutcome {
        reservation_count: report.reservation_count(),
        json_output: config.json_output.clone(),
        calendar_output: config.calendar_output.clone(),
        client_stats: source.stats(),
        elapsed,
    })
}
