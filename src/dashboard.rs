use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::stats::StatsReport;

/// Multi-line terminal summary of a report.
pub fn render_summary(st: &StatsReport) -> String {
    let g = &st.global;
    let mut out = String::new();
    out.push_str("=== Scavenger Stats ===\n");
    out.push_str(&format!("Receipts            : {}\n", g.total_receipts));
    out.push_str(&format!("Addresses           : {}\n", g.total_addresses));
    out.push_str(&format!(
        "STAR / NIGHT        : {:.0} / {:.6}\n",
        g.grand_total.star, g.grand_total.night
    ));
    match (g.start_date, g.end_date) {
        (Some(start), Some(end)) => out.push_str(&format!("Period              : {start} .. {end}\n")),
        _ => out.push_str("Period              : -\n"),
    }
    match &st.today {
        Some(d) => out.push_str(&format!(
            "Today (day {:>2})      : {} receipts, {:.6} NIGHT\n",
            d.day, d.receipts, d.night
        )),
        None => out.push_str("Today               : -\n"),
    }
    match &st.hourly {
        Some(h) => out.push_str(&format!(
            "Last hour           : {} receipts from {} addresses ({})\n",
            h.receipts, h.addresses, h.hour
        )),
        None => out.push_str("Last hour           : -\n"),
    }
    out.push_str(&format!(
        "Rate (24h / 1h)     : {:.2} / {:.2} per hour\n",
        st.rate.per_hour_24h, st.rate.per_hour_1h
    ));
    out.push_str(&format!("Failed submissions  : {}\n", st.errors.total));
    out
}

/// Very simple terminal dashboard.
/// Prints each report as it arrives; exits when the sender is dropped.
pub async fn launch_dashboard(mut rx: watch::Receiver<Option<StatsReport>>) {
    while rx.changed().await.is_ok() {
        let current = rx.borrow_and_update().clone();
        if let Some(st) = current {
            println!("{}", render_summary(&st));
        }
    }
}

/// Wait for the dashboard task to stop. Returns false (after logging) if
/// it panicked or was cancelled.
pub async fn join_dashboard(handle: JoinHandle<()>) -> bool {
    match handle.await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("dashboard task failed: {e}");
            false
        }
    }
}
