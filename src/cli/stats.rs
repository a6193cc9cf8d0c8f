use std::sync::Arc;

use clap::Subcommand;

use crate::api::visits::VisitTracker;
use crate::api::{ApiClient, ApiResult};
use crate::models::admin::{DailyVisitors, HourlyVisitors};

#[derive(Debug, Subcommand)]
pub enum StatsCommand {
    /// Dashboard counters
    Overview,
    /// Visitor series over the last day, week and month
    Visitors,
    /// Keep a visit heartbeat running until Ctrl-C
    Heartbeat,
}

pub async fn run(client: &Arc<ApiClient>, command: StatsCommand) -> ApiResult<()> {
    match command {
        StatsCommand::Overview => {
            let stats = client.stats().await?;
            println!(
                "Requests:   {} total, {} new, {} completed",
                stats.total_requests, stats.new_requests, stats.completed_requests
            );
            println!(
                "Plots:      {} total, {} available",
                stats.total_plots, stats.available_plots
            );
            println!(
                "Quiz:       {} questions, {} completions",
                stats.quiz_questions, stats.quiz_completions
            );
            println!("Online now: {}", stats.current_online);
        }
        StatsCommand::Visitors => {
            let stats = client.visitor_stats().await?;
            let ceiling = series_ceiling(&stats.hourly, &stats.daily, &stats.monthly);
            println!("Last 24 hours");
            for HourlyVisitors { time, visitors } in &stats.hourly {
                println!("  {:<7} {:>5} {}", time, visitors, bar(*visitors, ceiling));
            }
            println!("Last 7 days");
            for DailyVisitors { date, visitors } in &stats.daily {
                println!("  {:<12} {:>5} {}", date, visitors, bar(*visitors, ceiling));
            }
            println!("Last 30 days");
            for DailyVisitors { date, visitors } in &stats.monthly {
                println!("  {:<12} {:>5} {}", date, visitors, bar(*visitors, ceiling));
            }
        }
        StatsCommand::Heartbeat => {
            let tracker = VisitTracker::start(Arc::clone(client));
            println!(
                "Sending visit heartbeats as session {}, Ctrl-C to stop",
                tracker.session_id()
            );
            tokio::signal::ctrl_c().await.map_err(anyhow::Error::from)?;
            drop(tracker);
            println!("Stopped");
        }
    }
    Ok(())
}

fn series_ceiling(
    hourly: &[HourlyVisitors],
    daily: &[DailyVisitors],
    monthly: &[DailyVisitors],
) -> u64 {
    hourly
        .iter()
        .map(|point| point.visitors)
        .chain(daily.iter().map(|point| point.visitors))
        .chain(monthly.iter().map(|point| point.visitors))
        .max()
        .unwrap_or(0)
}

// All three series share one scale so the sections compare visually.
fn bar(value: u64, ceiling: u64) -> String {
    if ceiling == 0 {
        return String::new();
    }
    let width = (value * 30 / ceiling) as usize;
    "#".repeat(width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bars_scale_to_thirty_columns() {
        assert_eq!(bar(10, 10).len(), 30);
        assert_eq!(bar(5, 10).len(), 15);
        assert_eq!(bar(0, 10), "");
        assert_eq!(bar(0, 0), "");
    }
}
