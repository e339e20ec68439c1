//! One report run: fetch a snapshot, aggregate, reconcile, render.

use activity_analytics::aggregations::{collect_read, collect_sent, reconcile, resolve_members};
use activity_analytics::reports::ActivityReport;
use activity_core::client::StreamClient;
use activity_core::error::Result;
use anyhow::Context;
use tracing::{debug, info};

/// Everything a single run needs, passed explicitly.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub stream_id: String,
    /// Window start, epoch milliseconds.
    pub since_ms: i64,
}

/// Parse a `--since` value given as epoch seconds or milliseconds.
///
/// Values of ten digits or fewer are seconds and are upscaled to
/// milliseconds before any use.
pub fn parse_since(raw: &str) -> anyhow::Result<i64> {
    let trimmed = raw.trim();
    let value: i64 = trimmed
        .parse()
        .with_context(|| format!("--since must be an epoch timestamp, got '{raw}'"))?;
    if trimmed.len() <= 10 {
        Ok(value * 1000)
    } else {
        Ok(value)
    }
}

/// Fetch one snapshot of the stream and render the activity report.
///
/// The returned text is the whole artifact; the caller owns writing it.
pub async fn collect_report(client: &dyn StreamClient, options: &RunOptions) -> Result<String> {
    debug!("fetching stream roster");
    let roster_records = client.list_stream_members(&options.stream_id).await?;
    let roster = resolve_members(&roster_records)?;

    debug!("extracting messages");
    let snapshot = client
        .list_messages(&options.stream_id, options.since_ms)
        .await?;

    debug!("sorting user sent messages");
    let sent = collect_sent(&snapshot);

    debug!("sorting user read messages");
    let read = collect_read(client, &snapshot).await;

    let members = reconcile(&roster, &sent.index, &read.index);

    info!(
        "stream {}: {} roster members, {} participants, {} messages ({} malformed, {} failed read lookups)",
        options.stream_id,
        roster.len(),
        members.len(),
        snapshot.len(),
        sent.malformed + read.malformed,
        read.failed_lookups,
    );

    debug!("rendering report");
    let report = ActivityReport {
        stream_id: &options.stream_id,
        since_ms: options.since_ms,
        roster: &roster,
        members: &members,
        sent: &sent.index,
        read: &read.index,
    };
    Ok(report.render())
}
