use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use cue_core::config::RemoteConfig;
use cue_core::models::{
    stamp_count, ExpandedTimeline, Stamp, SyncMetadata, SyncPreferences, Timeline, VideoId,
};
use cue_core::services::{AppContext, DatabaseService};
use cue_core::sync::{EngineOptions, GatewayError, HttpRemoteGateway, RemoteGateway, SyncReport};
use cue_core::util::format_timestamp;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::CliError;

/// Settings shared by every command
pub struct GlobalOptions {
    pub db_path: PathBuf,
    pub remote: RemoteConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusItem {
    pub video_id: String,
    pub has_unsynced_local_changes: bool,
    pub metadata: Option<SyncMetadata>,
}

pub fn resolve_db_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cue")
            .join("cue.db")
    })
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("cue").join("remote.json"))
}

/// Config file, then environment, then explicit flags
pub fn resolve_remote_config(
    file: Option<&Path>,
    api_base_url: Option<String>,
    token: Option<String>,
) -> Result<RemoteConfig, CliError> {
    let config = match file.map(Path::to_path_buf).or_else(default_config_path) {
        Some(path) => RemoteConfig::load_from_path(&path).map_err(CliError::Config)?,
        None => RemoteConfig::default(),
    };
    Ok(config.with_env_overrides().with_overrides(api_base_url, token))
}

pub fn parse_video(raw: &str) -> Result<VideoId, CliError> {
    Ok(VideoId::new(raw)?)
}

pub async fn open_database(db_path: &Path) -> Result<DatabaseService, CliError> {
    Ok(DatabaseService::open_path(db_path).await?)
}

/// Context whose engine talks to the configured remote API
pub async fn open_context(
    options: &GlobalOptions,
    engine_options: EngineOptions,
) -> Result<AppContext, CliError> {
    let gateway = HttpRemoteGateway::new(&options.remote)
        .map_err(|error| CliError::Config(error.to_string()))?;
    let database = open_database(&options.db_path).await?;
    Ok(AppContext::with_options(database, Arc::new(gateway), engine_options).await?)
}

/// Context for commands that only touch local state
pub async fn open_local_context(options: &GlobalOptions) -> Result<AppContext, CliError> {
    let reason = options
        .remote
        .api_base_url()
        .err()
        .unwrap_or_else(|| "remote access is not used by this command".to_string());
    let database = open_database(&options.db_path).await?;
    Ok(AppContext::new(database, Arc::new(DisconnectedGateway { reason })).await?)
}

struct DisconnectedGateway {
    reason: String,
}

#[async_trait]
impl RemoteGateway for DisconnectedGateway {
    async fn fetch(&self, _video_id: &VideoId) -> Result<Vec<ExpandedTimeline>, GatewayError> {
        Err(GatewayError::Other(self.reason.clone()))
    }

    async fn upload(
        &self,
        _video_id: &VideoId,
        _timelines: &[ExpandedTimeline],
    ) -> Result<(), GatewayError> {
        Err(GatewayError::Other(self.reason.clone()))
    }
}

/// Token cancelled on Ctrl-C
pub fn cancel_on_interrupt() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted; stopping after the current step");
            trigger.cancel();
        }
    });
    token
}

/// `mm:ss.s`; negative times clamp to zero
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn format_clock(seconds: f64) -> String {
    let total = if seconds.is_finite() {
        seconds.max(0.0)
    } else {
        0.0
    };
    let minutes = (total / 60.0).floor() as u64;
    let rest = total - (minutes as f64) * 60.0;
    format!("{minutes:02}:{rest:04.1}")
}

pub fn format_stamp_line(stamp: &Stamp) -> String {
    let mut line = format!(
        "  {}-{}  {}",
        format_clock(stamp.start),
        format_clock(stamp.end),
        stamp.name
    );
    if !stamp.labels.is_empty() {
        line.push_str(&format!("  labels:{}", stamp.labels.len()));
    }
    if !stamp.time_events.is_empty() {
        line.push_str(&format!("  events:{}", stamp.time_events.len()));
    }
    if stamp.has_position() {
        line.push_str("  [field]");
    }
    line
}

pub fn format_timeline_lines(timelines: &[Timeline]) -> Vec<String> {
    let mut lines = Vec::new();
    for timeline in timelines {
        lines.push(format!(
            "{} ({}) - {} stamps",
            timeline.name,
            timeline.id,
            timeline.stamps.len()
        ));
        lines.extend(timeline.stamps.iter().map(format_stamp_line));
    }
    lines
}

pub fn format_metadata_lines(metadata: Option<&SyncMetadata>) -> Vec<String> {
    let Some(metadata) = metadata else {
        return vec!["Never synchronized".to_string()];
    };
    vec![
        format!("Last sync:          {}", format_timestamp(metadata.last_sync_timestamp)),
        format!("Last local change:  {}", format_timestamp(metadata.last_local_modification)),
        format!("Sync version:       {}", metadata.sync_version),
        format!(
            "Unsynced changes:   {}",
            if metadata.has_unsynced_local_changes() {
                "yes"
            } else {
                "no"
            }
        ),
    ]
}

pub fn format_preferences_lines(preferences: &SyncPreferences) -> Vec<String> {
    vec![
        format!("Auto-sync:  {}", if preferences.auto_sync_enabled { "on" } else { "off" }),
        format!("Interval:   {}s", preferences.interval.as_secs()),
        format!("Policy:     {}", preferences.conflict_policy),
        format!("Retries:    {}", preferences.retry_count),
        format!("Timeout:    {}s", preferences.timeout.as_secs()),
    ]
}

pub fn format_report(report: &SyncReport) -> String {
    format!(
        "{}: {} (sync version {})",
        report.video_id, report.outcome, report.metadata.sync_version
    )
}

pub fn conflict_summary(local: &[Timeline], remote: &[Timeline]) -> String {
    format!(
        "Conflict: local has {} timelines / {} stamps, remote has {} timelines / {} stamps",
        local.len(),
        stamp_count(local),
        remote.len(),
        stamp_count(remote)
    )
}
