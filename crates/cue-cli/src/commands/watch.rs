use cue_core::sync::EngineOptions;

use crate::commands::common::{open_context, parse_video, GlobalOptions};
use crate::error::CliError;

pub async fn run_watch(video: Option<&str>, options: &GlobalOptions) -> Result<(), CliError> {
    let current = video.map(parse_video).transpose()?;
    let context = open_context(options, EngineOptions::default()).await?;
    let scheduler = context.scheduler();
    scheduler.set_current_video(current);

    let preferences = context.engine.preferences();
    println!(
        "Watching {} (auto-sync {}, every {}s). Press Ctrl-C to stop.",
        options.db_path.display(),
        if preferences.auto_sync_enabled { "on" } else { "off" },
        preferences.interval.as_secs()
    );

    let handle = scheduler.start();
    let queued = scheduler.sync_known_videos().await;
    println!("Queued {queued} videos for an initial sync.");

    tokio::signal::ctrl_c().await?;
    scheduler.shutdown();
    handle
        .await
        .map_err(|error| CliError::Scheduler(error.to_string()))?;
    println!("Stopped.");
    Ok(())
}
