use crate::commands::common::{
    format_metadata_lines, open_local_context, parse_video, GlobalOptions, StatusItem,
};
use crate::error::CliError;

pub async fn run_status(
    video: &str,
    as_json: bool,
    options: &GlobalOptions,
) -> Result<(), CliError> {
    let video_id = parse_video(video)?;
    let context = open_local_context(options).await?;
    let metadata = context.engine.sync_metadata(&video_id).await?;

    if as_json {
        let item = StatusItem {
            video_id: video_id.to_string(),
            has_unsynced_local_changes: metadata
                .as_ref()
                .is_some_and(cue_core::models::SyncMetadata::has_unsynced_local_changes),
            metadata,
        };
        println!("{}", serde_json::to_string_pretty(&item)?);
        return Ok(());
    }

    println!("{video_id}");
    for line in format_metadata_lines(metadata.as_ref()) {
        println!("  {line}");
    }
    Ok(())
}
