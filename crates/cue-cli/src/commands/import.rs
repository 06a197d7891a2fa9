use std::path::Path;

use cue_core::models::{stamp_count, Timeline};

use crate::commands::common::{open_local_context, parse_video, GlobalOptions};
use crate::error::CliError;

pub fn read_timelines_file(path: &Path) -> Result<Vec<Timeline>, CliError> {
    let failed = |message: String| CliError::ImportFailed {
        path: path.display().to_string(),
        message,
    };
    let raw = std::fs::read_to_string(path).map_err(|error| failed(error.to_string()))?;
    serde_json::from_str(&raw).map_err(|error| failed(error.to_string()))
}

pub async fn run_import(video: &str, file: &Path, options: &GlobalOptions) -> Result<(), CliError> {
    let video_id = parse_video(video)?;
    let timelines = read_timelines_file(file)?;
    let context = open_local_context(options).await?;

    context
        .database
        .save_annotations(&video_id, &timelines)
        .await?;
    context.engine.mark_local_modification(&video_id).await?;

    println!(
        "Imported {} timelines ({} stamps) for {video_id}",
        timelines.len(),
        stamp_count(&timelines)
    );
    Ok(())
}
