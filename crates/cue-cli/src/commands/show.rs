use crate::commands::common::{format_timeline_lines, open_database, parse_video, GlobalOptions};
use crate::error::CliError;

pub async fn run_show(video: &str, as_json: bool, options: &GlobalOptions) -> Result<(), CliError> {
    let video_id = parse_video(video)?;
    let db = open_database(&options.db_path).await?;
    let timelines = db
        .load_annotations(&video_id)
        .await?
        .ok_or_else(|| CliError::NoLocalData(video_id.to_string()))?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&timelines)?);
        return Ok(());
    }

    if timelines.is_empty() {
        println!("No timelines.");
        return Ok(());
    }
    for line in format_timeline_lines(&timelines) {
        println!("{line}");
    }
    Ok(())
}
