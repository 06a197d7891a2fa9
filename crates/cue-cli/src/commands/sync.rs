use cue_core::models::ConflictPolicy;
use cue_core::sync::{EngineOptions, SyncError};

use crate::commands::common::{
    cancel_on_interrupt, conflict_summary, format_report, open_context, parse_video,
    GlobalOptions,
};
use crate::error::CliError;

pub async fn run_sync(video: &str, options: &GlobalOptions) -> Result<(), CliError> {
    let video_id = parse_video(video)?;
    let context = open_context(options, EngineOptions::default()).await?;

    match context
        .engine
        .synchronize(&video_id, &cancel_on_interrupt())
        .await
    {
        Ok(report) => {
            println!("{}", format_report(&report));
            Ok(())
        }
        Err(SyncError::MergeConflict { local, remote }) => {
            println!("{}", conflict_summary(&local, &remote));
            println!("Run `cue resolve {video_id} --policy <use-local|use-remote|merge>` to settle it.");
            Err(SyncError::MergeConflict { local, remote }.into())
        }
        Err(error) => Err(error.into()),
    }
}

pub async fn run_push(video: &str, options: &GlobalOptions) -> Result<(), CliError> {
    let video_id = parse_video(video)?;
    let context = open_context(options, EngineOptions::default()).await?;
    let report = context
        .engine
        .force_upload_local_changes(&video_id, &cancel_on_interrupt())
        .await?;
    println!("{}", format_report(&report));
    Ok(())
}

pub async fn run_pull(video: &str, options: &GlobalOptions) -> Result<(), CliError> {
    let video_id = parse_video(video)?;
    let context = open_context(options, EngineOptions::default()).await?;
    let report = context
        .engine
        .force_download_remote_changes(&video_id, &cancel_on_interrupt())
        .await?;
    println!("{}", format_report(&report));
    Ok(())
}

/// Flag the conflict with a one-off `askUser` sync, then settle it with `policy`
pub async fn run_resolve(
    video: &str,
    policy: ConflictPolicy,
    options: &GlobalOptions,
) -> Result<(), CliError> {
    let video_id = parse_video(video)?;
    let engine_options = EngineOptions {
        conflict_policy: Some(ConflictPolicy::AskUser),
        ..EngineOptions::default()
    };
    let context = open_context(options, engine_options).await?;
    let cancel = cancel_on_interrupt();

    match context.engine.synchronize(&video_id, &cancel).await {
        Ok(report) => {
            println!("No conflict; {}", format_report(&report));
            Ok(())
        }
        Err(SyncError::MergeConflict { local, remote }) => {
            println!("{}", conflict_summary(&local, &remote));
            let report = context
                .engine
                .resolve_conflict(&video_id, policy, &cancel)
                .await?;
            println!("Resolved with {policy}; {}", format_report(&report));
            Ok(())
        }
        Err(error) => Err(error.into()),
    }
}
