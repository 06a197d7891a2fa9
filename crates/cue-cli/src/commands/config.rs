use std::time::Duration;

use cue_core::models::SyncPreferencesUpdate;

use crate::cli::PolicyArg;
use crate::commands::common::{format_preferences_lines, open_local_context, GlobalOptions};
use crate::error::CliError;

pub fn build_update(
    auto_sync: Option<bool>,
    interval: Option<u64>,
    policy: Option<PolicyArg>,
    retry_count: Option<u32>,
) -> SyncPreferencesUpdate {
    SyncPreferencesUpdate {
        auto_sync,
        interval: interval.map(Duration::from_secs),
        conflict_policy: policy.map(Into::into),
        retry_count,
    }
}

pub async fn run_config(
    update: SyncPreferencesUpdate,
    options: &GlobalOptions,
) -> Result<(), CliError> {
    let context = open_local_context(options).await?;
    let preferences = if update.is_empty() {
        context.engine.preferences()
    } else {
        context.engine.configure_synchronization(update).await?
    };

    for line in format_preferences_lines(&preferences) {
        println!("{line}");
    }
    Ok(())
}
