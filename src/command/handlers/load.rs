//! Batch file loader (`_load_commands`)

use super::HandlerContext;
use crate::command::queue::{load_batch_file, NEXT_POSITION};
use crate::command::{CommandResult, Injection};
use std::path::Path;

/// Handle `_load_commands <file>`
pub async fn handle_load_commands(ctx: &HandlerContext<'_>) -> CommandResult {
    let Some(file_name) = ctx.param() else {
        return CommandResult::Rejected {
            message: "_load_commands should have file name".into(),
        };
    };

    let min_len = ctx.catalog.min_device_name_len();
    match load_batch_file(Path::new(file_name), min_len).await {
        Ok(entries) => CommandResult::Completed {
            message: format!("{} commands loaded from {}", entries.len(), file_name),
            inject: entries
                .into_iter()
                .map(|entry| Injection::at(NEXT_POSITION, entry))
                .collect(),
        },
        Err(e) => CommandResult::Failed {
            message: format!("Cannot load commands from {}: {}", file_name, e),
        },
    }
}
