//! `shelf createrepo` and `shelf modifyrepo` command implementations.
//!
//! Tool runs block, so they go to tokio's blocking pool. With
//! `metadata.timeout-secs` set the command stops waiting after that long;
//! the tool process itself is not killed and keeps its repository lock until
//! it exits.

use camino::{Utf8Path, Utf8PathBuf};
use shelf_core::error::{ShelfError, ShelfResult};
use shelf_store::{RepositoryPublisher, ToolOutput};
use std::time::Duration;
use tracing::warn;

use super::CommandContext;

/// Execute the `shelf createrepo` command
pub async fn execute_createrepo(dir: &Utf8Path, groups: Option<&Utf8Path>, ctx: &CommandContext) -> anyhow::Result<()> {
    let groups = groups.map(|g| ctx.absolute(g));
    let output = run_tool(ctx, dir, move |publisher, dir| {
        publisher.refresh_metadata(dir, groups.as_deref())
    })
    .await?;

    report(&output, ctx)
}

/// Execute the `shelf modifyrepo` command
pub async fn execute_modifyrepo(dir: &Utf8Path, file: &Utf8Path, ctx: &CommandContext) -> anyhow::Result<()> {
    let file = ctx.absolute(file);
    let output = run_tool(ctx, dir, move |publisher, dir| publisher.add_metadata(dir, &file)).await?;

    report(&output, ctx)
}

/// Run one publisher metadata operation under the configured timeout
pub async fn run_tool<F>(ctx: &CommandContext, dir: &Utf8Path, op: F) -> anyhow::Result<ToolOutput>
where
    F: FnOnce(&RepositoryPublisher, &Utf8Path) -> ShelfResult<ToolOutput> + Send + 'static,
{
    let publisher = ctx.publisher()?;
    let dir = ctx.absolute(dir);
    let task_dir: Utf8PathBuf = dir.clone();

    let task = tokio::task::spawn_blocking(move || op(&publisher, &task_dir));

    let joined = match ctx.metadata_timeout() {
        Some(limit) => match tokio::time::timeout(limit, task).await {
            Ok(joined) => joined,
            Err(_) => return Err(timed_out(&dir, limit).into()),
        },
        None => task.await,
    };

    Ok(joined??)
}

fn timed_out(dir: &Utf8Path, limit: Duration) -> ShelfError {
    warn!("Metadata tool on {} still running after {:?}", dir, limit);
    ShelfError::Io {
        message: format!("metadata tool on {} did not finish within {}s", dir, limit.as_secs()),
        source: std::io::Error::from(std::io::ErrorKind::TimedOut),
    }
}

fn report(output: &ToolOutput, ctx: &CommandContext) -> anyhow::Result<()> {
    if ctx.output.is_json() {
        return ctx.output.json(output);
    }

    ctx.output.success(&format!("{} finished", output.tool));
    if !output.output.is_empty() {
        ctx.output.result(&output.output);
    }
    Ok(())
}
