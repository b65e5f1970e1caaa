//! `shelf publish` and `shelf link` command implementations.

use camino::Utf8Path;
use shelf_store::{PublishOutcome, RepositoryEntry};

use super::CommandContext;
use crate::PackageArgs;

/// Execute the `shelf publish` command
pub async fn execute_publish(source: &Utf8Path, link: &Utf8Path, ctx: &CommandContext) -> anyhow::Result<()> {
    let source = ctx.absolute(source);
    let outcome = ctx.publisher()?.publish(&source, link)?;

    if ctx.output.is_json() {
        return ctx.output.json(&outcome);
    }
    report_outcome(link, outcome, ctx);
    Ok(())
}

/// Execute the `shelf link` command
pub async fn execute_link(package: &PackageArgs, repo: &str, ctx: &CommandContext) -> anyhow::Result<()> {
    let entry = link_package(package, repo, ctx)?;

    if ctx.output.is_json() {
        return ctx.output.json(&entry);
    }
    report_outcome(&entry.repo_relative_path, entry.outcome, ctx);
    ctx.output.result(entry.canonical_target.as_path().as_str());
    Ok(())
}

/// Link a stored package into the repository at `repo`
pub fn link_package(package: &PackageArgs, repo: &str, ctx: &CommandContext) -> anyhow::Result<RepositoryEntry> {
    let identity = package.identity()?;
    let checksum = package.checksum_spec()?;
    Ok(ctx.publisher()?.publish_package(&identity, &checksum, repo)?)
}

fn report_outcome(link: &Utf8Path, outcome: PublishOutcome, ctx: &CommandContext) {
    match outcome {
        PublishOutcome::Created => ctx.output.success(&format!("Linked {}", link)),
        PublishOutcome::AlreadyLinked => ctx.output.info(&format!("{} already published", link)),
        PublishOutcome::ReplacedBroken => ctx.output.success(&format!("Replaced broken link {}", link)),
        PublishOutcome::Repaired => ctx.output.success(&format!("Repointed {}", link)),
        PublishOutcome::Occupied => ctx.output.warn(&format!("{} is occupied by a regular file, left untouched", link)),
    }
}
