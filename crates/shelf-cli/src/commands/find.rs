//! `shelf find` command implementation.

use camino::Utf8Path;
use shelf_store::RepoPackage;

use super::CommandContext;

/// Execute the `shelf find` command
pub async fn execute(repo_dir: &Utf8Path, relative_path: &str, ctx: &CommandContext) -> anyhow::Result<()> {
    let package = find_package(repo_dir, relative_path, ctx).await?;

    if ctx.output.is_json() {
        return ctx.output.json(&package);
    }
    ctx.output.result(&format!("{}  {} bytes", package.relative_path, package.size));
    Ok(())
}

/// Look `relative_path` up in the repository at `repo_dir`
pub async fn find_package(repo_dir: &Utf8Path, relative_path: &str, ctx: &CommandContext) -> anyhow::Result<RepoPackage> {
    let repo_dir = ctx.absolute(repo_dir);
    let relative_path = relative_path.to_string();
    let introspector = ctx.introspector();

    let package = tokio::task::spawn_blocking(move || {
        introspector.find_package(repo_dir.as_std_path(), &relative_path)
    })
    .await??;
    Ok(package)
}
