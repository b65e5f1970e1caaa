//! `shelf path` and `shelf exists` command implementations.

use camino::Utf8Path;
use serde::Serialize;
use shelf_core::types::{ChecksumRecord, HashAlgorithm};
use shelf_store::CanonicalPath;

use super::CommandContext;
use crate::PackageArgs;

#[derive(Debug, Serialize)]
struct ExistsReport<'a> {
    path: &'a Utf8Path,
    expected: &'a ChecksumRecord,
    exists: bool,
}

/// Execute the `shelf path` command
pub async fn execute_path(package: &PackageArgs, ctx: &CommandContext) -> anyhow::Result<()> {
    let path = canonical_path(package, ctx)?;

    if ctx.output.is_json() {
        return ctx.output.json(&path);
    }
    ctx.output.result(path.as_path().as_str());
    Ok(())
}

/// Canonical store path of the package described by `package`
pub fn canonical_path(package: &PackageArgs, ctx: &CommandContext) -> anyhow::Result<CanonicalPath> {
    let identity = package.identity()?;
    let checksum = package.checksum_spec()?;
    Ok(ctx.content_store()?.canonical_path(&identity, &checksum)?)
}

/// Execute the `shelf exists` command
pub async fn execute_exists(
    path: &Utf8Path,
    digest: &str,
    hashtype: &str,
    force: bool,
    ctx: &CommandContext,
) -> anyhow::Result<()> {
    let path = ctx.absolute(path);
    let algorithm: HashAlgorithm = hashtype.parse()?;
    let expected = ChecksumRecord::new(algorithm, digest);
    let exists = check_exists(&path, &expected, force, ctx)?;

    if ctx.output.is_json() {
        return ctx.output.json(&ExistsReport {
            path: &path,
            expected: &expected,
            exists,
        });
    }
    ctx.output.result(if exists { "present" } else { "absent" });
    Ok(())
}

/// Whether `path` holds content matching `expected`
pub fn check_exists(path: &Utf8Path, expected: &ChecksumRecord, force: bool, ctx: &CommandContext) -> anyhow::Result<bool> {
    Ok(ctx.content_store()?.exists(path, expected, force)?)
}
