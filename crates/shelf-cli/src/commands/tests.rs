//! Unit tests for CLI commands.

use super::*;
use shelf_core::types::{ChecksumRecord, HashAlgorithm};
use shelf_store::{checksum_bytes, PublishOutcome, ToolOutput};
use std::fs;
use tempfile::TempDir;

/// Create a command context with its storage root in a temporary directory
fn create_test_context(temp_dir: &TempDir) -> CommandContext {
    let cwd = Utf8PathBuf::from_path_buf(temp_dir.path().to_path_buf()).unwrap();
    let mut config = ShelfToml::default();
    config.storage.root = Some(Utf8PathBuf::from("store"));
    config.metadata.createrepo = "echo".to_string();
    config.metadata.modifyrepo = "echo".to_string();

    CommandContext::from_config(cwd, config, ConfigSource::Defaults, OutputHandler::new(false))
}

fn foo_args(digest: Option<&str>, checksum: &[&str]) -> PackageArgs {
    PackageArgs {
        name: "foo".to_string(),
        version: "1.0".to_string(),
        release: "1".to_string(),
        arch: "x86_64".to_string(),
        filename: "foo-1.0-1.x86_64.rpm".to_string(),
        digest: digest.map(str::to_string),
        checksum: checksum.iter().map(|c| c.to_string()).collect(),
    }
}

#[tokio::test]
async fn test_layout_is_relative_to_cwd() {
    let temp_dir = tempfile::tempdir().unwrap();
    let ctx = create_test_context(&temp_dir);

    let layout = ctx.layout().unwrap();
    assert_eq!(layout.root(), ctx.cwd.join("store"));
    assert_eq!(layout.repos_dir(), ctx.cwd.join("store/repos"));
}

#[tokio::test]
async fn test_missing_storage_root() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut ctx = create_test_context(&temp_dir);
    ctx.config.storage.root = None;

    assert!(matches!(ctx.layout(), Err(ShelfError::ConfigValidation { .. })));
}

#[tokio::test]
async fn test_checksum_command() {
    let temp_dir = tempfile::tempdir().unwrap();
    let ctx = create_test_context(&temp_dir);
    fs::write(temp_dir.path().join("a.txt"), b"hello world").unwrap();
    fs::write(temp_dir.path().join("b.txt"), b"").unwrap();

    let results = checksum::compute(vec!["a.txt".into(), "b.txt".into()], "sha", &ctx)
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].algorithm, HashAlgorithm::Sha1);
    assert_eq!(results[0].digest, "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed");
    assert_eq!(results[1].digest, "da39a3ee5e6b4b0d3255bfef95601890afd80709");
    assert!(results[0].modified > 0);
}

#[tokio::test]
async fn test_checksum_unknown_algorithm() {
    let temp_dir = tempfile::tempdir().unwrap();
    let ctx = create_test_context(&temp_dir);

    let err = checksum::compute(vec!["a.txt".into()], "crc32", &ctx).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ShelfError>(),
        Some(ShelfError::UnsupportedAlgorithm { .. })
    ));
}

#[tokio::test]
async fn test_checksum_spec_from_args() {
    let single = foo_args(Some("abcdef"), &[]).checksum_spec().unwrap();
    assert_eq!(single, ChecksumSpec::Single("abcdef".to_string()));

    let multi = foo_args(None, &["MD5=111aaa", "sha256 = fedcba"]).checksum_spec().unwrap();
    assert_eq!(
        multi,
        ChecksumSpec::Multi(BTreeMap::from([
            ("md5".to_string(), "111aaa".to_string()),
            ("sha256".to_string(), "fedcba".to_string()),
        ]))
    );

    assert!(foo_args(None, &["sha256"]).checksum_spec().is_err());
}

#[tokio::test]
async fn test_path_command() {
    let temp_dir = tempfile::tempdir().unwrap();
    let ctx = create_test_context(&temp_dir);

    let path = path::canonical_path(&foo_args(None, &["sha1=222bbb", "md5=111aaa"]), &ctx).unwrap();
    assert_eq!(
        path.as_path(),
        ctx.cwd.join("store/packages/222/foo/1.0/1/x86_64/foo-1.0-1.x86_64.rpm")
    );
}

#[tokio::test]
async fn test_path_command_fallback_from_config() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut ctx = create_test_context(&temp_dir);
    ctx.config.storage.fallback_algorithm = "md5".to_string();

    let path = path::canonical_path(&foo_args(None, &["sha1=222bbb", "md5=111aaa"]), &ctx).unwrap();
    assert!(path.as_path().as_str().contains("/packages/111/"));
}

#[tokio::test]
async fn test_exists_command() {
    let temp_dir = tempfile::tempdir().unwrap();
    let ctx = create_test_context(&temp_dir);
    let file = ctx.cwd.join("pkg.rpm");
    fs::write(&file, b"payload").unwrap();

    let good = ChecksumRecord::new(HashAlgorithm::Sha256, checksum_bytes(HashAlgorithm::Sha256, b"payload"));
    let bad = ChecksumRecord::new(HashAlgorithm::Sha256, "00ff");

    assert!(path::check_exists(&file, &good, false, &ctx).unwrap());
    assert!(!path::check_exists(&file, &good, true, &ctx).unwrap());
    assert!(!path::check_exists(&file, &bad, false, &ctx).unwrap());
    assert!(!path::check_exists(&ctx.cwd.join("missing.rpm"), &good, false, &ctx).unwrap());
}

#[cfg(unix)]
#[tokio::test]
async fn test_link_command() {
    let temp_dir = tempfile::tempdir().unwrap();
    let ctx = create_test_context(&temp_dir);
    let args = foo_args(Some("abc123"), &[]);

    let canonical = path::canonical_path(&args, &ctx).unwrap();
    fs::create_dir_all(canonical.as_path().parent().unwrap()).unwrap();
    fs::write(canonical.as_path(), b"foo").unwrap();

    let entry = publish::link_package(&args, "el9/os", &ctx).unwrap();
    assert_eq!(entry.outcome, PublishOutcome::Created);

    let link = ctx.cwd.join("store/repos/el9/os/foo-1.0-1.x86_64.rpm");
    assert_eq!(fs::read_link(&link).unwrap(), canonical.as_path().as_std_path());

    let again = publish::link_package(&args, "el9/os", &ctx).unwrap();
    assert_eq!(again.outcome, PublishOutcome::AlreadyLinked);
}

#[cfg(unix)]
#[tokio::test]
async fn test_createrepo_runs_configured_tool() {
    let temp_dir = tempfile::tempdir().unwrap();
    let ctx = create_test_context(&temp_dir);

    let output = metadata::run_tool(&ctx, Utf8Path::new("el9/os"), |publisher, dir| {
        publisher.refresh_metadata(dir, None)
    })
    .await
    .unwrap();

    assert!(output.success());
    assert_eq!(output.output, format!("--update {}", ctx.cwd.join("el9/os")));
}

#[tokio::test]
async fn test_metadata_timeout() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut ctx = create_test_context(&temp_dir);
    ctx.config.metadata.timeout_secs = Some(1);

    let result = metadata::run_tool(&ctx, Utf8Path::new("el9"), |_, _| {
        std::thread::sleep(Duration::from_millis(1500));
        Ok(ToolOutput {
            tool: "createrepo".to_string(),
            command: "createrepo".to_string(),
            status: Some(0),
            output: String::new(),
        })
    })
    .await;

    let err = result.unwrap_err();
    assert!(err.to_string().contains("did not finish within 1s"));
}

#[tokio::test]
async fn test_find_command() {
    let temp_dir = tempfile::tempdir().unwrap();
    let ctx = create_test_context(&temp_dir);
    let repo = ctx.cwd.join("repo");
    fs::create_dir_all(repo.join("Packages")).unwrap();
    fs::write(repo.join("Packages/foo-1.0-1.noarch.rpm"), b"foo").unwrap();

    let found = find::find_package(Utf8Path::new("repo"), "Packages/foo-1.0-1.noarch.rpm", &ctx)
        .await
        .unwrap();
    assert_eq!(found.size, 3);

    let err = find::find_package(Utf8Path::new("repo"), "bar.rpm", &ctx).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ShelfError>(),
        Some(ShelfError::PackageNotFoundInRepository { .. })
    ));
}

#[tokio::test]
async fn test_config_source_display() {
    assert_eq!(ConfigSource::Defaults.to_string(), "built-in defaults");
    assert_eq!(
        ConfigSource::Project(Utf8PathBuf::from("/srv/shelf.toml")).to_string(),
        "/srv/shelf.toml"
    );
}
