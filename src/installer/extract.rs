//! Safe ZIP extraction.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;
use zip::ZipArchive;

use super::InstallError;

/// Unpacks every safe entry of the archive at `archive_path` into
/// `assets_dir`, overwriting existing files. Entries rejected by the path
/// gate are logged and skipped; they never abort the run. The blocking
/// ZIP work happens on a worker thread so concurrent asset reads are not
/// stalled.
pub async fn extract_archive(
    archive_path: PathBuf,
    assets_dir: PathBuf,
    prefix: String,
) -> Result<(), InstallError> {
    tokio::task::spawn_blocking(move || extract_blocking(&archive_path, &assets_dir, &prefix))
        .await?
}

fn extract_blocking(
    archive_path: &Path,
    assets_dir: &Path,
    prefix: &str,
) -> Result<(), InstallError> {
    let file = fs::File::open(archive_path)?;
    let mut archive = ZipArchive::new(file)?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let Some(destination) = entry_destination(assets_dir, prefix, entry.name()) else {
            warn!(entry = entry.name(), "skipping unsafe archive entry");
            continue;
        };

        if entry.is_dir() {
            fs::create_dir_all(&destination)?;
            continue;
        }

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut output = fs::File::create(&destination)?;
        io::copy(&mut entry, &mut output)?;
    }

    Ok(())
}

/// Destination for an archive entry, or `None` when the entry must be
/// skipped.
///
/// Two checks, both required. The recorded name may not contain `..` or
/// be absolute (the zip-slip gate), and after stripping one optional
/// `<prefix>/` archive root the joined path must still be a descendant of
/// `assets_dir` (defense in depth against traversal forms the first check
/// does not cover).
fn entry_destination(assets_dir: &Path, prefix: &str, raw_name: &str) -> Option<PathBuf> {
    if raw_name.contains("..") || Path::new(raw_name).is_absolute() {
        return None;
    }

    let relative = raw_name
        .strip_prefix(&format!("{prefix}/"))
        .or_else(|| raw_name.strip_prefix(&format!("{prefix}\\")))
        .unwrap_or(raw_name);

    let destination = assets_dir.join(relative);
    destination.starts_with(assets_dir).then_some(destination)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::installer::testutil::zip_fixture;
    use tempfile::tempdir;

    fn write_fixture(dir: &Path, entries: &[(&str, &[u8])]) -> PathBuf {
        let archive = dir.join("id1.zip");
        fs::write(&archive, zip_fixture(entries)).unwrap();
        archive
    }

    #[test]
    fn gate_rejects_parent_segments_and_absolute_names() {
        let assets = Path::new("/srv/quake/Client/id1");
        assert_eq!(entry_destination(assets, "id1", "../evil.cfg"), None);
        assert_eq!(entry_destination(assets, "id1", "id1/../../evil.cfg"), None);
        assert_eq!(entry_destination(assets, "id1", "/etc/passwd"), None);
    }

    #[test]
    fn gate_strips_one_archive_root_prefix() {
        let assets = Path::new("/srv/quake/Client/id1");
        assert_eq!(
            entry_destination(assets, "id1", "id1/pak0.pak"),
            Some(assets.join("pak0.pak"))
        );
        assert_eq!(
            entry_destination(assets, "id1", "id1\\pak0.pak"),
            Some(assets.join("pak0.pak"))
        );
        assert_eq!(
            entry_destination(assets, "id1", "config.cfg"),
            Some(assets.join("config.cfg"))
        );
        // Only the leading prefix is stripped, not nested occurrences.
        assert_eq!(
            entry_destination(assets, "id1", "id1/id1/pak0.pak"),
            Some(assets.join("id1/pak0.pak"))
        );
    }

    #[tokio::test]
    async fn safe_entries_round_trip() {
        let temp = tempdir().unwrap();
        let assets = temp.path().join("id1");
        fs::create_dir_all(&assets).unwrap();
        let archive = write_fixture(
            temp.path(),
            &[
                ("id1/pak0.pak", b"PACKdata" as &[u8]),
                ("id1/maps/", b""),
                ("id1/maps/e1m1.bsp", b"BSPdata"),
                ("config.cfg", b"volume 0.7"),
            ],
        );

        extract_archive(archive, assets.clone(), "id1".into())
            .await
            .unwrap();

        assert_eq!(fs::read(assets.join("pak0.pak")).unwrap(), b"PACKdata");
        assert_eq!(fs::read(assets.join("maps/e1m1.bsp")).unwrap(), b"BSPdata");
        assert_eq!(fs::read(assets.join("config.cfg")).unwrap(), b"volume 0.7");
        assert!(assets.join("maps").is_dir());
    }

    #[tokio::test]
    async fn unsafe_entries_are_skipped_not_fatal() {
        let temp = tempdir().unwrap();
        let assets = temp.path().join("sandbox").join("id1");
        fs::create_dir_all(&assets).unwrap();
        let archive = write_fixture(
            temp.path(),
            &[
                ("../evil.cfg", b"evil" as &[u8]),
                ("id1/../../evil.cfg", b"evil"),
                ("id1/ok.cfg", b"fine"),
            ],
        );

        extract_archive(archive, assets.clone(), "id1".into())
            .await
            .unwrap();

        assert_eq!(fs::read(assets.join("ok.cfg")).unwrap(), b"fine");
        assert!(!temp.path().join("sandbox/evil.cfg").exists());
        assert!(!temp.path().join("evil.cfg").exists());
    }

    #[tokio::test]
    async fn existing_files_are_overwritten() {
        let temp = tempdir().unwrap();
        let assets = temp.path().join("id1");
        fs::create_dir_all(&assets).unwrap();
        fs::write(assets.join("pak0.pak"), b"stale").unwrap();
        let archive = write_fixture(temp.path(), &[("id1/pak0.pak", b"fresh" as &[u8])]);

        extract_archive(archive, assets.clone(), "id1".into())
            .await
            .unwrap();

        assert_eq!(fs::read(assets.join("pak0.pak")).unwrap(), b"fresh");
    }
}
