use std::{
    fs,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use tempfile::{Builder, NamedTempFile};

/// Collects all files in the given directories, does not walk them recursively.
pub fn all_files<R>(folders: impl IntoIterator<Item = impl AsRef<Path>>) -> io::Result<R>
where
    R: FromIterator<PathBuf>,
{
    let iters: Result<Vec<_>, _> =
        folders.into_iter().map(|path| fs::read_dir(path)).collect();

    iters?
        .into_iter()
        .flatten()
        .map(|entry| entry.map(|entry| entry.path()))
        .collect()
}

/// Whether the path has the extension `ext`, ignoring case
pub fn has_extension(path: impl AsRef<Path>, ext: &str) -> bool {
    path.as_ref()
        .extension()
        .is_some_and(|e| e.to_string_lossy().eq_ignore_ascii_case(ext))
}

/// Try to read the file, return None if it doesn't exist
pub fn read_optional_file(path: impl AsRef<Path>) -> io::Result<Option<String>> {
    match fs::read_to_string(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
        Ok(s) => Ok(Some(s)),
    }
}

#[derive(thiserror::Error, Debug)]
pub enum AtomicWriteError<E: std::error::Error + 'static> {
    #[error("failed to create a temporary file")]
    Create(#[source] io::Error),
    #[error("failed to write the contents")]
    Write(#[source] E),
    #[error("failed to flush the contents")]
    Flush(#[source] io::Error),
    #[error("failed to move the temporary file into place")]
    Persist(#[source] io::Error),
}

/// A temporary file with the permissions of any other new file, instead of being private
/// to the owner.
fn temp_file_in(dir: &Path) -> io::Result<NamedTempFile> {
    #[allow(unused_mut)]
    let mut builder = Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // the umask is applied on top, like for any other created file
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    builder.tempfile_in(dir)
}

/// Writes a file by letting `write` fill a temporary file in the same directory as `path`,
/// which then is renamed to `path`. Either the whole file appears or nothing does, the
/// temporary file is removed if anything fails.
pub fn write_atomically<F, E>(
    path: impl AsRef<Path>,
    write: F,
) -> Result<(), AtomicWriteError<E>>
where
    F: FnOnce(&mut BufWriter<&mut NamedTempFile>) -> Result<(), E>,
    E: std::error::Error + 'static,
{
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = temp_file_in(dir).map_err(AtomicWriteError::Create)?;
    // an overwritten file keeps its permissions
    if let Ok(existing) = fs::metadata(path) {
        tmp.as_file()
            .set_permissions(existing.permissions())
            .map_err(AtomicWriteError::Create)?;
    }
    {
        let mut writer = BufWriter::new(&mut tmp);
        write(&mut writer).map_err(AtomicWriteError::Write)?;
        writer.flush().map_err(AtomicWriteError::Flush)?;
    }
    tmp.persist(path)
        .map_err(|e| AtomicWriteError::Persist(e.error))?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn extension_ignores_case() {
        assert!(has_extension("a/b/video.MP4", "mp4"));
        assert!(has_extension("video.mp4", "mp4"));
        assert!(!has_extension("video.mkv", "mp4"));
        assert!(!has_extension("mp4", "mp4"));
    }

    #[test]
    fn atomic_write_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.txt");
        write_atomically(&target, |w| w.write_all(b"hello")).unwrap();
        assert_eq!("hello", fs::read_to_string(&target).unwrap());
    }

    #[test]
    fn atomic_write_leaves_nothing_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.txt");
        let res = write_atomically(&target, |w| {
            w.write_all(b"half of it")?;
            Err(io::Error::new(io::ErrorKind::Other, "oops"))
        });
        assert!(matches!(res, Err(AtomicWriteError::Write(_))));
        assert!(!target.exists());
        assert_eq!(0, fs::read_dir(dir.path()).unwrap().count());
    }

    #[test]
    fn atomic_write_replaces_existing() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.txt");
        fs::write(&target, "old").unwrap();
        write_atomically(&target, |w| w.write_all(b"new")).unwrap();
        assert_eq!("new", fs::read_to_string(&target).unwrap());
    }

    #[cfg(unix)]
    fn mode(path: &Path) -> u32 {
        use std::os::unix::fs::PermissionsExt;
        fs::metadata(path).unwrap().permissions().mode() & 0o777
    }

    #[test]
    #[cfg(unix)]
    fn atomic_write_has_normal_permissions() {
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("plain.txt");
        fs::write(&plain, "plain").unwrap();

        let target = dir.path().join("out.txt");
        write_atomically(&target, |w| w.write_all(b"atomic")).unwrap();
        assert_eq!(mode(&plain), mode(&target));
    }

    #[test]
    #[cfg(unix)]
    fn atomic_write_keeps_existing_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.txt");
        fs::write(&target, "old").unwrap();
        fs::set_permissions(&target, fs::Permissions::from_mode(0o640)).unwrap();

        write_atomically(&target, |w| w.write_all(b"new")).unwrap();
        assert_eq!(0o640, mode(&target));
    }

    #[test]
    fn optional_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(None, read_optional_file(dir.path().join("nope")).unwrap());
    }
}
