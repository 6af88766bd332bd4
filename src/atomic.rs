use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use tempfile::Builder;

/// Write content atomically by writing to a temp file and renaming.
/// This prevents partial writes on crash.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    atomic_write_with(path, |file| file.write_all(content))
}

/// Stream into a temp file next to `path` and rename it over `path` once
/// `fill` succeeds. On error the temp file is removed and `path` is untouched.
///
/// The result keeps the mode of the file it replaces; a new file gets the
/// same mode a plain create would give it.
pub fn atomic_write_with<F>(path: &Path, fill: F) -> io::Result<()>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let existing = fs::metadata(path).ok().map(|meta| meta.permissions());

    #[cfg_attr(not(unix), allow(unused_mut))]
    let mut builder = Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // Subject to the process umask, like `File::create`.
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    let mut temp = builder.tempfile_in(parent)?;
    if let Some(permissions) = existing {
        temp.as_file().set_permissions(permissions)?;
    }
    fill(temp.as_file_mut())?;
    temp.flush()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
