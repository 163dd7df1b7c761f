//! Download artifact lifecycle: temp file, size measurement, commit or discard.
//!
//! The browser saves each download to `<final>.part`. The artifact is then
//! either renamed to its permanent name or deleted. A `TempArtifact` that is
//! dropped without being committed removes its file, so abandoned transactions
//! (errors, interrupts) never leave temporaries behind.

use std::io;
use std::path::{Path, PathBuf};

/// Temporary file suffix used before the commit rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path (e.g. `a_b.jpg` -> `a_b.jpg.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// A downloaded file sitting at its temp path, not yet committed.
#[derive(Debug)]
pub struct TempArtifact {
    temp_path: PathBuf,
    final_path: PathBuf,
    armed: bool,
}

impl TempArtifact {
    /// Guard for the temp file of `final_path`. Any stale temp from a previous
    /// crash is removed first so the browser writes to a clean path.
    pub fn prepare(final_path: &Path) -> io::Result<Self> {
        let temp_path = temp_path(final_path);
        remove_if_exists(&temp_path)?;
        Ok(Self {
            temp_path,
            final_path: final_path.to_path_buf(),
            armed: true,
        })
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Size of the artifact on disk.
    pub fn size(&self) -> io::Result<u64> {
        Ok(std::fs::metadata(&self.temp_path)?.len())
    }

    /// Rename the temp file to its permanent name. Consumes the guard.
    pub fn commit(mut self) -> io::Result<PathBuf> {
        std::fs::rename(&self.temp_path, &self.final_path)?;
        self.armed = false;
        Ok(self.final_path.clone())
    }

    /// Delete the temp file now and report any I/O error. Consumes the guard;
    /// on failure the guard stays armed and the drop retries the removal.
    pub fn discard(mut self) -> io::Result<()> {
        remove_if_exists(&self.temp_path)?;
        self.armed = false;
        Ok(())
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        if self.armed {
            if let Err(e) = remove_if_exists(&self.temp_path) {
                tracing::warn!(path = %self.temp_path.display(), "could not remove temp artifact: {}", e);
            }
        }
    }
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_path_appends_part() {
        let p = temp_path(Path::new("abc_photo.jpg"));
        assert_eq!(p.to_string_lossy(), "abc_photo.jpg.part");
        let p2 = temp_path(Path::new("/tmp/out/abc_photo.jpg"));
        assert_eq!(p2.to_string_lossy(), "/tmp/out/abc_photo.jpg.part");
    }

    #[test]
    fn commit_renames_to_final() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("abc_x.jpg");
        let art = TempArtifact::prepare(&final_path).unwrap();
        std::fs::write(art.temp_path(), vec![7u8; 128]).unwrap();
        assert_eq!(art.size().unwrap(), 128);
        let tp = art.temp_path().to_path_buf();
        let committed = art.commit().unwrap();
        assert_eq!(committed, final_path);
        assert!(final_path.exists());
        assert!(!tp.exists());
    }

    #[test]
    fn discard_and_drop_remove_temp() {
        let dir = tempfile::tempdir().unwrap();
        let a = TempArtifact::prepare(&dir.path().join("a_x.jpg")).unwrap();
        std::fs::write(a.temp_path(), b"small").unwrap();
        let tp = a.temp_path().to_path_buf();
        a.discard().unwrap();
        assert!(!tp.exists());

        let b = TempArtifact::prepare(&dir.path().join("b_x.jpg")).unwrap();
        std::fs::write(b.temp_path(), b"abandoned").unwrap();
        let tp = b.temp_path().to_path_buf();
        drop(b);
        assert!(!tp.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn failed_discard_reports_the_error() {
        let dir = tempfile::tempdir().unwrap();
        let art = TempArtifact::prepare(&dir.path().join("d_x.jpg")).unwrap();
        // a directory at the temp path cannot be removed with remove_file
        std::fs::create_dir(art.temp_path()).unwrap();
        std::fs::write(art.temp_path().join("inner"), b"x").unwrap();
        assert!(art.discard().is_err());
    }

    #[test]
    fn prepare_clears_stale_temp() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("c_x.jpg");
        std::fs::write(temp_path(&final_path), b"stale").unwrap();
        let art = TempArtifact::prepare(&final_path).unwrap();
        assert!(!art.temp_path().exists());
    }
}
