use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// An entry that could not be relocated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveFailure {
    pub path: PathBuf,
    pub message: String,
}

impl MoveFailure {
    fn new(path: &Path, message: impl Into<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}

/// Move `source` to `destination`.
///
/// A plain rename when the destination does not exist. When both are
/// directories the contents are merged entry by entry; any other clash is
/// reported and the source left in place. Returns the failures, which are
/// empty on complete success.
pub fn move_entry(source: &Path, destination: &Path) -> Vec<MoveFailure> {
    let mut failures = Vec::new();
    move_into(source, destination, &mut failures);
    failures
}

fn move_into(source: &Path, destination: &Path, failures: &mut Vec<MoveFailure>) {
    let destination_meta = match fs::symlink_metadata(destination) {
        Ok(meta) => Some(meta),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => {
            failures.push(MoveFailure::new(source, e.to_string()));
            return;
        }
    };

    let Some(destination_meta) = destination_meta else {
        if let Err(e) = fs::rename(source, destination) {
            failures.push(MoveFailure::new(
                source,
                format!("rename to {} failed: {}", destination.display(), e),
            ));
        }
        return;
    };

    let source_is_dir = match fs::symlink_metadata(source) {
        Ok(meta) => meta.is_dir(),
        Err(e) => {
            failures.push(MoveFailure::new(source, e.to_string()));
            return;
        }
    };

    if !(source_is_dir && destination_meta.is_dir()) {
        failures.push(MoveFailure::new(
            source,
            format!("{} already exists", destination.display()),
        ));
        return;
    }

    let entries = match fs::read_dir(source) {
        Ok(entries) => entries,
        Err(e) => {
            failures.push(MoveFailure::new(source, e.to_string()));
            return;
        }
    };

    let failed_before = failures.len();
    for entry in entries {
        match entry {
            Ok(entry) => move_into(&entry.path(), &destination.join(entry.file_name()), failures),
            Err(e) => failures.push(MoveFailure::new(source, e.to_string())),
        }
    }

    // Children that stayed behind are already reported
    if failures.len() == failed_before {
        if let Err(e) = fs::remove_dir(source) {
            failures.push(MoveFailure::new(source, e.to_string()));
        }
    }
}

/// Whether anything sits at `path`, dangling symlinks included
pub fn is_occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Remove a file or directory tree; a missing path is not an error
pub fn remove_path(path: &Path) -> io::Result<()> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };

    if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

/// Write `content` to `path` through a temporary sibling and a rename
pub fn write_atomically(path: &Path, content: &[u8]) -> io::Result<()> {
    use std::io::Write;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = path.with_file_name(format!(".{}.tmp", file_name));

    let result = (|| {
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(content)?;
        file.sync_all()?;
        fs::rename(&temp_path, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}
