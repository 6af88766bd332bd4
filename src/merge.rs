use crate::atomic::atomic_write_with;
use crate::cli::MergeArgs;
use crate::constants::PART_TOKEN;
use crate::naming::{derive_base_name, part_index, part_path};
use glob::{glob, Pattern};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct MergeRequest {
    /// Original file name the parts were split from.
    pub base: PathBuf,
    /// Destination; a relative path is resolved against the parts' directory.
    /// `None` writes to `base`.
    pub output: Option<PathBuf>,
}

impl From<MergeArgs> for MergeRequest {
    fn from(args: MergeArgs) -> Self {
        // Accept either one of the parts or the base itself.
        let base = derive_base_name(&args.part).unwrap_or(args.part);
        MergeRequest {
            base,
            output: args.output,
        }
    }
}

impl MergeRequest {
    pub fn output_path(&self) -> Result<PathBuf, MergeError> {
        let Some(output) = &self.output else {
            return Ok(self.base.clone());
        };
        if output.as_os_str().is_empty() {
            return Err(MergeError::InvalidSelection(
                "No file name selected".to_string(),
            ));
        }
        if output.is_absolute() {
            return Ok(output.clone());
        }
        let dir = self.base.parent().unwrap_or(Path::new(""));
        Ok(dir.join(output))
    }
}

#[derive(Debug)]
pub struct MergeOutcome {
    pub parts: Vec<PathBuf>,
    pub output_path: PathBuf,
    pub bytes_written: u64,
    /// Indices found past the first gap; never merged.
    pub ignored_parts: Vec<u64>,
    pub elapsed: Duration,
}

impl MergeOutcome {
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    pub fn summary(&self) -> String {
        format!(
            "Merged {} parts in {:.4} seconds",
            self.part_count(),
            self.elapsed.as_secs_f64()
        )
    }
}

/// Reported once per part, right after it has been appended to the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartRead {
    pub index: u64,
    pub path: PathBuf,
    pub bytes: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),
    #[error("No parts found: {0} does not exist")]
    NoPartsFound(String),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Concatenate `<base>.part1`, `<base>.part2`, ... up to the first gap.
pub fn execute(request: &MergeRequest) -> Result<MergeOutcome, MergeError> {
    execute_with_progress(request, |_| {})
}

/// Like [`execute`], calling `on_part` after every part is copied.
///
/// The output is replaced atomically; a failure leaves any previous file at
/// the destination as it was.
pub fn execute_with_progress<F>(
    request: &MergeRequest,
    mut on_part: F,
) -> Result<MergeOutcome, MergeError>
where
    F: FnMut(&PartRead),
{
    let started = Instant::now();
    let output_path = request.output_path()?;

    let parts = collect_parts(&request.base);
    if parts.is_empty() {
        return Err(MergeError::NoPartsFound(
            part_path(&request.base, 1).display().to_string(),
        ));
    }
    info!(base = %request.base.display(), "File is {} parts long", parts.len());
    let ignored_parts = stranded_parts(&request.base, parts.len() as u64);
    if !ignored_parts.is_empty() {
        warn!(
            base = %request.base.display(),
            "Ignoring parts after gap at index {}: {:?}",
            parts.len() + 1,
            ignored_parts
        );
    }

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut bytes_written = 0u64;
    atomic_write_with(&output_path, |out| {
        for (idx, path) in parts.iter().enumerate() {
            let mut part = File::open(path)?;
            let bytes = io::copy(&mut part, out)?;
            bytes_written += bytes;
            debug!(index = idx + 1, bytes, path = %path.display(), "appended part");
            on_part(&PartRead {
                index: idx as u64 + 1,
                path: path.clone(),
                bytes,
            });
        }
        Ok(())
    })?;

    let outcome = MergeOutcome {
        parts,
        output_path,
        bytes_written,
        ignored_parts,
        elapsed: started.elapsed(),
    };
    info!(output = %outcome.output_path.display(), "{}", outcome.summary());
    Ok(outcome)
}

fn collect_parts(base: &Path) -> Vec<PathBuf> {
    let mut parts = Vec::new();
    loop {
        let path = part_path(base, parts.len() as u64 + 1);
        if !path.exists() {
            return parts;
        }
        parts.push(path);
    }
}

/// Indices of `<base>.partN` files above `merged`, sorted.
fn stranded_parts(base: &Path, merged: u64) -> Vec<u64> {
    let Some(base_str) = base.to_str() else {
        return Vec::new();
    };
    let pattern = format!("{}.{PART_TOKEN}*", Pattern::escape(base_str));
    let entries = match glob(&pattern) {
        Ok(entries) => entries,
        Err(err) => {
            debug!("Skipping stranded part scan for '{pattern}': {err}");
            return Vec::new();
        }
    };

    let mut indices: Vec<u64> = entries
        .filter_map(Result::ok)
        .filter_map(|path| part_index(&path))
        .filter(|&index| index > merged)
        .collect();
    indices.sort_unstable();
    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use std::fs;

    fn write_parts(temp: &assert_fs::TempDir, base: &str, parts: &[(u64, &str)]) {
        for (index, contents) in parts {
            temp.child(format!("{base}.part{index}"))
                .write_str(contents)
                .unwrap();
        }
    }

    #[test]
    fn concatenates_parts_in_index_order() {
        let temp = assert_fs::TempDir::new().unwrap();
        write_parts(&temp, "song.mp3", &[(2, "world"), (1, "hello "), (3, "!")]);

        let request = MergeRequest {
            base: temp.path().join("song.mp3"),
            output: None,
        };
        let outcome = execute(&request).unwrap();

        assert_eq!(outcome.part_count(), 3);
        assert_eq!(outcome.bytes_written, 12);
        assert_eq!(outcome.output_path, temp.path().join("song.mp3"));
        temp.child("song.mp3").assert("hello world!");
        // Parts are kept.
        temp.child("song.mp3.part1").assert("hello ");
    }

    #[test]
    fn stops_at_first_gap() {
        let temp = assert_fs::TempDir::new().unwrap();
        write_parts(&temp, "X", &[(1, "one"), (2, "two"), (4, "four")]);

        let request = MergeRequest {
            base: temp.path().join("X"),
            output: None,
        };
        let outcome = execute(&request).unwrap();

        assert_eq!(outcome.part_count(), 2);
        assert_eq!(outcome.ignored_parts, vec![4]);
        temp.child("X").assert("onetwo");
        temp.child("X.part4").assert("four");
    }

    #[test]
    fn missing_first_part_is_no_parts_found() {
        let temp = assert_fs::TempDir::new().unwrap();
        write_parts(&temp, "X", &[(2, "two")]);

        let request = MergeRequest {
            base: temp.path().join("X"),
            output: None,
        };
        let result = execute(&request);

        assert!(matches!(result, Err(MergeError::NoPartsFound(_))));
        temp.child("X").assert(predicates::path::missing());
    }

    #[test]
    fn bare_output_name_lands_next_to_parts() {
        let temp = assert_fs::TempDir::new().unwrap();
        let dir = temp.child("incoming");
        dir.create_dir_all().unwrap();
        dir.child("archive.zip.part1").write_str("abc").unwrap();

        let request = MergeRequest {
            base: dir.path().join("archive.zip"),
            output: Some(PathBuf::from("restored.zip")),
        };
        let outcome = execute(&request).unwrap();

        assert_eq!(outcome.output_path, dir.path().join("restored.zip"));
        dir.child("restored.zip").assert("abc");
        dir.child("archive.zip").assert(predicates::path::missing());
    }

    #[test]
    fn nested_output_path_is_used_as_given() {
        let temp = assert_fs::TempDir::new().unwrap();
        write_parts(&temp, "data", &[(1, "payload")]);
        let output = temp.path().join("out/merged.bin");

        let request = MergeRequest {
            base: temp.path().join("data"),
            output: Some(output.clone()),
        };
        let outcome = execute(&request).unwrap();

        assert_eq!(outcome.output_path, output);
        assert_eq!(fs::read_to_string(output).unwrap(), "payload");
    }

    #[test]
    fn relative_output_path_is_under_parts_directory() {
        let temp = assert_fs::TempDir::new().unwrap();
        let dir = temp.child("downloads");
        dir.create_dir_all().unwrap();
        dir.child("x.bin.part1").write_str("data").unwrap();

        let request = MergeRequest {
            base: dir.path().join("x.bin"),
            output: Some(PathBuf::from("sub/x.bin")),
        };
        let outcome = execute(&request).unwrap();

        assert_eq!(outcome.output_path, dir.path().join("sub/x.bin"));
        dir.child("sub/x.bin").assert("data");
    }

    #[test]
    fn stranded_scan_treats_base_literally() {
        let temp = assert_fs::TempDir::new().unwrap();
        write_parts(&temp, "a[1].bin", &[(1, "one"), (3, "three")]);
        // Would match `a[1].bin.part*` if the brackets were a character class.
        write_parts(&temp, "a1.bin", &[(5, "other")]);

        let request = MergeRequest {
            base: temp.path().join("a[1].bin"),
            output: None,
        };
        let outcome = execute(&request).unwrap();

        assert_eq!(outcome.part_count(), 1);
        assert_eq!(outcome.ignored_parts, vec![3]);
        temp.child("a[1].bin").assert("one");
    }

    #[test]
    fn empty_output_name_is_invalid_selection() {
        let request = MergeRequest {
            base: PathBuf::from("whatever"),
            output: Some(PathBuf::new()),
        };
        assert!(matches!(
            execute(&request),
            Err(MergeError::InvalidSelection(_))
        ));
    }

    #[test]
    fn overwrites_existing_destination() {
        let temp = assert_fs::TempDir::new().unwrap();
        write_parts(&temp, "doc.txt", &[(1, "fresh")]);
        temp.child("doc.txt").write_str("stale contents").unwrap();

        let request = MergeRequest {
            base: temp.path().join("doc.txt"),
            output: None,
        };
        execute(&request).unwrap();

        temp.child("doc.txt").assert("fresh");
    }

    #[test]
    fn request_from_args_accepts_part_or_base() {
        let from_part = MergeRequest::from(MergeArgs {
            part: PathBuf::from("dir/file.iso.part7"),
            output: None,
        });
        assert_eq!(from_part.base, PathBuf::from("dir/file.iso"));

        let from_base = MergeRequest::from(MergeArgs {
            part: PathBuf::from("dir/file.iso"),
            output: None,
        });
        assert_eq!(from_base.base, PathBuf::from("dir/file.iso"));
    }

    #[test]
    fn reports_progress_for_every_part() {
        let temp = assert_fs::TempDir::new().unwrap();
        write_parts(&temp, "p", &[(1, "ab"), (2, "c")]);

        let mut seen = Vec::new();
        let request = MergeRequest {
            base: temp.path().join("p"),
            output: None,
        };
        execute_with_progress(&request, |part| seen.push((part.index, part.bytes))).unwrap();

        assert_eq!(seen, vec![(1, 2), (2, 1)]);
    }
}
