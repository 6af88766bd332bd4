//! Console front-end: a numbered menu driving split and merge jobs.

use crate::job::{Job, JobError, JobEvent, JobHandle, Status};
use crate::merge::MergeRequest;
use crate::naming::derive_base_name;
use crate::settings::{parse_seg_size_mb, Settings, SettingsError};
use crate::split::{self, SplitRequest};
use std::fmt::Display;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum MenuError {
    #[error("Console I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("Could not save settings: {0}")]
    Settings(#[from] SettingsError),
}

/// What the user answered when asked for a path.
enum Selection {
    Typed(PathBuf),
    Remembered(PathBuf),
    Nothing,
}

pub struct Menu<R, W> {
    input: R,
    output: W,
    settings: Settings,
    config_path: PathBuf,
}

impl<R: BufRead, W: Write> Menu<R, W> {
    pub fn new(input: R, output: W, settings: Settings, config_path: PathBuf) -> Self {
        Menu {
            input,
            output,
            settings,
            config_path,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Loop until the user quits or input ends.
    pub fn run(&mut self) -> Result<(), MenuError> {
        writeln!(
            self.output,
            "Select option:\n1. Split file\n2. Combine file\n3. Set part size (MB)\nq. Quit"
        )?;
        loop {
            let Some(choice) = self.prompt(">>> ")? else {
                return Ok(());
            };
            match choice.as_str() {
                "1" => self.split_file()?,
                "2" => self.merge_file()?,
                "3" => self.set_segment_size()?,
                "q" | "quit" => return Ok(()),
                _ => writeln!(self.output, "Invalid choice")?,
            }
        }
    }

    fn split_file(&mut self) -> Result<(), MenuError> {
        let remembered = self.settings.loaded_split_file.clone();
        let source = match self.select("Select any file", remembered.as_deref())? {
            Selection::Typed(path) | Selection::Remembered(path) => path,
            Selection::Nothing => return self.abort("No file selected"),
        };

        let segment = self.settings.segment_size();
        let plan = match split::plan(&source, segment) {
            Ok(plan) => plan,
            Err(err) => return self.report_error(err),
        };
        self.settings.loaded_split_file = Some(source.clone());
        self.settings.save(&self.config_path)?;

        if plan.smaller_than_segment() {
            let answer =
                self.prompt("File size smaller than selected part size, split anyway? [y/N] ")?;
            if !matches!(answer.as_deref(), Some("y" | "Y" | "yes")) {
                return self.abort("Split cancelled");
            }
        }

        self.run_job(Job::spawn_split(SplitRequest { source, segment }))
    }

    fn merge_file(&mut self) -> Result<(), MenuError> {
        let remembered = self.settings.loaded_merge_file.clone();
        let base = match self.select("Select any part", remembered.as_deref())? {
            Selection::Typed(part) => match derive_base_name(&part) {
                Some(base) => base,
                None => return self.abort("Invalid file"),
            },
            Selection::Remembered(base) => base,
            Selection::Nothing => return self.abort("No file selected"),
        };
        self.settings.loaded_merge_file = Some(base.clone());
        self.settings.save(&self.config_path)?;

        let default_name = base
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        let label = match &default_name {
            Some(name) => format!("New file name [{name}]: "),
            None => "New file name: ".to_string(),
        };
        let name = match self.prompt(&label)? {
            Some(typed) if !typed.is_empty() => typed,
            Some(_) => match default_name {
                Some(name) => name,
                None => return self.abort("No file name selected"),
            },
            None => return self.abort("No file name selected"),
        };

        self.run_job(Job::spawn_merge(MergeRequest {
            base,
            output: Some(PathBuf::from(name)),
        }))
    }

    fn set_segment_size(&mut self) -> Result<(), MenuError> {
        let label = format!("Part size in MB (1-999) [{}]: ", self.settings.seg_size_mb);
        let Some(answer) = self.prompt(&label)? else {
            return Ok(());
        };
        if answer.is_empty() {
            return Ok(());
        }
        let size = parse_seg_size_mb(&answer);
        if answer.parse::<u32>().ok() != Some(size) {
            writeln!(self.output, "Invalid size, using {size}")?;
        }
        self.settings.seg_size_mb = size;
        self.settings.save(&self.config_path)?;
        writeln!(self.output, "Part size set to {size} MB")?;
        Ok(())
    }

    fn run_job(&mut self, spawned: Result<JobHandle, JobError>) -> Result<(), MenuError> {
        let handle = match spawned {
            Ok(handle) => handle,
            Err(err) => return self.report_error(err),
        };
        writeln!(self.output, "Status: {}", Status::Running)?;

        let output = &mut self.output;
        let mut console = Ok(());
        let result = handle.wait_with(|event| {
            if let JobEvent::Progress { index, bytes } = event {
                if console.is_ok() {
                    console = writeln!(output, "  part {index}: {bytes} bytes");
                }
            }
        });
        console?;

        match result {
            Ok(report) => {
                writeln!(self.output, "Status: {}", Status::Complete)?;
                writeln!(self.output, "{}", report.summary())?;
                writeln!(self.output, "Status: {}", Status::Idle)?;
                Ok(())
            }
            Err(err) => self.report_error(err),
        }
    }

    fn select(&mut self, label: &str, remembered: Option<&Path>) -> Result<Selection, MenuError> {
        let prompt = match remembered {
            Some(path) => format!("{label} [{}]: ", path.display()),
            None => format!("{label}: "),
        };
        let selection = match self.prompt(&prompt)? {
            Some(typed) if !typed.is_empty() => Selection::Typed(PathBuf::from(typed)),
            Some(_) => match remembered {
                Some(path) => Selection::Remembered(path.to_path_buf()),
                None => Selection::Nothing,
            },
            None => Selection::Nothing,
        };
        Ok(selection)
    }

    /// Print `label`, read one line. `None` at end of input.
    fn prompt(&mut self, label: &str) -> Result<Option<String>, MenuError> {
        write!(self.output, "{label}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            debug!("console input closed");
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn abort(&mut self, message: &str) -> Result<(), MenuError> {
        writeln!(self.output, "{message}")?;
        Ok(())
    }

    fn report_error(&mut self, err: impl Display) -> Result<(), MenuError> {
        writeln!(self.output, "Error: {err}")?;
        writeln!(self.output, "Status: {}", Status::Idle)?;
        Ok(())
    }
}
