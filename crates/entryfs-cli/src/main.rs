// entryfs: command-line frontend for entryfs-core
// Argument parsing, dispatch onto the entry API, text/JSON output

mod cli;
mod output;

use std::io::{self, Write};
use std::process::ExitCode;

use chrono::{TimeDelta, Utc};
use clap::Parser;
use entryfs_core::{CopyOptions, Entry, FolderEntry, Io, IoConfig, Permissions};
use log::debug;
use thiserror::Error;

use cli::{Cli, Command};
use output::StatReport;

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Core(#[from] entryfs_core::Error),

    #[error("output: {0}")]
    Output(#[from] io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Usage(String),
}

type CliResult<T> = Result<T, CliError>;

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn load_config(cli: &Cli) -> CliResult<IoConfig> {
    match &cli.config {
        Some(path) => {
            debug!("loading config from {}", path.display());
            Ok(IoConfig::load(path)?)
        }
        None => Ok(IoConfig::default()),
    }
}

/// Existing folder at `path`; a trailing slash is not required.
fn existing_folder(io: &Io, path: &str) -> CliResult<FolderEntry> {
    match io.resolve(path, None)? {
        Entry::Folder(folder) => Ok(folder),
        Entry::File(file) => Err(CliError::Usage(format!(
            "{} is not a folder",
            file.path()
        ))),
    }
}

fn run(io: &Io, command: Command, out: &mut impl Write) -> CliResult<()> {
    match command {
        Command::Stat { path, json } => {
            let report = StatReport::collect(io.resolve(&path, None)?)?;
            if json {
                serde_json::to_writer_pretty(&mut *out, &report)?;
                writeln!(out)?;
            } else {
                writeln!(out, "{}", report)?;
            }
        }
        Command::Cat { file } => {
            let mut file = io.file(&file, None)?;
            out.write_all(file.read(false)?)?;
        }
        Command::Lines { file } => {
            let mut file = io.file(&file, None)?;
            for (number, line) in file.read_lines()?.iter().enumerate() {
                writeln!(out, "{:>6}  {}", number + 1, line)?;
            }
        }
        Command::Write { file, text, append } => {
            let mut file = io.file(&file, None)?;
            if append {
                file.append(&text)?;
            } else {
                file.write(&text)?;
            }
        }
        Command::Mkdir { folder, parents } => {
            io.folder(&folder, None)?.create_if_not_exists(parents)?;
        }
        Command::Ls { folder } => {
            let folder = existing_folder(io, &folder)?;
            for entry in folder.files_and_folders()? {
                match entry {
                    Entry::Folder(sub) => writeln!(out, "{}/", sub.name())?,
                    Entry::File(file) => writeln!(out, "{}", file.name())?,
                }
            }
        }
        Command::Cp {
            src,
            dst,
            replace,
            skip_ext,
        } => match io.resolve(&src, None)? {
            Entry::File(mut file) => {
                let copy = match io.resolve(&dst, None)? {
                    Entry::Folder(folder) => file.copy(&folder, replace)?,
                    Entry::File(target) => file.copy(&target, replace)?,
                };
                debug!("copied to {}", copy.path());
            }
            Entry::Folder(folder) => {
                let mut target = io.folder(&dst, None)?;
                target.create_if_not_exists(0)?;
                let mut options = CopyOptions::new().file_filter(|file, _| {
                    !skip_ext
                        .iter()
                        .any(|ext| ext.trim_start_matches('.').eq_ignore_ascii_case(file.extension()))
                });
                folder.copy(&target, &mut options)?;
            }
        },
        Command::Mv { path, new_name } => match io.resolve(&path, None)? {
            Entry::File(mut file) => file.rename(&new_name)?,
            Entry::Folder(mut folder) => folder.rename(&new_name)?,
        },
        Command::Rm { path, recursive } => match io.resolve(&path, None)? {
            Entry::File(file) => file.delete()?,
            Entry::Folder(folder) if recursive => folder.delete_recursive()?,
            Entry::Folder(folder) => folder.delete()?,
        },
        Command::Clear { folder } => {
            existing_folder(io, &folder)?.clear()?;
        }
        Command::Zip { folder, archive } => {
            let folder = existing_folder(io, &folder)?;
            let mut archive = io.file(&archive, None)?;
            let entries = io.zip_folder(&folder, &mut archive)?;
            writeln!(out, "{} entries written to {}", entries, archive.path())?;
        }
        Command::Unzip { archive, folder } => {
            let mut archive = io.file(&archive, None)?;
            let mut destination = io.folder(&folder, None)?;
            destination.create_if_not_exists(0)?;
            let files = io.extract_zip(&mut archive, &destination)?;
            writeln!(out, "{} files extracted to {}", files, destination.path())?;
        }
        Command::Prune {
            folder,
            older_than_days,
            max_count,
        } => {
            let cutoff = TimeDelta::try_days(older_than_days)
                .and_then(|age| Utc::now().checked_sub_signed(age))
                .ok_or_else(|| {
                    CliError::Usage(format!("--older-than-days {} is out of range", older_than_days))
                })?;
            let deleted = existing_folder(io, &folder)?
                .prune_files_older_than(cutoff, max_count.unwrap_or(usize::MAX))?;
            writeln!(out, "{} files deleted", deleted)?;
        }
        Command::Mime { file } => {
            writeln!(out, "{}", io.file(&file, None)?.mime_type())?;
        }
        Command::ChmodDecode { symbolic } => {
            writeln!(out, "{}", Permissions::from_symbolic(&symbolic)?)?;
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = load_config(&cli).and_then(|config| {
        let io = Io::new(config)?;
        let stdout = io::stdout();
        let mut out = stdout.lock();
        run(&io, cli.command, &mut out)?;
        out.flush()?;
        Ok(())
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn run_to_string(io: &Io, command: Command) -> CliResult<String> {
        let mut out = Vec::new();
        run(io, command, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_ls_lists_folders_first_with_slash() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("zdir")).unwrap();
        std::fs::write(dir.path().join("afile"), "x").unwrap();
        let io = Io::new(IoConfig::default()).unwrap();

        let listing = run_to_string(
            &io,
            Command::Ls {
                folder: dir.path().display().to_string(),
            },
        )
        .unwrap();
        assert_eq!(listing, "zdir/\nafile\n");
    }

    #[test]
    fn test_ls_on_file_is_usage_error() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("plain.txt");
        std::fs::write(&file, "x").unwrap();
        let io = Io::new(IoConfig::default()).unwrap();

        let err = run_to_string(
            &io,
            Command::Ls {
                folder: file.display().to_string(),
            },
        )
        .unwrap_err();
        assert!(matches!(err, CliError::Usage(_)));
    }

    #[test]
    fn test_cp_folder_skips_extensions() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir(&src).unwrap();
        std::fs::write(src.join("keep.txt"), "k").unwrap();
        std::fs::write(src.join("drop.LOG"), "d").unwrap();
        let io = Io::new(IoConfig::default()).unwrap();

        run_to_string(
            &io,
            Command::Cp {
                src: src.display().to_string(),
                dst: format!("{}/dst/", dir.path().display()),
                replace: false,
                skip_ext: vec![".log".to_string()],
            },
        )
        .unwrap();
        assert!(dir.path().join("dst/keep.txt").exists());
        assert!(!dir.path().join("dst/drop.LOG").exists());
    }

    #[test]
    fn test_prune_with_unrepresentable_age_is_usage_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("kept.txt"), "x").unwrap();
        let io = Io::new(IoConfig::default()).unwrap();

        for days in [i64::MAX, i64::MIN] {
            let err = run_to_string(
                &io,
                Command::Prune {
                    folder: dir.path().display().to_string(),
                    older_than_days: days,
                    max_count: None,
                },
            )
            .unwrap_err();
            assert!(matches!(err, CliError::Usage(_)), "{days}: {err}");
        }
        assert!(dir.path().join("kept.txt").exists());
    }

    #[test]
    fn test_lines_are_numbered() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("two.txt");
        std::fs::write(&file, "one\r\ntwo\n").unwrap();
        let io = Io::new(IoConfig::default()).unwrap();

        let text = run_to_string(
            &io,
            Command::Lines {
                file: file.display().to_string(),
            },
        )
        .unwrap();
        assert_eq!(text, "     1  one\n     2  two\n");
    }
}
