//! The merge workflow: locate the value file, merge, back up, write.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Local};
use config_merge::XmlMerger;
use tracing::{debug, info};

use crate::cli::Cli;

/// Timestamp appended to the value file name to form its backup name.
const BACKUP_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Runs one merge as described by the command line.
pub fn run(cli: &Cli) -> anyhow::Result<()> {
    let Some(value_path) = resolve_value_file(&cli.mark_file, &cli.value_file_name) else {
        return Ok(());
    };

    let value_xml = fs::read_to_string(&value_path)
        .with_context(|| format!("failed to read value file {}", value_path.display()))?;
    let mark_xml = fs::read_to_string(&cli.mark_file)
        .with_context(|| format!("failed to read marked file {}", cli.mark_file.display()))?;

    let merged = XmlMerger::new()
        .pretty_print(cli.pretty)
        .merge_str(&value_xml, &mark_xml)
        .with_context(|| {
            format!(
                "failed to merge {} into {}",
                value_path.display(),
                cli.mark_file.display()
            )
        })?;

    if cli.report {
        merged
            .log
            .write_report(&mut io::stderr().lock())
            .context("failed to write merge report")?;
    }
    info!("{}", merged.log);

    if cli.dry_run {
        let mut stdout = io::stdout().lock();
        stdout.write_all(merged.xml.as_bytes())?;
        stdout.flush()?;
        return Ok(());
    }

    if let Some(output) = &cli.output {
        fs::write(output, &merged.xml)
            .with_context(|| format!("failed to write {}", output.display()))?;
        info!(path = %output.display(), "merged document written");
        return Ok(());
    }

    if !cli.no_backup {
        let backup = backup_path(&value_path, Local::now());
        backup_to(&value_path, &backup)?;
        info!(path = %backup.display(), "value file backed up");
    }
    fs::write(&value_path, &merged.xml)
        .with_context(|| format!("failed to write {}", value_path.display()))?;
    info!(path = %value_path.display(), "value file replaced");
    Ok(())
}

/// Returns the value file that sits next to `mark_file`, if there is work to do.
///
/// Nothing is merged when the marked file is itself the value file, or when
/// no value file exists yet.
pub fn resolve_value_file(mark_file: &Path, value_file_name: &str) -> Option<PathBuf> {
    let is_value_file = mark_file
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.eq_ignore_ascii_case(value_file_name));
    if is_value_file {
        info!(path = %mark_file.display(), "marked file is the value file, nothing to merge");
        return None;
    }

    let dir = mark_file.parent().unwrap_or_else(|| Path::new(""));
    let value_path = dir.join(value_file_name);
    if !value_path.is_file() {
        info!(path = %value_path.display(), "no value file, nothing to merge");
        return None;
    }
    debug!(path = %value_path.display(), "value file found");
    Some(value_path)
}

/// Names the backup of `value_path` taken at `now`.
pub fn backup_path(value_path: &Path, now: DateTime<Local>) -> PathBuf {
    let mut name = value_path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".");
    name.push(now.format(BACKUP_STAMP_FORMAT).to_string());
    value_path.with_file_name(name)
}

/// Moves `value_path` to `backup`, replacing an older file of that name.
pub fn backup_to(value_path: &Path, backup: &Path) -> anyhow::Result<()> {
    if backup.exists() {
        fs::remove_file(backup)
            .with_context(|| format!("failed to remove old backup {}", backup.display()))?;
    }
    fs::rename(value_path, backup).with_context(|| {
        format!(
            "failed to back up {} to {}",
            value_path.display(),
            backup.display()
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use clap::Parser;
    use tempfile::TempDir;

    const VALUE: &str = r#"<configuration>
  <appSettings>
    <add key="Mode" value="live" />
  </appSettings>
</configuration>
"#;

    const MARK: &str = r#"<configuration>
  <appSettings>
    <?merge by="key"?>
    <add key="Mode" value="debug" />
    <add key="Extra" value="1" />
  </appSettings>
</configuration>
"#;

    const MERGED: &str = r#"<configuration>
  <appSettings>
    <add key="Mode" value="live" />
    <add key="Extra" value="1" />
  </appSettings>
</configuration>
"#;

    fn setup() -> (TempDir, PathBuf, PathBuf) {
        let dir = TempDir::new().unwrap();
        let value = dir.path().join("Web.config");
        let mark = dir.path().join("Web.Release.config");
        fs::write(&value, VALUE).unwrap();
        fs::write(&mark, MARK).unwrap();
        (dir, value, mark)
    }

    fn cli(args: &[&str], mark: &Path) -> Cli {
        let mut argv = vec!["cmerge"];
        argv.extend_from_slice(args);
        argv.push(mark.to_str().unwrap());
        Cli::try_parse_from(argv).unwrap()
    }

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_merge_replaces_value_file_and_keeps_backup() {
        let (dir, value, mark) = setup();

        run(&cli(&[], &mark)).unwrap();

        assert_eq!(fs::read_to_string(&value).unwrap(), MERGED);
        let backups: Vec<String> = file_names(dir.path())
            .into_iter()
            .filter(|name| name.starts_with("Web.config."))
            .collect();
        assert_eq!(backups.len(), 1);
        assert_eq!(
            fs::read_to_string(dir.path().join(&backups[0])).unwrap(),
            VALUE
        );
        assert_eq!(fs::read_to_string(&mark).unwrap(), MARK);
    }

    #[test]
    fn test_no_backup() {
        let (dir, value, mark) = setup();

        run(&cli(&["--no-backup"], &mark)).unwrap();

        assert_eq!(fs::read_to_string(&value).unwrap(), MERGED);
        assert_eq!(file_names(dir.path()), vec!["Web.Release.config", "Web.config"]);
    }

    #[test]
    fn test_output_leaves_value_file_alone() {
        let (dir, value, mark) = setup();
        let out = dir.path().join("merged.xml");

        run(&cli(&["-o", out.to_str().unwrap()], &mark)).unwrap();

        assert_eq!(fs::read_to_string(&out).unwrap(), MERGED);
        assert_eq!(fs::read_to_string(&value).unwrap(), VALUE);
        assert_eq!(file_names(dir.path()).len(), 3);
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let (dir, value, mark) = setup();

        run(&cli(&["--dry-run"], &mark)).unwrap();

        assert_eq!(fs::read_to_string(&value).unwrap(), VALUE);
        assert_eq!(file_names(dir.path()).len(), 2);
    }

    #[test]
    fn test_value_file_as_mark_is_noop() {
        let (_dir, value, _mark) = setup();
        let upper = value.with_file_name("WEB.CONFIG");

        assert!(resolve_value_file(&upper, "Web.config").is_none());
        run(&cli(&[], &value)).unwrap();
        assert_eq!(fs::read_to_string(&value).unwrap(), VALUE);
    }

    #[test]
    fn test_missing_value_file_is_noop() {
        let (dir, value, mark) = setup();
        fs::remove_file(&value).unwrap();

        run(&cli(&[], &mark)).unwrap();
        assert_eq!(file_names(dir.path()), vec!["Web.Release.config"]);
    }

    #[test]
    fn test_custom_value_file_name() {
        let (dir, _value, mark) = setup();
        let app = dir.path().join("App.config");
        fs::write(&app, VALUE).unwrap();

        run(&cli(&["--value-file-name", "App.config", "--no-backup"], &mark)).unwrap();
        assert_eq!(fs::read_to_string(&app).unwrap(), MERGED);
    }

    #[test]
    fn test_malformed_mark_changes_nothing() {
        let (dir, value, mark) = setup();
        fs::write(&mark, "<configuration><appSettings></configuration>").unwrap();

        let err = run(&cli(&[], &mark)).unwrap_err();
        assert!(format!("{:#}", err).contains("malformed XML"));
        assert_eq!(fs::read_to_string(&value).unwrap(), VALUE);
        assert_eq!(file_names(dir.path()).len(), 2);
    }

    #[test]
    fn test_backup_path_format() {
        let now = Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).single().unwrap();
        let path = backup_path(Path::new("site/Web.config"), now);
        assert_eq!(path, PathBuf::from("site/Web.config.20240305_140709"));
    }

    #[test]
    fn test_backup_replaces_older_backup() {
        let (dir, value, _mark) = setup();
        let backup = dir.path().join("Web.config.20240305_140709");
        fs::write(&backup, "stale").unwrap();

        backup_to(&value, &backup).unwrap();

        assert!(!value.exists());
        assert_eq!(fs::read_to_string(&backup).unwrap(), VALUE);
    }
}
