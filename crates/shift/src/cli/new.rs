use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Parser;
use console::style;

use shift_core::migration::{is_valid_name, MigrationFileName};
use shift_core::{Direction, ShiftConfig};

/// Create an empty up/down migration pair.
#[derive(Parser, Debug)]
pub struct NewCommand {
    /// Migration name, e.g. `create_users`.
    pub name: String,

    /// Target directory (defaults to the first configured directory).
    #[arg(short, long)]
    pub dir: Option<PathBuf>,
}

impl NewCommand {
    pub fn execute(self, config: &ShiftConfig) -> Result<()> {
        let dir = self
            .dir
            .clone()
            .or_else(|| config.migrations.dirs.first().cloned())
            .unwrap_or_else(|| PathBuf::from("migrations"));

        let paths = create_pair(&dir, &self.name, Utc::now())?;

        println!();
        for path in &paths {
            println!("  {} Created {}", style("✓").green(), style(path.display()).cyan());
        }
        println!();
        Ok(())
    }
}

/// Write `<timestamp>_<name>.up.sql` and `.down.sql` into `dir`.
///
/// Nothing is written if either file already exists.
pub fn create_pair(dir: &Path, name: &str, now: DateTime<Utc>) -> Result<[PathBuf; 2]> {
    if !is_valid_name(name) {
        anyhow::bail!(
            "Invalid migration name '{}': use letters, digits, '_' or '-'",
            name
        );
    }

    let version: i64 = now.format("%Y%m%d%H%M%S").to_string().parse()?;
    let paths = [Direction::Up, Direction::Down].map(|direction| {
        let file = MigrationFileName {
            version,
            name: name.to_string(),
            direction,
        };
        dir.join(file.file_name())
    });

    if let Some(existing) = paths.iter().find(|p| p.exists()) {
        anyhow::bail!("Migration file already exists: {}", existing.display());
    }
    if let Some(taken) = file_with_version(dir, version)? {
        anyhow::bail!(
            "Version {} is already used by {}; wait a second and retry",
            version,
            taken
        );
    }

    fs::create_dir_all(dir)?;
    for (path, direction) in paths.iter().zip([Direction::Up, Direction::Down]) {
        let content = format!("-- {} {} ({})\n\n", version, name, direction);
        fs::write(path, content)?;
    }

    Ok(paths)
}

/// First migration file in `dir` carrying `version`, under any name.
fn file_with_version(dir: &Path, version: i64) -> Result<Option<String>> {
    if !dir.exists() {
        return Ok(None);
    }
    for entry in fs::read_dir(dir)? {
        let file_name = entry?.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        if MigrationFileName::parse(file_name).is_some_and(|f| f.version == version) {
            return Ok(Some(file_name.to_string()));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 9).unwrap()
    }

    #[test]
    fn test_create_pair() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("migrations");

        let [up, down] = create_pair(&target, "create_users", now()).unwrap();
        assert_eq!(up, target.join("20240305143009_create_users.up.sql"));
        assert_eq!(down, target.join("20240305143009_create_users.down.sql"));
        assert!(up.exists());
        assert!(down.exists());

        // Both files parse back as migrations.
        let parsed = MigrationFileName::parse("20240305143009_create_users.down.sql").unwrap();
        assert_eq!(parsed.direction, Direction::Down);
    }

    #[test]
    fn test_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        create_pair(dir.path(), "create_users", now()).unwrap();
        fs::write(
            dir.path().join("20240305143009_create_users.up.sql"),
            "CREATE TABLE users();",
        )
        .unwrap();

        assert!(create_pair(dir.path(), "create_users", now()).is_err());
        let kept =
            fs::read_to_string(dir.path().join("20240305143009_create_users.up.sql")).unwrap();
        assert_eq!(kept, "CREATE TABLE users();");
    }

    #[test]
    fn test_refuses_version_taken_by_another_name() {
        let dir = TempDir::new().unwrap();
        create_pair(dir.path(), "create_users", now()).unwrap();

        let err = create_pair(dir.path(), "create_posts", now()).unwrap_err();
        assert!(err.to_string().contains("20240305143009"));
        assert!(!dir
            .path()
            .join("20240305143009_create_posts.up.sql")
            .exists());

        let later = now() + chrono::Duration::seconds(1);
        create_pair(dir.path(), "create_posts", later).unwrap();
    }

    #[test]
    fn test_rejects_invalid_name() {
        let dir = TempDir::new().unwrap();
        assert!(create_pair(dir.path(), "has space", now()).is_err());
        assert!(create_pair(dir.path(), "", now()).is_err());
        assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
    }
}
