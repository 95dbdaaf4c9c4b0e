use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::ops::RangeInclusive;
use std::path::PathBuf;

const BCRYPT_COSTS: RangeInclusive<u32> = 4..=31;

#[derive(Parser, Debug)]
#[command(name = "dayleaf", about = "Picture-of-the-day journal storage")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Path to data directory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Path to the SQLite database file
    #[arg(long)]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Create or upgrade the database schema
    Migrate,
    /// Print row counts per table
    Stats,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
    pub pool_size: u32,
    pub busy_timeout_ms: u64,
}

/// Read by `password::hash_password`.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub bcrypt_cost: u32,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub filter: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            pool_size: 8,
            busy_timeout_ms: 5000,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl Config {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let data_dir = Self::data_dir(cli)?;
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| data_dir.join("config.toml"));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        // CLI overrides
        if let Some(ref path) = cli.database {
            config.database.path = Some(path.clone());
        }

        // Resolve paths relative to data dir
        if config.database.path.is_none() {
            config.database.path = Some(data_dir.join("dayleaf.db"));
        }

        if config.database.pool_size == 0 {
            anyhow::bail!("database.pool_size must be at least 1");
        }

        if !BCRYPT_COSTS.contains(&config.auth.bcrypt_cost) {
            anyhow::bail!(
                "auth.bcrypt_cost must be between {} and {}",
                BCRYPT_COSTS.start(),
                BCRYPT_COSTS.end()
            );
        }

        Ok(config)
    }

    pub fn data_dir(cli: &Cli) -> anyhow::Result<PathBuf> {
        match cli.data_dir.clone() {
            Some(dir) => Ok(dir),
            None => dirs::home_dir()
                .map(|home| home.join(".dayleaf"))
                .ok_or_else(|| anyhow::anyhow!("Could not determine home directory")),
        }
    }

    /// Database file path. Always set once `load` has returned.
    pub fn db_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from("dayleaf.db"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(data_dir: PathBuf) -> Cli {
        Cli {
            config: None,
            data_dir: Some(data_dir),
            database: None,
            command: None,
        }
    }

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert!(config.database.path.is_none());
        assert_eq!(config.database.pool_size, 8);
        assert_eq!(config.database.busy_timeout_ms, 5000);
        assert_eq!(config.auth.bcrypt_cost, bcrypt::DEFAULT_COST);
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn data_dir_uses_cli_override() {
        let cli = cli(PathBuf::from("/tmp/test-dayleaf"));
        assert_eq!(
            Config::data_dir(&cli).unwrap(),
            PathBuf::from("/tmp/test-dayleaf")
        );
    }

    #[test]
    fn load_with_no_config_file_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::load(&cli(tmp.path().to_path_buf())).unwrap();
        assert_eq!(config.db_path(), tmp.path().join("dayleaf.db"));
        assert_eq!(config.database.pool_size, 8);
    }

    #[test]
    fn load_reads_toml_file() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(
            &config_path,
            r#"
[database]
path = "/var/lib/dayleaf/journal.db"
pool_size = 2

[auth]
bcrypt_cost = 10

[logging]
filter = "dayleaf=debug"
"#,
        )
        .unwrap();

        let mut cli = cli(tmp.path().to_path_buf());
        cli.config = Some(config_path);
        let config = Config::load(&cli).unwrap();
        assert_eq!(
            config.db_path(),
            PathBuf::from("/var/lib/dayleaf/journal.db")
        );
        assert_eq!(config.database.pool_size, 2);
        assert_eq!(config.database.busy_timeout_ms, 5000);
        assert_eq!(config.auth.bcrypt_cost, 10);
        assert_eq!(config.logging.filter, "dayleaf=debug");
    }

    #[test]
    fn cli_database_beats_toml_value() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(&config_path, "[database]\npath = \"/from/file.db\"\n").unwrap();

        let mut cli = cli(tmp.path().to_path_buf());
        cli.config = Some(config_path);
        cli.database = Some(PathBuf::from("/from/cli.db"));
        let config = Config::load(&cli).unwrap();
        assert_eq!(config.db_path(), PathBuf::from("/from/cli.db"));
    }

    #[test]
    fn zero_pool_size_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("config.toml"), "[database]\npool_size = 0\n").unwrap();
        assert!(Config::load(&cli(tmp.path().to_path_buf())).is_err());
    }

    #[test]
    fn out_of_range_bcrypt_cost_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("config.toml"), "[auth]\nbcrypt_cost = 2\n").unwrap();
        let err = Config::load(&cli(tmp.path().to_path_buf())).unwrap_err();
        assert!(err.to_string().contains("bcrypt_cost"));
    }

    #[test]
    fn configured_cost_reaches_password_hash() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("config.toml"), "[auth]\nbcrypt_cost = 4\n").unwrap();
        let config = Config::load(&cli(tmp.path().to_path_buf())).unwrap();

        let hash = crate::password::hash_password("pw", &config.auth).unwrap();
        assert!(hash.starts_with("$2b$04$"));
    }

    #[test]
    fn cli_parses_subcommand() {
        let cli = Cli::try_parse_from(["dayleaf", "--data-dir", "/tmp/x", "stats"]).unwrap();
        assert_eq!(cli.command, Some(Command::Stats));
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/x")));
    }
}
