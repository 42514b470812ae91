use failure::{Error, ResultExt};
use serde_derive::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// The environment variable which overrides `server.port`.
pub const PORT_VAR: &str = "PORT";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: Server,
    pub github: GitHubConfig,
    pub database: Database,
}

impl Config {
    /// Load a config from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config, Error> {
        let path = path.as_ref();
        debug!("Reading config from {}", path.display());

        let raw = fs::read_to_string(path)
            .with_context(|_| format!("Unable to read {}", path.display()))?;

        Config::from_toml(&raw)
    }

    pub fn from_toml(src: &str) -> Result<Config, Error> {
        let cfg = toml::from_str(src).context("Invalid config")?;
        Ok(cfg)
    }

    /// The config we'd use if nothing else was specified.
    pub fn example() -> Config {
        Config::default()
    }

    pub fn as_toml(&self) -> String {
        match toml::to_string_pretty(self) {
            Ok(s) => s,
            Err(_) => unreachable!("The config is always serializable"),
        }
    }

    /// Let the process environment override parts of the config.
    pub fn apply_env(&mut self) -> Result<(), Error> {
        if let Ok(port) = env::var(PORT_VAR) {
            self.server.port = parse_port(&port)?;
        }

        Ok(())
    }
}

fn parse_port(raw: &str) -> Result<u16, Error> {
    let port = raw
        .trim()
        .parse::<u16>()
        .with_context(|_| format!("\"{}\" isn't a valid port", raw))?;
    Ok(port)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Server {
    /// The port to listen on.
    pub port: u16,
}

impl Server {
    pub const DEFAULT_PORT: u16 = 5000;
}

impl Default for Server {
    fn default() -> Server {
        Server {
            port: Server::DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[serde(rename_all = "kebab-case")]
pub struct GitHubConfig {
    /// The root of the GitHub REST API.
    pub api_url: String,
    /// The `User-Agent` sent with every request (GitHub rejects requests
    /// without one).
    pub agent: String,
}

impl GitHubConfig {
    pub const DEFAULT_API_URL: &'static str = "https://api.github.com";
    pub const DEFAULT_AGENT: &'static str = "repo-search";
}

impl Default for GitHubConfig {
    fn default() -> GitHubConfig {
        GitHubConfig {
            api_url: GitHubConfig::DEFAULT_API_URL.into(),
            agent: GitHubConfig::DEFAULT_AGENT.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Database {
    /// Where the SQLite database lives. Use `:memory:` for a throwaway
    /// in-memory database.
    pub path: PathBuf,
}

impl Database {
    pub const IN_MEMORY: &'static str = ":memory:";

    pub fn is_in_memory(&self) -> bool {
        self.path == Path::new(Database::IN_MEMORY)
    }
}

impl Default for Database {
    fn default() -> Database {
        Database {
            path: PathBuf::from("repos.sqlite3"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn example_config_round_trips() {
        let example = Config::example();

        let got = Config::from_toml(&example.as_toml()).unwrap();

        assert_eq!(got, example);
    }

    #[test]
    fn missing_sections_use_defaults() {
        let src = r#"
            [server]
            port = 8080
        "#;

        let got = Config::from_toml(src).unwrap();

        assert_eq!(got.server.port, 8080);
        assert_eq!(got.github, GitHubConfig::default());
        assert_eq!(got.database, Database::default());
    }

    #[test]
    fn github_section_is_kebab_case() {
        let src = r#"
            [github]
            api-url = "http://localhost:1234"
        "#;

        let got = Config::from_toml(src).unwrap();

        assert_eq!(got.github.api_url, "http://localhost:1234");
        assert_eq!(got.github.agent, GitHubConfig::DEFAULT_AGENT);
    }

    #[test]
    fn load_from_a_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.toml");
        let mut f = fs::File::create(&path).unwrap();
        writeln!(f, "[database]\npath = \":memory:\"").unwrap();

        let got = Config::from_file(&path).unwrap();

        assert!(got.database.is_in_memory());
    }

    #[test]
    fn reading_a_missing_file_fails() {
        let temp = tempfile::tempdir().unwrap();

        let got = Config::from_file(temp.path().join("nope.toml"));

        assert!(got.is_err());
    }

    #[test]
    fn ports_are_parsed() {
        assert_eq!(parse_port(" 8080 ").unwrap(), 8080);
        assert!(parse_port("eighty").is_err());
        assert!(parse_port("70000").is_err());
    }
}
