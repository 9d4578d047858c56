use crate::error::{Error, Result};

use config::{Config, Environment, File};
use log::warn;
use reqwest::Url;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "canvas-context";
pub const DEFAULT_OUTPUT: &str = "context_final.json";
const TOKEN_PLACEHOLDER: &str = "YOUR_ACCESS_TOKEN";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub base_url: String,
    pub access_token: String,
    pub output: PathBuf,
    pub per_page: u32,
    pub timeout_secs: u64,
}

/// Values given on the command line; they win over file and environment.
#[derive(Debug, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub output: Option<PathBuf>,
    pub per_page: Option<u32>,
}

impl Settings {
    pub fn load(file: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        Self::load_with_env(file, Environment::with_prefix("CANVAS"), overrides)
    }

    // Environment values stay strings; numeric fields convert on deserialize.
    fn load_with_env(
        file: Option<&Path>,
        env: Environment,
        overrides: &Overrides,
    ) -> Result<Self> {
        let file = match file {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };
        let settings: Settings = Config::builder()
            .set_default("base_url", "")?
            .set_default("access_token", "")?
            .set_default("output", DEFAULT_OUTPUT)?
            .set_default("per_page", 100)?
            .set_default("timeout_secs", 30)?
            .add_source(file)
            .add_source(env)
            .set_override_option("base_url", overrides.base_url.clone())?
            .set_override_option(
                "output",
                overrides
                    .output
                    .as_ref()
                    .map(|path| path.to_string_lossy().into_owned()),
            )?
            .set_override_option("per_page", overrides.per_page.map(i64::from))?
            .build()?
            .try_deserialize()?;
        settings.validate()
    }

    /// Checks the credential and base URL before anything touches the network.
    pub fn validate(mut self) -> Result<Self> {
        let token = self.access_token.trim();
        if token.is_empty() || token.contains(TOKEN_PLACEHOLDER) {
            return Err(Error::Config(
                "no access token configured (set CANVAS_ACCESS_TOKEN or access_token in the settings file)"
                    .into(),
            ));
        }
        self.access_token = token.to_owned();

        let base_url = self.base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(Error::Config(
                "no base URL configured (set CANVAS_BASE_URL, base_url or --base-url)".into(),
            ));
        }
        let url = Url::parse(base_url)
            .map_err(|err| Error::Config(format!("invalid base URL {base_url:?}: {err}")))?;
        match url.scheme() {
            "https" => {}
            "http" => warn!("base URL {base_url} is not using https; the token is sent in clear text"),
            other => {
                return Err(Error::Config(format!(
                    "base URL {base_url:?} has unsupported scheme {other:?}"
                )))
            }
        }
        if url.host_str().is_none() {
            return Err(Error::Config(format!("base URL {base_url:?} has no host")));
        }
        self.base_url = base_url.to_owned();

        if self.per_page == 0 {
            return Err(Error::Config("per_page must be at least 1".into()));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::Map;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;
    use test_case::test_case;

    fn settings(base_url: &str, token: &str) -> Settings {
        Settings {
            base_url: base_url.into(),
            access_token: token.into(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            per_page: 100,
            timeout_secs: 30,
        }
    }

    #[test]
    fn trims_trailing_slash_and_token_whitespace() {
        let validated = settings("https://school.instructure.com/", " 1234~abcd \n")
            .validate()
            .unwrap();
        assert_eq!(validated.base_url, "https://school.instructure.com");
        assert_eq!(validated.access_token, "1234~abcd");
    }

    #[test_case("" ; "empty")]
    #[test_case("   " ; "blank")]
    #[test_case("YOUR_ACCESS_TOKEN" ; "placeholder")]
    #[test_case("paste-YOUR_ACCESS_TOKEN-here" ; "embedded placeholder")]
    fn rejects_missing_token(token: &str) {
        let err = settings("https://school.instructure.com", token)
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("access token")));
    }

    #[test_case("" ; "missing")]
    #[test_case("school.instructure.com" ; "no scheme")]
    #[test_case("ftp://school.instructure.com" ; "wrong scheme")]
    fn rejects_bad_base_url(base_url: &str) {
        let err = settings(base_url, "1234~abcd").validate().unwrap_err();
        assert!(matches!(err, Error::Config(_)), "{err:?}");
    }

    #[test]
    fn plain_http_is_allowed() {
        let validated = settings("http://localhost:3000", "1234~abcd")
            .validate()
            .unwrap();
        assert_eq!(validated.base_url, "http://localhost:3000");
    }

    #[test]
    fn rejects_zero_page_size() {
        let mut zero = settings("https://school.instructure.com", "1234~abcd");
        zero.per_page = 0;
        assert!(matches!(zero.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn loads_file_and_applies_overrides() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("canvas.toml");
        fs::write(
            &path,
            "base_url = \"https://school.instructure.com/\"\naccess_token = \"1234~abcd\"\nper_page = 25\n",
        )
        .unwrap();

        let overrides = Overrides {
            output: Some(PathBuf::from("out/report.json")),
            ..Overrides::default()
        };
        let loaded = Settings::load(Some(&path), &overrides).unwrap();

        assert_eq!(loaded.base_url, "https://school.instructure.com");
        assert_eq!(loaded.per_page, 25);
        assert_eq!(loaded.timeout_secs, 30);
        assert_eq!(loaded.output, PathBuf::from("out/report.json"));
    }

    #[test]
    fn environment_token_is_kept_verbatim() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("canvas.toml");
        fs::write(&path, "base_url = \"https://school.instructure.com\"\n").unwrap();

        let env = Environment::with_prefix("CANVAS").source(Some(Map::from([
            ("CANVAS_ACCESS_TOKEN".to_owned(), "000123".to_owned()),
            ("CANVAS_PER_PAGE".to_owned(), "50".to_owned()),
            ("CANVAS_TIMEOUT_SECS".to_owned(), "7".to_owned()),
        ])));
        let loaded = Settings::load_with_env(Some(&path), env, &Overrides::default()).unwrap();

        assert_eq!(loaded.access_token, "000123");
        assert_eq!(loaded.per_page, 50);
        assert_eq!(loaded.timeout_secs, 7);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempdir().unwrap();
        let err = Settings::load(Some(&dir.path().join("absent.toml")), &Overrides::default())
            .unwrap_err();
        assert!(matches!(err, Error::Settings(_)));
    }
}
