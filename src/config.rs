use anyhow::{bail, Context, Result};
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use toml::Value;
use url::Url;

const DEFAULT_SECRETS_PATH: &str = "/etc/rjn-forwarder/secrets.toml";

pub fn secrets_path() -> PathBuf {
    if let Ok(path) = env::var("RJN_SECRETS_FILE") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    PathBuf::from(DEFAULT_SECRETS_PATH)
}

/// Credential store backed by a TOML secrets file.
///
/// Lookups are `[service] item`; an environment variable named
/// `RJN_<SERVICE>_<ITEM>` (uppercased, non-alphanumerics mapped to `_`)
/// always wins over the file, which keeps containerized deployments
/// file-free.
#[derive(Debug, Clone)]
pub struct Secrets {
    document: Value,
}

impl Secrets {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read secrets file {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("failed to parse secrets file {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let document: Value = raw.parse()?;
        Ok(Self { document })
    }

    pub fn get(&self, service: &str, item: &str) -> Option<String> {
        if let Some(value) = env_override(service, item) {
            return Some(value);
        }
        self.document
            .get(service)
            .and_then(|table| table.get(item))
            .and_then(Value::as_str)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    /// Fail-fast accessor for credentials the process cannot run without.
    pub fn get_required(&self, service: &str, item: &str) -> Result<String> {
        match self.get(service, item) {
            Some(value) => Ok(value),
            None => bail!("missing required secret [{service}] {item}"),
        }
    }

    /// Every string value in the document that parses as an absolute
    /// http(s) URL, deduplicated.
    pub fn find_urls(&self) -> BTreeSet<String> {
        let mut urls = BTreeSet::new();
        collect_urls(&self.document, &mut urls);
        urls
    }
}

fn env_override(service: &str, item: &str) -> Option<String> {
    let key = format!("RJN_{}_{}", sanitize(service), sanitize(item));
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

fn collect_urls(value: &Value, out: &mut BTreeSet<String>) {
    match value {
        Value::String(raw) => {
            if let Ok(url) = Url::parse(raw) {
                if matches!(url.scheme(), "http" | "https") {
                    out.insert(raw.trim().to_string());
                }
            }
        }
        Value::Table(table) => {
            for entry in table.values() {
                collect_urls(entry, out);
            }
        }
        Value::Array(items) => {
            for entry in items {
                collect_urls(entry, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[rjn]
url = "https://clarity.example.com/api"
client_id = "cid"

[eds]
url = "https://eds.internal:43084"
graphics = ["https://eds.internal:43084/graphics"]
note = "not a url"
user = "admin"
"#;

    #[test]
    fn lookup_reads_service_tables() {
        let secrets = Secrets::parse(SAMPLE).unwrap();
        assert_eq!(secrets.get("rjn", "client_id").as_deref(), Some("cid"));
        assert_eq!(secrets.get("rjn", "missing"), None);
        assert_eq!(secrets.get("nope", "url"), None);
    }

    #[test]
    fn required_lookup_fails_on_missing_items() {
        let secrets = Secrets::parse(SAMPLE).unwrap();
        let err = secrets.get_required("rjn", "password").unwrap_err();
        assert!(err.to_string().contains("[rjn] password"));
    }

    #[test]
    fn environment_overrides_take_precedence() {
        let secrets = Secrets::parse("[clarity]\npassword = \"from-file\"\n").unwrap();
        assert_eq!(
            secrets.get("clarity", "password").as_deref(),
            Some("from-file")
        );
        env::set_var("RJN_CLARITY_PASSWORD", "from-env");
        assert_eq!(
            secrets.get("clarity", "password").as_deref(),
            Some("from-env")
        );
        env::remove_var("RJN_CLARITY_PASSWORD");
    }

    #[test]
    fn unprefixed_environment_variables_are_ignored() {
        let secrets = Secrets::parse("[clarity]\ntoken = \"from-file\"\n").unwrap();
        env::set_var("CLARITY_TOKEN", "stray");
        assert_eq!(secrets.get("clarity", "token").as_deref(), Some("from-file"));
        env::remove_var("CLARITY_TOKEN");
    }

    #[test]
    fn find_urls_collects_only_absolute_http_urls() {
        let secrets = Secrets::parse(SAMPLE).unwrap();
        let urls = secrets.find_urls();
        assert!(urls.contains("https://clarity.example.com/api"));
        assert!(urls.contains("https://eds.internal:43084"));
        assert!(urls.contains("https://eds.internal:43084/graphics"));
        assert!(!urls.iter().any(|url| url.contains("not a url")));
        assert_eq!(urls.len(), 3);
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.toml");
        fs::write(&path, SAMPLE).unwrap();
        let secrets = Secrets::load(&path).unwrap();
        assert_eq!(secrets.get("eds", "user").as_deref(), Some("admin"));
    }

    #[test]
    fn load_reports_the_missing_path() {
        let err = Secrets::load(Path::new("/nonexistent/secrets.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/secrets.toml"));
    }
}
