//! Loading the provider list from its text file.

use std::fs;
use std::path::Path;
use std::time::Duration;

use common_error::{SaqError, SaqResult};

/// One provider line from the providers file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEntry {
    /// Base URL of the provider.
    pub url: String,
    /// Poll interval override, if the line named one.
    pub interval: Option<Duration>,
}

const TEMPLATE: &str = "\
# SAQ provider endpoints
# One URL per line, optionally followed by a poll interval in seconds.
# Lines starting with # are comments.
# Example:
# http://localhost:8080
# http://localhost:8081 120
";

/// Load provider entries from `path`.
///
/// Creates the file (and its parent directory) with a commented template if
/// it does not exist yet, in which case the returned list is empty.
pub fn load_providers_file(path: &Path) -> SaqResult<Vec<ProviderEntry>> {
    if !path.exists() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, TEMPLATE)?;
        return Ok(Vec::new());
    }

    let text = fs::read_to_string(path)?;
    let mut entries = Vec::new();

    for (line_no, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut parts = line.split_whitespace();
        let Some(url) = parts.next() else {
            continue;
        };
        let interval = match parts.next() {
            Some(token) => {
                let secs: u64 = token.parse().map_err(|_| {
                    SaqError::value(format!(
                        "providers file line {}: interval '{token}' is not a number",
                        line_no + 1
                    ))
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };
        if let Some(extra) = parts.next() {
            return Err(SaqError::value(format!(
                "providers file line {}: unexpected token '{extra}'",
                line_no + 1
            )));
        }

        entries.push(ProviderEntry {
            url: url.to_string(),
            interval,
        });
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creates_template_on_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("providers.txt");

        let entries = load_providers_file(&path).unwrap();
        assert!(entries.is_empty());
        assert!(path.exists());

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("# SAQ provider endpoints"));
    }

    #[test]
    fn test_parses_urls_and_intervals() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("providers.txt");
        fs::write(
            &path,
            "# comment\n\nhttp://localhost:8080\nhttp://localhost:8081 120\n",
        )
        .unwrap();

        let entries = load_providers_file(&path).unwrap();
        assert_eq!(
            entries,
            vec![
                ProviderEntry {
                    url: "http://localhost:8080".to_string(),
                    interval: None,
                },
                ProviderEntry {
                    url: "http://localhost:8081".to_string(),
                    interval: Some(Duration::from_secs(120)),
                },
            ]
        );
    }

    #[test]
    fn test_rejects_bad_interval() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("providers.txt");
        fs::write(&path, "http://localhost:8080 soon\n").unwrap();

        let err = load_providers_file(&path).unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }
}
