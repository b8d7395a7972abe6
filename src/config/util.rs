//! Configuration utility functions.

use std::path::{Path, PathBuf};

/// Find config file by searching upward from `start`
///
/// Walks up parent directories until finding `config_name`.
/// Returns the path to the config file if found.
///
/// # Example
/// ```text
/// /home/user/shop/resources/public/  ← start
/// /home/user/shop/revpub.toml        ← found!
/// ```
pub fn find_config_file(config_name: &Path, start: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }

    let mut current = start;
    loop {
        let candidate = current.join(config_name);
        if candidate.is_file() {
            return Some(candidate);
        }

        match current.parent() {
            Some(parent) => current = parent,
            None => return None, // Reached filesystem root
        }
    }
}

/// Validate a destination host such as `cdn.example.com` or `localhost:8080`.
///
/// Uses the `url` crate so ports and IPv6 literals parse the same way a
/// browser would; anything carrying a path, query or credentials is rejected.
pub fn validate_host(host: &str) -> Result<(), String> {
    if host.trim().is_empty() {
        return Err("host is empty".into());
    }
    if host.contains("://") {
        return Err("expected a bare host, not a URL".into());
    }

    let parsed = url::Url::parse(&format!("https://{host}")).map_err(|e| e.to_string())?;
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err("no host component".into());
    }
    if parsed.path() != "/" || parsed.query().is_some() || parsed.fragment().is_some() {
        return Err("host must not contain a path, query or fragment".into());
    }
    if !parsed.username().is_empty() || parsed.password().is_some() {
        return Err("host must not contain credentials".into());
    }
    Ok(())
}

// ============================================================================
// tests
// ============================================================================
