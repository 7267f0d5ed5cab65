//! Version comparison between the CLI and a parts file

use semver::Version;

/// Compare the CLI version against the parts file's `min_cli_version`.
/// Returns a warning message if the CLI is older than the parts file expects
pub fn check_compatibility(
    cli_version: &str,
    min_cli_version: &str,
    upgrade_command: &str,
) -> Option<String> {
    let cli_ver = match parse_version(cli_version) {
        Some(v) => v,
        None => return None, // Can't compare, skip warning
    };

    let required_ver = match parse_version(min_cli_version) {
        Some(v) => v,
        None => return None,
    };

    if cli_ver < required_ver {
        Some(format!(
            "Warning: These parts were written for CLI version {} or newer.\n\
             You are running version {}.\n\
             Consider updating: {}",
            min_cli_version, cli_version, upgrade_command
        ))
    } else {
        None
    }
}

/// Parse version string, tolerating a leading 'v'
fn parse_version(version_str: &str) -> Option<Version> {
    let cleaned = version_str.strip_prefix('v').unwrap_or(version_str);
    Version::parse(cleaned).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_older_than_parts_file() {
        let warning = check_compatibility("0.1.0", "0.2.0", "cargo install parts-tools --force");
        assert!(warning.is_some());
        assert!(warning.unwrap().contains("0.2.0"));
    }

    #[test]
    fn test_cli_same_or_newer() {
        assert!(check_compatibility("0.1.0", "0.1.0", "upgrade").is_none());
        assert!(check_compatibility("0.2.0", "v0.1.0", "upgrade").is_none());
    }

    #[test]
    fn test_invalid_versions() {
        // Should return None (no warning) for invalid versions
        assert!(check_compatibility("invalid", "0.1.0", "upgrade").is_none());
        assert!(check_compatibility("0.1.0", "latest", "upgrade").is_none());
    }
}
