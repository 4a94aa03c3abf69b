use std::env;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub urls: Option<Vec<String>>,
    pub input_file: Option<String>,
    pub wordlist: Option<String>,
    pub extensions: Option<String>,
    pub dirsearch_compat: Option<bool>,
    pub rate: Option<u32>,
    #[serde(alias = "max_threads")]
    pub threads: Option<u32>,
    pub timeout: Option<u64>,
    pub proxy: Option<String>,
    pub header: Option<String>,
    pub follow_redirects: Option<bool>,
    pub match_status: Option<String>,
    pub user_agents: Option<Vec<String>>,
    pub user_agents_file: Option<String>,
    pub no_robots: Option<bool>,
    pub no_sitemap: Option<bool>,
    pub sitemap_keywords: Option<String>,
    pub output: Option<String>,
    pub output_format: Option<String>,
    pub no_color: Option<bool>,
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("USERPROFILE").map(PathBuf::from))
}

pub fn default_config_path() -> Option<PathBuf> {
    Some(home_dir()?.join(".panelfinder").join("config.yml"))
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        if let Some(home) = home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

pub fn expand_tilde_string(path: &str) -> String {
    expand_tilde(path).to_string_lossy().to_string()
}

pub fn parse_config(contents: &str) -> Result<ConfigFile, String> {
    if contents.trim().is_empty() {
        return Ok(ConfigFile::default());
    }
    serde_yaml::from_str::<ConfigFile>(contents).map_err(|e| e.to_string())
}

pub fn load_config(path: &PathBuf, allow_missing: bool) -> Result<ConfigFile, String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => parse_config(&contents)
            .map_err(|e| format!("failed to parse config '{}': {e}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && allow_missing => {
            Ok(ConfigFile::default())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(format!("config file not found '{}'", path.display()))
        }
        Err(e) => Err(format!("failed to read config '{}': {e}", path.display())),
    }
}

pub fn default_config_yaml() -> &'static str {
    r#"# panelfinder config
#
# Location (default):
#   ~/.panelfinder/config.yml

# Targets (choose at least one)
# urls:
#   - https://example.com/
# input_file: ./targets.txt

# Candidate paths (built-in admin paths when unset or missing)
# wordlist: ./admin_wordlist.txt
# extensions: php,asp
# dirsearch_compat: false

# Performance
rate: 30
threads: 15
timeout: 10

# HTTP (optional)
# proxy: http://127.0.0.1:8080
# header: "Key: Value"
follow_redirects: false
match_status: "200"
# user_agents:
#   - "Mozilla/5.0 (Windows NT 10.0; Win64; x64)"
# user_agents_file: ./agents.txt

# Discovery
no_robots: false
no_sitemap: false
sitemap_keywords: "admin,login,panel"

# Output (optional)
# output: ./findings.json
# output_format: json
no_color: false
"#
}

/// Writes the commented default config unless a file already exists.
/// Returns whether a file was written.
pub fn ensure_default_config_file(path: &PathBuf) -> Result<bool, String> {
    if path.exists() {
        return Ok(false);
    }
    let parent = path
        .parent()
        .ok_or_else(|| format!("invalid config path '{}'", path.display()))?;
    std::fs::create_dir_all(parent).map_err(|e| {
        format!(
            "failed to create config directory '{}': {e}",
            parent.display()
        )
    })?;
    std::fs::write(path, default_config_yaml())
        .map_err(|e| format!("failed to write config file '{}': {e}", path.display()))?;
    Ok(true)
}
