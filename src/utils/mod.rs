use std::collections::HashSet;
use std::str::FromStr;
use std::sync::OnceLock;

use rand::seq::SliceRandom;
use regex::Regex;
use reqwest::header::{HeaderName, HeaderValue};

pub const FALLBACK_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:95.0) Gecko/20100101 Firefox/95.0";

pub const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64)",
    "Mozilla/5.0 (Linux; Android 10; SM-A505FN)",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7)",
];

pub const NO_TITLE: &str = "No Title";

pub fn default_user_agents() -> Vec<String> {
    DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect()
}

// picks a user agent for a single request; the rng never lives across an await.
pub fn random_user_agent(pool: &[String]) -> &str {
    pool.choose(&mut rand::thread_rng())
        .map(String::as_str)
        .unwrap_or(FALLBACK_USER_AGENT)
}

pub fn parse_u16_set_csv(value: &str) -> Result<HashSet<u16>, String> {
    let raw = value.trim();
    if raw.is_empty() {
        return Err("list is empty".to_string());
    }
    let mut out = HashSet::new();
    for part in raw.split(',') {
        let item = part.trim();
        if item.is_empty() {
            continue;
        }
        let code: u16 = item
            .parse()
            .map_err(|_| format!("invalid status code '{item}'"))?;
        if !(100..=599).contains(&code) {
            return Err(format!("status code out of range '{item}'"));
        }
        out.insert(code);
    }
    if out.is_empty() {
        return Err("list is empty".to_string());
    }
    Ok(out)
}

pub fn parse_extensions_csv(value: &str) -> Result<Vec<String>, String> {
    let raw = value.trim();
    if raw.is_empty() {
        return Err("extensions list is empty".to_string());
    }
    let mut out: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for part in raw.split(',') {
        let cleaned = part.trim().trim_start_matches('.');
        if cleaned.is_empty() {
            continue;
        }
        if seen.insert(cleaned.to_ascii_lowercase()) {
            out.push(cleaned.to_string());
        }
    }
    if out.is_empty() {
        return Err("extensions list is empty".to_string());
    }
    Ok(out)
}

/// Lowercased, deduplicated keyword list.
pub fn parse_keywords_csv(value: &str) -> Result<Vec<String>, String> {
    let mut out: Vec<String> = Vec::new();
    for part in value.split(',') {
        let item = part.trim().to_lowercase();
        if !item.is_empty() && !out.contains(&item) {
            out.push(item);
        }
    }
    if out.is_empty() {
        return Err("keyword list is empty".to_string());
    }
    Ok(out)
}

/// Parses a `Key: Value` header line.
pub fn parse_header_line(value: &str) -> Result<(HeaderName, HeaderValue), String> {
    let (key, val) = value
        .split_once(':')
        .ok_or_else(|| "expected format 'Key: Value'".to_string())?;
    let name = HeaderName::from_str(key.trim())
        .map_err(|_| format!("invalid header name '{}'", key.trim()))?;
    let value = HeaderValue::from_str(val.trim())
        .map_err(|_| format!("invalid header value for '{}'", key.trim()))?;
    Ok((name, value))
}

/// Prepends `http://` to bare hosts.
pub fn normalize_target(url: &str) -> String {
    let trimmed = url.trim();
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    }
}

fn title_regex() -> &'static Regex {
    static TITLE_RE: OnceLock<Regex> = OnceLock::new();
    TITLE_RE.get_or_init(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("title regex"))
}

/// Text of the first `<title>` element, or `No Title`.
pub fn extract_title(html: &str) -> String {
    let raw = match title_regex().captures(html) {
        Some(cap) => cap[1].to_string(),
        None => return NO_TITLE.to_string(),
    };
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return NO_TITLE.to_string();
    }
    decode_basic_entities(&collapsed)
}

pub(crate) fn decode_basic_entities(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_u16_set_csv_parses_and_dedupes() {
        let set = parse_u16_set_csv("200, 401,200").unwrap();
        assert!(set.contains(&200));
        assert!(set.contains(&401));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn parse_u16_set_csv_rejects_garbage_and_out_of_range() {
        assert!(parse_u16_set_csv("").is_err());
        assert!(parse_u16_set_csv("ok").is_err());
        assert!(parse_u16_set_csv("200,999").is_err());
    }

    #[test]
    fn parse_extensions_csv_strips_dots_and_dedupes() {
        let out = parse_extensions_csv("php,.asp,PHP").unwrap();
        assert_eq!(out, vec!["php".to_string(), "asp".to_string()]);
    }

    #[test]
    fn parse_keywords_lowercases() {
        let out = parse_keywords_csv("Admin, login,ADMIN,").unwrap();
        assert_eq!(out, vec!["admin".to_string(), "login".to_string()]);
        assert!(parse_keywords_csv(" , ").is_err());
    }

    #[test]
    fn header_line_requires_colon() {
        let (k, v) = parse_header_line("X-Test:  yes ").unwrap();
        assert_eq!(k.as_str(), "x-test");
        assert_eq!(v.to_str().unwrap(), "yes");
        assert!(parse_header_line("no-colon").is_err());
        assert!(parse_header_line("bad header: x").is_err());
    }

    #[test]
    fn normalize_target_adds_scheme_only_when_missing() {
        assert_eq!(normalize_target("example.com"), "http://example.com");
        assert_eq!(normalize_target(" https://a.tld/x "), "https://a.tld/x");
        assert_eq!(normalize_target("HTTP://a.tld"), "HTTP://a.tld");
    }

    #[test]
    fn extract_title_handles_attributes_and_whitespace() {
        let html = "<html><head><TITLE lang=\"en\">\n  Admin &amp; Login\n</TITLE></head></html>";
        assert_eq!(extract_title(html), "Admin & Login");
    }

    #[test]
    fn extract_title_falls_back() {
        assert_eq!(extract_title("<html><body>hi</body></html>"), NO_TITLE);
        assert_eq!(extract_title("<title>   </title>"), NO_TITLE);
    }

    #[test]
    fn random_user_agent_comes_from_pool() {
        let pool = default_user_agents();
        for _ in 0..20 {
            let ua = random_user_agent(&pool);
            assert!(pool.iter().any(|p| p == ua));
        }
        assert_eq!(random_user_agent(&[]), FALLBACK_USER_AGENT);
    }
}
