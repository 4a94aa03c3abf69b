use std::sync::OnceLock;

use regex::Regex;
use reqwest::Url;
use tracing::debug;

use crate::utils;

pub const ROBOTS_PATH: &str = "/robots.txt";

// probed in order, the first one answering 200 is used
pub const SITEMAP_PATHS: &[&str] = &["/sitemap.xml", "/sitemap_index.xml", "/sitemap.php"];

pub const DEFAULT_SITEMAP_KEYWORDS: &[&str] = &["admin", "login", "panel"];

#[derive(Clone, Debug)]
pub struct DiscoveryOptions {
    pub robots: bool,
    pub sitemap: bool,
    pub sitemap_keywords: Vec<String>,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            robots: true,
            sitemap: true,
            sitemap_keywords: DEFAULT_SITEMAP_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
        }
    }
}

/// Paths harvested for one target.
#[derive(Clone, Debug, Default)]
pub struct Harvest {
    pub robots: Vec<String>,
    pub sitemap: Vec<String>,
    pub sitemap_source: Option<String>,
}

impl Harvest {
    pub fn paths(&self) -> Vec<String> {
        self.robots
            .iter()
            .chain(self.sitemap.iter())
            .cloned()
            .collect()
    }
}

/// Values of every `Disallow:` directive.
///
/// `*` truncates a pattern and a trailing `$` anchor is dropped. Entries that
/// end up empty or equal to `/` carry no candidate and are skipped.
pub fn parse_robots(body: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for line in body.lines() {
        let line = match line.split_once('#') {
            Some((before, _)) => before,
            None => line,
        };
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        if !key.trim().eq_ignore_ascii_case("disallow") {
            continue;
        }
        let mut value = value.trim();
        if let Some(idx) = value.find('*') {
            value = &value[..idx];
        }
        let value = value.trim_end_matches('$').trim();
        if value.is_empty() || value == "/" {
            continue;
        }
        if !out.iter().any(|p| p == value) {
            out.push(value.to_string());
        }
    }
    out
}

fn loc_regex() -> &'static Regex {
    static LOC_RE: OnceLock<Regex> = OnceLock::new();
    LOC_RE.get_or_init(|| Regex::new(r"(?is)<loc>\s*(.*?)\s*</loc>").expect("loc regex"))
}

fn loc_text(raw: &str) -> String {
    match raw
        .strip_prefix("<![CDATA[")
        .and_then(|inner| inner.strip_suffix("]]>"))
    {
        Some(inner) => inner.trim().to_string(),
        None => utils::decode_basic_entities(raw),
    }
}

/// Text of every `<loc>` element, for both url sets and sitemap indexes.
/// CDATA sections are unwrapped, other values are entity-decoded.
pub fn parse_sitemap_locs(body: &str) -> Vec<String> {
    loc_regex()
        .captures_iter(body)
        .map(|cap| loc_text(&cap[1]))
        .filter(|loc| !loc.is_empty())
        .collect()
}

/// Keeps locations mentioning any keyword, resolved against `base` into
/// absolute URLs. Scheme, host and port of the location are preserved.
pub fn filter_sitemap_urls(locs: &[String], keywords: &[String], base: &Url) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for loc in locs {
        let lower = loc.to_lowercase();
        if !keywords.iter().any(|k| lower.contains(k.as_str())) {
            continue;
        }
        let candidate = match base.join(loc) {
            Ok(parsed) => parsed.to_string(),
            Err(e) => {
                debug!(loc = %loc, error = %e, "skipping unparsable sitemap entry");
                continue;
            }
        };
        if !out.contains(&candidate) {
            out.push(candidate);
        }
    }
    out
}

async fn fetch_ok_body(
    client: &reqwest::Client,
    url: Url,
    user_agents: &[String],
) -> Option<String> {
    let user_agent = utils::random_user_agent(user_agents).to_string();
    let resp = match client
        .get(url.clone())
        .header(reqwest::header::USER_AGENT, user_agent)
        .send()
        .await
    {
        Ok(resp) => resp,
        Err(e) => {
            debug!(url = %url, error = %e, "discovery request failed");
            return None;
        }
    };
    if resp.status().as_u16() != 200 {
        debug!(url = %url, status = resp.status().as_u16(), "discovery source unavailable");
        return None;
    }
    resp.text().await.ok()
}

/// Fetches `robots.txt` and the first available sitemap for `base`.
/// Failures of either source simply yield nothing for it. `client` is
/// expected to follow redirects.
pub async fn harvest(
    client: &reqwest::Client,
    base: &Url,
    options: &DiscoveryOptions,
    user_agents: &[String],
) -> Harvest {
    let mut out = Harvest::default();

    if options.robots {
        if let Ok(url) = base.join(ROBOTS_PATH) {
            if let Some(body) = fetch_ok_body(client, url, user_agents).await {
                out.robots = parse_robots(&body);
            }
        }
    }

    if options.sitemap {
        for path in SITEMAP_PATHS {
            let Ok(url) = base.join(path) else {
                continue;
            };
            if let Some(body) = fetch_ok_body(client, url.clone(), user_agents).await {
                let locs = parse_sitemap_locs(&body);
                out.sitemap = filter_sitemap_urls(&locs, &options.sitemap_keywords, base);
                out.sitemap_source = Some(url.to_string());
                break;
            }
        }
    }

    debug!(
        base = %base,
        robots = out.robots.len(),
        sitemap = out.sitemap.len(),
        "harvest complete"
    );
    out
}
