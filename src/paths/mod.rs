use itertools::Itertools;

/// Built-in candidates used when no wordlist is given or the wordlist is missing.
pub const DEFAULT_PATHS: &[&str] = &[
    "/admin",
    "/wp-admin",
    "/administrator",
    "/panel",
    "/login",
    "/admin.php",
    "/admin/login",
    "/adminpanel",
    "/user/login",
    "/backend",
    "/cms",
    "/manager",
    "/admin_area",
    "/controlpanel",
    "/admincp",
    "/admincenter",
    "/secret-admin",
    "/myadmin",
    "/system",
    "/console",
];

#[derive(Clone, Debug)]
pub enum WordlistSource {
    Default,
    FilePath(String),
    Inline(Vec<String>),
}

/// Where the candidate wordlist actually came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WordlistOrigin {
    Default,
    File(String),
    Inline,
    // the requested file was not found
    DefaultFallback(String),
}

pub fn default_paths() -> Vec<String> {
    DEFAULT_PATHS.iter().map(|p| p.to_string()).collect()
}

/// Trimmed, non-blank lines.
pub fn clean_lines<I, S>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .map(|l| l.as_ref().trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}

pub fn apply_extensions(
    words: Vec<String>,
    extensions: &[String],
    dirsearch_compat: bool,
) -> Vec<String> {
    if extensions.is_empty() {
        return words;
    }
    let mut out: Vec<String> = Vec::with_capacity(words.len() * (extensions.len() + 1));
    for word in words {
        if word.contains("%EXT%") {
            if dirsearch_compat {
                out.extend(extensions.iter().map(|ext| word.replace("%EXT%", ext)));
            } else {
                out.push(word);
            }
            continue;
        }
        if dirsearch_compat || word.ends_with('/') {
            out.push(word);
            continue;
        }
        let variants: Vec<String> = extensions.iter().map(|ext| format!("{word}.{ext}")).collect();
        out.push(word);
        out.extend(variants);
    }
    out
}

/// Wordlist entries followed by harvested ones, blanks and exact duplicates
/// removed, first occurrence wins.
pub fn merge_candidates(wordlist: &[String], harvested: &[String]) -> Vec<String> {
    wordlist
        .iter()
        .chain(harvested.iter())
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .unique()
        .map(str::to_string)
        .collect()
}
