use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use indicatif::ProgressBar;
use reqwest::Url;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tokio::task;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::discovery::{self, DiscoveryOptions, Harvest};
use crate::paths::{self, WordlistOrigin, WordlistSource};
use crate::prober::{self, Finding, ProbeJob, ProberConfig};
use crate::utils;

#[derive(Clone, Debug)]
pub struct Options {
    pub urls: Vec<String>,
    pub input_file: Option<String>,
    pub wordlist: WordlistSource,
    pub extensions: Vec<String>,
    pub dirsearch_compat: bool,
    pub rate: u32,
    pub threads: u32,
    pub timeout_seconds: u64,
    pub proxy: Option<String>,
    pub follow_redirects: bool,
    pub header: Option<String>,
    pub match_status: HashSet<u16>,
    pub user_agents: Vec<String>,
    pub discovery: DiscoveryOptions,
}

impl Default for Options {
    fn default() -> Self {
        let mut match_status = HashSet::new();
        match_status.insert(200);
        Self {
            urls: Vec::new(),
            input_file: None,
            wordlist: WordlistSource::Default,
            extensions: Vec::new(),
            dirsearch_compat: false,
            rate: 30,
            threads: 15,
            timeout_seconds: 10,
            proxy: None,
            follow_redirects: false,
            header: None,
            match_status,
            user_agents: utils::default_user_agents(),
            discovery: DiscoveryOptions::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("no targets provided (urls and input_file are both empty)")]
    NoTargets,

    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    #[error("invalid rate {value}, expected positive integer")]
    InvalidRate { value: u32 },

    #[error("invalid thread count {value}, expected positive integer")]
    InvalidThreads { value: u32 },

    #[error("invalid timeout {value}, expected positive integer")]
    InvalidTimeout { value: u64 },

    #[error("match status list is empty")]
    EmptyMatchStatus,

    #[error("user agent pool is empty")]
    EmptyUserAgents,

    #[error("dirsearch compatibility mode requires extensions")]
    DirsearchRequiresExtensions,

    #[error("invalid header: {message}")]
    InvalidHeader { message: String },

    #[error("no candidate paths to probe")]
    EmptyCandidates,

    #[error("failed to open file for {kind}: {path}: {source}")]
    FileOpen {
        kind: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read lines for {kind}: {path}: {source}")]
    FileRead {
        kind: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to setup proxy: {proxy}: {source}")]
    ProxySetup {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("job producer failed: {source}")]
    SendJobs {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("task join failed: {source}")]
    TaskJoin {
        #[source]
        source: tokio::task::JoinError,
    },
}

/// What was probed for a single target.
#[derive(Clone, Debug)]
pub struct TargetPlan {
    pub base_url: String,
    pub harvest: Harvest,
    pub candidates: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct ScanResult {
    pub started_at: Instant,
    pub elapsed: Duration,
    pub wordlist_origin: WordlistOrigin,
    pub wordlist_len: usize,
    pub plans: Vec<TargetPlan>,
    pub probes: u64,
    pub findings: Vec<Finding>,
}

#[derive(Clone)]
pub struct Runner {
    options: Options,
    pb: ProgressBar,
}

impl Runner {
    pub fn new(options: Options) -> Result<Self, RunnerError> {
        if options.urls.iter().all(|u| u.trim().is_empty()) && options.input_file.is_none() {
            return Err(RunnerError::NoTargets);
        }
        if options.rate == 0 {
            return Err(RunnerError::InvalidRate {
                value: options.rate,
            });
        }
        if options.threads == 0 {
            return Err(RunnerError::InvalidThreads {
                value: options.threads,
            });
        }
        if options.timeout_seconds == 0 {
            return Err(RunnerError::InvalidTimeout {
                value: options.timeout_seconds,
            });
        }
        if options.match_status.is_empty() {
            return Err(RunnerError::EmptyMatchStatus);
        }
        if options.user_agents.is_empty() {
            return Err(RunnerError::EmptyUserAgents);
        }
        if options.dirsearch_compat && options.extensions.is_empty() {
            return Err(RunnerError::DirsearchRequiresExtensions);
        }
        if let Some(header) = options.header.as_deref() {
            utils::parse_header_line(header)
                .map_err(|message| RunnerError::InvalidHeader { message })?;
        }
        Ok(Self {
            options,
            pb: ProgressBar::hidden(),
        })
    }

    /// Reports progress and findings through `pb` instead of a hidden bar.
    pub fn with_progress(mut self, pb: ProgressBar) -> Self {
        self.pb = pb;
        self
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub async fn run(&self) -> Result<ScanResult, RunnerError> {
        let started_at = Instant::now();

        let targets = load_targets(&self.options.urls, self.options.input_file.as_deref()).await?;
        let mut bases: Vec<Url> = Vec::with_capacity(targets.len());
        for t in targets.iter() {
            let url = Url::parse(t).map_err(|_| RunnerError::InvalidUrl { url: t.clone() })?;
            if url.host_str().is_none() {
                return Err(RunnerError::InvalidUrl { url: t.clone() });
            }
            bases.push(url);
        }

        let (wordlist, wordlist_origin) = load_wordlist(&self.options.wordlist).await?;
        let wordlist = paths::apply_extensions(
            wordlist,
            &self.options.extensions,
            self.options.dirsearch_compat,
        );
        let wordlist_len = wordlist.len();

        let client = build_client(
            self.options.proxy.as_deref(),
            self.options.timeout_seconds,
            self.options.follow_redirects,
        )?;
        let discovery_client = build_client(
            self.options.proxy.as_deref(),
            self.options.timeout_seconds,
            true,
        )?;

        let mut plans: Vec<TargetPlan> = Vec::with_capacity(bases.len());
        for base in bases.iter() {
            self.pb
                .set_message(format!("analyzing robots.txt and sitemap :: {base}"));
            let harvest = discovery::harvest(
                &discovery_client,
                base,
                &self.options.discovery,
                &self.options.user_agents,
            )
            .await;
            let candidates = paths::merge_candidates(&wordlist, &harvest.paths());
            info!(
                url = %base,
                candidates = candidates.len(),
                robots = harvest.robots.len(),
                sitemap = harvest.sitemap.len(),
                "planned target"
            );
            plans.push(TargetPlan {
                base_url: base.to_string(),
                harvest,
                candidates,
            });
        }

        let jobs: Vec<ProbeJob> = plans
            .iter()
            .flat_map(|plan| {
                plan.candidates.iter().map(move |path| ProbeJob {
                    base_url: plan.base_url.clone(),
                    path: path.clone(),
                })
            })
            .collect();
        if jobs.is_empty() {
            return Err(RunnerError::EmptyCandidates);
        }

        let (probes, findings) = self.run_probes(client, jobs).await?;

        Ok(ScanResult {
            started_at,
            elapsed: started_at.elapsed(),
            wordlist_origin,
            wordlist_len,
            plans,
            probes,
            findings,
        })
    }

    async fn run_probes(
        &self,
        client: reqwest::Client,
        jobs: Vec<ProbeJob>,
    ) -> Result<(u64, Vec<Finding>), RunnerError> {
        let options = &self.options;
        self.pb.set_length(jobs.len() as u64);

        let header = match options.header.as_deref() {
            Some(raw) => Some(
                utils::parse_header_line(raw)
                    .map_err(|message| RunnerError::InvalidHeader { message })?,
            ),
            None => None,
        };
        let prober_config = ProberConfig {
            match_status: options.match_status.clone(),
            user_agents: Arc::new(options.user_agents.clone()),
            header,
        };

        let (job_tx, job_rx) = mpsc::channel::<ProbeJob>(1024);
        let (result_tx, mut result_rx) = mpsc::channel::<Finding>(1024);

        let worker_count = options.threads.max(1) as usize;
        let mut worker_txs = Vec::with_capacity(worker_count);
        let mut worker_rxs = Vec::with_capacity(worker_count);
        for _ in 0..worker_count {
            let (tx, rx) = mpsc::channel::<ProbeJob>(1024);
            worker_txs.push(tx);
            worker_rxs.push(rx);
        }

        let rate = options.rate;
        let send_jobs_handle = tokio::spawn(async move {
            prober::send_jobs(job_tx, jobs, rate)
                .await
                .map_err(|e| RunnerError::SendJobs { source: e })
        });
        let dispatch_handle = tokio::spawn(prober::dispatch_jobs(job_rx, worker_txs));

        let mut workers = Vec::with_capacity(worker_count);
        for rx in worker_rxs {
            workers.push(task::spawn(prober::run_prober(
                self.pb.clone(),
                client.clone(),
                rx,
                result_tx.clone(),
                prober_config.clone(),
            )));
        }
        drop(result_tx);

        let collect_handle = task::spawn(async move {
            let mut out: Vec<Finding> = Vec::new();
            while let Some(finding) = result_rx.recv().await {
                out.push(finding);
            }
            out
        });

        match send_jobs_handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(e) => return Err(RunnerError::TaskJoin { source: e }),
        }
        dispatch_handle
            .await
            .map_err(|e| RunnerError::TaskJoin { source: e })?;

        let mut probes = 0u64;
        for result in futures::future::join_all(workers).await {
            probes += result.map_err(|e| RunnerError::TaskJoin { source: e })?;
        }

        let mut findings = collect_handle
            .await
            .map_err(|e| RunnerError::TaskJoin { source: e })?;
        findings.sort_by(|a, b| a.url.cmp(&b.url).then(a.status.cmp(&b.status)));
        findings.dedup_by(|a, b| a.url == b.url);
        debug!(probes, findings = findings.len(), "probing finished");

        Ok((probes, findings))
    }
}

pub(crate) fn build_client(
    proxy: Option<&str>,
    timeout_seconds: u64,
    follow_redirects: bool,
) -> Result<reqwest::Client, RunnerError> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::USER_AGENT,
        reqwest::header::HeaderValue::from_static(utils::FALLBACK_USER_AGENT),
    );

    let redirect_policy = if follow_redirects {
        reqwest::redirect::Policy::limited(10)
    } else {
        reqwest::redirect::Policy::none()
    };

    let mut builder = reqwest::Client::builder()
        .default_headers(headers)
        .redirect(redirect_policy)
        .timeout(Duration::from_secs(timeout_seconds))
        .danger_accept_invalid_hostnames(true)
        .danger_accept_invalid_certs(true);

    if let Some(proxy) = proxy.filter(|p| !p.trim().is_empty()) {
        let proxy = reqwest::Proxy::all(proxy).map_err(|e| RunnerError::ProxySetup {
            proxy: proxy.to_string(),
            source: e,
        })?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| RunnerError::HttpClientBuild { source: e })
}

async fn read_lines(kind: &'static str, path: &str) -> Result<Vec<String>, RunnerError> {
    let handle = File::open(path).await.map_err(|e| RunnerError::FileOpen {
        kind,
        path: path.to_string(),
        source: e,
    })?;
    let mut out = Vec::new();
    let mut lines = BufReader::new(handle).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => out.push(line),
            Ok(None) => break,
            Err(e) => {
                return Err(RunnerError::FileRead {
                    kind,
                    path: path.to_string(),
                    source: e,
                })
            }
        }
    }
    Ok(paths::clean_lines(out))
}

async fn load_targets(
    urls: &[String],
    input_file: Option<&str>,
) -> Result<Vec<String>, RunnerError> {
    let mut raw: Vec<String> = urls.to_vec();
    if let Some(path) = input_file.filter(|p| !p.trim().is_empty()) {
        let path = crate::config::expand_tilde_string(path);
        raw.extend(read_lines("input_file", &path).await?);
    }

    let mut out: Vec<String> = Vec::new();
    for u in paths::clean_lines(raw) {
        let u = utils::normalize_target(&u);
        if !out.contains(&u) {
            out.push(u);
        }
    }
    if out.is_empty() {
        return Err(RunnerError::NoTargets);
    }
    Ok(out)
}

/// Loads candidate paths. A wordlist file that does not exist falls back to
/// the built-in defaults; any other I/O failure is an error.
pub(crate) async fn load_wordlist(
    source: &WordlistSource,
) -> Result<(Vec<String>, WordlistOrigin), RunnerError> {
    match source {
        WordlistSource::Default => Ok((paths::default_paths(), WordlistOrigin::Default)),
        WordlistSource::Inline(values) => Ok((paths::clean_lines(values), WordlistOrigin::Inline)),
        WordlistSource::FilePath(path) => {
            let path = crate::config::expand_tilde_string(path);
            match read_lines("wordlist", &path).await {
                Ok(words) => Ok((words, WordlistOrigin::File(path))),
                Err(RunnerError::FileOpen { source, .. })
                    if source.kind() == std::io::ErrorKind::NotFound =>
                {
                    warn!(path = %path, "wordlist not found, using built-in paths");
                    Ok((paths::default_paths(), WordlistOrigin::DefaultFallback(path)))
                }
                Err(e) => Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runner_rejects_missing_targets() {
        let err = Runner::new(Options::default()).err().unwrap();
        assert!(matches!(err, RunnerError::NoTargets));
    }

    #[test]
    fn runner_rejects_zero_rate_and_bad_header() {
        let options = Options {
            urls: vec!["example.com".to_string()],
            rate: 0,
            ..Default::default()
        };
        assert!(matches!(
            Runner::new(options).err().unwrap(),
            RunnerError::InvalidRate { value: 0 }
        ));

        let options = Options {
            urls: vec!["example.com".to_string()],
            header: Some("nocolon".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            Runner::new(options).err().unwrap(),
            RunnerError::InvalidHeader { .. }
        ));
    }

    #[tokio::test]
    async fn targets_are_normalized_and_deduplicated() {
        let urls = vec![
            "example.com".to_string(),
            " http://example.com ".to_string(),
            "".to_string(),
            "https://example.com/app/".to_string(),
        ];
        let out = load_targets(&urls, None).await.unwrap();
        assert_eq!(out, vec!["http://example.com", "https://example.com/app/"]);
    }

    #[tokio::test]
    async fn missing_wordlist_falls_back_to_defaults() {
        let source = WordlistSource::FilePath("/nonexistent/panelfinder/words.txt".to_string());
        let (words, origin) = load_wordlist(&source).await.unwrap();
        assert_eq!(words, paths::default_paths());
        assert!(matches!(origin, WordlistOrigin::DefaultFallback(_)));
    }

    #[tokio::test]
    async fn inline_wordlist_is_cleaned() {
        let source = WordlistSource::Inline(vec![" /a ".to_string(), "".to_string()]);
        let (words, origin) = load_wordlist(&source).await.unwrap();
        assert_eq!(words, vec!["/a".to_string()]);
        assert_eq!(origin, WordlistOrigin::Inline);
    }
}
