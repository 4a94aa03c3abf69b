use std::collections::HashSet;
use std::error::Error;
use std::num::NonZeroU32;
use std::sync::Arc;

use colored::Colorize;
use governor::{Quota, RateLimiter};
use indicatif::ProgressBar;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Url;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::utils;

// the ProbeJob struct which will be sent to the workers
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProbeJob {
    pub base_url: String,
    pub path: String,
}

// the Finding struct which carries a successful probe back to the collector
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub url: String,
    pub status: u16,
    pub size: usize,
    pub title: String,
}

#[derive(Clone, Debug)]
pub struct ProberConfig {
    pub match_status: HashSet<u16>,
    pub user_agents: Arc<Vec<String>>,
    pub header: Option<(HeaderName, HeaderValue)>,
}

// feeds the jobs to the dispatcher, never faster than `rate` per second.
pub async fn send_jobs(
    tx: mpsc::Sender<ProbeJob>,
    jobs: Vec<ProbeJob>,
    rate: u32,
) -> Result<(), Box<dyn Error + Send + Sync + 'static>> {
    let rate = NonZeroU32::new(rate).ok_or("rate must be a positive integer")?;
    let lim = RateLimiter::direct(Quota::per_second(rate));

    for job in jobs {
        lim.until_ready().await;
        if tx.send(job).await.is_err() {
            break;
        }
    }
    Ok(())
}

// spreads jobs across the per-worker queues in round-robin order.
pub async fn dispatch_jobs(
    mut rx: mpsc::Receiver<ProbeJob>,
    worker_txs: Vec<mpsc::Sender<ProbeJob>>,
) {
    let mut idx = 0usize;
    while let Some(job) = rx.recv().await {
        if worker_txs.is_empty() {
            break;
        }
        let tx = &worker_txs[idx % worker_txs.len()];
        let _ = tx.send(job).await;
        idx = idx.wrapping_add(1);
    }
}

/// Absolute URL for a candidate, with `urljoin` semantics: rooted paths
/// replace the base path, relative ones resolve against it.
pub fn candidate_url(base_url: &str, path: &str) -> Option<Url> {
    Url::parse(base_url).ok()?.join(path).ok()
}

/// Probes a single candidate. Any transport or body error yields `None`.
pub async fn probe(
    client: &reqwest::Client,
    job: &ProbeJob,
    config: &ProberConfig,
) -> Option<Finding> {
    let url = candidate_url(&job.base_url, &job.path)?;
    let user_agent = utils::random_user_agent(&config.user_agents).to_string();

    let mut req = client
        .get(url.clone())
        .header(reqwest::header::USER_AGENT, user_agent);
    if let Some((name, value)) = config.header.as_ref() {
        req = req.header(name.clone(), value.clone());
    }

    let resp = match req.send().await {
        Ok(resp) => resp,
        Err(e) => {
            trace!(url = %url, error = %e, "probe failed");
            return None;
        }
    };
    let status = resp.status().as_u16();
    if !config.match_status.contains(&status) {
        trace!(url = %url, status, "no match");
        return None;
    }

    let body = match resp.bytes().await {
        Ok(body) => body,
        Err(e) => {
            debug!(url = %url, error = %e, "failed to read body");
            return None;
        }
    };
    let title = utils::extract_title(&String::from_utf8_lossy(&body));
    Some(Finding {
        url: url.to_string(),
        status,
        size: body.len(),
        title,
    })
}

// runs one worker until its queue is closed, returns the number of probes made.
pub async fn run_prober(
    pb: ProgressBar,
    client: reqwest::Client,
    mut rx: mpsc::Receiver<ProbeJob>,
    tx: mpsc::Sender<Finding>,
    config: ProberConfig,
) -> u64 {
    let mut probes = 0u64;
    while let Some(job) = rx.recv().await {
        pb.set_message(format!(
            "{} {}",
            "probing ::".bold().white(),
            job.path.bold().blue(),
        ));
        let finding = probe(&client, &job, &config).await;
        probes += 1;
        pb.inc(1);

        let Some(finding) = finding else {
            continue;
        };
        pb.println(format!(
            "{} {} {} {}",
            "found admin panel ::".bold().green(),
            finding.url.bold().blue(),
            format!("[{}]", finding.status).bold().white(),
            finding.title.white(),
        ));
        if tx.send(finding).await.is_err() {
            break;
        }
    }
    probes
}
