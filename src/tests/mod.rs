use std::collections::HashSet;
use std::sync::Arc;

use reqwest::Url;
use tokio::sync::mpsc;

use crate::discovery::{self, Harvest};
use crate::paths::{self, WordlistOrigin, WordlistSource};
use crate::prober::{self, Finding, ProbeJob, ProberConfig};

fn jobs(base: &str, paths: &[&str]) -> Vec<ProbeJob> {
    paths
        .iter()
        .map(|p| ProbeJob {
            base_url: base.to_string(),
            path: p.to_string(),
        })
        .collect()
}

#[tokio::test]
async fn rate_limited_producer_feeds_every_worker_queue() {
    let (job_tx, job_rx) = mpsc::channel::<ProbeJob>(1024);
    let mut worker_txs = Vec::new();
    let mut worker_rxs = Vec::new();
    for _ in 0..3 {
        let (tx, rx) = mpsc::channel::<ProbeJob>(1024);
        worker_txs.push(tx);
        worker_rxs.push(rx);
    }

    let all = jobs("http://a.tld/", &["/a", "/b", "/c", "/d", "/e", "/f", "/g"]);
    let producer = tokio::spawn(prober::send_jobs(job_tx, all.clone(), 1000));
    let dispatcher = tokio::spawn(prober::dispatch_jobs(job_rx, worker_txs));
    producer.await.unwrap().unwrap();
    dispatcher.await.unwrap();

    let mut seen: Vec<ProbeJob> = Vec::new();
    let mut per_worker: Vec<usize> = Vec::new();
    for mut rx in worker_rxs {
        let mut n = 0;
        while let Some(job) = rx.recv().await {
            seen.push(job);
            n += 1;
        }
        per_worker.push(n);
    }
    assert_eq!(per_worker, vec![3, 2, 2]);
    seen.sort_by(|a, b| a.path.cmp(&b.path));
    assert_eq!(seen, all);
}

#[tokio::test]
async fn producer_respects_the_rate_limit() {
    let (tx, mut rx) = mpsc::channel::<ProbeJob>(16);
    let all = jobs("http://a.tld/", &["/a", "/b", "/c", "/d", "/e"]);

    let started = std::time::Instant::now();
    prober::send_jobs(tx, all, 2).await.unwrap();
    let elapsed = started.elapsed();

    let mut received = 0;
    while rx.recv().await.is_some() {
        received += 1;
    }
    assert_eq!(received, 5);
    // a burst of two, then one job every 500ms
    assert!(
        elapsed >= std::time::Duration::from_millis(1400),
        "five jobs at 2 rps took {elapsed:?}"
    );
}

#[test]
fn harvested_paths_extend_the_wordlist() {
    let base = Url::parse("http://a.tld/").unwrap();
    let robots = discovery::parse_robots("User-agent: *\nDisallow: /admin\nDisallow: /staff/\n");
    let locs = discovery::parse_sitemap_locs(
        "<urlset><url><loc>http://a.tld/login</loc></url>\
         <url><loc>http://a.tld/panel/index</loc></url>\
         <url><loc>http://a.tld/about</loc></url></urlset>",
    );
    let keywords: Vec<String> = discovery::DEFAULT_SITEMAP_KEYWORDS
        .iter()
        .map(|k| k.to_string())
        .collect();
    let harvest = Harvest {
        robots,
        sitemap: discovery::filter_sitemap_urls(&locs, &keywords, &base),
        sitemap_source: Some("http://a.tld/sitemap.xml".to_string()),
    };

    let candidates = paths::merge_candidates(&paths::default_paths(), &harvest.paths());
    assert_eq!(candidates.len(), 23);
    assert_eq!(
        &candidates[20..],
        ["/staff/", "http://a.tld/login", "http://a.tld/panel/index"]
    );
    assert!(!candidates.iter().any(|c| c.ends_with("/about")));
    assert_eq!(
        prober::candidate_url("http://a.tld/", &candidates[22])
            .unwrap()
            .as_str(),
        "http://a.tld/panel/index"
    );
}

#[tokio::test]
async fn wordlist_file_is_read_and_cleaned() {
    use std::io::Write;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "/admin\n\n  /cpanel  \n/admin").unwrap();
    let path = file.path().to_string_lossy().to_string();

    let (words, origin) = crate::runner::load_wordlist(&WordlistSource::FilePath(path.clone()))
        .await
        .unwrap();
    assert_eq!(words, vec!["/admin", "/cpanel", "/admin"]);
    assert_eq!(origin, WordlistOrigin::File(path));
    assert_eq!(paths::merge_candidates(&words, &[]), vec!["/admin", "/cpanel"]);
}

#[tokio::test]
async fn probe_ignores_unreachable_hosts() {
    let client = crate::runner::build_client(None, 1, false).unwrap();
    let config = ProberConfig {
        match_status: HashSet::from([200]),
        user_agents: Arc::new(crate::utils::default_user_agents()),
        header: None,
    };
    let job = ProbeJob {
        base_url: "http://127.0.0.1:1/".to_string(),
        path: "/admin".to_string(),
    };
    assert_eq!(prober::probe(&client, &job, &config).await, None);
}

#[test]
fn proxy_must_be_a_valid_url() {
    assert!(crate::runner::build_client(Some("http://127.0.0.1:8080"), 10, false).is_ok());
    assert!(crate::runner::build_client(Some("::not a proxy::"), 10, false).is_err());
}

#[test]
fn report_renders_every_finding() {
    let findings = vec![
        Finding {
            url: "http://a.tld/admin".to_string(),
            status: 200,
            size: 10,
            title: "Admin".to_string(),
        },
        Finding {
            url: "http://a.tld/login".to_string(),
            status: 200,
            size: 0,
            title: crate::utils::NO_TITLE.to_string(),
        },
    ];
    let text = String::from_utf8(crate::output::render_text(&findings)).unwrap();
    assert_eq!(text, "http://a.tld/admin\nhttp://a.tld/login\n");
    let table = crate::output::render_table(&findings);
    assert_eq!(table.lines().count(), 4);
    assert!(table.contains("No Title"));
}
