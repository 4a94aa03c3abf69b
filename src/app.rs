use std::io::{BufRead, Write};
use std::time::Duration;

use clap::{error::ErrorKind, Parser};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing_subscriber::EnvFilter;

use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::discovery::DiscoveryOptions;
use crate::output::{self, OutputFormat};
use crate::paths::{WordlistOrigin, WordlistSource};
use crate::runner::{Options, Runner};
use crate::utils;

fn print_banner() {
    const BANNER: &str = r#"
                               __ _____           __
    ____  ____ _____  ___  / // __(_)___  ____/ /__  _____
   / __ \/ __ `/ __ \/ _ \/ // /_/ / __ \/ __  / _ \/ ___/
  / /_/ / /_/ / / / /  __/ // __/ / / / / /_/ /  __/ /
 / .___/\__,_/_/ /_/\___/_//_/ /_/_/ /_/\__,_/\___/_/
/_/
       v0.2.0 - admin panel discovery tool
    "#;
    print!("{}", BANNER);
    println!();
}

fn format_kv_line(label: &str, value: &str) {
    println!(":: {:<10}: {}", label, value);
}

fn format_bool(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

#[derive(Clone, Debug)]
struct RunConfig {
    options: Options,
    output: Option<String>,
    output_format: Option<OutputFormat>,
    no_color: bool,
}

fn load_user_agents(path: &str) -> Result<Vec<String>, String> {
    let path = config::expand_tilde_string(path);
    let contents = std::fs::read_to_string(&path)
        .map_err(|e| format!("failed to read user agents file '{path}': {e}"))?;
    let agents = crate::paths::clean_lines(contents.lines());
    if agents.is_empty() {
        return Err(format!("user agents file '{path}' is empty"));
    }
    Ok(agents)
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;
    let defaults = Options::default();

    let no_color = args.no_color || cfg.no_color.unwrap_or(false);

    let mut urls: Vec<String> = args.url.clone();
    if let Some(extra) = cfg.urls {
        urls.extend(extra);
    }
    let input_file = args
        .input_file
        .or(cfg.input_file)
        .map(|p| config::expand_tilde_string(&p));

    let wordlist = match args.wordlist.or(cfg.wordlist) {
        Some(p) if !p.trim().is_empty() => {
            WordlistSource::FilePath(config::expand_tilde_string(p.trim()))
        }
        _ => WordlistSource::Default,
    };

    let extensions = match args.extensions.or(cfg.extensions) {
        Some(raw) if !raw.trim().is_empty() => utils::parse_extensions_csv(&raw)
            .map_err(|e| format!("invalid extensions '{raw}': {e}"))?,
        _ => Vec::new(),
    };
    let dirsearch_compat = args.dirsearch_compat || cfg.dirsearch_compat.unwrap_or(false);
    if dirsearch_compat && extensions.is_empty() {
        return Err("dirsearch mode requires --extensions".to_string());
    }

    let rate = args.rate.or(cfg.rate).unwrap_or(defaults.rate);
    let threads = args.threads.or(cfg.threads).unwrap_or(defaults.threads);
    let timeout_seconds = args
        .timeout
        .or(cfg.timeout)
        .unwrap_or(defaults.timeout_seconds);
    if rate == 0 || threads == 0 || timeout_seconds == 0 {
        return Err("rate, threads and timeout must be positive".to_string());
    }

    let proxy = args
        .proxy
        .or(cfg.proxy)
        .filter(|p| !p.trim().is_empty());
    let header = args.header.or(cfg.header).filter(|h| !h.trim().is_empty());
    if let Some(raw) = header.as_deref() {
        utils::parse_header_line(raw).map_err(|e| format!("invalid header '{raw}': {e}"))?;
    }
    let follow_redirects = args.follow_redirects || cfg.follow_redirects.unwrap_or(false);

    let match_status = match args.match_status.or(cfg.match_status) {
        Some(raw) => utils::parse_u16_set_csv(&raw)
            .map_err(|e| format!("invalid match status '{raw}': {e}"))?,
        None => defaults.match_status,
    };

    let user_agents = if let Some(path) = args.user_agents.or(cfg.user_agents_file) {
        load_user_agents(&path)?
    } else if let Some(list) = cfg.user_agents {
        let agents = crate::paths::clean_lines(list);
        if agents.is_empty() {
            return Err("config user_agents list is empty".to_string());
        }
        agents
    } else {
        defaults.user_agents
    };

    let sitemap_keywords = match args.sitemap_keywords.or(cfg.sitemap_keywords) {
        Some(raw) => utils::parse_keywords_csv(&raw)
            .map_err(|e| format!("invalid sitemap keywords '{raw}': {e}"))?,
        None => defaults.discovery.sitemap_keywords,
    };
    let discovery = DiscoveryOptions {
        robots: !(args.no_robots || cfg.no_robots.unwrap_or(false)),
        sitemap: !(args.no_sitemap || cfg.no_sitemap.unwrap_or(false)),
        sitemap_keywords,
    };

    let output = args
        .output
        .or(cfg.output)
        .map(|p| config::expand_tilde_string(&p));
    let output_format = match args.output_format.or(cfg.output_format) {
        Some(raw) => Some(
            OutputFormat::parse(&raw)
                .ok_or_else(|| format!("invalid output format '{raw}'"))?,
        ),
        None => None,
    };

    Ok(RunConfig {
        options: Options {
            urls,
            input_file,
            wordlist,
            extensions,
            dirsearch_compat,
            rate,
            threads,
            timeout_seconds,
            proxy,
            follow_redirects,
            header,
            match_status,
            user_agents,
            discovery,
        },
        output,
        output_format,
        no_color,
    })
}

fn has_targets(options: &Options) -> bool {
    options.urls.iter().any(|u| !u.trim().is_empty()) || options.input_file.is_some()
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct InteractiveAnswers {
    target: String,
    wordlist: Option<String>,
    proxy: Option<String>,
}

fn ask<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
) -> Result<String, String> {
    write!(output, "{question}").map_err(|e| format!("failed to write prompt: {e}"))?;
    output
        .flush()
        .map_err(|e| format!("failed to write prompt: {e}"))?;
    let mut line = String::new();
    input
        .read_line(&mut line)
        .map_err(|e| format!("failed to read answer: {e}"))?;
    Ok(line.trim().to_string())
}

// asks for the target, an optional wordlist and an optional proxy.
fn prompt_interactive<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
) -> Result<InteractiveAnswers, String> {
    let target = ask(
        input,
        output,
        "[?] Target URL (example.com or http://example.com): ",
    )?;
    if target.is_empty() {
        return Err(
            "no target given (use --url, --input-file, or urls in the config)".to_string(),
        );
    }
    let wordlist = ask(
        input,
        output,
        "[?] Custom wordlist path (leave blank for default): ",
    )?;
    let use_proxy = ask(input, output, "[?] Use proxy? (y/n): ")?;
    let proxy = if use_proxy.eq_ignore_ascii_case("y") {
        let proxy = ask(input, output, "[?] Enter proxy (http://ip:port): ")?;
        Some(proxy).filter(|p| !p.is_empty())
    } else {
        None
    };
    Ok(InteractiveAnswers {
        target,
        wordlist: Some(wordlist).filter(|w| !w.is_empty()),
        proxy,
    })
}

fn apply_interactive(options: &mut Options, answers: InteractiveAnswers) {
    options.urls = vec![answers.target];
    if let Some(wordlist) = answers.wordlist {
        options.wordlist = WordlistSource::FilePath(config::expand_tilde_string(&wordlist));
    }
    if let Some(proxy) = answers.proxy {
        options.proxy = Some(proxy);
    }
}

// prompts for a target only when none is configured; answers may be piped.
fn ensure_targets<R: BufRead, W: Write>(
    options: &mut Options,
    input: &mut R,
    output: &mut W,
) -> Result<(), String> {
    if has_targets(options) {
        return Ok(());
    }
    let answers = prompt_interactive(input, output)?;
    apply_interactive(options, answers);
    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "panelfinder=warn",
        1 => "panelfinder=debug",
        _ => "panelfinder=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn describe_wordlist(origin: &WordlistOrigin, len: usize) -> String {
    match origin {
        WordlistOrigin::Default => format!("{len} built-in"),
        WordlistOrigin::Inline => format!("{len} inline"),
        WordlistOrigin::File(path) => format!("{len} file={path}"),
        WordlistOrigin::DefaultFallback(path) => {
            format!("{len} built-in (wordlist not found: {path})")
        }
    }
}

async fn write_report(
    path: &str,
    format: Option<OutputFormat>,
    findings: &[crate::prober::Finding],
) -> Result<(), String> {
    let format = format
        .or_else(|| output::infer_format_from_path(path))
        .unwrap_or(OutputFormat::Text);
    let rendered = output::render(format, findings);
    let mut outfile = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .await
        .map_err(|e| format!("failed to open output file: {e}"))?;
    outfile
        .write_all(&rendered)
        .await
        .map_err(|e| format!("failed to write output file: {e}"))?;
    Ok(())
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    let options = &run.options;
    let mut targets: Vec<String> = options
        .urls
        .iter()
        .filter(|u| !u.trim().is_empty())
        .map(|u| utils::normalize_target(u))
        .collect();
    if let Some(path) = options.input_file.as_ref() {
        targets.push(format!("file={path}"));
    }
    format_kv_line("Target", &targets.join(" "));
    format_kv_line(
        "Scan",
        &format!(
            "extensions={} dirsearch={} robots={} sitemap={} keywords={}",
            if options.extensions.is_empty() {
                "none".to_string()
            } else {
                options.extensions.join(",")
            },
            format_bool(options.dirsearch_compat),
            format_bool(options.discovery.robots),
            format_bool(options.discovery.sitemap),
            options.discovery.sitemap_keywords.join(",")
        ),
    );
    let mut match_status: Vec<u16> = options.match_status.iter().copied().collect();
    match_status.sort_unstable();
    format_kv_line(
        "HTTP",
        &format!(
            "rate={} threads={} timeout={}s redirects={} proxy={} match={} agents={}",
            options.rate,
            options.threads,
            options.timeout_seconds,
            format_bool(options.follow_redirects),
            if options.proxy.is_some() { "on" } else { "off" },
            match_status
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join(","),
            options.user_agents.len(),
        ),
    );
    println!();

    let pb = ProgressBar::new(0);
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.enable_steady_tick(Duration::from_millis(200));
    pb.set_style(
        ProgressStyle::with_template(
            ":: Progress: [{pos}/{len}] :: {per_sec} :: Duration: [{elapsed_precise}] :: {msg}",
        )
        .map_err(|e| format!("failed to build progress bar style: {e}"))?
        .progress_chars(r#"#>-"#),
    );

    let runner = Runner::new(run.options.clone())
        .map_err(|e| e.to_string())?
        .with_progress(pb.clone());
    let result = runner.run().await;
    pb.finish_and_clear();
    let result = result.map_err(|e| e.to_string())?;

    format_kv_line(
        "Wordlist",
        &describe_wordlist(&result.wordlist_origin, result.wordlist_len),
    );
    for plan in result.plans.iter() {
        format_kv_line(
            "Harvest",
            &format!(
                "{} robots={} sitemap={} candidates={}",
                plan.base_url,
                plan.harvest.robots.len(),
                plan.harvest.sitemap.len(),
                plan.candidates.len()
            ),
        );
    }

    output::print_table(&result.findings);

    if let Some(path) = run.output.as_deref() {
        write_report(path, run.output_format, &result.findings).await?;
        println!(
            "\n{} {}",
            "results written to ::".bold().white(),
            path.bold().blue()
        );
    }

    println!();
    println!(
        ":: Completed :: {} probes, {} found, scan took {}s ::",
        result.probes,
        result.findings.len(),
        result.elapsed.as_secs()
    );
    Ok(())
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{e}");
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    init_tracing(args.verbose);

    let user_config_path = args.config.clone().map(|p| config::expand_tilde(&p));
    if args.init_config {
        let path = user_config_path
            .or_else(config::default_config_path)
            .ok_or_else(|| "could not determine a config location".to_string())?;
        if config::ensure_default_config_file(&path)? {
            println!("wrote default config to {}", path.display());
        } else {
            println!("config already exists at {}", path.display());
        }
        return Ok(());
    }

    let cfg = match user_config_path.as_ref() {
        Some(path) => config::load_config(path, false)?,
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true)?,
            None => ConfigFile::default(),
        },
    };

    let mut run = build_run_config(args, cfg)?;
    if run.no_color {
        colored::control::set_override(false);
    }
    print_banner();

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    ensure_targets(&mut run.options, &mut stdin.lock(), &mut stdout.lock())?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))
}

#[cfg(test)]
mod cli_tests {
    use super::*;
    use std::io::Cursor;

    fn args(argv: &[&str]) -> CliArgs {
        let mut full = vec!["panelfinder"];
        full.extend_from_slice(argv);
        CliArgs::parse_from(full)
    }

    #[test]
    fn defaults_follow_the_classic_finder() {
        let run = build_run_config(args(&["-u", "example.com"]), ConfigFile::default()).unwrap();
        let o = &run.options;
        assert_eq!(o.rate, 30);
        assert_eq!(o.threads, 15);
        assert_eq!(o.timeout_seconds, 10);
        assert!(!o.follow_redirects);
        assert!(o.match_status.contains(&200) && o.match_status.len() == 1);
        assert!(matches!(o.wordlist, WordlistSource::Default));
        assert!(o.discovery.robots && o.discovery.sitemap);
        assert_eq!(o.user_agents.len(), 3);
        assert!(!run.no_color);
    }

    #[test]
    fn cli_overrides_config() {
        let cfg = ConfigFile {
            rate: Some(5),
            threads: Some(2),
            urls: Some(vec!["from-config.tld".to_string()]),
            no_sitemap: Some(true),
            match_status: Some("200,403".to_string()),
            ..Default::default()
        };
        let run = build_run_config(args(&["-u", "cli.tld", "-r", "50", "-m", "401"]), cfg).unwrap();
        let o = &run.options;
        assert_eq!(o.rate, 50);
        assert_eq!(o.threads, 2);
        assert_eq!(o.urls, vec!["cli.tld".to_string(), "from-config.tld".to_string()]);
        assert!(!o.discovery.sitemap);
        assert!(o.match_status.contains(&401) && o.match_status.len() == 1);
    }

    #[test]
    fn dirsearch_requires_extensions() {
        let err =
            build_run_config(args(&["-u", "a.tld", "-D"]), ConfigFile::default()).unwrap_err();
        assert!(err.contains("extensions"));
    }

    #[test]
    fn user_agents_file_replaces_pool() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "agent-one\n\n  agent-two  ").unwrap();
        let path = file.path().to_string_lossy().to_string();
        let argv = args(&["-u", "a.tld", "-A", path.as_str()]);
        let run = build_run_config(argv, ConfigFile::default()).unwrap();
        assert_eq!(run.options.user_agents, vec!["agent-one", "agent-two"]);
    }

    #[test]
    fn output_format_is_validated() {
        let cfg = ConfigFile {
            output_format: Some("yaml".to_string()),
            ..Default::default()
        };
        assert!(build_run_config(args(&["-u", "a.tld"]), cfg).is_err());
    }

    #[test]
    fn interactive_prompt_collects_answers() {
        let mut input = Cursor::new("example.com\n/tmp/words.txt\nY\nhttp://127.0.0.1:8080\n");
        let mut output: Vec<u8> = Vec::new();
        let answers = prompt_interactive(&mut input, &mut output).unwrap();
        assert_eq!(
            answers,
            InteractiveAnswers {
                target: "example.com".to_string(),
                wordlist: Some("/tmp/words.txt".to_string()),
                proxy: Some("http://127.0.0.1:8080".to_string()),
            }
        );
        let shown = String::from_utf8(output).unwrap();
        assert!(shown.contains("[?] Use proxy? (y/n): "));

        let mut options = Options::default();
        apply_interactive(&mut options, answers);
        assert_eq!(options.urls, vec!["example.com".to_string()]);
        assert_eq!(options.proxy.as_deref(), Some("http://127.0.0.1:8080"));
        assert!(matches!(
            options.wordlist,
            WordlistSource::FilePath(ref p) if p == "/tmp/words.txt"
        ));
    }

    #[test]
    fn piped_answers_fill_in_a_missing_target() {
        let mut options = Options::default();
        let mut input = Cursor::new("a.tld\n\nn\n");
        let mut output: Vec<u8> = Vec::new();
        ensure_targets(&mut options, &mut input, &mut output).unwrap();
        assert_eq!(options.urls, vec!["a.tld".to_string()]);
        assert!(matches!(options.wordlist, WordlistSource::Default));
        assert_eq!(options.proxy, None);

        let mut empty = Cursor::new("");
        let mut sink: Vec<u8> = Vec::new();
        let err = ensure_targets(&mut Options::default(), &mut empty, &mut sink).unwrap_err();
        assert!(err.contains("no target given"));
    }

    #[test]
    fn configured_targets_skip_the_prompt() {
        let mut options = Options {
            urls: vec!["a.tld".to_string()],
            ..Default::default()
        };
        let mut input = Cursor::new("other.tld\n");
        let mut output: Vec<u8> = Vec::new();
        ensure_targets(&mut options, &mut input, &mut output).unwrap();
        assert_eq!(options.urls, vec!["a.tld".to_string()]);
        assert!(output.is_empty());
    }

    #[test]
    fn interactive_prompt_defaults_and_requires_target() {
        let mut input = Cursor::new("a.tld\n\nn\n");
        let mut output: Vec<u8> = Vec::new();
        let answers = prompt_interactive(&mut input, &mut output).unwrap();
        assert_eq!(answers.wordlist, None);
        assert_eq!(answers.proxy, None);

        let mut input = Cursor::new("\n");
        assert!(prompt_interactive(&mut input, &mut Vec::<u8>::new()).is_err());
    }
}
