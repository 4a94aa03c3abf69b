use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "panelfinder",
    version,
    about = "admin panel discovery tool",
    long_about = "panelfinder probes a web host for administrative interfaces using a candidate path list, augmented with paths harvested from robots.txt and sitemap files.\n\nExamples:\n  panelfinder -u example.com\n  panelfinder -u https://target.tld/ -w admin_wordlist.txt -t 30 -r 60\n  panelfinder -u https://target.tld/ -p http://127.0.0.1:8080 -o findings.json\n\nRun without a target to be prompted interactively."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv)."
    )]
    pub verbose: u8,

    #[arg(
        short = 'n',
        long = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        help_heading = "Output",
        help = "Write findings to a file."
    )]
    pub output: Option<String>,

    #[arg(
        short = 'O',
        long = "output-format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Output file format (text, json, csv, xml). Inferred from the extension by default."
    )]
    pub output_format: Option<String>,

    #[arg(
        short = 'u',
        long = "url",
        value_name = "URL",
        action = ArgAction::Append,
        help_heading = "Input",
        help = "Target URL or host (repeatable). http:// is assumed when no scheme is given."
    )]
    pub url: Vec<String>,

    #[arg(
        short = 'i',
        long = "input-file",
        value_name = "FILE",
        help_heading = "Input",
        help = "Load targets from a file (one per line)."
    )]
    pub input_file: Option<String>,

    #[arg(
        short = 'w',
        long = "wordlist",
        value_name = "FILE",
        help_heading = "Input",
        help = "Candidate path list (one per line). Built-in admin paths are used when unset or missing."
    )]
    pub wordlist: Option<String>,

    #[arg(
        short = 'e',
        long = "extensions",
        value_name = "EXTENSIONS",
        help_heading = "Input",
        help = "Extension list separated by commas (e.g. php,asp)."
    )]
    pub extensions: Option<String>,

    #[arg(
        short = 'D',
        long = "dirsearch",
        visible_alias = "dirsearch-compat",
        help_heading = "Input",
        help = "DirSearch wordlist compatibility mode (replace %EXT% with extensions)."
    )]
    pub dirsearch_compat: bool,

    #[arg(
        short = 'C',
        long = "config",
        value_name = "FILE",
        help_heading = "Input",
        help = "Path to a YAML config file."
    )]
    pub config: Option<String>,

    #[arg(
        long = "init-config",
        help_heading = "Input",
        help = "Write a default config to ~/.panelfinder/config.yml (or --config) and exit."
    )]
    pub init_config: bool,

    #[arg(
        short = 'r',
        long = "rate",
        value_name = "RPS",
        help_heading = "Performance",
        help = "Request rate limit across all workers (requests per second)."
    )]
    pub rate: Option<u32>,

    #[arg(
        short = 't',
        long = "threads",
        visible_alias = "concurrency",
        value_name = "N",
        help_heading = "Performance",
        help = "Number of concurrent probe workers."
    )]
    pub threads: Option<u32>,

    #[arg(
        short = 'T',
        long = "timeout",
        value_name = "SECONDS",
        help_heading = "HTTP",
        help = "Per-request timeout in seconds."
    )]
    pub timeout: Option<u64>,

    #[arg(
        short = 'p',
        long = "proxy",
        value_name = "URL",
        help_heading = "HTTP",
        help = "HTTP/HTTPS proxy URL (e.g. http://127.0.0.1:8080)."
    )]
    pub proxy: Option<String>,

    #[arg(
        short = 'H',
        long = "header",
        value_name = "HEADER",
        help_heading = "HTTP",
        help = "Add a header to all probes (format: 'Key: Value')."
    )]
    pub header: Option<String>,

    #[arg(
        short = 'F',
        long = "follow-redirects",
        help_heading = "HTTP",
        help = "Follow HTTP redirects."
    )]
    pub follow_redirects: bool,

    #[arg(
        short = 'm',
        long = "match-status",
        value_name = "CODES",
        help_heading = "HTTP",
        help = "Status codes reported as findings (comma-separated)."
    )]
    pub match_status: Option<String>,

    #[arg(
        short = 'A',
        long = "user-agents",
        value_name = "FILE",
        help_heading = "HTTP",
        help = "User-Agent pool file (one per line); one is picked at random per request."
    )]
    pub user_agents: Option<String>,

    #[arg(
        long = "no-robots",
        help_heading = "Discovery",
        help = "Do not harvest paths from robots.txt."
    )]
    pub no_robots: bool,

    #[arg(
        long = "no-sitemap",
        help_heading = "Discovery",
        help = "Do not harvest paths from sitemap files."
    )]
    pub no_sitemap: bool,

    #[arg(
        short = 'k',
        long = "sitemap-keywords",
        value_name = "WORDS",
        help_heading = "Discovery",
        help = "Keywords a sitemap URL must contain to become a candidate (comma-separated)."
    )]
    pub sitemap_keywords: Option<String>,
}
