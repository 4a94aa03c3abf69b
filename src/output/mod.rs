use colored::Colorize;

use crate::prober::Finding;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
    Xml,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            "xml" => Some(Self::Xml),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".csv") {
        return Some(OutputFormat::Csv);
    }
    if lower.ends_with(".xml") {
        return Some(OutputFormat::Xml);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

const TABLE_RULE_WIDTH: usize = 110;

fn table_row(url: &str, status: &str, size: &str, title: &str) -> String {
    format!("{:<60} {:<10} {:<10} {:<30}", url, status, size, title)
}

/// Plain-text result table, one row per finding.
pub fn render_table(findings: &[Finding]) -> String {
    let mut out = String::new();
    out.push_str(&table_row("URL", "Status", "Size", "Title"));
    out.push('\n');
    out.push_str(&"-".repeat(TABLE_RULE_WIDTH));
    out.push('\n');
    for f in findings {
        out.push_str(&table_row(
            &f.url,
            &f.status.to_string(),
            &f.size.to_string(),
            &f.title,
        ));
        out.push('\n');
    }
    out
}

pub fn print_table(findings: &[Finding]) {
    if findings.is_empty() {
        println!("\n{}", "[-] No admin panels found!".bold().red());
        return;
    }
    println!("\n{}", "[+] Found admin panels:".bold().green());
    let table = render_table(findings);
    let mut lines = table.lines();
    if let Some(header) = lines.next() {
        println!("{}", header.bold().white());
    }
    for line in lines {
        println!("{}", line);
    }
}

pub fn render(format: OutputFormat, findings: &[Finding]) -> Vec<u8> {
    match format {
        OutputFormat::Text => render_text(findings),
        OutputFormat::Json => render_json(findings),
        OutputFormat::Csv => render_csv(findings),
        OutputFormat::Xml => render_xml(findings),
    }
}

pub fn render_text(findings: &[Finding]) -> Vec<u8> {
    let mut out = String::new();
    for f in findings {
        out.push_str(&f.url);
        out.push('\n');
    }
    out.into_bytes()
}

pub fn render_json(findings: &[Finding]) -> Vec<u8> {
    serde_json::to_vec_pretty(findings).unwrap_or_else(|_| b"[]\n".to_vec())
}

pub fn render_csv(findings: &[Finding]) -> Vec<u8> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    for f in findings {
        if wtr.serialize(f).is_err() {
            break;
        }
    }
    wtr.into_inner().unwrap_or_default()
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

pub fn render_xml(findings: &[Finding]) -> Vec<u8> {
    let mut out = String::new();
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    out.push('\n');
    out.push_str("<findings>\n");
    for f in findings {
        out.push_str("  <finding>\n");
        out.push_str(&format!("    <url>{}</url>\n", escape_xml(&f.url)));
        out.push_str(&format!("    <status>{}</status>\n", f.status));
        out.push_str(&format!("    <size>{}</size>\n", f.size));
        out.push_str(&format!("    <title>{}</title>\n", escape_xml(&f.title)));
        out.push_str("  </finding>\n");
    }
    out.push_str("</findings>\n");
    out.into_bytes()
}
