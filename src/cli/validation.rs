use crate::cli::args::CliArgs;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if args.rate == Some(0) {
        return Err("invalid rate, expected positive integer".to_string());
    }
    if args.threads == Some(0) {
        return Err("invalid threads, expected positive integer".to_string());
    }
    if args.timeout == Some(0) {
        return Err("invalid timeout, expected positive integer".to_string());
    }
    if let Some(raw) = args.match_status.as_deref() {
        crate::utils::parse_u16_set_csv(raw)
            .map_err(|e| format!("invalid --match-status '{raw}': {e}"))?;
    }
    if let Some(raw) = args.extensions.as_deref() {
        crate::utils::parse_extensions_csv(raw)
            .map_err(|e| format!("invalid --extensions '{raw}': {e}"))?;
    }
    if let Some(raw) = args.sitemap_keywords.as_deref() {
        crate::utils::parse_keywords_csv(raw)
            .map_err(|e| format!("invalid --sitemap-keywords '{raw}': {e}"))?;
    }
    if let Some(raw) = args.header.as_deref() {
        crate::utils::parse_header_line(raw)
            .map_err(|e| format!("invalid --header '{raw}': {e}"))?;
    }
    if let Some(raw) = args.output_format.as_deref() {
        if crate::output::OutputFormat::parse(raw).is_none() {
            return Err(format!(
                "invalid --output-format '{raw}', expected text, json, csv or xml"
            ));
        }
    }
    Ok(())
}
