//! Doctor command - verify API keys, documents and configuration.

use crate::cli::Output;
use crate::config::{ProviderKind, Settings};
use console::style;
use std::path::Path;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: Option<&str>) -> anyhow::Result<()> {
    Output::header("Consulta Doctor");
    println!();
    println!("Checking providers, documents and configuration...\n");

    let mut checks = Vec::new();

    // Check API keys
    println!("{}", style("API Configuration").bold());
    let mut key_checks = vec![check_api_key(
        &settings.embedding.api_key_env(),
        settings.embedding.provider,
        &format!("embeddings: {}", settings.embedding.model()),
    )];
    if settings.completion.api_key_env() != settings.embedding.api_key_env() {
        key_checks.push(check_api_key(
            &settings.completion.api_key_env(),
            settings.completion.provider,
            &format!("answers: {}", settings.completion.model()),
        ));
    }
    for check in &key_checks {
        check.print();
    }
    checks.extend(key_checks);

    println!();

    // Check documents
    println!("{}", style("Documents").bold());
    let doc_checks = check_documents(settings);
    for check in &doc_checks {
        check.print();
    }
    checks.extend(doc_checks);

    println!();

    // Check configuration
    println!("{}", style("Configuration").bold());
    let config_check = check_config_file(config_path);
    config_check.print();
    checks.push(config_check);

    println!();

    // Summary
    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Consulta.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!(
            "All checks passed with {} warning(s).",
            warnings
        ));
    } else {
        Output::success("All checks passed! Consulta is ready to use.");
    }

    Ok(())
}

/// Check that the API key for a provider is configured.
fn check_api_key(env_name: &str, provider: ProviderKind, usage: &str) -> CheckResult {
    let hint = format!("Set with: export {}='...'", env_name);
    match std::env::var(env_name) {
        Ok(key) if key.trim().is_empty() => CheckResult::error(env_name, "empty", &hint),
        Ok(key) if looks_like_key(provider, &key) => {
            CheckResult::ok(env_name, &format!("configured ({}, {})", mask(&key), usage))
        }
        Ok(_) => CheckResult::warning(
            env_name,
            &format!("set but format looks unusual ({})", usage),
            match provider {
                ProviderKind::OpenAI => "Expected format: sk-... (OpenAI API key)",
                ProviderKind::Gemini => "Expected format: AIza... (Google API key)",
            },
        ),
        Err(_) => CheckResult::error(env_name, &format!("not set ({})", usage), &hint),
    }
}

fn looks_like_key(provider: ProviderKind, key: &str) -> bool {
    let prefix = match provider {
        ProviderKind::OpenAI => "sk-",
        ProviderKind::Gemini => "AIza",
    };
    key.starts_with(prefix) && key.len() > 20
}

/// Show the start and end of a key.
fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 11 {
        return "***".to_string();
    }
    let head: String = chars[..7].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Check every configured document.
fn check_documents(settings: &Settings) -> Vec<CheckResult> {
    let paths = settings.document_paths();
    if paths.is_empty() {
        return vec![CheckResult::error(
            "Documents",
            "none configured",
            "Add PDF paths under [documents] paths or set CONSULTA_DOCUMENTS",
        )];
    }

    paths.iter().map(|path| check_document(path)).collect()
}

fn check_document(path: &Path) -> CheckResult {
    let name = path.display().to_string();
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => {
            if path.extension().and_then(|e| e.to_str()).map(|e| e.eq_ignore_ascii_case("pdf")) == Some(true) {
                CheckResult::ok(&name, &format_size(meta.len()))
            } else {
                CheckResult::warning(&name, &format_size(meta.len()), "File does not have a .pdf extension")
            }
        }
        Ok(_) => CheckResult::error(&name, "not a file", "Point documents.paths at PDF files"),
        Err(_) => CheckResult::error(&name, "not found", "Check documents.paths in your config"),
    }
}

/// Check if config file exists.
fn check_config_file(config_path: Option<&str>) -> CheckResult {
    let path = config_path
        .map(std::path::PathBuf::from)
        .unwrap_or_else(Settings::default_config_path);
    if path.exists() {
        CheckResult::ok("Config file", &format!("{}", path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            &format!("Create {} to override defaults", path.display()),
        )
    }
}

/// Format file size in human-readable format.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
