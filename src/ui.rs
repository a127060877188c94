use colored::Colorize;

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Shorten a body for one-line display, keeping the start
pub fn truncate(text: &str, max_len: usize) -> String {
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_len {
        flat
    } else if max_len <= 3 {
        "...".to_string()
    } else {
        let kept: String = flat.chars().take(max_len - 3).collect();
        format!("{kept}...")
    }
}

/// Pretty-print JSON text; anything else is returned unchanged
pub fn pretty(text: &str) -> String {
    serde_json::from_str::<serde_json::Value>(text)
        .and_then(|v| serde_json::to_string_pretty(&v))
        .unwrap_or_else(|_| text.to_string())
}

/// Show a line diff from `observed` to `desired`
pub fn print_diff(observed: &str, desired: &str) {
    let observed = pretty(observed);
    let desired = pretty(desired);
    let diff = similar::TextDiff::from_lines(&observed, &desired);
    let mut has_changes = false;

    for change in diff.iter_all_changes() {
        let line = change.to_string_lossy();
        let line = line.trim_end_matches('\n');
        match change.tag() {
            similar::ChangeTag::Delete => {
                has_changes = true;
                println!("    {}", format!("- {line}").red());
            }
            similar::ChangeTag::Insert => {
                has_changes = true;
                println!("    {}", format!("+ {line}").green());
            }
            similar::ChangeTag::Equal => println!("      {}", line.dimmed()),
        }
    }

    if !has_changes {
        println!("    {}", "(bodies are identical)".dimmed());
    }
}

// ============================================================================
// Tests
// ============================================================================
