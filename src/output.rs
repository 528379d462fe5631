use eyre::Result;

use crate::history::HistoryEntry;
use crate::orchestrator::SummaryResult;

const WORDS_PER_MINUTE: usize = 200;

/// Estimated reading time, rounded up to whole minutes
pub fn reading_time_minutes(text: &str) -> usize {
    text.split_whitespace().count().div_ceil(WORDS_PER_MINUTE)
}

/// Render a summary with a short header
pub fn render_text(result: &SummaryResult) -> String {
    let meta = result.metadata.as_ref();
    let title = meta.and_then(|m| m.title.as_deref()).unwrap_or("Unknown Video");
    let mut header = format!("{title} ({})", result.video_id);
    if let Some(author) = meta.and_then(|m| m.author.as_deref()) {
        header.push_str(&format!("\nChannel: {author}"));
    }

    let mut notes = vec![
        format!("{} summary", result.level),
        format!("{} min read", reading_time_minutes(&result.text)),
    ];
    if result.fallback {
        notes.push("template fallback".to_string());
    } else if !result.used_transcript {
        notes.push("no transcript".to_string());
    }

    format!("{header}\n[{}]\n\n{}", notes.join(", "), result.text)
}

/// Render a summary as pretty-printed JSON
pub fn render_json(result: &SummaryResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}

/// Render history newest first with 1-based positions
pub fn render_history<'a>(entries: impl Iterator<Item = &'a HistoryEntry>) -> String {
    let lines: Vec<String> = entries
        .enumerate()
        .map(|(i, e)| {
            let star = if e.is_favorite { "*" } else { " " };
            format!(
                "{:>2}. {star} {} [{}] {} ({})",
                i + 1,
                e.timestamp.format("%Y-%m-%d %H:%M"),
                e.level,
                e.title,
                e.url
            )
        })
        .collect();

    if lines.is_empty() {
        "No history yet.".to_string()
    } else {
        lines.join("\n")
    }
}
