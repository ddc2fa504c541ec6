//! Prompt templates for the text-generation backend.

/// Prompt asking for insights and actions on a summary.
#[must_use]
pub fn analyze(summary: &str) -> String {
    format!(
        "You are LedgerLens, an expert AI business analyst for small businesses.\n\
         Given the numeric summary below, produce:\n\
         \u{2022} 3 concise insights\n\
         \u{2022} 2 practical actions to improve profit/cashflow this week\n\n\
         SUMMARY: {summary}"
    )
}

/// Prompt answering a free-form question about a summary.
#[must_use]
pub fn suggest(summary: &str, question: &str) -> String {
    format!(
        "You are LedgerLens, an AI strategist for a small business.\n\
         Context: {summary}\n\n\
         Question: {question}\n\n\
         Provide 3 short, concrete, data-aware suggestions. Be specific."
    )
}

/// Prompt for the dated daily report.
#[must_use]
pub fn daily_report(summary: &str, date: &str) -> String {
    format!(
        "Create a concise daily business report from this summary. \
         Include: (1) one-line outlook, (2) 3 bullet insights, (3) 2 actions for cashflow.\n\n\
         SUMMARY: {summary}\nDATE: {date}"
    )
}
