use colored::*;
use jiff::Timestamp;

use crate::models::{
    contract::{Contract, ContractStatus},
    store::StatusCounts,
};

/// Get the terminal width, defaulting to 80 if unavailable
fn get_terminal_width() -> usize {
    term_size::dimensions().map(|(w, _)| w).unwrap_or(80)
}

/// Human label for a status
pub fn status_label(status: ContractStatus) -> &'static str {
    match status {
        ContractStatus::Draft => "Draft",
        ContractStatus::SentForSigning => "Pending signature",
        ContractStatus::Signed => "Signed",
    }
}

pub fn status_badge(status: ContractStatus) -> ColoredString {
    match status {
        ContractStatus::Draft => "DRAFT".yellow(),
        ContractStatus::SentForSigning => "PENDING".blue(),
        ContractStatus::Signed => "SIGNED".green(),
    }
}

/// Get the status glyph for a contract. Sent contracts past their
/// expiration date are flagged red.
pub fn get_status_glyph(contract: &Contract, now: Timestamp) -> ColoredString {
    match contract.status {
        ContractStatus::Signed => "✓".dimmed(),
        _ if contract.is_signing_overdue(now) => "●".red(),
        ContractStatus::SentForSigning => "◐".blue(),
        ContractStatus::Draft => "○".normal(),
    }
}

/// Render a single contract line with ID, glyph, client/project, and right-aligned status
pub fn render_contract_line(contract: &Contract, now: Timestamp) {
    let terminal_width = get_terminal_width();

    let glyph = get_status_glyph(contract, now);
    let title = format!(
        "{} / {}",
        contract.draft.client.name, contract.draft.project.name
    );
    let left_section = format!("  {}  {}  {}", contract.contract_id, glyph, title);

    let styled_left = if contract.status == ContractStatus::Signed {
        left_section.dimmed()
    } else {
        left_section.bold()
    };

    let right_section = format!(
        "{}  ·  {}",
        format_date(contract.created_at),
        status_label(contract.status)
    );

    // Glyph counts as one column
    let left_visible_len = format!("  {}  {}  {}", contract.contract_id, " ", title)
        .chars()
        .count();
    let total_content = left_visible_len + right_section.chars().count();

    if total_content + 4 < terminal_width {
        let padding = terminal_width - total_content - 2;
        println!(
            "{}{}{}",
            styled_left,
            " ".repeat(padding),
            right_section.dimmed()
        );
    } else {
        println!("{}", styled_left);
    }
}

/// Render a view header with title and count
pub fn render_view_header(title: &str, count: usize) {
    let word = if count == 1 { "contract" } else { "contracts" };
    println!("\n  {} ({} {})\n", title.cyan().bold(), count, word);
}

/// The dashboard status bar
pub fn render_status_counts(counts: StatusCounts) {
    println!(
        "  {} {}   {} {}   {} {}",
        status_badge(ContractStatus::Draft),
        counts.draft,
        status_badge(ContractStatus::SentForSigning),
        counts.sent_for_signing,
        status_badge(ContractStatus::Signed),
        counts.signed
    );
}

/// Full detail view used by `show`
pub fn render_contract_details(contract: &Contract, now: Timestamp) {
    let draft = &contract.draft;

    println!(
        "\n  {}  {}\n",
        contract.contract_id.cyan().bold(),
        status_badge(contract.status)
    );

    let mut rows = vec![
        ("Client", draft.client.name.clone()),
        ("Company", draft.client.company.clone()),
        ("Email", draft.client.email.clone()),
        ("Project", draft.project.name.clone()),
        ("Total", draft.project.total_cost.clone()),
        ("Created", format_date(contract.created_at)),
    ];
    if let Some(sent_at) = contract.sent_at {
        rows.push(("Sent", format_date(sent_at)));
    }
    if let Some(expires_at) = contract.expires_at {
        let expires = format_date(expires_at);
        rows.push((
            "Expires",
            if contract.is_signing_overdue(now) {
                format!("{} (expired)", expires)
            } else {
                expires
            },
        ));
    }
    if let Some(signed_at) = contract.signed_at {
        rows.push(("Signed", format_date(signed_at)));
    }
    rows.push(("Signing link", contract.signable_url.clone()));

    for (label, value) in rows.into_iter().filter(|(_, v)| !v.trim().is_empty()) {
        println!("  {}{}", format!("{:<14}", format!("{}:", label)).dimmed(), value);
    }
    println!();
}

/// Format a timestamp in the local time zone (e.g., "Feb 15, 2026")
pub fn format_date(timestamp: Timestamp) -> String {
    let zoned = jiff::Zoned::new(timestamp, jiff::tz::TimeZone::system());
    zoned.strftime("%b %d, %Y").to_string()
}
