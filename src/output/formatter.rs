use owo_colors::OwoColorize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::pool::{Completeness, PoolEntry, QualificationReason, SeasonPool};
use crate::scoring::{Category, PointBreakdown, RegimeKind};
use crate::season::ScoredEvent;

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format points without a trailing ".0" (68, 6.15)
pub fn format_points(points: f64) -> String {
    if points.fract() == 0.0 {
        format!("{:.0}", points)
    } else {
        let formatted = format!("{:.2}", points);
        formatted.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate a name to fit available width, accounting for Unicode
fn truncate_name(name: &str, max_width: usize) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= max_width {
        name.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

fn fit_name(name: &str, fixed_width: usize, term_width: Option<usize>) -> String {
    match term_width {
        Some(width) if width > fixed_width + 10 => truncate_name(name, width - fixed_width),
        // Very narrow terminal, show truncated
        Some(_) => truncate_name(name, 20),
        // No terminal (pipe), don't truncate
        None => name.to_string(),
    }
}

fn regime_label(regime: RegimeKind) -> &'static str {
    match regime {
        RegimeKind::Weekly => "weekly slots",
        RegimeKind::PerEvent => "top-N per event",
    }
}

/// Format an event's breakdowns as a table sorted by total.
/// Columns: Index, Team, Total, Qual, Alliance, Playoff, Awards, Rookie.
/// A trailing `*` marks a breakdown that carries warnings.
pub fn format_event_table(event: &ScoredEvent, use_colors: bool) -> String {
    let title = match &event.name {
        Some(name) => format!("{} {} (week {})", event.code(), name, event.week()),
        None => format!("{} (week {})", event.code(), event.week()),
    };

    let mut lines = Vec::new();
    if use_colors {
        lines.push(title.bold().to_string());
    } else {
        lines.push(title);
    }

    if event.breakdowns.is_empty() {
        lines.push("No teams scored.".to_string());
        return lines.join("\n");
    }

    let header = format!(
        "{:>4} {:>6} {:>6} {:>5} {:>5} {:>5} {:>5} {:>5}",
        "#", "team", "total", "qual", "alli", "play", "award", "rook"
    );
    if use_colors {
        lines.push(header.dimmed().to_string());
    } else {
        lines.push(header);
    }

    for (idx, b) in event.by_total().iter().enumerate() {
        let index_str = format!("{:>3}.", idx + 1);
        let total = format!("{:>6}", format_points(b.total()));
        let columns: Vec<String> = Category::ALL
            .iter()
            .map(|c| format!("{:>5}", format_points(b.points(*c))))
            .collect();
        let marker = if b.warnings().is_empty() { "" } else { "*" };

        if use_colors {
            lines.push(format!(
                "{} {:>6} {} {}{}",
                index_str.dimmed(),
                b.team(),
                total.bold(),
                columns.join(" "),
                marker.yellow()
            ));
        } else {
            lines.push(format!(
                "{} {:>6} {} {}{}",
                index_str,
                b.team(),
                total,
                columns.join(" "),
                marker
            ));
        }
    }

    for excluded in &event.excluded {
        lines.push(format!("  excluded: {}", excluded.reason));
    }

    lines.join("\n")
}

/// Format one breakdown with per-category descriptions (for --team and verbose mode)
pub fn format_breakdown_detail(b: &PointBreakdown, use_colors: bool) -> String {
    let mut lines = Vec::new();
    let heading = format!("Team {} at {} (week {})", b.team(), b.event(), b.week());
    if use_colors {
        lines.push(heading.bold().to_string());
    } else {
        lines.push(heading);
    }

    for c in b.categories() {
        lines.push(format!(
            "  {:<20} {:>6}  {}",
            c.category.label(),
            format_points(c.points),
            c.description
        ));
    }

    let total = format_points(b.total());
    if use_colors {
        lines.push(format!("  {:<20} {:>6}", "Total", total.bold()));
    } else {
        lines.push(format!("  {:<20} {:>6}", "Total", total));
    }

    for warning in b.warnings() {
        if use_colors {
            lines.push(format!("  {} {}", "warning:".yellow(), warning));
        } else {
            lines.push(format!("  warning: {}", warning));
        }
    }

    lines.join("\n")
}

fn reason_colored(reason: QualificationReason, padded: &str) -> String {
    match reason {
        QualificationReason::PreQualified => padded.magenta().to_string(),
        QualificationReason::AutoAdvance => padded.green().to_string(),
        QualificationReason::SlotFill => padded.cyan().to_string(),
        QualificationReason::Backfill => padded.blue().to_string(),
        QualificationReason::AtLarge => padded.dimmed().to_string(),
    }
}

fn week_cell(entry: &PoolEntry) -> String {
    match entry.week {
        Some(0) => "pre".to_string(),
        Some(week) => format!("w{}", week),
        None => "-".to_string(),
    }
}

/// Format standings as a table: Index, Team, Points, Week, Reason, Name.
pub fn format_pool_table(pool: &SeasonPool, use_colors: bool) -> String {
    if pool.entries.is_empty() {
        return "No teams in pool.".to_string();
    }

    let term_width = get_terminal_width();
    let separator = "  ";
    // index 4, team 6, points 6, week 4, reason 13, separators
    let fixed_width = 4 + 1 + 6 + 1 + 6 + 1 + 4 + 1 + 13 + separator.len();

    pool.entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            let index_str = format!("{:>3}.", idx + 1);
            let points = format!("{:>6}", format_points(entry.points));
            let week = format!("{:>4}", week_cell(entry));
            let reason = format!("{:<13}", entry.reason.label());
            let name = fit_name(entry.name.as_deref().unwrap_or(""), fixed_width, term_width);
            let marker = if entry.warnings.is_empty() { "" } else { "*" };

            if use_colors {
                format!(
                    "{} {:>6} {} {} {}{}{}{}",
                    index_str.dimmed(),
                    entry.team,
                    points.bold(),
                    week,
                    reason_colored(entry.reason, &reason),
                    separator,
                    name,
                    marker.yellow()
                )
            } else {
                format!(
                    "{} {:>6} {} {} {}{}{}{}",
                    index_str, entry.team, points, week, reason, separator, name, marker
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// One-paragraph summary of a pool: scope, counts per reason and, for a
/// partial season, the events that could not be retrieved.
pub fn format_pool_summary(pool: &SeasonPool, use_colors: bool) -> String {
    let mut lines = vec![format!(
        "Season {} through week {} ({} rules, {}): {} events, {} entries",
        pool.season,
        pool.through_week,
        pool.rules_season,
        regime_label(pool.regime),
        pool.events_processed,
        pool.entries.len()
    )];

    let counts: Vec<String> = [
        QualificationReason::PreQualified,
        QualificationReason::AutoAdvance,
        QualificationReason::SlotFill,
        QualificationReason::Backfill,
        QualificationReason::AtLarge,
    ]
    .iter()
    .filter_map(|r| match pool.count(*r) {
        0 => None,
        n => Some(format!("{} {}", n, r.label())),
    })
    .collect();
    if !counts.is_empty() {
        lines.push(counts.join(", "));
    }

    if let Completeness::Partial { missing } = &pool.completeness {
        let events: Vec<String> = missing.iter().map(|k| k.to_string()).collect();
        let notice = format!(
            "Partial season: {} event(s) unavailable: {}",
            missing.len(),
            events.join(", ")
        );
        if use_colors {
            lines.push(notice.yellow().to_string());
        } else {
            lines.push(notice);
        }
    }

    lines.join("\n")
}

/// Format standings as tab-separated values for scripting
/// Columns: team, points, week, reason, event, name (no headers, no colors)
pub fn format_pool_tsv(pool: &SeasonPool) -> String {
    pool.entries
        .iter()
        .map(|entry| {
            format!(
                "{}\t{}\t{}\t{}\t{}\t{}",
                entry.team,
                format_points(entry.points),
                entry.week.map(|w| w.to_string()).unwrap_or_default(),
                entry.reason.label(),
                entry.event.as_deref().unwrap_or(""),
                entry.name.as_deref().unwrap_or("")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
