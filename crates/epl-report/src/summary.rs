// Plain-text console rendering for the three subcommands.

use std::fmt::Write;

use epl_stats::profile::PlayerProfile;
use epl_stats::projection::SeasonProjection;

use crate::pipeline::AnalysisReport;

/// How many of the strongest correlations get their own section.
const STRONGEST_SHOWN: usize = 5;

fn rule(out: &mut String, title: &str) {
    let _ = writeln!(out, "\n{title}");
    let _ = writeln!(out, "{}", "-".repeat(title.len()));
}

/// Correlation table, strongest correlations, and top-vs-bottom deltas.
pub fn render_analysis(report: &AnalysisReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Analyzed {} player rows across {} teams",
        report.players.len(),
        report.teams.len()
    );
    if !report.unmatched.is_empty() {
        let names: Vec<&str> = report.unmatched.iter().map(String::as_str).collect();
        let _ = writeln!(
            out,
            "Teams missing from standings (zero win rate used): {}",
            names.join(", ")
        );
    }

    rule(&mut out, "Correlation with team win rate");
    let _ = writeln!(
        out,
        "{:<28} {:>8} {:>10}  {}",
        "Metric", "r", "p-value", "Significance"
    );
    for c in &report.correlations {
        let _ = writeln!(
            out,
            "{:<28} {:>8.3} {:>10.4}  {}",
            c.metric.label(),
            c.r,
            c.p_value,
            c.significance
        );
    }
    for (metric, err) in &report.correlation_failures {
        let _ = writeln!(
            out,
            "{:<28} {:>8} {:>10}  ({})",
            metric.label(),
            "n/a",
            "n/a",
            err.kind()
        );
    }

    rule(&mut out, "Strongest correlations");
    for (i, c) in report
        .ranked_correlations()
        .iter()
        .take(STRONGEST_SHOWN)
        .enumerate()
    {
        let direction = if c.r >= 0.0 { "positive" } else { "negative" };
        let _ = writeln!(
            out,
            "{}. {} (r = {:.3}, {})",
            i + 1,
            c.metric.label(),
            c.r,
            direction
        );
    }

    let cmp = &report.comparison;
    rule(&mut out, "Top vs bottom teams");
    let _ = writeln!(out, "Top:    {}", cmp.top.join(", "));
    let _ = writeln!(out, "Bottom: {}", cmp.bottom.join(", "));
    for row in &cmp.metrics {
        let pct = match row.percent_difference() {
            Ok(p) => format!("{p:+.1}%"),
            Err(_) => "n/a".to_string(),
        };
        let _ = writeln!(
            out,
            "{:<28} top {:>7.3}  bottom {:>7.3}  diff {:>+7.3}  ({})",
            row.metric.label(),
            row.top_mean,
            row.bottom_mean,
            row.difference,
            pct
        );
    }
    out
}

pub fn render_profile(profile: &PlayerProfile) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} ({}), primary position {} among {} players",
        profile.player, profile.team, profile.primary_position, profile.group_size
    );
    for (axis, rank) in &profile.ranks {
        match rank {
            Some(r) => {
                let _ = writeln!(out, "  {:<22} {:>5.1}th percentile", axis.label(), r);
            }
            None => {
                let _ = writeln!(out, "  {:<22}   n/a", axis.label());
            }
        }
    }
    out
}

pub fn render_projections(projections: &[SeasonProjection]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<26} {:<20} {:>4} {:>5} {:>5} {:>5} {:>7}",
        "Player", "Team", "MP", "Gls", "Ast", "G+A", "xG"
    );
    let show = |v: Option<i64>| v.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string());
    for p in projections {
        let _ = writeln!(
            out,
            "{:<26} {:<20} {:>4} {:>5} {:>5} {:>5} {:>7}",
            p.player,
            p.team,
            p.matches
                .map(|m| m.to_string())
                .unwrap_or_else(|| "-".to_string()),
            show(p.goals),
            show(p.assists),
            show(p.goal_contributions()),
            p.expected_goals
                .map(|v| format!("{v:.2}"))
                .unwrap_or_else(|| "-".to_string()),
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use epl_core::config::AnalysisConfig;
    use epl_core::Metric;
    use epl_stats::players::load_players_from;
    use epl_stats::profile::ProfileAxis;
    use epl_stats::standings::Standings;

    use crate::pipeline::analyze_table;

    const CSV: &str = "\
Player,Team,Gls_90,Ast_90
a,Manchester City,0.8,0.3
b,Arsenal,0.6,0.2
c,Liverpool,0.5,0.4
d,Burnley,0.0,0.1
e,Ipswich Town,0.0,0.05
";

    #[test]
    fn analysis_summary_sections() {
        let (table, load) = load_players_from(CSV.as_bytes()).unwrap();
        let analysis = AnalysisConfig {
            metrics: vec![Metric::GoalsPer90, Metric::AssistsPer90],
            comparison_metrics: vec![Metric::GoalsPer90],
            group_size: 2,
            ..AnalysisConfig::default()
        };
        let report = analyze_table(table, load, &Standings::season_2023_24(), &analysis).unwrap();
        let text = render_analysis(&report);
        assert!(text.contains("Analyzed 5 player rows across 5 teams"));
        assert!(text.contains("Teams missing from standings (zero win rate used): Ipswich Town"));
        assert!(text.contains("Goals per 90"));
        assert!(text.contains("1. Goals per 90"));
        assert!(text.contains("Top:    Manchester City, Arsenal"));
        assert!(text.contains("Bottom: Ipswich Town, Burnley"));
        // both bottom teams average zero goals
        assert!(text.contains("(n/a)"));
    }

    #[test]
    fn failed_metric_shown_as_na() {
        let csv = "Player,Team,Gls_90,CrdR\n\
                   a,Manchester City,0.8,0\n\
                   b,Arsenal,0.6,0\n\
                   c,Burnley,0.1,0\n";
        let (table, load) = load_players_from(csv.as_bytes()).unwrap();
        let analysis = AnalysisConfig {
            metrics: vec![Metric::GoalsPer90, Metric::RedCards],
            comparison_metrics: vec![Metric::GoalsPer90],
            group_size: 1,
            ..AnalysisConfig::default()
        };
        let report = analyze_table(table, load, &Standings::season_2023_24(), &analysis).unwrap();
        let text = render_analysis(&report);
        let line = text
            .lines()
            .find(|l| l.starts_with("Red Cards"))
            .unwrap();
        assert!(line.contains("n/a"));
        assert!(line.ends_with("(degenerate input)"));
        assert!(text.contains("1. Goals per 90"));
        assert!(!text.contains(". Red Cards"));
    }

    #[test]
    fn profile_shows_missing_rank() {
        let profile = PlayerProfile {
            player: "Saka".into(),
            team: "Arsenal".into(),
            primary_position: "FW".into(),
            group_size: 4,
            ranks: vec![
                (ProfileAxis::GoalsPer90, Some(75.0)),
                (ProfileAxis::AssistsPer90, None),
            ],
        };
        let text = render_profile(&profile);
        assert!(text.starts_with("Saka (Arsenal), primary position FW among 4 players"));
        assert!(text.contains("75.0th percentile"));
        assert!(text.contains("n/a"));
    }

    #[test]
    fn projections_dash_for_missing() {
        let proj = SeasonProjection {
            player: "x".into(),
            team: "Fulham".into(),
            age: None,
            age_factor: 1.0,
            matches: None,
            goals: Some(3),
            assists: None,
            expected_goals: None,
            expected_assists: None,
        };
        let text = render_projections(&[proj]);
        let row = text.lines().nth(1).unwrap();
        assert!(row.starts_with("x "));
        assert!(row.contains(" 3 "));
        assert!(row.trim_end().ends_with('-'));
    }
}
