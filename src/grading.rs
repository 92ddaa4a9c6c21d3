//! Grading rule engine.
//!
//! Pure mapping from (selection, bet kind, line, bound score, period
//! qualifier) to an outcome plus a rationale string showing the arithmetic.
//! The rationale is the primary audit artifact, so every branch spells out
//! its operands and comparison.

use rust_decimal::Decimal;

use crate::domain::{BetKind, GameScore, Outcome, PeriodQualifier};
use crate::teams::AliasTable;

/// Outcome plus human-readable arithmetic for one grading attempt
#[derive(Debug, Clone)]
pub struct Grade {
    pub outcome: Outcome,
    pub rationale: String,
}

impl Grade {
    fn pending(reason: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Pending,
            rationale: reason.into(),
        }
    }
}

/// Which side of the matched game the wager is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Home,
    Away,
}

/// Grade one selection against a bound score. Deterministic and total over
/// the declared bet kinds: every input produces a Grade, with Pending as the
/// terminal state for anything not arithmetically resolvable.
pub fn grade(
    aliases: &AliasTable,
    selection: &str,
    kind: BetKind,
    line: Option<Decimal>,
    score: &GameScore,
    period: Option<PeriodQualifier>,
) -> Grade {
    // Period-qualified bets grade on the cumulative score through that
    // period, never the final score.
    let (home_pts, away_pts) = match period {
        Some(q) => match score.pair_through(q.periods()) {
            Some(pair) => pair,
            None => return Grade::pending(format!("period score unavailable for {q}")),
        },
        None => score.final_pair(),
    };
    let window = period.map(|q| format!("{q} ")).unwrap_or_default();

    match kind {
        BetKind::Parlay | BetKind::Prop | BetKind::Other => Grade::pending(format!(
            "{kind} bets require manual review; not graded automatically"
        )),
        BetKind::Total => grade_total(selection, line, home_pts, away_pts, &window),
        BetKind::Moneyline => {
            grade_moneyline(aliases, selection, score, home_pts, away_pts, &window)
        }
        BetKind::Spread => {
            grade_spread(aliases, selection, line, score, home_pts, away_pts, &window)
        }
    }
}

fn grade_total(
    selection: &str,
    line: Option<Decimal>,
    home_pts: i32,
    away_pts: i32,
    window: &str,
) -> Grade {
    let Some(over) = total_direction(selection) else {
        return Grade::pending(format!(
            "total selection '{selection}' has no Over/Under direction"
        ));
    };

    let Some(line) = line.or_else(|| parse_line(selection)) else {
        return Grade::pending(format!("total selection '{selection}' has no line"));
    };

    let total = Decimal::from(home_pts + away_pts);
    let side = if over { "Over" } else { "Under" };
    let outcome = if total == line {
        Outcome::Push
    } else if (total > line) == over {
        Outcome::Win
    } else {
        Outcome::Loss
    };

    let cmp = if total > line {
        ">"
    } else if total < line {
        "<"
    } else {
        "=="
    };
    Grade {
        outcome,
        rationale: format!(
            "{side} {line}: {window}total = {away_pts} + {home_pts} = {total}; {total} {cmp} {line} -> {outcome}"
        ),
    }
}

/// Over/Under direction as a whole token. Substring matching would read
/// "Thunder" as Under.
fn total_direction(selection: &str) -> Option<bool> {
    for token in selection.split_whitespace() {
        match token.to_ascii_lowercase().as_str() {
            "over" => return Some(true),
            "under" => return Some(false),
            _ => {}
        }
    }
    None
}

fn grade_moneyline(
    aliases: &AliasTable,
    selection: &str,
    score: &GameScore,
    home_pts: i32,
    away_pts: i32,
    window: &str,
) -> Grade {
    let team_text = selection_team_text(selection);
    let Some(side) = selected_side(aliases, &team_text, score) else {
        return Grade::pending(format!(
            "could not attribute selection '{selection}' to either team"
        ));
    };
    let (selected, opponent, sel_pts, opp_pts) = side_scores(side, score, home_pts, away_pts);

    // Tied score with no overtime data is left Pending rather than guessing
    // Push or Win.
    let outcome = match sel_pts.cmp(&opp_pts) {
        std::cmp::Ordering::Greater => Outcome::Win,
        std::cmp::Ordering::Less => Outcome::Loss,
        std::cmp::Ordering::Equal => {
            return Grade::pending(format!(
                "{selected} ML: {window}score tied {sel_pts}-{opp_pts}, cannot resolve"
            ))
        }
    };

    let cmp = if sel_pts > opp_pts { ">" } else { "<" };
    Grade {
        outcome,
        rationale: format!(
            "{selected} ML: {window}{selected} {sel_pts} {cmp} {opponent} {opp_pts} -> {outcome}"
        ),
    }
}

fn grade_spread(
    aliases: &AliasTable,
    selection: &str,
    line: Option<Decimal>,
    score: &GameScore,
    home_pts: i32,
    away_pts: i32,
    window: &str,
) -> Grade {
    let Some(line) = line.or_else(|| parse_line(selection)) else {
        return Grade::pending(format!("spread selection '{selection}' has no line"));
    };
    let team_text = selection_team_text(selection);
    let Some(side) = selected_side(aliases, &team_text, score) else {
        return Grade::pending(format!(
            "could not attribute selection '{selection}' to either team"
        ));
    };
    let (selected, opponent, sel_pts, opp_pts) = side_scores(side, score, home_pts, away_pts);
    let abs_line = line.abs();

    if line.is_sign_negative() && !line.is_zero() {
        // Favorite laying points: outright loss (or tie) loses outright;
        // a win is measured against the line.
        if sel_pts <= opp_pts {
            return Grade {
                outcome: Outcome::Loss,
                rationale: format!(
                    "{selected} {line}: {window}did not win outright ({sel_pts}-{opp_pts}) -> Loss"
                ),
            };
        }
        let margin = Decimal::from(sel_pts - opp_pts);
        let (outcome, cmp) = if margin > abs_line {
            (Outcome::Win, ">")
        } else if margin < abs_line {
            (Outcome::Loss, "<")
        } else {
            (Outcome::Push, "==")
        };
        Grade {
            outcome,
            rationale: format!(
                "{selected} {line}: {window}won {sel_pts}-{opp_pts}, margin = {sel_pts} - {opp_pts} = {margin}; {margin} {cmp} {abs_line} -> {outcome}"
            ),
        }
    } else {
        // Underdog getting points: outright win is an unconditional Win;
        // a loss is measured against the line.
        if sel_pts > opp_pts {
            return Grade {
                outcome: Outcome::Win,
                rationale: format!(
                    "{selected} +{abs_line}: {window}won outright {sel_pts}-{opp_pts} -> Win"
                ),
            };
        }
        let margin = Decimal::from(opp_pts - sel_pts);
        let (outcome, cmp) = if margin < abs_line {
            (Outcome::Win, "<")
        } else if margin > abs_line {
            (Outcome::Loss, ">")
        } else {
            (Outcome::Push, "==")
        };
        Grade {
            outcome,
            rationale: format!(
                "{selected} +{abs_line}: {window}lost {sel_pts}-{opp_pts}, margin = {opp_pts} - {sel_pts} = {margin}; {margin} {cmp} {abs_line} -> {outcome}"
            ),
        }
    }
}

fn side_scores(
    side: Side,
    score: &GameScore,
    home_pts: i32,
    away_pts: i32,
) -> (String, String, i32, i32) {
    match side {
        Side::Home => (
            score.home_team.clone(),
            score.away_team.clone(),
            home_pts,
            away_pts,
        ),
        Side::Away => (
            score.away_team.clone(),
            score.home_team.clone(),
            away_pts,
            home_pts,
        ),
    }
}

/// Match the selection's team text against exactly one side of the game.
/// Both sides matching means the selection is ambiguous; neither side
/// matching means it names a player or something else ungradable.
fn selected_side(aliases: &AliasTable, team_text: &str, score: &GameScore) -> Option<Side> {
    if team_text.trim().is_empty() {
        return None;
    }
    let home = aliases.team_matches(team_text, &score.home_team);
    let away = aliases.team_matches(team_text, &score.away_team);
    match (home, away) {
        (true, false) => Some(Side::Home),
        (false, true) => Some(Side::Away),
        _ => None,
    }
}

/// Strip line numbers, period markers and bet-type noise from a selection,
/// leaving the team name ("Magic +36.5 1H" -> "Magic").
fn selection_team_text(selection: &str) -> String {
    selection
        .split_whitespace()
        .filter(|token| {
            if parse_numeric_token(token).is_some() {
                return false;
            }
            if PeriodQualifier::detect(token).is_some() {
                return false;
            }
            !matches!(
                token.to_ascii_lowercase().as_str(),
                "ml" | "moneyline" | "over" | "under" | "o/u" | "pts" | "points"
            )
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Last signed number embedded in the selection ("+36.5" -> 36.5)
fn parse_line(selection: &str) -> Option<Decimal> {
    selection
        .split_whitespace()
        .filter_map(parse_numeric_token)
        .last()
}

fn parse_numeric_token(token: &str) -> Option<Decimal> {
    let cleaned = token.trim_start_matches('+');
    cleaned.parse::<Decimal>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn score(home: &str, away: &str, home_score: i32, away_score: i32) -> GameScore {
        GameScore {
            home_team: home.into(),
            away_team: away.into(),
            home_score,
            away_score,
            completed: true,
            period_scores: None,
        }
    }

    fn grade_simple(selection: &str, kind: BetKind, line: Option<Decimal>, s: &GameScore) -> Grade {
        grade(&AliasTable::nba_defaults(), selection, kind, line, s, None)
    }

    #[test]
    fn test_underdog_covers() {
        // Magic +36.5, lost 92-128: margin 36 < 36.5 -> Win
        let s = score("Oklahoma City Thunder", "Orlando Magic", 128, 92);
        let g = grade_simple("Magic +36.5", BetKind::Spread, Some(dec!(36.5)), &s);
        assert_eq!(g.outcome, Outcome::Win);
        assert!(g.rationale.contains("36"), "rationale: {}", g.rationale);
    }

    #[test]
    fn test_underdog_blown_out() {
        // Jazz +8, lost 124-140: margin 16 > 8 -> Loss
        let s = score("Phoenix Suns", "Utah Jazz", 140, 124);
        let g = grade_simple("Jazz +8", BetKind::Spread, Some(dec!(8)), &s);
        assert_eq!(g.outcome, Outcome::Loss);
    }

    #[test]
    fn test_underdog_wins_outright() {
        let s = score("Phoenix Suns", "Utah Jazz", 110, 112);
        let g = grade_simple("Jazz +8", BetKind::Spread, Some(dec!(8)), &s);
        assert_eq!(g.outcome, Outcome::Win);
        assert!(g.rationale.contains("outright"));
    }

    #[test]
    fn test_favorite_pushes_on_exact_margin() {
        // Celtics -10, won 120-110: margin 10 == 10 -> Push
        let s = score("Boston Celtics", "Brooklyn Nets", 120, 110);
        let g = grade_simple("Celtics -10", BetKind::Spread, Some(dec!(-10)), &s);
        assert_eq!(g.outcome, Outcome::Push);
    }

    #[test]
    fn test_favorite_covers_and_misses() {
        let s = score("Boston Celtics", "Brooklyn Nets", 125, 110);
        let g = grade_simple("Celtics -10", BetKind::Spread, Some(dec!(-10)), &s);
        assert_eq!(g.outcome, Outcome::Win);

        let s = score("Boston Celtics", "Brooklyn Nets", 115, 110);
        let g = grade_simple("Celtics -10", BetKind::Spread, Some(dec!(-10)), &s);
        assert_eq!(g.outcome, Outcome::Loss);
    }

    #[test]
    fn test_favorite_loses_outright() {
        let s = score("Boston Celtics", "Brooklyn Nets", 105, 110);
        let g = grade_simple("Celtics -10", BetKind::Spread, Some(dec!(-10)), &s);
        assert_eq!(g.outcome, Outcome::Loss);
        assert!(g.rationale.contains("did not win outright"));
    }

    #[test]
    fn test_spread_antisymmetry() {
        // Swapping the selected team and negating the line must flip
        // Win<->Loss and preserve Push.
        let s = score("Boston Celtics", "Brooklyn Nets", 120, 110);
        for line in [dec!(3.5), dec!(10), dec!(12.5)] {
            let favorite = grade_simple(
                "Celtics",
                BetKind::Spread,
                Some(-line),
                &s,
            );
            let underdog = grade_simple("Nets", BetKind::Spread, Some(line), &s);
            match favorite.outcome {
                Outcome::Win => assert_eq!(underdog.outcome, Outcome::Loss),
                Outcome::Loss => assert_eq!(underdog.outcome, Outcome::Win),
                Outcome::Push => assert_eq!(underdog.outcome, Outcome::Push),
                Outcome::Pending => panic!("spread grade should not be pending"),
            }
        }
    }

    #[test]
    fn test_total_under_boundary() {
        // Over 237, total 236 -> Loss
        let s = score("Denver Nuggets", "Miami Heat", 123, 113);
        let g = grade_simple("Over 237", BetKind::Total, Some(dec!(237)), &s);
        assert_eq!(g.outcome, Outcome::Loss);
        assert!(g.rationale.contains("236"));
    }

    #[test]
    fn test_total_push_boundary_never_win_or_loss() {
        let s = score("Denver Nuggets", "Miami Heat", 123, 113);
        for selection in ["Over 236", "Under 236"] {
            let g = grade_simple(selection, BetKind::Total, Some(dec!(236)), &s);
            assert_eq!(g.outcome, Outcome::Push, "{selection} on the number");
        }
    }

    #[test]
    fn test_total_monotonic_in_total_minus_line() {
        let s = score("Denver Nuggets", "Miami Heat", 123, 113); // total 236
        let over_below = grade_simple("Over 240", BetKind::Total, Some(dec!(240)), &s);
        let over_above = grade_simple("Over 230", BetKind::Total, Some(dec!(230)), &s);
        assert_eq!(over_below.outcome, Outcome::Loss);
        assert_eq!(over_above.outcome, Outcome::Win);

        let under_below = grade_simple("Under 240", BetKind::Total, Some(dec!(240)), &s);
        let under_above = grade_simple("Under 230", BetKind::Total, Some(dec!(230)), &s);
        assert_eq!(under_below.outcome, Outcome::Win);
        assert_eq!(under_above.outcome, Outcome::Loss);
    }

    #[test]
    fn test_total_direction_is_a_whole_token() {
        // "Thunder" must not read as Under
        let s = score("Oklahoma City Thunder", "Orlando Magic", 128, 92);
        let g = grade_simple(
            "Thunder team total 110.5",
            BetKind::Total,
            Some(dec!(110.5)),
            &s,
        );
        assert_eq!(g.outcome, Outcome::Pending);
        assert!(g.rationale.contains("no Over/Under direction"));

        let g = grade_simple("Under 236.5", BetKind::Total, Some(dec!(236.5)), &s);
        assert_eq!(g.outcome, Outcome::Win); // total 220 < 236.5
    }

    #[test]
    fn test_moneyline_win_loss() {
        let s = score("Oklahoma City Thunder", "Orlando Magic", 128, 92);
        let g = grade_simple("Thunder ML", BetKind::Moneyline, None, &s);
        assert_eq!(g.outcome, Outcome::Win);

        let g = grade_simple("Magic ML", BetKind::Moneyline, None, &s);
        assert_eq!(g.outcome, Outcome::Loss);
    }

    #[test]
    fn test_moneyline_tie_stays_pending() {
        let s = score("Oklahoma City Thunder", "Orlando Magic", 100, 100);
        let g = grade_simple("Magic ML", BetKind::Moneyline, None, &s);
        assert_eq!(g.outcome, Outcome::Pending);
        assert!(g.rationale.contains("tied"));
    }

    #[test]
    fn test_parlay_and_prop_flag_manual_review() {
        let s = score("Oklahoma City Thunder", "Orlando Magic", 128, 92);
        for kind in [BetKind::Parlay, BetKind::Prop, BetKind::Other] {
            let g = grade_simple("Magic ML / Over 220", kind, None, &s);
            assert_eq!(g.outcome, Outcome::Pending);
            assert!(g.rationale.contains("manual review"));
        }
    }

    #[test]
    fn test_period_qualified_uses_cumulative_score() {
        let mut s = score("Boston Celtics", "Los Angeles Lakers", 118, 110);
        s.period_scores = Some(vec![(28, 25), (31, 29), (30, 28), (29, 28)]);

        // 1H: Celtics 59, Lakers 54 -> total 113
        let g = grade(
            &AliasTable::nba_defaults(),
            "Over 110 1H",
            BetKind::Total,
            Some(dec!(110)),
            &s,
            Some(PeriodQualifier::H1),
        );
        assert_eq!(g.outcome, Outcome::Win);
        assert!(g.rationale.contains("113"));

        // 1H spread: Lakers +4.5, down 5 at the half -> Loss
        let g = grade(
            &AliasTable::nba_defaults(),
            "Lakers 1H +4.5",
            BetKind::Spread,
            Some(dec!(4.5)),
            &s,
            Some(PeriodQualifier::H1),
        );
        assert_eq!(g.outcome, Outcome::Loss);
    }

    #[test]
    fn test_period_scores_missing_is_pending() {
        let s = score("Boston Celtics", "Los Angeles Lakers", 118, 110);
        let g = grade(
            &AliasTable::nba_defaults(),
            "Lakers 1H +4.5",
            BetKind::Spread,
            Some(dec!(4.5)),
            &s,
            Some(PeriodQualifier::H1),
        );
        assert_eq!(g.outcome, Outcome::Pending);
        assert!(g.rationale.contains("period score unavailable"));
    }

    #[test]
    fn test_line_parsed_from_selection_when_missing() {
        let s = score("Oklahoma City Thunder", "Orlando Magic", 128, 92);
        let g = grade_simple("Magic +36.5", BetKind::Spread, None, &s);
        assert_eq!(g.outcome, Outcome::Win);
    }

    #[test]
    fn test_ambiguous_selection_is_pending() {
        let s = score("Oklahoma City Thunder", "Orlando Magic", 128, 92);
        let g = grade_simple("first basket scorer", BetKind::Moneyline, None, &s);
        assert_eq!(g.outcome, Outcome::Pending);
    }
}
