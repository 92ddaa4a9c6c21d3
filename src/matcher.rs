//! Event matcher: binds a bet's free-text event label to one completed game
//! from the score feed.
//!
//! First candidate satisfying either home/away ordering wins; there is no
//! scoring or ranking pass. That keeps ambiguous cases deterministic at the
//! cost of occasional false positives on short aliases, which the alias
//! table's match policy is tuned to limit.

use tracing::debug;

use crate::domain::{BetRecord, GameCandidate, GameScore};
use crate::teams::{split_event_label, AliasTable};

/// Find the completed game matching the bet's event label.
///
/// Returns None when the label cannot be split into two teams, when no
/// completed candidate matches both teams, or when every matching candidate
/// has unresolvable scores. None is not an error: it means "game not yet
/// resolvable" and the bet stays Pending.
pub fn find_game_score(
    aliases: &AliasTable,
    bet: &BetRecord,
    candidates: &[GameCandidate],
) -> Option<GameScore> {
    let teams = split_event_label(&bet.event_label);
    let [team_a, team_b] = match teams.as_slice() {
        [a, b] => [a.as_str(), b.as_str()],
        _ => {
            debug!(
                row_ref = %bet.row_ref,
                event = %bet.event_label,
                "event label could not be split into two teams"
            );
            return None;
        }
    };

    for candidate in candidates {
        if !candidate.completed {
            continue;
        }

        let straight = aliases.team_matches(team_a, &candidate.home_team)
            && aliases.team_matches(team_b, &candidate.away_team);
        let flipped = aliases.team_matches(team_a, &candidate.away_team)
            && aliases.team_matches(team_b, &candidate.home_team);
        if !straight && !flipped {
            continue;
        }

        // A matching candidate with unparseable scores is skipped rather
        // than returned as a partial result.
        match candidate.resolve() {
            Some(score) => {
                debug!(
                    row_ref = %bet.row_ref,
                    home = %score.home_team,
                    away = %score.away_team,
                    "bound bet to completed game"
                );
                return Some(score);
            }
            None => {
                debug!(
                    row_ref = %bet.row_ref,
                    home = %candidate.home_team,
                    away = %candidate.away_team,
                    "matched game has unresolvable scores, continuing"
                );
            }
        }
    }

    None
}
