//! Decide which derived computations a status change requires.
//!
//! Every rule is a pure function of a single axis transition. The pipeline
//! captures the previous [`StatusAxes`] before applying a mutation and feeds
//! both snapshots to [`evaluate`].

use tracing::debug;

use crate::state::status::{ResultsStatus, StatusAxes, ThemeStatus, TournamentStatus};

/// Status axis carrying a trigger. The other axes never request computations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Theme voting status.
    Theme,
    /// Rating and results status.
    Results,
    /// Tournament status.
    Tournament,
}

/// Value of one axis before and after a mutation. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusTransition<T> {
    /// Axis being observed.
    pub axis: Axis,
    /// Value captured before the mutation was applied.
    pub previous: T,
    /// Value proposed by the mutation.
    pub next: T,
}

impl<T: PartialEq> StatusTransition<T> {
    /// Whether the mutation changes this axis.
    pub fn changed(&self) -> bool {
        self.previous != self.next
    }
}

/// Expensive recomputation requested by a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivedComputation {
    /// Build the theme shortlist from the voting round.
    ComputeShortlist,
    /// Compute entry rankings from the ratings.
    ComputeRankings,
    /// Drop previously computed rankings.
    ClearRankings,
    /// Pre-fill the tournament leaderboard from existing high scores.
    SeedTournament,
}

impl DerivedComputation {
    /// Informational message shown to the moderator once the computation ran.
    ///
    /// Tournament seeding has no message.
    pub fn info_message(self) -> Option<&'static str> {
        match self {
            Self::ComputeShortlist => Some("Theme shortlist computed."),
            Self::ComputeRankings => Some("Event results computed."),
            Self::ClearRankings => Some("Event results cleared."),
            Self::SeedTournament => None,
        }
    }
}

/// Shortlist runs whenever the new theme status is `shortlist`, even if it already was.
pub fn theme_trigger(transition: &StatusTransition<ThemeStatus>) -> Option<DerivedComputation> {
    (transition.next == ThemeStatus::Shortlist).then_some(DerivedComputation::ComputeShortlist)
}

/// Rankings are computed when entering `results` and cleared when leaving it.
pub fn results_trigger(
    transition: &StatusTransition<ResultsStatus>,
) -> Option<DerivedComputation> {
    if !transition.changed() {
        return None;
    }
    if transition.next == ResultsStatus::Results {
        Some(DerivedComputation::ComputeRankings)
    } else if transition.previous == ResultsStatus::Results {
        Some(DerivedComputation::ClearRankings)
    } else {
        None
    }
}

/// Seeding only happens when the tournament leaves `off`.
pub fn tournament_trigger(
    transition: &StatusTransition<TournamentStatus>,
) -> Option<DerivedComputation> {
    (transition.previous == TournamentStatus::Off && transition.next != TournamentStatus::Off)
        .then_some(DerivedComputation::SeedTournament)
}

/// Evaluate every trigger in order: theme, results, tournament.
pub fn evaluate(previous: &StatusAxes, next: &StatusAxes) -> Vec<DerivedComputation> {
    let theme = StatusTransition {
        axis: Axis::Theme,
        previous: previous.theme,
        next: next.theme,
    };
    let results = StatusTransition {
        axis: Axis::Results,
        previous: previous.results,
        next: next.results,
    };
    let tournament = StatusTransition {
        axis: Axis::Tournament,
        previous: previous.tournament,
        next: next.tournament,
    };

    [
        (theme.axis, theme_trigger(&theme)),
        (results.axis, results_trigger(&results)),
        (tournament.axis, tournament_trigger(&tournament)),
    ]
    .into_iter()
    .filter_map(|(axis, computation)| {
        let computation = computation?;
        debug!(?axis, ?computation, "status change triggers computation");
        Some(computation)
    })
    .collect()
}
