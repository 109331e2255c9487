//! Independent status axes carried by every event.
//!
//! Each axis has a small fixed value domain. The theme and results axes may
//! alternatively point to a post (by numeric id) holding the announcement.

use std::{fmt, str::FromStr};

use serde_with::{DeserializeFromStr, SerializeDisplay};
use thiserror::Error;

/// Identifier of a post referenced by the theme or results axis.
pub type PostId = i64;

/// Error returned when a raw string does not belong to an axis value domain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{value}` is not a valid {axis} value")]
pub struct StatusParseError {
    /// Name of the axis being parsed.
    pub axis: &'static str,
    /// Offending raw value.
    pub value: String,
}

/// Parse a strictly positive integer id (`1`, `42`, never `0`, `-3` or `07a`).
pub fn parse_id(raw: &str) -> Option<i64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse::<i64>().ok().filter(|id| *id > 0)
}

macro_rules! status_axis {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal, default = $default:ident,
        { $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)? }
        $(, reference = $reference:ident)?
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
            $(
                /// Reference to the post announcing this stage.
                $reference(PostId),
            )?
        }

        impl $name {
            /// Axis name used in error messages and logs.
            pub const AXIS: &'static str = $label;
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($text),)+
                    $(Self::$reference(id) => write!(f, "{id}"),)?
                }
            }
        }

        impl FromStr for $name {
            type Err = StatusParseError;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                match raw {
                    $($text => Ok(Self::$variant),)+
                    _ => {
                        $(
                            if let Some(id) = parse_id(raw) {
                                return Ok(Self::$reference(id));
                            }
                        )?
                        Err(StatusParseError {
                            axis: Self::AXIS,
                            value: raw.to_owned(),
                        })
                    }
                }
            }
        }
    };
}

status_axis!(
    /// General publication status of an event.
    EventStatus, "status", default = Pending,
    {
        /// Not yet announced; the only state in which an event may be deleted.
        Pending => "pending",
        /// Running or upcoming.
        Open => "open",
        /// Over and archived.
        Closed => "closed",
    }
);

status_axis!(
    /// Visibility of the event rules page.
    RulesStatus, "rules status", default = Off,
    {
        Disabled => "disabled",
        Off => "off",
    }
);

status_axis!(
    /// Theme voting stage.
    ThemeStatus, "theme status", default = Off,
    {
        Disabled => "disabled",
        Off => "off",
        Voting => "voting",
        /// Shortlist computed from the voting round; entering it runs the shortlist engine.
        Shortlist => "shortlist",
        Closed => "closed",
        Results => "results",
    },
    reference = Post
);

status_axis!(
    /// Entry submission stage.
    EntryStatus, "entry status", default = Off,
    {
        Off => "off",
        Open => "open",
        OpenUnranked => "open_unranked",
        Closed => "closed",
    }
);

status_axis!(
    /// Rating and results stage.
    ResultsStatus, "results status", default = Off,
    {
        Disabled => "disabled",
        Off => "off",
        Voting => "voting",
        VotingRescue => "voting_rescue",
        /// Rankings are published.
        Results => "results",
    },
    reference = Post
);

status_axis!(
    /// High-score tournament stage.
    TournamentStatus, "tournament status", default = Off,
    {
        Disabled => "disabled",
        Off => "off",
        Submission => "submission",
        Playing => "playing",
        Closed => "closed",
        Results => "results",
    }
);

impl TournamentStatus {
    /// Whether this stage makes the event the site-wide active tournament.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Submission | Self::Playing)
    }
}

/// Snapshot of every status axis of an event.
///
/// Axes are plain fields: writing one never touches another.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StatusAxes {
    /// General publication status.
    pub status: EventStatus,
    /// Rules page status.
    pub rules: RulesStatus,
    /// Theme voting status.
    pub theme: ThemeStatus,
    /// Entry submission status.
    pub entry: EntryStatus,
    /// Rating and results status.
    pub results: ResultsStatus,
    /// Tournament status.
    pub tournament: TournamentStatus,
}
