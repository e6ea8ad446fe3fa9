//! Session UI state machine.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// What the user is looking at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Result grid with filters and page bar.
    #[default]
    Browsing,
    /// A search is in flight; the previous results stay on screen.
    Loading,
    /// Favorites list.
    ViewingFavorites,
    /// Waiting for the match endpoint.
    MatchPending,
    /// Match card is displayed.
    MatchShown,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Browsing => "browsing",
            SessionState::Loading => "loading",
            SessionState::ViewingFavorites => "viewing_favorites",
            SessionState::MatchPending => "match_pending",
            SessionState::MatchShown => "match_shown",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEvent {
    Search,
    SearchSucceeded,
    SearchFailed,
    OpenFavorites,
    Close,
    GenerateMatch,
    MatchSucceeded,
    MatchFailed,
    StartOver,
}

impl SessionEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionEvent::Search => "search",
            SessionEvent::SearchSucceeded => "search_succeeded",
            SessionEvent::SearchFailed => "search_failed",
            SessionEvent::OpenFavorites => "open_favorites",
            SessionEvent::Close => "close",
            SessionEvent::GenerateMatch => "generate_match",
            SessionEvent::MatchSucceeded => "match_succeeded",
            SessionEvent::MatchFailed => "match_failed",
            SessionEvent::StartOver => "start_over",
        }
    }
}

impl fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event that has no edge out of the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Cannot {event} while {state}")]
pub struct InvalidTransition {
    pub state: SessionState,
    pub event: SessionEvent,
}

/// Compute the state that follows `event` in `state`.
pub fn transition(
    state: SessionState,
    event: SessionEvent,
) -> Result<SessionState, InvalidTransition> {
    use SessionEvent as E;
    use SessionState as S;

    let next = match (state, event) {
        // Overlapping searches keep the session loading.
        (S::Browsing | S::Loading, E::Search) => S::Loading,
        (S::Loading, E::SearchSucceeded | E::SearchFailed) => S::Browsing,
        (S::Browsing, E::OpenFavorites) => S::ViewingFavorites,
        (S::ViewingFavorites, E::Close) => S::Browsing,
        (S::ViewingFavorites, E::GenerateMatch) => S::MatchPending,
        (S::MatchPending, E::MatchSucceeded) => S::MatchShown,
        (S::MatchPending, E::MatchFailed) => S::ViewingFavorites,
        (S::MatchShown, E::StartOver | E::Close) => S::Browsing,
        _ => return Err(InvalidTransition { state, event }),
    };
    Ok(next)
}
