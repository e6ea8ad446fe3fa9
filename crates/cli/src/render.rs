//! Plain-text rendering of session state.

use std::fmt::Write;

use fetchmate_core::{
    DogRecord, PageItem, PaginationView, SearchSnapshot, SessionError, SessionNotice,
};

/// One dog as a result row. `favorite` marks it with a star.
pub fn dog_row(row: usize, dog: &DogRecord, favorite: bool) -> String {
    format!(
        "{:>3}. {} {:<16} {:<24} {:<10} zip {}",
        row,
        if favorite { "*" } else { " " },
        dog.name,
        dog.breed,
        dog.age_label(),
        dog.zip_code
    )
}

/// Page bar, e.g. `< [1] 2 3 … 20 >`.
pub fn page_bar(view: &PaginationView) -> String {
    let mut out = String::new();
    out.push_str(if view.prev_enabled { "<" } else { " " });
    for item in &view.items {
        match item {
            PageItem::Page(page) if *page == view.current_page => {
                let _ = write!(out, " [{}]", page);
            }
            PageItem::Page(page) => {
                let _ = write!(out, " {}", page);
            }
            PageItem::Ellipsis => {
                let _ = write!(out, " {}", item);
            }
        }
    }
    out.push(' ');
    out.push_str(if view.next_enabled { ">" } else { " " });
    out
}

/// Result list with status line and page bar. `page` is the page being
/// shown or loaded.
pub fn results(
    snapshot: &SearchSnapshot,
    page: u32,
    is_favorite: impl Fn(&str) -> bool,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", snapshot.status_line());

    let breeds = snapshot.criteria.breeds();
    let _ = writeln!(
        out,
        "Filter: {} | sort {}",
        if breeds.is_empty() {
            "all breeds".to_string()
        } else {
            breeds.join(", ")
        },
        snapshot.criteria.sort()
    );

    for (index, dog) in snapshot.records.iter().enumerate() {
        let _ = writeln!(out, "{}", dog_row(index + 1, dog, is_favorite(&dog.id)));
    }

    if let Some(view) = snapshot.pagination() {
        let _ = writeln!(out, "{}", view.range_label());
        let _ = writeln!(out, "{}", page_bar(&view));
        let _ = writeln!(out, "Page {} of {}", page, view.total_pages);
    }
    out
}

/// Favorites list.
pub fn favorites(list: &[DogRecord]) -> String {
    if list.is_empty() {
        return "No favorites yet. Use `fav <row>` on a result.\n".to_string();
    }
    let mut out = format!("Favorites ({})\n", list.len());
    for (index, dog) in list.iter().enumerate() {
        let _ = writeln!(out, "{}", dog_row(index + 1, dog, true));
    }
    out
}

/// Match card.
pub fn matched(dog: &DogRecord) -> String {
    format!(
        "Your match: {} ({}, {}, zip {})\n{}\n",
        dog.name,
        dog.breed,
        dog.age_label(),
        dog.zip_code,
        dog.img
    )
}

/// One-line rendering of a notice, or `None` for notices the shell
/// already reports inline.
pub fn notice(notice: &SessionNotice) -> Option<String> {
    match notice {
        SessionNotice::SearchFailed { message } => Some(format!("! Search failed: {}", message)),
        SessionNotice::BreedsUnavailable { message } => {
            Some(format!("! Breed list unavailable: {}", message))
        }
        SessionNotice::MatchFailed { message } => Some(format!("! {}", message)),
        SessionNotice::ResultsUpdated { .. }
        | SessionNotice::FavoriteAdded { .. }
        | SessionNotice::FavoriteRemoved { .. }
        | SessionNotice::MatchFound { .. }
        | SessionNotice::StartedOver => None,
    }
}

/// Line for a failed command, or `None` when the failure already arrived
/// as a notice.
pub fn error(error: &SessionError) -> Option<String> {
    match error {
        SessionError::Search(_) | SessionError::Match(_) => None,
        other => Some(format!("! {}", other)),
    }
}

/// Metrics label for a notice.
pub fn notice_kind(notice: &SessionNotice) -> &'static str {
    match notice {
        SessionNotice::ResultsUpdated { .. } => "results_updated",
        SessionNotice::SearchFailed { .. } => "search_failed",
        SessionNotice::BreedsUnavailable { .. } => "breeds_unavailable",
        SessionNotice::FavoriteAdded { .. } => "favorite_added",
        SessionNotice::FavoriteRemoved { .. } => "favorite_removed",
        SessionNotice::MatchFound { .. } => "match_found",
        SessionNotice::MatchFailed { .. } => "match_failed",
        SessionNotice::StartedOver => "started_over",
    }
}
