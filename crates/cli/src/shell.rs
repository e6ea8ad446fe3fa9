//! Command parsing for the interactive shell.

use fetchmate_core::SortDirection;
use thiserror::Error;

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    /// List breeds that can still be added to the filter.
    Breeds,
    /// Toggle a breed in the pending filter.
    Breed(String),
    Sort(SortDirection),
    Apply,
    Reset,
    Show,
    Next,
    Prev,
    Page(u32),
    /// Toggle the favorite on a row of the result list (1-based).
    Fav(usize),
    /// Open the favorites list.
    Favorites,
    /// Remove a row of the favorites list (1-based).
    Unfav(usize),
    Match,
    Close,
    StartOver,
    Metrics,
    Quit,
}

impl Command {
    /// Name used for metrics labels.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Help => "help",
            Command::Breeds => "breeds",
            Command::Breed(_) => "breed",
            Command::Sort(_) => "sort",
            Command::Apply => "apply",
            Command::Reset => "reset",
            Command::Show => "show",
            Command::Next => "next",
            Command::Prev => "prev",
            Command::Page(_) => "page",
            Command::Fav(_) => "fav",
            Command::Favorites => "favorites",
            Command::Unfav(_) => "unfav",
            Command::Match => "match",
            Command::Close => "close",
            Command::StartOver => "start_over",
            Command::Metrics => "metrics",
            Command::Quit => "quit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Unknown command: {0} (try `help`)")]
    Unknown(String),

    #[error("`{command}` needs {expected}")]
    MissingArgument {
        command: &'static str,
        expected: &'static str,
    },

    #[error("Invalid argument for `{command}`: {value}")]
    InvalidArgument { command: &'static str, value: String },
}

pub const HELP: &str = "\
Commands:
  breeds              list breeds you can filter by
  breed <name>        add or remove a breed from the filter
  sort asc|desc       sort by breed
  apply               search with the current filter
  reset               clear the filter and search again
  show                show the current results
  next | prev         move one page
  page <n>            jump to page n
  fav <row>           favorite or unfavorite a result row
  favorites           open your favorites
  unfav <row>         remove a favorite (in the favorites list)
  match               find your match among your favorites
  close               back to browsing
  startover           clear favorites after a match
  metrics             dump metrics
  quit";

/// Parse one input line. Empty lines yield `Ok(None)`.
pub fn parse(line: &str) -> Result<Option<Command>, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    let command = match head.to_lowercase().as_str() {
        "help" | "?" => Command::Help,
        "breeds" => Command::Breeds,
        "breed" => Command::Breed(required("breed", "a breed name", rest)?.to_string()),
        "sort" => match required("sort", "asc or desc", rest)?.to_lowercase().as_str() {
            "asc" => Command::Sort(SortDirection::Asc),
            "desc" => Command::Sort(SortDirection::Desc),
            other => {
                return Err(ParseError::InvalidArgument {
                    command: "sort",
                    value: other.to_string(),
                })
            }
        },
        "apply" | "search" => Command::Apply,
        "reset" => Command::Reset,
        "show" | "ls" => Command::Show,
        "next" | "n" => Command::Next,
        "prev" | "p" => Command::Prev,
        "page" => Command::Page(number("page", rest)?),
        "fav" => Command::Fav(number("fav", rest)? as usize),
        "favorites" | "favs" => Command::Favorites,
        "unfav" => Command::Unfav(number("unfav", rest)? as usize),
        "match" => Command::Match,
        "close" | "back" => Command::Close,
        "startover" | "start-over" => Command::StartOver,
        "metrics" => Command::Metrics,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(ParseError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

fn required<'a>(
    command: &'static str,
    expected: &'static str,
    rest: &'a str,
) -> Result<&'a str, ParseError> {
    if rest.is_empty() {
        Err(ParseError::MissingArgument { command, expected })
    } else {
        Ok(rest)
    }
}

fn number(command: &'static str, rest: &str) -> Result<u32, ParseError> {
    let value = required(command, "a number", rest)?;
    match value.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ParseError::InvalidArgument {
            command,
            value: value.to_string(),
        }),
    }
}
