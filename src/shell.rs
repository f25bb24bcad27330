//! Interactive command loop for the terminal front end.
//!
//! Multiplexes three event sources with `tokio::select!`:
//!
//! - **stdin commands**: parsed into [`Intent`]s for the controller
//! - **Periodic tick**: 250ms timer driving debounced edit commits
//! - **Refresh timer**: re-dispatches at the configured interval
//!
//! EOF, `quit` and Ctrl-C all exit after flushing pending edits.

use std::time::Duration;

use anyhow::Result;
use chrono::{NaiveDateTime, TimeZone, Utc};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::app::{Intent, MatchDraft, PagedView};
use crate::controller::Controller;
use crate::predictions::Pick;
use crate::render::Presenter;

const TICK_PERIOD: Duration = Duration::from_millis(250);

// ============================================================================
// Command Parsing
// ============================================================================

/// One parsed stdin line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Intent(Intent),
    Help,
    Quit,
    Unknown(String),
}

/// Parse a command line into a [`Command`].
///
/// Grammar (one command per line, `|`-separated fields where teams may
/// contain spaces):
///
/// ```text
/// home | feed <cat> | search <words> | open <key> [url] | back
/// prev | fwd | more [home] | refresh | mc | quit | help
/// mc add <league>|<home>|<away>[|<kickoff>]
/// mc sel <id> | mc pick <id> h|d|a | mc conf <id> <n>
/// mc notes <id> <text> | mc del <id>
/// ```
pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    let (head, rest) = split_word(line);

    match head.to_lowercase().as_str() {
        "" => Command::Unknown(String::new()),
        "home" => Command::Intent(Intent::NavigateHome),
        "feed" if !rest.is_empty() => Command::Intent(Intent::NavigateFeed(rest.to_string())),
        "search" => Command::Intent(Intent::SubmitSearch(rest.to_string())),
        "open" if !rest.is_empty() => {
            let (key, url) = split_word(rest);
            Command::Intent(Intent::OpenArticle {
                key: key.to_string(),
                source_url: (!url.is_empty()).then(|| url.to_string()),
            })
        }
        "back" => Command::Intent(Intent::ReaderBack),
        "prev" => Command::Intent(Intent::HistoryBack),
        "fwd" => Command::Intent(Intent::HistoryForward),
        "more" => {
            let view = if rest.eq_ignore_ascii_case("home") {
                PagedView::Home
            } else {
                PagedView::Browse
            };
            Command::Intent(Intent::RequestNextPage(view))
        }
        "refresh" => Command::Intent(Intent::Refresh),
        "mc" if rest.is_empty() => Command::Intent(Intent::NavigateMatchCenter),
        "mc" => parse_match_command(rest),
        "help" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    }
}

fn parse_match_command(rest: &str) -> Command {
    let (sub, args) = split_word(rest);
    match sub.to_lowercase().as_str() {
        "add" => {
            let fields: Vec<&str> = args.split('|').map(str::trim).collect();
            if fields.len() < 3 {
                return Command::Unknown(format!("mc add {args}"));
            }
            Command::Intent(Intent::SaveMatch(MatchDraft {
                league: fields[0].to_string(),
                home: fields[1].to_string(),
                away: fields[2].to_string(),
                kickoff: fields.get(3).and_then(|k| parse_kickoff(k)),
            }))
        }
        "sel" if !args.is_empty() => Command::Intent(Intent::SelectMatch(args.to_string())),
        "del" if !args.is_empty() => Command::Intent(Intent::DeleteMatch(args.to_string())),
        "pick" => {
            let (id, pick) = split_word(args);
            let pick = match pick.to_lowercase().as_str() {
                "h" => Pick::Home,
                "d" => Pick::Draw,
                "a" => Pick::Away,
                _ => return Command::Unknown(format!("mc pick {args}")),
            };
            if id.is_empty() {
                return Command::Unknown(format!("mc pick {args}"));
            }
            Command::Intent(Intent::SelectPick {
                id: id.to_string(),
                pick,
            })
        }
        "conf" => {
            let (id, raw) = split_word(args);
            if id.is_empty() {
                return Command::Unknown(format!("mc conf {args}"));
            }
            Command::Intent(Intent::SetConfidence {
                id: id.to_string(),
                raw: raw.to_string(),
            })
        }
        "notes" => {
            let (id, notes) = split_word(args);
            if id.is_empty() {
                return Command::Unknown(format!("mc notes {args}"));
            }
            Command::Intent(Intent::SetNotes {
                id: id.to_string(),
                notes: notes.to_string(),
            })
        }
        _ => Command::Unknown(format!("mc {rest}")),
    }
}

fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim();
    match s.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (s, ""),
    }
}

/// Kickoff input: RFC 3339, or a bare `YYYY-MM-DDTHH:MM` taken as UTC.
fn parse_kickoff(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(t) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(t.timestamp_millis());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive).timestamp_millis())
}

const HELP_TEXT: &str = "\
Commands:
  home                          composed home dashboard
  feed <category>               category view (politics, football, ...)
  search <words>                search across feeds
  open <key> [source-url]       open an article
  back                          leave the reader, back to Home
  prev / fwd                    history back / forward
  more [home]                   load the next page of the current list
  refresh                       reload the current view
  mc                            match center
  mc add <league>|<home>|<away>[|<kickoff>]
  mc sel <id>   mc pick <id> h|d|a   mc conf <id> <n>
  mc notes <id> <text>          mc del <id>
  quit";

// ============================================================================
// Event Loop
// ============================================================================

/// Run the interactive loop until EOF, `quit` or Ctrl-C.
pub async fn run<P: Presenter>(
    controller: &mut Controller<P>,
    refresh_interval: Duration,
) -> Result<()> {
    controller.dispatch().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tick = tokio::time::interval(TICK_PERIOD);

    // A zero interval means manual refresh only; park the timer far out
    let refresh_period = if refresh_interval.is_zero() {
        Duration::from_secs(60 * 60 * 24 * 365)
    } else {
        refresh_interval
    };
    let mut refresh = tokio::time::interval_at(
        tokio::time::Instant::now() + refresh_period,
        refresh_period,
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl-C, shutting down");
                break;
            }

            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) if line.trim().is_empty() => {}
                    Ok(Some(line)) => match parse_command(&line) {
                        Command::Intent(intent) => controller.handle(intent).await,
                        Command::Help => println!("{HELP_TEXT}"),
                        Command::Quit => break,
                        Command::Unknown(cmd) => println!("Unknown command: {cmd} (try `help`)"),
                    },
                    Ok(None) => break, // stdin closed
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to read stdin");
                        break;
                    }
                }
            }

            _ = tick.tick() => controller.tick(),

            _ = refresh.tick() => controller.handle(Intent::Refresh).await,
        }
    }

    // Don't lose edits still inside their quiet period
    controller.flush_pending_edits();
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
