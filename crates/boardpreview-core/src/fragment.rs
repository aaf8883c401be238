#![forbid(unsafe_code)]

//! Address-bar fragment sync.
//!
//! The fragment format is `#<board>/<segment>/<segment>/...`. Nothing is
//! escaped: a board identifier or path containing `/` or `#` does not
//! survive a round trip.
//!
//! The sync is one-way after startup. [`InitialLocation::parse`] seeds the
//! coordinator once; afterwards every navigation pushes a new fragment via
//! [`AddressBar::write_fragment`] and external fragment edits are not
//! observed.

use crate::board::BoardId;
use crate::path::RoutePath;

/// The host's visible address bar.
pub trait AddressBar {
    /// Current fragment, with or without its leading `#`.
    fn read_fragment(&self) -> String;

    /// Replace the visible fragment. `fragment` includes the leading `#`.
    fn write_fragment(&mut self, fragment: &str);
}

/// Board and path seeded from the fragment at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitialLocation {
    pub board_id: Option<BoardId>,
    /// Not normalized; the coordinator normalizes before use.
    pub path: String,
}

impl Default for InitialLocation {
    fn default() -> Self {
        Self {
            board_id: None,
            path: "/".to_owned(),
        }
    }
}

impl InitialLocation {
    /// Split `hash` on `/`: the first segment is the board, the rest form
    /// the path. A blank board segment means "no initial board".
    #[must_use]
    pub fn parse(hash: &str) -> Self {
        let hash = hash.strip_prefix('#').unwrap_or(hash);
        let (board, rest) = match hash.split_once('/') {
            Some((board, rest)) => (board, rest),
            None => (hash, ""),
        };
        Self {
            board_id: BoardId::parse(board),
            path: format!("/{rest}"),
        }
    }
}

/// Fragment written for `(board, path)`.
#[must_use]
pub fn format_fragment(board: &BoardId, path: &RoutePath) -> String {
    format!("#{board}{path}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn board(id: &str) -> Option<BoardId> {
        BoardId::parse(id)
    }

    #[test]
    fn parses_board_and_nested_path() {
        let loc = InitialLocation::parse("board123/a/b");
        assert_eq!(
            loc,
            InitialLocation {
                board_id: board("board123"),
                path: "/a/b".to_owned(),
            }
        );
    }

    #[test]
    fn board_without_path_defaults_to_root() {
        let loc = InitialLocation::parse("board123");
        assert_eq!(loc.board_id, board("board123"));
        assert_eq!(loc.path, "/");
    }

    #[test]
    fn leading_hash_is_ignored() {
        assert_eq!(
            InitialLocation::parse("#board123/a"),
            InitialLocation::parse("board123/a")
        );
    }

    #[test]
    fn empty_hash_has_no_board() {
        assert_eq!(InitialLocation::parse(""), InitialLocation::default());
        assert_eq!(InitialLocation::parse("#").board_id, None);
    }

    #[test]
    fn blank_board_segment_has_no_board() {
        let loc = InitialLocation::parse("/a/b");
        assert_eq!(loc.board_id, None);
        assert_eq!(loc.path, "/a/b");
    }

    #[test]
    fn trailing_slash_survives_parse() {
        assert_eq!(InitialLocation::parse("abc/sub/").path, "/sub/");
    }

    #[test]
    fn format_concatenates_board_and_path() {
        let board = BoardId::parse("abc").unwrap();
        assert_eq!(format_fragment(&board, &RoutePath::new("/sub")), "#abc/sub/");
        assert_eq!(format_fragment(&board, &RoutePath::root()), "#abc/");
    }
}
