#![forbid(unsafe_code)]

//! Board data sources for headless runs.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Component, Path, PathBuf};

use boardpreview_core::{BoardData, BoardId, LoadError, LoadErrorKind, LoadTicket};

/// Synchronous stand-in for the network fetch of a board.
pub trait BoardSource {
    fn fetch(&self, ticket: &LoadTicket) -> Result<BoardData, LoadError>;
}

/// Boards held in memory, keyed by identifier. Unknown boards answer 404.
#[derive(Debug, Clone, Default)]
pub struct MemoryBoardSource {
    boards: HashMap<String, Result<BoardData, LoadError>>,
}

impl MemoryBoardSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_board(mut self, id: &str, data: BoardData) -> Self {
        self.boards.insert(id.to_owned(), Ok(data));
        self
    }

    #[must_use]
    pub fn with_failure(mut self, id: &str, err: LoadError) -> Self {
        self.boards.insert(id.to_owned(), Err(err));
        self
    }
}

impl BoardSource for MemoryBoardSource {
    fn fetch(&self, ticket: &LoadTicket) -> Result<BoardData, LoadError> {
        self.boards
            .get(ticket.board_id().as_str())
            .cloned()
            .unwrap_or_else(|| Err(LoadError::status(404)))
    }
}

/// Boards stored as `<root>/<board>.json` exports.
///
/// Identifiers containing a path separator or `..` never leave `root`; they
/// fail with a status 400 [`LoadError`].
#[derive(Debug, Clone)]
pub struct DirectoryBoardSource {
    root: PathBuf,
}

impl DirectoryBoardSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// File holding `board`, or an error if the identifier is not a plain
    /// file name.
    pub fn path_for(&self, board: &BoardId) -> Result<PathBuf, LoadError> {
        let file = format!("{board}.json");
        let mut components = Path::new(&file).components();
        let single_name = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !single_name || board.as_str().contains(['/', '\\']) || board.as_str().contains("..") {
            return Err(LoadError::new(
                LoadErrorKind::Status(400),
                format!("invalid board id {:?}", board.as_str()),
            ));
        }
        Ok(self.root.join(file))
    }
}

impl BoardSource for DirectoryBoardSource {
    fn fetch(&self, ticket: &LoadTicket) -> Result<BoardData, LoadError> {
        let path = self.path_for(ticket.board_id())?;
        let file = File::open(&path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => LoadError::status(404),
            _ => LoadError::network(format!("{}: {err}", path.display())),
        })?;
        let data = serde_json::from_reader(BufReader::new(file))?;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boardpreview_core::{NavigationCoordinator, PreviewConfig, Route};
    use serde_json::json;

    use crate::address_bar::MemoryAddressBar;
    use crate::frame::HeadlessFrame;
    use crate::url::PageUrl;

    fn ticket_for(board: &str) -> LoadTicket {
        let frame = HeadlessFrame::new(PageUrl::parse("http://localhost/").unwrap());
        let provider = |_: &BoardData| -> Result<Vec<Route>, LoadError> { Ok(Vec::new()) };
        let mut nav = NavigationCoordinator::new(
            PreviewConfig::default(),
            provider,
            frame,
            MemoryAddressBar::default(),
        );
        nav.submit_board(board).unwrap()
    }

    #[test]
    fn memory_source_answers_known_and_unknown_boards() {
        let source = MemoryBoardSource::new()
            .with_board("abc", json!({ "name": "A" }))
            .with_failure("down", LoadError::network("Network Error"));

        assert_eq!(source.fetch(&ticket_for("abc")).unwrap()["name"], "A");
        assert_eq!(
            source.fetch(&ticket_for("down")).unwrap_err().message(),
            "Network Error"
        );
        assert_eq!(
            source.fetch(&ticket_for("zzz")).unwrap_err().kind(),
            LoadErrorKind::Status(404)
        );
    }

    #[test]
    fn directory_source_reads_json_exports() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("abc.json"), r#"{ "name": "From disk" }"#).unwrap();
        std::fs::write(dir.path().join("bad.json"), "{ nope").unwrap();
        let source = DirectoryBoardSource::new(dir.path());

        assert_eq!(source.fetch(&ticket_for("abc")).unwrap()["name"], "From disk");
        assert_eq!(
            source.fetch(&ticket_for("bad")).unwrap_err().kind(),
            LoadErrorKind::Decode
        );
        assert_eq!(
            source.fetch(&ticket_for("missing")).unwrap_err().kind(),
            LoadErrorKind::Status(404)
        );
    }

    #[test]
    fn directory_source_rejects_ids_escaping_root() {
        let dir = tempfile::tempdir().unwrap();
        let inner = dir.path().join("boards");
        std::fs::create_dir(&inner).unwrap();
        std::fs::write(dir.path().join("secret.json"), r#"{ "name": "Outside" }"#).unwrap();
        let source = DirectoryBoardSource::new(&inner);

        for id in ["../secret", "..", "a/b", "a\\b", "/etc/passwd"] {
            let err = source.fetch(&ticket_for(id)).unwrap_err();
            assert_eq!(err.kind(), LoadErrorKind::Status(400), "id {id:?}");
            assert!(err.message().starts_with("invalid board id"), "id {id:?}");
        }
        assert!(source.path_for(&BoardId::parse("abc").unwrap()).is_ok());
    }
}
