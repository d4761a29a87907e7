use super::error::DiffsError;
use super::line::{LineCode, LineNumbers, line_code_for};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref NOTE_LINK: Regex = Regex::new(r"^note_([0-9]+)$").unwrap();
    static ref LINE_LINK: Regex = Regex::new(r"^([0-9a-f]{40})_([0-9]+)_([0-9]+)$").unwrap();
    static ref FILE_HEADER: Regex = Regex::new(r"^diff-content-(.+)$").unwrap();
}

/// Location fragment the review was opened with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeepLink {
    Note { note_id: String },
    File { file_hash: String },
    Line {
        file_hash: String,
        old_line: u32,
        new_line: u32,
    },
}

impl DeepLink {
    /// Parses a fragment with or without its leading `#`. An empty fragment is
    /// no link; line numbers too large for a line link are an error.
    pub fn parse(fragment: &str) -> Result<Option<DeepLink>, DiffsError> {
        let fragment = fragment.trim().trim_start_matches('#');
        if fragment.is_empty() {
            return Ok(None);
        }

        if let Some(caps) = NOTE_LINK.captures(fragment) {
            return Ok(Some(DeepLink::Note {
                note_id: caps[1].to_string(),
            }));
        }
        if let Some(caps) = LINE_LINK.captures(fragment) {
            let number = |index: usize| {
                caps[index]
                    .parse::<u32>()
                    .map_err(|_| DiffsError::InvalidFragment(fragment.to_string()))
            };
            return Ok(Some(DeepLink::Line {
                file_hash: caps[1].to_string(),
                old_line: number(2)?,
                new_line: number(3)?,
            }));
        }
        if let Some(caps) = FILE_HEADER.captures(fragment) {
            return Ok(Some(DeepLink::File {
                file_hash: caps[1].to_string(),
            }));
        }
        // Anything else names a scroll target directly.
        Ok(Some(DeepLink::File {
            file_hash: fragment.to_string(),
        }))
    }

    pub fn is_note(&self) -> bool {
        matches!(self, DeepLink::Note { .. })
    }

    pub fn file_hash(&self) -> Option<&str> {
        match self {
            DeepLink::Note { .. } => None,
            DeepLink::File { file_hash } | DeepLink::Line { file_hash, .. } => Some(file_hash),
        }
    }

    pub fn line_numbers(&self) -> Option<LineNumbers> {
        match self {
            DeepLink::Line {
                old_line, new_line, ..
            } => Some(LineNumbers::new(*old_line, *new_line)),
            _ => None,
        }
    }

    /// What the loader scans arriving files for: a file hash or a line code.
    pub fn scroll_target(&self) -> Option<LineCode> {
        match self {
            DeepLink::Note { .. } => None,
            DeepLink::File { file_hash } => Some(file_hash.clone()),
            DeepLink::Line { file_hash, .. } => self
                .line_numbers()
                .map(|numbers| line_code_for(file_hash, numbers)),
        }
    }

    /// The fragment as it appears in the location, without `#`.
    pub fn fragment(&self) -> String {
        match self {
            DeepLink::Note { note_id } => format!("note_{note_id}"),
            DeepLink::File { file_hash } => file_hash.clone(),
            DeepLink::Line { .. } => self.scroll_target().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH: &str = "e334a2a10f036c00151a04cea7938a5d4213a818";

    #[test]
    fn test_note_links() {
        assert_eq!(
            DeepLink::parse("#note_12345").unwrap(),
            Some(DeepLink::Note {
                note_id: "12345".into()
            })
        );
        assert!(DeepLink::parse("note_12345").unwrap().unwrap().is_note());
    }

    #[test]
    fn test_file_links() {
        let header = DeepLink::parse("#diff-content-12345").unwrap().unwrap();
        assert_eq!(header.file_hash(), Some("12345"));
        let bare = DeepLink::parse(HASH).unwrap().unwrap();
        assert_eq!(bare.scroll_target().as_deref(), Some(HASH));
    }

    #[test]
    fn test_line_link() {
        let link = DeepLink::parse(&format!("#{HASH}_0_42")).unwrap().unwrap();
        assert_eq!(link.file_hash(), Some(HASH));
        assert_eq!(link.line_numbers(), Some(LineNumbers::new(0, 42)));
        assert_eq!(link.scroll_target().unwrap(), format!("{HASH}_0_42"));
        assert_eq!(link.fragment(), format!("{HASH}_0_42"));
    }

    #[test]
    fn test_empty_and_overflowing_fragments() {
        assert_eq!(DeepLink::parse("").unwrap(), None);
        assert_eq!(DeepLink::parse("#").unwrap(), None);
        assert!(matches!(
            DeepLink::parse(&format!("#{HASH}_1_99999999999")),
            Err(DiffsError::InvalidFragment(_))
        ));
    }

    #[test]
    fn test_other_fragments_are_scroll_targets() {
        let link = DeepLink::parse("#12345").unwrap().unwrap();
        assert_eq!(
            link,
            DeepLink::File {
                file_hash: "12345".into()
            }
        );
        assert_eq!(link.scroll_target().as_deref(), Some("12345"));
        assert!(!link.is_note());
    }
}
