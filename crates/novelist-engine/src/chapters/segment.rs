use crate::models::Block;

/// Marker placed between chapters bundled into one export unit.
pub const CHAPTER_DIVIDER: &str = "\n---------------- END ----------------\n";

/// [`CHAPTER_DIVIDER`] with the blank lines that surround it in output.
pub const GROUPED_CHAPTER_SEPARATOR: &str = "\n\n\n---------------- END ----------------\n\n\n";

/// Split a chapter's raw prose into blocks.
///
/// Every paragraph (text between runs of two or more newlines) becomes a text
/// block followed by a spacer. The result is never empty: whitespace-only
/// input gives one spacer, empty input one empty text block.
pub fn segment_imported_text(raw: &str) -> Vec<Block> {
    let normalized = raw.replace("\r\n", "\n").replace('\r', "\n");

    let mut blocks = Vec::new();
    for paragraph in split_paragraphs(&normalized) {
        blocks.push(Block::text_block(paragraph));
        blocks.push(Block::spacer());
    }

    if blocks.is_empty() {
        if raw.is_empty() {
            blocks.push(Block::empty());
        } else {
            blocks.push(Block::spacer());
        }
    }
    blocks
}

/// Trimmed, non-empty paragraphs separated by two or more newlines.
fn split_paragraphs(text: &str) -> Vec<&str> {
    let mut paragraphs = Vec::new();
    let mut rest = text;
    loop {
        match find_paragraph_break(rest) {
            Some((start, end)) => {
                paragraphs.push(&rest[..start]);
                rest = &rest[end..];
            }
            None => {
                paragraphs.push(rest);
                break;
            }
        }
    }
    paragraphs
        .into_iter()
        .map(str::trim)
        .filter(|paragraph| !paragraph.is_empty())
        .collect()
}

/// Byte range of the first run of at least two consecutive newlines.
fn find_paragraph_break(text: &str) -> Option<(usize, usize)> {
    let start = text.find("\n\n")?;
    let run = text[start..].bytes().take_while(|&b| b == b'\n').count();
    Some((start, start + run))
}

/// Reassemble a chapter's blocks into flat prose, one blank line between
/// paragraphs. Spacers and empty blocks contribute nothing.
pub fn flatten_chapter_to_text(blocks: &[Block]) -> String {
    blocks
        .iter()
        .filter(|block| block.is_text())
        .map(Block::text)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Join several flattened chapters into one unit, divided by the END marker.
pub fn join_chapters<S: AsRef<str>>(chapters: &[S]) -> String {
    chapters
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(GROUPED_CHAPTER_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn texts(blocks: &[Block]) -> Vec<Option<&str>> {
        blocks.iter().map(|block| block.text.as_deref()).collect()
    }

    #[test]
    fn paragraphs_become_text_then_spacer() {
        let blocks = segment_imported_text("First para.\n\nSecond para.");
        assert_eq!(
            texts(&blocks),
            vec![Some("First para."), None, Some("Second para."), None]
        );
    }

    #[rstest]
    #[case("a\r\n\r\nb")]
    #[case("a\r\rb")]
    #[case("a\n\n\n\n\nb")]
    #[case("  a  \n\n\n  b \n")]
    fn line_endings_and_runs_normalize(#[case] raw: &str) {
        let blocks = segment_imported_text(raw);
        assert_eq!(texts(&blocks), vec![Some("a"), None, Some("b"), None]);
    }

    #[test]
    fn single_newlines_stay_inside_a_paragraph() {
        let blocks = segment_imported_text("line one\nline two");
        assert_eq!(texts(&blocks), vec![Some("line one\nline two"), None]);
    }

    #[test]
    fn empty_input_gives_one_empty_text_block() {
        assert_eq!(segment_imported_text(""), vec![Block::empty()]);
    }

    #[test]
    fn whitespace_input_gives_one_spacer() {
        assert_eq!(segment_imported_text(" \n\n\t "), vec![Block::spacer()]);
    }

    #[test]
    fn flatten_skips_spacers_and_empties() {
        let blocks = vec![
            Block::text_block("One"),
            Block::spacer(),
            Block::empty(),
            Block::text_block("Two"),
        ];
        assert_eq!(flatten_chapter_to_text(&blocks), "One\n\nTwo");
    }

    #[test]
    fn single_paragraph_round_trips() {
        let raw = "Only one paragraph here.";
        assert_eq!(flatten_chapter_to_text(&segment_imported_text(raw)), raw);
    }

    #[test]
    fn grouped_chapters_are_divided() {
        let joined = join_chapters(&["one", "two"]);
        assert_eq!(
            joined,
            "one\n\n\n---------------- END ----------------\n\n\ntwo"
        );
        assert!(joined.contains(CHAPTER_DIVIDER));
        assert_eq!(join_chapters(&["alone"]), "alone");
    }
}
