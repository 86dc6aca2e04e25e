//! Markdown header splitting for layout-analysis output.
//!
//! Document Intelligence returns the whole document as one markdown string.
//! This module cuts it into [`Segment`]s at `#`, `##` and `###` headings,
//! tracking the active hierarchy. Deeper headings stay in the section text,
//! as do heading-like lines inside fenced code blocks.

use super::{Heading, Segment};

/// Deepest heading level that starts a new segment.
const MAX_SPLIT_LEVEL: u8 = 3;

/// Split markdown into header-scoped segments, in document order.
///
/// Heading lines are consumed into the heading path and do not appear in
/// segment content. Sections with no content (a heading directly followed
/// by another heading) produce no segment. Text before the first heading
/// becomes a segment with an empty path.
pub fn split_markdown(markdown: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut stack: Vec<Heading> = Vec::new();
    let mut buf: Vec<&str> = Vec::new();
    let mut in_fence = false;

    for line in markdown.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            buf.push(line);
            continue;
        }
        if !in_fence {
            if let Some(heading) = parse_heading(line) {
                flush(&mut segments, &stack, &mut buf);
                stack.retain(|h| h.level < heading.level);
                stack.push(heading);
                continue;
            }
        }
        buf.push(line);
    }
    flush(&mut segments, &stack, &mut buf);

    segments
}

fn flush(segments: &mut Vec<Segment>, stack: &[Heading], buf: &mut Vec<&str>) {
    let content = buf.join("\n").trim().to_string();
    buf.clear();
    if !content.is_empty() {
        segments.push(Segment {
            heading_path: stack.to_vec(),
            content,
        });
    }
}

/// Parse an ATX heading of level 1..=3. Deeper levels and hash runs without
/// a following space are not headings for splitting purposes.
fn parse_heading(line: &str) -> Option<Heading> {
    let hashes = line.chars().take_while(|&c| c == '#').count();
    if hashes == 0 || hashes > MAX_SPLIT_LEVEL as usize {
        return None;
    }
    let rest = line.get(hashes..)?;
    if !rest.starts_with(' ') {
        return None;
    }
    let title = rest.trim().to_string();
    if title.is_empty() {
        return None;
    }
    Some(Heading {
        level: hashes as u8,
        title,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(segment: &Segment) -> Vec<&str> {
        segment.heading_path.iter().map(|h| h.title.as_str()).collect()
    }

    #[test]
    fn splits_at_three_heading_levels() {
        let md = "# Intro\nfirst\n## Scope\nsecond\n### Detail\nthird";
        let segments = split_markdown(md);
        assert_eq!(segments.len(), 3);
        assert_eq!(titles(&segments[0]), vec!["Intro"]);
        assert_eq!(titles(&segments[1]), vec!["Intro", "Scope"]);
        assert_eq!(titles(&segments[2]), vec!["Intro", "Scope", "Detail"]);
        assert_eq!(segments[0].content, "first");
        assert_eq!(segments[2].content, "third");
    }

    #[test]
    fn same_level_heading_replaces_previous() {
        let md = "# A\none\n# B\ntwo";
        let segments = split_markdown(md);
        assert_eq!(segments.len(), 2);
        assert_eq!(titles(&segments[1]), vec!["B"]);
    }

    #[test]
    fn shallower_heading_pops_deeper_levels() {
        let md = "# A\n## B\nnested\n# C\ntop again";
        let segments = split_markdown(md);
        assert_eq!(segments.len(), 2);
        assert_eq!(titles(&segments[0]), vec!["A", "B"]);
        assert_eq!(titles(&segments[1]), vec!["C"]);
    }

    #[test]
    fn heading_lines_are_not_part_of_content() {
        let md = "# A\nbody text";
        let segments = split_markdown(md);
        assert_eq!(segments[0].content, "body text");
    }

    #[test]
    fn fourth_level_heading_stays_in_content() {
        let md = "# A\n#### Not a split point\nbody";
        let segments = split_markdown(md);
        assert_eq!(segments.len(), 1);
        assert!(segments[0].content.contains("#### Not a split point"));
    }

    #[test]
    fn hashes_without_space_are_content() {
        let md = "# A\n#hashtag text";
        let segments = split_markdown(md);
        assert_eq!(segments.len(), 1);
        assert!(segments[0].content.contains("#hashtag"));
    }

    #[test]
    fn headings_inside_code_fences_are_ignored() {
        let md = "# A\n```\n# not a heading\n```\nafter";
        let segments = split_markdown(md);
        assert_eq!(segments.len(), 1);
        assert!(segments[0].content.contains("# not a heading"));
        assert!(segments[0].content.contains("after"));
    }

    #[test]
    fn empty_sections_are_skipped() {
        let md = "# A\n## B\nonly content here";
        let segments = split_markdown(md);
        assert_eq!(segments.len(), 1);
        assert_eq!(titles(&segments[0]), vec!["A", "B"]);
    }

    #[test]
    fn preamble_before_first_heading_has_empty_path() {
        let md = "abstract text\n# Intro\nbody";
        let segments = split_markdown(md);
        assert_eq!(segments.len(), 2);
        assert!(segments[0].heading_path.is_empty());
        assert_eq!(segments[0].content, "abstract text");
    }

    #[test]
    fn table_markup_survives_in_content() {
        let md = "# Results\n<table><tr><td>1</td></tr></table>";
        let segments = split_markdown(md);
        assert!(segments[0].content.contains("<table>"));
    }

    #[test]
    fn empty_input_produces_no_segments() {
        assert!(split_markdown("").is_empty());
        assert!(split_markdown("   \n\n  ").is_empty());
    }
}
