//! Splices fetched context lines into both line representations of a file.

use super::plan::{ExpansionDirection, ExpansionPlan};
use crate::application::normalize::strip_diff_marker;
use crate::domain::{
    ContentLine, DiffFile, DiffLine, LineKind, LineNumbers, MatchLine, MatchMetadata,
    ParallelLine, RawLine, line_code_for,
};

/// A row of one line representation.
trait SpliceRow: Sized {
    fn is_at(&self, numbers: LineNumbers) -> bool;
    fn is_fold(&self) -> bool;
    fn has_line_code(&self, line_code: &str) -> bool;
    fn from_line(line: DiffLine) -> Self;
}

impl SpliceRow for DiffLine {
    fn is_at(&self, numbers: LineNumbers) -> bool {
        DiffLine::is_at(self, numbers)
    }

    fn is_fold(&self) -> bool {
        self.is_match()
    }

    fn has_line_code(&self, line_code: &str) -> bool {
        self.line_code() == line_code
    }

    fn from_line(line: DiffLine) -> Self {
        line
    }
}

impl SpliceRow for ParallelLine {
    fn is_at(&self, numbers: LineNumbers) -> bool {
        ParallelLine::is_at(self, numbers)
    }

    fn is_fold(&self) -> bool {
        self.is_match()
    }

    fn has_line_code(&self, line_code: &str) -> bool {
        self.line_code == line_code || self.sides().any(|line| line.line_code() == line_code)
    }

    fn from_line(line: DiffLine) -> Self {
        ParallelLine::mirrored(line)
    }
}

/// Applies one expansion result to `file`. Server-sent match lines are
/// ignored; any fold that remains is synthesized from the plan. Returns the
/// number of context lines revealed.
pub fn apply_context_lines(file: &mut DiffFile, plan: &ExpansionPlan, fetched: Vec<RawLine>) -> usize {
    let context: Vec<RawLine> = fetched.into_iter().filter(|line| !line.is_match()).collect();
    let trailing = plan.is_last && plan.direction == ExpansionDirection::Down;
    if context.is_empty() && trailing {
        // Nothing left past the fold: the file already ends at the last line.
        log::debug!("Fold {} is past end of file; removing it", plan.match_line_code);
    } else if context.is_empty() && plan.requested_count() > 0 {
        log::debug!(
            "No lines returned for {}; leaving fold in place",
            plan.match_line_code
        );
        return 0;
    }

    let lines = build_lines(&file.file_hash, plan, &context);
    if !splice_rows(&mut file.inline_lines, plan, &lines) {
        log::debug!("Fold {} not found in inline lines", plan.match_line_code);
    }
    if !splice_rows(&mut file.side_by_side_lines, plan, &lines) {
        log::debug!("Fold {} not found in side-by-side lines", plan.match_line_code);
    }
    context.len()
}

fn line_number(value: i64) -> Option<u32> {
    u32::try_from(value).ok().filter(|number| *number > 0)
}

/// Numbers the fetched lines and adds whatever match line still has to stand
/// in for lines left folded.
fn build_lines(file_hash: &str, plan: &ExpansionPlan, context: &[RawLine]) -> Vec<DiffLine> {
    let count = context.len() as i64;
    let first_new = if plan.request.bottom {
        i64::from(plan.request.since)
    } else {
        i64::from(plan.request.to) + 1 - count
    };

    let revealed: Vec<DiffLine> = context
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            let new_line = first_new + index as i64;
            let numbers = LineNumbers {
                old_line: line_number(new_line - plan.request.offset),
                new_line: line_number(new_line),
            };
            let text = raw.rich_text.as_deref().or(raw.text.as_deref()).unwrap_or("");
            DiffLine::Content(ContentLine::new(
                line_code_for(file_hash, numbers),
                LineKind::Context,
                numbers,
                strip_diff_marker(text).to_string(),
            ))
        })
        .collect();

    let fold_at = |numbers: LineNumbers| {
        DiffLine::Match(MatchLine::new(
            file_hash,
            MatchMetadata {
                old_pos: numbers.old_line.unwrap_or(0),
                new_pos: numbers.new_line.unwrap_or(0),
            },
            plan.match_text.clone(),
        ))
    };

    let mut lines = Vec::with_capacity(revealed.len() + 1);
    match plan.direction {
        ExpansionDirection::Both => lines.extend(revealed),
        ExpansionDirection::Up => {
            let first = revealed.first().map(DiffLine::numbers);
            if let Some(first) = first
                && first.new_line.unwrap_or(0) > plan.previous_new_line + 1
            {
                lines.push(fold_at(first));
            }
            lines.extend(revealed);
        }
        ExpansionDirection::Down if plan.is_expand_down => {
            lines.extend(revealed);
            if let Some(next) = plan.next
                && plan.request.to < plan.match_meta.new_pos.saturating_sub(1)
            {
                lines.push(fold_at(next));
            }
        }
        ExpansionDirection::Down => {
            let last = revealed.last().map(DiffLine::numbers);
            lines.extend(revealed);
            if let Some(last) = last
                && count as u64 == plan.requested_count()
            {
                lines.push(fold_at(last));
            }
        }
    }
    lines
}

fn splice_rows<R: SpliceRow>(rows: &mut Vec<R>, plan: &ExpansionPlan, lines: &[DiffLine]) -> bool {
    if rows.is_empty() {
        return false;
    }

    let planned = rows
        .iter()
        .position(|row| row.is_at(plan.anchor))
        .and_then(|index| {
            if plan.request.bottom {
                index.checked_add(1)
            } else {
                index.checked_sub(1)
            }
        })
        .filter(|index| rows.get(*index).is_some_and(R::is_fold));
    let fold_index = planned.or_else(|| {
        rows.iter()
            .position(|row| row.is_fold() && row.has_line_code(&plan.match_line_code))
    });
    let removed_at = fold_index.map(|index| {
        rows.remove(index);
        index
    });

    let insert_at = if !plan.is_expand_down && plan.request.bottom {
        rows.len()
    } else {
        match rows.iter().position(|row| row.is_at(plan.anchor)) {
            Some(index) => index + usize::from(plan.is_expand_down),
            None => match removed_at {
                Some(index) => index,
                None => return false,
            },
        }
    };

    rows.splice(
        insert_at..insert_at,
        lines.iter().cloned().map(R::from_line),
    );
    true
}

#[cfg(test)]
mod tests {
    use super::super::plan::{ExpansionTarget, plan_expansion};
    use super::*;
    use crate::domain::{DiffRefs, Viewer};

    fn content(old: u32, new: u32) -> DiffLine {
        DiffLine::Content(ContentLine::new(
            format!("abc_{old}_{new}"),
            LineKind::Context,
            LineNumbers::new(old, new),
            String::new(),
        ))
    }

    fn fold(old_pos: u32, new_pos: u32) -> DiffLine {
        DiffLine::Match(MatchLine::new(
            "abc",
            MatchMetadata { old_pos, new_pos },
            "@@ -1 +1 @@".into(),
        ))
    }

    fn file(lines: Vec<DiffLine>) -> DiffFile {
        DiffFile {
            file_hash: "abc".into(),
            content_sha: "sha".into(),
            old_path: "a.rb".into(),
            new_path: "a.rb".into(),
            new_file: false,
            deleted_file: false,
            renamed_file: false,
            added_lines: 0,
            removed_lines: 0,
            diff_refs: DiffRefs::default(),
            viewer: Viewer::default(),
            side_by_side_lines: lines.iter().cloned().map(ParallelLine::mirrored).collect(),
            inline_lines: lines,
            discussions: Vec::new(),
            collapsed: false,
            render_it: true,
            is_loading_full_file: false,
            is_showing_full_file: false,
            rendering_lines: false,
            context_lines_path: Some("/blob/a.rb".into()),
            load_collapsed_diff_url: None,
        }
    }

    /// What a server would return for `since..=to` of a blob whose old and new
    /// numbers differ by `offset`.
    fn served(since: u32, to: u32) -> Vec<RawLine> {
        (since..=to)
            .map(|n| RawLine {
                new_line: Some(n),
                rich_text: Some(format!(" line {n}")),
                ..Default::default()
            })
            .collect()
    }

    fn new_numbers(lines: &[DiffLine]) -> Vec<Option<u32>> {
        lines.iter().map(DiffLine::new_line).collect()
    }

    #[test]
    fn test_both_directions_fill_gap_and_drop_fold() {
        let mut file = file(vec![content(9, 10), fold(24, 25), content(24, 25)]);
        let plan = plan_expansion(&file.inline_lines, &ExpansionTarget::Line(15), 20).unwrap();
        let revealed = apply_context_lines(&mut file, &plan, served(11, 24));

        assert_eq!(revealed, 14);
        assert_eq!(file.inline_lines.len(), 2 + 14);
        assert!(file.inline_lines.iter().all(|line| !line.is_match()));
        let expected: Vec<Option<u32>> = (10..=25).map(Some).collect();
        assert_eq!(new_numbers(&file.inline_lines), expected);
        assert_eq!(file.inline_lines[1].old_line(), Some(10));
        assert_eq!(file.inline_lines[1].line_code(), "abc_10_11");

        assert_eq!(file.side_by_side_lines.len(), 16);
        assert!(file.side_by_side_lines.iter().all(|row| !row.is_match()));
        let row = &file.side_by_side_lines[5];
        assert_eq!(row.left, row.right);
    }

    #[test]
    fn test_up_keeps_leading_fold() {
        let mut file = file(vec![content(10, 10), fold(50, 50), content(50, 50)]);
        let plan = plan_expansion(&file.inline_lines, &ExpansionTarget::Line(45), 20).unwrap();
        apply_context_lines(&mut file, &plan, served(45, 49));

        let codes: Vec<&str> = file.inline_lines.iter().map(DiffLine::line_code).collect();
        assert_eq!(
            codes,
            vec![
                "abc_10_10",
                "abc_45_45_match",
                "abc_45_45",
                "abc_46_46",
                "abc_47_47",
                "abc_48_48",
                "abc_49_49",
                "abc_50_50"
            ]
        );
        assert_eq!(file.side_by_side_lines.len(), 8);
        assert!(file.side_by_side_lines[1].is_match());

        // The remaining fold continues from its new boundary.
        let next = plan_expansion(&file.inline_lines, &ExpansionTarget::Line(30), 20).unwrap();
        assert_eq!(next.match_line_code, "abc_45_45_match");
        assert_eq!(next.request.to, 44);
    }

    #[test]
    fn test_down_leaves_fold_pointing_further_along() {
        let mut file = file(vec![content(10, 10), fold(50, 50), content(50, 50)]);
        let plan = plan_expansion(&file.inline_lines, &ExpansionTarget::Line(13), 20).unwrap();
        apply_context_lines(&mut file, &plan, served(11, 13));

        let codes: Vec<&str> = file.inline_lines.iter().map(DiffLine::line_code).collect();
        assert_eq!(
            codes,
            vec![
                "abc_10_10",
                "abc_11_11",
                "abc_12_12",
                "abc_13_13",
                "abc_50_50_match",
                "abc_50_50"
            ]
        );
        assert_eq!(file.side_by_side_lines.len(), 6);
    }

    #[test]
    fn test_down_at_end_of_file() {
        let mut file = file(vec![content(4, 5), fold(4, 5)]);
        let plan = plan_expansion(&file.inline_lines, &ExpansionTarget::Line(8), 20).unwrap();

        // Full page back: the blob may continue, a trailing fold remains.
        apply_context_lines(&mut file, &plan, served(6, 8));
        let last = file.inline_lines.last().unwrap().as_match().unwrap();
        assert_eq!(last.meta, MatchMetadata { old_pos: 7, new_pos: 8 });
        assert_eq!(file.inline_lines.len(), 5);

        // Short page back: the blob ended, no fold remains.
        let plan = plan_expansion(&file.inline_lines, &ExpansionTarget::Line(20), 20).unwrap();
        apply_context_lines(&mut file, &plan, served(9, 10));
        assert!(file.inline_lines.iter().all(|line| !line.is_match()));
        assert_eq!(file.inline_lines.len(), 6);
        assert_eq!(file.side_by_side_lines.len(), 6);
    }

    #[test]
    fn test_empty_response_leaves_file_untouched() {
        let mut file = file(vec![content(10, 10), fold(50, 50), content(50, 50)]);
        let before = file.clone();
        let plan = plan_expansion(&file.inline_lines, &ExpansionTarget::Line(45), 20).unwrap();
        assert_eq!(apply_context_lines(&mut file, &plan, Vec::new()), 0);
        assert_eq!(file, before);
    }

    #[test]
    fn test_trailing_fold_past_end_of_file_is_removed() {
        let mut file = file(vec![content(4, 5), fold(4, 5)]);
        let plan = plan_expansion(
            &file.inline_lines,
            &ExpansionTarget::WholeGap("abc_4_5_match".into()),
            20,
        )
        .unwrap();

        assert_eq!(apply_context_lines(&mut file, &plan, Vec::new()), 0);
        assert_eq!(new_numbers(&file.inline_lines), vec![Some(5)]);
        assert_eq!(file.side_by_side_lines.len(), 1);
        assert!(!file.side_by_side_lines[0].is_match());
    }

    #[test]
    fn test_server_match_lines_are_ignored() {
        let mut file = file(vec![content(9, 10), fold(24, 25), content(24, 25)]);
        let plan = plan_expansion(&file.inline_lines, &ExpansionTarget::Line(15), 20).unwrap();
        let mut response = served(11, 24);
        response.insert(
            0,
            RawLine {
                kind: Some("match".into()),
                ..Default::default()
            },
        );
        apply_context_lines(&mut file, &plan, response);
        assert_eq!(file.inline_lines.len(), 16);
        assert!(file.inline_lines.iter().all(|line| !line.is_match()));
    }
}
