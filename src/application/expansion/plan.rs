//! Decides which folded lines to fetch around a match line, and in which direction.

use crate::domain::{DiffLine, LineCode, LineNumbers, LinesRequest, MatchMetadata};

/// What the reviewer asked to reveal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpansionTarget {
    /// Reveal up to this new-version line number.
    Line(u32),
    /// Reveal everything folded behind the given match line.
    WholeGap(LineCode),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpansionDirection {
    /// Fetch the entire gap and drop the match line.
    Both,
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionPlan {
    pub direction: ExpansionDirection,
    pub match_line_code: LineCode,
    pub match_meta: MatchMetadata,
    /// Header text of the match line, reused by any match line left behind.
    pub match_text: String,
    /// New-version number of the last known line before the fold (0 at file start).
    pub previous_new_line: u32,
    pub request: LinesRequest,
    /// Numbers the splice positions itself against.
    pub anchor: LineNumbers,
    /// Where a fold remaining below the revealed lines points.
    pub next: Option<LineNumbers>,
    pub is_expand_down: bool,
    pub is_last: bool,
}

impl ExpansionPlan {
    /// Number of lines the request covers.
    pub fn requested_count(&self) -> u64 {
        if self.request.to < self.request.since {
            0
        } else {
            u64::from(self.request.to - self.request.since) + 1
        }
    }
}

/// Returns `None` when there is nothing to expand (line already present or no fold).
pub fn plan_expansion(
    lines: &[DiffLine],
    target: &ExpansionTarget,
    both_threshold: u32,
) -> Option<ExpansionPlan> {
    match target {
        ExpansionTarget::Line(new_line) => {
            let new_line = *new_line;
            if lines
                .iter()
                .any(|line| !line.is_match() && line.new_line() == Some(new_line))
            {
                return None;
            }
            let index = closest_match_index(lines, new_line)?;
            Some(plan_for_line(lines, index, new_line, both_threshold))
        }
        ExpansionTarget::WholeGap(line_code) => {
            let index = lines
                .iter()
                .position(|line| line.is_match() && line.line_code() == line_code)?;
            Some(plan_whole_gap(lines, index))
        }
    }
}

/// First match line folding lines beyond `new_line`, or a trailing match line.
fn closest_match_index(lines: &[DiffLine], new_line: u32) -> Option<usize> {
    lines
        .iter()
        .position(|line| {
            line.as_match()
                .is_some_and(|matched| matched.meta.new_pos > new_line)
        })
        .or_else(|| {
            let last = lines.len().checked_sub(1)?;
            lines[last].is_match().then_some(last)
        })
}

/// Nearest preceding real line that carries a new-version number.
fn previous_new_line(lines: &[DiffLine], index: usize) -> u32 {
    lines[..index]
        .iter()
        .rev()
        .find_map(DiffLine::new_line)
        .unwrap_or(0)
}

/// Lines hidden between the previous line and the match target, or -1 when
/// either boundary is unknown.
fn lines_in_between(lines: &[DiffLine], index: usize, meta: MatchMetadata) -> i64 {
    if index + 1 >= lines.len() {
        return -1;
    }
    let Some(previous) = index
        .checked_sub(1)
        .map(|i| &lines[i])
        .filter(|line| !line.is_match())
    else {
        return -1;
    };
    match previous.new_line() {
        Some(previous_new) => i64::from(meta.new_pos) - i64::from(previous_new) - 1,
        None => -1,
    }
}

fn match_parts(line: &DiffLine) -> (LineCode, MatchMetadata, String) {
    match line.as_match() {
        Some(matched) => (
            matched.line_code.clone(),
            matched.meta,
            matched.rich_text.clone(),
        ),
        None => (
            line.line_code().to_string(),
            MatchMetadata {
                old_pos: 0,
                new_pos: 0,
            },
            String::new(),
        ),
    }
}

fn plan_for_line(lines: &[DiffLine], index: usize, new_line: u32, both_threshold: u32) -> ExpansionPlan {
    let (match_line_code, meta, match_text) = match_parts(&lines[index]);
    let previous = index.checked_sub(1).map(|i| &lines[i]).filter(|line| !line.is_match());
    let previous_new = previous_new_line(lines, index);
    let gap = lines_in_between(lines, index, meta);
    let is_both = gap != -1 && gap < i64::from(both_threshold);
    let is_last = index == lines.len() - 1;
    let requested = i64::from(new_line);
    let is_down = is_last
        || (previous.is_some()
            && !is_both
            && requested - i64::from(previous_new) < i64::from(meta.new_pos) - requested);
    let offset = i64::from(meta.new_pos) - i64::from(meta.old_pos);
    let match_position = LineNumbers::from(meta);

    let mut plan = ExpansionPlan {
        direction: ExpansionDirection::Down,
        match_line_code,
        match_meta: meta,
        match_text,
        previous_new_line: previous_new,
        request: LinesRequest {
            offset,
            ..Default::default()
        },
        anchor: match_position,
        next: None,
        is_expand_down: false,
        is_last,
    };

    if is_both {
        plan.direction = ExpansionDirection::Both;
        plan.request.since = previous_new + 1;
        plan.request.to = meta.new_pos.saturating_sub(1);
        plan.request.unfold = false;
        plan.request.bottom = false;
    } else if !is_down {
        plan.direction = ExpansionDirection::Up;
        plan.request.since = new_line;
        plan.request.to = meta.new_pos.saturating_sub(1);
        plan.request.unfold = true;
        plan.request.bottom = is_last;
    } else {
        plan.request.since = previous_new + 1;
        plan.request.to = new_line;
        plan.request.unfold = true;
        plan.request.bottom = true;
        if !is_last {
            plan.is_expand_down = true;
            plan.anchor = previous.map(DiffLine::numbers).unwrap_or(match_position);
            plan.next = Some(match_position);
        }
    }

    log::debug!(
        "Expanding {} {:?}: lines {}..={}",
        plan.match_line_code,
        plan.direction,
        plan.request.since,
        plan.request.to
    );
    plan
}

fn plan_whole_gap(lines: &[DiffLine], index: usize) -> ExpansionPlan {
    let (match_line_code, meta, match_text) = match_parts(&lines[index]);
    let previous_new = previous_new_line(lines, index);
    let is_last = index == lines.len() - 1;
    let offset = i64::from(meta.new_pos) - i64::from(meta.old_pos);

    if is_last {
        // The end of the blob is unknown; ask for everything after the last line.
        return ExpansionPlan {
            direction: ExpansionDirection::Down,
            match_line_code,
            match_meta: meta,
            match_text,
            previous_new_line: previous_new,
            request: LinesRequest {
                since: previous_new + 1,
                to: u32::MAX,
                bottom: true,
                offset,
                unfold: true,
                full: false,
            },
            anchor: LineNumbers::from(meta),
            next: None,
            is_expand_down: false,
            is_last,
        };
    }

    ExpansionPlan {
        direction: ExpansionDirection::Both,
        match_line_code,
        match_meta: meta,
        match_text,
        previous_new_line: previous_new,
        request: LinesRequest {
            since: previous_new + 1,
            to: meta.new_pos.saturating_sub(1),
            bottom: false,
            offset,
            unfold: false,
            full: false,
        },
        anchor: LineNumbers::from(meta),
        next: None,
        is_expand_down: false,
        is_last,
    }
}
