//! Layout analysis for positioned glyph runs.
//!
//! Two stages turn an unordered bag of runs into reading-order text:
//! [`LineClusterer`] groups runs whose vertical positions are close, and
//! [`ParagraphAssembler`] groups the resulting lines according to a
//! [`ParagraphPolicy`]. Both are pure functions of their input and
//! configuration.

use std::cmp::Ordering;

use crate::model::{GlyphRun, Line, Paragraph};

use super::options::{LayoutOptions, ParagraphPolicy, YAxis};

/// Groups glyph runs into lines by vertical distance.
#[derive(Debug, Clone, Copy)]
pub struct LineClusterer {
    y_threshold: f32,
    y_axis: YAxis,
}

impl LineClusterer {
    /// Create a clusterer with an explicit threshold and axis direction.
    pub fn new(y_threshold: f32, y_axis: YAxis) -> Self {
        Self {
            y_threshold,
            y_axis,
        }
    }

    /// Create a clusterer from layout options.
    pub fn from_options(options: &LayoutOptions) -> Self {
        Self::new(options.y_threshold, options.y_axis)
    }

    /// Cluster the runs of one page into lines, top of page first.
    ///
    /// Runs are ordered top-to-bottom, then left-to-right; runs that compare
    /// equal keep their input order. A new line starts whenever a run is
    /// more than `y_threshold` away from the run before it.
    pub fn cluster(&self, runs: &[GlyphRun]) -> Vec<Line> {
        let mut ordered: Vec<(usize, &GlyphRun)> = runs.iter().enumerate().collect();
        ordered.sort_by(|(ia, a), (ib, b)| self.reading_order(a, b).then_with(|| ia.cmp(ib)));

        let mut lines = Vec::new();
        let mut current: Vec<(usize, &GlyphRun)> = Vec::new();
        let mut last_y = 0.0_f32;

        for (index, run) in ordered {
            if !current.is_empty() && (run.y - last_y).abs() > self.y_threshold {
                lines.push(build_line(std::mem::take(&mut current)));
            }
            last_y = run.y;
            current.push((index, run));
        }

        if !current.is_empty() {
            lines.push(build_line(current));
        }

        lines
    }

    fn reading_order(&self, a: &GlyphRun, b: &GlyphRun) -> Ordering {
        let vertical = match self.y_axis {
            YAxis::Up => b.y.total_cmp(&a.y),
            YAxis::Down => a.y.total_cmp(&b.y),
        };
        vertical.then_with(|| a.x.total_cmp(&b.x))
    }
}

impl Default for LineClusterer {
    fn default() -> Self {
        Self::from_options(&LayoutOptions::default())
    }
}

/// Join the runs of one line left to right.
///
/// Runs are tagged with their input index; equal x falls back to it.
fn build_line(mut runs: Vec<(usize, &GlyphRun)>) -> Line {
    let y = runs.first().map_or(0.0, |(_, r)| r.y);

    // Runs within the threshold may arrive out of x order when their y
    // values differ slightly.
    runs.sort_by(|(ia, a), (ib, b)| a.x.total_cmp(&b.x).then_with(|| ia.cmp(ib)));
    let x = runs.first().map_or(0.0, |(_, r)| r.x);

    let mut text = String::new();
    for (_, run) in &runs {
        if run.text.is_empty() {
            continue;
        }
        if !text.is_empty() {
            text.push(' ');
        }
        text.push_str(&run.text);
    }

    Line {
        text,
        y,
        x,
        run_count: runs.len(),
    }
}

/// Groups lines into paragraphs.
#[derive(Debug, Clone, Copy)]
pub struct ParagraphAssembler {
    policy: ParagraphPolicy,
    paragraph_gap: f32,
}

impl ParagraphAssembler {
    /// Create an assembler with an explicit policy and gap threshold.
    pub fn new(policy: ParagraphPolicy, paragraph_gap: f32) -> Self {
        Self {
            policy,
            paragraph_gap,
        }
    }

    /// Create an assembler from layout options.
    pub fn from_options(options: &LayoutOptions) -> Self {
        Self::new(options.policy, options.paragraph_gap)
    }

    /// Assemble lines of one page into paragraphs. Never fails; blank input
    /// yields no paragraphs.
    pub fn assemble(&self, lines: Vec<Line>) -> Vec<Paragraph> {
        match self.policy {
            ParagraphPolicy::LineIsParagraph => lines
                .into_iter()
                .filter(|line| !line.is_blank())
                .map(Paragraph::from_line)
                .collect(),
            ParagraphPolicy::GapIsBoundary => self.assemble_by_gap(lines),
        }
    }

    fn assemble_by_gap(&self, lines: Vec<Line>) -> Vec<Paragraph> {
        let mut paragraphs = Vec::new();
        let mut current = Paragraph::new();
        let mut prev_y: Option<f32> = None;

        for line in lines {
            if line.is_blank() {
                flush(&mut current, &mut paragraphs);
                prev_y = None;
                continue;
            }

            if let Some(prev) = prev_y {
                if (prev - line.y).abs() > self.paragraph_gap {
                    flush(&mut current, &mut paragraphs);
                }
            }

            prev_y = Some(line.y);
            current.push(line);
        }

        flush(&mut current, &mut paragraphs);
        paragraphs
    }
}

impl Default for ParagraphAssembler {
    fn default() -> Self {
        Self::from_options(&LayoutOptions::default())
    }
}

fn flush(current: &mut Paragraph, paragraphs: &mut Vec<Paragraph>) {
    if !current.lines.is_empty() {
        paragraphs.push(std::mem::take(current));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str, x: f32, y: f32) -> GlyphRun {
        GlyphRun::new(text, x, y, 0)
    }

    fn texts(lines: &[Line]) -> Vec<&str> {
        lines.iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn test_cluster_basic_scenario() {
        let runs = vec![
            run("Hello", 10.0, 100.0),
            run("World", 50.0, 100.0),
            run("Next", 10.0, 88.0),
        ];
        let lines = LineClusterer::new(5.0, YAxis::Up).cluster(&runs);
        assert_eq!(texts(&lines), vec!["Hello World", "Next"]);
        assert_eq!(lines[0].y, 100.0);
        assert_eq!(lines[0].run_count, 2);
    }

    #[test]
    fn test_cluster_empty_page() {
        let lines = LineClusterer::default().cluster(&[]);
        assert!(lines.is_empty());
    }

    #[test]
    fn test_cluster_is_independent_of_input_order() {
        let runs = vec![
            run("c", 10.0, 50.0),
            run("b", 60.0, 100.0),
            run("a", 10.0, 100.0),
            run("d", 40.0, 50.0),
        ];
        let mut reversed = runs.clone();
        reversed.reverse();

        let clusterer = LineClusterer::new(5.0, YAxis::Up);
        assert_eq!(clusterer.cluster(&runs), clusterer.cluster(&reversed));
        assert_eq!(texts(&clusterer.cluster(&runs)), vec!["a b", "c d"]);
    }

    #[test]
    fn test_cluster_ties_keep_input_order() {
        // Identical coordinates: only the stable tie-break decides.
        let runs = vec![run("first", 10.0, 100.0), run("second", 10.0, 100.0)];
        let clusterer = LineClusterer::default();
        assert_eq!(texts(&clusterer.cluster(&runs)), vec!["first second"]);

        let swapped = vec![run("second", 10.0, 100.0), run("first", 10.0, 100.0)];
        assert_eq!(texts(&clusterer.cluster(&swapped)), vec!["second first"]);
    }

    #[test]
    fn test_cluster_orders_line_by_x_despite_jitter() {
        // "right" sits slightly higher, so it sorts first vertically.
        let runs = vec![run("left", 10.0, 100.0), run("right", 80.0, 102.0)];
        let lines = LineClusterer::new(5.0, YAxis::Up).cluster(&runs);
        assert_eq!(texts(&lines), vec!["left right"]);
        assert_eq!(lines[0].x, 10.0);
    }

    #[test]
    fn test_cluster_equal_x_with_jitter_keeps_input_order() {
        let runs = vec![run("A", 10.0, 100.0), run("B", 10.0, 102.0)];
        let clusterer = LineClusterer::new(5.0, YAxis::Up);
        assert_eq!(texts(&clusterer.cluster(&runs)), vec!["A B"]);

        let swapped = vec![run("B", 10.0, 102.0), run("A", 10.0, 100.0)];
        assert_eq!(texts(&clusterer.cluster(&swapped)), vec!["B A"]);
    }

    #[test]
    fn test_cluster_y_down_axis() {
        let runs = vec![run("bottom", 10.0, 700.0), run("top", 10.0, 72.0)];
        let lines = LineClusterer::new(5.0, YAxis::Down).cluster(&runs);
        assert_eq!(texts(&lines), vec!["top", "bottom"]);

        let lines = LineClusterer::new(5.0, YAxis::Up).cluster(&runs);
        assert_eq!(texts(&lines), vec!["bottom", "top"]);
    }

    #[test]
    fn test_cluster_threshold_is_exclusive() {
        let runs = vec![run("a", 0.0, 100.0), run("b", 0.0, 95.0)];
        assert_eq!(LineClusterer::new(5.0, YAxis::Up).cluster(&runs).len(), 1);
        assert_eq!(LineClusterer::new(4.9, YAxis::Up).cluster(&runs).len(), 2);
    }

    #[test]
    fn test_cluster_skips_empty_run_text() {
        let runs = vec![run("a", 0.0, 100.0), run("", 5.0, 100.0), run("b", 9.0, 100.0)];
        let lines = LineClusterer::default().cluster(&runs);
        assert_eq!(texts(&lines), vec!["a b"]);
    }

    #[test]
    fn test_line_is_paragraph_counts() {
        let assembler = ParagraphAssembler::new(ParagraphPolicy::LineIsParagraph, 15.0);
        let lines = vec![
            Line::new("one", 100.0),
            Line::new("  ", 90.0),
            Line::new("two", 80.0),
            Line::new("three", 70.0),
        ];
        let paragraphs = assembler.assemble(lines);
        assert_eq!(paragraphs.len(), 3);
        assert_eq!(paragraphs[2].plain_text(), "three");

        let blank = vec![Line::new("", 100.0), Line::new(" ", 90.0)];
        assert!(assembler.assemble(blank).is_empty());
    }

    #[test]
    fn test_gap_is_boundary() {
        let assembler = ParagraphAssembler::new(ParagraphPolicy::GapIsBoundary, 15.0);
        let lines = vec![
            Line::new("The quick", 700.0),
            Line::new("brown fox.", 688.0),
            Line::new("New thought", 650.0),
            Line::new("continues.", 638.0),
        ];
        let paragraphs = assembler.assemble(lines);
        let texts: Vec<String> = paragraphs.iter().map(Paragraph::plain_text).collect();
        assert_eq!(texts, vec!["The quick brown fox.", "New thought continues."]);
    }

    #[test]
    fn test_blank_line_is_boundary() {
        let assembler = ParagraphAssembler::new(ParagraphPolicy::GapIsBoundary, 100.0);
        let lines = vec![
            Line::new("a", 700.0),
            Line::new("", 690.0),
            Line::new("", 680.0),
            Line::new("b", 670.0),
        ];
        let paragraphs = assembler.assemble(lines);
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraphs[0].plain_text(), "a");
        assert_eq!(paragraphs[1].plain_text(), "b");
    }

    #[test]
    fn test_gap_policy_on_empty_input() {
        assert!(ParagraphAssembler::default().assemble(Vec::new()).is_empty());
    }
}
