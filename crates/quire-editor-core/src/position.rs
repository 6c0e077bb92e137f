//! Logical offset to on-screen point translation.
//!
//! Used to place the suggestion popup, not committed content, so the result
//! is approximate: columns are multiplied by a constant char width. Soft
//! wrapping is found by measuring text through a [`TextMeasurer`].

use unicode_width::UnicodeWidthChar;

use crate::types::Point;

/// Ratio of average glyph width to font size.
pub const DEFAULT_CHAR_WIDTH_FACTOR: f64 = 0.6;

/// Geometry of the box the text is laid out in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxMetrics {
    /// Width available to text, padding excluded.
    pub content_width: f64,
    pub font_size: f64,
    pub line_height: f64,
    pub padding_left: f64,
    pub padding_top: f64,
    pub scroll_left: f64,
    pub scroll_top: f64,
    pub char_width_factor: f64,
}

impl BoxMetrics {
    pub fn new(content_width: f64, font_size: f64, line_height: f64) -> Self {
        Self {
            content_width,
            font_size,
            line_height,
            padding_left: 0.0,
            padding_top: 0.0,
            scroll_left: 0.0,
            scroll_top: 0.0,
            char_width_factor: DEFAULT_CHAR_WIDTH_FACTOR,
        }
    }

    pub fn with_padding(mut self, left: f64, top: f64) -> Self {
        self.padding_left = left;
        self.padding_top = top;
        self
    }

    pub fn with_scroll(mut self, left: f64, top: f64) -> Self {
        self.scroll_left = left;
        self.scroll_top = top;
        self
    }

    pub fn with_char_width_factor(mut self, factor: f64) -> Self {
        self.char_width_factor = factor;
        self
    }

    /// Number of visual lines a block of `height` pixels occupies. Never
    /// less than one.
    fn visual_lines(&self, height: f64) -> usize {
        if self.line_height <= 0.0 {
            return 1;
        }
        ((height / self.line_height).ceil() as usize).max(1)
    }
}

/// Measures laid-out text height at a given wrap width.
///
/// Hosts implement this with an off-screen element. [`MonospaceMeasurer`]
/// is a deterministic stand-in.
pub trait TextMeasurer {
    fn measure_height(&self, text: &str, width: f64) -> f64;
}

impl<T: TextMeasurer> TextMeasurer for &T {
    fn measure_height(&self, text: &str, width: f64) -> f64 {
        (*self).measure_height(text, width)
    }
}

/// Wraps by display columns, breaking anywhere. Wide (CJK) chars take two
/// columns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceMeasurer {
    /// Width of one display column in pixels.
    pub column_width: f64,
    pub line_height: f64,
}

impl MonospaceMeasurer {
    pub fn new(column_width: f64, line_height: f64) -> Self {
        Self {
            column_width,
            line_height,
        }
    }

    /// A measurer matching `metrics`' font at the given char width factor.
    pub fn for_metrics(metrics: &BoxMetrics) -> Self {
        Self::new(
            metrics.font_size * metrics.char_width_factor,
            metrics.line_height,
        )
    }
}

impl TextMeasurer for MonospaceMeasurer {
    fn measure_height(&self, text: &str, width: f64) -> f64 {
        let columns = if self.column_width > 0.0 {
            ((width / self.column_width).floor() as usize).max(1)
        } else {
            usize::MAX
        };

        let mut lines = 1usize;
        let mut used = 0usize;
        for ch in text.chars() {
            if ch == '\n' {
                lines += 1;
                used = 0;
                continue;
            }
            let w = ch.width().unwrap_or(0);
            if used > 0 && used + w > columns {
                lines += 1;
                used = 0;
            }
            used += w;
        }
        lines as f64 * self.line_height
    }
}

/// Screen position of the cursor at char `offset` in `text`.
pub fn translate(
    text: &str,
    offset: usize,
    metrics: &BoxMetrics,
    measurer: &impl TextMeasurer,
) -> Point {
    let before: String = text.chars().take(offset).collect();
    let (previous, current) = match before.rsplit_once('\n') {
        Some((previous, current)) => (Some(previous), current),
        None => (None, before.as_str()),
    };

    let mut visual_line: usize = previous
        .map(|previous| {
            previous
                .split('\n')
                .map(|line| {
                    metrics.visual_lines(measurer.measure_height(line, metrics.content_width))
                })
                .sum()
        })
        .unwrap_or(0);

    let (sub_line, column) = probe_wrap(current, metrics, measurer);
    visual_line += sub_line;

    let char_width = metrics.font_size * metrics.char_width_factor;
    let point = Point::new(
        metrics.padding_left + column as f64 * char_width - metrics.scroll_left,
        metrics.padding_top + visual_line as f64 * metrics.line_height - metrics.scroll_top,
    );

    tracing::trace!(
        target: "quire::position",
        offset,
        visual_line,
        column,
        x = point.x,
        y = point.y,
        "translated offset"
    );
    point
}

/// Visual sub-line and column of the end of `line`, found by growing a
/// prefix one char at a time and watching for height increases.
fn probe_wrap(line: &str, metrics: &BoxMetrics, measurer: &impl TextMeasurer) -> (usize, usize) {
    let mut sub_line = 0;
    let mut line_start = 0;
    let mut last_height: Option<f64> = None;
    let mut total = 0;
    for (idx, (byte, ch)) in line.char_indices().enumerate() {
        let prefix = &line[..byte + ch.len_utf8()];
        let height = measurer.measure_height(prefix, metrics.content_width);
        if last_height.is_some_and(|last| height > last) {
            sub_line += 1;
            line_start = idx;
        }
        last_height = Some(height);
        total = idx + 1;
    }
    (sub_line, total - line_start)
}
