use std::sync::{Arc, Mutex};

use crate::error::{LayoutError, Result};
use crate::font::Font;
use crate::line::{ContTerm, Cursor, Fit, FixedItem, Renderable, WidthCache};
use crate::render::RenderTarget;
use crate::types::{Color, Dimension, Offset, Pt};

/// Leading is the font descent multiplied by this factor unless a style says
/// otherwise.
pub const DEFAULT_LEADING_FACTOR: f32 = 0.5;

/// Widens the width / average-char-width estimate used to seed line breaking.
pub const CHARS_PER_WIDTH_GUESS: f32 = 1.22;

/// Glyph-space units per point of font size.
pub const GLYPH_UNITS_PER_POINT: f32 = 960.0;

#[derive(Debug, Clone)]
pub struct TextStyle {
    font: Arc<dyn Font>,
    size: Pt,
    color: Color,
    leading_factor: f32,
    ascent: Pt,
    descent: Pt,
    leading: Pt,
    avg_char_width: Pt,
}

impl TextStyle {
    pub fn new(font: Arc<dyn Font>, size: Pt, color: Color) -> Result<Self> {
        Self::with_leading_factor(font, size, color, DEFAULT_LEADING_FACTOR)
    }

    pub fn with_leading_factor(
        font: Arc<dyn Font>,
        size: Pt,
        color: Color,
        leading_factor: f32,
    ) -> Result<Self> {
        if size <= Pt::ZERO {
            return Err(LayoutError::InvalidArgument(format!(
                "font size must be positive, not {size}"
            )));
        }
        if !leading_factor.is_finite() || leading_factor < 0.0 {
            return Err(LayoutError::InvalidArgument(format!(
                "leading factor must be a non-negative number, not {leading_factor}"
            )));
        }
        let scale = size.to_f32() / GLYPH_UNITS_PER_POINT;
        let descent = font.descent().abs() * scale;
        Ok(Self {
            ascent: Pt::from_f32(font.ascent() * scale),
            descent: Pt::from_f32(descent),
            leading: Pt::from_f32(descent * leading_factor),
            avg_char_width: Pt::from_f32(font.average_width() * size.to_f32() / 1000.0),
            font,
            size,
            color,
            leading_factor,
        })
    }

    pub fn with_color(&self, color: Color) -> Self {
        Self {
            color,
            ..self.clone()
        }
    }

    pub fn font(&self) -> &Arc<dyn Font> {
        &self.font
    }

    pub fn size(&self) -> Pt {
        self.size
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn leading_factor(&self) -> f32 {
        self.leading_factor
    }

    pub fn ascent(&self) -> Pt {
        self.ascent
    }

    /// Depth below the baseline as a positive length.
    pub fn descent(&self) -> Pt {
        self.descent
    }

    pub fn leading(&self) -> Pt {
        self.leading
    }

    pub fn line_height(&self) -> Pt {
        self.ascent + self.descent + self.leading
    }

    pub fn avg_char_width(&self) -> Pt {
        self.avg_char_width
    }

    pub fn string_width(&self, text: &str) -> Pt {
        self.scale_units(self.font.string_width(text))
    }

    pub fn chars_width(&self, chars: &[char]) -> Pt {
        self.scale_units(self.font.chars_width(chars))
    }

    /// Rough number of characters that fit in `width`, biased upward.
    pub fn chars_for_width(&self, width: Pt) -> Option<usize> {
        if self.avg_char_width <= Pt::ZERO {
            return None;
        }
        let guess = width.to_f32() * CHARS_PER_WIDTH_GUESS / self.avg_char_width.to_f32();
        Some(guess.max(0.0) as usize)
    }

    fn scale_units(&self, units: f32) -> Pt {
        Pt::from_f32(units * self.size.to_f32() / GLYPH_UNITS_PER_POINT)
    }
}

impl PartialEq for TextStyle {
    fn eq(&self, other: &Self) -> bool {
        self.font.name() == other.font.name()
            && self.size == other.size
            && self.color == other.color
            && self.leading == other.leading
    }
}

/// One wrapped row of text, ready to be placed on a line.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRow {
    style: TextStyle,
    text: String,
    width: Pt,
}

impl TextRow {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn width(&self) -> Pt {
        self.width
    }

    pub fn style(&self) -> &TextStyle {
        &self.style
    }
}

impl FixedItem for TextRow {
    fn dimension(&self) -> Dimension {
        Dimension::measured(self.width, self.style.line_height())
    }

    fn ascent(&self) -> Pt {
        self.style.ascent()
    }

    fn descent_and_leading(&self) -> Pt {
        self.style.descent() + self.style.leading()
    }

    fn render(&self, target: &mut dyn RenderTarget, top_left: Offset) -> Result<Offset> {
        let baseline = Offset::new(top_left.x, top_left.y - self.style.ascent());
        target.draw_styled_text(baseline, &self.text, &self.style)?;
        Ok(Offset::new(
            top_left.x + self.width,
            top_left.y - self.style.line_height(),
        ))
    }
}

/// Outcome of one wrapping step.
#[derive(Debug, Clone, PartialEq)]
pub struct WrappedRow {
    pub row: TextRow,
    /// Read position for the next step, past any consumed break character.
    pub next_index: usize,
    /// The row ended at a hard line break.
    pub terminal: bool,
}

fn is_blank(ch: char) -> bool {
    ch.is_whitespace()
}

/// True while `chars[start..]` still holds something to lay out: a visible
/// character or a hard break.
pub fn has_more_text(chars: &[char], start: usize) -> bool {
    chars
        .get(start..)
        .is_some_and(|rest| rest.iter().any(|ch| *ch == '\n' || !is_blank(*ch)))
}

/// Breaks off the longest row starting at `start` that fits in `max_width`,
/// breaking only at whitespace. A word wider than `max_width` is returned
/// alone. A `'\n'` ends the row and marks it terminal.
pub fn wrap_row(
    style: &TextStyle,
    chars: &[char],
    start: usize,
    max_width: Pt,
) -> Result<WrappedRow> {
    if max_width.is_negative() {
        return Err(LayoutError::InvalidArgument(format!(
            "wrap width must not be negative, not {max_width}"
        )));
    }
    if start >= chars.len() {
        return Err(LayoutError::InvalidState(format!(
            "read position {start} is past the end of {} characters",
            chars.len()
        )));
    }

    let mut begin = start;
    while begin < chars.len() && chars[begin] != '\n' && is_blank(chars[begin]) {
        begin += 1;
    }
    let (seg_end, found_break) = match chars[begin..].iter().position(|ch| *ch == '\n') {
        Some(pos) => (begin + pos, true),
        None => (chars.len(), false),
    };
    let seg = &chars[begin..seg_end];
    let len = seg.len();
    let first_word_end = seg.iter().position(|ch| is_blank(*ch)).unwrap_or(len);

    let mut end = style.chars_for_width(max_width).unwrap_or(len).min(len);
    while end > 0 && end < len && !is_blank(seg[end]) && !is_blank(seg[end - 1]) {
        end += 1;
    }
    while end > 0 && is_blank(seg[end - 1]) {
        end -= 1;
    }
    end = end.max(first_word_end);
    let mut width = style.chars_width(&seg[..end]);

    while width < max_width && end < len {
        let mut p = end;
        while p < len && is_blank(seg[p]) {
            p += 1;
        }
        if p == len {
            break;
        }
        while p < len && !is_blank(seg[p]) {
            p += 1;
        }
        end = p;
        width = style.chars_width(&seg[..end]);
    }

    while width > max_width {
        let mut p = end;
        while p > 0 && !is_blank(seg[p - 1]) {
            p -= 1;
        }
        while p > 0 && is_blank(seg[p - 1]) {
            p -= 1;
        }
        if p == 0 {
            break;
        }
        end = p;
        width = style.chars_width(&seg[..end]);
    }

    let rest_blank = seg[end..].iter().all(|ch| is_blank(*ch));
    // A row that takes the rest of its segment keeps its trailing blanks
    // when they fit.
    if rest_blank && end < len {
        let full = style.chars_width(seg);
        if full <= max_width {
            end = len;
            width = full;
        }
    }
    let next_index = if rest_blank {
        seg_end + 1
    } else {
        begin + end + 1
    };
    let terminal = found_break && rest_blank;
    let text: String = seg[..end].iter().collect();
    tracing::trace!(
        start,
        next_index,
        terminal,
        width = %width,
        text = %text,
        "wrapped text row"
    );
    Ok(WrappedRow {
        row: TextRow {
            style: style.clone(),
            text,
            width,
        },
        next_index,
        terminal,
    })
}

#[derive(Debug, Clone)]
struct TextLayout {
    rows: Vec<Arc<TextRow>>,
    dim: Dimension,
}

/// A run of text in one style.
#[derive(Debug, Clone)]
pub struct Text {
    style: TextStyle,
    chars: Arc<[char]>,
    layout_cache: Arc<Mutex<WidthCache<TextLayout>>>,
}

impl Text {
    pub fn new(style: TextStyle, text: &str) -> Self {
        Self {
            style,
            chars: text.chars().collect(),
            layout_cache: Arc::new(Mutex::new(WidthCache::default())),
        }
    }

    pub fn style(&self) -> &TextStyle {
        &self.style
    }

    pub fn text(&self) -> String {
        self.chars.iter().collect()
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// Width the text would take with no wrapping other than its own hard
    /// breaks.
    pub fn max_width(&self) -> Pt {
        self.chars
            .split(|ch| *ch == '\n')
            .map(|line| self.style.chars_width(skip_leading_blanks(line)))
            .max()
            .unwrap_or(Pt::ZERO)
    }

    pub fn text_cursor(&self) -> TextCursor<'_> {
        TextCursor {
            text: self,
            index: 0,
            line_full: false,
        }
    }

    fn layout(&self, max_width: Pt) -> Result<Arc<TextLayout>> {
        let key = max_width.to_milli_i64();
        if let Ok(cache) = self.layout_cache.lock() {
            if let Some(layout) = cache.get(key) {
                return Ok(layout);
            }
        }
        let mut rows = Vec::new();
        let mut width = Pt::ZERO;
        let mut height = Pt::ZERO;
        let mut index = 0;
        while has_more_text(&self.chars, index) {
            let wrapped = wrap_row(&self.style, &self.chars, index, max_width)?;
            index = wrapped.next_index;
            width = width.max(wrapped.row.width);
            height += self.style.line_height();
            rows.push(Arc::new(wrapped.row));
        }
        let layout = Arc::new(TextLayout {
            rows,
            dim: Dimension::measured(width, height),
        });
        tracing::debug!(
            max_width = %max_width,
            rows = layout.rows.len(),
            width = %width,
            height = %height,
            "text layout cache miss"
        );
        if let Ok(mut cache) = self.layout_cache.lock() {
            cache.insert(key, layout.clone());
        }
        Ok(layout)
    }
}

impl PartialEq for Text {
    fn eq(&self, other: &Self) -> bool {
        self.style == other.style && self.chars == other.chars
    }
}

fn skip_leading_blanks(chars: &[char]) -> &[char] {
    let start = chars
        .iter()
        .position(|ch| !is_blank(*ch))
        .unwrap_or(chars.len());
    &chars[start..]
}

impl Renderable for Text {
    fn calc_dimensions(&self, max_width: Pt) -> Result<Dimension> {
        Ok(self.layout(max_width)?.dim)
    }

    fn render(
        &self,
        target: &mut dyn RenderTarget,
        top_left: Offset,
        dims: Dimension,
    ) -> Result<Offset> {
        let layout = self.layout(dims.width())?;
        let mut y = top_left.y;
        for row in &layout.rows {
            row.render(target, Offset::new(top_left.x, y))?;
            y -= row.line_height();
        }
        Ok(Offset::new(top_left.x + layout.dim.width(), y))
    }

    fn cursor(&self) -> Box<dyn Cursor + '_> {
        Box::new(self.text_cursor())
    }
}

/// Pulls wrapped rows out of a [`Text`] one at a time.
#[derive(Debug, Clone)]
pub struct TextCursor<'a> {
    text: &'a Text,
    index: usize,
    // The last row was cut short by the width, so nothing more from this
    // text belongs on the current line.
    line_full: bool,
}

impl TextCursor<'_> {
    pub fn index(&self) -> usize {
        self.index
    }

    fn next_row(&self, max_width: Pt) -> Result<WrappedRow> {
        wrap_row(&self.text.style, &self.text.chars, self.index, max_width)
    }

    fn commit(&mut self, wrapped: &WrappedRow) {
        self.index = wrapped.next_index;
        self.line_full = !wrapped.terminal && has_more_text(&self.text.chars, self.index);
    }
}

impl Cursor for TextCursor<'_> {
    fn has_more(&self) -> bool {
        has_more_text(&self.text.chars, self.index)
    }

    fn get_something(&mut self, max_width: Pt) -> Result<ContTerm> {
        let wrapped = self.next_row(max_width)?;
        self.commit(&wrapped);
        let item: Arc<dyn FixedItem> = Arc::new(wrapped.row);
        Ok(ContTerm {
            item,
            terminal: wrapped.terminal,
        })
    }

    fn get_if_fits(&mut self, remaining_width: Pt) -> Result<Fit> {
        if self.line_full || remaining_width <= Pt::ZERO {
            return Ok(Fit::None);
        }
        let wrapped = self.next_row(remaining_width)?;
        if wrapped.row.width > remaining_width {
            return Ok(Fit::None);
        }
        self.commit(&wrapped);
        let item: Arc<dyn FixedItem> = Arc::new(wrapped.row);
        Ok(if wrapped.terminal {
            Fit::Terminal(item)
        } else {
            Fit::Continuing(item)
        })
    }
}
