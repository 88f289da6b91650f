use std::sync::{Arc, Mutex};

use crate::error::{LayoutError, Result};
use crate::line::{
    ContTerm, Cursor, Fit, FixedItem, Line, Renderable, WidthCache, renderables_to_lines,
};
use crate::render::RenderTarget;
use crate::style::{Align, CellStyle};
use crate::text::{Text, TextStyle};
use crate::types::{Dimension, Offset, Pt};

#[derive(Debug)]
struct CellLayout {
    lines: Vec<Line>,
    /// Size of the wrapped content, without padding.
    dim: Dimension,
}

/// A styled box with a fixed width. Its height comes from how the contents
/// wrap at that width.
#[derive(Debug, Clone)]
pub struct Cell {
    style: CellStyle,
    width: Pt,
    contents: Vec<Box<dyn Renderable>>,
    layout_cache: Arc<Mutex<WidthCache<CellLayout>>>,
}

impl Cell {
    pub fn new(style: CellStyle, width: Pt, contents: Vec<Box<dyn Renderable>>) -> Result<Self> {
        if width.is_negative() {
            return Err(LayoutError::InvalidArgument(format!(
                "a cell cannot have a negative width, not {width}"
            )));
        }
        Ok(Self {
            style,
            width,
            contents,
            layout_cache: Arc::new(Mutex::new(WidthCache::default())),
        })
    }

    pub fn builder(style: CellStyle, width: Pt) -> CellBuilder {
        CellBuilder::new(style, width)
    }

    pub fn style(&self) -> &CellStyle {
        &self.style
    }

    pub fn width(&self) -> Pt {
        self.width
    }

    pub fn contents(&self) -> &[Box<dyn Renderable>] {
        &self.contents
    }

    /// Lines of content wrapped for a box `max_width` wide.
    pub fn lines(&self, max_width: Pt) -> Result<Vec<Line>> {
        Ok(self.layout(max_width)?.lines.clone())
    }

    /// Lays the cell out at its own width.
    pub fn fix(&self) -> Result<FixedCell> {
        let layout = self.layout(self.width)?;
        let height = self.style.padding.add_to(layout.dim).height();
        Ok(FixedCell {
            style: self.style,
            dim: Dimension::measured(self.width, height),
            layout,
        })
    }

    fn layout(&self, max_width: Pt) -> Result<Arc<CellLayout>> {
        let key = max_width.to_milli_i64();
        if let Ok(cache) = self.layout_cache.lock() {
            if let Some(layout) = cache.get(key) {
                return Ok(layout);
            }
        }
        let lines = if self.contents.is_empty() {
            Vec::new()
        } else {
            let inner_width = max_width - self.style.padding.horizontal();
            renderables_to_lines(&self.contents, inner_width)?
        };
        let width = lines.iter().map(Line::width).max().unwrap_or(Pt::ZERO);
        let height = lines.iter().map(Line::height).sum::<Pt>();
        let layout = Arc::new(CellLayout {
            lines,
            dim: Dimension::measured(width, height),
        });
        tracing::debug!(
            max_width = %max_width,
            lines = layout.lines.len(),
            width = %width,
            height = %height,
            "cell layout cache miss"
        );
        if let Ok(mut cache) = self.layout_cache.lock() {
            cache.insert(key, layout.clone());
        }
        Ok(layout)
    }
}

impl Renderable for Cell {
    fn calc_dimensions(&self, max_width: Pt) -> Result<Dimension> {
        let layout = self.layout(max_width)?;
        Ok(self.style.padding.add_to(layout.dim))
    }

    fn render(
        &self,
        target: &mut dyn RenderTarget,
        top_left: Offset,
        dims: Dimension,
    ) -> Result<Offset> {
        let layout = self.layout(dims.width())?;
        render_box(&self.style, &layout, target, top_left, dims)
    }

    fn cursor(&self) -> Box<dyn Cursor + '_> {
        Box::new(CellCursor {
            cell: self,
            done: false,
        })
    }
}

/// A cell laid out at its own width, placed on a line as a single item
/// whose baseline is its bottom edge.
#[derive(Debug, Clone)]
pub struct FixedCell {
    style: CellStyle,
    dim: Dimension,
    layout: Arc<CellLayout>,
}

impl FixedItem for FixedCell {
    fn dimension(&self) -> Dimension {
        self.dim
    }

    fn ascent(&self) -> Pt {
        self.dim.height()
    }

    fn descent_and_leading(&self) -> Pt {
        Pt::ZERO
    }

    fn render(&self, target: &mut dyn RenderTarget, top_left: Offset) -> Result<Offset> {
        render_box(&self.style, &self.layout, target, top_left, self.dim)
    }
}

struct CellCursor<'a> {
    cell: &'a Cell,
    done: bool,
}

impl CellCursor<'_> {
    fn next_item(&self) -> Result<Arc<dyn FixedItem>> {
        if self.done {
            return Err(LayoutError::InvalidState(
                "cell cursor has no more items".to_string(),
            ));
        }
        Ok(Arc::new(self.cell.fix()?))
    }
}

impl Cursor for CellCursor<'_> {
    fn has_more(&self) -> bool {
        !self.done
    }

    fn get_something(&mut self, _max_width: Pt) -> Result<ContTerm> {
        let item = self.next_item()?;
        self.done = true;
        Ok(ContTerm::continuing(item))
    }

    fn get_if_fits(&mut self, remaining_width: Pt) -> Result<Fit> {
        let item = self.next_item()?;
        if item.dimension().width() > remaining_width {
            return Ok(Fit::None);
        }
        self.done = true;
        Ok(Fit::Continuing(item))
    }
}

// Background, then aligned content, then borders. Returns the right edge of
// the box and the lower of its nominal bottom and the content bottom.
fn render_box(
    style: &CellStyle,
    layout: &CellLayout,
    target: &mut dyn RenderTarget,
    outer_top_left: Offset,
    outer: Dimension,
) -> Result<Offset> {
    if let Some(color) = style.background {
        target.fill_rect(outer_top_left, outer, color)?;
    }

    let padding = &style.padding;
    let inner_top_left = padding.apply_top_left(outer_top_left);
    let inner = Dimension::measured(
        outer.width() - padding.horizontal(),
        outer.height() - padding.vertical(),
    );
    let align_pad = style.align.calc_padding(inner, layout.dim);
    let left = inner_top_left.x + align_pad.left();
    let mut y = inner_top_left.y - align_pad.top();
    let mut content_bottom = y;
    for line in &layout.lines {
        let x = left + style.align.left_offset(layout.dim.width(), line.width());
        let end = line.render(target, Offset::new(x, y))?;
        content_bottom = content_bottom.min(end.y);
        y -= line.height();
    }

    let left_x = outer_top_left.x;
    let top_y = outer_top_left.y;
    let right_x = left_x + outer.width();
    // Content that overflows the box drags the bottom border down with it.
    let bottom_y = (top_y - outer.height()).min(content_bottom);
    let border = &style.border;
    if let Some(line) = &border.top {
        target.draw_line(Offset::new(left_x, top_y), Offset::new(right_x, top_y), line)?;
    }
    if let Some(line) = &border.right {
        target.draw_line(
            Offset::new(right_x, top_y),
            Offset::new(right_x, bottom_y),
            line,
        )?;
    }
    if let Some(line) = &border.bottom {
        target.draw_line(
            Offset::new(left_x, bottom_y),
            Offset::new(right_x, bottom_y),
            line,
        )?;
    }
    if let Some(line) = &border.left {
        target.draw_line(
            Offset::new(left_x, top_y),
            Offset::new(left_x, bottom_y),
            line,
        )?;
    }
    Ok(Offset::new(right_x, bottom_y))
}

/// Collects the contents of a [`Cell`].
#[derive(Debug, Clone)]
pub struct CellBuilder {
    style: CellStyle,
    width: Pt,
    contents: Vec<Box<dyn Renderable>>,
    text_style: Option<TextStyle>,
}

impl CellBuilder {
    pub fn new(style: CellStyle, width: Pt) -> Self {
        Self {
            style,
            width,
            contents: Vec::new(),
            text_style: None,
        }
    }

    pub fn width(&self) -> Pt {
        self.width
    }

    pub fn style(&self) -> CellStyle {
        self.style
    }

    pub fn cell_style(mut self, style: CellStyle) -> Self {
        self.style = style;
        self
    }

    pub fn align(mut self, align: Align) -> Self {
        self.style = self.style.with_align(align);
        self
    }

    /// Style used by [`CellBuilder::add_strs`].
    pub fn text_style(mut self, style: TextStyle) -> Self {
        self.text_style = Some(style);
        self
    }

    pub fn add<R: Renderable + 'static>(mut self, item: R) -> Self {
        self.contents.push(Box::new(item));
        self
    }

    pub fn add_all(mut self, items: impl IntoIterator<Item = Box<dyn Renderable>>) -> Self {
        self.contents.extend(items);
        self
    }

    pub fn add_strs(mut self, strs: &[&str]) -> Result<Self> {
        let Some(style) = self.text_style.clone() else {
            return Err(LayoutError::InvalidState(
                "set a default text style before adding raw strings".to_string(),
            ));
        };
        for s in strs {
            self.contents.push(Box::new(Text::new(style.clone(), s)));
        }
        Ok(self)
    }

    pub fn add_texts<S: AsRef<str>>(
        mut self,
        style: &TextStyle,
        strs: impl IntoIterator<Item = S>,
    ) -> Self {
        for s in strs {
            self.contents
                .push(Box::new(Text::new(style.clone(), s.as_ref())));
        }
        self
    }

    pub fn build(self) -> Result<Cell> {
        Cell::new(self.style, self.width, self.contents)
    }
}
