use std::fmt;
use std::sync::Arc;

use crate::error::{LayoutError, Result};
use crate::render::RenderTarget;
use crate::types::{Dimension, Offset, Pt};

/// Content whose size is already resolved. This is what lines are made of.
pub trait FixedItem: fmt::Debug + Send + Sync {
    fn dimension(&self) -> Dimension;

    /// Distance from the top of the item to its baseline.
    fn ascent(&self) -> Pt;

    fn descent_and_leading(&self) -> Pt;

    fn line_height(&self) -> Pt {
        self.ascent() + self.descent_and_leading()
    }

    /// Draws the item with its top left corner at `top_left` and returns the
    /// bottom right corner it reached.
    fn render(&self, target: &mut dyn RenderTarget, top_left: Offset) -> Result<Offset>;
}

/// Result of an unconditional pull from a [`Cursor`].
#[derive(Debug, Clone)]
pub struct ContTerm {
    pub item: Arc<dyn FixedItem>,
    /// The item ended at a hard line break.
    pub terminal: bool,
}

impl ContTerm {
    pub fn continuing(item: Arc<dyn FixedItem>) -> Self {
        Self {
            item,
            terminal: false,
        }
    }

    pub fn terminal(item: Arc<dyn FixedItem>) -> Self {
        Self {
            item,
            terminal: true,
        }
    }
}

/// Result of a tentative pull from a [`Cursor`].
#[derive(Debug, Clone)]
pub enum Fit {
    /// Accepted; more content may follow on the same line.
    Continuing(Arc<dyn FixedItem>),
    /// Accepted; the line must end after this item.
    Terminal(Arc<dyn FixedItem>),
    /// Rejected. The cursor did not move.
    None,
}

impl Fit {
    pub fn is_none(&self) -> bool {
        matches!(self, Fit::None)
    }
}

/// Pull protocol between the line filler and a piece of content.
pub trait Cursor {
    fn has_more(&self) -> bool;

    /// Consumes and returns the next item, sized for `max_width` but allowed
    /// to overflow it when nothing smaller can be produced.
    fn get_something(&mut self, max_width: Pt) -> Result<ContTerm>;

    /// Consumes the next item only if it fits in `remaining_width`. A
    /// [`Fit::None`] result leaves the cursor untouched.
    fn get_if_fits(&mut self, remaining_width: Pt) -> Result<Fit>;
}

/// Content that still needs a width before it knows its size.
pub trait Renderable: RenderableClone + fmt::Debug + Send + Sync {
    fn calc_dimensions(&self, max_width: Pt) -> Result<Dimension>;

    /// Draws the content into the box `dims` whose top left corner is
    /// `top_left`, returning the bottom right corner reached.
    fn render(
        &self,
        target: &mut dyn RenderTarget,
        top_left: Offset,
        dims: Dimension,
    ) -> Result<Offset>;

    fn cursor(&self) -> Box<dyn Cursor + '_>;
}

pub trait RenderableClone {
    fn clone_box(&self) -> Box<dyn Renderable>;
}

impl<T> RenderableClone for T
where
    T: 'static + Renderable + Clone,
{
    fn clone_box(&self) -> Box<dyn Renderable> {
        Box::new(self.clone())
    }
}

impl Clone for Box<dyn Renderable> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Small memo of layouts keyed by the milli-point width they were computed
/// for.
#[derive(Debug)]
pub(crate) struct WidthCache<T> {
    entries: Vec<(i64, Arc<T>)>,
}

impl<T> Default for WidthCache<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> WidthCache<T> {
    const MAX_ENTRIES: usize = 8;

    pub(crate) fn get(&self, key: i64) -> Option<Arc<T>> {
        self.entries
            .iter()
            .find_map(|(k, v)| if *k == key { Some(v.clone()) } else { None })
    }

    pub(crate) fn insert(&mut self, key: i64, value: Arc<T>) {
        if let Some(pos) = self.entries.iter().position(|(k, _)| *k == key) {
            self.entries.remove(pos);
        }
        self.entries.push((key, value));
        if self.entries.len() > Self::MAX_ENTRIES {
            self.entries.remove(0);
        }
    }
}

/// Cursor over content that is placed as a whole: images, nested cells and
/// tables.
#[derive(Debug)]
pub struct SingleItemCursor {
    item: Option<Arc<dyn FixedItem>>,
}

impl SingleItemCursor {
    pub fn new(item: Arc<dyn FixedItem>) -> Self {
        Self { item: Some(item) }
    }

    fn exhausted() -> LayoutError {
        LayoutError::InvalidState("cursor has no more items".to_string())
    }
}

impl Cursor for SingleItemCursor {
    fn has_more(&self) -> bool {
        self.item.is_some()
    }

    fn get_something(&mut self, _max_width: Pt) -> Result<ContTerm> {
        let item = self.item.take().ok_or_else(Self::exhausted)?;
        Ok(ContTerm::continuing(item))
    }

    fn get_if_fits(&mut self, remaining_width: Pt) -> Result<Fit> {
        let Some(item) = self.item.as_ref() else {
            return Err(Self::exhausted());
        };
        if item.dimension().width() > remaining_width {
            return Ok(Fit::None);
        }
        Ok(self.item.take().map_or(Fit::None, Fit::Continuing))
    }
}

/// A run of fixed items sharing one baseline.
#[derive(Debug, Clone, Default)]
pub struct Line {
    items: Vec<Arc<dyn FixedItem>>,
    width: Pt,
    max_ascent: Pt,
    max_descent_and_leading: Pt,
}

impl Line {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: Arc<dyn FixedItem>) {
        self.width += item.dimension().width();
        self.max_ascent = self.max_ascent.max(item.ascent());
        self.max_descent_and_leading = self
            .max_descent_and_leading
            .max(item.descent_and_leading());
        self.items.push(item);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Arc<dyn FixedItem>] {
        &self.items
    }

    pub fn width(&self) -> Pt {
        self.width
    }

    pub fn ascent(&self) -> Pt {
        self.max_ascent
    }

    pub fn descent_and_leading(&self) -> Pt {
        self.max_descent_and_leading
    }

    pub fn height(&self) -> Pt {
        self.max_ascent + self.max_descent_and_leading
    }

    pub fn dimension(&self) -> Dimension {
        Dimension::measured(self.width, self.height())
    }

    /// Renders every item so that their baselines meet at
    /// `top_left.y - ascent()`. Returns the right end of the line and the
    /// bottom of its box.
    pub fn render(&self, target: &mut dyn RenderTarget, top_left: Offset) -> Result<Offset> {
        let mut x = top_left.x;
        for item in &self.items {
            let item_top = top_left.y - (self.max_ascent - item.ascent());
            item.render(target, Offset::new(x, item_top))?;
            x += item.dimension().width();
        }
        Ok(Offset::new(x, top_left.y - self.height()))
    }
}

/// Fills lines no wider than `max_width` from `items`, in order. A single
/// item wider than `max_width` gets a line to itself.
pub fn renderables_to_lines(items: &[Box<dyn Renderable>], max_width: Pt) -> Result<Vec<Line>> {
    if max_width <= Pt::ZERO {
        return Err(LayoutError::InvalidArgument(format!(
            "line width must be positive, not {max_width}"
        )));
    }
    let mut lines = Vec::new();
    let mut line = Line::new();
    for item in items {
        let mut cursor = item.cursor();
        while cursor.has_more() {
            if line.is_empty() {
                let ContTerm { item, terminal } = cursor.get_something(max_width)?;
                line.push(item);
                if terminal {
                    close_line(&mut lines, &mut line);
                }
                continue;
            }
            match cursor.get_if_fits(max_width - line.width())? {
                Fit::Continuing(item) => line.push(item),
                Fit::Terminal(item) => {
                    line.push(item);
                    close_line(&mut lines, &mut line);
                }
                Fit::None => close_line(&mut lines, &mut line),
            }
        }
    }
    if !line.is_empty() {
        close_line(&mut lines, &mut line);
    }
    Ok(lines)
}

fn close_line(lines: &mut Vec<Line>, line: &mut Line) {
    let closed = std::mem::take(line);
    tracing::trace!(
        items = closed.items.len(),
        width = %closed.width,
        height = %closed.height(),
        "line closed"
    );
    lines.push(closed);
}
