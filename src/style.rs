use crate::error::{LayoutError, Result};
use crate::types::{Color, Dimension, Offset, Pt};

/// Color and width of a stroked line. Immutable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStyle {
    color: Color,
    width: Pt,
}

impl LineStyle {
    pub const DEFAULT_WIDTH: Pt = Pt::from_milli(1000);

    pub fn new(color: Color, width: Pt) -> Result<Self> {
        if width <= Pt::ZERO {
            return Err(LayoutError::InvalidArgument(format!(
                "line style must have a positive width, not {width}"
            )));
        }
        Ok(Self { color, width })
    }

    pub fn of_color(color: Color) -> Self {
        Self {
            color,
            width: Self::DEFAULT_WIDTH,
        }
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn width(&self) -> Pt {
        self.width
    }
}

/// Per-edge borders, listed top, right, bottom, left like CSS. A missing
/// edge is simply not drawn.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BorderStyle {
    pub top: Option<LineStyle>,
    pub right: Option<LineStyle>,
    pub bottom: Option<LineStyle>,
    pub left: Option<LineStyle>,
}

impl BorderStyle {
    pub const NONE: BorderStyle = BorderStyle {
        top: None,
        right: None,
        bottom: None,
        left: None,
    };

    pub fn new(
        top: Option<LineStyle>,
        right: Option<LineStyle>,
        bottom: Option<LineStyle>,
        left: Option<LineStyle>,
    ) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    pub fn all(line: LineStyle) -> Self {
        Self::new(Some(line), Some(line), Some(line), Some(line))
    }

    pub fn uniform(color: Color, width: Pt) -> Result<Self> {
        Ok(Self::all(LineStyle::new(color, width)?))
    }

    pub fn with_top(self, line: LineStyle) -> Self {
        Self {
            top: Some(line),
            ..self
        }
    }

    pub fn with_right(self, line: LineStyle) -> Self {
        Self {
            right: Some(line),
            ..self
        }
    }

    pub fn with_bottom(self, line: LineStyle) -> Self {
        Self {
            bottom: Some(line),
            ..self
        }
    }

    pub fn with_left(self, line: LineStyle) -> Self {
        Self {
            left: Some(line),
            ..self
        }
    }

    pub fn is_empty(&self) -> bool {
        self.top.is_none() && self.right.is_none() && self.bottom.is_none() && self.left.is_none()
    }
}

/// Space kept clear inside a box, top, right, bottom, left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Padding {
    top: Pt,
    right: Pt,
    bottom: Pt,
    left: Pt,
}

impl Padding {
    pub const NONE: Padding = Padding {
        top: Pt::ZERO,
        right: Pt::ZERO,
        bottom: Pt::ZERO,
        left: Pt::ZERO,
    };

    pub const DEFAULT_TEXT_PADDING: Padding = Padding {
        top: Pt::from_milli(1500),
        right: Pt::from_milli(1500),
        bottom: Pt::from_milli(2000),
        left: Pt::from_milli(1500),
    };

    pub fn new(top: Pt, right: Pt, bottom: Pt, left: Pt) -> Result<Self> {
        if top.is_negative() || right.is_negative() || bottom.is_negative() || left.is_negative()
        {
            return Err(LayoutError::InvalidArgument(format!(
                "padding must not be negative: {top} {right} {bottom} {left}"
            )));
        }
        Ok(Self {
            top,
            right,
            bottom,
            left,
        })
    }

    pub fn uniform(value: Pt) -> Result<Self> {
        Self::new(value, value, value, value)
    }

    pub fn from_f32(top: f32, right: f32, bottom: f32, left: f32) -> Result<Self> {
        Self::new(
            Pt::from_f32(top),
            Pt::from_f32(right),
            Pt::from_f32(bottom),
            Pt::from_f32(left),
        )
    }

    // Alignment math only ever produces non-negative sides.
    fn unchecked(top: Pt, right: Pt, bottom: Pt, left: Pt) -> Self {
        Self {
            top: top.max(Pt::ZERO),
            right: right.max(Pt::ZERO),
            bottom: bottom.max(Pt::ZERO),
            left: left.max(Pt::ZERO),
        }
    }

    pub fn top(&self) -> Pt {
        self.top
    }

    pub fn right(&self) -> Pt {
        self.right
    }

    pub fn bottom(&self) -> Pt {
        self.bottom
    }

    pub fn left(&self) -> Pt {
        self.left
    }

    pub fn horizontal(&self) -> Pt {
        self.left + self.right
    }

    pub fn vertical(&self) -> Pt {
        self.top + self.bottom
    }

    /// Shrinks `outer` by this padding. Fails when the padding is larger
    /// than the box it pads.
    pub fn subtract_from(&self, outer: Dimension) -> Result<Dimension> {
        Dimension::new(
            outer.width() - self.horizontal(),
            outer.height() - self.vertical(),
        )
    }

    pub fn add_to(&self, inner: Dimension) -> Dimension {
        Dimension::measured(
            inner.width() + self.horizontal(),
            inner.height() + self.vertical(),
        )
    }

    /// Moves a top-left corner right by the left padding and down by the top.
    pub fn apply_top_left(&self, outer: Offset) -> Offset {
        Offset::new(outer.x + self.left, outer.y - self.top)
    }
}

/// Where content sits inside a box that is larger than the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Align {
    #[default]
    TopLeft,
    TopCenter,
    TopRight,
    MiddleLeft,
    MiddleCenter,
    MiddleRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    Start,
    Center,
    End,
}

impl Align {
    pub const ALL: [Align; 9] = [
        Align::TopLeft,
        Align::TopCenter,
        Align::TopRight,
        Align::MiddleLeft,
        Align::MiddleCenter,
        Align::MiddleRight,
        Align::BottomLeft,
        Align::BottomCenter,
        Align::BottomRight,
    ];

    fn vertical(self) -> Anchor {
        match self {
            Align::TopLeft | Align::TopCenter | Align::TopRight => Anchor::Start,
            Align::MiddleLeft | Align::MiddleCenter | Align::MiddleRight => Anchor::Center,
            Align::BottomLeft | Align::BottomCenter | Align::BottomRight => Anchor::End,
        }
    }

    fn horizontal(self) -> Anchor {
        match self {
            Align::TopLeft | Align::MiddleLeft | Align::BottomLeft => Anchor::Start,
            Align::TopCenter | Align::MiddleCenter | Align::BottomCenter => Anchor::Center,
            Align::TopRight | Align::MiddleRight | Align::BottomRight => Anchor::End,
        }
    }

    /// Extra padding that places `inner` inside `outer`. Never negative:
    /// content larger than the box gets no padding on that axis and is left
    /// to overflow.
    pub fn calc_padding(self, outer: Dimension, inner: Dimension) -> Padding {
        if outer.lte(&inner) {
            return Padding::NONE;
        }
        let spare_x = (outer.width() - inner.width()).max(Pt::ZERO);
        let spare_y = (outer.height() - inner.height()).max(Pt::ZERO);
        let (left, right) = split_spare(spare_x, self.horizontal());
        let (top, bottom) = split_spare(spare_y, self.vertical());
        Padding::unchecked(top, right, bottom, left)
    }

    /// Horizontal offset of a line of `inner_width` within a block of
    /// `outer_width`.
    pub fn left_offset(self, outer_width: Pt, inner_width: Pt) -> Pt {
        if inner_width >= outer_width {
            return Pt::ZERO;
        }
        match self.horizontal() {
            Anchor::Start => Pt::ZERO,
            Anchor::Center => (outer_width - inner_width) / 2,
            Anchor::End => outer_width - inner_width,
        }
    }
}

// (before, after) share of the spare room along one axis.
fn split_spare(spare: Pt, anchor: Anchor) -> (Pt, Pt) {
    match anchor {
        Anchor::Start => (Pt::ZERO, spare),
        Anchor::Center => {
            let half = spare / 2;
            (half, half)
        }
        Anchor::End => (spare, Pt::ZERO),
    }
}

/// Alignment, padding, background, and border of a box. Immutable; the
/// `with_*` methods return modified copies.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CellStyle {
    pub align: Align,
    pub padding: Padding,
    pub background: Option<Color>,
    pub border: BorderStyle,
}

impl CellStyle {
    pub const DEFAULT: CellStyle = CellStyle {
        align: Align::TopLeft,
        padding: Padding::NONE,
        background: None,
        border: BorderStyle::NONE,
    };

    pub fn new(
        align: Align,
        padding: Padding,
        background: Option<Color>,
        border: BorderStyle,
    ) -> Self {
        Self {
            align,
            padding,
            background,
            border,
        }
    }

    pub fn with_align(self, align: Align) -> Self {
        Self { align, ..self }
    }

    pub fn with_padding(self, padding: Padding) -> Self {
        Self { padding, ..self }
    }

    pub fn with_background(self, color: Color) -> Self {
        Self {
            background: Some(color),
            ..self
        }
    }

    pub fn with_border(self, border: BorderStyle) -> Self {
        Self { border, ..self }
    }
}
