use crate::error::Result;
use crate::image::ScaledImage;
use crate::style::LineStyle;
use crate::text::TextStyle;
use crate::types::{Color, Dimension, Offset, Pt};

/// The drawing surface layout code renders into. Coordinates are in points
/// with y growing upward.
pub trait RenderTarget {
    fn fill_rect(&mut self, top_left: Offset, dim: Dimension, color: Color) -> Result<()>;

    fn draw_line(&mut self, from: Offset, to: Offset, style: &LineStyle) -> Result<()>;

    /// `baseline_left` is where the first glyph's origin sits.
    fn draw_styled_text(
        &mut self,
        baseline_left: Offset,
        text: &str,
        style: &TextStyle,
    ) -> Result<()>;

    /// Draws an image with its lower left corner at `bottom_left` and returns
    /// the y coordinate of the image bottom after any adjustment the target
    /// had to make.
    fn draw_image(&mut self, bottom_left: Offset, image: &ScaledImage) -> Result<Pt>;
}
