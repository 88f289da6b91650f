mod canvas;
mod cell;
mod error;
mod font;
mod image;
mod line;
mod render;
mod style;
mod table;
mod text;
mod types;

pub use canvas::{BACKGROUND_Z, Canvas, Command, DEFAULT_Z, Page};
pub use cell::{Cell, CellBuilder, FixedCell};
pub use error::{LayoutError, Result};
pub use font::{EmbeddedFont, Font, StandardFont};
pub use crate::image::{IMAGE_DPI, ScaledImage};
pub use line::{
    ContTerm, Cursor, Fit, FixedItem, Line, Renderable, RenderableClone, SingleItemCursor,
    renderables_to_lines,
};
pub use render::RenderTarget;
pub use style::{Align, BorderStyle, CellStyle, LineStyle, Padding};
pub use table::{RowCellBuilder, Table, TableBuilder, TablePart, TableRow, TableRowBuilder};
pub use text::{
    CHARS_PER_WIDTH_GUESS, DEFAULT_LEADING_FACTOR, GLYPH_UNITS_PER_POINT, Text, TextCursor,
    TextRow, TextStyle, WrappedRow, has_more_text, wrap_row,
};
pub use types::{Color, Dimension, Offset, Pt};
