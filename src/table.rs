use std::sync::Arc;

use crate::cell::{Cell, CellBuilder};
use crate::error::{LayoutError, Result};
use crate::image::ScaledImage;
use crate::line::{Cursor, FixedItem, Renderable, SingleItemCursor};
use crate::render::RenderTarget;
use crate::style::{Align, BorderStyle, CellStyle};
use crate::text::{Text, TextStyle};
use crate::types::{Dimension, Offset, Pt};

fn check_width(width: Pt, what: &str) -> Result<Pt> {
    if width.is_negative() {
        return Err(LayoutError::InvalidArgument(format!(
            "{what} must not be negative, not {width}"
        )));
    }
    Ok(width)
}

/// Collects column widths, default styles and parts for a [`Table`].
#[derive(Debug, Clone, Default)]
pub struct TableBuilder {
    cell_widths: Vec<Pt>,
    cell_style: CellStyle,
    text_style: Option<TextStyle>,
    parts: Vec<TablePart>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cell_widths(&self) -> &[Pt] {
        &self.cell_widths
    }

    pub fn add_cell_width(&mut self, width: Pt) -> Result<&mut Self> {
        self.cell_widths.push(check_width(width, "column width")?);
        Ok(self)
    }

    pub fn add_cell_widths(&mut self, widths: &[Pt]) -> Result<&mut Self> {
        for width in widths {
            self.add_cell_width(*width)?;
        }
        Ok(self)
    }

    pub fn cell_style(&mut self, style: CellStyle) -> &mut Self {
        self.cell_style = style;
        self
    }

    pub fn text_style(&mut self, style: TextStyle) -> &mut Self {
        self.text_style = Some(style);
        self
    }

    /// Starts a part that inherits this table's widths and styles.
    pub fn part_builder(&self) -> TablePart {
        TablePart {
            cell_widths: self.cell_widths.clone(),
            cell_style: self.cell_style,
            text_style: self.text_style.clone(),
            min_row_height: Pt::ZERO,
            rows: Vec::new(),
        }
    }

    pub fn add_part(&mut self, part: TablePart) -> &mut Self {
        self.parts.push(part);
        self
    }

    pub fn build(&self) -> Result<Table> {
        Table::new(self.parts.clone())
    }
}

/// A group of rows sharing defaults, such as a header or a body.
#[derive(Debug, Clone)]
pub struct TablePart {
    cell_widths: Vec<Pt>,
    cell_style: CellStyle,
    text_style: Option<TextStyle>,
    min_row_height: Pt,
    rows: Vec<TableRow>,
}

impl TablePart {
    pub fn cell_widths(&self) -> &[Pt] {
        &self.cell_widths
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn align(&mut self, align: Align) -> &mut Self {
        self.cell_style = self.cell_style.with_align(align);
        self
    }

    pub fn cell_style(&mut self, style: CellStyle) -> &mut Self {
        self.cell_style = style;
        self
    }

    pub fn text_style(&mut self, style: TextStyle) -> &mut Self {
        self.text_style = Some(style);
        self
    }

    pub fn min_row_height(&mut self, height: Pt) -> Result<&mut Self> {
        self.min_row_height = check_width(height, "minimum row height")?;
        Ok(self)
    }

    pub fn row_builder(&self) -> TableRowBuilder {
        TableRowBuilder {
            cell_widths: self.cell_widths.clone(),
            cell_style: self.cell_style,
            text_style: self.text_style.clone(),
            cells: Vec::with_capacity(self.cell_widths.len()),
            min_row_height: self.min_row_height,
            next_cell_idx: 0,
        }
    }

    pub fn add_row(&mut self, row: TableRow) -> &mut Self {
        self.rows.push(row);
        self
    }

    /// Hands the finished part back to its table.
    pub fn build(self, table: &mut TableBuilder) -> &mut TableBuilder {
        table.add_part(self)
    }

    pub fn calc_dimensions(&self) -> Result<Dimension> {
        let mut width = Pt::ZERO;
        let mut height = Pt::ZERO;
        for row in &self.rows {
            let dim = row.calc_dimensions()?;
            width = width.max(dim.width());
            height += dim.height();
        }
        tracing::debug!(rows = self.rows.len(), width = %width, height = %height, "table part");
        Ok(Dimension::measured(width, height))
    }

    pub fn render(&self, target: &mut dyn RenderTarget, top_left: Offset) -> Result<Offset> {
        let mut lowest = top_left;
        for row in &self.rows {
            let end = row.render(target, Offset::new(top_left.x, lowest.y))?;
            lowest = lowest.max_x_min_y(end);
        }
        Ok(lowest)
    }
}

/// Fills the cells of one row. Cells may be built out of order: a
/// [`RowCellBuilder`] reserves its column when created and fills it when
/// built.
#[derive(Debug, Clone)]
pub struct TableRowBuilder {
    cell_widths: Vec<Pt>,
    cell_style: CellStyle,
    text_style: Option<TextStyle>,
    cells: Vec<Option<Cell>>,
    min_row_height: Pt,
    next_cell_idx: usize,
}

impl TableRowBuilder {
    pub fn next_cell_idx(&self) -> usize {
        self.next_cell_idx
    }

    /// Width of the next column to be filled.
    pub fn next_cell_size(&self) -> Result<Pt> {
        self.cell_widths
            .get(self.next_cell_idx)
            .copied()
            .ok_or_else(|| {
                LayoutError::InvalidState(format!(
                    "tried to add more cells than the {} column widths set",
                    self.cell_widths.len()
                ))
            })
    }

    pub fn text_style(&mut self, style: TextStyle) -> &mut Self {
        self.text_style = Some(style);
        self
    }

    pub fn min_row_height(&mut self, height: Pt) -> Result<&mut Self> {
        self.min_row_height = check_width(height, "minimum row height")?;
        Ok(self)
    }

    pub fn add_cell(&mut self, cell: Cell) -> Result<&mut Self> {
        self.next_cell_size()?;
        let idx = self.next_cell_idx;
        self.add_cell_at(cell, idx)?;
        self.next_cell_idx += 1;
        Ok(self)
    }

    pub fn add_cells(&mut self, cells: impl IntoIterator<Item = Cell>) -> Result<&mut Self> {
        for cell in cells {
            self.add_cell(cell)?;
        }
        Ok(self)
    }

    /// One text cell per string, in the row's default text style.
    pub fn add_text_cells(&mut self, strs: &[&str]) -> Result<&mut Self> {
        let Some(style) = self.text_style.clone() else {
            return Err(LayoutError::InvalidState(
                "tried to add a text cell without setting a default text style".to_string(),
            ));
        };
        for s in strs {
            let width = self.next_cell_size()?;
            let text: Box<dyn Renderable> = Box::new(Text::new(style.clone(), s));
            self.add_cell(Cell::new(self.cell_style, width, vec![text])?)?;
        }
        Ok(self)
    }

    pub fn add_image_cells(&mut self, images: &[ScaledImage]) -> Result<&mut Self> {
        for image in images {
            let width = self.next_cell_size()?;
            let item: Box<dyn Renderable> = Box::new(image.clone());
            self.add_cell(Cell::new(self.cell_style, width, vec![item])?)?;
        }
        Ok(self)
    }

    /// Puts `cell` in column `idx`. Fails if that column is already filled.
    pub fn add_cell_at(&mut self, cell: Cell, idx: usize) -> Result<&mut Self> {
        if idx >= self.cell_widths.len() {
            return Err(LayoutError::InvalidState(format!(
                "column {idx} is past the {} column widths set",
                self.cell_widths.len()
            )));
        }
        if self.cells.len() <= idx {
            self.cells.resize_with(idx + 1, || None);
        }
        if self.cells[idx].is_some() {
            return Err(LayoutError::InvalidState(format!(
                "column {idx} of this row is already filled"
            )));
        }
        self.cells[idx] = Some(cell);
        Ok(self)
    }

    /// Reserves the next column for a cell built later with
    /// [`RowCellBuilder::build_cell`].
    pub fn cell_builder(&mut self) -> Result<RowCellBuilder> {
        let width = self.next_cell_size()?;
        let mut inner = CellBuilder::new(self.cell_style, width);
        if let Some(style) = &self.text_style {
            inner = inner.text_style(style.clone());
        }
        let builder = RowCellBuilder {
            inner,
            column: self.next_cell_idx,
        };
        self.next_cell_idx += 1;
        Ok(builder)
    }

    pub fn build_row(self) -> Result<TableRow> {
        if self.cells.len() != self.cell_widths.len() {
            return Err(LayoutError::InvalidState(format!(
                "row has {} cells but {} column widths",
                self.cells.len(),
                self.cell_widths.len()
            )));
        }
        let mut cells = Vec::with_capacity(self.cells.len());
        for (idx, cell) in self.cells.into_iter().enumerate() {
            let Some(cell) = cell else {
                return Err(LayoutError::InvalidState(format!(
                    "cannot build a row while column {idx} is not filled"
                )));
            };
            cells.push(cell);
        }
        Ok(TableRow {
            cells,
            min_row_height: self.min_row_height,
        })
    }

    /// Size the row would have if built now. Empty columns count as zero.
    pub fn calc_dimensions(&self) -> Result<Dimension> {
        row_dimensions(self.cells.iter().flatten(), self.min_row_height)
    }

    pub fn render(&self, target: &mut dyn RenderTarget, top_left: Offset) -> Result<Offset> {
        render_row(self.cells.iter().flatten(), self.min_row_height, target, top_left)
    }
}

/// Builds the cell for a column reserved by [`TableRowBuilder::cell_builder`].
#[derive(Debug, Clone)]
pub struct RowCellBuilder {
    inner: CellBuilder,
    column: usize,
}

impl RowCellBuilder {
    pub fn column(&self) -> usize {
        self.column
    }

    pub fn width(&self) -> Pt {
        self.inner.width()
    }

    pub fn cell_style(mut self, style: CellStyle) -> Self {
        self.inner = self.inner.cell_style(style);
        self
    }

    pub fn border_style(mut self, border: BorderStyle) -> Self {
        let style = self.inner.style().with_border(border);
        self.inner = self.inner.cell_style(style);
        self
    }

    pub fn align(mut self, align: Align) -> Self {
        self.inner = self.inner.align(align);
        self
    }

    pub fn text_style(mut self, style: TextStyle) -> Self {
        self.inner = self.inner.text_style(style);
        self
    }

    pub fn add<R: Renderable + 'static>(mut self, item: R) -> Self {
        self.inner = self.inner.add(item);
        self
    }

    pub fn add_all(mut self, items: impl IntoIterator<Item = Box<dyn Renderable>>) -> Self {
        self.inner = self.inner.add_all(items);
        self
    }

    pub fn add_strs(mut self, strs: &[&str]) -> Result<Self> {
        self.inner = self.inner.add_strs(strs)?;
        Ok(self)
    }

    pub fn add_texts<S: AsRef<str>>(
        mut self,
        style: &TextStyle,
        strs: impl IntoIterator<Item = S>,
    ) -> Self {
        self.inner = self.inner.add_texts(style, strs);
        self
    }

    /// Fills the reserved column of `row`.
    pub fn build_cell(self, row: &mut TableRowBuilder) -> Result<()> {
        let cell = self.inner.build()?;
        row.add_cell_at(cell, self.column)?;
        Ok(())
    }
}

/// A finished row: one cell per column.
#[derive(Debug, Clone)]
pub struct TableRow {
    cells: Vec<Cell>,
    min_row_height: Pt,
}

impl TableRow {
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn calc_dimensions(&self) -> Result<Dimension> {
        row_dimensions(self.cells.iter(), self.min_row_height)
    }

    pub fn render(&self, target: &mut dyn RenderTarget, top_left: Offset) -> Result<Offset> {
        render_row(self.cells.iter(), self.min_row_height, target, top_left)
    }
}

fn row_dimensions<'a>(
    cells: impl Iterator<Item = &'a Cell>,
    min_row_height: Pt,
) -> Result<Dimension> {
    let mut width = Pt::ZERO;
    let mut height = min_row_height;
    for cell in cells {
        width += cell.width();
        height = height.max(cell.calc_dimensions(cell.width())?.height());
    }
    tracing::debug!(width = %width, height = %height, "table row");
    Ok(Dimension::measured(width, height))
}

// Every cell gets the full row height so backgrounds and borders line up.
fn render_row<'a>(
    cells: impl Iterator<Item = &'a Cell> + Clone,
    min_row_height: Pt,
    target: &mut dyn RenderTarget,
    top_left: Offset,
) -> Result<Offset> {
    let height = row_dimensions(cells.clone(), min_row_height)?.height();
    let mut x = top_left.x;
    let mut lowest = top_left.y - height;
    for cell in cells {
        let dims = Dimension::measured(cell.width(), height);
        let end = cell.render(target, Offset::new(x, top_left.y), dims)?;
        lowest = lowest.min(end.y);
        x += cell.width();
    }
    Ok(Offset::new(x, lowest))
}

/// Parts stacked top to bottom. Placed on a line as one item whose baseline
/// is its bottom edge.
#[derive(Debug, Clone)]
pub struct Table {
    parts: Vec<TablePart>,
    dim: Dimension,
}

impl Table {
    pub fn new(parts: Vec<TablePart>) -> Result<Self> {
        let mut width = Pt::ZERO;
        let mut height = Pt::ZERO;
        for part in &parts {
            let dim = part.calc_dimensions()?;
            width = width.max(dim.width());
            height += dim.height();
        }
        tracing::debug!(parts = parts.len(), width = %width, height = %height, "table");
        Ok(Self {
            parts,
            dim: Dimension::measured(width, height),
        })
    }

    pub fn parts(&self) -> &[TablePart] {
        &self.parts
    }
}

impl FixedItem for Table {
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
        let mut lowest = top_left;
        for part in &self.parts {
            let end = part.render(target, Offset::new(top_left.x, lowest.y))?;
            lowest = lowest.max_x_min_y(end);
        }
        Ok(lowest)
    }
}

impl Renderable for Table {
    fn calc_dimensions(&self, _max_width: Pt) -> Result<Dimension> {
        Ok(self.dim)
    }

    fn render(
        &self,
        target: &mut dyn RenderTarget,
        top_left: Offset,
        _dims: Dimension,
    ) -> Result<Offset> {
        FixedItem::render(self, target, top_left)
    }

    fn cursor(&self) -> Box<dyn Cursor + '_> {
        Box::new(SingleItemCursor::new(Arc::new(self.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{Canvas, Command};
    use crate::font::StandardFont;
    use crate::style::{LineStyle, Padding};
    use crate::types::Color;

    fn helv() -> TextStyle {
        TextStyle::new(StandardFont::Helvetica.shared(), Pt::from_f32(9.0), Color::BLACK)
            .expect("style")
    }

    fn widths(ws: &[f32]) -> Vec<Pt> {
        ws.iter().map(|w| Pt::from_f32(*w)).collect()
    }

    fn builder(ws: &[f32]) -> TableBuilder {
        let mut tb = TableBuilder::new();
        tb.add_cell_widths(&widths(ws))
            .expect("widths")
            .text_style(helv())
            .cell_style(CellStyle::DEFAULT.with_padding(Padding::DEFAULT_TEXT_PADDING));
        tb
    }

    #[test]
    fn row_missing_a_cell_fails_to_build() {
        let tb = builder(&[40.0, 40.0, 40.0]);
        let part = tb.part_builder();
        let mut row = part.row_builder();
        row.add_text_cells(&["one", "two"]).expect("cells");
        assert!(matches!(row.build_row(), Err(LayoutError::InvalidState(_))));
    }

    #[test]
    fn too_many_cells_fails() {
        let tb = builder(&[40.0]);
        let mut row = tb.part_builder().row_builder();
        assert!(matches!(
            row.add_text_cells(&["one", "two"]),
            Err(LayoutError::InvalidState(_))
        ));
        assert!(matches!(
            row.next_cell_size(),
            Err(LayoutError::InvalidState(_))
        ));
    }

    #[test]
    fn text_cells_need_a_text_style() {
        let mut tb = TableBuilder::new();
        tb.add_cell_width(Pt::from_f32(10.0)).expect("width");
        let mut row = tb.part_builder().row_builder();
        assert!(matches!(
            row.add_text_cells(&["x"]),
            Err(LayoutError::InvalidState(_))
        ));
    }

    #[test]
    fn cell_builders_fill_reserved_columns() {
        let tb = builder(&[30.0, 50.0]);
        let mut row = tb.part_builder().row_builder();
        let first = row.cell_builder().expect("reserve");
        assert_eq!(first.column(), 0);
        assert_eq!(first.width(), Pt::from_f32(30.0));
        row.add_text_cells(&["second"]).expect("cell");
        first
            .align(Align::TopRight)
            .add_strs(&["first"])
            .expect("strs")
            .build_cell(&mut row)
            .expect("build");
        let built = row.build_row().expect("row");
        assert_eq!(built.cells().len(), 2);
        assert_eq!(built.cells()[0].width(), Pt::from_f32(30.0));
        assert_eq!(built.cells()[0].style().align, Align::TopRight);
    }

    #[test]
    fn double_fill_is_rejected() {
        let tb = builder(&[30.0, 50.0]);
        let mut row = tb.part_builder().row_builder();
        let pending = row.cell_builder().expect("reserve");
        let cell = Cell::new(CellStyle::DEFAULT, Pt::from_f32(30.0), Vec::new()).expect("cell");
        row.add_cell_at(cell, 0).expect("free cell");
        assert!(matches!(
            pending.build_cell(&mut row),
            Err(LayoutError::InvalidState(_))
        ));
    }

    #[test]
    fn unfilled_reserved_column_blocks_build() {
        let tb = builder(&[30.0, 50.0]);
        let mut row = tb.part_builder().row_builder();
        let _pending = row.cell_builder().expect("reserve");
        row.add_text_cells(&["b"]).expect("cell");
        assert!(matches!(row.build_row(), Err(LayoutError::InvalidState(_))));
    }

    #[test]
    fn row_height_is_tallest_cell_or_minimum() {
        let tb = builder(&[50.0, 50.0]);
        let mut part = tb.part_builder();
        let mut row = part.row_builder();
        row.add_text_cells(&["short", "This is a long enough line of text."])
            .expect("cells");
        let row = row.build_row().expect("row");
        let style = helv();
        let expected = style.line_height() * 4 + Pt::from_f32(3.5);
        assert_eq!(
            row.calc_dimensions().expect("dims"),
            Dimension::new(Pt::from_f32(100.0), expected).expect("dim")
        );

        part.min_row_height(Pt::from_f32(200.0)).expect("min");
        let mut tall = part.row_builder();
        tall.add_text_cells(&["a", "b"]).expect("cells");
        let tall = tall.build_row().expect("row");
        assert_eq!(tall.calc_dimensions().expect("dims").height(), Pt::from_f32(200.0));
    }

    #[test]
    fn table_stacks_parts() {
        let mut tb = builder(&[40.0, 60.0]);
        let mut head = tb.part_builder();
        head.align(Align::BottomCenter);
        let mut row = head.row_builder();
        row.add_text_cells(&["Name", "Value"]).expect("cells");
        head.add_row(row.build_row().expect("row"));
        let head_height = head.calc_dimensions().expect("dims").height();
        head.build(&mut tb);

        let mut body = tb.part_builder();
        for _ in 0..3 {
            let mut row = body.row_builder();
            row.add_text_cells(&["k", "v"]).expect("cells");
            body.add_row(row.build_row().expect("row"));
        }
        let body_height = body.calc_dimensions().expect("dims").height();
        tb.add_part(body);

        let table = tb.build().expect("table");
        assert_eq!(table.parts().len(), 2);
        assert_eq!(
            table.dimension(),
            Dimension::new(Pt::from_f32(100.0), head_height + body_height).expect("dim")
        );
        assert_eq!(table.ascent(), table.dimension().height());

        let mut canvas = Canvas::new();
        let end = FixedItem::render(&table, &mut canvas, Offset::from_f32(10.0, 500.0))
            .expect("render");
        assert_eq!(
            end,
            Offset::new(Pt::from_f32(110.0), Pt::from_f32(500.0) - table.dimension().height())
        );
        let strings = canvas
            .finish()
            .commands
            .iter()
            .filter(|cmd| matches!(cmd, Command::DrawString { .. }))
            .count();
        assert_eq!(strings, 8);
    }

    #[test]
    fn bordered_row_cells_share_height() {
        let border = BorderStyle::all(LineStyle::of_color(Color::BLACK));
        let tb = builder(&[30.0, 30.0]);
        let mut row = tb.part_builder().row_builder();
        row.cell_builder()
            .expect("reserve")
            .border_style(border)
            .add_strs(&["one two three four"])
            .expect("strs")
            .build_cell(&mut row)
            .expect("cell");
        row.cell_builder()
            .expect("reserve")
            .border_style(border)
            .add(ScaledImage::new("dot", Pt::from_f32(2.0), Pt::from_f32(2.0)).expect("img"))
            .build_cell(&mut row)
            .expect("cell");
        let height = row.calc_dimensions().expect("dims").height();
        let mut canvas = Canvas::new();
        let end = row
            .render(&mut canvas, Offset::from_f32(0.0, 100.0))
            .expect("render");
        assert_eq!(end, Offset::new(Pt::from_f32(60.0), Pt::from_f32(100.0) - height));
        let page = canvas.finish();
        let bottoms = page
            .commands
            .iter()
            .filter(|cmd| {
                matches!(cmd, Command::MoveTo { y, .. } if *y == Pt::from_f32(100.0) - height)
            })
            .count();
        // Bottom edge of each cell.
        assert_eq!(bottoms, 2);
    }

    #[test]
    fn table_nests_inside_a_cell() {
        let mut tb = builder(&[20.0]);
        let mut part = tb.part_builder();
        let mut row = part.row_builder();
        row.add_text_cells(&["x"]).expect("cell");
        part.add_row(row.build_row().expect("row"));
        tb.add_part(part);
        let table = tb.build().expect("table");
        let table_dim = table.dimension();

        let cell = Cell::builder(CellStyle::DEFAULT, Pt::from_f32(100.0))
            .add(table)
            .build()
            .expect("cell");
        assert_eq!(
            cell.calc_dimensions(Pt::from_f32(100.0)).expect("dims"),
            table_dim
        );
    }

    #[test]
    fn rejects_negative_widths() {
        let mut tb = TableBuilder::new();
        assert!(matches!(
            tb.add_cell_width(Pt::from_f32(-1.0)),
            Err(LayoutError::InvalidArgument(_))
        ));
    }
}
