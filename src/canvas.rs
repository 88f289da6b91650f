use crate::error::Result;
use crate::image::ScaledImage;
use crate::render::RenderTarget;
use crate::style::LineStyle;
use crate::text::TextStyle;
use crate::types::{Color, Dimension, Offset, Pt};

/// Z-index used for cell and box backgrounds so they end up under content
/// recorded later at the default z-index.
pub const BACKGROUND_Z: i32 = -1;
pub const DEFAULT_Z: i32 = 0;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetFillColor(Color),
    SetStrokeColor(Color),
    SetLineWidth(Pt),
    SetFontName(String),
    SetFontSize(Pt),
    // x/y is the lower left corner.
    DrawRect {
        x: Pt,
        y: Pt,
        width: Pt,
        height: Pt,
    },
    Fill,
    MoveTo {
        x: Pt,
        y: Pt,
    },
    LineTo {
        x: Pt,
        y: Pt,
    },
    Stroke,
    // x/y is the baseline origin.
    DrawString {
        x: Pt,
        y: Pt,
        text: String,
    },
    DrawImage {
        x: Pt,
        y: Pt,
        width: Pt,
        height: Pt,
        resource_id: String,
    },
}

#[derive(Debug, Clone, Default)]
pub struct Page {
    pub commands: Vec<Command>,
}

#[derive(Debug, Clone)]
enum Item {
    Rect {
        top_left: Offset,
        dim: Dimension,
        color: Color,
    },
    Line {
        from: Offset,
        to: Offset,
        style: LineStyle,
    },
    Text {
        origin: Offset,
        text: String,
        font_name: String,
        font_size: Pt,
        color: Color,
    },
    Image {
        bottom_left: Offset,
        dim: Dimension,
        resource_id: String,
    },
}

#[derive(Debug, Clone)]
struct Recorded {
    z: i32,
    ordinal: usize,
    item: Item,
}

#[derive(Debug, Clone)]
struct GraphicsState {
    fill_color: Color,
    stroke_color: Color,
    line_width: Pt,
    font_size: Pt,
    font_name: String,
}

/// Records drawing calls for one page and replays them in z order.
#[derive(Debug, Default)]
pub struct Canvas {
    items: Vec<Recorded>,
}

impl Canvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn record(&mut self, z: i32, item: Item) {
        let ordinal = self.items.len();
        self.items.push(Recorded { z, ordinal, item });
    }

    /// Emits the recorded items ordered by z-index, then by the order they
    /// were drawn in.
    pub fn finish(mut self) -> Page {
        self.items.sort_by_key(|rec| (rec.z, rec.ordinal));
        let mut writer = PageWriter::new();
        for rec in self.items {
            writer.emit(rec.item);
        }
        tracing::debug!(commands = writer.page.commands.len(), "canvas finished");
        writer.page
    }
}

impl RenderTarget for Canvas {
    fn fill_rect(&mut self, top_left: Offset, dim: Dimension, color: Color) -> Result<()> {
        self.record(
            BACKGROUND_Z,
            Item::Rect {
                top_left,
                dim,
                color,
            },
        );
        Ok(())
    }

    fn draw_line(&mut self, from: Offset, to: Offset, style: &LineStyle) -> Result<()> {
        self.record(
            DEFAULT_Z,
            Item::Line {
                from,
                to,
                style: *style,
            },
        );
        Ok(())
    }

    fn draw_styled_text(
        &mut self,
        baseline_left: Offset,
        text: &str,
        style: &TextStyle,
    ) -> Result<()> {
        self.record(
            DEFAULT_Z,
            Item::Text {
                origin: baseline_left,
                text: text.to_string(),
                font_name: style.font().name().to_string(),
                font_size: style.size(),
                color: style.color(),
            },
        );
        Ok(())
    }

    fn draw_image(&mut self, bottom_left: Offset, image: &ScaledImage) -> Result<Pt> {
        self.record(
            DEFAULT_Z,
            Item::Image {
                bottom_left,
                dim: Dimension::measured(image.width(), image.height()),
                resource_id: image.resource_id().to_string(),
            },
        );
        Ok(bottom_left.y)
    }
}

struct PageWriter {
    page: Page,
    state: GraphicsState,
}

impl PageWriter {
    fn new() -> Self {
        Self {
            page: Page::default(),
            state: GraphicsState {
                fill_color: Color::BLACK,
                stroke_color: Color::BLACK,
                line_width: Pt::from_f32(1.0),
                font_size: Pt::from_f32(12.0),
                font_name: "Helvetica".to_string(),
            },
        }
    }

    fn emit(&mut self, item: Item) {
        match item {
            Item::Rect {
                top_left,
                dim,
                color,
            } => {
                self.set_fill_color(color);
                self.push(Command::DrawRect {
                    x: top_left.x,
                    y: top_left.y - dim.height(),
                    width: dim.width(),
                    height: dim.height(),
                });
                self.push(Command::Fill);
            }
            Item::Line { from, to, style } => {
                self.set_stroke_color(style.color());
                self.set_line_width(style.width());
                self.push(Command::MoveTo {
                    x: from.x,
                    y: from.y,
                });
                self.push(Command::LineTo { x: to.x, y: to.y });
                self.push(Command::Stroke);
            }
            Item::Text {
                origin,
                text,
                font_name,
                font_size,
                color,
            } => {
                self.set_fill_color(color);
                self.set_font_name(&font_name);
                self.set_font_size(font_size);
                self.push(Command::DrawString {
                    x: origin.x,
                    y: origin.y,
                    text,
                });
            }
            Item::Image {
                bottom_left,
                dim,
                resource_id,
            } => {
                self.push(Command::DrawImage {
                    x: bottom_left.x,
                    y: bottom_left.y,
                    width: dim.width(),
                    height: dim.height(),
                    resource_id,
                });
            }
        }
    }

    fn push(&mut self, cmd: Command) {
        self.page.commands.push(cmd);
    }

    fn set_fill_color(&mut self, color: Color) {
        if self.state.fill_color == color {
            return;
        }
        self.state.fill_color = color;
        self.push(Command::SetFillColor(color));
    }

    fn set_stroke_color(&mut self, color: Color) {
        if self.state.stroke_color == color {
            return;
        }
        self.state.stroke_color = color;
        self.push(Command::SetStrokeColor(color));
    }

    fn set_line_width(&mut self, width: Pt) {
        let width = if width < Pt::ZERO { Pt::ZERO } else { width };
        if self.state.line_width == width {
            return;
        }
        self.state.line_width = width;
        self.push(Command::SetLineWidth(width));
    }

    fn set_font_name(&mut self, name: &str) {
        if self.state.font_name == name {
            return;
        }
        self.state.font_name = name.to_string();
        self.push(Command::SetFontName(name.to_string()));
    }

    fn set_font_size(&mut self, size: Pt) {
        if self.state.font_size == size {
            return;
        }
        self.state.font_size = size;
        self.push(Command::SetFontSize(size));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::StandardFont;

    fn red() -> Color {
        Color::rgb(1.0, 0.0, 0.0)
    }

    #[test]
    fn backgrounds_are_emitted_first() {
        let mut canvas = Canvas::new();
        canvas
            .draw_line(
                Offset::from_f32(0.0, 0.0),
                Offset::from_f32(10.0, 0.0),
                &LineStyle::of_color(Color::BLACK),
            )
            .expect("line");
        canvas
            .fill_rect(
                Offset::from_f32(0.0, 10.0),
                Dimension::from_f32(10.0, 10.0).expect("dim"),
                red(),
            )
            .expect("rect");
        assert_eq!(canvas.len(), 2);
        let page = canvas.finish();
        assert_eq!(
            page.commands,
            vec![
                Command::SetFillColor(red()),
                Command::DrawRect {
                    x: Pt::ZERO,
                    y: Pt::ZERO,
                    width: Pt::from_f32(10.0),
                    height: Pt::from_f32(10.0),
                },
                Command::Fill,
                Command::MoveTo {
                    x: Pt::ZERO,
                    y: Pt::ZERO,
                },
                Command::LineTo {
                    x: Pt::from_f32(10.0),
                    y: Pt::ZERO,
                },
                Command::Stroke,
            ]
        );
    }

    #[test]
    fn redundant_state_is_suppressed() {
        let style = TextStyle::new(
            StandardFont::Courier.shared(),
            Pt::from_f32(10.0),
            Color::BLACK,
        )
        .expect("style");
        let mut canvas = Canvas::new();
        for y in [20.0, 10.0] {
            canvas
                .draw_styled_text(Offset::from_f32(0.0, y), "hi", &style)
                .expect("text");
        }
        let page = canvas.finish();
        let state_changes = page
            .commands
            .iter()
            .filter(|cmd| matches!(cmd, Command::SetFontName(_) | Command::SetFontSize(_)))
            .count();
        assert_eq!(state_changes, 2);
        assert_eq!(
            page.commands
                .iter()
                .filter(|cmd| matches!(cmd, Command::DrawString { .. }))
                .count(),
            2
        );
    }

    #[test]
    fn draw_image_reports_bottom() {
        let mut canvas = Canvas::new();
        let img = ScaledImage::new("i", Pt::from_f32(3.0), Pt::from_f32(4.0)).expect("img");
        let bottom = canvas
            .draw_image(Offset::from_f32(1.0, 2.0), &img)
            .expect("image");
        assert_eq!(bottom, Pt::from_f32(2.0));
    }
}
