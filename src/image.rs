use std::sync::Arc;

use image::GenericImageView;
use sha2::{Digest, Sha256};

use crate::error::{LayoutError, Result};
use crate::line::{Cursor, FixedItem, Renderable, SingleItemCursor};
use crate::render::RenderTarget;
use crate::types::{Dimension, Offset, Pt};

/// Resolution assumed for raster images that carry no size of their own.
pub const IMAGE_DPI: u32 = 300;

const POINTS_PER_INCH: u32 = 72;

/// A raster image with a resolved display size. The pixels themselves stay
/// with whoever owns `resource_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledImage {
    resource_id: Arc<str>,
    pixels: Option<(u32, u32)>,
    dim: Dimension,
}

impl ScaledImage {
    pub fn new(resource_id: impl Into<Arc<str>>, width: Pt, height: Pt) -> Result<Self> {
        Ok(Self {
            resource_id: resource_id.into(),
            pixels: None,
            dim: display_size(width, height)?,
        })
    }

    /// Decodes PNG or JPEG bytes and sizes the image at [`IMAGE_DPI`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let decoded = image::load_from_memory(bytes)?;
        let (w, h) = decoded.dimensions();
        if w == 0 || h == 0 {
            return Err(LayoutError::Image("image has no pixels".to_string()));
        }
        let width = pixels_to_points(w)?;
        let height = pixels_to_points(h)?;
        Ok(Self {
            resource_id: sha256_hex(bytes).into(),
            pixels: Some((w, h)),
            dim: display_size(width, height)?,
        })
    }

    pub fn with_size(&self, width: Pt, height: Pt) -> Result<Self> {
        Ok(Self {
            dim: display_size(width, height)?,
            ..self.clone()
        })
    }

    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    pub fn pixels(&self) -> Option<(u32, u32)> {
        self.pixels
    }

    pub fn width(&self) -> Pt {
        self.dim.width()
    }

    pub fn height(&self) -> Pt {
        self.dim.height()
    }
}

fn pixels_to_points(pixels: u32) -> Result<Pt> {
    let pixels = i32::try_from(pixels)
        .map_err(|_| LayoutError::Image(format!("image is {pixels} pixels across")))?;
    Ok(Pt::from_i32(pixels).mul_ratio(POINTS_PER_INCH as i32, IMAGE_DPI as i32))
}

fn display_size(width: Pt, height: Pt) -> Result<Dimension> {
    if width <= Pt::ZERO || height <= Pt::ZERO {
        return Err(LayoutError::InvalidArgument(format!(
            "image size must be positive, not {width}x{height}"
        )));
    }
    Dimension::new(width, height)
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        use std::fmt::Write;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

impl FixedItem for ScaledImage {
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
        let bottom_left = Offset::new(top_left.x, top_left.y - self.dim.height());
        let bottom = target.draw_image(bottom_left, self)?;
        Ok(Offset::new(top_left.x + self.dim.width(), bottom))
    }
}

impl Renderable for ScaledImage {
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
