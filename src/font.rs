use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{LayoutError, Result};

/// Metrics of a font in glyph space (1000 units per em). Implementations
/// only answer questions about sizes; drawing happens in the render target.
pub trait Font: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Height above the baseline, positive.
    fn ascent(&self) -> f32;

    /// Depth below the baseline, negative like in a font descriptor.
    fn descent(&self) -> f32;

    fn average_width(&self) -> f32;

    fn glyph_width(&self, ch: char) -> f32;

    /// Unkerned advance of `text`.
    fn string_width(&self, text: &str) -> f32 {
        text.chars().map(|ch| self.glyph_width(ch)).sum()
    }

    fn chars_width(&self, chars: &[char]) -> f32 {
        chars.iter().map(|ch| self.glyph_width(*ch)).sum()
    }
}

const FIRST_CHAR: u32 = 32;
const LAST_CHAR: u32 = 126;

// WinAnsi widths of the printable ASCII range, from the standard AFM files.
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

#[rustfmt::skip]
const TIMES_ROMAN_WIDTHS: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444,
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722,
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500,
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500,
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
];

const COURIER_WIDTH: u16 = 600;

/// Built-in metrics for the standard PDF fonts that every viewer carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    TimesRoman,
    Courier,
    CourierBold,
}

impl StandardFont {
    pub fn pdf_name(&self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
            StandardFont::TimesRoman => "Times-Roman",
            StandardFont::Courier => "Courier",
            StandardFont::CourierBold => "Courier-Bold",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = normalize_name(name);
        match normalized.as_str() {
            "helvetica" | "arial" | "sans-serif" => Some(StandardFont::Helvetica),
            "helvetica-bold" | "arial-bold" => Some(StandardFont::HelveticaBold),
            "times-roman" | "times" | "serif" => Some(StandardFont::TimesRoman),
            "courier" | "monospace" => Some(StandardFont::Courier),
            "courier-bold" => Some(StandardFont::CourierBold),
            _ => None,
        }
    }

    pub fn shared(self) -> Arc<dyn Font> {
        Arc::new(self)
    }

    fn widths(&self) -> Option<&'static [u16; 95]> {
        match self {
            StandardFont::Helvetica => Some(&HELVETICA_WIDTHS),
            StandardFont::HelveticaBold => Some(&HELVETICA_BOLD_WIDTHS),
            StandardFont::TimesRoman => Some(&TIMES_ROMAN_WIDTHS),
            StandardFont::Courier | StandardFont::CourierBold => None,
        }
    }
}

impl Font for StandardFont {
    fn name(&self) -> &str {
        self.pdf_name()
    }

    fn ascent(&self) -> f32 {
        match self {
            StandardFont::Helvetica | StandardFont::HelveticaBold => 718.0,
            StandardFont::TimesRoman => 683.0,
            StandardFont::Courier | StandardFont::CourierBold => 629.0,
        }
    }

    fn descent(&self) -> f32 {
        match self {
            StandardFont::Helvetica | StandardFont::HelveticaBold => -207.0,
            StandardFont::TimesRoman => -217.0,
            StandardFont::Courier | StandardFont::CourierBold => -157.0,
        }
    }

    fn average_width(&self) -> f32 {
        match self.widths() {
            Some(widths) => {
                widths.iter().map(|w| *w as f32).sum::<f32>() / widths.len() as f32
            }
            None => COURIER_WIDTH as f32,
        }
    }

    fn glyph_width(&self, ch: char) -> f32 {
        let Some(widths) = self.widths() else {
            return COURIER_WIDTH as f32;
        };
        let code = ch as u32;
        if !(FIRST_CHAR..=LAST_CHAR).contains(&code) {
            return self.average_width();
        }
        widths[(code - FIRST_CHAR) as usize] as f32
    }
}

/// Metrics read from a TrueType or OpenType font program, normalized to
/// 1000 units per em.
#[derive(Debug, Clone)]
pub struct EmbeddedFont {
    name: String,
    ascent: f32,
    descent: f32,
    average_width: f32,
    missing_width: f32,
    widths: HashMap<char, f32>,
}

impl EmbeddedFont {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let face = ttf_parser::Face::parse(data, 0)?;
        let units_per_em = face.units_per_em().max(1);
        let scale = 1000.0 / units_per_em as f32;

        let mut widths = HashMap::new();
        if let Some(cmap) = face.tables().cmap {
            for subtable in cmap.subtables {
                if !subtable.is_unicode() {
                    continue;
                }
                subtable.codepoints(|codepoint| {
                    let Some(ch) = char::from_u32(codepoint) else {
                        return;
                    };
                    if widths.contains_key(&ch) {
                        return;
                    }
                    if let Some(advance) = face
                        .glyph_index(ch)
                        .and_then(|id| face.glyph_hor_advance(id))
                    {
                        widths.insert(ch, advance as f32 * scale);
                    }
                });
            }
        }
        if widths.is_empty() {
            return Err(LayoutError::Font(
                "font has no unicode character map".to_string(),
            ));
        }

        let advances: Vec<f32> = widths.values().copied().filter(|w| *w > 0.0).collect();
        let average_width = if advances.is_empty() {
            0.0
        } else {
            advances.iter().sum::<f32>() / advances.len() as f32
        };
        let missing_width = widths.get(&' ').copied().unwrap_or(average_width);

        Ok(Self {
            name: font_name(&face),
            ascent: face.ascender() as f32 * scale,
            descent: face.descender() as f32 * scale,
            average_width,
            missing_width,
            widths,
        })
    }

    pub fn shared(self) -> Arc<dyn Font> {
        Arc::new(self)
    }
}

impl Font for EmbeddedFont {
    fn name(&self) -> &str {
        &self.name
    }

    fn ascent(&self) -> f32 {
        self.ascent
    }

    fn descent(&self) -> f32 {
        self.descent
    }

    fn average_width(&self) -> f32 {
        self.average_width
    }

    fn glyph_width(&self, ch: char) -> f32 {
        self.widths.get(&ch).copied().unwrap_or(self.missing_width)
    }
}

fn font_name(face: &ttf_parser::Face<'_>) -> String {
    use ttf_parser::name::name_id;

    let mut family = None;
    let mut post = None;
    for entry in face.names() {
        let Some(name) = entry.to_string() else {
            continue;
        };
        match entry.name_id {
            name_id::POST_SCRIPT_NAME if post.is_none() => post = Some(name),
            name_id::TYPOGRAPHIC_FAMILY | name_id::FAMILY if family.is_none() => {
                family = Some(name)
            }
            _ => {}
        }
    }
    post.or(family)
        .unwrap_or_else(|| "EmbeddedFont".to_string())
}

fn normalize_name(name: &str) -> String {
    name.trim()
        .trim_matches('"')
        .trim_matches('\'')
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_font_names_round_trip() {
        for font in [
            StandardFont::Helvetica,
            StandardFont::HelveticaBold,
            StandardFont::TimesRoman,
            StandardFont::Courier,
            StandardFont::CourierBold,
        ] {
            assert_eq!(StandardFont::from_name(font.pdf_name()), Some(font));
        }
        assert_eq!(
            StandardFont::from_name(" 'Arial' "),
            Some(StandardFont::Helvetica)
        );
        assert_eq!(StandardFont::from_name("Comic Sans"), None);
    }

    #[test]
    fn helvetica_widths_match_afm() {
        let font = StandardFont::Helvetica;
        assert_eq!(font.glyph_width(' '), 278.0);
        assert_eq!(font.glyph_width('T'), 611.0);
        assert_eq!(font.glyph_width('i'), 222.0);
        assert_eq!(font.string_width("This is a"), 3723.0);
        assert_eq!(font.chars_width(&['o', 'f']), 834.0);
    }

    #[test]
    fn courier_is_monospaced() {
        let font = StandardFont::CourierBold;
        assert_eq!(font.string_width("iW"), 1200.0);
        assert_eq!(font.average_width(), 600.0);
    }

    #[test]
    fn unknown_characters_use_the_average_width() {
        let font = StandardFont::TimesRoman;
        assert_eq!(font.glyph_width('\u{4e2d}'), font.average_width());
    }

    #[test]
    fn embedded_font_rejects_garbage() {
        assert!(matches!(
            EmbeddedFont::from_bytes(b"not a font"),
            Err(LayoutError::Font(_))
        ));
    }

    // Glyphs: .notdef, space, 'A', 'B' at 2000 units per em.
    const ADVANCES: [u16; 4] = [1000, 500, 1200, 1000];

    fn be16(out: &mut Vec<u8>, v: u16) {
        out.extend_from_slice(&v.to_be_bytes());
    }

    fn be32(out: &mut Vec<u8>, v: u32) {
        out.extend_from_slice(&v.to_be_bytes());
    }

    fn head_table() -> Vec<u8> {
        let mut t = Vec::new();
        be32(&mut t, 0x0001_0000); // version
        be32(&mut t, 0x0001_0000); // font revision
        be32(&mut t, 0); // checksum adjustment
        be32(&mut t, 0x5F0F_3CF5); // magic
        be16(&mut t, 0); // flags
        be16(&mut t, 2000); // units per em
        t.extend_from_slice(&[0; 16]); // created, modified
        t.extend_from_slice(&[0; 8]); // bounding box
        be16(&mut t, 0); // mac style
        be16(&mut t, 8); // lowest ppem
        be16(&mut t, 2); // direction hint
        be16(&mut t, 0); // index to loc format
        be16(&mut t, 0); // glyph data format
        t
    }

    fn hhea_table() -> Vec<u8> {
        let mut t = Vec::new();
        be32(&mut t, 0x0001_0000);
        be16(&mut t, 1600); // ascender
        be16(&mut t, (-400i16) as u16); // descender
        be16(&mut t, 0); // line gap
        t.extend_from_slice(&[0; 24]);
        be16(&mut t, ADVANCES.len() as u16); // number of h metrics
        t
    }

    fn maxp_table() -> Vec<u8> {
        let mut t = Vec::new();
        be32(&mut t, 0x0000_5000);
        be16(&mut t, ADVANCES.len() as u16);
        t
    }

    fn hmtx_table() -> Vec<u8> {
        let mut t = Vec::new();
        for advance in ADVANCES {
            be16(&mut t, advance);
            be16(&mut t, 0);
        }
        t
    }

    fn cmap_table() -> Vec<u8> {
        // (first char, last char, first glyph)
        let groups: [(u32, u32, u32); 2] = [(0x20, 0x20, 1), (0x41, 0x42, 2)];
        let mut t = Vec::new();
        be16(&mut t, 0); // version
        be16(&mut t, 1); // subtable count
        be16(&mut t, 0); // unicode platform
        be16(&mut t, 4); // full repertoire
        be32(&mut t, 12); // subtable offset
        be16(&mut t, 12); // format
        be16(&mut t, 0);
        be32(&mut t, 16 + 12 * groups.len() as u32);
        be32(&mut t, 0); // language
        be32(&mut t, groups.len() as u32);
        for (first, last, glyph) in groups {
            be32(&mut t, first);
            be32(&mut t, last);
            be32(&mut t, glyph);
        }
        t
    }

    fn name_table(postscript_name: &str) -> Vec<u8> {
        let encoded: Vec<u8> = postscript_name
            .encode_utf16()
            .flat_map(|unit| unit.to_be_bytes())
            .collect();
        let mut t = Vec::new();
        be16(&mut t, 0); // format
        be16(&mut t, 1); // record count
        be16(&mut t, 6 + 12); // storage offset
        be16(&mut t, 0); // unicode platform
        be16(&mut t, 3);
        be16(&mut t, 0); // language
        be16(&mut t, ttf_parser::name::name_id::POST_SCRIPT_NAME);
        be16(&mut t, encoded.len() as u16);
        be16(&mut t, 0); // offset into storage
        t.extend_from_slice(&encoded);
        t
    }

    // Assembles an sfnt file. Tables must be given in tag order.
    fn sfnt(tables: &[(&[u8; 4], Vec<u8>)]) -> Vec<u8> {
        let mut out = Vec::new();
        be32(&mut out, 0x0001_0000);
        be16(&mut out, tables.len() as u16);
        out.extend_from_slice(&[0; 6]); // search range, entry selector, range shift
        let mut offset = 12 + 16 * tables.len();
        let mut body = Vec::new();
        for (tag, data) in tables {
            out.extend_from_slice(*tag);
            be32(&mut out, 0); // checksum
            be32(&mut out, offset as u32);
            be32(&mut out, data.len() as u32);
            body.extend_from_slice(data);
            while body.len() % 4 != 0 {
                body.push(0);
            }
            offset = 12 + 16 * tables.len() + body.len();
        }
        out.extend_from_slice(&body);
        out
    }

    fn test_font_bytes() -> Vec<u8> {
        sfnt(&[
            (b"cmap", cmap_table()),
            (b"head", head_table()),
            (b"hhea", hhea_table()),
            (b"hmtx", hmtx_table()),
            (b"maxp", maxp_table()),
            (b"name", name_table("MiniSans-Regular")),
        ])
    }

    #[test]
    fn embedded_font_metrics_are_scaled_to_1000_units() {
        let font = EmbeddedFont::from_bytes(&test_font_bytes()).expect("font");
        assert_eq!(font.name(), "MiniSans-Regular");
        assert_eq!(font.ascent(), 800.0);
        assert_eq!(font.descent(), -200.0);
        assert_eq!(font.glyph_width(' '), 250.0);
        assert_eq!(font.glyph_width('A'), 600.0);
        assert_eq!(font.glyph_width('B'), 500.0);
        assert_eq!(font.average_width(), 450.0);
        // Unmapped characters take the width of a space.
        assert_eq!(font.glyph_width('Z'), 250.0);
        assert_eq!(font.string_width("AB A"), 1950.0);
    }

    #[test]
    fn embedded_font_without_a_name_gets_a_placeholder() {
        let bytes = sfnt(&[
            (b"cmap", cmap_table()),
            (b"head", head_table()),
            (b"hhea", hhea_table()),
            (b"hmtx", hmtx_table()),
            (b"maxp", maxp_table()),
        ]);
        let font = EmbeddedFont::from_bytes(&bytes).expect("font");
        assert_eq!(font.name(), "EmbeddedFont");
    }

    #[test]
    fn embedded_font_needs_a_unicode_cmap() {
        let bytes = sfnt(&[
            (b"head", head_table()),
            (b"hhea", hhea_table()),
            (b"hmtx", hmtx_table()),
            (b"maxp", maxp_table()),
        ]);
        assert!(matches!(
            EmbeddedFont::from_bytes(&bytes),
            Err(LayoutError::Font(_))
        ));
    }

    #[test]
    fn text_style_on_an_embedded_font_wraps() {
        use crate::text::{TextStyle, has_more_text, wrap_row};
        use crate::types::{Color, Pt};

        let font = EmbeddedFont::from_bytes(&test_font_bytes()).expect("font");
        let style = TextStyle::new(font.shared(), Pt::from_f32(9.6), Color::BLACK).expect("style");
        assert_eq!(style.ascent(), Pt::from_f32(8.0));
        assert_eq!(style.descent(), Pt::from_f32(2.0));
        assert_eq!(style.leading(), Pt::from_f32(1.0));

        let chars: Vec<char> = "AB AB AB".chars().collect();
        let mut rows = Vec::new();
        let mut idx = 0;
        while has_more_text(&chars, idx) {
            let wrapped = wrap_row(&style, &chars, idx, Pt::from_f32(25.0)).expect("wrap");
            idx = wrapped.next_index;
            rows.push((wrapped.row.text().to_string(), wrapped.row.width()));
        }
        assert_eq!(
            rows,
            vec![
                ("AB AB".to_string(), Pt::from_f32(24.5)),
                ("AB".to_string(), Pt::from_f32(11.0)),
            ]
        );
    }
}
