//! Card rendering.
//!
//! A card is composed as an SVG document (white canvas, text blocks placed
//! by [`layout`]), rasterized with resvg, and finished by compositing the QR
//! code raster onto the bottom-right corner before PNG encoding.

mod fonts;
mod glyphs;
mod layout;

pub use fonts::{FontSet, Typeface};
pub use layout::{layout, CardLayout, TextBlock, TextSize, CANVAS_HEIGHT, CANVAS_WIDTH};

use std::sync::Arc;

use log::debug;
use resvg::tiny_skia::{Pixmap, PixmapPaint, Transform};
use resvg::usvg;

use crate::config::{CardConfig, CardLabels};
use crate::error::PipelineError;
use crate::model::{recipe_url, RecipeSummary};
use crate::qr;

/// Distance from the top of a text line to its baseline, relative to size
const ASCENT: f32 = 0.8;

/// Renders recipe summaries into PNG cards.
///
/// Cheap to clone; the font database is shared.
#[derive(Debug, Clone)]
pub struct CardRenderer {
    fonts: Arc<FontSet>,
    labels: CardLabels,
}

impl CardRenderer {
    pub fn new(fonts: FontSet, labels: CardLabels) -> Self {
        CardRenderer {
            fonts: Arc::new(fonts),
            labels,
        }
    }

    /// Resolve fonts and labels from configuration
    pub fn from_config(config: &CardConfig) -> Self {
        let fonts = FontSet::resolve(&config.font_families, &config.font_files);
        Self::new(fonts, config.labels.clone())
    }

    pub fn typeface(&self) -> &Typeface {
        self.fonts.typeface()
    }

    /// Render `summary` as a 600x800 PNG whose QR code links to
    /// `<base_url>/recipes/<recipe_id>`.
    pub fn render(
        &self,
        summary: &RecipeSummary,
        recipe_id: &str,
        base_url: &str,
    ) -> Result<Vec<u8>, PipelineError> {
        let card = layout(summary, &self.labels);
        let svg = self.compose_svg(&card);

        let mut options = usvg::Options::default();
        options.fontdb = self.fonts.database();
        let tree = usvg::Tree::from_str(&svg, &options)
            .map_err(|e| PipelineError::Render(format!("SVG parse error: {}", e)))?;

        let mut pixmap = Pixmap::new(CANVAS_WIDTH, CANVAS_HEIGHT)
            .ok_or_else(|| PipelineError::Render("failed to create pixmap".to_string()))?;
        resvg::render(&tree, Transform::default(), &mut pixmap.as_mut());

        let url = recipe_url(base_url, recipe_id);
        let code = qr::encode_url(&url)?;
        let (code_x, code_y) = card.code_origin;
        pixmap.draw_pixmap(
            code_x as i32,
            code_y as i32,
            code.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );

        let png = pixmap
            .encode_png()
            .map_err(|e| PipelineError::Render(format!("PNG encode error: {}", e)))?;
        debug!(
            "Rendered card for '{}' linking to {} ({} bytes)",
            summary.title,
            url,
            png.len()
        );
        Ok(png)
    }

    fn compose_svg(&self, card: &CardLayout) -> String {
        let mut svg = String::with_capacity(4096);
        svg.push_str(&format!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}"><rect width="{w}" height="{h}" fill="#fff"/>"##,
            w = CANVAS_WIDTH,
            h = CANVAS_HEIGHT,
        ));

        match self.fonts.typeface() {
            Typeface::Installed { families } => {
                let font_family = font_family_attr(families);
                for block in &card.blocks {
                    let size = block.size.px();
                    svg.push_str(&format!(
                        r##"<text x="{x}" y="{y}" font-family="{font}" font-size="{size}" fill="#000">{text}</text>"##,
                        x = block.x,
                        y = block.y + size * ASCENT,
                        font = font_family,
                        size = size,
                        text = html_escape::encode_text(&block.text),
                    ));
                }
            }
            Typeface::BuiltIn => {
                let mut path = String::new();
                for block in &card.blocks {
                    path.push_str(&glyphs::path_data(
                        &block.text,
                        block.x,
                        block.y,
                        block.size.px(),
                        CANVAS_WIDTH as f32,
                    ));
                }
                if !path.is_empty() {
                    svg.push_str(&format!(r##"<path d="{}" fill="#000"/>"##, path));
                }
            }
        }

        svg.push_str("</svg>");
        svg
    }
}

fn font_family_attr(families: &[String]) -> String {
    let mut names: Vec<String> = families
        .iter()
        .map(|family| format!("'{}'", family.replace('\'', "")))
        .collect();
    names.push("sans-serif".to_string());
    html_escape::encode_double_quoted_attribute(&names.join(", ")).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RecipeSummary {
        RecipeSummary {
            title: "Tomato Soup".to_string(),
            ingredients: vec!["Tomato".to_string(), "Salt".to_string()],
            instructions_preview: vec!["Chop".to_string(), "Boil".to_string()],
        }
    }

    fn built_in_renderer() -> CardRenderer {
        CardRenderer::new(FontSet::built_in(), CardLabels::default())
    }

    #[test]
    fn test_png_dimensions() {
        let png = built_in_renderer()
            .render(&sample(), "soup", "http://localhost:8700")
            .unwrap();
        assert!(png.starts_with(b"\x89PNG"));

        let pixmap = Pixmap::decode_png(&png).unwrap();
        assert_eq!(pixmap.width(), CANVAS_WIDTH);
        assert_eq!(pixmap.height(), CANVAS_HEIGHT);

        let corner = pixmap.pixel(0, 0).unwrap();
        assert_eq!((corner.red(), corner.green(), corner.blue()), (255, 255, 255));
    }

    #[test]
    fn test_deterministic_output() {
        let renderer = built_in_renderer();
        let a = renderer.render(&sample(), "soup", "http://localhost:8700").unwrap();
        let b = renderer.render(&sample(), "soup", "http://localhost:8700").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_built_in_glyphs_draw_title() {
        let png = built_in_renderer()
            .render(&sample(), "soup", "http://localhost:8700")
            .unwrap();
        let pixmap = Pixmap::decode_png(&png).unwrap();

        let dark = (30..300)
            .flat_map(|x| (40..76).map(move |y| (x, y)))
            .filter(|&(x, y)| pixmap.pixel(x, y).map(|p| p.red() < 128).unwrap_or(false))
            .count();
        assert!(dark > 0);
    }

    #[test]
    fn test_svg_escapes_text() {
        let renderer = CardRenderer::new(
            FontSet::installed(vec!["DejaVu Sans".to_string()]),
            CardLabels::default(),
        );
        let mut summary = sample();
        summary.title = "Mac & <Cheese>".to_string();
        let card = layout(&summary, &CardLabels::default());
        let svg = renderer.compose_svg(&card);
        assert!(svg.contains("Mac &amp; &lt;Cheese&gt;"));
        assert!(svg.contains(r#"<text x="30""#));
    }

    #[test]
    fn test_font_family_attr() {
        let attr = font_family_attr(&["Noto Sans CJK SC".to_string(), "DejaVu Sans".to_string()]);
        assert_eq!(attr, "'Noto Sans CJK SC', 'DejaVu Sans', sans-serif");
    }
}
