use log::debug;
use qrcode::{Color, EcLevel, QrCode};
use resvg::tiny_skia::{Color as SkiaColor, Paint, Pixmap, Rect, Transform};

use crate::error::PipelineError;

/// Side length of the generated code image
pub const CODE_SIZE: u32 = 100;

/// Light modules kept around the symbol, in modules
const QUIET_ZONE: u32 = 2;

/// Encode `url` as a QR code raster of `CODE_SIZE` x `CODE_SIZE` pixels.
///
/// Modules are drawn at a whole number of pixels each and the symbol is
/// centered on a white square, so the same URL always yields the same
/// image. A URL too long to fit is reported as a render error.
pub fn encode_url(url: &str) -> Result<Pixmap, PipelineError> {
    let code = QrCode::with_error_correction_level(url.as_bytes(), EcLevel::M)
        .map_err(|e| PipelineError::Render(format!("QR encoding failed for {}: {}", url, e)))?;

    let modules = code.width() as u32;
    let module_px = CODE_SIZE / (modules + 2 * QUIET_ZONE);
    if module_px == 0 {
        return Err(PipelineError::Render(format!(
            "URL too long for a {}px code: {}",
            CODE_SIZE, url
        )));
    }
    let offset = (CODE_SIZE - modules * module_px) / 2;
    debug!(
        "QR code for {}: {} modules at {}px each",
        url, modules, module_px
    );

    let mut pixmap = Pixmap::new(CODE_SIZE, CODE_SIZE)
        .ok_or_else(|| PipelineError::Render("failed to allocate code pixmap".to_string()))?;
    pixmap.fill(SkiaColor::WHITE);

    let mut paint = Paint::default();
    paint.set_color(SkiaColor::BLACK);
    paint.anti_alias = false;

    for (index, color) in code.to_colors().into_iter().enumerate() {
        if color != Color::Dark {
            continue;
        }
        let index = index as u32;
        let x = offset + (index % modules) * module_px;
        let y = offset + (index / modules) * module_px;
        let rect = Rect::from_xywh(x as f32, y as f32, module_px as f32, module_px as f32)
            .ok_or_else(|| PipelineError::Render("invalid module rectangle".to_string()))?;
        pixmap.fill_rect(rect, &paint, Transform::identity(), None);
    }

    Ok(pixmap)
}
