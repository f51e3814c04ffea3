use recipe_cards::config::CardLabels;
use recipe_cards::qr::CODE_SIZE;
use recipe_cards::render::{layout, FontSet, CANVAS_HEIGHT, CANVAS_WIDTH};
use recipe_cards::{extract_summary, render_card, CardRenderer};
use resvg::tiny_skia::Pixmap;

const BASE_URL: &str = "http://localhost:8700";

const RECIPE: &str = "# Tomato Soup\n## Ingredients\n- Tomato\n- Salt\n## Instructions\n1. Chop\n2. Boil";

/// Decode the QR code found inside the given square of `pixmap`, treating
/// everything outside the square as white.
fn decode_region(pixmap: &Pixmap, origin: (u32, u32), size: u32) -> String {
    let pad = 8;
    let side = (size + 2 * pad) as usize;
    let mut image = rqrr::PreparedImage::prepare_from_greyscale(side, side, |x, y| {
        let (x, y) = (x as i64 - pad as i64, y as i64 - pad as i64);
        if x < 0 || y < 0 || x >= size as i64 || y >= size as i64 {
            return 255;
        }
        pixmap
            .pixel(origin.0 + x as u32, origin.1 + y as u32)
            .map(|p| p.red())
            .unwrap_or(255)
    });
    let grids = image.detect_grids();
    assert_eq!(grids.len(), 1, "expected exactly one QR code");
    let (_, content) = grids[0].decode().unwrap();
    content
}

fn built_in_renderer() -> CardRenderer {
    CardRenderer::new(FontSet::built_in(), CardLabels::default())
}

#[test]
fn test_card_links_to_recipe() {
    let summary = extract_summary(RECIPE);
    let png = built_in_renderer()
        .render(&summary, "tomato-soup", BASE_URL)
        .unwrap();

    let pixmap = Pixmap::decode_png(&png).unwrap();
    assert_eq!((pixmap.width(), pixmap.height()), (CANVAS_WIDTH, CANVAS_HEIGHT));

    let origin = layout(&summary, &CardLabels::default()).code_origin;
    assert_eq!(origin, (420, 620));
    assert_eq!(
        decode_region(&pixmap, origin, CODE_SIZE),
        "http://localhost:8700/recipes/tomato-soup"
    );
}

#[test]
fn test_trailing_slash_in_base_url() {
    let summary = extract_summary(RECIPE);
    let png = built_in_renderer()
        .render(&summary, "r1", "http://cards.example/")
        .unwrap();

    let pixmap = Pixmap::decode_png(&png).unwrap();
    assert_eq!(
        decode_region(&pixmap, (420, 620), CODE_SIZE),
        "http://cards.example/recipes/r1"
    );
}

#[test]
fn test_card_without_structure_still_renders() {
    let summary = extract_summary("no headings at all");
    let png = built_in_renderer().render(&summary, "plain", BASE_URL).unwrap();

    let pixmap = Pixmap::decode_png(&png).unwrap();
    assert_eq!(
        decode_region(&pixmap, (420, 620), CODE_SIZE),
        "http://localhost:8700/recipes/plain"
    );
}

#[test]
fn test_render_card_with_configured_fonts() {
    let png = render_card(RECIPE, "soup", BASE_URL).unwrap();
    let pixmap = Pixmap::decode_png(&png).unwrap();
    assert_eq!(pixmap.width(), CANVAS_WIDTH);
    assert_eq!(pixmap.height(), CANVAS_HEIGHT);
}
