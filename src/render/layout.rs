//! Fixed card geometry. All coordinates are pixels from the top-left corner
//! and `y` is the top edge of a text line.

use crate::config::CardLabels;
use crate::model::RecipeSummary;
use crate::qr::CODE_SIZE;

pub const CANVAS_WIDTH: u32 = 600;
pub const CANVAS_HEIGHT: u32 = 800;

const TITLE_POS: (f32, f32) = (30.0, 40.0);
const INGREDIENTS_HEADING_POS: (f32, f32) = (30.0, 110.0);
const HEADING_X: f32 = 30.0;
const ITEM_X: f32 = 40.0;
/// Gap between a heading and its first item
const HEADING_GAP: f32 = 40.0;
const INGREDIENT_SPACING: f32 = 30.0;
const INSTRUCTION_SPACING: f32 = 25.0;
/// Gap between the ingredient list and the instructions heading
const SECTION_GAP: f32 = 30.0;
/// Distance of the code from the right and bottom edges
const CODE_MARGIN: u32 = 80;
const CAPTION_OFFSET: f32 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSize {
    Title,
    Heading,
    Body,
}

impl TextSize {
    pub fn px(self) -> f32 {
        match self {
            TextSize::Title => 36.0,
            TextSize::Heading => 24.0,
            TextSize::Body => 18.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub size: TextSize,
}

impl TextBlock {
    fn new(text: impl Into<String>, (x, y): (f32, f32), size: TextSize) -> Self {
        TextBlock {
            text: text.into(),
            x,
            y,
            size,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardLayout {
    pub blocks: Vec<TextBlock>,
    /// Top-left corner of the QR code
    pub code_origin: (u32, u32),
}

/// Place every piece of text of `summary` on the canvas.
pub fn layout(summary: &RecipeSummary, labels: &CardLabels) -> CardLayout {
    let mut blocks = vec![
        TextBlock::new(summary.title.as_str(), TITLE_POS, TextSize::Title),
        TextBlock::new(
            labels.ingredients.as_str(),
            INGREDIENTS_HEADING_POS,
            TextSize::Heading,
        ),
    ];

    let first_ingredient_y = INGREDIENTS_HEADING_POS.1 + HEADING_GAP;
    for (i, ingredient) in summary.ingredients.iter().enumerate() {
        let y = first_ingredient_y + i as f32 * INGREDIENT_SPACING;
        blocks.push(TextBlock::new(
            format!("• {}", ingredient),
            (ITEM_X, y),
            TextSize::Body,
        ));
    }

    let instructions_heading_y = first_ingredient_y
        + summary.ingredients.len() as f32 * INGREDIENT_SPACING
        + SECTION_GAP;
    blocks.push(TextBlock::new(
        labels.instructions.as_str(),
        (HEADING_X, instructions_heading_y),
        TextSize::Heading,
    ));

    let first_instruction_y = instructions_heading_y + HEADING_GAP;
    for (i, step) in summary.instructions_preview.iter().enumerate() {
        let y = first_instruction_y + i as f32 * INSTRUCTION_SPACING;
        blocks.push(TextBlock::new(
            format!("{}. {}", i + 1, step),
            (ITEM_X, y),
            TextSize::Body,
        ));
    }

    let code_origin = (
        CANVAS_WIDTH - CODE_MARGIN - CODE_SIZE,
        CANVAS_HEIGHT - CODE_MARGIN - CODE_SIZE,
    );
    blocks.push(TextBlock::new(
        labels.scan_caption.as_str(),
        (code_origin.0 as f32, code_origin.1 as f32 - CAPTION_OFFSET),
        TextSize::Body,
    ));

    CardLayout {
        blocks,
        code_origin,
    }
}
