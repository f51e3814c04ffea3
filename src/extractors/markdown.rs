use std::ops::ControlFlow;

use log::debug;

use crate::model::RecipeSummary;

/// Maximum number of ingredients kept on a summary
pub const MAX_INGREDIENTS: usize = 5;
/// Maximum number of instruction steps kept on a summary
pub const MAX_INSTRUCTIONS: usize = 3;
/// Character limit for a single ingredient
pub const INGREDIENT_LIMIT: usize = 80;
/// Character limit for a single instruction step
pub const INSTRUCTION_LIMIT: usize = 60;
/// Appended to text cut at its limit
pub const ELLIPSIS: &str = "...";

/// Localized headers are matched as a line prefix
const INGREDIENTS_PREFIX: &str = "## 食材";
const INSTRUCTIONS_PREFIX: &str = "## 制作步骤";
/// English headers are matched anywhere in the line
const INGREDIENTS_MARKER: &str = "## Ingredients";
const INSTRUCTIONS_MARKER: &str = "## Instructions";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Ingredients,
    Instructions,
}

/// Accumulator threaded through the single forward pass.
#[derive(Debug)]
struct Scan {
    section: Section,
    title: Option<String>,
    ingredients: Vec<String>,
    instructions: Vec<String>,
}

impl Scan {
    fn new() -> Self {
        Scan {
            section: Section::None,
            title: None,
            ingredients: Vec::new(),
            instructions: Vec::new(),
        }
    }

    fn feed(&mut self, raw: &str) -> ControlFlow<()> {
        let line = raw.trim();

        if self.title.is_none() {
            if let Some(title) = line.strip_prefix("# ") {
                self.title = Some(title.trim().to_string());
            }
        }

        // Headers win over content on the same line.
        if line.starts_with(INGREDIENTS_PREFIX) || line.contains(INGREDIENTS_MARKER) {
            self.section = Section::Ingredients;
            return ControlFlow::Continue(());
        }
        if line.starts_with(INSTRUCTIONS_PREFIX) || line.contains(INSTRUCTIONS_MARKER) {
            self.section = Section::Instructions;
            return ControlFlow::Continue(());
        }
        if line.starts_with("##") {
            self.section = Section::None;
            return ControlFlow::Continue(());
        }

        match self.section {
            Section::Ingredients => {
                if let Some(item) = line.strip_prefix("- ") {
                    self.ingredients
                        .push(truncate(item.trim(), INGREDIENT_LIMIT));
                    if self.ingredients.len() >= MAX_INGREDIENTS {
                        return ControlFlow::Break(());
                    }
                }
            }
            Section::Instructions => {
                if self.instructions.len() < MAX_INSTRUCTIONS {
                    if let Some(step) = strip_step_number(line) {
                        let step = step.trim();
                        if !step.is_empty() {
                            self.instructions.push(truncate(step, INSTRUCTION_LIMIT));
                        }
                    }
                }
            }
            Section::None => {}
        }

        ControlFlow::Continue(())
    }

    fn finish(self) -> RecipeSummary {
        let mut summary = RecipeSummary {
            ingredients: self.ingredients,
            instructions_preview: self.instructions,
            ..Default::default()
        };
        if let Some(title) = self.title {
            summary.title = title;
        }
        summary
    }
}

/// Recover title, ingredients and an instruction preview from loosely
/// formatted recipe markdown.
///
/// Never fails: text without any recognizable structure yields the default
/// title and empty lists. The scan is a single forward pass that stops as
/// soon as the fifth ingredient is captured, so instructions placed after
/// that point are not part of the preview.
pub fn extract(markdown: &str) -> RecipeSummary {
    let mut scan = Scan::new();
    for line in markdown.lines() {
        if scan.feed(line).is_break() {
            debug!("Ingredient limit reached, stopping scan");
            break;
        }
    }

    let summary = scan.finish();
    debug!(
        "Extracted '{}' with {} ingredients and {} steps",
        summary.title,
        summary.ingredients.len(),
        summary.instructions_preview.len()
    );
    summary
}

/// Strip a leading `<digits>.` step marker and any whitespace after it.
fn strip_step_number(line: &str) -> Option<&str> {
    let digits = line.len() - line.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    line[digits..].strip_prefix('.').map(str::trim_start)
}

/// Cut `text` to `limit` characters, marking the cut with [`ELLIPSIS`].
pub fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((byte_index, _)) => format!("{}{}", &text[..byte_index], ELLIPSIS),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DEFAULT_TITLE;

    #[test]
    fn test_tomato_soup() {
        let md = "# Tomato Soup\n## Ingredients\n- Tomato\n- Salt\n## Instructions\n1. Chop\n2. Boil";
        let summary = extract(md);
        assert_eq!(summary.title, "Tomato Soup");
        assert_eq!(summary.ingredients, vec!["Tomato", "Salt"]);
        assert_eq!(summary.instructions_preview, vec!["Chop", "Boil"]);
    }

    #[test]
    fn test_default_title_without_heading() {
        let summary = extract("## Ingredients\n- Flour\n");
        assert_eq!(summary.title, DEFAULT_TITLE);
        assert_eq!(summary.ingredients, vec!["Flour"]);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(extract(""), RecipeSummary::default());
    }

    #[test]
    fn test_localized_headers() {
        let md = "# 番茄汤\n## 食材\n- 番茄\n- 盐\n## 制作步骤\n1. 切块\n2. 煮沸";
        let summary = extract(md);
        assert_eq!(summary.title, "番茄汤");
        assert_eq!(summary.ingredients, vec!["番茄", "盐"]);
        assert_eq!(summary.instructions_preview, vec!["切块", "煮沸"]);
    }

    #[test]
    fn test_english_header_matches_as_substring() {
        let md = "### Notes ## Ingredients for two\n- Egg";
        let summary = extract(md);
        assert_eq!(summary.ingredients, vec!["Egg"]);
    }

    #[test]
    fn test_unknown_section_resets() {
        let md = "## Ingredients\n- Rice\n## Notes\n- not an ingredient\n1. not a step";
        let summary = extract(md);
        assert_eq!(summary.ingredients, vec!["Rice"]);
        assert!(summary.instructions_preview.is_empty());
    }

    #[test]
    fn test_lines_outside_sections_ignored() {
        let md = "- stray bullet\n1. stray step\n# Title\n- another";
        let summary = extract(md);
        assert!(summary.ingredients.is_empty());
        assert!(summary.instructions_preview.is_empty());
    }

    #[test]
    fn test_instruction_cap_and_spacing() {
        let md = "## Instructions\n1. One\n2.Two\n10.   Ten\n4. Four";
        let summary = extract(md);
        assert_eq!(summary.instructions_preview, vec!["One", "Two", "Ten"]);
    }

    #[test]
    fn test_bare_step_number_skipped() {
        let md = "## Instructions\n1.\n2. Stir";
        let summary = extract(md);
        assert_eq!(summary.instructions_preview, vec!["Stir"]);
    }

    #[test]
    fn test_fifth_ingredient_ends_scan() {
        let md = "# Stew\n## Ingredients\n- a\n- b\n- c\n- d\n- e\n## Instructions\n1. Simmer";
        let summary = extract(md);
        assert_eq!(summary.ingredients.len(), MAX_INGREDIENTS);
        assert!(summary.instructions_preview.is_empty());
    }

    #[test]
    fn test_instructions_before_ingredients_survive_cap() {
        let md = "## Instructions\n1. Simmer\n## Ingredients\n- a\n- b\n- c\n- d\n- e\n- f";
        let summary = extract(md);
        assert_eq!(summary.instructions_preview, vec!["Simmer"]);
        assert_eq!(summary.ingredients, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_title_is_first_heading() {
        let summary = extract("# First\n# Second");
        assert_eq!(summary.title, "First");
    }

    #[test]
    fn test_truncate_counts_characters() {
        let long = "汤".repeat(61);
        let cut = truncate(&long, INSTRUCTION_LIMIT);
        assert!(cut.ends_with(ELLIPSIS));
        assert_eq!(cut.chars().count(), INSTRUCTION_LIMIT + ELLIPSIS.len());

        let exact = "x".repeat(INSTRUCTION_LIMIT);
        assert_eq!(truncate(&exact, INSTRUCTION_LIMIT), exact);
    }

    #[test]
    fn test_long_ingredient_truncated() {
        let item = "a".repeat(100);
        let summary = extract(&format!("## Ingredients\n- {}", item));
        assert_eq!(summary.ingredients[0].len(), INGREDIENT_LIMIT + ELLIPSIS.len());
        assert!(summary.ingredients[0].ends_with(ELLIPSIS));
    }

    #[test]
    fn test_strip_step_number() {
        assert_eq!(strip_step_number("12. Mix"), Some("Mix"));
        assert_eq!(strip_step_number("3.Bake"), Some("Bake"));
        assert_eq!(strip_step_number("Step 1. Mix"), None);
        assert_eq!(strip_step_number("1) Mix"), None);
    }
}
