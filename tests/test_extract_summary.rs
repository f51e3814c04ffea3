use recipe_cards::extract_summary;
use recipe_cards::extractors::{INGREDIENT_LIMIT, INSTRUCTION_LIMIT, MAX_INGREDIENTS, MAX_INSTRUCTIONS};
use recipe_cards::model::DEFAULT_TITLE;

#[test]
fn test_simple_recipe() {
    let markdown = "# Tomato Soup\n## Ingredients\n- Tomato\n- Salt\n## Instructions\n1. Chop\n2. Boil";
    let summary = extract_summary(markdown);

    assert_eq!(summary.title, "Tomato Soup");
    assert_eq!(summary.ingredients, vec!["Tomato", "Salt"]);
    assert_eq!(summary.instructions_preview, vec!["Chop", "Boil"]);
}

#[test]
fn test_only_first_five_ingredients_kept() {
    let bullets: String = (1..=7).map(|i| format!("- item {}\n", i)).collect();
    let markdown = format!("# Salad\n## Ingredients\n{}", bullets);
    let summary = extract_summary(&markdown);

    assert_eq!(
        summary.ingredients,
        vec!["item 1", "item 2", "item 3", "item 4", "item 5"]
    );
}

#[test]
fn test_chinese_headers() {
    let markdown = "# 番茄炒蛋\n## 食材\n- 番茄 2个\n- 鸡蛋 3个\n## 制作步骤\n1. 打散鸡蛋\n2.翻炒番茄\n";
    let summary = extract_summary(markdown);

    assert_eq!(summary.title, "番茄炒蛋");
    assert_eq!(summary.ingredients, vec!["番茄 2个", "鸡蛋 3个"]);
    assert_eq!(summary.instructions_preview, vec!["打散鸡蛋", "翻炒番茄"]);
}

#[test]
fn test_unstructured_text() {
    let summary = extract_summary("Just boil some pasta and add sauce.");

    assert_eq!(summary.title, DEFAULT_TITLE);
    assert!(summary.ingredients.is_empty());
    assert!(summary.instructions_preview.is_empty());
}

#[test]
fn test_empty_input() {
    let summary = extract_summary("");
    assert_eq!(summary.title, DEFAULT_TITLE);
    assert!(summary.ingredients.is_empty());
}

#[test]
fn test_limits_hold_for_long_recipe() {
    let long = "x".repeat(200);
    let mut markdown = String::from("# Feast\n## Instructions\n");
    for i in 1..=10 {
        markdown.push_str(&format!("{}. {}\n", i, long));
    }
    markdown.push_str("## Ingredients\n");
    for _ in 0..10 {
        markdown.push_str(&format!("- {}\n", long));
    }

    let summary = extract_summary(&markdown);

    assert_eq!(summary.instructions_preview.len(), MAX_INSTRUCTIONS);
    assert_eq!(summary.ingredients.len(), MAX_INGREDIENTS);
    for step in &summary.instructions_preview {
        assert_eq!(step.chars().count(), INSTRUCTION_LIMIT + 3);
        assert!(step.ends_with("..."));
    }
    for item in &summary.ingredients {
        assert_eq!(item.chars().count(), INGREDIENT_LIMIT + 3);
    }
}

#[test]
fn test_instructions_after_fifth_ingredient_not_scanned() {
    let markdown = "# Stew\n## Ingredients\n- a\n- b\n- c\n- d\n- e\n## Instructions\n1. Simmer";
    let summary = extract_summary(markdown);

    assert_eq!(summary.ingredients.len(), 5);
    assert!(summary.instructions_preview.is_empty());
}

#[test]
fn test_other_sections_ignored() {
    let markdown = "# Bread\n## Notes\n- not an ingredient\n1. not a step\n## Ingredients\n- flour";
    let summary = extract_summary(markdown);

    assert_eq!(summary.ingredients, vec!["flour"]);
    assert!(summary.instructions_preview.is_empty());
}

#[test]
fn test_repeated_extraction_is_identical() {
    let markdown = "# Curry\n## Ingredients\n- rice\n## Instructions\n1. Cook";
    assert_eq!(extract_summary(markdown), extract_summary(markdown));
}
