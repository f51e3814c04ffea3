mod markdown;

pub use self::markdown::{
    extract, truncate, ELLIPSIS, INGREDIENT_LIMIT, INSTRUCTION_LIMIT, MAX_INGREDIENTS,
    MAX_INSTRUCTIONS,
};
