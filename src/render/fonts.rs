use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, info, warn};
use resvg::usvg::fontdb::{Database, Family, Query};

/// How card text gets drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Typeface {
    /// An installed font family, with the remaining configured families as
    /// per-glyph fallbacks
    Installed { families: Vec<String> },
    /// The built-in bitmap glyphs
    BuiltIn,
}

/// Font database shared by every render, plus the typeface chosen from it.
#[derive(Debug, Clone)]
pub struct FontSet {
    db: Arc<Database>,
    typeface: Typeface,
}

impl FontSet {
    /// Load system fonts and `font_files`, then pick the first of `families`
    /// that is installed. Falls back to the built-in glyphs when none is.
    pub fn resolve(families: &[String], font_files: &[PathBuf]) -> Self {
        let mut db = Database::new();
        db.load_system_fonts();
        for path in font_files {
            if let Err(e) = db.load_font_file(path) {
                warn!("Failed to load font file {}: {}", path.display(), e);
            }
        }
        debug!("Font database holds {} faces", db.len());

        let available: Vec<String> = families
            .iter()
            .filter(|family| {
                let query = Query {
                    families: &[Family::Name(family.as_str())],
                    ..Query::default()
                };
                db.query(&query).is_some()
            })
            .cloned()
            .collect();

        let typeface = if available.is_empty() {
            warn!("None of the configured font families are installed, using built-in glyphs");
            Typeface::BuiltIn
        } else {
            info!("Rendering cards with font family '{}'", available[0]);
            Typeface::Installed {
                families: available,
            }
        };

        FontSet {
            db: Arc::new(db),
            typeface,
        }
    }

    /// A font set that always draws with the built-in glyphs.
    pub fn built_in() -> Self {
        FontSet {
            db: Arc::new(Database::new()),
            typeface: Typeface::BuiltIn,
        }
    }

    #[cfg(test)]
    pub(crate) fn installed(families: Vec<String>) -> Self {
        FontSet {
            db: Arc::new(Database::new()),
            typeface: Typeface::Installed { families },
        }
    }

    pub fn typeface(&self) -> &Typeface {
        &self.typeface
    }

    pub(crate) fn database(&self) -> Arc<Database> {
        Arc::clone(&self.db)
    }
}
