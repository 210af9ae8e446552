//! File categorization by extension.
//!
//! This module maps file names to category names (e.g. "Images", "Documents")
//! using an ordered extension table. Categories are checked in declaration
//! order and the first match wins; anything unmatched lands in [`OTHERS`].
//!
//! # Examples
//!
//! ```
//! use foldersort::file_category::CategoryTable;
//!
//! let table = CategoryTable::default();
//! assert_eq!(table.classify("holiday.JPG"), "Images");
//! assert_eq!(table.classify("report.pdf"), "Documents");
//! assert_eq!(table.classify("notes.xyz"), "Others");
//! ```

/// Name of the fallback category for files no rule matches.
pub const OTHERS: &str = "Others";

/// A named bucket of file extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    name: String,
    /// Lowercase extensions, leading dot included, in declaration order.
    extensions: Vec<String>,
}

impl Category {
    /// Returns the category name, which is also its directory name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the extensions owned by this category.
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    fn contains(&self, extension: &str) -> bool {
        self.extensions.iter().any(|ext| ext == extension)
    }
}

/// Ordered mapping from category name to the extensions it owns.
///
/// The table is an immutable value once handed to the organizer. Extensions
/// are expected to be disjoint across categories but this is not enforced;
/// when two categories claim the same extension the earlier one wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTable {
    categories: Vec<Category>,
}

impl CategoryTable {
    /// Creates a table with no categories. Everything classifies as [`OTHERS`].
    pub fn empty() -> Self {
        Self {
            categories: Vec::new(),
        }
    }

    /// Creates the standard table.
    pub fn new() -> Self {
        Self::empty()
            .with_category("Images", &[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".ico"])
            .with_category(
                "Documents",
                &[".pdf", ".docx", ".doc", ".txt", ".xlsx", ".xls", ".pptx", ".ppt"],
            )
            .with_category("Videos", &[".mp4", ".mkv", ".avi", ".mov", ".flv"])
            .with_category("Audio", &[".mp3", ".wav", ".aac"])
            .with_category("Programs", &[".exe", ".msi"])
            .with_category("Compressed", &[".zip", ".rar", ".7z"])
    }

    /// Appends a category, or extends it if one with that name already exists.
    ///
    /// Extensions are lowercased and a leading dot is added when missing,
    /// so `"PNG"` and `".png"` register the same extension.
    pub fn with_category(mut self, name: &str, extensions: &[&str]) -> Self {
        for ext in extensions {
            self.add_extension_mapping(name, ext);
        }
        if !self.categories.iter().any(|c| c.name == name) {
            self.categories.push(Category {
                name: name.to_string(),
                extensions: Vec::new(),
            });
        }
        self
    }

    /// Adds a single extension to a category, creating the category at the
    /// end of the table if needed.
    pub fn add_extension_mapping(&mut self, category: &str, ext: &str) {
        let ext = normalize_extension(ext);
        let index = match self.categories.iter().position(|c| c.name == category) {
            Some(index) => index,
            None => {
                self.categories.push(Category {
                    name: category.to_string(),
                    extensions: Vec::new(),
                });
                self.categories.len() - 1
            }
        };
        let entry = &mut self.categories[index];
        if !entry.contains(&ext) {
            entry.extensions.push(ext);
        }
    }

    /// Returns the categories in table order, without [`OTHERS`].
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Returns the extensions mapped to `name`, or `None` for an unknown
    /// category. [`OTHERS`] has no extensions of its own.
    pub fn extensions_of(&self, name: &str) -> Option<&[String]> {
        self.categories
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.extensions())
    }

    /// Returns every category directory name: table order, then [`OTHERS`].
    ///
    /// # Examples
    ///
    /// ```
    /// use foldersort::file_category::CategoryTable;
    ///
    /// let table = CategoryTable::default();
    /// let names: Vec<_> = table.category_names().collect();
    /// assert_eq!(names.first(), Some(&"Images"));
    /// assert_eq!(names.last(), Some(&"Others"));
    /// ```
    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        let has_others = self.categories.iter().any(|c| c.name == OTHERS);
        self.categories
            .iter()
            .map(|c| c.name.as_str())
            .chain((!has_others).then_some(OTHERS))
    }

    /// Maps an extension (with or without its leading dot) to a category.
    ///
    /// # Examples
    ///
    /// ```
    /// use foldersort::file_category::CategoryTable;
    ///
    /// let table = CategoryTable::default();
    /// assert_eq!(table.extension_to_category(".MP3"), Some("Audio"));
    /// assert_eq!(table.extension_to_category("7z"), Some("Compressed"));
    /// assert_eq!(table.extension_to_category(".xyz"), None);
    /// ```
    pub fn extension_to_category(&self, ext: &str) -> Option<&str> {
        let ext = normalize_extension(ext);
        self.categories
            .iter()
            .find(|c| c.contains(&ext))
            .map(|c| c.name.as_str())
    }

    /// Classifies a file name into a category name.
    ///
    /// Only the extension is considered, case-insensitively. Names without an
    /// extension, including dotfiles such as `.bashrc`, classify as [`OTHERS`].
    pub fn classify(&self, file_name: &str) -> &str {
        extension_of(file_name)
            .and_then(|ext| self.extension_to_category(&ext))
            .unwrap_or(OTHERS)
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Extracts the lowercase extension of a file name, leading dot included.
///
/// Leading dots are skipped before searching for the last '.', so a dotfile
/// like `.profile` has no extension while `.config.json` has `.json`.
///
/// # Examples
///
/// ```
/// use foldersort::file_category::extension_of;
///
/// assert_eq!(extension_of("Photo.JPG"), Some(".jpg".to_string()));
/// assert_eq!(extension_of("archive.tar.gz"), Some(".gz".to_string()));
/// assert_eq!(extension_of("README"), None);
/// assert_eq!(extension_of(".bashrc"), None);
/// ```
pub fn extension_of(file_name: &str) -> Option<String> {
    let rest = file_name.trim_start_matches('.');
    let dot = rest.rfind('.')?;
    Some(rest[dot..].to_lowercase())
}

fn normalize_extension(ext: &str) -> String {
    let ext = ext.to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}
