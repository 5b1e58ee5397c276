/// Extension-based file categorization.
///
/// This module maps lowercase file extensions to category names (e.g. "Images",
/// "Documents"). The category name doubles as the name of the subfolder a file
/// is sorted into.
///
/// # Examples
///
/// ```
/// use dirsort::file_category::CategoryTable;
///
/// let table = CategoryTable::default();
/// assert_eq!(table.classify("holiday.JPG"), "Images");
/// assert_eq!(table.classify("notes.txt"), "Documents");
/// assert_eq!(table.classify("README"), "Others");
/// ```
use std::collections::{BTreeSet, HashMap};

/// Category returned for every extension the table does not know.
pub const OTHERS_CATEGORY: &str = "Others";

/// The built-in table, in priority order.
///
/// Several extensions appear under more than one category; the category listed
/// first wins.
const DEFAULT_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Documents",
        &[
            "pdf", "docx", "doc", "txt", "rtf", "odt", "xls", "xlsx", "ppt", "pptx", "csv", "md",
            "markdown", "tex", "log", "pages", "numbers", "key", "odp", "ods", "epub", "djvu",
            "mobi", "azw", "azw3", "fb2", "oxps", "xps",
        ],
    ),
    (
        "Images",
        &[
            "jpg", "jpeg", "png", "gif", "bmp", "svg", "tiff", "webp", "ico", "psd", "ai", "eps",
            "indd", "raw", "cr2", "nef", "orf", "sr2", "heif", "heic", "xcf", "cdr",
        ],
    ),
    (
        "Videos",
        &[
            "mp4", "avi", "mkv", "mov", "wmv", "flv", "webm", "m4v", "mpg", "mpeg", "3gp", "3g2",
            "ogv", "vob", "swf", "m2ts", "mts", "ts", "divx", "f4v", "rm", "rmvb", "ogm",
        ],
    ),
    (
        "Audio",
        &[
            "mp3", "wav", "flac", "aac", "ogg", "m4a", "wma", "opus", "aiff", "alac", "ape", "mid",
            "midi", "amr", "ac3", "dts", "ra", "voc", "pcm", "dsf", "dff", "mka", "au",
        ],
    ),
    (
        "Archives",
        &[
            "zip", "rar", "tar", "gz", "7z", "bz2", "xz", "iso", "tgz", "tbz2", "txz", "cab",
            "deb", "rpm", "pkg", "dmg", "z", "lzma", "lz", "lz4", "lzo", "zst", "arj",
        ],
    ),
    (
        "Code",
        &[
            "py", "js", "html", "css", "java", "cpp", "c", "h", "php", "rb", "go", "rs", "ts",
            "swift", "kt", "kts", "scala", "sc", "dart", "lua", "pl", "pm", "sh", "bash", "ps1",
            "bat", "cmd", "sql", "r", "jsx", "tsx", "vue", "elm", "clj", "ex", "exs", "erl",
            "hrl", "hs", "lhs", "fs", "fsx", "ml", "mli", "groovy", "cs", "vb", "xaml", "xml",
            "json", "yaml", "yml", "toml", "ini", "config", "cmake", "make", "gradle", "m", "mm",
            "f", "f90", "f95", "f03", "f08", "asm", "s", "gitignore", "dockerignore",
            "editorconfig",
        ],
    ),
    (
        "Executables",
        &[
            "exe", "msi", "app", "dmg", "deb", "rpm", "apk", "jar", "war", "dll", "so", "dylib",
            "bin", "run", "bat", "cmd", "com", "gadget", "vb", "vbs", "ps1", "msc",
        ],
    ),
    (
        "Fonts",
        &[
            "ttf", "otf", "woff", "woff2", "eot", "fnt", "fon", "bdf", "pfb", "pfm", "afm", "pfa",
        ],
    ),
    (
        "Spreadsheets",
        &[
            "xlsx", "xls", "xlsm", "xlsb", "numbers", "ods", "csv", "tsv", "dif", "sylk", "dbf",
        ],
    ),
    (
        "Presentations",
        &["pptx", "ppt", "pps", "ppsx", "odp", "key", "gslides"],
    ),
    (
        "Databases",
        &[
            "db", "sqlite", "sqlite3", "mdb", "accdb", "sql", "bak", "dbf", "frm", "ibd", "myd",
            "myi",
        ],
    ),
    (
        "3D_Models",
        &[
            "obj", "fbx", "3ds", "stl", "dae", "blend", "max", "ma", "mb", "c4d", "lwo", "lws",
        ],
    ),
    (
        "CAD",
        &[
            "dwg", "dxf", "step", "stp", "iges", "igs", "x_t", "x_b", "sldprt", "sldasm", "ipt",
            "iam",
        ],
    ),
    (
        "Vector",
        &["svg", "ai", "eps", "pdf", "cdr", "afdesign", "sketch"],
    ),
    (
        "Ebooks",
        &["epub", "mobi", "azw", "azw3", "fb2", "ibooks", "cbr", "cbz", "pdf"],
    ),
];

/// Returns the lowercase extension of a file name, if it has one.
///
/// The extension is whatever follows the last `.`. A name without a dot, a
/// name ending in a dot, and a dotfile with no further dot (`.hidden`) have
/// no extension.
///
/// # Examples
///
/// ```
/// use dirsort::file_category::extension_of;
///
/// assert_eq!(extension_of("archive.tar.GZ"), Some("gz".to_string()));
/// assert_eq!(extension_of(".hidden"), None);
/// assert_eq!(extension_of("Makefile"), None);
/// ```
pub fn extension_of(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

/// Normalizes an extension given by a user: strips leading dots, lowercases.
pub(crate) fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

/// Maps file extensions to category names.
///
/// Lookups are case-insensitive. Anything unmapped classifies as
/// [`OTHERS_CATEGORY`].
#[derive(Debug, Clone)]
pub struct CategoryTable {
    extension_map: HashMap<String, String>,
}

impl CategoryTable {
    /// Creates a table with the built-in mappings.
    pub fn new() -> Self {
        let mut extension_map = HashMap::new();
        for (category, extensions) in DEFAULT_CATEGORIES {
            for ext in *extensions {
                extension_map
                    .entry(ext.to_string())
                    .or_insert_with(|| category.to_string());
            }
        }
        Self { extension_map }
    }

    /// Creates a table with no mappings at all; everything is "Others".
    pub fn empty() -> Self {
        Self {
            extension_map: HashMap::new(),
        }
    }

    /// Builds the default table and applies `overrides` on top of it.
    ///
    /// Override keys may carry a leading dot and any casing.
    pub fn with_overrides<'a, I>(overrides: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut table = Self::new();
        for (ext, category) in overrides {
            table.set(ext, category);
        }
        table
    }

    /// Maps `ext` to `category`, replacing any previous mapping.
    pub fn set(&mut self, ext: &str, category: &str) {
        self.extension_map
            .insert(normalize_extension(ext), category.to_string());
    }

    /// Returns the category mapped to an extension, if any.
    ///
    /// ```
    /// use dirsort::file_category::CategoryTable;
    ///
    /// let table = CategoryTable::default();
    /// assert_eq!(table.lookup("PNG"), Some("Images"));
    /// assert_eq!(table.lookup("xyz"), None);
    /// ```
    pub fn lookup(&self, ext: &str) -> Option<&str> {
        self.extension_map
            .get(&normalize_extension(ext))
            .map(String::as_str)
    }

    /// Determines the category of a file from its name.
    pub fn classify(&self, file_name: &str) -> &str {
        extension_of(file_name)
            .and_then(|ext| self.extension_map.get(&ext))
            .map(String::as_str)
            .unwrap_or(OTHERS_CATEGORY)
    }

    /// All category names a file could be sorted into, including "Others".
    pub fn categories(&self) -> BTreeSet<&str> {
        let mut names: BTreeSet<&str> = self.extension_map.values().map(String::as_str).collect();
        names.insert(OTHERS_CATEGORY);
        names
    }

    pub fn len(&self) -> usize {
        self.extension_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extension_map.is_empty()
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_default_extension_classifies_case_insensitively() {
        let table = CategoryTable::default();
        for (_, extensions) in DEFAULT_CATEGORIES {
            for ext in *extensions {
                let expected = table.lookup(ext).expect("default extension must be mapped");
                assert_eq!(table.classify(&format!("name.{}", ext)), expected);
                assert_eq!(
                    table.classify(&format!("name.{}", ext.to_uppercase())),
                    expected
                );
            }
        }
    }

    #[test]
    fn test_first_listed_category_wins() {
        let table = CategoryTable::default();
        assert_eq!(table.lookup("pdf"), Some("Documents"));
        assert_eq!(table.lookup("xlsx"), Some("Documents"));
        assert_eq!(table.lookup("ts"), Some("Videos"));
        assert_eq!(table.lookup("dmg"), Some("Archives"));
        assert_eq!(table.lookup("svg"), Some("Images"));
        assert_eq!(table.lookup("xlsm"), Some("Spreadsheets"));
    }

    #[test]
    fn test_classify_jpg_any_case() {
        let table = CategoryTable::default();
        assert_eq!(table.classify("a.JPG"), "Images");
        assert_eq!(table.classify("a.jpg"), "Images");
        assert_eq!(table.classify("a.JpG"), "Images");
    }

    #[test]
    fn test_extensionless_names_are_others() {
        let table = CategoryTable::default();
        assert_eq!(table.classify("file_no_ext"), OTHERS_CATEGORY);
        assert_eq!(table.classify(".hidden"), OTHERS_CATEGORY);
        assert_eq!(table.classify(".gitignore"), OTHERS_CATEGORY);
        assert_eq!(table.classify("trailing."), OTHERS_CATEGORY);
    }

    #[test]
    fn test_unknown_extension_is_others() {
        let table = CategoryTable::default();
        assert_eq!(table.classify("c.unknownext"), OTHERS_CATEGORY);
    }

    #[test]
    fn test_last_dot_decides() {
        let table = CategoryTable::default();
        assert_eq!(table.classify("backup.tar.gz"), "Archives");
        assert_eq!(table.classify("photo.backup.png"), "Images");
        assert_eq!(table.classify(".config.json"), "Code");
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("a.TXT"), Some("txt".to_string()));
        assert_eq!(extension_of("a"), None);
        assert_eq!(extension_of("."), None);
        assert_eq!(extension_of(".."), None);
        assert_eq!(extension_of(".env.local"), Some("local".to_string()));
    }

    #[test]
    fn test_overrides_replace_and_add() {
        let table = CategoryTable::with_overrides([(".PSD", "Design"), ("nfo", "Info")]);
        assert_eq!(table.classify("mockup.psd"), "Design");
        assert_eq!(table.classify("release.NFO"), "Info");
        assert_eq!(table.classify("photo.png"), "Images");
    }

    #[test]
    fn test_empty_table_classifies_everything_as_others() {
        let table = CategoryTable::empty();
        assert!(table.is_empty());
        assert_eq!(table.classify("photo.png"), OTHERS_CATEGORY);
    }

    #[test]
    fn test_categories_include_others() {
        let table = CategoryTable::default();
        let categories = table.categories();
        assert!(categories.contains(OTHERS_CATEGORY));
        assert!(categories.contains("Images"));
        assert!(categories.contains("3D_Models"));
        assert_eq!(categories.len(), DEFAULT_CATEGORIES.len() + 1);
    }
}
