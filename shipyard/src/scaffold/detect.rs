//! Best-effort framework and library detection
//!
//! Everything here is a pure function of the file paths and the concatenated
//! source text. Matching is textual; it recognizes the patterns listed below
//! and nothing more.

use std::sync::LazyLock;

use regex::Regex;

/// Substrings that mark an explicit Tailwind setup
const TAILWIND_MARKERS: &[&str] = &["@tailwind", "tailwindcss", "@import \"tailwindcss\""];

/// Common Tailwind utility tokens inside `className`/`class` attributes
static TAILWIND_CLASS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"(?:className|class)\s*=\s*(?:"|'|\{\s*[`"'])[^"'`]*\b(?:"#,
        r#"flex|grid|hidden|inline-flex|container|"#,
        r#"(?:p|px|py|pt|pb|pl|pr|m|mx|my|mt|mb|ml|mr|gap|w|h|min-h|max-w|space-[xy])-[0-9a-z/.]+|"#,
        r#"text-(?:xs|sm|base|lg|[2-9]?xl|center|left|right|white|black|[a-z]+-\d{2,3})|"#,
        r#"bg-[a-z]+(?:-\d{2,3})?|rounded(?:-[a-z0-9]+)?|shadow(?:-[a-z0-9]+)?|"#,
        r#"items-[a-z]+|justify-[a-z]+|font-(?:bold|semibold|medium|light)"#,
        r#")\b"#
    ))
    .unwrap()
});

/// Runtime dependencies every generated manifest carries
pub const RUNTIME_DEPENDENCIES: &[(&str, &str)] = &[("react", "^18.3.1"), ("react-dom", "^18.3.1")];

/// Optional libraries, added when their import string appears in the source
pub const OPTIONAL_LIBRARIES: &[(&str, &str)] = &[
    ("react-router-dom", "^6.26.0"),
    ("framer-motion", "^11.3.0"),
    ("lucide-react", "^0.441.0"),
    ("axios", "^1.7.0"),
    ("zustand", "^4.5.0"),
    ("@tanstack/react-query", "^5.51.0"),
    ("clsx", "^2.1.0"),
    ("tailwind-merge", "^2.5.0"),
    ("date-fns", "^3.6.0"),
    ("recharts", "^2.12.0"),
    ("react-icons", "^5.3.0"),
    ("@headlessui/react", "^2.1.0"),
];

/// Flags inferred from a file set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectFlags {
    pub has_typescript: bool,
    pub has_tailwind: bool,
}

impl ProjectFlags {
    /// Extension for generated script modules
    pub fn script_ext(&self) -> &'static str {
        if self.has_typescript {
            "tsx"
        } else {
            "jsx"
        }
    }

    /// Extension for generated config modules
    pub fn config_ext(&self) -> &'static str {
        if self.has_typescript {
            "ts"
        } else {
            "js"
        }
    }
}

pub fn detect<'a>(paths: impl IntoIterator<Item = &'a str>, source: &str) -> ProjectFlags {
    ProjectFlags {
        has_typescript: paths
            .into_iter()
            .any(|p| p.ends_with(".ts") || p.ends_with(".tsx")),
        has_tailwind: has_tailwind(source),
    }
}

pub fn has_tailwind(source: &str) -> bool {
    TAILWIND_MARKERS.iter().any(|m| source.contains(m)) || TAILWIND_CLASS_REGEX.is_match(source)
}

/// Whether `source` imports or requires `library`
pub fn imports_library(source: &str, library: &str) -> bool {
    ['"', '\'', '`'].iter().any(|q| {
        source.contains(&format!("{q}{library}{q}")) || source.contains(&format!("{q}{library}/"))
    })
}

/// Optional libraries referenced by the source, in declaration order
pub fn detect_libraries(source: &str) -> Vec<(&'static str, &'static str)> {
    OPTIONAL_LIBRARIES
        .iter()
        .copied()
        .filter(|(library, _)| imports_library(source, library))
        .collect()
}
