//! Fill in missing build tooling for a file set
//!
//! Synthesis is additive and idempotent: files are only added at free paths,
//! and the two textual patches (stylesheet import, Tailwind directives) check
//! for their own output before applying.

use tracing::debug;

use crate::models::project::{DeployBatch, ProjectFile};
use crate::scaffold::detect::{self, ProjectFlags};
use crate::scaffold::templates;

const SCRIPT_EXTS: &[&str] = &["tsx", "jsx", "ts", "js"];
const SOURCE_DIRS: &[&str] = &["src/", ""];
const ENTRY_STEMS: &[&str] = &["main", "index"];
const VITE_CONFIGS: &[&str] = &["vite.config.ts", "vite.config.js", "vite.config.mjs", "vite.config.mts"];
const TAILWIND_CONFIGS: &[&str] = &[
    "tailwind.config.js",
    "tailwind.config.cjs",
    "tailwind.config.ts",
    "tailwind.config.mjs",
];
const POSTCSS_CONFIGS: &[&str] = &["postcss.config.js", "postcss.config.cjs", "postcss.config.mjs"];
const STYLESHEET_PREFERENCE: &[&str] = &[
    "src/index.css",
    "src/globals.css",
    "src/styles.css",
    "src/App.css",
    "index.css",
    "globals.css",
    "styles.css",
];

/// Naming inputs for generated files
#[derive(Debug, Clone)]
pub struct ScaffoldContext {
    /// Sanitized project name, used in the manifest
    pub package_name: String,
    /// Display title for the HTML entry point
    pub title: String,
}

/// Output of a synthesis pass
#[derive(Debug, Clone)]
pub struct Synthesis {
    pub batch: DeployBatch,
    pub flags: ProjectFlags,
    /// Paths of generated files
    pub added: Vec<String>,
    /// Paths of existing files that were patched
    pub patched: Vec<String>,
}

impl Synthesis {
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.patched.is_empty()
    }
}

pub fn synthesize(batch: DeployBatch, ctx: &ScaffoldContext) -> Synthesis {
    let source = batch.concatenated_text();
    let flags = detect::detect(batch.paths(), &source);
    let libraries = detect::detect_libraries(&source);

    let mut out = Synthesis {
        batch,
        flags,
        added: Vec::new(),
        patched: Vec::new(),
    };

    let entry = ensure_entry_module(&mut out);
    ensure_tailwind_directives(&mut out);

    out.add(
        "package.json",
        templates::package_manifest(&ctx.package_name, flags, &libraries),
    );

    if !has_any(&out.batch, VITE_CONFIGS) {
        out.add(&format!("vite.config.{}", flags.config_ext()), templates::vite_config());
    }

    let entry_src = entry.unwrap_or_else(|| format!("src/main.{}", flags.script_ext()));
    out.add("index.html", templates::index_html(&ctx.title, &format!("/{}", entry_src)));

    if flags.has_tailwind {
        if !has_any(&out.batch, TAILWIND_CONFIGS) {
            out.add("tailwind.config.js", templates::tailwind_config());
        }
        if !has_any(&out.batch, POSTCSS_CONFIGS) {
            out.add("postcss.config.js", templates::postcss_config());
        }
    }

    if flags.has_typescript {
        out.add("tsconfig.json", templates::tsconfig());
    }

    debug!(
        "Scaffold added {:?}, patched {:?} (typescript={}, tailwind={})",
        out.added, out.patched, flags.has_typescript, flags.has_tailwind
    );
    out
}

impl Synthesis {
    fn add(&mut self, path: &str, content: String) {
        if self.batch.insert_if_absent(ProjectFile::text(path, content)) {
            self.added.push(path.to_string());
        }
    }

    fn patch(&mut self, file: ProjectFile) {
        self.patched.push(file.path().to_string());
        self.batch.upsert(file);
    }
}

fn has_any(batch: &DeployBatch, paths: &[&str]) -> bool {
    paths.iter().any(|p| batch.contains(p))
}

fn first_existing(batch: &DeployBatch, stems: &[&str]) -> Option<String> {
    for dir in SOURCE_DIRS {
        for stem in stems {
            for ext in SCRIPT_EXTS {
                let path = format!("{dir}{stem}.{ext}");
                if batch.contains(&path) {
                    return Some(path);
                }
            }
        }
    }
    None
}

fn dir_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..=idx],
        None => "",
    }
}

/// Find or create the entry module and make sure it imports a stylesheet.
/// Returns the entry path, if there is one.
fn ensure_entry_module(out: &mut Synthesis) -> Option<String> {
    if let Some(entry) = first_existing(&out.batch, ENTRY_STEMS) {
        let text = out.batch.get(&entry).and_then(ProjectFile::as_text);
        if let Some(text) = text.filter(|t| !imports_stylesheet(t)) {
            let patched = ProjectFile::text(&entry, format!("import './index.css'\n{}", text));
            out.patch(patched);
            let stylesheet = format!("{}index.css", dir_of(&entry));
            out.add(&stylesheet, templates::stylesheet(out.flags));
        }
        return Some(entry);
    }

    let app = first_existing(&out.batch, &["App"])?;
    let dir = dir_of(&app).to_string();
    let entry = format!("{}main.{}", dir, out.flags.script_ext());
    out.add(&entry, templates::entry_module("./App", "./index.css"));
    out.add(&format!("{}index.css", dir), templates::stylesheet(out.flags));
    Some(entry)
}

fn imports_stylesheet(text: &str) -> bool {
    text.lines().any(|line| {
        let line = line.trim_start();
        (line.starts_with("import") || line.starts_with("require("))
            && (line.contains(".css'") || line.contains(".css\"") || line.contains(".css`"))
    })
}

/// Prepend the three Tailwind directives to the first stylesheet when none has them
fn ensure_tailwind_directives(out: &mut Synthesis) {
    if !out.flags.has_tailwind {
        return;
    }

    let stylesheets: Vec<&ProjectFile> = out
        .batch
        .files()
        .filter(|f| f.extension().as_deref() == Some("css"))
        .collect();
    let configured = stylesheets.iter().filter_map(|f| f.as_text()).any(|text| {
        text.contains("@tailwind") || text.contains("@import \"tailwindcss\"")
    });
    if configured {
        return;
    }

    let target = STYLESHEET_PREFERENCE
        .iter()
        .find_map(|p| out.batch.get(p))
        .or_else(|| stylesheets.first().copied())
        .filter(|f| f.as_text().is_some())
        .cloned();

    if let Some(file) = target {
        let text = file.as_text().unwrap_or_default();
        let patched = file.with_text(format!("{}\n{}", templates::TAILWIND_DIRECTIVES, text));
        out.patch(patched);
    }
}
