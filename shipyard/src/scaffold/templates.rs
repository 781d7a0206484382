//! Generated build-tooling files for the Vite + React profile

use serde_json::{json, Map, Value};

use crate::scaffold::detect::{ProjectFlags, RUNTIME_DEPENDENCIES};

pub const TAILWIND_DIRECTIVES: &str = "@tailwind base;\n@tailwind components;\n@tailwind utilities;\n";

pub fn package_manifest(
    name: &str,
    flags: ProjectFlags,
    libraries: &[(&'static str, &'static str)],
) -> String {
    let mut dependencies = Map::new();
    for (library, version) in RUNTIME_DEPENDENCIES.iter().chain(libraries.iter()) {
        dependencies.insert(library.to_string(), Value::from(*version));
    }

    let mut dev_dependencies = Map::new();
    dev_dependencies.insert("vite".into(), "^5.4.0".into());
    dev_dependencies.insert("@vitejs/plugin-react".into(), "^4.3.0".into());
    if flags.has_typescript {
        dev_dependencies.insert("typescript".into(), "^5.5.0".into());
        dev_dependencies.insert("@types/react".into(), "^18.3.0".into());
        dev_dependencies.insert("@types/react-dom".into(), "^18.3.0".into());
    }
    if flags.has_tailwind {
        dev_dependencies.insert("tailwindcss".into(), "^3.4.0".into());
        dev_dependencies.insert("postcss".into(), "^8.4.0".into());
        dev_dependencies.insert("autoprefixer".into(), "^10.4.0".into());
    }

    let manifest = json!({
        "name": name,
        "private": true,
        "version": "0.0.0",
        "type": "module",
        "scripts": {
            "dev": "vite",
            "build": "vite build",
            "preview": "vite preview",
        },
        "dependencies": dependencies,
        "devDependencies": dev_dependencies,
    });
    let mut out = serde_json::to_string_pretty(&manifest).unwrap_or_default();
    out.push('\n');
    out
}

pub fn vite_config() -> String {
    "import { defineConfig } from 'vite'\n\
     import react from '@vitejs/plugin-react'\n\
     \n\
     export default defineConfig({\n  plugins: [react()],\n})\n"
        .to_string()
}

pub fn index_html(title: &str, entry_src: &str) -> String {
    format!(
        "<!doctype html>\n\
         <html lang=\"en\">\n  \
           <head>\n    \
             <meta charset=\"UTF-8\" />\n    \
             <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\" />\n    \
             <title>{}</title>\n  \
           </head>\n  \
           <body>\n    \
             <div id=\"root\"></div>\n    \
             <script type=\"module\" src=\"{}\"></script>\n  \
           </body>\n\
         </html>\n",
        escape_html(title),
        entry_src
    )
}

pub fn tailwind_config() -> String {
    "/** @type {import('tailwindcss').Config} */\n\
     export default {\n  \
       content: ['./index.html', './src/**/*.{js,ts,jsx,tsx}', './*.{js,ts,jsx,tsx}'],\n  \
       theme: {\n    extend: {},\n  },\n  \
       plugins: [],\n\
     }\n"
        .to_string()
}

pub fn postcss_config() -> String {
    "export default {\n  plugins: {\n    tailwindcss: {},\n    autoprefixer: {},\n  },\n}\n"
        .to_string()
}

pub fn tsconfig() -> String {
    let config = json!({
        "compilerOptions": {
            "target": "ES2020",
            "useDefineForClassFields": true,
            "lib": ["ES2020", "DOM", "DOM.Iterable"],
            "module": "ESNext",
            "skipLibCheck": true,
            "moduleResolution": "bundler",
            "allowImportingTsExtensions": true,
            "resolveJsonModule": true,
            "isolatedModules": true,
            "noEmit": true,
            "jsx": "react-jsx",
            "strict": false,
        },
        "include": ["src", "*.ts", "*.tsx"],
    });
    let mut out = serde_json::to_string_pretty(&config).unwrap_or_default();
    out.push('\n');
    out
}

/// Default stylesheet, with Tailwind directives when Tailwind is in use
pub fn stylesheet(flags: ProjectFlags) -> String {
    let base = "body {\n  margin: 0;\n  font-family: system-ui, -apple-system, sans-serif;\n}\n";
    if flags.has_tailwind {
        format!("{}\n{}", TAILWIND_DIRECTIVES, base)
    } else {
        base.to_string()
    }
}

pub fn entry_module(app_import: &str, stylesheet_import: &str) -> String {
    format!(
        "import React from 'react'\n\
         import ReactDOM from 'react-dom/client'\n\
         import App from '{}'\n\
         import '{}'\n\
         \n\
         ReactDOM.createRoot(document.getElementById('root')).render(\n  \
           <React.StrictMode>\n    \
             <App />\n  \
           </React.StrictMode>,\n\
         )\n",
        app_import, stylesheet_import
    )
}

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
