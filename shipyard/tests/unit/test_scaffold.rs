//! Scaffold synthesis tests

use shipyard::scaffold::templates::TAILWIND_DIRECTIVES;
use shipyard::scaffold::{synthesize, ScaffoldContext};

use crate::support::batch;

fn ctx() -> ScaffoldContext {
    ScaffoldContext {
        package_name: "my-app".to_string(),
        title: "My App".to_string(),
    }
}

#[test]
fn test_single_component_becomes_buildable_project() {
    let input = batch(&[("src/App.tsx", "<div className='flex p-4'>Hi</div>")]);
    let out = synthesize(input, &ctx());

    assert!(out.flags.has_typescript);
    assert!(out.flags.has_tailwind);

    let manifests: Vec<&str> = out.batch.paths().filter(|p| p.ends_with("package.json")).collect();
    assert_eq!(manifests, vec!["package.json"]);
    let vite_configs = out.batch.paths().filter(|p| p.starts_with("vite.config.")).count();
    assert_eq!(vite_configs, 1);
    assert!(out.batch.contains("vite.config.ts"));
    assert!(out.batch.contains("tailwind.config.js"));
    assert!(out.batch.contains("postcss.config.js"));
    assert!(out.batch.contains("tsconfig.json"));

    let html = out.batch.get("index.html").unwrap().as_text().unwrap();
    assert!(html.contains("<title>My App</title>"));
    assert!(html.contains("src=\"/src/main.tsx\""));

    let entry = out.batch.get("src/main.tsx").unwrap().as_text().unwrap();
    assert!(entry.contains("import App from './App'"));
    assert!(entry.contains("import './index.css'"));

    let css = out.batch.get("src/index.css").unwrap().as_text().unwrap();
    assert!(css.contains(TAILWIND_DIRECTIVES));

    let manifest: serde_json::Value =
        serde_json::from_str(out.batch.get("package.json").unwrap().as_text().unwrap()).unwrap();
    assert_eq!(manifest["name"], "my-app");
    assert!(manifest["devDependencies"]["tailwindcss"].is_string());
    assert!(manifest["devDependencies"]["typescript"].is_string());

    // The caller's file is untouched
    assert_eq!(
        out.batch.get("src/App.tsx").unwrap().as_text(),
        Some("<div className='flex p-4'>Hi</div>")
    );
}

#[test]
fn test_synthesis_is_idempotent() {
    let input = batch(&[("src/App.tsx", "<div className='flex p-4'>Hi</div>")]);
    let once = synthesize(input, &ctx());
    let twice = synthesize(once.batch.clone(), &ctx());

    assert!(twice.is_noop());
    assert_eq!(twice.batch, once.batch);
}

#[test]
fn test_caller_files_are_never_replaced() {
    let input = batch(&[
        ("src/App.jsx", "export default () => <p>plain</p>"),
        ("package.json", "{\"name\":\"mine\"}"),
        ("index.html", "<html>mine</html>"),
    ]);
    let out = synthesize(input, &ctx());

    assert_eq!(out.batch.get("package.json").unwrap().as_text(), Some("{\"name\":\"mine\"}"));
    assert_eq!(out.batch.get("index.html").unwrap().as_text(), Some("<html>mine</html>"));
    assert!(!out.flags.has_tailwind);
    assert!(!out.batch.contains("tailwind.config.js"));
    assert!(out.batch.contains("vite.config.js"));
    assert!(out.batch.contains("src/main.jsx"));
}
