//! Remote project naming

pub const MAX_PROJECT_NAME_LEN: usize = 50;

/// Name used when nothing usable survives sanitizing
const FALLBACK_PROJECT_NAME: &str = "project";

/// Deterministic remote project name: lower-case, runs of anything outside
/// `[a-z0-9-]` collapsed to a single `-`, no leading/trailing hyphens, at most 50 chars.
pub fn sanitize_project_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !out.is_empty() {
                if out.len() + 2 > MAX_PROJECT_NAME_LEN {
                    break;
                }
                out.push('-');
            }
            pending_hyphen = false;
            if out.len() >= MAX_PROJECT_NAME_LEN {
                break;
            }
            out.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    let out = out.trim_end_matches('-');
    if out.is_empty() {
        FALLBACK_PROJECT_NAME.to_string()
    } else {
        out.to_string()
    }
}

/// URL the platform is expected to assign to a project on first deploy
pub fn provisional_url(project_name: &str, domain_suffix: &str) -> String {
    format!(
        "https://{}.{}",
        project_name,
        domain_suffix.trim_start_matches('.')
    )
}
