//! Saved file commands

use crate::app::App;
use anyhow::{anyhow, Context, Result};
use codexec_foundation::{ArtifactDraft, ArtifactId, ArtifactSummary, Language, ShareLink};
use std::path::{Path, PathBuf};

/// Language from an explicit flag or the file extension
pub fn resolve_language(path: &Path, language: Option<Language>) -> Result<Language> {
    if let Some(language) = language {
        return Ok(language);
    }
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(Language::from_extension)
        .ok_or_else(|| anyhow!("Cannot infer the language of {}; pass --language", path.display()))
}

fn print_listing(files: &[ArtifactSummary]) {
    if files.is_empty() {
        println!("No saved files.");
        return;
    }

    println!("{:<8} {:<12} {:<30} {:<17}", "ID", "Language", "Filename", "Created");
    println!("{}", "-".repeat(70));
    for file in files {
        let created = file
            .created_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!(
            "{:<8} {:<12} {:<30} {:<17}",
            file.id.as_str(),
            file.language.display_name(),
            file.filename,
            created
        );
    }
}

pub async fn list(app: &App) -> Result<()> {
    app.require_login().await?;
    let files = app.files().list().await?;
    print_listing(&files);
    Ok(())
}

pub async fn save(app: &App, path: &Path, name: Option<String>, language: Option<Language>) -> Result<()> {
    let language = resolve_language(path, language)?;
    let code = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let filename = name.unwrap_or_else(|| {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    });

    app.require_login().await?;
    let saved = app.files().create(&ArtifactDraft::new(filename, language, code)).await?;
    println!("✓ Saved {} ({}) as file {}", saved.filename, saved.language.display_name(), saved.id);
    Ok(())
}

fn write_code(code: &str, output: Option<PathBuf>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(&path, code).with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{}", code),
    }
    Ok(())
}

pub async fn open(app: &App, id: &str, output: Option<PathBuf>) -> Result<()> {
    app.require_login().await?;
    let content = app.files().fetch(&ArtifactId::new(id)).await?;
    eprintln!("# {} ({})", content.filename, content.language.display_name());
    write_code(&content.code, output)
}

pub async fn delete(app: &App, id: &str) -> Result<()> {
    app.require_login().await?;
    app.files().delete(&ArtifactId::new(id)).await?;
    println!("✓ Deleted file {}", id);
    Ok(())
}

pub async fn share(app: &App, id: &str) -> Result<()> {
    app.require_login().await?;
    let link = app.files().share(&ArtifactId::new(id)).await?;
    println!("{}", link.url);
    eprintln!("Share id: {}", link.share_id);
    Ok(())
}

/// Fetch by share link; works without logging in
pub async fn shared(app: &App, reference: &str, output: Option<PathBuf>) -> Result<()> {
    let link = ShareLink::parse(reference).ok_or_else(|| anyhow!("Not a share link: {}", reference))?;
    let content = app.files().fetch_shared(&link).await?;
    match &content.owner_username {
        Some(owner) => eprintln!(
            "# {} ({}) shared by {}",
            content.filename,
            content.language.display_name(),
            owner
        ),
        None => eprintln!("# {} ({})", content.filename, content.language.display_name()),
    }
    write_code(&content.code, output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_language() {
        assert_eq!(resolve_language(Path::new("a.py"), None).unwrap(), Language::Python);
        assert_eq!(resolve_language(Path::new("Main.java"), None).unwrap(), Language::Java);
        assert_eq!(
            resolve_language(Path::new("script"), Some(Language::Javascript)).unwrap(),
            Language::Javascript
        );
        assert!(resolve_language(Path::new("notes.txt"), None).is_err());
    }
}
