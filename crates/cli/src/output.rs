use giftidea_core::domain::idea::Idea;
use giftidea_core::llm::{ModelCatalog, Provider};
use giftidea_core::service::PromptPreview;
use std::fmt::Write;

pub fn render_ideas(ideas: &[Idea]) -> String {
    if ideas.is_empty() {
        return "No ideas returned.\n".to_string();
    }

    let width = ideas
        .iter()
        .map(|i| i.name.chars().count())
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    for (idx, idea) in ideas.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>2}. {:<width$}  {:>9} €",
            idx + 1,
            idea.name,
            idea.formatted_price(),
        );
    }
    out
}

pub fn render_catalogs(catalogs: &[(Provider, ModelCatalog)]) -> String {
    let mut out = String::new();
    for (provider, catalog) in catalogs {
        let _ = writeln!(out, "{provider}:");
        for descriptor in catalog.models().values() {
            let _ = writeln!(out, "  {:<28} {}", descriptor.id, descriptor.display_name);
        }
    }
    out
}

pub fn render_preview(preview: &PromptPreview) -> String {
    format!(
        "provider: {}\n\n--- system ---\n{}\n\n--- user ---\n{}\n",
        preview.provider, preview.system_prompt, preview.user_prompt
    )
}
