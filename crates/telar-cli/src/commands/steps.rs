use std::path::Path;

use anyhow::{Context, Result};

use telar_core::story::Narrative;

pub fn run(story: &Path) -> Result<()> {
    let narrative = Narrative::load(story)
        .with_context(|| format!("Failed to load story {}", story.display()))?;

    if narrative.is_empty() {
        println!("No steps in {}.", story.display());
        return Ok(());
    }

    println!(
        "{} ({} steps):\n",
        narrative.title().unwrap_or("Untitled story"),
        narrative.len()
    );

    for step in narrative.steps() {
        let object = match &step.object_id {
            Some(id) => narrative.object_title(id).to_string(),
            None if step.is_intro() => "(intro)".to_string(),
            None => "-".to_string(),
        };
        let target = step
            .target
            .map(|t| t.to_string())
            .unwrap_or_else(|| "-".to_string());

        println!(
            "  {:>3}  {:<20} {:<28} {}",
            step.index,
            object,
            target,
            step.question.as_deref().unwrap_or("")
        );

        let mut layers = Vec::new();
        if step.layer1.is_some() {
            layers.push("layer 1");
        }
        if step.layer2.is_some() {
            layers.push("layer 2");
        }
        if !layers.is_empty() {
            println!("       panels: {}", layers.join(", "));
        }
    }

    Ok(())
}
