use std::path::Path;
use std::rc::Rc;

use anyhow::{bail, Context, Result};

use telar_core::story::{ManifestResolver, Narrative, ObjectResolver};
use telar_core::AppConfig;

pub fn run(config: &AppConfig, story: &Path) -> Result<()> {
    let narrative = Rc::new(
        Narrative::load(story)
            .with_context(|| format!("Failed to load story {}", story.display()))?,
    );
    let resolver = ManifestResolver::new(&config.site.page_url, Rc::clone(&narrative))?;

    let mut problems = 0;
    for issue in narrative.issues() {
        println!("  warning: {}", issue);
    }

    for step in narrative.steps() {
        if let Some(object_id) = &step.object_id {
            if narrative.object(object_id).is_none() {
                println!(
                    "  warning: step {} shows unknown object {}",
                    step.index, object_id
                );
            }
        }
    }

    if let Err(e) = narrative.validate() {
        println!("  error: {}", e);
        problems += 1;
    }

    let mut objects: Vec<&str> = narrative
        .steps()
        .iter()
        .filter_map(|s| s.object_id.as_deref())
        .collect();
    objects.sort_unstable();
    objects.dedup();

    println!("\nObjects ({}):", objects.len());
    for object_id in objects {
        println!("  {:<20} {}", object_id, resolver.source_url(object_id));
    }

    if problems > 0 {
        bail!("{} is not playable", story.display());
    }
    println!(
        "\n{}: {} steps, {} issues",
        story.display(),
        narrative.len(),
        narrative.issues().len()
    );
    Ok(())
}
