use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, warn};

use super::models::{GlossaryTerm, LayerContent, ObjectRecord, Step, StepRecord, StoryData};
use super::parse::{non_blank, parse_target, scalar_id, TargetProblem};
use crate::{Error, Result};

/// Non-fatal problem found while building the narrative
#[derive(Debug, Clone, PartialEq)]
pub struct StoryIssue {
    pub step_index: usize,
    pub problem: TargetProblem,
}

impl std::fmt::Display for StoryIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "step {}: {} (no camera move)", self.step_index, self.problem)
    }
}

/// Read-only, pre-loaded story content: ordered steps plus object and glossary indexes
#[derive(Debug, Clone, Default)]
pub struct Narrative {
    title: Option<String>,
    first_object: Option<String>,
    steps: Vec<Step>,
    objects: HashMap<String, ObjectRecord>,
    glossary: HashMap<String, GlossaryTerm>,
    issues: Vec<StoryIssue>,
}

impl Narrative {
    /// Build the narrative from a parsed story document
    pub fn from_story(data: StoryData) -> Self {
        let mut issues = Vec::new();
        let steps: Vec<Step> = data
            .steps
            .into_iter()
            .enumerate()
            .map(|(index, record)| build_step(index, record, &mut issues))
            .collect();

        let objects = data
            .objects
            .into_iter()
            .filter(|o| !o.object_id.trim().is_empty())
            .map(|o| (o.object_id.trim().to_string(), o))
            .collect();

        let glossary = data
            .glossary
            .into_iter()
            .filter(|t| !t.term_id.trim().is_empty())
            .map(|t| (t.term_id.trim().to_string(), t))
            .collect();

        let first_object = non_blank(data.first_object.as_deref())
            .or_else(|| steps.iter().find_map(|s| s.object_id.clone()));

        debug!(
            steps = steps.len(),
            issues = issues.len(),
            "Narrative built"
        );

        Self {
            title: non_blank(data.title.as_deref()),
            first_object,
            steps,
            objects,
            glossary,
            issues,
        }
    }

    /// Parse a story document from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let data: StoryData = serde_json::from_str(json)?;
        Ok(Self::from_story(data))
    }

    /// Load a story document from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Check that the narrative can drive a session
    pub fn validate(&self) -> Result<()> {
        if self.steps.is_empty() {
            return Err(Error::EmptyStory);
        }
        if self.first_object.is_none() {
            return Err(Error::MissingFirstObject);
        }
        Ok(())
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn first_object(&self) -> Option<&str> {
        self.first_object.as_deref()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Find a step by the content id panel triggers carry
    pub fn step_by_content_id(&self, content_id: &str) -> Option<&Step> {
        let wanted = content_id.trim();
        self.steps.iter().find(|s| s.content_id == wanted)
    }

    pub fn object(&self, object_id: &str) -> Option<&ObjectRecord> {
        self.objects.get(object_id)
    }

    pub fn glossary_term(&self, term_id: &str) -> Option<&GlossaryTerm> {
        self.glossary.get(term_id.trim())
    }

    pub fn issues(&self) -> &[StoryIssue] {
        &self.issues
    }

    /// Display title for an object, falling back to its id
    pub fn object_title<'a>(&'a self, object_id: &'a str) -> &'a str {
        self.objects
            .get(object_id)
            .and_then(|o| o.title.as_deref())
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(object_id)
    }
}

fn build_step(index: usize, record: StepRecord, issues: &mut Vec<StoryIssue>) -> Step {
    let target = match parse_target(
        record.x.as_ref(),
        record.y.as_ref(),
        record.zoom.as_ref(),
        record.region.as_deref(),
    ) {
        Ok(target) => target,
        Err(problem) => {
            warn!(step = index, %problem, "Malformed camera target, step keeps current framing");
            issues.push(StoryIssue {
                step_index: index,
                problem,
            });
            None
        }
    };

    let layer1 = layer(
        record.layer1_title.as_deref(),
        record.layer1_text.as_deref(),
        record.layer1_media.as_deref(),
        None,
    );
    let layer2 = layer(
        record.layer2_title.as_deref(),
        record.layer2_text.as_deref(),
        record.layer2_media.as_deref(),
        record.layer2_button.as_deref(),
    );

    Step {
        index,
        content_id: record
            .step
            .as_ref()
            .and_then(scalar_id)
            .unwrap_or_else(|| index.to_string()),
        object_id: non_blank(record.object.as_deref()),
        question: non_blank(record.question.as_deref()),
        answer: non_blank(record.answer.as_deref()),
        target,
        layer1,
        layer2,
    }
}

fn layer(
    title: Option<&str>,
    text: Option<&str>,
    media: Option<&str>,
    button: Option<&str>,
) -> Option<LayerContent> {
    let content = LayerContent {
        title: non_blank(title),
        text: non_blank(text),
        media_url: non_blank(media),
        button_label: non_blank(button),
    };
    if content.is_empty() {
        None
    } else {
        Some(content)
    }
}
