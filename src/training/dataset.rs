//! Question-answering dataset handling.
//!
//! Reads SQuAD-format JSON (articles → paragraphs → question/answer pairs)
//! and flattens it into `(question, context)` examples. The fine-tuning
//! demo only ever consumes a small slice of the training split.

use std::path::Path;

use hf_hub::{api::sync::Api, Repo, RepoType};
use serde::Deserialize;

use crate::error::{Error, Result};

/// HuggingFace dataset repo the demo pulls from.
pub const DEFAULT_DATASET_REPO: &str = "rajpurkar/squad";
/// Training-split file inside the dataset repo.
pub const DEFAULT_DATASET_FILE: &str = "train-v1.1.json";

/// One question paired with its context paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QaExample {
    pub question: String,
    pub context: String,
}

impl QaExample {
    /// Renders the example as the single training string the model sees.
    pub fn render(&self) -> String {
        format!("Question: {} Context: {}", self.question, self.context)
    }
}

#[derive(Debug, Deserialize)]
struct SquadFile {
    data: Vec<SquadArticle>,
}

#[derive(Debug, Deserialize)]
struct SquadArticle {
    paragraphs: Vec<SquadParagraph>,
}

#[derive(Debug, Deserialize)]
struct SquadParagraph {
    context: String,
    qas: Vec<SquadQa>,
}

#[derive(Debug, Deserialize)]
struct SquadQa {
    question: String,
}

/// A flattened QA dataset.
#[derive(Debug, Clone, Default)]
pub struct QaDataset {
    examples: Vec<QaExample>,
}

impl QaDataset {
    /// Parses SQuAD-format JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: SquadFile =
            serde_json::from_str(json).map_err(|e| Error::Dataset(format!("bad SQuAD JSON: {e}")))?;

        let examples = file
            .data
            .into_iter()
            .flat_map(|article| article.paragraphs)
            .flat_map(|paragraph| {
                let context = paragraph.context;
                paragraph.qas.into_iter().map(move |qa| QaExample {
                    question: qa.question,
                    context: context.clone(),
                })
            })
            .collect();

        Ok(Self { examples })
    }

    /// Reads SQuAD-format JSON from a local file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Dataset(format!("failed to read {}: {e}", path.display())))?;
        Self::from_json_str(&content)
    }

    /// Downloads a SQuAD-format JSON file from a HuggingFace dataset repo.
    pub fn download(repo_id: &str, filename: &str) -> Result<Self> {
        let api =
            Api::new().map_err(|e| Error::Dataset(format!("failed to create HF API: {e}")))?;
        let repo = api.repo(Repo::new(repo_id.to_string(), RepoType::Dataset));

        let path = repo
            .get(filename)
            .map_err(|e| Error::Dataset(format!("failed to download {filename}: {e}")))?;

        Self::from_file(&path)
    }

    /// Keeps only the first `n` examples.
    pub fn take(mut self, n: usize) -> Self {
        self.examples.truncate(n);
        self
    }

    /// Returns the examples.
    pub fn examples(&self) -> &[QaExample] {
        &self.examples
    }

    /// Number of examples.
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    /// True when the dataset holds no examples.
    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "data": [
            {
                "title": "Example",
                "paragraphs": [
                    {
                        "context": "The sky is blue.",
                        "qas": [
                            {"id": "1", "question": "What color is the sky?"},
                            {"id": "2", "question": "What is blue?"}
                        ]
                    },
                    {
                        "context": "Water is wet.",
                        "qas": [
                            {"id": "3", "question": "Is water wet?"}
                        ]
                    }
                ]
            }
        ]
    }"#;

    #[test]
    fn flattens_paragraphs_into_examples() {
        let dataset = QaDataset::from_json_str(FIXTURE).unwrap();

        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.examples()[0].question, "What color is the sky?");
        assert_eq!(dataset.examples()[0].context, "The sky is blue.");
        assert_eq!(dataset.examples()[2].context, "Water is wet.");
    }

    #[test]
    fn render_joins_question_and_context() {
        let example = QaExample {
            question: "Is water wet?".into(),
            context: "Water is wet.".into(),
        };
        assert_eq!(
            example.render(),
            "Question: Is water wet? Context: Water is wet."
        );
    }

    #[test]
    fn take_truncates() {
        let dataset = QaDataset::from_json_str(FIXTURE).unwrap().take(2);
        assert_eq!(dataset.len(), 2);
    }

    #[test]
    fn bad_json_is_a_dataset_error() {
        let err = QaDataset::from_json_str("{\"data\": 3}").unwrap_err();
        assert!(matches!(err, Error::Dataset(_)));
    }
}
