//! Seed documents for users, biographies and the field catalog.

use std::path::Path;

use orm_core::Session;
use serde::{Deserialize, Serialize};

use crate::entities::{Biography, BiographyField, BiographyFieldChoice, User};
use crate::error::SelectionError;

/// Seed data in insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureDocument {
    #[serde(default)]
    pub fields: Vec<FieldFixture>,
    #[serde(default)]
    pub users: Vec<UserFixture>,
}

/// A catalog field and its choice labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldFixture {
    pub alias: String,
    pub label: String,
    #[serde(default)]
    pub choices: Vec<String>,
}

/// A user and the raw payload of their biography.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserFixture {
    pub name: String,
    #[serde(default)]
    pub biography: Option<String>,
}

/// Ids assigned while seeding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeededIds {
    pub users: Vec<u64>,
    pub biographies: Vec<u64>,
    pub fields: Vec<u64>,
    pub choices: Vec<u64>,
}

impl FixtureDocument {
    /// Reads a JSON fixture file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SelectionError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SelectionError::Fixture(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    /// Parses a JSON fixture document.
    pub fn from_json(json: &str) -> Result<Self, SelectionError> {
        serde_json::from_str(json)
            .map_err(|e| SelectionError::Fixture(format!("Invalid fixture: {}", e)))
    }

    /// Two users, one picking answers from two questions, one from a single question.
    pub fn regression() -> Self {
        Self {
            fields: vec![
                FieldFixture {
                    alias: "question_1".to_string(),
                    label: "Question 1".to_string(),
                    choices: (1..=4).map(|i| format!("Answer 1.{i}")).collect(),
                },
                FieldFixture {
                    alias: "question_2".to_string(),
                    label: "Question 2".to_string(),
                    choices: (1..=2).map(|i| format!("Answer 2.{i}")).collect(),
                },
            ],
            users: vec![
                UserFixture {
                    name: "Gblanco".to_string(),
                    biography: Some(
                        r#"[{"field": 1, "choiceList": [1,3]}, {"field": 2, "choiceList": [5]}]"#
                            .to_string(),
                    ),
                },
                UserFixture {
                    name: "Beberlei".to_string(),
                    biography: Some(r#"[{"field": 1, "choiceList": [1,2,3,4]}]"#.to_string()),
                },
            ],
        }
    }
}

/// Persists the catalog first, then each biography followed by its user.
pub fn load_fixture(session: &Session, doc: &FixtureDocument) -> Result<SeededIds, SelectionError> {
    let mut ids = SeededIds::default();

    for field_fixture in &doc.fields {
        let mut field = BiographyField {
            alias: field_fixture.alias.clone(),
            label: field_fixture.label.clone(),
            ..Default::default()
        };
        let field_id = session.persist(&mut field)?;
        ids.fields.push(field_id);

        for label in &field_fixture.choices {
            let mut choice = BiographyFieldChoice {
                field_id: Some(field_id),
                label: label.clone(),
                ..Default::default()
            };
            ids.choices.push(session.persist(&mut choice)?);
        }
    }

    for user_fixture in &doc.users {
        let mut biography = Biography {
            content: user_fixture.biography.clone(),
            ..Default::default()
        };
        let biography_id = session.persist(&mut biography)?;
        ids.biographies.push(biography_id);

        let mut user = User {
            name: user_fixture.name.clone(),
            biography_id: Some(biography_id),
            ..Default::default()
        };
        ids.users.push(session.persist(&mut user)?);
    }

    tracing::debug!(
        "Seeded {} field(s), {} choice(s), {} user(s)",
        ids.fields.len(),
        ids.choices.len(),
        ids.users.len()
    );
    Ok(ids)
}
