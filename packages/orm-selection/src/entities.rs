//! Entity mappings for users, biographies and the question catalog.

use std::sync::Arc;

use orm_core::error::ListenerError;
use orm_core::{
    Entity, EventListener, LifecycleEvent, LifecycleEventArgs, OneToMany, OneToOne, OrmError,
    Session,
};
use serde::{Deserialize, Serialize};

use crate::error::SelectionError;

/// Maximum length of [`User::name`].
pub const USER_NAME_MAX: usize = 15;
/// Maximum length of field aliases and labels and of choice labels.
pub const LABEL_MAX: usize = 100;

/// A user owning exactly one biography.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Option<u64>,
    pub name: String,
    pub biography_id: Option<u64>,
    #[serde(skip)]
    pub biography: Option<Biography>,
}

impl Entity for User {
    const TABLE: &'static str = "user";

    fn id(&self) -> Option<u64> {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = Some(id);
    }
}

impl OneToOne<Biography> for User {
    const JOIN_COLUMN: &'static str = "biography_id";

    fn set_related(&mut self, related: Biography) {
        self.biography = Some(related);
    }
}

/// Biography with its raw selection payload.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Biography {
    pub id: Option<u64>,
    pub content: Option<String>,
    /// Selections resolved after load; `None` until resolution succeeds.
    #[serde(skip)]
    pub field_list: Option<Vec<FieldSelection>>,
}

impl Entity for Biography {
    const TABLE: &'static str = "biography";

    fn id(&self) -> Option<u64> {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = Some(id);
    }
}

/// A question in the catalog.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct BiographyField {
    pub id: Option<u64>,
    pub alias: String,
    pub label: String,
    #[serde(skip)]
    pub choice_list: Vec<BiographyFieldChoice>,
}

impl Entity for BiographyField {
    const TABLE: &'static str = "biography_field";
    const UNIQUE_COLUMNS: &'static [&'static str] = &["alias"];

    fn id(&self) -> Option<u64> {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = Some(id);
    }
}

impl OneToMany<BiographyFieldChoice> for BiographyField {
    const MAPPED_BY: &'static str = "field_id";

    fn set_children(&mut self, children: Vec<BiographyFieldChoice>) {
        self.choice_list = children;
    }
}

/// A possible answer to one field.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiographyFieldChoice {
    pub id: Option<u64>,
    pub field_id: Option<u64>,
    pub label: String,
}

impl Entity for BiographyFieldChoice {
    const TABLE: &'static str = "biography_field_choice";
    const UNIQUE_COLUMNS: &'static [&'static str] = &["label"];

    fn id(&self) -> Option<u64> {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = Some(id);
    }
}

/// A field paired with the subset of its choices that were selected.
#[derive(Debug, Clone)]
pub struct FieldSelection {
    pub field: BiographyField,
    pub choice_list: Vec<BiographyFieldChoice>,
}

impl FieldSelection {
    /// Id of the selected field.
    pub fn field_id(&self) -> Option<u64> {
        self.field.id
    }

    /// Ids of the matched choices, in the field's choice order.
    pub fn choice_ids(&self) -> Vec<u64> {
        self.choice_list.iter().filter_map(|c| c.id).collect()
    }
}

/// Creates the four tables.
pub fn create_schema(session: &Session) -> Result<(), OrmError> {
    session.create_schema::<User>()?;
    session.create_schema::<Biography>()?;
    session.create_schema::<BiographyField>()?;
    session.create_schema::<BiographyFieldChoice>()?;
    Ok(())
}

/// Drops the four tables.
pub fn drop_schema(session: &Session) -> Result<(), OrmError> {
    session.drop_schema::<User>()?;
    session.drop_schema::<Biography>()?;
    session.drop_schema::<BiographyField>()?;
    session.drop_schema::<BiographyFieldChoice>()?;
    Ok(())
}

/// Creates the tables and registers the column length checks.
pub fn install(session: &Session) -> Result<(), OrmError> {
    create_schema(session)?;
    session
        .event_manager()
        .add_event_listener(&[LifecycleEvent::PrePersist], Arc::new(LengthGuard));
    Ok(())
}

/// Rejects inserts whose string columns exceed their declared length.
#[derive(Debug, Default)]
pub struct LengthGuard;

impl EventListener for LengthGuard {
    fn pre_persist(&self, args: &mut LifecycleEventArgs<'_>) -> Result<(), ListenerError> {
        let entity = args.entity();
        if let Some(user) = entity.downcast_ref::<User>() {
            check_length(User::TABLE, "name", &user.name, USER_NAME_MAX)?;
        } else if let Some(field) = entity.downcast_ref::<BiographyField>() {
            check_length(BiographyField::TABLE, "alias", &field.alias, LABEL_MAX)?;
            check_length(BiographyField::TABLE, "label", &field.label, LABEL_MAX)?;
        } else if let Some(choice) = entity.downcast_ref::<BiographyFieldChoice>() {
            check_length(BiographyFieldChoice::TABLE, "label", &choice.label, LABEL_MAX)?;
        }
        Ok(())
    }
}

fn check_length(
    table: &'static str,
    column: &'static str,
    value: &str,
    max: usize,
) -> Result<(), SelectionError> {
    let actual = value.chars().count();
    if actual > max {
        return Err(SelectionError::ValueTooLong {
            table,
            column,
            max,
            actual,
        });
    }
    Ok(())
}
