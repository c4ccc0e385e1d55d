//! Shared entities and fixtures.

use orm_core::config::SessionConfig;
use orm_core::{Entity, OneToMany, OneToOne, Session};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Author {
    pub id: Option<u64>,
    pub name: String,
    #[serde(skip)]
    pub posts: Vec<Post>,
}

impl Entity for Author {
    const TABLE: &'static str = "author";
    const UNIQUE_COLUMNS: &'static [&'static str] = &["name"];

    fn id(&self) -> Option<u64> {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = Some(id);
    }
}

impl OneToMany<Post> for Author {
    const MAPPED_BY: &'static str = "author_id";

    fn set_children(&mut self, children: Vec<Post>) {
        self.posts = children;
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Option<u64>,
    pub author_id: Option<u64>,
    pub title: String,
}

impl Entity for Post {
    const TABLE: &'static str = "post";

    fn id(&self) -> Option<u64> {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = Some(id);
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Person {
    pub id: Option<u64>,
    pub name: String,
    pub passport_id: Option<u64>,
    #[serde(skip)]
    pub passport: Option<Passport>,
}

impl Entity for Person {
    const TABLE: &'static str = "person";

    fn id(&self) -> Option<u64> {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = Some(id);
    }
}

impl OneToOne<Passport> for Person {
    const JOIN_COLUMN: &'static str = "passport_id";

    fn set_related(&mut self, related: Passport) {
        self.passport = Some(related);
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Passport {
    pub id: Option<u64>,
    pub number: String,
}

impl Entity for Passport {
    const TABLE: &'static str = "passport";

    fn id(&self) -> Option<u64> {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = Some(id);
    }
}

/// Session with every test table created.
pub fn session() -> Session {
    session_with(SessionConfig::default())
}

pub fn session_with(config: SessionConfig) -> Session {
    let session = Session::in_memory(config);
    session.create_schema::<Author>().unwrap();
    session.create_schema::<Post>().unwrap();
    session.create_schema::<Person>().unwrap();
    session.create_schema::<Passport>().unwrap();
    session
}

/// Two authors: "ann" with posts a1, a2 and "bob" with none.
pub fn seed_authors(session: &Session) {
    let mut ann = Author {
        name: "ann".to_string(),
        ..Default::default()
    };
    let mut bob = Author {
        name: "bob".to_string(),
        ..Default::default()
    };
    session.persist(&mut ann).unwrap();
    session.persist(&mut bob).unwrap();
    for title in ["a1", "a2"] {
        let mut post = Post {
            author_id: ann.id,
            title: title.to_string(),
            ..Default::default()
        };
        session.persist(&mut post).unwrap();
    }
}

/// Three people, the last one without a passport.
pub fn seed_people(session: &Session) {
    for (name, number) in [("p1", Some("N1")), ("p2", Some("N2")), ("p3", None)] {
        let passport_id = match number {
            Some(number) => {
                let mut passport = Passport {
                    number: number.to_string(),
                    ..Default::default()
                };
                Some(session.persist(&mut passport).unwrap())
            }
            None => None,
        };
        let mut person = Person {
            name: name.to_string(),
            passport_id,
            ..Default::default()
        };
        session.persist(&mut person).unwrap();
    }
}
