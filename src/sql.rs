//! CRUD statement generation for a single-table model.
//!
//! Statements come back as text with named placeholders (`:name`) plus the
//! placeholder names in order; executing them is up to whatever database
//! layer the application uses.
//!
//! ```rust
//! use lmvc::sql::{Field, Kind, SqlBuilder};
//!
//! let users = SqlBuilder::new(
//!     [
//!         Field::new("id", Kind::Int).primary().auto_increment(),
//!         Field::new("name", Kind::String).not_null().unique(),
//!     ],
//!     "UserAccount",
//! );
//!
//! assert_eq!(
//!     users.create_table().sql,
//!     "CREATE TABLE user_account (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL UNIQUE)"
//! );
//! assert_eq!(
//!     users.select(Some("byName"), None).unwrap().sql,
//!     "SELECT * FROM user_account WHERE name = :name"
//! );
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::case::underscored;
use crate::error::Error;

/// Column kinds, plus the relation kinds that are declared on a model but
/// do not produce a column.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    String,
    Int,
    Datetime,
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

impl Kind {
    pub fn is_relation(self) -> bool {
        matches!(self, Self::OneToOne | Self::OneToMany | Self::ManyToOne | Self::ManyToMany)
    }

    fn sql_type(self) -> &'static str {
        match self {
            Self::Int => "INTEGER",
            _ => "TEXT",
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Increment {
    Auto,
}

/// One declared field of a model.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: Kind,
    #[serde(default)]
    pub notnull: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub increment: Option<Increment>,
}

impl Field {
    pub fn new(name: &str, kind: Kind) -> Self {
        Self {
            name: name.to_owned(),
            kind,
            notnull: false,
            unique: false,
            primary: false,
            increment: None,
        }
    }

    pub fn not_null(mut self) -> Self { self.notnull = true; self }
    pub fn unique(mut self) -> Self { self.unique = true; self }
    pub fn primary(mut self) -> Self { self.primary = true; self }
    pub fn auto_increment(mut self) -> Self { self.increment = Some(Increment::Auto); self }

    fn is_auto(&self) -> bool {
        self.increment == Some(Increment::Auto)
    }

    fn column_definition(&self) -> String {
        let mut def = format!("{} {}", self.name, self.kind.sql_type());
        if self.notnull { def.push_str(" NOT NULL"); }
        if self.unique { def.push_str(" UNIQUE"); }
        if self.primary { def.push_str(" PRIMARY KEY"); }
        if self.is_auto() { def.push_str(" AUTOINCREMENT"); }
        def
    }
}

/// SQL text plus its placeholder names, in order of appearance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<String>,
}

impl Statement {
    fn new(sql: String, params: Vec<String>) -> Self {
        Self { sql, params }
    }

    /// Picks this statement's parameter values out of `entity`, which must
    /// serialize to an object holding every placeholder name.
    pub fn bind(&self, entity: &impl Serialize) -> Result<serde_json::Map<String, serde_json::Value>, Error> {
        let serde_json::Value::Object(values) = serde_json::to_value(entity)? else {
            return Err(Error::Sql("entity must serialize to an object".to_owned()));
        };
        self.params
            .iter()
            .map(|name| {
                values
                    .get(name)
                    .map(|v| (name.clone(), v.clone()))
                    .ok_or_else(|| Error::Sql(format!("entity has no value for `{name}`")))
            })
            .collect()
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Statement generator for one model/table.
#[derive(Clone, Debug)]
pub struct SqlBuilder {
    table: String,
    fields: Vec<Field>,
    relations: Vec<Field>,
}

impl SqlBuilder {
    /// `type_name` (e.g. `UserAccount`) names the table (`user_account`).
    pub fn new(model: impl IntoIterator<Item = Field>, type_name: &str) -> Self {
        let (relations, fields) = model.into_iter().partition(|f| f.kind.is_relation());
        Self { table: underscored(type_name), fields, relations }
    }

    /// Model declared as a JSON array of fields:
    /// `[{"name": "id", "type": "int", "primary": true, "increment": "auto"}]`.
    pub fn from_json(json: &str, type_name: &str) -> Result<Self, Error> {
        let fields: Vec<Field> = serde_json::from_str(json)?;
        Ok(Self::new(fields, type_name))
    }

    pub fn table(&self) -> &str { &self.table }
    pub fn fields(&self) -> &[Field] { &self.fields }
    pub fn relations(&self) -> &[Field] { &self.relations }

    pub fn create_table(&self) -> Statement {
        let columns: Vec<String> = self.fields.iter().map(Field::column_definition).collect();
        Statement::new(
            format!("CREATE TABLE {} ({})", self.table, columns.join(", ")),
            Vec::new(),
        )
    }

    pub fn drop_table(&self) -> Statement {
        Statement::new(format!("DROP TABLE {}", self.table), Vec::new())
    }

    /// Auto-increment columns are left to the database.
    pub fn insert(&self) -> Statement {
        let names = self.writable();
        let placeholders: Vec<String> = names.iter().map(|n| format!(":{n}")).collect();
        Statement::new(
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                self.table,
                names.join(", "),
                placeholders.join(", ")
            ),
            names,
        )
    }

    pub fn update(&self) -> Statement {
        let names = self.writable();
        let assignments: Vec<String> = names.iter().map(|n| format!("{n} = :{n}")).collect();
        let mut params = names;
        params.push("id".to_owned());
        Statement::new(
            format!("UPDATE {} SET {} WHERE id = :id", self.table, assignments.join(", ")),
            params,
        )
    }

    pub fn delete(&self) -> Statement {
        Statement::new(
            format!("DELETE FROM {} WHERE id = :id", self.table),
            vec!["id".to_owned()],
        )
    }

    /// `SELECT *` with an optional condition and ordering.
    ///
    /// A condition named `by<Field>[And|Or<Field>…]` (`byNameAndAge`) expands
    /// to `name = :name AND age = :age`; every field must be a column. Any
    /// other condition is used as raw `WHERE` text.
    pub fn select(&self, query: Option<&str>, order: Option<&str>) -> Result<Statement, Error> {
        let mut sql = format!("SELECT * FROM {}", self.table);
        let mut params = Vec::new();

        if let Some(query) = query {
            let condition = match self.expand_by(query)? {
                Some((condition, names)) => {
                    params = names;
                    condition
                }
                None => query.to_owned(),
            };
            sql.push_str(" WHERE ");
            sql.push_str(&condition);
        }
        if let Some(order) = order {
            sql.push_str(" ORDER BY ");
            sql.push_str(order);
        }
        Ok(Statement::new(sql, params))
    }

    fn expand_by(&self, query: &str) -> Result<Option<(String, Vec<String>)>, Error> {
        let underscored = underscored(query);
        let mut words = underscored.split('_');
        if words.next() != Some("by") {
            return Ok(None);
        }

        let words: Vec<&str> = words.collect();
        if words.is_empty() || words.len() % 2 == 0 {
            return Err(Error::Sql(format!("malformed finder `{query}`")));
        }

        let mut condition = String::new();
        let mut names = Vec::new();
        for (i, word) in words.iter().enumerate() {
            if i % 2 == 0 {
                if !self.fields.iter().any(|f| f.name == *word) {
                    return Err(Error::Sql(format!("`{}` has no column `{word}`", self.table)));
                }
                condition.push_str(&format!("{word} = :{word}"));
                names.push((*word).to_owned());
            } else {
                match *word {
                    "and" | "or" => condition.push_str(&format!(" {} ", word.to_uppercase())),
                    other => {
                        return Err(Error::Sql(format!("unknown connector `{other}` in `{query}`")));
                    }
                }
            }
        }
        Ok(Some((condition, names)))
    }

    fn writable(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|f| !f.is_auto())
            .map(|f| f.name.clone())
            .collect()
    }
}
