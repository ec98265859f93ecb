//! Category management commands.

use std::io::Write;

use anyhow::Result;
use clap::Args;

use tally_core::{CategoryPatch, NewCategory};
use tally_db::Database;

/// Arguments for `category add`.
#[derive(Debug, Args)]
pub struct AddArgs {
    /// Unique, immutable key other records reference (e.g. "work").
    pub key: String,
    /// Display name.
    pub name: String,
    /// Display color hint (e.g. "#ff0000").
    #[arg(long)]
    pub color: Option<String>,
}

/// Arguments for `category update`.
#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Category id, as shown by `category list`.
    pub id: i64,
    /// New display name.
    #[arg(long)]
    pub name: Option<String>,
    /// New display color.
    #[arg(long, conflicts_with = "clear_color")]
    pub color: Option<String>,
    /// Remove the color hint.
    #[arg(long)]
    pub clear_color: bool,
    /// Reactivate the category.
    #[arg(long, conflicts_with = "deactivate")]
    pub activate: bool,
    /// Deactivate the category.
    #[arg(long)]
    pub deactivate: bool,
}

impl UpdateArgs {
    fn to_patch(&self) -> CategoryPatch {
        let color = if self.clear_color {
            Some(None)
        } else {
            self.color.clone().map(Some)
        };
        let is_active = if self.activate {
            Some(true)
        } else if self.deactivate {
            Some(false)
        } else {
            None
        };
        CategoryPatch {
            name: self.name.clone(),
            color,
            is_active,
        }
    }
}

pub fn add<W: Write>(writer: &mut W, db: &Database, args: &AddArgs) -> Result<()> {
    let category = db.create_category(&NewCategory {
        key: args.key.clone(),
        name: args.name.clone(),
        color: args.color.clone(),
    })?;
    writeln!(
        writer,
        "Created category {} '{}' (id {})",
        category.key, category.name, category.id
    )?;
    Ok(())
}

pub fn list<W: Write>(writer: &mut W, db: &Database, all: bool, json: bool) -> Result<()> {
    let categories = db.list_categories(!all)?;
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&categories)?)?;
        return Ok(());
    }
    if categories.is_empty() {
        writeln!(writer, "No categories.")?;
        return Ok(());
    }
    for category in categories {
        let state = if category.is_active { "" } else { " (inactive)" };
        let color = category.color.as_deref().unwrap_or("-");
        writeln!(
            writer,
            "{} {} '{}' {}{}",
            category.id, category.key, category.name, color, state
        )?;
    }
    Ok(())
}

pub fn update<W: Write>(writer: &mut W, db: &Database, args: &UpdateArgs) -> Result<()> {
    let category = db.update_category(args.id, &args.to_patch())?;
    writeln!(
        writer,
        "Updated category {} '{}' (id {})",
        category.key, category.name, category.id
    )?;
    Ok(())
}

pub fn remove<W: Write>(writer: &mut W, db: &Database, id: i64) -> Result<()> {
    db.deactivate_category(id)?;
    writeln!(writer, "Deactivated category {id}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;

    fn output_of(buffer: Vec<u8>) -> String {
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn add_and_list_categories() {
        let db = Database::open_in_memory().unwrap();
        let mut output = Vec::new();

        add(
            &mut output,
            &db,
            &AddArgs {
                key: "work".to_string(),
                name: "Work".to_string(),
                color: Some("#f00".to_string()),
            },
        )
        .unwrap();
        add(
            &mut output,
            &db,
            &AddArgs {
                key: "rest".to_string(),
                name: "Rest".to_string(),
                color: None,
            },
        )
        .unwrap();
        list(&mut output, &db, false, false).unwrap();

        assert_snapshot!(output_of(output), @r"
        Created category work 'Work' (id 1)
        Created category rest 'Rest' (id 2)
        1 work 'Work' #f00
        2 rest 'Rest' -
        ");
    }

    #[test]
    fn add_duplicate_key_fails() {
        let db = Database::open_in_memory().unwrap();
        let mut output = Vec::new();
        let args = AddArgs {
            key: "work".to_string(),
            name: "Work".to_string(),
            color: None,
        };

        add(&mut output, &db, &args).unwrap();
        let err = add(&mut output, &db, &args).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn list_hides_deactivated_unless_all() {
        let db = Database::open_in_memory().unwrap();
        let mut output = Vec::new();

        add(
            &mut output,
            &db,
            &AddArgs {
                key: "work".to_string(),
                name: "Work".to_string(),
                color: None,
            },
        )
        .unwrap();
        remove(&mut output, &db, 1).unwrap();

        let mut active_only = Vec::new();
        list(&mut active_only, &db, false, false).unwrap();
        assert_snapshot!(output_of(active_only), @"No categories.");

        let mut everything = Vec::new();
        list(&mut everything, &db, true, false).unwrap();
        assert_snapshot!(output_of(everything), @"1 work 'Work' - (inactive)");
    }

    #[test]
    fn update_builds_partial_patch() {
        let db = Database::open_in_memory().unwrap();
        let mut output = Vec::new();
        add(
            &mut output,
            &db,
            &AddArgs {
                key: "work".to_string(),
                name: "Work".to_string(),
                color: Some("#f00".to_string()),
            },
        )
        .unwrap();

        update(
            &mut output,
            &db,
            &UpdateArgs {
                id: 1,
                name: Some("Deep Work".to_string()),
                color: None,
                clear_color: true,
                activate: false,
                deactivate: false,
            },
        )
        .unwrap();

        let category = db.category_by_id(1).unwrap().unwrap();
        assert_eq!(category.name, "Deep Work");
        assert_eq!(category.color, None);
        assert!(category.is_active);
    }

    #[test]
    fn update_missing_category_fails() {
        let db = Database::open_in_memory().unwrap();
        let mut output = Vec::new();
        let err = update(
            &mut output,
            &db,
            &UpdateArgs {
                id: 42,
                name: None,
                color: None,
                clear_color: false,
                activate: false,
                deactivate: false,
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
