use clap::Subcommand;
use prajna_core::{CoreError, Database};

use super::print_json;

#[derive(Subcommand)]
pub enum TagAction {
    /// Create a tag
    Add {
        /// Tag name (trimmed, at most 50 characters)
        name: String,
    },
    /// List tags by name
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Rename a tag
    Rename {
        /// Tag ID
        id: i64,
        /// New name
        name: String,
    },
    /// Delete a tag. Sessions keep their other tags
    Delete {
        /// Tag ID
        id: i64,
    },
}

pub fn run(action: TagAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        TagAction::Add { name } => {
            let id = db.create_tag(&name)?;
            let tag = db
                .get_tag(id)?
                .ok_or(CoreError::NotFound { entity: "tag", id })?;
            print_json(&tag)?;
        }
        TagAction::List { json } => {
            let tags = db.list_tags()?;
            if json {
                print_json(&tags)?;
            } else if tags.is_empty() {
                println!("no tags");
            } else {
                for tag in &tags {
                    println!("#{:<5} {}", tag.id, tag.name);
                }
            }
        }
        TagAction::Rename { id, name } => {
            db.rename_tag(id, &name)?;
            println!("tag renamed: {id}");
        }
        TagAction::Delete { id } => {
            db.delete_tag(id)?;
            println!("tag deleted: {id}");
        }
    }
    Ok(())
}
