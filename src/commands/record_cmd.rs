use clap::{Args, Subcommand};
use serde_json::Value;
use uuid::Uuid;

use super::OutputFormat;
use crate::models::{Collection, KeyedRecord, Record, SETTINGS_KEY};
use crate::store::DocumentStore;

#[derive(Args)]
pub struct RecordCommand {
    #[command(subcommand)]
    pub command: RecordSubcommand,
}

#[derive(Subcommand)]
pub enum RecordSubcommand {
    /// List all records in a collection
    List {
        /// Collection (students, invoices, monthly_attendance, settings)
        collection: Collection,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a single record
    Show {
        /// Collection (students, invoices, monthly_attendance, settings)
        collection: Collection,

        /// Record key
        key: String,
    },

    /// Create or update a record from a JSON object
    Put {
        /// Collection (students, invoices, monthly_attendance, settings)
        collection: Collection,

        /// Record key (generated when omitted; ignored for settings)
        key: Option<String>,

        /// Record fields as a JSON object
        #[arg(long)]
        json: String,

        /// Replace the stored record instead of merging into it
        #[arg(long)]
        replace: bool,
    },

    /// Delete a record
    Delete {
        /// Collection (students, invoices, monthly_attendance, settings)
        collection: Collection,

        /// Record key
        key: String,
    },
}

impl RecordCommand {
    pub async fn run<S: DocumentStore>(
        &self,
        store: &S,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            RecordSubcommand::List { collection, format } => {
                let records = store.list_all(*collection).await?;

                match format {
                    OutputFormat::Json => {
                        let values: Vec<Record> = records
                            .into_iter()
                            .map(|(key, record)| KeyedRecord::new(key, record).into_snapshot())
                            .collect();
                        println!("{}", serde_json::to_string_pretty(&values)?);
                    }
                    OutputFormat::Text => {
                        if records.is_empty() {
                            println!("No records found in {}", collection);
                            return Ok(());
                        }
                        println!("{:<36}  FIELDS", "KEY");
                        println!("{}", "-".repeat(80));
                        for (key, record) in &records {
                            let fields: Vec<&str> =
                                record.fields().map(|(name, _)| name.as_str()).collect();
                            println!("{:<36}  {}", key, fields.join(", "));
                        }
                        println!("\nTotal: {} record(s)", records.len());
                    }
                }
                Ok(())
            }

            RecordSubcommand::Show { collection, key } => {
                match store.get(*collection, key).await? {
                    Some(record) => {
                        println!("{}", serde_json::to_string_pretty(&record)?);
                        Ok(())
                    }
                    None => Err(format!("Record not found: {}/{}", collection, key).into()),
                }
            }

            RecordSubcommand::Put {
                collection,
                key,
                json,
                replace,
            } => {
                let record = parse_fields(json)?;
                let key = resolve_key(*collection, key.as_deref());

                store.put_merge(*collection, &key, record, !replace).await?;
                println!("Saved {}/{}", collection, key);
                Ok(())
            }

            RecordSubcommand::Delete { collection, key } => {
                store.delete(*collection, key).await?;
                println!("Deleted {}/{}", collection, key);
                Ok(())
            }
        }
    }
}

/// Parses `--json` input, dropping any inlined `id` (keys are positional).
fn parse_fields(json: &str) -> Result<Record, Box<dyn std::error::Error>> {
    let value: Value = serde_json::from_str(json)?;
    Ok(Record::from_value(value)?.without_id())
}

fn resolve_key(collection: Collection, key: Option<&str>) -> String {
    if collection.is_singleton() {
        return SETTINGS_KEY.to_string();
    }
    match key {
        Some(key) if !key.trim().is_empty() => key.trim().to_string(),
        _ => Uuid::new_v4().to_string(),
    }
}
