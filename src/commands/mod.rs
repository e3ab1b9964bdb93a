use clap::ValueEnum;

mod backup_cmd;
mod config_cmd;
mod record_cmd;

pub use backup_cmd::BackupCommand;
pub use config_cmd::ConfigCommand;
pub use record_cmd::RecordCommand;

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
