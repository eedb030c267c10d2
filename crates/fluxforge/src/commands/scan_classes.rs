//! Scan class command handlers.

use tabled::Tabled;

use fluxforge_api::types::{ScanClass, ScanClassPayload};
use fluxforge_core::Portal;

use crate::cli::{GlobalOpts, ScanClassesArgs, ScanClassesCommand};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct ScanClassRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Interval")]
    interval: String,
    #[tabled(rename = "Default")]
    default: String,
    #[tabled(rename = "Tags")]
    tags: i64,
    #[tabled(rename = "Description")]
    description: String,
}

impl From<&ScanClass> for ScanClassRow {
    fn from(sc: &ScanClass) -> Self {
        Self {
            id: sc.id,
            name: sc.name.clone(),
            interval: format!("{} ms", sc.interval_ms),
            default: if sc.is_default { "*" } else { "" }.into(),
            tags: sc.tag_count,
            description: sc.description.clone(),
        }
    }
}

pub async fn handle(
    portal: &Portal,
    args: ScanClassesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let client = portal.client();

    match args.command {
        ScanClassesCommand::List => {
            let classes = client.list_scan_classes().await?;
            let out = output::render_list(
                &global.output,
                &classes,
                |sc| ScanClassRow::from(sc),
                |sc| sc.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ScanClassesCommand::Create {
            name,
            interval_ms,
            description,
            default,
        } => {
            let created = client
                .create_scan_class(&ScanClassPayload {
                    name,
                    interval_ms,
                    description,
                })
                .await?;

            if default {
                client.set_default_scan_class(created.id).await?;
            }

            if !global.quiet {
                eprintln!(
                    "Scan class '{}' created (id {}, {} ms)",
                    created.name, created.id, created.interval_ms
                );
            }
            Ok(())
        }

        ScanClassesCommand::Update {
            id,
            name,
            interval_ms,
            description,
        } => {
            let classes = client.list_scan_classes().await?;
            let current = classes.iter().find(|sc| sc.id == id).ok_or_else(|| {
                CliError::NotFound {
                    resource_type: "scan class".into(),
                    identifier: id.to_string(),
                    list_command: "scan-classes list".into(),
                }
            })?;

            let updated = client
                .update_scan_class(
                    id,
                    &ScanClassPayload {
                        name: name.unwrap_or_else(|| current.name.clone()),
                        interval_ms: interval_ms.unwrap_or(current.interval_ms),
                        description: description.unwrap_or_else(|| current.description.clone()),
                    },
                )
                .await?;

            if !global.quiet {
                eprintln!("Scan class '{}' updated", updated.name);
            }
            Ok(())
        }

        ScanClassesCommand::Delete { id } => {
            client.delete_scan_class(id).await?;
            if !global.quiet {
                eprintln!("Scan class {id} deleted");
            }
            Ok(())
        }

        ScanClassesCommand::SetDefault { id } => {
            client.set_default_scan_class(id).await?;
            if !global.quiet {
                eprintln!("Scan class {id} is now the default");
            }
            Ok(())
        }

        ScanClassesCommand::ClearDefault { id } => {
            client.clear_default_scan_class(id).await?;
            if !global.quiet {
                eprintln!("Default flag cleared from scan class {id}");
            }
            Ok(())
        }
    }
}
