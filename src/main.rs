use anyhow::{bail, Context, Result};
use chrono::Utc;
use family_archive::{
    backend::Connection,
    cli::{Cli, Commands, ExportFormat},
    config::Settings,
    export::{export_json, export_xlsx, template_xlsx},
    filter::resolve_tables,
    importer::{commit_bundle, commit_sheet, ImportError, ImportReport},
    inventory::{load_inventory, load_inventory_of, selected_tables, TableSelection},
    logging::setup_logging,
    preview::{is_spreadsheet, preview_file, ImportPreview},
    schema::{get_table, ALL_TABLES},
    ui::{picker::pick_tables, Frontend, LogUi, Phase, Ui},
};
use std::io::{self, BufRead, Write};
use std::time::Instant;

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    setup_logging(cli.log_level.as_deref(), cli.tui);

    let settings = Settings::resolve(cli.config.as_deref(), cli.overrides())
        .context("Failed to load configuration")?;
    let connection = Connection::from_settings(&settings);

    match cli.command {
        Commands::Tables { offline } => {
            if offline {
                println!("Archive tables:\n");
                for table in ALL_TABLES {
                    println!("  {:<22} key={:<4} {}", table.name, table.primary_key, table.description);
                }
                return Ok(());
            }

            let backend = connection.require()?;
            let mut ui = Frontend::new(cli.tui)?;
            ui.set_phase(Phase::Counting);
            let inventory = load_inventory(backend, &mut ui);
            ui.finish(&format_inventory(&inventory))?;
        }

        Commands::Export {
            format,
            tables,
            exclude,
            pick,
            output_dir,
            stdout,
        } => {
            if stdout && format == ExportFormat::Xlsx {
                bail!("--stdout is only available for JSON exports");
            }

            let backend = connection.require()?;
            let mut tables = resolve_tables(tables, exclude)?;

            if pick {
                let inventory = load_inventory_of(backend, &tables, &mut LogUi);
                match pick_tables(inventory)? {
                    Some(picked) => tables = selected_tables(&picked),
                    None => {
                        println!("Export cancelled");
                        return Ok(());
                    }
                }
            }

            let start = Instant::now();
            let now = Utc::now();
            let mut ui = Frontend::new(cli.tui && !stdout)?;
            let file = match format {
                ExportFormat::Json => export_json(backend, &tables, now, &mut ui)?,
                ExportFormat::Xlsx => export_xlsx(backend, &tables, now, &mut ui)?,
            };

            if stdout {
                print!("{}", file.text());
                return Ok(());
            }

            let path = file
                .write_to(&output_dir)
                .with_context(|| format!("Failed to write {:?}", output_dir.join(&file.file_name)))?;
            ui.finish(&format!(
                "Exported {} tables to {:?} in {:.1}s",
                tables.len(),
                path,
                start.elapsed().as_secs_f64()
            ))?;
        }

        Commands::Preview { file, rows } => {
            let preview = preview_file(&file, &mut LogUi)?;
            print_preview(&preview, rows)?;
        }

        Commands::Import { file, table, yes } => {
            if is_spreadsheet(&file) && table.is_none() {
                return Err(ImportError::MissingTarget.into());
            }
            if let Some(name) = &table {
                if get_table(name).is_none() {
                    bail!("Unknown table: {}", name);
                }
            }

            let preview = preview_file(&file, &mut LogUi)?;
            print_preview(&preview, 0)?;
            println!("{} rows will be imported", preview.total_rows());

            if !yes && !confirm("Existing rows with the same key will be overwritten. Continue?")? {
                println!("Import cancelled");
                return Ok(());
            }

            let backend = connection.require()?;
            let start = Instant::now();
            let mut ui = Frontend::new(cli.tui)?;
            let (report, inventory) = match preview {
                ImportPreview::Json(bundle) => commit_bundle(backend, bundle, &mut ui)?,
                ImportPreview::Excel { .. } => commit_sheet(backend, table.as_deref(), &file, &mut ui)?,
            };

            ui.finish(&format!(
                "{}\nFinished in {:.1}s\n\n{}",
                format_report(&report),
                start.elapsed().as_secs_f64(),
                format_inventory(&inventory)
            ))?;
        }

        Commands::Template { table, output_dir } => {
            let Some(descriptor) = get_table(&table) else {
                bail!("Unknown table: {}", table);
            };
            let file = template_xlsx(descriptor, Utc::now())?;
            let path = file.write_to(&output_dir)?;
            println!("Template written to {:?}", path);
        }
    }

    Ok(())
}

fn format_inventory(inventory: &[TableSelection]) -> String {
    let mut out = String::from("Tables:\n");
    for entry in inventory {
        out.push_str(&format!(
            "  {:<22} {:>8}  {}\n",
            entry.table.name, entry.row_count, entry.table.description
        ));
    }
    out
}

fn format_report(report: &ImportReport) -> String {
    let mut out = format!("Imported {} rows:\n", report.total_rows());
    for table in &report.tables {
        out.push_str(&format!(
            "  {:<22} {:>8} rows in {} batches\n",
            table.table, table.rows, table.batches
        ));
    }
    for skipped in &report.skipped {
        out.push_str(&format!("  {:<22} skipped (no rows)\n", skipped));
    }
    out
}

fn print_preview(preview: &ImportPreview, sample_rows: usize) -> Result<()> {
    match preview {
        ImportPreview::Json(bundle) => {
            if let Some(date) = &bundle.metadata.export_date {
                println!("Bundle exported at {}", date);
            }
            for (table, count) in bundle.summary() {
                println!("  {:<22} {:>8} rows", table, count);
                if let Some(rows) = bundle.data.get(&table) {
                    for row in rows.iter().take(sample_rows) {
                        println!("      {}", serde_json::to_string(row)?);
                    }
                }
            }
        }
        ImportPreview::Excel { sample, total_rows } => {
            println!("Sheet rows: {} (showing {})", total_rows, sample.len());
            for row in sample {
                println!("  {}", serde_json::to_string(row)?);
            }
        }
    }
    Ok(())
}

fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes" | "نعم")
}
