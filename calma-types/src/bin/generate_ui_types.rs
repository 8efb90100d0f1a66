use calma_types::*;
use std::fs;
use std::path::Path;
use ts_rs::TS;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Generate TypeScript definitions for the state blob shared with the web UI
    let mut types = Vec::new();

    types.push(clean_type(AppState::export_to_string()?));
    types.push(clean_type(Colchon::export_to_string()?));
    types.push(clean_type(ColchonPatch::export_to_string()?));
    types.push(clean_type(Transaction::export_to_string()?));
    types.push(clean_type(TransactionKind::export_to_string()?));
    types.push(clean_type(FixedExpense::export_to_string()?));
    types.push(clean_type(Totals::export_to_string()?));

    let output_dir = Path::new("../gui/src/state-types");
    fs::create_dir_all(output_dir)?;

    let output_path = output_dir.join("types.ts");
    let output = types.join("\n\n");

    fs::write(&output_path, output)?;
    println!("Generated TypeScript types in {}", output_path.display());

    Ok(())
}

fn clean_type(mut type_def: String) -> String {
    type_def.retain(|c| c != '\r');

    let lines: Vec<&str> = type_def.lines().collect();
    let has_import = lines
        .iter()
        .any(|line| line.trim().starts_with("import type"));

    let filtered: Vec<&str> = lines
        .iter()
        .filter(|line| {
            let trimmed = line.trim();
            // Keep import lines only when the type genuinely references another file
            if trimmed.starts_with("import type") {
                return has_import;
            }
            !trimmed.starts_with("// This file was generated")
                && !trimmed.starts_with("/* This file was generated")
        })
        .cloned()
        .collect();

    let result = filtered.join("\n").trim().to_string();
    if result.is_empty() {
        result
    } else {
        format!("{}\n", result)
    }
}
