// Entry point and high-level CLI flow.
//
// - Option [1] loads a progress sheet (CSV/XLSX) or a directory of CSVs,
//   printing diagnostics. Repeat loads append through the merger, so
//   multiple parks accumulate into one table.
// - Option [2] exports the normalized table and a JSON summary, printing
//   Markdown previews of both.
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

use reno_report::{loader, merge, output, reports, util, LocationEnricher, NormalizedTable};

// Simple in-memory app state so loaded tables survive across menu rounds
// within a single run.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState { table: None }));

struct AppState {
    table: Option<NormalizedTable>,
}

/// Read a single line of input after printing a prompt.
fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Handle option [1]: load and normalize one file or directory.
///
/// On success the table is merged into `APP_STATE` and a short textual
/// summary of what happened is printed.
fn handle_load(enricher: &LocationEnricher) {
    let input = read_line("File or directory path: ");
    if input.is_empty() {
        println!("No path given.\n");
        return;
    }
    let path = Path::new(&input);
    let result = if path.is_dir() {
        loader::load_directory(path, enricher)
    } else {
        loader::load_path(path, None, enricher)
    };
    match result {
        Ok((table, report)) => {
            println!(
                "Processing... ({} data rows read, {} kept, {} rejected)",
                util::format_int(report.total_rows as i64),
                util::format_int(report.kept_rows as i64),
                util::format_int(report.rejected_rows() as i64)
            );
            if report.skipped_sheets > 0 {
                println!(
                    "Note: {} sheet(s) did not look like progress sheets and were skipped.",
                    util::format_int(report.skipped_sheets as i64)
                );
            }
            let mut state = APP_STATE.lock().unwrap();
            let merged = match state.table.take() {
                Some(existing) => merge::merge_tables(vec![existing, table]),
                None => table,
            };
            println!(
                "Normalized table now holds {} project record(s).\n",
                util::format_int(merged.len() as i64)
            );
            state.table = Some(merged);
        }
        Err(e) => {
            eprintln!("Failed to load file: {}\n", e);
        }
    }
}

/// Handle option [2]: export the normalized table and summary files.
fn handle_export() {
    let table = {
        let state = APP_STATE.lock().unwrap();
        state.table.clone()
    };
    let Some(table) = table else {
        println!("Error: No data loaded. Please load a file first (option 1).\n");
        return;
    };

    let flags = reports::stable_demand_flags(&table);

    let rows = reports::export_rows(&table, &flags);
    let file1 = "normalized_projects.csv";
    if let Err(e) = output::write_csv(file1, &rows) {
        eprintln!("Write error: {}", e);
    }
    println!("Normalized project table\n");
    output::preview_table_rows(&rows, 5);
    println!("(Full table exported to {})\n", file1);

    let rollup = reports::park_summary(&table, &flags);
    let file2 = "park_summary.csv";
    if let Err(e) = output::write_csv(file2, &rollup) {
        eprintln!("Write error: {}", e);
    }
    println!("Per-park rollup\n");
    output::preview_table_rows(&rollup, 5);
    println!("(Full table exported to {})\n", file2);

    let summary = reports::summarize(&table, &flags);
    if let Err(e) = output::write_json("summary.json", &summary) {
        eprintln!("Write error: {}", e);
    }
    println!(
        "Summary (summary.json): {} project(s), {} park(s), total planned amount {}, {} stable.\n",
        util::format_int(summary.total_projects as i64),
        util::format_int(summary.total_parks as i64),
        util::format_number(summary.total_planned_amount, 0),
        util::format_int(summary.stable_projects as i64)
    );
}

fn main() {
    let enricher = LocationEnricher::default();
    loop {
        println!("[1] Load a progress sheet (.csv/.xlsx) or a directory of CSVs");
        println!("[2] Export the normalized table and summary");
        println!("[3] Exit\n");
        match read_line("Enter choice: ").as_str() {
            "1" => {
                handle_load(&enricher);
            }
            "2" => {
                println!();
                handle_export();
            }
            "3" => {
                println!("Exiting the program.");
                break;
            }
            _ => {
                println!("Invalid choice. Please enter 1, 2 or 3.\n");
            }
        }
    }
}
