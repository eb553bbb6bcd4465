use anyhow::Context;
use std::env;
use std::io::{self, Write};
use std::path::Path;

use dashboard_core::command::{self, ApplyStatus};
use dashboard_core::{
    Catalog, CellMetrics, ContentProvider, JsonFileAdapter, Layout, LayoutMode, LayoutStore,
    PersistenceAdapter, geometry,
};

// Host shell configuration: a 12-column grid with 120px cells.
const COLUMNS: i32 = 12;
const ROWS: i32 = 10;
const CELL_PX: f32 = 120.0;
const GUTTER_PX: f32 = 10.0;

fn print_help() {
    println!(
        r#"Dashboard CLI

            Commands:
            new <layout.json>
            demo <layout.json>
            list <layout.json>
            repl <layout.json>

            Examples:
            cargo run -p dashboard_cli -- new home.json
            cargo run -p dashboard_cli -- demo home.json
            cargo run -p dashboard_cli -- list home.json
            cargo run -p dashboard_cli -- repl home.json
        "#
    );
}

/// Split a layout file path into the adapter directory and storage key.
fn adapter_for(path: &str) -> anyhow::Result<(JsonFileAdapter, String)> {
    let path = Path::new(path);
    let key = path
        .file_stem()
        .and_then(|s| s.to_str())
        .context("layout path has no file name")?
        .to_string();
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let adapter = JsonFileAdapter::new(dir.unwrap_or(Path::new(".")));
    Ok((adapter, key))
}

fn open_store(path: &str, catalog: &dyn ContentProvider) -> anyhow::Result<LayoutStore> {
    let (adapter, key) = adapter_for(path)?;
    let mut store = LayoutStore::new(Layout::grid(key.clone(), COLUMNS, ROWS));
    if let Some(snapshot) = adapter.load(&key)? {
        store.restore(snapshot, catalog);
    }
    Ok(store)
}

fn save_store(path: &str, store: &LayoutStore) -> anyhow::Result<()> {
    let (adapter, key) = adapter_for(path)?;
    adapter.save(&key, &store.serialize())
}

fn print_cards(store: &LayoutStore) {
    if store.layout.cards.is_empty() {
        println!("(no cards)");
        return;
    }
    println!(
        "Mode: {:?} | columns {} | rows {}",
        store.layout.mode, store.layout.columns, store.layout.rows
    );
    for (i, card) in store.layout.cards.iter().enumerate() {
        let r = card.geometry.rect();
        println!(
            "  #{:>2} | {:<22} | {:<8} | ({:>4},{:>4}) {}x{} | scale {:.2}",
            i + 1,
            card.id,
            card.content_type,
            r.x,
            r.y,
            r.w,
            r.h,
            card.geometry.scale
        );
    }
}

fn cmd_new(path: &str) -> anyhow::Result<()> {
    let (adapter, key) = adapter_for(path)?;
    let store = LayoutStore::new(Layout::grid(key.clone(), COLUMNS, ROWS));
    adapter.save(&key, &store.serialize())?;
    println!("Created empty layout at {path}");
    Ok(())
}

fn cmd_demo(path: &str) -> anyhow::Result<()> {
    let catalog = Catalog::with_defaults();
    let metrics = CellMetrics::new(CELL_PX, GUTTER_PX);
    let mut store = LayoutStore::new(Layout::grid("demo", COLUMNS, ROWS));
    for kind in ["clock", "notes", "weather", "links"] {
        store.add_card(&catalog, kind, &metrics)?;
    }
    save_store(path, &store)?;
    println!("Wrote demo layout with {} cards to {path}", store.layout.cards.len());
    Ok(())
}

fn cmd_list(path: &str) -> anyhow::Result<()> {
    let catalog = Catalog::with_defaults();
    let store = open_store(path, &catalog)?;
    print_cards(&store);
    Ok(())
}

fn repl(path: &str) -> anyhow::Result<()> {
    let catalog = Catalog::with_defaults();
    let metrics = CellMetrics::new(CELL_PX, GUTTER_PX);
    let mut store = open_store(path, &catalog)?;

    println!("Loaded layout: {} ({} cards)", store.layout.name, store.layout.cards.len());
    println!("Type 'help' for commands. 'quit' to exit.");

    loop {
        print!("db> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            // EOF (Ctrl+D)
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        // Layout syntax first (add/move/resize/scale/remove), then the
        // host commands below.
        match command::try_apply_layout_line(line, &mut store, &catalog, &metrics) {
            ApplyStatus::Applied => {
                print_cards(&store);
                continue;
            }
            ApplyStatus::Incomplete => {
                println!("(layout) incomplete input…");
                continue;
            }
            ApplyStatus::Failed(msg) => {
                println!("(layout) {msg}");
                continue;
            }
            ApplyStatus::NotACommand => {
                // fall through to host commands
            }
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts[0].to_lowercase().as_str() {
            "help" => {
                println!(
                    r#"Commands:
                        add <type>                      ({types})
                        move <card> <dx> <dy>           (pixel deltas)
                        resize <card> corner|right|bottom <dx> <dy>
                        scale <card> <factor>           (0.5..2.0)
                        remove <card>
                        measure <n> <w_px> <h_px>       (content measurement callback)
                        mode grid|free
                        list
                        types
                        save
                        quit
                        "#,
                    types = catalog
                        .kinds()
                        .map(|k| k.type_id.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
            "quit" | "exit" => break,

            "list" => print_cards(&store),

            "types" => {
                println!("Card types:");
                for kind in catalog.kinds() {
                    println!(
                        "  {:<10} | {:<14} | default {}x{} cells",
                        kind.type_id, kind.title, kind.default_size.w, kind.default_size.h
                    );
                }
            }

            "mode" => {
                match parts.get(1).map(|m| m.to_lowercase()).as_deref() {
                    Some("grid") => store.set_mode(LayoutMode::Grid),
                    Some("free") | Some("freeform") => store.set_mode(LayoutMode::FreeForm),
                    _ => {
                        println!("Usage: mode grid|free");
                        continue;
                    }
                }
                println!("Mode is now {:?} (geometry reinterpreted, not converted)", store.layout.mode);
            }

            "measure" => {
                if parts.len() != 4 {
                    println!("Usage: measure <n> <w_px> <h_px>");
                    continue;
                }
                let Some(card) = store
                    .layout
                    .cards
                    .get(parts[1].parse::<usize>().unwrap_or(0).wrapping_sub(1))
                    .map(|c| c.id.clone())
                else {
                    println!("no card '{}'", parts[1]);
                    continue;
                };
                let w: f32 = parts[2].parse()?;
                let h: f32 = parts[3].parse()?;
                if store.content_measured(&card, w, h, &metrics) {
                    println!("Card resized to fit content");
                    print_cards(&store);
                } else {
                    println!("No change (footprint already fits)");
                }
            }

            "save" => {
                save_store(path, &store)?;
                println!("Saved {path}");
            }

            "minimums" => {
                let min = geometry::min_size(store.layout.mode);
                println!("Minimum card size in {:?}: {}x{}", store.layout.mode, min.w, min.h);
            }

            other => println!("Unknown command '{other}'. Type 'help'."),
        }
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("new") if args.len() == 2 => cmd_new(&args[1]),
        Some("demo") if args.len() == 2 => cmd_demo(&args[1]),
        Some("list") if args.len() == 2 => cmd_list(&args[1]),
        Some("repl") if args.len() == 2 => repl(&args[1]),
        _ => {
            print_help();
            Ok(())
        }
    }
}
