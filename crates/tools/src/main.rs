use std::env;
use std::fs;
use std::path::PathBuf;

use filters::FilterTree;
use formats::{Document, EmbedOptions, embed_url};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    let mut args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        return Err(usage());
    }

    let cmd = args[1].clone();
    args.drain(0..2);

    match cmd.as_str() {
        "inspect" => cmd_inspect(args),
        "regen-filters" => cmd_regen_filters(args),
        "embed-url" => cmd_embed_url(args),
        _ => Err(usage()),
    }
}

fn cmd_inspect(args: Vec<String>) -> Result<(), String> {
    // waymark inspect <doc.json>
    let [path] = args.as_slice() else {
        return Err(usage());
    };
    let doc = load_document(path)?;
    let store = doc.build_store().map_err(|e| e.to_string())?;

    println!("{} ({})", doc.name, doc.id);
    println!("  image: {} ({} x {})", doc.image_url, doc.width, doc.height);
    println!("  points of interest: {}", store.points().len());
    println!("  regions: {}", store.regions().len());
    println!("  lines: {}", store.lines().len());

    let tree = FilterTree::from_store(&store);
    if !tree.is_empty() {
        println!("  filter groups:");
        for (name, group) in tree.groups() {
            let values: Vec<&str> = group.leaves().map(|(value, _)| value).collect();
            println!("    {name}: {}", values.join(", "));
        }
    }
    Ok(())
}

fn cmd_regen_filters(args: Vec<String>) -> Result<(), String> {
    // waymark regen-filters <in.json> <out.json>
    let [input, output] = args.as_slice() else {
        return Err(usage());
    };
    let mut doc = load_document(input)?;
    let store = doc.build_store().map_err(|e| e.to_string())?;
    doc.regenerate_filter_groups(&store);

    let json = doc.to_json_pretty().map_err(|e| e.to_string())?;
    fs::write(PathBuf::from(output), json)
        .map_err(|e| format!("failed to write {output}: {e}"))?;
    println!(
        "wrote {output} with {} region filter groups",
        doc.filter_groups.regions.len()
    );
    Ok(())
}

fn cmd_embed_url(mut args: Vec<String>) -> Result<(), String> {
    // waymark embed-url <url> [--keep-view]
    let mut options = EmbedOptions::default();
    if let Some(pos) = args.iter().position(|a| a == "--keep-view") {
        options.keep_view = true;
        args.remove(pos);
    }
    let [input] = args.as_slice() else {
        return Err(usage());
    };
    if input.starts_with('-') {
        return Err(format!("unknown arg: {input}\n\n{}", usage()));
    }

    let out = embed_url(input, options).map_err(|e| e.to_string())?;
    println!("{out}");
    Ok(())
}

fn load_document(path: &str) -> Result<Document, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("failed to read {path}: {e}"))?;
    Document::from_json(&text).map_err(|e| e.to_string())
}

fn usage() -> String {
    [
        "usage:",
        "  waymark inspect <doc.json>",
        "  waymark regen-filters <in.json> <out.json>",
        "  waymark embed-url <url> [--keep-view]",
    ]
    .join("\n")
}
