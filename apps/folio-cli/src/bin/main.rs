use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};

use folio_cli::render::format_source;
use folio_cli::{init_tracing, report, App};
use folio_hybrid::eval::{evaluate, load_questions};

const USAGE: &str = "Usage: folio <command> [args...]

Commands:
  index  [--chunks PATH] [--index-dir PATH]       build the hybrid index from the chunk file
  query  \"<question>\" [--k N] [--play TITLE] [--show-context] [--explain]
  status [--index-dir PATH]                        show the manifest of the current index
  eval   <questions.json> [--quiet]                check retrieval against a question set";

struct QueryArgs {
    query: String,
    k: Option<usize>,
    play: Option<String>,
    show_context: bool,
    explain: bool,
}

fn flag_value(args: &[String], i: &mut usize, flag: &str) -> Result<String> {
    *i += 1;
    args.get(*i).cloned().with_context(|| format!("{flag} requires a value"))
}

fn parse_paths(args: &[String]) -> Result<(Option<PathBuf>, Option<PathBuf>)> {
    let (mut chunks, mut index_dir) = (None, None);
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--chunks" => chunks = Some(PathBuf::from(flag_value(args, &mut i, "--chunks")?)),
            "--index-dir" => index_dir = Some(PathBuf::from(flag_value(args, &mut i, "--index-dir")?)),
            other => bail!("unexpected argument '{other}'\n\n{USAGE}"),
        }
        i += 1;
    }
    Ok((chunks, index_dir))
}

fn parse_query(args: &[String]) -> Result<QueryArgs> {
    let mut parsed = QueryArgs { query: String::new(), k: None, play: None, show_context: false, explain: false };
    let mut words = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--k" | "-k" => {
                let v = flag_value(args, &mut i, "--k")?;
                parsed.k = Some(v.parse().with_context(|| format!("--k expects a number, got '{v}'"))?);
            }
            "--play" => parsed.play = Some(flag_value(args, &mut i, "--play")?),
            "--show-context" => parsed.show_context = true,
            "--explain" => parsed.explain = true,
            other if other.starts_with("--") => bail!("unknown flag '{other}'\n\n{USAGE}"),
            word => words.push(word.to_string()),
        }
        i += 1;
    }
    parsed.query = words.join(" ");
    if parsed.query.trim().is_empty() {
        bail!("query needs a question\n\n{USAGE}");
    }
    Ok(parsed)
}

fn cmd_index(args: &[String]) -> Result<()> {
    let (chunks, index_dir) = parse_paths(args)?;
    let app = App::load()?.with_paths(chunks, index_dir);
    println!("📚 Chunks: {}", app.paths.chunks_path.display());
    println!("🗂️  Index:  {}", app.paths.index_dir.display());
    let index = app.build_index(true)?;
    println!(
        "\n✅ Indexed {} chunks ({} dims, {})",
        index.len(),
        index.manifest.embedding_dim,
        index.manifest.embedder_id
    );
    Ok(())
}

fn cmd_query(args: &[String]) -> Result<()> {
    let q = parse_query(args)?;
    let app = App::load()?;
    let ctx = app.open_context()?;
    let k = q.k.unwrap_or(ctx.config().top_k);
    let sources = ctx.retrieve(&q.query, k, q.play.as_deref())?;
    println!("🔍 {}", q.query);
    if sources.is_empty() {
        println!("\nNo matching passages.");
        return Ok(());
    }
    for source in &sources {
        print!("\n{}", format_source(source, q.show_context, q.explain));
    }
    Ok(())
}

fn cmd_status(args: &[String]) -> Result<()> {
    let (_, index_dir) = parse_paths(args)?;
    let app = App::load()?.with_paths(None, index_dir);
    let manifest = app.store().read_manifest()?;
    println!("🗂️  {}", app.paths.index_dir.display());
    println!("{}", serde_json::to_string_pretty(&manifest)?);
    Ok(())
}

fn cmd_eval(args: &[String]) -> Result<()> {
    let quiet = args.iter().any(|a| a == "--quiet");
    let path = args
        .iter()
        .find(|a| !a.starts_with("--"))
        .map(PathBuf::from)
        .with_context(|| format!("eval needs a question file\n\n{USAGE}"))?;
    let questions = load_questions(&path)?;
    let app = App::load()?;
    let ctx = app.open_context()?;
    let results = evaluate(&ctx, &questions)?;
    for r in &results {
        let status = if r.checks.passed() { "PASS" } else { "FAIL" };
        println!("[{}] {:<20} {status}  grounding={} play_match={}", r.id, r.kind, r.checks.grounding, r.checks.play_match);
        if !quiet {
            for top in &r.top {
                println!("      {top}");
            }
        }
    }
    let passed = results.iter().filter(|r| r.checks.passed()).count();
    println!("\n📊 EVAL SUMMARY: {passed}/{} passed", results.len());
    Ok(())
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let Some((cmd, rest)) = args.split_first() else { bail!("{USAGE}") };
    match cmd.as_str() {
        "index" => cmd_index(rest),
        "query" => cmd_query(rest),
        "status" => cmd_status(rest),
        "eval" => cmd_eval(rest),
        "-h" | "--help" | "help" => {
            println!("{USAGE}");
            Ok(())
        }
        other => bail!("unknown command '{other}'\n\n{USAGE}"),
    }
}

fn main() -> ExitCode {
    init_tracing();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(&e),
    }
}
