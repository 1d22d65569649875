use anyhow::{anyhow, bail, Context, Result};
use canopy::config::{discover, load_from_path, CanopyConfig};
use canopy::grammar::{Grammar, GrammarRegistry};
use canopy::markdown::MarkdownParser;
use canopy::pool::parse_source;
use canopy::query::{MatchCursor, PatternQuery};
use canopy::ts::{SyntaxParser, TextEdit};
use clap::{Parser, Subcommand};
use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use std::collections::HashMap;
use std::env;
use std::fmt::Write as _;
use std::fs;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tree_sitter::Tree;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "canopy")]
#[command(about = "Parse, query and compose tree-sitter syntax trees", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./canopy.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Time budget per parse in milliseconds (overrides the config file)
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_ms: Option<u64>,

    /// Log filter such as `canopy=debug` (falls back to CANOPY_LOG, then `warn`)
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered grammars and the extensions they claim
    Languages,

    /// Print the syntax tree of each file as an S-expression
    Parse {
        /// Files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Grammar to use instead of detecting it from the extension
        #[arg(short, long)]
        language: Option<String>,
    },

    /// Run a pattern query and print the captures of accepted matches
    Query {
        /// Files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Query source
        #[arg(short, long, conflicts_with = "query_file", required_unless_present = "query_file")]
        pattern: Option<String>,

        /// File holding the query source
        #[arg(short = 'f', long)]
        query_file: Option<PathBuf>,

        /// Grammar to use instead of detecting it from the extension
        #[arg(short, long)]
        language: Option<String>,

        /// One JSON object per capture
        #[arg(long)]
        json: bool,
    },

    /// Print a Markdown document's block tree with its inline trees
    Markdown { file: PathBuf },

    /// Replace a byte range, reparse incrementally and show what changed
    Reparse {
        file: PathBuf,

        /// First byte to replace
        #[arg(long)]
        start: usize,

        /// End of the replaced range (exclusive)
        #[arg(long)]
        end: usize,

        /// Replacement text
        #[arg(long, default_value = "")]
        insert: String,

        /// Grammar to use instead of detecting it from the extension
        #[arg(short, long)]
        language: Option<String>,
    },
}

/// Settings shared by every command.
struct Session {
    registry: GrammarRegistry,
    operation_limit: Option<Duration>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_telemetry(cli.log.as_deref())?;

    let config = load_config(cli.config.as_deref())?;
    let mut registry = GrammarRegistry::with_builtins()?;
    config.apply(&mut registry)?;
    let session = Session {
        registry,
        operation_limit: cli
            .timeout_ms
            .map(Duration::from_millis)
            .or_else(|| config.operation_limit()),
    };

    match cli.command {
        Commands::Languages => cmd_languages(&session),
        Commands::Parse { paths, language } => cmd_parse(&session, &paths, language.as_deref()),
        Commands::Query {
            paths,
            pattern,
            query_file,
            language,
            json,
        } => {
            let source = match (pattern, query_file) {
                (Some(pattern), _) => pattern,
                (None, Some(path)) => fs::read_to_string(&path)
                    .with_context(|| format!("failed to read query from {}", path.display()))?,
                (None, None) => bail!("either --pattern or --query-file is required"),
            };
            cmd_query(&session, &paths, &source, language.as_deref(), json)
        }
        Commands::Markdown { file } => cmd_markdown(&session, &file),
        Commands::Reparse {
            file,
            start,
            end,
            insert,
            language,
        } => cmd_reparse(&session, &file, start, end, &insert, language.as_deref()),
    }
}

static TELEMETRY: OnceLock<()> = OnceLock::new();

/// Install the stderr subscriber once per process.
fn init_telemetry(filter: Option<&str>) -> Result<()> {
    if TELEMETRY.get().is_some() {
        return Ok(());
    }

    let directive = filter
        .map(str::to_string)
        .or_else(|| env::var("CANOPY_LOG").ok())
        .unwrap_or_else(|| "warn".to_string());
    let filter = EnvFilter::try_new(&directive)
        .with_context(|| format!("invalid log filter '{directive}'"))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .try_init()
        .map_err(|e| anyhow!("failed to install log subscriber: {e}"))?;

    let _ = TELEMETRY.set(());
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<CanopyConfig> {
    let config = match path {
        Some(path) => load_from_path(path)?,
        None => discover(env::current_dir()?)?,
    };
    debug!(?config, "loaded configuration");
    Ok(config)
}

/// Helper: Expand files and directories into (file, grammar) pairs.
///
/// Directory entries without a known extension are skipped; an explicitly
/// named file without one is an error.
fn collect_files(
    registry: &GrammarRegistry,
    paths: &[PathBuf],
    language: Option<&str>,
) -> Result<Vec<(PathBuf, Grammar)>> {
    let forced = language.map(|name| registry.get(name)).transpose()?;
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            let mut found = Vec::new();
            for entry in WalkDir::new(path) {
                let entry = entry?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let grammar = forced.or_else(|| registry.for_path(entry.path()));
                if let Some(grammar) = grammar {
                    found.push((entry.path().to_path_buf(), grammar.clone()));
                }
            }
            found.sort_by(|a, b| a.0.cmp(&b.0));
            files.extend(found);
        } else {
            let grammar = match forced.or_else(|| registry.for_path(path)) {
                Some(grammar) => grammar,
                None => bail!(
                    "no grammar for {}; pass --language to choose one",
                    path.display()
                ),
            };
            files.push((path.clone(), grammar.clone()));
        }
    }

    Ok(files)
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

fn cmd_languages(session: &Session) -> Result<()> {
    for grammar in session.registry.iter() {
        let extensions = if grammar.extensions().is_empty() {
            "(no extensions)".dimmed().to_string()
        } else {
            grammar
                .extensions()
                .iter()
                .map(|ext| format!(".{ext}"))
                .collect::<Vec<_>>()
                .join(" ")
        };
        println!("{:<16} {}", grammar.name().bold(), extensions);
    }
    Ok(())
}

fn cmd_parse(session: &Session, paths: &[PathBuf], language: Option<&str>) -> Result<()> {
    for (path, grammar) in collect_files(&session.registry, paths, language)? {
        let source = read_file(&path)?;
        let parsed = parse_source(&grammar, &source, session.operation_limit, None)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        println!("{}", format!("{} ({})", path.display(), grammar.name()).bold());
        println!("{}", parsed.to_sexp());

        let errors = parsed.error_nodes();
        if !errors.is_empty() {
            eprintln!(
                "{}",
                format!(
                    "  {} syntax error(s), first at line {}",
                    errors.len(),
                    errors[0].start_point.row + 1
                )
                .yellow()
            );
        }
    }
    Ok(())
}

fn cmd_query(
    session: &Session,
    paths: &[PathBuf],
    query_source: &str,
    language: Option<&str>,
    json: bool,
) -> Result<()> {
    let mut queries: HashMap<String, PatternQuery> = HashMap::new();
    let mut cursor = MatchCursor::new();
    let mut accepted = 0usize;
    let mut rejected = 0usize;

    for (path, grammar) in collect_files(&session.registry, paths, language)? {
        if !queries.contains_key(grammar.name()) {
            let query = PatternQuery::new(&grammar, query_source)
                .with_context(|| format!("query does not compile for {}", grammar.name()))?;
            queries.insert(grammar.name().to_string(), query);
        }
        let query = queries
            .get(grammar.name())
            .ok_or_else(|| anyhow!("query for {} was not compiled", grammar.name()))?;

        let source = read_file(&path)?;
        let parsed = parse_source(&grammar, &source, session.operation_limit, None)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        for m in cursor.matches(query, parsed.root_node()) {
            let filtered = query.filter(&m, &source);
            if filtered.is_rejected() {
                rejected += 1;
                continue;
            }
            accepted += 1;

            for capture in &filtered.captures {
                let name = query.capture_name(capture.index).unwrap_or("?");
                let text = String::from_utf8_lossy(capture.text(&source));
                let start = capture.node.start_position();
                if json {
                    let record = serde_json::json!({
                        "path": path.display().to_string(),
                        "pattern": filtered.pattern_index,
                        "capture": name,
                        "kind": capture.node.kind(),
                        "text": text,
                        "start_byte": capture.node.start_byte(),
                        "end_byte": capture.node.end_byte(),
                        "row": start.row + 1,
                        "column": start.column + 1,
                    });
                    println!("{record}");
                } else {
                    println!(
                        "{}:{}:{} {} {}",
                        path.display(),
                        start.row + 1,
                        start.column + 1,
                        format!("@{name}").cyan(),
                        text.replace('\n', "\\n")
                    );
                }
            }
        }
    }

    if !json {
        eprintln!(
            "{} accepted, {} rejected by predicates",
            format!("{accepted}").green(),
            format!("{rejected}").yellow()
        );
    }
    Ok(())
}

fn cmd_markdown(session: &Session, file: &Path) -> Result<()> {
    let source = read_file(file)?;
    let mut parser = MarkdownParser::new()?;
    parser.set_operation_limit(session.operation_limit);
    let document = parser
        .parse(&source, None, None)
        .with_context(|| format!("failed to parse {}", file.display()))?;

    for item in document.walk() {
        let depth = std::iter::successors(item.node.parent(), |n| n.parent()).count();
        let start = item.node.start_position();
        let line = format!(
            "{}{} {}",
            "  ".repeat(depth),
            item.node.kind(),
            format!("[{}:{}]", start.row + 1, start.column + 1).dimmed()
        );
        match item.secondary {
            Some(inline) => println!("{line} {}", inline.to_sexp().cyan()),
            None => println!("{line}"),
        }
    }
    Ok(())
}

fn cmd_reparse(
    session: &Session,
    file: &Path,
    start: usize,
    end: usize,
    insert: &str,
    language: Option<&str>,
) -> Result<()> {
    let files = collect_files(&session.registry, &[file.to_path_buf()], language)?;
    let Some((_, grammar)) = files.into_iter().next() else {
        bail!("no grammar for {}", file.display());
    };

    let old_source = read_file(file)?;
    let mut parser = SyntaxParser::new(&grammar)?.with_operation_limit(session.operation_limit);
    let old_tree = parser.parse(&old_source, None, None)?;

    let (edit, new_source) = TextEdit::replace(&old_source, start, end, insert.as_bytes())?;
    let mut edited = old_tree.clone();
    edit.apply(&mut edited);
    let new_tree = parser.parse(&new_source, Some(&edited), None)?;

    println!("{}", "Changed ranges:".bold());
    let mut changed = 0;
    for range in edited.changed_ranges(&new_tree) {
        changed += 1;
        println!(
            "  bytes {}..{} (line {} column {} to line {} column {})",
            range.start_byte,
            range.end_byte,
            range.start_point.row + 1,
            range.start_point.column + 1,
            range.end_point.row + 1,
            range.end_point.column + 1
        );
    }
    if changed == 0 {
        println!("  {}", "none".dimmed());
    }

    display_diff(file, &outline(&old_tree), &outline(&new_tree));
    Ok(())
}

/// Helper: One line per named node, indented by depth, with field names.
fn outline(tree: &Tree) -> String {
    let mut out = String::new();
    let mut cursor = tree.walk();
    let mut depth = 0usize;

    loop {
        let node = cursor.node();
        if node.is_named() {
            let field = cursor
                .field_name()
                .map(|f| format!("{f}: "))
                .unwrap_or_default();
            let _ = writeln!(out, "{}{}{}", "  ".repeat(depth), field, node.kind());
        }

        if cursor.goto_first_child() {
            depth += 1;
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return out;
            }
            depth -= 1;
        }
    }
}

/// Helper: Show unified diff between the old and new tree outlines
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!("\n{}", format!("--- {} (before)", file.display()).dimmed());
    println!("{}", format!("+++ {} (after)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}
