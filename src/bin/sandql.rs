//! sandql 交互式 shell
//!
//! Loads one exercise into an in-memory session and runs SQL against it.

use anyhow::{bail, Context};
use clap::{ArgGroup, Parser};
use sandql::{Exercise, QueryOutcome, SandboxConfig, SessionManager, SqlRow, TableInfo, Value};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const MAX_CELL_WIDTH: usize = 50;

#[derive(Parser, Debug)]
#[command(name = "sandql", version, about = "Practice SQL against an exercise's schema in memory")]
#[command(group(ArgGroup::new("source").required(true).args(["exercise", "schema"])))]
struct Args {
    /// Exercise descriptor (JSON with `schema` and optional `solutionQuery`)
    #[arg(long, value_name = "FILE")]
    exercise: Option<PathBuf>,

    /// Plain SQL schema script
    #[arg(long, value_name = "FILE")]
    schema: Option<PathBuf>,

    /// Sandbox config (JSON)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print results as JSON instead of tables
    #[arg(long)]
    json: bool,

    /// Rows sampled per table by `.tables`
    #[arg(long, value_name = "N")]
    sample_rows: Option<usize>,

    /// Interrupt queries running longer than this
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("SANDQL_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run(Args::parse()) {
        eprintln!("❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => SandboxConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SandboxConfig::default(),
    };
    if let Some(n) = args.sample_rows {
        config.session.sample_rows = n;
    }
    if args.timeout_ms.is_some() {
        config.session.query_timeout_ms = args.timeout_ms;
    }
    config.validate()?;

    let exercise = load_exercise(&args)?;
    let mut session = SessionManager::new(config);
    session.initialize(&exercise)?;

    println!("🚀 sandql v{}", env!("CARGO_PKG_VERSION"));
    if let Some(title) = &exercise.title {
        println!("📘 {}", title);
    }
    if let Some(version) = session.engine_version() {
        println!("🔧 SQLite {}", version);
    }
    println!("💡 Type '.help' for help, '.exit' to quit\n");

    interactive_mode(&mut session, args.json)
}

fn load_exercise(args: &Args) -> anyhow::Result<Exercise> {
    if let Some(path) = &args.exercise {
        return Exercise::from_json_file(path)
            .with_context(|| format!("loading exercise {}", path.display()));
    }
    if let Some(path) = &args.schema {
        let script = std::fs::read_to_string(path)
            .with_context(|| format!("reading schema {}", path.display()))?;
        return Ok(Exercise::with_schema(script));
    }
    bail!("either --exercise or --schema is required")
}

fn interactive_mode(session: &mut SessionManager, json: bool) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut buffer = String::new();
    let mut multiline_sql = String::new();

    loop {
        if multiline_sql.is_empty() {
            print!("sandql> ");
        } else {
            print!("     -> ");
        }
        io::stdout().flush()?;

        buffer.clear();
        if stdin.lock().read_line(&mut buffer)? == 0 {
            break;
        }

        let input = buffer.trim();

        // 特殊命令
        if input.starts_with('.') {
            if !multiline_sql.is_empty() {
                eprintln!("⚠️  Warning: Incomplete SQL statement discarded");
                multiline_sql.clear();
            }

            match input {
                ".exit" | ".quit" => {
                    println!("👋 Goodbye!");
                    break;
                }
                ".help" => print_interactive_help(),
                ".tables" => list_tables(session, json)?,
                ".schema" => {
                    for table in session.tables() {
                        show_table_schema(&table);
                        println!();
                    }
                }
                cmd if cmd.starts_with(".schema ") => {
                    let name = cmd[".schema ".len()..].trim();
                    match session.tables().iter().find(|t| t.name == name) {
                        Some(table) => show_table_schema(table),
                        None => eprintln!("❌ No such table: {}", name),
                    }
                }
                ".solution" => display_outcome(session.run_solution(), json)?,
                ".reset" => match session.reset() {
                    Ok(()) => println!("✅ Database reset to the exercise schema"),
                    Err(e) => eprintln!("❌ Reset failed: {}", e),
                },
                _ => {
                    eprintln!("❌ Unknown command: {}", input);
                    println!("💡 Type '.help' for available commands");
                }
            }
            continue;
        }

        if input.is_empty() {
            continue;
        }

        multiline_sql.push_str(input);
        multiline_sql.push('\n');

        if input.ends_with(';') {
            display_outcome(session.execute(&multiline_sql), json)?;
            multiline_sql.clear();
        }
    }

    Ok(())
}

fn display_outcome(outcome: QueryOutcome, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&outcome.into_result())?);
        return Ok(());
    }

    match outcome {
        QueryOutcome::Rows { columns, rows } => display_table(&columns, &rows),
        QueryOutcome::Empty => println!("📊 No results"),
        QueryOutcome::Failed(msg) => eprintln!("❌ {}", msg),
    }
    Ok(())
}

fn cell_text(value: Option<&Value>) -> String {
    let s = value.map(Value::to_string).unwrap_or_default();
    if s.chars().count() > MAX_CELL_WIDTH {
        let head: String = s.chars().take(MAX_CELL_WIDTH - 3).collect();
        format!("{}...", head)
    } else {
        s
    }
}

fn display_table(columns: &[String], rows: &[SqlRow]) {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| columns.iter().map(|c| cell_text(row.get(c))).collect())
        .collect();

    // 计算列宽
    let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
    for row in &cells {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    print_rule(&widths, '┌', '┬', '┐');
    print_cells(columns, &widths);
    print_rule(&widths, '├', '┼', '┤');
    for row in &cells {
        print_cells(row, &widths);
    }
    print_rule(&widths, '└', '┴', '┘');

    println!("\n📊 {} row(s) returned", rows.len());
}

fn print_rule(widths: &[usize], left: char, mid: char, right: char) {
    let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
    println!("{}{}{}", left, segments.join(mid.to_string().as_str()), right);
}

fn print_cells(cells: &[String], widths: &[usize]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!(" {:width$} ", cell, width = *width))
        .collect();
    println!("│{}│", padded.join("│"));
}

fn list_tables(session: &SessionManager, json: bool) -> anyhow::Result<()> {
    let catalog = session.catalog();

    if json {
        println!("{}", serde_json::to_string_pretty(&catalog)?);
        return Ok(());
    }

    if catalog.tables.is_empty() {
        println!("📊 No tables found");
    }
    for table in &catalog.tables {
        println!("📋 {} ({})", table.name, table.columns.join(", "));
        if !table.sample_data.is_empty() {
            display_table(&table.columns, &table.sample_data);
        }
        println!();
    }
    for failure in &catalog.failures {
        eprintln!("⚠️  {}: {}", failure.table, failure.message);
    }
    Ok(())
}

fn show_table_schema(table: &TableInfo) {
    println!("📋 Table: {}", table.name);
    println!("┌─────────────────┬──────────────┬──────────┬────┐");
    println!("│ Column          │ Type         │ Nullable │ PK │");
    println!("├─────────────────┼──────────────┼──────────┼────┤");

    for col in &table.column_details {
        let nullable = if col.not_null { "NO" } else { "YES" };
        let pk = if col.primary_key > 0 { "✓" } else { "" };
        println!(
            "│ {:15} │ {:12} │ {:8} │ {:2} │",
            col.name, col.declared_type, nullable, pk
        );
    }

    println!("└─────────────────┴──────────────┴──────────┴────┘");

    for fk in &table.foreign_keys {
        println!(
            "  🔗 {} -> {}({})",
            fk.from_column,
            fk.to_table,
            fk.to_column.as_deref().unwrap_or("<primary key>")
        );
    }
}

fn print_interactive_help() {
    println!(
        r#"
特殊命令:
  .help              显示此帮助
  .exit, .quit       退出程序
  .tables            列出所有表及样例数据
  .schema            显示所有表的结构
  .schema <table>    显示指定表的结构
  .solution          运行参考答案
  .reset             重建练习数据库（丢弃所有修改）

SQL 语句以分号结尾，可跨多行输入:
  SELECT name, count(*)
    FROM orders
   GROUP BY name;
"#
    );
}
