use anyhow::Context;
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use clap::{Parser, Subcommand};
use netezza_loader::db::ConnectArgsBuilder;
use netezza_loader::formats::conversion::batch_to_rows;
use netezza_loader::formats::{Format, read_source};
use netezza_loader::session::{DumpOptionsBuilder, ExecuteOptions, LoadOptionsBuilder, Session};
use std::path::PathBuf;

#[derive(Parser, Clone)]
#[command(name = "nzload", about = "Move tables between local files and Netezza")]
struct Args {
    /// Netezza host
    #[arg(long, env = "NZ_HOST")]
    host: String,

    /// Database to connect to
    #[arg(short, long, env = "NZ_DATABASE")]
    database: String,

    /// Database username
    #[arg(short, long, env = "NZ_USER")]
    user: String,

    /// Database password
    #[arg(short, long, env = "NZ_PASSWORD", hide_env_values = true)]
    password: String,

    /// Echo every statement before running it
    #[arg(short, long)]
    verbose: bool,

    /// Print statements instead of running them
    #[arg(long)]
    dry_run: bool,

    /// Quiet mode - only warnings from the log
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Subcommand)]
enum Command {
    /// Run a query and print its result set
    Query { sql: String },

    /// Run a statement and commit it
    Exec {
        sql: String,

        /// Report a failed statement without failing the command
        #[arg(long)]
        ignore_errors: bool,
    },

    /// Check whether a table exists in the database
    Exists { table: String },

    /// Count the rows of a table
    Count { table: String },

    /// Create a table from a local CSV, TSV or parquet file
    Load {
        /// Path to the source file
        source: PathBuf,

        /// Destination table name
        table: String,

        /// File format (csv, tsv, parquet) - auto-detected from extension if not specified
        #[arg(short, long)]
        format: Option<String>,

        /// Drop the destination table first if it exists
        #[arg(long)]
        clobber: bool,

        /// Distribution key columns, or "random"
        #[arg(long, default_value = "random")]
        distribute_on: String,

        /// Column types to use instead of the mapped ones (format: bigint,varchar(20))
        #[arg(long)]
        types: Option<String>,

        /// Load with maxerrors 0
        #[arg(long)]
        ignore_load_errors: bool,
    },

    /// Print a table as CSV on standard output
    Read {
        table: String,

        /// Verbatim where clause
        #[arg(long = "where", default_value = "")]
        where_clause: String,

        /// Verbatim order by clause
        #[arg(long, default_value = "")]
        order_by: String,
    },

    /// Write a table to a file on this machine through an external table
    Dump {
        table: String,
        out_file: String,

        #[arg(long, default_value = ",")]
        delimiter: String,

        #[arg(long)]
        order_by: Option<String>,

        /// Accepted but not applied
        #[arg(long)]
        compress: bool,
    },

    /// Check the connection with a trivial query
    SelfTest,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    let filter = if args.quiet {
        EnvFilter::new("netezza_loader=warn,nzload=warn")
    } else {
        EnvFilter::new("netezza_loader=info,nzload=info")
    };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let connect_args = ConnectArgsBuilder::default()
        .host(args.host.clone())
        .database(args.database.clone())
        .user(args.user.clone())
        .password(args.password.clone())
        .build()?;

    let mut session = Session::open(connect_args).await?;
    session.set_dry_run(args.dry_run);
    session.set_verbosity(if args.verbose { 1 } else { 0 });

    run_command(&mut session, &args).await?;
    session.close();
    Ok(())
}

async fn run_command(session: &mut Session, args: &Args) -> anyhow::Result<()> {
    match &args.command {
        Command::Query { sql } => {
            if let Some(batch) = session.execute(sql, ExecuteOptions::query()).await? {
                print_table(&batch)?;
            }
        }
        Command::Exec { sql, ignore_errors } => {
            session
                .execute(
                    sql,
                    ExecuteOptions::statement().ignore_errors(*ignore_errors),
                )
                .await?;
        }
        Command::Exists { table } => {
            let exists = session.table_exists(table).await?;
            println!("{}", exists);
        }
        Command::Count { table } => {
            let count = session.row_count(table).await?;
            println!("{}", count);
        }
        Command::Load {
            source,
            table,
            format,
            clobber,
            distribute_on,
            types,
            ignore_load_errors,
        } => {
            let format = match format {
                Some(f) => Format::parse(f)?,
                None => Format::detect(source).ok_or_else(|| {
                    anyhow::anyhow!(
                        "Could not detect format from file '{}'.\n\
                         Supported extensions: .csv, .tsv, .parquet\n\
                         Please specify --format explicitly.",
                        source.display()
                    )
                })?,
            };
            let batch = read_source(source, format)
                .with_context(|| format!("Failed to read {}", source.display()))?;

            let mut options = LoadOptionsBuilder::default();
            options
                .distribute_on(distribute_on.clone())
                .clobber(*clobber)
                .ignore_load_errors(*ignore_load_errors)
                .verbose(args.verbose);
            if let Some(types) = types {
                options.column_types(cli::parse_types(types)?);
            }
            let options = options.build()?;

            let summary = session
                .load_table(&batch, &args.database, table, &options)
                .await?;

            if !args.quiet {
                println!();
                println!("Load Summary");
                println!("============");
                println!("Table: {}", summary.table);
                println!("Source rows: {}", summary.source_rows);
                println!("Loaded rows: {}", summary.loaded_rows);
                println!("Staging file: {}", summary.staging_path.display());
            }
        }
        Command::Read {
            table,
            where_clause,
            order_by,
        } => {
            if let Some(batch) = session
                .query_table(&args.database, table, where_clause, order_by)
                .await?
            {
                write_csv(&batch)?;
            }
        }
        Command::Dump {
            table,
            out_file,
            delimiter,
            order_by,
            compress,
        } => {
            let mut options = DumpOptionsBuilder::default();
            options.delimiter(delimiter.clone()).compress(*compress);
            if let Some(order_by) = order_by {
                options.order_by(order_by.clone());
            }
            session
                .dump_to_disk(table, out_file, &options.build()?)
                .await?;
        }
        Command::SelfTest => {
            let probe = "select user, current_timestamp";
            if let Some(batch) = session
                .execute(probe, ExecuteOptions::query().print_query(true))
                .await?
            {
                print_table(&batch)?;
            }
        }
    }
    Ok(())
}

fn print_table(batch: &RecordBatch) -> anyhow::Result<()> {
    println!("{}", pretty_format_batches(std::slice::from_ref(batch))?);
    Ok(())
}

/// Header row plus every row, comma-delimited
fn write_csv(batch: &RecordBatch) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(std::io::stdout().lock());
    let schema = batch.schema();
    writer.write_record(schema.fields().iter().map(|f| f.name().as_str()))?;
    for row in batch_to_rows(batch)? {
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

/// CLI utility functions for parsing command-line arguments
mod cli {
    /// Split a column type list like `bigint,numeric(10,2),varchar(20)`.
    ///
    /// Commas inside parentheses belong to the type.
    pub fn parse_types(types: &str) -> anyhow::Result<Vec<String>> {
        let mut parsed = Vec::new();
        let mut current = String::new();
        let mut depth = 0usize;

        for c in types.chars() {
            match c {
                '(' => {
                    depth += 1;
                    current.push(c);
                }
                ')' => {
                    depth = depth.checked_sub(1).ok_or_else(|| {
                        anyhow::anyhow!("Unbalanced ')' in column types '{}'", types)
                    })?;
                    current.push(c);
                }
                ',' if depth == 0 => parsed.push(std::mem::take(&mut current)),
                _ => current.push(c),
            }
        }
        if depth != 0 {
            return Err(anyhow::anyhow!("Unbalanced '(' in column types '{}'", types));
        }
        parsed.push(current);

        let parsed: Vec<String> = parsed.into_iter().map(|t| t.trim().to_string()).collect();
        if parsed.iter().any(String::is_empty) {
            return Err(anyhow::anyhow!(
                "Column types cannot be empty in '{}'. Example: --types \"bigint,varchar(20)\"",
                types
            ));
        }
        Ok(parsed)
    }

}
