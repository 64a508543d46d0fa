use anyhow::Result;
use bitcore::areas::repository::Repository;
use bitcore::commands::plumbing::cat_file::CatFileMode;
use bitcore::config::RepositoryLayout;
use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `BIT_LOG=bitcore=debug`
const LOG_ENV: &str = "BIT_LOG";

#[derive(Parser)]
#[command(
    name = "bit",
    version = "0.1.0",
    author = "Sami Barbut-Dica",
    about = "Plumbing for a git-compatible object store and index",
    long_about = "Inspect and update the object database, references and staging index \
    of an existing git repository. Repositories are not created here.",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
    {all-args}
",
)]
struct Cli {
    #[arg(short = 'C', global = true, help = "Run as if started in this directory")]
    directory: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        name = "hash-object",
        about = "Hash a file as a blob and optionally write it to the object database"
    )]
    HashObject {
        #[arg(short, long, help = "Write the object to the object database")]
        write: bool,
        #[arg(index = 1)]
        file: PathBuf,
    },
    #[command(
        name = "cat-file",
        about = "Print the type or content of an object",
        group(ArgGroup::new("mode").required(true).args(["pretty", "kind"]))
    )]
    CatFile {
        #[arg(short = 'p', help = "Pretty-print the object's content")]
        pretty: bool,
        #[arg(short = 't', help = "Print the object's type")]
        kind: bool,
        #[arg(index = 1, help = "Object id or reference name")]
        object: String,
    },
    #[command(name = "add", about = "Stage files and directories")]
    Add {
        #[arg(index = 1, required = true, num_args = 1..)]
        paths: Vec<String>,
    },
    #[command(name = "ls-files", about = "List the entries of the index")]
    LsFiles {
        #[arg(short, long, help = "Show mode, object id and stage")]
        stage: bool,
    },
    #[command(name = "rev-parse", about = "Resolve a reference name to an object id")]
    RevParse {
        #[arg(index = 1)]
        name: String,
    },
    #[command(name = "symbolic-ref", about = "Show the reference a symbolic reference points to")]
    SymbolicRef {
        #[arg(long, help = "Print the short name, e.g. master")]
        short: bool,
        #[arg(index = 1, default_value = "HEAD")]
        name: String,
    },
    #[command(name = "write-tree", about = "Store the index as tree objects")]
    WriteTree,
    #[command(name = "status", about = "Show staged, unstaged and untracked changes")]
    Status {
        #[arg(long, help = "Machine-readable output")]
        porcelain: bool,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let pwd = match cli.directory {
        Some(directory) => directory.canonicalize()?,
        None => std::env::current_dir()?,
    };
    let mut repository = Repository::open(RepositoryLayout::locate_work_tree(&pwd))?;
    let mut stdout = std::io::stdout().lock();

    match &cli.command {
        Commands::HashObject { write, file } => {
            repository.hash_object(&pwd.join(file), *write, &mut stdout)?
        }
        Commands::CatFile { pretty, object, .. } => {
            let mode = match pretty {
                true => CatFileMode::Pretty,
                false => CatFileMode::Type,
            };
            repository.cat_file(object, mode, &mut stdout)?
        }
        Commands::Add { paths } => repository.add_command(pwd.clone(), paths)?,
        Commands::LsFiles { stage } => repository.ls_files(*stage, &mut stdout)?,
        Commands::RevParse { name } => repository.rev_parse(name, &mut stdout)?,
        Commands::SymbolicRef { short, name } => {
            repository.symbolic_ref(name, *short, &mut stdout)?
        }
        Commands::WriteTree => repository.write_tree_command(&mut stdout)?,
        Commands::Status { porcelain } => repository.status_command(*porcelain, &mut stdout)?,
    }

    Ok(())
}
