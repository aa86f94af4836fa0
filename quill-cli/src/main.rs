//! Quill CLI - The Quill language command line interface.
//! Quill CLI - Quill 语言的命令行界面。

mod commands;

use clap::{Parser, Subcommand};

/// Main CLI structure.
/// 主 CLI 结构体。
#[derive(Parser)]
#[command(name = "quill")]
#[command(author, version, about = "Quill - A scripting language for structured documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output. / 启用详细输出。
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available CLI commands.
/// 可用的 CLI 命令。
#[derive(Subcommand)]
enum Commands {
    /// Evaluate one statement. / 求值一条语句。
    Eval {
        /// The statement to evaluate. / 要求值的语句。
        statement: String,
    },

    /// Run a Quill program document (JSON). / 运行 Quill 程序文档（JSON）。
    Run {
        /// The file to run. / 要运行的文件。
        file: String,
    },

    /// Start an interactive REPL. / 启动交互式 REPL。
    Repl,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Eval { statement } => commands::eval::run(&statement),
        Commands::Run { file } => commands::run::run(&file, cli.verbose),
        Commands::Repl => commands::repl::run(),
    };

    if let Err(message) = result {
        eprintln!("error: {message}");
        std::process::exit(1);
    }
}
