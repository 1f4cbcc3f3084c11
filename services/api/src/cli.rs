use crate::demo::{run_demo, run_interview_export, DemoArgs, ExportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use taxprep::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Tax Prep Site Services",
    about = "Run the tax-prep collection service and interview tooling from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP collection service (default command)
    Serve(ServeArgs),
    /// Interview wizard tooling
    Interview {
        #[command(subcommand)]
        command: InterviewCommand,
    },
    /// Run an end-to-end demo covering the wizard, export, and intake
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum InterviewCommand {
    /// Render a record's summary PDF and flat CSV to local files
    Export(ExportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Interview {
            command: InterviewCommand::Export(args),
        } => run_interview_export(args),
        Command::Demo(args) => run_demo(args).await,
    }
}
