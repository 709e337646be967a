use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};
#[cfg(feature = "logging")]
use env_logger::Env;

use wavlaw::{convert_file, read_header, ConvertOptions, DEFAULT_OUTPUT};

#[derive(Parser)]
#[command(name = "wavlaw")]
#[command(about = "Convert wav files between 16-bit PCM and G.711 mu-law")]
#[command(author, version, long_about = None)]
struct Cli {
    /// The wav file to convert
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Where to write the converted file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Print the header of INPUT and exit without converting
    #[arg(long)]
    info: bool,

    /// Replace OUTPUT if it already exists
    #[arg(short, long)]
    force: bool,

    /// More logging, repeat for more (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    init_logging(cli.verbose);

    let result = if cli.info {
        read_header(&cli.input).map(|header| println!("{}", header))
    } else {
        let options = ConvertOptions {
            overwrite: cli.force,
        };
        convert_file(&cli.input, &cli.output, &options).map(|_| ())
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            #[cfg(feature = "logging")]
            log::error!("{}: {}", cli.input.display(), e);
            #[cfg(not(feature = "logging"))]
            eprintln!("{}: {}", cli.input.display(), e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(feature = "logging")]
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();
}
