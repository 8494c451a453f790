//! Command-line front end for the Swiss zipcodes database.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use zipch::cli::Command;
use zipch::{ArchiveSource, Cli, HttpArchiveSource, LocalArchiveSource, ZipcodesDatabase};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so results on stdout stay pipeable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level())),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config()?;

    if let Some(ref archive) = cli.archive {
        let db = ZipcodesDatabase::with_source(
            &cli.file,
            LocalArchiveSource::new(archive),
            config.encoding,
        );
        run(&db, &cli.command).await
    } else {
        let db = ZipcodesDatabase::with_source(
            &cli.file,
            HttpArchiveSource::new(&config)?,
            config.encoding,
        );
        run(&db, &cli.command).await
    }
}

/// Execute one subcommand, printing results to stdout
async fn run<S: ArchiveSource>(db: &ZipcodesDatabase<S>, command: &Command) -> Result<()> {
    match command {
        Command::Download { force } => {
            db.download(*force).await?;
        }
        Command::Location { zipcode, wgs84 } => {
            let location = db.get_location(*zipcode).await?;
            println!("{} {}", zipcode, location);
            if *wgs84 {
                match location.wgs84() {
                    Some(coordinates) => println!("{}", coordinates),
                    None => eprintln!("No coordinates for {}", zipcode),
                }
            }
        }
        Command::Canton { canton } => {
            print_zipcodes(db.get_zipcodes_for_canton(canton).await?);
        }
        Command::Municipality { name } => {
            print_zipcodes(db.get_zipcodes_for_municipality(name).await?);
        }
        Command::Cantons => {
            for canton in db.get_cantons().await? {
                println!("{}", canton);
            }
        }
        Command::Municipalities => {
            for municipality in db.get_municipalities().await? {
                println!("{}", municipality);
            }
        }
    }

    Ok(())
}

fn print_zipcodes(zipcodes: Vec<u32>) {
    for zipcode in zipcodes {
        println!("{}", zipcode);
    }
}
