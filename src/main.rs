mod args;
mod villa;

use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use log::{debug, info, warn};
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;

use villa_survey::questionnaire::LOVE_ISLAND;
use villa_survey::Participants;

use crate::args::{Args, Command};
use crate::villa::client::ClientProvider;
use crate::villa::config_reader::{read_config, AppConfig};
use crate::villa::credentials::SecretsFile;
use crate::villa::io_gsheets::{cell_to_json, GoogleConnector};
use crate::villa::{form, Notice, SheetResult, Session};

fn config_from_args(args: &Args) -> SheetResult<AppConfig> {
    let from_file = match &args.config {
        Some(path) => read_config(path)?,
        None => AppConfig::default(),
    };
    let from_flags = AppConfig {
        sheet_url: args.sheet_url.clone(),
        worksheet_name: args.worksheet.clone(),
        secrets_path: args.secrets.clone(),
        ..AppConfig::default()
    };
    Ok(from_file.merge(from_flags))
}

fn print_notices(session: &mut Session) {
    for n in session.take_notices() {
        match n {
            Notice::Error(msg) => eprintln!("error: {}", msg),
            Notice::Success(msg) => println!("{}", msg),
            Notice::Info(msg) => println!("{}", msg),
        }
    }
}

fn participants_json(participants: &Participants) -> JSValue {
    let mut res = JSMap::new();
    for (name, record) in participants.iter() {
        let fields: JSMap<String, JSValue> = record
            .iter()
            .map(|(k, v)| (k.clone(), cell_to_json(v)))
            .collect();
        res.insert(name.clone(), JSValue::Object(fields));
    }
    JSValue::Object(res)
}

/// Returns false when the command ran but did not succeed.
fn run(args: &Args) -> SheetResult<bool> {
    if let Command::Questions = args.command {
        print!("{}", form::describe(LOVE_ISLAND));
        return Ok(true);
    }

    let config = config_from_args(args)?;
    debug!("run: config: {:?}", config);
    let provider = ClientProvider::new(
        SecretsFile::new(config.secrets_path()),
        GoogleConnector::new(config.api_base()),
        config.cache_ttl(),
    );
    let mut session = Session::new(provider, config.target());

    match &args.command {
        Command::Questions => Ok(true),
        Command::List => {
            let participants = session.load_participants();
            let failed = !session.notices().is_empty();
            if participants.is_empty() && !failed {
                session.inform("No participants yet.");
            }
            print_notices(&mut session);
            if participants.is_empty() {
                return Ok(!failed);
            }
            let js = participants_json(&participants);
            println!("{}", serde_json::to_string_pretty(&js).unwrap_or_default());
            Ok(true)
        }
        Command::Submit { answer } => {
            let participants = session.load_participants();
            info!("run: {} participants before submitting", participants.len());
            print_notices(&mut session);
            let answers = if answer.is_empty() {
                let stdin = io::stdin();
                let stdout = io::stdout();
                let sheet =
                    form::prompt_answers(LOVE_ISLAND, &mut stdin.lock(), &mut stdout.lock())?;
                println!();
                sheet
            } else {
                form::answers_from_pairs(LOVE_ISLAND, answer)?
            };
            let ok = session.submit(&answers);
            print_notices(&mut session);
            Ok(ok)
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    if args.verbose {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::init();
    }
    debug!("args: {:?}", args);

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            warn!("main: {:?}", e);
            eprintln!("error: {}", e);
            let _ = io::stderr().flush();
            ExitCode::FAILURE
        }
    }
}
