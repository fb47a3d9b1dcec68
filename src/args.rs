use clap::{Parser, Subcommand};

/// Collects matchmaker profiles and appends them to a Google Sheet.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON configuration file. Values passed on the command line
    /// take precedence over the values of the file.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path, default secrets.json) The JSON file holding the service account key, either
    /// at the top level or under a `google_sheets` section.
    #[clap(short, long, value_parser)]
    pub secrets: Option<String>,

    /// (URL) The URL of the Google Sheet, as shown in the browser.
    #[clap(long, value_parser)]
    pub sheet_url: Option<String>,

    /// (default Participants) The name of the worksheet (tab) holding the participants.
    #[clap(short, long, value_parser)]
    pub worksheet: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Prints the questions of the form.
    Questions,
    /// Fills the form and appends the profile to the sheet.
    ///
    /// Without any --answer, the questions are asked one by one on the terminal.
    Submit {
        /// (Column=Value, repeatable) The answer to one question. Multi-select values are
        /// separated by `;`.
        #[clap(short, long, value_parser)]
        answer: Vec<String>,
    },
    /// Prints the participants already in the sheet, by name.
    List,
}
