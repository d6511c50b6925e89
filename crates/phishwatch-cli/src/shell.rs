//! Interactive session over one [`Session`], reading commands from stdin.

use std::path::PathBuf;

use anyhow::Context;
use phishwatch_client::AnalysisApi;
use phishwatch_session::Session;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

use crate::{commands, display, read_eml};

const HELP: &str = "\
Commands:
  text <email text>   analyze a single line of text
  text                paste multi-line text, finish with a line containing only '.'
  eml <path>          upload an .eml file
  recent              refresh the recent scans list
  select <id>         load a saved scan into the result view
  trends              refresh scan trends
  show                print the current result view
  help                show this help
  quit                leave the shell";

#[derive(Debug, PartialEq, Eq)]
pub enum ShellCommand {
    Text(Option<String>),
    Eml(PathBuf),
    Recent,
    Select(i64),
    Trends,
    Show,
    Help,
    Quit,
    Empty,
}

pub fn parse_command(line: &str) -> Result<ShellCommand, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word.to_ascii_lowercase().as_str() {
        "" => Ok(ShellCommand::Empty),
        "text" | "t" => Ok(ShellCommand::Text((!rest.is_empty()).then(|| rest.to_string()))),
        "eml" | "e" => {
            if rest.is_empty() {
                Err("usage: eml <path>".to_string())
            } else {
                Ok(ShellCommand::Eml(PathBuf::from(rest)))
            }
        }
        "recent" | "r" => Ok(ShellCommand::Recent),
        "select" | "s" => rest
            .parse::<i64>()
            .map(ShellCommand::Select)
            .map_err(|_| "usage: select <id>".to_string()),
        "trends" => Ok(ShellCommand::Trends),
        "show" => Ok(ShellCommand::Show),
        "help" | "?" => Ok(ShellCommand::Help),
        "quit" | "exit" | "q" => Ok(ShellCommand::Quit),
        other => Err(format!("unknown command '{other}' (try 'help')")),
    }
}

pub async fn run<A: AnalysisApi>(session: &Session<A>, json: bool) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{HELP}\n");
    commands::dashboard(session, json).await;

    loop {
        prompt("\nphishwatch> ").await?;
        let Some(line) = lines.next_line().await.context("reading command")? else {
            break;
        };

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(usage) => {
                eprintln!("{usage}");
                continue;
            }
        };

        match command {
            ShellCommand::Empty => {}
            ShellCommand::Help => println!("{HELP}"),
            ShellCommand::Quit => break,
            ShellCommand::Text(Some(text)) => {
                commands::analyze_text(session, &text, json).await;
            }
            ShellCommand::Text(None) => {
                let text = read_paste(&mut lines).await?;
                commands::analyze_text(session, &text, json).await;
            }
            ShellCommand::Eml(path) => match read_eml(&path) {
                Ok((name, bytes)) => {
                    commands::analyze_eml(session, &name, bytes, json).await;
                }
                Err(err) => eprintln!("{err:#}"),
            },
            ShellCommand::Recent => {
                commands::recent(session, json).await;
            }
            ShellCommand::Select(id) => {
                commands::select_scan(session, id, json).await;
            }
            ShellCommand::Trends => {
                commands::trends(session, json).await;
            }
            ShellCommand::Show => show(session),
        }
    }
    Ok(())
}

fn show<A: AnalysisApi>(session: &Session<A>) {
    if let Some(error) = session.primary_error() {
        eprintln!("Last attempt failed: {error}");
    }
    match session.current_view() {
        Some(view) => {
            let selected = session.selected_scan();
            print!("{}", display::render_analysis(&view, selected.as_ref()));
        }
        None => {
            println!("No result yet. Submit pasted email text or upload an .eml file to see the analysis.");
        }
    }
}

async fn read_paste(lines: &mut Lines<BufReader<Stdin>>) -> anyhow::Result<String> {
    println!("Paste the email, then a line with only '.':");
    let mut text = String::new();
    while let Some(line) = lines.next_line().await.context("reading pasted text")? {
        if line.trim_end() == "." {
            break;
        }
        text.push_str(&line);
        text.push('\n');
    }
    Ok(text)
}

async fn prompt(text: &str) -> anyhow::Result<()> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(text.as_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}
