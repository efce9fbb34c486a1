//! Commands typed on stdin.

use anyhow::{Context, bail};
use std::str::FromStr;

pub const HELP: &str = "\
commands:
  games            refresh the game list
  create <goal>    create a game with a goal score
  join <game_id>   join a listed game
  leave <game_id>  leave a game
  choose <n>       select a choice in the active game
  quit             leave the server and exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Games,
    Create(u32),
    Join(String),
    Leave(String),
    Choose(u32),
    Quit,
    Help,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            bail!("empty command");
        };
        let argument = words.next();
        if words.next().is_some() {
            bail!("too many arguments for '{name}'");
        }

        let required = |what: &str| argument.with_context(|| format!("'{name}' needs <{what}>"));
        let number = |what: &str| -> anyhow::Result<u32> {
            let value = required(what)?;
            value
                .parse()
                .with_context(|| format!("<{what}> must be a non-negative number, got '{value}'"))
        };

        let command = match name.to_ascii_lowercase().as_str() {
            "games" => Command::Games,
            "create" => Command::Create(number("goal")?),
            "join" => Command::Join(required("game_id")?.to_string()),
            "leave" => Command::Leave(required("game_id")?.to_string()),
            "choose" => Command::Choose(number("n")?),
            "quit" | "exit" => Command::Quit,
            "help" | "?" => Command::Help,
            other => bail!("unknown command '{other}', type 'help'"),
        };
        Ok(command)
    }
}
