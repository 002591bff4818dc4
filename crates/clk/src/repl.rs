//! Session command parsing

use anyhow::{anyhow, bail, Context, Result};
use clicker::{Phase, Step};

pub const HELP: &str = "\
Commands:
  arm <pre|main|post>          phase the trigger key records into
  list                         show all recorded steps
  start                        play PRE, MAIN, POST
  cancel                       stop PRE/MAIN of the active run
  wait                         block until the active run ends
  status                       run state, armed phase, settings
  delay <ms>                   delay for newly captured steps
  loop on|off                  repeat MAIN until cancelled
  count <n>                    stored loop count
  edit <phase> <i> <x> <y> <ms>
  rm <phase> <i>
  up <phase> <i> / down <phase> <i>
  goto <phase> <i>             move the pointer to a step
  clear                        remove every step
  save [file]                  save sequences (default: last file)
  load <file>
  files                        list saved sequence files
  help
  quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Arm(Phase),
    List,
    Start,
    Cancel,
    Wait,
    Status,
    Delay(u64),
    Loop(bool),
    Count(i64),
    Edit { phase: Phase, index: usize, step: Step },
    Remove { phase: Phase, index: usize },
    Up { phase: Phase, index: usize },
    Down { phase: Phase, index: usize },
    Goto { phase: Phase, index: usize },
    Clear,
    Save(Option<String>),
    Load(String),
    Files,
    Help,
    Quit,
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse(line: &str) -> Result<Option<Command>> {
    let mut words = line.split_whitespace();
    let Some(name) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let cmd = match (name.to_lowercase().as_str(), args.as_slice()) {
        ("arm", [phase]) => Command::Arm(parse_phase(phase)?),
        ("list" | "ls", []) => Command::List,
        ("start" | "run", []) => Command::Start,
        ("cancel" | "stop", []) => Command::Cancel,
        ("wait", []) => Command::Wait,
        ("status", []) => Command::Status,
        ("delay", [ms]) => {
            let ms: u64 = number(ms, "delay")?;
            if ms == 0 {
                bail!("delay must be greater than 0");
            }
            Command::Delay(ms)
        }
        ("loop", [flag]) => Command::Loop(match flag.to_lowercase().as_str() {
            "on" | "true" | "1" => true,
            "off" | "false" | "0" => false,
            other => bail!("expected on or off, got '{}'", other),
        }),
        ("count", [n]) => Command::Count(number(n, "count")?),
        ("edit", [phase, index, x, y, ms]) => Command::Edit {
            phase: parse_phase(phase)?,
            index: number(index, "index")?,
            step: Step::new(number(x, "x")?, number(y, "y")?, number(ms, "delay")?),
        },
        ("rm" | "remove", [phase, index]) => {
            let (phase, index) = target(phase, index)?;
            Command::Remove { phase, index }
        }
        ("up", [phase, index]) => {
            let (phase, index) = target(phase, index)?;
            Command::Up { phase, index }
        }
        ("down", [phase, index]) => {
            let (phase, index) = target(phase, index)?;
            Command::Down { phase, index }
        }
        ("goto", [phase, index]) => {
            let (phase, index) = target(phase, index)?;
            Command::Goto { phase, index }
        }
        ("clear", []) => Command::Clear,
        ("save", []) => Command::Save(None),
        ("save", [file]) => Command::Save(Some(file.to_string())),
        ("load", [file]) => Command::Load(file.to_string()),
        ("files", []) => Command::Files,
        ("help" | "?", []) => Command::Help,
        ("quit" | "exit" | "q", []) => Command::Quit,
        (other, _) => bail!("unknown command or wrong arguments: '{}' (try 'help')", other),
    };
    Ok(Some(cmd))
}

fn parse_phase(s: &str) -> Result<Phase> {
    s.parse().map_err(|e| anyhow!("{}", e))
}

fn number<T: std::str::FromStr>(s: &str, what: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    s.parse().with_context(|| format!("invalid {}: '{}'", what, s))
}

fn target(phase: &str, index: &str) -> Result<(Phase, usize)> {
    Ok((parse_phase(phase)?, number(index, "index")?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_line_is_nothing() {
        assert_eq!(parse("   ").unwrap(), None);
    }

    #[test]
    fn parses_editing_commands() {
        assert_eq!(parse("arm pre").unwrap(), Some(Command::Arm(Phase::Pre)));
        assert_eq!(
            parse("edit clicks 2 10 20 150").unwrap(),
            Some(Command::Edit { phase: Phase::Main, index: 2, step: Step::new(10, 20, 150) })
        );
        assert_eq!(
            parse("rm post 0").unwrap(),
            Some(Command::Remove { phase: Phase::Post, index: 0 })
        );
        assert_eq!(parse("save").unwrap(), Some(Command::Save(None)));
        assert_eq!(parse("LOOP on").unwrap(), Some(Command::Loop(true)));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse("delay 0").is_err());
        assert!(parse("delay -5").is_err());
        assert!(parse("arm middle").is_err());
        assert!(parse("edit pre 0 a 1 1").is_err());
        assert!(parse("loop maybe").is_err());
        assert!(parse("frobnicate").is_err());
    }
}
