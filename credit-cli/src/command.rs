use anyhow::{Context, Result, bail};
use credit_timeline::{CustomerFilter, Trigger};

pub const HELP: &str = "\
commands:
  next | n                 next page
  prev | p                 previous page
  page <N>                 jump to page N
  filter key=value ...     minTransactions, minDaysWindow, minTotalSpend (empty value clears)
  clear                    drop all filters
  refresh | r              fetch the current page again
  help | ?                 this text
  quit | q                 exit";

#[derive(Debug, PartialEq)]
pub enum Command {
    Trigger(Trigger),
    Help,
    Quit,
}

/// Parse one interactive line. Blank lines yield `None`.
///
/// `filter` starts from `current`, so keys that are not mentioned keep their
/// value, the way a form keeps its other fields.
pub fn parse(line: &str, current: &CustomerFilter) -> Result<Option<Command>> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };

    let command = match verb.to_lowercase().as_str() {
        "next" | "n" => Command::Trigger(Trigger::NextPage),
        "prev" | "previous" | "p" => Command::Trigger(Trigger::PreviousPage),
        "refresh" | "r" => Command::Trigger(Trigger::Refresh),
        "page" => {
            let page = words.next().context("usage: page <N>")?;
            let page = page
                .parse()
                .with_context(|| format!("invalid page number '{page}'"))?;
            Command::Trigger(Trigger::GoToPage(page))
        }
        "filter" => {
            let mut filter = current.clone();
            for assignment in words {
                apply_assignment(&mut filter, assignment)?;
            }
            Command::Trigger(Trigger::SubmitFilter(filter))
        }
        "clear" => Command::Trigger(Trigger::SubmitFilter(CustomerFilter::default())),
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => bail!("unknown command '{other}', try 'help'"),
    };
    Ok(Some(command))
}

fn apply_assignment(filter: &mut CustomerFilter, assignment: &str) -> Result<()> {
    let (key, value) = assignment
        .split_once('=')
        .with_context(|| format!("expected key=value, got '{assignment}'"))?;
    let value = value.trim();

    match key {
        "minTransactions" | "min-transactions" => {
            filter.min_transactions = parse_value(key, value)?;
        }
        "minDaysWindow" | "min-days-window" => {
            filter.min_days_window = parse_value(key, value)?;
        }
        "minTotalSpend" | "min-total-spend" => {
            filter.min_total_spend = parse_value(key, value)?;
        }
        _ => bail!("unknown filter '{key}'"),
    }
    Ok(())
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<Option<T>> {
    if value.is_empty() {
        return Ok(None);
    }
    match value.parse() {
        Ok(parsed) => Ok(Some(parsed)),
        Err(_) => bail!("invalid value '{value}' for {key}"),
    }
}
