//! Operator console
//!
//! Line-based front end over [`Terminal`]. Scans arrive from the bridge on
//! their own; the operator types commands for everything else.

use std::str::FromStr;

use shared::models::{CartLine, PaymentMethod};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use crate::checkout::CheckoutOutcome;
use crate::terminal::Terminal;

pub const HELP: &str = "\
Commands:
  plu <code>            weigh a produce item and add it
  + <line> [n]          increase quantity (default 1)
  - <line> [n]          decrease quantity (default 1)
  rm <line>             remove a line
  cart                  show the cart
  pay cash|wallet       check out
  invoice <order id>    download an invoice PDF
  login <user> <pass>   sign in a member
  logout                clear the cart and continue as guest
  help                  this text
  quit                  exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Plu(String),
    Adjust { line: String, delta: i32 },
    Remove(String),
    Cart,
    Pay(PaymentMethod),
    Invoice(String),
    Login { username: String, password: String },
    Logout,
    Help,
    Quit,
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCommandError(pub String);

impl std::fmt::Display for ParseCommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ParseCommandError {}

fn usage(text: &str) -> ParseCommandError {
    ParseCommandError(format!("usage: {text}"))
}

fn parse_count(arg: Option<&str>) -> Result<i32, ParseCommandError> {
    match arg {
        None => Ok(1),
        Some(n) => n
            .parse::<i32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| ParseCommandError(format!("not a positive count: {n}"))),
    }
}

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut parts = input.split_whitespace();
        let Some(head) = parts.next() else {
            return Ok(Command::Empty);
        };
        let args: Vec<&str> = parts.collect();

        match (head.to_ascii_lowercase().as_str(), args.as_slice()) {
            ("plu", [code]) => Ok(Command::Plu((*code).to_string())),
            ("plu", _) => Err(usage("plu <code>")),
            (sign @ ("+" | "-"), [line, rest @ ..]) if rest.len() <= 1 => {
                let n = parse_count(rest.first().copied())?;
                let delta = if sign == "+" { n } else { -n };
                Ok(Command::Adjust {
                    line: (*line).to_string(),
                    delta,
                })
            }
            ("+" | "-", _) => Err(usage("+|- <line> [n]")),
            ("rm", [line]) => Ok(Command::Remove((*line).to_string())),
            ("rm", _) => Err(usage("rm <line>")),
            ("cart", []) => Ok(Command::Cart),
            ("pay", [method]) => match method.to_ascii_lowercase().as_str() {
                "cash" => Ok(Command::Pay(PaymentMethod::Cash)),
                "wallet" | "momo" => Ok(Command::Pay(PaymentMethod::Wallet)),
                _ => Err(usage("pay cash|wallet")),
            },
            ("pay", _) => Err(usage("pay cash|wallet")),
            ("invoice", [order_id]) => Ok(Command::Invoice((*order_id).to_string())),
            ("invoice", _) => Err(usage("invoice <order id>")),
            ("login", [username, password]) => Ok(Command::Login {
                username: (*username).to_string(),
                password: (*password).to_string(),
            }),
            ("login", _) => Err(usage("login <user> <pass>")),
            ("logout", []) => Ok(Command::Logout),
            ("help" | "?", _) => Ok(Command::Help),
            ("quit" | "exit", _) => Ok(Command::Quit),
            (other, _) => Err(ParseCommandError(format!("unknown command: {other}"))),
        }
    }
}

/// Render the cart as a table, numbering lines from 1
pub fn render_cart(lines: &[CartLine], total_amount: i64, total_quantity: u64) -> String {
    if lines.is_empty() {
        return "Cart is empty".to_string();
    }
    let mut out = String::new();
    for (index, line) in lines.iter().enumerate() {
        let detail = match &line.weight_grams {
            Some(grams) => format!("{grams} g"),
            None => format!("x{}", line.quantity),
        };
        out.push_str(&format!(
            "{:>3}  {:<28} {:>10} {:>12}\n",
            index + 1,
            line.name,
            detail,
            line.line_total().unwrap_or(i64::MAX)
        ));
    }
    out.push_str(&format!("     {total_quantity} item(s), total {total_amount}"));
    out
}

/// Resolve a line reference: a 1-based position or a line id
fn resolve_line(lines: &[CartLine], reference: &str) -> Option<String> {
    if let Ok(position) = reference.parse::<usize>()
        && let Some(line) = position.checked_sub(1).and_then(|i| lines.get(i))
    {
        return Some(line.line_id.clone());
    }
    lines
        .iter()
        .find(|l| l.line_id == reference)
        .map(|l| l.line_id.clone())
}

/// Read commands from stdin until `quit`, EOF or shutdown
pub async fn run(terminal: &Terminal, shutdown: CancellationToken) -> std::io::Result<()> {
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    println!("{HELP}");

    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => break,
            line = input.next_line() => line?,
        };
        let Some(line) = line else { break };

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }
        execute(terminal, command).await;
    }
    Ok(())
}

/// Failures are reported through notices, so results are only printed on success
async fn execute(terminal: &Terminal, command: Command) {
    match command {
        Command::Plu(code) => {
            if let Ok(line) = terminal.add_by_plu(&code).await {
                println!("{} {}", line.name, line.unit_price);
            }
        }
        Command::Adjust { line, delta } => {
            let lines = terminal.cart_lines();
            match resolve_line(&lines, &line) {
                Some(line_id) => {
                    let _ = terminal.adjust_line(&line_id, delta);
                }
                None => println!("no such line: {line}"),
            }
        }
        Command::Remove(line) => {
            let lines = terminal.cart_lines();
            match resolve_line(&lines, &line) {
                Some(line_id) => {
                    let _ = terminal.remove_line(&line_id);
                }
                None => println!("no such line: {line}"),
            }
        }
        Command::Cart => {
            println!(
                "{}",
                render_cart(&terminal.cart_lines(), terminal.total_amount(), terminal.total_quantity())
            );
            if let Some(barcode) = terminal.last_observed_barcode() {
                println!("     last scan {barcode}");
            }
            println!("     ~{} point(s)", terminal.provisional_points());
        }
        Command::Pay(method) => match terminal.submit_checkout(method).await {
            Ok(CheckoutOutcome::Paid(receipt)) => {
                println!(
                    "Order {}: {} item(s), total {}, {} point(s) earned",
                    receipt.order_id, receipt.total_quantity, receipt.total_amount, receipt.points_earned
                );
            }
            Ok(CheckoutOutcome::Redirect { order_id, pay_url }) => {
                println!("Order {order_id}: continue payment at {pay_url}");
            }
            Err(_) => {}
        },
        Command::Invoice(order_id) => {
            let _ = terminal.download_invoice(&order_id).await;
        }
        Command::Login { username, password } => {
            let _ = terminal.login(&username, &password).await;
        }
        Command::Logout => terminal.logout(),
        Command::Help => println!("{HELP}"),
        Command::Quit | Command::Empty => {}
    }
}
