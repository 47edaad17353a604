//! # Counter Session
//!
//! Interactive billing at the till. One session owns one open bill; lines
//! are added by barcode or name, then settled in cash or on loan.
//!
//! ## Session Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Counter Session                                      │
//! │                                                                         │
//! │  > add 4790010000042 2        ──► add_to_bill()     (reserves stock)   │
//! │  > add "samba rice" 1.5       ──► add_to_bill()                        │
//! │  > manual "Carrier bag" 5     ──► add_manual_item() (no stock)         │
//! │  > remove 2                   ──► remove_from_bill()                   │
//! │  > pay cash 1000              ──► settle_cash()  ──► receipt           │
//! │  > pay loan C001              ──► quote, confirm ──► settle_loan()     │
//! │  > quit                       ──► open bill cleared, stock restored    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The session is generic over its input and output so tests can drive it
//! with byte buffers.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};

use crate::commands::{bill, settlement};
use crate::error::{ApiError, ApiResult};
use crate::output::{format, Render};
use crate::state::{BillState, ConfigState, DbState};
use kade_core::{Money, Quantity};

const HELP: &str = "\
Commands:
  add <barcode|name> [qty] [--price P]   add a catalog item
  manual <name> <price> [qty]            add an item not in the catalog
  remove <line>                          remove a line, restoring stock
  clear                                  empty the bill, restoring stock
  show                                   show the bill
  suggest <text>                         product suggestions
  pay cash <amount>                      settle with cash
  pay loan <customer code> [--yes]       charge the bill to a loan account
  help                                   this text
  quit                                   leave (an open bill is cleared)
Quote names with spaces: add \"samba rice\" 2";

/// What the session loop should do after a line.
enum Step {
    Continue,
    Quit,
}

/// An interactive counter session.
pub struct Counter<'a, R, W> {
    db: &'a DbState,
    config: &'a ConfigState,
    bill: BillState,
    json: bool,
    input: R,
    output: W,
}

impl<'a, R, W> Counter<'a, R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(db: &'a DbState, config: &'a ConfigState, input: R, output: W) -> Self {
        Counter {
            db,
            config,
            bill: BillState::new(),
            json: false,
            input,
            output,
        }
    }

    /// Print results as JSON instead of text.
    pub fn json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    /// Runs until `quit` or end of input.
    ///
    /// Command errors are printed and the session carries on; only I/O
    /// failures on the terminal itself end it early. The open bill is
    /// discarded either way.
    pub async fn run(&mut self) -> ApiResult<()> {
        info!("Counter session started");
        let session = self.session().await;
        let closed = self.close().await;
        session.and(closed)
    }

    async fn session(&mut self) -> ApiResult<()> {
        self.write_line("Kade POS counter. Type 'help' for commands.").await?;

        loop {
            self.write("> ").await?;
            let Some(line) = self.read_line().await? else {
                break;
            };

            match self.handle(&line).await {
                Ok(Step::Continue) => {}
                Ok(Step::Quit) => break,
                Err(e) => {
                    warn!(code = ?e.code, "{}", e.message);
                    self.write_line(&format!("Error: {}", e.message)).await?;
                }
            }
        }

        Ok(())
    }

    async fn handle(&mut self, line: &str) -> ApiResult<Step> {
        let tokens = tokenize(line)?;
        let Some((command, args)) = tokens.split_first() else {
            return Ok(Step::Continue);
        };

        match command.to_lowercase().as_str() {
            "add" | "a" => self.add(args).await?,
            "manual" | "m" => self.manual(args).await?,
            "remove" | "rm" => {
                let line = single(args, "remove <line>")?
                    .parse::<usize>()
                    .map_err(|_| ApiError::validation("Line must be a number"))?;
                let resp = bill::remove_from_bill(self.db, &self.bill, line).await?;
                self.print(&resp).await?;
            }
            "clear" => {
                let resp = bill::clear_bill(self.db, &self.bill).await?;
                self.print(&resp).await?;
            }
            "show" | "bill" => {
                let resp = bill::get_bill(&self.bill).await?;
                self.print(&resp).await?;
            }
            "suggest" | "s" => {
                if args.is_empty() {
                    return Err(ApiError::validation("Usage: suggest <text>"));
                }
                let products = bill::suggest_for_bill(self.db, &args.join(" ")).await?;
                self.print(&products).await?;
            }
            "pay" => self.pay(args).await?,
            "help" | "?" => self.write_line(HELP).await?,
            "quit" | "exit" | "q" => return Ok(Step::Quit),
            other => {
                return Err(ApiError::validation(format!(
                    "Unknown command '{}'. Type 'help' for commands.",
                    other
                )))
            }
        }
        Ok(Step::Continue)
    }

    async fn add(&mut self, args: &[String]) -> ApiResult<()> {
        let (mut args, price) = take_option(args, "--price")?;
        let price = price.map(|p| p.parse::<Money>()).transpose()?;

        let mut quantity = Quantity::from_units(1);
        if args.len() > 1 {
            if let Some(qty) = args.last().and_then(|q| q.parse::<Quantity>().ok()) {
                quantity = qty;
                args.pop();
            }
        }
        if args.is_empty() {
            return Err(ApiError::validation("Usage: add <barcode|name> [qty] [--price P]"));
        }

        let resp = bill::add_to_bill(self.db, &self.bill, &args.join(" "), quantity, price).await?;
        self.print(&resp).await
    }

    async fn manual(&mut self, args: &[String]) -> ApiResult<()> {
        let usage = || ApiError::validation("Usage: manual <name> <price> [qty]");

        let (name, price, quantity) = match args {
            [name @ .., price, qty]
                if !name.is_empty() && price.parse::<Money>().is_ok() && qty.parse::<Quantity>().is_ok() =>
            {
                (name.join(" "), price.parse::<Money>()?, Some(qty.parse::<Quantity>()?))
            }
            [name @ .., price] if !name.is_empty() => (name.join(" "), price.parse::<Money>()?, None),
            _ => return Err(usage()),
        };

        let resp = bill::add_manual_item(&self.bill, &name, price, quantity).await?;
        self.print(&resp).await
    }

    async fn pay(&mut self, args: &[String]) -> ApiResult<()> {
        let (args, yes) = take_flag(args, "--yes");
        match args.as_slice() {
            [method, amount] if method.eq_ignore_ascii_case("cash") => {
                let tendered = amount.parse::<Money>()?;
                let resp = settlement::settle_cash(self.db, &self.bill, self.config, tendered).await?;
                self.print(&resp).await
            }
            [method, code] if method.eq_ignore_ascii_case("loan") => {
                if !yes {
                    let quote = settlement::quote_loan_settlement(self.db, &self.bill, code).await?;
                    self.write_line(&quote.prompt()).await?;
                    if !self.confirm().await? {
                        return self.write_line("Cancelled. The bill is still open.").await;
                    }
                }
                let resp = settlement::settle_loan(self.db, &self.bill, self.config, code).await?;
                self.print(&resp).await
            }
            _ => Err(ApiError::validation(
                "Usage: pay cash <amount> | pay loan <customer code> [--yes]",
            )),
        }
    }

    /// Hands back stock held by an unsettled bill.
    async fn close(&mut self) -> ApiResult<()> {
        let open_lines = self.bill.lock().await.line_count();
        if open_lines > 0 {
            bill::clear_bill(self.db, &self.bill).await?;
            info!(lines = open_lines, "Open bill discarded at session end");
            self.write_line("Open bill cleared; reserved stock restored.").await?;
        }
        info!("Counter session ended");
        Ok(())
    }

    // =========================================================================
    // Terminal I/O
    // =========================================================================

    async fn confirm(&mut self) -> ApiResult<bool> {
        self.write("Confirm? [y/N] ").await?;
        let answer = self.read_line().await?.unwrap_or_default();
        Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
    }

    async fn read_line(&mut self) -> ApiResult<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    async fn print<T: Render>(&mut self, value: &T) -> ApiResult<()> {
        let text = format(value, self.json)?;
        self.write_line(&text).await
    }

    async fn write(&mut self, text: &str) -> ApiResult<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.flush().await?;
        Ok(())
    }

    async fn write_line(&mut self, text: &str) -> ApiResult<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        self.output.flush().await?;
        Ok(())
    }
}

// =============================================================================
// Line Parsing
// =============================================================================

/// Splits a line on whitespace, keeping single- or double-quoted text
/// together.
fn tokenize(line: &str) -> ApiResult<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_token = true;
            }
            None if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            None => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if quote.is_some() {
        return Err(ApiError::validation("Unterminated quote"));
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

fn single<'s>(args: &'s [String], usage: &str) -> ApiResult<&'s str> {
    match args {
        [one] => Ok(one.as_str()),
        _ => Err(ApiError::validation(format!("Usage: {}", usage))),
    }
}

/// Removes `--name value` from `args`.
fn take_option(args: &[String], name: &str) -> ApiResult<(Vec<String>, Option<String>)> {
    let mut rest = Vec::with_capacity(args.len());
    let mut value = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == name {
            let v = iter
                .next()
                .ok_or_else(|| ApiError::validation(format!("{} needs a value", name)))?;
            value = Some(v.clone());
        } else {
            rest.push(arg.clone());
        }
    }
    Ok((rest, value))
}

fn take_flag(args: &[String], name: &str) -> (Vec<String>, bool) {
    let rest: Vec<String> = args.iter().filter(|a| *a != name).cloned().collect();
    let present = rest.len() != args.len();
    (rest, present)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::loan::add_customer;
    use crate::commands::product::add_product;
    use crate::commands::test_support::{db, product};
    use kade_core::CustomerDraft;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::BufReader;

    /// Terminal that accepts `remaining` bytes and then fails every write.
    struct ClosingTerminal {
        remaining: usize,
    }

    impl AsyncWrite for ClosingTerminal {
        fn poll_write(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            if buf.len() > self.remaining {
                return Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "terminal closed",
                )));
            }
            self.remaining -= buf.len();
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    async fn session(db: &DbState, script: &str) -> String {
        let config = ConfigState::new("kade.db", "reports");
        let mut out = Vec::new();
        Counter::new(db, &config, BufReader::new(script.as_bytes()), &mut out)
            .run()
            .await
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    async fn stock(db: &DbState, barcode: &str) -> Quantity {
        db.inner()
            .products()
            .get_by_barcode(barcode)
            .await
            .unwrap()
            .unwrap()
            .quantity()
    }

    async fn customer(db: &DbState) {
        add_customer(
            db,
            CustomerDraft {
                customer_code: "C001".to_string(),
                name: "Nimal Perera".to_string(),
                phone: None,
                address: None,
            },
        )
        .await
        .unwrap();
    }

    #[test]
    fn test_tokenize_quotes() {
        assert_eq!(
            tokenize(r#"add "samba rice" 2"#).unwrap(),
            vec!["add", "samba rice", "2"]
        );
        assert_eq!(tokenize("  show  ").unwrap(), vec!["show"]);
        assert_eq!(tokenize(r#"manual '' 5"#).unwrap(), vec!["manual", "", "5"]);
        assert!(tokenize(r#"add "rice"#).is_err());
    }

    #[tokio::test]
    async fn test_cash_sale() {
        let db = db().await;
        add_product(&db, product("Soap", "S1", 17_000, 10)).await.unwrap();

        let out = session(&db, "add S1 2\nmanual Carrier bag 5\npay cash 400\nquit\n").await;

        assert!(out.contains("TOTAL: 345.00"));
        assert!(out.contains("PAID: Rs. 400.00"));
        assert!(!out.contains("Open bill cleared"));
        assert_eq!(stock(&db, "S1").await, Quantity::from_units(8));
    }

    #[tokio::test]
    async fn test_errors_keep_session_alive() {
        let db = db().await;
        add_product(&db, product("Soap", "S1", 17_000, 10)).await.unwrap();

        let out = session(&db, "add nothing\nfrobnicate\nadd S1\npay cash 1\nshow\n").await;

        assert!(out.contains("Error: Product not found"));
        assert!(out.contains("Error: Unknown command 'frobnicate'"));
        assert!(out.contains("1. Soap"));
        // end of input discards the open bill
        assert!(out.contains("Open bill cleared"));
        assert_eq!(stock(&db, "S1").await, Quantity::from_units(10));
    }

    #[tokio::test]
    async fn test_terminal_failure_still_restores_stock() {
        let db = db().await;
        add_product(&db, product("Soap", "S1", 17_000, 10)).await.unwrap();

        // Greeting and first prompt get through, the bill printout does not
        let terminal = ClosingTerminal {
            remaining: "Kade POS counter. Type 'help' for commands.\n> ".len(),
        };
        let config = ConfigState::new("kade.db", "reports");
        let result = Counter::new(&db, &config, BufReader::new("add S1 2\n".as_bytes()), terminal)
            .run()
            .await;

        assert!(result.is_err());
        assert_eq!(stock(&db, "S1").await, Quantity::from_units(10));
    }

    #[tokio::test]
    async fn test_loan_payment_needs_confirmation() {
        let db = db().await;
        customer(&db).await;
        add_product(&db, product("Rice", "R1", 25_000, 10)).await.unwrap();

        let out = session(&db, "add R1\npay loan C001\nn\npay loan C001\ny\n").await;

        assert!(out.contains("Add 250.00 to Nimal Perera's loan balance?"));
        assert!(out.contains("Cancelled. The bill is still open."));
        assert!(out.contains("PAID AS LOAN"));

        let c = db.inner().loans().require("C001").await.unwrap();
        assert_eq!(c.balance(), Money::from_cents(25_000));
    }

    #[tokio::test]
    async fn test_loan_payment_unknown_customer() {
        let db = db().await;
        add_product(&db, product("Rice", "R1", 25_000, 10)).await.unwrap();

        let out = session(&db, "add R1\npay loan C404 --yes\nquit\n").await;

        assert!(out.contains("Error:"));
        assert!(!out.contains("PAID AS LOAN"));
        assert_eq!(stock(&db, "R1").await, Quantity::from_units(10));
    }
}
