//! Interactive terminal menu on top of [`Session`].

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};

use crate::session::Session;
use crate::validation::format_date;

const MENU: &str = "
=== Ecotech ===
1. Register
2. Log in
3. Query indicator
4. My logged queries
5. Log out
6. Exit";

struct Console<R, W> {
    lines: Lines<BufReader<R>>,
    out: W,
}

impl<R, W> Console<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    async fn say(&mut self, text: &str) -> std::io::Result<()> {
        self.out.write_all(text.as_bytes()).await?;
        self.out.write_all(b"\n").await?;
        self.out.flush().await
    }

    /// `None` once input is exhausted.
    async fn ask(&mut self, label: &str) -> std::io::Result<Option<String>> {
        self.out.write_all(label.as_bytes()).await?;
        self.out.flush().await?;
        Ok(self.lines.next_line().await?.map(|l| l.trim().to_string()))
    }
}

/// Runs the menu until the user exits or input ends.
pub async fn run<R, W>(session: &mut Session, input: R, out: W) -> anyhow::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut console = Console {
        lines: BufReader::new(input).lines(),
        out,
    };

    loop {
        console.say(MENU).await?;
        if let Some(user) = session.current_user() {
            console.say(&format!("(logged in as {user})")).await?;
        }
        let Some(choice) = console.ask("Choose an option: ").await? else {
            break;
        };

        match choice.as_str() {
            "1" => register(session, &mut console).await?,
            "2" => login(session, &mut console).await?,
            "3" => query(session, &mut console).await?,
            "4" => history(session, &mut console).await?,
            "5" => {
                session.logout();
                console.say("Logged out.").await?;
            }
            "6" => {
                console.say("Bye.").await?;
                break;
            }
            _ => console.say("Invalid option.").await?,
        }
    }
    Ok(())
}

async fn credentials<R, W>(console: &mut Console<R, W>) -> std::io::Result<Option<(String, String)>>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let Some(username) = console.ask("Username: ").await? else {
        return Ok(None);
    };
    let Some(password) = console.ask("Password: ").await? else {
        return Ok(None);
    };
    Ok(Some((username, password)))
}

async fn register<R, W>(session: &mut Session, console: &mut Console<R, W>) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let Some((username, password)) = credentials(console).await? else {
        return Ok(());
    };
    match session.register(&username, &password).await {
        Ok(()) => console.say("User registered, you can log in now.").await,
        Err(e) => console.say(&format!("Registration failed: {e}")).await,
    }
}

async fn login<R, W>(session: &mut Session, console: &mut Console<R, W>) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let Some((username, password)) = credentials(console).await? else {
        return Ok(());
    };
    match session.login(&username, &password).await {
        Ok(()) => console.say(&format!("Welcome, {username}.")).await,
        Err(e) => console.say(&format!("Login failed: {e}")).await,
    }
}

async fn query<R, W>(session: &mut Session, console: &mut Console<R, W>) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    if session.current_user().is_none() {
        return console.say("You must log in first.").await;
    }
    let Some(name) = console.ask("Indicator (uf, dolar, euro, utm, ipc, ivp): ").await? else {
        return Ok(());
    };
    let Some(date) = console.ask("Date (DD-MM-YYYY, blank for today): ").await? else {
        return Ok(());
    };

    let reading = match session.query(&name.to_lowercase(), &date).await {
        Ok(r) => r,
        Err(e) => return console.say(&format!("Query failed: {e}")).await,
    };
    console
        .say(&format!(
            "{} on {}: {}",
            reading.indicator.as_str().to_uppercase(),
            format_date(reading.indicator_date),
            reading.value
        ))
        .await?;

    let Some(answer) = console.ask("Save this query? (s/n): ").await? else {
        return Ok(());
    };
    if matches!(answer.to_lowercase().as_str(), "s" | "y") {
        match session.confirm_and_log(&reading).await {
            Ok(_) => console.say("Query saved.").await,
            Err(e) => console.say(&format!("Could not save query: {e}")).await,
        }
    } else {
        console.say("Query not saved.").await
    }
}

async fn history<R, W>(session: &mut Session, console: &mut Console<R, W>) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let rows = match session.history().await {
        Ok(rows) => rows,
        Err(e) => return console.say(&format!("{e}")).await,
    };
    if rows.is_empty() {
        return console.say("No saved queries.").await;
    }
    for row in rows {
        console
            .say(&format!(
                "{} | value: {} | date: {} | queried: {} | source: {}",
                row.indicator_name.to_uppercase(),
                row.value,
                format_date(row.indicator_date),
                row.query_date,
                row.source
            ))
            .await?;
    }
    Ok(())
}
