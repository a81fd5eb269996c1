use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use client_core::{HttpQuoteService, QuoteBoardClient, SortDirection, SortKey, VoteOutcome};
use shared::{
    domain::{QuoteId, UserId},
    protocol::Quote,
};

mod config;

#[derive(Parser, Debug)]
#[command(name = "quotes", about = "Quote board client", version)]
struct Args {
    /// Quote service base URL; overrides the config file and environment.
    #[arg(long)]
    server_url: Option<String>,
    /// Acting user id for vote, add, and edit intents.
    #[arg(long)]
    user_id: Option<i64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List quotes with search, sort, and paging applied.
    List {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, value_enum, default_value = "votes")]
        sort: SortArg,
        #[arg(long, value_enum, default_value = "desc")]
        order: OrderArg,
        /// Extra load-more pages beyond the first.
        #[arg(long, default_value_t = 0)]
        pages: u32,
    },
    /// Submit a new quote.
    Add {
        #[arg(long)]
        text: String,
        #[arg(long, default_value = "")]
        author: String,
    },
    /// Edit a quote created by the acting user.
    Edit {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        author: Option<String>,
    },
    /// Vote on a quote.
    Vote {
        #[arg(long)]
        id: i64,
    },
    /// Show board totals, the top voted quotes, and recent additions.
    Dashboard,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SortArg {
    Votes,
    Author,
    Date,
}

impl From<SortArg> for SortKey {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Votes => SortKey::Votes,
            SortArg::Author => SortKey::Author,
            SortArg::Date => SortKey::Date,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OrderArg {
    Asc,
    Desc,
}

impl From<OrderArg> for SortDirection {
    fn from(value: OrderArg) -> Self {
        match value {
            OrderArg::Asc => SortDirection::Ascending,
            OrderArg::Desc => SortDirection::Descending,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let settings = config::load_settings();
    let server_url = args
        .server_url
        .unwrap_or_else(|| settings.server_url.clone());
    let user = args.user_id.or(settings.user_id).map(UserId);

    let service = Arc::new(HttpQuoteService::new(&server_url)?);
    let client = QuoteBoardClient::with_page_size(service, settings.page_size);
    client.start_session(user).await?;

    match args.command {
        Command::List {
            search,
            sort,
            order,
            pages,
        } => {
            client.set_sort(sort.into(), order.into()).await;
            client.set_search_term(&search).await;
            for _ in 0..pages {
                client.load_more().await;
            }

            let visible = client.visible_quotes().await;
            let matching = client.matching_count().await;
            println!("showing {} of {} quotes", visible.len(), matching);
            for quote in &visible {
                print_quote(quote, client.has_voted(quote.id).await);
            }
        }
        Command::Add { text, author } => {
            client.open_draft().await;
            client.update_draft(&text, &author).await?;
            let created = client.submit_draft().await?;
            println!("created quote {}", created.id.0);
        }
        Command::Edit { id, text, author } => {
            let id = QuoteId(id);
            client.open_edit_draft(id).await?;
            let draft = client
                .draft()
                .await
                .ok_or_else(|| anyhow!("edit draft missing"))?;
            let text = text.unwrap_or(draft.text);
            let author = author.unwrap_or(draft.author);
            client.update_draft(&text, &author).await?;
            let updated = client.submit_draft().await?;
            println!("updated quote {}", updated.id.0);
        }
        Command::Vote { id } => match client.vote(QuoteId(id)).await? {
            VoteOutcome::Confirmed { votes } => {
                println!("vote confirmed, quote {id} now has {votes} votes");
            }
            VoteOutcome::AlreadyVoted => println!("already voted on quote {id}"),
            VoteOutcome::VoteInFlight => println!("a vote for quote {id} is already submitting"),
            VoteOutcome::Discarded => println!("vote result discarded"),
        },
        Command::Dashboard => {
            let summary = client.summary().await;
            println!("total quotes: {}", summary.total_quotes);
            println!("total votes:  {}", summary.total_votes);
            if client.current_user().await.is_some() {
                println!("your quotes:  {}", summary.authored_by_user);
            }

            println!();
            println!("top voted:");
            for quote in client.top_voted(10).await {
                println!("  {:>4}  {}", quote.votes, display_text(&quote));
            }

            println!();
            println!("recent:");
            for quote in client.most_recent(5).await {
                println!(
                    "  {}  {}",
                    quote.created_at.format("%Y-%m-%d"),
                    display_text(&quote)
                );
            }
        }
    }

    Ok(())
}

fn display_text(quote: &Quote) -> String {
    let author = if quote.author.is_empty() {
        "Unknown"
    } else {
        &quote.author
    };
    format!("\"{}\" - {author}", quote.text)
}

fn print_quote(quote: &Quote, voted: bool) {
    let marker = if voted { " [voted]" } else { "" };
    println!(
        "#{:<5} {:>4} votes  {}{marker}",
        quote.id.0,
        quote.votes,
        display_text(quote)
    );
}
