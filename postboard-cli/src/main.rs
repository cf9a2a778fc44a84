use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use postboard_client::error::BlogClientError;
use postboard_client::models::{ListPostsParams, NewPost, Post, PostUpdate, User};
use postboard_client::{BlogClient, Transport};
use std::path::PathBuf;

mod session;

use session::{SavedSession, SessionStore};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Server address. Defaults to the HTTP or gRPC port on localhost.
    #[arg(short, long, env = "POSTBOARD_SERVER")]
    server: Option<String>,

    /// Use the gRPC transport instead of HTTP
    #[arg(long)]
    grpc: bool,

    /// Where the session (token and user id) is stored
    #[arg(long, env = "POSTBOARD_SESSION_FILE")]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account and sign in
    Register {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,

        #[arg(short, long)]
        name: Option<String>,
    },

    /// Sign in with an existing account
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },

    /// Forget the stored session
    Logout,

    /// Show the stored session
    Status,

    Create {
        #[arg(short, long)]
        title: String,

        #[arg(short, long)]
        content: String,

        /// Publish immediately instead of saving a draft
        #[arg(long)]
        published: bool,
    },

    Get {
        #[arg(short, long)]
        id: String,
    },

    Update {
        #[arg(short, long)]
        id: String,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        content: Option<String>,

        #[arg(long)]
        published: Option<bool>,
    },

    Delete {
        #[arg(short, long)]
        id: String,
    },

    List {
        #[arg(short, long)]
        limit: Option<u32>,

        #[arg(short, long)]
        page: Option<u64>,

        /// Only posts by this author id
        #[arg(short, long)]
        author: Option<String>,

        #[arg(long)]
        published_only: Option<bool>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let store = SessionStore::new(cli.session_file)?;

    // Commands that only touch the session file
    match &cli.command {
        Commands::Status => {
            print_status(&store)?;
            return Ok(());
        }
        Commands::Logout => {
            if store.clear()? {
                println!("{} Logged out", "✓".green());
            } else {
                println!("Not logged in");
            }
            return Ok(());
        }
        _ => {}
    }

    let transport = if cli.grpc {
        let addr = cli
            .server
            .unwrap_or_else(|| "http://localhost:50051".to_string());
        Transport::Grpc(addr)
    } else {
        let addr = cli
            .server
            .unwrap_or_else(|| "http://localhost:3000".to_string());
        Transport::Http(addr)
    };

    println!("🔌 Connecting to: {}", transport_url(&transport).dimmed());

    let client = BlogClient::new(transport)
        .await
        .context("Failed to create postboard client")?;

    if let Some(saved) = store.load()? {
        client.set_session(saved.session).await;
    }

    if let Err(e) = run(&client, &store, cli.command).await {
        report(&e);
        std::process::exit(1);
    }

    Ok(())
}

async fn run(
    client: &BlogClient,
    store: &SessionStore,
    command: Commands,
) -> Result<(), BlogClientError> {
    match command {
        Commands::Register {
            email,
            password,
            name,
        } => {
            println!("📝 Registering user: {}", email);

            let response = client.register(email, password, name).await?;
            println!("{} Registration successful!", "✅".green());
            print_user(&response.user);
            save_session(client, store, &response.user.email).await;
        }

        Commands::Login { email, password } => {
            println!("🔑 Logging in as: {}", email);

            let response = client.login(email, password).await?;
            println!("{} Login successful!", "✅".green());
            print_user(&response.user);
            save_session(client, store, &response.user.email).await;
        }

        Commands::Create {
            title,
            content,
            published,
        } => {
            let post = client
                .create_post(&NewPost {
                    title,
                    content,
                    published: Some(published),
                })
                .await?;
            println!("{} Post created successfully!", "✅".green());
            print_post(&post);
        }

        Commands::Get { id } => {
            let post = client.get_post(&id).await?;
            print_post(&post);
            println!("   Content: {}", post.content);
        }

        Commands::Update {
            id,
            title,
            content,
            published,
        } => {
            let post = client
                .update_post(
                    &id,
                    &PostUpdate {
                        title,
                        content,
                        published,
                    },
                )
                .await?;
            println!("{} Post updated successfully!", "✅".green());
            print_post(&post);
        }

        Commands::Delete { id } => {
            client.delete_post(&id).await?;
            println!("{} Post {} deleted", "✅".green(), id);
        }

        Commands::List {
            limit,
            page,
            author,
            published_only,
        } => {
            let window = client
                .list_posts(&ListPostsParams {
                    author_id: author,
                    published_only,
                    limit,
                    page,
                })
                .await?;

            println!(
                "📋 Page {}/{} ({} posts total)",
                window.page, window.total_pages, window.total
            );
            println!();

            if window.items.is_empty() {
                println!("   No posts found");
            }
            for (i, post) in window.items.iter().enumerate() {
                let state = if post.published {
                    "published".green()
                } else {
                    "draft".yellow()
                };
                println!("   {}. [{}] {} ({})", i + 1, post.id, post.title.bold(), state);
                println!("      Created: {}", post.created_at);
                println!("      Content: {}", truncate(&post.content, 50));
                println!();
            }

            if window.has_next_page {
                println!("   More posts: --page {}", window.page + 1);
            }
        }

        Commands::Status | Commands::Logout => {}
    }

    Ok(())
}

async fn save_session(client: &BlogClient, store: &SessionStore, email: &str) {
    let Some(session) = client.session().await else {
        return;
    };
    let saved = SavedSession {
        session,
        email: email.to_string(),
    };
    match store.save(&saved) {
        Ok(()) => println!("✓ Session saved to {:?}", store.path()),
        Err(e) => eprintln!("{} Could not save session: {:#}", "⚠".yellow(), e),
    }
}

fn print_status(store: &SessionStore) -> Result<()> {
    match store.load()? {
        Some(saved) => {
            println!("🔑 Session file: {:?}", store.path());
            println!("   Email: {}", saved.email);
            println!("   User ID: {}", saved.session.user_id);
            println!("   Status: {}", "logged in".green());
        }
        None => {
            println!("{} Not logged in", "❌".red());
            println!("   Please login first: postboard login --email <email> --password <password>");
        }
    }
    Ok(())
}

fn report(err: &BlogClientError) {
    let hint = match err {
        BlogClientError::Unauthorized(_) | BlogClientError::MissingSession => {
            Some("Please login first: postboard login --email <email> --password <password>")
        }
        BlogClientError::Forbidden(_) => Some("Only the author of a post can change it"),
        BlogClientError::NotFound(_) => Some("Use the 'list' command to see available posts"),
        _ => None,
    };

    eprintln!("{} {}", "❌ Error:".red(), err);
    if let Some(hint) = hint {
        eprintln!("   Tip: {}", hint);
    }
}

fn print_user(user: &User) {
    println!("   User ID: {}", user.id);
    println!("   Email: {}", user.email);
    if let Some(name) = &user.name {
        println!("   Name: {}", name);
    }
}

fn print_post(post: &Post) {
    println!("   ID: {}", post.id);
    println!("   Title: {}", post.title);
    println!("   Author ID: {}", post.author_id);
    println!("   Published: {}", post.published);
    println!("   Created: {}", post.created_at);
    println!("   Updated: {}", post.updated_at);
}

fn transport_url(transport: &Transport) -> String {
    match transport {
        Transport::Http(url) => format!("HTTP: {}", url),
        Transport::Grpc(addr) => format!("gRPC: {}", addr),
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        None => s.to_string(),
        Some((idx, _)) => format!("{}...", &s[..idx]),
    }
}
