//! List the latest notices as a signed-in staff member.
//!
//! Fires several requests at once so an expired token shows a single shared
//! refresh in the logs.
//!
//! Run with:
//! ```bash
//! SCHOOLHOUSE_URL=https://project.example.co \
//! SCHOOLHOUSE_ANON_KEY=anon-key \
//! STAFF_EMAIL=office@school.example STAFF_PASSWORD=secret \
//! RUST_LOG=schoolhouse_client=debug \
//! cargo run --example notices
//! ```

use schoolhouse::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let connection = connect(ClientConfig::from_env()?)?;
    let sync = follow_sessions(&connection.client);

    let email = std::env::var("STAFF_EMAIL")?;
    let password = std::env::var("STAFF_PASSWORD")?;
    connection
        .sessions
        .sign_in_with_password(&email, &password)
        .await?;

    let client = &connection.client;
    let latest = client
        .table("notices")
        .select("id,title,created_at")
        .order("created_at", false)
        .limit(10);
    let class_query = client.table("classes").select("id,name");
    let visitor_query = client.table("visitors").select("id");

    let (notices, classes, visitors) = tokio::join!(
        latest.fetch::<serde_json::Value>(),
        class_query.fetch::<serde_json::Value>(),
        visitor_query.fetch::<serde_json::Value>(),
    );

    for notice in notices? {
        println!("{}", notice["title"].as_str().unwrap_or("(untitled)"));
    }
    println!("{} classes, {} visitors", classes?.len(), visitors?.len());

    connection.sessions.sign_out().await;
    sync.abort();
    Ok(())
}
