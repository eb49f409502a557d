//! Server command implementation

use anyhow::Result;

pub async fn cmd_serve(host: &str, port: u16) -> Result<()> {
    let config = resilience_server::ServerConfig::from_env();

    println!("🚀 Starting Resilience web server...");
    println!("   Listening: http://{}:{}", host, port);
    if config.allowed_origins.is_empty() {
        println!("   🌐 CORS: any origin (set RESILIENCE_ALLOWED_ORIGINS to restrict)");
    } else {
        println!(
            "   🌐 CORS: {} (RESILIENCE_ALLOWED_ORIGINS)",
            config.allowed_origins.join(", ")
        );
    }
    if std::env::var("ANTHROPIC_API_KEY").map_or(true, |k| k.trim().is_empty()) {
        println!("   ℹ️  ANTHROPIC_API_KEY not set - rule-based analysis only");
    }
    println!();
    println!("   Press Ctrl+C to stop");

    resilience_server::serve_with_config(host, port, config).await?;

    Ok(())
}
