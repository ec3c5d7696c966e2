//! Server command implementation

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use plsb_core::DashboardConfig;

use super::open_source;

pub async fn cmd_serve(
    config: &DashboardConfig,
    host: &str,
    port: u16,
    static_dir: Option<&Path>,
) -> Result<()> {
    let source = open_source(config)?;

    println!("🚀 Starting {} web server...", config.page.title);
    println!("   Source: {}", source.name());
    println!("   Cache TTL: {}s", source.ttl().as_secs());
    println!("   Listening: http://{}:{}", host, port);
    if let Some(dir) = static_dir {
        println!("   Static files: {}", dir.display());
    }
    println!();
    println!("   Press Ctrl+C to stop");

    let server_config = plsb_server::ServerConfig {
        page: config.page.clone(),
        allowed_origins: vec![],
    };

    plsb_server::serve_with_config(Arc::new(source), host, port, static_dir, server_config)
        .await?;

    Ok(())
}
