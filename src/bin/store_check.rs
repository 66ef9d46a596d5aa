use ocarina::{admin::AdminClient, CatalogStore, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("🔌 Ocarina Connectivity Check");
    println!("=============================");

    let config = Config::load()?;
    println!("📍 Store:   {}", config.store.url);
    println!("📍 Backend: {}", config.ingest.api_url);
    println!();

    // Hosted store - what the player reads
    println!("🗄  Checking the song store...");
    let store = CatalogStore::new(&config.store.url, &config.store.anon_key);

    match store.list_folders().await {
        Ok(folders) => {
            println!("  ✅ folders: {} rows", folders.len());
            for folder in folders.iter().take(5) {
                println!("    📁 {} ({})", folder.name, folder.id);
            }
        }
        Err(e) => println!("  ❌ folders query failed: {e}"),
    }

    match store.list_songs().await {
        Ok(songs) => {
            println!("  ✅ songs: {} rows", songs.len());
            for song in songs.iter().take(5) {
                println!(
                    "    🎵 {} - {} [{}]",
                    song.title,
                    song.display_artist(),
                    song.variant_summary()
                );
            }

            let unplayable = songs
                .iter()
                .filter(|s| s.variant_summary().is_empty())
                .count();
            if unplayable > 0 {
                println!("  ⚠️  {} songs have no stream URL at any tier", unplayable);
            }
        }
        Err(e) => println!("  ❌ songs query failed: {e}"),
    }
    println!();

    // Ingest backend - what the admin console talks to
    println!("🛠  Checking the ingest backend...");
    let client = AdminClient::new(&config.ingest.api_url, &config.ingest.admin_key);

    match client.health().await {
        Ok(health) => match health.timestamp {
            Some(timestamp) => println!("  ✅ health: {} at {}", health.status, timestamp),
            None => println!("  ✅ health: {}", health.status),
        },
        Err(e) => println!("  ❌ health check failed: {e}"),
    }

    match client.get_folders().await {
        Ok(folders) => println!("  ✅ get_folders: {} rows", folders.len()),
        Err(e) => println!("  ❌ get_folders failed: {e}"),
    }

    Ok(())
}
