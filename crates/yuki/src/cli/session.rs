//! Session inspection handlers.

use yuki::{ConfigError, Yuki, YukiResult};

/// Print the most recent messages of a session, oldest first.
pub async fn handle_history(yuki: &Yuki, session_id: &str, limit: usize) -> YukiResult<()> {
    let history = yuki.store().get_history(session_id, limit).await?;
    if history.is_empty() {
        println!("No messages for session '{}'", session_id);
        return Ok(());
    }

    println!("Session '{}':", session_id);
    println!("{:-<80}", "");
    for message in &history {
        println!(
            "[{}] {:>9}: {}",
            message.timestamp().format("%Y-%m-%d %H:%M:%S"),
            message.role(),
            message.content()
        );
    }
    println!("{:-<80}", "");
    println!("Total: {} messages", history.len());
    Ok(())
}

/// Print a session's state as JSON.
pub async fn handle_state(yuki: &Yuki, session_id: &str) -> YukiResult<()> {
    let state = yuki.store().get_state(session_id).await?;
    let json = serde_json::to_string_pretty(&state)
        .map_err(|e| ConfigError::new(format!("Failed to render state: {}", e)))?;
    println!("{}", json);
    Ok(())
}
