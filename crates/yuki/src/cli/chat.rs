//! Chat and health command handlers.

use futures::StreamExt;
use std::io::Write;
use tracing::{debug, info, warn};
use yuki::{ConfigError, Yuki, YukiResult, estimate_tokens};

/// Probe the inference server and print the report as JSON.
pub async fn handle_health(yuki: &Yuki) -> YukiResult<bool> {
    let report = yuki.client().health().await;
    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| ConfigError::new(format!("Failed to render health report: {}", e)))?;
    println!("{}", json);
    Ok(report.is_reachable())
}

/// Run one turn: load the session, dispatch, print the reply, record it.
///
/// Returns `false` without contacting the server when the session is over
/// its rate limit.
#[tracing::instrument(skip(yuki, system, text))]
pub async fn handle_chat(
    yuki: &Yuki,
    session_id: &str,
    system: &str,
    text: &str,
    stream: bool,
) -> YukiResult<bool> {
    let decision = yuki.admit(session_id);
    if !decision.allowed {
        eprintln!(
            "Rate limited: {} requests per window; retry after {}s",
            decision.limit,
            decision.retry_after_header()
        );
        return Ok(false);
    }

    eprintln!("session: {}", session_id);

    if !stream {
        let result = yuki.chat(session_id, system, text).await?;
        println!("{}", result.text());
        info!(
            endpoint = %result.endpoint_used(),
            latency_ms = result.latency_ms(),
            tokens = result.token_estimate(),
            "Reply received"
        );
        return Ok(true);
    }

    let turn = yuki.prepare_turn(session_id, system, text).await?;
    let mut tokens = yuki.client().complete_streaming(&turn.request).await?;
    let endpoint = tokens.endpoint();

    let mut reply = String::new();
    let mut stdout = std::io::stdout();
    while let Some(fragment) = tokens.next().await {
        let fragment = fragment?;
        print!("{}", fragment);
        if let Err(e) = stdout.flush() {
            warn!(error = %e, "Failed to flush stdout");
        }
        reply.push_str(&fragment);
    }
    println!();

    let prompt_chars = match endpoint {
        yuki::Endpoint::Generate => turn.request.prompt_chars(),
        yuki::Endpoint::Chat => turn.request.message_chars(),
    };
    debug!(
        endpoint = %endpoint,
        tokens = estimate_tokens(prompt_chars, tokens.delivered_chars()),
        "Stream complete"
    );

    yuki.record_turn(session_id, &turn.state, text, &reply).await?;
    Ok(true)
}
