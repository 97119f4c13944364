//! Drives scripted calls through the call registry

use futures::future::join_all;
use std::sync::Arc;

use call_agent_agent::{AgentError, CallRegistry};
use call_agent_core::Summary;

use crate::script::{Script, ScriptEvent, ScriptedCall};

/// Run every call in the script concurrently. Summaries come back in script
/// order; calls that failed to start are skipped with an error log.
pub async fn run_script(registry: Arc<CallRegistry>, script: Script) -> Vec<Summary> {
    let calls = script
        .calls
        .into_iter()
        .map(|call| run_call(Arc::clone(&registry), call));

    join_all(calls)
        .await
        .into_iter()
        .filter_map(|result| match result {
            Ok(summary) => summary,
            Err(e) => {
                tracing::error!(error = %e, "Scripted call failed");
                None
            },
        })
        .collect()
}

async fn run_call(
    registry: Arc<CallRegistry>,
    call: ScriptedCall,
) -> Result<Option<Summary>, AgentError> {
    let session_id = call.session_id_or_new();
    let input = registry.start(session_id.clone(), call.caller_phone.clone())?;

    for event in call.events {
        let sent = match event {
            ScriptEvent::Turn { text, confidence } => input.on_turn(text, confidence).await,
            ScriptEvent::TransferAcknowledged => input.transfer_acknowledged().await,
            ScriptEvent::HangUp => input.disconnect().await,
        };

        // The agent may close the call before the script runs out
        if let Err(e) = sent {
            tracing::debug!(session_id = %session_id, error = %e, "Remaining events skipped");
            break;
        }
    }
    drop(input);

    // Any call still open is hung up once its queued events are handled
    registry.finish(&session_id).await
}
