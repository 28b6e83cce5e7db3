use anyhow::{Result, bail};

use crate::backend::AgentBackend;
use crate::config::Config;
use crate::conversation::{ConversationController, Role};

/// Run one submission cycle and print the agent's reply.
pub async fn ask(config: &Config, prompt: &str) -> Result<()> {
    let backend = AgentBackend::new(config)?;
    let mut controller = ConversationController::new();

    controller.submit(&backend, prompt).await;

    if let Some(error) = &controller.state().last_error {
        bail!("{error}");
    }

    if let Some(reply) = controller
        .state()
        .messages
        .iter()
        .rev()
        .find(|message| message.role == Role::Agent)
    {
        println!("{}", reply.content);
    }

    Ok(())
}

/// Print the backend's health status.
pub async fn health(config: &Config) -> Result<()> {
    let backend = AgentBackend::new(config)?;
    let status = backend.health().await?;

    println!(
        "✅ SuperAgent backend at {} is {}",
        config.backend_url, status.status
    );
    Ok(())
}
