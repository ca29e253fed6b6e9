//! The `uniquery chat` command.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;

use uniquery_core::chat::{chat_export_file_name, ChatHistory};
use uniquery_core::prompts::{chat_prompt, conversation_summary_prompt, CHAT_SYSTEM_PROMPT};
use uniquery_core::traits::LlmProvider;
use uniquery_providers::{load_config_from, UniqueryConfig};

use super::send;

pub struct ChatArgs {
    pub messages: Vec<String>,
    pub history: Option<PathBuf>,
    pub summarize: bool,
    pub export: Option<PathBuf>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub config: Option<PathBuf>,
}

/// A conversation bound to one provider.
struct Conversation<'a> {
    config: &'a UniqueryConfig,
    provider: &'a dyn LlmProvider,
    model: Option<&'a str>,
    history: ChatHistory,
}

impl Conversation<'_> {
    /// Send one question. The question stays in the history even if no reply arrives.
    async fn ask(&mut self, question: &str) -> Result<String> {
        self.history.push_user(question, chrono::Utc::now());

        let mut request = self
            .config
            .request(self.model, chat_prompt(question, &self.history.recent_context()));
        request.system_prompt = Some(CHAT_SYSTEM_PROMPT.to_string());

        let reply = send(self.provider, &request).await?;
        self.history.push_assistant(&reply, chrono::Utc::now());
        Ok(reply)
    }

    async fn summarize(&mut self) -> Result<String> {
        anyhow::ensure!(!self.history.is_empty(), "nothing to summarize: the conversation is empty");

        let request = self
            .config
            .request(self.model, conversation_summary_prompt(&self.history.transcript()));
        let summary = send(self.provider, &request).await?;
        let message = format!("**Conversation Summary**:\n{summary}");
        self.history.push_assistant(&message, chrono::Utc::now());
        Ok(message)
    }
}

pub async fn execute(args: ChatArgs) -> Result<()> {
    let config = load_config_from(args.config.as_deref())?;
    let provider = config.provider(args.provider.as_deref())?;

    let history = match &args.history {
        Some(path) if path.exists() => ChatHistory::load_json(path)?,
        _ => ChatHistory::new(),
    };
    let mut conversation = Conversation {
        config: &config,
        provider: provider.as_ref(),
        model: args.model.as_deref(),
        history,
    };

    if args.messages.is_empty() {
        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        converse(&mut conversation, &mut stdin.lock(), &mut stdout.lock()).await?;
    } else {
        for message in &args.messages {
            let reply = conversation.ask(message).await?;
            println!("{reply}\n");
        }
    }

    if args.summarize {
        println!("{}\n", conversation.summarize().await?);
    }

    if let Some(target) = &args.export {
        let path = if target.is_dir() {
            target.join(chat_export_file_name(chrono::Utc::now()))
        } else {
            target.clone()
        };
        conversation.history.save_json(&path)?;
        eprintln!(
            "Chat saved to: {} ({} messages)",
            path.display(),
            conversation.history.len()
        );
    }

    Ok(())
}

/// Read questions line by line until `/quit` or end of input.
///
/// `/clear` empties the history and `/summary` summarizes it. A failed turn
/// is reported and the conversation goes on.
async fn converse(
    conversation: &mut Conversation<'_>,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<()> {
    writeln!(out, "Ask anything. /summary summarizes, /clear forgets, /quit exits.")?;
    loop {
        write!(out, "> ")?;
        out.flush()?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }

        let result = match line.trim() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/clear" => {
                conversation.history.clear();
                writeln!(out, "Conversation cleared.")?;
                continue;
            }
            "/summary" => conversation.summarize().await,
            question => conversation.ask(question).await,
        };
        match result {
            Ok(text) => writeln!(out, "\n{text}\n")?,
            Err(e) => eprintln!("Error: {e:#}"),
        }
    }
    Ok(())
}
