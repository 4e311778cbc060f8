//! Line-oriented terminal input shared by the shell and delete confirmation.

use std::io::Write;

use agenda_core::{ContactId, DeleteConfirmation};
use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

pub struct LinePrompt<R> {
    lines: Mutex<Lines<R>>,
}

impl LinePrompt<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R> LinePrompt<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(reader: R) -> Self {
        Self {
            lines: Mutex::new(reader.lines()),
        }
    }

    /// Print `question` and wait for one line. `None` at end of input.
    pub async fn ask(&self, question: &str) -> std::io::Result<Option<String>> {
        let mut stdout = std::io::stdout();
        write!(stdout, "{question}")?;
        stdout.flush()?;
        self.lines.lock().await.next_line().await
    }
}

#[async_trait]
impl<R> DeleteConfirmation for LinePrompt<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn confirm(&self, id: ContactId, name: Option<&str>) -> bool {
        let question = match name {
            Some(name) => format!("Delete contact \"{name}\" (#{id})? [y/N] "),
            None => format!("Delete contact #{id}? [y/N] "),
        };
        match self.ask(&question).await {
            Ok(Some(answer)) => is_yes(&answer),
            Ok(None) => false,
            Err(err) => {
                tracing::warn!("reading confirmation failed: {err}");
                false
            }
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
