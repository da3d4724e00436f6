use crate::error::MirrorError;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout};

/// Hands control to a human, e.g. to solve a CAPTCHA in a visible browser window.
#[allow(async_fn_in_trait)]
pub trait ChallengePrompt {
    /// Returns once the operator has acknowledged `message`.
    async fn wait_for_operator(&mut self, message: &str) -> Result<(), MirrorError>;
}

/// Prints a message and blocks until a line is read.
pub struct LinePrompt<R, W> {
    input: R,
    output: W,
}

pub type StdinPrompt = LinePrompt<BufReader<Stdin>, Stdout>;

impl StdinPrompt {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> LinePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R, W> ChallengePrompt for LinePrompt<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    async fn wait_for_operator(&mut self, message: &str) -> Result<(), MirrorError> {
        tracing::info!("Waiting for operator: {}", message);
        self.output
            .write_all(format!("{} - press Enter to continue\n", message).as_bytes())
            .await?;
        self.output.flush().await?;

        let mut line = String::new();
        if self.input.read_line(&mut line).await? == 0 {
            tracing::warn!("Operator input closed, continuing without confirmation");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_line_prompt_waits_for_a_line() {
        let input: &[u8] = b"\nleftover\n";
        let mut prompt = LinePrompt::new(input, Vec::new());

        prompt
            .wait_for_operator("Solve the challenge for channel 515")
            .await
            .unwrap();

        assert_eq!(
            String::from_utf8(prompt.output).unwrap(),
            "Solve the challenge for channel 515 - press Enter to continue\n"
        );
        assert_eq!(prompt.input, b"leftover\n");
    }

    #[tokio::test]
    async fn test_line_prompt_tolerates_closed_input() {
        let input: &[u8] = b"";
        let mut prompt = LinePrompt::new(input, Vec::new());

        assert!(prompt.wait_for_operator("Solve the challenge").await.is_ok());
    }
}
