use std::io::{BufRead, Write};

use crate::pipeline::PipelineContext;

pub const PROMPT: &str = "Q> ";
pub const GOODBYE: &str = "bye.";

/// Empty input and `exit`/`quit` in any case end the session.
pub fn is_exit_command(line: &str) -> bool {
    let t = line.trim();
    t.is_empty() || t.eq_ignore_ascii_case("exit") || t.eq_ignore_ascii_case("quit")
}

/// Line-oriented Q&A loop. Returns the number of questions answered.
pub fn run_session<R: BufRead, W: Write>(ctx: &PipelineContext, mut input: R, mut output: W) -> std::io::Result<usize> {
    let mut answered = 0;
    loop {
        write!(output, "{PROMPT}")?;
        output.flush()?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 || is_exit_command(&line) {
            break;
        }
        let answer = ctx.ask(line.trim());
        writeln!(output, "A> {}", answer.text)?;
        writeln!(output, "   citations: {:?}", answer.citation_ids)?;
        answered += 1;
    }
    writeln!(output, "{GOODBYE}")?;
    Ok(answered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_commands() {
        for s in ["", "  \n", "exit", "QUIT\n", " Exit "] {
            assert!(is_exit_command(s), "{s:?}");
        }
        assert!(!is_exit_command("exit criteria?"));
    }
}
