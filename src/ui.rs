// UI layer: terminal menus built on `dialoguer`, styled banners via
// `crossterm` and `indicatif` spinners for network waits.
//
// Commands and the update workflow only see the `Prompter` trait, which lets
// the tests replace the terminal with a scripted operator.

use anyhow::Result;
use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::style::{Print, Stylize};
use crossterm::terminal::{Clear, ClearType};
use dialoguer::{Input, MultiSelect, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::thread;
use std::time::Duration;

/// Typing this at a confirmation prompt quits the program.
pub const QUIT_SENTINEL: &str = "q";

/// Word the operator types to accept a selection.
pub const CONFIRM_PHRASE: &str = "yes";

/// Result of a typed confirmation gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Quit,
}

/// Everything the tool needs from an operator.
pub trait Prompter {
    /// Single-choice menu. `None` means the menu was dismissed.
    fn select(&mut self, title: &str, items: &[String]) -> Result<Option<usize>>;

    /// Multi-choice menu. `None` means the menu was dismissed.
    fn multi_select(&mut self, title: &str, items: &[String]) -> Result<Option<Vec<usize>>>;

    /// Free-text line.
    fn read_line(&mut self, prompt: &str) -> Result<String>;

    /// Attention-grabbing banner before a confirmation.
    fn alert(&mut self, message: &str) -> Result<()> {
        println!("{message}");
        Ok(())
    }

    fn clear_screen(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Block until the operator types exactly `expected` (any case) or the quit
/// sentinel. Anything else, including padded input, re-prompts.
pub fn confirm_phrase<P: Prompter + ?Sized>(prompter: &mut P, expected: &str) -> Result<Confirmation> {
    let prompt = format!("Enter '{expected}' to continue if selected option(s) are OK ('{QUIT_SENTINEL}' to quit)");
    loop {
        let answer = prompter.read_line(&prompt)?;
        if answer.eq_ignore_ascii_case(expected) {
            return Ok(Confirmation::Confirmed);
        }
        if answer.eq_ignore_ascii_case(QUIT_SENTINEL) {
            return Ok(Confirmation::Quit);
        }
    }
}

/// Spinner shown while waiting on the API.
pub fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Real terminal implementation.
///
/// Menus clear the screen first. Esc or `q` inside a menu dismisses it.
#[derive(Debug, Default)]
pub struct TerminalPrompter {
    /// Number of times an alert banner flashes before it stays on screen.
    pub flashes: u32,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        TerminalPrompter { flashes: 5 }
    }
}

impl Prompter for TerminalPrompter {
    fn select(&mut self, title: &str, items: &[String]) -> Result<Option<usize>> {
        self.clear_screen()?;
        let choice = Select::new()
            .with_prompt(title)
            .items(items)
            .default(0)
            .interact_opt()?;
        Ok(choice)
    }

    fn multi_select(&mut self, title: &str, items: &[String]) -> Result<Option<Vec<usize>>> {
        self.clear_screen()?;
        let choice = MultiSelect::new()
            .with_prompt(format!("{title} (space to select, enter to confirm)"))
            .items(items)
            .interact_opt()?;
        Ok(choice)
    }

    fn read_line(&mut self, prompt: &str) -> Result<String> {
        let line: String = Input::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()?;
        Ok(line)
    }

    fn alert(&mut self, message: &str) -> Result<()> {
        let mut out = io::stdout();
        for _ in 0..self.flashes {
            execute!(out, Print(message.bold()))?;
            thread::sleep(Duration::from_millis(300));
            execute!(out, Print("\r"), Clear(ClearType::CurrentLine))?;
            thread::sleep(Duration::from_millis(200));
        }
        execute!(out, Print(message.bold()), Print("\n\n"))?;
        out.flush()?;
        Ok(())
    }

    fn clear_screen(&mut self) -> Result<()> {
        execute!(io::stdout(), Clear(ClearType::All), MoveTo(0, 0))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct Lines(VecDeque<&'static str>);

    impl Prompter for Lines {
        fn select(&mut self, _: &str, _: &[String]) -> Result<Option<usize>> {
            unreachable!()
        }
        fn multi_select(&mut self, _: &str, _: &[String]) -> Result<Option<Vec<usize>>> {
            unreachable!()
        }
        fn read_line(&mut self, _: &str) -> Result<String> {
            self.0.pop_front().map(String::from).ok_or_else(|| anyhow::anyhow!("no more input"))
        }
    }

    #[test]
    fn gate_accepts_phrase_in_any_case() {
        let mut p = Lines(VecDeque::from(["YeS"]));
        assert_eq!(confirm_phrase(&mut p, "yes").unwrap(), Confirmation::Confirmed);
    }

    #[test]
    fn gate_keeps_asking_until_exact_phrase() {
        let mut p = Lines(VecDeque::from(["y", "yess", "", "sure", "yes"]));
        assert_eq!(confirm_phrase(&mut p, "yes").unwrap(), Confirmation::Confirmed);
        assert!(p.0.is_empty());
    }

    #[test]
    fn gate_never_confirms_on_other_input() {
        let mut p = Lines(VecDeque::from(["no", "ok", "y"]));
        assert!(confirm_phrase(&mut p, "yes").is_err());
    }

    #[test]
    fn gate_rejects_padded_phrase() {
        let mut p = Lines(VecDeque::from(["  yes  ", " yes", "yes ", " q", "yes"]));
        assert_eq!(confirm_phrase(&mut p, "yes").unwrap(), Confirmation::Confirmed);
        assert!(p.0.is_empty());
    }

    #[test]
    fn quit_sentinel_wins_regardless_of_phrase() {
        let mut p = Lines(VecDeque::from(["nope", "Q"]));
        assert_eq!(confirm_phrase(&mut p, "yes").unwrap(), Confirmation::Quit);
        let mut p = Lines(VecDeque::from(["q"]));
        assert_eq!(confirm_phrase(&mut p, "deploy").unwrap(), Confirmation::Quit);
    }
}
