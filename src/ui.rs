//! Terminal prompts and progress indicators.
//!
//! [`TerminalPrompter`] is the only place that talks to the user directly.
//! Every prompt treats Esc / `q` as cancellation and surfaces it as
//! [`AlignerError::Cancelled`].
use console::style;
use dialoguer::{
    Confirm, Editor, Input, MultiSelect, Select, theme::ColorfulTheme,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::{
    error::{AlignerError, Result},
    resolver::{Chooser, ChoiceMode, ChoiceRequest, VersionChoice},
};

pub mod render;

/// Entry in the version picker, mapped back to a [`VersionChoice`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChoiceItem {
    InUse(String),
    Latest,
    Custom,
    Skip,
}

/// Build the picker entries for one conflicted package.
pub fn choice_items(request: &ChoiceRequest) -> Vec<(String, ChoiceItem)> {
    let mut items: Vec<(String, ChoiceItem)> = request
        .options
        .iter()
        .map(|option| {
            (
                format!(
                    "{}  (used by: {})",
                    option.version,
                    option.workspaces.join(", ")
                ),
                ChoiceItem::InUse(option.version.clone()),
            )
        })
        .collect();

    let latest_label = match (&request.latest, request.latest_is_newer) {
        (Some(latest), true) => format!("Use latest ({latest}, newer)"),
        (Some(latest), false) => format!("Use latest ({latest})"),
        (None, _) => "Use latest from registry".to_string(),
    };
    items.push((latest_label, ChoiceItem::Latest));
    items.push(("Enter a custom version".into(), ChoiceItem::Custom));
    items.push(("Skip this package".into(), ChoiceItem::Skip));

    items
}

/// dialoguer backed prompts with the colorful theme.
pub struct TerminalPrompter {
    theme: ColorfulTheme,
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

/// Free-form questions the command flows ask.
#[cfg_attr(test, mockall::automock)]
pub trait Prompt {
    /// Single choice; returns the selected index.
    fn select(
        &self,
        prompt: &str,
        items: &[String],
        default: usize,
    ) -> Result<usize>;

    /// Multiple choice; returns the selected indices in display order.
    fn multi_select(
        &self,
        prompt: &str,
        items: &[String],
        checked: &[bool],
    ) -> Result<Vec<usize>>;

    /// Free text that must not be blank; an empty `default` means none. The
    /// result is trimmed.
    fn input(&self, prompt: &str, default: &str) -> Result<String>;

    /// Open `$EDITOR` with `initial`; `None` when the buffer was not saved.
    fn editor(&self, initial: &str) -> Result<Option<String>>;
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }

    fn print_context(&self, request: &ChoiceRequest) {
        println!();
        println!("{}", style(&request.package).bold().cyan());
        for option in &request.options {
            println!(
                "  {}  {}",
                style(&option.version).yellow(),
                style(option.workspaces.join(", ")).dim()
            );
        }
        match (&request.latest, request.latest_is_newer) {
            (Some(latest), true) => println!(
                "  {} {} {}",
                style("latest:").dim(),
                style(latest).green(),
                style("(newer than versions in use)").green()
            ),
            (Some(latest), false) => {
                println!("  {} {}", style("latest:").dim(), latest)
            }
            (None, _) => {}
        }
    }
}

impl Prompt for TerminalPrompter {
    fn select(
        &self,
        prompt: &str,
        items: &[String],
        default: usize,
    ) -> Result<usize> {
        Select::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(items)
            .default(default)
            .interact_opt()?
            .ok_or(AlignerError::Cancelled)
    }

    fn multi_select(
        &self,
        prompt: &str,
        items: &[String],
        checked: &[bool],
    ) -> Result<Vec<usize>> {
        MultiSelect::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(items)
            .defaults(checked)
            .interact_opt()?
            .ok_or(AlignerError::Cancelled)
    }

    fn input(&self, prompt: &str, default: &str) -> Result<String> {
        let mut input = Input::<String>::with_theme(&self.theme)
            .with_prompt(prompt)
            .validate_with(
                |value: &String| -> std::result::Result<(), &'static str> {
                    if value.trim().is_empty() {
                        Err("a value is required")
                    } else {
                        Ok(())
                    }
                },
            );

        if !default.is_empty() {
            input = input.default(default.to_string());
        }

        Ok(input.interact_text()?.trim().to_string())
    }

    fn editor(&self, initial: &str) -> Result<Option<String>> {
        let edited = Editor::new().extension(".md").edit(initial)?;
        Ok(edited.map(|text| text.trim().to_string()))
    }
}

impl Chooser for TerminalPrompter {
    fn choose_version(&self, request: &ChoiceRequest) -> Result<VersionChoice> {
        if request.mode == ChoiceMode::Interactive {
            self.print_context(request);
        }

        let items = choice_items(request);
        let labels: Vec<String> =
            items.iter().map(|(label, _)| label.clone()).collect();
        let prompt = format!("Version for {}", request.package);
        let picked = self.select(&prompt, &labels, 0)?;

        let (_, item) = items.get(picked).ok_or(AlignerError::Cancelled)?;
        let choice = match item {
            ChoiceItem::InUse(version) => VersionChoice::InUse(version.clone()),
            ChoiceItem::Latest => VersionChoice::Latest,
            ChoiceItem::Skip => VersionChoice::Skip,
            ChoiceItem::Custom => {
                let prompt = format!("Custom version for {}", request.package);
                VersionChoice::Custom(self.input(&prompt, "")?)
            }
        };

        Ok(choice)
    }

    fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(default)
            .interact_opt()?
            .ok_or(AlignerError::Cancelled)
    }
}

/// Steady-ticking spinner for scans, lookups and installs.
pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(&[
            "⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✔",
        ])
        .template("{spinner:.blue} {msg}")
    {
        bar.set_style(style);
    }
    bar.set_message(message.into());
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}
